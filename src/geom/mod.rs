//! Declarative shape trees
//!
//! A shape is described once as a tree of [`Node`]s and resolved against a
//! per-entity [`Parameters`] set whenever collision, rendering or particle
//! code needs it. Every consumer shares the same pre-order walk, so draw
//! order and collision tie-breaks agree.

pub mod check;
pub mod flags;
pub mod iterate;
pub mod node;
pub mod params;
pub mod transform;

pub use check::{CheckQuery, CheckShape};
pub use flags::ShapeFlag;
pub use iterate::{
    AttachmentPoint, Centre, LineSegment, Primitive, ResolvedShape, ShapeVisitor,
    attachment_points, centres, check, flags, iterate, lines, resolve,
};
pub use node::{
    Node, NgonStyle, Styled, attachment, ball, box_shape, compound, conditional, enable, line,
    ngon, rotate, switch, translate,
};
pub use params::{Colour, Expr, Param, ParamType, ParamValue, Parameters};
pub use transform::Affine;
