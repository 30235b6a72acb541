//! Shape tree nodes and builders
//!
//! Trees are plain data built once per entity type, e.g.
//!
//! ```ignore
//! compound(vec![
//!     ball(8).flags(ShapeFlag::VULNERABLE).colour(colours::CYAN).into(),
//!     translate(FVec2::from_ints(12, 0), line(FVec2::ZERO, FVec2::from_ints(6, 0))),
//! ])
//! ```

use super::flags::ShapeFlag;
use super::params::{Colour, Expr};
use crate::math::{FVec2, Fixed};

/// Drawing style shared by all leaves
#[derive(Clone, Debug)]
pub struct Style {
    pub colour: Expr<Colour>,
    /// Second gradient colour; `None` draws flat in `colour`
    pub gradient: Option<Expr<Colour>>,
    pub line_width: Fixed,
    /// Higher draws later
    pub z: i32,
    /// Distinguishes primitives of one entity for trail continuity
    pub tag: u32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            colour: Expr::Const(Colour::ONE),
            gradient: None,
            line_width: Fixed::ONE,
            z: 0,
            tag: 0,
        }
    }
}

/// Builder methods for leaves carrying a [`Style`]
pub trait Styled: Sized {
    fn style_mut(&mut self) -> &mut Style;

    fn colour(mut self, colour: impl Into<Expr<Colour>>) -> Self {
        self.style_mut().colour = colour.into();
        self
    }

    fn gradient(mut self, colour: impl Into<Expr<Colour>>) -> Self {
        self.style_mut().gradient = Some(colour.into());
        self
    }

    fn line_width(mut self, width: Fixed) -> Self {
        self.style_mut().line_width = width;
        self
    }

    fn z(mut self, z: i32) -> Self {
        self.style_mut().z = z;
        self
    }

    fn tag(mut self, tag: u32) -> Self {
        self.style_mut().tag = tag;
        self
    }
}

#[derive(Clone, Debug)]
pub struct Ball {
    pub radius: Expr<Fixed>,
    /// Hollow interior radius; points closer than this don't hit
    pub inner: Expr<Fixed>,
    pub flags: Expr<ShapeFlag>,
    pub style: Style,
}

impl Ball {
    pub fn inner(mut self, inner: impl Into<Expr<Fixed>>) -> Self {
        self.inner = inner.into();
        self
    }

    pub fn flags(mut self, flags: impl Into<Expr<ShapeFlag>>) -> Self {
        self.flags = flags.into();
        self
    }
}

#[derive(Clone, Debug)]
pub struct BoxShape {
    pub half_extents: Expr<FVec2>,
    pub flags: Expr<ShapeFlag>,
    pub style: Style,
}

impl BoxShape {
    pub fn flags(mut self, flags: impl Into<Expr<ShapeFlag>>) -> Self {
        self.flags = flags.into();
        self
    }
}

/// How an n-gon's vertices are joined
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NgonStyle {
    /// Perimeter edges
    #[default]
    Polygon,
    /// Spokes from the centre to each vertex
    Polystar,
    /// Every vertex joined to every other
    Polygram,
}

#[derive(Clone, Debug)]
pub struct Ngon {
    pub sides: u32,
    pub radius: Expr<Fixed>,
    pub inner: Expr<Fixed>,
    pub kind: NgonStyle,
    /// Draw only the first `segments` edges; `None` draws all
    pub segments: Option<u32>,
    pub flags: Expr<ShapeFlag>,
    pub style: Style,
}

impl Ngon {
    pub fn inner(mut self, inner: impl Into<Expr<Fixed>>) -> Self {
        self.inner = inner.into();
        self
    }

    pub fn kind(mut self, kind: NgonStyle) -> Self {
        self.kind = kind;
        self
    }

    pub fn segments(mut self, segments: u32) -> Self {
        self.segments = Some(segments);
        self
    }

    pub fn flags(mut self, flags: impl Into<Expr<ShapeFlag>>) -> Self {
        self.flags = flags.into();
        self
    }
}

/// Render-only segment
#[derive(Clone, Debug)]
pub struct Line {
    pub a: Expr<FVec2>,
    pub b: Expr<FVec2>,
    pub style: Style,
}

/// Named anchor for sub-entities
#[derive(Clone, Debug)]
pub struct Attachment {
    pub index: u32,
    pub offset: Expr<FVec2>,
    pub rotation: Expr<Fixed>,
}

impl Attachment {
    pub fn rotation(mut self, rotation: impl Into<Expr<Fixed>>) -> Self {
        self.rotation = rotation.into();
        self
    }
}

macro_rules! styled {
    ($($ty:ident),+) => {
        $(
            impl Styled for $ty {
                fn style_mut(&mut self) -> &mut Style {
                    &mut self.style
                }
            }

            impl From<$ty> for Node {
                fn from(leaf: $ty) -> Self {
                    Node::$ty(leaf)
                }
            }
        )+
    };
}

styled!(Ball, BoxShape, Ngon, Line);

impl From<Attachment> for Node {
    fn from(leaf: Attachment) -> Self {
        Node::Attachment(leaf)
    }
}

/// One node of a shape tree
#[derive(Clone, Debug)]
pub enum Node {
    Ball(Ball),
    BoxShape(BoxShape),
    Ngon(Ngon),
    Line(Line),
    Attachment(Attachment),
    Compound(Vec<Node>),
    Translate(Expr<FVec2>, Box<Node>),
    Rotate(Expr<Fixed>, Box<Node>),
    /// Descend only while the condition holds
    Enable(Expr<bool>, Box<Node>),
    Conditional(Expr<bool>, Box<Node>, Box<Node>),
    /// Descend into the branch picked by the selector; out of range picks none
    Switch(Expr<u32>, Vec<Node>),
}

impl Node {
    /// Tree with no primitives
    pub fn empty() -> Self {
        Node::Compound(Vec::new())
    }
}

pub fn ball(radius: impl Into<Expr<Fixed>>) -> Ball {
    Ball {
        radius: radius.into(),
        inner: Expr::Const(Fixed::ZERO),
        flags: Expr::Const(ShapeFlag::NONE),
        style: Style::default(),
    }
}

pub fn box_shape(half_extents: impl Into<Expr<FVec2>>) -> BoxShape {
    BoxShape {
        half_extents: half_extents.into(),
        flags: Expr::Const(ShapeFlag::NONE),
        style: Style::default(),
    }
}

pub fn ngon(sides: u32, radius: impl Into<Expr<Fixed>>) -> Ngon {
    Ngon {
        sides,
        radius: radius.into(),
        inner: Expr::Const(Fixed::ZERO),
        kind: NgonStyle::Polygon,
        segments: None,
        flags: Expr::Const(ShapeFlag::NONE),
        style: Style::default(),
    }
}

pub fn line(a: impl Into<Expr<FVec2>>, b: impl Into<Expr<FVec2>>) -> Line {
    Line {
        a: a.into(),
        b: b.into(),
        style: Style::default(),
    }
}

pub fn attachment(index: u32, offset: impl Into<Expr<FVec2>>) -> Attachment {
    Attachment {
        index,
        offset: offset.into(),
        rotation: Expr::Const(Fixed::ZERO),
    }
}

pub fn compound(children: Vec<Node>) -> Node {
    Node::Compound(children)
}

pub fn translate(offset: impl Into<Expr<FVec2>>, child: impl Into<Node>) -> Node {
    Node::Translate(offset.into(), Box::new(child.into()))
}

pub fn rotate(angle: impl Into<Expr<Fixed>>, child: impl Into<Node>) -> Node {
    Node::Rotate(angle.into(), Box::new(child.into()))
}

pub fn enable(condition: impl Into<Expr<bool>>, child: impl Into<Node>) -> Node {
    Node::Enable(condition.into(), Box::new(child.into()))
}

pub fn conditional(
    condition: impl Into<Expr<bool>>,
    then: impl Into<Node>,
    otherwise: impl Into<Node>,
) -> Node {
    Node::Conditional(
        condition.into(),
        Box::new(then.into()),
        Box::new(otherwise.into()),
    )
}

pub fn switch(selector: impl Into<Expr<u32>>, branches: Vec<Node>) -> Node {
    Node::Switch(selector.into(), branches)
}
