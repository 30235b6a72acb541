//! Shape tree walk and its consumers
//!
//! One pre-order walk resolves every leaf under an accumulated transform; the
//! consumers below differ only in what their visitor does with each leaf:
//! - `flags`: union of leaf flags (static capabilities under arbitrary parameters)
//! - `check`: union of masked flags of leaves the query touches
//! - `lines`: world-space segments for rendering and destruction effects
//! - `centres`: leaf centres and colours for explosions
//! - `attachment_points`: named anchors for sub-entities

use super::check::{CheckQuery, hit};
use super::flags::ShapeFlag;
use super::node::{Node, NgonStyle, Style};
use super::params::{Colour, Parameters};
use super::transform::Affine;
use crate::math::{FVec2, Fixed};

/// Segments used to outline a ball in [`lines`]
pub const BALL_OUTLINE_SEGMENTS: u32 = 16;

/// Leaf geometry in local coordinates
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Ball {
        radius: Fixed,
        inner: Fixed,
    },
    Box {
        half_extents: FVec2,
    },
    Ngon {
        sides: u32,
        radius: Fixed,
        inner: Fixed,
        style: NgonStyle,
        segments: u32,
    },
    Line {
        a: FVec2,
        b: FVec2,
    },
    Attachment {
        index: u32,
    },
}

/// One leaf with every expression evaluated
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedShape {
    pub primitive: Primitive,
    pub transform: Affine,
    pub flags: ShapeFlag,
    pub colour: Colour,
    pub gradient: Colour,
    pub line_width: Fixed,
    pub z: i32,
    pub tag: u32,
}

/// Leaf consumer for [`iterate`]
pub trait ShapeVisitor {
    fn visit(&mut self, shape: &ResolvedShape);
}

impl<F: FnMut(&ResolvedShape)> ShapeVisitor for F {
    fn visit(&mut self, shape: &ResolvedShape) {
        self(shape)
    }
}

/// Walk `node` in pre-order, handing each resolved leaf to `visitor`
pub fn iterate(node: &Node, params: &Parameters, transform: Affine, visitor: &mut dyn ShapeVisitor) {
    match node {
        Node::Ball(b) => visitor.visit(&leaf(
            Primitive::Ball {
                radius: b.radius.eval(params),
                inner: b.inner.eval(params),
            },
            transform,
            b.flags.eval(params),
            &b.style,
            params,
        )),
        Node::BoxShape(b) => visitor.visit(&leaf(
            Primitive::Box {
                half_extents: b.half_extents.eval(params),
            },
            transform,
            b.flags.eval(params),
            &b.style,
            params,
        )),
        Node::Ngon(n) => visitor.visit(&leaf(
            Primitive::Ngon {
                sides: n.sides,
                radius: n.radius.eval(params),
                inner: n.inner.eval(params),
                style: n.kind,
                segments: n.segments.unwrap_or(n.sides).min(n.sides),
            },
            transform,
            n.flags.eval(params),
            &n.style,
            params,
        )),
        Node::Line(l) => visitor.visit(&leaf(
            Primitive::Line {
                a: l.a.eval(params),
                b: l.b.eval(params),
            },
            transform,
            ShapeFlag::NONE,
            &l.style,
            params,
        )),
        Node::Attachment(a) => {
            let at = transform
                .translate(a.offset.eval(params))
                .rotate(a.rotation.eval(params));
            visitor.visit(&ResolvedShape {
                primitive: Primitive::Attachment { index: a.index },
                transform: at,
                flags: ShapeFlag::NONE,
                colour: Colour::ZERO,
                gradient: Colour::ZERO,
                line_width: Fixed::ZERO,
                z: 0,
                tag: 0,
            });
        }
        Node::Compound(children) => {
            for child in children {
                iterate(child, params, transform, visitor);
            }
        }
        Node::Translate(offset, child) => {
            iterate(child, params, transform.translate(offset.eval(params)), visitor);
        }
        Node::Rotate(angle, child) => {
            iterate(child, params, transform.rotate(angle.eval(params)), visitor);
        }
        Node::Enable(condition, child) => {
            if params.is_arbitrary() || condition.eval(params) {
                iterate(child, params, transform, visitor);
            }
        }
        Node::Conditional(condition, then, otherwise) => {
            if params.is_arbitrary() {
                iterate(then, params, transform, visitor);
                iterate(otherwise, params, transform, visitor);
            } else if condition.eval(params) {
                iterate(then, params, transform, visitor);
            } else {
                iterate(otherwise, params, transform, visitor);
            }
        }
        Node::Switch(selector, branches) => {
            if params.is_arbitrary() {
                for branch in branches {
                    iterate(branch, params, transform, visitor);
                }
            } else if let Some(branch) = branches.get(selector.eval(params) as usize) {
                iterate(branch, params, transform, visitor);
            }
        }
    }
}

fn leaf(
    primitive: Primitive,
    transform: Affine,
    flags: ShapeFlag,
    style: &Style,
    params: &Parameters,
) -> ResolvedShape {
    let colour = style.colour.eval(params);
    ResolvedShape {
        primitive,
        transform,
        flags,
        colour,
        gradient: style.gradient.as_ref().map_or(colour, |g| g.eval(params)),
        line_width: style.line_width,
        z: style.z,
        tag: style.tag,
    }
}

/// Flat list of leaves in tree order
pub fn resolve(node: &Node, params: &Parameters, transform: Affine) -> Vec<ResolvedShape> {
    let mut out = Vec::new();
    iterate(node, params, transform, &mut |shape: &ResolvedShape| out.push(shape.clone()));
    out
}

struct FlagsVisitor(ShapeFlag);

impl ShapeVisitor for FlagsVisitor {
    fn visit(&mut self, shape: &ResolvedShape) {
        self.0 |= shape.flags;
    }
}

/// Union of every reachable leaf's flags
pub fn flags(node: &Node, params: &Parameters) -> ShapeFlag {
    let mut visitor = FlagsVisitor(ShapeFlag::NONE);
    iterate(node, params, Affine::IDENTITY, &mut visitor);
    visitor.0
}

struct CheckVisitor<'q> {
    query: &'q CheckQuery,
    result: ShapeFlag,
}

impl ShapeVisitor for CheckVisitor<'_> {
    fn visit(&mut self, shape: &ResolvedShape) {
        let masked = shape.flags & self.query.mask;
        if !masked.is_empty() && !self.result.contains(masked) && hit(shape, self.query) {
            self.result |= masked;
        }
    }
}

/// Flags (restricted to the query mask) of every leaf the query touches
pub fn check(node: &Node, params: &Parameters, transform: Affine, query: &CheckQuery) -> ShapeFlag {
    let mut visitor = CheckVisitor {
        query,
        result: ShapeFlag::NONE,
    };
    iterate(node, params, transform, &mut visitor);
    visitor.result
}

/// World-space segment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment {
    pub a: FVec2,
    pub b: FVec2,
    pub colour: Colour,
    pub gradient: Colour,
    pub width: Fixed,
    pub z: i32,
    pub tag: u32,
}

struct LinesVisitor {
    out: Vec<LineSegment>,
}

impl LinesVisitor {
    fn push(&mut self, shape: &ResolvedShape, a: FVec2, b: FVec2) {
        self.out.push(LineSegment {
            a: shape.transform.apply(a),
            b: shape.transform.apply(b),
            colour: shape.colour,
            gradient: shape.gradient,
            width: shape.line_width,
            z: shape.z,
            tag: shape.tag,
        });
    }

    fn outline(&mut self, shape: &ResolvedShape, sides: u32, count: u32, radius: Fixed) {
        let corners = polygon_corners(sides, radius);
        for i in 0..count as usize {
            self.push(shape, corners[i], corners[(i + 1) % corners.len()]);
        }
    }
}

impl ShapeVisitor for LinesVisitor {
    fn visit(&mut self, shape: &ResolvedShape) {
        match shape.primitive {
            Primitive::Ball { radius, inner } => {
                self.outline(shape, BALL_OUTLINE_SEGMENTS, BALL_OUTLINE_SEGMENTS, radius);
                if inner > Fixed::ZERO {
                    self.outline(shape, BALL_OUTLINE_SEGMENTS, BALL_OUTLINE_SEGMENTS, inner);
                }
            }
            Primitive::Box { half_extents: h } => {
                let corners = [
                    FVec2::new(h.x, h.y),
                    FVec2::new(-h.x, h.y),
                    FVec2::new(-h.x, -h.y),
                    FVec2::new(h.x, -h.y),
                ];
                for i in 0..4 {
                    self.push(shape, corners[i], corners[(i + 1) % 4]);
                }
            }
            Primitive::Ngon {
                sides,
                radius,
                inner,
                style,
                segments,
            } => {
                if sides < 2 {
                    return;
                }
                match style {
                    NgonStyle::Polygon => {
                        self.outline(shape, sides, segments, radius);
                        if inner > Fixed::ZERO {
                            self.outline(shape, sides, segments, inner);
                        }
                    }
                    NgonStyle::Polystar => {
                        let corners = polygon_corners(sides, radius);
                        for corner in corners.into_iter().take(segments as usize) {
                            self.push(shape, FVec2::ZERO, corner);
                        }
                    }
                    NgonStyle::Polygram => {
                        let corners = polygon_corners(sides, radius);
                        for i in 0..corners.len() {
                            for j in i + 1..corners.len() {
                                self.push(shape, corners[i], corners[j]);
                            }
                        }
                    }
                }
            }
            Primitive::Line { a, b } => self.push(shape, a, b),
            Primitive::Attachment { .. } => {}
        }
    }
}

/// Corners of a regular polygon with the first vertex on the local +x axis
pub fn polygon_corners(sides: u32, radius: Fixed) -> Vec<FVec2> {
    let step = Fixed::TAU / Fixed::from_int(sides.max(1) as i32);
    (0..sides)
        .map(|i| FVec2::from_polar(step * Fixed::from_int(i as i32), radius))
        .collect()
}

/// Every segment the tree would draw, in tree order
pub fn lines(node: &Node, params: &Parameters, transform: Affine) -> Vec<LineSegment> {
    let mut visitor = LinesVisitor { out: Vec::new() };
    iterate(node, params, transform, &mut visitor);
    visitor.out
}

/// Logical centre of a drawn leaf
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Centre {
    pub position: FVec2,
    pub colour: Colour,
}

struct CentresVisitor {
    out: Vec<Centre>,
}

impl ShapeVisitor for CentresVisitor {
    fn visit(&mut self, shape: &ResolvedShape) {
        if matches!(
            shape.primitive,
            Primitive::Ball { .. } | Primitive::Box { .. } | Primitive::Ngon { .. }
        ) {
            self.out.push(Centre {
                position: shape.transform.translation,
                colour: shape.colour,
            });
        }
    }
}

/// Centres of every ball, box and n-gon, in tree order
pub fn centres(node: &Node, params: &Parameters, transform: Affine) -> Vec<Centre> {
    let mut visitor = CentresVisitor { out: Vec::new() };
    iterate(node, params, transform, &mut visitor);
    visitor.out
}

/// World-space anchor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachmentPoint {
    pub index: u32,
    pub position: FVec2,
    pub rotation: Fixed,
}

/// Attachment anchors in tree order
pub fn attachment_points(node: &Node, params: &Parameters, transform: Affine) -> Vec<AttachmentPoint> {
    let mut out = Vec::new();
    iterate(node, params, transform, &mut |shape: &ResolvedShape| {
        if let Primitive::Attachment { index } = shape.primitive {
            out.push(AttachmentPoint {
                index,
                position: shape.transform.translation,
                rotation: shape.transform.rotation,
            });
        }
    });
    out
}
