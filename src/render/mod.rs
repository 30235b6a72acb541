//! Render output
//!
//! The simulation never draws. Each tick it can be asked for a list of
//! [`RenderShape`]s in float coordinates, sorted by z, plus a flat line list
//! for front ends that only draw quads.

pub mod shapes;
pub mod vertex;

use std::rc::Rc;

use glam::{Vec2, Vec4};

use crate::ecs::{EntityId, EntityIndex, EntityRef};
use crate::geom::{self, LineSegment, NgonStyle, Primitive, ResolvedShape};
use crate::sim::components::{Shape, Transform};

pub use shapes::line_vertices;
pub use vertex::{Vertex, colours};

/// Custom draw hook
pub type RenderFn = Rc<dyn Fn(EntityRef<'_>, &mut Vec<RenderShape>)>;

/// Makes an entity visible
#[derive(Clone, Default)]
pub struct Render {
    custom: Option<RenderFn>,
}

impl Render {
    /// Draw the entity's [`Shape`] at its [`Transform`]
    pub fn shape() -> Self {
        Self { custom: None }
    }

    pub fn custom(f: impl Fn(EntityRef<'_>, &mut Vec<RenderShape>) + 'static) -> Self {
        Self {
            custom: Some(Rc::new(f)),
        }
    }

    pub fn emit(&self, entity: EntityRef<'_>, out: &mut Vec<RenderShape>) {
        match &self.custom {
            Some(f) => f(entity, out),
            None => {
                let (Some(shape), Some(transform)) = (entity.get::<Shape>(), entity.get::<Transform>())
                else {
                    return;
                };
                let resolved = geom::resolve(&shape.node, &shape.params, Shape::affine(transform));
                render_shapes(entity.id(), &resolved, out);
            }
        }
    }
}

/// Identifies one primitive of one entity across frames, for trails and
/// interpolation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrailTag {
    pub entity: EntityId,
    pub tag: u32,
}

/// Geometry in the shape's local frame
#[derive(Clone, Debug, PartialEq)]
pub enum RenderKind {
    Ball {
        radius: f32,
        inner: f32,
    },
    Box {
        half_extents: Vec2,
    },
    Ngon {
        sides: u32,
        radius: f32,
        inner: f32,
        style: NgonStyle,
        segments: u32,
    },
    Line {
        a: Vec2,
        b: Vec2,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderShape {
    pub kind: RenderKind,
    pub origin: Vec2,
    pub rotation: f32,
    pub colour: Vec4,
    pub gradient: Vec4,
    pub line_width: f32,
    pub z: i32,
    pub trail: TrailTag,
}

/// Convert resolved leaves to render shapes; attachments draw nothing
pub fn render_shapes(entity: EntityId, shapes: &[ResolvedShape], out: &mut Vec<RenderShape>) {
    for shape in shapes {
        let kind = match shape.primitive {
            Primitive::Ball { radius, inner } => RenderKind::Ball {
                radius: radius.to_f32(),
                inner: inner.to_f32(),
            },
            Primitive::Box { half_extents } => RenderKind::Box {
                half_extents: half_extents.to_glam(),
            },
            Primitive::Ngon {
                sides,
                radius,
                inner,
                style,
                segments,
            } => RenderKind::Ngon {
                sides,
                radius: radius.to_f32(),
                inner: inner.to_f32(),
                style,
                segments,
            },
            Primitive::Line { a, b } => RenderKind::Line {
                a: a.to_glam(),
                b: b.to_glam(),
            },
            Primitive::Attachment { .. } => continue,
        };
        out.push(RenderShape {
            kind,
            origin: shape.transform.translation.to_glam(),
            rotation: shape.transform.rotation.to_f32(),
            colour: shape.colour,
            gradient: shape.gradient,
            line_width: shape.line_width.to_f32(),
            z: shape.z,
            trail: TrailTag {
                entity,
                tag: shape.tag,
            },
        });
    }
}

/// Every visible entity, stable-sorted by z
pub fn render_world(index: &EntityIndex) -> Vec<RenderShape> {
    let mut out = Vec::new();
    index.iterate_ref::<Render>(|entity, render| render.emit(entity, &mut out));
    out.sort_by_key(|s| s.z);
    out
}

/// World-space outlines of every entity with a shape, sorted by z
pub fn world_lines(index: &EntityIndex) -> Vec<LineSegment> {
    let mut out = Vec::new();
    index.iterate_ref::<Render>(|entity, _| {
        if let (Some(shape), Some(transform)) = (entity.get::<Shape>(), entity.get::<Transform>()) {
            out.extend(geom::lines(&shape.node, &shape.params, Shape::affine(transform)));
        }
    });
    out.sort_by_key(|l| l.z);
    out
}
