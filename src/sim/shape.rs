//! Attaching shape trees to entities

use std::rc::Rc;

use super::components::Transform;
use crate::collision::Collision;
use crate::ecs::{EntityHandle, EntityId, EntityIndex, EntityRef};
use crate::geom::{self, Affine, Node, Parameters, ShapeFlag};
use crate::math::Fixed;
use crate::render::Render;

/// Fills the parameter set from the entity's current state
pub type ParameterFn = Rc<dyn Fn(EntityRef<'_>, &mut Parameters)>;

/// Shape tree of an entity plus the parameters it was last evaluated with
#[derive(Clone)]
pub struct Shape {
    pub node: Rc<Node>,
    pub params: Parameters,
    set_parameters: Option<ParameterFn>,
}

impl Shape {
    /// Fixed tree, no parameters
    pub fn fixed(node: Node) -> Self {
        Self {
            node: Rc::new(node),
            params: Parameters::new(),
            set_parameters: None,
        }
    }

    pub fn with_parameters(
        node: Rc<Node>,
        set_parameters: impl Fn(EntityRef<'_>, &mut Parameters) + 'static,
    ) -> Self {
        Self {
            node,
            params: Parameters::new(),
            set_parameters: Some(Rc::new(set_parameters)),
        }
    }

    pub fn affine(transform: &Transform) -> Affine {
        Affine::new(transform.centre, transform.rotation)
    }
}

/// An entity type drawn and collided through a shape tree
pub trait ShapeEntity: 'static {
    /// Half-width of the square that bounds the shape at any rotation
    const BOUNDING_WIDTH: Fixed;

    fn construct_shape() -> Node;

    fn set_parameters(&self, _transform: &Transform, _params: &mut Parameters) {}
}

/// Give `entity` the shape of `T`, a default [`Render`], and a [`Collision`]
/// when the shape can report any flag. `T` and a [`Transform`] should already
/// be present so the first parameter pass sees them.
pub fn add_shape<T: ShapeEntity>(entity: &mut EntityHandle<'_>) {
    let node = Rc::new(T::construct_shape());
    let flags = geom::flags(&node, &Parameters::arbitrary());
    let shape = Shape::with_parameters(node, |entity, params| {
        if let (Some(owner), Some(transform)) = (entity.get::<T>(), entity.get::<Transform>()) {
            owner.set_parameters(transform, params);
        }
    });
    let id = entity.id();
    entity.emplace(shape).emplace(Render::shape());
    refresh_parameters(entity.index(), id);
    if flags != ShapeFlag::NONE {
        entity.emplace(Collision::for_shape(flags, T::BOUNDING_WIDTH));
    }
}

/// Re-run the shape's parameter hook
pub fn refresh_parameters(index: &mut EntityIndex, id: EntityId) {
    let Some(entity) = index.get_ref(id) else {
        return;
    };
    let Some(shape) = entity.get::<Shape>() else {
        return;
    };
    let Some(set_parameters) = shape.set_parameters.clone() else {
        return;
    };
    let mut params = Parameters::new();
    set_parameters(entity, &mut params);
    if let Some(shape) = index.component_mut::<Shape>(id) {
        shape.params = params;
    }
}
