//! Spatial collision index
//!
//! Two interchangeable implementations sit behind [`CollisionIndex`]:
//! - `grid`: uniform power-of-two grid, the default
//! - `legacy`: sorted linear scan reproducing old replays, including its
//!   unsound early exit
//!
//! Both report hits in ascending entity id order. Broad phase uses each
//! entity's square bounding box; the narrow phase asks the entity's
//! [`Collision`] component to test its own shape.

pub mod grid;
pub mod legacy;

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{CollisionMode, SimConfig};
use crate::ecs::{EntityId, EntityIndex, EntityRef};
use crate::geom::{self, Affine, CheckQuery, ShapeFlag};
use crate::math::{FVec2, Fixed};
use crate::sim::components::{Shape, Transform};

pub use grid::GridIndex;
pub use legacy::LegacyIndex;

/// Narrow-phase test supplied by the entity
pub type CollisionCheck = Rc<dyn Fn(EntityRef<'_>, &CheckQuery) -> ShapeFlag>;

/// Makes an entity visible to collision queries.
///
/// `flags` is the static union of everything the entity's shape can report;
/// queries whose mask misses it skip the entity before any geometry runs.
#[derive(Clone)]
pub struct Collision {
    pub flags: ShapeFlag,
    pub bounding_width: Fixed,
    check: Option<CollisionCheck>,
}

impl Collision {
    pub fn new(
        flags: ShapeFlag,
        bounding_width: Fixed,
        check: impl Fn(EntityRef<'_>, &CheckQuery) -> ShapeFlag + 'static,
    ) -> Self {
        Self {
            flags,
            bounding_width,
            check: Some(Rc::new(check)),
        }
    }

    /// Anything inside the bounding box hits with every flag
    pub fn bounding_box(flags: ShapeFlag, bounding_width: Fixed) -> Self {
        Self {
            flags,
            bounding_width,
            check: None,
        }
    }

    /// Resolve the entity's [`Shape`] at its [`Transform`]
    pub fn for_shape(flags: ShapeFlag, bounding_width: Fixed) -> Self {
        Self::new(flags, bounding_width, |entity, query| {
            let (Some(shape), Some(transform)) = (entity.get::<Shape>(), entity.get::<Transform>())
            else {
                return ShapeFlag::NONE;
            };
            geom::check(
                &shape.node,
                &shape.params,
                Affine::new(transform.centre, transform.rotation),
                query,
            )
        })
    }

    /// Narrow-phase flags for `query`, restricted to its mask
    pub fn check(&self, entity: EntityRef<'_>, query: &CheckQuery) -> ShapeFlag {
        let flags = match &self.check {
            Some(check) => check(entity, query),
            None => self.flags,
        };
        flags & query.mask
    }
}

/// Axis-aligned box
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub min: FVec2,
    pub max: FVec2,
}

impl Bounds {
    pub fn around(centre: FVec2, half_width: Fixed) -> Self {
        let h = FVec2::splat(half_width);
        Self {
            min: centre - h,
            max: centre + h,
        }
    }

    pub fn expand(self, by: Fixed) -> Self {
        let h = FVec2::splat(by);
        Self {
            min: self.min - h,
            max: self.max + h,
        }
    }

    #[inline]
    pub fn contains(&self, p: FVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// One entity reported by a shape query
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionHit {
    pub id: EntityId,
    pub flags: ShapeFlag,
}

/// One entity reported by a range query
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeHit {
    pub id: EntityId,
    pub distance_sq: Fixed,
}

/// Broad-phase record shared by both implementations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    pub centre: FVec2,
    pub bounding_width: Fixed,
    pub flags: ShapeFlag,
}

impl IndexEntry {
    #[inline]
    pub fn bounds(&self) -> Bounds {
        Bounds::around(self.centre, self.bounding_width)
    }

    /// Broad-phase test against a point or ball query
    pub fn may_hit(&self, query: &CheckQuery) -> bool {
        self.flags.intersects(query.mask)
            && self
                .bounds()
                .expand(query.shape.radius())
                .contains(query.shape.centre())
    }
}

pub trait CollisionIndex {
    /// Called once at the start of every tick
    fn begin_tick(&mut self);
    fn add(&mut self, id: EntityId, entry: IndexEntry);
    /// Move an entity; unknown ids are ignored
    fn update(&mut self, id: EntityId, centre: FVec2);
    fn remove(&mut self, id: EntityId);
    fn contains(&self, id: EntityId) -> bool;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First hit in ascending id order, if any
    fn first_collision(&self, entities: &EntityIndex, query: &CheckQuery) -> Option<CollisionHit>;

    fn any_collision(&self, entities: &EntityIndex, query: &CheckQuery) -> bool {
        self.first_collision(entities, query).is_some()
    }

    /// Every hit, ascending by id
    fn collide(&self, entities: &EntityIndex, query: &CheckQuery) -> Vec<CollisionHit>;

    /// Entities whose centre lies within `radius` of `centre`, sorted by
    /// `(distance_sq, id)`, at most `max_n` of them (`0` for no limit)
    fn in_range(&self, centre: FVec2, radius: Fixed, flags: ShapeFlag, max_n: usize) -> Vec<RangeHit>;
}

/// The index shared between the simulation and the ECS observers that keep
/// it in sync with `Collision` components
pub type SharedCollisionIndex = Rc<RefCell<Box<dyn CollisionIndex>>>;

pub fn new_collision_index(config: &SimConfig) -> Box<dyn CollisionIndex> {
    match config.collision {
        CollisionMode::Grid => Box::new(GridIndex::new(config.grid)),
        CollisionMode::Legacy => Box::new(LegacyIndex::new()),
    }
}

/// Narrow-phase test of one entity, restricted to the query mask
pub fn check_entity(entities: &EntityIndex, id: EntityId, query: &CheckQuery) -> ShapeFlag {
    let Some(entity) = entities.get_ref(id) else {
        return ShapeFlag::NONE;
    };
    entity
        .get::<Collision>()
        .map_or(ShapeFlag::NONE, |c| c.check(entity, query))
}

/// Keep `best` holding the `max_n` smallest `(distance_sq, id)` hits seen so
/// far; `max_n == 0` keeps everything
pub(crate) fn push_bounded(best: &mut Vec<RangeHit>, hit: RangeHit, max_n: usize) {
    if max_n == 0 || best.len() < max_n {
        best.push(hit);
        return;
    }
    let key = |h: &RangeHit| (h.distance_sq, h.id);
    let Some((worst, _)) = best
        .iter()
        .enumerate()
        .max_by_key(|(_, h)| key(h))
    else {
        return;
    };
    if key(&hit) < key(&best[worst]) {
        best[worst] = hit;
    }
}

pub(crate) fn sort_range_hits(hits: &mut [RangeHit]) {
    hits.sort_by_key(|h| (h.distance_sq, h.id));
}
