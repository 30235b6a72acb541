//! Sorted linear-scan collision index
//!
//! Entries are sorted by the left edge of their bounding box once per tick
//! and scanned until an entry starts to the right of the query. Entities that
//! move or appear during the tick are not re-sorted, so the early exit can
//! skip them. Old recordings depend on exactly this behaviour; leave it be.

use super::{
    CollisionHit, CollisionIndex, IndexEntry, RangeHit, check_entity, push_bounded,
    sort_range_hits,
};
use crate::ecs::{EntityId, EntityIndex};
use crate::geom::{CheckQuery, ShapeFlag};
use crate::math::{FVec2, Fixed};

struct LegacyEntry {
    id: EntityId,
    entry: IndexEntry,
    x_min: Fixed,
}

#[derive(Default)]
pub struct LegacyIndex {
    entries: Vec<LegacyEntry>,
}

impl LegacyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, id: EntityId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Scan in sort order, stopping once entries start right of the query
    fn scan(&self, entities: &EntityIndex, query: &CheckQuery, first_only: bool) -> Vec<CollisionHit> {
        let right = query.shape.centre().x + query.shape.radius();
        let mut hits = Vec::new();
        for e in &self.entries {
            if e.x_min > right {
                break;
            }
            if !e.entry.may_hit(query) {
                continue;
            }
            let flags = check_entity(entities, e.id, query);
            if !flags.is_empty() {
                hits.push(CollisionHit { id: e.id, flags });
            }
        }
        hits.sort_by_key(|h| h.id);
        if first_only {
            hits.truncate(1);
        }
        hits
    }
}

impl CollisionIndex for LegacyIndex {
    fn begin_tick(&mut self) {
        self.entries.sort_by_key(|e| e.x_min);
    }

    fn add(&mut self, id: EntityId, entry: IndexEntry) {
        self.remove(id);
        self.entries.push(LegacyEntry {
            id,
            entry,
            x_min: entry.centre.x - entry.bounding_width,
        });
    }

    fn update(&mut self, id: EntityId, centre: FVec2) {
        if let Some(i) = self.position(id) {
            let e = &mut self.entries[i];
            e.entry.centre = centre;
            e.x_min = centre.x - e.entry.bounding_width;
        }
    }

    fn remove(&mut self, id: EntityId) {
        if let Some(i) = self.position(id) {
            self.entries.remove(i);
        }
    }

    fn contains(&self, id: EntityId) -> bool {
        self.position(id).is_some()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn first_collision(&self, entities: &EntityIndex, query: &CheckQuery) -> Option<CollisionHit> {
        self.scan(entities, query, true).into_iter().next()
    }

    fn collide(&self, entities: &EntityIndex, query: &CheckQuery) -> Vec<CollisionHit> {
        self.scan(entities, query, false)
    }

    fn in_range(&self, centre: FVec2, radius: Fixed, flags: ShapeFlag, max_n: usize) -> Vec<RangeHit> {
        let limit = radius * radius;
        let mut best = Vec::new();
        for e in &self.entries {
            if !e.entry.flags.intersects(flags) {
                continue;
            }
            let distance_sq = e.entry.centre.distance_squared(centre);
            if distance_sq <= limit {
                push_bounded(&mut best, RangeHit { id: e.id, distance_sq }, max_n);
            }
        }
        sort_range_hits(&mut best);
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::GridIndex;
    use crate::collision::test_support::ball_entity;
    use crate::config::GridConfig;

    fn both() -> (GridIndex, LegacyIndex) {
        (GridIndex::new(GridConfig::default()), LegacyIndex::new())
    }

    #[test]
    fn test_agrees_with_grid_for_disjoint_boxes() {
        let mut entities = EntityIndex::new();
        let (mut grid, mut legacy) = both();
        let flags = ShapeFlag::VULNERABLE | ShapeFlag::SHIELD;
        let centres = [(300, 40), (20, 20), (150, 400), (600, 100), (90, 90), (450, 300)];
        for (x, y) in centres {
            let (id, e) = ball_entity(&mut entities, FVec2::from_ints(x, y), Fixed::from_int(12), flags);
            grid.add(id, e);
            legacy.add(id, e);
        }
        grid.begin_tick();
        legacy.begin_tick();

        for y in (0..480).step_by(7) {
            for x in (0..640).step_by(9) {
                let p = FVec2::from_ints(x, y);
                let point = CheckQuery::point(p, ShapeFlag::SHIELD);
                assert_eq!(grid.collide(&entities, &point), legacy.collide(&entities, &point));
                assert_eq!(
                    grid.any_collision(&entities, &point),
                    legacy.any_collision(&entities, &point)
                );
                let ball = CheckQuery::ball(p, Fixed::from_int(6), ShapeFlag::ALL);
                assert_eq!(grid.collide(&entities, &ball), legacy.collide(&entities, &ball));
            }
        }
        let a = grid.in_range(FVec2::from_ints(100, 100), Fixed::from_int(300), flags, 3);
        let b = legacy.in_range(FVec2::from_ints(100, 100), Fixed::from_int(300), flags, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_moved_entity_missed_until_resort() {
        let mut entities = EntityIndex::new();
        let (mut grid, mut legacy) = both();
        let flags = ShapeFlag::VULNERABLE;
        let (mover, e1) = ball_entity(&mut entities, FVec2::from_ints(10, 50), Fixed::from_int(10), flags);
        let (target, e2) = ball_entity(&mut entities, FVec2::from_ints(110, 50), Fixed::from_int(10), flags);
        for (id, e) in [(mover, e1), (target, e2)] {
            grid.add(id, e);
            legacy.add(id, e);
        }
        grid.begin_tick();
        legacy.begin_tick();

        // Mid-tick move puts an entry with a large left edge first in the scan
        grid.update(mover, FVec2::from_ints(300, 50));
        legacy.update(mover, FVec2::from_ints(300, 50));

        let q = CheckQuery::point(FVec2::from_ints(110, 50), flags);
        assert_eq!(grid.collide(&entities, &q).len(), 1);
        assert!(legacy.collide(&entities, &q).is_empty());

        legacy.begin_tick();
        assert_eq!(legacy.collide(&entities, &q), grid.collide(&entities, &q));
    }

    #[test]
    fn test_remove() {
        let mut entities = EntityIndex::new();
        let mut legacy = LegacyIndex::new();
        let (id, e) = ball_entity(&mut entities, FVec2::ZERO, Fixed::ONE, ShapeFlag::SHIELD);
        legacy.add(id, e);
        assert!(legacy.contains(id));
        legacy.remove(id);
        assert!(legacy.is_empty());
    }
}
