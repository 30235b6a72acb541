//! Uniform grid collision index
//!
//! Each entity is listed in every cell its bounding box overlaps, and in the
//! one cell holding its centre. Cell lists are kept sorted by entity id so a
//! point query, which only visits the cell under the point, yields hits in id
//! order without sorting. Coordinates outside the grid clamp to the border
//! cells, so a box always covers the cell of any point inside it.

use std::collections::HashMap;

use super::{
    CollisionHit, CollisionIndex, IndexEntry, RangeHit, check_entity, push_bounded,
    sort_range_hits,
};
use crate::config::GridConfig;
use crate::ecs::{EntityId, EntityIndex};
use crate::geom::{CheckQuery, ShapeFlag};
use crate::math::{FVec2, Fixed};

#[derive(Default)]
struct Cell {
    entries: Vec<EntityId>,
    centres: Vec<EntityId>,
}

/// Inclusive cell rectangle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CellRange {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

struct GridEntry {
    entry: IndexEntry,
    cells: CellRange,
    centre_cell: usize,
}

pub struct GridIndex {
    config: GridConfig,
    cells: Vec<Cell>,
    entries: HashMap<EntityId, GridEntry>,
}

fn insert_sorted(list: &mut Vec<EntityId>, id: EntityId) {
    if let Err(pos) = list.binary_search(&id) {
        list.insert(pos, id);
    }
}

fn remove_sorted(list: &mut Vec<EntityId>, id: EntityId) {
    if let Ok(pos) = list.binary_search(&id) {
        list.remove(pos);
    }
}

impl GridIndex {
    pub fn new(config: GridConfig) -> Self {
        let cells_x = config.cells_x.max(1);
        let cells_y = config.cells_y.max(1);
        let config = GridConfig {
            cells_x,
            cells_y,
            ..config
        };
        let mut cells = Vec::new();
        cells.resize_with((cells_x * cells_y) as usize, Cell::default);
        Self {
            config,
            cells,
            entries: HashMap::new(),
        }
    }

    fn cell_x(&self, x: Fixed) -> u32 {
        cell_along(x, self.config.min_x, self.config.cell_shift_x, self.config.cells_x)
    }

    fn cell_y(&self, y: Fixed) -> u32 {
        cell_along(y, self.config.min_y, self.config.cell_shift_y, self.config.cells_y)
    }

    #[inline]
    fn cell_index(&self, x: u32, y: u32) -> usize {
        (y * self.config.cells_x + x) as usize
    }

    fn cell_of(&self, p: FVec2) -> usize {
        self.cell_index(self.cell_x(p.x), self.cell_y(p.y))
    }

    fn range_around(&self, centre: FVec2, half_width: Fixed) -> CellRange {
        let h = FVec2::splat(half_width);
        let (min, max) = (centre - h, centre + h);
        CellRange {
            x0: self.cell_x(min.x),
            y0: self.cell_y(min.y),
            x1: self.cell_x(max.x),
            y1: self.cell_y(max.y),
        }
    }

    fn for_cells(range: CellRange, mut f: impl FnMut(u32, u32)) {
        for y in range.y0..=range.y1 {
            for x in range.x0..=range.x1 {
                f(x, y);
            }
        }
    }

    fn link(&mut self, id: EntityId, cells: CellRange, centre_cell: usize) {
        Self::for_cells(cells, |x, y| {
            let i = self.cell_index(x, y);
            insert_sorted(&mut self.cells[i].entries, id);
        });
        insert_sorted(&mut self.cells[centre_cell].centres, id);
    }

    fn unlink(&mut self, id: EntityId, cells: CellRange, centre_cell: usize) {
        Self::for_cells(cells, |x, y| {
            let i = self.cell_index(x, y);
            remove_sorted(&mut self.cells[i].entries, id);
        });
        remove_sorted(&mut self.cells[centre_cell].centres, id);
    }

    /// Ids that may touch `query`, ascending
    fn candidates(&self, query: &CheckQuery) -> Vec<EntityId> {
        let r = query.shape.radius();
        let centre = query.shape.centre();
        if r == Fixed::ZERO {
            return self.cells[self.cell_of(centre)].entries.clone();
        }
        let range = self.range_around(centre, r);
        if range.x0 == range.x1 && range.y0 == range.y1 {
            return self.cells[self.cell_index(range.x0, range.y0)].entries.clone();
        }
        let mut ids = Vec::new();
        Self::for_cells(range, |x, y| {
            ids.extend_from_slice(&self.cells[self.cell_index(x, y)].entries);
        });
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    fn hits<'a>(
        &'a self,
        entities: &'a EntityIndex,
        query: &'a CheckQuery,
    ) -> impl Iterator<Item = CollisionHit> + 'a {
        self.candidates(query).into_iter().filter_map(move |id| {
            let entry = &self.entries.get(&id)?.entry;
            if !entry.may_hit(query) {
                return None;
            }
            let flags = check_entity(entities, id, query);
            (!flags.is_empty()).then_some(CollisionHit { id, flags })
        })
    }
}

impl CollisionIndex for GridIndex {
    fn begin_tick(&mut self) {}

    fn add(&mut self, id: EntityId, entry: IndexEntry) {
        self.remove(id);
        let cells = self.range_around(entry.centre, entry.bounding_width);
        let centre_cell = self.cell_of(entry.centre);
        self.link(id, cells, centre_cell);
        self.entries.insert(
            id,
            GridEntry {
                entry,
                cells,
                centre_cell,
            },
        );
    }

    fn update(&mut self, id: EntityId, centre: FVec2) {
        let Some(current) = self.entries.get(&id) else {
            return;
        };
        let cells = self.range_around(centre, current.entry.bounding_width);
        let centre_cell = self.cell_of(centre);
        let (old_cells, old_centre) = (current.cells, current.centre_cell);
        if cells != old_cells || centre_cell != old_centre {
            log::trace!("grid: {id} moved cells {old_cells:?} -> {cells:?}");
            self.unlink(id, old_cells, old_centre);
            self.link(id, cells, centre_cell);
        }
        if let Some(e) = self.entries.get_mut(&id) {
            e.entry.centre = centre;
            e.cells = cells;
            e.centre_cell = centre_cell;
        }
    }

    fn remove(&mut self, id: EntityId) {
        if let Some(e) = self.entries.remove(&id) {
            self.unlink(id, e.cells, e.centre_cell);
        }
    }

    fn contains(&self, id: EntityId) -> bool {
        self.entries.contains_key(&id)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn first_collision(&self, entities: &EntityIndex, query: &CheckQuery) -> Option<CollisionHit> {
        self.hits(entities, query).next()
    }

    fn collide(&self, entities: &EntityIndex, query: &CheckQuery) -> Vec<CollisionHit> {
        self.hits(entities, query).collect()
    }

    fn in_range(&self, centre: FVec2, radius: Fixed, flags: ShapeFlag, max_n: usize) -> Vec<RangeHit> {
        let limit = radius * radius;
        let mut best = Vec::new();
        Self::for_cells(self.range_around(centre, radius), |x, y| {
            for &id in &self.cells[self.cell_index(x, y)].centres {
                let Some(e) = self.entries.get(&id) else {
                    continue;
                };
                if !e.entry.flags.intersects(flags) {
                    continue;
                }
                let distance_sq = e.entry.centre.distance_squared(centre);
                if distance_sq <= limit {
                    push_bounded(&mut best, RangeHit { id, distance_sq }, max_n);
                }
            }
        });
        sort_range_hits(&mut best);
        best
    }
}

/// Cell column (or row) of `coord`, clamped to the grid. The offset is
/// taken in i64; far coordinates land on the edge cells.
fn cell_along(coord: Fixed, min: i32, shift: u32, cells: u32) -> u32 {
    let offset = i64::from(coord.to_int()) - i64::from(min);
    (offset >> shift).clamp(0, i64::from(cells) - 1) as u32
}
