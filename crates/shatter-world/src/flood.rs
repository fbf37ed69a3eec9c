//! Scanline flood fill over the link graph.
//!
//! Membership is decided by a caller predicate, so the same walker gathers
//! a shape's cells, finds the component around a seed, or probes for a
//! fixed cell with an early exit. Visited state is the grid's generation
//! tag, so nothing has to be cleared between calls.

use std::collections::VecDeque;

use shatter_core::direction::{Direction, VERTICAL_DIRECTIONS};

use crate::grid::{Voxel, VoxelGrid};

impl VoxelGrid {
    /// Visit every cell reachable from `origin` over links for which
    /// `test` holds, each exactly once.
    ///
    /// Returns `true` when the fill ran to completion (or `origin` itself
    /// fails `test`), `false` as soon as `visit` asks to stop.
    pub fn flood_fill<T, V>(&mut self, origin: usize, mut test: T, mut visit: V) -> bool
    where
        T: FnMut(usize, &Voxel) -> bool,
        V: FnMut(usize, &Voxel) -> bool,
    {
        if !test(origin, self.voxel(origin)) {
            return true;
        }

        let generation = self.next_generation();
        let mut queue = VecDeque::new();
        let mut row = Vec::new();

        self.set_visit_tag(origin, generation);
        queue.push_back(origin);

        while let Some(seed) = queue.pop_front() {
            row.clear();
            row.push(seed);

            for dir in [Direction::West, Direction::East] {
                let mut current = seed;
                while let Some(next) = self.linked_neighbor(current, dir) {
                    if self.visit_tag(next) == generation || !test(next, self.voxel(next)) {
                        break;
                    }
                    self.set_visit_tag(next, generation);
                    row.push(next);
                    current = next;
                }
            }

            for &index in &row {
                if !visit(index, self.voxel(index)) {
                    return false;
                }
                for dir in VERTICAL_DIRECTIONS {
                    if let Some(next) = self.linked_neighbor(index, dir) {
                        if self.visit_tag(next) != generation && test(next, self.voxel(next)) {
                            self.set_visit_tag(next, generation);
                            queue.push_back(next);
                        }
                    }
                }
            }
        }

        true
    }

    /// Gather the full component around `origin` under `test`.
    pub fn collect_component<T>(&mut self, origin: usize, test: T) -> Vec<usize>
    where
        T: FnMut(usize, &Voxel) -> bool,
    {
        let mut out = Vec::new();
        self.flood_fill(origin, test, |index, _| {
            out.push(index);
            true
        });
        out
    }
}
