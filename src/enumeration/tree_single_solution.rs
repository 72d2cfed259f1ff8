use std::sync::Arc;

use anyhow::{Result, anyhow};

use crate::{
    surfaces::{normal_coordinates::NormalCoordinates, normal_surface::NormalSurface},
    triangulation::triangulation::Triangulation,
};

use super::{
    ban_constraint::BanConstraint,
    lp_constraint::LPConstraint,
    tree_traversal::{Canceller, TreeTraversal},
};

/**
 * Searches for a single non-trivial surface that satisfies the extra linear
 * constraint C and the bans of B, for instance a surface of positive Euler
 * characteristic.
 *
 * Unlike the enumeration, this search keeps no record of earlier solutions.
 * Quadrilateral types 0 and 1 are merged into a single branch 1 (no
 * constraint on the first quadrilateral), which is split again once a
 * solution is found. The search tries to set the unmarked triangle types to
 * zero one after another, starting at the root, and picks the next
 * quadrilateral position by how many of its branches are feasible.
 *
 * The constraint must exclude the zero vector.
 */
pub struct TreeSingleSolution<C: LPConstraint, B: BanConstraint> {
    traversal: TreeTraversal<C, B>,
    next_zero_level: usize,
}

impl<C: LPConstraint, B: BanConstraint> TreeSingleSolution<C, B> {
    pub fn new(triangulation: Arc<Triangulation>, coords: NormalCoordinates) -> Result<Self> {
        if C::SUBSPACE {
            return Err(anyhow!(
                "a single solution search needs a constraint that excludes the zero vector, but `{}` does not",
                C::NAME
            ));
        }
        if !coords.has_triangles() {
            return Err(anyhow!("a single solution search needs triangle coordinates, not {} coordinates", coords));
        }
        let branches_per_quad = if coords.has_octagons() { 6 } else { 3 };
        Ok(Self {
            traversal: TreeTraversal::new(triangulation, coords, branches_per_quad, 2, false)?,
            next_zero_level: 0,
        })
    }

    pub fn supported(coords: NormalCoordinates) -> bool {
        !C::SUBSPACE && coords.has_triangles() && TreeTraversal::<C, B>::supported(coords)
    }

    pub fn traversal(&self) -> &TreeTraversal<C, B> {
        &self.traversal
    }

    pub fn visited(&self) -> usize {
        self.traversal.visited()
    }

    pub fn types(&self) -> &[u8] {
        self.traversal.types()
    }

    pub fn type_string(&self) -> String {
        self.traversal.type_string()
    }

    /**
     * The surface found by the last successful call to find.
     */
    pub fn build_surface(&self) -> NormalSurface {
        self.traversal.build_surface()
    }

    pub fn percent(&self) -> f64 {
        self.traversal.percent()
    }

    pub fn canceller(&self) -> Canceller {
        self.traversal.canceller()
    }

    pub fn cancel(&self) {
        self.traversal.cancel()
    }

    /**
     * Runs the search. Returns true if a solution was found, in which case
     * build_surface gives it. Returns false if there is none, or if the
     * search was cancelled. Call this at most once.
     */
    pub fn find(&mut self) -> bool {
        let t = &mut self.traversal;
        if !t.init_root() {
            return false;
        }

        let Some(first) = t.next_unmarked_triangle_type(t.n) else {
            log::debug!("every triangle type is marked; nothing to search");
            return false;
        };
        t.set_next(first, 0);
        t.level = 0;

        while !t.cancelled() {
            let level = t.level;
            let idx = t.type_order[level];

            if t.out_of_range(idx) {
                t.types[idx] = 0;
                if level == 0 {
                    return false;
                }
                t.level -= 1;
                t.types[t.type_order[t.level]] += 1;
                continue;
            }

            t.visited += 1;

            let next = t.next_slot[level];
            let current = t.lp_slot[level];
            if t.types[idx] == 0 {
                if idx < t.n {
                    //types 0 and 1 form a single branch
                    t.types[idx] = 1;
                    if t.octagons_available() {
                        t.next_slot[level + 1] = next + 5;
                        t.clone_slot(next + 1, current);
                        t.clone_slot(next + 2, current);
                        t.clone_slot(next + 3, current);
                        t.lp[current].constrain_zero(3 * idx + 2);
                        t.clone_slot(next, current);
                        t.clone_slot(next + 4, current);
                        t.lp[current].constrain_zero(3 * idx + 1);
                    } else {
                        t.next_slot[level + 1] = next + 2;
                        t.clone_slot(next + 1, current);
                        t.lp[current].constrain_zero(3 * idx + 2);
                        t.clone_slot(next, current);
                        t.lp[current].constrain_zero(3 * idx + 1);
                    }
                } else {
                    t.next_slot[level + 1] = next + 1;
                    t.clone_slot(next, current);
                    t.lp[current].constrain_zero(2 * t.n + idx);
                }
            }

            let current_type = t.types[idx];
            let slot = match current_type {
                0 => current,
                1 if idx < t.n => current,
                quad_type if idx < t.n => {
                    let slot = next + quad_type as usize - 2;
                    let lp = &mut t.lp[slot];
                    match quad_type {
                        2 => {
                            lp.constrain_zero(3 * idx);
                            lp.constrain_positive(3 * idx + 1);
                        }
                        3 => {
                            lp.constrain_zero(3 * idx);
                            lp.constrain_zero(3 * idx + 1);
                            lp.constrain_positive(3 * idx + 2);
                        }
                        4 => {
                            lp.constrain_zero(3 * idx);
                            lp.constrain_oct(3 * idx + 1, 3 * idx + 2);
                        }
                        5 => {
                            lp.constrain_zero(3 * idx + 1);
                            lp.constrain_oct(3 * idx, 3 * idx + 2);
                        }
                        6 => lp.constrain_oct(3 * idx, 3 * idx + 1),
                        other => unreachable!("quadrilateral type {} is out of range", other),
                    }
                    slot
                }
                _ => {
                    t.lp[next].constrain_positive(2 * t.n + idx);
                    next
                }
            };
            t.lp_slot[level + 1] = slot;

            if !t.lp[slot].is_feasible() {
                t.types[idx] += 1;
                continue;
            }

            if level < t.n_types - 1 {
                if level == self.next_zero_level {
                    if t.types[idx] == 0 {
                        //the triangle is zero: continue with the quadrilaterals of its tetrahedron
                        t.set_next((idx - t.n) / 4, level + 1);
                    } else {
                        match t.next_unmarked_triangle_type(idx + 1) {
                            Some(triangle) => {
                                t.set_next(triangle, level + 1);
                                self.next_zero_level += 1;
                            }
                            None => return false,
                        }
                    }
                } else if t.type_order[level + 1] < t.n {
                    //choose the quadrilateral with the fewest feasible branches
                    let mut best = None;
                    let mut fewest = 5;
                    for i in level + 1..t.n_types {
                        let q = t.type_order[i];
                        if q < t.n {
                            let branches = t.feasible_branches(q);
                            if branches < fewest {
                                fewest = branches;
                                best = Some(q);
                                if branches == 0 {
                                    break;
                                }
                            }
                        }
                    }
                    if let Some(q) = best {
                        t.set_next(q, level + 1);
                    }
                }
                t.level += 1;
            } else {
                //split the merged types: a quadrilateral that can be zero becomes type 0
                for i in 0..t.n {
                    if t.types[i] == 1 {
                        t.scratch[0].init_clone(&t.lp[slot]);
                        t.scratch[0].constrain_zero(3 * i);
                        if t.scratch[0].is_feasible() {
                            t.lp[slot].constrain_zero(3 * i);
                            t.types[i] = 0;
                        } else {
                            t.lp[slot].constrain_positive(3 * i);
                        }
                    }
                }
                log::debug!("found a solution with types {} after {} nodes", t.type_string(), t.visited);
                return true;
            }
        }

        false
    }
}

impl<C: LPConstraint, B: BanConstraint> std::fmt::Debug for TreeSingleSolution<C, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "single solution search at zero level {}; {:?}", self.next_zero_level, self.traversal)
    }
}
