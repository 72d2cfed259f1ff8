use std::{fmt::Write, sync::Arc};

use anyhow::{Result, anyhow};
use num::{BigInt, Zero};
use parking_lot::Mutex;

use crate::{
    optimisation_algorithms::{initial_tableau::InitialTableau, tableau::Tableau},
    surfaces::{normal_coordinates::NormalCoordinates, normal_surface::NormalSurface},
    triangulation::triangulation::Triangulation,
};

use super::{ban_constraint::BanConstraint, lp_constraint::LPConstraint};

/**
 * A handle that stops a running search from another thread. Cancelling is
 * permanent.
 */
#[derive(Clone, Default, Debug)]
pub struct Canceller(Arc<Mutex<bool>>);

impl Canceller {
    pub fn cancel(&self) {
        *self.0.lock() = true;
    }

    pub fn cancelled(&self) -> bool {
        *self.0.lock()
    }
}

/**
 * Where the single octagon type of an almost normal search stands.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Octagons {
    /**
     * The coordinate system has no octagons.
     */
    Unavailable,
    /**
     * No level has claimed the octagon yet.
     */
    Available,
    /**
     * The quadrilateral position at this level holds the octagon.
     */
    At(usize),
}

/**
 * The machinery that the enumeration and the single solution search share:
 * the type vector and the order in which its positions are chosen, the arena
 * of tableaux along the current path of the search tree, and the counters.
 *
 * Type positions 0..n are the quadrilateral types of the (internal)
 * tetrahedra. In the coordinate systems with triangles, position n + 4i + j
 * is the triangle type of vertex j of tetrahedron i, which is internal
 * column 2n + position.
 *
 * lp_slot[l] is the arena index of the tableau with the constraints of the
 * first l levels, and next_slot[l] is the first arena index that level l may
 * use for the tableaux of its branches.
 */
pub struct TreeTraversal<C: LPConstraint, B: BanConstraint> {
    pub(super) initial: Arc<InitialTableau<C>>,
    pub(super) coords: NormalCoordinates,
    pub(super) ban: B,
    pub(super) n: usize,
    pub(super) n_types: usize,
    pub(super) types: Vec<u8>,
    pub(super) type_order: Vec<usize>,
    pub(super) level: usize,
    pub(super) octagons: Octagons,
    pub(super) lp: Vec<Tableau<C>>,
    pub(super) lp_slot: Vec<usize>,
    pub(super) next_slot: Vec<usize>,
    pub(super) scratch: [Tableau<C>; 4],
    pub(super) visited: usize,
    canceller: Canceller,
}

impl<C: LPConstraint, B: BanConstraint> TreeTraversal<C, B> {
    /**
     * Sets up a traversal that branches the given number of ways on every
     * quadrilateral and triangle position.
     */
    pub(super) fn new(
        triangulation: Arc<Triangulation>,
        coords: NormalCoordinates,
        branches_per_quad: usize,
        branches_per_triangle: usize,
        enumeration: bool,
    ) -> Result<Self> {
        if !Self::supported(coords) {
            return Err(anyhow!(
                "the constraint `{}` with ban `{}` is not supported in {} coordinates",
                C::NAME,
                B::NAME,
                coords
            ));
        }

        let initial = Arc::new(InitialTableau::<C>::new(triangulation, coords, enumeration)?);
        let ban = B::new(&initial);
        let n = initial.triangulation().size();
        let n_types = coords.type_vector_length(n);

        //one branch of each position is solved in place; plus the root
        let arena = if coords.has_triangles() {
            (branches_per_quad - 1) * n + (branches_per_triangle - 1) * 4 * n + 1
        } else {
            (branches_per_quad - 1) * n + 1
        };
        log::debug!("tree traversal over {} types with {} tableaux", n_types, arena);

        let lp = (0..arena).map(|_| Tableau::new(&initial)).collect();
        let scratch = std::array::from_fn(|_| Tableau::new(&initial));

        let mut lp_slot = vec![0; n_types + 1];
        let mut next_slot = vec![0; n_types + 1];
        lp_slot[0] = 0;
        next_slot[0] = 1;

        Ok(Self {
            initial,
            coords,
            ban,
            n,
            n_types,
            types: vec![0; n_types + 1],
            type_order: (0..n_types).collect(),
            level: 0,
            octagons: if coords.has_octagons() {
                Octagons::Available
            } else {
                Octagons::Unavailable
            },
            lp,
            lp_slot,
            next_slot,
            scratch,
            visited: 0,
            canceller: Canceller::default(),
        })
    }

    /**
     * Whether the constraint and ban can be used in the given coordinate system.
     */
    pub fn supported(coords: NormalCoordinates) -> bool {
        C::supported(coords) && B::supported(coords)
    }

    pub fn coordinates(&self) -> NormalCoordinates {
        self.coords
    }

    pub fn initial(&self) -> &Arc<InitialTableau<C>> {
        &self.initial
    }

    pub fn ban(&self) -> &B {
        &self.ban
    }

    /**
     * Whether the extra linear constraint could not be added to the
     * tableaux, in which case the search runs without it.
     */
    pub fn constraints_broken(&self) -> bool {
        self.initial.constraints_broken()
    }

    /**
     * The number of nodes of the search tree visited so far.
     */
    pub fn visited(&self) -> usize {
        self.visited
    }

    /**
     * The current type vector, indexed by type position.
     */
    pub fn types(&self) -> &[u8] {
        &self.types[..self.n_types]
    }

    pub fn octagons(&self) -> Octagons {
        self.octagons
    }

    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    pub fn cancel(&self) {
        self.canceller.cancel()
    }

    pub fn cancelled(&self) -> bool {
        self.canceller.cancelled()
    }

    pub fn dump_types(&self, f: &mut impl Write) -> std::fmt::Result {
        for t in self.types() {
            write!(f, "{}", t)?;
        }
        Ok(())
    }

    /**
     * The current type vector as a string of digits.
     */
    pub fn type_string(&self) -> String {
        let mut result = String::with_capacity(self.n_types);
        //writing into a string cannot fail
        let _ = self.dump_types(&mut result);
        result
    }

    /**
     * A rough estimate of how far through the search tree the current type
     * vector is, as a percentage. Only the levels close to the root are
     * examined, so the result is accurate to about 0.01.
     */
    pub fn percent(&self) -> f64 {
        let mut percent = 0.0;
        let mut range = 100.0;
        let mut quads_remaining = self.n;

        for (level, position) in self.type_order.iter().enumerate() {
            if range <= 0.01 {
                break;
            }
            let t = self.types[*position] as f64;
            if *position >= self.n {
                range /= 2.0;
                percent += range * t;
                continue;
            }

            //with an octagon still to come, a quadrilateral has 3q + 4 choices
            let den = (3 * quads_remaining + 4) as f64;
            match self.octagons {
                Octagons::Unavailable => {
                    range /= 4.0;
                    percent += range * t;
                }
                Octagons::At(oct_level) if oct_level < level => {
                    range /= 4.0;
                    percent += range * t;
                }
                Octagons::At(oct_level) if oct_level == level => {
                    range /= den;
                    percent += range * ((den - 3.0) + (t - 4.0));
                }
                _ => {
                    range = (range * (den - 3.0)) / (4.0 * den);
                    percent += range * t;
                }
            }
            quads_remaining -= 1;
        }

        percent
    }

    /**
     * Makes the given arena slot a copy of another.
     */
    pub(super) fn clone_slot(&mut self, dest: usize, src: usize) {
        assert_ne!(dest, src, "cannot clone a tableau into itself");
        if dest < src {
            let (low, high) = self.lp.split_at_mut(src);
            low[dest].init_clone(&high[0]);
        } else {
            let (low, high) = self.lp.split_at_mut(dest);
            high[0].init_clone(&low[src]);
        }
    }

    /**
     * The first call of either search: the root tableau with the bans
     * enforced. Returns whether it is feasible.
     */
    pub(super) fn init_root(&mut self) -> bool {
        self.lp[0].init_start();
        self.ban.enforce_bans(&mut self.lp[0]);
        self.visited += 1;
        self.lp[0].is_feasible()
    }

    /**
     * Checks whether the type at the given position has run past its last
     * value, claiming or releasing the octagon on the way.
     */
    pub(super) fn out_of_range(&mut self, position: usize) -> bool {
        match self.types[position] {
            4 if position < self.n => {
                if self.octagons == Octagons::Available {
                    //the quadrilateral types are used up; try the octagons here
                    self.octagons = Octagons::At(self.level);
                    false
                } else {
                    true
                }
            }
            7 => {
                self.octagons = Octagons::Available;
                true
            }
            2 => position >= self.n,
            _ => false,
        }
    }

    /**
     * Whether octagons may still be used at the current level.
     */
    pub(super) fn octagons_available(&self) -> bool {
        self.octagons == Octagons::Available
    }

    /**
     * Moves the given type position so that it is chosen at the next level,
     * shifting the positions in between down by one.
     */
    pub(super) fn set_next(&mut self, next: usize, position: usize) {
        if let Some(found) = self.type_order[position..].iter().position(|t| *t == next) {
            self.type_order[position..=position + found].rotate_right(1);
        }
    }

    /**
     * The first triangle type position from start onwards that is not
     * marked by the ban constraint.
     */
    pub(super) fn next_unmarked_triangle_type(&self, start: usize) -> Option<usize> {
        (start..self.n_types).find(|position| !self.ban.marked(2 * self.n + position))
    }

    /**
     * For the quadrilateral type position q, counts how many of its four
     * types (0, 1, 2, 3) are feasible on top of the tableau for the next
     * level, using the scratch tableaux.
     */
    pub(super) fn feasible_branches(&mut self, q: usize) -> usize {
        let base = self.lp_slot[self.level + 1];
        let [tmp0, tmp1, tmp2, tmp3] = &mut self.scratch;

        tmp0.init_clone(&self.lp[base]);
        tmp1.init_clone(tmp0);
        tmp1.constrain_zero(3 * q + 1);
        tmp1.constrain_zero(3 * q + 2);
        tmp1.constrain_positive(3 * q);

        tmp0.constrain_zero(3 * q);
        if !tmp0.is_feasible() {
            return tmp1.is_feasible() as usize;
        }

        tmp2.init_clone(tmp0);
        tmp2.constrain_zero(3 * q + 2);
        tmp2.constrain_positive(3 * q + 1);

        tmp0.constrain_zero(3 * q + 1);
        if !tmp0.is_feasible() {
            return tmp1.is_feasible() as usize + tmp2.is_feasible() as usize;
        }

        tmp3.init_clone(tmp0);
        tmp3.constrain_positive(3 * q + 2);

        tmp0.constrain_zero(3 * q + 2);
        [tmp0, tmp1, tmp2, tmp3].iter().filter(|lp| lp.is_feasible()).count()
    }

    /**
     * The surface of the current solution, in the coordinates that the
     * traversal was created with.
     *
     * If the type vector is not that of a vertex surface (as may be the case
     * for the single solution search), this is one of the surfaces it
     * describes.
     */
    pub fn build_surface(&self) -> NormalSurface {
        let v = self.lp[self.lp_slot[self.n_types]].extract_solution(&self.types);
        let triangulation = Arc::clone(self.initial.triangulation());
        let n = self.n;

        let (block, lp_block, quad_offset) = match self.coords {
            NormalCoordinates::Quad | NormalCoordinates::Standard => {
                return NormalSurface::new(triangulation, self.coords, v);
            }
            NormalCoordinates::AlmostNormalQuadOct => (6, 3, 0),
            NormalCoordinates::AlmostNormal => (10, 7, 4),
        };

        let mut an = vec![BigInt::zero(); block * n];
        for i in 0..n {
            an[block * i..block * i + lp_block].clone_from_slice(&v[lp_block * i..lp_block * (i + 1)]);
        }

        if let Octagons::At(oct_level) = self.octagons {
            let position = self.type_order[oct_level];
            let tetrahedron = self.initial.col_perm()[3 * position] / lp_block;
            let oct_type = (self.types[position] - 4) as usize;
            an[block * tetrahedron + lp_block + oct_type] =
                v[lp_block * tetrahedron + quad_offset + (oct_type + 1) % 3].clone();
            for j in 0..3 {
                an[block * tetrahedron + quad_offset + j].set_zero();
            }
        }

        NormalSurface::new(triangulation, self.coords, an)
    }
}

impl<C: LPConstraint, B: BanConstraint> std::fmt::Debug for TreeTraversal<C, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "tree traversal in {} coordinates at level {} with types {}, octagons {:?}, {} nodes visited",
            self.coords,
            self.level,
            self.type_string(),
            self.octagons,
            self.visited
        )
    }
}
