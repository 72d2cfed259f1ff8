use std::sync::Arc;

use anyhow::{Result, anyhow};

use crate::{
    surfaces::{normal_coordinates::NormalCoordinates, normal_surface::NormalSurface},
    triangulation::triangulation::Triangulation,
};

use super::{
    ban_constraint::BanConstraint,
    lp_constraint::LPConstraint,
    tree_traversal::{Canceller, Octagons, TreeTraversal},
    type_trie::TypeTrie,
};

/**
 * Enumerates the vertex normal or almost normal surfaces of a triangulation,
 * subject to the extra linear constraint C and the bans of B.
 *
 * Each call to `next` walks the search tree up to the next solution. Every
 * solution found is kept in a trie; a node whose type vector dominates an
 * earlier solution cannot lead to a new vertex and is skipped.
 */
pub struct TreeEnumeration<C: LPConstraint, B: BanConstraint> {
    traversal: TreeTraversal<C, B>,
    solutions: TypeTrie<7>,
    count: usize,
    last_non_zero: Option<usize>,
    finished: bool,
}

impl<C: LPConstraint, B: BanConstraint> TreeEnumeration<C, B> {
    pub fn new(triangulation: Arc<Triangulation>, coords: NormalCoordinates) -> Result<Self> {
        if !C::SUBSPACE {
            return Err(anyhow!(
                "vertex enumeration needs a constraint that describes a linear subspace, but `{}` does not",
                C::NAME
            ));
        }
        let branches_per_quad = if coords.has_octagons() { 7 } else { 4 };
        Ok(Self {
            traversal: TreeTraversal::new(triangulation, coords, branches_per_quad, 2, true)?,
            solutions: TypeTrie::new(),
            count: 0,
            last_non_zero: None,
            finished: false,
        })
    }

    pub fn supported(coords: NormalCoordinates) -> bool {
        C::SUBSPACE && TreeTraversal::<C, B>::supported(coords)
    }

    pub fn traversal(&self) -> &TreeTraversal<C, B> {
        &self.traversal
    }

    /**
     * The number of solutions found so far.
     */
    pub fn solutions(&self) -> usize {
        self.count
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
     * Moves on to the next vertex surface. Returns false once the search is
     * exhausted or cancelled; the current solution is then meaningless.
     */
    pub fn next_solution(&mut self) -> bool {
        if self.finished {
            return false;
        }
        let found = self.search();
        if !found {
            self.finished = true;
        }
        found
    }

    fn search(&mut self) -> bool {
        let t = &mut self.traversal;
        match self.last_non_zero {
            None => {
                if !t.init_root() {
                    return false;
                }
            }
            Some(last) => {
                //every trailing zero we could increment would dominate the previous solution
                t.level = last;
                t.types[t.type_order[last]] += 1;
            }
        }

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
                self.last_non_zero = Some(t.level);
                continue;
            }

            t.visited += 1;

            if t.types[idx] != 0 && self.solutions.dominates(t.types()) {
                t.types[idx] += 1;
                self.last_non_zero = Some(level);
                continue;
            }

            let next = t.next_slot[level];
            let slot;
            if t.types[idx] == 0 {
                //first visit: prepare the tableaux of the other branches, then solve type 0 in place
                let current = t.lp_slot[level];
                slot = current;
                if idx < t.n {
                    if t.octagons_available() {
                        t.next_slot[level + 1] = next + 6;
                        t.clone_slot(next, current);
                        t.clone_slot(next + 4, current);
                        t.clone_slot(next + 5, current);
                        t.lp[current].constrain_zero(3 * idx);
                        t.clone_slot(next + 1, current);
                        t.clone_slot(next + 3, current);
                        t.lp[current].constrain_zero(3 * idx + 1);
                        t.clone_slot(next + 2, current);
                        t.lp[current].constrain_zero(3 * idx + 2);
                    } else {
                        t.next_slot[level + 1] = next + 3;
                        t.clone_slot(next, current);
                        t.lp[current].constrain_zero(3 * idx);
                        t.clone_slot(next + 1, current);
                        t.lp[current].constrain_zero(3 * idx + 1);
                        t.clone_slot(next + 2, current);
                        t.lp[current].constrain_zero(3 * idx + 2);
                    }
                } else {
                    t.next_slot[level + 1] = next + 1;
                    t.clone_slot(next, current);
                    t.lp[current].constrain_zero(2 * t.n + idx);
                }
            } else if idx < t.n {
                slot = next + t.types[idx] as usize - 1;
                let lp = &mut t.lp[slot];
                match t.types[idx] {
                    1 => {
                        lp.constrain_zero(3 * idx + 1);
                        lp.constrain_zero(3 * idx + 2);
                        lp.constrain_positive(3 * idx);
                    }
                    2 => {
                        lp.constrain_zero(3 * idx + 2);
                        lp.constrain_positive(3 * idx + 1);
                    }
                    3 => lp.constrain_positive(3 * idx + 2),
                    4 => lp.constrain_oct(3 * idx + 1, 3 * idx + 2),
                    5 => {
                        lp.constrain_zero(3 * idx + 1);
                        lp.constrain_oct(3 * idx, 3 * idx + 2);
                    }
                    6 => {
                        lp.constrain_zero(3 * idx + 2);
                        lp.constrain_oct(3 * idx, 3 * idx + 1);
                    }
                    other => unreachable!("quadrilateral type {} is out of range", other),
                }
            } else {
                slot = next;
                t.lp[slot].constrain_positive(2 * t.n + idx);
            }
            t.lp_slot[level + 1] = slot;

            //the zero vector is not a solution
            if self.last_non_zero.is_none() && level == t.n_types - 1 {
                t.types[idx] += 1;
                self.last_non_zero = Some(level);
                continue;
            }

            if t.lp[slot].is_feasible() {
                if level < t.n_types - 1 {
                    t.level += 1;
                } else {
                    self.solutions.insert(t.types());
                    self.count += 1;
                    log::trace!("solution {}: {}", self.count, t.type_string());
                    return true;
                }
            } else {
                t.types[idx] += 1;
                self.last_non_zero = Some(level);
            }
        }

        false
    }

    /**
     * Runs the whole enumeration, handing every solution to the callback.
     * Returns true if the callback asked to stop early by returning true.
     */
    pub fn run(&mut self, mut use_solution: impl FnMut(&Self) -> bool) -> bool {
        while self.next_solution() {
            if use_solution(self) {
                return true;
            }
        }
        false
    }

    /**
     * A callback for run that prints the type vector of every solution.
     */
    pub fn write_types(tree: &Self) -> bool {
        println!("SOLN #{}: {}", tree.solutions(), tree.type_string());
        false
    }

    /**
     * A callback for run that prints every surface.
     */
    pub fn write_surface(tree: &Self) -> bool {
        println!("SOLN #{}: {}", tree.solutions(), tree.build_surface());
        false
    }

    pub fn octagons(&self) -> Octagons {
        self.traversal.octagons()
    }
}

/**
 * Iterates over the type vectors of the solutions.
 */
impl<C: LPConstraint, B: BanConstraint> Iterator for TreeEnumeration<C, B> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_solution() {
            Some(self.types().to_vec())
        } else {
            None
        }
    }
}

impl<C: LPConstraint, B: BanConstraint> std::fmt::Debug for TreeEnumeration<C, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "enumeration with {} solutions; {:?}", self.count, self.traversal)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc};

    use ntest::timeout;
    use num::BigInt;

    use crate::{
        enumeration::{
            ban_constraint::{BanBoundary, BanConstraint, BanNone, BanTorusBoundary},
            lp_constraint::{LPConstraint, LPConstraintEulerPositive, LPConstraintEulerZero, LPConstraintNonSpun, LPConstraintNone},
        },
        surfaces::{normal_coordinates::NormalCoordinates, normal_surface::NormalSurface},
        triangulation::{perm::Perm4, triangulation::Triangulation},
    };

    use super::TreeEnumeration;

    fn enumerate<C: LPConstraint, B: BanConstraint>(tri: &Arc<Triangulation>, coords: NormalCoordinates) -> Vec<NormalSurface> {
        let mut tree = TreeEnumeration::<C, B>::new(tri.clone(), coords).unwrap();
        let mut result = vec![];
        while tree.next_solution() {
            let surface = tree.build_surface();
            assert!(surface.satisfies_matching_equations(), "{:?}", surface);
            assert!(C::verify(&surface) || tree.traversal().constraints_broken());
            assert!(!surface.is_zero());
            result.push(surface);
        }
        assert_eq!(tree.solutions(), result.len());
        assert!(!tree.next_solution());
        result
    }

    fn count(sig: &str, coords: NormalCoordinates) -> usize {
        let tri = Arc::new(Triangulation::from_iso_sig(sig).unwrap());
        enumerate::<LPConstraintNone, BanNone>(&tri, coords).len()
    }

    fn vector(values: &[i64]) -> Vec<BigInt> {
        values.iter().map(|x| BigInt::from(*x)).collect()
    }

    #[test]
    fn single_tetrahedron() {
        let tri = Arc::new(Triangulation::with_size(1));
        for (coords, expected) in [
            (NormalCoordinates::Quad, 3),
            (NormalCoordinates::Standard, 7),
            (NormalCoordinates::AlmostNormal, 10),
            (NormalCoordinates::AlmostNormalQuadOct, 6),
        ] {
            let surfaces = enumerate::<LPConstraintNone, BanNone>(&tri, coords);
            assert_eq!(surfaces.len(), expected, "{}", coords);

            //every vertex is a single disc
            for surface in surfaces.iter() {
                assert_eq!(surface.vector().iter().filter(|x| **x != BigInt::from(0)).count(), 1);
            }
        }
    }

    #[test]
    #[timeout(60000)]
    fn single_tetrahedron_octagons() {
        let tri = Arc::new(Triangulation::with_size(1));
        let surfaces = enumerate::<LPConstraintNone, BanNone>(&tri, NormalCoordinates::AlmostNormal);
        assert_eq!(surfaces.iter().filter(|s| s.has_octagon()).count(), 3);
        assert!(surfaces.iter().all(|s| s.octagon_count_types() <= 1));
    }

    #[test]
    #[timeout(60000)]
    fn figure_eight() {
        assert_eq!(count("cPcbbbiht", NormalCoordinates::Quad), 4);
        assert_eq!(count("cPcbbbiht", NormalCoordinates::Standard), 1);
        assert_eq!(count("cPcbbbiht", NormalCoordinates::AlmostNormal), 1);
    }

    #[test]
    fn figure_eight_quads_are_spun() {
        let tri = Arc::new(Triangulation::from_iso_sig("cPcbbbiht").unwrap());
        let surfaces = enumerate::<LPConstraintNone, BanNone>(&tri, NormalCoordinates::Quad);
        for surface in surfaces.iter() {
            assert_eq!(surface.is_compact(), Some(false));
        }

        let vectors = surfaces.iter().map(|s| s.vector().to_vec()).collect::<HashSet<_>>();
        assert_eq!(vectors.len(), 4);
    }

    #[test]
    #[timeout(60000)]
    fn figure_eight_link() {
        let tri = Arc::new(Triangulation::from_iso_sig("cPcbbbiht").unwrap());
        let surfaces = enumerate::<LPConstraintNone, BanNone>(&tri, NormalCoordinates::Standard);
        //the vertex link: eight triangles in each tetrahedron, no quadrilaterals
        assert_eq!(surfaces[0].vector(), vector(&[1, 1, 1, 1, 0, 0, 0, 1, 1, 1, 1, 0, 0, 0]).as_slice());
        assert_eq!(surfaces[0].euler_char(), Some(BigInt::from(0)));
    }

    #[test]
    fn layered_loop() {
        assert_eq!(count("bkaagb", NormalCoordinates::Quad), 1);
        assert_eq!(count("bkaagb", NormalCoordinates::Standard), 3);
        assert_eq!(count("bkaagb", NormalCoordinates::AlmostNormal), 4);
    }

    #[test]
    fn euler_zero() {
        //two vertex linking spheres and one torus around the core edges
        let tri = Arc::new(Triangulation::from_iso_sig("bkaagb").unwrap());
        let surfaces = enumerate::<LPConstraintEulerZero, BanNone>(&tri, NormalCoordinates::Standard);
        assert_eq!(surfaces.len(), 1);
        assert_eq!(surfaces[0].euler_char(), Some(BigInt::from(0)));

        let tri = Arc::new(Triangulation::from_iso_sig("cPcbbbiht").unwrap());
        let surfaces = enumerate::<LPConstraintEulerZero, BanNone>(&tri, NormalCoordinates::Standard);
        assert_eq!(surfaces.len(), 1);
    }

    #[test]
    fn non_spun() {
        //all four quad vertices are spun
        let tri = Arc::new(Triangulation::from_iso_sig("cPcbbbiht").unwrap());
        assert!(enumerate::<LPConstraintNonSpun, BanNone>(&tri, NormalCoordinates::Quad).is_empty());

        //no cusp: the constraint is dropped
        let tri = Arc::new(Triangulation::from_iso_sig("bkaagb").unwrap());
        let mut tree = TreeEnumeration::<LPConstraintNonSpun, BanNone>::new(tri, NormalCoordinates::Quad).unwrap();
        assert!(tree.traversal().constraints_broken());
        let mut solutions = 0;
        while tree.next_solution() {
            solutions += 1;
        }
        assert_eq!(solutions, 1);
    }

    #[test]
    fn bans() {
        //every disc of a lone tetrahedron touches the boundary
        let tri = Arc::new(Triangulation::with_size(1));
        assert!(enumerate::<LPConstraintNone, BanBoundary>(&tri, NormalCoordinates::Standard).is_empty());
        assert_eq!(enumerate::<LPConstraintNone, BanTorusBoundary>(&tri, NormalCoordinates::Standard).len(), 7);

        let mut solid_torus = Triangulation::with_size(1);
        solid_torus.join(0, 0, 0, Perm4::new([1, 2, 3, 0]));
        let tri = Arc::new(solid_torus);
        assert!(enumerate::<LPConstraintNone, BanTorusBoundary>(&tri, NormalCoordinates::Standard).is_empty());
    }

    #[test]
    fn unsupported() {
        let tri = Arc::new(Triangulation::with_size(1));
        assert!(TreeEnumeration::<LPConstraintEulerPositive, BanNone>::new(tri.clone(), NormalCoordinates::Standard).is_err());
        assert!(TreeEnumeration::<LPConstraintNone, BanBoundary>::new(tri.clone(), NormalCoordinates::Quad).is_err());
        assert!(!TreeEnumeration::<LPConstraintEulerPositive, BanNone>::supported(NormalCoordinates::Standard));
        assert!(TreeEnumeration::<LPConstraintNone, BanNone>::supported(NormalCoordinates::AlmostNormal));
    }

    #[test]
    fn run_and_iterate() {
        let tri = Arc::new(Triangulation::from_iso_sig("bkaagb").unwrap());
        let mut tree = TreeEnumeration::<LPConstraintNone, BanNone>::new(tri.clone(), NormalCoordinates::Standard).unwrap();
        let mut seen = 0;
        assert!(tree.run(|t| {
            seen += 1;
            t.solutions() == 2
        }));
        assert_eq!(seen, 2);
        assert!(!tree.run(TreeEnumeration::write_types));
        assert_eq!(tree.solutions(), 3);

        let tree = TreeEnumeration::<LPConstraintNone, BanNone>::new(tri, NormalCoordinates::Standard).unwrap();
        let types = tree.collect::<Vec<_>>();
        assert_eq!(types.len(), 3);
        assert!(types.iter().all(|t| t.len() == 5));
    }

    #[test]
    fn cancelled_before_start() {
        let tri = Arc::new(Triangulation::from_iso_sig("bkaagb").unwrap());
        let mut tree = TreeEnumeration::<LPConstraintNone, BanNone>::new(tri, NormalCoordinates::Standard).unwrap();
        tree.canceller().cancel();
        assert!(!tree.next_solution());
        assert_eq!(tree.solutions(), 0);
    }

    #[test]
    #[timeout(60000)]
    fn deterministic() {
        let tri = Arc::new(Triangulation::from_iso_sig("cPcbbbiht").unwrap());
        let first = TreeEnumeration::<LPConstraintNone, BanNone>::new(tri.clone(), NormalCoordinates::Quad).unwrap().collect::<Vec<_>>();
        let second = TreeEnumeration::<LPConstraintNone, BanNone>::new(tri, NormalCoordinates::Quad).unwrap().collect::<Vec<_>>();
        assert_eq!(first, second);
    }
}
