use std::collections::VecDeque;

use crate::surfaces::disc_tables::QUAD_SEPARATING;

use super::{
    perm::Perm4,
    skeleton::{DisjointSets, VertexType},
    triangulation::Triangulation,
};

/**
 * The two slope equations of the cusp of a one-cusped orientable triangulation,
 * in quadrilateral coordinates (3 columns per tetrahedron).
 *
 * Each equation measures how often a surface winds around one of two curves
 * that form a basis of the homology of the cusp torus. A quadrilateral vector
 * describes a compact surface exactly when both equations vanish.
 */
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CuspSlopes {
    pub equations: [Vec<i64>; 2],
}

impl Triangulation {
    /**
     * Returns None unless the triangulation is orientable and has exactly one
     * vertex, which is ideal with a torus link.
     */
    pub fn cusp_slopes(&self) -> Option<CuspSlopes> {
        let skeleton = self.skeleton();
        if self.is_empty()
            || !skeleton.is_orientable()
            || skeleton.vertices.len() != 1
            || skeleton.vertices[0].vertex_type != VertexType::Ideal
            || skeleton.vertices[0].link_euler_char != 0
        {
            return None;
        }
        let n = self.size();
        let cusp = CuspTorus::new(self);
        let curves = cusp.homology_basis();
        if curves.len() != 2 {
            log::warn!("cusp torus has {} leftover sides; expected 2", curves.len());
            return None;
        }

        let mut equations = [vec![0; 3 * n], vec![0; 3 * n]];
        for (equation, curve) in equations.iter_mut().zip(curves.iter()) {
            //turning counts per tetrahedron and pair of opposite edges
            let mut turning = vec![[0i64; 3]; n];
            for passage in curve.iter() {
                let (t, v) = (passage.triangle / 4, passage.triangle % 4);
                let (a, b) = (passage.enter, passage.exit);
                let c = (0..4).find(|x| *x != v && *x != a && *x != b).unwrap_or(0);
                let sign = Perm4::new([v as u8, a as u8, b as u8, c as u8]).sign() as i64;
                turning[t][QUAD_SEPARATING[v][c]] += sign;
            }
            for t in 0..n {
                for k in 0..3 {
                    equation[3 * t + k] = turning[t][(k + 1) % 3] - turning[t][(k + 2) % 3];
                }
            }
        }

        log::debug!("cusp slope equations {:?}", equations);
        Some(CuspSlopes { equations })
    }
}

/**
 * A curve passes through a link triangle 4t+v, entering through the side in
 * facet `enter` and leaving through the side in facet `exit`.
 */
#[derive(Clone, Copy, Debug)]
struct Passage {
    triangle: usize,
    enter: usize,
    exit: usize,
}

/**
 * The vertex link of a one-vertex triangulation: triangle 4t+v for each
 * vertex v of each tetrahedron t.
 */
struct CuspTorus<'a> {
    tri: &'a Triangulation,
}

impl<'a> CuspTorus<'a> {
    fn new(tri: &'a Triangulation) -> Self {
        Self { tri }
    }

    /**
     * The triangle and side on the other side of side w of triangle 4t+v.
     */
    fn across(&self, triangle: usize, side: usize) -> Option<(usize, usize)> {
        let (t, v) = (triangle / 4, triangle % 4);
        self.tri
            .adjacent(t, side)
            .map(|gluing| (4 * gluing.tetrahedron + gluing.perm.apply(v), gluing.perm.apply(side)))
    }

    /**
     * Tree-cotree decomposition: a spanning tree of the dual graph, then a
     * spanning forest of the link vertices on the remaining sides. Every side
     * left over closes a dual cycle; on a torus there are two of them.
     */
    fn homology_basis(&self) -> Vec<Vec<Passage>> {
        let triangles = 4 * self.tri.size();

        //dual spanning tree by breadth-first search; parent[x] = (side of x towards the parent, parent)
        let mut parent: Vec<Option<(usize, usize)>> = vec![None; triangles];
        let mut depth = vec![usize::MAX; triangles];
        let mut dual_tree = vec![[false; 4]; triangles];
        let mut queue = VecDeque::new();
        depth[0] = 0;
        queue.push_back(0);
        while let Some(x) = queue.pop_front() {
            let v = x % 4;
            for side in (0..4).filter(|s| *s != v) {
                if let Some((y, back)) = self.across(x, side) {
                    if depth[y] == usize::MAX {
                        depth[y] = depth[x] + 1;
                        parent[y] = Some((back, x));
                        dual_tree[x][side] = true;
                        dual_tree[y][back] = true;
                        queue.push_back(y);
                    }
                }
            }
        }

        //primal spanning forest over the corners (t, v, c), identified across gluings
        let mut corners = DisjointSets::new(16 * self.tri.size());
        for x in 0..triangles {
            let (t, v) = (x / 4, x % 4);
            for side in (0..4).filter(|s| *s != v) {
                if let Some(gluing) = self.tri.adjacent(t, side) {
                    for c in (0..4).filter(|c| *c != v && *c != side) {
                        corners.union(16 * t + 4 * v + c, 16 * gluing.tetrahedron + 4 * gluing.perm.apply(v) + gluing.perm.apply(c));
                    }
                }
            }
        }
        let mut link_vertices = DisjointSets::new(16 * self.tri.size());
        let mut leftover = vec![];
        for x in 0..triangles {
            let (t, v) = (x / 4, x % 4);
            for side in (0..4).filter(|s| *s != v) {
                let Some((y, back)) = self.across(x, side) else {
                    continue;
                };
                //every side is seen from both triangles; keep one
                if (y, back) < (x, side) || dual_tree[x][side] {
                    continue;
                }
                let mut ends = (0..4).filter(|c| *c != v && *c != side);
                let (c1, c2) = (ends.next().unwrap_or(0), ends.next().unwrap_or(0));
                let e1 = corners.find(16 * t + 4 * v + c1);
                let e2 = corners.find(16 * t + 4 * v + c2);
                if !link_vertices.union(e1, e2) {
                    leftover.push((x, side));
                }
            }
        }

        leftover.into_iter().map(|(x, side)| self.dual_cycle(x, side, &parent, &depth)).collect()
    }

    /**
     * The closed curve that crosses the given side once and otherwise runs
     * through the dual tree.
     */
    fn dual_cycle(&self, start: usize, side: usize, parent: &[Option<(usize, usize)>], depth: &[usize]) -> Vec<Passage> {
        //(triangle, exit side) in order along the curve
        let mut exits = vec![(start, side)];
        let Some((other, _)) = self.across(start, side) else {
            return vec![];
        };

        //climb from both ends to the common ancestor
        let mut up = vec![];
        let mut down = vec![];
        let (mut a, mut b) = (other, start);
        while a != b {
            if depth[a] >= depth[b] {
                let Some((towards_parent, p)) = parent[a] else {
                    break;
                };
                up.push((a, towards_parent));
                a = p;
            } else {
                let Some((towards_parent, p)) = parent[b] else {
                    break;
                };
                down.push((b, towards_parent));
                b = p;
            }
        }
        exits.extend(up);
        //descend towards start: leave each parent through the side glued to its child
        for (child, towards_parent) in down.into_iter().rev() {
            if let Some((p, side_of_parent)) = self.across(child, towards_parent) {
                exits.push((p, side_of_parent));
            }
        }

        let mut result = Vec::with_capacity(exits.len());
        for i in 0..exits.len() {
            let (previous, previous_exit) = exits[(i + exits.len() - 1) % exits.len()];
            let enter = self.across(previous, previous_exit).map_or(0, |(_, s)| s);
            let (triangle, exit) = exits[i];
            result.push(Passage { triangle, enter, exit });
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::triangulation::triangulation::Triangulation;

    #[test]
    fn figure_eight() {
        let tri = Triangulation::from_iso_sig("cPcbbbiht").unwrap();
        let slopes = tri.cusp_slopes().unwrap();
        for equation in slopes.equations.iter() {
            assert_eq!(equation.len(), 6);
            //each tetrahedron contributes a difference of turning counts
            for t in 0..2 {
                assert_eq!(equation[3 * t..3 * t + 3].iter().sum::<i64>(), 0);
            }
        }
        assert!(slopes.equations.iter().any(|e| e.iter().any(|x| *x != 0)));
        assert_ne!(slopes.equations[0], slopes.equations[1]);
    }

    #[test]
    fn unsupported_triangulations() {
        assert!(Triangulation::from_iso_sig("bkaagb").unwrap().cusp_slopes().is_none());
        assert!(Triangulation::with_size(1).cusp_slopes().is_none());
        assert!(Triangulation::new().cusp_slopes().is_none());
    }
}
