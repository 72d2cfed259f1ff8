use std::{fmt::Display, sync::Arc};

use itertools::Itertools;
use num::{BigInt, Zero};

use crate::triangulation::triangulation::Triangulation;

use super::{
    disc_tables::{QUAD_MEETING, QUAD_SEPARATING},
    matching_equations::matching_equations,
    normal_coordinates::NormalCoordinates,
};

/**
 * A normal or almost normal surface, given by its vector in one of the
 * coordinate systems.
 */
#[derive(Clone)]
pub struct NormalSurface {
    triangulation: Arc<Triangulation>,
    coords: NormalCoordinates,
    vector: Vec<BigInt>,
}

impl NormalSurface {
    pub fn new(triangulation: Arc<Triangulation>, coords: NormalCoordinates, vector: Vec<BigInt>) -> Self {
        assert_eq!(vector.len(), coords.surface_block() * triangulation.size());
        Self {
            triangulation,
            coords,
            vector,
        }
    }

    pub fn coordinates(&self) -> NormalCoordinates {
        self.coords
    }

    pub fn vector(&self) -> &[BigInt] {
        &self.vector
    }

    pub fn triangulation(&self) -> &Triangulation {
        &self.triangulation
    }

    pub fn is_zero(&self) -> bool {
        self.vector.iter().all(|x| x.is_zero())
    }

    /**
     * Number of triangles about vertex v of tetrahedron t. Always zero in the
     * quadrilateral systems, which do not store triangles.
     */
    pub fn triangles(&self, tetrahedron: usize, vertex: usize) -> BigInt {
        if self.coords.has_triangles() {
            self.vector[self.coords.surface_block() * tetrahedron + vertex].clone()
        } else {
            BigInt::zero()
        }
    }

    pub fn quads(&self, tetrahedron: usize, quad: usize) -> BigInt {
        let offset = if self.coords.has_triangles() { 4 } else { 0 };
        self.vector[self.coords.surface_block() * tetrahedron + offset + quad].clone()
    }

    pub fn octs(&self, tetrahedron: usize, oct: usize) -> BigInt {
        match self.coords {
            NormalCoordinates::AlmostNormal => self.vector[10 * tetrahedron + 7 + oct].clone(),
            NormalCoordinates::AlmostNormalQuadOct => self.vector[6 * tetrahedron + 3 + oct].clone(),
            _ => BigInt::zero(),
        }
    }

    pub fn has_octagon(&self) -> bool {
        self.octagon_count_types() > 0
    }

    /**
     * The number of distinct (tetrahedron, octagon type) pairs present.
     */
    pub fn octagon_count_types(&self) -> usize {
        (0..self.triangulation.size())
            .cartesian_product(0..3)
            .filter(|(t, k)| !self.octs(*t, *k).is_zero())
            .count()
    }

    /**
     * The vector in the coordinates of the linear programs: octagons become a
     * pair of quadrilaterals of the other two types.
     */
    pub fn lp_vector(&self) -> Vec<BigInt> {
        let internal = self.coords.internal();
        let block = internal.columns_per_tetrahedron();
        let offset = if internal.has_triangles() { 4 } else { 0 };
        let mut result = vec![BigInt::zero(); block * self.triangulation.size()];
        for t in 0..self.triangulation.size() {
            for v in 0..offset {
                result[block * t + v] = self.triangles(t, v);
            }
            for q in 0..3 {
                result[block * t + offset + q] = self.quads(t, q);
            }
            for k in 0..3 {
                let octs = self.octs(t, k);
                if !octs.is_zero() {
                    result[block * t + offset + (k + 1) % 3] += &octs;
                    result[block * t + offset + (k + 2) % 3] += &octs;
                }
            }
        }
        result
    }

    pub fn satisfies_matching_equations(&self) -> bool {
        let lp = self.lp_vector();
        matching_equations(&self.triangulation, self.coords)
            .iter()
            .all(|row| row.iter().zip(lp.iter()).map(|(a, x)| x * *a).sum::<BigInt>().is_zero())
    }

    /**
     * The Euler characteristic; only available in the systems that store triangles.
     */
    pub fn euler_char(&self) -> Option<BigInt> {
        if !self.coords.has_triangles() {
            return None;
        }
        let coefficients = euler_coefficients(&self.triangulation, self.coords);
        Some(coefficients.iter().zip(self.vector.iter()).map(|(a, x)| x * *a).sum())
    }

    /**
     * The two cusp slopes of a quadrilateral vector, for one-cusped orientable
     * triangulations.
     */
    pub fn slopes(&self) -> Option<[BigInt; 2]> {
        if self.coords.has_triangles() {
            return None;
        }
        let cusp = self.triangulation.cusp_slopes()?;
        let lp = self.lp_vector();
        let slope = |equation: &Vec<i64>| equation.iter().zip(lp.iter()).map(|(a, x)| x * *a).sum::<BigInt>();
        Some([slope(&cusp.equations[0]), slope(&cusp.equations[1])])
    }

    /**
     * Whether the surface is compact. Surfaces in the systems with triangles
     * always are; a quadrilateral vector is known to be compact if there are
     * no ideal vertices, or if its cusp slopes vanish. Otherwise None.
     */
    pub fn is_compact(&self) -> Option<bool> {
        if self.coords.has_triangles() || !self.triangulation.skeleton().is_ideal() {
            return Some(true);
        }
        self.slopes().map(|slopes| slopes.iter().all(|s| s.is_zero()))
    }
}

/**
 * Euler characteristic as a linear function, in the layout of the reported
 * vectors of the given system (7 or 10 entries per tetrahedron).
 *
 * Counts discs, minus arcs (each face once), plus points on edges (each edge once).
 */
pub fn euler_coefficients(tri: &Triangulation, coords: NormalCoordinates) -> Vec<i64> {
    assert!(coords.has_triangles(), "Euler characteristic needs triangle coordinates");
    let block = coords.surface_block();
    let octagons = coords.has_octagons();
    let skeleton = tri.skeleton();
    let mut result = vec![1; block * tri.size()];

    for face in skeleton.faces.iter() {
        let front = face.front();
        let (t, p) = (front.tetrahedron, front.perm);
        for i in 0..3 {
            result[block * t + p.apply(i)] -= 1;
            result[block * t + 4 + QUAD_SEPARATING[p.apply(i)][p.apply(3)]] -= 1;
            if octagons {
                for k in QUAD_MEETING[p.apply(i)][p.apply(3)] {
                    result[block * t + 7 + k] -= 1;
                }
            }
        }
    }

    for edge in skeleton.edges.iter() {
        let front = edge.embeddings[0];
        let (t, p) = (front.tetrahedron, front.perm);
        let (a, b) = (p.apply(0), p.apply(1));
        result[block * t + a] += 1;
        result[block * t + b] += 1;
        for k in QUAD_MEETING[a][b] {
            result[block * t + 4 + k] += 1;
        }
        if octagons {
            for k in 0..3 {
                result[block * t + 7 + k] += 1;
            }
            result[block * t + 7 + QUAD_SEPARATING[a][b]] += 1;
        }
    }

    result
}

impl Display for NormalSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.vector.iter().join(" "))
    }
}

impl std::fmt::Debug for NormalSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} surface ({})", self.coords, self)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use num::BigInt;

    use crate::{
        surfaces::normal_coordinates::NormalCoordinates,
        triangulation::triangulation::Triangulation,
    };

    use super::{NormalSurface, euler_coefficients};

    fn surface(tri: &Arc<Triangulation>, coords: NormalCoordinates, vector: &[i64]) -> NormalSurface {
        NormalSurface::new(tri.clone(), coords, vector.iter().map(|x| BigInt::from(*x)).collect())
    }

    #[test]
    fn discs_in_one_tetrahedron() {
        let tri = Arc::new(Triangulation::with_size(1));
        let coefficients = euler_coefficients(&tri, NormalCoordinates::AlmostNormal);
        //every single disc is a disc
        assert_eq!(coefficients, vec![1; 10]);

        let oct = surface(&tri, NormalCoordinates::AlmostNormal, &[0, 0, 0, 0, 0, 0, 0, 0, 1, 0]);
        assert_eq!(oct.euler_char(), Some(BigInt::from(1)));
        assert!(oct.has_octagon());
        assert_eq!(oct.octagon_count_types(), 1);
        assert_eq!(oct.lp_vector(), [0, 0, 0, 0, 1, 0, 1].iter().map(|x| BigInt::from(*x)).collect::<Vec<_>>());
    }

    #[test]
    fn vertex_links() {
        let tri = Arc::new(Triangulation::from_iso_sig("bkaagb").unwrap());
        let skeleton = tri.skeleton();
        for vertex in skeleton.vertices.iter() {
            let mut vector = vec![0; 7];
            for &(_, v) in vertex.embeddings.iter() {
                vector[v] += 1;
            }
            let link = surface(&tri, NormalCoordinates::Standard, &vector);
            assert!(link.satisfies_matching_equations());
            assert_eq!(link.euler_char(), Some(BigInt::from(2)));
            assert_eq!(link.is_compact(), Some(true));
        }

        let fig8 = Arc::new(Triangulation::from_iso_sig("cPcbbbiht").unwrap());
        let link = surface(&fig8, NormalCoordinates::Standard, &[1, 1, 1, 1, 0, 0, 0, 1, 1, 1, 1, 0, 0, 0]);
        assert!(link.satisfies_matching_equations());
        assert_eq!(link.euler_char(), Some(BigInt::from(0)));
    }

    #[test]
    fn quad_accessors() {
        let tri = Arc::new(Triangulation::from_iso_sig("cPcbbbiht").unwrap());
        let s = surface(&tri, NormalCoordinates::Quad, &[1, 0, 0, 0, 2, 0]);
        assert_eq!(s.quads(1, 1), BigInt::from(2));
        assert_eq!(s.triangles(0, 0), BigInt::from(0));
        assert_eq!(s.euler_char(), None);
        assert!(!s.has_octagon());
        assert_eq!(s.to_string(), "1 0 0 0 2 0");
        assert!(!s.is_zero());
    }
}
