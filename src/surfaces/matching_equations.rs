use crate::triangulation::triangulation::Triangulation;

use super::{disc_tables::QUAD_SEPARATING, normal_coordinates::NormalCoordinates};

/**
 * The matching equations of the given triangulation, as a dense matrix with one
 * column per coordinate of the underlying (quadrilateral or standard) system.
 *
 * Standard coordinates: per tetrahedron t, triangles at columns 7t..7t+3 and
 * quadrilaterals at 7t+4..7t+6.
 * Quadrilateral coordinates: per tetrahedron t, quadrilaterals at 3t..3t+2.
 */
pub fn matching_equations(tri: &Triangulation, coords: NormalCoordinates) -> Vec<Vec<i64>> {
    match coords.internal() {
        NormalCoordinates::Standard => standard_equations(tri),
        _ => quad_equations(tri),
    }
}

fn standard_equations(tri: &Triangulation) -> Vec<Vec<i64>> {
    let columns = 7 * tri.size();
    let mut result = vec![];
    for face in tri.skeleton().faces.iter().filter(|f| !f.is_boundary()) {
        let front = face.embeddings[0];
        let back = face.embeddings[1];
        let (t0, p0) = (front.tetrahedron, front.perm);
        let (t1, p1) = (back.tetrahedron, back.perm);

        //one equation per arc type, i.e. per vertex of the face
        for i in 0..3 {
            let mut row = vec![0; columns];
            row[7 * t0 + p0.apply(i)] += 1;
            row[7 * t0 + 4 + QUAD_SEPARATING[p0.apply(i)][p0.apply(3)]] += 1;
            row[7 * t1 + p1.apply(i)] -= 1;
            row[7 * t1 + 4 + QUAD_SEPARATING[p1.apply(i)][p1.apply(3)]] -= 1;
            result.push(row);
        }
    }
    result
}

fn quad_equations(tri: &Triangulation) -> Vec<Vec<i64>> {
    let columns = 3 * tri.size();
    let mut result = vec![];
    for edge in tri.skeleton().edges.iter().filter(|e| !e.boundary) {
        let mut row = vec![0; columns];
        for embedding in edge.embeddings.iter() {
            let (t, p) = (embedding.tetrahedron, embedding.perm);
            row[3 * t + QUAD_SEPARATING[p.apply(0)][p.apply(2)]] += 1;
            row[3 * t + QUAD_SEPARATING[p.apply(0)][p.apply(3)]] -= 1;
        }
        result.push(row);
    }
    result
}

#[cfg(test)]
mod tests {
    use crate::{
        surfaces::normal_coordinates::NormalCoordinates,
        triangulation::triangulation::Triangulation,
    };

    use super::matching_equations;

    #[test]
    fn sizes() {
        let tri = Triangulation::from_iso_sig("cPcbbbiht").unwrap();
        let quad = matching_equations(&tri, NormalCoordinates::Quad);
        assert_eq!(quad.len(), 2);
        assert!(quad.iter().all(|row| row.len() == 6));
        let standard = matching_equations(&tri, NormalCoordinates::AlmostNormal);
        assert_eq!(standard.len(), 12);
        assert!(standard.iter().all(|row| row.len() == 14));

        //the vertex link satisfies every standard equation
        let link = [1, 1, 1, 1, 0, 0, 0, 1, 1, 1, 1, 0, 0, 0];
        for row in standard.iter() {
            assert_eq!(row.iter().zip(link.iter()).map(|(a, b)| a * b).sum::<i64>(), 0);
        }

        //each quadrilateral column appears with total weight zero in an ideal triangulation
        for row in quad.iter() {
            assert_eq!(row.iter().sum::<i64>(), 0);
        }
    }

    #[test]
    fn no_equations_without_gluings() {
        let tri = Triangulation::with_size(1);
        assert!(matching_equations(&tri, NormalCoordinates::Quad).is_empty());
        assert!(matching_equations(&tri, NormalCoordinates::Standard).is_empty());
    }
}
