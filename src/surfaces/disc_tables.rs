//! Geometry of normal and almost normal discs inside a single tetrahedron.
//!
//! Quadrilateral type q (and octagon type q) separates vertices
//! QUAD_DEFN[q][0], QUAD_DEFN[q][1] from QUAD_DEFN[q][2], QUAD_DEFN[q][3].
//! The triangle of type v cuts off vertex v.

/**
 * The quadrilateral type that separates edge {i, j} from the opposite edge.
 */
pub const QUAD_SEPARATING: [[usize; 4]; 4] = [[NONE, 0, 1, 2], [0, NONE, 2, 1], [1, 2, NONE, 0], [2, 1, 0, NONE]];

/**
 * The two quadrilateral types that meet edge {i, j}.
 */
pub const QUAD_MEETING: [[[usize; 2]; 4]; 4] = [
    [[NONE, NONE], [1, 2], [0, 2], [0, 1]],
    [[1, 2], [NONE, NONE], [0, 1], [0, 2]],
    [[0, 2], [0, 1], [NONE, NONE], [1, 2]],
    [[0, 1], [0, 2], [1, 2], [NONE, NONE]],
];

pub const QUAD_DEFN: [[usize; 4]; 3] = [[0, 1, 2, 3], [0, 2, 1, 3], [0, 3, 1, 2]];

/**
 * QUAD_PARTNER[q][v]: the vertex on the same side of quadrilateral type q as v.
 */
pub const QUAD_PARTNER: [[usize; 4]; 3] = [[1, 0, 3, 2], [2, 3, 0, 1], [3, 2, 1, 0]];

const NONE: usize = usize::MAX;

#[cfg(test)]
mod tests {
    use super::{QUAD_DEFN, QUAD_MEETING, QUAD_PARTNER, QUAD_SEPARATING};

    #[test]
    fn tables_agree() {
        for q in 0..3 {
            let [a, b, c, d] = QUAD_DEFN[q];
            assert_eq!(QUAD_SEPARATING[a][b], q);
            assert_eq!(QUAD_SEPARATING[c][d], q);
            assert_eq!(QUAD_PARTNER[q][a], b);
            assert_eq!(QUAD_PARTNER[q][d], c);
        }
        for i in 0..4 {
            for j in 0..4 {
                if i != j {
                    let meeting = QUAD_MEETING[i][j];
                    assert!(!meeting.contains(&QUAD_SEPARATING[i][j]));
                    assert_ne!(meeting[0], meeting[1]);
                }
            }
        }
    }
}
