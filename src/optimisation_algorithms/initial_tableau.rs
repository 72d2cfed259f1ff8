use std::{fmt::Debug, sync::Arc};

use anyhow::{Result, anyhow};
use num::{BigInt, Zero};

use crate::{
    enumeration::lp_constraint::{ColumnCoefficients, LPConstraint, LPConstraintNone},
    math::lp_matrix::LPMatrix,
    surfaces::{matching_equations::matching_equations, normal_coordinates::NormalCoordinates},
    triangulation::triangulation::Triangulation,
};

/**
 * A column of the adjusted matching equations. Entries of +k or -k are stored
 * as k copies of the row index; no column has more than four such copies.
 */
#[derive(Clone, Debug, Default)]
pub struct SparseColumn<K: ColumnCoefficients> {
    plus: Vec<usize>,
    minus: Vec<usize>,
    extra: K,
}

impl<K: ColumnCoefficients> SparseColumn<K> {
    fn push(&mut self, row: usize, value: i64) {
        let target = if value > 0 { &mut self.plus } else { &mut self.minus };
        for _ in 0..value.unsigned_abs() {
            target.push(row);
        }
        debug_assert!(self.plus.len() + self.minus.len() <= 4, "a matching equation column has too many entries");
    }
}

/**
 * The starting tableau for the linear programs of a tree traversal: the
 * matching equations reduced to full rank, with columns reordered so that the
 * search is fast, plus the rows of any extra linear constraint.
 *
 * Internally, the quadrilateral columns of tetrahedron i come first, at
 * 3i, 3i+1, 3i+2; in standard coordinates the triangle columns follow at
 * 3n+4i..3n+4i+3; the columns of the extra constraint come last.
 * Tetrahedra are renumbered in the process; col_perm records the mapping back.
 *
 * Immutable after construction; every tableau of a search shares it.
 */
pub struct InitialTableau<C: LPConstraint> {
    triangulation: Arc<Triangulation>,
    coords: NormalCoordinates,
    rank: usize,
    columns: Vec<SparseColumn<C::Coefficients>>,
    col_perm: Vec<usize>,
    constraints_broken: bool,
}

impl<C: LPConstraint> InitialTableau<C> {
    /**
     * The coordinate system is reduced to its linear programming system
     * (quadrilateral or standard). Set enumeration if the tableau is used for
     * vertex enumeration rather than for locating a single surface; this
     * changes the column ordering.
     */
    pub fn new(triangulation: Arc<Triangulation>, coords: NormalCoordinates, enumeration: bool) -> Result<Self> {
        Self::new_with_options(triangulation, coords, enumeration, true)
    }

    /**
     * As new; with reorder switched off the tetrahedra keep their order.
     */
    pub fn new_with_options(triangulation: Arc<Triangulation>, coords: NormalCoordinates, enumeration: bool, reorder: bool) -> Result<Self> {
        if triangulation.is_empty() {
            return Err(anyhow!("cannot build a tableau for an empty triangulation"));
        }
        let coords = coords.internal();
        let n = triangulation.size();

        let mut eqns = matching_equations(&triangulation, coords);
        let rank = row_basis(&mut eqns, coords.columns_per_tetrahedron() * n);
        eqns.truncate(rank);
        log::debug!("matching equations in {} coordinates have rank {}", coords, rank);

        let coordinate_columns = coords.columns_per_tetrahedron() * n;
        let number_of_columns = coordinate_columns + C::N_CONSTRAINTS;
        let mut col_perm = if !reorder {
            plain_order(coords, n)
        } else if coords == NormalCoordinates::Standard && enumeration {
            lifted_quad_order(&triangulation)?
        } else {
            fewest_touched_order(&eqns, coords, n)
        };
        for i in 0..C::N_CONSTRAINTS {
            col_perm.push(coordinate_columns + i);
        }

        //sparse columns of the permuted matrix
        let mut columns = vec![SparseColumn::<C::Coefficients>::default(); number_of_columns];
        for (c, column) in columns.iter_mut().enumerate().take(coordinate_columns) {
            for (r, row) in eqns.iter().enumerate() {
                let value = row[col_perm[c]];
                if value != 0 {
                    column.push(r, value);
                }
            }
        }

        //the extra rows
        let mut constraints_broken = false;
        match C::add_rows(&triangulation, coords, &col_perm) {
            Some(coefficients) => {
                for (column, extra) in columns.iter_mut().zip(coefficients.into_iter()) {
                    column.extra = extra;
                }
            }
            None => {
                log::warn!("the constraint `{}` cannot be expressed for this triangulation; it will be ignored", C::NAME);
                constraints_broken = true;
                for i in 0..C::N_CONSTRAINTS {
                    columns[coordinate_columns + i].extra = C::Coefficients::diagonal(i);
                }
            }
        }

        Ok(Self {
            triangulation,
            coords,
            rank: rank + C::N_CONSTRAINTS,
            columns,
            col_perm,
            constraints_broken,
        })
    }

    pub fn triangulation(&self) -> &Arc<Triangulation> {
        &self.triangulation
    }

    /**
     * Quadrilateral or standard coordinates.
     */
    pub fn coordinates(&self) -> NormalCoordinates {
        self.coords
    }

    /**
     * The number of rows, including those of the extra constraint.
     */
    pub fn rank(&self) -> usize {
        self.rank
    }

    /**
     * The number of columns, including those of the extra constraint.
     */
    pub fn number_of_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn coordinate_columns(&self) -> usize {
        self.columns.len() - C::N_CONSTRAINTS
    }

    /**
     * For each internal column, the column of the original coordinate system.
     */
    pub fn col_perm(&self) -> &[usize] {
        &self.col_perm
    }

    pub fn constraints_broken(&self) -> bool {
        self.constraints_broken
    }

    /**
     * The inner product of the given row of the row operation matrix with the
     * given column of this tableau.
     */
    pub fn mult_col_by_row(&self, row_ops: &LPMatrix, row: usize, column: usize) -> BigInt {
        let col = &self.columns[column];
        let mut result = BigInt::zero();
        col.plus.iter().for_each(|r| result += row_ops.entry(row, *r));
        col.minus.iter().for_each(|r| result -= row_ops.entry(row, *r));
        result += col.extra.inner_product(row_ops, row);
        result
    }

    /**
     * As mult_col_by_row, with the octagon adjustment of the constraint applied.
     */
    pub fn mult_col_by_row_oct(&self, row_ops: &LPMatrix, row: usize, column: usize) -> BigInt {
        let col = &self.columns[column];
        let mut result = BigInt::zero();
        col.plus.iter().for_each(|r| result += row_ops.entry(row, *r));
        col.minus.iter().for_each(|r| result -= row_ops.entry(row, *r));
        result += col.extra.inner_product_oct(row_ops, row, C::OCT_ADJUSTMENT);
        result
    }

    /**
     * Writes the full tableau into a zero matrix of size rank x columns.
     */
    pub fn fill_initial_tableau(&self, matrix: &mut LPMatrix) {
        for (c, column) in self.columns.iter().enumerate() {
            column.plus.iter().for_each(|r| *matrix.entry_mut(*r, c) += 1);
            column.minus.iter().for_each(|r| *matrix.entry_mut(*r, c) -= 1);
            column.extra.fill_final_rows(matrix, c);
        }
    }
}

impl<C: LPConstraint> Debug for InitialTableau<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut matrix = LPMatrix::new_sized(self.rank, self.number_of_columns());
        self.fill_initial_tableau(&mut matrix);
        write!(f, "initial tableau in {} coordinates, constraint {}, columns {:?}: {}", self.coords, C::NAME, self.col_perm, matrix)
    }
}

/**
 * Reorders the rows so that the first `rank` of them form a basis of the row
 * space, and returns the rank. Elimination happens on a copy.
 */
pub fn row_basis(matrix: &mut [Vec<i64>], number_of_columns: usize) -> usize {
    let mut echelon = LPMatrix::new_sized(matrix.len(), number_of_columns);
    for (r, row) in matrix.iter().enumerate() {
        for (c, x) in row.iter().enumerate() {
            *echelon.entry_mut(r, c) = BigInt::from(*x);
        }
    }

    let mut lead: Vec<usize> = (0..number_of_columns).collect();
    let mut rank = matrix.len();
    let mut done = 0;
    while done < rank {
        match (done..number_of_columns).find(|c| !echelon.entry(done, lead[*c]).is_zero()) {
            None => {
                //a zero row: push it to the bottom
                rank -= 1;
                if done < rank {
                    echelon.swap_rows(done, rank);
                    matrix.swap(done, rank);
                }
            }
            Some(c) => {
                lead.swap(done, c);
                echelon.eliminate_below(done, lead[done], rank);
                done += 1;
            }
        }
    }
    rank
}

/**
 * Quadrilaterals first, then triangles, tetrahedra in their original order.
 */
fn plain_order(coords: NormalCoordinates, n: usize) -> Vec<usize> {
    let mut result = vec![0; coords.columns_per_tetrahedron() * n];
    for i in 0..n {
        place_tetrahedron(&mut result, coords, n, i, i);
    }
    result
}

/**
 * Puts the columns of original tetrahedron k at the position of internal tetrahedron i.
 */
fn place_tetrahedron(col_perm: &mut [usize], coords: NormalCoordinates, n: usize, i: usize, k: usize) {
    if coords.has_triangles() {
        for j in 0..3 {
            col_perm[3 * i + j] = 7 * k + 4 + j;
        }
        for j in 0..4 {
            col_perm[3 * n + 4 * i + j] = 7 * k + j;
        }
    } else {
        for j in 0..3 {
            col_perm[3 * i + j] = 3 * k + j;
        }
    }
}

/**
 * For standard enumeration: the tetrahedron order of quadrilateral enumeration.
 */
fn lifted_quad_order(triangulation: &Arc<Triangulation>) -> Result<Vec<usize>> {
    let quad = InitialTableau::<LPConstraintNone>::new(triangulation.clone(), NormalCoordinates::Quad, true)?;
    let n = triangulation.size();
    let mut result = vec![0; 7 * n];
    for i in 0..n {
        let k = quad.col_perm()[3 * i] / 3;
        place_tetrahedron(&mut result, NormalCoordinates::Standard, n, i, k);
    }
    Ok(result)
}

/**
 * Processes the rows in order of the number of not yet placed tetrahedra they
 * touch, and places those tetrahedra from the back of the matrix forwards.
 */
fn fewest_touched_order(eqns: &[Vec<i64>], coords: NormalCoordinates, n: usize) -> Vec<usize> {
    let quad_offset = if coords.has_triangles() { 4 } else { 0 };
    let block = coords.columns_per_tetrahedron();
    let touches = |row: &Vec<i64>, k: usize| (0..3).any(|j| row[block * k + quad_offset + j] != 0);

    let mut result = vec![0; block * n];
    let mut used = vec![false; eqns.len()];
    let mut touched = vec![false; n];
    let mut number_touched = 0;

    for _ in 0..eqns.len() {
        let mut best = n + 1;
        let mut best_row = 0;
        for (j, row) in eqns.iter().enumerate() {
            if used[j] {
                continue;
            }
            let mut current = 0;
            for k in 0..n {
                if !touched[k] && touches(row, k) {
                    current += 1;
                }
                if current >= best {
                    break;
                }
            }
            if current < best {
                best_row = j;
                best = current;
            }
        }

        used[best_row] = true;
        for k in 0..n {
            if !touched[k] && touches(&eqns[best_row], k) {
                touched[k] = true;
                place_tetrahedron(&mut result, coords, n, n - number_touched - 1, k);
                number_touched += 1;
            }
        }
    }

    //tetrahedra that appear in no equation at all
    for k in 0..n {
        if !touched[k] {
            touched[k] = true;
            place_tetrahedron(&mut result, coords, n, n - number_touched - 1, k);
            number_touched += 1;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use itertools::Itertools;

    use crate::{
        enumeration::lp_constraint::{LPConstraintEulerPositive, LPConstraintNonSpun, LPConstraintNone},
        surfaces::normal_coordinates::NormalCoordinates,
        triangulation::triangulation::Triangulation,
    };

    use super::{InitialTableau, row_basis};

    #[test]
    fn rank_of_rows() {
        let mut m = vec![vec![1, 1, 0], vec![2, 2, 0], vec![0, 1, 1], vec![1, 2, 1]];
        let rank = row_basis(&mut m, 3);
        assert_eq!(rank, 2);
        assert_eq!(m[0], vec![1, 1, 0]);
        //the zero row was swapped with the last row
        assert_eq!(m[1], vec![1, 2, 1]);

        let mut zero = vec![vec![0, 0], vec![0, 0]];
        assert_eq!(row_basis(&mut zero, 2), 0);
    }

    #[test]
    fn permutation_is_bijective() {
        let tri = Arc::new(Triangulation::from_iso_sig("cPcbbbiht").unwrap());
        for (coords, enumeration) in [(NormalCoordinates::Quad, true), (NormalCoordinates::Standard, true), (NormalCoordinates::Standard, false)] {
            let init = InitialTableau::<LPConstraintNone>::new(tri.clone(), coords, enumeration).unwrap();
            let sorted = init.col_perm().iter().copied().sorted().collect::<Vec<_>>();
            assert_eq!(sorted, (0..init.number_of_columns()).collect::<Vec<_>>());
            //quadrilaterals first
            for i in 0..6 {
                assert_eq!(init.col_perm()[i] % init.coordinates().columns_per_tetrahedron() >= 4, coords == NormalCoordinates::Standard);
            }
        }
    }

    #[test]
    fn figure_eight_ranks() {
        let tri = Arc::new(Triangulation::from_iso_sig("cPcbbbiht").unwrap());
        let quad = InitialTableau::<LPConstraintNone>::new(tri.clone(), NormalCoordinates::Quad, true).unwrap();
        //the two edge equations are negatives of each other
        assert_eq!(quad.rank(), 1);
        assert!(!quad.constraints_broken());

        let euler = InitialTableau::<LPConstraintEulerPositive>::new(tri.clone(), NormalCoordinates::Standard, false).unwrap();
        assert_eq!(euler.number_of_columns(), 15);
        assert_eq!(euler.coordinate_columns(), 14);

        let non_spun = InitialTableau::<LPConstraintNonSpun>::new(tri, NormalCoordinates::Quad, true).unwrap();
        assert_eq!(non_spun.rank(), 3);
        assert!(!non_spun.constraints_broken());
    }

    #[test]
    fn broken_constraint() {
        let tri = Arc::new(Triangulation::from_iso_sig("bkaagb").unwrap());
        let init = InitialTableau::<LPConstraintNonSpun>::new(tri, NormalCoordinates::Quad, true).unwrap();
        assert!(init.constraints_broken());
        assert_eq!(init.number_of_columns(), 5);
    }

    #[test]
    fn empty_triangulation() {
        let tri = Arc::new(Triangulation::new());
        assert!(InitialTableau::<LPConstraintNone>::new(tri, NormalCoordinates::Quad, true).is_err());
    }
}
