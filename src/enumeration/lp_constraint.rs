use num::BigInt;

use crate::{
    math::lp_matrix::LPMatrix,
    optimisation_algorithms::tableau::Tableau,
    surfaces::{
        normal_coordinates::NormalCoordinates,
        normal_surface::{NormalSurface, euler_coefficients},
    },
    triangulation::triangulation::Triangulation,
};

/**
 * The coefficients of one column in the extra rows that a linear constraint
 * appends to the matching equations.
 */
pub trait ColumnCoefficients: Clone + Default + Send + Sync + std::fmt::Debug {
    /**
     * The coefficients of an extra variable: -1 in its own row, 0 elsewhere.
     */
    fn diagonal(index: usize) -> Self;

    /**
     * Writes these coefficients into the final rows of a dense matrix.
     */
    fn fill_final_rows(&self, matrix: &mut LPMatrix, column: usize);

    /**
     * The inner product of these coefficients with the final columns of the
     * given row of the row operation matrix.
     */
    fn inner_product(&self, row_ops: &LPMatrix, row: usize) -> BigInt;

    /**
     * As inner_product, with every coefficient shifted by the octagon adjustment.
     */
    fn inner_product_oct(&self, row_ops: &LPMatrix, row: usize, oct_adjustment: i64) -> BigInt;
}

/**
 * A fixed number of integer coefficients per column.
 */
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinearCoefficients<const N: usize>(pub [i64; N]);

impl<const N: usize> Default for LinearCoefficients<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> ColumnCoefficients for LinearCoefficients<N> {
    fn diagonal(index: usize) -> Self {
        let mut result = [0; N];
        result[index] = -1;
        Self(result)
    }

    fn fill_final_rows(&self, matrix: &mut LPMatrix, column: usize) {
        let rows = matrix.get_number_of_rows();
        for (i, x) in self.0.iter().enumerate() {
            *matrix.entry_mut(rows - N + i, column) = BigInt::from(*x);
        }
    }

    fn inner_product(&self, row_ops: &LPMatrix, row: usize) -> BigInt {
        let columns = row_ops.get_number_of_columns();
        let mut result = BigInt::from(0);
        for (i, x) in self.0.iter().enumerate() {
            if *x != 0 {
                result += row_ops.entry(row, columns - N + i) * *x;
            }
        }
        result
    }

    fn inner_product_oct(&self, row_ops: &LPMatrix, row: usize, oct_adjustment: i64) -> BigInt {
        let columns = row_ops.get_number_of_columns();
        let mut result = BigInt::from(0);
        for (i, x) in self.0.iter().enumerate() {
            let x = *x + oct_adjustment;
            if x != 0 {
                result += row_ops.entry(row, columns - N + i) * x;
            }
        }
        result
    }
}

/**
 * Extra linear constraints that are added to the matching equations.
 *
 * A constraint appends N_CONSTRAINTS rows to the matching equations, each with
 * a new variable (a column with -1 in that row), so that the new variable
 * equals some linear function of the coordinates. The constraint then places
 * sign conditions on the new variables.
 */
pub trait LPConstraint: Sized + Send + Sync + 'static {
    type Coefficients: ColumnCoefficients;

    const N_CONSTRAINTS: usize;

    /**
     * Added to every coefficient of the two columns that together represent an octagon.
     */
    const OCT_ADJUSTMENT: i64;

    /**
     * Whether the constraint is a set of homogeneous linear equations, which
     * is what vertex enumeration requires.
     */
    const SUBSPACE: bool;

    const NAME: &'static str;

    /**
     * Computes the coefficients for every column (indexed by internal column,
     * the extra columns last), or returns None if the constraint cannot be
     * expressed for this triangulation.
     */
    fn add_rows(tri: &Triangulation, coords: NormalCoordinates, col_perm: &[usize]) -> Option<Vec<Self::Coefficients>>;

    /**
     * Imposes the sign conditions on the extra variables. The number of
     * columns includes the extra ones.
     */
    fn constrain(lp: &mut Tableau<Self>, number_of_columns: usize);

    /**
     * Checks that a surface satisfies the constraint.
     */
    fn verify(surface: &NormalSurface) -> bool;

    fn supported(coords: NormalCoordinates) -> bool;
}

/**
 * Extra coefficients padded with the diagonal of the extra variables.
 */
fn with_extra_columns<const N: usize>(mut coefficients: Vec<LinearCoefficients<N>>) -> Vec<LinearCoefficients<N>> {
    for i in 0..N {
        coefficients.push(LinearCoefficients::diagonal(i));
    }
    coefficients
}

pub struct LPConstraintNone;

impl LPConstraint for LPConstraintNone {
    type Coefficients = LinearCoefficients<0>;
    const N_CONSTRAINTS: usize = 0;
    const OCT_ADJUSTMENT: i64 = 0;
    const SUBSPACE: bool = true;
    const NAME: &'static str = "none";

    fn add_rows(_tri: &Triangulation, _coords: NormalCoordinates, col_perm: &[usize]) -> Option<Vec<Self::Coefficients>> {
        Some(vec![LinearCoefficients::default(); col_perm.len()])
    }

    fn constrain(_lp: &mut Tableau<Self>, _number_of_columns: usize) {}

    fn verify(_surface: &NormalSurface) -> bool {
        true
    }

    fn supported(_coords: NormalCoordinates) -> bool {
        true
    }
}

/**
 * Euler characteristic strictly positive. With octagons, the function measures
 * Euler characteristic minus the number of octagons.
 */
pub struct LPConstraintEulerPositive;

impl LPConstraint for LPConstraintEulerPositive {
    type Coefficients = LinearCoefficients<1>;
    const N_CONSTRAINTS: usize = 1;
    //an octagon has Euler characteristic one less than its two quadrilaterals, and counts once more as an octagon
    const OCT_ADJUSTMENT: i64 = -1;
    const SUBSPACE: bool = false;
    const NAME: &'static str = "euler > 0";

    fn add_rows(tri: &Triangulation, _coords: NormalCoordinates, col_perm: &[usize]) -> Option<Vec<Self::Coefficients>> {
        let euler = euler_coefficients(tri, NormalCoordinates::Standard);
        let coordinates = col_perm.len() - Self::N_CONSTRAINTS;
        Some(with_extra_columns(
            col_perm[..coordinates].iter().map(|c| LinearCoefficients([euler[*c]])).collect(),
        ))
    }

    fn constrain(lp: &mut Tableau<Self>, number_of_columns: usize) {
        lp.constrain_positive(number_of_columns - 1);
    }

    fn verify(surface: &NormalSurface) -> bool {
        surface.euler_char().is_some_and(|euler| euler > BigInt::from(0))
    }

    fn supported(coords: NormalCoordinates) -> bool {
        coords.has_triangles()
    }
}

/**
 * Euler characteristic zero. Normal coordinates only.
 */
pub struct LPConstraintEulerZero;

impl LPConstraint for LPConstraintEulerZero {
    type Coefficients = LinearCoefficients<1>;
    const N_CONSTRAINTS: usize = 1;
    const OCT_ADJUSTMENT: i64 = 0;
    const SUBSPACE: bool = true;
    const NAME: &'static str = "euler = 0";

    fn add_rows(tri: &Triangulation, coords: NormalCoordinates, col_perm: &[usize]) -> Option<Vec<Self::Coefficients>> {
        LPConstraintEulerPositive::add_rows(tri, coords, col_perm)
    }

    fn constrain(lp: &mut Tableau<Self>, number_of_columns: usize) {
        lp.constrain_zero(number_of_columns - 1);
    }

    fn verify(surface: &NormalSurface) -> bool {
        surface.euler_char() == Some(BigInt::from(0))
    }

    fn supported(coords: NormalCoordinates) -> bool {
        coords == NormalCoordinates::Standard
    }
}

/**
 * Both cusp slopes zero, i.e. the surface is compact rather than spun.
 * Needs an orientable triangulation with one vertex, which is ideal with
 * torus link; quadrilateral coordinates only.
 */
pub struct LPConstraintNonSpun;

impl LPConstraint for LPConstraintNonSpun {
    type Coefficients = LinearCoefficients<2>;
    const N_CONSTRAINTS: usize = 2;
    const OCT_ADJUSTMENT: i64 = 0;
    const SUBSPACE: bool = true;
    const NAME: &'static str = "non-spun";

    fn add_rows(tri: &Triangulation, _coords: NormalCoordinates, col_perm: &[usize]) -> Option<Vec<Self::Coefficients>> {
        let slopes = tri.cusp_slopes()?;
        let coordinates = col_perm.len() - Self::N_CONSTRAINTS;
        Some(with_extra_columns(
            col_perm[..coordinates]
                .iter()
                .map(|c| LinearCoefficients([slopes.equations[0][*c], slopes.equations[1][*c]]))
                .collect(),
        ))
    }

    fn constrain(lp: &mut Tableau<Self>, number_of_columns: usize) {
        lp.constrain_zero(number_of_columns - 2);
        lp.constrain_zero(number_of_columns - 1);
    }

    fn verify(surface: &NormalSurface) -> bool {
        match surface.slopes() {
            Some(slopes) => slopes.iter().all(|s| *s == BigInt::from(0)),
            None => false,
        }
    }

    fn supported(coords: NormalCoordinates) -> bool {
        coords == NormalCoordinates::Quad
    }
}

#[cfg(test)]
mod tests {
    use num::BigInt;

    use crate::{
        math::lp_matrix::LPMatrix,
        surfaces::normal_coordinates::NormalCoordinates,
        triangulation::triangulation::Triangulation,
    };

    use super::{
        ColumnCoefficients, LPConstraint, LPConstraintEulerPositive, LPConstraintEulerZero, LPConstraintNonSpun,
        LinearCoefficients,
    };

    #[test]
    fn coefficients() {
        let mut m = LPMatrix::new_sized(3, 3);
        let c = LinearCoefficients([2, -1]);
        c.fill_final_rows(&mut m, 0);
        assert_eq!(m.to_string(), "[[ 0 0 0 ] [ 2 0 0 ] [ -1 0 0 ]]");

        let mut ops = LPMatrix::new();
        ops.reserve(3, 3);
        ops.init_identity(3);
        assert_eq!(c.inner_product(&ops, 1), BigInt::from(2));
        assert_eq!(c.inner_product(&ops, 2), BigInt::from(-1));
        assert_eq!(c.inner_product_oct(&ops, 2, -1), BigInt::from(-2));
        assert_eq!(LinearCoefficients::<2>::diagonal(1), LinearCoefficients([0, -1]));
    }

    #[test]
    fn euler_rows() {
        let tri = Triangulation::with_size(1);
        let col_perm: Vec<usize> = (0..8).collect();
        let rows = LPConstraintEulerPositive::add_rows(&tri, NormalCoordinates::Standard, &col_perm).unwrap();
        assert_eq!(rows.len(), 8);
        assert!(rows[..7].iter().all(|c| c.0 == [1]));
        assert_eq!(rows[7].0, [-1]);
    }

    #[test]
    fn support() {
        assert!(LPConstraintEulerPositive::supported(NormalCoordinates::AlmostNormal));
        assert!(!LPConstraintEulerPositive::supported(NormalCoordinates::Quad));
        assert!(!LPConstraintEulerZero::supported(NormalCoordinates::AlmostNormal));
        assert!(LPConstraintNonSpun::supported(NormalCoordinates::Quad));
        assert!(!LPConstraintNonSpun::supported(NormalCoordinates::AlmostNormalQuadOct));
    }

    #[test]
    fn non_spun_refuses_closed() {
        let tri = Triangulation::from_iso_sig("bkaagb").unwrap();
        let col_perm: Vec<usize> = (0..5).collect();
        assert!(LPConstraintNonSpun::add_rows(&tri, NormalCoordinates::Quad, &col_perm).is_none());
    }
}
