use std::{fmt::Debug, sync::Arc};

use bitvec::{bitvec, vec::BitVec};
use num::{BigInt, One, Zero};

use crate::{
    enumeration::lp_constraint::LPConstraint,
    math::{
        lp_matrix::LPMatrix,
        traits::{ExactInteger, scale_down},
    },
};

use super::initial_tableau::InitialTableau;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarState {
    /**
     * In the basis, defined by the given row.
     */
    Basic(usize),
    NonBasic,
    /**
     * Constrained to zero and removed from the system.
     */
    Inactive,
}

/**
 * A linear program in the search tree, kept in the form of a tableau for the
 * dual simplex method with exact integer arithmetic.
 *
 * The tableau is never stored in full. Instead we keep the matrix of row
 * operations that turns the initial tableau into the current one, and
 * compute individual entries on demand from the sparse columns of the
 * initial tableau.
 *
 * Variables that are constrained to be positive (x >= 1) undergo a change of
 * variable x = 1 + x', which is undone by extract_solution with the help of
 * the type vector. An octagon is represented by a pair of quadrilateral
 * columns: the primary column counts octagons and the secondary one is
 * removed.
 *
 * Once a tableau becomes infeasible it stays infeasible, and every further
 * constraint is a no-op.
 */
pub struct Tableau<C: LPConstraint> {
    initial: Arc<InitialTableau<C>>,
    rhs: Vec<BigInt>,
    row_ops: LPMatrix,
    rank: usize,
    basis: Vec<usize>,
    state: Vec<VarState>,
    feasible: bool,
    oct: Option<(usize, usize)>,
}

impl<C: LPConstraint> Tableau<C> {
    /**
     * Reserves the space for a tableau of the given starting tableau. The
     * result must be initialised with init_start or init_clone before use.
     */
    pub fn new(initial: &Arc<InitialTableau<C>>) -> Self {
        let rank = initial.rank();
        let mut row_ops = LPMatrix::new();
        row_ops.reserve(rank, rank);
        Self {
            initial: Arc::clone(initial),
            rhs: vec![BigInt::zero(); rank],
            row_ops,
            rank: 0,
            basis: vec![0; rank],
            state: vec![VarState::NonBasic; initial.number_of_columns()],
            feasible: false,
            oct: None,
        }
    }

    /**
     * Sets up the root of the search: a feasible basis for the matching
     * equations with zero right-hand side, followed by the sign conditions
     * of the extra linear constraint (which may break feasibility).
     */
    pub fn init_start(&mut self) {
        let rank = self.initial.rank();
        self.row_ops.init_identity(rank);
        self.rhs.iter_mut().for_each(|x| x.set_zero());
        self.rank = rank;
        self.oct = None;

        self.find_initial_basis();

        //the right-hand side is zero, so every basis is feasible
        self.feasible = true;

        C::constrain(self, self.initial.number_of_columns());
    }

    /**
     * Turns this tableau into a copy of the given one. If the parent is
     * infeasible only that fact is copied.
     */
    pub fn init_clone(&mut self, parent: &Tableau<C>) {
        self.feasible = parent.feasible;
        if !self.feasible {
            return;
        }
        self.rhs[..parent.rank].clone_from_slice(&parent.rhs[..parent.rank]);
        self.row_ops.init_clone(&parent.row_ops);
        self.rank = parent.rank;
        self.basis[..parent.rank].copy_from_slice(&parent.basis[..parent.rank]);
        self.state.copy_from_slice(&parent.state);
        self.oct = parent.oct;
    }

    pub fn initial(&self) -> &Arc<InitialTableau<C>> {
        &self.initial
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn number_of_columns(&self) -> usize {
        self.initial.number_of_columns()
    }

    pub fn coordinate_columns(&self) -> usize {
        self.initial.coordinate_columns()
    }

    pub fn is_feasible(&self) -> bool {
        self.feasible
    }

    pub fn is_active(&self, column: usize) -> bool {
        self.state[column] != VarState::Inactive
    }

    pub fn state(&self, column: usize) -> VarState {
        self.state[column]
    }

    /**
     * The sign of the value of the given variable in the current basic
     * solution: the sign of its right-hand side if it is basic, and zero
     * otherwise. Changes of variable are not undone.
     */
    pub fn sign(&self, column: usize) -> i8 {
        match self.state[column] {
            VarState::Basic(row) => self.rhs[row].sgn(),
            _ => 0,
        }
    }

    /**
     * The primary and secondary columns of the octagon, if one has been declared.
     */
    pub fn octagon(&self) -> Option<(usize, usize)> {
        self.oct
    }

    /**
     * An entry of the current tableau. For the primary octagon column this is
     * the sum of both quadrilateral columns, with the octagon adjustment of
     * the extra constraint.
     */
    pub fn entry(&self, row: usize, column: usize) -> BigInt {
        match self.oct {
            Some((primary, secondary)) if primary == column => {
                self.initial.mult_col_by_row_oct(&self.row_ops, row, column)
                    + self.initial.mult_col_by_row_oct(&self.row_ops, row, secondary)
            }
            _ => self.initial.mult_col_by_row(&self.row_ops, row, column),
        }
    }

    fn entry_sign(&self, row: usize, column: usize) -> i8 {
        self.entry(row, column).sgn()
    }

    /**
     * The largest active non-basic column whose entry in the given row has a
     * sign accepted by the filter.
     */
    fn largest_non_basic(&self, row: usize, accept: impl Fn(i8) -> bool) -> Option<usize> {
        (0..self.number_of_columns())
            .rev()
            .find(|c| self.state[*c] == VarState::NonBasic && accept(self.entry_sign(row, *c)))
    }

    /**
     * Adds the constraint x = 0 and removes the column from the system.
     */
    pub fn constrain_zero(&mut self, column: usize) {
        if !self.is_active(column) || !self.feasible {
            return;
        }

        let mut perhaps_infeasible = false;
        if let VarState::Basic(row) = self.state[column] {
            if self.rhs[row].is_zero() {
                match self.largest_non_basic(row, |sign| sign != 0) {
                    //with a zero right-hand side this pivot keeps feasibility
                    Some(c) => self.pivot(column, c),
                    None => {
                        //the row reads x = 0; dropping x loses a rank
                        self.drop_row(row);
                    }
                }
            } else {
                //rhs is positive, so the incoming entry must be positive
                match self.largest_non_basic(row, |sign| sign > 0) {
                    Some(c) => {
                        self.pivot(column, c);
                        perhaps_infeasible = true;
                    }
                    None => {
                        self.feasible = false;
                        return;
                    }
                }
            }
        }

        self.state[column] = VarState::Inactive;

        if perhaps_infeasible {
            self.make_feasible();
        }
    }

    /**
     * Adds the constraint x >= 1, through the change of variable x = 1 + x'.
     */
    pub fn constrain_positive(&mut self, column: usize) {
        if !self.is_active(column) {
            self.feasible = false;
            return;
        }
        if !self.feasible {
            return;
        }

        //subtract the column from the right-hand side
        match self.state[column] {
            VarState::Basic(row) => {
                let e = self.entry(row, column);
                self.rhs[row] -= e;
                if self.rhs[row].sgn() < 0 {
                    self.make_feasible();
                }
            }
            _ => {
                for row in 0..self.rank {
                    let e = self.entry(row, column);
                    self.rhs[row] -= e;
                }
                self.make_feasible();
            }
        }
    }

    /**
     * Declares that the two given quadrilateral columns of one tetrahedron
     * together represent an octagon: they are merged into one column that
     * counts octagons and is constrained to be positive, and the other
     * column is removed. At most one octagon may be declared per tableau.
     */
    pub fn constrain_oct(&mut self, quad1: usize, quad2: usize) {
        if !self.is_active(quad1) || !self.is_active(quad2) {
            self.feasible = false;
            return;
        }
        if !self.feasible {
            return;
        }
        assert!(self.oct.is_none(), "a tableau can hold only one octagon");

        match (self.state[quad1], self.state[quad2]) {
            (VarState::NonBasic, VarState::NonBasic) => {
                self.oct = Some((quad1, quad2));
                //quad2 is non-basic and hence already zero
                self.state[quad2] = VarState::Inactive;
                self.constrain_positive(quad1);
            }
            (VarState::NonBasic, _) => {
                self.oct = Some((quad1, quad2));
                self.constrain_zero(quad2);
                self.constrain_positive(quad1);
            }
            (_, VarState::NonBasic) => {
                self.oct = Some((quad2, quad1));
                self.constrain_zero(quad1);
                self.constrain_positive(quad2);
            }
            (VarState::Basic(row1), _) => {
                //both basic: merge into quad1, whose column may now look like anything
                self.oct = Some((quad1, quad2));
                if !self.entry(row1, quad1).is_zero() {
                    //restore quad1 as a unit column
                    self.clear_column(row1, quad1);
                    self.make_feasible();
                    self.constrain_zero(quad2);
                    self.constrain_positive(quad1);
                } else {
                    match self.largest_non_basic(row1, |sign| sign != 0) {
                        Some(c) => {
                            self.pivot(quad1, c);
                            self.make_feasible();
                            self.constrain_zero(quad2);
                            self.constrain_positive(quad1);
                        }
                        None => {
                            if !self.rhs[row1].is_zero() {
                                self.feasible = false;
                            } else {
                                //a tautology: quad1 leaves the basis and the rank drops
                                self.state[quad1] = VarState::NonBasic;
                                self.drop_row(row1);
                                self.constrain_zero(quad2);
                                self.constrain_positive(quad1);
                            }
                        }
                    }
                }
            }
            (VarState::Inactive, _) => unreachable!("column {} is inactive", quad1),
        }
    }

    /**
     * Moves the given row out of the active area, swapping it with the last
     * active row. The caller updates the state of the variable it defined.
     */
    fn drop_row(&mut self, row: usize) {
        self.rank -= 1;
        let last = self.rank;
        if row != last {
            self.rhs.swap(row, last);
            self.row_ops.swap_rows(row, last);
            self.basis[row] = self.basis[last];
            self.state[self.basis[row]] = VarState::Basic(row);
        }
    }

    /**
     * Makes the entry (row, column) positive and clears the rest of the
     * column by row operations.
     */
    fn clear_column(&mut self, row: usize, column: usize) {
        let mut base = self.entry(row, column);
        if base.sgn() < 0 {
            base = -base;
            self.rhs[row] = -&self.rhs[row];
            self.row_ops.negate_row(row);
        }

        for r in 0..self.rank {
            if r == row {
                continue;
            }
            let coefficient = self.entry(r, column);
            if !coefficient.is_zero() {
                let gcd = self.row_ops.comb_row_and_norm(&base, r, &coefficient, row);

                //row_ops times an integer vector, so the division is exact
                let shift = &coefficient * &self.rhs[row];
                let rhs = &mut self.rhs[r];
                *rhs *= &base;
                *rhs -= shift;
                rhs.div_exact(&gcd);
            }
        }
    }

    /**
     * Exchanges a basic variable for a non-basic one.
     */
    pub fn pivot(&mut self, out_column: usize, in_column: usize) {
        let VarState::Basic(row) = self.state[out_column] else {
            panic!("column {} is not basic", out_column);
        };
        self.state[out_column] = VarState::NonBasic;
        self.state[in_column] = VarState::Basic(row);
        self.basis[row] = in_column;
        self.clear_column(row, in_column);
    }

    /**
     * Gauss-Jordan elimination over the dense starting tableau. All
     * variables start active and non-basic.
     */
    fn find_initial_basis(&mut self) {
        self.state.iter_mut().for_each(|s| *s = VarState::NonBasic);

        let columns = self.number_of_columns();
        let mut tableau = LPMatrix::new_sized(self.rank, columns);
        self.initial.fill_initial_tableau(&mut tableau);
        let mut ops = LPMatrix::new();
        ops.reserve(self.rank, self.rank);
        ops.init_identity(self.rank);

        let mut row = 0;
        while row < self.rank {
            let Some(c) = (0..columns).find(|c| self.state[*c] == VarState::NonBasic && !tableau.entry(row, *c).is_zero()) else {
                //only possible if the starting tableau has too small a rank
                log::warn!("the starting tableau does not have full rank");
                self.rank -= 1;
                tableau.swap_rows(row, self.rank);
                ops.swap_rows(row, self.rank);
                continue;
            };

            self.basis[row] = c;
            self.state[c] = VarState::Basic(row);

            let mut base = tableau.entry(row, c).clone();
            if base.sgn() < 0 {
                base = -base;
                tableau.negate_row(row);
                ops.negate_row(row);
            }

            for r in 0..self.rank {
                if r == row {
                    continue;
                }
                let coefficient = tableau.entry(r, c).clone();
                if !coefficient.is_zero() {
                    let gcd = ops.comb_row_and_norm(&base, r, &coefficient, row);
                    tableau.comb_row(&base, r, &coefficient, row, &gcd);
                }
            }
            row += 1;
        }

        self.row_ops.init_clone(&ops);
    }

    /**
     * Pivots until every basic variable is non-negative, or discovers that
     * this is impossible.
     *
     * Leaves the most negative variable first (comparing rhs / pivot exactly
     * by cross-multiplication), entering the largest eligible column. Cycles
     * are detected by comparing the basis against snapshots taken after
     * 1, 2, 4, 8, ... pivots; on a cycle we switch to Bland's rule.
     */
    fn make_feasible(&mut self) {
        let mut cycles = CycleCheck::new(self.number_of_columns(), &self.basis[..self.rank]);

        loop {
            //the basic variable with the most negative value
            let mut out: Option<(usize, BigInt)> = None;
            for row in 0..self.rank {
                if self.rhs[row].sgn() >= 0 {
                    continue;
                }
                let e = self.entry(row, self.basis[row]);
                let better = match &out {
                    None => true,
                    Some((out_row, out_entry)) => &self.rhs[row] * out_entry < &self.rhs[*out_row] * &e,
                };
                if better {
                    out = Some((row, e));
                }
            }
            let Some((out_row, _)) = out else {
                return;
            };
            let out_column = self.basis[out_row];

            let Some(in_column) = self.largest_non_basic(out_row, |sign| sign < 0) else {
                self.feasible = false;
                return;
            };
            self.pivot(out_column, in_column);

            if cycles.pivoted(out_column, in_column) {
                log::debug!("dual simplex is cycling after {} pivots; switching to Bland's rule", cycles.pivots);
                self.make_feasible_anti_cycling();
                return;
            }
        }
    }

    /**
     * Bland's rule: leave the negative basic variable of largest index, enter
     * the largest eligible column. Slower, but never cycles.
     */
    fn make_feasible_anti_cycling(&mut self) {
        loop {
            let Some(out_column) = (0..self.rank).filter(|row| self.rhs[*row].sgn() < 0).map(|row| self.basis[row]).max() else {
                return;
            };
            let VarState::Basic(out_row) = self.state[out_column] else {
                unreachable!()
            };
            let Some(in_column) = self.largest_non_basic(out_row, |sign| sign < 0) else {
                self.feasible = false;
                return;
            };
            self.pivot(out_column, in_column);
        }
    }

    /**
     * The solution at the current basis, in the original coordinates of the
     * linear programming system (quadrilateral or standard), scaled down to
     * the smallest integer vector.
     *
     * The type vector undoes the changes of variable of constrain_positive:
     * a quadrilateral type 1, 2 or 3 of tetrahedron i marks column 3i+type-1,
     * and a non-zero triangle type marks the corresponding triangle column.
     * Types 4, 5 and 6 are octagons, which are undone through the octagon
     * columns of this tableau.
     */
    pub fn extract_solution(&self, types: &[u8]) -> Vec<BigInt> {
        let col_perm = self.initial.col_perm();
        let coordinate_columns = self.coordinate_columns();
        let n = self.initial.triangulation().size();

        //scale by the lcm of the pivots, so that everything is integral
        let mut lcm = BigInt::one();
        for row in 0..self.rank {
            lcm.lcm_with(&self.entry(row, self.basis[row]));
        }

        let mut result = vec![BigInt::zero(); coordinate_columns];
        for row in 0..self.rank {
            let column = self.basis[row];
            if column >= coordinate_columns {
                continue;
            }
            let mut value = &lcm * &self.rhs[row];
            value.div_exact(&self.entry(row, column));
            result[col_perm[column]] = value;
        }

        for (i, t) in types.iter().enumerate().take(n) {
            if (1..4).contains(t) {
                result[col_perm[3 * i + *t as usize - 1]] += &lcm;
            }
        }
        for column in 3 * n..coordinate_columns {
            if types[column - 2 * n] != 0 {
                result[col_perm[column]] += &lcm;
            }
        }

        if let Some((primary, secondary)) = self.oct {
            result[col_perm[primary]] += &lcm;
            result[col_perm[secondary]] = result[col_perm[primary]].clone();
        }

        scale_down(&mut result);
        result
    }

    /**
     * Checks the invariants of a feasible tableau: the basic columns form an
     * identity up to positive scaling, and every active row of the row
     * operation matrix has gcd one.
     */
    pub fn verify(&self) -> bool {
        if !self.feasible {
            return true;
        }
        for row in 0..self.rank {
            for (r, column) in self.basis[..self.rank].iter().enumerate() {
                let sign = self.entry_sign(row, *column);
                if (r == row && sign <= 0) || (r != row && sign != 0) {
                    log::debug!("basis column {} is not a unit column in row {}", column, row);
                    return false;
                }
            }

            let mut gcd = BigInt::zero();
            for c in 0..self.row_ops.get_number_of_columns() {
                gcd.gcd_with(self.row_ops.entry(row, c));
            }
            if !gcd.is_one() {
                log::debug!("row {} of the row operations has gcd {}", row, gcd);
                return false;
            }
        }
        true
    }
}

impl<C: LPConstraint> Debug for Tableau<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.feasible {
            return write!(f, "infeasible tableau");
        }
        writeln!(f, "tableau of rank {}, octagon {:?}", self.rank, self.oct)?;
        for row in 0..self.rank {
            for column in 0..self.number_of_columns() {
                if self.is_active(column) {
                    write!(f, "{} ", self.entry(row, column))?;
                } else {
                    write!(f, "x ")?;
                }
            }
            writeln!(f, "| {} (basis {})", self.rhs[row], self.basis[row])?;
        }
        Ok(())
    }
}

/**
 * Detects cycling of the dual simplex: the basis is compared against
 * snapshots taken after 1, 2, 4, 8, ... pivots.
 */
struct CycleCheck {
    current: BitVec,
    snapshot: BitVec,
    pivots: u64,
    next_snapshot: u64,
}

impl CycleCheck {
    fn new(columns: usize, basis: &[usize]) -> Self {
        let mut current: BitVec = bitvec![0; columns];
        for column in basis {
            current.set(*column, true);
        }
        Self {
            snapshot: current.clone(),
            current,
            pivots: 0,
            next_snapshot: 1,
        }
    }

    /**
     * Records a pivot. Returns true if the basis has returned to the last
     * snapshot, or if the pivot counter has run out.
     */
    fn pivoted(&mut self, out_column: usize, in_column: usize) -> bool {
        self.current.set(out_column, false);
        self.current.set(in_column, true);
        if self.current == self.snapshot {
            return true;
        }

        self.pivots += 1;
        if self.pivots == self.next_snapshot {
            self.snapshot.clone_from(&self.current);
            match self.next_snapshot.checked_mul(2) {
                Some(next) => self.next_snapshot = next,
                None => return true,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use num::BigInt;

    use crate::{
        enumeration::lp_constraint::{LPConstraint, LPConstraintEulerPositive, LPConstraintNone},
        optimisation_algorithms::initial_tableau::InitialTableau,
        surfaces::{normal_coordinates::NormalCoordinates, normal_surface::NormalSurface},
        triangulation::triangulation::Triangulation,
    };

    use super::{CycleCheck, Tableau, VarState};

    fn root<C: LPConstraint>(tri: &Arc<Triangulation>, coords: NormalCoordinates) -> Tableau<C> {
        let initial = Arc::new(InitialTableau::<C>::new_with_options(tri.clone(), coords, true, false).unwrap());
        let mut lp = Tableau::new(&initial);
        lp.init_start();
        lp
    }

    /**
     * Quadrilateral type of tetrahedron i in enumeration style: 0 zeroes all
     * three columns, k zeroes the others and makes column k-1 positive.
     */
    fn set_quad_type<C: LPConstraint>(lp: &mut Tableau<C>, i: usize, t: usize) {
        for k in 0..3 {
            if k + 1 != t {
                lp.constrain_zero(3 * i + k);
            }
        }
        if t > 0 {
            lp.constrain_positive(3 * i + t - 1);
        }
    }

    fn vector(values: &[i64]) -> Vec<BigInt> {
        values.iter().map(|x| BigInt::from(*x)).collect()
    }

    #[test]
    fn figure_eight_quads() {
        let tri = Arc::new(Triangulation::from_iso_sig("cPcbbbiht").unwrap());

        let lp = root::<LPConstraintNone>(&tri, NormalCoordinates::Quad);
        assert!(lp.is_feasible());
        assert_eq!(lp.rank(), 1);
        assert!(lp.verify());

        //-x0 + 2x1 - x2 - x3 - x4 + 2x5 = 0, up to sign
        let mut lp = root::<LPConstraintNone>(&tri, NormalCoordinates::Quad);
        set_quad_type(&mut lp, 0, 1);
        set_quad_type(&mut lp, 1, 3);
        assert!(lp.is_feasible());
        assert!(lp.verify());
        let solution = lp.extract_solution(&[1, 3]);
        assert_eq!(solution, vector(&[2, 0, 0, 0, 0, 1]));
        let surface = NormalSurface::new(tri.clone(), NormalCoordinates::Quad, solution);
        assert!(surface.satisfies_matching_equations());

        let mut lp = root::<LPConstraintNone>(&tri, NormalCoordinates::Quad);
        set_quad_type(&mut lp, 0, 1);
        set_quad_type(&mut lp, 1, 1);
        assert!(!lp.is_feasible());

        let mut lp = root::<LPConstraintNone>(&tri, NormalCoordinates::Quad);
        set_quad_type(&mut lp, 0, 2);
        set_quad_type(&mut lp, 1, 3);
        assert!(!lp.is_feasible());

        let mut lp = root::<LPConstraintNone>(&tri, NormalCoordinates::Quad);
        set_quad_type(&mut lp, 0, 0);
        set_quad_type(&mut lp, 1, 3);
        assert!(!lp.is_feasible());
    }

    #[test]
    fn clone_is_independent() {
        let tri = Arc::new(Triangulation::from_iso_sig("cPcbbbiht").unwrap());
        let mut parent = root::<LPConstraintNone>(&tri, NormalCoordinates::Quad);
        set_quad_type(&mut parent, 0, 1);

        let mut child = Tableau::new(parent.initial());
        child.init_clone(&parent);
        set_quad_type(&mut child, 1, 1);
        assert!(!child.is_feasible());
        assert!(parent.is_feasible());

        child.init_clone(&parent);
        set_quad_type(&mut child, 1, 3);
        assert!(child.is_feasible());
        assert_eq!(child.extract_solution(&[1, 3]), vector(&[2, 0, 0, 0, 0, 1]));
    }

    #[test]
    fn infeasibility_is_permanent() {
        let tri = Arc::new(Triangulation::from_iso_sig("cPcbbbiht").unwrap());
        let mut lp = root::<LPConstraintNone>(&tri, NormalCoordinates::Quad);
        set_quad_type(&mut lp, 0, 1);
        set_quad_type(&mut lp, 1, 1);
        assert!(!lp.is_feasible());
        lp.constrain_positive(0);
        lp.constrain_zero(3);
        assert!(!lp.is_feasible());
    }

    #[test]
    fn single_octagon() {
        let tri = Arc::new(Triangulation::with_size(1));
        let mut lp = root::<LPConstraintNone>(&tri, NormalCoordinates::AlmostNormalQuadOct);
        assert_eq!(lp.rank(), 0);
        lp.constrain_oct(1, 2);
        assert!(lp.is_feasible());
        assert_eq!(lp.octagon(), Some((1, 2)));
        assert!(!lp.is_active(2));
        assert_eq!(lp.extract_solution(&[4]), vector(&[0, 1, 1]));
    }

    #[test]
    fn deactivated_columns_cannot_be_positive() {
        let tri = Arc::new(Triangulation::with_size(1));
        let mut lp = root::<LPConstraintNone>(&tri, NormalCoordinates::Quad);
        lp.constrain_zero(0);
        assert!(lp.is_feasible());
        assert!(!lp.is_active(0));
        lp.constrain_positive(0);
        assert!(!lp.is_feasible());
    }

    #[test]
    fn euler_positive_root() {
        let tri = Arc::new(Triangulation::with_size(1));
        let lp = root::<LPConstraintEulerPositive>(&tri, NormalCoordinates::Standard);
        assert_eq!(lp.rank(), 1);
        assert_eq!(lp.number_of_columns(), 8);
        assert!(lp.is_feasible());
        assert!(lp.verify());

        //the first column (a quadrilateral) carries the whole Euler characteristic
        let solution = lp.extract_solution(&[0; 5]);
        assert_eq!(solution, vector(&[0, 0, 0, 0, 1, 0, 0]));
        let surface = NormalSurface::new(tri.clone(), NormalCoordinates::Standard, solution);
        assert!(LPConstraintEulerPositive::verify(&surface));
    }

    /**
     * The change of variable of constrain_positive, without restoring
     * feasibility afterwards.
     */
    fn shift_positive<C: LPConstraint>(lp: &mut Tableau<C>, column: usize) {
        match lp.state[column] {
            VarState::Basic(row) => {
                let e = lp.entry(row, column);
                lp.rhs[row] -= e;
            }
            _ => {
                for row in 0..lp.rank {
                    let e = lp.entry(row, column);
                    lp.rhs[row] -= e;
                }
            }
        }
    }

    #[test]
    fn blands_rule_agrees() {
        let cases = [("cPcbbbiht", NormalCoordinates::Quad), ("bkaagb", NormalCoordinates::Standard)];
        for (signature, coords) in cases {
            let tri = Arc::new(Triangulation::from_iso_sig(signature).unwrap());
            let start = root::<LPConstraintNone>(&tri, coords);
            for column in 0..start.coordinate_columns() {
                for zero in 0..start.coordinate_columns() {
                    if zero == column {
                        continue;
                    }
                    let mut greedy = Tableau::new(start.initial());
                    greedy.init_clone(&start);
                    greedy.constrain_zero(zero);
                    if !greedy.is_feasible() {
                        continue;
                    }
                    let mut bland = Tableau::new(start.initial());
                    bland.init_clone(&greedy);

                    greedy.constrain_positive(column);
                    shift_positive(&mut bland, column);
                    bland.make_feasible_anti_cycling();

                    assert_eq!(greedy.is_feasible(), bland.is_feasible(), "{} column {} zero {}", signature, column, zero);
                    if bland.is_feasible() {
                        assert!(bland.verify());
                        assert!((0..bland.rank()).all(|row| bland.rhs[row] >= BigInt::from(0)));
                    }
                }
            }
        }
    }

    #[test]
    fn cycle_check() {
        let mut cycles = CycleCheck::new(4, &[0, 1]);
        //snapshots are taken after the first and the second pivot
        assert!(!cycles.pivoted(0, 2));
        assert!(!cycles.pivoted(2, 3));
        assert!(!cycles.pivoted(3, 0));
        //back to the basis {1, 3} of the second snapshot
        assert!(cycles.pivoted(0, 3));

        let mut cycles = CycleCheck::new(4, &[0, 1]);
        assert!(!cycles.pivoted(0, 2));
        assert!(!cycles.pivoted(1, 3));
        assert!(!cycles.pivoted(2, 0));
        assert!(!cycles.pivoted(3, 1));
        assert_eq!(cycles.pivots, 4);
    }
}
