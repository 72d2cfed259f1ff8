use std::ops::{Index, IndexMut};

use num::{BigInt, Zero};
use rayon::iter::{IndexedParallelIterator, IntoParallelRefMutIterator, ParallelIterator};

use super::traits::ExactInteger;

/**
 * A dense matrix of big integers, used for the row operations of the tableaux.
 *
 * The matrix goes through two phases: first, space is reserved for a maximum
 * number of rows and columns (once only), and then it is initialised to a size
 * within that reservation (as often as needed). This lets the search tree
 * reuse the same memory for many tableaux.
 */
#[derive(Clone, Default)]
pub struct LPMatrix {
    rows: Vec<Vec<BigInt>>,
    number_of_rows: usize,
    number_of_columns: usize,
}

//use multiple threads when eliminating over this many rows
const PARALLEL_THRESHOLD: usize = 64;

impl LPMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /**
     * Creates and initialises a matrix of the given size, filled with zeroes.
     */
    pub fn new_sized(rows: usize, columns: usize) -> Self {
        let mut result = Self::new();
        result.reserve(rows, columns);
        result.number_of_rows = rows;
        result.number_of_columns = columns;
        result
    }

    /**
     * Reserves space. May be called only once per matrix.
     */
    pub fn reserve(&mut self, max_rows: usize, max_columns: usize) {
        assert!(self.rows.is_empty(), "an LP matrix can be reserved only once");
        self.rows = vec![vec![BigInt::zero(); max_columns]; max_rows];
        self.number_of_rows = 0;
        self.number_of_columns = 0;
    }

    pub fn reserved_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn reserved_columns(&self) -> usize {
        self.rows.first().map_or(0, |row| row.len())
    }

    /**
     * Turns this matrix into a copy of the given matrix.
     */
    pub fn init_clone(&mut self, other: &LPMatrix) {
        assert!(other.number_of_rows <= self.reserved_rows());
        assert!(other.number_of_columns <= self.reserved_columns());
        self.number_of_rows = other.number_of_rows;
        self.number_of_columns = other.number_of_columns;
        for (row, other_row) in self.rows.iter_mut().zip(other.rows.iter()).take(other.number_of_rows) {
            row[..other.number_of_columns].clone_from_slice(&other_row[..other.number_of_columns]);
        }
    }

    /**
     * Turns this matrix into the identity of the given size.
     */
    pub fn init_identity(&mut self, size: usize) {
        assert!(size <= self.reserved_rows() && size <= self.reserved_columns());
        self.number_of_rows = size;
        self.number_of_columns = size;
        for (r, row) in self.rows.iter_mut().take(size).enumerate() {
            for (c, x) in row.iter_mut().take(size).enumerate() {
                if r == c {
                    *x = BigInt::from(1);
                } else {
                    x.set_zero();
                }
            }
        }
    }

    pub fn get_number_of_rows(&self) -> usize {
        self.number_of_rows
    }

    pub fn get_number_of_columns(&self) -> usize {
        self.number_of_columns
    }

    pub fn entry(&self, row: usize, column: usize) -> &BigInt {
        debug_assert!(row < self.number_of_rows && column < self.number_of_columns);
        &self.rows[row][column]
    }

    pub fn entry_mut(&mut self, row: usize, column: usize) -> &mut BigInt {
        debug_assert!(row < self.number_of_rows && column < self.number_of_columns);
        &mut self.rows[row][column]
    }

    pub fn swap_rows(&mut self, row1: usize, row2: usize) {
        if row1 != row2 {
            self.rows.swap(row1, row2);
        }
    }

    pub fn negate_row(&mut self, row: usize) {
        let columns = self.number_of_columns;
        self.rows[row][..columns].iter_mut().for_each(|x| *x = -&*x);
    }

    /**
     * Replaces row dest by (dest_coefficient * row dest - source_coefficient * row source) / div.
     * The division must be exact.
     */
    pub fn comb_row(&mut self, dest_coefficient: &BigInt, dest: usize, source_coefficient: &BigInt, source: usize, div: &BigInt) {
        let columns = self.number_of_columns;
        let (dest_row, source_row) = self.two_rows_mut(dest, source);
        comb(&mut dest_row[..columns], dest_coefficient, &source_row[..columns], source_coefficient, div);
    }

    /**
     * Replaces row dest by (dest_coefficient * row dest - source_coefficient * row source),
     * then divides the row through by the gcd of its elements.
     *
     * Returns the (non-negative) gcd, or zero if the row became zero.
     */
    pub fn comb_row_and_norm(&mut self, dest_coefficient: &BigInt, dest: usize, source_coefficient: &BigInt, source: usize) -> BigInt {
        let columns = self.number_of_columns;
        let (dest_row, source_row) = self.two_rows_mut(dest, source);
        comb_and_norm(&mut dest_row[..columns], dest_coefficient, &source_row[..columns], source_coefficient)
    }

    /**
     * Clears column `column` in the rows source+1..until, using row `source` and
     * normalising each changed row. Rows with a zero in the column are untouched.
     */
    pub fn eliminate_below(&mut self, source: usize, column: usize, until: usize) {
        let columns = self.number_of_columns;
        let (head, tail) = self.rows.split_at_mut(source + 1);
        let source_row = &head[source][..columns];
        let lead = &source_row[column];
        let step = |row: &mut Vec<BigInt>| {
            if !row[column].is_zero() {
                let coefficient = row[column].clone();
                comb_and_norm(&mut row[..columns], lead, source_row, &coefficient);
            }
        };

        let tail = &mut tail[..until.saturating_sub(source + 1)];
        if tail.len() > PARALLEL_THRESHOLD {
            tail.par_iter_mut().with_min_len(8).for_each(step);
        } else {
            tail.iter_mut().for_each(step);
        }
    }

    /**
     * Returns mutable access to row a and shared access to row b.
     */
    fn two_rows_mut(&mut self, a: usize, b: usize) -> (&mut Vec<BigInt>, &Vec<BigInt>) {
        assert_ne!(a, b, "a row cannot be combined with itself");
        if a < b {
            let (head, tail) = self.rows.split_at_mut(b);
            (&mut head[a], &tail[0])
        } else {
            let (head, tail) = self.rows.split_at_mut(a);
            (&mut tail[0], &head[b])
        }
    }
}

fn comb(dest: &mut [BigInt], dest_coefficient: &BigInt, source: &[BigInt], source_coefficient: &BigInt, div: &BigInt) {
    for (d, s) in dest.iter_mut().zip(source.iter()) {
        *d *= dest_coefficient;
        *d -= source_coefficient * s;
        d.div_exact(div);
    }
}

fn comb_and_norm(dest: &mut [BigInt], dest_coefficient: &BigInt, source: &[BigInt], source_coefficient: &BigInt) -> BigInt {
    let mut gcd = BigInt::zero();
    let one = BigInt::from(1);
    for (d, s) in dest.iter_mut().zip(source.iter()) {
        *d *= dest_coefficient;
        *d -= source_coefficient * s;
        if gcd != one {
            gcd.gcd_with(d);
        }
    }
    if gcd > one {
        dest.iter_mut().for_each(|d| d.div_exact(&gcd));
    }
    gcd
}

impl Index<usize> for LPMatrix {
    type Output = [BigInt];

    fn index(&self, index: usize) -> &Self::Output {
        &self.rows[index][..self.number_of_columns]
    }
}

impl IndexMut<usize> for LPMatrix {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let columns = self.number_of_columns;
        &mut self.rows[index][..columns]
    }
}

impl std::fmt::Display for LPMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for r in 0..self.number_of_rows {
            if r > 0 {
                write!(f, " ")?;
            }
            write!(f, "[")?;
            for x in self[r].iter() {
                write!(f, " {}", x)?;
            }
            write!(f, " ]")?;
        }
        write!(f, "]")
    }
}

impl std::fmt::Debug for LPMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} LP matrix (reserved {}x{})", self.number_of_rows, self.number_of_columns, self.reserved_rows(), self.reserved_columns())
    }
}

#[cfg(test)]
mod tests {
    use num::BigInt;

    use super::LPMatrix;

    fn from(rows: &[&[i64]]) -> LPMatrix {
        let mut m = LPMatrix::new_sized(rows.len(), rows[0].len());
        for (r, row) in rows.iter().enumerate() {
            for (c, x) in row.iter().enumerate() {
                *m.entry_mut(r, c) = BigInt::from(*x);
            }
        }
        m
    }

    #[test]
    fn identity_and_clone() {
        let mut m = LPMatrix::new();
        m.reserve(4, 4);
        m.init_identity(3);
        assert_eq!(m.get_number_of_rows(), 3);
        assert_eq!(m.to_string(), "[[ 1 0 0 ] [ 0 1 0 ] [ 0 0 1 ]]");

        let mut n = LPMatrix::new();
        n.reserve(4, 4);
        n.init_clone(&m);
        n.negate_row(1);
        n.swap_rows(0, 2);
        assert_eq!(n.to_string(), "[[ 0 0 1 ] [ 0 -1 0 ] [ 1 0 0 ]]");

        //re-initialise to a smaller size
        n.init_identity(2);
        assert_eq!(n.to_string(), "[[ 1 0 ] [ 0 1 ]]");
    }

    #[test]
    #[should_panic]
    fn double_reserve() {
        let mut m = LPMatrix::new();
        m.reserve(2, 2);
        m.reserve(2, 2);
    }

    #[test]
    fn combine_rows() {
        let mut m = from(&[&[2, 4, 6], &[1, 3, 5]]);
        //(3 * row1 - 1 * row0) / 1
        m.comb_row(&BigInt::from(3), 1, &BigInt::from(1), 0, &BigInt::from(1));
        assert_eq!(m.to_string(), "[[ 2 4 6 ] [ 1 5 9 ]]");

        m.comb_row(&BigInt::from(2), 0, &BigInt::from(0), 1, &BigInt::from(4));
        assert_eq!(m.to_string(), "[[ 1 2 3 ] [ 1 5 9 ]]");
    }

    #[test]
    fn combine_and_normalise() {
        let mut m = from(&[&[1, 1, 0], &[3, 1, 2]]);
        //row1 = 1*row1 - 3*row0 = [0 -2 2], gcd 2
        let gcd = m.comb_row_and_norm(&BigInt::from(1), 1, &BigInt::from(3), 0);
        assert_eq!(gcd, BigInt::from(2));
        assert_eq!(m.to_string(), "[[ 1 1 0 ] [ 0 -1 1 ]]");

        //row becomes zero
        let mut z = from(&[&[1, 2], &[2, 4]]);
        let gcd = z.comb_row_and_norm(&BigInt::from(1), 1, &BigInt::from(2), 0);
        assert_eq!(gcd, BigInt::from(0));
    }

    #[test]
    fn eliminate() {
        let mut m = from(&[&[2, 1, 0], &[4, 0, 1], &[0, 1, 1], &[1, 1, 1]]);
        m.eliminate_below(0, 0, 3);
        assert_eq!(m[1].iter().map(|x| x.to_string()).collect::<Vec<_>>(), ["0", "-2", "1"]);
        assert_eq!(m.to_string(), "[[ 2 1 0 ] [ 0 -2 1 ] [ 0 1 1 ] [ 1 1 1 ]]");
    }
}
