use std::cmp::Ordering;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One as NumOne, Signed as NumSigned, Zero as NumZero};

/// Exact integer operations that the tableau code relies on.
///
/// num-bigint already gives us the ring operations; this trait adds the
/// handful of in-place number theoretic helpers with the exact semantics we
/// need (non-negative gcd, division that must not leave a remainder).
pub trait ExactInteger: Sized + Clone {
    /// -1, 0 or 1.
    fn sgn(&self) -> i8;

    /// Divides in place. The divisor must be non-zero and must divide self.
    fn div_exact(&mut self, divisor: &Self);

    /// Replaces self by gcd(self, other), which is always non-negative.
    /// gcd(0, 0) is 0.
    fn gcd_with(&mut self, other: &Self);

    /// Replaces self by lcm(self, other), which is always non-negative.
    fn lcm_with(&mut self, other: &Self);
}

impl ExactInteger for BigInt {
    fn sgn(&self) -> i8 {
        match NumZero::is_zero(self) {
            true => 0,
            false => {
                if NumSigned::is_negative(self) {
                    -1
                } else {
                    1
                }
            }
        }
    }

    fn div_exact(&mut self, divisor: &Self) {
        assert!(!NumZero::is_zero(divisor), "division by zero");
        debug_assert!(
            NumZero::is_zero(&(&*self % divisor)),
            "{} is not divisible by {}",
            self,
            divisor
        );
        *self /= divisor;
    }

    fn gcd_with(&mut self, other: &Self) {
        *self = Integer::gcd(&*self, other);
    }

    fn lcm_with(&mut self, other: &Self) {
        if NumZero::is_zero(self) || NumZero::is_zero(other) {
            *self = BigInt::from(0);
        } else {
            *self = Integer::lcm(&*self, other);
        }
    }
}

macro_rules! exact_primitive {
    ($t:ident) => {
        impl ExactInteger for $t {
            fn sgn(&self) -> i8 {
                match self.cmp(&0) {
                    Ordering::Less => -1,
                    Ordering::Equal => 0,
                    Ordering::Greater => 1,
                }
            }

            fn div_exact(&mut self, divisor: &Self) {
                assert!(*divisor != 0, "division by zero");
                debug_assert!(*self % *divisor == 0, "{} is not divisible by {}", self, divisor);
                *self /= *divisor;
            }

            fn gcd_with(&mut self, other: &Self) {
                *self = Integer::gcd(self, other);
            }

            fn lcm_with(&mut self, other: &Self) {
                *self = Integer::lcm(self, other);
            }
        }
    };
}

exact_primitive!(i64);
exact_primitive!(i32);

/// Divides the vector through by the gcd of its entries, so that the result
/// is the smallest integer multiple in the same direction.
/// Returns the gcd that was divided out (zero for the zero vector).
pub fn scale_down(vector: &mut [BigInt]) -> BigInt {
    let mut gcd = BigInt::from(0);
    for x in vector.iter() {
        if gcd.is_one() {
            break;
        }
        gcd.gcd_with(x);
    }
    if !NumZero::is_zero(&gcd) && !NumOne::is_one(&gcd) {
        for x in vector.iter_mut() {
            x.div_exact(&gcd);
        }
    }
    gcd
}
