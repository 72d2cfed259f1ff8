use std::fmt::{Debug, Display};

/**
 * A permutation of {0, 1, 2, 3}, stored as its images.
 */
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Perm4 {
    images: [u8; 4],
}

/**
 * All 24 permutations in lexicographic order of their image strings.
 * Isomorphism signatures refer to gluings by their index in this table.
 */
pub const ORDERED_S4: [Perm4; 24] = [
    Perm4::new([0, 1, 2, 3]), Perm4::new([0, 1, 3, 2]), Perm4::new([0, 2, 1, 3]), Perm4::new([0, 2, 3, 1]),
    Perm4::new([0, 3, 1, 2]), Perm4::new([0, 3, 2, 1]), Perm4::new([1, 0, 2, 3]), Perm4::new([1, 0, 3, 2]),
    Perm4::new([1, 2, 0, 3]), Perm4::new([1, 2, 3, 0]), Perm4::new([1, 3, 0, 2]), Perm4::new([1, 3, 2, 0]),
    Perm4::new([2, 0, 1, 3]), Perm4::new([2, 0, 3, 1]), Perm4::new([2, 1, 0, 3]), Perm4::new([2, 1, 3, 0]),
    Perm4::new([2, 3, 0, 1]), Perm4::new([2, 3, 1, 0]), Perm4::new([3, 0, 1, 2]), Perm4::new([3, 0, 2, 1]),
    Perm4::new([3, 1, 0, 2]), Perm4::new([3, 1, 2, 0]), Perm4::new([3, 2, 0, 1]), Perm4::new([3, 2, 1, 0]),
];

impl Perm4 {
    pub const IDENTITY: Perm4 = Perm4::new([0, 1, 2, 3]);

    pub const fn new(images: [u8; 4]) -> Self {
        Self { images }
    }

    /**
     * The transposition of a and b.
     */
    pub const fn swap(a: usize, b: usize) -> Self {
        let mut images = [0, 1, 2, 3];
        images[a] = b as u8;
        images[b] = a as u8;
        Self { images }
    }

    /**
     * Returns None if the images do not form a permutation.
     */
    pub fn from_images(images: [u8; 4]) -> Option<Self> {
        let mut seen = [false; 4];
        for &i in images.iter() {
            if i > 3 || seen[i as usize] {
                return None;
            }
            seen[i as usize] = true;
        }
        Some(Self { images })
    }

    pub fn from_ordered_index(index: usize) -> Option<Self> {
        ORDERED_S4.get(index).copied()
    }

    pub fn ordered_index(&self) -> usize {
        //lexicographic rank
        let mut result = 0;
        for i in 0..4 {
            let smaller_later = (i + 1..4).filter(|&j| self.images[j] < self.images[i]).count();
            result += smaller_later * FACTORIALS[3 - i];
        }
        result
    }

    pub fn apply(&self, i: usize) -> usize {
        self.images[i] as usize
    }

    pub fn images(&self) -> [u8; 4] {
        self.images
    }

    /**
     * Composition: (self * other)(i) = self(other(i)).
     */
    pub fn compose(&self, other: &Perm4) -> Perm4 {
        let mut images = [0; 4];
        for i in 0..4 {
            images[i] = self.images[other.images[i] as usize];
        }
        Perm4 { images }
    }

    pub fn inverse(&self) -> Perm4 {
        let mut images = [0; 4];
        for i in 0..4 {
            images[self.images[i] as usize] = i as u8;
        }
        Perm4 { images }
    }

    /**
     * 1 for even permutations, -1 for odd ones.
     */
    pub fn sign(&self) -> i32 {
        let mut inversions = 0;
        for i in 0..4 {
            for j in i + 1..4 {
                if self.images[i] > self.images[j] {
                    inversions += 1;
                }
            }
        }
        if inversions % 2 == 0 { 1 } else { -1 }
    }
}

const FACTORIALS: [usize; 4] = [1, 1, 2, 6];

impl Display for Perm4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}{}", self.images[0], self.images[1], self.images[2], self.images[3])
    }
}

impl Debug for Perm4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Perm4({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::{ORDERED_S4, Perm4};

    #[test]
    fn ordered_indices() {
        for (i, p) in ORDERED_S4.iter().enumerate() {
            assert_eq!(p.ordered_index(), i);
            assert_eq!(Perm4::from_ordered_index(i), Some(*p));
        }
        for w in ORDERED_S4.windows(2) {
            assert!(w[0] < w[1]);
        }
        assert_eq!(Perm4::from_ordered_index(24), None);
    }

    #[test]
    fn compose_and_invert() {
        let p = Perm4::new([1, 2, 0, 3]);
        let q = Perm4::new([3, 2, 1, 0]);
        let pq = p.compose(&q);
        for i in 0..4 {
            assert_eq!(pq.apply(i), p.apply(q.apply(i)));
        }
        assert_eq!(p.compose(&p.inverse()), Perm4::IDENTITY);
        assert_eq!(p.sign(), 1);
        assert_eq!(q.sign(), 1);
        assert_eq!(Perm4::swap(2, 3).sign(), -1);
        assert_eq!(Perm4::swap(2, 3).to_string(), "0132");
    }

    #[test]
    fn invalid_images() {
        assert!(Perm4::from_images([0, 0, 1, 2]).is_none());
        assert!(Perm4::from_images([0, 1, 2, 4]).is_none());
        assert_eq!(Perm4::from_images([3, 0, 1, 2]), Some(Perm4::new([3, 0, 1, 2])));
    }
}
