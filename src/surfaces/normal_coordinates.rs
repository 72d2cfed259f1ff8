use strum_macros::{Display, EnumIter};

/**
 * The coordinate systems in which surfaces can be enumerated.
 *
 * The linear programs only ever work in quadrilateral or standard coordinates;
 * the almost normal systems reuse those and treat octagons as a pair of
 * quadrilateral columns.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum NormalCoordinates {
    #[strum(serialize = "quadrilateral")]
    Quad,
    #[strum(serialize = "standard")]
    Standard,
    #[strum(serialize = "standard almost normal")]
    AlmostNormal,
    #[strum(serialize = "quadrilateral-octagon")]
    AlmostNormalQuadOct,
}

impl NormalCoordinates {
    pub fn has_triangles(&self) -> bool {
        matches!(self, NormalCoordinates::Standard | NormalCoordinates::AlmostNormal)
    }

    pub fn has_octagons(&self) -> bool {
        matches!(self, NormalCoordinates::AlmostNormal | NormalCoordinates::AlmostNormalQuadOct)
    }

    /**
     * The coordinate system of the underlying linear programs.
     */
    pub fn internal(&self) -> NormalCoordinates {
        if self.has_triangles() {
            NormalCoordinates::Standard
        } else {
            NormalCoordinates::Quad
        }
    }

    /**
     * Number of linear programming columns per tetrahedron.
     */
    pub fn columns_per_tetrahedron(&self) -> usize {
        if self.has_triangles() { 7 } else { 3 }
    }

    /**
     * Number of entries per tetrahedron in the reported surface vectors.
     */
    pub fn surface_block(&self) -> usize {
        match self {
            NormalCoordinates::Quad => 3,
            NormalCoordinates::Standard => 7,
            NormalCoordinates::AlmostNormal => 10,
            NormalCoordinates::AlmostNormalQuadOct => 6,
        }
    }

    /**
     * Length of a type vector for a triangulation of the given size.
     */
    pub fn type_vector_length(&self, size: usize) -> usize {
        if self.has_triangles() { 5 * size } else { size }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::NormalCoordinates;

    #[test]
    fn internal_systems() {
        for coords in NormalCoordinates::iter() {
            let internal = coords.internal();
            assert!(!internal.has_octagons());
            assert_eq!(internal.has_triangles(), coords.has_triangles());
            assert_eq!(internal.columns_per_tetrahedron(), coords.columns_per_tetrahedron());
            assert!(coords.surface_block() >= coords.columns_per_tetrahedron());
        }
        assert_eq!(NormalCoordinates::AlmostNormal.internal(), NormalCoordinates::Standard);
        assert_eq!(NormalCoordinates::AlmostNormalQuadOct.to_string(), "quadrilateral-octagon");
        assert_eq!(NormalCoordinates::Standard.type_vector_length(3), 15);
    }
}
