use std::{fmt::Display, sync::OnceLock};

use anyhow::{Result, anyhow};

use super::{perm::Perm4, skeleton::Skeleton};

/**
 * Where a facet of a tetrahedron is glued: the adjacent tetrahedron and the
 * permutation that maps the vertices of this tetrahedron to those of the
 * adjacent one.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gluing {
    pub tetrahedron: usize,
    pub perm: Perm4,
}

/**
 * A 3-manifold triangulation: tetrahedra whose facets are glued in pairs.
 * Facet i of a tetrahedron is the facet opposite vertex i.
 */
#[derive(Clone, Default)]
pub struct Triangulation {
    tetrahedra: Vec<[Option<Gluing>; 4]>,
    skeleton: OnceLock<Skeleton>,
}

impl Triangulation {
    pub fn new() -> Self {
        Self::default()
    }

    /**
     * Creates a triangulation with the given number of unglued tetrahedra.
     */
    pub fn with_size(size: usize) -> Self {
        let mut result = Self::new();
        for _ in 0..size {
            result.add_tetrahedron();
        }
        result
    }

    pub fn add_tetrahedron(&mut self) -> usize {
        self.tetrahedra.push([None; 4]);
        self.skeleton = OnceLock::new();
        self.tetrahedra.len() - 1
    }

    pub fn size(&self) -> usize {
        self.tetrahedra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tetrahedra.is_empty()
    }

    pub fn adjacent(&self, tetrahedron: usize, facet: usize) -> Option<Gluing> {
        self.tetrahedra[tetrahedron][facet]
    }

    pub fn is_boundary_facet(&self, tetrahedron: usize, facet: usize) -> bool {
        self.tetrahedra[tetrahedron][facet].is_none()
    }

    pub fn has_boundary_facets(&self) -> bool {
        self.tetrahedra.iter().any(|facets| facets.iter().any(|g| g.is_none()))
    }

    /**
     * Glues the given facet of the given tetrahedron to facet gluing(facet) of
     * the adjacent tetrahedron, in both directions.
     */
    pub fn join(&mut self, tetrahedron: usize, facet: usize, adjacent: usize, gluing: Perm4) {
        let adjacent_facet = gluing.apply(facet);
        assert!(
            self.try_join(tetrahedron, facet, adjacent, gluing).is_ok(),
            "cannot glue facet {} of tetrahedron {} to facet {} of tetrahedron {}",
            facet,
            tetrahedron,
            adjacent_facet,
            adjacent
        );
    }

    /**
     * As join, but reports an error instead of panicking.
     */
    pub fn try_join(&mut self, tetrahedron: usize, facet: usize, adjacent: usize, gluing: Perm4) -> Result<()> {
        if tetrahedron >= self.size() || adjacent >= self.size() || facet > 3 {
            return Err(anyhow!("gluing refers to a non-existent tetrahedron or facet"));
        }
        let adjacent_facet = gluing.apply(facet);
        if tetrahedron == adjacent && adjacent_facet == facet {
            return Err(anyhow!("a facet cannot be glued to itself"));
        }
        if self.tetrahedra[tetrahedron][facet].is_some() || self.tetrahedra[adjacent][adjacent_facet].is_some() {
            return Err(anyhow!("facet is already glued"));
        }

        self.tetrahedra[tetrahedron][facet] = Some(Gluing {
            tetrahedron: adjacent,
            perm: gluing,
        });
        self.tetrahedra[adjacent][adjacent_facet] = Some(Gluing {
            tetrahedron,
            perm: gluing.inverse(),
        });
        self.skeleton = OnceLock::new();
        Ok(())
    }

    /**
     * The skeleton is computed on first use and cached until the next change.
     */
    pub fn skeleton(&self) -> &Skeleton {
        self.skeleton.get_or_init(|| Skeleton::new(self))
    }
}

impl Display for Triangulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "triangulation with {} tetrahedra", self.size())?;
        for (t, facets) in self.tetrahedra.iter().enumerate() {
            write!(f, "{}:", t)?;
            for gluing in facets.iter() {
                match gluing {
                    Some(Gluing { tetrahedron, perm }) => write!(f, " {} ({})", tetrahedron, perm)?,
                    None => write!(f, " boundary")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::triangulation::perm::Perm4;

    use super::Triangulation;

    #[test]
    fn join_is_symmetric() {
        let mut tri = Triangulation::with_size(2);
        let p = Perm4::new([1, 2, 3, 0]);
        tri.join(0, 2, 1, p);
        let g = tri.adjacent(0, 2).unwrap();
        assert_eq!(g.tetrahedron, 1);
        assert_eq!(g.perm, p);
        let back = tri.adjacent(1, 3).unwrap();
        assert_eq!(back.tetrahedron, 0);
        assert_eq!(back.perm, p.inverse());
        assert!(tri.is_boundary_facet(0, 0));
        assert!(tri.has_boundary_facets());
    }

    #[test]
    fn invalid_joins() {
        let mut tri = Triangulation::with_size(1);
        assert!(tri.try_join(0, 0, 0, Perm4::IDENTITY).is_err());
        assert!(tri.try_join(0, 0, 0, Perm4::swap(0, 1)).is_ok());
        assert!(tri.try_join(0, 1, 0, Perm4::swap(1, 2)).is_err());
        assert!(tri.try_join(0, 2, 3, Perm4::IDENTITY).is_err());
    }

    #[test]
    #[should_panic]
    fn double_join_panics() {
        let mut tri = Triangulation::with_size(2);
        tri.join(0, 0, 1, Perm4::IDENTITY);
        tri.join(0, 0, 1, Perm4::swap(0, 1));
    }
}
