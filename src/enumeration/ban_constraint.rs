use bitvec::{bitvec, vec::BitVec};

use crate::{
    optimisation_algorithms::{initial_tableau::InitialTableau, tableau::Tableau},
    surfaces::normal_coordinates::NormalCoordinates,
    triangulation::triangulation::Triangulation,
};

use super::lp_constraint::LPConstraint;

/**
 * Bans and marks on the coordinate columns of a tree traversal.
 *
 * A banned column is constrained to zero at the root of every search. A
 * marked column is a triangle column that the single solution search will
 * not try to set to zero first. Both are indexed by internal column, that
 * is, after the permutation of the initial tableau.
 */
pub trait BanConstraint: Sized + Send + Sync {
    const NAME: &'static str;

    fn new<C: LPConstraint>(initial: &InitialTableau<C>) -> Self;

    fn banned(&self, column: usize) -> bool;

    fn marked(&self, column: usize) -> bool;

    fn enforce_bans<C: LPConstraint>(&self, lp: &mut Tableau<C>) {
        for column in 0..lp.coordinate_columns() {
            if self.banned(column) {
                lp.constrain_zero(column);
            }
        }
    }

    fn supported(coords: NormalCoordinates) -> bool;
}

pub struct BanNone;

impl BanConstraint for BanNone {
    const NAME: &'static str = "none";

    fn new<C: LPConstraint>(_initial: &InitialTableau<C>) -> Self {
        Self
    }

    fn banned(&self, _column: usize) -> bool {
        false
    }

    fn marked(&self, _column: usize) -> bool {
        false
    }

    fn enforce_bans<C: LPConstraint>(&self, _lp: &mut Tableau<C>) {}

    fn supported(_coords: NormalCoordinates) -> bool {
        true
    }
}

/**
 * The disc that an internal column counts.
 */
enum Disc {
    Triangle { tetrahedron: usize, vertex: usize },
    Quad { tetrahedron: usize },
}

fn disc_of<C: LPConstraint>(initial: &InitialTableau<C>, column: usize) -> Disc {
    let original = initial.col_perm()[column];
    if initial.coordinates().has_triangles() {
        let (tetrahedron, offset) = (original / 7, original % 7);
        if offset < 4 {
            Disc::Triangle {
                tetrahedron,
                vertex: offset,
            }
        } else {
            Disc::Quad { tetrahedron }
        }
    } else {
        Disc::Quad {
            tetrahedron: original / 3,
        }
    }
}

/**
 * Fills the ban and mark arrays: a disc is banned if it meets one of the
 * given faces, and a triangle is marked if it lies in the link of one of
 * the given vertices.
 */
fn ban_discs<C: LPConstraint>(initial: &InitialTableau<C>, faces: &BitVec, vertices: &BitVec) -> (BitVec, BitVec) {
    let tri: &Triangulation = initial.triangulation();
    let skeleton = tri.skeleton();
    let columns = initial.coordinate_columns();
    let mut banned = bitvec![0; columns];
    let mut marked = bitvec![0; columns];

    for column in 0..columns {
        match disc_of(initial, column) {
            Disc::Triangle { tetrahedron, vertex } => {
                //a triangle meets the three facets that contain its vertex
                let touches = (0..4).filter(|k| *k != vertex).any(|k| faces[skeleton.face_of(tetrahedron, k)]);
                banned.set(column, touches);
                marked.set(column, vertices[skeleton.vertex_of(tetrahedron, vertex)]);
            }
            Disc::Quad { tetrahedron } => {
                let touches = (0..4).any(|k| faces[skeleton.face_of(tetrahedron, k)]);
                banned.set(column, touches);
            }
        }
    }

    (banned, marked)
}

/**
 * Bans every disc that touches the boundary of the triangulation.
 */
pub struct BanBoundary {
    banned: BitVec,
    marked: BitVec,
}

impl BanConstraint for BanBoundary {
    const NAME: &'static str = "boundary";

    fn new<C: LPConstraint>(initial: &InitialTableau<C>) -> Self {
        let skeleton = initial.triangulation().skeleton();
        let mut faces = bitvec![0; skeleton.faces.len()];
        for (index, face) in skeleton.faces.iter().enumerate() {
            faces.set(index, face.is_boundary());
        }
        let vertices = bitvec![0; skeleton.vertices.len()];

        let (banned, marked) = ban_discs(initial, &faces, &vertices);
        log::debug!("boundary bans {} of {} columns", banned.count_ones(), banned.len());
        Self { banned, marked }
    }

    fn banned(&self, column: usize) -> bool {
        self.banned.get(column).is_some_and(|b| *b)
    }

    fn marked(&self, column: usize) -> bool {
        self.marked.get(column).is_some_and(|b| *b)
    }

    fn supported(coords: NormalCoordinates) -> bool {
        coords.has_triangles()
    }
}

/**
 * Bans every disc that touches a real torus boundary component, and marks
 * every triangle in the link of a vertex on such a component.
 */
pub struct BanTorusBoundary {
    banned: BitVec,
    marked: BitVec,
}

impl BanConstraint for BanTorusBoundary {
    const NAME: &'static str = "torus boundary";

    fn new<C: LPConstraint>(initial: &InitialTableau<C>) -> Self {
        let skeleton = initial.triangulation().skeleton();
        let mut faces = bitvec![0; skeleton.faces.len()];
        let mut vertices = bitvec![0; skeleton.vertices.len()];
        for component in skeleton.boundary_components.iter().filter(|c| c.is_torus()) {
            component.faces.iter().for_each(|f| faces.set(*f, true));
            component.vertices.iter().for_each(|v| vertices.set(*v, true));
        }

        let (banned, marked) = ban_discs(initial, &faces, &vertices);
        log::debug!(
            "torus boundary bans {} and marks {} of {} columns",
            banned.count_ones(),
            marked.count_ones(),
            banned.len()
        );
        Self { banned, marked }
    }

    fn banned(&self, column: usize) -> bool {
        self.banned.get(column).is_some_and(|b| *b)
    }

    fn marked(&self, column: usize) -> bool {
        self.marked.get(column).is_some_and(|b| *b)
    }

    fn supported(coords: NormalCoordinates) -> bool {
        coords.has_triangles()
    }
}
