use strum_macros::Display;

use super::{perm::Perm4, triangulation::Triangulation};

/**
 * The vertices of each edge of a tetrahedron, indexed by edge number.
 */
pub const EDGE_VERTICES: [[usize; 2]; 6] = [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];

/**
 * The edge number joining two distinct vertices of a tetrahedron.
 */
pub const EDGE_NUMBER: [[usize; 4]; 4] = [[usize::MAX, 0, 1, 2], [0, usize::MAX, 3, 4], [1, 3, usize::MAX, 5], [2, 4, 5, usize::MAX]];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum VertexType {
    #[strum(serialize = "internal")]
    Internal,
    #[strum(serialize = "ideal")]
    Ideal,
    #[strum(serialize = "boundary")]
    Boundary,
}

#[derive(Clone, Debug)]
pub struct Vertex {
    ///(tetrahedron, vertex) pairs
    pub embeddings: Vec<(usize, usize)>,
    pub link_euler_char: i64,
    pub link_closed: bool,
    pub vertex_type: VertexType,
}

/**
 * A place where an edge or face of the skeleton sits inside a tetrahedron.
 *
 * For an edge, perm[0] and perm[1] are its end points, and walking around the
 * edge leaves the tetrahedron through facet perm[3].
 * For a face, perm[0..3] are its vertices and perm[3] is the opposite vertex.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Embedding {
    pub tetrahedron: usize,
    pub perm: Perm4,
}

#[derive(Clone, Debug)]
pub struct Edge {
    pub embeddings: Vec<Embedding>,
    pub boundary: bool,
}

#[derive(Clone, Debug)]
pub struct Face {
    ///one embedding for boundary faces, two for internal ones
    pub embeddings: Vec<Embedding>,
}

impl Face {
    pub fn is_boundary(&self) -> bool {
        self.embeddings.len() == 1
    }

    pub fn front(&self) -> &Embedding {
        &self.embeddings[0]
    }
}

#[derive(Clone, Debug)]
pub struct BoundaryComponent {
    pub faces: Vec<usize>,
    pub vertices: Vec<usize>,
    pub euler_char: i64,
    pub orientable: bool,
}

impl BoundaryComponent {
    pub fn is_torus(&self) -> bool {
        self.euler_char == 0 && self.orientable
    }
}

/**
 * The vertices, edges, faces and boundary components of a triangulation,
 * together with orientation data.
 */
#[derive(Clone, Debug)]
pub struct Skeleton {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    pub faces: Vec<Face>,
    pub boundary_components: Vec<BoundaryComponent>,
    vertex_of: Vec<[usize; 4]>,
    edge_of: Vec<[usize; 6]>,
    face_of: Vec<[usize; 4]>,
    orientation: Vec<i32>,
    orientable: bool,
}

impl Skeleton {
    pub fn new(tri: &Triangulation) -> Self {
        let n = tri.size();
        let (vertices, vertex_of) = compute_vertices(tri);
        let (edges, edge_of) = compute_edges(tri);
        let (faces, face_of) = compute_faces(tri);
        let (orientation, orientable) = compute_orientation(tri);

        let mut result = Self {
            vertices,
            edges,
            faces,
            boundary_components: vec![],
            vertex_of,
            edge_of,
            face_of,
            orientation,
            orientable,
        };
        result.boundary_components = result.compute_boundary_components(tri);

        log::debug!(
            "skeleton of {} tetrahedra: {} vertices, {} edges, {} faces, {} boundary components, {}",
            n,
            result.vertices.len(),
            result.edges.len(),
            result.faces.len(),
            result.boundary_components.len(),
            if result.orientable { "orientable" } else { "non-orientable" }
        );
        result
    }

    pub fn vertex_of(&self, tetrahedron: usize, vertex: usize) -> usize {
        self.vertex_of[tetrahedron][vertex]
    }

    pub fn edge_of(&self, tetrahedron: usize, edge: usize) -> usize {
        self.edge_of[tetrahedron][edge]
    }

    pub fn face_of(&self, tetrahedron: usize, facet: usize) -> usize {
        self.face_of[tetrahedron][facet]
    }

    pub fn is_orientable(&self) -> bool {
        self.orientable
    }

    /**
     * +1 or -1 per tetrahedron; consistent across gluings if the triangulation
     * is orientable.
     */
    pub fn orientation(&self, tetrahedron: usize) -> i32 {
        self.orientation[tetrahedron]
    }

    pub fn is_ideal(&self) -> bool {
        self.vertices.iter().any(|v| v.vertex_type == VertexType::Ideal)
    }

    pub fn is_closed(&self) -> bool {
        self.boundary_components.is_empty() && !self.is_ideal()
    }

    fn compute_boundary_components(&self, tri: &Triangulation) -> Vec<BoundaryComponent> {
        let boundary_faces: Vec<usize> = (0..self.faces.len()).filter(|f| self.faces[*f].is_boundary()).collect();
        if boundary_faces.is_empty() {
            return vec![];
        }

        //boundary faces are connected through the edges they share
        let mut sets = DisjointSets::new(self.faces.len());
        let mut first_face_of_edge = vec![None; self.edges.len()];
        for &f in boundary_faces.iter() {
            let Embedding { tetrahedron, perm } = *self.faces[f].front();
            for i in 0..3 {
                for j in i + 1..3 {
                    let edge = self.edge_of[tetrahedron][EDGE_NUMBER[perm.apply(i)][perm.apply(j)]];
                    match first_face_of_edge[edge] {
                        None => first_face_of_edge[edge] = Some(f),
                        Some(g) => {
                            sets.union(f, g);
                        }
                    }
                }
            }
        }

        let mut result: Vec<BoundaryComponent> = vec![];
        let mut component_of = vec![usize::MAX; self.faces.len()];
        for &f in boundary_faces.iter() {
            let root = sets.find(f);
            if component_of[root] == usize::MAX {
                component_of[root] = result.len();
                result.push(BoundaryComponent {
                    faces: vec![],
                    vertices: vec![],
                    euler_char: 0,
                    orientable: true,
                });
            }
            result[component_of[root]].faces.push(f);
        }

        for component in result.iter_mut() {
            let mut vertices = vec![];
            let mut edges = vec![];
            for &f in component.faces.iter() {
                let Embedding { tetrahedron, perm } = *self.faces[f].front();
                for i in 0..3 {
                    vertices.push(self.vertex_of[tetrahedron][perm.apply(i)]);
                    for j in i + 1..3 {
                        edges.push(self.edge_of[tetrahedron][EDGE_NUMBER[perm.apply(i)][perm.apply(j)]]);
                    }
                }
            }
            vertices.sort_unstable();
            vertices.dedup();
            edges.sort_unstable();
            edges.dedup();
            component.euler_char = vertices.len() as i64 - edges.len() as i64 + component.faces.len() as i64;
            component.vertices = vertices;
            component.orientable = self.boundary_component_orientable(tri, &component.faces);
        }

        result
    }

    /**
     * Tries to orient the faces of a boundary component consistently.
     * Each face is oriented relative to the increasing order of its vertices.
     */
    fn boundary_component_orientable(&self, tri: &Triangulation, faces: &[usize]) -> bool {
        let mut face_orientation = vec![0i32; self.faces.len()];
        let mut stack = vec![faces[0]];
        face_orientation[faces[0]] = 1;
        while let Some(f) = stack.pop() {
            let Embedding { tetrahedron, perm } = *self.faces[f].front();
            for i in 0..3 {
                let (a, b) = (perm.apply(i), perm.apply((i + 1) % 3));
                let (t2, face_perm, a2, b2) = walk_to_boundary(tri, tetrahedron, perm.apply(3), a, b);
                let f2 = self.face_of[t2][face_perm.apply(3)];

                //a -> b runs along the boundary of f in its positive direction
                let wanted = -face_orientation[f] * direction(&face_perm, a2, b2);
                if face_orientation[f2] == 0 {
                    face_orientation[f2] = wanted;
                    stack.push(f2);
                } else if face_orientation[f2] != wanted {
                    return false;
                }
            }
        }
        true
    }
}

/**
 * +1 if a -> b follows the cyclic order perm[0] -> perm[1] -> perm[2] of a face, -1 otherwise.
 */
fn direction(perm: &Perm4, a: usize, b: usize) -> i32 {
    for i in 0..3 {
        if perm.apply(i) == a {
            return if perm.apply((i + 1) % 3) == b { 1 } else { -1 };
        }
    }
    0
}

/**
 * Starting from the boundary facet of the given tetrahedron, walks around the
 * edge ab through the interior until the next boundary facet.
 * Returns that tetrahedron, its face embedding, and the images of a and b.
 */
fn walk_to_boundary(tri: &Triangulation, tetrahedron: usize, facet: usize, a: usize, b: usize) -> (usize, Perm4, usize, usize) {
    let c = (0..4).find(|x| *x != a && *x != b && *x != facet).unwrap_or(0);
    //leave through c; the facet we came from is recorded in position 2
    let mut t = tetrahedron;
    let mut p = Perm4::new([a as u8, b as u8, facet as u8, c as u8]);
    let limit = 6 * tri.size() + 1;
    for _ in 0..limit {
        match tri.adjacent(t, p.apply(3)) {
            None => break,
            Some(gluing) => {
                t = gluing.tetrahedron;
                p = gluing.perm.compose(&p).compose(&Perm4::swap(2, 3));
            }
        }
    }
    let face = face_perm(p.apply(3));
    (t, face, p.apply(0), p.apply(1))
}

/**
 * The face embedding of facet f: the other vertices in increasing order, then f.
 */
pub fn face_perm(facet: usize) -> Perm4 {
    let mut images = [0u8; 4];
    let mut i = 0;
    for v in 0..4 {
        if v != facet {
            images[i] = v as u8;
            i += 1;
        }
    }
    images[3] = facet as u8;
    Perm4::new(images)
}

fn compute_vertices(tri: &Triangulation) -> (Vec<Vertex>, Vec<[usize; 4]>) {
    let n = tri.size();
    let mut sets = DisjointSets::new(4 * n);
    //corners (t, v, c) of the link triangles, c != v
    let mut corners = DisjointSets::new(16 * n);
    for t in 0..n {
        for facet in 0..4 {
            if let Some(gluing) = tri.adjacent(t, facet) {
                let g = gluing.perm;
                let t2 = gluing.tetrahedron;
                for v in (0..4).filter(|v| *v != facet) {
                    sets.union(4 * t + v, 4 * t2 + g.apply(v));
                    for c in (0..4).filter(|c| *c != facet && *c != v) {
                        corners.union(16 * t + 4 * v + c, 16 * t2 + 4 * g.apply(v) + g.apply(c));
                    }
                }
            }
        }
    }

    let mut vertex_of = vec![[usize::MAX; 4]; n];
    let mut vertices: Vec<Vertex> = vec![];
    let mut index_of_root = vec![usize::MAX; 4 * n];
    for t in 0..n {
        for v in 0..4 {
            let root = sets.find(4 * t + v);
            if index_of_root[root] == usize::MAX {
                index_of_root[root] = vertices.len();
                vertices.push(Vertex {
                    embeddings: vec![],
                    link_euler_char: 0,
                    link_closed: true,
                    vertex_type: VertexType::Internal,
                });
            }
            vertex_of[t][v] = index_of_root[root];
            vertices[index_of_root[root]].embeddings.push((t, v));
        }
    }

    for vertex in vertices.iter_mut() {
        let triangles = vertex.embeddings.len() as i64;
        let mut boundary_sides = 0i64;
        let mut link_corners = vec![];
        for &(t, v) in vertex.embeddings.iter() {
            for w in (0..4).filter(|w| *w != v) {
                if tri.is_boundary_facet(t, w) {
                    boundary_sides += 1;
                }
                link_corners.push(corners.find(16 * t + 4 * v + w));
            }
        }
        link_corners.sort_unstable();
        link_corners.dedup();
        let sides = (3 * triangles + boundary_sides) / 2;

        vertex.link_euler_char = link_corners.len() as i64 - sides + triangles;
        vertex.link_closed = boundary_sides == 0;
        vertex.vertex_type = if !vertex.link_closed {
            VertexType::Boundary
        } else if vertex.link_euler_char == 2 {
            VertexType::Internal
        } else {
            VertexType::Ideal
        };
    }

    (vertices, vertex_of)
}

fn compute_edges(tri: &Triangulation) -> (Vec<Edge>, Vec<[usize; 6]>) {
    let n = tri.size();
    let mut edge_of = vec![[usize::MAX; 6]; n];
    let mut edges = vec![];
    for t in 0..n {
        for e in 0..6 {
            if edge_of[t][e] != usize::MAX {
                continue;
            }
            let [a, b] = EDGE_VERTICES[e];
            let mut others = (0..4).filter(|x| *x != a && *x != b);
            let (c, d) = (others.next().unwrap_or(0), others.next().unwrap_or(0));
            let start = Perm4::new([a as u8, b as u8, c as u8, d as u8]);

            //walk backwards to a boundary facet, if there is one
            let (mut t0, mut p0) = (t, start.compose(&Perm4::swap(2, 3)));
            let mut boundary = false;
            for _ in 0..6 * n + 1 {
                match tri.adjacent(t0, p0.apply(3)) {
                    None => {
                        boundary = true;
                        break;
                    }
                    Some(gluing) => {
                        t0 = gluing.tetrahedron;
                        p0 = gluing.perm.compose(&p0).compose(&Perm4::swap(2, 3));
                        if t0 == t && p0 == start.compose(&Perm4::swap(2, 3)) {
                            break;
                        }
                    }
                }
            }
            let (first_t, first_p) = if boundary { (t0, p0.compose(&Perm4::swap(2, 3))) } else { (t, start) };

            let index = edges.len();
            let mut embeddings = vec![];
            let (mut t1, mut p1) = (first_t, first_p);
            for _ in 0..6 * n + 1 {
                embeddings.push(Embedding {
                    tetrahedron: t1,
                    perm: p1,
                });
                edge_of[t1][EDGE_NUMBER[p1.apply(0)][p1.apply(1)]] = index;
                match tri.adjacent(t1, p1.apply(3)) {
                    None => break,
                    Some(gluing) => {
                        t1 = gluing.tetrahedron;
                        p1 = gluing.perm.compose(&p1).compose(&Perm4::swap(2, 3));
                        if t1 == first_t && EDGE_NUMBER[p1.apply(0)][p1.apply(1)] == EDGE_NUMBER[first_p.apply(0)][first_p.apply(1)] {
                            break;
                        }
                    }
                }
            }
            edges.push(Edge { embeddings, boundary });
        }
    }
    (edges, edge_of)
}

fn compute_faces(tri: &Triangulation) -> (Vec<Face>, Vec<[usize; 4]>) {
    let n = tri.size();
    let mut face_of = vec![[usize::MAX; 4]; n];
    let mut faces = vec![];
    for t in 0..n {
        for f in 0..4 {
            if face_of[t][f] != usize::MAX {
                continue;
            }
            let p = face_perm(f);
            let mut embeddings = vec![Embedding { tetrahedron: t, perm: p }];
            face_of[t][f] = faces.len();
            if let Some(gluing) = tri.adjacent(t, f) {
                let other = gluing.perm.compose(&p);
                embeddings.push(Embedding {
                    tetrahedron: gluing.tetrahedron,
                    perm: other,
                });
                face_of[gluing.tetrahedron][other.apply(3)] = faces.len();
            }
            faces.push(Face { embeddings });
        }
    }
    (faces, face_of)
}

fn compute_orientation(tri: &Triangulation) -> (Vec<i32>, bool) {
    let n = tri.size();
    let mut orientation = vec![0; n];
    let mut orientable = true;
    for root in 0..n {
        if orientation[root] != 0 {
            continue;
        }
        orientation[root] = 1;
        let mut stack = vec![root];
        while let Some(t) = stack.pop() {
            for facet in 0..4 {
                if let Some(gluing) = tri.adjacent(t, facet) {
                    let wanted = -gluing.perm.sign() * orientation[t];
                    let t2 = gluing.tetrahedron;
                    if orientation[t2] == 0 {
                        orientation[t2] = wanted;
                        stack.push(t2);
                    } else if orientation[t2] != wanted {
                        orientable = false;
                    }
                }
            }
        }
    }
    (orientation, orientable)
}

/**
 * Union-find with path halving.
 */
pub(crate) struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    pub(crate) fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /**
     * Returns false if x and y were already in the same set.
     */
    pub(crate) fn union(&mut self, x: usize, y: usize) -> bool {
        let (rx, ry) = (self.find(x), self.find(y));
        if rx == ry {
            return false;
        }
        self.parent[rx.max(ry)] = rx.min(ry);
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::triangulation::{perm::Perm4, triangulation::Triangulation};

    use super::{DisjointSets, VertexType};

    #[test]
    fn single_tetrahedron() {
        let tri = Triangulation::with_size(1);
        let skeleton = tri.skeleton();
        assert_eq!(skeleton.vertices.len(), 4);
        assert_eq!(skeleton.edges.len(), 6);
        assert_eq!(skeleton.faces.len(), 4);
        assert!(skeleton.edges.iter().all(|e| e.boundary && e.embeddings.len() == 1));
        assert!(skeleton.vertices.iter().all(|v| v.vertex_type == VertexType::Boundary));
        assert_eq!(skeleton.boundary_components.len(), 1);
        assert_eq!(skeleton.boundary_components[0].euler_char, 2);
        assert!(skeleton.boundary_components[0].orientable);
        assert!(!skeleton.boundary_components[0].is_torus());
    }

    #[test]
    fn figure_eight() {
        let tri = Triangulation::from_iso_sig("cPcbbbiht").unwrap();
        let skeleton = tri.skeleton();
        assert_eq!(skeleton.vertices.len(), 1);
        assert_eq!(skeleton.vertices[0].vertex_type, VertexType::Ideal);
        assert_eq!(skeleton.vertices[0].link_euler_char, 0);
        assert_eq!(skeleton.edges.len(), 2);
        assert!(skeleton.edges.iter().all(|e| e.embeddings.len() == 6 && !e.boundary));
        assert_eq!(skeleton.faces.len(), 4);
        assert!(skeleton.is_orientable());
        assert!(skeleton.is_ideal());
        assert!(skeleton.boundary_components.is_empty());
    }

    #[test]
    fn layered_loop() {
        let tri = Triangulation::from_iso_sig("bkaagb").unwrap();
        let skeleton = tri.skeleton();
        assert_eq!(skeleton.vertices.len(), 2);
        assert!(skeleton.vertices.iter().all(|v| v.vertex_type == VertexType::Internal));
        assert_eq!(skeleton.edges.len(), 3);
        assert_eq!(skeleton.faces.len(), 2);
        assert!(skeleton.is_orientable());
        assert!(skeleton.is_closed());
        let degrees: usize = skeleton.edges.iter().map(|e| e.embeddings.len()).sum();
        assert_eq!(degrees, 6);
    }

    #[test]
    fn edges_are_consistent() {
        let tri = Triangulation::from_iso_sig("cPcbbbiht").unwrap();
        let skeleton = tri.skeleton();
        for (i, edge) in skeleton.edges.iter().enumerate() {
            for embedding in edge.embeddings.iter() {
                let e = super::EDGE_NUMBER[embedding.perm.apply(0)][embedding.perm.apply(1)];
                assert_eq!(skeleton.edge_of(embedding.tetrahedron, e), i);
            }
        }
    }

    #[test]
    fn non_orientable_gluing() {
        //glue two facets of one tetrahedron by an even permutation
        let mut tri = Triangulation::with_size(1);
        tri.join(0, 0, 0, Perm4::new([1, 2, 0, 3]));
        assert!(!tri.skeleton().is_orientable());
    }

    #[test]
    fn disjoint_sets() {
        let mut sets = DisjointSets::new(5);
        assert!(sets.union(3, 1));
        assert!(sets.union(1, 4));
        assert!(!sets.union(4, 3));
        assert_eq!(sets.find(4), 1);
        assert_eq!(sets.find(3), sets.find(4));
        assert_ne!(sets.find(0), sets.find(2));
        assert_eq!(sets.find(2), 2);
        assert!(sets.union(0, 2));
        assert_eq!(sets.find(2), 0);
    }

    #[test]
    fn boundary_components_share_edges() {
        //two unglued tetrahedra: the four faces of each form one sphere
        let tri = Triangulation::with_size(2);
        let skeleton = tri.skeleton();
        assert_eq!(skeleton.boundary_components.len(), 2);
        assert!(skeleton.boundary_components.iter().all(|c| c.faces.len() == 4 && c.euler_char == 2));
    }
}
