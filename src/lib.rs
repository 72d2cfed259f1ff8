pub mod math {
    pub mod lp_matrix;
    pub mod traits;
}
pub mod triangulation {
    pub mod cusp;
    pub mod isomorphism_signature;
    pub mod perm;
    pub mod skeleton;
    pub mod triangulation;
}
pub mod surfaces {
    pub mod disc_tables;
    pub mod matching_equations;
    pub mod normal_coordinates;
    pub mod normal_surface;
}
pub mod optimisation_algorithms {
    pub mod initial_tableau;
    pub mod tableau;
}
pub mod enumeration {
    pub mod ban_constraint;
    pub mod lp_constraint;
    pub mod tree_enumeration;
    pub mod tree_single_solution;
    pub mod tree_traversal;
    pub mod type_trie;
}
pub mod tree_framework {
    pub mod tree_command;
}
