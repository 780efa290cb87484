pub mod char_matrix;
pub mod vector;

pub use char_matrix::*;
pub use vector::*;
