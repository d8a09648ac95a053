pub mod artifact;
pub mod backend;
pub mod graph;
pub mod tensor;

pub use artifact::*;
pub use backend::*;
pub use graph::*;
pub use tensor::*;
