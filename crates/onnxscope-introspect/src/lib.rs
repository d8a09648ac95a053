//! Human-readable diagnostics for ONNX graphs: per-node shape summaries,
//! input/output listings and a kernel-size receptive-field estimate.

pub mod dynamic;
pub mod infer;
pub mod receptive_field;
pub mod report;
pub mod shape;

pub use dynamic::*;
pub use infer::*;
pub use receptive_field::*;
pub use report::*;
pub use shape::*;
