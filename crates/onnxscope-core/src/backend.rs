use anyhow::Result;

use crate::{Graph, ModelLocation, TensorInfo};

/// Turns a model location into a parsed graph.
pub trait ModelLoader {
    fn name(&self) -> &'static str;
    fn load(&self, location: &ModelLocation) -> Result<Graph>;
}

/// Derives shape/type metadata for intermediate tensors.
pub trait ShapeInference {
    fn name(&self) -> &'static str;

    /// Returns one descriptor per intermediate tensor whose shape could be
    /// derived, in node order. Tensors it cannot infer are simply absent.
    fn infer(&self, graph: &Graph) -> Result<Vec<TensorInfo>>;
}
