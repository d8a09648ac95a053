use std::fmt;

use anyhow::Result;
use onnxscope_core::{element_type_name, Graph, Node, ShapeInference, TensorInfo};
use tracing::{debug, info};

use crate::{compute_receptive_field, decode_shape, find_shape, ReceptiveField, ShapeSummary};

/// `<name>: <op> (<input shapes>) -> (<output shapes>)`
///
/// Ops outside the default ONNX domain render as `<domain>:<op>`.
pub fn summarize_node(node: &Node, graph: &Graph) -> String {
    let shapes = |names: &[String]| {
        names
            .iter()
            .map(|name| find_shape(name, graph).to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let op = match node.domain.as_str() {
        "" | "ai.onnx" => node.op.to_string(),
        domain => format!("{domain}:{}", node.op),
    };

    format!(
        "{}: {} ({}) -> ({})",
        node.name,
        op,
        shapes(&node.inputs),
        shapes(&node.outputs)
    )
}

/// Runs `inference` if the graph carries no value-info at all. Returns
/// whether it ran; a graph that already has value-info is left untouched.
pub fn ensure_shapes_inferred(graph: &mut Graph, inference: &dyn ShapeInference) -> Result<bool> {
    if !graph.value_info.is_empty() {
        debug!(
            value_info = graph.value_info.len(),
            "value-info present, skipping shape inference"
        );
        return Ok(false);
    }

    let inferred = inference.infer(graph)?;
    info!(
        pass = inference.name(),
        inferred = inferred.len(),
        "shape inference complete"
    );
    graph.value_info.extend(inferred);
    Ok(true)
}

/// One `Input`/`Output` listing entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TensorLine {
    pub name: String,
    pub shape: ShapeSummary,
    pub type_name: &'static str,
}

impl TensorLine {
    fn of(tensor: &TensorInfo) -> Self {
        Self {
            name: tensor.name.clone(),
            shape: decode_shape(tensor),
            type_name: element_type_name(tensor.elem_type),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub nodes: Vec<String>,
    pub inputs: Vec<TensorLine>,
    pub outputs: Vec<TensorLine>,
    pub receptive_field: ReceptiveField,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.nodes {
            writeln!(f, "{line}")?;
        }
        for t in &self.inputs {
            writeln!(f, "Input: {}, Shape: {}, Type: {}", t.name, t.shape, t.type_name)?;
        }
        for t in &self.outputs {
            writeln!(f, "Output: {}, Shape: {}, Type: {}", t.name, t.shape, t.type_name)?;
        }
        writeln!(f, "Receptive field (z, y, x): {}", self.receptive_field)
    }
}

/// Fills in missing value-info once, then summarizes nodes, graph inputs
/// and outputs, and the receptive-field estimate.
pub fn check_model(graph: &mut Graph, inference: &dyn ShapeInference) -> Result<Report> {
    ensure_shapes_inferred(graph, inference)?;
    let graph = &*graph;

    Ok(Report {
        nodes: graph
            .nodes
            .iter()
            .map(|node| summarize_node(node, graph))
            .collect(),
        inputs: graph.inputs.iter().map(TensorLine::of).collect(),
        outputs: graph.outputs.iter().map(TensorLine::of).collect(),
        receptive_field: compute_receptive_field(graph),
    })
}
