use std::fmt;

use anyhow::{ensure, Context, Result};
use onnxscope_loader::tensor_info_from_value_info;
use onnxscope_proto::onnx::{
    tensor_shape_proto::{dimension, Dimension},
    type_proto, ModelProto, ValueInfoProto,
};
use tracing::info;

use crate::{decode_shape, ShapeSummary};

/// Symbolic names given to the trailing (depth, height, width) dims.
pub const INPUT_SPATIAL_PARAMS: [&str; 3] = ["D", "H", "W"];
pub const OUTPUT_SPATIAL_PARAMS: [&str; 3] = ["D_out", "H_out", "W_out"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynamicUpdate {
    pub name: String,
    pub shape: ShapeSummary,
}

impl fmt::Display for DynamicUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Updated {} to shape {}", self.name, self.shape)
    }
}

/// Replaces the last three dims of every graph input and output with
/// symbolic parameters so the model accepts any volume size. Every input
/// and output must be a tensor of rank 3 or more.
pub fn make_spatial_dims_dynamic(model: &mut ModelProto) -> Result<Vec<DynamicUpdate>> {
    let graph = model.graph.as_mut().context("model has no graph")?;

    let mut updates = Vec::with_capacity(graph.input.len() + graph.output.len());
    for value in &mut graph.input {
        updates.push(mark_spatial(value, INPUT_SPATIAL_PARAMS)?);
    }
    for value in &mut graph.output {
        updates.push(mark_spatial(value, OUTPUT_SPATIAL_PARAMS)?);
    }
    Ok(updates)
}

fn mark_spatial(value: &mut ValueInfoProto, params: [&str; 3]) -> Result<DynamicUpdate> {
    let name = value.name.clone().unwrap_or_default();
    let dims = tensor_dims_mut(value)
        .with_context(|| format!("{name} has no declared tensor shape"))?;
    ensure!(
        dims.len() >= 3,
        "{name} has rank {}, expected at least 3 spatial dims",
        dims.len()
    );

    let first = dims.len() - 3;
    for (dim, param) in dims[first..].iter_mut().zip(params) {
        dim.value = Some(dimension::Value::DimParam(param.to_string()));
    }

    let shape = decode_shape(&tensor_info_from_value_info(value));
    info!(tensor = %name, %shape, "spatial dims marked dynamic");
    Ok(DynamicUpdate { name, shape })
}

fn tensor_dims_mut(value: &mut ValueInfoProto) -> Option<&mut Vec<Dimension>> {
    match value.r#type.as_mut()?.value.as_mut()? {
        type_proto::Value::TensorType(t) | type_proto::Value::SparseTensorType(t) => {
            Some(&mut t.shape.as_mut()?.dim)
        }
    }
}
