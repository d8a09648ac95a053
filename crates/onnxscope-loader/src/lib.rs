mod convert;

use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use bytes::Bytes;
use onnxscope_core::{Graph, ModelLoader, ModelLocation};
use onnxscope_proto::onnx::ModelProto;
use prost::Message;
use tracing::info;

pub use convert::{graph_from_proto, node_from_proto, tensor_info_from_value_info};

/// Reads `.onnx` protobuf files into [`Graph`]s.
pub struct OnnxLoader;

impl OnnxLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load_from_bytes(&self, bytes: Bytes) -> Result<Graph> {
        let model = decode_model(bytes)?;
        graph_of(&model)
    }
}

impl Default for OnnxLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelLoader for OnnxLoader {
    fn name(&self) -> &'static str {
        "onnx-protobuf"
    }

    fn load(&self, location: &ModelLocation) -> Result<Graph> {
        let ModelLocation::LocalPath(path) = location else {
            bail!("cannot load {location}: fetching remote models is not supported, download it first");
        };

        info!(path = %path.display(), "loading model from local file system");
        let model = read_model(path)?;
        graph_of(&model)
    }
}

/// Reads and decodes a model file without converting it.
pub fn read_model(path: &Path) -> Result<ModelProto> {
    let bytes = read_bytes(path)?;
    decode_model(bytes).with_context(|| format!("failed to parse {}", path.display()))
}

/// Like [`read_model`], for models that will be written back: fails if the
/// file carries fields outside this schema, which re-encoding would drop.
pub fn read_model_lossless(path: &Path) -> Result<ModelProto> {
    let bytes = read_bytes(path)?;
    decode_model_lossless(bytes).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn decode_model(bytes: Bytes) -> Result<ModelProto> {
    ModelProto::decode(bytes).context("malformed ONNX protobuf")
}

pub fn decode_model_lossless(bytes: Bytes) -> Result<ModelProto> {
    let read = bytes.len();
    let model = decode_model(bytes)?;
    let written = model.encoded_len();
    ensure!(
        written == read,
        "model uses ONNX fields that would be lost on rewrite ({read} bytes read, {written} would be written)"
    );
    Ok(model)
}

fn read_bytes(path: &Path) -> Result<Bytes> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read model file {}", path.display()))?;
    Ok(Bytes::from(bytes))
}

pub fn write_model(path: &Path, model: &ModelProto) -> Result<()> {
    std::fs::write(path, model.encode_to_vec())
        .with_context(|| format!("failed to write model file {}", path.display()))
}

fn graph_of(model: &ModelProto) -> Result<Graph> {
    let graph = model.graph.as_ref().context("model has no graph")?;
    let graph = graph_from_proto(graph);

    info!(
        graph = %graph.name,
        nodes = graph.nodes.len(),
        inputs = graph.inputs.len(),
        outputs = graph.outputs.len(),
        value_info = graph.value_info.len(),
        "model loaded"
    );
    Ok(graph)
}
