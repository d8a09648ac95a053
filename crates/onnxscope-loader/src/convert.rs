use std::collections::BTreeMap;

use onnxscope_core::{AttributeValue, Dim, Graph, Node, OpKind, TensorInfo};
use onnxscope_proto::onnx::{
    attribute_proto::AttributeType, tensor_shape_proto::dimension, type_proto, AttributeProto,
    GraphProto, NodeProto, TensorProto, ValueInfoProto,
};
use tracing::debug;

pub fn graph_from_proto(graph: &GraphProto) -> Graph {
    Graph {
        name: graph.name.clone().unwrap_or_default(),
        nodes: graph.node.iter().map(node_from_proto).collect(),
        inputs: graph.input.iter().map(tensor_info_from_value_info).collect(),
        outputs: graph.output.iter().map(tensor_info_from_value_info).collect(),
        value_info: graph
            .value_info
            .iter()
            .map(tensor_info_from_value_info)
            .collect(),
        initializers: graph.initializer.iter().map(tensor_info_from_initializer).collect(),
    }
}

pub fn node_from_proto(node: &NodeProto) -> Node {
    let mut attributes = BTreeMap::new();
    for attr in &node.attribute {
        let name = attr.name.clone().unwrap_or_default();
        match attribute_value(attr) {
            Some(value) => {
                attributes.insert(name, value);
            }
            None => debug!(attribute = %name, "skipping attribute without a value"),
        }
    }

    Node {
        name: node.name.clone().unwrap_or_default(),
        op: OpKind::parse(node.op_type.as_deref().unwrap_or_default()),
        domain: node.domain.clone().unwrap_or_default(),
        inputs: node.input.clone(),
        outputs: node.output.clone(),
        attributes,
    }
}

/// Non-tensor types (sequences, maps, optionals) come back with element
/// type 0 and no dims.
pub fn tensor_info_from_value_info(value: &ValueInfoProto) -> TensorInfo {
    let tensor = value.r#type.as_ref().and_then(|ty| match &ty.value {
        Some(type_proto::Value::TensorType(t)) | Some(type_proto::Value::SparseTensorType(t)) => {
            Some(t)
        }
        None => None,
    });

    let elem_type = tensor.and_then(|t| t.elem_type).unwrap_or(0);
    let dims = tensor
        .and_then(|t| t.shape.as_ref())
        .map(|shape| {
            shape
                .dim
                .iter()
                .map(|d| match &d.value {
                    Some(dimension::Value::DimValue(v)) => Dim::Fixed(*v),
                    Some(dimension::Value::DimParam(p)) => Dim::Symbolic(p.clone()),
                    None => Dim::Unset,
                })
                .collect()
        })
        .unwrap_or_default();

    TensorInfo {
        name: value.name.clone().unwrap_or_default(),
        elem_type,
        dims,
    }
}

fn tensor_info_from_initializer(tensor: &TensorProto) -> TensorInfo {
    TensorInfo {
        name: tensor.name.clone().unwrap_or_default(),
        elem_type: tensor.data_type.unwrap_or(0),
        dims: tensor.dims.iter().copied().map(Dim::Fixed).collect(),
    }
}

fn attribute_value(attr: &AttributeProto) -> Option<AttributeValue> {
    let declared = attr
        .r#type
        .and_then(|raw| AttributeType::try_from(raw).ok())
        .unwrap_or(AttributeType::Undefined);

    let kind = match declared {
        AttributeType::Undefined => infer_attribute_type(attr)?,
        other => other,
    };

    let value = match kind {
        AttributeType::Float => AttributeValue::Float(attr.f.unwrap_or_default()),
        AttributeType::Int => AttributeValue::Int(attr.i.unwrap_or_default()),
        AttributeType::String => {
            AttributeValue::String(lossy(attr.s.as_deref().unwrap_or_default()))
        }
        AttributeType::Tensor => {
            AttributeValue::Tensor(tensor_info_from_initializer(attr.t.as_ref()?))
        }
        AttributeType::Floats => AttributeValue::Floats(attr.floats.clone()),
        AttributeType::Ints => AttributeValue::Ints(attr.ints.clone()),
        AttributeType::Strings => {
            AttributeValue::Strings(attr.strings.iter().map(|s| lossy(s)).collect())
        }
        AttributeType::Graph | AttributeType::Graphs => AttributeValue::Other("graph"),
        AttributeType::Tensors => AttributeValue::Other("tensors"),
        AttributeType::SparseTensor | AttributeType::SparseTensors => {
            AttributeValue::Other("sparse_tensor")
        }
        AttributeType::TypeProto | AttributeType::TypeProtos => AttributeValue::Other("type_proto"),
        AttributeType::Undefined => return None,
    };
    Some(value)
}

/// Old exporters leave `type` unset; fall back to whichever field is filled.
fn infer_attribute_type(attr: &AttributeProto) -> Option<AttributeType> {
    let kind = if !attr.ints.is_empty() {
        AttributeType::Ints
    } else if !attr.floats.is_empty() {
        AttributeType::Floats
    } else if !attr.strings.is_empty() {
        AttributeType::Strings
    } else if attr.i.is_some() {
        AttributeType::Int
    } else if attr.f.is_some() {
        AttributeType::Float
    } else if attr.s.is_some() {
        AttributeType::String
    } else if attr.t.is_some() {
        AttributeType::Tensor
    } else if attr.g.is_some() || !attr.graphs.is_empty() {
        AttributeType::Graph
    } else if !attr.tensors.is_empty() {
        AttributeType::Tensors
    } else {
        return None;
    };
    Some(kind)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
