use std::collections::BTreeMap;
use std::fmt;

use crate::TensorInfo;

macro_rules! op_kinds {
    ($($variant:ident),* $(,)?) => {
        /// Operator type of a node. Types the inspector has no special
        /// handling for keep their original spelling in `Other`.
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        pub enum OpKind {
            $($variant,)*
            Other(String),
        }

        impl OpKind {
            pub fn parse(op_type: &str) -> Self {
                match op_type {
                    $(stringify!($variant) => Self::$variant,)*
                    other => Self::Other(other.to_string()),
                }
            }

            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant),)*
                    Self::Other(op_type) => op_type,
                }
            }
        }
    };
}

op_kinds! {
    Conv,
    ConvTranspose,
    MaxPool,
    AveragePool,
    GlobalAveragePool,
    GlobalMaxPool,
    Concat,
    Flatten,
    Shape,
    MatMul,
    Gemm,
    Cast,
    Where,
    // shape-preserving unary
    Relu,
    LeakyRelu,
    PRelu,
    Elu,
    Selu,
    Sigmoid,
    HardSigmoid,
    Tanh,
    Softmax,
    LogSoftmax,
    Identity,
    Dropout,
    BatchNormalization,
    InstanceNormalization,
    LayerNormalization,
    Clip,
    Abs,
    Neg,
    Exp,
    Log,
    Sqrt,
    Sign,
    Erf,
    Not,
    Floor,
    Ceil,
    Round,
    Reciprocal,
    // broadcasting binary
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Max,
    Min,
    Equal,
    Less,
    Greater,
    And,
    Or,
}

impl OpKind {
    pub fn is_unary_elementwise(&self) -> bool {
        use OpKind::*;
        matches!(
            self,
            Relu | LeakyRelu
                | PRelu
                | Elu
                | Selu
                | Sigmoid
                | HardSigmoid
                | Tanh
                | Softmax
                | LogSoftmax
                | Identity
                | Dropout
                | BatchNormalization
                | InstanceNormalization
                | LayerNormalization
                | Clip
                | Abs
                | Neg
                | Exp
                | Log
                | Sqrt
                | Sign
                | Erf
                | Not
                | Floor
                | Ceil
                | Round
                | Reciprocal
        )
    }

    pub fn is_broadcast_binary(&self) -> bool {
        use OpKind::*;
        matches!(
            self,
            Add | Sub | Mul | Div | Pow | Max | Min | Equal | Less | Greater | And | Or
        )
    }

    /// Comparison and logical ops produce booleans regardless of input type.
    pub fn yields_bool(&self) -> bool {
        use OpKind::*;
        matches!(self, Equal | Less | Greater | And | Or | Not)
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Float(f32),
    Int(i64),
    String(String),
    Tensor(TensorInfo),
    Floats(Vec<f32>),
    Ints(Vec<i64>),
    Strings(Vec<String>),
    /// Graph, sparse-tensor and type attributes; only the kind is kept.
    Other(&'static str),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// May be empty, and is not guaranteed unique.
    pub name: String,
    pub op: OpKind,
    /// Empty for the default ONNX operator set.
    pub domain: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        op_type: &str,
        inputs: &[&str],
        outputs: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            op: OpKind::parse(op_type),
            domain: String::new(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn ints(&self, name: &str) -> Option<&[i64]> {
        match self.attribute(name)? {
            AttributeValue::Ints(v) => Some(v),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.attribute(name)? {
            AttributeValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.attribute(name)? {
            AttributeValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Inputs with an empty name are omitted optional inputs.
    pub fn input(&self, idx: usize) -> Option<&str> {
        self.inputs
            .get(idx)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }
}

/// A parsed computation graph. Nodes keep the order they were declared in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    pub name: String,
    pub nodes: Vec<Node>,
    pub inputs: Vec<TensorInfo>,
    pub outputs: Vec<TensorInfo>,
    pub value_info: Vec<TensorInfo>,
    pub initializers: Vec<TensorInfo>,
}

impl Graph {
    /// Resolves a tensor name against inputs, then outputs, then value-info.
    /// Initializers are not consulted.
    pub fn lookup(&self, name: &str) -> Option<&TensorInfo> {
        self.inputs
            .iter()
            .chain(&self.outputs)
            .chain(&self.value_info)
            .find(|t| t.name == name)
    }

    pub fn initializer(&self, name: &str) -> Option<&TensorInfo> {
        self.initializers.iter().find(|t| t.name == name)
    }
}
