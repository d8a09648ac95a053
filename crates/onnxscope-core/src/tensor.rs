use std::fmt;

/// ONNX `TensorProto.DataType` tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ElementType {
    Undefined = 0,
    Float = 1,
    Uint8 = 2,
    Int8 = 3,
    Uint16 = 4,
    Int16 = 5,
    Int32 = 6,
    Int64 = 7,
    String = 8,
    Bool = 9,
    Float16 = 10,
    Double = 11,
    Uint32 = 12,
    Uint64 = 13,
    Complex64 = 14,
    Complex128 = 15,
    Bfloat16 = 16,
    Float8E4M3Fn = 17,
    Float8E4M3FnUz = 18,
    Float8E5M2 = 19,
    Float8E5M2FnUz = 20,
    Uint4 = 21,
    Int4 = 22,
    Float4E2M1 = 23,
}

impl ElementType {
    pub fn from_tag(tag: i32) -> Option<Self> {
        use ElementType::*;
        let ty = match tag {
            0 => Undefined,
            1 => Float,
            2 => Uint8,
            3 => Int8,
            4 => Uint16,
            5 => Int16,
            6 => Int32,
            7 => Int64,
            8 => String,
            9 => Bool,
            10 => Float16,
            11 => Double,
            12 => Uint32,
            13 => Uint64,
            14 => Complex64,
            15 => Complex128,
            16 => Bfloat16,
            17 => Float8E4M3Fn,
            18 => Float8E4M3FnUz,
            19 => Float8E5M2,
            20 => Float8E5M2FnUz,
            21 => Uint4,
            22 => Int4,
            23 => Float4E2M1,
            _ => return None,
        };
        Some(ty)
    }

    pub fn tag(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        use ElementType::*;
        match self {
            Undefined => "undefined",
            Float => "float32",
            Uint8 => "uint8",
            Int8 => "int8",
            Uint16 => "uint16",
            Int16 => "int16",
            Int32 => "int32",
            Int64 => "int64",
            String => "string",
            Bool => "bool",
            Float16 => "float16",
            Double => "float64",
            Uint32 => "uint32",
            Uint64 => "uint64",
            Complex64 => "complex64",
            Complex128 => "complex128",
            Bfloat16 => "bfloat16",
            Float8E4M3Fn => "float8e4m3fn",
            Float8E4M3FnUz => "float8e4m3fnuz",
            Float8E5M2 => "float8e5m2",
            Float8E5M2FnUz => "float8e5m2fnuz",
            Uint4 => "uint4",
            Int4 => "int4",
            Float4E2M1 => "float4e2m1",
        }
    }
}

/// Display name for a raw element-type tag; tags outside the table render
/// as `unknown`.
pub fn element_type_name(tag: i32) -> &'static str {
    ElementType::from_tag(tag).map_or("unknown", ElementType::name)
}

/// One entry of a declared tensor shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Dim {
    Fixed(i64),
    Symbolic(String),
    Unset,
}

impl Dim {
    /// The extent, if it is a known positive size.
    pub fn extent(&self) -> Option<i64> {
        match self {
            Dim::Fixed(v) if *v > 0 => Some(*v),
            _ => None,
        }
    }
}

impl From<i64> for Dim {
    fn from(v: i64) -> Self {
        Dim::Fixed(v)
    }
}

impl From<&str> for Dim {
    fn from(param: &str) -> Self {
        Dim::Symbolic(param.to_string())
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Fixed(v) => write!(f, "{v}"),
            Dim::Symbolic(p) => f.write_str(p),
            Dim::Unset => f.write_str("?"),
        }
    }
}

/// Name, element type and declared shape of a graph input, output,
/// intermediate value or initializer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TensorInfo {
    pub name: String,
    pub elem_type: i32,
    pub dims: Vec<Dim>,
}

impl TensorInfo {
    /// Descriptor with a fully fixed shape.
    pub fn new(name: impl Into<String>, elem_type: ElementType, dims: &[i64]) -> Self {
        Self::with_dims(name, elem_type, dims.iter().copied().map(Dim::Fixed).collect())
    }

    pub fn with_dims(name: impl Into<String>, elem_type: ElementType, dims: Vec<Dim>) -> Self {
        Self {
            name: name.into(),
            elem_type: elem_type.tag(),
            dims,
        }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }
}
