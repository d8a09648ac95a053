use std::fmt;

use onnxscope_core::{Graph, TensorInfo};
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeEntry {
    Extent(i64),
    Dynamic,
}

impl fmt::Display for ShapeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeEntry::Extent(v) => write!(f, "{v}"),
            ShapeEntry::Dynamic => f.write_str("dynamic"),
        }
    }
}

/// Decoded shape, one entry per declared dimension.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShapeSummary(pub SmallVec<[ShapeEntry; 6]>);

impl ShapeSummary {
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn is_static(&self) -> bool {
        self.0.iter().all(|e| matches!(e, ShapeEntry::Extent(_)))
    }
}

impl fmt::Display for ShapeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, entry) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{entry}")?;
        }
        f.write_str("]")
    }
}

/// Result of resolving a tensor name against the graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShapeLookup {
    Known(ShapeSummary),
    Unknown,
}

impl fmt::Display for ShapeLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeLookup::Known(shape) => write!(f, "{shape}"),
            ShapeLookup::Unknown => f.write_str("unknown"),
        }
    }
}

/// Positive extents are kept; zero, negative, symbolic and unset dims
/// become `dynamic`.
pub fn decode_shape(tensor: &TensorInfo) -> ShapeSummary {
    ShapeSummary(
        tensor
            .dims
            .iter()
            .map(|d| d.extent().map_or(ShapeEntry::Dynamic, ShapeEntry::Extent))
            .collect(),
    )
}

/// Searches graph inputs, outputs and value-info, in that order.
pub fn find_shape(name: &str, graph: &Graph) -> ShapeLookup {
    match graph.lookup(name) {
        Some(tensor) => ShapeLookup::Known(decode_shape(tensor)),
        None => ShapeLookup::Unknown,
    }
}
