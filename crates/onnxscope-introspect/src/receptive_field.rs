use std::fmt;

use onnxscope_core::{Graph, OpKind};

/// Receptive-field extent in (depth, height, width).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceptiveField {
    pub z: i64,
    pub y: i64,
    pub x: i64,
}

impl ReceptiveField {
    pub const UNIT: Self = Self { z: 1, y: 1, x: 1 };

    pub fn new(z: i64, y: i64, x: i64) -> Self {
        Self { z, y, x }
    }

    pub fn as_tuple(self) -> (i64, i64, i64) {
        (self.z, self.y, self.x)
    }
}

impl Default for ReceptiveField {
    fn default() -> Self {
        Self::UNIT
    }
}

impl fmt::Display for ReceptiveField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.z, self.y, self.x)
    }
}

/// Estimates the receptive field of a 3D conv/pool stack by summing
/// `kernel - 1` per axis over every `Conv` and `MaxPool` node, in declared
/// node order.
///
/// Stride, dilation and padding are not modelled, and nodes without a
/// 3-element `kernel_shape` of positive extents (2D kernels included) are
/// skipped, so this is a rough additive approximation rather than the exact
/// field. Sums saturate at `i64::MAX`.
pub fn compute_receptive_field(graph: &Graph) -> ReceptiveField {
    let mut field = ReceptiveField::UNIT;

    for node in &graph.nodes {
        match node.op {
            OpKind::Conv | OpKind::MaxPool => {}
            _ => continue,
        }

        let Some(&[kz, ky, kx]) = node.ints("kernel_shape") else {
            continue;
        };
        if [kz, ky, kx].iter().any(|k| *k < 1) {
            continue;
        }
        field.z = field.z.saturating_add(kz - 1);
        field.y = field.y.saturating_add(ky - 1);
        field.x = field.x.saturating_add(kx - 1);
    }

    field
}
