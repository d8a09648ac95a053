use std::collections::HashMap;

use anyhow::Result;
use onnxscope_core::{Dim, ElementType, Graph, Node, OpKind, ShapeInference, TensorInfo};
use tracing::{debug, warn};

/// Best-effort shape propagation over the common vision operators.
///
/// Nodes are visited in declared order. A node whose inputs have no known
/// shape, or whose op type has no rule here, contributes nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultShapeInference;

impl DefaultShapeInference {
    pub fn new() -> Self {
        Self
    }
}

impl ShapeInference for DefaultShapeInference {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn infer(&self, graph: &Graph) -> Result<Vec<TensorInfo>> {
        let mut known: HashMap<String, TensorInfo> = HashMap::new();
        for t in &graph.initializers {
            known.insert(t.name.clone(), t.clone());
        }
        // Declared tensors without dims carry no usable shape. Inputs go last
        // so they win over same-named entries.
        for t in graph
            .value_info
            .iter()
            .chain(&graph.outputs)
            .chain(&graph.inputs)
        {
            if !t.dims.is_empty() {
                known.insert(t.name.clone(), t.clone());
            }
        }

        let mut inferred = Vec::new();
        let mut skipped = 0usize;
        for node in &graph.nodes {
            let Some(outputs) = infer_node(node, &known) else {
                skipped += 1;
                debug!(node = %node.name, op = %node.op, "no shape derived");
                continue;
            };

            for (name, out) in node.outputs.iter().zip(outputs) {
                if name.is_empty() || known.contains_key(name) {
                    continue;
                }
                let info = TensorInfo {
                    name: name.clone(),
                    elem_type: out.elem_type,
                    dims: out.dims,
                };
                if graph.lookup(name).is_none() {
                    inferred.push(info.clone());
                }
                known.insert(name.clone(), info);
            }
        }

        debug!(inferred = inferred.len(), skipped, "shape propagation finished");
        Ok(inferred)
    }
}

struct Inferred {
    elem_type: i32,
    dims: Vec<Dim>,
}

impl Inferred {
    fn new(elem_type: i32, dims: Vec<Dim>) -> Self {
        Self { elem_type, dims }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AutoPad {
    NotSet,
    Valid,
    Same,
}

impl AutoPad {
    fn of(node: &Node) -> Self {
        match node.string("auto_pad") {
            Some("VALID") => AutoPad::Valid,
            Some("SAME_UPPER") | Some("SAME_LOWER") => AutoPad::Same,
            _ => AutoPad::NotSet,
        }
    }
}

/// Per-axis window parameters shared by convolution and pooling.
struct Window {
    kernel: Vec<Option<i64>>,
    strides: Vec<i64>,
    dilations: Vec<i64>,
    pads: Vec<(i64, i64)>,
    auto_pad: AutoPad,
    ceil_mode: bool,
}

impl Window {
    fn of(node: &Node, spatial: usize, weights: Option<&TensorInfo>) -> Option<Self> {
        let kernel = match (node.ints("kernel_shape"), weights) {
            (Some(k), _) if k.len() == spatial => k.iter().map(|v| Some(*v)).collect(),
            (None, Some(w)) if w.rank() == spatial + 2 => {
                w.dims[2..].iter().map(Dim::extent).collect()
            }
            _ => vec![None; spatial],
        };

        let per_axis = |name: &str| -> Option<Vec<i64>> {
            match node.ints(name) {
                Some(v) if v.len() == spatial => Some(v.to_vec()),
                Some(_) => None,
                None => Some(vec![1; spatial]),
            }
        };
        let strides = per_axis("strides")?;
        let dilations = per_axis("dilations")?;
        if strides.iter().chain(&dilations).any(|v| *v <= 0) {
            return None;
        }

        let pads = match node.ints("pads") {
            Some(p) if p.len() == 2 * spatial => (0..spatial).map(|i| (p[i], p[i + spatial])).collect(),
            Some(_) => return None,
            None => vec![(0, 0); spatial],
        };

        Some(Self {
            kernel,
            strides,
            dilations,
            pads,
            auto_pad: AutoPad::of(node),
            ceil_mode: node.int("ceil_mode").unwrap_or(0) != 0,
        })
    }

    fn output_dim(&self, axis: usize, input: &Dim) -> Dim {
        input
            .extent()
            .and_then(|input| self.output_extent(axis, input))
            .map_or(Dim::Unset, Dim::Fixed)
    }

    fn transposed_output_dim(&self, axis: usize, input: &Dim, output_padding: i64) -> Dim {
        input
            .extent()
            .and_then(|input| self.transposed_output_extent(axis, input, output_padding))
            .map_or(Dim::Unset, Dim::Fixed)
    }

    fn padding(&self, axis: usize) -> (i64, i64) {
        match self.auto_pad {
            AutoPad::Valid => (0, 0),
            _ => self.pads[axis],
        }
    }

    /// Extent covered by one dilated kernel window; `None` for non-positive
    /// kernels.
    fn effective_kernel(&self, axis: usize) -> Option<i64> {
        let k = self.kernel[axis].filter(|k| *k >= 1)?;
        self.dilations[axis].checked_mul(k - 1)?.checked_add(1)
    }

    fn output_extent(&self, axis: usize, input: i64) -> Option<i64> {
        let stride = self.strides[axis];
        if self.auto_pad == AutoPad::Same {
            return div_ceil(input, stride);
        }

        let (begin, end) = self.padding(axis);
        let span = input
            .checked_add(begin)?
            .checked_add(end)?
            .checked_sub(self.effective_kernel(axis)?)?;
        if span < 0 {
            return None;
        }

        let windows = if self.ceil_mode {
            div_ceil(span, stride)?
        } else {
            span / stride
        };
        let mut out = windows.checked_add(1)?;
        // the last window has to start inside the (begin-padded) input
        if self.ceil_mode && (out - 1).checked_mul(stride)? >= input.checked_add(begin)? {
            out -= 1;
        }
        Some(out)
    }

    fn transposed_output_extent(&self, axis: usize, input: i64, output_padding: i64) -> Option<i64> {
        let stride = self.strides[axis];
        if self.auto_pad == AutoPad::Same {
            return input.checked_mul(stride);
        }

        let (begin, end) = self.padding(axis);
        stride
            .checked_mul(input - 1)?
            .checked_add(output_padding)?
            .checked_add(self.effective_kernel(axis)?)?
            .checked_sub(begin)?
            .checked_sub(end)
            .filter(|out| *out > 0)
    }
}

/// Ceiling division for `a >= 0`, `b > 0`.
fn div_ceil(a: i64, b: i64) -> Option<i64> {
    Some(a.checked_add(b - 1)? / b)
}

/// Sum or product of positive extents; `Unset` when any is unknown or the
/// result overflows.
fn fold_extents(dims: &[Dim], init: i64, op: fn(i64, i64) -> Option<i64>) -> Dim {
    dims.iter()
        .try_fold(init, |acc, d| op(acc, d.extent()?))
        .map_or(Dim::Unset, Dim::Fixed)
}

fn known_input<'k>(
    node: &Node,
    idx: usize,
    known: &'k HashMap<String, TensorInfo>,
) -> Option<&'k TensorInfo> {
    known.get(node.input(idx)?)
}

fn infer_node(node: &Node, known: &HashMap<String, TensorInfo>) -> Option<Vec<Inferred>> {
    let input = |idx: usize| known_input(node, idx, known);

    let outputs = match &node.op {
        op if op.is_unary_elementwise() => {
            let x = input(0)?;
            let elem_type = if op.yields_bool() {
                ElementType::Bool.tag()
            } else {
                x.elem_type
            };
            let mut out = vec![Inferred::new(elem_type, x.dims.clone())];
            if *op == OpKind::Dropout {
                out.push(Inferred::new(ElementType::Bool.tag(), x.dims.clone()));
            }
            out
        }
        op if op.is_broadcast_binary() => {
            let (a, b) = (input(0)?, input(1)?);
            let dims = broadcast_or_warn(node, &a.dims, &b.dims)?;
            let elem_type = if op.yields_bool() {
                ElementType::Bool.tag()
            } else {
                a.elem_type
            };
            vec![Inferred::new(elem_type, dims)]
        }
        OpKind::Where => {
            let (cond, a, b) = (input(0)?, input(1)?, input(2)?);
            let dims = broadcast_or_warn(node, &cond.dims, &a.dims)?;
            let dims = broadcast_or_warn(node, &dims, &b.dims)?;
            vec![Inferred::new(a.elem_type, dims)]
        }
        OpKind::Cast => {
            let x = input(0)?;
            let to = i32::try_from(node.int("to")?).ok()?;
            vec![Inferred::new(to, x.dims.clone())]
        }
        OpKind::Conv => {
            let x = input(0)?;
            let spatial = x.rank().checked_sub(2).filter(|s| *s > 0)?;
            let w = input(1);
            let window = Window::of(node, spatial, w)?;

            let channels = w
                .and_then(|w| w.dims.first().cloned())
                .unwrap_or(Dim::Unset);
            let mut dims = vec![x.dims[0].clone(), channels];
            dims.extend((0..spatial).map(|i| window.output_dim(i, &x.dims[i + 2])));
            vec![Inferred::new(x.elem_type, dims)]
        }
        OpKind::ConvTranspose => {
            let x = input(0)?;
            let spatial = x.rank().checked_sub(2).filter(|s| *s > 0)?;
            let w = input(1);
            let window = Window::of(node, spatial, w)?;

            let group = node.int("group").unwrap_or(1);
            let channels = w
                .and_then(|w| w.dims.get(1))
                .and_then(Dim::extent)
                .and_then(|c| c.checked_mul(group))
                .filter(|c| *c > 0)
                .map_or(Dim::Unset, Dim::Fixed);

            let mut dims = vec![x.dims[0].clone(), channels];
            match node.ints("output_shape") {
                Some(shape) if shape.len() == spatial => {
                    dims.extend(shape.iter().copied().map(Dim::Fixed));
                }
                _ => {
                    let output_padding = node.ints("output_padding").unwrap_or(&[]);
                    dims.extend((0..spatial).map(|i| {
                        let extra = output_padding.get(i).copied().unwrap_or(0);
                        window.transposed_output_dim(i, &x.dims[i + 2], extra)
                    }));
                }
            }
            vec![Inferred::new(x.elem_type, dims)]
        }
        OpKind::MaxPool | OpKind::AveragePool => {
            let x = input(0)?;
            let spatial = x.rank().checked_sub(2).filter(|s| *s > 0)?;
            let window = Window::of(node, spatial, None)?;

            let mut dims = x.dims[..2].to_vec();
            dims.extend((0..spatial).map(|i| window.output_dim(i, &x.dims[i + 2])));
            let indices = Inferred::new(ElementType::Int64.tag(), dims.clone());
            let mut out = vec![Inferred::new(x.elem_type, dims)];
            if node.op == OpKind::MaxPool {
                out.push(indices);
            }
            out
        }
        OpKind::GlobalAveragePool | OpKind::GlobalMaxPool => {
            let x = input(0)?;
            if x.rank() < 3 {
                return None;
            }
            let mut dims = x.dims[..2].to_vec();
            dims.resize(x.rank(), Dim::Fixed(1));
            vec![Inferred::new(x.elem_type, dims)]
        }
        OpKind::Concat => {
            let parts = (0..node.inputs.len())
                .map(input)
                .collect::<Option<Vec<_>>>()?;
            let first = parts.first()?;
            let rank = first.rank();
            if parts.iter().any(|p| p.rank() != rank) {
                return None;
            }
            let axis = normalize_axis(node.int("axis")?, rank, rank.checked_sub(1)?)?;

            let mut dims = first.dims.clone();
            let along_axis: Vec<Dim> = parts.iter().map(|p| p.dims[axis].clone()).collect();
            dims[axis] = fold_extents(&along_axis, 0, i64::checked_add);
            vec![Inferred::new(first.elem_type, dims)]
        }
        OpKind::Flatten => {
            let x = input(0)?;
            let axis = normalize_axis(node.int("axis").unwrap_or(1), x.rank(), x.rank())?;
            let dims = vec![
                fold_extents(&x.dims[..axis], 1, i64::checked_mul),
                fold_extents(&x.dims[axis..], 1, i64::checked_mul),
            ];
            vec![Inferred::new(x.elem_type, dims)]
        }
        OpKind::Shape => {
            let x = input(0)?;
            let rank = x.rank() as i64;
            let clamp = |v: i64| (if v < 0 { v + rank } else { v }).clamp(0, rank);
            let start = clamp(node.int("start").unwrap_or(0));
            let end = clamp(node.int("end").unwrap_or(rank));
            let len = (end - start).max(0);
            vec![Inferred::new(ElementType::Int64.tag(), vec![Dim::Fixed(len)])]
        }
        OpKind::MatMul => {
            let (a, b) = (input(0)?, input(1)?);
            let dims = matmul_dims(&a.dims, &b.dims)?;
            vec![Inferred::new(a.elem_type, dims)]
        }
        OpKind::Gemm => {
            let (a, b) = (input(0)?, input(1)?);
            if a.rank() != 2 || b.rank() != 2 {
                return None;
            }
            let trans_a = node.int("transA").unwrap_or(0) != 0;
            let trans_b = node.int("transB").unwrap_or(0) != 0;
            let m = a.dims[usize::from(trans_a)].clone();
            let n = b.dims[usize::from(!trans_b)].clone();
            vec![Inferred::new(a.elem_type, vec![m, n])]
        }
        _ => return None,
    };

    Some(outputs)
}

/// Negative axes count back from `rank`; the result must lie in `0..=max`.
fn normalize_axis(axis: i64, rank: usize, max: usize) -> Option<usize> {
    let axis = if axis < 0 { axis + rank as i64 } else { axis };
    (0..=max as i64).contains(&axis).then_some(axis as usize)
}

fn broadcast_or_warn(node: &Node, a: &[Dim], b: &[Dim]) -> Option<Vec<Dim>> {
    let dims = broadcast(a, b);
    if dims.is_none() {
        warn!(node = %node.name, op = %node.op, "operand shapes do not broadcast");
    }
    dims
}

/// Numpy-style broadcast. `None` when two fixed extents disagree.
fn broadcast(a: &[Dim], b: &[Dim]) -> Option<Vec<Dim>> {
    let rank = a.len().max(b.len());
    let padded = |dims: &[Dim], i: usize| {
        let offset = rank - dims.len();
        if i < offset {
            Dim::Fixed(1)
        } else {
            dims[i - offset].clone()
        }
    };
    (0..rank)
        .map(|i| broadcast_dim(&padded(a, i), &padded(b, i)))
        .collect()
}

fn broadcast_dim(a: &Dim, b: &Dim) -> Option<Dim> {
    let out = match (a, b) {
        _ if a == b => a,
        (Dim::Fixed(1), _) => b,
        (_, Dim::Fixed(1)) => a,
        (Dim::Fixed(_), Dim::Fixed(_)) => return None,
        (Dim::Fixed(_), _) => a,
        (_, Dim::Fixed(_)) => b,
        _ => return Some(Dim::Unset),
    };
    Some(out.clone())
}

fn matmul_dims(a: &[Dim], b: &[Dim]) -> Option<Vec<Dim>> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let a_vector = a.len() == 1;
    let b_vector = b.len() == 1;
    let a = if a_vector {
        vec![Dim::Fixed(1), a[0].clone()]
    } else {
        a.to_vec()
    };
    let b = if b_vector {
        vec![b[0].clone(), Dim::Fixed(1)]
    } else {
        b.to_vec()
    };

    let (a_batch, a_mat) = a.split_at(a.len() - 2);
    let (b_batch, b_mat) = b.split_at(b.len() - 2);
    let mut dims = broadcast(a_batch, b_batch)?;
    if !a_vector {
        dims.push(a_mat[0].clone());
    }
    if !b_vector {
        dims.push(b_mat[1].clone());
    }
    Some(dims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(dims: &[i64]) -> Vec<Dim> {
        dims.iter().copied().map(Dim::Fixed).collect()
    }

    #[test]
    fn broadcast_aligns_trailing_axes() {
        assert_eq!(
            broadcast(&fixed(&[8, 1, 6, 1]), &fixed(&[7, 1, 5])),
            Some(fixed(&[8, 7, 6, 5]))
        );
        assert_eq!(broadcast(&fixed(&[3]), &fixed(&[4])), None);
        assert_eq!(
            broadcast(&[Dim::from("N"), Dim::Fixed(4)], &fixed(&[1, 4])),
            Some(vec![Dim::from("N"), Dim::Fixed(4)])
        );
    }

    #[test]
    fn matmul_handles_vectors_and_batches() {
        assert_eq!(matmul_dims(&fixed(&[2, 3, 4]), &fixed(&[4, 5])), Some(fixed(&[2, 3, 5])));
        assert_eq!(matmul_dims(&fixed(&[4]), &fixed(&[4, 5])), Some(fixed(&[5])));
        assert_eq!(matmul_dims(&fixed(&[3, 4]), &fixed(&[4])), Some(fixed(&[3])));
    }

    #[test]
    fn negative_axes_wrap() {
        assert_eq!(normalize_axis(-1, 3, 2), Some(2));
        assert_eq!(normalize_axis(-4, 3, 2), None);
        assert_eq!(normalize_axis(3, 3, 3), Some(3));
        assert_eq!(normalize_axis(5, 3, 3), None);
    }
}
