use anyhow::{ensure, Result};
use onnxscope_core::{AttributeValue, ElementType, Graph, Node, ShapeInference, TensorInfo};
use onnxscope_introspect::{
    check_model, ensure_shapes_inferred, summarize_node, DefaultShapeInference, ReceptiveField,
};

fn single_conv_graph() -> Graph {
    Graph {
        name: "unet".to_string(),
        nodes: vec![Node::new("conv0", "Conv", &["x"], &["y"])
            .with_attribute("kernel_shape", AttributeValue::Ints(vec![3, 3, 3]))],
        inputs: vec![TensorInfo::new("x", ElementType::Float, &[1, 3, 64, 64, 64])],
        outputs: vec![TensorInfo::new("y", ElementType::Float, &[1, 8, 62, 62, 62])],
        ..Default::default()
    }
}

/// Records calls and returns a fixed value-info list.
struct Recording {
    calls: std::cell::Cell<usize>,
    produces: Vec<TensorInfo>,
}

impl ShapeInference for Recording {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn infer(&self, _graph: &Graph) -> Result<Vec<TensorInfo>> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.produces.clone())
    }
}

#[test]
fn end_to_end_single_conv_report() -> Result<()> {
    let mut graph = single_conv_graph();
    let report = check_model(&mut graph, &DefaultShapeInference::new())?;
    let text = report.to_string();

    ensure!(
        text.contains("conv0: Conv ([1, 3, 64, 64, 64]) -> ([1, 8, 62, 62, 62])"),
        "missing node line in:\n{text}"
    );
    ensure!(text.contains("Input: x, Shape: [1, 3, 64, 64, 64], Type: float32"));
    ensure!(text.contains("Output: y, Shape: [1, 8, 62, 62, 62], Type: float32"));
    ensure!(text.contains("(3, 3, 3)"));
    assert_eq!(report.receptive_field, ReceptiveField::new(3, 3, 3));

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("conv0: "));
    assert!(lines[1].starts_with("Input: "));
    assert!(lines[2].starts_with("Output: "));
    assert!(lines[3].starts_with("Receptive field"));
    Ok(())
}

#[test]
fn node_lines_follow_declared_order_and_mark_unknowns() -> Result<()> {
    let mut graph = single_conv_graph();
    graph.nodes[0].inputs.push("w".to_string());
    graph.nodes.insert(0, Node::new("", "Custom", &["x"], &["tmp"]));

    // no pass output: "tmp" stays unresolved
    let inference = Recording {
        calls: Default::default(),
        produces: Vec::new(),
    };
    let report = check_model(&mut graph, &inference)?;

    assert_eq!(report.nodes[0], ": Custom ([1, 3, 64, 64, 64]) -> (unknown)");
    assert_eq!(
        report.nodes[1],
        "conv0: Conv ([1, 3, 64, 64, 64], unknown) -> ([1, 8, 62, 62, 62])"
    );
    Ok(())
}

#[test]
fn unknown_element_types_render_as_unknown() -> Result<()> {
    let mut graph = single_conv_graph();
    graph.inputs[0].elem_type = 42;
    let report = check_model(&mut graph, &DefaultShapeInference::new())?;
    assert_eq!(report.inputs[0].type_name, "unknown");
    assert_eq!(report.outputs[0].type_name, "float32");
    Ok(())
}

#[test]
fn inference_runs_only_without_value_info() -> Result<()> {
    let inference = Recording {
        calls: Default::default(),
        produces: vec![TensorInfo::new("tmp", ElementType::Float, &[1, 8])],
    };

    let mut graph = single_conv_graph();
    assert!(ensure_shapes_inferred(&mut graph, &inference)?);
    let enriched = graph.clone();

    assert!(!ensure_shapes_inferred(&mut graph, &inference)?);
    assert_eq!(inference.calls.get(), 1);
    assert_eq!(graph, enriched);
    assert_eq!(graph.value_info.len(), 1);
    Ok(())
}

#[test]
fn summarize_does_not_touch_the_graph() {
    let graph = single_conv_graph();
    let before = graph.clone();
    let line = summarize_node(&graph.nodes[0], &graph);
    assert_eq!(line, "conv0: Conv ([1, 3, 64, 64, 64]) -> ([1, 8, 62, 62, 62])");
    assert_eq!(graph, before);
}

#[test]
fn custom_domains_prefix_the_op() {
    let mut graph = single_conv_graph();
    let mut fused = Node::new("fused", "FusedConv", &["x"], &["y"]);
    fused.domain = "com.microsoft".to_string();
    let mut conv = graph.nodes[0].clone();
    conv.domain = "ai.onnx".to_string();
    graph.nodes = vec![fused, conv];

    assert_eq!(
        summarize_node(&graph.nodes[0], &graph),
        "fused: com.microsoft:FusedConv ([1, 3, 64, 64, 64]) -> ([1, 8, 62, 62, 62])"
    );
    assert_eq!(
        summarize_node(&graph.nodes[1], &graph),
        "conv0: Conv ([1, 3, 64, 64, 64]) -> ([1, 8, 62, 62, 62])"
    );
}
