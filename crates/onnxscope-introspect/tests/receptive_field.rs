use onnxscope_core::{AttributeValue, Graph, Node};
use onnxscope_introspect::{compute_receptive_field, ReceptiveField};

fn conv(name: &str, kernel: &[i64]) -> Node {
    Node::new(name, "Conv", &["in"], &["out"])
        .with_attribute("kernel_shape", AttributeValue::Ints(kernel.to_vec()))
}

fn graph(nodes: Vec<Node>) -> Graph {
    Graph {
        nodes,
        ..Default::default()
    }
}

#[test]
fn no_conv_or_pool_nodes_gives_unit_field() {
    let g = graph(vec![
        Node::new("r", "Relu", &["a"], &["b"]),
        Node::new("p", "AveragePool", &["b"], &["c"])
            .with_attribute("kernel_shape", AttributeValue::Ints(vec![5, 5, 5])),
    ]);
    assert_eq!(compute_receptive_field(&g), ReceptiveField::UNIT);
    assert_eq!(compute_receptive_field(&Graph::default()).as_tuple(), (1, 1, 1));
}

#[test]
fn kernels_accumulate_per_axis() {
    assert_eq!(compute_receptive_field(&graph(vec![conv("c0", &[3, 3, 3])])).as_tuple(), (3, 3, 3));
    assert_eq!(
        compute_receptive_field(&graph(vec![conv("c0", &[3, 3, 3]), conv("c1", &[3, 3, 3])]))
            .as_tuple(),
        (5, 5, 5)
    );

    let pool = Node::new("pool", "MaxPool", &["a"], &["b"])
        .with_attribute("kernel_shape", AttributeValue::Ints(vec![1, 2, 2]));
    let field = compute_receptive_field(&graph(vec![conv("c0", &[1, 5, 7]), pool]));
    assert_eq!(field, ReceptiveField::new(1, 6, 8));
    assert_eq!(field.to_string(), "(1, 6, 8)");
}

#[test]
fn two_dimensional_and_malformed_kernels_are_skipped() {
    let g = graph(vec![
        conv("c0", &[3, 3, 3]),
        conv("c2d", &[3, 3]),
        Node::new("nokernel", "Conv", &["a"], &["b"]),
        Node::new("scalar", "Conv", &["a"], &["b"])
            .with_attribute("kernel_shape", AttributeValue::Int(3)),
    ]);
    assert_eq!(compute_receptive_field(&g).as_tuple(), (3, 3, 3));
}

#[test]
fn non_positive_kernels_are_skipped() {
    let g = graph(vec![
        conv("c0", &[3, 3, 3]),
        conv("zero", &[0, 0, 0]),
        conv("negative", &[-1, 3, 3]),
        conv("min", &[i64::MIN, 3, 3]),
    ]);
    assert_eq!(compute_receptive_field(&g).as_tuple(), (3, 3, 3));
}

#[test]
fn huge_kernels_saturate() {
    let g = graph(vec![
        conv("big", &[i64::MAX, 3, 3]),
        conv("bigger", &[i64::MAX, 3, 3]),
    ]);
    assert_eq!(compute_receptive_field(&g).as_tuple(), (i64::MAX, 5, 5));
}
