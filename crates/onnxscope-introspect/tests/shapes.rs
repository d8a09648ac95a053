use onnxscope_core::{Dim, ElementType, Graph, TensorInfo};
use onnxscope_introspect::{decode_shape, find_shape, ShapeEntry, ShapeLookup};

#[test]
fn static_shapes_decode_unchanged() {
    let t = TensorInfo::new("x", ElementType::Float, &[1, 3, 64, 64, 64]);
    let shape = decode_shape(&t);
    assert!(shape.is_static());
    assert_eq!(shape.to_string(), "[1, 3, 64, 64, 64]");
}

#[test]
fn only_non_positive_and_symbolic_entries_become_dynamic() {
    let t = TensorInfo::with_dims(
        "x",
        ElementType::Float,
        vec![
            Dim::Fixed(0),
            Dim::Fixed(3),
            Dim::Fixed(-1),
            Dim::from("H"),
            Dim::Unset,
            Dim::Fixed(7),
        ],
    );
    let shape = decode_shape(&t);
    assert_eq!(shape.rank(), 6);
    assert_eq!(
        shape.0.as_slice(),
        &[
            ShapeEntry::Dynamic,
            ShapeEntry::Extent(3),
            ShapeEntry::Dynamic,
            ShapeEntry::Dynamic,
            ShapeEntry::Dynamic,
            ShapeEntry::Extent(7),
        ]
    );
    assert_eq!(shape.to_string(), "[dynamic, 3, dynamic, dynamic, dynamic, 7]");
}

#[test]
fn lookup_prefers_inputs_then_outputs_then_value_info() {
    let graph = Graph {
        inputs: vec![TensorInfo::new("t", ElementType::Float, &[1])],
        outputs: vec![
            TensorInfo::new("t", ElementType::Float, &[2]),
            TensorInfo::new("o", ElementType::Float, &[3]),
        ],
        value_info: vec![
            TensorInfo::new("t", ElementType::Float, &[4]),
            TensorInfo::new("o", ElementType::Float, &[5]),
            TensorInfo::new("v", ElementType::Float, &[6]),
        ],
        ..Default::default()
    };

    assert_eq!(find_shape("t", &graph).to_string(), "[1]");
    assert_eq!(find_shape("o", &graph).to_string(), "[3]");
    assert_eq!(find_shape("v", &graph).to_string(), "[6]");
}

#[test]
fn unresolvable_names_are_unknown() {
    let graph = Graph {
        initializers: vec![TensorInfo::new("w", ElementType::Float, &[8, 3, 3, 3, 3])],
        ..Default::default()
    };
    assert_eq!(find_shape("missing", &graph), ShapeLookup::Unknown);
    // initializers are not part of the lookup
    assert_eq!(find_shape("w", &graph).to_string(), "unknown");
}
