//! Tests for the binary serialization protocol: round trips, the
//! magic/legacy dual formats and zero-copy view parsing.

use deepx_core::io::{
    parse_from_bytes, parse_view_from_bytes, serialize_to_vec, Deserialize, InputStringStream,
    OutputStringStream, Serialize, StreamState, SERIALIZATION_MAGIC,
};
use deepx_core::tensor::{
    Initializer, Shape, SparseRowMatrix, SparseRowMatrixView, Tensor, TensorView,
};
use hashbrown::{HashMap, HashSet};

fn roundtrip<T: Serialize + Deserialize + Default + PartialEq + std::fmt::Debug>(value: &T) {
    let bytes = serialize_to_vec(value).unwrap();
    let mut parsed = T::default();
    assert!(parse_from_bytes(&bytes, &mut parsed));
    assert_eq!(*value, parsed);
}

// ============================================================================
// scalars, strings, containers
// ============================================================================

#[test]
fn test_scalar_roundtrip() {
    roundtrip(&42i32);
    roundtrip(&-7i64);
    roundtrip(&0xdead_beef_dead_beefu64);
    roundtrip(&1.5f32);
    roundtrip(&-2.25f64);
    roundtrip(&255u8);
}

#[test]
fn test_scalar_wire_is_little_endian() {
    let bytes = serialize_to_vec(&0x01020304i32).unwrap();
    assert_eq!(bytes, vec![0x04, 0x03, 0x02, 0x01]);
}

#[test]
fn test_string_roundtrip() {
    roundtrip(&String::from("hello"));
    roundtrip(&String::new());

    // i32 length prefix then raw bytes
    let bytes = serialize_to_vec(&String::from("ab")).unwrap();
    assert_eq!(bytes, vec![2, 0, 0, 0, b'a', b'b']);
}

#[test]
fn test_vec_roundtrip() {
    roundtrip(&vec![1.0f32, 2.0, 3.0]);
    roundtrip(&Vec::<f64>::new());
    roundtrip(&vec![String::from("a"), String::from("bc")]);
}

#[test]
fn test_pair_roundtrip() {
    let bytes = serialize_to_vec(&(7u64, 0.5f32)).unwrap();
    let mut parsed = (0u64, 0.0f32);
    assert!(parse_from_bytes(&bytes, &mut parsed));
    assert_eq!(parsed, (7, 0.5));
}

#[test]
fn test_map_roundtrip() {
    let mut map = HashMap::<u64, f32>::new();
    map.insert(1, 0.5);
    map.insert(9, -2.0);
    roundtrip(&map);

    let mut set = HashSet::<i64>::new();
    set.insert(3);
    set.insert(-4);
    roundtrip(&set);
}

#[test]
fn test_map_accepts_legacy_layout() {
    // legacy layout: i32 count then entries, no magic
    let mut os = OutputStringStream::new();
    2i32.write_to(&mut os);
    1u64.write_to(&mut os);
    10.0f32.write_to(&mut os);
    2u64.write_to(&mut os);
    20.0f32.write_to(&mut os);

    let mut parsed = HashMap::<u64, f32>::new();
    assert!(parse_from_bytes(os.as_bytes(), &mut parsed));
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[&1], 10.0);
    assert_eq!(parsed[&2], 20.0);

    // the magic layout of the same map parses identically
    let bytes = serialize_to_vec(&parsed).unwrap();
    assert_eq!(bytes[..4], SERIALIZATION_MAGIC.to_le_bytes());
    let mut reparsed = HashMap::<u64, f32>::new();
    assert!(parse_from_bytes(&bytes, &mut reparsed));
    assert_eq!(parsed, reparsed);
}

#[test]
fn test_truncated_input_sets_bad() {
    let bytes = serialize_to_vec(&vec![1.0f32, 2.0, 3.0]).unwrap();
    let mut parsed = Vec::<f32>::new();
    assert!(!parse_from_bytes(&bytes[..bytes.len() - 1], &mut parsed));
}

// ============================================================================
// shape and tensor
// ============================================================================

#[test]
fn test_shape_roundtrip() {
    roundtrip(&Shape::new(&[2, 3, 4]).unwrap());
    roundtrip(&Shape::scalar());
}

#[test]
fn test_tensor_roundtrip() {
    let mut tensor = Tensor::<f32>::from_shape(&[2, 3]).unwrap();
    tensor.set_data(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    roundtrip(&tensor);

    let mut ints = Tensor::<i64>::from_shape(&[4]).unwrap();
    ints.arange();
    roundtrip(&ints);
}

#[test]
fn test_string_tensor_roundtrip() {
    let mut tensor = Tensor::<String>::from_shape(&[2]).unwrap();
    tensor.set_data(&[String::from("alpha"), String::from("beta")]).unwrap();
    roundtrip(&tensor);
}

#[test]
fn test_tensor_view_parse() {
    let mut tensor = Tensor::<f32>::from_shape(&[2, 2]).unwrap();
    tensor.set_data(&[1.0, 2.0, 3.0, 4.0]).unwrap();
    let bytes = serialize_to_vec(&tensor).unwrap();

    let mut view = TensorView::<f32>::default();
    assert!(parse_view_from_bytes(&bytes, &mut view));
    assert_eq!(view, tensor);

    if view.is_borrowed() {
        // the view aliases the serialized buffer
        let data = view.data().as_ptr() as usize;
        let buf = bytes.as_ptr() as usize;
        assert!(data >= buf && data < buf + bytes.len());
    }
}

// ============================================================================
// sparse row matrix
// ============================================================================

fn sample_srm() -> SparseRowMatrix<f32, u64> {
    let mut srm =
        SparseRowMatrix::<f32, u64>::from_rows(&[(7, &[1.0, 2.0]), (3, &[4.0, 5.0])]).unwrap();
    srm.set_initializer(Initializer::Zeros).unwrap();
    srm
}

#[test]
fn test_srm_roundtrip() {
    let srm = sample_srm();
    let bytes = serialize_to_vec(&srm).unwrap();
    assert_eq!(bytes[..4], SERIALIZATION_MAGIC.to_le_bytes());

    let mut parsed = SparseRowMatrix::<f32, u64>::new();
    assert!(parse_from_bytes(&bytes, &mut parsed));
    assert_eq!(srm, parsed);
}

#[test]
fn test_srm_roundtrip_with_initializer() {
    let mut srm = sample_srm();
    srm.set_initializer(Initializer::Randn { mean: 0.5, stddev: 0.25 }).unwrap();
    let bytes = serialize_to_vec(&srm).unwrap();
    let mut parsed = SparseRowMatrix::<f32, u64>::new();
    assert!(parse_from_bytes(&bytes, &mut parsed));
    assert_eq!(parsed.initializer(), Initializer::Randn { mean: 0.5, stddev: 0.25 });
    assert_eq!(srm, parsed);
}

#[test]
fn test_srm_accepts_legacy_layout() {
    // legacy layout: shape, flat values, id -> offset map, initializer
    let mut os = OutputStringStream::new();
    Shape::rank2(0, 2).write_to(&mut os);
    vec![1.0f32, 2.0, 4.0, 5.0].write_to(&mut os);
    let mut offsets = HashMap::<u64, u64>::new();
    offsets.insert(7, 0);
    offsets.insert(3, 2);
    offsets.write_to(&mut os);
    1i32.write_to(&mut os); // zeros initializer
    0.0f32.write_to(&mut os);
    0.0f32.write_to(&mut os);

    let mut parsed = SparseRowMatrix::<f32, u64>::new();
    assert!(parse_from_bytes(os.as_bytes(), &mut parsed));
    assert_eq!(parsed, sample_srm());
}

#[test]
fn test_read_srp_both_layouts() {
    // pre-magic sparse row parameter: col, row map, initializer
    let mut os = OutputStringStream::new();
    2i32.write_to(&mut os);
    let mut rows = HashMap::<u64, Box<[f32]>>::new();
    rows.insert(7, Box::from([1.0f32, 2.0].as_slice()));
    rows.insert(3, Box::from([4.0f32, 5.0].as_slice()));
    rows.write_to(&mut os);
    1i32.write_to(&mut os);
    0.0f32.write_to(&mut os);
    0.0f32.write_to(&mut os);

    let mut parsed = SparseRowMatrix::<f32, u64>::new();
    let mut is = InputStringStream::new(os.as_bytes());
    parsed.read_srp(&mut is);
    assert!(is.is_ok());
    assert_eq!(parsed, sample_srm());

    // the current layout goes through the same entry point
    let bytes = serialize_to_vec(&sample_srm()).unwrap();
    let mut is = InputStringStream::new(&bytes);
    let mut parsed = SparseRowMatrix::<f32, u64>::new();
    parsed.read_srp(&mut is);
    assert!(is.is_ok());
    assert_eq!(parsed, sample_srm());
}

#[test]
fn test_read_svp() {
    // sparse vector parameter: scalar map, initializer
    let mut os = OutputStringStream::new();
    let mut scalars = HashMap::<u64, f32>::new();
    scalars.insert(11, 0.5);
    scalars.insert(12, -0.5);
    scalars.write_to(&mut os);
    0i32.write_to(&mut os);
    0.0f32.write_to(&mut os);
    0.0f32.write_to(&mut os);

    let mut parsed = SparseRowMatrix::<f32, u64>::new();
    let mut is = InputStringStream::new(os.as_bytes());
    parsed.read_svp(&mut is);
    assert!(is.is_ok());
    assert_eq!(parsed.col(), 1);
    assert_eq!(parsed.scalar(11), 0.5);
    assert_eq!(parsed.scalar(12), -0.5);
}

#[test]
fn test_srm_view_parse() {
    let srm = sample_srm();
    let bytes = serialize_to_vec(&srm).unwrap();

    let mut view = SparseRowMatrixView::<f32, u64>::default();
    assert!(parse_view_from_bytes(&bytes, &mut view));
    assert_eq!(view, srm);
    assert_eq!(view.row(7).unwrap(), &[1.0, 2.0]);
}

#[test]
fn test_srm_view_rejects_legacy_layout() {
    let mut os = OutputStringStream::new();
    Shape::rank2(0, 1).write_to(&mut os);
    vec![1.0f32].write_to(&mut os);
    let mut offsets = HashMap::<u64, u64>::new();
    offsets.insert(1, 0);
    offsets.write_to(&mut os);
    0i32.write_to(&mut os);
    0.0f32.write_to(&mut os);
    0.0f32.write_to(&mut os);

    let mut view = SparseRowMatrixView::<f32, u64>::default();
    assert!(!parse_view_from_bytes(os.as_bytes(), &mut view));
}

#[test]
fn test_f64_srm_roundtrip() {
    let mut srm = SparseRowMatrix::<f64, u32>::from_rows(&[(5, &[0.25, -0.75])]).unwrap();
    srm.set_initializer(Initializer::Constant(1.5)).unwrap();
    let bytes = serialize_to_vec(&srm).unwrap();
    let mut parsed = SparseRowMatrix::<f64, u32>::new();
    assert!(parse_from_bytes(&bytes, &mut parsed));
    assert_eq!(srm, parsed);
}

// ============================================================================
// framed messages
// ============================================================================

#[test]
fn test_begin_end_message() {
    let mut os = OutputStringStream::new();
    os.begin_message();
    7u64.write_to(&mut os);
    os.end_message();

    let bytes = os.as_bytes();
    let frame = i32::from_le_bytes(bytes[..4].try_into().unwrap());
    assert_eq!(frame as usize, bytes.len());
    assert_eq!(bytes.len(), 12);
}
