//! Integration tests for the byte/value codec.

use h5attr::codec::{decode, decode_elements, encode, encode_elements, CodecOptions, MemberSelection, Value, WideDecimal};
use h5attr::datatype::{ByteOrder, CompoundMember, Datatype, EnumMember, ReferenceFlavor, StringPad};
use h5attr::Error;

fn opts() -> CodecOptions {
    CodecOptions::default()
}

#[test]
fn test_primitive_round_trips() {
    let cases = vec![
        (Datatype::INT8, Value::Int8(-100)),
        (Datatype::UINT8, Value::UInt8(200)),
        (Datatype::INT16, Value::Int16(-30000)),
        (Datatype::UINT16, Value::UInt16(65000)),
        (Datatype::INT32, Value::Int32(i32::MIN)),
        (Datatype::UINT32, Value::UInt32(u32::MAX)),
        (Datatype::INT64, Value::Int64(-1)),
        (Datatype::UINT64, Value::UInt64(u64::MAX - 7)),
        (Datatype::FLOAT32, Value::Float32(-0.25)),
        (Datatype::FLOAT64, Value::Float64(std::f64::consts::PI)),
        (Datatype::INT32.with_order(ByteOrder::Big), Value::Int32(123456)),
        (Datatype::FLOAT64.with_order(ByteOrder::Big), Value::Float64(1e-9)),
        (Datatype::fixed_string(8), Value::String("hello".into())),
    ];

    for (dtype, value) in cases {
        let bytes = encode(&dtype, &value, &opts()).expect("encode failed");
        assert_eq!(bytes.len(), dtype.size(), "size for {}", dtype);
        assert_eq!(decode(&dtype, &bytes, &opts()), value, "round trip for {}", dtype);
    }
}

fn sensor_type() -> Datatype {
    let position = Datatype::compound(vec![
        CompoundMember::new("x", Datatype::FLOAT32),
        CompoundMember::new("y", Datatype::FLOAT32),
    ]);
    Datatype::compound(vec![
        CompoundMember::new("id", Datatype::UINT16),
        CompoundMember::new("label", Datatype::fixed_string(6)),
        CompoundMember::new("pos", position),
        CompoundMember::new("samples", Datatype::array(Datatype::INT16, &[3])),
        CompoundMember::new("value", Datatype::FLOAT64.with_order(ByteOrder::Big)),
        CompoundMember::new(
            "state",
            Datatype::enumeration(Datatype::UINT8, vec![EnumMember::new("IDLE", 0), EnumMember::new("RUN", 1)]),
        ),
    ])
}

fn sensor_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&513u16.to_le_bytes());
    bytes.extend_from_slice(b"gauge\0");
    bytes.extend_from_slice(&1.5f32.to_le_bytes());
    bytes.extend_from_slice(&(-2.0f32).to_le_bytes());
    for s in [7i16, -8, 9] {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    bytes.extend_from_slice(&0.125f64.to_be_bytes());
    bytes.push(1);
    bytes
}

#[test]
fn test_compound_round_trip_reproduces_bytes() {
    let dtype = sensor_type();
    assert_eq!(dtype.size(), 2 + 6 + 8 + 6 + 8 + 1);
    assert_eq!(dtype.member_offsets(), vec![0, 2, 8, 16, 22, 30]);

    let original = sensor_bytes();
    assert_eq!(original.len(), dtype.size());

    let value = decode(&dtype, &original, &opts());
    println!("decoded: {}", value);
    assert_eq!(value.field("id"), Some(&Value::UInt16(513)));
    assert_eq!(value.field("label"), Some(&Value::String("gauge".into())));
    assert_eq!(value.field("value"), Some(&Value::Float64(0.125)));
    assert_eq!(
        value.field("state"),
        Some(&Value::Enum { value: 1, name: Some("RUN".into()) })
    );

    let bytes = encode(&dtype, &value, &opts()).expect("encode failed");
    assert_eq!(bytes, original);
}

#[test]
fn test_compound_elements_round_trip() {
    let dtype = sensor_type();
    let mut original = sensor_bytes();
    let mut second = sensor_bytes();
    second[0] = 0xff;
    original.extend_from_slice(&second);

    let values = decode_elements(&dtype, &original, 2, &opts());
    assert_eq!(values.len(), 2);
    assert_eq!(values[1].field("id"), Some(&Value::UInt16(0x02ff)));
    let bytes = encode_elements(&dtype, &values, &opts()).expect("encode failed");
    assert_eq!(bytes, original);
}

#[test]
fn test_member_selection_filters_leaves_only() {
    let dtype = sensor_type();
    let sel = opts().with_members(MemberSelection::only(["value", "pos.y"]));
    let value = decode(&dtype, &sensor_bytes(), &sel);

    assert_eq!(value.field("id"), None);
    assert_eq!(value.field("label"), None);
    assert_eq!(value.field("value"), Some(&Value::Float64(0.125)));
    let pos = value.field("pos").expect("nested compound is always kept");
    assert_eq!(pos.field("x"), None);
    assert_eq!(pos.field("y"), Some(&Value::Float32(-2.0)));

    // unselected members stay zero, selected ones land at their own offsets
    let bytes = encode(&dtype, &value, &sel).expect("encode failed");
    let expected_value = 0.125f64.to_be_bytes();
    assert_eq!(&bytes[22..30], &expected_value);
    assert_eq!(&bytes[12..16], &(-2.0f32).to_le_bytes());
    assert!(bytes[..12].iter().all(|&b| b == 0));
}

#[test]
fn test_array_counts() {
    for dims in [vec![4], vec![2, 3], vec![2, 2, 2]] {
        let dtype = Datatype::array(Datatype::INT32, &dims);
        let count: usize = dims.iter().product();
        let raw: Vec<u8> = (0..count as i32).flat_map(|v| v.to_le_bytes()).collect();

        let value = decode(&dtype, &raw, &opts());
        let items = value.elements().expect("array value");
        assert_eq!(items.len(), count);
        assert_eq!(items[count - 1], Value::Int32(count as i32 - 1));

        let bytes = encode(&dtype, &value, &opts()).expect("encode failed");
        assert_eq!(bytes.len(), count * 4);
        assert_eq!(bytes, raw);
    }
}

#[test]
fn test_array_of_compound() {
    let pair = Datatype::compound(vec![
        CompoundMember::new("a", Datatype::UINT8),
        CompoundMember::new("b", Datatype::INT16),
    ]);
    let dtype = Datatype::array(pair, &[2]);
    let raw = vec![1, 2, 0, 3, 4, 0];
    let value = decode(&dtype, &raw, &opts());
    let items = value.elements().expect("array value");
    assert_eq!(items[1].field("b"), Some(&Value::Int16(4)));
    assert_eq!(encode(&dtype, &value, &opts()).expect("encode failed"), raw);
}

#[test]
fn test_wide_decimal_never_encodes() {
    let wide = WideDecimal::from_f64(2.5);
    let raw = wide.to_le_bytes();
    let value = decode(&Datatype::FLOAT128, &raw, &opts());
    assert_eq!(value, Value::WideDecimal(wide));
    assert_eq!(value.to_string(), "2.5");

    for v in [value.clone(), Value::Float64(2.5), Value::Int32(0)] {
        let err = encode(&Datatype::FLOAT128, &v, &opts()).expect_err("wide float write must fail");
        assert!(matches!(err, Error::Unsupported(_)), "got {:?}", err);
    }

    let nested = Datatype::compound(vec![
        CompoundMember::new("ok", Datatype::UINT8),
        CompoundMember::new("wide", Datatype::FLOAT128),
    ]);
    let mut bytes = vec![1u8];
    bytes.extend_from_slice(&raw);
    let value = decode(&nested, &bytes, &opts());
    assert!(encode(&nested, &value, &opts()).expect_err("must fail").is_unsupported());
}

#[test]
fn test_unknown_classes_are_per_element_sentinels() {
    let dtype = Datatype::array(Datatype::integer(3, false), &[2]);
    let value = decode(&dtype, &[0u8; 6], &opts());
    let items = value.elements().expect("array value");
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(Value::is_error));

    let mixed = Datatype::compound(vec![
        CompoundMember::new("t", Datatype::time(8)),
        CompoundMember::new("n", Datatype::INT8),
        CompoundMember::new("none", Datatype::no_class()),
    ]);
    let mut raw = vec![0u8; 8];
    raw.push(0x7f);
    let value = decode(&mixed, &raw, &opts());
    assert!(value.field("t").is_some_and(Value::is_error));
    assert_eq!(value.field("n"), Some(&Value::Int8(127)));
    assert!(value.field("none").is_some_and(Value::is_error));
}

#[test]
fn test_reference_decoding() {
    let obj = Datatype::reference(ReferenceFlavor::Object);
    assert_eq!(decode(&obj, &77u64.to_le_bytes(), &opts()), Value::Reference(77));

    let std_ref = Datatype::reference(ReferenceFlavor::Standard);
    let value = decode(&std_ref, &[3u8; 64], &opts());
    match value {
        Value::Token(token) => {
            assert_eq!(token.len(), 64);
            assert!(!token.is_null());
        }
        other => panic!("expected token, got {:?}", other),
    }
}

#[test]
fn test_text_without_conversion() {
    let raw = CodecOptions { convert_byte_to_string: false, ..opts() };
    let dtype = Datatype::fixed_string(4);
    let value = decode(&dtype, b"ab\0\0", &raw);
    assert_eq!(value, Value::Bytes(b"ab\0\0".to_vec()));
    assert_eq!(encode(&dtype, &value, &raw).expect("encode failed"), b"ab\0\0");
}

#[test]
fn test_fixed_text_padding() {
    let null_pad = Datatype::fixed_string(5);
    assert_eq!(encode(&null_pad, &Value::String("hello".into()), &opts()).expect("encode failed"), b"hello");
    assert_eq!(encode(&null_pad, &Value::String("hi".into()), &opts()).expect("encode failed"), b"hi\0\0\0");

    let space_pad = Datatype::fixed_string(5).with_pad(StringPad::SpacePad);
    let bytes = encode(&space_pad, &Value::String("hi".into()), &opts()).expect("encode failed");
    assert_eq!(bytes, b"hi   ");
    assert_eq!(decode(&space_pad, &bytes, &opts()), Value::String("hi".into()));

    let terminated = Datatype::fixed_string(5).with_pad(StringPad::NullTerminate);
    let bytes = encode(&terminated, &Value::String("hello".into()), &opts()).expect("encode failed");
    assert_eq!(bytes, b"hell\0");
    assert_eq!(decode(&terminated, &bytes, &opts()), Value::String("hell".into()));
}

#[test]
fn test_unsigned_64bit_enum() {
    let dtype = Datatype::compound(vec![CompoundMember::new(
        "flags",
        Datatype::enumeration(
            Datatype::UINT64,
            vec![EnumMember::new("NONE", 0), EnumMember::new("ALL", u64::MAX as i128)],
        ),
    )]);
    let original = u64::MAX.to_le_bytes().to_vec();

    let value = decode(&dtype, &original, &opts());
    assert_eq!(
        value.field("flags"),
        Some(&Value::Enum { value: u64::MAX as i128, name: Some("ALL".into()) })
    );
    assert_eq!(encode(&dtype, &value, &opts()).expect("encode failed"), original);

    let by_name = Value::Compound(vec![h5attr::codec::Field::new("flags", Value::String("ALL".into()))]);
    assert_eq!(encode(&dtype, &by_name, &opts()).expect("encode failed"), original);
}

#[test]
fn test_non_utf8_text_keeps_bytes() {
    let dtype = Datatype::compound(vec![
        CompoundMember::new("n", Datatype::UINT8),
        CompoundMember::new("s", Datatype::fixed_string(3)),
    ]);
    let original = vec![1u8, 0xe9, b'a', 0];

    let value = decode(&dtype, &original, &opts());
    assert_eq!(value.field("n"), Some(&Value::UInt8(1)));
    assert_eq!(value.field("s"), Some(&Value::Bytes(vec![0xe9, b'a', 0])));
    assert_eq!(encode(&dtype, &value, &opts()).expect("encode failed"), original);
}
