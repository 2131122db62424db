//! Round-trip, key-order and canonical-input properties over generated values.

use std::collections::{BTreeMap, HashMap};

use bencoding::{decode, encode, record, Value};
use bytes::Bytes;
use proptest::prelude::*;

#[derive(Debug, Default, Clone, PartialEq)]
struct Sample {
    flag: bool,
    small: i8,
    wide: u64,
    name: String,
    blob: Vec<u8>,
    digest: [u8; 4],
    tags: Vec<String>,
    scores: BTreeMap<String, i32>,
    parent: Option<Box<Sample>>,
}

record! {
    Sample {
        "flag" => flag,
        "small" => small,
        "wide" => wide,
        "name" => name,
        "blob" => blob,
        "digest" => digest,
        "tags" => tags [omit_empty],
        "scores" => scores,
        "parent" => parent,
    }
}

fn leaf() -> impl Strategy<Value = Sample> {
    (
        any::<bool>(),
        any::<i8>(),
        any::<u64>(),
        ".{0,12}",
        prop::collection::vec(any::<u8>(), 0..16),
        any::<[u8; 4]>(),
        prop::collection::vec("[a-z]{0,6}", 0..4),
        prop::collection::btree_map("[a-z]{1,6}", any::<i32>(), 0..4),
    )
        .prop_map(|(flag, small, wide, name, blob, digest, tags, scores)| Sample {
            flag,
            small,
            wide,
            name,
            blob,
            digest,
            tags,
            scores,
            parent: None,
        })
}

fn sample() -> impl Strategy<Value = Sample> {
    leaf().prop_recursive(3, 8, 1, |inner| {
        (leaf(), inner).prop_map(|(mut outer, parent)| {
            outer.parent = Some(Box::new(parent));
            outer
        })
    })
}

fn value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(Value::Integer),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(|b| Value::Bytes(Bytes::from(b))),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::btree_map(
                prop::collection::vec(any::<u8>(), 0..4).prop_map(Bytes::from),
                inner,
                0..4,
            )
            .prop_map(Value::Dict),
        ]
    })
}

proptest! {
    #[test]
    fn prop_record_roundtrip(sample in sample()) {
        let encoded = encode(&sample).unwrap();
        prop_assert_eq!(decode::<Sample>(&encoded).unwrap(), sample);
    }

    #[test]
    fn prop_value_roundtrip(value in value()) {
        let encoded = encode(&value).unwrap();
        prop_assert_eq!(decode::<Value>(&encoded).unwrap(), value);
    }

    #[test]
    fn prop_map_keys_sorted(map in prop::collection::hash_map("[a-z]{0,5}", any::<u16>(), 0..16)) {
        let encoded = encode(&map).unwrap();

        // Decoding rejects keys that are not strictly ascending.
        prop_assert!(decode::<Value>(&encoded).is_ok());

        let back: HashMap<String, u16> = decode(&encoded).unwrap();
        prop_assert_eq!(back, map);
    }

    #[test]
    fn prop_record_omits_absent_fields(sample in leaf()) {
        let encoded = encode(&sample).unwrap();
        let value: Value = decode(&encoded).unwrap();
        let dict = value.as_dict().unwrap();
        prop_assert!(dict.contains_key(b"blob".as_slice()));
        prop_assert_eq!(dict.contains_key(b"tags".as_slice()), !sample.tags.is_empty());
        prop_assert!(!dict.contains_key(b"parent".as_slice()));
    }

    #[test]
    fn prop_leading_zero_integers_rejected(n in 0u32..1_000_000) {
        let data = format!("i0{}e", n);
        prop_assert!(decode::<Value>(data.as_bytes()).unwrap_err().is_syntax());

        let data = format!("i-0{}e", n);
        prop_assert!(decode::<Value>(data.as_bytes()).unwrap_err().is_syntax());
    }

    #[test]
    fn prop_arbitrary_input_never_panics(data in prop::collection::vec(any::<u8>(), 0..64)) {
        let _ = decode::<Value>(&data);
        let _ = decode::<Sample>(&data);
        let _ = decode::<Vec<u32>>(&data);
    }

    #[test]
    fn prop_integer_widths(n in any::<i64>()) {
        let encoded = encode(&n).unwrap();
        match i16::try_from(n) {
            Ok(small) => prop_assert_eq!(decode::<i16>(&encoded).unwrap(), small),
            Err(_) => prop_assert!(matches!(
                decode::<i16>(&encoded).unwrap_err(),
                bencoding::Error::Overflow { .. }
            ), "expected Error::Overflow"),
        }
    }
}
