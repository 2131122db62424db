use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;

use super::*;
use crate::encode::EncodeContext;
use crate::{decode, encode, record, DecodeSelf, EncodeSelf, IsZero};

fn encode_with<T: 'static>(codec: &Codec<T>, value: &T) -> Vec<u8> {
    let mut ctx = EncodeContext::new();
    codec.encode(&mut ctx, value).unwrap();
    ctx.buf().to_vec()
}

#[derive(Debug, Default, PartialEq)]
struct Info {
    name: String,
    length: u64,
    private: bool,
}

record! {
    Info {
        "name" => name,
        "length" => length,
        "private" => private [omit_empty],
    }
}

#[derive(Debug, Default, PartialEq)]
struct Tree {
    label: String,
    children: Vec<Tree>,
}

record! {
    Tree {
        "label" => label,
        "children" => children [omit_empty],
    }
}

#[test]
fn test_compile_is_idempotent() {
    let first = Compiler::new().compile::<Info>().unwrap();
    let second = Compiler::new().compile::<Info>().unwrap();

    let info = Info {
        name: "a".into(),
        length: 3,
        private: true,
    };
    assert_eq!(encode_with(&first, &info), encode_with(&second, &info));
    assert_eq!(first.field_keys(), second.field_keys());
}

#[test]
fn test_record_fields_sorted_by_wire_key() {
    let codec = Compiler::new().compile::<Info>().unwrap();
    assert_eq!(codec.kind(), Kind::Record);
    assert_eq!(
        codec.field_keys().unwrap(),
        vec![&b"length"[..], b"name", b"private"]
    );
}

#[test]
fn test_codec_for_caches() {
    let first = codec_for::<Info>().unwrap();
    let second = codec_for::<Info>().unwrap();
    assert_eq!(first.type_name(), second.type_name());
    assert!(registry::cached_types() >= 4);
}

#[test]
fn test_kinds() {
    let mut c = Compiler::new();
    assert_eq!(c.compile::<bool>().unwrap().kind(), Kind::Integer);
    assert_eq!(c.compile::<u8>().unwrap().kind(), Kind::Integer);
    assert_eq!(c.compile::<Vec<u8>>().unwrap().kind(), Kind::ByteString);
    assert_eq!(c.compile::<[u8; 20]>().unwrap().kind(), Kind::ByteString);
    assert_eq!(c.compile::<Vec<u16>>().unwrap().kind(), Kind::List);
    assert_eq!(c.compile::<Vec<Vec<u8>>>().unwrap().kind(), Kind::List);
    assert_eq!(c.compile::<[u32; 2]>().unwrap().kind(), Kind::List);
    assert_eq!(c.compile::<BTreeMap<String, u8>>().unwrap().kind(), Kind::Dict);
    assert_eq!(c.compile::<Option<u8>>().unwrap().kind(), Kind::Indirect);
    assert_eq!(c.compile::<Box<Info>>().unwrap().kind(), Kind::Record);
    assert_eq!(c.compile::<crate::Value>().unwrap().kind(), Kind::Dynamic);
}

#[derive(Default)]
struct DuplicateKeys {
    a: u8,
    b: u8,
}

impl Bencode for DuplicateKeys {
    fn compile(c: &mut Compiler) -> Result<Codec<Self>> {
        c.record::<Self>()
            .field("x", |r| &r.a, |r| &mut r.a)
            .field("x", |r| &r.b, |r| &mut r.b)
            .build()
    }
}

#[test]
fn test_duplicate_wire_key() {
    let err = Compiler::new().compile::<DuplicateKeys>().unwrap_err();
    assert!(matches!(err, Error::UnsupportedType { .. }), "{}", err);
    assert!(err.to_string().contains("duplicate wire key"));
}

#[derive(Debug, Default, PartialEq)]
struct Base {
    name: String,
}

record! {
    Base {
        "name" => name,
    }
}

#[derive(Default)]
struct Clash {
    base: Base,
    name: String,
}

record! {
    Clash {
        flatten base,
        "name" => name,
    }
}

#[test]
fn test_flatten_collision() {
    let err = Compiler::new().compile::<Clash>().unwrap_err();
    assert!(matches!(err, Error::UnsupportedType { .. }), "{}", err);
}

#[derive(Default)]
struct FlattenScalar {
    n: u32,
}

record! {
    FlattenScalar {
        flatten n,
    }
}

#[test]
fn test_flatten_requires_record() {
    let err = Compiler::new().compile::<FlattenScalar>().unwrap_err();
    assert!(err.to_string().contains("only records can be flattened"));
}

#[derive(Debug, Default, PartialEq)]
struct Extended {
    base: Base,
    seq: u32,
}

record! {
    Extended {
        "seq" => seq,
        flatten base,
    }
}

#[test]
fn test_flatten() {
    let value = Extended {
        base: Base { name: "x".into() },
        seq: 2,
    };
    let encoded = encode(&value).unwrap();
    assert_eq!(encoded, b"d4:name1:x3:seqi2ee");
    assert_eq!(decode::<Extended>(&encoded).unwrap(), value);

    let err = decode::<Extended>(b"d4:namei1e3:seqi2ee").unwrap_err();
    assert_eq!(err.field(), Some("Extended.base.name"));
}

#[test]
fn test_nested_indirection_rejected() {
    let err = Compiler::new().compile::<Option<Option<u8>>>().unwrap_err();
    assert!(matches!(err, Error::UnsupportedType { .. }));

    let err = Compiler::new().compile::<Option<Box<Option<u8>>>>().unwrap_err();
    assert!(matches!(err, Error::UnsupportedType { .. }));

    assert!(Compiler::new().compile::<Option<Box<u8>>>().is_ok());
}

#[test]
fn test_map_key_types() {
    let err = Compiler::new().compile::<HashMap<u32, String>>().unwrap_err();
    assert!(matches!(err, Error::UnsupportedType { .. }));
    assert!(err.to_string().contains("dictionary keys"));

    let err = Compiler::new().compile::<BTreeMap<Vec<u32>, u8>>().unwrap_err();
    assert!(matches!(err, Error::UnsupportedType { .. }));

    let mut c = Compiler::new();
    assert!(c.compile::<HashMap<String, u8>>().is_ok());
    assert!(c.compile::<BTreeMap<Bytes, u8>>().is_ok());
    assert!(c.compile::<BTreeMap<Vec<u8>, u8>>().is_ok());
    assert!(c.compile::<BTreeMap<[u8; 2], u8>>().is_ok());
}

#[derive(Default)]
struct BadField {
    info: Info,
    ports: HashMap<u16, u16>,
}

record! {
    BadField {
        "info" => info,
        "ports" => ports,
    }
}

#[test]
fn test_failed_compile_is_not_cached() {
    let mut c = Compiler::new();
    assert!(c.compile::<BadField>().is_err());
    assert!(c.compile::<BadField>().is_err());
    assert!(codec_for::<BadField>().is_err());
    assert!(c.compile::<Info>().is_ok());
}

#[test]
fn test_self_referential_record() {
    let tree = Tree {
        label: "root".into(),
        children: vec![
            Tree {
                label: "a".into(),
                children: vec![],
            },
            Tree {
                label: "b".into(),
                children: vec![Tree {
                    label: "c".into(),
                    children: vec![],
                }],
            },
        ],
    };

    let encoded = encode(&tree).unwrap();
    assert_eq!(
        encoded,
        &b"d8:childrenld5:label1:aed8:childrenld5:label1:cee5:label1:bee5:label4:roote"[..]
    );
    assert_eq!(decode::<Tree>(&encoded).unwrap(), tree);
}

#[test]
fn test_omit_empty_and_absent() {
    #[derive(Debug, Default, PartialEq)]
    struct Announce {
        url: String,
        backup: Option<String>,
        tags: Vec<String>,
    }

    record! {
        Announce {
            "url" => url,
            "backup" => backup,
            "tags" => tags [omit_empty],
        }
    }

    let value = Announce {
        url: "u".into(),
        ..Default::default()
    };
    assert_eq!(encode(&value).unwrap(), b"d3:url1:ue");

    let value = Announce {
        url: "u".into(),
        backup: Some(String::new()),
        tags: vec!["t".into()],
    };
    let encoded = encode(&value).unwrap();
    assert_eq!(encoded, b"d6:backup0:4:tagsl1:te3:url1:ue");
    assert_eq!(decode::<Announce>(&encoded).unwrap(), value);
}

#[derive(Debug, Default, PartialEq)]
struct Hex(u32);

impl EncodeSelf for Hex {
    fn encode_self(&self) -> Result<Vec<u8>> {
        let text = format!("{:x}", self.0);
        Ok(format!("{}:{}", text.len(), text).into_bytes())
    }
}

impl DecodeSelf for Hex {
    fn decode_self(&mut self, raw: &[u8]) -> Result<()> {
        let text: String = decode(raw)?;
        self.0 = u32::from_str_radix(&text, 16).map_err(|e| Error::custom(e.to_string()))?;
        Ok(())
    }
}

impl IsZero for Hex {
    fn is_zero_value(&self) -> bool {
        self.0 == 0
    }
}

impl Bencode for Hex {
    fn compile(_: &mut Compiler) -> Result<Codec<Self>> {
        Ok(Codec::custom().with_is_zero())
    }
}

#[test]
fn test_custom_codec() {
    assert_eq!(encode(&Hex(255)).unwrap(), b"2:ff");
    assert_eq!(decode::<Hex>(b"2:ff").unwrap(), Hex(255));

    #[derive(Debug, Default, PartialEq)]
    struct Colors {
        fg: Hex,
        bg: Hex,
    }

    record! {
        Colors {
            "fg" => fg,
            "bg" => bg [omit_empty],
        }
    }

    let value = Colors {
        fg: Hex(16),
        bg: Hex(0),
    };
    assert_eq!(encode(&value).unwrap(), b"d2:fg2:10e");

    let err = decode::<Colors>(b"d2:fg2:zze").unwrap_err();
    assert!(matches!(err, Error::Custom { .. }), "{}", err);
    assert_eq!(err.field(), Some("Colors.fg"));
    assert_eq!(err.offset(), Some(5));
}

#[derive(Debug, Default, PartialEq)]
struct Empty;

impl EncodeSelf for Empty {
    fn encode_self(&self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

impl DecodeSelf for Empty {
    fn decode_self(&mut self, _: &[u8]) -> Result<()> {
        Ok(())
    }
}

impl Bencode for Empty {
    fn compile(_: &mut Compiler) -> Result<Codec<Self>> {
        Ok(Codec::custom())
    }
}

#[test]
fn test_custom_empty_output_is_error() {
    let err = encode(&Empty).unwrap_err();
    assert!(matches!(err, Error::Custom { .. }));
}

#[derive(Debug, Default, PartialEq)]
struct Version {
    major: u8,
    minor: u8,
}

impl EncodeSelf for Version {
    fn encode_self(&self) -> Result<Vec<u8>> {
        let text = format!("{}.{}", self.major, self.minor);
        Ok(format!("{}:{}", text.len(), text).into_bytes())
    }
}

impl Bencode for Version {
    fn compile(c: &mut Compiler) -> Result<Codec<Self>> {
        Ok(c.record::<Self>()
            .field("major", |v| &v.major, |v| &mut v.major)
            .field("minor", |v| &v.minor, |v| &mut v.minor)
            .build()?
            .with_encode_self())
    }
}

#[test]
fn test_encode_override_only() {
    let version = Version { major: 1, minor: 2 };
    assert_eq!(encode(&version).unwrap(), b"3:1.2");
    assert_eq!(
        decode::<Version>(b"d5:majori1e5:minori2ee").unwrap(),
        version
    );
}

#[derive(Debug, Default, PartialEq)]
struct Port(u16);

#[test]
fn test_project() {
    impl Bencode for Port {
        fn compile(c: &mut Compiler) -> Result<Codec<Self>> {
            Ok(c.compile::<u16>()?.project(|p: &Port| &p.0, |p: &mut Port| &mut p.0))
        }
    }

    assert_eq!(encode(&Port(6881)).unwrap(), b"i6881e");
    assert_eq!(decode::<Port>(b"i80e").unwrap(), Port(80));
}

#[derive(Debug, Default)]
struct Chain(Option<Box<Chain>>);

impl Bencode for Chain {
    fn compile(c: &mut Compiler) -> Result<Codec<Self>> {
        Ok(c.compile::<Option<Box<Chain>>>()?
            .project(|l: &Chain| &l.0, |l: &mut Chain| &mut l.0))
    }
}

#[derive(Debug, Default, PartialEq)]
struct Nest(Vec<Nest>);

impl Bencode for Nest {
    fn compile(c: &mut Compiler) -> Result<Codec<Self>> {
        Ok(c.compile::<Vec<Nest>>()?
            .project(|n: &Nest| &n.0, |n: &mut Nest| &mut n.0))
    }
}

#[test]
fn test_self_referential_indirection_rejected() {
    let err = Compiler::new().compile::<Chain>().unwrap_err();
    assert!(matches!(err, Error::UnsupportedType { .. }), "{}", err);
    assert!(codec_for::<Chain>().is_err());

    // Recursion through a list is not an indirection.
    let nest = Nest(vec![Nest(vec![]), Nest(vec![Nest(vec![])])]);
    let encoded = encode(&nest).unwrap();
    assert_eq!(encoded, b"llelleee");
    assert_eq!(decode::<Nest>(&encoded).unwrap(), nest);
}

#[derive(Debug, Default, PartialEq)]
struct Label(String);

impl EncodeSelf for Label {
    fn encode_self(&self) -> Result<Vec<u8>> {
        Ok(format!("{}:{}", self.0.len(), self.0).into_bytes())
    }
}

impl DecodeSelf for Label {
    fn decode_self(&mut self, raw: &[u8]) -> Result<()> {
        self.0 = decode(raw)?;
        Ok(())
    }
}

impl Bencode for Label {
    fn compile(_: &mut Compiler) -> Result<Codec<Self>> {
        Ok(Codec::custom().with_default_zero())
    }
}

#[test]
fn test_custom_default_zero() {
    #[derive(Debug, Default, PartialEq)]
    struct Tagged {
        name: Label,
        note: Label,
    }

    record! {
        Tagged {
            "name" => name,
            "note" => note [omit_empty],
        }
    }

    let tagged = Tagged {
        name: Label("a".into()),
        note: Label::default(),
    };
    assert_eq!(encode(&tagged).unwrap(), b"d4:name1:ae");

    let tagged = Tagged {
        name: Label("a".into()),
        note: Label("x".into()),
    };
    let encoded = encode(&tagged).unwrap();
    assert_eq!(encoded, b"d4:name1:a4:note1:xe");
    assert_eq!(decode::<Tagged>(&encoded).unwrap(), tagged);

    assert!(codec_for::<Label>().unwrap().is_zero(&Label::default()));
    assert!(!codec_for::<Empty>().unwrap().is_zero(&Empty));
}
