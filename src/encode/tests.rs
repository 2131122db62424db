use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use super::*;
use crate::constants::MAX_DEPTH;
use crate::{record, Error, Value};

#[test]
fn test_encode_scalars() {
    assert_eq!(encode(&true).unwrap(), b"i1e");
    assert_eq!(encode(&false).unwrap(), b"i0e");
    assert_eq!(encode(&42u32).unwrap(), b"i42e");
    assert_eq!(encode(&-42i64).unwrap(), b"i-42e");
    assert_eq!(encode(&0i8).unwrap(), b"i0e");
    assert_eq!(encode(&u128::MAX).unwrap(), b"i340282366920938463463374607431768211455e");
    assert_eq!(encode(&"spam".to_string()).unwrap(), b"4:spam");
    assert_eq!(encode(&String::new()).unwrap(), b"0:");
    assert_eq!(encode(&Bytes::from_static(b"\x00\xff")).unwrap(), b"2:\x00\xff");
}

#[test]
fn test_encode_byte_sequences() {
    assert_eq!(encode(&vec![1u8, 2, 3]).unwrap(), b"3:\x01\x02\x03");
    assert_eq!(encode(&[b'a'; 4]).unwrap(), b"4:aaaa");
    assert_eq!(encode(&vec![1u16, 2]).unwrap(), b"li1ei2ee");
    assert_eq!(encode(&[7i32, -7]).unwrap(), b"li7ei-7ee");
    assert_eq!(encode(&Vec::<u32>::new()).unwrap(), b"le");
    assert_eq!(
        encode(&vec![b"ab".to_vec(), Vec::new()]).unwrap(),
        b"l2:ab0:e"
    );
}

#[test]
fn test_encode_map_keys_sorted() {
    let mut map = HashMap::new();
    map.insert("zeta".to_string(), 1u8);
    map.insert("alpha".to_string(), 2);
    map.insert("mid".to_string(), 3);
    assert_eq!(encode(&map).unwrap(), b"d5:alphai2e3:midi3e4:zetai1ee");

    let mut map = BTreeMap::new();
    map.insert(vec![0xffu8], 1u8);
    map.insert(vec![0x01u8, 0x02], 2);
    assert_eq!(encode(&map).unwrap(), b"d2:\x01\x02i2e1:\xffi1ee");

    assert_eq!(encode(&BTreeMap::<String, u8>::new()).unwrap(), b"de");
}

#[test]
fn test_encode_absent_option() {
    let err = encode(&None::<u32>).unwrap_err();
    assert!(matches!(err, Error::NilPointer { .. }), "{}", err);

    let err = encode(&vec![Some(1u32), None]).unwrap_err();
    assert!(matches!(err, Error::NilPointer { .. }));

    assert_eq!(encode(&Some(5u32)).unwrap(), b"i5e");
    assert_eq!(encode(&Some(Box::new(5u32))).unwrap(), b"i5e");
}

#[test]
fn test_encode_pointers() {
    assert_eq!(encode(&Box::new(1u8)).unwrap(), b"i1e");
    assert_eq!(encode(&Rc::new("a".to_string())).unwrap(), b"1:a");
    assert_eq!(encode(&Arc::new(vec![1u8])).unwrap(), b"1:\x01");
    assert_eq!(encode(&RefCell::new(3u8)).unwrap(), b"i3e");
}

#[test]
fn test_encode_borrowed_cell() {
    let cell = RefCell::new(3u8);
    let _guard = cell.borrow_mut();
    let err = encode(&cell).unwrap_err();
    assert!(matches!(err, Error::Borrowed { .. }));
}

#[test]
fn test_encode_to_appends() {
    let mut out = BytesMut::from(&b"prefix:"[..]);
    encode_to(&7u8, &mut out).unwrap();
    assert_eq!(&out[..], b"prefix:i7e");

    assert!(encode_to(&None::<u8>, &mut out).is_err());
    assert_eq!(&out[..], b"prefix:i7e");
}

#[test]
fn test_encode_with_context() {
    let mut ctx = EncodeContext::new();
    encode_with(&mut ctx, &vec![1u32]).unwrap();
    assert_eq!(&ctx.buf()[..], b"li1ee");

    encode_with(&mut ctx, &2u32).unwrap();
    assert_eq!(&ctx.buf()[..], b"i2e");

    assert_eq!(encode_bytes(&3u32).unwrap(), Bytes::from_static(b"i3e"));
}

#[test]
fn test_context_pool() {
    let pool = ContextPool::new(2);
    assert_eq!(pool.available(), 0);

    let mut ctx = pool.acquire();
    ctx.buf_mut().extend_from_slice(b"junk");
    pool.release(ctx);
    assert_eq!(pool.available(), 1);

    let ctx = pool.acquire();
    assert!(ctx.buf().is_empty());
    assert_eq!(pool.available(), 0);

    pool.release(ctx);
    pool.release(EncodeContext::new());
    pool.release(EncodeContext::new());
    assert_eq!(pool.available(), 2);
}

#[test]
fn test_pooled_context_reuses_buffer() {
    let pool = ContextPool::new(1);

    let first = {
        let mut pooled = pool::Pooled::from_pool(&pool);
        let ctx = pooled.ctx();
        ctx.buf_mut().extend_from_slice(&[0xaa; 64 * 1024]);
        ctx.buf().as_ptr()
    };
    assert_eq!(pool.available(), 1);

    let mut pooled = pool::Pooled::from_pool(&pool);
    assert_eq!(pool.available(), 0);
    let ctx = pooled.ctx();
    assert!(ctx.buf().is_empty());
    assert!(ctx.capacity() >= 64 * 1024);
    assert_eq!(ctx.buf().as_ptr(), first);
    drop(pooled);

    // Failed encodes hand their context back too.
    {
        let mut pooled = pool::Pooled::from_pool(&pool);
        let codec = crate::codec_for::<Option<u8>>().unwrap();
        assert!(codec.encode(pooled.ctx(), &None).is_err());
    }
    assert_eq!(pool.available(), 1);
}

#[test]
fn test_context_resets_after_error() {
    let nested = Value::List(vec![Value::Integer(1)]);
    assert!(encode(&None::<Value>).is_err());
    assert_eq!(encode(&nested).unwrap(), b"li1ee");
}

fn nested_list(depth: usize) -> Value {
    let mut value = Value::Integer(0);
    for _ in 0..depth {
        value = Value::List(vec![value]);
    }
    value
}

#[test]
fn test_encode_depth_limit() {
    let ok = nested_list(MAX_DEPTH);
    assert!(encode(&ok).is_ok());

    let too_deep = nested_list(MAX_DEPTH + 1);
    let err = encode(&too_deep).unwrap_err();
    assert!(matches!(err, Error::DepthExceeded { depth } if depth == MAX_DEPTH));
}

#[derive(Default)]
struct Chain {
    next: Option<Box<Chain>>,
}

record! {
    Chain {
        "next" => next,
    }
}

fn chain(levels: usize) -> Chain {
    let mut head = Chain::default();
    for _ in 1..levels {
        head = Chain {
            next: Some(Box::new(head)),
        };
    }
    head
}

/// Unlinks the chain one node at a time.
fn unlink(mut head: Chain) {
    let mut next = head.next.take();
    while let Some(mut node) = next {
        next = node.next.take();
    }
}

#[test]
fn test_encode_deep_records() {
    let ok = chain(MAX_DEPTH);
    let encoded = encode(&ok).unwrap();
    assert_eq!(encoded.len(), 8 * (MAX_DEPTH - 1) + 2);
    unlink(ok);

    let too_deep = chain(MAX_DEPTH + 1);
    let err = encode(&too_deep).unwrap_err();
    assert!(matches!(err, Error::DepthExceeded { .. }), "{}", err);
    unlink(too_deep);
}

#[derive(Default)]
struct Link {
    id: u32,
    next: RefCell<Option<Rc<Link>>>,
}

record! {
    Link {
        "id" => id,
        "next" => next,
    }
}

#[test]
fn test_encode_cycle() {
    let link = Rc::new(Link {
        id: 1,
        next: RefCell::new(None),
    });
    *link.next.borrow_mut() = Some(link.clone());

    let err = encode(&*link).unwrap_err();
    assert!(matches!(err, Error::Cycle { .. }), "{}", err);

    link.next.borrow_mut().take();
}

#[derive(Default)]
struct Node {
    next: Option<Rc<Node>>,
    shared: Vec<Rc<Node>>,
}

record! {
    Node {
        "next" => next,
        "shared" => shared [omit_empty],
    }
}

#[test]
fn test_shared_pointee_is_not_a_cycle() {
    let leaf = Rc::new(Node::default());
    let mut node = Rc::new(Node {
        next: None,
        shared: vec![leaf.clone(), leaf],
    });
    // Deep enough that pointee tracking is active at the tail.
    for _ in 0..600 {
        node = Rc::new(Node {
            next: Some(node),
            shared: Vec::new(),
        });
    }
    assert!(encode(&*node).is_ok());
}
