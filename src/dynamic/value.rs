use std::collections::BTreeMap;

use bytes::{BufMut, Bytes};

use crate::codec::{Bencode, Codec, Compiler, Kind};
use crate::encode::EncodeContext;
use crate::error::{Error, Result};
use crate::grammar;

/// A bencode value of any shape.
///
/// Bencode has four data types: integers, byte strings, lists, and
/// dictionaries. `Value` is what a decode produces when the destination does
/// not fix the shape in advance.
///
/// # Examples
///
/// ```
/// use bencoding::Value;
///
/// let int: Value = 42i64.into();
/// let string: Value = "hello".into();
///
/// assert_eq!(int.as_integer(), Some(42));
/// assert_eq!(string.as_str(), Some("hello"));
///
/// let value: Value = bencoding::decode(b"d3:foo3:bare").unwrap();
/// assert_eq!(value.get(b"foo").and_then(|v| v.as_str()), Some("bar"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A signed 64-bit integer.
    Integer(i64),
    /// A byte string (may or may not be valid UTF-8).
    Bytes(Bytes),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A dictionary with byte string keys, kept in wire order.
    Dict(BTreeMap<Bytes, Value>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Integer(0)
    }
}

impl Value {
    /// Creates a byte string value from a UTF-8 string.
    ///
    /// ```
    /// use bencoding::Value;
    ///
    /// assert_eq!(Value::string("spam"), Value::Bytes("spam".into()));
    /// ```
    pub fn string(s: &str) -> Self {
        Value::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }

    /// Returns the integer, if this is one.
    ///
    /// # Examples
    ///
    /// ```
    /// use bencoding::Value;
    ///
    /// assert_eq!(Value::Integer(-3).as_integer(), Some(-3));
    /// assert_eq!(Value::string("3").as_integer(), None);
    /// ```
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the raw byte string, if this is one.
    ///
    /// # Examples
    ///
    /// ```
    /// use bencoding::Value;
    ///
    /// let value: Value = bencoding::decode(b"2:\xff\x00").unwrap();
    /// assert_eq!(value.as_bytes().map(|b| b.as_ref()), Some(&b"\xff\x00"[..]));
    /// ```
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns `None` if the value is not a byte string or if the bytes are
    /// not valid UTF-8.
    ///
    /// # Examples
    ///
    /// ```
    /// use bencoding::Value;
    ///
    /// assert_eq!(Value::string("peer").as_str(), Some("peer"));
    /// assert_eq!(Value::Bytes(vec![0xff].into()).as_str(), None);
    /// ```
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Returns the list, if this is one.
    ///
    /// # Examples
    ///
    /// ```
    /// use bencoding::Value;
    ///
    /// let value: Value = bencoding::decode(b"li1ei2ee").unwrap();
    /// assert_eq!(value.as_list().map(Vec::len), Some(2));
    /// ```
    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Returns the dictionary, if this is one.
    ///
    /// # Examples
    ///
    /// ```
    /// use bencoding::Value;
    ///
    /// let value: Value = bencoding::decode(b"d4:porti6881ee").unwrap();
    /// assert!(value.as_dict().unwrap().contains_key(b"port".as_slice()));
    /// ```
    pub fn as_dict(&self) -> Option<&BTreeMap<Bytes, Value>> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Consumes the value and returns the dictionary, if it is one.
    ///
    /// # Examples
    ///
    /// ```
    /// use bencoding::Value;
    ///
    /// let value: Value = bencoding::decode(b"d4:porti6881ee").unwrap();
    /// let dict = value.into_dict().unwrap();
    /// assert_eq!(dict.len(), 1);
    /// ```
    pub fn into_dict(mut self) -> Option<BTreeMap<Bytes, Value>> {
        match &mut self {
            Value::Dict(d) => Some(std::mem::take(d)),
            _ => None,
        }
    }

    /// Looks up a key in this value if it is a dictionary.
    ///
    /// # Examples
    ///
    /// ```
    /// use bencoding::Value;
    ///
    /// let value: Value = bencoding::decode(b"d2:ip8:10.0.0.1e").unwrap();
    /// assert_eq!(value.get(b"ip").and_then(Value::as_str), Some("10.0.0.1"));
    /// assert!(value.get(b"port").is_none());
    /// ```
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.as_dict()?.get(key)
    }

    /// Zero values are left out of omit-empty record fields.
    pub(crate) fn is_empty_value(&self) -> bool {
        match self {
            Value::Integer(i) => *i == 0,
            Value::Bytes(b) => b.is_empty(),
            Value::List(l) => l.is_empty(),
            Value::Dict(d) => d.is_empty(),
        }
    }
}

// Nested values are torn down from a heap worklist so that dropping input
// decoded at the depth limit cannot overflow the stack.
impl Drop for Value {
    fn drop(&mut self) {
        let mut pending = match self {
            Value::List(items) if !items.is_empty() => std::mem::take(items),
            Value::Dict(entries) if !entries.is_empty() => {
                std::mem::take(entries).into_values().collect()
            }
            _ => return,
        };
        while let Some(mut value) = pending.pop() {
            match &mut value {
                Value::List(items) => pending.append(items),
                Value::Dict(entries) => pending.extend(std::mem::take(entries).into_values()),
                _ => {}
            }
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl From<BTreeMap<Bytes, Value>> for Value {
    fn from(d: BTreeMap<Bytes, Value>) -> Self {
        Value::Dict(d)
    }
}

impl Bencode for Value {
    fn compile(_: &mut Compiler) -> Result<Codec<Self>> {
        Ok(Codec::new(
            Kind::Dynamic,
            encode_value,
            |buf, cursor, depth, value: &mut Value| {
                let (decoded, next) = decode_value(buf, cursor, depth)?;
                *value = decoded;
                Ok(next)
            },
            Value::is_empty_value,
        ))
    }
}

/// A container being written or read; dictionaries being read remember the
/// last key, which is also the key of the value in progress.
enum Frame<'a> {
    List(Vec<Value>),
    Dict {
        entries: BTreeMap<Bytes, Value>,
        last: Option<&'a [u8]>,
    },
}

impl Frame<'_> {
    fn push(&mut self, value: Value) {
        match self {
            Frame::List(items) => items.push(value),
            Frame::Dict {
                entries,
                last: Some(key),
            } => {
                entries.insert(Bytes::copy_from_slice(key), value);
            }
            Frame::Dict { last: None, .. } => {}
        }
    }

    fn into_value(self) -> Value {
        match self {
            Frame::List(items) => Value::List(items),
            Frame::Dict { entries, .. } => Value::Dict(entries),
        }
    }
}

enum Writing<'a> {
    List(std::slice::Iter<'a, Value>),
    Dict(std::collections::btree_map::Iter<'a, Bytes, Value>),
}

fn encode_value(ctx: &mut EncodeContext, value: &Value) -> Result<()> {
    let mut open: Vec<Writing<'_>> = Vec::new();
    let mut next = Some(value);

    loop {
        match next.take() {
            Some(Value::Integer(i)) => grammar::append_integer(ctx.buf_mut(), i),
            Some(Value::Bytes(b)) => grammar::append_byte_string(ctx.buf_mut(), b),
            Some(Value::List(items)) => {
                ctx.enter()?;
                ctx.buf_mut().put_u8(b'l');
                open.push(Writing::List(items.iter()));
            }
            Some(Value::Dict(entries)) => {
                ctx.enter()?;
                ctx.buf_mut().put_u8(b'd');
                open.push(Writing::Dict(entries.iter()));
            }
            None => {}
        }

        let Some(top) = open.last_mut() else {
            return Ok(());
        };
        next = match top {
            Writing::List(items) => items.next(),
            Writing::Dict(entries) => entries.next().map(|(key, item)| {
                grammar::append_byte_string(ctx.buf_mut(), key);
                item
            }),
        };
        if next.is_none() {
            open.pop();
            ctx.buf_mut().put_u8(b'e');
            ctx.leave();
        }
    }
}

/// Decodes the value at `cursor` structurally. Integers must fit in `i64`.
///
/// Open containers live on the heap, so nesting is bounded by
/// [`MAX_DEPTH`](crate::constants::MAX_DEPTH) and not by the thread's stack.
pub(crate) fn decode_value(buf: &[u8], cursor: usize, depth: usize) -> Result<(Value, usize)> {
    let mut open: Vec<Frame<'_>> = Vec::new();
    let mut cursor = cursor;

    loop {
        let mut finished = match buf.get(cursor) {
            Some(b'i') => {
                let (i, next) = read_i64(buf, cursor)?;
                cursor = next;
                Some(Value::Integer(i))
            }
            Some(b'0'..=b'9') => {
                let (bytes, next) = grammar::read_byte_string(buf, cursor)?;
                cursor = next;
                Some(Value::Bytes(Bytes::copy_from_slice(bytes)))
            }
            Some(b'l') => {
                grammar::descend(buf, cursor, depth + open.len())?;
                open.push(Frame::List(Vec::new()));
                cursor += 1;
                None
            }
            Some(b'd') => {
                grammar::descend(buf, cursor, depth + open.len())?;
                open.push(Frame::Dict {
                    entries: BTreeMap::new(),
                    last: None,
                });
                cursor += 1;
                None
            }
            Some(&c) => return Err(grammar::invalid_value_start(c, cursor)),
            None => return Err(Error::eof(cursor)),
        };

        // Hand finished values to their parents and close containers until
        // another value is due.
        loop {
            let frame = match (finished.take(), open.last_mut()) {
                (Some(value), None) => return Ok((value, cursor)),
                (Some(value), Some(frame)) => {
                    frame.push(value);
                    frame
                }
                (None, Some(frame)) => frame,
                (None, None) => return Err(Error::eof(cursor)),
            };
            match buf.get(cursor) {
                None => return Err(Error::eof(cursor)),
                Some(b'e') => {
                    cursor += 1;
                    finished = open.pop().map(Frame::into_value);
                }
                Some(_) => {
                    if let Frame::Dict { last, .. } = frame {
                        let (key, next) = grammar::read_byte_string(buf, cursor)?;
                        grammar::check_key_order(*last, key, cursor)?;
                        *last = Some(key);
                        cursor = grammar::value_start(buf, next)?;
                    }
                    break;
                }
            }
        }
    }
}

fn read_i64(buf: &[u8], cursor: usize) -> Result<(i64, usize)> {
    let (digits, next) = grammar::read_integer(buf, cursor)?;
    let text = std::str::from_utf8(digits)
        .map_err(|_| Error::syntax("invalid integer", cursor))?;
    let i = text.parse().map_err(|_| Error::Overflow {
        value: text.to_string(),
        target: "i64",
    })?;
    Ok((i, next))
}
