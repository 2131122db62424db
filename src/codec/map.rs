//! Maps with string-like keys, encoded as dictionaries.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use bytes::BufMut;

use super::{short_type_name, Bencode, Codec, Compiler, Kind};
use crate::encode::EncodeContext;
use crate::error::{Error, Result};
use crate::grammar;

/// Converts a map key to and from its dictionary key bytes.
///
/// Only string-like types have one: `String`, `Bytes`, `Vec<u8>` and
/// `[u8; N]`.
pub struct KeyCodec<K> {
    to_bytes: for<'a> fn(&'a K) -> &'a [u8],
    from_bytes: fn(&[u8], usize) -> Result<K>,
}

impl<K> Clone for KeyCodec<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for KeyCodec<K> {}

impl<K> KeyCodec<K> {
    pub fn new(
        to_bytes: for<'a> fn(&'a K) -> &'a [u8],
        from_bytes: fn(&[u8], usize) -> Result<K>,
    ) -> Self {
        Self {
            to_bytes,
            from_bytes,
        }
    }

    pub fn to_bytes<'a>(&self, key: &'a K) -> &'a [u8] {
        (self.to_bytes)(key)
    }

    /// `offset` is where the key starts in the input, for diagnostics.
    pub fn from_bytes(&self, bytes: &[u8], offset: usize) -> Result<K> {
        (self.from_bytes)(bytes, offset)
    }
}

/// The map operations a dictionary codec needs.
trait DictMap: Default + 'static {
    type Key: Bencode;
    type Value: Bencode + Default;

    fn entries(&self) -> Vec<(&Self::Key, &Self::Value)>;
    fn insert_entry(&mut self, key: Self::Key, value: Self::Value);
    fn clear_entries(&mut self);
    fn entry_count(&self) -> usize;
}

impl<K, V> DictMap for BTreeMap<K, V>
where
    K: Bencode + Ord,
    V: Bencode + Default,
{
    type Key = K;
    type Value = V;

    fn entries(&self) -> Vec<(&K, &V)> {
        self.iter().collect()
    }

    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }

    fn clear_entries(&mut self) {
        self.clear();
    }

    fn entry_count(&self) -> usize {
        self.len()
    }
}

impl<K, V, S> DictMap for HashMap<K, V, S>
where
    K: Bencode + Eq + Hash,
    V: Bencode + Default,
    S: BuildHasher + Default + 'static,
{
    type Key = K;
    type Value = V;

    fn entries(&self) -> Vec<(&K, &V)> {
        self.iter().collect()
    }

    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }

    fn clear_entries(&mut self) {
        self.clear();
    }

    fn entry_count(&self) -> usize {
        self.len()
    }
}

impl<K, V> Bencode for BTreeMap<K, V>
where
    K: Bencode + Ord,
    V: Bencode + Default,
{
    fn compile(c: &mut Compiler) -> Result<Codec<Self>> {
        dict::<Self>(c)
    }
}

impl<K, V, S> Bencode for HashMap<K, V, S>
where
    K: Bencode + Eq + Hash,
    V: Bencode + Default,
    S: BuildHasher + Default + 'static,
{
    fn compile(c: &mut Compiler) -> Result<Codec<Self>> {
        dict::<Self>(c)
    }
}

/// Dictionary codec for a map type. Unsupported key types fail here, when the
/// codec is compiled, not when a value is first encoded.
fn dict<M: DictMap>(c: &mut Compiler) -> Result<Codec<M>> {
    let keys = M::Key::key_codec()?;
    let value = c.compile::<M::Value>()?;
    let decoder = value.clone();
    let name = short_type_name::<M>();

    Ok(Codec::new(
        Kind::Dict,
        move |ctx, map: &M| encode_entries(ctx, keys, &value, map),
        move |buf, cursor, depth, map: &mut M| {
            grammar::expect_lead(buf, cursor, grammar::is_dict, name)?;
            let depth = grammar::descend(buf, cursor, depth)?;
            map.clear_entries();
            let mut cursor = cursor + 1;
            let mut last = None;
            loop {
                match buf.get(cursor) {
                    None => return Err(Error::eof(cursor)),
                    Some(b'e') => return Ok(cursor + 1),
                    Some(_) => {}
                }

                let (raw, next) = grammar::read_byte_string(buf, cursor)?;
                grammar::check_key_order(last, raw, cursor)?;
                last = Some(raw);
                let key = keys.from_bytes(raw, cursor)?;

                let start = grammar::value_start(buf, next)?;
                let mut item = M::Value::default();
                cursor = decoder.decode(buf, start, depth, &mut item)?;
                map.insert_entry(key, item);
            }
        },
        |map: &M| map.entry_count() == 0,
    ))
}

fn encode_entries<M: DictMap>(
    ctx: &mut EncodeContext,
    keys: KeyCodec<M::Key>,
    value: &Codec<M::Value>,
    map: &M,
) -> Result<()> {
    ctx.enter()?;
    let mut entries: Vec<(&[u8], &M::Value)> = map
        .entries()
        .into_iter()
        .map(|(k, v)| (keys.to_bytes(k), v))
        .collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

    ctx.buf_mut().put_u8(b'd');
    for (key, item) in entries {
        grammar::append_byte_string(ctx.buf_mut(), key);
        value.encode(ctx, item)?;
    }
    ctx.buf_mut().put_u8(b'e');
    ctx.leave();
    Ok(())
}
