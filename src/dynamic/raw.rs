use bytes::Bytes;

use crate::codec::{Bencode, Codec, Compiler, DecodeSelf, EncodeSelf, IsZero};
use crate::error::{Error, Result};
use crate::grammar;

/// One bencode value kept in its encoded form.
///
/// Decoding captures the exact bytes of the value; encoding writes them back
/// unchanged. Useful for fields whose bytes must be preserved, such as a
/// torrent's `info` dictionary that is hashed as-is.
///
/// ```
/// use bencoding::{decode, encode, RawValue, Value};
///
/// let raw: RawValue = decode(b"d1:ai1ee").unwrap();
/// assert_eq!(raw.as_bytes(), b"d1:ai1ee");
/// assert_eq!(raw.to_value().unwrap().get(b"a"), Some(&Value::Integer(1)));
/// assert_eq!(encode(&raw).unwrap(), b"d1:ai1ee");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawValue(Bytes);

impl RawValue {
    /// Wraps `bytes`, which must hold exactly one canonical bencode value.
    pub fn new(bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        let end = grammar::skip_value(&bytes, 0, 0)?;
        if end != bytes.len() {
            return Err(Error::syntax("trailing bytes after raw value", end));
        }
        Ok(RawValue(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decodes the held bytes structurally.
    pub fn to_value(&self) -> Result<super::Value> {
        crate::decode(&self.0)
    }
}

impl EncodeSelf for RawValue {
    fn encode_self(&self) -> Result<Vec<u8>> {
        Ok(self.0.to_vec())
    }
}

impl DecodeSelf for RawValue {
    fn decode_self(&mut self, raw: &[u8]) -> Result<()> {
        self.0 = Bytes::copy_from_slice(raw);
        Ok(())
    }
}

impl IsZero for RawValue {
    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }
}

impl Bencode for RawValue {
    fn compile(_: &mut Compiler) -> Result<Codec<Self>> {
        Ok(Codec::custom().with_is_zero())
    }
}
