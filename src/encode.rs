//! Encoding typed values.
//!
//! Values are written through their compiled codec into a pooled
//! [`EncodeContext`]; the result is copied out so the context's buffer can be
//! reused by the next call.

mod context;
mod pool;

use bytes::BytesMut;

use crate::codec::{codec_for, Bencode};
use crate::error::Result;

pub use context::EncodeContext;
pub use pool::ContextPool;

use pool::Pooled;

/// Encodes `value` as canonical bencode.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// let mut map = BTreeMap::new();
/// map.insert("spam".to_string(), vec!["a".to_string(), "b".to_string()]);
/// assert_eq!(bencoding::encode(&map).unwrap(), b"d4:spaml1:a1:bee");
/// ```
///
/// # Errors
///
/// Fails if `T` has no bencode representation, if the value is an absent
/// `Option` where no field can omit it, if it nests deeper than
/// [`MAX_DEPTH`](crate::constants::MAX_DEPTH) or refers back to itself, or if a
/// user-supplied encoder fails.
pub fn encode<T: Bencode>(value: &T) -> Result<Vec<u8>> {
    let codec = codec_for::<T>()?;
    let mut pooled = Pooled::acquire();
    let ctx = pooled.ctx();
    codec.encode(ctx, value)?;
    let out = ctx.buf().to_vec();
    Ok(out)
}

/// Encodes `value` and appends the result to `out`.
///
/// Nothing is appended if encoding fails.
pub fn encode_to<T: Bencode>(value: &T, out: &mut BytesMut) -> Result<()> {
    let codec = codec_for::<T>()?;
    let mut pooled = Pooled::acquire();
    let ctx = pooled.ctx();
    codec.encode(ctx, value)?;
    out.extend_from_slice(ctx.buf());
    Ok(())
}

/// Encodes `value` with a caller-owned context, leaving the output in it.
///
/// The context is reset first.
pub fn encode_with<T: Bencode>(ctx: &mut EncodeContext, value: &T) -> Result<()> {
    let codec = codec_for::<T>()?;
    ctx.reset();
    codec.encode(ctx, value)
}

/// Encodes `value` into a fresh buffer without touching the pool.
pub fn encode_bytes<T: Bencode>(value: &T) -> Result<bytes::Bytes> {
    let mut ctx = EncodeContext::new();
    encode_with(&mut ctx, value)?;
    Ok(ctx.into_buf().freeze())
}

#[cfg(test)]
mod tests;
