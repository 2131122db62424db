//! Decoding into typed values.

use crate::codec::{codec_for, Bencode};
use crate::error::{Error, Result};

/// Decodes one complete bencode value into a new `T`.
///
/// # Examples
///
/// ```
/// let list: Vec<String> = bencoding::decode(b"l4:spam4:eggse").unwrap();
/// assert_eq!(list, ["spam", "eggs"]);
///
/// assert!(bencoding::decode::<u8>(b"i256e").is_err());
/// ```
pub fn decode<T: Bencode + Default>(data: &[u8]) -> Result<T> {
    let mut value = T::default();
    decode_into(data, &mut value)?;
    Ok(value)
}

/// Decodes one complete bencode value into an existing `target`.
///
/// Record fields missing from the input keep their current values, and
/// sequences and maps are replaced. The input must hold exactly one value:
/// anything after it is a syntax error. On error `target` may be partially
/// updated.
pub fn decode_into<T: Bencode>(data: &[u8], target: &mut T) -> Result<()> {
    if data.is_empty() {
        return Err(Error::syntax("empty input", 0));
    }

    let codec = codec_for::<T>()?;
    let end = codec.decode(data, 0, 0, target)?;
    if let Some(&c) = data.get(end) {
        return Err(Error::syntax(
            format!("invalid character {:?} after top-level value", c as char),
            end,
        ));
    }
    Ok(())
}
