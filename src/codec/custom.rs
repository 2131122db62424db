//! User-supplied encode and decode procedures.
//!
//! A type that knows its own wire form implements [`EncodeSelf`] and
//! [`DecodeSelf`] and builds its codec with [`Codec::custom`]. The procedures
//! work on complete bencode values: `encode_self` returns one, `decode_self`
//! receives the exact bytes of the value found in the input.
//!
//! ```
//! use bencoding::{
//!     decode, encode, Bencode, Codec, Compiler, DecodeSelf, EncodeSelf, Error, Result,
//! };
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Version(u8, u8);
//!
//! impl EncodeSelf for Version {
//!     fn encode_self(&self) -> Result<Vec<u8>> {
//!         let text = format!("{}.{}", self.0, self.1);
//!         Ok(format!("{}:{}", text.len(), text).into_bytes())
//!     }
//! }
//!
//! impl DecodeSelf for Version {
//!     fn decode_self(&mut self, raw: &[u8]) -> Result<()> {
//!         let text: String = decode(raw)?;
//!         let (major, minor) = text.split_once('.').ok_or_else(|| Error::custom("bad version"))?;
//!         self.0 = major.parse().map_err(|_| Error::custom("bad major"))?;
//!         self.1 = minor.parse().map_err(|_| Error::custom("bad minor"))?;
//!         Ok(())
//!     }
//! }
//!
//! impl Bencode for Version {
//!     fn compile(_: &mut Compiler) -> Result<Codec<Self>> {
//!         Ok(Codec::custom())
//!     }
//! }
//!
//! assert_eq!(encode(&Version(1, 2)).unwrap(), b"3:1.2");
//! assert_eq!(decode::<Version>(b"3:1.2").unwrap(), Version(1, 2));
//! ```

use bytes::BufMut;

use super::{Codec, Kind};
use crate::error::{Error, Result};
use crate::grammar;

/// Produces the complete bencode encoding of `self`.
pub trait EncodeSelf {
    fn encode_self(&self) -> Result<Vec<u8>>;
}

/// Fills `self` from the raw bytes of one bencode value.
pub trait DecodeSelf {
    fn decode_self(&mut self, raw: &[u8]) -> Result<()>;
}

/// Decides whether a value counts as empty for omit-if-zero record fields.
pub trait IsZero {
    fn is_zero_value(&self) -> bool;
}

impl<T: 'static> Codec<T> {
    /// A codec driven entirely by the type's own procedures.
    ///
    /// The type's structure is opaque to the codec, so its values are never
    /// considered zero. Chain [`with_is_zero`](Self::with_is_zero) or
    /// [`with_default_zero`](Self::with_default_zero) to change that.
    pub fn custom() -> Self
    where
        T: EncodeSelf + DecodeSelf,
    {
        Codec::new(Kind::Custom, encode_self::<T>, decode_self::<T>, |_: &T| false)
    }

    /// Replaces this codec's encoder with the type's [`EncodeSelf`].
    pub fn with_encode_self(self) -> Self
    where
        T: EncodeSelf,
    {
        let Codec {
            decode, is_zero, ..
        } = self;
        Codec::new(
            Kind::Custom,
            encode_self::<T>,
            move |buf, cursor, depth, value: &mut T| decode(buf, cursor, depth, value),
            move |value: &T| is_zero(value),
        )
    }

    /// Replaces this codec's decoder with the type's [`DecodeSelf`].
    pub fn with_decode_self(self) -> Self
    where
        T: DecodeSelf,
    {
        let Codec {
            encode, is_zero, ..
        } = self;
        Codec::new(
            Kind::Custom,
            move |ctx, value: &T| encode(ctx, value),
            decode_self::<T>,
            move |value: &T| is_zero(value),
        )
    }

    /// Replaces this codec's emptiness test with the type's [`IsZero`].
    ///
    /// Record fields keep their field list, so a record with a custom zero
    /// test can still be flattened.
    pub fn with_is_zero(mut self) -> Self
    where
        T: IsZero,
    {
        self.is_zero = std::sync::Arc::new(|value: &T| value.is_zero_value());
        self
    }

    /// Treats a value equal to `T::default()` as zero.
    ///
    /// This is the structural zero test for types whose codec cannot see
    /// inside them, such as those built with [`custom`](Self::custom).
    pub fn with_default_zero(mut self) -> Self
    where
        T: Default + PartialEq,
    {
        self.is_zero = std::sync::Arc::new(|value: &T| *value == T::default());
        self
    }
}

fn encode_self<T: EncodeSelf>(ctx: &mut crate::encode::EncodeContext, value: &T) -> Result<()> {
    let bytes = value.encode_self()?;
    if bytes.is_empty() {
        return Err(Error::custom(format!(
            "{} encoded itself as nothing",
            std::any::type_name::<T>()
        )));
    }
    ctx.buf_mut().put_slice(&bytes);
    Ok(())
}

fn decode_self<T: DecodeSelf>(
    buf: &[u8],
    cursor: usize,
    depth: usize,
    value: &mut T,
) -> Result<usize> {
    let end = grammar::skip_value(buf, cursor, depth)?;
    value.decode_self(&buf[cursor..end]).map_err(|e| e.at(cursor))?;
    Ok(end)
}
