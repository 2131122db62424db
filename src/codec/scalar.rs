//! Booleans, integers and byte strings.

use std::any::type_name;
use std::fmt::Display;
use std::str::FromStr;

use bytes::Bytes;

use super::{Bencode, Codec, Compiler, KeyCodec, Kind};
use crate::error::{Error, Result};
use crate::grammar;

impl Bencode for bool {
    fn compile(_: &mut Compiler) -> Result<Codec<Self>> {
        Ok(Codec::new(
            Kind::Integer,
            |ctx, value: &bool| {
                grammar::append_integer(ctx.buf_mut(), u8::from(*value));
                Ok(())
            },
            |buf, cursor, _, value: &mut bool| {
                grammar::expect_lead(buf, cursor, grammar::is_integer, "bool")?;
                let (digits, next) = grammar::read_integer(buf, cursor)?;
                *value = match digits {
                    b"0" => false,
                    b"1" => true,
                    _ => return Err(Error::mismatch("bool", "integer other than 0 or 1", cursor)),
                };
                Ok(next)
            },
            |value: &bool| !*value,
        ))
    }
}

/// Codec for any primitive integer type.
///
/// The grammar is validated before the digits are parsed, so a malformed
/// integer is a syntax error whatever the target width; a well-formed one
/// that does not fit (including a negative value for an unsigned target) is an
/// overflow.
fn integer<T>() -> Codec<T>
where
    T: Copy + Default + PartialEq + Display + FromStr + 'static,
{
    Codec::new(
        Kind::Integer,
        |ctx, value: &T| {
            grammar::append_integer(ctx.buf_mut(), *value);
            Ok(())
        },
        |buf, cursor, _, value: &mut T| {
            grammar::expect_lead(buf, cursor, grammar::is_integer, type_name::<T>())?;
            let (digits, next) = grammar::read_integer(buf, cursor)?;
            // read_integer only returns ASCII sign and digits.
            let text = std::str::from_utf8(digits)
                .map_err(|_| Error::syntax("invalid integer", cursor))?;
            *value = text.parse().map_err(|_| Error::Overflow {
                value: text.to_string(),
                target: type_name::<T>(),
            })?;
            Ok(next)
        },
        |value: &T| *value == T::default(),
    )
}

macro_rules! impl_integer {
    ($($ty:ty),*) => {
        $(
            impl Bencode for $ty {
                fn compile(_: &mut Compiler) -> Result<Codec<Self>> {
                    Ok(integer::<$ty>())
                }
            }
        )*
    };
}

impl_integer!(i8, i16, i32, i64, i128, isize, u16, u32, u64, u128, usize);

/// `u8` is an integer on its own, but sequences and arrays of it are byte
/// strings.
impl Bencode for u8 {
    fn compile(_: &mut Compiler) -> Result<Codec<Self>> {
        Ok(integer::<u8>())
    }

    fn compile_vec(_: &mut Compiler) -> Result<Codec<Vec<u8>>> {
        Ok(byte_string(
            Vec::as_slice,
            |v: &mut Vec<u8>, bytes: &[u8], _| {
                v.clear();
                v.extend_from_slice(bytes);
                Ok(())
            },
            |v: &Vec<u8>| v.is_empty(),
        ))
    }

    fn compile_array<const N: usize>(_: &mut Compiler) -> Result<Codec<[u8; N]>> {
        Ok(byte_string(
            array_bytes::<N>,
            |v: &mut [u8; N], bytes: &[u8], offset| {
                *v = array_from::<N>(bytes, offset)?;
                Ok(())
            },
            |v: &[u8; N]| v.iter().all(|&b| b == 0),
        ))
    }

    fn vec_key_codec() -> Result<KeyCodec<Vec<u8>>> {
        Ok(KeyCodec::new(Vec::as_slice, |bytes, _| Ok(bytes.to_vec())))
    }

    fn array_key_codec<const N: usize>() -> Result<KeyCodec<[u8; N]>> {
        Ok(KeyCodec::new(array_bytes::<N>, array_from::<N>))
    }
}

fn array_bytes<const N: usize>(v: &[u8; N]) -> &[u8] {
    v
}

/// A fixed-size byte array accepts only a byte string of exactly its length.
fn array_from<const N: usize>(bytes: &[u8], offset: usize) -> Result<[u8; N]> {
    <[u8; N]>::try_from(bytes).map_err(|_| Error::LengthMismatch {
        expected: N,
        actual: bytes.len(),
        offset,
    })
}

/// Codec for a type stored on the wire as one byte string.
///
/// `store` receives the payload and the offset of the value for diagnostics.
fn byte_string<T, L, S, Z>(load: L, store: S, is_zero: Z) -> Codec<T>
where
    T: 'static,
    L: Fn(&T) -> &[u8] + Send + Sync + 'static,
    S: Fn(&mut T, &[u8], usize) -> Result<()> + Send + Sync + 'static,
    Z: Fn(&T) -> bool + Send + Sync + 'static,
{
    Codec::new(
        Kind::ByteString,
        move |ctx, value: &T| {
            grammar::append_byte_string(ctx.buf_mut(), load(value));
            Ok(())
        },
        move |buf, cursor, _, value: &mut T| {
            grammar::expect_lead(buf, cursor, grammar::is_byte_string, type_name::<T>())?;
            let (bytes, next) = grammar::read_byte_string(buf, cursor)?;
            store(value, bytes, cursor)?;
            Ok(next)
        },
        is_zero,
    )
}

/// Strings are byte strings; Rust requires their bytes to be UTF-8 on decode.
impl Bencode for String {
    fn compile(_: &mut Compiler) -> Result<Codec<Self>> {
        Ok(byte_string(
            String::as_bytes,
            |v: &mut String, bytes: &[u8], offset| {
                let text = std::str::from_utf8(bytes)
                    .map_err(|_| Error::mismatch("String", "non-UTF-8 byte string", offset))?;
                v.clear();
                v.push_str(text);
                Ok(())
            },
            |v: &String| v.is_empty(),
        ))
    }

    fn key_codec() -> Result<KeyCodec<Self>> {
        Ok(KeyCodec::new(String::as_bytes, |bytes, offset| {
            std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|_| Error::mismatch("String", "non-UTF-8 byte string", offset))
        }))
    }
}

impl Bencode for Bytes {
    fn compile(_: &mut Compiler) -> Result<Codec<Self>> {
        Ok(byte_string(
            bytes_slice,
            |v: &mut Bytes, bytes: &[u8], _| {
                *v = Bytes::copy_from_slice(bytes);
                Ok(())
            },
            |v: &Bytes| v.is_empty(),
        ))
    }

    fn key_codec() -> Result<KeyCodec<Self>> {
        Ok(KeyCodec::new(bytes_slice, |bytes, _| {
            Ok(Bytes::copy_from_slice(bytes))
        }))
    }
}

fn bytes_slice(v: &Bytes) -> &[u8] {
    v
}
