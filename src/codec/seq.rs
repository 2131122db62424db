//! Lists: `Vec<T>` and `[T; N]`.

use bytes::BufMut;

use super::{short_type_name, Bencode, Codec, Compiler, Kind};
use crate::error::{Error, Result};
use crate::grammar;

impl<T: Bencode + Default> Bencode for Vec<T> {
    fn compile(c: &mut Compiler) -> Result<Codec<Self>> {
        T::compile_vec(c)
    }

    fn key_codec() -> Result<super::KeyCodec<Self>> {
        T::vec_key_codec()
    }
}

impl<T: Bencode, const N: usize> Bencode for [T; N] {
    fn compile(c: &mut Compiler) -> Result<Codec<Self>> {
        T::compile_array::<N>(c)
    }

    fn key_codec() -> Result<super::KeyCodec<Self>> {
        T::array_key_codec::<N>()
    }
}

/// A growable list. Decoding replaces the previous contents.
pub(crate) fn list<T: Bencode + Default>(c: &mut Compiler) -> Result<Codec<Vec<T>>> {
    let elem = c.compile::<T>()?;
    let decoder = elem.clone();
    let name = short_type_name::<Vec<T>>();

    Ok(Codec::new(
        Kind::List,
        move |ctx, value: &Vec<T>| {
            ctx.enter()?;
            ctx.buf_mut().put_u8(b'l');
            for item in value {
                elem.encode(ctx, item)?;
            }
            ctx.buf_mut().put_u8(b'e');
            ctx.leave();
            Ok(())
        },
        move |buf, cursor, depth, value: &mut Vec<T>| {
            grammar::expect_lead(buf, cursor, grammar::is_list, name)?;
            let depth = grammar::descend(buf, cursor, depth)?;
            value.clear();
            let mut cursor = cursor + 1;
            loop {
                match buf.get(cursor) {
                    None => return Err(Error::eof(cursor)),
                    Some(b'e') => return Ok(cursor + 1),
                    Some(_) => {
                        let mut item = T::default();
                        cursor = decoder.decode(buf, cursor, depth, &mut item)?;
                        value.push(item);
                    }
                }
            }
        },
        |value: &Vec<T>| value.is_empty(),
    ))
}

/// A fixed-length list. The wire list must have exactly `N` elements.
pub(crate) fn array<T: Bencode, const N: usize>(c: &mut Compiler) -> Result<Codec<[T; N]>> {
    let elem = c.compile::<T>()?;
    let (decoder, zero) = (elem.clone(), elem.clone());
    let name = short_type_name::<[T; N]>();

    Ok(Codec::new(
        Kind::List,
        move |ctx, value: &[T; N]| {
            ctx.enter()?;
            ctx.buf_mut().put_u8(b'l');
            for item in value {
                elem.encode(ctx, item)?;
            }
            ctx.buf_mut().put_u8(b'e');
            ctx.leave();
            Ok(())
        },
        move |buf, start, depth, value: &mut [T; N]| {
            grammar::expect_lead(buf, start, grammar::is_list, name)?;
            let depth = grammar::descend(buf, start, depth)?;
            let mut cursor = start + 1;
            let mut count = 0;
            loop {
                match buf.get(cursor) {
                    None => return Err(Error::eof(cursor)),
                    Some(b'e') => break,
                    Some(_) if count < N => {
                        cursor = decoder.decode(buf, cursor, depth, &mut value[count])?;
                    }
                    Some(_) => cursor = grammar::skip_value(buf, cursor, depth)?,
                }
                count += 1;
            }
            if count != N {
                return Err(Error::LengthMismatch {
                    expected: N,
                    actual: count,
                    offset: start,
                });
            }
            Ok(cursor + 1)
        },
        move |value: &[T; N]| value.iter().all(|item| zero.is_zero(item)),
    ))
}
