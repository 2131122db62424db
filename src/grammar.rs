//! Byte-level recognizers and writers for the four bencode productions.
//!
//! | Production | Format | Example |
//! |------------|--------|---------|
//! | Integer | `i<number>e` | `i42e` |
//! | Byte string | `<length>:<data>` | `4:spam` |
//! | List | `l<items>e` | `l4:spami42ee` |
//! | Dictionary | `d<key><value>...e` | `d3:foo3:bare` |
//!
//! Everything here is a pure function over an immutable input slice. Readers
//! take a cursor and return the cursor of the next value; nothing is copied.
//! Only canonical input is accepted: no leading zeros, no `-0`, dictionary
//! keys strictly ascending.

use std::cmp::Ordering;
use std::fmt::Write;

use bytes::{BufMut, BytesMut};

pub use crate::constants::MAX_DEPTH;
use crate::error::{Error, Result};

/// Reads `<length>:<bytes>` at `cursor`, returning the payload and the cursor
/// just past it.
///
/// # Examples
///
/// ```
/// use bencoding::grammar::read_byte_string;
///
/// let (payload, next) = read_byte_string(b"4:spami1e", 0).unwrap();
/// assert_eq!(payload, b"spam");
/// assert_eq!(next, 6);
///
/// assert!(read_byte_string(b"04:spam", 0).is_err());
/// ```
pub fn read_byte_string(buf: &[u8], cursor: usize) -> Result<(&[u8], usize)> {
    if cursor >= buf.len() {
        return Err(Error::eof(cursor));
    }

    let digits = buf[cursor..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    let colon = cursor + digits;

    if digits == 0 {
        return Err(if buf[cursor] == b':' {
            Error::syntax("missing byte string length", cursor)
        } else {
            Error::syntax(
                format!("invalid character {:?} in byte string length", buf[cursor] as char),
                cursor,
            )
        });
    }

    match buf.get(colon) {
        Some(b':') => {}
        Some(&c) => {
            return Err(Error::syntax(
                format!("expected ':' after byte string length, found {:?}", c as char),
                colon,
            ))
        }
        None => return Err(Error::syntax("missing ':' after byte string length", colon)),
    }

    if digits > 1 && buf[cursor] == b'0' {
        return Err(Error::syntax("leading zero in byte string length", cursor));
    }

    let mut len: usize = 0;
    for &d in &buf[cursor..colon] {
        len = len
            .checked_mul(10)
            .and_then(|l| l.checked_add(usize::from(d - b'0')))
            .ok_or_else(|| Error::syntax("byte string length overflows", cursor))?;
    }

    let start = colon + 1;
    match start.checked_add(len) {
        Some(end) if end <= buf.len() => Ok((&buf[start..end], end)),
        _ => Err(Error::syntax(
            format!(
                "byte string length {} exceeds remaining {} bytes",
                len,
                buf.len() - start
            ),
            cursor,
        )),
    }
}

/// Reads `i<digits>e` at `cursor`, returning the digit run (sign included)
/// and the cursor just past the terminating `e`.
///
/// The digits are only validated, not parsed, so callers can parse into
/// whatever width they target.
///
/// # Examples
///
/// ```
/// use bencoding::grammar::read_integer;
///
/// let (digits, next) = read_integer(b"i-42e", 0).unwrap();
/// assert_eq!(digits, b"-42");
/// assert_eq!(next, 5);
///
/// assert!(read_integer(b"i-0e", 0).is_err());
/// assert!(read_integer(b"i03e", 0).is_err());
/// ```
pub fn read_integer(buf: &[u8], cursor: usize) -> Result<(&[u8], usize)> {
    match buf.get(cursor) {
        Some(b'i') => {}
        Some(&c) => {
            return Err(Error::syntax(
                format!("expected integer, found {:?}", c as char),
                cursor,
            ))
        }
        None => return Err(Error::eof(cursor)),
    }

    let start = cursor + 1;
    let negative = buf.get(start) == Some(&b'-');
    let digit_start = if negative { start + 1 } else { start };
    let digits = buf[digit_start.min(buf.len())..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    let end = digit_start + digits;

    if digits == 0 {
        return Err(match buf.get(digit_start) {
            None => Error::eof(digit_start),
            Some(b'e') => Error::syntax("empty integer", digit_start),
            Some(&c) => Error::syntax(
                format!("invalid character {:?} in integer", c as char),
                digit_start,
            ),
        });
    }

    match buf.get(end) {
        Some(b'e') => {}
        Some(&c) => {
            return Err(Error::syntax(
                format!("invalid character {:?} in integer", c as char),
                end,
            ))
        }
        None => return Err(Error::syntax("missing terminating 'e' of integer", end)),
    }

    if buf[digit_start] == b'0' {
        if negative {
            return Err(Error::syntax("negative zero is not allowed", cursor));
        }
        if digits > 1 {
            return Err(Error::syntax("leading zero in integer", cursor));
        }
    }

    Ok((&buf[start..end], end + 1))
}

/// Skips one complete value at `cursor` without materializing it, enforcing
/// the same canonical rules and depth limit as a typed decode.
///
/// `depth` is the nesting depth of the enclosing container. Open containers
/// are tracked on the heap, so deeply nested input cannot exhaust the stack.
pub fn skip_value(buf: &[u8], cursor: usize, depth: usize) -> Result<usize> {
    let mut open: Vec<Open<'_>> = Vec::new();
    let mut cursor = cursor;

    loop {
        match buf.get(cursor) {
            Some(b'i') => cursor = read_integer(buf, cursor)?.1,
            Some(b'0'..=b'9') => cursor = read_byte_string(buf, cursor)?.1,
            Some(b'l') => {
                descend(buf, cursor, depth + open.len())?;
                open.push(Open::List);
                cursor += 1;
            }
            Some(b'd') => {
                descend(buf, cursor, depth + open.len())?;
                open.push(Open::Dict(None));
                cursor += 1;
            }
            Some(&c) => return Err(invalid_value_start(c, cursor)),
            None => return Err(Error::eof(cursor)),
        }

        // Close finished containers until another value is due.
        loop {
            let Some(container) = open.last_mut() else {
                return Ok(cursor);
            };
            match buf.get(cursor) {
                None => return Err(Error::eof(cursor)),
                Some(b'e') => {
                    open.pop();
                    cursor += 1;
                }
                Some(_) => {
                    if let Open::Dict(last) = container {
                        let (key, next) = read_byte_string(buf, cursor)?;
                        check_key_order(*last, key, cursor)?;
                        *last = Some(key);
                        cursor = value_start(buf, next)?;
                    }
                    break;
                }
            }
        }
    }
}

/// A container `skip_value` is inside of; dictionaries remember their last key.
enum Open<'a> {
    List,
    Dict(Option<&'a [u8]>),
}

/// Enters a list or dictionary at `cursor`, returning the new depth.
pub(crate) fn descend(buf: &[u8], cursor: usize, depth: usize) -> Result<usize> {
    let depth = depth + 1;
    if depth > MAX_DEPTH {
        let c = buf.get(cursor).copied().unwrap_or(b'?');
        return Err(Error::syntax(
            format!("invalid character {:?} exceeded max depth {}", c as char, MAX_DEPTH),
            cursor,
        ));
    }
    Ok(depth)
}

/// Dictionary keys must be strictly ascending by byte value.
pub(crate) fn check_key_order(last: Option<&[u8]>, key: &[u8], cursor: usize) -> Result<()> {
    match last.map(|last| last.cmp(key)) {
        Some(Ordering::Equal) => Err(Error::syntax(
            format!("duplicate dictionary key {:?}", String::from_utf8_lossy(key)),
            cursor,
        )),
        Some(Ordering::Greater) => Err(Error::syntax(
            format!(
                "dictionary key {:?} is out of order",
                String::from_utf8_lossy(key)
            ),
            cursor,
        )),
        _ => Ok(()),
    }
}

/// A dictionary key must be followed by a value.
pub(crate) fn value_start(buf: &[u8], cursor: usize) -> Result<usize> {
    if cursor >= buf.len() {
        return Err(Error::syntax("missing value after dictionary key", cursor));
    }
    Ok(cursor)
}

/// Describes the value starting with `lead`, for type-mismatch diagnostics.
pub(crate) fn describe(lead: u8) -> Option<&'static str> {
    match lead {
        b'i' => Some("integer"),
        b'l' => Some("list"),
        b'd' => Some("dictionary"),
        b'0'..=b'9' => Some("byte string"),
        _ => None,
    }
}

pub(crate) fn invalid_value_start(c: u8, cursor: usize) -> Error {
    Error::syntax(
        format!("invalid character {:?} looking for beginning of value", c as char),
        cursor,
    )
}

/// Checks that the value at `cursor` starts with `lead`.
///
/// A different but well-formed value is a type mismatch against `expected`;
/// anything else is a syntax error.
pub(crate) fn expect_lead(
    buf: &[u8],
    cursor: usize,
    lead: fn(u8) -> bool,
    expected: &'static str,
) -> Result<()> {
    match buf.get(cursor) {
        None => Err(Error::eof(cursor)),
        Some(&c) if lead(c) => Ok(()),
        Some(&c) => match describe(c) {
            Some(found) => Err(Error::mismatch(expected, found, cursor)),
            None => Err(invalid_value_start(c, cursor)),
        },
    }
}

pub(crate) fn is_integer(c: u8) -> bool {
    c == b'i'
}

pub(crate) fn is_byte_string(c: u8) -> bool {
    c.is_ascii_digit()
}

pub(crate) fn is_list(c: u8) -> bool {
    c == b'l'
}

pub(crate) fn is_dict(c: u8) -> bool {
    c == b'd'
}

/// Appends `i<value>e`. Rust's decimal formatting of integers is canonical.
pub fn append_integer(buf: &mut BytesMut, value: impl std::fmt::Display) {
    buf.put_u8(b'i');
    // BytesMut grows on demand, so fmt::Write never fails here.
    let _ = write!(buf, "{}", value);
    buf.put_u8(b'e');
}

/// Appends `<length>:<bytes>`.
pub fn append_byte_string(buf: &mut BytesMut, bytes: &[u8]) {
    let _ = write!(buf, "{}:", bytes.len());
    buf.put_slice(bytes);
}
