//! Type-directed codec compilation.
//!
//! A [`Codec<T>`] is a pair of encode/decode procedures specialized for `T`,
//! built once by the [`Compiler`] and then reused for every value of that
//! type. Types describe themselves by implementing [`Bencode`]; the compiler
//! calls [`Bencode::compile`] at most once per type and per compilation pass,
//! and the [`registry`] keeps the results for the rest of the process.
//!
//! # Examples
//!
//! ```
//! use bencoding::{decode, encode, Bencode, Codec, Compiler, Result};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! impl Bencode for User {
//!     fn compile(c: &mut Compiler) -> Result<Codec<Self>> {
//!         c.record::<Self>()
//!             .field("name", |u| &u.name, |u| &mut u.name)
//!             .field("id", |u| &u.id, |u| &mut u.id)
//!             .build()
//!     }
//! }
//!
//! let user = User { id: 1, name: "sai".into() };
//! let encoded = encode(&user).unwrap();
//! assert_eq!(encoded, b"d2:idi1e4:name3:saie");
//! assert_eq!(decode::<User>(&encoded).unwrap(), user);
//! ```

mod compiler;
mod custom;
mod indirect;
mod map;
mod record;
pub mod registry;
mod scalar;
mod seq;

use std::any::type_name;
use std::sync::Arc;

use crate::constants::{STACK_RED_ZONE, STACK_SEGMENT_SIZE};
use crate::encode::EncodeContext;
use crate::error::{Error, Result};

pub use compiler::Compiler;
pub use custom::{DecodeSelf, EncodeSelf, IsZero};
pub use map::KeyCodec;
pub use record::RecordBuilder;
pub use registry::codec_for;

pub(crate) use record::Field;

/// Encodes a value into the context's buffer.
pub type EncodeFn<T> = Arc<dyn Fn(&mut EncodeContext, &T) -> Result<()> + Send + Sync>;

/// Decodes the value at `cursor` into the target, given the enclosing depth.
/// Returns the cursor just past the value.
pub type DecodeFn<T> = Arc<dyn Fn(&[u8], usize, usize, &mut T) -> Result<usize> + Send + Sync>;

/// Tells whether a value counts as empty for omit-if-zero fields.
pub type ZeroFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// The wire shape a codec produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Integer,
    ByteString,
    List,
    Dict,
    Record,
    /// A nil-able single-level indirection (`Option<T>`, `AnyValue`).
    Indirect,
    /// Shape chosen at runtime (`Value`).
    Dynamic,
    /// User-supplied encode and decode procedures.
    Custom,
}

/// Compiled encode/decode procedures for `T`.
///
/// Codecs are immutable once built and cheap to clone.
pub struct Codec<T> {
    kind: Kind,
    type_name: &'static str,
    encode: EncodeFn<T>,
    decode: DecodeFn<T>,
    is_zero: ZeroFn<T>,
    fields: Option<Arc<[Field<T>]>>,
}

impl<T> Clone for Codec<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            type_name: self.type_name,
            encode: self.encode.clone(),
            decode: self.decode.clone(),
            is_zero: self.is_zero.clone(),
            fields: self.fields.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Codec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("type", &self.type_name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl<T: 'static> Codec<T> {
    pub fn new<E, D, Z>(kind: Kind, encode: E, decode: D, is_zero: Z) -> Self
    where
        E: Fn(&mut EncodeContext, &T) -> Result<()> + Send + Sync + 'static,
        D: Fn(&[u8], usize, usize, &mut T) -> Result<usize> + Send + Sync + 'static,
        Z: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            kind,
            type_name: type_name::<T>(),
            encode: Arc::new(encode),
            decode: Arc::new(decode),
            is_zero: Arc::new(is_zero),
            fields: None,
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    // Every nested value passes through these two; deep nesting continues on
    // a heap-allocated stack segment.
    pub fn encode(&self, ctx: &mut EncodeContext, value: &T) -> Result<()> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, || {
            (self.encode)(ctx, value)
        })
    }

    pub fn decode(&self, buf: &[u8], cursor: usize, depth: usize, value: &mut T) -> Result<usize> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, || {
            (self.decode)(buf, cursor, depth, value)
        })
    }

    pub fn is_zero(&self, value: &T) -> bool {
        (self.is_zero)(value)
    }

    /// Wire keys of a record codec, in wire order.
    pub fn field_keys(&self) -> Option<Vec<&[u8]>> {
        self.fields
            .as_ref()
            .map(|fields| fields.iter().map(|f| f.key()).collect())
    }

    pub(crate) fn fields(&self) -> Option<&Arc<[Field<T>]>> {
        self.fields.as_ref()
    }

    pub(crate) fn with_fields(mut self, fields: Arc<[Field<T>]>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Reuses this codec for a wrapper type that owns a `T`.
    ///
    /// The wrapper keeps this codec's kind, so a transparent wrapper of an
    /// `Option` is still an indirection.
    pub fn project<W, G, M>(self, get: G, get_mut: M) -> Codec<W>
    where
        W: 'static,
        G: Fn(&W) -> &T + Send + Sync + 'static,
        M: Fn(&mut W) -> &mut T + Send + Sync + 'static,
    {
        let get = Arc::new(get);
        let zero_get = get.clone();
        let Codec {
            kind,
            encode,
            decode,
            is_zero,
            ..
        } = self;
        Codec::new(
            kind,
            move |ctx, w| encode(ctx, get(w)),
            move |buf, cursor, depth, w| decode(buf, cursor, depth, get_mut(w)),
            move |w| is_zero(zero_get(w)),
        )
    }
}

/// A type with a bencode representation.
///
/// Implementations describe the type to the [`Compiler`], usually through
/// [`Compiler::record`] or by reusing another type's codec; the
/// [`record!`](crate::record) macro writes the impl for plain structs.
///
/// The hidden methods let an element type choose how sequences and map keys
/// of it are represented, which is how `Vec<u8>` and `[u8; N]` become byte
/// strings instead of lists of integers.
pub trait Bencode: Sized + 'static {
    fn compile(c: &mut Compiler) -> Result<Codec<Self>>;

    #[doc(hidden)]
    fn compile_vec(c: &mut Compiler) -> Result<Codec<Vec<Self>>>
    where
        Self: Default,
    {
        seq::list::<Self>(c)
    }

    #[doc(hidden)]
    fn compile_array<const N: usize>(c: &mut Compiler) -> Result<Codec<[Self; N]>> {
        seq::array::<Self, N>(c)
    }

    #[doc(hidden)]
    fn key_codec() -> Result<KeyCodec<Self>> {
        Err(unsupported_key::<Self>())
    }

    #[doc(hidden)]
    fn vec_key_codec() -> Result<KeyCodec<Vec<Self>>> {
        Err(unsupported_key::<Vec<Self>>())
    }

    #[doc(hidden)]
    fn array_key_codec<const N: usize>() -> Result<KeyCodec<[Self; N]>> {
        Err(unsupported_key::<[Self; N]>())
    }
}

fn unsupported_key<K>() -> Error {
    Error::unsupported::<K>("only strings and byte strings can be dictionary keys")
}

/// Last path segment of a type name, for field diagnostics.
pub(crate) fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests;
