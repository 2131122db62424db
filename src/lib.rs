//! bencoding - Canonical Bencode for Rust types
//!
//! Values are encoded and decoded through per-type codecs that are compiled
//! once, the first time a type is used, and cached for the rest of the
//! process. Decoding accepts canonical bencode only and never panics on
//! malformed input.
//!
//! # Modules
//!
//! - [`grammar`] - Recognizers and writers for the four bencode productions
//! - [`codec`] - The [`Bencode`] trait, codec compilation and the codec cache
//! - [`encode`] / [`decode`] - Entry points and per-call state
//! - [`dynamic`] - [`Value`], [`AnyValue`] and [`RawValue`]
//! - [`constants`] - Traversal limits and pool sizes
//!
//! # Examples
//!
//! ```
//! use bencoding::{decode, encode, record};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Peer {
//!     ip: String,
//!     port: u16,
//!     id: Option<[u8; 4]>,
//! }
//!
//! record! {
//!     Peer {
//!         "ip" => ip,
//!         "port" => port,
//!         "peer id" => id,
//!     }
//! }
//!
//! let peer = Peer { ip: "10.0.0.1".into(), port: 6881, id: None };
//! let encoded = encode(&peer).unwrap();
//! assert_eq!(encoded, b"d2:ip8:10.0.0.14:porti6881ee");
//! assert_eq!(decode::<Peer>(&encoded).unwrap(), peer);
//!
//! // Only canonical input is accepted.
//! assert!(decode::<u16>(b"i06881e").is_err());
//! ```

pub mod codec;
pub mod constants;
pub mod decode;
pub mod dynamic;
pub mod encode;
pub mod error;
pub mod grammar;
mod macros;

pub use codec::{
    codec_for, Bencode, Codec, Compiler, DecodeSelf, EncodeSelf, IsZero, KeyCodec, Kind,
    RecordBuilder,
};
pub use decode::{decode, decode_into};
pub use dynamic::{AnyValue, RawValue, Value};
pub use encode::{encode, encode_to, EncodeContext};
pub use error::{Error, Result};
