//! Values whose shape is only known at runtime.
//!
//! - [`Value`] is the closed union of the four bencode types.
//! - [`AnyValue`] holds a value of any encodable type.
//! - [`RawValue`] keeps one value in its encoded form.
//!
//! # Examples
//!
//! ```
//! use bencoding::{decode, encode, Value};
//!
//! let value: Value = decode(b"l4:spami42ee").unwrap();
//! let list = value.as_list().unwrap();
//! assert_eq!(list[0].as_str(), Some("spam"));
//! assert_eq!(list[1].as_integer(), Some(42));
//!
//! assert_eq!(encode(&value).unwrap(), b"l4:spami42ee");
//! ```

mod any;
mod raw;
mod value;

pub use any::AnyValue;
pub use raw::RawValue;
pub use value::Value;
