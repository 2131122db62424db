use std::any::{type_name, Any};
use std::fmt;

use crate::codec::{codec_for, Bencode, Codec, Compiler, Kind};
use crate::encode::EncodeContext;
use crate::error::{Error, Result};

use super::value::{decode_value, Value};

/// Object-safe view of a value whose codec is looked up at encode time.
trait Dynamic: Any + Send + Sync {
    fn encode_dyn(&self, ctx: &mut EncodeContext) -> Result<()>;
    fn type_name_dyn(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
}

impl<T: Bencode + Send + Sync> Dynamic for T {
    fn encode_dyn(&self, ctx: &mut EncodeContext) -> Result<()> {
        codec_for::<T>()?.encode(ctx, self)
    }

    fn type_name_dyn(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A slot that can hold a value of any encodable type.
///
/// Encoding uses the held value's own codec, so user overrides apply.
/// Decoding always stores a structural [`Value`], whatever the slot held
/// before. An empty slot has no bencode form: as a record field it is left
/// out, anywhere else encoding it fails.
///
/// ```
/// use bencoding::{decode, encode, AnyValue, Value};
///
/// let slot = AnyValue::new(vec![1u32, 2]);
/// assert_eq!(encode(&slot).unwrap(), b"li1ei2ee");
///
/// let slot: AnyValue = decode(b"4:spam").unwrap();
/// assert_eq!(slot.as_value().and_then(Value::as_str), Some("spam"));
/// ```
#[derive(Default)]
pub struct AnyValue(Option<Box<dyn Dynamic>>);

impl AnyValue {
    pub fn new<T: Bencode + Send + Sync>(value: T) -> Self {
        AnyValue(Some(Box::new(value)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Name of the held value's type.
    pub fn type_name(&self) -> Option<&'static str> {
        self.0.as_deref().map(Dynamic::type_name_dyn)
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_deref()?.as_any().downcast_ref::<T>()
    }

    /// The held value if it is a [`Value`], which it always is after a decode.
    pub fn as_value(&self) -> Option<&Value> {
        self.downcast_ref::<Value>()
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.type_name() {
            Some(name) => write!(f, "AnyValue({})", name),
            None => f.write_str("AnyValue(empty)"),
        }
    }
}

impl From<Value> for AnyValue {
    fn from(value: Value) -> Self {
        AnyValue::new(value)
    }
}

/// An `AnyValue` may be empty, so it compiles as an indirection.
impl Bencode for AnyValue {
    fn compile(_: &mut Compiler) -> Result<Codec<Self>> {
        Ok(Codec::new(
            Kind::Indirect,
            |ctx, value: &AnyValue| match value.0.as_deref() {
                Some(inner) => inner.encode_dyn(ctx),
                None => Err(Error::NilPointer {
                    type_name: type_name::<AnyValue>(),
                }),
            },
            |buf, cursor, depth, value: &mut AnyValue| {
                let (decoded, next) = decode_value(buf, cursor, depth)?;
                *value = AnyValue::new(decoded);
                Ok(next)
            },
            |value: &AnyValue| value.is_empty(),
        ))
    }
}
