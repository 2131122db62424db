use std::sync::Arc;

use bytes::{BufMut, Bytes};

use super::{short_type_name, Bencode, Codec, Compiler, DecodeFn, EncodeFn, Kind, ZeroFn};
use crate::error::{Error, Result};
use crate::grammar;

/// One dictionary entry of a record: the wire key plus procedures that reach
/// the field inside the record and encode or decode it there.
pub(crate) struct Field<R> {
    key: Bytes,
    path: String,
    omit_empty: bool,
    indirect: bool,
    encode: EncodeFn<R>,
    decode: DecodeFn<R>,
    is_zero: ZeroFn<R>,
}

impl<R> Clone for Field<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            path: self.path.clone(),
            omit_empty: self.omit_empty,
            indirect: self.indirect,
            encode: self.encode.clone(),
            decode: self.decode.clone(),
            is_zero: self.is_zero.clone(),
        }
    }
}

impl<R: 'static> Field<R> {
    pub(crate) fn key(&self) -> &[u8] {
        &self.key
    }

    /// Absent indirections are always left out; other fields only when
    /// marked omit-empty and zero.
    fn skipped(&self, record: &R) -> bool {
        (self.indirect || self.omit_empty) && (self.is_zero)(record)
    }

    /// Re-roots this field under an outer record that embeds `R` as `name`.
    fn lift<O, G, M>(&self, name: &str, get: Arc<G>, get_mut: Arc<M>) -> Field<O>
    where
        O: 'static,
        G: Fn(&O) -> &R + Send + Sync + 'static,
        M: Fn(&mut O) -> &mut R + Send + Sync + 'static,
    {
        let (encode, decode, is_zero) = (
            self.encode.clone(),
            self.decode.clone(),
            self.is_zero.clone(),
        );
        let zero_get = get.clone();
        Field {
            key: self.key.clone(),
            path: format!("{}.{}", name, self.path),
            omit_empty: self.omit_empty,
            indirect: self.indirect,
            encode: encode_fn(move |ctx, outer: &O| encode(ctx, get(outer))),
            decode: decode_fn(move |buf, cursor, depth, outer: &mut O| {
                decode(buf, cursor, depth, get_mut(outer))
            }),
            is_zero: zero_fn(move |outer: &O| is_zero(zero_get(outer))),
        }
    }
}

fn encode_fn<R, F>(f: F) -> EncodeFn<R>
where
    F: Fn(&mut crate::encode::EncodeContext, &R) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn decode_fn<R, F>(f: F) -> DecodeFn<R>
where
    F: Fn(&[u8], usize, usize, &mut R) -> Result<usize> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn zero_fn<R, F>(f: F) -> ZeroFn<R>
where
    F: Fn(&R) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Describes a record type field by field.
///
/// Each field names its wire key and how to reach it. Fields are written in
/// ascending key order whatever order they are declared in. Errors from
/// compiling field types are held until [`build`](Self::build).
pub struct RecordBuilder<'c, R> {
    compiler: &'c mut Compiler,
    fields: Vec<Field<R>>,
    error: Option<Error>,
}

impl<'c, R: 'static> RecordBuilder<'c, R> {
    pub(crate) fn new(compiler: &'c mut Compiler) -> Self {
        Self {
            compiler,
            fields: Vec::new(),
            error: None,
        }
    }

    /// Adds a field stored under `key`.
    pub fn field<F, G, M>(self, key: &'static str, get: G, get_mut: M) -> Self
    where
        F: Bencode,
        G: Fn(&R) -> &F + Send + Sync + 'static,
        M: Fn(&mut R) -> &mut F + Send + Sync + 'static,
    {
        self.push_field(key, false, get, get_mut)
    }

    /// Adds a field that is left out when it holds its zero value.
    ///
    /// Zero means empty for strings, sequences and maps, and the type's
    /// [`IsZero`](crate::IsZero) answer when its codec was built with one.
    pub fn field_omit_empty<F, G, M>(self, key: &'static str, get: G, get_mut: M) -> Self
    where
        F: Bencode,
        G: Fn(&R) -> &F + Send + Sync + 'static,
        M: Fn(&mut R) -> &mut F + Send + Sync + 'static,
    {
        self.push_field(key, true, get, get_mut)
    }

    fn push_field<F, G, M>(
        mut self,
        key: &'static str,
        omit_empty: bool,
        get: G,
        get_mut: M,
    ) -> Self
    where
        F: Bencode,
        G: Fn(&R) -> &F + Send + Sync + 'static,
        M: Fn(&mut R) -> &mut F + Send + Sync + 'static,
    {
        if self.error.is_some() {
            return self;
        }

        let codec = match self.compiler.compile::<F>() {
            Ok(codec) => codec,
            Err(e) => {
                self.error = Some(e);
                return self;
            }
        };

        let get = Arc::new(get);
        let zero_get = get.clone();
        let (encoder, zero) = (codec.clone(), codec.clone());
        self.fields.push(Field {
            key: Bytes::from_static(key.as_bytes()),
            path: key.to_string(),
            omit_empty,
            indirect: codec.kind() == Kind::Indirect,
            encode: encode_fn(move |ctx, record: &R| encoder.encode(ctx, get(record))),
            decode: decode_fn(move |buf, cursor, depth, record: &mut R| {
                codec.decode(buf, cursor, depth, get_mut(record))
            }),
            is_zero: zero_fn(move |record: &R| zero.is_zero(zero_get(record))),
        });
        self
    }

    /// Sets the name the most recently added field is reported under in
    /// decode errors. Defaults to the wire key.
    pub fn named(mut self, name: &'static str) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.path = name.to_string();
        }
        self
    }

    /// Inlines the fields of the embedded record `name` into this one.
    pub fn flatten<E, G, M>(mut self, name: &'static str, get: G, get_mut: M) -> Self
    where
        E: Bencode,
        G: Fn(&R) -> &E + Send + Sync + 'static,
        M: Fn(&mut R) -> &mut E + Send + Sync + 'static,
    {
        if self.error.is_some() {
            return self;
        }

        let embedded = match self.compiler.compile::<E>() {
            Ok(codec) => codec,
            Err(e) => {
                self.error = Some(e);
                return self;
            }
        };

        let Some(fields) = embedded.fields() else {
            self.error = Some(Error::unsupported::<E>(
                "only records can be flattened into another record",
            ));
            return self;
        };

        let (get, get_mut) = (Arc::new(get), Arc::new(get_mut));
        for field in fields.iter() {
            self.fields.push(field.lift(name, get.clone(), get_mut.clone()));
        }
        self
    }

    /// Finishes the record, rejecting duplicate wire keys.
    pub fn build(self) -> Result<Codec<R>> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let mut fields = self.fields;
        fields.sort_by(|a, b| a.key.cmp(&b.key));
        if let Some(pair) = fields.windows(2).find(|pair| pair[0].key == pair[1].key) {
            return Err(Error::unsupported::<R>(format!(
                "duplicate wire key {:?}",
                String::from_utf8_lossy(&pair[0].key)
            )));
        }

        let fields: Arc<[Field<R>]> = fields.into();
        let (encode_fields, decode_fields, zero_fields) =
            (fields.clone(), fields.clone(), fields.clone());
        let record = short_type_name::<R>();

        let codec = Codec::new(
            Kind::Record,
            move |ctx, value: &R| {
                ctx.enter()?;
                ctx.buf_mut().put_u8(b'd');
                for field in encode_fields.iter() {
                    if field.skipped(value) {
                        continue;
                    }
                    grammar::append_byte_string(ctx.buf_mut(), &field.key);
                    (field.encode)(ctx, value)?;
                }
                ctx.buf_mut().put_u8(b'e');
                ctx.leave();
                Ok(())
            },
            move |buf, cursor, depth, value: &mut R| {
                grammar::expect_lead(buf, cursor, grammar::is_dict, record)?;
                let depth = grammar::descend(buf, cursor, depth)?;
                let mut cursor = cursor + 1;
                let mut last = None;
                loop {
                    match buf.get(cursor) {
                        None => return Err(Error::eof(cursor)),
                        Some(b'e') => return Ok(cursor + 1),
                        Some(_) => {}
                    }

                    let (key, next) = grammar::read_byte_string(buf, cursor)?;
                    grammar::check_key_order(last, key, cursor)?;
                    last = Some(key);
                    let start = grammar::value_start(buf, next)?;

                    cursor = match decode_fields.binary_search_by(|f| f.key().cmp(key)) {
                        Ok(i) => {
                            let field = &decode_fields[i];
                            (field.decode)(buf, start, depth, value)
                                .map_err(|e| e.in_field(|| format!("{}.{}", record, field.path)))?
                        }
                        Err(_) => grammar::skip_value(buf, start, depth)?,
                    };
                }
            },
            move |value: &R| zero_fields.iter().all(|field| (field.is_zero)(value)),
        );
        Ok(codec.with_fields(fields))
    }
}
