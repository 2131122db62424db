use std::any::{type_name, Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use tracing::{debug, trace};

use super::registry::CodecMap;
use super::{Bencode, Codec, Kind, RecordBuilder};
use crate::error::{Error, Result};

type Entry = Arc<dyn Any + Send + Sync>;

/// Builds codecs for a type and everything it contains.
///
/// One compiler is one compilation pass. Types already in the process-wide
/// registry are reused, types finished earlier in the pass are memoized, and
/// a type that refers back to itself while it is still being compiled gets a
/// forward reference that is patched once its codec is complete.
pub struct Compiler {
    published: Arc<CodecMap>,
    finished: HashMap<TypeId, Entry>,
    order: Vec<TypeId>,
    pending: HashMap<TypeId, Entry>,
    forwarded: HashSet<TypeId>,
}

impl Compiler {
    /// A compiler that ignores the registry and compiles everything itself.
    pub fn new() -> Self {
        Self::with_snapshot(Arc::new(CodecMap::new()))
    }

    pub(crate) fn with_snapshot(published: Arc<CodecMap>) -> Self {
        Self {
            published,
            finished: HashMap::new(),
            order: Vec::new(),
            pending: HashMap::new(),
            forwarded: HashSet::new(),
        }
    }

    /// Returns the codec for `T`, compiling it if this pass has not seen it.
    pub fn compile<T: Bencode>(&mut self) -> Result<Codec<T>> {
        let id = TypeId::of::<T>();

        if let Some(entry) = self.published.get(&id).or_else(|| self.finished.get(&id)) {
            return downcast::<Codec<T>>(entry.clone()).map(|codec| (*codec).clone());
        }

        if let Some(slot) = self.pending.get(&id) {
            trace!("forward reference to {} while it compiles", type_name::<T>());
            let slot = downcast::<OnceLock<Codec<T>>>(slot.clone())?;
            self.forwarded.insert(id);
            return Ok(forward(slot));
        }

        let slot: Arc<OnceLock<Codec<T>>> = Arc::new(OnceLock::new());
        let mark = self.order.len();
        self.pending.insert(id, slot.clone());
        let compiled = T::compile(self);
        self.pending.remove(&id);
        let forwarded = self.forwarded.remove(&id);

        // Codecs built around the forward reference took it for a record.
        let compiled = compiled.and_then(|codec| match codec.kind() {
            Kind::Indirect if forwarded => Err(Error::unsupported::<T>(
                "an optional value cannot contain itself",
            )),
            _ => Ok(codec),
        });

        let codec = match compiled {
            Ok(codec) => codec,
            Err(e) => {
                // Anything finished inside this type may hold its unpatched slot.
                for nested in self.order.drain(mark..) {
                    self.finished.remove(&nested);
                }
                return Err(e);
            }
        };
        let _ = slot.set(codec.clone());
        self.finished.insert(id, Arc::new(codec.clone()));
        self.order.push(id);
        debug!("compiled bencode codec for {} ({:?})", type_name::<T>(), codec.kind());
        Ok(codec)
    }

    /// Starts describing the record type `R`.
    pub fn record<R: 'static>(&mut self) -> RecordBuilder<'_, R> {
        RecordBuilder::new(self)
    }

    /// Codecs compiled during this pass, ready to publish.
    pub(crate) fn finish(self) -> Vec<(TypeId, Entry)> {
        self.finished.into_iter().collect()
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

fn downcast<C: Send + Sync + 'static>(entry: Entry) -> Result<Arc<C>> {
    entry
        .downcast::<C>()
        .map_err(|_| Error::unsupported::<C>("codec registry holds a different type"))
}

/// Codec that defers to `slot` once the type it stands for is compiled.
///
/// The placeholder reports itself as a record. A type that turns out to be an
/// indirection is rejected once its compilation finishes, since the codecs
/// around the placeholder would otherwise nest indirections unchecked.
fn forward<T: 'static>(slot: Arc<OnceLock<Codec<T>>>) -> Codec<T> {
    let (decode_slot, zero_slot) = (slot.clone(), slot.clone());
    Codec::new(
        Kind::Record,
        move |ctx, value| match slot.get() {
            Some(codec) => codec.encode(ctx, value),
            None => Err(unfinished::<T>()),
        },
        move |buf, cursor, depth, value| match decode_slot.get() {
            Some(codec) => codec.decode(buf, cursor, depth, value),
            None => Err(unfinished::<T>()),
        },
        move |value| zero_slot.get().is_some_and(|codec| codec.is_zero(value)),
    )
}

fn unfinished<T>() -> Error {
    Error::unsupported::<T>("codec used before its compilation finished")
}
