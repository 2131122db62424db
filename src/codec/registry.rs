//! Process-wide codec cache.
//!
//! The cache is an immutable map from [`TypeId`] to a compiled codec, held in
//! an [`ArcSwap`]. Lookups load the current snapshot without locking. A miss
//! compiles the type (and whatever it contains) outside any lock and
//! publishes a new snapshot that includes the result. Two threads that miss on
//! the same type both compile it and the later publication wins; the entries
//! are equivalent, so nothing but CPU is lost.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;
use tracing::debug;

use super::{Bencode, Codec, Compiler};
use crate::error::{Error, Result};

pub(crate) type CodecMap = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

static REGISTRY: LazyLock<ArcSwap<CodecMap>> =
    LazyLock::new(|| ArcSwap::from_pointee(CodecMap::new()));

/// Returns the codec for `T`, compiling and caching it on first use.
///
/// Compile-time errors such as an unsupported map key are returned every time
/// the type is requested; failed compilations are never cached.
pub fn codec_for<T: Bencode>() -> Result<Codec<T>> {
    let snapshot = REGISTRY.load_full();
    if let Some(entry) = snapshot.get(&TypeId::of::<T>()) {
        return entry
            .clone()
            .downcast::<Codec<T>>()
            .map(|codec| (*codec).clone())
            .map_err(|_| Error::unsupported::<T>("codec registry holds a different type"));
    }

    let mut compiler = Compiler::with_snapshot(snapshot);
    let codec = compiler.compile::<T>()?;
    publish(compiler.finish());
    debug!("cached bencode codec for {}", type_name::<T>());
    Ok(codec)
}

/// Number of types with a cached codec.
pub fn cached_types() -> usize {
    REGISTRY.load().len()
}

fn publish(entries: Vec<(TypeId, Arc<dyn Any + Send + Sync>)>) {
    if entries.is_empty() {
        return;
    }

    let count = entries.len();
    REGISTRY.rcu(|current| {
        let mut next = CodecMap::clone(current);
        next.reserve(entries.len());
        for (id, entry) in &entries {
            next.insert(*id, entry.clone());
        }
        next
    });
    debug!("published {} bencode codecs", count);
}
