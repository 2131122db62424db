//! Indirections: `Option`, the smart pointers and `RefCell`.
//!
//! `Option<T>` is the only nil-able indirection. Pointers are transparent and
//! take the kind of their pointee, so `Option<Box<T>>` is a single level.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use super::{Bencode, Codec, Compiler, Kind};
use crate::error::{Error, Result};

impl<T: Bencode + Default> Bencode for Option<T> {
    fn compile(c: &mut Compiler) -> Result<Codec<Self>> {
        let inner = c.compile::<T>()?;
        if inner.kind() == Kind::Indirect {
            return Err(Error::unsupported::<Self>(
                "nested optional values have no bencode representation",
            ));
        }
        let decoder = inner.clone();
        let name = inner.type_name();

        Ok(Codec::new(
            Kind::Indirect,
            move |ctx, value: &Option<T>| {
                let Some(value) = value else {
                    return Err(Error::NilPointer { type_name: name });
                };
                ctx.enter_ref(None, name)?;
                inner.encode(ctx, value)?;
                ctx.leave_ref(None);
                Ok(())
            },
            move |buf, cursor, depth, value: &mut Option<T>| {
                decoder.decode(buf, cursor, depth, value.get_or_insert_with(T::default))
            },
            |value: &Option<T>| value.is_none(),
        ))
    }
}

/// Address of a heap pointee, or `None` when it has no identity of its own.
fn identity<T>(pointee: &T) -> Option<usize> {
    if std::mem::size_of::<T>() == 0 {
        return None;
    }
    Some(pointee as *const T as usize)
}

/// Codec for a pointer type `P` that owns or shares a `T`.
///
/// Encoding records the pointee's address so that a value reachable from
/// itself is reported instead of recursing forever.
fn pointer<P, T, D>(inner: Codec<T>, decode: D) -> Codec<P>
where
    P: std::ops::Deref<Target = T> + 'static,
    T: 'static,
    D: Fn(&Codec<T>, &[u8], usize, usize, &mut P) -> Result<usize> + Send + Sync + 'static,
{
    let (encoder, zero) = (inner.clone(), inner.clone());
    let name = inner.type_name();
    Codec::new(
        inner.kind(),
        move |ctx, value: &P| {
            let addr = identity::<T>(value);
            ctx.enter_ref(addr, name)?;
            encoder.encode(ctx, value)?;
            ctx.leave_ref(addr);
            Ok(())
        },
        move |buf, cursor, depth, value: &mut P| decode(&inner, buf, cursor, depth, value),
        move |value: &P| zero.is_zero(value),
    )
}

impl<T: Bencode> Bencode for Box<T> {
    fn compile(c: &mut Compiler) -> Result<Codec<Self>> {
        let inner = c.compile::<T>()?;
        Ok(pointer(inner, |inner, buf, cursor, depth, value: &mut Box<T>| {
            inner.decode(buf, cursor, depth, value)
        }))
    }
}

/// A shared pointee is decoded in place when this is its only handle and
/// replaced with a fresh value otherwise.
impl<T: Bencode + Default> Bencode for Rc<T> {
    fn compile(c: &mut Compiler) -> Result<Codec<Self>> {
        let inner = c.compile::<T>()?;
        Ok(pointer(inner, |inner, buf, cursor, depth, value: &mut Rc<T>| {
            if let Some(target) = Rc::get_mut(value) {
                return inner.decode(buf, cursor, depth, target);
            }
            let mut fresh = T::default();
            let next = inner.decode(buf, cursor, depth, &mut fresh)?;
            *value = Rc::new(fresh);
            Ok(next)
        }))
    }
}

impl<T: Bencode + Default> Bencode for Arc<T> {
    fn compile(c: &mut Compiler) -> Result<Codec<Self>> {
        let inner = c.compile::<T>()?;
        Ok(pointer(inner, |inner, buf, cursor, depth, value: &mut Arc<T>| {
            if let Some(target) = Arc::get_mut(value) {
                return inner.decode(buf, cursor, depth, target);
            }
            let mut fresh = T::default();
            let next = inner.decode(buf, cursor, depth, &mut fresh)?;
            *value = Arc::new(fresh);
            Ok(next)
        }))
    }
}

/// Encoding takes a shared borrow, so a cell that is mutably borrowed at the
/// time fails with [`Error::Borrowed`].
impl<T: Bencode> Bencode for RefCell<T> {
    fn compile(c: &mut Compiler) -> Result<Codec<Self>> {
        let inner = c.compile::<T>()?;
        let (decoder, zero) = (inner.clone(), inner.clone());
        let name = inner.type_name();
        Ok(Codec::new(
            inner.kind(),
            move |ctx, value: &RefCell<T>| {
                let guard = value
                    .try_borrow()
                    .map_err(|_| Error::Borrowed { type_name: name })?;
                inner.encode(ctx, &guard)
            },
            move |buf, cursor, depth, value: &mut RefCell<T>| {
                decoder.decode(buf, cursor, depth, value.get_mut())
            },
            move |value: &RefCell<T>| value.try_borrow().is_ok_and(|guard| zero.is_zero(&guard)),
        ))
    }
}
