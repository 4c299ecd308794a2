// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Type-specialized access for a consuming compiler.
//!
//! A call site binds a [`TypedAccess`] descriptor against the storage it
//! observed, caches it, and from then on reads and writes through it with no
//! boxing and a single tag-plus-bounds check. When the array's
//! representation moves on, every use signals [`RepresentationMismatch`]
//! instead of returning a misinterpreted value; the consumer drops the
//! descriptor, re-binds against the current storage, and retries. A
//! mismatch never corrupts the storage.

use crate::error::RepresentationMismatch;
use crate::kind::ElementKind;
use crate::storage::ElementsStorage;
use crate::value::Value;

/// Opaque call-site correlation token for optimistic reads. The engine
/// threads it through to the failure signal and never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramPoint(pub u64);

/// Largest integer magnitude a float64 mantissa holds exactly. Optimistic
/// int64→float64 reads widen only below this bound; exact-but-larger values
/// are conservatively deoptimized.
const MAX_EXACT_INT64_IN_FLOAT64: u64 = 1 << 53;

/// A call-site-bound accessor descriptor: one element kind, revalidated
/// against the storage on every use. A value type the consumer caches, not
/// a borrow of engine internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedAccess {
    kind: ElementKind,
}

/// The dense kind of `storage`, if it is plain dense storage. Filters and
/// sparse storage are not eligible for specialized access.
fn dense_kind(storage: &ElementsStorage) -> Option<ElementKind> {
    match storage {
        ElementsStorage::Int32(_) => Some(ElementKind::Int32),
        ElementsStorage::Int64(_) => Some(ElementKind::Int64),
        ElementsStorage::Float64(_) => Some(ElementKind::Float64),
        ElementsStorage::Object(_) => Some(ElementKind::Object),
        _ => None,
    }
}

impl TypedAccess {
    /// Bind against the storage's current representation. `None` when the
    /// storage is filtered or sparse; such arrays take the general path.
    pub fn bind(storage: &ElementsStorage) -> Option<TypedAccess> {
        dense_kind(storage).map(|kind| TypedAccess { kind })
    }

    #[inline]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    fn mismatch(&self, expected: ElementKind, storage: &ElementsStorage) -> RepresentationMismatch {
        RepresentationMismatch::new(expected, storage.kind())
    }

    pub fn get_int32(
        &self,
        storage: &ElementsStorage,
        index: u64,
    ) -> Result<i32, RepresentationMismatch> {
        match storage {
            ElementsStorage::Int32(d) if self.kind == ElementKind::Int32 => d
                .get(index)
                .map_err(|_| self.mismatch(ElementKind::Int32, storage)),
            _ => Err(self.mismatch(ElementKind::Int32, storage)),
        }
    }

    pub fn get_int64(
        &self,
        storage: &ElementsStorage,
        index: u64,
    ) -> Result<i64, RepresentationMismatch> {
        match storage {
            ElementsStorage::Int64(d) if self.kind == ElementKind::Int64 => d
                .get(index)
                .map_err(|_| self.mismatch(ElementKind::Int64, storage)),
            _ => Err(self.mismatch(ElementKind::Int64, storage)),
        }
    }

    pub fn get_float64(
        &self,
        storage: &ElementsStorage,
        index: u64,
    ) -> Result<f64, RepresentationMismatch> {
        match storage {
            ElementsStorage::Float64(d) if self.kind == ElementKind::Float64 => d
                .get(index)
                .map_err(|_| self.mismatch(ElementKind::Float64, storage)),
            _ => Err(self.mismatch(ElementKind::Float64, storage)),
        }
    }

    pub fn get_value(
        &self,
        storage: &ElementsStorage,
        index: u64,
    ) -> Result<Value, RepresentationMismatch> {
        match storage {
            ElementsStorage::Object(d) if self.kind == ElementKind::Object => d
                .get(index)
                .map_err(|_| self.mismatch(ElementKind::Object, storage)),
            _ => Err(self.mismatch(ElementKind::Object, storage)),
        }
    }

    pub fn set_int32(
        &self,
        storage: &mut ElementsStorage,
        index: u64,
        value: i32,
    ) -> Result<(), RepresentationMismatch> {
        match storage {
            ElementsStorage::Int32(d) if self.kind == ElementKind::Int32 => {
                if d.has(index) {
                    d.set(index, value);
                    Ok(())
                } else if index == d.len() && index < d.capacity() {
                    // In-place append into spare capacity stays on the fast
                    // path; growth relinks through the general path.
                    d.push(value);
                    Ok(())
                } else {
                    Err(RepresentationMismatch::new(
                        ElementKind::Int32,
                        ElementKind::Int32,
                    ))
                }
            }
            _ => Err(self.mismatch(ElementKind::Int32, storage)),
        }
    }

    pub fn set_int64(
        &self,
        storage: &mut ElementsStorage,
        index: u64,
        value: i64,
    ) -> Result<(), RepresentationMismatch> {
        match storage {
            ElementsStorage::Int64(d) if self.kind == ElementKind::Int64 => {
                if d.has(index) {
                    d.set(index, value);
                    Ok(())
                } else if index == d.len() && index < d.capacity() {
                    d.push(value);
                    Ok(())
                } else {
                    Err(RepresentationMismatch::new(
                        ElementKind::Int64,
                        ElementKind::Int64,
                    ))
                }
            }
            _ => Err(self.mismatch(ElementKind::Int64, storage)),
        }
    }

    pub fn set_float64(
        &self,
        storage: &mut ElementsStorage,
        index: u64,
        value: f64,
    ) -> Result<(), RepresentationMismatch> {
        match storage {
            ElementsStorage::Float64(d) if self.kind == ElementKind::Float64 => {
                if d.has(index) {
                    d.set(index, value);
                    Ok(())
                } else if index == d.len() && index < d.capacity() {
                    d.push(value);
                    Ok(())
                } else {
                    Err(RepresentationMismatch::new(
                        ElementKind::Float64,
                        ElementKind::Float64,
                    ))
                }
            }
            _ => Err(self.mismatch(ElementKind::Float64, storage)),
        }
    }

    pub fn set_value(
        &self,
        storage: &mut ElementsStorage,
        index: u64,
        value: Value,
    ) -> Result<(), RepresentationMismatch> {
        match storage {
            ElementsStorage::Object(d) if self.kind == ElementKind::Object => {
                if d.has(index) {
                    d.set(index, value);
                    Ok(())
                } else if index == d.len() && index < d.capacity() {
                    d.push(value);
                    Ok(())
                } else {
                    Err(RepresentationMismatch::new(
                        ElementKind::Object,
                        ElementKind::Object,
                    ))
                }
            }
            _ => Err(self.mismatch(ElementKind::Object, storage)),
        }
    }

    // Optimistic reads: return the element widened to the requested numeric
    // kind when that widening is lossless, else deoptimize carrying the
    // caller's token. Never lies about the outcome.

    pub fn get_int32_optimistic(
        &self,
        storage: &ElementsStorage,
        index: u64,
        point: ProgramPoint,
    ) -> Result<i32, RepresentationMismatch> {
        match storage {
            ElementsStorage::Int32(d) if self.kind == ElementKind::Int32 => d
                .get(index)
                .map_err(|_| RepresentationMismatch::at(ElementKind::Int32, ElementKind::Int32, point)),
            _ => Err(RepresentationMismatch::at(
                ElementKind::Int32,
                storage.kind(),
                point,
            )),
        }
    }

    pub fn get_int64_optimistic(
        &self,
        storage: &ElementsStorage,
        index: u64,
        point: ProgramPoint,
    ) -> Result<i64, RepresentationMismatch> {
        let fail = |found| RepresentationMismatch::at(ElementKind::Int64, found, point);
        match storage {
            ElementsStorage::Int32(d) if self.kind == ElementKind::Int32 => d
                .get(index)
                .map(i64::from)
                .map_err(|_| fail(ElementKind::Int32)),
            ElementsStorage::Int64(d) if self.kind == ElementKind::Int64 => {
                d.get(index).map_err(|_| fail(ElementKind::Int64))
            }
            _ => Err(fail(storage.kind())),
        }
    }

    pub fn get_float64_optimistic(
        &self,
        storage: &ElementsStorage,
        index: u64,
        point: ProgramPoint,
    ) -> Result<f64, RepresentationMismatch> {
        let fail = |found| RepresentationMismatch::at(ElementKind::Float64, found, point);
        match storage {
            ElementsStorage::Int32(d) if self.kind == ElementKind::Int32 => d
                .get(index)
                .map(f64::from)
                .map_err(|_| fail(ElementKind::Int32)),
            ElementsStorage::Int64(d) if self.kind == ElementKind::Int64 => {
                let v = d.get(index).map_err(|_| fail(ElementKind::Int64))?;
                if v.unsigned_abs() <= MAX_EXACT_INT64_IN_FLOAT64 {
                    Ok(v as f64)
                } else {
                    Err(fail(ElementKind::Int64))
                }
            }
            ElementsStorage::Float64(d) if self.kind == ElementKind::Float64 => {
                d.get(index).map_err(|_| fail(ElementKind::Float64))
            }
            _ => Err(fail(storage.kind())),
        }
    }
}
