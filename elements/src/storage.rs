// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The storage capability set.
//!
//! Exactly one `ElementsStorage` is live per language array. Operations that
//! can change the representation take the storage by value and return the
//! replacement; the owner re-binds its reference on every such call. A
//! returned storage is a full hand-off: the consumed instance no longer
//! exists and cannot be mutated behind the array's back.

pub mod dense;
pub mod filters;
pub mod sparse;

use tracing::trace;

use crate::error::UnsupportedRepresentation;
use crate::growth::GrowthPolicy;
use crate::kind::ElementKind;
use crate::value::Value;

use dense::{DenseElement, DenseElements, Int32Elements, ObjectElements};
use filters::{DeletedRangeFilter, UndefinedFilter};
use sparse::SparseElements;

/// Backing data extracted as one homogeneous buffer, for duplication and
/// typed-array style consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedBuffer {
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Object(Vec<Value>),
}

/// The closed set of array storage representations.
///
/// Four dense variants, the sparse fallback, and two filter decorators.
/// New arrays start as Int32 storage and only ever widen.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementsStorage {
    Int32(dense::Int32Elements),
    Int64(dense::Int64Elements),
    Float64(dense::Float64Elements),
    Object(dense::ObjectElements),
    Sparse(sparse::SparseElements),
    Deleted(filters::DeletedRangeFilter),
    Undefined(filters::UndefinedFilter),
}

impl Default for ElementsStorage {
    /// Empty int storage; allocation is deferred to the first write.
    fn default() -> Self {
        ElementsStorage::Int32(DenseElements::from_vec(Vec::new(), GrowthPolicy::default()))
    }
}

impl ElementsStorage {
    pub fn new(policy: GrowthPolicy) -> Self {
        ElementsStorage::Int32(Int32Elements::new(policy))
    }

    /// Allocate storage for a known value list, picking the narrowest kind
    /// that represents every element.
    pub fn from_values(values: &[Value], policy: GrowthPolicy) -> Self {
        let kind = values
            .iter()
            .fold(ElementKind::Int32, |k, v| k.union(v.required_kind()));
        match kind {
            ElementKind::Int32 => ElementsStorage::Int32(DenseElements::from_vec(
                values.iter().map(Value::to_int32).collect(),
                policy,
            )),
            ElementKind::Int64 => ElementsStorage::Int64(DenseElements::from_vec(
                values.iter().map(Value::to_int64).collect(),
                policy,
            )),
            ElementKind::Float64 => ElementsStorage::Float64(DenseElements::from_vec(
                values.iter().map(Value::to_float64).collect(),
                policy,
            )),
            ElementKind::Object => {
                ElementsStorage::Object(DenseElements::from_vec(values.to_vec(), policy))
            }
        }
    }

    pub fn policy(&self) -> GrowthPolicy {
        match self {
            ElementsStorage::Int32(d) => d.policy(),
            ElementsStorage::Int64(d) => d.policy(),
            ElementsStorage::Float64(d) => d.policy(),
            ElementsStorage::Object(d) => d.policy(),
            ElementsStorage::Sparse(s) => s.policy(),
            ElementsStorage::Deleted(f) => f.underlying().policy(),
            ElementsStorage::Undefined(f) => f.underlying().policy(),
        }
    }

    /// The element kind this storage holds. Filters report the wrapped
    /// kind; sparse storage holds boxed values.
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementsStorage::Int32(_) => ElementKind::Int32,
            ElementsStorage::Int64(_) => ElementKind::Int64,
            ElementsStorage::Float64(_) => ElementKind::Float64,
            ElementsStorage::Object(_) => ElementKind::Object,
            ElementsStorage::Sparse(_) => ElementKind::Object,
            ElementsStorage::Deleted(f) => f.kind(),
            ElementsStorage::Undefined(f) => f.kind(),
        }
    }

    pub fn len(&self) -> u64 {
        match self {
            ElementsStorage::Int32(d) => d.len(),
            ElementsStorage::Int64(d) => d.len(),
            ElementsStorage::Float64(d) => d.len(),
            ElementsStorage::Object(d) => d.len(),
            ElementsStorage::Sparse(s) => s.len(),
            ElementsStorage::Deleted(f) => f.len(),
            ElementsStorage::Undefined(f) => f.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total read: out-of-range and masked indices read as undefined.
    pub fn get(&self, index: u64) -> Value {
        match self {
            ElementsStorage::Int32(d) => d
                .get(index)
                .map(DenseElement::into_value)
                .unwrap_or(Value::Undefined),
            ElementsStorage::Int64(d) => d
                .get(index)
                .map(DenseElement::into_value)
                .unwrap_or(Value::Undefined),
            ElementsStorage::Float64(d) => d
                .get(index)
                .map(DenseElement::into_value)
                .unwrap_or(Value::Undefined),
            ElementsStorage::Object(d) => d.get(index).unwrap_or(Value::Undefined),
            ElementsStorage::Sparse(s) => s.get(index),
            ElementsStorage::Deleted(f) => f.get(index),
            ElementsStorage::Undefined(f) => f.get(index),
        }
    }

    pub fn has(&self, index: u64) -> bool {
        match self {
            ElementsStorage::Int32(d) => d.has(index),
            ElementsStorage::Int64(d) => d.has(index),
            ElementsStorage::Float64(d) => d.has(index),
            ElementsStorage::Object(d) => d.has(index),
            ElementsStorage::Sparse(s) => s.has(index),
            ElementsStorage::Deleted(f) => f.has(index),
            ElementsStorage::Undefined(f) => f.has(index),
        }
    }

    /// Write `value` at `index`, returning the storage that now represents
    /// the array. In-place when the value fits the current representation;
    /// otherwise the conversion protocol or a filter wrap produces the
    /// replacement. A write past the end masks the skipped gap before it can
    /// ever read as zeros.
    pub fn set(self, index: u64, value: Value) -> Self {
        if !self.policy().fits_dense(index) && !matches!(self, ElementsStorage::Sparse(_)) {
            let mut sparse = self.into_sparse(index + 1);
            sparse.set(index, value);
            return ElementsStorage::Sparse(sparse);
        }
        let len = self.len();
        if index > len {
            return self
                .ensure(index)
                .delete_range(len, index - 1)
                .set(index, value);
        }
        match self {
            ElementsStorage::Int32(mut d) => {
                if let Some(v) = <i32 as DenseElement>::from_value(&value) {
                    d.set(index, v);
                    ElementsStorage::Int32(d)
                } else if value.is_undefined() {
                    UndefinedFilter::new(ElementsStorage::Int32(d)).set(index, value)
                } else {
                    let target = ElementKind::Int32.union(value.required_kind());
                    ElementsStorage::Int32(d).convert(target).set(index, value)
                }
            }
            ElementsStorage::Int64(mut d) => {
                if let Some(v) = <i64 as DenseElement>::from_value(&value) {
                    d.set(index, v);
                    ElementsStorage::Int64(d)
                } else if value.is_undefined() {
                    UndefinedFilter::new(ElementsStorage::Int64(d)).set(index, value)
                } else {
                    let target = ElementKind::Int64.union(value.required_kind());
                    ElementsStorage::Int64(d).convert(target).set(index, value)
                }
            }
            ElementsStorage::Float64(mut d) => {
                if let Some(v) = <f64 as DenseElement>::from_value(&value) {
                    d.set(index, v);
                    ElementsStorage::Float64(d)
                } else if value.is_undefined() {
                    UndefinedFilter::new(ElementsStorage::Float64(d)).set(index, value)
                } else {
                    ElementsStorage::Float64(d)
                        .convert(ElementKind::Object)
                        .set(index, value)
                }
            }
            ElementsStorage::Object(mut d) => {
                d.set(index, value);
                ElementsStorage::Object(d)
            }
            ElementsStorage::Sparse(mut s) => {
                s.set(index, value);
                ElementsStorage::Sparse(s)
            }
            ElementsStorage::Deleted(f) => f.set(index, value),
            ElementsStorage::Undefined(f) => f.set(index, value),
        }
    }

    /// Grow so that a following `set(index, _)` cannot fail for capacity
    /// reasons; converts to sparse past the dense threshold. Idempotent.
    /// Extended dense slots hold the kind's zero; `set` is the entry point
    /// that masks gaps.
    pub fn ensure(self, index: u64) -> Self {
        if !self.policy().fits_dense(index) {
            if let ElementsStorage::Sparse(mut s) = self {
                s.ensure(index);
                return ElementsStorage::Sparse(s);
            }
            return ElementsStorage::Sparse(self.into_sparse(index + 1));
        }
        match self {
            ElementsStorage::Int32(mut d) => {
                d.ensure(index);
                ElementsStorage::Int32(d)
            }
            ElementsStorage::Int64(mut d) => {
                d.ensure(index);
                ElementsStorage::Int64(d)
            }
            ElementsStorage::Float64(mut d) => {
                d.ensure(index);
                ElementsStorage::Float64(d)
            }
            ElementsStorage::Object(mut d) => {
                d.ensure(index);
                ElementsStorage::Object(d)
            }
            ElementsStorage::Sparse(mut s) => {
                s.ensure(index);
                ElementsStorage::Sparse(s)
            }
            ElementsStorage::Deleted(f) => ElementsStorage::Deleted(f.ensure(index)),
            ElementsStorage::Undefined(f) => ElementsStorage::Undefined(f.ensure(index)),
        }
    }

    /// Assign the array's `length`. Shrinking truncates and releases; growing
    /// masks the new tail so it reads as absent.
    pub fn set_length(self, new_length: u64) -> Self {
        let len = self.len();
        if new_length < len {
            return self.shrink(new_length);
        }
        if new_length == len {
            return self;
        }
        if !self.policy().fits_dense(new_length - 1) {
            let mut s = match self {
                ElementsStorage::Sparse(s) => s,
                other => other.into_sparse(0),
            };
            s.set_length(new_length);
            return ElementsStorage::Sparse(s);
        }
        match self {
            ElementsStorage::Sparse(mut s) => {
                s.set_length(new_length);
                ElementsStorage::Sparse(s)
            }
            other => other
                .ensure(new_length - 1)
                .delete_range(len, new_length - 1),
        }
    }

    /// Truncate to `new_length`, dropping the vacated slots (the Object
    /// variant releases the removed references). No-op when not shorter.
    pub fn shrink(self, new_length: u64) -> Self {
        match self {
            ElementsStorage::Int32(mut d) => {
                d.shrink(new_length);
                ElementsStorage::Int32(d)
            }
            ElementsStorage::Int64(mut d) => {
                d.shrink(new_length);
                ElementsStorage::Int64(d)
            }
            ElementsStorage::Float64(mut d) => {
                d.shrink(new_length);
                ElementsStorage::Float64(d)
            }
            ElementsStorage::Object(mut d) => {
                d.shrink(new_length);
                ElementsStorage::Object(d)
            }
            ElementsStorage::Sparse(mut s) => {
                if new_length < s.len() {
                    s.set_length(new_length);
                }
                ElementsStorage::Sparse(s)
            }
            ElementsStorage::Deleted(f) => f.shrink(new_length),
            ElementsStorage::Undefined(f) => f.shrink(new_length),
        }
    }

    /// Append. Amortized O(1) on dense storage; sparse storage falls back to
    /// the general set path.
    pub fn push(self, value: Value) -> Self {
        let len = self.len();
        self.set(len, value)
    }

    /// Remove and return the last element; undefined on empty storage. The
    /// vacated slot is cleared to the kind's zero.
    pub fn pop(&mut self) -> Value {
        match self {
            ElementsStorage::Int32(d) => d
                .pop()
                .map(DenseElement::into_value)
                .unwrap_or(Value::Undefined),
            ElementsStorage::Int64(d) => d
                .pop()
                .map(DenseElement::into_value)
                .unwrap_or(Value::Undefined),
            ElementsStorage::Float64(d) => d
                .pop()
                .map(DenseElement::into_value)
                .unwrap_or(Value::Undefined),
            ElementsStorage::Object(d) => d.pop().unwrap_or(Value::Undefined),
            ElementsStorage::Sparse(s) => s.pop(),
            ElementsStorage::Deleted(f) => f.pop(),
            ElementsStorage::Undefined(f) => f.pop(),
        }
    }

    /// Drop the first `by` elements and shift the rest down, shortening the
    /// length.
    pub fn shift_left(&mut self, by: u64) {
        match self {
            ElementsStorage::Int32(d) => d.shift_left(by),
            ElementsStorage::Int64(d) => d.shift_left(by),
            ElementsStorage::Float64(d) => d.shift_left(by),
            ElementsStorage::Object(d) => d.shift_left(by),
            ElementsStorage::Sparse(s) => s.shift_left(by),
            ElementsStorage::Deleted(f) => f.shift_left(by),
            ElementsStorage::Undefined(f) => f.shift_left(by),
        }
    }

    /// Open `by` slots at the front; may grow, and converts to sparse when
    /// the shifted last index crosses the dense threshold.
    pub fn shift_right(self, by: u64) -> Self {
        if by == 0 {
            return self;
        }
        let len = self.len();
        if len > 0 && !self.policy().fits_dense(len - 1 + by) {
            let mut s = match self {
                ElementsStorage::Sparse(s) => s,
                other => other.into_sparse(0),
            };
            s.shift_right(by);
            return ElementsStorage::Sparse(s);
        }
        match self {
            ElementsStorage::Int32(mut d) => {
                d.shift_right(by);
                ElementsStorage::Int32(d)
            }
            ElementsStorage::Int64(mut d) => {
                d.shift_right(by);
                ElementsStorage::Int64(d)
            }
            ElementsStorage::Float64(mut d) => {
                d.shift_right(by);
                ElementsStorage::Float64(d)
            }
            ElementsStorage::Object(mut d) => {
                d.shift_right(by);
                ElementsStorage::Object(d)
            }
            ElementsStorage::Sparse(mut s) => {
                s.shift_right(by);
                ElementsStorage::Sparse(s)
            }
            ElementsStorage::Deleted(f) => ElementsStorage::Deleted(f.shift_right(by)),
            ElementsStorage::Undefined(f) => ElementsStorage::Undefined(f.shift_right(by)),
        }
    }

    /// Remove `removed` elements at `start`, opening `inserted` slots in
    /// their place with one tail shift. Returns the removed elements as a
    /// storage of the same kind, `None` when nothing was removed.
    ///
    /// Only dense storage supports this fast path; filters and sparse
    /// storage signal `UnsupportedRepresentation` and the caller falls back
    /// to the general element-by-element path.
    pub fn splice(
        &mut self,
        start: u64,
        removed: u64,
        inserted: u64,
    ) -> Result<Option<ElementsStorage>, UnsupportedRepresentation> {
        match self {
            ElementsStorage::Int32(d) => {
                Ok(d.splice(start, removed, inserted)?.map(ElementsStorage::Int32))
            }
            ElementsStorage::Int64(d) => {
                Ok(d.splice(start, removed, inserted)?.map(ElementsStorage::Int64))
            }
            ElementsStorage::Float64(d) => Ok(d
                .splice(start, removed, inserted)?
                .map(ElementsStorage::Float64)),
            ElementsStorage::Object(d) => Ok(d
                .splice(start, removed, inserted)?
                .map(ElementsStorage::Object)),
            _ => Err(UnsupportedRepresentation),
        }
    }

    /// Defensive copy of `[from, to)`. A negative `from` counts back from the
    /// length. Filtered storage materializes as Object storage, with holes
    /// copied as undefined values.
    pub fn slice(&self, from: i64, to: u64) -> Self {
        let len = self.len();
        let start = if from < 0 {
            len.saturating_sub(from.unsigned_abs())
        } else {
            (from as u64).min(len)
        };
        let end = to.min(len).max(start);
        match self {
            ElementsStorage::Int32(d) => ElementsStorage::Int32(d.slice(start, end)),
            ElementsStorage::Int64(d) => ElementsStorage::Int64(d.slice(start, end)),
            ElementsStorage::Float64(d) => ElementsStorage::Float64(d.slice(start, end)),
            ElementsStorage::Object(d) => ElementsStorage::Object(d.slice(start, end)),
            ElementsStorage::Sparse(s) => ElementsStorage::Sparse(s.slice(start, end)),
            filtered => {
                let mut out = ObjectElements::new(filtered.policy());
                for index in start..end {
                    out.push(filtered.get(index));
                }
                ElementsStorage::Object(out)
            }
        }
    }

    /// Deep copy with an independently owned buffer.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// The conversion protocol: a total widening along
    /// Int32 → Int64 → Float64 → Object. Converting to the current kind (or
    /// a narrower one) is the identity; there is no narrowing. Filters
    /// convert their wrapped storage in place; sparse storage already holds
    /// boxed values.
    pub fn convert(self, kind: ElementKind) -> Self {
        match self {
            ElementsStorage::Int32(d) => match kind {
                ElementKind::Int32 => ElementsStorage::Int32(d),
                ElementKind::Int64 => widened(ElementsStorage::Int64(d.to_int64()), kind),
                ElementKind::Float64 => widened(ElementsStorage::Float64(d.to_float64()), kind),
                ElementKind::Object => widened(ElementsStorage::Object(d.to_object()), kind),
            },
            ElementsStorage::Int64(d) => match kind {
                ElementKind::Int32 | ElementKind::Int64 => ElementsStorage::Int64(d),
                ElementKind::Float64 => widened(ElementsStorage::Float64(d.to_float64()), kind),
                ElementKind::Object => widened(ElementsStorage::Object(d.to_object()), kind),
            },
            ElementsStorage::Float64(d) => match kind {
                ElementKind::Object => widened(ElementsStorage::Object(d.to_object()), kind),
                _ => ElementsStorage::Float64(d),
            },
            ElementsStorage::Object(d) => ElementsStorage::Object(d),
            ElementsStorage::Sparse(s) => ElementsStorage::Sparse(s),
            ElementsStorage::Deleted(f) => ElementsStorage::Deleted(f.convert(kind)),
            ElementsStorage::Undefined(f) => f.convert(kind),
        }
    }

    /// Mask `index` as absent. Non-destructive: the wrapped buffer keeps its
    /// slot, and a later write un-deletes it.
    pub fn delete(self, index: u64) -> Self {
        self.delete_range(index, index)
    }

    /// Mask the inclusive range `[from, to]` as absent. Sparse storage
    /// removes the keys outright; an existing range filter absorbs touching
    /// ranges, disjoint ranges nest.
    pub fn delete_range(self, from: u64, to: u64) -> Self {
        if from > to {
            return self;
        }
        // A range reaching past the end widens down to the current length,
        // so the mask stays contiguous with the bounds check and a later
        // buffer extension cannot surface unmasked zero fill.
        let from = if to >= self.len() {
            from.min(self.len())
        } else {
            from
        };
        match self {
            ElementsStorage::Sparse(mut s) => {
                s.delete_range(from, to);
                ElementsStorage::Sparse(s)
            }
            ElementsStorage::Deleted(mut f) if f.can_merge(from, to) => {
                f.merge(from, to);
                ElementsStorage::Deleted(f)
            }
            other => ElementsStorage::Deleted(DeletedRangeFilter::new(other, from, to)),
        }
    }

    /// Extract `[0, len)` as one homogeneous buffer of `kind`, coercing
    /// element-wise when `kind` is not the native kind. Always a copy.
    pub fn to_typed_buffer(&self, kind: ElementKind) -> TypedBuffer {
        match kind {
            ElementKind::Int32 => {
                if let ElementsStorage::Int32(d) = self {
                    return TypedBuffer::Int32(d.as_slice().to_vec());
                }
                TypedBuffer::Int32((0..self.len()).map(|i| self.get(i).to_int32()).collect())
            }
            ElementKind::Int64 => {
                if let ElementsStorage::Int64(d) = self {
                    return TypedBuffer::Int64(d.as_slice().to_vec());
                }
                TypedBuffer::Int64((0..self.len()).map(|i| self.get(i).to_int64()).collect())
            }
            ElementKind::Float64 => {
                if let ElementsStorage::Float64(d) = self {
                    return TypedBuffer::Float64(d.as_slice().to_vec());
                }
                TypedBuffer::Float64((0..self.len()).map(|i| self.get(i).to_float64()).collect())
            }
            ElementKind::Object => {
                if let ElementsStorage::Object(d) = self {
                    return TypedBuffer::Object(d.as_slice().to_vec());
                }
                TypedBuffer::Object((0..self.len()).map(|i| self.get(i)).collect())
            }
        }
    }

    /// Copy every populated index into a sparse storage. The sparse length
    /// is at least `min_length`.
    fn into_sparse(self, min_length: u64) -> SparseElements {
        trace!(
            target: "elements",
            len = self.len(),
            kind = %self.kind(),
            "promoting to sparse storage"
        );
        let mut sparse = SparseElements::with_length(self.policy(), self.len().max(min_length));
        for index in 0..self.len() {
            if self.has(index) {
                sparse.set(index, self.get(index));
            }
        }
        sparse
    }
}

fn widened(storage: ElementsStorage, to: ElementKind) -> ElementsStorage {
    trace!(target: "elements", to = %to, "widened dense storage");
    storage
}
