// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Filter decorators.
//!
//! Both filters wrap an owned storage and forward everything outside their
//! concern. Deletion and undefined-writes must be cheap: neither shifts the
//! wrapped buffer nor dedicates a bit pattern to "hole"; they mask indices
//! from the outside instead.

use ahash::AHashSet;
use tracing::trace;

use crate::kind::ElementKind;
use crate::storage::ElementsStorage;
use crate::value::Value;

/// Masks an inclusive index range as absent, regardless of what the wrapped
/// buffer holds there. A write into the range un-deletes that index. The
/// reported length may exceed the wrapped storage's length when a tail range
/// was deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedRangeFilter {
    underlying: Box<ElementsStorage>,
    /// Inclusive mask; `from > to` encodes the empty mask.
    from: u64,
    to: u64,
    length: u64,
}

impl DeletedRangeFilter {
    pub(crate) fn new(underlying: ElementsStorage, from: u64, to: u64) -> Self {
        debug_assert!(from <= to);
        trace!(target: "elements", from, to, "masking deleted range");
        let length = underlying.len().max(to + 1);
        DeletedRangeFilter {
            underlying: Box::new(underlying),
            from,
            to,
            length,
        }
    }

    pub fn underlying(&self) -> &ElementsStorage {
        &self.underlying
    }

    /// The currently masked range, if any.
    pub fn masked_range(&self) -> Option<(u64, u64)> {
        (self.from <= self.to).then_some((self.from, self.to))
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub(crate) fn kind(&self) -> ElementKind {
        self.underlying.kind()
    }

    #[inline]
    fn masked(&self, index: u64) -> bool {
        self.from <= index && index <= self.to
    }

    fn clear_mask(&mut self) {
        self.from = 1;
        self.to = 0;
    }

    pub fn get(&self, index: u64) -> Value {
        if self.masked(index) {
            Value::Undefined
        } else {
            self.underlying.get(index)
        }
    }

    pub fn has(&self, index: u64) -> bool {
        !self.masked(index) && self.underlying.has(index)
    }

    /// True if the new range can be absorbed into the existing mask.
    pub(crate) fn can_merge(&self, from: u64, to: u64) -> bool {
        self.from > self.to || (from <= self.to.saturating_add(1) && to + 1 >= self.from)
    }

    pub(crate) fn merge(&mut self, from: u64, to: u64) {
        debug_assert!(self.can_merge(from, to));
        if self.from > self.to {
            self.from = from;
            self.to = to;
        } else {
            self.from = self.from.min(from);
            self.to = self.to.max(to);
        }
        self.length = self.length.max(to + 1);
    }

    /// Extend the mask over a gap about to be zero-filled in the wrapped
    /// storage, so the fill never becomes readable. Merges when the gap
    /// touches the current mask, nests a fresh filter otherwise.
    fn mask_gap(&mut self, from: u64, to: u64) {
        if self.can_merge(from, to) {
            self.merge(from, to);
        } else {
            let underlying = core::mem::take(&mut self.underlying);
            self.underlying = Box::new(ElementsStorage::Deleted(DeletedRangeFilter::new(
                *underlying,
                from,
                to,
            )));
        }
    }

    /// Collapse to the wrapped storage once the filter masks nothing.
    fn normalized(self) -> ElementsStorage {
        if self.from > self.to && self.length == self.underlying.len() {
            trace!(target: "elements", "deleted-range filter emptied, unwrapping");
            *self.underlying
        } else {
            ElementsStorage::Deleted(self)
        }
    }

    pub(crate) fn set(mut self, index: u64, value: Value) -> ElementsStorage {
        if self.masked(index) {
            // The write un-deletes this index.
            if self.from == self.to {
                self.clear_mask();
            } else if index == self.from {
                self.from += 1;
            } else if index == self.to {
                self.to -= 1;
            } else {
                // Splitting the range: the inner filter keeps the upper half.
                let underlying = core::mem::take(&mut self.underlying);
                let mut inner = DeletedRangeFilter::new(*underlying, index + 1, self.to);
                inner.length = self.length;
                self.underlying = Box::new(ElementsStorage::Deleted(inner));
                self.to = index - 1;
            }
        }
        let underlying_len = self.underlying.len();
        if index > underlying_len {
            self.mask_gap(underlying_len, index - 1);
        }
        let underlying = core::mem::take(&mut self.underlying);
        self.underlying = Box::new(underlying.set(index, value));
        self.length = self.length.max(index + 1).max(self.underlying.len());
        self.normalized()
    }

    pub(crate) fn ensure(mut self, index: u64) -> Self {
        let underlying = core::mem::take(&mut self.underlying);
        self.underlying = Box::new(underlying.ensure(index));
        self.length = self.length.max(index + 1);
        self
    }

    pub(crate) fn pop(&mut self) -> Value {
        if self.length == 0 {
            return Value::Undefined;
        }
        let last = self.length - 1;
        let raw = if self.underlying.len() == self.length {
            self.underlying.pop()
        } else {
            Value::Undefined
        };
        let result = if self.masked(last) { Value::Undefined } else { raw };
        if self.from <= self.to && self.to >= last {
            if self.from >= last {
                self.clear_mask();
            } else {
                self.to = last - 1;
            }
        }
        self.length = last;
        result
    }

    pub(crate) fn shift_left(&mut self, by: u64) {
        if by == 0 {
            return;
        }
        self.underlying.shift_left(by);
        if self.from <= self.to {
            if self.to < by {
                self.clear_mask();
            } else {
                self.to -= by;
                self.from = self.from.saturating_sub(by);
            }
        }
        self.length = self.length.saturating_sub(by);
    }

    pub(crate) fn shift_right(mut self, by: u64) -> Self {
        if by == 0 {
            return self;
        }
        let underlying = core::mem::take(&mut self.underlying);
        self.underlying = Box::new(underlying.shift_right(by));
        if self.from <= self.to {
            self.from += by;
            self.to += by;
        }
        self.length += by;
        self
    }

    pub(crate) fn shrink(mut self, new_length: u64) -> ElementsStorage {
        let underlying = core::mem::take(&mut self.underlying);
        self.underlying = Box::new(underlying.shrink(new_length));
        if self.from <= self.to && self.to >= new_length {
            if self.from >= new_length {
                self.clear_mask();
            } else if new_length > 0 {
                self.to = new_length - 1;
            }
        }
        self.length = self.length.min(new_length);
        self.normalized()
    }

    pub(crate) fn convert(mut self, kind: ElementKind) -> Self {
        let underlying = core::mem::take(&mut self.underlying);
        self.underlying = Box::new(underlying.convert(kind));
        self
    }
}

/// Represents writes of the undefined sentinel into numeric storage as
/// holes, so an all-int array surviving one `undefined` write keeps its
/// int buffer. The wrapped slot's stale value is never readable.
#[derive(Debug, Clone, PartialEq)]
pub struct UndefinedFilter {
    underlying: Box<ElementsStorage>,
    holes: AHashSet<u64>,
}

impl UndefinedFilter {
    pub(crate) fn new(underlying: ElementsStorage) -> Self {
        trace!(target: "elements", kind = %underlying.kind(), "wrapping undefined-hole filter");
        UndefinedFilter {
            underlying: Box::new(underlying),
            holes: AHashSet::new(),
        }
    }

    pub fn underlying(&self) -> &ElementsStorage {
        &self.underlying
    }

    /// True if `index` holds the undefined sentinel rather than a real
    /// element of the wrapped kind.
    pub fn is_hole(&self, index: u64) -> bool {
        self.holes.contains(&index)
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.underlying.len()
    }

    pub fn is_empty(&self) -> bool {
        self.underlying.len() == 0
    }

    pub(crate) fn kind(&self) -> ElementKind {
        self.underlying.kind()
    }

    pub fn get(&self, index: u64) -> Value {
        if self.holes.contains(&index) {
            Value::Undefined
        } else {
            self.underlying.get(index)
        }
    }

    pub fn has(&self, index: u64) -> bool {
        // A hole is a present element whose value is undefined, unlike a
        // deleted index.
        self.underlying.has(index)
    }

    fn normalized(self) -> ElementsStorage {
        if self.holes.is_empty() {
            trace!(target: "elements", "undefined-hole filter emptied, unwrapping");
            *self.underlying
        } else {
            ElementsStorage::Undefined(self)
        }
    }

    pub(crate) fn set(mut self, index: u64, value: Value) -> ElementsStorage {
        let underlying = core::mem::take(&mut self.underlying);
        if value.is_undefined() {
            // Keep the slot reserved in the wrapped buffer, mark it a hole.
            self.underlying = Box::new(if index >= underlying.len() {
                underlying.ensure(index)
            } else {
                *underlying
            });
            self.holes.insert(index);
            ElementsStorage::Undefined(self)
        } else {
            self.holes.remove(&index);
            self.underlying = Box::new(underlying.set(index, value));
            self.normalized()
        }
    }

    pub(crate) fn ensure(mut self, index: u64) -> Self {
        let underlying = core::mem::take(&mut self.underlying);
        self.underlying = Box::new(underlying.ensure(index));
        self
    }

    pub(crate) fn pop(&mut self) -> Value {
        let len = self.underlying.len();
        if len == 0 {
            return Value::Undefined;
        }
        let last = len - 1;
        let raw = self.underlying.pop();
        if self.holes.remove(&last) {
            Value::Undefined
        } else {
            raw
        }
    }

    pub(crate) fn shift_left(&mut self, by: u64) {
        if by == 0 {
            return;
        }
        self.underlying.shift_left(by);
        self.holes = self
            .holes
            .iter()
            .filter_map(|h| h.checked_sub(by))
            .collect();
    }

    pub(crate) fn shift_right(mut self, by: u64) -> Self {
        if by == 0 {
            return self;
        }
        let underlying = core::mem::take(&mut self.underlying);
        self.underlying = Box::new(underlying.shift_right(by));
        self.holes = self.holes.iter().map(|h| h + by).collect();
        self
    }

    pub(crate) fn shrink(mut self, new_length: u64) -> ElementsStorage {
        let underlying = core::mem::take(&mut self.underlying);
        self.underlying = Box::new(underlying.shrink(new_length));
        self.holes.retain(|h| *h < new_length);
        self.normalized()
    }

    /// Widening to Object materializes every hole as a stored undefined and
    /// drops the filter; numeric widenings keep it.
    pub(crate) fn convert(mut self, kind: ElementKind) -> ElementsStorage {
        let underlying = core::mem::take(&mut self.underlying);
        if kind == ElementKind::Object {
            let mut converted = underlying.convert(ElementKind::Object);
            for hole in self.holes.drain() {
                converted = converted.set(hole, Value::Undefined);
            }
            converted
        } else {
            self.underlying = Box::new(underlying.convert(kind));
            ElementsStorage::Undefined(self)
        }
    }
}
