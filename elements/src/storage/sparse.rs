// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sparse fallback storage.
//!
//! Reached when a write addresses an index past the dense threshold. Backed
//! by an ordered index→value map; absent keys read as undefined. Length is
//! decoupled from population: it tracks the highest set index + 1 or an
//! explicitly assigned larger value, mirroring the language's array-length
//! semantics.

use std::collections::BTreeMap;

use crate::growth::GrowthPolicy;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct SparseElements {
    entries: BTreeMap<u64, Value>,
    length: u64,
    policy: GrowthPolicy,
}

impl SparseElements {
    pub fn new(policy: GrowthPolicy) -> Self {
        SparseElements {
            entries: BTreeMap::new(),
            length: 0,
            policy,
        }
    }

    pub(crate) fn with_length(policy: GrowthPolicy, length: u64) -> Self {
        SparseElements {
            entries: BTreeMap::new(),
            length,
            policy,
        }
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub(crate) fn policy(&self) -> GrowthPolicy {
        self.policy
    }

    /// Number of populated indices, for diagnostics and extraction.
    pub fn populated(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: u64) -> Value {
        self.entries.get(&index).cloned().unwrap_or(Value::Undefined)
    }

    #[inline]
    pub fn has(&self, index: u64) -> bool {
        self.entries.contains_key(&index)
    }

    pub fn set(&mut self, index: u64, value: Value) {
        self.entries.insert(index, value);
        self.length = self.length.max(index + 1);
    }

    /// Remove a key outright. Sparse storage needs no deletion filter; an
    /// absent key already reads as undefined.
    pub fn delete(&mut self, index: u64) {
        self.entries.remove(&index);
    }

    pub fn delete_range(&mut self, from: u64, to: u64) {
        // Inclusive range, matching the filter mask convention.
        let keys: Vec<u64> = self.entries.range(from..=to).map(|(k, _)| *k).collect();
        for key in keys {
            self.entries.remove(&key);
        }
    }

    /// Raise the reported length without populating anything.
    pub fn ensure(&mut self, index: u64) {
        self.length = self.length.max(index + 1);
    }

    /// Assign the length directly. Shrinking releases every key at or past
    /// the new length.
    pub fn set_length(&mut self, new_length: u64) {
        if new_length < self.length {
            self.entries.split_off(&new_length);
        }
        self.length = new_length;
    }

    pub fn push(&mut self, value: Value) -> u64 {
        let index = self.length;
        self.set(index, value);
        self.length
    }

    pub fn pop(&mut self) -> Value {
        if self.length == 0 {
            return Value::Undefined;
        }
        let last = self.length - 1;
        let value = self.entries.remove(&last).unwrap_or(Value::Undefined);
        self.length = last;
        value
    }

    pub fn shift_left(&mut self, by: u64) {
        if by == 0 {
            return;
        }
        self.entries = core::mem::take(&mut self.entries)
            .into_iter()
            .filter_map(|(k, v)| k.checked_sub(by).map(|k| (k, v)))
            .collect();
        self.length = self.length.saturating_sub(by);
    }

    pub fn shift_right(&mut self, by: u64) {
        if by == 0 {
            return;
        }
        self.entries = core::mem::take(&mut self.entries)
            .into_iter()
            .map(|(k, v)| (k + by, v))
            .collect();
        self.length += by;
    }

    /// Defensive copy of `[from, to)`, rebased to zero. Stays sparse; the
    /// caller decides whether a dense re-materialization is worth it.
    pub fn slice(&self, from: u64, to: u64) -> Self {
        let to = to.min(self.length);
        let from = from.min(to);
        let entries = self
            .entries
            .range(from..to)
            .map(|(k, v)| (k - from, v.clone()))
            .collect();
        SparseElements {
            entries,
            length: to - from,
            policy: self.policy,
        }
    }

}
