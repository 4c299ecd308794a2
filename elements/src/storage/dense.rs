// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dense, homogeneously-typed storage.
//!
//! One buffer, one element kind, logical length ≤ capacity. Every index in
//! `[0, len)` holds a valid element of the variant's kind; dense storage has
//! no holes by construction (holes are a filter's concern, gaps are masked
//! by the capability-set entry points before they reach a buffer).

use core::iter;

use num_traits::AsPrimitive;

use crate::error::{OutOfRange, UnsupportedRepresentation};
use crate::growth::GrowthPolicy;
use crate::kind::ElementKind;
use crate::value::{Value, double_is_int32, double_is_int64};

/// One storable element kind. Implemented by exactly the four dense kinds;
/// the trait is not nameable outside the crate.
pub trait DenseElement: Clone + PartialEq + core::fmt::Debug {
    const KIND: ElementKind;

    /// The value a vacated or implicitly extended slot holds.
    fn zero() -> Self;

    /// Exact-representation check: `Some` iff `value` fits this kind without
    /// loss (modulo the lattice's total Object embedding).
    fn from_value(value: &Value) -> Option<Self>;

    fn into_value(self) -> Value;
}

impl DenseElement for i32 {
    const KIND: ElementKind = ElementKind::Int32;

    fn zero() -> Self {
        0
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(v) => Some(*v),
            Value::Long(v) => i32::try_from(*v).ok(),
            Value::Number(v) if double_is_int32(*v) => Some(*v as i32),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Integer(self)
    }
}

impl DenseElement for i64 {
    const KIND: ElementKind = ElementKind::Int64;

    fn zero() -> Self {
        0
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            Value::Number(v) if double_is_int64(*v) => Some(*v as i64),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Long(self)
    }
}

impl DenseElement for f64 {
    const KIND: ElementKind = ElementKind::Float64;

    fn zero() -> Self {
        0.0
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(v) => Some(f64::from(*v)),
            // Total along the lattice: a long wider than 2^53 rounds, per
            // the runtime's numeric coercion.
            Value::Long(v) => Some(*v as f64),
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Number(self)
    }
}

impl DenseElement for Value {
    const KIND: ElementKind = ElementKind::Object;

    fn zero() -> Self {
        Value::Undefined
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }

    fn into_value(self) -> Value {
        self
    }
}

/// A contiguous buffer of one element kind plus its growth policy.
///
/// The buffer's own length is the logical length; spare capacity is reserved
/// ahead of it per the policy. Dropping elements on pop/shrink is what clears
/// the vacated slots, which for the Object kind releases the references.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseElements<T: DenseElement> {
    buffer: Vec<T>,
    policy: GrowthPolicy,
}

pub type Int32Elements = DenseElements<i32>;
pub type Int64Elements = DenseElements<i64>;
pub type Float64Elements = DenseElements<f64>;
pub type ObjectElements = DenseElements<Value>;

impl<T: DenseElement> DenseElements<T> {
    pub fn new(policy: GrowthPolicy) -> Self {
        DenseElements {
            buffer: Vec::with_capacity(policy.initial_capacity()),
            policy,
        }
    }

    pub(crate) fn from_vec(buffer: Vec<T>, policy: GrowthPolicy) -> Self {
        DenseElements { buffer, policy }
    }

    #[inline]
    pub fn kind(&self) -> ElementKind {
        T::KIND
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.buffer.len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[inline]
    pub(crate) fn capacity(&self) -> u64 {
        self.buffer.capacity() as u64
    }

    #[inline]
    pub(crate) fn policy(&self) -> GrowthPolicy {
        self.policy
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[T] {
        &self.buffer
    }

    pub fn get(&self, index: u64) -> Result<T, OutOfRange> {
        self.buffer.get(index as usize).cloned().ok_or(OutOfRange {
            index,
            length: self.len(),
        })
    }

    #[inline]
    pub fn has(&self, index: u64) -> bool {
        index < self.len()
    }

    /// Reserve capacity for `required_len` elements per the growth policy.
    fn reserve_for(&mut self, required_len: u64) {
        if required_len > self.capacity() {
            let target = self.policy.next_capacity(required_len);
            self.buffer.reserve_exact(target - self.buffer.len());
        }
    }

    /// Write in place, extending the length to `index + 1` if needed. Any
    /// implicitly created slots hold the kind's zero; the caller is
    /// responsible for masking them if they must read as absent.
    pub fn set(&mut self, index: u64, element: T) {
        debug_assert!(self.policy.fits_dense(index));
        let index = index as usize;
        if index < self.buffer.len() {
            self.buffer[index] = element;
        } else {
            self.reserve_for(index as u64 + 1);
            if index > self.buffer.len() {
                self.buffer.resize(index, T::zero());
            }
            self.buffer.push(element);
        }
    }

    /// Grow so that a subsequent `set(index, _)` cannot reallocate, and
    /// extend the logical length over `index`. Idempotent.
    pub fn ensure(&mut self, index: u64) {
        debug_assert!(self.policy.fits_dense(index));
        let required = index + 1;
        if required > self.len() {
            self.reserve_for(required);
            self.buffer.resize(required as usize, T::zero());
        }
    }

    /// Append, returning the new length.
    pub fn push(&mut self, element: T) -> u64 {
        self.reserve_for(self.len() + 1);
        self.buffer.push(element);
        self.len()
    }

    /// Remove and return the last element; `None` on empty storage. The
    /// vacated slot is dropped, not retained.
    pub fn pop(&mut self) -> Option<T> {
        self.buffer.pop()
    }

    /// Drop the first `by` elements, shifting the rest down. Shortens the
    /// length; the vacated tail is not retained.
    pub fn shift_left(&mut self, by: u64) {
        let by = (by as usize).min(self.buffer.len());
        self.buffer.drain(..by);
    }

    /// Open `by` zero slots at the front, shifting everything up. The caller
    /// has already checked the new last index against the dense threshold.
    pub fn shift_right(&mut self, by: u64) {
        if by == 0 || self.buffer.is_empty() {
            return;
        }
        self.reserve_for(self.len() + by);
        self.buffer
            .splice(0..0, iter::repeat_with(T::zero).take(by as usize));
    }

    /// Remove `removed` elements at `start` and open `inserted` zero slots in
    /// their place, shifting the tail once. Returns the removed elements, or
    /// `None` when nothing was removed.
    ///
    /// Fails when the resulting length would exceed both the dense threshold
    /// and the current capacity; the caller falls back to the general path.
    pub fn splice(
        &mut self,
        start: u64,
        removed: u64,
        inserted: u64,
    ) -> Result<Option<Self>, UnsupportedRepresentation> {
        let len = self.len();
        let start = start.min(len);
        let removed = removed.min(len - start);
        let new_len = len - removed + inserted;
        if !self.policy.fits_dense(new_len.saturating_sub(1)) && new_len > self.capacity() {
            return Err(UnsupportedRepresentation);
        }
        self.reserve_for(new_len);
        let taken: Vec<T> = self
            .buffer
            .splice(
                start as usize..(start + removed) as usize,
                iter::repeat_with(T::zero).take(inserted as usize),
            )
            .collect();
        if taken.is_empty() {
            Ok(None)
        } else {
            Ok(Some(DenseElements::from_vec(taken, self.policy)))
        }
    }

    /// Defensive copy of `[from, to)` as a new storage of the same kind.
    pub fn slice(&self, from: u64, to: u64) -> Self {
        let to = (to as usize).min(self.buffer.len());
        let from = (from as usize).min(to);
        DenseElements::from_vec(self.buffer[from..to].to_vec(), self.policy)
    }

    /// Truncate to `new_length`, dropping the tail slots.
    pub fn shrink(&mut self, new_length: u64) {
        if new_length < self.len() {
            self.buffer.truncate(new_length as usize);
        }
    }
}

// The widening legs of the conversion protocol. Each hop copies every live
// element through the exact numeric widening; there is no narrowing leg.

impl Int32Elements {
    pub(crate) fn to_int64(&self) -> Int64Elements {
        DenseElements::from_vec(widen(&self.buffer), self.policy)
    }

    pub(crate) fn to_float64(&self) -> Float64Elements {
        DenseElements::from_vec(widen(&self.buffer), self.policy)
    }

    pub(crate) fn to_object(&self) -> ObjectElements {
        DenseElements::from_vec(
            self.buffer.iter().map(|v| Value::Integer(*v)).collect(),
            self.policy,
        )
    }
}

impl Int64Elements {
    pub(crate) fn to_float64(&self) -> Float64Elements {
        DenseElements::from_vec(widen(&self.buffer), self.policy)
    }

    pub(crate) fn to_object(&self) -> ObjectElements {
        DenseElements::from_vec(
            self.buffer.iter().map(|v| Value::Long(*v)).collect(),
            self.policy,
        )
    }
}

impl Float64Elements {
    pub(crate) fn to_object(&self) -> ObjectElements {
        DenseElements::from_vec(
            self.buffer.iter().map(|v| Value::Number(*v)).collect(),
            self.policy,
        )
    }
}

fn widen<S, T>(buffer: &[S]) -> Vec<T>
where
    S: AsPrimitive<T>,
    T: Copy + 'static,
{
    buffer.iter().map(|v| v.as_()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> GrowthPolicy {
        GrowthPolicy::default()
    }

    #[test]
    fn push_and_pop_are_inverses() {
        let mut d = Int32Elements::new(policy());
        for i in 0..100 {
            assert_eq!(d.push(i), i as u64 + 1);
        }
        for i in (0..100).rev() {
            assert_eq!(d.pop(), Some(i));
            assert_eq!(d.len(), i as u64);
        }
        assert_eq!(d.pop(), None);
    }

    #[test]
    fn set_extends_length_with_zero_fill() {
        let mut d = Int32Elements::new(policy());
        d.set(4, 9);
        assert_eq!(d.len(), 5);
        assert_eq!(d.get(0), Ok(0));
        assert_eq!(d.get(4), Ok(9));
        assert!(d.get(5).is_err());
    }

    #[test]
    fn ensure_is_idempotent() {
        let mut d = Float64Elements::new(policy());
        d.ensure(9);
        let cap = d.capacity();
        d.ensure(9);
        assert_eq!(d.len(), 10);
        assert_eq!(d.capacity(), cap);
    }

    #[test]
    fn shift_left_drops_the_head_and_shortens() {
        let mut d = Int32Elements::new(policy());
        for i in 0..6 {
            d.push(i);
        }
        d.shift_left(2);
        assert_eq!(d.len(), 4);
        assert_eq!(d.as_slice(), &[2, 3, 4, 5]);
    }

    #[test]
    fn shift_right_opens_zero_slots() {
        let mut d = Int32Elements::new(policy());
        d.push(7);
        d.push(8);
        d.shift_right(3);
        assert_eq!(d.as_slice(), &[0, 0, 0, 7, 8]);
    }

    #[test]
    fn splice_removes_and_returns_the_gap() {
        let mut d = Int32Elements::new(policy());
        for v in [10, 20, 30, 40, 50] {
            d.push(v);
        }
        let taken = d.splice(1, 2, 0).unwrap().unwrap();
        assert_eq!(taken.as_slice(), &[20, 30]);
        assert_eq!(d.as_slice(), &[10, 40, 50]);
    }

    #[test]
    fn splice_with_nothing_removed_returns_the_empty_sentinel() {
        let mut d = Int32Elements::new(policy());
        d.push(1);
        let taken = d.splice(1, 0, 2).unwrap();
        assert!(taken.is_none());
        assert_eq!(d.as_slice(), &[1, 0, 0]);
    }

    #[test]
    fn splice_fails_past_threshold_and_capacity() {
        let small = GrowthPolicy::new(4, 8);
        let mut d = Int32Elements::new(small);
        for i in 0..8 {
            d.push(i);
        }
        assert_eq!(d.splice(0, 0, 4), Err(UnsupportedRepresentation));
    }

    #[test]
    fn widening_preserves_values_and_order() {
        let mut d = Int32Elements::new(policy());
        for v in [-5, 0, 1, i32::MAX] {
            d.push(v);
        }
        assert_eq!(d.to_int64().as_slice(), &[-5, 0, 1, i32::MAX as i64]);
        assert_eq!(d.to_float64().as_slice(), &[-5.0, 0.0, 1.0, i32::MAX as f64]);
        let objects = d.to_object();
        assert_eq!(objects.get(3), Ok(Value::Integer(i32::MAX)));
    }

    #[test]
    fn object_pop_releases_the_reference() {
        let mut d = ObjectElements::new(policy());
        let s: std::rc::Rc<str> = "abc".into();
        d.push(Value::String(s.clone()));
        assert_eq!(std::rc::Rc::strong_count(&s), 2);
        let popped = d.pop();
        drop(popped);
        assert_eq!(std::rc::Rc::strong_count(&s), 1);
    }
}
