// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end behavior of the storage capability set, driven purely through
//! the public surface the object model consumes.

use elements::{
    ElementKind, ElementsStorage, GrowthPolicy, TypedAccess, UnsupportedRepresentation, Value,
};

fn ints(values: &[i32]) -> ElementsStorage {
    let values: Vec<Value> = values.iter().map(|v| Value::Integer(*v)).collect();
    ElementsStorage::from_values(&values, GrowthPolicy::default())
}

#[test]
fn push_grows_length_by_one_and_pop_reverses_it() {
    let mut storage = ElementsStorage::new(GrowthPolicy::default());
    for i in 0..200 {
        storage = storage.push(Value::Integer(i));
        assert_eq!(storage.len(), i as u64 + 1);
    }
    for i in (0..200).rev() {
        assert_eq!(storage.pop(), Value::Integer(i));
        assert_eq!(storage.len(), i as u64);
    }
    assert_eq!(storage.pop(), Value::Undefined);
    assert_eq!(storage.len(), 0);
}

#[test]
fn push_pop_roundtrip_on_every_representation() {
    let policy = GrowthPolicy::default();
    let mut storages = vec![
        ints(&[1, 2]),
        ints(&[1, 2]).convert(ElementKind::Int64),
        ints(&[1, 2]).convert(ElementKind::Float64),
        ints(&[1, 2]).convert(ElementKind::Object),
        ints(&[1, 2]).delete(0),
        ints(&[1, 2]).set(0, Value::Undefined),
        {
            let s = ElementsStorage::new(policy);
            s.set(policy.dense_threshold() + 1, Value::Integer(1))
        },
    ];
    for storage in &mut storages {
        let len = storage.len();
        let mut s = storage.clone();
        s = s.push(Value::Integer(77));
        assert_eq!(s.len(), len + 1);
        // Widened storages hand the value back in their own kind.
        assert_eq!(s.pop().to_float64(), 77.0);
        assert_eq!(s.len(), len);
    }
}

#[test]
fn int_storage_widens_to_float_on_fractional_write() {
    // Start empty, push 1, 2, 3, then write 2.5 in the middle.
    let mut storage = ElementsStorage::new(GrowthPolicy::default());
    for v in [1, 2, 3] {
        storage = storage.push(Value::Integer(v));
    }
    assert_eq!(storage.len(), 3);
    storage = storage.set(1, Value::Number(2.5));
    assert_eq!(storage.kind(), ElementKind::Float64);
    assert_eq!(storage.get(0), Value::Number(1.0));
    assert_eq!(storage.get(1), Value::Number(2.5));
    assert_eq!(storage.get(2), Value::Number(3.0));
    assert_eq!(storage.len(), 3);
}

#[test]
fn conversion_preserves_values_and_order_across_the_lattice() {
    let source = ints(&[-3, 0, 7, i32::MAX]);
    let targets = [
        ElementKind::Int32,
        ElementKind::Int64,
        ElementKind::Float64,
        ElementKind::Object,
    ];
    for target in targets {
        let converted = source.clone().convert(target);
        assert_eq!(converted.len(), source.len());
        for i in 0..source.len() {
            assert_eq!(
                converted.get(i).to_float64(),
                source.get(i).to_float64(),
                "index {i} after converting to {target}"
            );
        }
    }
    // Second hop: int64 and float64 sources widening further.
    let longs = source.clone().convert(ElementKind::Int64);
    assert_eq!(
        longs.clone().convert(ElementKind::Float64).get(3),
        Value::Number(i32::MAX as f64)
    );
    assert_eq!(
        longs.clone().convert(ElementKind::Object).get(0),
        Value::Long(-3)
    );
    let doubles = source.clone().convert(ElementKind::Float64);
    assert_eq!(
        doubles.convert(ElementKind::Object).get(2),
        Value::Number(7.0)
    );
}

#[test]
fn conversion_is_idempotent_and_never_narrows() {
    let source = ints(&[1, 2, 3]);
    let once = source.clone().convert(ElementKind::Float64);
    let twice = once.clone().convert(ElementKind::Float64);
    assert_eq!(once, twice);
    // Identity on the same kind.
    assert_eq!(source.clone().convert(ElementKind::Int32), source);
    // A narrower request is a no-op, not a narrowing.
    let still_float = once.clone().convert(ElementKind::Int32);
    assert_eq!(still_float.kind(), ElementKind::Float64);
    assert_eq!(still_float, once);
}

#[test]
fn deletion_is_non_destructive_to_the_wrapped_buffer() {
    let mut storage = ints(&[10, 20, 30, 40]);
    storage = storage.delete(2);
    assert_eq!(storage.get(2), Value::Undefined);
    assert!(!storage.has(2));
    let ElementsStorage::Deleted(filter) = &storage else {
        panic!("expected a deleted-range filter");
    };
    // The wrapped buffer still holds the deleted element.
    assert_eq!(filter.underlying().get(2), Value::Integer(30));
    assert_eq!(filter.masked_range(), Some((2, 2)));
    // Writing un-deletes.
    storage = storage.set(2, Value::Integer(99));
    assert_eq!(storage.get(2), Value::Integer(99));
    assert!(storage.has(2));
}

#[test]
fn splice_removes_shifts_and_returns_the_removed_run() {
    // [10, 20, 30, 40, 50] — remove two from index 1.
    let mut storage = ints(&[10, 20, 30, 40, 50]);
    let removed = storage.splice(1, 2, 0).unwrap().unwrap();
    assert_eq!(removed.len(), 2);
    assert_eq!(removed.kind(), ElementKind::Int32);
    assert_eq!(removed.get(0), Value::Integer(20));
    assert_eq!(removed.get(1), Value::Integer(30));
    assert_eq!(storage.len(), 3);
    assert_eq!(storage.get(0), Value::Integer(10));
    assert_eq!(storage.get(1), Value::Integer(40));
    assert_eq!(storage.get(2), Value::Integer(50));
}

#[test]
fn splice_length_arithmetic_holds() {
    for (removed, inserted) in [(0u64, 3u64), (2, 2), (4, 0), (1, 5)] {
        let mut storage = ints(&[0, 1, 2, 3, 4, 5, 6, 7]);
        let len = storage.len();
        let taken = storage.splice(2, removed, inserted).unwrap();
        assert_eq!(storage.len(), len - removed + inserted);
        match taken {
            None => assert_eq!(removed, 0),
            Some(run) => assert_eq!(run.len(), removed),
        }
    }
}

#[test]
fn splice_on_filtered_storage_falls_back() {
    let mut storage = ints(&[1, 2, 3, 4]).delete(1);
    assert_eq!(storage.splice(0, 1, 0), Err(UnsupportedRepresentation));
    // The fallback path: element-by-element through the general interface.
    let mut sparse = ElementsStorage::new(GrowthPolicy::default())
        .set(GrowthPolicy::default().dense_threshold() + 1, Value::Integer(1));
    assert_eq!(sparse.splice(0, 1, 0), Err(UnsupportedRepresentation));
}

#[test]
fn write_past_the_dense_threshold_goes_sparse() {
    let policy = GrowthPolicy::default();
    let mut storage = ElementsStorage::new(policy);
    for v in [4, 5, 6] {
        storage = storage.push(Value::Integer(v));
    }
    let far = policy.dense_threshold() + 5;
    storage = storage.set(far, Value::Integer(7));
    assert_eq!(storage.kind(), ElementKind::Object);
    assert!(matches!(storage, ElementsStorage::Sparse(_)));
    assert_eq!(storage.get(far), Value::Integer(7));
    assert_eq!(storage.len(), far + 1);
    // Originally populated indices are unchanged.
    assert_eq!(storage.get(0), Value::Integer(4));
    assert_eq!(storage.get(1), Value::Integer(5));
    assert_eq!(storage.get(2), Value::Integer(6));
    // The unpopulated middle reads as undefined.
    assert_eq!(storage.get(1000), Value::Undefined);
    assert!(!storage.has(1000));
}

#[test]
fn deleted_hole_survives_pops_around_it() {
    // Length 5, delete index 2, then pop everything.
    let mut storage = ints(&[0, 10, 20, 30, 40]).delete(2);
    assert_eq!(storage.len(), 5);
    assert_eq!(storage.pop(), Value::Integer(40));
    assert_eq!(storage.pop(), Value::Integer(30));
    // The pop that vacates the deleted index reflects the hole.
    assert_eq!(storage.pop(), Value::Undefined);
    assert_eq!(storage.pop(), Value::Integer(10));
    assert_eq!(storage.pop(), Value::Integer(0));
    assert_eq!(storage.len(), 0);
}

#[test]
fn undefined_write_keeps_the_numeric_buffer() {
    let mut storage = ints(&[1, 2, 3]);
    storage = storage.set(1, Value::Undefined);
    // Still int-backed underneath; the hole is masked, not stored.
    assert_eq!(storage.kind(), ElementKind::Int32);
    let ElementsStorage::Undefined(filter) = &storage else {
        panic!("expected an undefined-hole filter");
    };
    assert!(filter.is_hole(1));
    assert_eq!(filter.underlying().get(1), Value::Integer(2));
    assert_eq!(storage.get(1), Value::Undefined);
    // Unlike deletion, the element is still present.
    assert!(storage.has(1));
    // Popping down to the hole yields undefined, neighbours unaffected.
    assert_eq!(storage.pop(), Value::Integer(3));
    assert_eq!(storage.pop(), Value::Undefined);
    assert_eq!(storage.pop(), Value::Integer(1));
}

#[test]
fn shift_left_shortens_and_shift_right_opens_room() {
    let mut storage = ints(&[1, 2, 3, 4, 5]);
    storage.shift_left(2);
    assert_eq!(storage.len(), 3);
    assert_eq!(storage.get(0), Value::Integer(3));
    storage = storage.shift_right(1);
    assert_eq!(storage.len(), 4);
    assert_eq!(storage.get(0), Value::Integer(0));
    assert_eq!(storage.get(1), Value::Integer(3));
    assert_eq!(storage.get(3), Value::Integer(5));
}

#[test]
fn shifts_carry_filter_masks_along() {
    let mut storage = ints(&[0, 1, 2, 3, 4, 5]).delete_range(2, 3);
    storage.shift_left(1);
    assert_eq!(storage.len(), 5);
    assert_eq!(storage.get(0), Value::Integer(1));
    assert_eq!(storage.get(1), Value::Undefined);
    assert_eq!(storage.get(2), Value::Undefined);
    assert_eq!(storage.get(3), Value::Integer(4));
    storage = storage.shift_right(2);
    assert_eq!(storage.len(), 7);
    assert_eq!(storage.get(3), Value::Undefined);
    assert_eq!(storage.get(4), Value::Undefined);
    assert_eq!(storage.get(5), Value::Integer(4));
}

#[test]
fn shift_right_past_the_threshold_goes_sparse() {
    let policy = GrowthPolicy::default();
    let storage = ints(&[1, 2, 3]);
    let storage = storage.shift_right(policy.dense_threshold());
    assert!(matches!(storage, ElementsStorage::Sparse(_)));
    assert_eq!(storage.get(policy.dense_threshold()), Value::Integer(1));
    assert_eq!(storage.len(), policy.dense_threshold() + 3);
}

#[test]
fn slice_and_copy_are_defensive() {
    let original = ints(&[1, 2, 3, 4]);
    let mut copy = original.copy();
    copy = copy.set(0, Value::Integer(100));
    assert_eq!(original.get(0), Value::Integer(1));
    assert_eq!(copy.get(0), Value::Integer(100));

    let mut window = original.slice(1, 3);
    assert_eq!(window.len(), 2);
    assert_eq!(window.get(0), Value::Integer(2));
    window = window.set(0, Value::Integer(-1));
    assert_eq!(original.get(1), Value::Integer(2));
    assert_eq!(window.get(0), Value::Integer(-1));
}

#[test]
fn slice_of_filtered_storage_materializes_holes_as_undefined() {
    let storage = ints(&[1, 2, 3, 4]).delete(2);
    let window = storage.slice(1, 4);
    assert_eq!(window.len(), 3);
    assert_eq!(window.get(0), Value::Integer(2));
    assert_eq!(window.get(1), Value::Undefined);
    assert_eq!(window.get(2), Value::Integer(4));
}

#[test]
fn length_assignment_works_in_both_directions() {
    let mut storage = ints(&[1, 2, 3]);
    storage = storage.set_length(7);
    assert_eq!(storage.len(), 7);
    assert_eq!(storage.get(2), Value::Integer(3));
    assert_eq!(storage.get(5), Value::Undefined);
    assert!(!storage.has(5));
    storage = storage.set_length(1);
    assert_eq!(storage.len(), 1);
    assert_eq!(storage.get(0), Value::Integer(1));
    assert_eq!(storage.get(1), Value::Undefined);
    // Shrinking back to a plain dense buffer, not a filter.
    assert!(matches!(storage, ElementsStorage::Int32(_)));
}

#[test]
fn gap_writes_never_expose_zero_fill() {
    let mut storage = ints(&[1]);
    storage = storage.set(6, Value::Integer(7));
    assert_eq!(storage.len(), 7);
    for gap in 1..6 {
        assert_eq!(storage.get(gap), Value::Undefined, "index {gap}");
        assert!(!storage.has(gap), "index {gap}");
    }
    // Filling a gap index turns it into a real element.
    storage = storage.set(3, Value::Integer(33));
    assert_eq!(storage.get(3), Value::Integer(33));
    assert!(storage.has(3));
    assert_eq!(storage.get(2), Value::Undefined);
}

#[test]
fn stale_typed_accessors_deoptimize_on_every_representation_change() {
    let mut storage = ints(&[1, 2, 3]);
    let access = TypedAccess::bind(&storage).unwrap();
    assert_eq!(access.get_int32(&storage, 0), Ok(1));

    // Widening invalidates.
    storage = storage.set(0, Value::Number(0.5));
    assert!(access.get_int32(&storage, 0).is_err());

    // Filter wrapping invalidates binding entirely.
    let filtered = storage.clone().delete(1);
    assert!(TypedAccess::bind(&filtered).is_none());
    assert!(access.get_int32(&filtered, 0).is_err());

    // Rebinding against the current representation recovers.
    let rebound = TypedAccess::bind(&storage).unwrap();
    assert_eq!(rebound.kind(), ElementKind::Float64);
    assert_eq!(rebound.get_float64(&storage, 0), Ok(0.5));
}

#[test]
fn mismatched_accessors_never_return_a_misinterpreted_value() {
    let int_storage = ints(&[1]);
    let float_storage = ints(&[1]).convert(ElementKind::Float64);
    let int_access = TypedAccess::bind(&int_storage).unwrap();
    let float_access = TypedAccess::bind(&float_storage).unwrap();
    assert!(int_access.get_int32(&float_storage, 0).is_err());
    assert!(float_access.get_float64(&int_storage, 0).is_err());
    assert!(int_access.get_value(&int_storage, 0).is_err());
}
