// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Type-specialized, representation-switching array storage for a dynamic
//! language runtime.
//!
//! Every language-level array is backed by exactly one [`ElementsStorage`]:
//! a dense, homogeneously-typed buffer while its values share one primitive
//! kind, a sparse map once its index spread overruns the dense threshold,
//! and filter decorators for punched holes and deletions in between. Writes
//! that no longer fit the current representation replace it — widening along
//! `Int32 → Int64 → Float64 → Object`, never narrowing — and the owner
//! re-binds its reference on every mutating call:
//!
//! ```
//! use elements::{ElementsStorage, GrowthPolicy, Value};
//!
//! let mut storage = ElementsStorage::new(GrowthPolicy::default());
//! storage = storage.push(Value::Integer(1));
//! storage = storage.push(Value::Integer(2));
//! // A fractional write widens the whole array to float64 storage.
//! storage = storage.set(0, Value::Number(0.5));
//! assert_eq!(storage.get(0), Value::Number(0.5));
//! assert_eq!(storage.get(1), Value::Number(2.0));
//! ```
//!
//! A consuming compiler binds [`TypedAccess`] descriptors for unboxed,
//! assumption-checked element access; a stale descriptor signals
//! [`RepresentationMismatch`] and is re-bound, never a wrong value.
//!
//! Storage instances are exclusively owned and single-writer; the
//! surrounding runtime serializes mutation.

mod access;
mod error;
mod growth;
mod kind;
mod storage;
mod value;

pub use access::{ProgramPoint, TypedAccess};
pub use error::{OutOfRange, RepresentationMismatch, UnsupportedRepresentation};
pub use growth::{DEFAULT_CHUNK_SIZE, DEFAULT_DENSE_THRESHOLD, GrowthPolicy};
pub use kind::ElementKind;
pub use storage::dense::{
    DenseElements, Float64Elements, Int32Elements, Int64Elements, ObjectElements,
};
pub use storage::filters::{DeletedRangeFilter, UndefinedFilter};
pub use storage::sparse::SparseElements;
pub use storage::{ElementsStorage, TypedBuffer};
pub use value::{ObjectHandle, Value};
