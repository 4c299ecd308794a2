// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Failure signals.
//!
//! Every fallible fast path names the one condition it can signal, so a
//! consumer can catch exactly the signal it knows how to recover from.
//! Conversion, hole masking, and the sparse fallback have no failure path.

use thiserror::Error;

use crate::access::ProgramPoint;
use crate::kind::ElementKind;

/// A read addressed an index at or beyond the logical length.
///
/// Internal to the dense variants; the capability-set `get` recovers by
/// returning the undefined sentinel instead of propagating this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("index {index} out of range for length {length}")]
pub struct OutOfRange {
    pub index: u64,
    pub length: u64,
}

/// A type-specialized accessor's cached assumption is stale.
///
/// Always recoverable: the consumer discards the accessor and re-binds
/// against the storage's current representation. When the failing read was
/// optimistic, the caller's correlation token is carried back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("storage holds {found} elements, accessor bound to {expected}")]
pub struct RepresentationMismatch {
    pub expected: ElementKind,
    pub found: ElementKind,
    pub program_point: Option<ProgramPoint>,
}

impl RepresentationMismatch {
    pub(crate) fn new(expected: ElementKind, found: ElementKind) -> Self {
        RepresentationMismatch {
            expected,
            found,
            program_point: None,
        }
    }

    pub(crate) fn at(expected: ElementKind, found: ElementKind, point: ProgramPoint) -> Self {
        RepresentationMismatch {
            expected,
            found,
            program_point: Some(point),
        }
    }
}

/// A bulk fast path cannot complete within the dense representation's
/// capacity and threshold constraints. The caller falls back to the general
/// element-by-element path, which has no such restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation exceeds dense representation limits")]
pub struct UnsupportedRepresentation;
