// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use core::fmt;

/// Element kind of a dense storage variant.
///
/// Kinds form a one-directional widening lattice in declaration order:
/// `Int32 → Int64 → Float64 → Object`. A storage only ever moves up the
/// lattice; there is no narrowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ElementKind {
    Int32,
    Int64,
    Float64,
    /// Boxed language values; the universal widening target.
    Object,
}

impl ElementKind {
    /// The lattice join: the narrowest kind that can represent both operands.
    #[inline]
    pub fn union(self, other: ElementKind) -> ElementKind {
        self.max(other)
    }

    /// True if a value of `self` can be stored in an `other`-kinded buffer
    /// without a representation change.
    #[inline]
    pub fn widens_to(self, other: ElementKind) -> bool {
        self <= other
    }

    #[inline]
    pub fn is_numeric(self) -> bool {
        !matches!(self, ElementKind::Object)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Int32 => "int32",
            ElementKind::Int64 => "int64",
            ElementKind::Float64 => "float64",
            ElementKind::Object => "object",
        };
        f.write_str(name)
    }
}
