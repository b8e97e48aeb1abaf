#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Control-byte encoding for table slots.
///
/// Each slot is described by one byte: empty, tombstone, or the low seven
/// bits of the stored value's hash.
pub mod control;

/// Errors reported by the fallible reservation path.
pub mod error;

mod group;

/// The raw Swiss table.
///
/// `HashTable` does no hashing of its own: callers pass each value's hash
/// along with an equality predicate, as the `HashSet` wrapper does.
pub mod hash_table;

/// A hash set built on the Swiss table.
///
/// This module provides a `HashSet` that wraps the `HashTable`, hashes values
/// with a reseedable oracle and provides a standard set interface.
pub mod hash_set;

/// Group matching primitives.
///
/// Every probe step compares all sixteen control bytes of a group at once and
/// reduces the result to a `BitMask` with one bit per lane. The scalar backend
/// is always compiled; the SSE2 backend produces bit-identical masks.
pub mod matching;

/// Reseedable hash oracles.
///
/// Every rehash swaps the set's `BuildHasher` for a fresh, independent one so
/// that an unlucky key sequence does not keep clustering the same way across
/// resizes.
pub mod oracle;

#[cfg(test)]
mod test_util;

pub use error::TryReserveError;
pub use group::CtrlBytes;
pub use hash_set::HashSet;
pub use hash_table::HashTable;
pub use oracle::DefaultHashBuilder;
pub use oracle::HashOracle;
