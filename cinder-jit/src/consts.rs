//! Emitter parameters

use static_assertions::const_assert;

/// Number of `(address, value)` pairs the emitter remembers about recently
/// written memory.
///
/// The cache is consulted to turn redundant loads into register moves; its
/// depth bounds how far back a store can still be forwarded.
pub const MEMORY_STATE_SIZE: usize = 16;

// The wrap-to-middle replacement policy needs room for two halves.
const_assert!(MEMORY_STATE_SIZE >= 4);
