//! Limits and tuning parameters.
//!
//! The engine has no runtime configuration; everything that bounds its work or
//! its memory lives here.

// ============================================================================
// Traversal limits
// ============================================================================

/// Maximum nesting of lists, dictionaries and records, on decode and encode.
pub const MAX_DEPTH: usize = 10_000;

/// Indirection depth after which the encoder starts recording the identity of
/// every heap pointee it passes through, to turn reference cycles into errors.
pub const CYCLE_CHECK_THRESHOLD: usize = 1_000;

/// Remaining stack below which a nested encode or decode moves onto a fresh
/// stack segment.
pub const STACK_RED_ZONE: usize = 128 * 1024;

/// Size of each stack segment allocated for deep nesting.
pub const STACK_SEGMENT_SIZE: usize = 2 * 1024 * 1024;

// ============================================================================
// Encode scratch pool
// ============================================================================

/// Number of idle encode contexts kept for reuse.
pub const CONTEXT_POOL_SIZE: usize = 64;

/// Capacity of a freshly allocated encode buffer.
pub const INITIAL_BUFFER_CAPACITY: usize = 16 * 1024;

/// Buffers that grew beyond this are dropped instead of returned to the pool.
pub const MAX_POOLED_BUFFER: usize = 100 * 1024 * 1024;
