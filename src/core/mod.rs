/*!
 * Core Module
 * Fundamental types, error handling and synchronization primitives
 */

pub mod errors;
pub mod limits;
pub mod sync;
pub mod types;

// Re-export for convenience
pub use errors::*;
pub use types::*;
