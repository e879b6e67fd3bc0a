//! Synchronization primitives for the ACAP loaders
//!
//! Both loaders run in a no_std environment where the privileged call
//! blocks the calling thread, so plain spin locks are used throughout.

pub use spin::{Mutex, MutexGuard};
