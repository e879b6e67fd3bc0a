//! ACAP API - Shared interfaces and types for the ACAP image loaders
//!
//! This crate provides the pieces shared by the platform-management image
//! loader (`acap-pm`) and the accelerator bitstream loader (`acap-zocl`).
//!
//! # Architecture
//!
//! - **Error**: status taxonomy with numeric codes and short labels
//! - **View**: bounds-checked little-endian views over caller-owned buffers
//! - **Firmware**: the privileged call and cache maintenance collaborators
//! - **Sync**: lock primitives used by both loaders
//!
//! # Usage
//!
//! ```rust
//! use acap_api::view::ByteView;
//! use acap_api::{Error, Result};
//!
//! fn first_word(bytes: &[u8]) -> Result<u32> {
//!     ByteView::new(bytes).u32_at(0)
//! }
//!
//! assert_eq!(first_word(&[1, 0, 0, 0]), Ok(1));
//! assert_eq!(first_word(&[1, 0]), Err(Error::InvalidLength));
//! ```

#![no_std]

#[cfg(test)]
extern crate std;

pub mod error;
pub mod firmware;
pub mod sync;
pub mod view;

// Re-export commonly used types
pub use crate::error::{Error, Result, status_code, status_label};
pub use crate::firmware::{DataCache, SecureMonitor, SmcResponse};
pub use crate::view::ByteView;
