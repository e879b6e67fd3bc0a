//! ACAP PM - Boot container verification and platform-management calls
//!
//! This crate validates Versal boot containers (PDI) and hands verified
//! images to the platform-management firmware.
//!
//! # Architecture
//!
//! - **Image**: header checksums, preamble classification, boot header and
//!   image header table views, and the structured image report
//! - **Firmware**: API identifiers, status translation, the feature-status
//!   cache, FPGA loads and the secure PDI load gateway
//!
//! # Usage
//!
//! ```rust
//! use acap_api::Error;
//! use acap_pm::image::{checksum, verify};
//!
//! let words = [7u32, 9, 0, checksum([7u32, 9])];
//! let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
//! assert_eq!(verify(&bytes, 12), Ok(()));
//! assert_eq!(verify(&bytes, 4), Err(Error::InvalidLength));
//! ```

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod firmware;
pub mod image;

pub use firmware::{FpgaLoadFlags, PmApi, PmConfig, PmContext, SecureLoadGateway};
pub use image::AcapInfo;
