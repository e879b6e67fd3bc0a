//! ACAP ZOCL - Accelerator container loading
//!
//! This crate parses accelerator containers (xclbin2), keeps per-slot
//! copies of their metadata sections and maintains the table of hardware
//! register windows shared by all slots.
//!
//! # Architecture
//!
//! - **Xclbin**: container header and section directory lookup
//! - **Layout**: record views of the count-bearing sections
//! - **Sections**: validation and single-block copies of the slot sections
//! - **Aperture**: the bounded, append-only aperture table
//! - **Device**: slot table, transactional loads and requests
//! - **Report**: structured and textual container report
//!
//! # Usage
//!
//! ```rust
//! use acap_api::Error;
//! use acap_zocl::{ZoclConfig, ZoclDevice};
//!
//! let device = ZoclDevice::new(ZoclConfig::default()).unwrap();
//! assert_eq!(device.load_axlf(0, b"not a container"), Err(Error::InvalidHeader));
//! assert_eq!(device.slot_uuid(0), Ok(None));
//! ```

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod aperture;
pub mod device;
pub mod layout;
pub mod report;
pub mod sections;
pub mod xclbin;

pub use aperture::{ApertureEntry, ApertureTable, MAX_APERTURES, MAX_COMPUTE_UNITS};
pub use device::{DriverVersion, MAX_SLOTS, ZoclConfig, ZoclDevice};
pub use report::XclbinReport;
pub use sections::{SlotSections, alloc_slot_sections, free_slot_sections, get_slot_sections};
pub use xclbin::{SectionDirectory, SectionKind, Xclbin};
