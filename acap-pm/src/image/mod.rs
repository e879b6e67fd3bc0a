//! ACAP boot container (PDI) verification

pub mod checksum;
pub mod container;
pub mod info;

pub use checksum::{checksum, verify};
pub use container::{
    BootHeader, HeaderWidth, ImageDescriptor, ImageHeaderTable, PartitionDescriptor,
    locate_image_header_table, verify_boot_header, verify_image_header_table,
    verify_pdi_header,
};
pub use info::AcapInfo;
