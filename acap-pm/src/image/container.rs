//! Boot container (PDI) parsing
//!
//! A container starts with a 16-byte width-detection preamble followed by
//! the boot header. The boot header points at the image header table,
//! which in turn locates the image and partition descriptor arrays. All
//! offsets are taken relative to the start of the container and every
//! structure is read through a bounds-checked [`ByteView`].

use acap_api::view::{ByteView, fixed_str};
use acap_api::{Error, Result};
use static_assertions::const_assert_eq;

use super::checksum;

/// Size of the width-detection preamble
pub const MAGIC_LEN: usize = 16;

/// 8-bit wide boot interface preamble
pub const MAGIC_X8: [u8; MAGIC_LEN] = [
    0x00, 0x00, 0x00, 0xDD, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB, 0xCC,
];

/// 16-bit wide boot interface preamble
pub const MAGIC_X16: [u8; MAGIC_LEN] = [
    0x00, 0x00, 0xDD, 0x00, 0x22, 0x11, 0x44, 0x33, 0x66, 0x55, 0x88, 0x77, 0xAA, 0x99, 0xCC, 0xBB,
];

/// 32-bit wide boot interface preamble
pub const MAGIC_X32: [u8; MAGIC_LEN] = [
    0xDD, 0x00, 0x00, 0x00, 0x44, 0x33, 0x22, 0x11, 0x88, 0x77, 0x66, 0x55, 0xCC, 0xBB, 0xAA, 0x99,
];

/// Boot header starts right after the preamble
pub const BOOT_HEADER_OFFSET: usize = MAGIC_LEN;
/// "XNLX"
pub const BOOT_HEADER_IDENT: u32 = 0x584C_4E58;
/// Checksummed length of the boot header, preamble excluded
pub const BOOT_HEADER_CHECKSUM_LEN: usize = 0xF20;

/// Image header table location when the container has no boot header
pub const DEFAULT_TABLE_OFFSET: usize = MAGIC_LEN;
pub const IMAGE_HEADER_TABLE_LEN: usize = 128;
pub const IMAGE_DESCRIPTOR_LEN: usize = 64;
pub const PARTITION_DESCRIPTOR_LEN: usize = 128;
/// Descriptor and data offsets are stored in words
pub const WORD_LEN: usize = 4;

mod bh {
    pub const WIDTH_DETECTION: usize = 0x00;
    pub const IDENT: usize = 0x04;
    pub const ENCRYPTION_STATUS: usize = 0x08;
    pub const PLM_SOURCE_OFFSET: usize = 0x0C;
    pub const PMC_LOAD_OFFSET: usize = 0x10;
    pub const PMC_DATA_LEN: usize = 0x14;
    pub const PMC_TOTAL_LEN: usize = 0x18;
    pub const PLM_LEN: usize = 0x1C;
    pub const PLM_TOTAL_LEN: usize = 0x20;
    pub const ATTRIBUTES: usize = 0x24;
    pub const META_HEADER_OFFSET: usize = 0xB4;
}

mod iht {
    pub const VERSION: usize = 0x00;
    pub const IMAGE_COUNT: usize = 0x04;
    pub const IMAGE_WORD_OFFSET: usize = 0x08;
    pub const PARTITION_COUNT: usize = 0x0C;
    pub const PARTITION_WORD_OFFSET: usize = 0x10;
    pub const SECONDARY_BOOT_DEVICE: usize = 0x14;
    pub const IDCODE: usize = 0x18;
    pub const ATTRIBUTES: usize = 0x1C;
    pub const PDI_ID: usize = 0x20;
    pub const CHECKSUM: usize = 0x7C;
}

mod ih {
    pub const FIRST_PARTITION: usize = 0x00;
    pub const PARTITION_COUNT: usize = 0x04;
    pub const REVOKE_ID: usize = 0x08;
    pub const ATTRIBUTES: usize = 0x0C;
    pub const NAME: usize = 0x10;
    pub const NAME_LEN: usize = 16;
    pub const IMAGE_ID: usize = 0x20;
    pub const UID: usize = 0x24;
    pub const PARENT_UID: usize = 0x28;
    pub const FUNCTION_ID: usize = 0x2C;
    pub const COPY_ADDRESS: usize = 0x30;
}

mod ph {
    pub const EXEC_ADDRESS: usize = 0x10;
    pub const LOAD_ADDRESS: usize = 0x18;
    pub const DATA_WORD_OFFSET: usize = 0x20;
    pub const ATTRIBUTES: usize = 0x24;
    pub const SECTION_COUNT: usize = 0x28;
    pub const PARTITION_ID: usize = 0x30;
}

const_assert_eq!(iht::CHECKSUM, IMAGE_HEADER_TABLE_LEN - WORD_LEN);
const_assert_eq!(BOOT_HEADER_CHECKSUM_LEN % WORD_LEN, 0);
const_assert_eq!(ih::NAME + ih::NAME_LEN, ih::IMAGE_ID);

/// Boot interface width announced by the preamble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderWidth {
    X8,
    X16,
    X32,
}

impl HeaderWidth {
    /// Classify the preamble at the start of `bytes`
    pub fn detect(bytes: &[u8]) -> Option<HeaderWidth> {
        let magic = bytes.get(..MAGIC_LEN)?;
        if magic == MAGIC_X8 {
            Some(HeaderWidth::X8)
        } else if magic == MAGIC_X16 {
            Some(HeaderWidth::X16)
        } else if magic == MAGIC_X32 {
            Some(HeaderWidth::X32)
        } else {
            None
        }
    }
}

/// Check the preamble. Only the 32-bit variant is supported.
pub fn verify_pdi_header(bytes: &[u8]) -> Result {
    match HeaderWidth::detect(bytes) {
        Some(HeaderWidth::X32) => Ok(()),
        Some(width) => {
            log::debug!("pm: {:?} boot interface not supported", width);
            Err(Error::NotSupported)
        }
        None => Err(Error::InvalidHeader),
    }
}

/// Check the preamble, the boot header identity and the boot header
/// checksum, returning a view of the boot header
pub fn verify_boot_header(bytes: &[u8]) -> Result<BootHeader<'_>> {
    verify_pdi_header(bytes)?;
    let view = ByteView::from_offset(bytes, BOOT_HEADER_OFFSET)?;
    if view.u32_at(bh::IDENT)? != BOOT_HEADER_IDENT {
        return Err(Error::InvalidIdent);
    }
    checksum::verify(view.as_bytes(), BOOT_HEADER_CHECKSUM_LEN)?;
    Ok(BootHeader { view })
}

/// Check the image header table checksum at the start of `bytes`
pub fn verify_image_header_table(bytes: &[u8]) -> Result {
    checksum::verify(bytes, IMAGE_HEADER_TABLE_LEN - WORD_LEN)
}

/// Find and verify the image header table of a container
///
/// A container with a valid boot header is followed to its metadata
/// offset; anything else is assumed to carry the table straight after
/// the preamble.
pub fn locate_image_header_table(container: &[u8]) -> Result<ImageHeaderTable<'_>> {
    let offset = match verify_boot_header(container) {
        Ok(boot) => boot.meta_header_offset()? as usize,
        Err(e) => {
            log::debug!("pm: no boot header ({}), using default table offset", e);
            DEFAULT_TABLE_OFFSET
        }
    };
    let view = ByteView::from_offset(container, offset)?;
    verify_image_header_table(view.as_bytes())?;
    Ok(ImageHeaderTable {
        container,
        view: view.sub(0, IMAGE_HEADER_TABLE_LEN)?,
        offset,
    })
}

/// Verified boot header
#[derive(Debug, Clone, Copy)]
pub struct BootHeader<'a> {
    view: ByteView<'a>,
}

impl<'a> BootHeader<'a> {
    pub fn width_detection(&self) -> Result<u32> {
        self.view.u32_at(bh::WIDTH_DETECTION)
    }

    pub fn ident(&self) -> Result<u32> {
        self.view.u32_at(bh::IDENT)
    }

    pub fn encryption_status(&self) -> Result<u32> {
        self.view.u32_at(bh::ENCRYPTION_STATUS)
    }

    pub fn plm_source_offset(&self) -> Result<u32> {
        self.view.u32_at(bh::PLM_SOURCE_OFFSET)
    }

    pub fn pmc_load_offset(&self) -> Result<u32> {
        self.view.u32_at(bh::PMC_LOAD_OFFSET)
    }

    pub fn pmc_data_len(&self) -> Result<u32> {
        self.view.u32_at(bh::PMC_DATA_LEN)
    }

    pub fn pmc_total_len(&self) -> Result<u32> {
        self.view.u32_at(bh::PMC_TOTAL_LEN)
    }

    pub fn plm_len(&self) -> Result<u32> {
        self.view.u32_at(bh::PLM_LEN)
    }

    pub fn plm_total_len(&self) -> Result<u32> {
        self.view.u32_at(bh::PLM_TOTAL_LEN)
    }

    pub fn attributes(&self) -> Result<u32> {
        self.view.u32_at(bh::ATTRIBUTES)
    }

    /// Offset of the image header table from the start of the container
    pub fn meta_header_offset(&self) -> Result<u32> {
        self.view.u32_at(bh::META_HEADER_OFFSET)
    }
}

/// Verified image header table
#[derive(Debug, Clone, Copy)]
pub struct ImageHeaderTable<'a> {
    container: &'a [u8],
    view: ByteView<'a>,
    offset: usize,
}

impl<'a> ImageHeaderTable<'a> {
    /// Offset of the table in the container
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn version(&self) -> Result<u32> {
        self.view.u32_at(iht::VERSION)
    }

    pub fn image_count(&self) -> Result<u32> {
        self.view.u32_at(iht::IMAGE_COUNT)
    }

    pub fn image_word_offset(&self) -> Result<u32> {
        self.view.u32_at(iht::IMAGE_WORD_OFFSET)
    }

    pub fn partition_count(&self) -> Result<u32> {
        self.view.u32_at(iht::PARTITION_COUNT)
    }

    pub fn partition_word_offset(&self) -> Result<u32> {
        self.view.u32_at(iht::PARTITION_WORD_OFFSET)
    }

    pub fn secondary_boot_device(&self) -> Result<u32> {
        self.view.u32_at(iht::SECONDARY_BOOT_DEVICE)
    }

    pub fn idcode(&self) -> Result<u32> {
        self.view.u32_at(iht::IDCODE)
    }

    pub fn attributes(&self) -> Result<u32> {
        self.view.u32_at(iht::ATTRIBUTES)
    }

    pub fn pdi_id(&self) -> Result<u32> {
        self.view.u32_at(iht::PDI_ID)
    }

    pub fn checksum(&self) -> Result<u32> {
        self.view.u32_at(iht::CHECKSUM)
    }

    /// Image descriptor `index`
    pub fn image(&self, index: usize) -> Result<ImageDescriptor<'a>> {
        let base = self.image_word_offset()? as usize;
        descriptor(self.container, base, index, IMAGE_DESCRIPTOR_LEN)
            .map(|view| ImageDescriptor { view })
    }

    /// Partition descriptor `index`
    pub fn partition(&self, index: usize) -> Result<PartitionDescriptor<'a>> {
        let base = self.partition_word_offset()? as usize;
        descriptor(self.container, base, index, PARTITION_DESCRIPTOR_LEN)
            .map(|view| PartitionDescriptor { view })
    }

    /// Every image descriptor the table announces
    pub fn images(self) -> impl Iterator<Item = Result<ImageDescriptor<'a>>> {
        let count = self.image_count().unwrap_or(0) as usize;
        (0..count).map(move |i| self.image(i))
    }

    /// Every partition descriptor the table announces
    pub fn partitions(self) -> impl Iterator<Item = Result<PartitionDescriptor<'a>>> {
        let count = self.partition_count().unwrap_or(0) as usize;
        (0..count).map(move |i| self.partition(i))
    }
}

fn descriptor(container: &[u8], word_offset: usize, index: usize, len: usize) -> Result<ByteView<'_>> {
    let offset = word_offset
        .checked_mul(WORD_LEN)
        .and_then(|base| index.checked_mul(len).and_then(|rel| base.checked_add(rel)))
        .ok_or(Error::InvalidLength)?;
    ByteView::at(container, offset, len)
}

/// Image descriptor
#[derive(Debug, Clone, Copy)]
pub struct ImageDescriptor<'a> {
    view: ByteView<'a>,
}

impl<'a> ImageDescriptor<'a> {
    pub fn first_partition(&self) -> Result<u32> {
        self.view.u32_at(ih::FIRST_PARTITION)
    }

    pub fn partition_count(&self) -> Result<u32> {
        self.view.u32_at(ih::PARTITION_COUNT)
    }

    pub fn revoke_id(&self) -> Result<u32> {
        self.view.u32_at(ih::REVOKE_ID)
    }

    pub fn attributes(&self) -> Result<u32> {
        self.view.u32_at(ih::ATTRIBUTES)
    }

    /// Name up to the first NUL of its fixed-width field
    pub fn name(&self) -> Result<&'a str> {
        let field = self.view.sub(ih::NAME, ih::NAME_LEN)?;
        Ok(fixed_str(field.as_bytes()))
    }

    pub fn image_id(&self) -> Result<u32> {
        self.view.u32_at(ih::IMAGE_ID)
    }

    pub fn uid(&self) -> Result<u32> {
        self.view.u32_at(ih::UID)
    }

    pub fn parent_uid(&self) -> Result<u32> {
        self.view.u32_at(ih::PARENT_UID)
    }

    pub fn function_id(&self) -> Result<u32> {
        self.view.u32_at(ih::FUNCTION_ID)
    }

    /// Destination memory address of the image copy
    pub fn copy_address(&self) -> Result<u64> {
        self.view.u64_at(ih::COPY_ADDRESS)
    }
}

/// Partition descriptor
#[derive(Debug, Clone, Copy)]
pub struct PartitionDescriptor<'a> {
    view: ByteView<'a>,
}

impl PartitionDescriptor<'_> {
    pub fn exec_address(&self) -> Result<u64> {
        self.view.u64_at(ph::EXEC_ADDRESS)
    }

    pub fn load_address(&self) -> Result<u64> {
        self.view.u64_at(ph::LOAD_ADDRESS)
    }

    pub fn data_word_offset(&self) -> Result<u32> {
        self.view.u32_at(ph::DATA_WORD_OFFSET)
    }

    pub fn attributes(&self) -> Result<u32> {
        self.view.u32_at(ph::ATTRIBUTES)
    }

    pub fn section_count(&self) -> Result<u32> {
        self.view.u32_at(ph::SECTION_COUNT)
    }

    pub fn partition_id(&self) -> Result<u32> {
        self.view.u32_at(ph::PARTITION_ID)
    }
}
