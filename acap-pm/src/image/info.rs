//! Structured ACAP image report

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use acap_api::Result;
use serde::Serialize;

use super::container::{
    BootHeader, ImageDescriptor, ImageHeaderTable, PartitionDescriptor, WORD_LEN,
    locate_image_header_table, verify_boot_header,
};

/// Boot header summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootInfo {
    pub plm_source_offset: u32,
    pub pmc_load_offset: u32,
    pub pmc_data_len: u32,
    pub pmc_total_len: u32,
    pub plm_len: u32,
    pub plm_total_len: u32,
    pub attributes: u32,
    pub meta_header_offset: u32,
}

impl BootInfo {
    fn read(boot: &BootHeader<'_>) -> Result<Self> {
        Ok(Self {
            plm_source_offset: boot.plm_source_offset()?,
            pmc_load_offset: boot.pmc_load_offset()?,
            pmc_data_len: boot.pmc_data_len()?,
            pmc_total_len: boot.pmc_total_len()?,
            plm_len: boot.plm_len()?,
            plm_total_len: boot.plm_total_len()?,
            attributes: boot.attributes()?,
            meta_header_offset: boot.meta_header_offset()?,
        })
    }
}

/// Image header table summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub version_major: u16,
    pub version_minor: u16,
    pub images: u32,
    pub image_offset: u32,
    pub partitions: u32,
    pub partition_offset: u32,
    pub idcode: u32,
    pub attributes: u32,
    pub pdi_id: u32,
}

impl TableInfo {
    fn read(table: &ImageHeaderTable<'_>) -> Result<Self> {
        let version = table.version()?;
        Ok(Self {
            version_major: (version >> 16) as u16,
            version_minor: (version & 0xffff) as u16,
            images: table.image_count()?,
            image_offset: table.image_word_offset()?,
            partitions: table.partition_count()?,
            partition_offset: table.partition_word_offset()?,
            idcode: table.idcode()?,
            attributes: table.attributes()?,
            pdi_id: table.pdi_id()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub name: String,
    pub partitions: u32,
    pub image_id: u32,
    pub uid: u32,
    pub parent_uid: u32,
    pub function_id: u32,
    pub copy_address: u64,
}

impl ImageInfo {
    fn read(image: &ImageDescriptor<'_>) -> Result<Self> {
        Ok(Self {
            name: image.name()?.to_string(),
            partitions: image.partition_count()?,
            image_id: image.image_id()?,
            uid: image.uid()?,
            parent_uid: image.parent_uid()?,
            function_id: image.function_id()?,
            copy_address: image.copy_address()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionInfo {
    pub id: u32,
    pub sections: u32,
    /// Byte offset of the partition data in the container
    pub data_offset: u64,
    pub load_address: u64,
    pub exec_address: u64,
}

impl PartitionInfo {
    fn read(partition: &PartitionDescriptor<'_>) -> Result<Self> {
        Ok(Self {
            id: partition.partition_id()?,
            sections: partition.section_count()?,
            data_offset: partition.data_word_offset()? as u64 * WORD_LEN as u64,
            load_address: partition.load_address()?,
            exec_address: partition.exec_address()?,
        })
    }
}

/// Report of an ACAP boot container
///
/// Building the report only reads the buffer. The boot header section is
/// absent for containers that carry the image header table directly
/// after the preamble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcapInfo {
    pub length: usize,
    pub boot: Option<BootInfo>,
    pub table: TableInfo,
    pub images: Vec<ImageInfo>,
    pub partitions: Vec<PartitionInfo>,
}

impl AcapInfo {
    pub fn from_image(image: &[u8]) -> Result<Self> {
        let boot = match verify_boot_header(image) {
            Ok(boot) => Some(BootInfo::read(&boot)?),
            Err(_) => None,
        };
        let table = locate_image_header_table(image)?;
        let images = table
            .images()
            .map(|i| i.and_then(|i| ImageInfo::read(&i)))
            .collect::<Result<Vec<_>>>()?;
        let partitions = table
            .partitions()
            .map(|p| p.and_then(|p| PartitionInfo::read(&p)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            length: image.len(),
            boot,
            table: TableInfo::read(&table)?,
            images,
            partitions,
        })
    }
}

impl fmt::Display for AcapInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ACAP (PDI) image, {} bytes", self.length)?;
        if let Some(boot) = &self.boot {
            writeln!(f, " PLM:")?;
            writeln!(f, "  PLM source offset   : {:#010x}", boot.plm_source_offset)?;
            writeln!(f, "  PMC load offset     : {:#010x}", boot.pmc_load_offset)?;
            writeln!(f, "  PMC length          : {}", boot.pmc_data_len)?;
            writeln!(f, "  PMC total length    : {}", boot.pmc_total_len)?;
            writeln!(f, "  PLM length          : {}", boot.plm_len)?;
            writeln!(f, "  PLM total length    : {}", boot.plm_total_len)?;
            writeln!(f, " Boot attributes      : {:#010x}", boot.attributes)?;
            writeln!(f, " PMC metadata offset  : {:#010x}", boot.meta_header_offset)?;
        }
        let t = &self.table;
        writeln!(f, " Image header table:")?;
        writeln!(f, "  Version             : {}.{}", t.version_major, t.version_minor)?;
        writeln!(f, "  Images              : {}", t.images)?;
        writeln!(f, "  Image offset        : {:#010x}", t.image_offset)?;
        writeln!(f, "  Partitions          : {}", t.partitions)?;
        writeln!(f, "  Partition offset    : {:#010x}", t.partition_offset)?;
        writeln!(f, "  Device id           : {:#010x}", t.idcode)?;
        writeln!(f, "  Attributes          : {:#010x}", t.attributes)?;
        writeln!(f, "  PDI id              : {}", t.pdi_id)?;

        let width = self
            .images
            .iter()
            .map(|i| i.name.len())
            .max()
            .unwrap_or(0)
            .max(4);
        writeln!(f, " Images:")?;
        writeln!(
            f,
            "    {:<width$} parts image id uid      puid     func id  copy addr",
            "name"
        )?;
        for (n, i) in self.images.iter().enumerate() {
            writeln!(
                f,
                " {:2} {:<width$} {:<5} {:08x} {:08x} {:08x} {:08x} {:#018x}",
                n, i.name, i.partitions, i.image_id, i.uid, i.parent_uid, i.function_id,
                i.copy_address
            )?;
        }
        writeln!(f, " Partitions:")?;
        writeln!(f, "    id   secs offset   load addr        exec addr")?;
        for (n, p) in self.partitions.iter().enumerate() {
            writeln!(
                f,
                " {:2} {:<4} {:<4} {:08x} {:016x} {:016x}",
                n, p.id, p.sections, p.data_offset, p.load_address, p.exec_address
            )?;
        }
        Ok(())
    }
}
