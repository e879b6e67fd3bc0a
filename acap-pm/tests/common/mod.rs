//! PDI fixtures shared by the integration tests

#![allow(dead_code)]

use acap_pm::image::checksum;
use acap_pm::image::container::{
    BOOT_HEADER_CHECKSUM_LEN, BOOT_HEADER_IDENT, BOOT_HEADER_OFFSET, DEFAULT_TABLE_OFFSET,
    IMAGE_DESCRIPTOR_LEN, IMAGE_HEADER_TABLE_LEN, MAGIC_LEN, MAGIC_X32, PARTITION_DESCRIPTOR_LEN,
    WORD_LEN,
};

/// Image header table offset used when a boot header is present
pub const TABLE_OFFSET: usize = 0x1000;
pub const IDCODE: u32 = 0x04CA_8093;
pub const PDI_ID: u32 = 3;
pub const TABLE_VERSION: u32 = 0x0004_0000;

pub struct ImageFixture {
    pub name: &'static str,
    pub image_id: u32,
    pub uid: u32,
    pub copy_address: u64,
}

pub struct PartitionFixture {
    pub id: u32,
    pub sections: u32,
    pub load_address: u64,
    pub exec_address: u64,
}

/// Builds well-formed PDI containers
pub struct PdiBuilder {
    boot_header: bool,
    images: Vec<ImageFixture>,
    partitions: Vec<PartitionFixture>,
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_u64(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

/// Store the checksum of the `byte_size` header at `start`
pub fn seal(buf: &mut [u8], start: usize, byte_size: usize) {
    let words = byte_size / WORD_LEN;
    let sum = checksum(
        buf[start..start + (words - 1) * WORD_LEN]
            .chunks_exact(WORD_LEN)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]])),
    );
    put_u32(buf, start + words * WORD_LEN, sum);
}

impl PdiBuilder {
    pub fn new() -> Self {
        Self {
            boot_header: true,
            images: Vec::new(),
            partitions: Vec::new(),
        }
    }

    /// Place the image header table right after the preamble
    pub fn without_boot_header(mut self) -> Self {
        self.boot_header = false;
        self
    }

    pub fn image(mut self, name: &'static str, image_id: u32, copy_address: u64) -> Self {
        let uid = 0x1000 + self.images.len() as u32;
        self.images.push(ImageFixture {
            name,
            image_id,
            uid,
            copy_address,
        });
        self
    }

    pub fn partition(mut self, id: u32, load_address: u64, exec_address: u64) -> Self {
        self.partitions.push(PartitionFixture {
            id,
            sections: 1,
            load_address,
            exec_address,
        });
        self
    }

    pub fn table_offset(&self) -> usize {
        if self.boot_header {
            TABLE_OFFSET
        } else {
            DEFAULT_TABLE_OFFSET
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let table = self.table_offset();
        let images = table + IMAGE_HEADER_TABLE_LEN;
        let partitions = images + self.images.len() * IMAGE_DESCRIPTOR_LEN;
        let end = partitions + self.partitions.len() * PARTITION_DESCRIPTOR_LEN;
        let mut buf = vec![0u8; end];
        buf[..MAGIC_LEN].copy_from_slice(&MAGIC_X32);

        if self.boot_header {
            let bh = BOOT_HEADER_OFFSET;
            put_u32(&mut buf, bh + 0x04, BOOT_HEADER_IDENT);
            put_u32(&mut buf, bh + 0x0C, 0x0000_1200);
            put_u32(&mut buf, bh + 0x10, 0xF201_E000);
            put_u32(&mut buf, bh + 0x14, 0x40);
            put_u32(&mut buf, bh + 0x18, 0x40);
            put_u32(&mut buf, bh + 0x1C, 0x2_0000);
            put_u32(&mut buf, bh + 0x20, 0x2_0000);
            put_u32(&mut buf, bh + 0x24, 0x0);
            put_u32(&mut buf, bh + 0xB4, TABLE_OFFSET as u32);
            seal(&mut buf, bh, BOOT_HEADER_CHECKSUM_LEN);
        }

        put_u32(&mut buf, table, TABLE_VERSION);
        put_u32(&mut buf, table + 0x04, self.images.len() as u32);
        put_u32(&mut buf, table + 0x08, (images / WORD_LEN) as u32);
        put_u32(&mut buf, table + 0x0C, self.partitions.len() as u32);
        put_u32(&mut buf, table + 0x10, (partitions / WORD_LEN) as u32);
        put_u32(&mut buf, table + 0x18, IDCODE);
        put_u32(&mut buf, table + 0x20, PDI_ID);

        for (n, image) in self.images.iter().enumerate() {
            let at = images + n * IMAGE_DESCRIPTOR_LEN;
            put_u32(&mut buf, at + 0x04, 1);
            let name = image.name.as_bytes();
            buf[at + 0x10..at + 0x10 + name.len()].copy_from_slice(name);
            put_u32(&mut buf, at + 0x20, image.image_id);
            put_u32(&mut buf, at + 0x24, image.uid);
            put_u32(&mut buf, at + 0x2C, 0x8);
            put_u64(&mut buf, at + 0x30, image.copy_address);
        }

        for (n, partition) in self.partitions.iter().enumerate() {
            let at = partitions + n * PARTITION_DESCRIPTOR_LEN;
            put_u64(&mut buf, at + 0x10, partition.exec_address);
            put_u64(&mut buf, at + 0x18, partition.load_address);
            put_u32(&mut buf, at + 0x20, (end / WORD_LEN) as u32);
            put_u32(&mut buf, at + 0x28, partition.sections);
            put_u32(&mut buf, at + 0x30, partition.id);
        }

        seal(&mut buf, table, IMAGE_HEADER_TABLE_LEN - WORD_LEN);
        buf
    }
}

/// A boot container with one image and two partitions
pub fn sample_pdi() -> Vec<u8> {
    PdiBuilder::new()
        .image("pmc_subsys", 0x1C00_0001, 0)
        .partition(1, 0xF201_E000, 0xF201_E000)
        .partition(2, 0x0000_0000, 0x0000_0000)
        .build()
}
