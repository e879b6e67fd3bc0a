//! Accelerator container fixtures shared by the integration tests

#![allow(dead_code)]

use acap_zocl::layout::{CONNECTION_LEN, DEBUG_IP_DATA_LEN, IP_DATA_LEN, MEM_DATA_LEN};
use acap_zocl::xclbin::{
    HEADER_OFFSET, MAGIC, SECTION_HEADER_LEN, SECTIONS_OFFSET, SectionKind, UNIQUE_ID_OFFSET,
};

pub const PLATFORM: &str = "xilinx_vck190_base_202220_1";
pub const IP_BASE: u64 = 0xA400_0000;
pub const DEBUG_BASE: u64 = 0xA800_0000;
pub const AIE_METADATA: &[u8] = b"{\"aie_metadata\":{\"driver_config\":{}}}";

pub struct IpFixture {
    pub ip_type: u32,
    pub properties: u32,
    pub base: u64,
    pub name: String,
}

pub struct DebugIpFixture {
    pub ip_type: u8,
    pub index: u16,
    pub base: u64,
    pub name: String,
}

pub struct MemFixture {
    pub mem_type: u8,
    pub used: bool,
    pub base: u64,
    pub size_kb: u64,
    pub tag: &'static str,
}

/// Builds well-formed accelerator containers
pub struct XclbinBuilder {
    uuid: [u8; 16],
    mode: u16,
    ips: Vec<IpFixture>,
    debug_ips: Vec<DebugIpFixture>,
    connections: Vec<[i32; 3]>,
    mems: Vec<MemFixture>,
    aie_metadata: Vec<u8>,
    omitted: Vec<SectionKind>,
    overrides: Vec<(SectionKind, Vec<u8>)>,
}

fn put(buf: &mut [u8], offset: usize, bytes: &[u8]) {
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
}

fn put_name(buf: &mut [u8], offset: usize, name: &str, max: usize) {
    let bytes = name.as_bytes();
    let len = bytes.len().min(max);
    put(buf, offset, &bytes[..len]);
}

impl XclbinBuilder {
    /// A container whose uuid bytes are all `uuid_byte`
    pub fn new(uuid_byte: u8) -> Self {
        Self {
            uuid: [uuid_byte; 16],
            mode: 0,
            ips: Vec::new(),
            debug_ips: Vec::new(),
            connections: Vec::new(),
            mems: Vec::new(),
            aie_metadata: AIE_METADATA.to_vec(),
            omitted: Vec::new(),
            overrides: Vec::new(),
        }
    }

    pub fn mode(mut self, mode: u16) -> Self {
        self.mode = mode;
        self
    }

    pub fn ip(mut self, ip_type: u32, properties: u32, base: u64, name: &str) -> Self {
        self.ips.push(IpFixture {
            ip_type,
            properties,
            base,
            name: name.to_string(),
        });
        self
    }

    /// `count` kernels at consecutive 64 KiB windows
    pub fn kernels(mut self, count: usize) -> Self {
        for i in 0..count {
            let base = IP_BASE + (self.ips.len() as u64) * 0x1_0000;
            self = self.ip(1, 0x4 | (i as u32) << 16, base, &format!("vadd:vadd_{}", i));
        }
        self
    }

    pub fn debug_ip(mut self, ip_type: u8, base: u64) -> Self {
        let index = self.debug_ips.len() as u16;
        self.debug_ips.push(DebugIpFixture {
            ip_type,
            index,
            base,
            name: format!("monitor_{}", index),
        });
        self
    }

    /// `count` AXI memory-mapped monitors
    pub fn monitors(mut self, count: usize) -> Self {
        for _ in 0..count {
            let base = DEBUG_BASE + (self.debug_ips.len() as u64) * 0x1_0000;
            self = self.debug_ip(3, base);
        }
        self
    }

    pub fn connection(mut self, arg_index: i32, ip_index: i32, mem_index: i32) -> Self {
        self.connections.push([arg_index, ip_index, mem_index]);
        self
    }

    pub fn mem(mut self, mem_type: u8, base: u64, size_kb: u64, tag: &'static str) -> Self {
        self.mems.push(MemFixture {
            mem_type,
            used: true,
            base,
            size_kb,
            tag,
        });
        self
    }

    pub fn aie_metadata(mut self, bytes: &[u8]) -> Self {
        self.aie_metadata = bytes.to_vec();
        self
    }

    /// Leave a section out of the directory
    pub fn without(mut self, kind: SectionKind) -> Self {
        self.omitted.push(kind);
        self
    }

    /// Replace the payload of a section
    pub fn raw_section(mut self, kind: SectionKind, bytes: Vec<u8>) -> Self {
        self.overrides.push((kind, bytes));
        self
    }

    pub fn ip_layout_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; 8 + self.ips.len() * IP_DATA_LEN];
        put(&mut buf, 0, &(self.ips.len() as i32).to_le_bytes());
        for (i, ip) in self.ips.iter().enumerate() {
            let at = 8 + i * IP_DATA_LEN;
            put(&mut buf, at, &ip.ip_type.to_le_bytes());
            put(&mut buf, at + 4, &ip.properties.to_le_bytes());
            put(&mut buf, at + 8, &ip.base.to_le_bytes());
            put_name(&mut buf, at + 16, &ip.name, 64);
        }
        buf
    }

    pub fn debug_ip_layout_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; 8 + self.debug_ips.len() * DEBUG_IP_DATA_LEN];
        put(&mut buf, 0, &(self.debug_ips.len() as u16).to_le_bytes());
        for (i, dip) in self.debug_ips.iter().enumerate() {
            let at = 8 + i * DEBUG_IP_DATA_LEN;
            let [low, high] = dip.index.to_le_bytes();
            buf[at] = dip.ip_type;
            buf[at + 1] = low;
            buf[at + 3] = 1;
            buf[at + 5] = high;
            put(&mut buf, at + 8, &dip.base.to_le_bytes());
            put_name(&mut buf, at + 16, &dip.name, 128);
        }
        buf
    }

    pub fn connectivity_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; 4 + self.connections.len() * CONNECTION_LEN];
        put(&mut buf, 0, &(self.connections.len() as i32).to_le_bytes());
        for (i, conn) in self.connections.iter().enumerate() {
            let at = 4 + i * CONNECTION_LEN;
            for (j, value) in conn.iter().enumerate() {
                put(&mut buf, at + j * 4, &value.to_le_bytes());
            }
        }
        buf
    }

    pub fn mem_topology_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; 8 + self.mems.len() * MEM_DATA_LEN];
        put(&mut buf, 0, &(self.mems.len() as i32).to_le_bytes());
        for (i, mem) in self.mems.iter().enumerate() {
            let at = 8 + i * MEM_DATA_LEN;
            buf[at] = mem.mem_type;
            buf[at + 1] = mem.used as u8;
            put(&mut buf, at + 8, &mem.size_kb.to_le_bytes());
            put(&mut buf, at + 16, &mem.base.to_le_bytes());
            put_name(&mut buf, at + 24, mem.tag, 16);
        }
        buf
    }

    fn payloads(&self) -> Vec<(SectionKind, Vec<u8>)> {
        let mut sections = vec![
            (SectionKind::MemTopology, self.mem_topology_bytes()),
            (SectionKind::IpLayout, self.ip_layout_bytes()),
            (SectionKind::DebugIpLayout, self.debug_ip_layout_bytes()),
            (SectionKind::Connectivity, self.connectivity_bytes()),
            (SectionKind::AieMetadata, self.aie_metadata.clone()),
            (SectionKind::AieResources, vec![0u8; 32]),
        ];
        for (kind, bytes) in &self.overrides {
            for (k, b) in sections.iter_mut() {
                if k == kind {
                    *b = bytes.clone();
                }
            }
        }
        sections.retain(|(k, _)| !self.omitted.contains(k));
        sections
    }

    pub fn build(&self) -> Vec<u8> {
        let sections = self.payloads();
        let mut offset = SECTIONS_OFFSET + sections.len() * SECTION_HEADER_LEN;
        let mut placed = Vec::new();
        for (kind, bytes) in &sections {
            offset = (offset + 7) & !7;
            placed.push((*kind, offset, bytes.len()));
            offset += bytes.len();
        }

        let mut buf = vec![0u8; offset];
        put(&mut buf, 0, &MAGIC);
        put(&mut buf, UNIQUE_ID_OFFSET, &0x5EED_0001u64.to_le_bytes());

        let hdr = HEADER_OFFSET;
        put(&mut buf, hdr, &(offset as u64).to_le_bytes());
        put(&mut buf, hdr + 8, &1_700_000_000u64.to_le_bytes());
        put(&mut buf, hdr + 24, &3u16.to_le_bytes());
        buf[hdr + 26] = 2;
        buf[hdr + 27] = 1;
        put(&mut buf, hdr + 28, &self.mode.to_le_bytes());
        put_name(&mut buf, hdr + 48, PLATFORM, 64);
        put(&mut buf, hdr + 112, &self.uuid);
        put_name(&mut buf, hdr + 128, "debug.bin", 16);
        put(&mut buf, hdr + 144, &(sections.len() as u32).to_le_bytes());

        for (i, ((kind, at, len), (_, bytes))) in placed.iter().zip(&sections).enumerate() {
            let entry = SECTIONS_OFFSET + i * SECTION_HEADER_LEN;
            put(&mut buf, entry, &kind.raw().to_le_bytes());
            put_name(&mut buf, entry + 4, kind.label(), 15);
            put(&mut buf, entry + 24, &(*at as u64).to_le_bytes());
            put(&mut buf, entry + 32, &(*len as u64).to_le_bytes());
            put(&mut buf, *at, bytes);
        }
        buf
    }
}

/// A container with three kernels, one DDR bank and one connection
pub fn sample_xclbin(uuid_byte: u8) -> Vec<u8> {
    XclbinBuilder::new(uuid_byte)
        .kernels(3)
        .mem(1, 0x0, 2 * 1024 * 1024, "DDR[0]")
        .connection(0, 0, 0)
        .build()
}
