//! Accelerator container report
//!
//! Collects the header, the section directory and, when the container
//! carries them, a summary of the slot sections. `Display` renders the
//! text report logged on load.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use serde::Serialize;

use acap_api::Result;

use crate::layout::{IpType, MemType, debug_ip_label};
use crate::sections::{SectionRefs, get_slot_sections};
use crate::xclbin::{Xclbin, kind_label};

const INVALID: &str = "invalid";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionRow {
    pub index: usize,
    pub kind: u32,
    pub label: &'static str,
    pub name: String,
    pub offset: u64,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemRow {
    pub mem_type: u8,
    pub label: &'static str,
    pub used: bool,
    /// Base address, or the flow id of a streaming bank
    pub base_address: u64,
    /// Size in KiB, or the route id of a streaming bank
    pub size: u64,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpRow {
    pub ip_type: u32,
    pub label: &'static str,
    pub base_address: u64,
    pub properties: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugIpRow {
    pub ip_type: u8,
    pub label: &'static str,
    pub index: u16,
    pub base_address: u64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectionRow {
    pub arg_index: i32,
    pub ip_layout_index: i32,
    pub mem_data_index: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSummary {
    pub mem_topology: Vec<MemRow>,
    pub ip_layout: Vec<IpRow>,
    pub debug_ip_layout: Vec<DebugIpRow>,
    pub connectivity: Vec<ConnectionRow>,
    pub aie_metadata_size: usize,
}

impl SlotSummary {
    pub fn from_sections(refs: &SectionRefs<'_>) -> Result<Self> {
        let mut mem_topology = Vec::with_capacity(refs.mem_topology.count());
        for mem in refs.mem_topology.iter() {
            let mem_type = mem.raw_type()?;
            mem_topology.push(MemRow {
                mem_type,
                label: MemType::from_raw(mem_type).map_or(INVALID, MemType::label),
                used: mem.used()?,
                base_address: mem.base_address()?,
                size: mem.size()?,
                tag: mem.tag()?.to_string(),
            });
        }

        let mut ip_layout = Vec::with_capacity(refs.ip_layout.count());
        for ip in refs.ip_layout.iter() {
            let ip_type = ip.raw_type()?;
            ip_layout.push(IpRow {
                ip_type,
                label: IpType::from_raw(ip_type).map_or(INVALID, IpType::label),
                base_address: ip.base_address()?,
                properties: ip.properties()?,
                name: ip.name()?.to_string(),
            });
        }

        let mut debug_ip_layout = Vec::with_capacity(refs.debug_ip_layout.count());
        for dip in refs.debug_ip_layout.iter() {
            let ip_type = dip.raw_type()?;
            debug_ip_layout.push(DebugIpRow {
                ip_type,
                label: debug_ip_label(ip_type),
                index: dip.index()?,
                base_address: dip.base_address()?,
                name: dip.name()?.to_string(),
            });
        }

        let mut connectivity = Vec::with_capacity(refs.connectivity.count());
        for conn in refs.connectivity.iter() {
            connectivity.push(ConnectionRow {
                arg_index: conn.arg_index()?,
                ip_layout_index: conn.ip_layout_index()?,
                mem_data_index: conn.mem_data_index()?,
            });
        }

        Ok(Self {
            mem_topology,
            ip_layout,
            debug_ip_layout,
            connectivity,
            aie_metadata_size: refs.aie_metadata.len(),
        })
    }
}

/// Structured description of an accelerator container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XclbinReport {
    pub length: u64,
    pub timestamp: u64,
    pub feature_rom_timestamp: u64,
    pub version_major: u8,
    pub version_minor: u8,
    pub version_patch: u16,
    pub mode: u16,
    pub action_mask: u16,
    pub uuid: String,
    pub platform_vbnv: String,
    pub debug_bin: String,
    pub sections: Vec<SectionRow>,
    /// Absent when the slot sections are missing or malformed
    pub slot: Option<SlotSummary>,
}

impl XclbinReport {
    pub fn from_xclbin(xclbin: &Xclbin<'_>) -> Result<Self> {
        let mut sections = Vec::with_capacity(xclbin.num_sections());
        for (index, section) in xclbin.sections().enumerate() {
            let kind = section.raw_kind()?;
            sections.push(SectionRow {
                index,
                kind,
                label: kind_label(kind),
                name: section.name()?.to_string(),
                offset: section.offset()?,
                size: section.size()?,
            });
        }

        let slot = match get_slot_sections(xclbin) {
            Ok(refs) => Some(SlotSummary::from_sections(&refs)?),
            Err(_) => None,
        };

        Ok(Self {
            length: xclbin.length()?,
            timestamp: xclbin.timestamp()?,
            feature_rom_timestamp: xclbin.feature_rom_timestamp()?,
            version_major: xclbin.version_major()?,
            version_minor: xclbin.version_minor()?,
            version_patch: xclbin.version_patch()?,
            mode: xclbin.raw_mode()?,
            action_mask: xclbin.action_mask()?,
            uuid: xclbin.uuid()?.to_string(),
            platform_vbnv: xclbin.platform_vbnv()?.to_string(),
            debug_bin: xclbin.debug_bin()?.to_string(),
            sections,
            slot,
        })
    }
}

impl fmt::Display for SlotSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " topology : {}", self.mem_topology.len())?;
        for (i, mem) in self.mem_topology.iter().enumerate() {
            write!(
                f,
                "  {:>3} : {:<26} used={} ",
                i,
                mem.label,
                if mem.used { "used  " } else { "unused" }
            )?;
            match MemType::from_raw(mem.mem_type) {
                Some(t) if t.is_addressed() => {
                    write!(f, "addr={:016x} size={}K ", mem.base_address, mem.size)?
                }
                Some(MemType::Streaming) => {
                    write!(f, "route-id={:<4} flow-id={:<4} ", mem.size, mem.base_address)?
                }
                _ => {}
            }
            writeln!(f, "{}", mem.tag)?;
        }

        writeln!(f, " ip-layout : {}", self.ip_layout.len())?;
        for (i, ip) in self.ip_layout.iter().enumerate() {
            write!(f, "  {:>3} : {:<20} addr=0x{:016x} ", i, ip.label, ip.base_address)?;
            match IpType::from_raw(ip.ip_type) {
                Some(IpType::Kernel) => write!(f, "prop=0x{:08x} ", ip.properties)?,
                Some(IpType::MemDdr4 | IpType::MemHbm | IpType::MemHbmEcc) => write!(
                    f,
                    "idx={} pc-idx={} ",
                    ip.properties & 0xFFFF,
                    (ip.properties >> 16) & 0xFF
                )?,
                _ => {}
            }
            writeln!(f, "{}", ip.name)?;
        }

        writeln!(f, " debug-ip-layout : {}", self.debug_ip_layout.len())?;
        for (i, dip) in self.debug_ip_layout.iter().enumerate() {
            writeln!(
                f,
                "  {:>3} : {:<28} idx={:<4} addr=0x{:016x} {}",
                i, dip.label, dip.index, dip.base_address, dip.name
            )?;
        }

        writeln!(f, " connectivity : {}", self.connectivity.len())?;
        for (i, conn) in self.connectivity.iter().enumerate() {
            writeln!(
                f,
                "  {:>3} : arg-idx={:<4} ip-idx={:<4} mem-idx={:<4}",
                i, conn.arg_index, conn.ip_layout_index, conn.mem_data_index
            )?;
        }

        writeln!(f, " aie-metadata : size={}", self.aie_metadata_size)
    }
}

impl fmt::Display for XclbinReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "XCLBIN:")?;
        writeln!(f, " m_length              : {}", self.length)?;
        writeln!(f, " m_timeStamp           : {}", self.timestamp)?;
        writeln!(f, " m_featureRomTimeStamp : {}", self.feature_rom_timestamp)?;
        writeln!(f, " m_versionPatch        : {}", self.version_patch)?;
        writeln!(f, " m_versionMajor        : {}", self.version_major)?;
        writeln!(f, " m_versionMinor        : {}", self.version_minor)?;
        writeln!(f, " m_mode                : {:x}", self.mode)?;
        writeln!(f, " m_actionMask          : {:x}", self.action_mask)?;
        writeln!(f, " m_uuid                : {}", self.uuid)?;
        writeln!(f, " m_platformVBNV        : {}", self.platform_vbnv)?;
        writeln!(f, " m_debug_bin           : {}", self.debug_bin)?;
        writeln!(f, " m_numSections         : {}", self.sections.len())?;
        for s in &self.sections {
            writeln!(
                f,
                "  {:>3} : {:<25} {:<9} {:<9} {}",
                s.index, s.label, s.offset, s.size, s.name
            )?;
        }
        match &self.slot {
            Some(slot) => write!(f, "{}", slot),
            None => writeln!(f, " slot sections : none"),
        }
    }
}
