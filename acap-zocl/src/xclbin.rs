//! Accelerator container (xclbin2 / AXLF) parsing
//!
//! The container is a fixed header followed by a directory of section
//! headers. Each directory entry names a section kind and locates its
//! payload by offset and size from the start of the container.

use acap_api::view::{ByteView, fixed_str};
use acap_api::{Error, Result};
use static_assertions::const_assert_eq;
use uuid::Uuid;

pub const MAGIC: [u8; 8] = *b"xclbin2\0";

/// Offset of the container-wide unique id
pub const UNIQUE_ID_OFFSET: usize = 0x128;
/// Offset of the inline header
pub const HEADER_OFFSET: usize = 0x130;
pub const HEADER_LEN: usize = 152;
/// Offset of the first section directory entry
pub const SECTIONS_OFFSET: usize = HEADER_OFFSET + HEADER_LEN;
pub const SECTION_HEADER_LEN: usize = 40;

const_assert_eq!(SECTIONS_OFFSET, 0x1C8);

mod hdr {
    pub const LENGTH: usize = 0;
    pub const TIMESTAMP: usize = 8;
    pub const FEATURE_ROM_TIMESTAMP: usize = 16;
    pub const VERSION_PATCH: usize = 24;
    pub const VERSION_MAJOR: usize = 26;
    pub const VERSION_MINOR: usize = 27;
    pub const MODE: usize = 28;
    pub const ACTION_MASK: usize = 30;
    pub const ROM_UUID: usize = 32;
    pub const PLATFORM_VBNV: usize = 48;
    pub const PLATFORM_VBNV_LEN: usize = 64;
    pub const UUID: usize = 112;
    pub const DEBUG_BIN: usize = 128;
    pub const DEBUG_BIN_LEN: usize = 16;
    pub const NUM_SECTIONS: usize = 144;
}

mod sect {
    pub const KIND: usize = 0;
    pub const NAME: usize = 4;
    pub const NAME_LEN: usize = 16;
    pub const OFFSET: usize = 24;
    pub const SIZE: usize = 32;
}

const_assert_eq!(hdr::PLATFORM_VBNV + hdr::PLATFORM_VBNV_LEN, hdr::UUID);
const_assert_eq!(sect::SIZE + 8, SECTION_HEADER_LEN);

macro_rules! section_kinds {
    ($($variant:ident = $raw:literal => $label:literal,)*) => {
        /// Section kinds of the accelerator container
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum SectionKind {
            $($variant,)*
        }

        impl SectionKind {
            pub fn from_raw(raw: u32) -> Option<SectionKind> {
                match raw {
                    $($raw => Some(SectionKind::$variant),)*
                    _ => None,
                }
            }

            pub const fn raw(self) -> u32 {
                match self {
                    $(SectionKind::$variant => $raw,)*
                }
            }

            pub const fn label(self) -> &'static str {
                match self {
                    $(SectionKind::$variant => $label,)*
                }
            }
        }
    };
}

section_kinds! {
    Bitstream = 0 => "BITSTREAM",
    ClearingBitstream = 1 => "CLEARING_BITSTREAM",
    EmbeddedMetadata = 2 => "EMBEDDED_METADATA",
    Firmware = 3 => "FIRMWARE",
    DebugData = 4 => "DEBUG_DATA",
    SchedFirmware = 5 => "SCHED_FIRMWARE",
    MemTopology = 6 => "MEM_TOPOLOGY",
    Connectivity = 7 => "CONNECTIVITY",
    IpLayout = 8 => "IP_LAYOUT",
    DebugIpLayout = 9 => "DEBUG_IP_LAYOUT",
    DesignCheckPoint = 10 => "DESIGN_CHECK_POINT",
    ClockFreqTopology = 11 => "CLOCK_FREQ_TOPOLOGY",
    Mcs = 12 => "MCS",
    Bmc = 13 => "BMC",
    BuildMetadata = 14 => "BUILD_METADATA",
    KeyvalueMetadata = 15 => "KEYVALUE_METADATA",
    UserMetadata = 16 => "USER_METADATA",
    DnaCertificate = 17 => "DNA_CERTIFICATE",
    Pdi = 18 => "PDI",
    BitstreamPartialPdi = 19 => "BITSTREAM_PARTIAL_PDI",
    PartitionMetadata = 20 => "PARTITION_METADATA",
    EmulationData = 21 => "EMULATION_DATA",
    SystemMetadata = 22 => "SYSTEM_METADATA",
    SoftKernel = 23 => "SOFT_KERNEL",
    AskFlash = 24 => "ASK_FLASH",
    AieMetadata = 25 => "AIE_METADATA",
    AskGroupTopology = 26 => "ASK_GROUP_TOPOLOGY",
    AskGroupConnectivity = 27 => "ASK_GROUP_CONNECTIVITY",
    Smartnic = 28 => "SMARTNIC",
    AieResources = 29 => "AIE_RESOURCES",
    Overlay = 30 => "OVERLAY",
    VenderMetadata = 31 => "VENDER_METADATA",
    AiePartition = 32 => "AIE_PARTITION",
    IpMetadata = 33 => "IP_METADATA",
    AieResourcesBin = 34 => "AIE_RESOURCES_BIN",
    AieTraceMetadata = 35 => "AIE_TRACE_METADATA",
}

/// Label of a raw section kind, including kinds this parser does not know
pub fn kind_label(raw: u32) -> &'static str {
    SectionKind::from_raw(raw).map_or("UNKNOWN", SectionKind::label)
}

/// Container build mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XclbinMode {
    Flat,
    PartialReconfig,
    TandemStage2,
    TandemStage2WithPr,
    HwEmu,
    SwEmu,
    HwEmuPr,
}

impl XclbinMode {
    pub fn from_raw(raw: u16) -> Option<XclbinMode> {
        match raw {
            0 => Some(XclbinMode::Flat),
            1 => Some(XclbinMode::PartialReconfig),
            2 => Some(XclbinMode::TandemStage2),
            3 => Some(XclbinMode::TandemStage2WithPr),
            4 => Some(XclbinMode::HwEmu),
            5 => Some(XclbinMode::SwEmu),
            6 => Some(XclbinMode::HwEmuPr),
            _ => None,
        }
    }
}

/// Location of a section payload in the container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionInfo {
    pub offset: u64,
    pub size: u64,
}

/// Looks sections up by kind
///
/// Only the first directory entry of a kind is considered.
pub trait SectionDirectory {
    /// Location of the section, `NotFound` if the container has none and
    /// `InvalidLength` if its payload lies outside the container
    fn section_info(&self, kind: SectionKind) -> Result<SectionInfo>;

    /// Payload of the section
    fn section_bytes(&self, kind: SectionKind) -> Result<&[u8]>;
}

/// One section directory entry
#[derive(Debug, Clone, Copy)]
pub struct SectionHeader<'a> {
    view: ByteView<'a>,
}

impl<'a> SectionHeader<'a> {
    pub fn raw_kind(&self) -> Result<u32> {
        self.view.u32_at(sect::KIND)
    }

    pub fn kind(&self) -> Option<SectionKind> {
        self.raw_kind().ok().and_then(SectionKind::from_raw)
    }

    pub fn name(&self) -> Result<&'a str> {
        Ok(fixed_str(self.view.sub(sect::NAME, sect::NAME_LEN)?.as_bytes()))
    }

    pub fn offset(&self) -> Result<u64> {
        self.view.u64_at(sect::OFFSET)
    }

    pub fn size(&self) -> Result<u64> {
        self.view.u64_at(sect::SIZE)
    }
}

/// A parsed accelerator container
#[derive(Debug, Clone, Copy)]
pub struct Xclbin<'a> {
    bytes: &'a [u8],
    header: ByteView<'a>,
    num_sections: usize,
}

impl<'a> Xclbin<'a> {
    /// Check the magic and that the header and directory fit the buffer
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        if bytes.get(..MAGIC.len()) != Some(&MAGIC[..]) {
            log::info!("zocl: load-axlf: xclbin magic is invalid");
            return Err(Error::InvalidHeader);
        }
        let header = ByteView::at(bytes, HEADER_OFFSET, HEADER_LEN)?;
        let num_sections = header.u32_at(hdr::NUM_SECTIONS)? as usize;
        let directory_len = num_sections
            .checked_mul(SECTION_HEADER_LEN)
            .ok_or(Error::InvalidLength)?;
        ByteView::at(bytes, SECTIONS_OFFSET, directory_len)?;
        Ok(Self {
            bytes,
            header,
            num_sections,
        })
    }

    /// The whole container
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn unique_id(&self) -> Result<u64> {
        ByteView::new(self.bytes).u64_at(UNIQUE_ID_OFFSET)
    }

    pub fn length(&self) -> Result<u64> {
        self.header.u64_at(hdr::LENGTH)
    }

    pub fn timestamp(&self) -> Result<u64> {
        self.header.u64_at(hdr::TIMESTAMP)
    }

    pub fn feature_rom_timestamp(&self) -> Result<u64> {
        self.header.u64_at(hdr::FEATURE_ROM_TIMESTAMP)
    }

    pub fn version_patch(&self) -> Result<u16> {
        self.header.u16_at(hdr::VERSION_PATCH)
    }

    pub fn version_major(&self) -> Result<u8> {
        self.header.u8_at(hdr::VERSION_MAJOR)
    }

    pub fn version_minor(&self) -> Result<u8> {
        self.header.u8_at(hdr::VERSION_MINOR)
    }

    pub fn raw_mode(&self) -> Result<u16> {
        self.header.u16_at(hdr::MODE)
    }

    pub fn mode(&self) -> Result<Option<XclbinMode>> {
        self.raw_mode().map(XclbinMode::from_raw)
    }

    pub fn action_mask(&self) -> Result<u16> {
        self.header.u16_at(hdr::ACTION_MASK)
    }

    pub fn rom_uuid(&self) -> Result<Uuid> {
        self.header.array_at::<16>(hdr::ROM_UUID).map(|b| Uuid::from_bytes(*b))
    }

    pub fn platform_vbnv(&self) -> Result<&'a str> {
        let field = self.header.sub(hdr::PLATFORM_VBNV, hdr::PLATFORM_VBNV_LEN)?;
        Ok(fixed_str(field.as_bytes()))
    }

    /// Identifier of the container contents
    pub fn uuid(&self) -> Result<Uuid> {
        self.header.array_at::<16>(hdr::UUID).map(|b| Uuid::from_bytes(*b))
    }

    pub fn debug_bin(&self) -> Result<&'a str> {
        let field = self.header.sub(hdr::DEBUG_BIN, hdr::DEBUG_BIN_LEN)?;
        Ok(fixed_str(field.as_bytes()))
    }

    pub fn num_sections(&self) -> usize {
        self.num_sections
    }

    /// Directory entry `index`
    pub fn section(&self, index: usize) -> Result<SectionHeader<'a>> {
        if index >= self.num_sections {
            return Err(Error::NotFound);
        }
        let view = ByteView::at(
            self.bytes,
            SECTIONS_OFFSET + index * SECTION_HEADER_LEN,
            SECTION_HEADER_LEN,
        )?;
        Ok(SectionHeader { view })
    }

    /// Every directory entry in order
    pub fn sections(self) -> impl Iterator<Item = SectionHeader<'a>> {
        (0..self.num_sections).filter_map(move |i| self.section(i).ok())
    }

    fn find(&self, kind: SectionKind) -> Option<SectionHeader<'a>> {
        self.sections()
            .find(|s| s.raw_kind() == Ok(kind.raw()))
    }

    /// Payload of a section as a slice of the container
    pub fn section_slice(&self, kind: SectionKind) -> Result<&'a [u8]> {
        let info = self.section_info(kind)?;
        let offset = usize::try_from(info.offset).map_err(|_| Error::InvalidLength)?;
        let size = usize::try_from(info.size).map_err(|_| Error::InvalidLength)?;
        ByteView::at(self.bytes, offset, size).map(|v| v.as_bytes())
    }
}

impl SectionDirectory for Xclbin<'_> {
    fn section_info(&self, kind: SectionKind) -> Result<SectionInfo> {
        let header = self.find(kind).ok_or(Error::NotFound)?;
        let info = SectionInfo {
            offset: header.offset()?,
            size: header.size()?,
        };
        let end = info.offset.checked_add(info.size).ok_or(Error::InvalidLength)?;
        if end > self.bytes.len() as u64 {
            log::info!("zocl: {} section outside the container", kind.label());
            return Err(Error::InvalidLength);
        }
        Ok(info)
    }

    fn section_bytes(&self, kind: SectionKind) -> Result<&[u8]> {
        self.section_slice(kind)
    }
}
