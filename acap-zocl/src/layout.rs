//! Record layouts of the count-bearing metadata sections
//!
//! Each section starts with a fixed header holding the element count and is
//! followed by `count` fixed-size records. A section is only accepted when
//! its size is exactly `header + count * record`.

use core::marker::PhantomData;

use acap_api::view::{ByteView, fixed_str};
use acap_api::{Error, Result};
use static_assertions::const_assert_eq;

use crate::xclbin::SectionKind;

/// Shape of a count-bearing section
pub trait Layout {
    const KIND: SectionKind;
    /// Offset of the first record
    const HEADER_LEN: usize;
    const RECORD_LEN: usize;

    type Record<'a>;

    /// Declared element count; negative counts are rejected by the caller
    fn raw_count(header: &ByteView<'_>) -> Result<i64>;

    fn record(view: ByteView<'_>) -> Self::Record<'_>;
}

/// A validated count-bearing section
pub struct Records<'a, L: Layout> {
    view: ByteView<'a>,
    count: usize,
    _layout: PhantomData<L>,
}

impl<L: Layout> Clone for Records<'_, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L: Layout> Copy for Records<'_, L> {}

impl<L: Layout> core::fmt::Debug for Records<'_, L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Records")
            .field("kind", &L::KIND)
            .field("count", &self.count)
            .field("len", &self.view.len())
            .finish()
    }
}

/// Size a section with `count` records must have
pub fn expected_size<L: Layout>(count: usize) -> Option<usize> {
    count.checked_mul(L::RECORD_LEN)?.checked_add(L::HEADER_LEN)
}

impl<'a, L: Layout> Records<'a, L> {
    /// Check the declared count against the section size
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let view = ByteView::new(bytes);
        let raw = L::raw_count(&view).map_err(|_| Error::InvalidFormat)?;
        let count = usize::try_from(raw).map_err(|_| Error::InvalidFormat)?;
        match expected_size::<L>(count) {
            Some(size) if size == bytes.len() => Ok(Self::validated(view, count)),
            _ => Err(Error::InvalidFormat),
        }
    }

    pub(crate) fn validated(view: ByteView<'a>, count: usize) -> Self {
        Self {
            view,
            count,
            _layout: PhantomData,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.view.as_bytes()
    }

    pub fn get(&self, index: usize) -> Option<L::Record<'a>> {
        if index >= self.count {
            return None;
        }
        let view = self
            .view
            .sub(L::HEADER_LEN + index * L::RECORD_LEN, L::RECORD_LEN)
            .ok()?;
        Some(L::record(view))
    }

    pub fn iter(self) -> impl Iterator<Item = L::Record<'a>> {
        (0..self.count).filter_map(move |i| self.get(i))
    }
}

macro_rules! section_layout {
    ($marker:ident, $alias:ident, $kind:expr, $header:expr, $record:expr, $rec:ident, $count:ident) => {
        pub enum $marker {}

        impl Layout for $marker {
            const KIND: SectionKind = $kind;
            const HEADER_LEN: usize = $header;
            const RECORD_LEN: usize = $record;

            type Record<'a> = $rec<'a>;

            fn raw_count(header: &ByteView<'_>) -> Result<i64> {
                header.$count(0).map(i64::from)
            }

            fn record(view: ByteView<'_>) -> $rec<'_> {
                $rec { view }
            }
        }

        pub type $alias<'a> = Records<'a, $marker>;
    };
}

pub const IP_DATA_LEN: usize = 80;
pub const DEBUG_IP_DATA_LEN: usize = 144;
pub const CONNECTION_LEN: usize = 12;
pub const MEM_DATA_LEN: usize = 40;

const_assert_eq!(IP_DATA_LEN, 16 + 64);
const_assert_eq!(DEBUG_IP_DATA_LEN, 16 + 128);
const_assert_eq!(CONNECTION_LEN, 3 * 4);
const_assert_eq!(MEM_DATA_LEN, 24 + 16);

section_layout!(IpLayoutSection, IpLayout, SectionKind::IpLayout, 8, IP_DATA_LEN, IpData, i32_at);
section_layout!(
    DebugIpLayoutSection,
    DebugIpLayout,
    SectionKind::DebugIpLayout,
    8,
    DEBUG_IP_DATA_LEN,
    DebugIpData,
    u16_at
);
section_layout!(
    ConnectivitySection,
    Connectivity,
    SectionKind::Connectivity,
    4,
    CONNECTION_LEN,
    Connection,
    i32_at
);
section_layout!(
    MemTopologySection,
    MemTopology,
    SectionKind::MemTopology,
    8,
    MEM_DATA_LEN,
    MemData,
    i32_at
);

/// IP block type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum IpType {
    Mb = 0,
    Kernel = 1,
    Dnasc = 2,
    Ddr4Controller = 3,
    MemDdr4 = 4,
    MemHbm = 5,
    MemHbmEcc = 6,
    PsKernel = 7,
}

impl IpType {
    pub fn from_raw(raw: u32) -> Option<IpType> {
        match raw {
            0 => Some(IpType::Mb),
            1 => Some(IpType::Kernel),
            2 => Some(IpType::Dnasc),
            3 => Some(IpType::Ddr4Controller),
            4 => Some(IpType::MemDdr4),
            5 => Some(IpType::MemHbm),
            6 => Some(IpType::MemHbmEcc),
            7 => Some(IpType::PsKernel),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IpType::Mb => "IP_MB",
            IpType::Kernel => "IP_KERNEL",
            IpType::Dnasc => "IP_DNASC",
            IpType::Ddr4Controller => "IP_DDR4_CONTROLLER",
            IpType::MemDdr4 => "IP_MEM_DDR4",
            IpType::MemHbm => "IP_MEM_HBM",
            IpType::MemHbmEcc => "IP_MEM_HBM_ECC",
            IpType::PsKernel => "IP_PS_KERNEL",
        }
    }
}

/// Memory bank type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MemType {
    Ddr3 = 0,
    Ddr4 = 1,
    Dram = 2,
    Streaming = 3,
    PreallocatedGlob = 4,
    Are = 5,
    Hbm = 6,
    Bram = 7,
    Uram = 8,
    StreamingConnection = 9,
    Host = 10,
    PsKernel = 11,
}

impl MemType {
    pub fn from_raw(raw: u8) -> Option<MemType> {
        match raw {
            0 => Some(MemType::Ddr3),
            1 => Some(MemType::Ddr4),
            2 => Some(MemType::Dram),
            3 => Some(MemType::Streaming),
            4 => Some(MemType::PreallocatedGlob),
            5 => Some(MemType::Are),
            6 => Some(MemType::Hbm),
            7 => Some(MemType::Bram),
            8 => Some(MemType::Uram),
            9 => Some(MemType::StreamingConnection),
            10 => Some(MemType::Host),
            11 => Some(MemType::PsKernel),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MemType::Ddr3 => "MEM_DDR3",
            MemType::Ddr4 => "MEM_DDR4",
            MemType::Dram => "MEM_DRAM",
            MemType::Streaming => "MEM_STREAMING",
            MemType::PreallocatedGlob => "MEM_PREALLOCATED_GLOB",
            MemType::Are => "MEM_ARE (Aurora)",
            MemType::Hbm => "MEM_HBM",
            MemType::Bram => "MEM_BRAM",
            MemType::Uram => "MEM_URAM",
            MemType::StreamingConnection => "MEM_STREAMING_CONNECTION",
            MemType::Host => "MEM_HOST",
            MemType::PsKernel => "MEM_PS_KERNEL",
        }
    }

    /// Banks described by a base address and size
    pub fn is_addressed(self) -> bool {
        matches!(self, MemType::Ddr3 | MemType::Ddr4 | MemType::Dram)
    }
}

/// Debug monitor sub-types that decode a smaller register window
pub const AXI_MONITOR_FIFO_LITE: u8 = 5;
pub const AXI_MONITOR_FIFO_FULL: u8 = 6;

/// Label of a raw debug IP type
pub fn debug_ip_label(raw: u8) -> &'static str {
    match raw {
        0 => "UNDEFINED",
        1 => "LAPC",
        2 => "ILA",
        3 => "AXI_MM_MONITOR",
        4 => "AXI_TRACE_FUNNEL",
        AXI_MONITOR_FIFO_LITE => "AXI_MONITOR_FIFO_LITE",
        AXI_MONITOR_FIFO_FULL => "AXI_MONITOR_FIFO_FULL",
        7 => "ACCEL_MONITOR",
        8 => "AXI_STREAM_MONITOR",
        9 => "AXI_STREAM_PROTOCOL_CHECKER",
        10 => "TRACE_S2MM",
        11 => "AXI_DMA",
        12 => "TRACE_S2MM_FULL",
        13 => "AXI_NOC",
        14 => "ACCEL_DEADLOCK_DETECTOR",
        15 => "HSDP_TRACE",
        _ => "invalid",
    }
}

/// One ip-layout record
#[derive(Debug, Clone, Copy)]
pub struct IpData<'a> {
    view: ByteView<'a>,
}

impl<'a> IpData<'a> {
    pub fn raw_type(&self) -> Result<u32> {
        self.view.u32_at(0)
    }

    pub fn ip_type(&self) -> Option<IpType> {
        self.raw_type().ok().and_then(IpType::from_raw)
    }

    pub fn properties(&self) -> Result<u32> {
        self.view.u32_at(4)
    }

    /// Memory controller index, overlapping the properties word
    pub fn index(&self) -> Result<u16> {
        self.view.u16_at(4)
    }

    pub fn pc_index(&self) -> Result<u8> {
        self.view.u8_at(6)
    }

    pub fn base_address(&self) -> Result<u64> {
        self.view.u64_at(8)
    }

    pub fn name(&self) -> Result<&'a str> {
        Ok(fixed_str(self.view.sub(16, 64)?.as_bytes()))
    }
}

/// One debug-ip-layout record
#[derive(Debug, Clone, Copy)]
pub struct DebugIpData<'a> {
    view: ByteView<'a>,
}

impl<'a> DebugIpData<'a> {
    pub fn raw_type(&self) -> Result<u8> {
        self.view.u8_at(0)
    }

    /// Index assembled from its split low and high bytes
    pub fn index(&self) -> Result<u16> {
        let low = self.view.u8_at(1)?;
        let high = self.view.u8_at(5)?;
        Ok(u16::from_le_bytes([low, high]))
    }

    pub fn properties(&self) -> Result<u8> {
        self.view.u8_at(2)
    }

    pub fn major(&self) -> Result<u8> {
        self.view.u8_at(3)
    }

    pub fn minor(&self) -> Result<u8> {
        self.view.u8_at(4)
    }

    pub fn base_address(&self) -> Result<u64> {
        self.view.u64_at(8)
    }

    pub fn name(&self) -> Result<&'a str> {
        Ok(fixed_str(self.view.sub(16, 128)?.as_bytes()))
    }

    /// Check if this monitor decodes the small FIFO register window
    pub fn is_fifo_monitor(&self) -> bool {
        matches!(
            self.raw_type(),
            Ok(AXI_MONITOR_FIFO_LITE | AXI_MONITOR_FIFO_FULL)
        )
    }
}

/// One connectivity record
#[derive(Debug, Clone, Copy)]
pub struct Connection<'a> {
    view: ByteView<'a>,
}

impl Connection<'_> {
    pub fn arg_index(&self) -> Result<i32> {
        self.view.i32_at(0)
    }

    pub fn ip_layout_index(&self) -> Result<i32> {
        self.view.i32_at(4)
    }

    pub fn mem_data_index(&self) -> Result<i32> {
        self.view.i32_at(8)
    }
}

/// One memory-topology record
#[derive(Debug, Clone, Copy)]
pub struct MemData<'a> {
    view: ByteView<'a>,
}

impl<'a> MemData<'a> {
    pub fn raw_type(&self) -> Result<u8> {
        self.view.u8_at(0)
    }

    pub fn mem_type(&self) -> Option<MemType> {
        self.raw_type().ok().and_then(MemType::from_raw)
    }

    pub fn used(&self) -> Result<bool> {
        self.view.u8_at(1).map(|u| u != 0)
    }

    /// Bank size in KiB; the route id for streaming banks
    pub fn size(&self) -> Result<u64> {
        self.view.u64_at(8)
    }

    pub fn route_id(&self) -> Result<u64> {
        self.size()
    }

    /// Bank base address; the flow id for streaming banks
    pub fn base_address(&self) -> Result<u64> {
        self.view.u64_at(16)
    }

    pub fn flow_id(&self) -> Result<u64> {
        self.base_address()
    }

    pub fn tag(&self) -> Result<&'a str> {
        Ok(fixed_str(self.view.sub(24, 16)?.as_bytes()))
    }
}
