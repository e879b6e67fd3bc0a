//! Slot section store
//!
//! A slot keeps private copies of the five metadata sections it needs after
//! the container buffer is gone. All five live in one allocation; the
//! typed accessors hand out views over sub-ranges of it.

use alloc::vec::Vec;
use core::ops::Range;

use acap_api::view::ByteView;
use acap_api::{Error, Result};

use crate::layout::{Connectivity, DebugIpLayout, IpLayout, Layout, MemTopology, Records};
use crate::xclbin::{SectionDirectory, SectionKind};

/// Borrowed, validated views of the five sections of a container
#[derive(Debug, Clone, Copy)]
pub struct SectionRefs<'a> {
    pub ip_layout: IpLayout<'a>,
    pub debug_ip_layout: DebugIpLayout<'a>,
    pub connectivity: Connectivity<'a>,
    pub mem_topology: MemTopology<'a>,
    pub aie_metadata: &'a [u8],
}

impl SectionRefs<'_> {
    /// Bytes needed to hold all five sections
    pub fn total_len(&self) -> usize {
        self.ip_layout.as_bytes().len()
            + self.debug_ip_layout.as_bytes().len()
            + self.aie_metadata.len()
            + self.connectivity.as_bytes().len()
            + self.mem_topology.as_bytes().len()
    }
}

fn lookup<'a, D: SectionDirectory + ?Sized>(dir: &'a D, kind: SectionKind) -> Result<&'a [u8]> {
    dir.section_bytes(kind).inspect_err(|_| {
        log::info!("zocl: get-slot-sect: {} not found", kind.label());
    })
}

fn records<'a, L: Layout, D: SectionDirectory + ?Sized>(dir: &'a D) -> Result<Records<'a, L>> {
    let bytes = lookup(dir, L::KIND)?;
    Records::parse(bytes).inspect_err(|_| {
        log::info!("zocl: get-slot-sect: invalid {} size", L::KIND.label());
    })
}

/// Look up and validate the slot sections
///
/// The lookups run in a fixed order and stop at the first failure.
pub fn get_slot_sections<D: SectionDirectory + ?Sized>(dir: &D) -> Result<SectionRefs<'_>> {
    let ip_layout: IpLayout<'_> = records(dir)?;
    let debug_ip_layout: DebugIpLayout<'_> = records(dir)?;
    let connectivity: Connectivity<'_> = records(dir)?;
    let mem_topology: MemTopology<'_> = records(dir)?;
    let aie_metadata = lookup(dir, SectionKind::AieMetadata)?;
    Ok(SectionRefs {
        ip_layout,
        debug_ip_layout,
        connectivity,
        mem_topology,
        aie_metadata,
    })
}

/// Owned copies of the five slot sections in a single block
#[derive(Debug)]
pub struct SlotSections {
    block: Vec<u8>,
    ip_layout: (Range<usize>, usize),
    debug_ip_layout: (Range<usize>, usize),
    aie_metadata: Range<usize>,
    connectivity: (Range<usize>, usize),
    mem_topology: (Range<usize>, usize),
}

fn append(block: &mut Vec<u8>, bytes: &[u8]) -> Range<usize> {
    let start = block.len();
    block.extend_from_slice(bytes);
    start..block.len()
}

impl SlotSections {
    /// Validate the sections of `dir` and copy them into one allocation
    ///
    /// Nothing is allocated unless all five sections are present and valid.
    pub fn alloc<D: SectionDirectory + ?Sized>(dir: &D) -> Result<Self> {
        let refs = get_slot_sections(dir)?;
        let total = refs.total_len();

        let mut block = Vec::new();
        block.try_reserve_exact(total).map_err(|_| {
            log::warn!("zocl: slot-sect-alloc: no memory for {} bytes", total);
            Error::NoMemory
        })?;

        let ip = append(&mut block, refs.ip_layout.as_bytes());
        let debug_ip = append(&mut block, refs.debug_ip_layout.as_bytes());
        let aie_metadata = append(&mut block, refs.aie_metadata);
        let connectivity = append(&mut block, refs.connectivity.as_bytes());
        let mem_topology = append(&mut block, refs.mem_topology.as_bytes());
        debug_assert_eq!(block.len(), total);

        log::debug!("zocl: slot-sect-alloc: {} bytes", total);
        Ok(Self {
            block,
            ip_layout: (ip, refs.ip_layout.count()),
            debug_ip_layout: (debug_ip, refs.debug_ip_layout.count()),
            aie_metadata,
            connectivity: (connectivity, refs.connectivity.count()),
            mem_topology: (mem_topology, refs.mem_topology.count()),
        })
    }

    fn records<L: Layout>(&self, (range, count): &(Range<usize>, usize)) -> Records<'_, L> {
        let bytes = self.block.get(range.clone()).unwrap_or_default();
        Records::validated(ByteView::new(bytes), *count)
    }

    pub fn ip_layout(&self) -> IpLayout<'_> {
        self.records(&self.ip_layout)
    }

    pub fn debug_ip_layout(&self) -> DebugIpLayout<'_> {
        self.records(&self.debug_ip_layout)
    }

    pub fn connectivity(&self) -> Connectivity<'_> {
        self.records(&self.connectivity)
    }

    pub fn mem_topology(&self) -> MemTopology<'_> {
        self.records(&self.mem_topology)
    }

    pub fn aie_metadata(&self) -> &[u8] {
        self.block.get(self.aie_metadata.clone()).unwrap_or_default()
    }

    /// The whole block, sections in copy order
    pub fn as_bytes(&self) -> &[u8] {
        &self.block
    }

    pub fn len(&self) -> usize {
        self.block.len()
    }

    pub fn is_empty(&self) -> bool {
        self.block.is_empty()
    }
}

/// Copy the slot sections of `dir` into one owned block
pub fn alloc_slot_sections<D: SectionDirectory + ?Sized>(dir: &D) -> Result<SlotSections> {
    SlotSections::alloc(dir)
}

/// Release a slot's sections as a whole
pub fn free_slot_sections(sections: SlotSections) {
    drop(sections);
}
