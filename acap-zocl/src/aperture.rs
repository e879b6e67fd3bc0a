//! Hardware aperture table
//!
//! One table is shared by every slot. Entries are only ever appended; a
//! populated entry is never reused for the life of the device.

use arrayvec::ArrayVec;
use serde::Serialize;
use static_assertions::const_assert_eq;

use acap_api::{Error, Result};

use crate::sections::SlotSections;

pub const MAX_COMPUTE_UNITS: usize = 128;
pub const MAX_APERTURES: usize = 2 * MAX_COMPUTE_UNITS;

/// Register window of a compute unit
pub const CU_SIZE: u64 = 64 * 1024;
/// Register window of the FIFO monitors
pub const DEBUG_FIFO_SIZE: u64 = 8 * 1024;
pub const DEBUG_IP_SIZE: u64 = 64 * 1024;

/// Compute unit index of an aperture not yet bound to a compute unit
pub const UNASSIGNED_CU: i32 = -1;

const_assert_eq!(MAX_APERTURES, 2 * MAX_COMPUTE_UNITS);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApertureEntry {
    pub base: u64,
    pub size: u64,
    pub properties: u32,
    pub cu_index: i32,
    pub slot_index: usize,
}

/// Table length at some point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApertureMark(usize);

/// Bounded table of hardware windows
#[derive(Debug, Clone)]
pub struct ApertureTable<const N: usize = MAX_APERTURES> {
    entries: ArrayVec<ApertureEntry, N>,
}

impl<const N: usize> Default for ApertureTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ApertureTable<N> {
    pub const fn new() -> Self {
        Self {
            entries: ArrayVec::new_const(),
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of free entries
    pub fn remaining(&self) -> usize {
        N - self.entries.len()
    }

    pub fn entries(&self) -> &[ApertureEntry] {
        &self.entries
    }

    pub fn entries_for_slot(&self, slot_index: usize) -> impl Iterator<Item = &ApertureEntry> {
        self.entries
            .iter()
            .filter(move |e| e.slot_index == slot_index)
    }

    pub fn mark(&self) -> ApertureMark {
        ApertureMark(self.entries.len())
    }

    /// Drop every entry appended since `mark`
    pub fn rollback(&mut self, mark: ApertureMark) {
        if mark.0 < self.entries.len() {
            log::debug!(
                "zocl: apertures: rolling back {} entries",
                self.entries.len() - mark.0
            );
            self.entries.truncate(mark.0);
        }
    }

    fn push(&mut self, entry: ApertureEntry, what: &str) -> Result {
        self.entries.try_push(entry).map_err(|_| {
            log::info!("zocl: update-apt: no apertures free for {}", what);
            Error::OutOfSpace
        })
    }

    /// Append an entry for every ip and debug-ip record of a slot
    ///
    /// Entries written before running out of space stay in the table.
    pub fn update_apertures(&mut self, slot_index: usize, sections: &SlotSections) -> Result {
        let ip_layout = sections.ip_layout();
        let debug_ip_layout = sections.debug_ip_layout();
        let total = ip_layout.count() + debug_ip_layout.count();
        if total == 0 {
            return Ok(());
        }
        if total > N {
            log::info!("zocl: update-apt: invalid number of apertures: {}", total);
            return Err(Error::InvalidFormat);
        }

        for ip in ip_layout.iter() {
            let entry = ApertureEntry {
                base: ip.base_address()?,
                size: CU_SIZE,
                properties: ip.properties()?,
                cu_index: UNASSIGNED_CU,
                slot_index,
            };
            self.push(entry, "ip")?;
        }

        for dip in debug_ip_layout.iter() {
            let size = if dip.is_fifo_monitor() {
                DEBUG_FIFO_SIZE
            } else {
                DEBUG_IP_SIZE
            };
            let entry = ApertureEntry {
                base: dip.base_address()?,
                size,
                properties: 0,
                cu_index: UNASSIGNED_CU,
                slot_index,
            };
            self.push(entry, "debug-ip")?;
        }

        log::debug!(
            "zocl: slot {}: {} apertures, {} free",
            slot_index,
            total,
            self.remaining()
        );
        Ok(())
    }
}
