//! Accelerator device: slot table, loads and requests
//!
//! The slot table and the shared aperture table sit behind one lock, so
//! loads into different slots are serialized. A load either commits its
//! sections, apertures and uuid together or leaves the device untouched.

use core::fmt::{self, Write};

use arrayvec::ArrayVec;
use serde::Serialize;
use uuid::Uuid;

use acap_api::sync::Mutex;
use acap_api::{Error, Result};

use crate::aperture::{ApertureEntry, ApertureTable, MAX_APERTURES};
use crate::report::XclbinReport;
use crate::sections::SlotSections;
use crate::xclbin::{SectionDirectory, SectionKind, Xclbin, XclbinMode};

pub const MAX_SLOTS: usize = 4;

pub const DRIVER_NAME: &str = "zocl";
pub const DRIVER_DESC: &str = "ZOCL Versal";

/// Device configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoclConfig {
    /// Slots accepting loads, at most [`MAX_SLOTS`]
    pub num_slots: usize,
}

impl Default for ZoclConfig {
    fn default() -> Self {
        Self {
            num_slots: MAX_SLOTS,
        }
    }
}

impl ZoclConfig {
    pub fn validate(&self) -> Result {
        if self.num_slots == 0 || self.num_slots > MAX_SLOTS {
            log::warn!("zocl: invalid slot count {}", self.num_slots);
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DriverVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub name: &'static str,
    pub desc: &'static str,
}

/// A load target; empty until its first successful load
#[derive(Debug, Default)]
pub struct Slot {
    uuid: Option<Uuid>,
    sections: Option<SlotSections>,
}

impl Slot {
    pub fn uuid(&self) -> Option<Uuid> {
        self.uuid
    }

    pub fn sections(&self) -> Option<&SlotSections> {
        self.sections.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.uuid.is_some()
    }
}

#[derive(Debug)]
struct DeviceState {
    slots: [Slot; MAX_SLOTS],
    apertures: ApertureTable<MAX_APERTURES>,
}

/// The accelerator device
pub struct ZoclDevice {
    config: ZoclConfig,
    state: Mutex<DeviceState>,
}

impl ZoclDevice {
    pub fn new(config: ZoclConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: Mutex::new(DeviceState {
                slots: core::array::from_fn(|_| Slot::default()),
                apertures: ApertureTable::new(),
            }),
        })
    }

    pub fn config(&self) -> &ZoclConfig {
        &self.config
    }

    pub fn version(&self) -> DriverVersion {
        DriverVersion {
            major: 1,
            minor: 0,
            patch: 0,
            name: DRIVER_NAME,
            desc: DRIVER_DESC,
        }
    }

    fn check_slot(&self, slot: usize) -> Result {
        if slot >= self.config.num_slots {
            log::info!("zocl: slot out of range: {}", slot);
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }

    /// Load an accelerator container into `slot`
    pub fn load_axlf(&self, slot: usize, bytes: &[u8]) -> Result {
        self.check_slot(slot)?;
        let xclbin = Xclbin::parse(bytes)?;

        if log::log_enabled!(log::Level::Debug) {
            if let Ok(report) = XclbinReport::from_xclbin(&xclbin) {
                log::debug!("{}", report);
            }
        }

        if xclbin.mode()? != Some(XclbinMode::Flat) {
            log::info!("zocl: load-axlf: invalid xclbin mode: {:?}", xclbin.raw_mode());
            return Err(Error::InvalidArgument);
        }

        let uuid = xclbin.uuid()?;
        let mut state = self.state.lock();
        let DeviceState { slots, apertures } = &mut *state;
        let target = &mut slots[slot];

        if target.uuid == Some(uuid) {
            log::info!("zocl: load-axlf: xclbin is already loaded");
            return Err(Error::AlreadyLoaded);
        }

        xclbin.section_info(SectionKind::AieResources).inspect_err(|_| {
            log::info!("zocl: load-axlf: AIE_RESOURCES not found");
        })?;

        let sections = SlotSections::alloc(&xclbin)?;

        let mark = apertures.mark();
        if let Err(e) = apertures.update_apertures(slot, &sections) {
            apertures.rollback(mark);
            return Err(e);
        }

        target.sections = Some(sections);
        target.uuid = Some(uuid);
        log::info!("zocl: load-axlf: slot {}: {}", slot, uuid);
        Ok(())
    }

    /// Uuid of the container loaded in `slot`
    pub fn slot_uuid(&self, slot: usize) -> Result<Option<Uuid>> {
        self.check_slot(slot)?;
        Ok(self.state.lock().slots[slot].uuid())
    }

    /// Run `f` on a slot while holding the device lock
    pub fn with_slot<R>(&self, slot: usize, f: impl FnOnce(&Slot) -> R) -> Result<R> {
        self.check_slot(slot)?;
        Ok(f(&self.state.lock().slots[slot]))
    }

    /// Snapshot of the aperture table
    pub fn apertures(&self) -> ApertureTable<MAX_APERTURES> {
        self.state.lock().apertures.clone()
    }

    pub fn apertures_for_slot(&self, slot: usize) -> ArrayVec<ApertureEntry, MAX_APERTURES> {
        self.state
            .lock()
            .apertures
            .entries_for_slot(slot)
            .copied()
            .collect()
    }

    /// Loaded slots with their container uuids, in slot order
    pub fn xclbin_ids(&self) -> ArrayVec<(usize, Uuid), MAX_SLOTS> {
        let state = self.state.lock();
        state
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.uuid.map(|u| (i, u)))
            .collect()
    }

    /// Answer a named request into `buf`, returning the bytes written
    ///
    /// `buf` is cleared before the response is written.
    pub fn request(&self, request: &str, buf: &mut [u8]) -> Result<usize> {
        buf.fill(0);
        match request {
            "xclbinid" => {
                let mut out = BufWriter::new(buf);
                for (slot, uuid) in self.xclbin_ids() {
                    writeln!(out, "{} {}", slot, uuid).map_err(|_| Error::BufferTooSmall)?;
                }
                Ok(out.written())
            }
            "kds_custat_raw" => Ok(0),
            _ => {
                log::info!("zocl: request: invalid request");
                Err(Error::InvalidArgument)
            }
        }
    }
}

impl fmt::Debug for ZoclDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoclDevice")
            .field("config", &self.config)
            .field("loaded", &self.xclbin_ids().len())
            .finish()
    }
}

/// Bounded text sink over a caller buffer
struct BufWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> BufWriter<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn written(&self) -> usize {
        self.pos
    }
}

impl Write for BufWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.pos.checked_add(s.len()).ok_or(fmt::Error)?;
        let dst = self.buf.get_mut(self.pos..end).ok_or(fmt::Error)?;
        dst.copy_from_slice(s.as_bytes());
        self.pos = end;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_bounds() {
        assert_eq!(ZoclConfig::default().validate(), Ok(()));
        assert_eq!(
            ZoclDevice::new(ZoclConfig { num_slots: 5 }).err().map(|e| e.as_error_code()),
            Some(Error::InvalidArgument.as_error_code())
        );
        assert!(ZoclDevice::new(ZoclConfig { num_slots: 0 }).is_err());
    }

    #[test]
    fn test_slot_bound_is_exclusive() {
        let device = ZoclDevice::new(ZoclConfig { num_slots: 2 }).unwrap();
        assert_eq!(device.slot_uuid(1), Ok(None));
        assert_eq!(device.slot_uuid(2), Err(Error::InvalidArgument));
        assert_eq!(device.load_axlf(2, b"xclbin2\0"), Err(Error::InvalidArgument));
    }

    #[test]
    fn test_version() {
        let device = ZoclDevice::new(ZoclConfig::default()).unwrap();
        let version = device.version();
        assert_eq!((version.major, version.minor, version.patch), (1, 0, 0));
        assert_eq!(version.name, "zocl");
    }

    #[test]
    fn test_buf_writer_overflow() {
        let mut buf = [0u8; 4];
        let mut out = BufWriter::new(&mut buf);
        assert!(out.write_str("abc").is_ok());
        assert!(out.write_str("de").is_err());
        assert_eq!(out.written(), 3);
    }

    #[test]
    fn test_requests_on_empty_device() {
        let device = ZoclDevice::new(ZoclConfig::default()).unwrap();
        let mut buf = [0xFFu8; 16];
        assert_eq!(device.request("xclbinid", &mut buf), Ok(0));
        assert_eq!(buf, [0u8; 16]);
        assert_eq!(device.request("kds_custat_raw", &mut buf), Ok(0));
        assert_eq!(device.request("bogus", &mut buf), Err(Error::InvalidArgument));
    }
}
