//! Platform-management context
//!
//! [`PmContext`] owns the privileged-call and cache collaborators together
//! with the feature-status cache. Every firmware query goes through it.

use alloc::vec::Vec;

use acap_api::firmware::{
    DataCache, SMCCC_SUCCESS, SecureMonitor, SmcResponse, lower_32, upper_32,
};
use acap_api::sync::Mutex;
use acap_api::{Error, Result};
use hashbrown::HashMap;
use serde::Serialize;

use super::api::PmApi;
use super::flags::FpgaLoadFlags;
use super::gateway::{HANDOFF_LOCK, SecureLoadGateway};
use super::status;

/// Boot source the loader asks firmware to read a PDI from
pub const PDI_SRC_DDR: u32 = 0xF;

/// Platform-management configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PmConfig {
    /// Boot source passed with PDI loads
    pub pdi_source: u32,
}

impl Default for PmConfig {
    fn default() -> Self {
        Self {
            pdi_source: PDI_SRC_DDR,
        }
    }
}

/// Firmware API version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApiVersion {
    pub major: u16,
    pub minor: u16,
}

/// Device identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChipId {
    pub idcode: u32,
    pub version: u32,
}

/// One row of the feature listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureRow {
    pub api: PmApi,
    pub sip_id: u32,
    pub status: Result,
}

/// Firmware status of each feature query, filled on first use
///
/// Entries are never invalidated. A query whose transport failed is not
/// recorded, so it is retried on the next use.
#[derive(Debug, Default)]
pub struct FeatureCache {
    entries: Mutex<HashMap<PmApi, u32>>,
}

impl FeatureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached firmware status of `api`, if it was queried
    pub fn get(&self, api: PmApi) -> Option<u32> {
        self.entries.lock().get(&api).copied()
    }

    fn insert(&self, api: PmApi, status: u32) {
        self.entries.lock().insert(api, status);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Handle to the platform-management firmware
pub struct PmContext<M: SecureMonitor, C: DataCache> {
    monitor: M,
    cache: C,
    config: PmConfig,
    features: FeatureCache,
}

impl<M: SecureMonitor, C: DataCache> PmContext<M, C> {
    pub fn new(monitor: M, cache: C) -> Self {
        Self::with_config(monitor, cache, PmConfig::default())
    }

    pub fn with_config(monitor: M, cache: C, config: PmConfig) -> Self {
        Self {
            monitor,
            cache,
            config,
            features: FeatureCache::new(),
        }
    }

    pub fn config(&self) -> &PmConfig {
        &self.config
    }

    pub fn monitor(&self) -> &M {
        &self.monitor
    }

    pub fn feature_cache(&self) -> &FeatureCache {
        &self.features
    }

    pub fn data_cache(&self) -> &C {
        &self.cache
    }

    /// Issue a call without interpreting its status
    pub fn call_raw(&self, api: PmApi, args: [u32; 5]) -> SmcResponse {
        self.monitor.call(api.sip_id(), args)
    }

    /// Issue a call and translate its status
    pub fn invoke(&self, api: PmApi, args: [u32; 5]) -> Result<SmcResponse> {
        let response = self.call_raw(api, args);
        status::check(&response).map(|()| response)
    }

    /// Check that firmware implements `api`
    pub fn feature_check(&self, api: PmApi) -> Result {
        let status = match self.features.get(api) {
            Some(status) => status,
            None => {
                let response = self.call_raw(PmApi::FeatureCheck, [api.id(), 0, 0, 0, 0]);
                if !response.is_handled() {
                    log::info!("pm: feature check {}: transport failed: {}", api, response.ret);
                    status::check(&response)?;
                }
                let status = response.payload[0];
                self.features.insert(api, status);
                status
            }
        };
        status::translate(SMCCC_SUCCESS, status)
    }

    pub fn api_version(&self) -> Result<ApiVersion> {
        self.feature_check(PmApi::GetApiVersion)?;
        let response = self.invoke(PmApi::GetApiVersion, [0; 5])?;
        let word = response.payload[1];
        Ok(ApiVersion {
            major: (word >> 16) as u16,
            minor: (word & 0xffff) as u16,
        })
    }

    pub fn chip_id(&self) -> Result<ChipId> {
        self.feature_check(PmApi::GetChipId)?;
        let response = self.invoke(PmApi::GetChipId, [0; 5])?;
        Ok(ChipId {
            idcode: response.payload[1],
            version: response.payload[2],
        })
    }

    /// Hand a bitstream to the FPGA manager, returning the firmware status
    /// word
    pub fn fpga_load(&self, image: &[u8], flags: FpgaLoadFlags) -> Result<u32> {
        let flags = flags.validate()?;
        let size = u32::try_from(image.len()).map_err(|_| Error::InvalidArgument)?;
        let addr = image.as_ptr() as u64;
        self.cache.flush_range(image.as_ptr() as usize, image.len());
        let response = {
            let _handoff = HANDOFF_LOCK.lock();
            self.call_raw(
                PmApi::FpgaLoad,
                [lower_32(addr), upper_32(addr), size, flags.bits(), 0],
            )
        };
        if let Err(e) = status::check(&response) {
            log::warn!("pm: fpga load failed: status {}: {}", response.payload[0], e);
            return Err(e);
        }
        Ok(response.payload[0])
    }

    /// Current FPGA manager status word
    pub fn fpga_status(&self) -> Result<u32> {
        self.feature_check(PmApi::FpgaGetStatus)?;
        let response = self.invoke(PmApi::FpgaGetStatus, [0; 5])?;
        Ok(response.payload[1])
    }

    /// Query every known call
    pub fn features(&self) -> Vec<FeatureRow> {
        PmApi::ALL
            .iter()
            .map(|&api| FeatureRow {
                api,
                sip_id: api.sip_id(),
                status: self.feature_check(api),
            })
            .collect()
    }

    /// Validate a PDI and hand it to firmware, returning the firmware
    /// status word
    pub fn acap_load(&self, image: &[u8]) -> Result<u32> {
        SecureLoadGateway::new(self).load(image)
    }
}

impl<M: SecureMonitor, C: DataCache> core::fmt::Debug for PmContext<M, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PmContext")
            .field("config", &self.config)
            .field("features", &self.features.len())
            .finish()
    }
}
