//! Secure hand-off of a verified PDI to firmware
//!
//! Validation runs without any lock. The data cache is written back over
//! the whole image before the hand-off lock is taken, and only the
//! privileged call itself runs under the lock. Firmware reads the image
//! from its identity-mapped address.

use acap_api::firmware::{DataCache, SecureMonitor, lower_32, upper_32};
use acap_api::sync::Mutex;
use acap_api::Result;

use super::api::PmApi;
use super::context::PmContext;
use super::status;
use crate::image::container::locate_image_header_table;

/// Serializes every privileged load hand-off in the system
pub(crate) static HANDOFF_LOCK: Mutex<()> = Mutex::new(());

/// Check if a load hand-off is in progress
pub fn handoff_in_progress() -> bool {
    HANDOFF_LOCK.is_locked()
}

/// Progress of a single load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Validating,
    /// The image failed validation and never reached firmware
    Rejected,
    Transferring,
    Committed,
    /// Firmware refused the image
    Failed,
}

impl LoadPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadPhase::Rejected | LoadPhase::Committed | LoadPhase::Failed)
    }
}

/// Terminal phase and result of a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    pub phase: LoadPhase,
    pub result: Result<u32>,
}

/// Forwards validated PDIs to firmware
pub struct SecureLoadGateway<'a, M: SecureMonitor, C: DataCache> {
    ctx: &'a PmContext<M, C>,
    phase: LoadPhase,
}

impl<'a, M: SecureMonitor, C: DataCache> SecureLoadGateway<'a, M, C> {
    pub fn new(ctx: &'a PmContext<M, C>) -> Self {
        Self {
            ctx,
            phase: LoadPhase::Idle,
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// Load `image`, returning the firmware status word
    pub fn load(&mut self, image: &[u8]) -> Result<u32> {
        self.load_traced(image).result
    }

    /// Load `image` and report the phase the load ended in
    pub fn load_traced(&mut self, image: &[u8]) -> LoadOutcome {
        self.phase = LoadPhase::Validating;
        if let Err(e) = locate_image_header_table(image) {
            log::info!("pm: acap load: corrupt image: {}", e);
            return self.finish(LoadPhase::Rejected, Err(e));
        }

        self.phase = LoadPhase::Transferring;
        let addr = image.as_ptr() as u64;
        self.ctx
            .data_cache()
            .flush_range(image.as_ptr() as usize, image.len());
        let response = {
            let _handoff = HANDOFF_LOCK.lock();
            self.ctx.call_raw(
                PmApi::LoadPdi,
                [
                    self.ctx.config().pdi_source,
                    lower_32(addr),
                    upper_32(addr),
                    0,
                    0,
                ],
            )
        };

        match status::check(&response) {
            Ok(()) => self.finish(LoadPhase::Committed, Ok(response.payload[0])),
            Err(e) => {
                log::warn!(
                    "pm: acap load: firmware status {}: {}",
                    response.payload[0],
                    e
                );
                self.finish(LoadPhase::Failed, Err(e))
            }
        }
    }

    fn finish(&mut self, phase: LoadPhase, result: Result<u32>) -> LoadOutcome {
        debug_assert!(phase.is_terminal());
        self.phase = phase;
        log::debug!("pm: acap load: {:?}", phase);
        LoadOutcome { phase, result }
    }
}
