//! FPGA load flags

use acap_api::{Error, Result};
use bitflags::bitflags;

bitflags! {
    /// Options passed with a full or partial FPGA load
    ///
    /// An empty set requests a full, unauthenticated, unencrypted load.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FpgaLoadFlags: u32 {
        const PARTIAL = 1 << 0;
        const AUTH_DDR = 1 << 1;
        const AUTH_OCM = 1 << 2;
        const ENC_USERKEY = 1 << 3;
        const ENC_DEVKEY = 1 << 4;
    }
}

impl FpgaLoadFlags {
    pub const FULL: FpgaLoadFlags = FpgaLoadFlags::empty();

    /// Reject combinations firmware cannot honour
    pub fn validate(self) -> Result<Self> {
        if self.contains(FpgaLoadFlags::AUTH_DDR | FpgaLoadFlags::AUTH_OCM) {
            log::warn!("pm: fpga load: DDR and OCM authentication are exclusive");
            return Err(Error::InvalidArgument);
        }
        if self.contains(FpgaLoadFlags::ENC_USERKEY | FpgaLoadFlags::ENC_DEVKEY) {
            log::warn!("pm: fpga load: user and device key encryption are exclusive");
            return Err(Error::InvalidArgument);
        }
        Ok(self)
    }

    /// Parse a load command option
    pub fn from_option(option: &str) -> Option<FpgaLoadFlags> {
        match option {
            "-p" | "--partial" => Some(FpgaLoadFlags::PARTIAL),
            "--auth-ddr" => Some(FpgaLoadFlags::AUTH_DDR),
            "--auth-ocm" => Some(FpgaLoadFlags::AUTH_OCM),
            "--userkey" => Some(FpgaLoadFlags::ENC_USERKEY),
            "--devkey" => Some(FpgaLoadFlags::ENC_DEVKEY),
            _ => None,
        }
    }

    /// Combine load command options and validate the result
    pub fn parse<'a, I>(options: I) -> Result<FpgaLoadFlags>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut flags = FpgaLoadFlags::FULL;
        for option in options {
            flags |= FpgaLoadFlags::from_option(option).ok_or_else(|| {
                log::info!("pm: fpga load: invalid option: {}", option);
                Error::InvalidArgument
            })?;
        }
        flags.validate()
    }
}
