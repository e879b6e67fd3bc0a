//! Firmware status translation

use acap_api::firmware::{SMCCC_NOT_SUPPORTED, SMCCC_SUCCESS, SmcResponse};
use acap_api::{Error, Result};

pub const PM_STATUS_SUCCESS: u32 = 0;
pub const PM_STATUS_INVALID_VERSION: u32 = 4;
pub const PM_STATUS_NO_FEATURE: u32 = 19;
pub const PM_STATUS_INTERNAL: u32 = 2000;
pub const PM_STATUS_CONFLICT: u32 = 2001;
pub const PM_STATUS_NO_ACCESS: u32 = 2002;
pub const PM_STATUS_INVALID_NODE: u32 = 2003;
pub const PM_STATUS_DOUBLE_REQ: u32 = 2004;
pub const PM_STATUS_ABORT_SUSPEND: u32 = 2005;
pub const PM_STATUS_MULT_USER: u32 = 2008;

/// Map a transport status and the firmware status word to a result
pub fn translate(ret: i32, status: u32) -> Result {
    match ret {
        SMCCC_SUCCESS => match status {
            PM_STATUS_SUCCESS | PM_STATUS_DOUBLE_REQ => Ok(()),
            PM_STATUS_NO_FEATURE | PM_STATUS_INVALID_VERSION => Err(Error::NotSupported),
            PM_STATUS_NO_ACCESS => Err(Error::NoAccess),
            PM_STATUS_ABORT_SUSPEND => Err(Error::Aborted),
            PM_STATUS_MULT_USER => Err(Error::Io),
            PM_STATUS_INTERNAL => Err(Error::Internal),
            PM_STATUS_CONFLICT => Err(Error::Conflict),
            _ => Err(Error::InvalidArgument),
        },
        SMCCC_NOT_SUPPORTED => Err(Error::NotSupported),
        _ => Err(Error::InvalidArgument),
    }
}

/// Translate a raw call response
pub fn check(response: &SmcResponse) -> Result {
    translate(response.ret, response.payload[0])
}
