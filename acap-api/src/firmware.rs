//! Privileged firmware call interface
//!
//! The loaders never touch secure-monitor registers directly. They go
//! through [`SecureMonitor`], which issues one SMC64 SiP call and returns
//! the raw status plus four result words, and [`DataCache`], which writes
//! dirty lines back to memory before firmware reads a buffer by address.

use static_assertions::const_assert_eq;

/// SMC calling-convention status: call handled
pub const SMCCC_SUCCESS: i32 = 0;
/// SMC calling-convention status: function id unknown to the monitor
pub const SMCCC_NOT_SUPPORTED: i32 = -1;
/// SMC calling-convention status: call not required
pub const SMCCC_NOT_REQUIRED: i32 = -2;

/// Fast-call, SMC64, SiP service owner
pub const SIP_FAST_CALL_BASE: u32 = 0xC200_0000;
const SIP_FUNCTION_MASK: u32 = 0xFFFF;

const_assert_eq!(SIP_FAST_CALL_BASE & SIP_FUNCTION_MASK, 0);

/// Build the SiP function id for a firmware API id
#[inline]
pub const fn sip_function_id(api_id: u32) -> u32 {
    SIP_FAST_CALL_BASE | (api_id & SIP_FUNCTION_MASK)
}

/// Low 32 bits of a 64-bit argument
#[inline]
pub const fn lower_32(value: u64) -> u32 {
    value as u32
}

/// High 32 bits of a 64-bit argument
#[inline]
pub const fn upper_32(value: u64) -> u32 {
    (value >> 32) as u32
}

/// Raw result of a privileged call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SmcResponse {
    /// Calling-convention status returned in the first result register
    pub ret: i32,
    /// Result words; `payload[0]` is the firmware status of the API
    pub payload: [u32; 4],
}

impl SmcResponse {
    pub const fn new(ret: i32, payload: [u32; 4]) -> Self {
        Self { ret, payload }
    }

    /// Response of a handled call with the given payload
    pub const fn ok(payload: [u32; 4]) -> Self {
        Self::new(SMCCC_SUCCESS, payload)
    }

    /// Check if the call reached the firmware
    pub fn is_handled(&self) -> bool {
        self.ret == SMCCC_SUCCESS
    }
}

/// Issues a single privileged call
///
/// Implementations must be safe to call from several threads; callers
/// serialize the calls that need it.
pub trait SecureMonitor: Send + Sync {
    fn call(&self, function_id: u32, args: [u32; 5]) -> SmcResponse;
}

/// Data-cache maintenance
pub trait DataCache: Send + Sync {
    /// Write back every line covering `[addr, addr + len)`
    fn flush_range(&self, addr: usize, len: usize);
}

/// Cache maintenance for targets whose buffers are already coherent
#[derive(Debug, Clone, Copy, Default)]
pub struct CoherentCache;

impl DataCache for CoherentCache {
    fn flush_range(&self, _addr: usize, _len: usize) {}
}
