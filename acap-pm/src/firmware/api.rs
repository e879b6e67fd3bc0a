//! Platform-management API identifiers

use acap_api::firmware::sip_function_id;

macro_rules! pm_apis {
    ($($variant:ident = $id:literal => $label:literal,)*) => {
        /// Platform-management firmware call
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum PmApi {
            $($variant,)*
        }

        impl PmApi {
            /// Every call, in firmware id order
            pub const ALL: &'static [PmApi] = &[$(PmApi::$variant,)*];

            /// Firmware API id of the call
            pub const fn id(self) -> u32 {
                match self {
                    $(PmApi::$variant => $id,)*
                }
            }

            /// Firmware name of the call
            pub const fn label(self) -> &'static str {
                match self {
                    $(PmApi::$variant => $label,)*
                }
            }
        }
    };
}

pm_apis! {
    GetApiVersion = 0x1 => "PM_GET_API_VERSION",
    SetConfiguration = 0x2 => "PM_SET_CONFIGURATION",
    GetNodeStatus = 0x3 => "PM_GET_NODE_STATUS",
    GetOpCharacteristic = 0x4 => "PM_GET_OP_CHARACTERISTIC",
    RegisterNotifier = 0x5 => "PM_REGISTER_NOTIFIER",
    RequestSuspend = 0x6 => "PM_REQUEST_SUSPEND",
    SelfSuspend = 0x7 => "PM_SELF_SUSPEND",
    ForcePowerdown = 0x8 => "PM_FORCE_POWERDOWN",
    AbortSuspend = 0x9 => "PM_ABORT_SUSPEND",
    RequestWakeup = 0xA => "PM_REQUEST_WAKEUP",
    SetWakeupSource = 0xB => "PM_SET_WAKEUP_SOURCE",
    SystemShutdown = 0xC => "PM_SYSTEM_SHUTDOWN",
    RequestNode = 0xD => "PM_REQUEST_NODE",
    ReleaseNode = 0xE => "PM_RELEASE_NODE",
    SetRequirement = 0xF => "PM_SET_REQUIREMENT",
    SetMaxLatency = 0x10 => "PM_SET_MAX_LATENCY",
    ResetAssert = 0x11 => "PM_RESET_ASSERT",
    ResetGetStatus = 0x12 => "PM_RESET_GET_STATUS",
    MmioWrite = 0x13 => "PM_MMIO_WRITE",
    MmioRead = 0x14 => "PM_MMIO_READ",
    InitFinalize = 0x15 => "PM_INIT_FINALIZE",
    FpgaLoad = 0x16 => "PM_FPGA_LOAD",
    FpgaGetStatus = 0x17 => "PM_FPGA_GET_STATUS",
    GetChipId = 0x18 => "PM_GET_CHIPID",
    SecureRsaAes = 0x19 => "PM_SECURE_RSA_AES",
    SecureSha = 0x1A => "PM_SECURE_SHA",
    SecureRsa = 0x1B => "PM_SECURE_RSA",
    PinctrlRequest = 0x1C => "PM_PINCTRL_REQUEST",
    PinctrlRelease = 0x1D => "PM_PINCTRL_RELEASE",
    PinctrlGetFunction = 0x1E => "PM_PINCTRL_GET_FUNCTION",
    PinctrlSetFunction = 0x1F => "PM_PINCTRL_SET_FUNCTION",
    PinctrlConfigParamGet = 0x20 => "PM_PINCTRL_CONFIG_PARAM_GET",
    PinctrlConfigParamSet = 0x21 => "PM_PINCTRL_CONFIG_PARAM_SET",
    Ioctl = 0x22 => "PM_IOCTL",
    QueryData = 0x23 => "PM_QUERY_DATA",
    ClockEnable = 0x24 => "PM_CLOCK_ENABLE",
    ClockDisable = 0x25 => "PM_CLOCK_DISABLE",
    ClockGetState = 0x26 => "PM_CLOCK_GETSTATE",
    ClockSetDivider = 0x27 => "PM_CLOCK_SETDIVIDER",
    ClockGetDivider = 0x28 => "PM_CLOCK_GETDIVIDER",
    ClockSetRate = 0x29 => "PM_CLOCK_SETRATE",
    ClockGetRate = 0x2A => "PM_CLOCK_GETRATE",
    ClockSetParent = 0x2B => "PM_CLOCK_SETPARENT",
    ClockGetParent = 0x2C => "PM_CLOCK_GETPARENT",
    SecureImage = 0x2D => "PM_SECURE_IMAGE",
    FpgaRead = 0x2E => "PM_FPGA_READ",
    Reserved1 = 0x2F => "PM_API_RESERVED_1",
    PllSetParameter = 0x30 => "PM_PLL_SET_PARAMETER",
    PllGetParameter = 0x31 => "PM_PLL_GET_PARAMETER",
    PllSetMode = 0x32 => "PM_PLL_SET_MODE",
    PllGetMode = 0x33 => "PM_PLL_GET_MODE",
    RegisterAccess = 0x34 => "PM_REGISTER_ACCESS",
    EfuseAccess = 0x35 => "PM_EFUSE_ACCESS",
    AddSubsystem = 0x36 => "PM_ADD_SUBSYSTEM",
    DestroySubsystem = 0x37 => "PM_DESTROY_SUBSYSTEM",
    DescribeNodes = 0x38 => "PM_DESCRIBE_NODES",
    AddNode = 0x39 => "PM_ADD_NODE",
    AddNodeParent = 0x3A => "PM_ADD_NODE_PARENT",
    AddNodeName = 0x3B => "PM_ADD_NODE_NAME",
    AddRequirement = 0x3C => "PM_ADD_REQUIREMENT",
    SetCurrentSubsystem = 0x3D => "PM_SET_CURRENT_SUBSYSTEM",
    InitNode = 0x3E => "PM_INIT_NODE",
    FeatureCheck = 0x3F => "PM_FEATURE_CHECK",
    IsoControl = 0x40 => "PM_ISO_CONTROL",
    ActivateSubsystem = 0x41 => "PM_ACTIVATE_SUBSYSTEM",
    WriteAesKey = 0x568 => "PM_WRITE_AES_KEY",
    LoadPdi = 0x701 => "PM_LOAD_PDI",
    GetUidInfoList = 0x705 => "PM_GET_UID_INFO_LIST",
    GetMetaHeaderInfoList = 0x706 => "PM_GET_META_HEADER_INFO_LIST",
    GetCallbackData = 0xA01 => "GET_CALLBACK_DATA",
    SetSuspendMode = 0xA02 => "PM_SET_SUSPEND_MODE",
    GetTrustzoneVersion = 0xA03 => "PM_GET_TRUSTZONE_VERSION",
    RegisterSgi = 0xA04 => "TF_A_PM_REGISTER_SGI",
    BbramWriteKey = 0xB01 => "PM_BBRAM_WRITE_KEY",
    BbramZeroize = 0xB02 => "PM_BBRAM_ZEROIZE",
    BbramWriteUserdata = 0xB03 => "PM_BBRAM_WRITE_USERDATA",
    BbramReadUserdata = 0xB04 => "PM_BBRAM_READ_USERDATA",
    BbramLockUserdata = 0xB05 => "PM_BBRAM_LOCK_USERDATA",
}

impl PmApi {
    /// SiP function id used to issue the call
    pub const fn sip_id(self) -> u32 {
        sip_function_id(self.id())
    }

    /// Look a call up by its firmware API id
    pub fn from_id(id: u32) -> Option<PmApi> {
        Self::ALL.iter().copied().find(|api| api.id() == id)
    }
}

impl core::fmt::Display for PmApi {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}
