//! Platform-management firmware interface

pub mod api;
pub mod context;
pub mod flags;
pub mod gateway;
pub mod status;

pub use api::PmApi;
pub use context::{ApiVersion, ChipId, FeatureCache, FeatureRow, PmConfig, PmContext};
pub use flags::FpgaLoadFlags;
pub use gateway::{LoadOutcome, LoadPhase, SecureLoadGateway};
