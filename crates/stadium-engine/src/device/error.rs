use thiserror::Error;

use super::types::ShaderStage;

/// Failure to create a GPU object from otherwise valid decoded data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// The backend has no such programmable stage.
    #[error("{0:?} shaders are not supported by this device")]
    UnsupportedStage(ShaderStage),

    /// Bytecode rejected by the device.
    #[error("malformed bytecode for `{label}`: {reason}")]
    InvalidBytecode { label: String, reason: String },

    /// Zero-sized or otherwise unusable buffer description.
    #[error("invalid buffer `{label}`: {reason}")]
    InvalidBuffer { label: String, reason: String },

    /// Resource limits exceeded.
    #[error("out of device memory while creating `{0}`")]
    OutOfMemory(String),

    /// Backend-specific failure.
    #[error("device error: {0}")]
    Backend(String),
}
