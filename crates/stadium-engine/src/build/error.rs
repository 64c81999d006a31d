use std::sync::Arc;

use thiserror::Error;

use crate::device::DeviceError;

/// Why a build node did not produce its result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// The loader has no resource with this name.
    #[error("resource `{name}` not found")]
    NotFound { name: String },

    /// The loader found the resource but could not read it.
    #[error("failed to read `{name}`: {reason}")]
    Io { name: String, reason: String },

    /// Mesh or texture bytes could not be decoded.
    #[error("failed to decode `{name}`: {reason}")]
    Decode { name: String, reason: String },

    /// The device refused to create a handle from decoded data.
    #[error("device failed to create `{label}`: {source}")]
    DeviceCreation {
        label: String,
        #[source]
        source: DeviceError,
    },

    /// An upstream node failed, so this one never ran.
    #[error("`{node}` skipped because `{failed}` failed")]
    Dependency {
        node: String,
        failed: String,
        #[source]
        cause: Arc<BuildError>,
    },

    /// The task body panicked on its worker.
    #[error("task `{label}` panicked: {reason}")]
    Panicked { label: String, reason: String },

    /// The result was requested before the node fired, or was already taken.
    #[error("result of `{label}` is not available")]
    Unavailable { label: String },

    /// The scene description refers to something it does not declare.
    #[error("invalid scene manifest: {0}")]
    Manifest(String),
}

impl BuildError {
    pub fn device(label: impl Into<String>, source: DeviceError) -> Self {
        Self::DeviceCreation { label: label.into(), source }
    }

    pub fn decode(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode { name: name.into(), reason: reason.to_string() }
    }

    /// Follows `Dependency` links down to the failure that started the chain.
    pub fn root_cause(&self) -> &BuildError {
        let mut err = self;
        while let BuildError::Dependency { cause, .. } = err {
            err = cause;
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_cause_unwinds_dependency_chains() {
        let io = BuildError::NotFound { name: "VertexShader.cso".into() };
        let mid = BuildError::Dependency {
            node: "shader:vertex".into(),
            failed: "load:VertexShader.cso".into(),
            cause: Arc::new(io.clone()),
        };
        let top = BuildError::Dependency {
            node: "drawable:floor".into(),
            failed: "shader:vertex".into(),
            cause: Arc::new(mid),
        };
        assert_eq!(top.root_cause(), &io);
        assert_eq!(io.root_cause(), &io);
    }
}
