//! GPU resource construction.
//!
//! `SceneManifest` says what to build, `ResourceBuilder` builds it through the
//! task graph, and `BuiltScene` is what the frame orchestrator draws from once
//! the readiness gate is open.

mod builder;
mod drawable;
mod manifest;

pub use builder::{BuildTicket, ResourceBuilder, SCENE_JOIN};
pub use drawable::{BuiltScene, ConstantBuffers, Drawable, ShaderSet};
pub use manifest::{names, ConstantSlot, DrawableDesc, SceneManifest, ShaderProgram, ShaderSetDesc};
