//! Stadium engine crate.
//!
//! Builds the scene's GPU resources through an asynchronous task graph and,
//! once they are ready, animates the camera and lights and records the draw
//! passes of every frame.

pub mod assets;
pub mod build;
pub mod config;
pub mod device;
pub mod input;
pub mod logging;
pub mod render;
pub mod resources;
pub mod scene;
pub mod time;

pub use config::RendererConfig;
pub use render::Renderer;
