//! Frame rendering.
//!
//! The orchestrator turns camera and light state into constant-buffer
//! updates, then walks the built scene and records one `DrawPass` per
//! drawable into a `CommandSink`. `Renderer` wires it to the resource
//! builder, the camera and the light animator. `WgpuSink` replays a
//! recorded frame into wgpu render passes.

mod cmd;
mod constants;
mod orchestrator;
mod pass;
mod plan;
mod renderer;
mod sink;
mod wgpu_sink;

pub use cmd::DrawCommand;
pub use constants::{InstancedModelViewProjection, ModelViewProjection, MAX_INSTANCES};
pub use orchestrator::{FrameOrchestrator, FrameOutcome, FrameState};
pub use pass::{DrawPass, DIFFUSE_TEXTURE_SLOT, LIGHT_CONSTANTS_SLOT, OBJECT_CONSTANTS_SLOT};
pub use plan::{FramePlan, PipelineKey, PlannedDraw, SkipReason};
pub use renderer::{projection, Renderer};
pub use sink::{CommandSink, RecordingSink};
pub use wgpu_sink::{FrameStats, WgpuSink};
