//! Time subsystem.
//!
//! One `FrameClock` per render loop; call `tick()` once per frame and hand the
//! resulting `FrameTime` to the camera and the renderer.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
