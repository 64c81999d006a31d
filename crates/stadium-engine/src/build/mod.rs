//! Asynchronous build graph.
//!
//! Work is submitted as `BuildTask`s that run on a `Spawner`; `JoinPoint`s
//! fan in over tasks and other joins. Every node fires exactly once, either
//! `Succeeded` or `Failed`, and failures propagate to everything downstream.
//! The `ReadinessGate` is the one flag shared with the frame thread.

mod error;
mod gate;
mod graph;
mod spawner;

pub use error::BuildError;
pub use gate::ReadinessGate;
pub use graph::{BuildTask, JoinPoint, NodeId, NodeStatus, TaskGraph};
pub use spawner::{InlineSpawner, Job, Spawner, TokioSpawner};
