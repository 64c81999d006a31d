use std::io;

use futures::future::BoxFuture;
use tokio::runtime::{Builder, Handle, Runtime};

/// Unit of blocking work handed to a spawner.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Execution context for build tasks.
///
/// `spawn` takes CPU-bound or blocking work (decoding, device calls);
/// `spawn_future` takes I/O-bound futures (asset reads).
pub trait Spawner: Send + Sync + 'static {
    fn spawn(&self, job: Job);

    fn spawn_future(&self, future: BoxFuture<'static, ()>);
}

/// Runs build work on a tokio multi-thread runtime.
///
/// Futures go to the async workers, blocking jobs to the runtime's blocking
/// pool. The spawner either owns its runtime or borrows a host's through a
/// `Handle`.
#[derive(Debug)]
pub struct TokioSpawner {
    handle: Handle,
    runtime: Option<Runtime>,
}

impl TokioSpawner {
    /// Starts a dedicated runtime whose threads are named `thread_name`.
    pub fn new(thread_name: &str) -> io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .thread_name(thread_name)
            .enable_all()
            .build()?;
        log::debug!("build runtime `{thread_name}` started");
        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        })
    }

    /// Spawns onto a runtime owned by the host.
    pub fn from_handle(handle: Handle) -> Self {
        Self { handle, runtime: None }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }
}

impl Drop for TokioSpawner {
    fn drop(&mut self) {
        // The last reference can go away on one of the runtime's own threads,
        // where a blocking shutdown would panic.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl Spawner for TokioSpawner {
    fn spawn(&self, job: Job) {
        drop(self.handle.spawn_blocking(job));
    }

    fn spawn_future(&self, future: BoxFuture<'static, ()>) {
        drop(self.handle.spawn(future));
    }
}

/// Runs jobs immediately on the submitting thread and polls futures to
/// completion in place.
///
/// Makes the whole graph deterministic; continuations then run on the thread
/// that completes the last dependency. Futures that need a tokio reactor
/// (such as `FsLoader` reads) cannot run here.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineSpawner;

impl Spawner for InlineSpawner {
    fn spawn(&self, job: Job) {
        job();
    }

    fn spawn_future(&self, future: BoxFuture<'static, ()>) {
        pollster::block_on(future);
    }
}
