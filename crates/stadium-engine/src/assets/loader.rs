use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::RwLock;

use crate::build::BuildError;

/// Immutable, cheaply cloned file contents.
pub type Bytes = Arc<[u8]>;

/// Asynchronous source of raw asset bytes, addressed by file name.
pub trait ByteLoader: Send + Sync {
    fn load(&self, name: &str) -> BoxFuture<'static, Result<Bytes, BuildError>>;
}

/// Reads assets from a directory on disk with `tokio::fs`.
///
/// The returned futures must be polled inside a tokio runtime, such as the
/// one behind `TokioSpawner`.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ByteLoader for FsLoader {
    fn load(&self, name: &str) -> BoxFuture<'static, Result<Bytes, BuildError>> {
        let path = self.root.join(name);
        let name = name.to_string();
        async move {
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    log::debug!("read {} ({} bytes)", path.display(), bytes.len());
                    Ok(Bytes::from(bytes))
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => Err(BuildError::NotFound { name }),
                Err(e) => Err(BuildError::Io { name, reason: e.to_string() }),
            }
        }
        .boxed()
    }
}

/// Tries each loader in order; a `NotFound` moves on to the next one.
///
/// Any other error ends the search.
#[derive(Clone, Default)]
pub struct ChainLoader {
    loaders: Vec<Arc<dyn ByteLoader>>,
}

impl ChainLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, loader: Arc<dyn ByteLoader>) -> Self {
        self.loaders.push(loader);
        self
    }
}

impl std::fmt::Debug for ChainLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainLoader").field("loaders", &self.loaders.len()).finish()
    }
}

impl ByteLoader for ChainLoader {
    fn load(&self, name: &str) -> BoxFuture<'static, Result<Bytes, BuildError>> {
        let reads: Vec<_> = self.loaders.iter().map(|l| l.load(name)).collect();
        let name = name.to_string();
        async move {
            for read in reads {
                match read.await {
                    Err(BuildError::NotFound { .. }) => continue,
                    other => return other,
                }
            }
            Err(BuildError::NotFound { name })
        }
        .boxed()
    }
}

/// In-memory asset table.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    files: RwLock<HashMap<String, Bytes>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn insert(&self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.write().insert(name.into(), Bytes::from(bytes.into()));
    }

    pub fn remove(&self, name: &str) -> bool {
        self.files.write().remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.read().contains_key(name)
    }
}

impl ByteLoader for MemoryLoader {
    fn load(&self, name: &str) -> BoxFuture<'static, Result<Bytes, BuildError>> {
        let result = self
            .files
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| BuildError::NotFound { name: name.to_string() });
        future::ready(result).boxed()
    }
}
