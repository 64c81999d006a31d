//! Default collaborators that turn named assets into bytes and decoded data.

mod loader;
mod mesh;
mod texture;

pub use loader::{ByteLoader, Bytes, ChainLoader, FsLoader, MemoryLoader};
pub use mesh::{MeshData, MeshDecoder, ObjDecoder, Vertex};
pub use texture::decode_texture;
