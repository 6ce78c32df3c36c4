pub mod codec;
pub mod dispatch;
pub mod ingest;
pub mod loader;
pub mod ply;
pub mod progress;
pub mod splat;
pub mod transport;
pub mod writer;
