//! Multi-consumer replayable event streams.

mod broadcast;

pub use broadcast::ReplayStream;
