//! Chat response stream: frame decoding and event types.

mod decoder;
mod event;

pub use decoder::{ChatEventStream, FrameCodec, decode_events};
pub use event::{ChatEvent, DATA_PREFIX, EventKind, parse_frame};
