//! # audio-align-core
//!
//! Real-time audio buffering and timing alignment.
//!
//! A capture thread writes raw bytes into a [`BoundedAudioChannel`]; a
//! consumer drains it in exact-size blocks through an [`ExactCountStream`]
//! (or an [`AudioPump`] thread) and stamps them with originating times. The
//! resulting messages pass, one at a time, through a [`Reframer`] and/or a
//! [`Streamliner`] to get fixed-size frames and drift-corrected timestamps.
//!
//! ## Architecture
//!
//! ```text
//! audio-align-core (this crate)
//! ├── models/       ← AlignError, WaveFormat, AudioBuffer, AlignmentConfiguration
//! ├── processing/   ← RingBuffer, Reframer, Streamliner, fmt chunk codec
//! ├── stream/       ← BoundedAudioChannel, ExactCountStream
//! ├── session/      ← AudioPump (consumer thread)
//! └── traits/       ← AudioProcessor, StageChain
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod stream;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{AudioBuffer, ChannelStatistics, TimestampedBuffer};
pub use models::config::AlignmentConfiguration;
pub use models::error::{AlignError, Result};
pub use models::timing::TICK;
pub use models::wave_format::WaveFormat;
pub use processing::reframe::{FrameSize, Reframer};
pub use processing::ring_buffer::RingBuffer;
pub use processing::streamline::{StreamlineStrategy, Streamliner};
pub use processing::wav_format::{decode_fmt_chunk, encode_fmt_chunk};
pub use session::pump::{system_clock, AudioPump, Clock};
pub use stream::channel::BoundedAudioChannel;
pub use stream::exact::ExactCountStream;
pub use traits::audio_processor::{AudioProcessor, BufferCallback, StageChain};
