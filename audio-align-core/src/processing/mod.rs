pub mod reframe;
pub mod ring_buffer;
pub mod streamline;
pub mod wav_format;
