pub mod audio_models;
pub mod config;
pub mod error;
pub mod timing;
pub mod wave_format;
