use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::{AlignError, Result};
use super::timing::from_millis_f64;
use crate::processing::reframe::{FrameSize, Reframer};
use crate::processing::streamline::Streamliner;
use crate::stream::channel::BoundedAudioChannel;

/// Settings for a capture channel and its alignment stages.
///
/// Loadable from JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfiguration {
    /// Ring buffer capacity in bytes (default: 5 s of 16 kHz mono 16-bit audio).
    pub channel_capacity: usize,

    /// Whether reads wait for data (default: true).
    pub blocking_reads: bool,

    /// Reframe to this many bytes per frame. Exclusive with `frame_duration_ms`.
    pub frame_size_bytes: Option<usize>,

    /// Reframe to this many milliseconds per frame. Exclusive with `frame_size_bytes`.
    pub frame_duration_ms: Option<f64>,

    /// Streamline strategy name: `concatenate`, `pleat` or `unpleat`.
    pub streamline_strategy: Option<String>,

    /// Unpleat resynchronization threshold in milliseconds (default: 20).
    pub max_drift_ms: f64,
}

impl AlignmentConfiguration {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.channel_capacity == 0 {
            return Err("channel capacity must be positive".into());
        }
        match (self.frame_size_bytes, self.frame_duration_ms) {
            (Some(_), Some(_)) => {
                return Err("frame size and frame duration are mutually exclusive".into());
            }
            (Some(0), None) => return Err("frame size must be positive".into()),
            (None, Some(ms)) if !(ms > 0.0) || !ms.is_finite() => {
                return Err(format!("frame duration must be positive, got {} ms", ms));
            }
            _ => {}
        }
        if let Some(name) = &self.streamline_strategy {
            name.parse::<crate::processing::streamline::StreamlineStrategy>()
                .map_err(|e| e.to_string())?;
        }
        if !self.max_drift_ms.is_finite() || self.max_drift_ms < 0.0 {
            return Err(format!("unsupported drift threshold: {} ms", self.max_drift_ms));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AlignError::ConfigurationFailed(format!("failed to parse configuration: {}", e)))?;
        config.validate().map_err(AlignError::ConfigurationFailed)?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AlignError::ConfigurationFailed(format!("failed to serialize configuration: {}", e)))
    }

    pub fn build_channel(&self) -> Result<Arc<BoundedAudioChannel>> {
        Ok(Arc::new(BoundedAudioChannel::new(self.channel_capacity, self.blocking_reads)?))
    }

    /// The configured reframer, or `None` if no frame target is set.
    pub fn build_reframer(&self) -> Result<Option<Reframer>> {
        self.validate().map_err(AlignError::ConfigurationFailed)?;
        let target = match (self.frame_size_bytes, self.frame_duration_ms) {
            (Some(bytes), _) => FrameSize::Bytes(bytes),
            (None, Some(ms)) => FrameSize::Duration(from_millis_f64(ms)),
            (None, None) => return Ok(None),
        };
        Reframer::new(target).map(Some)
    }

    /// The configured streamliner, or `None` if no strategy is set.
    pub fn build_streamliner(&self) -> Result<Option<Streamliner>> {
        match &self.streamline_strategy {
            Some(name) => Streamliner::from_name(name, self.max_drift_ms).map(Some),
            None => Ok(None),
        }
    }
}

impl Default for AlignmentConfiguration {
    fn default() -> Self {
        Self {
            channel_capacity: 16_000 * 2 * 5,
            blocking_reads: true,
            frame_size_bytes: None,
            frame_duration_ms: None,
            streamline_strategy: None,
            max_drift_ms: 20.0,
        }
    }
}
