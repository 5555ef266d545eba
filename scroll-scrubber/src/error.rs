//! Error types for the scroll scrubber.
//!
//! Every fallible step of a section's lifecycle reports a [`ScrubError`].
//! None of them escape to the page: the scrubber logs them where they occur
//! and either degrades (blocked autoplay) or parks the section in a terminal
//! state (configuration errors, seek timeouts).

use thiserror::Error;
use wasm_bindgen::JsValue;

use crate::player::ScrubberState;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScrubError {
    /// The section markup is missing a required child element.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A `data-*` attribute is present but cannot be used.
    #[error("invalid attribute data-{name}={value:?}: {reason}")]
    InvalidAttribute {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    /// The host refused to start programmatic playback.
    #[error("autoplay blocked: {0}")]
    AutoplayBlocked(String),

    /// A seek never reported completion within the configured window.
    #[error("seek to frame {index} (t={time:.3}s) did not complete within {timeout_ms}ms")]
    SeekTimeout {
        index: usize,
        time: f64,
        timeout_ms: f64,
    },

    #[error("media error: {0}")]
    Media(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("illegal transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: ScrubberState,
        to: ScrubberState,
    },

    #[error("scrubber disposed")]
    Disposed,
}

impl ScrubError {
    /// Build a [`ScrubError::Media`] from a raw JS exception value.
    pub fn media(value: &JsValue) -> Self {
        ScrubError::Media(describe(value))
    }

    /// Build a [`ScrubError::Render`] from a raw JS exception value.
    pub fn render(value: &JsValue) -> Self {
        ScrubError::Render(describe(value))
    }
}

impl From<ScrubError> for JsValue {
    fn from(err: ScrubError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
