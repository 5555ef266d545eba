// types.rs - Section descriptor, playback mode and viewport
use serde::{Deserialize, Serialize};

use crate::error::ScrubError;

pub const DEFAULT_FRAME_RATE: f64 = 60.0;
pub const DEFAULT_STRIDE: u32 = 2;
pub const DEFAULT_SEEK_TIMEOUT_MS: f64 = 10_000.0;
/// Upper bound on frames cached per section. Descriptors parsed from markup
/// that would extract more are rejected.
pub const MAX_TOTAL_FRAMES: usize = 100_000;

/// Immutable per-section settings, read once from the section's `data-*`
/// attributes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectionDescriptor {
    pub source: String,
    pub duration: f64,
    pub frame_rate: f64,
    pub stride: u32,
    pub autoplay_seconds: Option<f64>,
    pub seek_timeout_ms: Option<f64>,
}

impl SectionDescriptor {
    pub fn new(source: impl Into<String>, duration: f64, frame_rate: f64, stride: u32) -> Self {
        Self {
            source: source.into(),
            duration,
            frame_rate,
            stride,
            autoplay_seconds: None,
            seek_timeout_ms: Some(DEFAULT_SEEK_TIMEOUT_MS),
        }
    }

    pub fn with_autoplay(mut self, seconds: f64) -> Self {
        self.autoplay_seconds = (seconds > 0.0).then_some(seconds);
        self
    }

    pub fn with_seek_timeout(mut self, timeout_ms: Option<f64>) -> Self {
        self.seek_timeout_ms = timeout_ms.filter(|ms| *ms > 0.0);
        self
    }

    /// Parse the descriptor from attribute lookups. `attr` receives the
    /// dataset key (`video`, `duration`, `fps`, `sample`, `autoplay`,
    /// `seekTimeout`) and returns the raw attribute text, if present.
    pub fn from_attributes<F>(attr: F) -> Result<Self, ScrubError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = attr("video")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ScrubError::Configuration("section has no data-video source".into()))?;

        let duration = number(&attr, "duration", 0.0)?;
        if duration < 0.0 {
            return Err(invalid("duration", duration, "must not be negative"));
        }

        let frame_rate = number(&attr, "fps", DEFAULT_FRAME_RATE)?;
        if frame_rate <= 0.0 {
            return Err(invalid("fps", frame_rate, "must be positive"));
        }

        let stride = number(&attr, "sample", DEFAULT_STRIDE as f64)?;
        if stride < 1.0 || stride.fract() != 0.0 || stride > u32::MAX as f64 {
            return Err(invalid("sample", stride, "must be a whole number of at least 1"));
        }

        let autoplay = number(&attr, "autoplay", 0.0)?;
        if autoplay < 0.0 {
            return Err(invalid("autoplay", autoplay, "must not be negative"));
        }

        let seek_timeout = number(&attr, "seekTimeout", DEFAULT_SEEK_TIMEOUT_MS)?;
        if seek_timeout < 0.0 {
            return Err(invalid("seek-timeout", seek_timeout, "must not be negative"));
        }

        let descriptor = Self::new(source, duration, frame_rate, stride as u32)
            .with_autoplay(autoplay)
            .with_seek_timeout(Some(seek_timeout));
        if descriptor.total_frames() > MAX_TOTAL_FRAMES {
            return Err(invalid(
                "duration",
                duration,
                "yields more frames than a section can cache",
            ));
        }
        Ok(descriptor)
    }

    pub fn is_intro(&self) -> bool {
        self.autoplay_seconds.is_some()
    }

    /// Number of frames extracted: `floor(duration * fps / stride)`,
    /// saturating at `usize::MAX`.
    pub fn total_frames(&self) -> usize {
        let frames = (self.duration * self.frame_rate / self.stride as f64).floor();
        if frames.is_finite() && frames > 0.0 {
            frames as usize
        } else {
            0
        }
    }

    /// Media time of the `index`-th extracted frame.
    pub fn frame_time(&self, index: usize) -> f64 {
        index as f64 * self.stride as f64 / self.frame_rate
    }
}

fn number<F>(attr: &F, name: &'static str, default: f64) -> Result<f64, ScrubError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = attr(name) else {
        return Ok(default);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(default);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ScrubError::InvalidAttribute {
            name: attr_name(name),
            value: raw,
            reason: "not a finite number",
        }),
    }
}

fn invalid(name: &'static str, value: f64, reason: &'static str) -> ScrubError {
    ScrubError::InvalidAttribute {
        name: attr_name(name),
        value: value.to_string(),
        reason,
    }
}

fn attr_name(key: &'static str) -> &'static str {
    match key {
        "seekTimeout" => "seek-timeout",
        other => other,
    }
}

/// The section's video children as found in the markup.
pub struct VideoChildren<V> {
    /// First `<video>` regardless of role.
    pub any: Option<V>,
    pub playback: Option<V>,
    pub extractor: Option<V>,
}

/// Playback mode, decided once at construction.
pub enum Mode<V> {
    Normal {
        video: V,
    },
    Intro {
        playback: V,
        extractor: V,
        autoplay_seconds: f64,
    },
}

impl<V: PartialEq> Mode<V> {
    /// Pick the mode the descriptor asks for and check that the markup
    /// supplies the videos it needs. Intro mode seeks one element while
    /// playing the other, so both roles must be distinct elements.
    pub fn resolve(
        descriptor: &SectionDescriptor,
        children: VideoChildren<V>,
    ) -> Result<Self, ScrubError> {
        match descriptor.autoplay_seconds {
            Some(autoplay_seconds) => match (children.playback, children.extractor) {
                (Some(playback), Some(extractor)) if playback == extractor => {
                    Err(ScrubError::Configuration(
                        "intro section needs distinct video.playback and video.extractor elements"
                            .into(),
                    ))
                }
                (Some(playback), Some(extractor)) => Ok(Mode::Intro {
                    playback,
                    extractor,
                    autoplay_seconds,
                }),
                _ => Err(ScrubError::Configuration(
                    "intro section needs 2 videos: video.playback + video.extractor".into(),
                )),
            },
            None => children.any.map(|video| Mode::Normal { video }).ok_or_else(|| {
                ScrubError::Configuration("scroll section needs 1 <video> element".into())
            }),
        }
    }
}

impl<V> Mode<V> {

    /// The element frames are pulled from.
    pub fn extractor(&self) -> &V {
        match self {
            Mode::Normal { video } => video,
            Mode::Intro { extractor, .. } => extractor,
        }
    }

    pub fn videos(&self) -> Vec<&V> {
        match self {
            Mode::Normal { video } => vec![video],
            Mode::Intro { playback, extractor, .. } => vec![playback, extractor],
        }
    }

    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::Normal { .. } => ModeKind::Normal,
            Mode::Intro { .. } => ModeKind::Intro,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ModeKind {
    Normal,
    Intro,
}

/// Viewport size in CSS pixels plus the device pixel ratio.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        let device_pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    /// Canvas backing-store size in device pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        (
            device_pixels(self.width * self.device_pixel_ratio),
            device_pixels(self.height * self.device_pixel_ratio),
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

fn device_pixels(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value as u32
    } else {
        0
    }
}
