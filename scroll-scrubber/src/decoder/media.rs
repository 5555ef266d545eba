//! Host capabilities the scrubber consumes.
//!
//! The browser provides these on wasm32 (see `wasm::bindings`); tests supply
//! in-memory doubles. Futures returned here are polled on a single-threaded
//! executor and need not be `Send`.

use crate::error::ScrubError;
use crate::types::Viewport;

/// A decoded still image captured from a video.
pub trait Bitmap {
    /// Approximate decoded size in bytes.
    fn byte_size(&self) -> usize;

    /// Release the decoded pixels. Drawing a closed bitmap is undefined.
    fn close(&self) {}
}

/// One media element able to load, seek, snapshot and play a source.
#[allow(async_fn_in_trait)]
pub trait Video {
    type Bitmap: Bitmap;

    /// Muted, inline, eagerly buffered, cross-origin anonymous.
    fn configure(&self);

    fn set_source(&self, source: &str);

    fn load(&self);

    /// Resolves once the current frame is decodable.
    async fn loaded(&self) -> Result<(), ScrubError>;

    /// Set the playhead and resolve on the seek-completed signal.
    async fn seek(&self, time: f64) -> Result<(), ScrubError>;

    /// Capture the picture currently presented by the element.
    async fn snapshot(&self) -> Result<Self::Bitmap, ScrubError>;

    /// Start playback. Fails with [`ScrubError::AutoplayBlocked`] when the
    /// host policy refuses.
    async fn play(&self) -> Result<(), ScrubError>;

    fn pause(&self);
}

/// Page-level measurements, clock and schedulers for one section.
#[allow(async_fn_in_trait)]
pub trait Page {
    fn viewport(&self) -> Viewport;

    /// Vertical scroll offset of the document.
    fn scroll_top(&self) -> f64;

    /// Document-relative top of the section.
    fn section_top(&self) -> f64;

    fn section_height(&self) -> f64;

    /// Monotonic clock in milliseconds.
    fn now_ms(&self) -> f64;

    /// Resolves on the next animation frame.
    async fn animation_frame(&self);

    async fn sleep(&self, ms: f64);
}
