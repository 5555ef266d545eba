//! Scroll-scrubbed video for web pages.
//!
//! Each `.scroll-video` section pre-extracts its video into a cache of still
//! frames, optionally plays a timed intro, then paints the frame matching
//! the page's scroll position onto its canvas.

pub mod decoder;
pub mod error;
pub mod player;
pub mod render;
pub mod scroll;
pub mod types;
pub mod utils;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use error::ScrubError;
pub use player::{FrameScrubber, ScrubberState, ScrubberStats};
pub use types::{Mode, ModeKind, SectionDescriptor, VideoChildren, Viewport};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn initialize() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
    wasm::bindings::boot()
}
