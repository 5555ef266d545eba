pub mod extract;
pub mod frame;
pub mod media;
pub mod queue;

pub use extract::{extract_frames, Capture};
pub use frame::FrameCache;
pub use media::{Bitmap, Page, Video};
pub use queue::{SeekQueue, SeekTarget};
