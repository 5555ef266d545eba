pub mod context;

#[cfg(target_arch = "wasm32")]
pub use context::CanvasSurface;
pub use context::Surface;
