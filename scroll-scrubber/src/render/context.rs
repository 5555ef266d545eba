use crate::error::ScrubError;
use crate::types::Viewport;

/// Render target for one section.
///
/// Drawing happens in CSS pixels; implementations scale to the device pixel
/// ratio in [`Surface::resize`]. Both draw calls stretch the source to the
/// full viewport without preserving aspect ratio.
pub trait Surface {
    type Bitmap;
    type Video;

    /// Size the backing store to `viewport` times the device pixel ratio.
    fn resize(&self, viewport: &Viewport) -> Result<(), ScrubError>;

    fn clear(&self, viewport: &Viewport);

    fn draw_bitmap(&self, bitmap: &Self::Bitmap, viewport: &Viewport) -> Result<(), ScrubError>;

    /// Draw the live picture of a playing video.
    fn draw_video(&self, video: &Self::Video, viewport: &Viewport) -> Result<(), ScrubError>;
}

#[cfg(target_arch = "wasm32")]
pub use web::CanvasSurface;

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::JsCast;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

    use super::Surface;
    use crate::error::ScrubError;
    use crate::types::Viewport;
    use crate::wasm::bindings::{WebBitmap, WebVideo};

    /// 2D canvas covering the viewport.
    pub struct CanvasSurface {
        canvas: HtmlCanvasElement,
        context: CanvasRenderingContext2d,
    }

    impl CanvasSurface {
        pub fn from_canvas(canvas: HtmlCanvasElement) -> Result<Self, ScrubError> {
            let context = canvas
                .get_context("2d")
                .map_err(|e| ScrubError::render(&e))?
                .ok_or_else(|| ScrubError::Render("2d context unavailable".into()))?
                .dyn_into::<CanvasRenderingContext2d>()
                .map_err(|_| {
                    ScrubError::Render("context is not a CanvasRenderingContext2d".into())
                })?;
            Ok(Self { canvas, context })
        }
    }

    impl Surface for CanvasSurface {
        type Bitmap = WebBitmap;
        type Video = WebVideo;

        fn resize(&self, viewport: &Viewport) -> Result<(), ScrubError> {
            let (width, height) = viewport.backing_size();
            self.canvas.set_width(width);
            self.canvas.set_height(height);

            let style = self.canvas.style();
            style
                .set_property("width", "100vw")
                .map_err(|e| ScrubError::render(&e))?;
            style
                .set_property("height", "100vh")
                .map_err(|e| ScrubError::render(&e))?;

            let dpr = viewport.device_pixel_ratio;
            self.context
                .set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)
                .map_err(|e| ScrubError::render(&e))
        }

        fn clear(&self, viewport: &Viewport) {
            self.context.clear_rect(0.0, 0.0, viewport.width, viewport.height);
        }

        fn draw_bitmap(&self, bitmap: &WebBitmap, viewport: &Viewport) -> Result<(), ScrubError> {
            self.context
                .draw_image_with_image_bitmap_and_dw_and_dh(
                    bitmap.as_ref(),
                    0.0,
                    0.0,
                    viewport.width,
                    viewport.height,
                )
                .map_err(|e| ScrubError::render(&e))
        }

        fn draw_video(&self, video: &WebVideo, viewport: &Viewport) -> Result<(), ScrubError> {
            self.context
                .draw_image_with_html_video_element_and_dw_and_dh(
                    video.element(),
                    0.0,
                    0.0,
                    viewport.width,
                    viewport.height,
                )
                .map_err(|e| ScrubError::render(&e))
        }
    }
}
