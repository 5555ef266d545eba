use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Promise;
use log::{debug, error, info};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    AddEventListenerOptions, EventTarget, HtmlCanvasElement, HtmlElement, HtmlMediaElement,
    HtmlVideoElement, ImageBitmap, Window,
};

use crate::decoder::{Bitmap, Page, Video};
use crate::error::ScrubError;
use crate::player::FrameScrubber;
use crate::render::CanvasSurface;
use crate::types::{SectionDescriptor, VideoChildren, Viewport};

pub const SECTION_SELECTOR: &str = ".scroll-video";
const CANVAS_SELECTOR: &str = "canvas";
const VIDEO_SELECTOR: &str = "video";
const PLAYBACK_SELECTOR: &str = "video.playback";
const EXTRACTOR_SELECTOR: &str = "video.extractor";

type WebScrubber = FrameScrubber<WebPage, WebVideo, CanvasSurface>;

thread_local! {
    static SECTIONS: RefCell<Vec<ScrollVideo>> = RefCell::new(Vec::new());
}

/// Snapshot of one decoded video frame.
pub struct WebBitmap(ImageBitmap);

impl AsRef<ImageBitmap> for WebBitmap {
    fn as_ref(&self) -> &ImageBitmap {
        &self.0
    }
}

impl Bitmap for WebBitmap {
    fn byte_size(&self) -> usize {
        self.0.width() as usize * self.0.height() as usize * 4
    }

    fn close(&self) {
        self.0.close();
    }
}

pub struct WebVideo {
    element: HtmlVideoElement,
    window: Window,
}

impl WebVideo {
    pub fn new(element: HtmlVideoElement, window: Window) -> Self {
        Self { element, window }
    }

    pub fn element(&self) -> &HtmlVideoElement {
        &self.element
    }
}

impl PartialEq for WebVideo {
    fn eq(&self, other: &Self) -> bool {
        self.element.is_same_node(Some(other.element.as_ref()))
    }
}

impl Video for WebVideo {
    type Bitmap = WebBitmap;

    fn configure(&self) {
        self.element.set_cross_origin(Some("anonymous"));
        self.element.set_muted(true);
        self.element.set_preload("auto");
        if let Err(e) = self.element.set_attribute("playsinline", "") {
            debug!("playsinline not set: {:?}", e);
        }
    }

    fn set_source(&self, source: &str) {
        self.element.set_src(source);
    }

    fn load(&self) {
        self.element.load();
    }

    async fn loaded(&self) -> Result<(), ScrubError> {
        if self.element.ready_state() >= HtmlMediaElement::HAVE_CURRENT_DATA {
            return Ok(());
        }
        once(&self.element, "loadeddata")?
            .await
            .map(|_| ())
            .map_err(|e| ScrubError::media(&e))
    }

    async fn seek(&self, time: f64) -> Result<(), ScrubError> {
        // Listen before moving the playhead so the signal cannot be missed.
        let seeked = once(&self.element, "seeked")?;
        self.element.set_current_time(time);
        seeked.await.map(|_| ()).map_err(|e| ScrubError::media(&e))
    }

    async fn snapshot(&self) -> Result<WebBitmap, ScrubError> {
        let promise = self
            .window
            .create_image_bitmap_with_html_video_element(&self.element)
            .map_err(|e| ScrubError::media(&e))?;
        let value = JsFuture::from(promise)
            .await
            .map_err(|e| ScrubError::media(&e))?;
        value
            .dyn_into::<ImageBitmap>()
            .map(WebBitmap)
            .map_err(|_| ScrubError::Media("snapshot did not produce an ImageBitmap".into()))
    }

    async fn play(&self) -> Result<(), ScrubError> {
        let blocked = |e: JsValue| ScrubError::AutoplayBlocked(format!("{:?}", e));
        let promise = self.element.play().map_err(blocked)?;
        JsFuture::from(promise).await.map(|_| ()).map_err(blocked)
    }

    fn pause(&self) {
        if let Err(e) = self.element.pause() {
            debug!("pause failed: {:?}", e);
        }
    }
}

/// Window measurements and schedulers, scoped to one section element.
pub struct WebPage {
    window: Window,
    section: HtmlElement,
}

impl WebPage {
    pub fn new(window: Window, section: HtmlElement) -> Self {
        Self { window, section }
    }
}

impl Page for WebPage {
    fn viewport(&self) -> Viewport {
        let width = self.window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let height = self.window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Viewport::new(width, height, self.window.device_pixel_ratio())
    }

    fn scroll_top(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn section_top(&self) -> f64 {
        self.section.offset_top() as f64
    }

    fn section_height(&self) -> f64 {
        self.section.offset_height() as f64
    }

    fn now_ms(&self) -> f64 {
        self.window
            .performance()
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    async fn animation_frame(&self) {
        let mut scheduled = Ok(0);
        let promise = Promise::new(&mut |resolve, _reject| {
            scheduled = self.window.request_animation_frame(&resolve);
        });
        if let Err(e) = scheduled {
            debug!("requestAnimationFrame failed, falling back to a timer: {:?}", e);
            self.sleep(16.0).await;
            return;
        }
        let _ = JsFuture::from(promise).await;
    }

    async fn sleep(&self, ms: f64) {
        let delay = ms.clamp(0.0, i32::MAX as f64) as i32;
        let promise = Promise::new(&mut |resolve, _reject| {
            if let Err(e) = self
                .window
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, delay)
            {
                debug!("setTimeout failed: {:?}", e);
            }
        });
        let _ = JsFuture::from(promise).await;
    }
}

/// Future resolving on the next `kind` event fired at `target`.
fn once(target: &EventTarget, kind: &str) -> Result<JsFuture, ScrubError> {
    let mut registered = Ok(());
    let promise = Promise::new(&mut |resolve, _reject| {
        let options = AddEventListenerOptions::new();
        options.set_once(true);
        registered = target.add_event_listener_with_callback_and_add_event_listener_options(
            kind, &resolve, &options,
        );
    });
    registered.map_err(|e| ScrubError::media(&e))?;
    Ok(JsFuture::from(promise))
}

/// Registered listener, removed from its target on drop.
struct EventListener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut()>,
}

impl EventListener {
    fn new(
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut() + 'static,
    ) -> Result<Self, ScrubError> {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
        target
            .add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
            .map_err(|e| ScrubError::media(&e))?;
        Ok(Self {
            target: target.clone(),
            kind,
            callback,
        })
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref());
    }
}

/// A mounted scroll-video section.
#[wasm_bindgen]
pub struct ScrollVideo {
    scrubber: Rc<WebScrubber>,
    listeners: Rc<RefCell<Vec<EventListener>>>,
}

#[wasm_bindgen]
impl ScrollVideo {
    /// Mount a section element. Throws if its markup or attributes are
    /// unusable.
    pub fn attach(section: HtmlElement) -> Result<ScrollVideo, JsValue> {
        Ok(Self::mount(section)?)
    }

    #[wasm_bindgen(js_name = drawFrame)]
    pub fn draw_frame(&self, index: i32) -> bool {
        self.scrubber.draw_frame_checked(i64::from(index))
    }

    #[wasm_bindgen(getter)]
    pub fn ready(&self) -> bool {
        self.scrubber.is_ready()
    }

    pub fn stats(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.scrubber.stats())?)
    }

    pub fn dispose(&self) {
        self.listeners.borrow_mut().clear();
        self.scrubber.dispose();
    }
}

impl ScrollVideo {
    fn mount(section: HtmlElement) -> Result<Self, ScrubError> {
        let window =
            web_sys::window().ok_or_else(|| ScrubError::Configuration("no window".into()))?;

        let dataset = section.dataset();
        let descriptor = SectionDescriptor::from_attributes(|key| dataset.get(key))?;

        let canvas = query::<HtmlCanvasElement>(&section, CANVAS_SELECTOR)?
            .ok_or_else(|| ScrubError::Configuration("section needs a <canvas>".into()))?;
        let surface = CanvasSurface::from_canvas(canvas)?;

        let video = |selector| -> Result<Option<WebVideo>, ScrubError> {
            Ok(query::<HtmlVideoElement>(&section, selector)?
                .map(|el| WebVideo::new(el, window.clone())))
        };
        let children = VideoChildren {
            any: video(VIDEO_SELECTOR)?,
            playback: video(PLAYBACK_SELECTOR)?,
            extractor: video(EXTRACTOR_SELECTOR)?,
        };

        let page = WebPage::new(window.clone(), section);
        let scrubber = Rc::new(FrameScrubber::from_children(
            descriptor, children, page, surface,
        )?);
        let listeners = Rc::new(RefCell::new(Vec::new()));

        let weak = Rc::downgrade(&scrubber);
        listeners.borrow_mut().push(EventListener::new(window.as_ref(), "resize", move || {
            if let Some(scrubber) = weak.upgrade() {
                scrubber.on_resize();
            }
        })?);

        spawn_local(drive(scrubber.clone(), listeners.clone(), window));
        Ok(Self { scrubber, listeners })
    }
}

async fn drive(
    scrubber: Rc<WebScrubber>,
    listeners: Rc<RefCell<Vec<EventListener>>>,
    window: Window,
) {
    // Errors were logged by the scrubber; the section stays static.
    if scrubber.run().await.is_err() || scrubber.is_disposed() {
        return;
    }

    let weak = Rc::downgrade(&scrubber);
    match EventListener::new(window.as_ref(), "scroll", move || {
        if let Some(scrubber) = weak.upgrade() {
            scrubber.on_scroll();
        }
    }) {
        Ok(listener) => listeners.borrow_mut().push(listener),
        Err(err) => error!(
            "{}: scroll listener not registered: {}",
            scrubber.descriptor().source,
            err
        ),
    }
}

fn query<T: JsCast>(section: &HtmlElement, selector: &str) -> Result<Option<T>, ScrubError> {
    let found = section
        .query_selector(selector)
        .map_err(|e| ScrubError::Configuration(format!("bad selector {}: {:?}", selector, e)))?;
    Ok(found.and_then(|el| el.dyn_into::<T>().ok()))
}

/// Mount every scroll-video section once the document is parsed.
pub fn boot() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;

    if document.ready_state() == "loading" {
        let on_ready = Closure::wrap(Box::new(mount_all) as Box<dyn FnMut()>);
        document.add_event_listener_with_callback(
            "DOMContentLoaded",
            on_ready.as_ref().unchecked_ref(),
        )?;
        on_ready.forget();
    } else {
        mount_all();
    }
    Ok(())
}

fn mount_all() {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let sections = match document.query_selector_all(SECTION_SELECTOR) {
        Ok(sections) => sections,
        Err(e) => {
            error!("section scan failed: {:?}", e);
            return;
        }
    };

    let mut mounted = 0;
    for i in 0..sections.length() {
        let Some(section) = sections.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) else {
            continue;
        };
        match ScrollVideo::mount(section) {
            Ok(video) => {
                SECTIONS.with(|s| s.borrow_mut().push(video));
                mounted += 1;
            }
            Err(err) => error!("scroll-video section #{} not initialised: {}", i, err),
        }
    }
    info!("{} of {} scroll-video sections mounted", mounted, sections.length());
}

/// Dispose every section mounted at start-up.
#[wasm_bindgen(js_name = disposeAll)]
pub fn dispose_all() {
    SECTIONS.with(|s| {
        for video in s.borrow_mut().drain(..) {
            video.dispose();
        }
    });
}
