// player.rs - Frame scrubber state machine
use std::cell::{Cell, RefCell};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::decoder::{extract_frames, Bitmap, FrameCache, Page, SeekQueue, Video};
use crate::error::ScrubError;
use crate::render::Surface;
use crate::scroll;
use crate::types::{Mode, ModeKind, SectionDescriptor, VideoChildren, Viewport};
use crate::utils::{Memory, Metrics};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ScrubberState {
    Constructed = 0,
    LayoutReady = 1,
    Extracting = 2,
    Ready = 3,
    Autoplaying = 4,
    ScrollControlled = 5,
    Failed = 6,
    Disposed = 7,
}

impl ScrubberState {
    pub fn can_transition_to(self, next: ScrubberState) -> bool {
        use ScrubberState::*;
        matches!(
            (self, next),
            (Constructed, LayoutReady)
                | (LayoutReady, Extracting)
                | (Extracting, Ready)
                | (Ready, Autoplaying)
                | (Ready, ScrollControlled)
                | (Autoplaying, ScrollControlled)
                | (Constructed | LayoutReady | Extracting | Ready | Autoplaying, Failed)
        ) || (next == Disposed && self != Disposed)
    }
}

/// Point-in-time diagnostics for one section.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrubberStats {
    pub state: ScrubberState,
    pub mode: ModeKind,
    pub ready: bool,
    pub total_frames: usize,
    pub cached_frames: usize,
    pub start_index: usize,
    pub seeks: usize,
    pub frames_drawn: usize,
    pub autoplay_frames_drawn: usize,
    pub average_seek_ms: f64,
    pub autoplay_fps: f64,
    pub memory_bytes: usize,
    pub peak_memory_bytes: usize,
}

/// Scroll-scrubbed video for one section.
///
/// Drive it with [`FrameScrubber::run`] on the page's executor and forward
/// resize and scroll events to [`FrameScrubber::on_resize`] and
/// [`FrameScrubber::on_scroll`]. All methods take `&self`; state lives in
/// cells so event handlers can reach the instance while `run` is suspended.
pub struct FrameScrubber<P, V, S>
where
    V: Video,
{
    descriptor: SectionDescriptor,
    mode: Mode<V>,
    page: P,
    surface: S,
    state: Cell<ScrubberState>,
    ready: Cell<bool>,
    viewport: Cell<Viewport>,
    start_index: Cell<usize>,
    frames: RefCell<FrameCache<V::Bitmap>>,
    frames_drawn: Cell<usize>,
    autoplay_frames_drawn: Cell<usize>,
    metrics: RefCell<Metrics>,
    memory: Memory,
}

impl<P, V, S> FrameScrubber<P, V, S>
where
    P: Page,
    V: Video,
    S: Surface<Bitmap = V::Bitmap, Video = V>,
{
    pub fn new(descriptor: SectionDescriptor, mode: Mode<V>, page: P, surface: S) -> Self {
        let total = descriptor.total_frames();
        Self {
            descriptor,
            mode,
            page,
            surface,
            state: Cell::new(ScrubberState::Constructed),
            ready: Cell::new(false),
            viewport: Cell::new(Viewport::default()),
            start_index: Cell::new(0),
            frames: RefCell::new(FrameCache::new(total)),
            frames_drawn: Cell::new(0),
            autoplay_frames_drawn: Cell::new(0),
            metrics: RefCell::new(Metrics::new()),
            memory: Memory::new(),
        }
    }

    /// Resolve the mode from the section's video children and construct.
    /// Nothing is touched when the markup does not match the mode.
    pub fn from_children(
        descriptor: SectionDescriptor,
        children: VideoChildren<V>,
        page: P,
        surface: S,
    ) -> Result<Self, ScrubError>
    where
        V: PartialEq,
    {
        let mode = Mode::resolve(&descriptor, children)?;
        Ok(Self::new(descriptor, mode, page, surface))
    }

    /// Full lifecycle: layout, load, extract, optional intro autoplay, then
    /// hand over to scroll. Resolves once the section is scroll controlled.
    ///
    /// Failures are logged here and leave the section permanently not ready,
    /// with any partially extracted frames released.
    pub async fn run(&self) -> Result<(), ScrubError> {
        let result = self.drive().await;
        match &result {
            Ok(()) => {}
            Err(ScrubError::Disposed) => {
                debug!("{}: stopped after dispose", self.descriptor.source)
            }
            Err(err) => {
                error!("{}: {}", self.descriptor.source, err);
                self.fail();
            }
        }
        result
    }

    fn fail(&self) {
        if !self.state.get().can_transition_to(ScrubberState::Failed) {
            return;
        }
        self.state.set(ScrubberState::Failed);
        self.ready.set(false);
        let released = self.frames.borrow_mut().release();
        self.memory.deallocate(released);
        if released > 0 {
            info!("{}: failed, released {} bytes", self.descriptor.source, released);
        }
    }

    async fn drive(&self) -> Result<(), ScrubError> {
        self.on_resize();
        self.transition(ScrubberState::LayoutReady)?;

        for video in self.mode.videos() {
            video.configure();
            video.set_source(&self.descriptor.source);
            video.load();
        }
        self.transition(ScrubberState::Extracting)?;

        self.mode.extractor().loaded().await?;
        self.ensure_live()?;
        info!(
            "{}: extracting {} frames",
            self.descriptor.source,
            self.descriptor.total_frames()
        );

        self.extract().await?;
        self.mark_ready()?;

        if let Mode::Intro {
            playback,
            autoplay_seconds,
            ..
        } = &self.mode
        {
            self.transition(ScrubberState::Autoplaying)?;
            self.autoplay(playback, *autoplay_seconds).await?;
        }

        self.transition(ScrubberState::ScrollControlled)?;
        self.on_scroll();
        Ok(())
    }

    async fn extract(&self) -> Result<(), ScrubError> {
        let mut queue = SeekQueue::new(&self.descriptor);
        let captured = extract_frames(
            self.mode.extractor(),
            &self.page,
            &mut queue,
            self.descriptor.seek_timeout_ms,
            |capture, bitmap| {
                self.ensure_live()?;
                let bytes = bitmap.byte_size();
                self.frames
                    .borrow_mut()
                    .push(capture.target.index, bitmap)
                    .map_err(|_| {
                        ScrubError::Media(format!(
                            "frame {} captured out of order",
                            capture.target.index
                        ))
                    })?;
                self.memory.allocate(bytes);
                self.metrics.borrow_mut().record_seek_time(capture.elapsed_ms);
                Ok(())
            },
        )
        .await?;
        info!(
            "{}: {} frames extracted, {} bytes cached",
            self.descriptor.source,
            captured,
            self.memory.allocated()
        );
        Ok(())
    }

    fn mark_ready(&self) -> Result<(), ScrubError> {
        self.ensure_live()?;
        let count = {
            let mut frames = self.frames.borrow_mut();
            frames.seal();
            frames.len()
        };
        if let Mode::Intro { autoplay_seconds, .. } = &self.mode {
            self.start_index.set(scroll::start_index(
                *autoplay_seconds,
                self.descriptor.frame_rate,
                self.descriptor.stride,
                count,
            ));
        }
        if count == 0 {
            warn!("{}: no frames extracted, nothing will be drawn", self.descriptor.source);
        }
        self.transition(ScrubberState::Ready)?;
        self.ready.set(true);
        Ok(())
    }

    async fn autoplay(&self, video: &V, seconds: f64) -> Result<(), ScrubError> {
        if let Err(err) = video.play().await {
            warn!("{}: intro {}", self.descriptor.source, err);
            return self.ensure_live();
        }

        let start = self.page.now_ms();
        let mut last = start;
        loop {
            self.page.animation_frame().await;
            if let Err(err) = self.ensure_live() {
                video.pause();
                return Err(err);
            }

            let now = self.page.now_ms();
            let elapsed = (now - start) / 1000.0;
            self.metrics.borrow_mut().record_frame_time(now - last);
            last = now;

            let viewport = self.viewport.get();
            self.surface.clear(&viewport);
            match self.surface.draw_video(video, &viewport) {
                Ok(()) => self.autoplay_frames_drawn.set(self.autoplay_frames_drawn.get() + 1),
                Err(err) => debug!("{}: autoplay draw skipped: {}", self.descriptor.source, err),
            }

            if elapsed >= seconds {
                video.pause();
                info!(
                    "{}: intro finished after {:.2}s, handing over to scroll",
                    self.descriptor.source, elapsed
                );
                return Ok(());
            }
        }
    }

    /// Recompute the canvas backing store from the current viewport.
    pub fn on_resize(&self) {
        if self.state.get() == ScrubberState::Disposed {
            return;
        }
        let viewport = self.page.viewport();
        self.viewport.set(viewport);
        if let Err(err) = self.surface.resize(&viewport) {
            warn!("{}: resize failed: {}", self.descriptor.source, err);
        }
    }

    /// Draw the frame for the current scroll position. Ignored until the
    /// section is scroll controlled.
    pub fn on_scroll(&self) {
        if !self.ready.get() || self.state.get() != ScrubberState::ScrollControlled {
            return;
        }
        if let Some(index) = self.scroll_index() {
            self.draw_frame(index);
        }
    }

    /// Frame index for the page's current scroll position.
    pub fn scroll_index(&self) -> Option<usize> {
        let progress = scroll::scroll_progress(
            self.page.scroll_top(),
            self.page.section_top(),
            self.page.section_height(),
            self.viewport.get().height,
        );
        scroll::frame_index(progress, self.frames.borrow().len(), self.start_index.get())
    }

    /// Paint cached frame `index` over the whole viewport. Returns `false`,
    /// without touching the canvas, if the section is not ready or the frame
    /// does not exist.
    pub fn draw_frame(&self, index: usize) -> bool {
        if !self.ready.get() {
            return false;
        }
        let frames = self.frames.borrow();
        let Some(frame) = frames.get(index) else {
            return false;
        };

        let viewport = self.viewport.get();
        self.surface.clear(&viewport);
        match self.surface.draw_bitmap(frame, &viewport) {
            Ok(()) => {
                self.frames_drawn.set(self.frames_drawn.get() + 1);
                true
            }
            Err(err) => {
                debug!("{}: frame {} not drawn: {}", self.descriptor.source, index, err);
                false
            }
        }
    }

    /// [`FrameScrubber::draw_frame`] for indices coming from JS, where a
    /// negative number is just another missing frame.
    pub fn draw_frame_checked(&self, index: i64) -> bool {
        match usize::try_from(index) {
            Ok(index) => self.draw_frame(index),
            Err(_) => false,
        }
    }

    /// Stop the section and release its frames. Pending extraction or
    /// autoplay stops at its next suspension point.
    pub fn dispose(&self) {
        if self.state.get() == ScrubberState::Disposed {
            return;
        }
        self.state.set(ScrubberState::Disposed);
        self.ready.set(false);
        for video in self.mode.videos() {
            video.pause();
        }
        let released = self.frames.borrow_mut().release();
        self.memory.deallocate(released);
        info!("{}: disposed, released {} bytes", self.descriptor.source, released);
    }

    pub fn stats(&self) -> ScrubberStats {
        let metrics = self.metrics.borrow();
        ScrubberStats {
            state: self.state.get(),
            mode: self.mode.kind(),
            ready: self.ready.get(),
            total_frames: self.descriptor.total_frames(),
            cached_frames: self.frames.borrow().len(),
            start_index: self.start_index.get(),
            seeks: metrics.seeks(),
            frames_drawn: self.frames_drawn.get(),
            autoplay_frames_drawn: self.autoplay_frames_drawn.get(),
            average_seek_ms: metrics.get_average_seek_ms(),
            autoplay_fps: metrics.get_average_fps(),
            memory_bytes: self.memory.allocated(),
            peak_memory_bytes: self.memory.peak(),
        }
    }

    pub fn state(&self) -> ScrubberState {
        self.state.get()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.state.get() == ScrubberState::Disposed
    }

    pub fn descriptor(&self) -> &SectionDescriptor {
        &self.descriptor
    }

    pub fn frame_count(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn start_index(&self) -> usize {
        self.start_index.get()
    }

    fn transition(&self, next: ScrubberState) -> Result<(), ScrubError> {
        let current = self.state.get();
        if current == ScrubberState::Disposed {
            return Err(ScrubError::Disposed);
        }
        if !current.can_transition_to(next) {
            return Err(ScrubError::InvalidTransition { from: current, to: next });
        }
        debug!("{}: {:?} -> {:?}", self.descriptor.source, current, next);
        self.state.set(next);
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), ScrubError> {
        if self.is_disposed() {
            Err(ScrubError::Disposed)
        } else {
            Ok(())
        }
    }
}
