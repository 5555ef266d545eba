//! In-memory stand-ins for the browser: videos that record seeks, a surface
//! that records draws, and a page with a manually driven clock.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future;
use scroll_scrubber::decoder::{Bitmap, Page, Video};
use scroll_scrubber::render::Surface;
use scroll_scrubber::{FrameScrubber, ScrubError, SectionDescriptor, VideoChildren, Viewport};

pub const BITMAP_BYTES: usize = 64;
pub const FRAME_MS: f64 = 16.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Draw {
    /// Cached frame, identified by capture order.
    Frame(usize),
    Live(&'static str),
}

#[derive(Default)]
pub struct Recorder {
    pub seeks: Vec<(&'static str, f64)>,
    pub loads: Vec<(&'static str, String)>,
    pub configured: Vec<&'static str>,
    pub plays: Vec<&'static str>,
    pub pauses: Vec<&'static str>,
    pub draws: Vec<Draw>,
    pub clears: usize,
    pub resizes: Vec<(u32, u32)>,
    pub closed: usize,
}

pub type Log = Rc<RefCell<Recorder>>;

pub fn recorder() -> Log {
    Rc::new(RefCell::new(Recorder::default()))
}

pub struct FakeBitmap {
    pub seq: usize,
    pub time: f64,
    log: Log,
}

impl Bitmap for FakeBitmap {
    fn byte_size(&self) -> usize {
        BITMAP_BYTES
    }

    fn close(&self) {
        self.log.borrow_mut().closed += 1;
    }
}

pub struct FakeVideo {
    pub role: &'static str,
    log: Log,
    current: Cell<f64>,
    snapshots: Cell<usize>,
    block_play: bool,
    /// Seeks after this many never complete.
    stall_after: Option<usize>,
}

impl FakeVideo {
    pub fn new(role: &'static str, log: &Log) -> Self {
        Self {
            role,
            log: log.clone(),
            current: Cell::new(0.0),
            snapshots: Cell::new(0),
            block_play: false,
            stall_after: None,
        }
    }

    pub fn blocking_autoplay(mut self) -> Self {
        self.block_play = true;
        self
    }

    pub fn stalling_after(mut self, seeks: usize) -> Self {
        self.stall_after = Some(seeks);
        self
    }
}

/// Fakes stand for distinct elements unless they share a role.
impl PartialEq for FakeVideo {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role
    }
}

impl Video for FakeVideo {
    type Bitmap = FakeBitmap;

    fn configure(&self) {
        self.log.borrow_mut().configured.push(self.role);
    }

    fn set_source(&self, source: &str) {
        self.log.borrow_mut().loads.push((self.role, source.to_string()));
    }

    fn load(&self) {}

    async fn loaded(&self) -> Result<(), ScrubError> {
        Ok(())
    }

    async fn seek(&self, time: f64) -> Result<(), ScrubError> {
        let issued = {
            let mut log = self.log.borrow_mut();
            log.seeks.push((self.role, time));
            log.seeks.iter().filter(|(role, _)| *role == self.role).count()
        };
        if self.stall_after.is_some_and(|limit| issued > limit) {
            future::pending::<()>().await;
        }
        self.current.set(time);
        Ok(())
    }

    async fn snapshot(&self) -> Result<FakeBitmap, ScrubError> {
        let seq = self.snapshots.get();
        self.snapshots.set(seq + 1);
        Ok(FakeBitmap {
            seq,
            time: self.current.get(),
            log: self.log.clone(),
        })
    }

    async fn play(&self) -> Result<(), ScrubError> {
        if self.block_play {
            return Err(ScrubError::AutoplayBlocked("NotAllowedError".into()));
        }
        self.log.borrow_mut().plays.push(self.role);
        Ok(())
    }

    fn pause(&self) {
        self.log.borrow_mut().pauses.push(self.role);
    }
}

pub struct FakeSurface {
    log: Log,
}

impl FakeSurface {
    pub fn new(log: &Log) -> Self {
        Self { log: log.clone() }
    }
}

impl Surface for FakeSurface {
    type Bitmap = FakeBitmap;
    type Video = FakeVideo;

    fn resize(&self, viewport: &Viewport) -> Result<(), ScrubError> {
        self.log.borrow_mut().resizes.push(viewport.backing_size());
        Ok(())
    }

    fn clear(&self, _viewport: &Viewport) {
        self.log.borrow_mut().clears += 1;
    }

    fn draw_bitmap(&self, bitmap: &FakeBitmap, _viewport: &Viewport) -> Result<(), ScrubError> {
        self.log.borrow_mut().draws.push(Draw::Frame(bitmap.seq));
        Ok(())
    }

    fn draw_video(&self, video: &FakeVideo, _viewport: &Viewport) -> Result<(), ScrubError> {
        self.log.borrow_mut().draws.push(Draw::Live(video.role));
        Ok(())
    }
}

/// Page whose scroll offset and viewport the test moves by hand. The clock
/// advances one frame per animation frame; timers fire immediately.
#[derive(Clone)]
pub struct FakePage {
    pub scroll_top: Rc<Cell<f64>>,
    pub viewport: Rc<Cell<Viewport>>,
    pub section_top: f64,
    pub section_height: f64,
    clock: Rc<Cell<f64>>,
}

impl FakePage {
    /// A 3000px section at the top of a page with a 1000px viewport, so
    /// scrolling 0..=2000 sweeps progress 0..=1.
    pub fn new() -> Self {
        Self {
            scroll_top: Rc::new(Cell::new(0.0)),
            viewport: Rc::new(Cell::new(Viewport::new(1280.0, 1000.0, 2.0))),
            section_top: 0.0,
            section_height: 3000.0,
            clock: Rc::new(Cell::new(0.0)),
        }
    }

    pub fn scroll_to(&self, top: f64) {
        self.scroll_top.set(top);
    }
}

impl Page for FakePage {
    fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    fn scroll_top(&self) -> f64 {
        self.scroll_top.get()
    }

    fn section_top(&self) -> f64 {
        self.section_top
    }

    fn section_height(&self) -> f64 {
        self.section_height
    }

    fn now_ms(&self) -> f64 {
        self.clock.get()
    }

    async fn animation_frame(&self) {
        self.clock.set(self.clock.get() + FRAME_MS);
    }

    async fn sleep(&self, _ms: f64) {}
}

pub type TestScrubber = FrameScrubber<FakePage, FakeVideo, FakeSurface>;

/// 10s at 30fps, every 2nd frame: 150 cached frames.
pub fn descriptor() -> SectionDescriptor {
    SectionDescriptor::new("clip.mp4", 10.0, 30.0, 2)
}

pub fn normal(
    descriptor: SectionDescriptor,
    video: FakeVideo,
    page: &FakePage,
    log: &Log,
) -> TestScrubber {
    let children = VideoChildren {
        any: Some(video),
        playback: None,
        extractor: None,
    };
    FrameScrubber::from_children(descriptor, children, page.clone(), FakeSurface::new(log))
        .expect("normal section should resolve")
}

pub fn intro(
    descriptor: SectionDescriptor,
    playback: FakeVideo,
    extractor: FakeVideo,
    page: &FakePage,
    log: &Log,
) -> TestScrubber {
    let children = VideoChildren {
        any: None,
        playback: Some(playback),
        extractor: Some(extractor),
    };
    FrameScrubber::from_children(descriptor, children, page.clone(), FakeSurface::new(log))
        .expect("intro section should resolve")
}

pub fn frame_draws(log: &Log) -> Vec<usize> {
    log.borrow()
        .draws
        .iter()
        .filter_map(|draw| match draw {
            Draw::Frame(seq) => Some(*seq),
            Draw::Live(_) => None,
        })
        .collect()
}

pub fn live_draws(log: &Log) -> usize {
    log.borrow()
        .draws
        .iter()
        .filter(|draw| matches!(draw, Draw::Live(_)))
        .count()
}
