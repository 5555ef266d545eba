//! Scroll position to frame index mapping.

/// Normalised position of a section within its scrollable range, in `[0, 1]`.
///
/// `scroll_length` is the section height minus the viewport height. When the
/// section is no taller than the viewport there is no range to scrub
/// through, so progress snaps to whichever end the page offset points at.
pub fn scroll_progress(
    scroll_top: f64,
    section_top: f64,
    section_height: f64,
    viewport_height: f64,
) -> f64 {
    let offset = scroll_top - section_top;
    let scroll_length = section_height - viewport_height;
    if !offset.is_finite() || scroll_length.is_nan() {
        return 0.0;
    }
    if scroll_length <= 0.0 {
        return if offset > 0.0 { 1.0 } else { 0.0 };
    }
    (offset / scroll_length).clamp(0.0, 1.0)
}

/// First frame scroll may show in intro mode: the frame the autoplay segment
/// ended on, clamped into the cache.
pub fn start_index(
    autoplay_seconds: f64,
    frame_rate: f64,
    stride: u32,
    frame_count: usize,
) -> usize {
    if frame_count == 0 {
        return 0;
    }
    let raw = (autoplay_seconds * frame_rate / stride as f64).floor();
    if raw.is_nan() || raw <= 0.0 {
        0
    } else {
        (raw.min(usize::MAX as f64) as usize).min(frame_count - 1)
    }
}

/// Frame shown at `progress`, mapped into `[start, frame_count - 1]`.
/// `None` when the cache is empty.
pub fn frame_index(progress: f64, frame_count: usize, start: usize) -> Option<usize> {
    let last = frame_count.checked_sub(1)?;
    let start = start.min(last);
    let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
    let span = (last - start) as f64;
    Some(start + (progress * span).floor() as usize)
}
