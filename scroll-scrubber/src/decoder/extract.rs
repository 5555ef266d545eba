use futures::future::{self, Either};
use futures::pin_mut;
use log::debug;

use super::media::{Page, Video};
use super::queue::{SeekQueue, SeekTarget};
use crate::error::ScrubError;

/// Timing of one completed capture.
#[derive(Debug, Clone, Copy)]
pub struct Capture {
    pub target: SeekTarget,
    /// Milliseconds from issuing the seek to holding the bitmap.
    pub elapsed_ms: f64,
}

/// Drain `queue` against `video`: seek, wait for the seek to land, snapshot,
/// hand the bitmap to `sink`. Exactly one seek is outstanding at a time.
///
/// The sink may stop extraction early by returning an error. Returns the
/// number of frames captured.
pub async fn extract_frames<V, P, F>(
    video: &V,
    page: &P,
    queue: &mut SeekQueue,
    seek_timeout_ms: Option<f64>,
    mut sink: F,
) -> Result<usize, ScrubError>
where
    V: Video,
    P: Page,
    F: FnMut(Capture, V::Bitmap) -> Result<(), ScrubError>,
{
    let mut captured = 0;
    while let Some(target) = queue.pop() {
        let started = page.now_ms();
        seek(video, page, target, seek_timeout_ms).await?;
        let bitmap = video.snapshot().await?;
        let elapsed_ms = page.now_ms() - started;

        debug!(
            "frame {}/{} captured at t={:.3}s in {:.1}ms",
            target.index + 1,
            queue.total(),
            target.time,
            elapsed_ms
        );

        sink(Capture { target, elapsed_ms }, bitmap)?;
        captured += 1;
    }
    Ok(captured)
}

async fn seek<V: Video, P: Page>(
    video: &V,
    page: &P,
    target: SeekTarget,
    timeout_ms: Option<f64>,
) -> Result<(), ScrubError> {
    let Some(timeout_ms) = timeout_ms else {
        return video.seek(target.time).await;
    };

    let seeked = video.seek(target.time);
    let timer = page.sleep(timeout_ms);
    pin_mut!(seeked, timer);

    match future::select(seeked, timer).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => Err(ScrubError::SeekTimeout {
            index: target.index,
            time: target.time,
            timeout_ms,
        }),
    }
}
