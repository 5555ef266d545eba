use crate::types::SectionDescriptor;

/// One pending capture: the cache slot and the media time to seek to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekTarget {
    pub index: usize,
    pub time: f64,
}

/// Seek targets in strictly increasing index and time order, produced one
/// at a time as extraction asks for them.
pub struct SeekQueue {
    next: usize,
    total: usize,
    stride: u32,
    frame_rate: f64,
}

impl SeekQueue {
    pub fn new(descriptor: &SectionDescriptor) -> Self {
        Self {
            next: 0,
            total: descriptor.total_frames(),
            stride: descriptor.stride,
            frame_rate: descriptor.frame_rate,
        }
    }

    pub fn pop(&mut self) -> Option<SeekTarget> {
        if self.next >= self.total {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(SeekTarget {
            index,
            time: index as f64 * self.stride as f64 / self.frame_rate,
        })
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.next
    }

    pub fn is_empty(&self) -> bool {
        self.next >= self.total
    }
}
