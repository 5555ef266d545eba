use std::sync::atomic::{AtomicUsize, Ordering};

/// Byte accounting for decoded frames held by one section.
pub struct Memory {
    allocated: AtomicUsize,
    peak: AtomicUsize,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            allocated: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn allocate(&self, size: usize) {
        let new_allocated = self.allocated.fetch_add(size, Ordering::SeqCst) + size;
        self.peak.fetch_max(new_allocated, Ordering::SeqCst);
    }

    pub fn deallocate(&self, size: usize) {
        let _ = self
            .allocated
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_sub(size))
            });
    }

    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_current_and_peak() {
        let memory = Memory::new();
        memory.allocate(100);
        memory.allocate(50);
        memory.deallocate(120);
        assert_eq!(memory.allocated(), 30);
        assert_eq!(memory.peak(), 150);
    }

    #[test]
    fn deallocate_saturates() {
        let memory = Memory::new();
        memory.allocate(10);
        memory.deallocate(40);
        assert_eq!(memory.allocated(), 0);
    }
}
