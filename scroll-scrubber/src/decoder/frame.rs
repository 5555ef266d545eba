use super::media::Bitmap;

/// Ordered, append-only store of extracted frames.
///
/// `capacity` only bounds the indices accepted; nothing is reserved up front.
/// Frames are pushed exactly once, in index order, while extraction runs.
/// After [`FrameCache::seal`] the cache rejects further writes until it is
/// released on dispose.
pub struct FrameCache<B> {
    frames: Vec<B>,
    capacity: usize,
    sealed: bool,
}

impl<B: Bitmap> FrameCache<B> {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: Vec::new(),
            capacity,
            sealed: false,
        }
    }

    /// Append the frame for `index`. Out-of-order, overflowing or post-seal
    /// pushes are refused and hand the bitmap back.
    pub fn push(&mut self, index: usize, frame: B) -> Result<(), B> {
        if self.sealed || index != self.frames.len() || index >= self.capacity {
            return Err(frame);
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn get(&self, index: usize) -> Option<&B> {
        self.frames.get(index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn byte_size(&self) -> usize {
        self.frames.iter().map(Bitmap::byte_size).sum()
    }

    /// Close every bitmap and empty the cache. Returns the bytes released.
    pub fn release(&mut self) -> usize {
        let bytes = self.byte_size();
        for frame in self.frames.drain(..) {
            frame.close();
        }
        self.sealed = true;
        bytes
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    struct TestBitmap {
        bytes: usize,
        closed: Rc<Cell<usize>>,
    }

    impl Bitmap for TestBitmap {
        fn byte_size(&self) -> usize {
            self.bytes
        }

        fn close(&self) {
            self.closed.set(self.closed.get() + 1);
        }
    }

    fn bitmap(closed: &Rc<Cell<usize>>) -> TestBitmap {
        TestBitmap {
            bytes: 16,
            closed: closed.clone(),
        }
    }

    #[test]
    fn pushes_must_be_in_order() {
        let closed = Rc::new(Cell::new(0));
        let mut cache = FrameCache::new(3);
        assert!(cache.push(0, bitmap(&closed)).is_ok());
        assert!(cache.push(2, bitmap(&closed)).is_err());
        assert!(cache.push(1, bitmap(&closed)).is_ok());
        assert!(cache.push(1, bitmap(&closed)).is_err());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn capacity_and_seal_are_enforced() {
        let closed = Rc::new(Cell::new(0));
        let mut cache = FrameCache::new(1);
        assert!(cache.push(0, bitmap(&closed)).is_ok());
        assert!(cache.push(1, bitmap(&closed)).is_err());

        let mut cache = FrameCache::new(2);
        cache.seal();
        assert!(cache.push(0, bitmap(&closed)).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn out_of_range_lookups_are_none() {
        let closed = Rc::new(Cell::new(0));
        let mut cache = FrameCache::new(2);
        cache.push(0, bitmap(&closed)).ok();
        assert!(cache.get(0).is_some());
        assert!(cache.get(1).is_none());
        assert!(cache.get(usize::MAX).is_none());
    }

    #[test]
    fn release_closes_every_frame() {
        let closed = Rc::new(Cell::new(0));
        let mut cache = FrameCache::new(3);
        for i in 0..3 {
            cache.push(i, bitmap(&closed)).ok();
        }
        assert_eq!(cache.byte_size(), 48);
        assert_eq!(cache.release(), 48);
        assert_eq!(closed.get(), 3);
        assert!(cache.is_empty());
    }
}
