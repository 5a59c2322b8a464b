// SPDX-License-Identifier: GPL-3.0-only

//! Triple-buffered output images for a compute stage
//!
//! Every call to [`TexturePool::acquire`] advances the rotation cursor before
//! picking a slot, so the image handed out for frame N is not written again
//! until frames N+1 and N+2 have each taken a different slot. That gives the
//! display (or the next stage of a later frame) two frames to finish reading
//! it, without the CPU ever waiting on the GPU.
//!
//! Slots are filled lazily and reallocated only when the requested shape
//! changes, so steady-state playback performs no allocations at all.
//!
//! The pool is not synchronized. It belongs to exactly one stage and must be
//! driven from one submission thread, once per frame.

use crate::constants::POOL_CAPACITY;
use crate::errors::FrameError;
use crate::shaders::backend::{FrameImage, ImageAllocator, ImageDescriptor};
use tracing::debug;

/// Fixed rotation of reusable output images
#[derive(Debug)]
pub struct TexturePool<I> {
    slots: [Option<I>; POOL_CAPACITY],
    cursor: usize,
    allocations: u64,
}

impl<I: FrameImage> Default for TexturePool<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: FrameImage> TexturePool<I> {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            cursor: 0,
            allocations: 0,
        }
    }

    /// Rotate to the next slot and return an image of exactly `desc`'s shape.
    ///
    /// The slot's previous image is reused when its shape matches, otherwise
    /// it is dropped and replaced. Contents of a reused image are whatever the
    /// last dispatch wrote; nothing is cleared.
    ///
    /// Zero-sized requests are rejected before the cursor moves. When the
    /// allocator fails the slot is left empty and the error is returned.
    pub fn acquire<A>(&mut self, allocator: &A, desc: &ImageDescriptor) -> Result<I, FrameError>
    where
        A: ImageAllocator<Image = I>,
    {
        desc.validate()?;

        self.cursor = (self.cursor + 1) % POOL_CAPACITY;
        let slot = &mut self.slots[self.cursor];

        if let Some(image) = slot.as_ref().filter(|image| desc.matches(*image)) {
            return Ok(image.clone());
        }

        if let Some(stale) = slot.take() {
            debug!(
                slot = self.cursor,
                old_width = stale.width(),
                old_height = stale.height(),
                width = desc.width,
                height = desc.height,
                "Replacing pooled image"
            );
        }

        let image = allocator.allocate_image(desc)?;
        self.allocations += 1;
        debug!(
            slot = self.cursor,
            width = desc.width,
            height = desc.height,
            format = ?desc.format,
            allocations = self.allocations,
            "Allocated pooled image"
        );

        *slot = Some(image.clone());
        Ok(image)
    }

    /// Slot index used by the most recent acquire
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Images allocated over the pool's lifetime
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    /// Number of slots currently holding an image
    pub fn occupied_slots(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Image held by a slot, if any
    pub fn slot(&self, index: usize) -> Option<&I> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Drop every pooled image. The cursor keeps its position.
    ///
    /// Only call this once the GPU has finished with all submitted frames,
    /// e.g. at shutdown or after device loss.
    pub fn release_all(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::wgpu::TextureFormat;
    use std::cell::Cell;

    #[derive(Debug, Clone)]
    struct TestImage {
        id: u32,
        width: u32,
        height: u32,
        format: TextureFormat,
    }

    impl FrameImage for TestImage {
        fn width(&self) -> u32 {
            self.width
        }
        fn height(&self) -> u32 {
            self.height
        }
        fn format(&self) -> TextureFormat {
            self.format
        }
        fn same_image(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }

    #[derive(Default)]
    struct CountingAllocator {
        next_id: Cell<u32>,
        fail: Cell<bool>,
    }

    impl ImageAllocator for CountingAllocator {
        type Image = TestImage;

        fn allocate_image(&self, desc: &ImageDescriptor) -> Result<TestImage, FrameError> {
            if self.fail.get() {
                return Err(FrameError::AllocationFailed {
                    width: desc.width,
                    height: desc.height,
                    format: desc.format,
                    reason: "injected".to_string(),
                });
            }
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            Ok(TestImage {
                id,
                width: desc.width,
                height: desc.height,
                format: desc.format,
            })
        }
    }

    fn hd() -> ImageDescriptor {
        ImageDescriptor::new(1280, 720, TextureFormat::Rgba16Float)
    }

    #[test]
    fn test_first_acquire_uses_slot_one() {
        let allocator = CountingAllocator::default();
        let mut pool = TexturePool::new();

        pool.acquire(&allocator, &hd()).unwrap();
        assert_eq!(pool.cursor(), 1);
        assert!(pool.slot(0).is_none());
        assert!(pool.slot(1).is_some());
    }

    #[test]
    fn test_steady_state_does_not_allocate() {
        let allocator = CountingAllocator::default();
        let mut pool = TexturePool::new();

        for _ in 0..30 {
            pool.acquire(&allocator, &hd()).unwrap();
        }
        assert_eq!(pool.allocations(), 3);
        assert_eq!(pool.occupied_slots(), 3);
    }

    #[test]
    fn test_format_change_reallocates() {
        let allocator = CountingAllocator::default();
        let mut pool = TexturePool::new();

        let first = pool.acquire(&allocator, &hd()).unwrap();
        pool.acquire(&allocator, &hd()).unwrap();
        pool.acquire(&allocator, &hd()).unwrap();

        let unorm = ImageDescriptor::new(1280, 720, TextureFormat::Rgba8Unorm);
        let replaced = pool.acquire(&allocator, &unorm).unwrap();
        assert!(!replaced.same_image(&first));
        assert_eq!(replaced.format(), TextureFormat::Rgba8Unorm);
        assert_eq!(pool.allocations(), 4);
    }

    #[test]
    fn test_zero_size_rejected_without_rotation() {
        let allocator = CountingAllocator::default();
        let mut pool = TexturePool::new();

        let err = pool
            .acquire(&allocator, &ImageDescriptor::new(0, 720, TextureFormat::Rgba16Float))
            .unwrap_err();
        assert_eq!(
            err,
            FrameError::InvalidDimensions {
                width: 0,
                height: 720
            }
        );
        assert_eq!(pool.cursor(), 0);
        assert_eq!(pool.allocations(), 0);
    }

    #[test]
    fn test_failed_allocation_leaves_slot_empty() {
        let allocator = CountingAllocator::default();
        let mut pool = TexturePool::new();

        // Fill slot 1, then come back to it with a new size that fails
        pool.acquire(&allocator, &hd()).unwrap();
        pool.acquire(&allocator, &hd()).unwrap();
        pool.acquire(&allocator, &hd()).unwrap();

        allocator.fail.set(true);
        let uhd = ImageDescriptor::new(3840, 2160, TextureFormat::Rgba16Float);
        assert!(pool.acquire(&allocator, &uhd).is_err());
        assert_eq!(pool.cursor(), 1);
        assert!(pool.slot(1).is_none());

        // Next frame retries from scratch on the following slot
        allocator.fail.set(false);
        let image = pool.acquire(&allocator, &uhd).unwrap();
        assert_eq!(pool.cursor(), 2);
        assert_eq!((image.width(), image.height()), (3840, 2160));
    }

    #[test]
    fn test_release_all() {
        let allocator = CountingAllocator::default();
        let mut pool = TexturePool::new();

        pool.acquire(&allocator, &hd()).unwrap();
        pool.acquire(&allocator, &hd()).unwrap();
        pool.release_all();
        assert_eq!(pool.occupied_slots(), 0);
        assert_eq!(pool.cursor(), 2);
    }
}
