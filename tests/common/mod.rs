// SPDX-License-Identifier: MPL-2.0

//! Recording backend shared by the integration tests
//!
//! Images are plain ids with a shape; dispatches are appended to the stream
//! so tests can inspect what a frame would have submitted.

#![allow(dead_code)]

use frame_postfx::errors::{FrameError, SetupError};
use frame_postfx::gpu::wgpu::TextureFormat;
use frame_postfx::shaders::{
    ComputeBackend, DispatchRequest, FrameImage, ImageAllocator, ImageDescriptor,
    KernelDescriptor, ThreadGroupSize,
};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockImage {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl FrameImage for MockImage {
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

#[derive(Debug, Clone)]
pub struct MockKernel {
    pub label: String,
    pub entry_point: String,
}

/// What one recorded dispatch looked like
#[derive(Debug, Clone)]
pub struct RecordedDispatch {
    pub label: String,
    pub source: u64,
    pub destination: u64,
    pub destination_width: u32,
    pub destination_height: u32,
    pub params: Vec<u8>,
    pub workgroups: (u32, u32),
}

#[derive(Debug, Default)]
pub struct MockStream {
    pub dispatches: Vec<RecordedDispatch>,
}

#[derive(Debug)]
struct MockState {
    next_id: u64,
    allocations: u64,
    fail_allocations: bool,
    fail_dispatch: bool,
    group_size: ThreadGroupSize,
    kernels: Vec<String>,
}

/// Fake device. Clones share state, like clones of a device handle.
#[derive(Debug, Clone)]
pub struct MockBackend {
    state: Rc<RefCell<MockState>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::with_group_size(ThreadGroupSize::new(32, 8))
    }
}

impl MockBackend {
    pub fn with_group_size(group_size: ThreadGroupSize) -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState {
                // ids below 1000 are reserved for source frames
                next_id: 1000,
                allocations: 0,
                fail_allocations: false,
                fail_dispatch: false,
                group_size,
                kernels: Vec::new(),
            })),
        }
    }

    /// A decoder-provided frame, never pooled
    pub fn source_frame(id: u64, width: u32, height: u32, format: TextureFormat) -> MockImage {
        MockImage {
            id,
            width,
            height,
            format,
        }
    }

    pub fn allocations(&self) -> u64 {
        self.state.borrow().allocations
    }

    pub fn set_fail_allocations(&self, fail: bool) {
        self.state.borrow_mut().fail_allocations = fail;
    }

    pub fn set_fail_dispatch(&self, fail: bool) {
        self.state.borrow_mut().fail_dispatch = fail;
    }

    pub fn kernels(&self) -> Vec<String> {
        self.state.borrow().kernels.clone()
    }
}

impl ImageAllocator for MockBackend {
    type Image = MockImage;

    fn allocate_image(&self, desc: &ImageDescriptor) -> Result<MockImage, FrameError> {
        let mut state = self.state.borrow_mut();
        if state.fail_allocations {
            return Err(FrameError::AllocationFailed {
                width: desc.width,
                height: desc.height,
                format: desc.format,
                reason: "out of device memory".to_string(),
            });
        }
        state.allocations += 1;
        state.next_id += 1;
        Ok(MockImage {
            id: state.next_id,
            width: desc.width,
            height: desc.height,
            format: desc.format,
        })
    }
}

impl ComputeBackend for MockBackend {
    type Kernel = MockKernel;
    type CommandStream = MockStream;

    fn create_kernel(&self, desc: &KernelDescriptor<'_>) -> Result<MockKernel, SetupError> {
        // Good enough for the fake: the entry point must be declared as a function
        if !desc.source.contains(&format!("fn {}", desc.entry_point)) {
            return Err(SetupError::MissingEntryPoint {
                label: desc.label.to_string(),
                entry_point: desc.entry_point.to_string(),
            });
        }
        self.state.borrow_mut().kernels.push(desc.label.to_string());
        Ok(MockKernel {
            label: desc.label.to_string(),
            entry_point: desc.entry_point.to_string(),
        })
    }

    fn thread_group_size(&self, _kernel: &MockKernel) -> ThreadGroupSize {
        self.state.borrow().group_size
    }

    fn encode_dispatch(
        &self,
        stream: &mut MockStream,
        kernel: &MockKernel,
        request: &DispatchRequest<'_, MockImage>,
    ) -> Result<(), FrameError> {
        if self.state.borrow().fail_dispatch {
            return Err(FrameError::DispatchUnavailable(
                "command stream is closed".to_string(),
            ));
        }
        stream.dispatches.push(RecordedDispatch {
            label: kernel.label.clone(),
            source: request.source.id,
            destination: request.destination.id,
            destination_width: request.destination.width,
            destination_height: request.destination.height,
            params: request.params.to_vec(),
            workgroups: request.grid.workgroups(request.group_size),
        });
        Ok(())
    }
}
