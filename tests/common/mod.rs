//! Common test utilities
#![allow(dead_code)]

use sparsecsr::error::{self, Error};
use sparsecsr::prelude::*;
use sparsecsr::runtime::DefaultAllocator;
use std::alloc::{Layout as AllocLayout, alloc_zeroed, dealloc};

/// Create a CPU client and device for testing
pub fn create_cpu_client() -> (<CpuRuntime as Runtime>::Client, CpuDevice) {
    let device = CpuDevice::new();
    let client = CpuRuntime::default_client(&device);
    (client, device)
}

/// Build a `[rows, cols]` CSR tensor with an explicit diagonal on the CPU
pub fn diagonal_csr(n: usize, device: &CpuDevice) -> SparseCsrTensor<CpuRuntime> {
    let row_offsets: Vec<i64> = (0..=n as i64).collect();
    let column_indices: Vec<i64> = (0..n as i64).collect();
    let values: Vec<f64> = (1..=n).map(|v| v as f64).collect();
    SparseCsrTensor::from_slices(
        &row_offsets,
        &column_indices,
        &values,
        &[n as i64, n as i64],
        device,
    )
    .expect("diagonal csr")
}

// =============================================================================
// Multi-device host backend
//
// Every device is host memory, but each carries its own id, so buffers built
// on different nodes have different placements.
// =============================================================================

const NODE_ALIGN: usize = 16;

/// Host device tagged with a node id
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeDevice(pub usize);

impl Device for NodeDevice {
    fn id(&self) -> usize {
        self.0
    }
}

/// Allocator of a [`NodeDevice`]
pub type NodeAllocator = DefaultAllocator<NodeDevice>;

/// Client bound to one node
#[derive(Clone, Debug)]
pub struct NodeClient {
    device: NodeDevice,
    allocator: NodeAllocator,
}

/// Host runtime with any number of distinct devices
#[derive(Clone, Debug)]
pub struct NodeRuntime;

fn node_alloc(size_bytes: usize) -> error::Result<u64> {
    if size_bytes == 0 {
        return Ok(0);
    }
    let layout = AllocLayout::from_size_align(size_bytes, NODE_ALIGN)
        .map_err(|e| Error::Backend(e.to_string()))?;
    // SAFETY: non-zero size
    let ptr = unsafe { alloc_zeroed(layout) };
    if ptr.is_null() {
        return Err(Error::OutOfMemory { size: size_bytes });
    }
    Ok(ptr as u64)
}

fn node_dealloc(ptr: u64, size_bytes: usize) {
    if ptr == 0 || size_bytes == 0 {
        return;
    }
    if let Ok(layout) = AllocLayout::from_size_align(size_bytes, NODE_ALIGN) {
        // SAFETY: allocated by node_alloc with the same layout
        unsafe { dealloc(ptr as *mut u8, layout) }
    }
}

impl Runtime for NodeRuntime {
    type Device = NodeDevice;
    type Client = NodeClient;
    type Allocator = NodeAllocator;

    fn name() -> &'static str {
        "node"
    }

    fn allocate(size_bytes: usize, _device: &Self::Device) -> error::Result<u64> {
        node_alloc(size_bytes)
    }

    fn deallocate(ptr: u64, size_bytes: usize, _device: &Self::Device) {
        node_dealloc(ptr, size_bytes)
    }

    fn copy_to_device(src: &[u8], dst: u64, _device: &Self::Device) -> error::Result<()> {
        if !src.is_empty() && dst != 0 {
            // SAFETY: callers size dst from the same buffer metadata
            unsafe { std::ptr::copy_nonoverlapping(src.as_ptr(), dst as *mut u8, src.len()) }
        }
        Ok(())
    }

    fn copy_from_device(src: u64, dst: &mut [u8], _device: &Self::Device) -> error::Result<()> {
        if !dst.is_empty() && src != 0 {
            // SAFETY: callers size dst from the same buffer metadata
            unsafe { std::ptr::copy_nonoverlapping(src as *const u8, dst.as_mut_ptr(), dst.len()) }
        }
        Ok(())
    }

    fn default_device() -> Self::Device {
        NodeDevice(0)
    }

    fn default_client(device: &Self::Device) -> Self::Client {
        NodeClient {
            device: device.clone(),
            allocator: DefaultAllocator::new(
                device.clone(),
                |size, _dev| node_alloc(size),
                |ptr, size, _dev| node_dealloc(ptr, size),
            ),
        }
    }
}

impl RuntimeClient<NodeRuntime> for NodeClient {
    fn device(&self) -> &NodeDevice {
        &self.device
    }

    fn synchronize(&self) {}

    fn allocator(&self) -> &NodeAllocator {
        &self.allocator
    }
}

/// Build a one-dimensional i64 buffer on a node
pub fn node_index(data: &[i64], node: usize) -> DenseTensor<NodeRuntime> {
    DenseTensor::from_slice(data, &[data.len()], &NodeDevice(node)).expect("node index buffer")
}

/// Build a one-dimensional f32 buffer on a node
pub fn node_values(data: &[f32], node: usize) -> DenseTensor<NodeRuntime> {
    DenseTensor::from_slice(data, &[data.len()], &NodeDevice(node)).expect("node values buffer")
}
