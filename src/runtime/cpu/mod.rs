//! CPU runtime implementation
//!
//! The CPU runtime places buffers on the host heap using 64-byte aligned,
//! zero-initialized allocations.

mod client;
mod device;
mod runtime;

pub use client::{CpuAllocator, CpuClient};
pub use device::CpuDevice;
pub use runtime::CpuRuntime;
