//! CSR (Compressed Sparse Row) format

mod check;
mod core;
mod resize;

pub use core::SparseCsrTensor;
