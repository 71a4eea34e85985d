//! Shape type: dimensions of a dense buffer

use smallvec::SmallVec;

/// Stack allocation threshold for dimensions
/// Most buffers have 4 or fewer dimensions, so we stack-allocate up to 4
pub(crate) const STACK_DIMS: usize = 4;

/// Shape type: extent along each dimension of a dense buffer
pub type Shape = SmallVec<[usize; STACK_DIMS]>;

/// Number of elements described by a shape
///
/// A zero-dimensional shape describes a scalar and holds one element.
/// Saturates at `usize::MAX`; byte sizes are computed with checked math.
#[inline]
pub fn elem_count(shape: &[usize]) -> usize {
    shape.iter().fold(1usize, |acc, &d| acc.saturating_mul(d))
}
