//! Structural checks shared by CSR construction, member rebinding, and resize

use crate::error::{Error, Result};
use crate::runtime::{Device, Runtime};
use crate::tensor::DenseTensor;

/// Build an `InvalidArgument` error and record the rejection
pub(super) fn reject(arg: &'static str, reason: String) -> Error {
    tracing::debug!(arg, %reason, "csr tensor rejected argument");
    Error::invalid_argument(arg, reason)
}

/// Logical rank must be 2 (matrix) or 3 (batch of matrices)
pub(crate) fn check_shape(dims: &[i64]) -> Result<()> {
    if dims.len() == 2 || dims.len() == 3 {
        return Ok(());
    }
    Err(reject(
        "dims",
        format!(
            "the SparseCsrTensor only supports 2-D or 3-D tensors, got a {}-D tensor",
            dims.len()
        ),
    ))
}

/// Rank check plus placement agreement of the three component buffers
///
/// `column_indices` is compared against both `row_offsets` and `values`.
/// An uninitialized buffer has no placement and never matches an
/// initialized one.
pub(crate) fn check_members<R: Runtime>(
    row_offsets: &DenseTensor<R>,
    column_indices: &DenseTensor<R>,
    values: &DenseTensor<R>,
    dims: &[i64],
) -> Result<()> {
    check_shape(dims)?;

    if !same_place(column_indices, row_offsets) {
        return Err(reject(
            "row_offsets",
            "row_offsets and column_indices must have the same place".to_string(),
        ));
    }
    if !same_place(column_indices, values) {
        return Err(reject(
            "values",
            "column_indices and values must have the same place".to_string(),
        ));
    }
    Ok(())
}

fn same_place<R: Runtime>(a: &DenseTensor<R>, b: &DenseTensor<R>) -> bool {
    match (a.place(), b.place()) {
        (Some(x), Some(y)) => x.is_same(y),
        (None, None) => true,
        _ => false,
    }
}

/// Length of `row_offsets` for a logical shape
///
/// `rows + 1` for `[rows, cols]`; `batch * (rows + 1)` for
/// `[batch, rows, cols]`.
pub(crate) fn row_offsets_len(dims: &[i64]) -> Result<usize> {
    check_shape(dims)?;
    if let Some(&d) = dims.iter().find(|&&d| d < 0) {
        return Err(reject(
            "dims",
            format!("extent {d} in {dims:?} is negative"),
        ));
    }

    let len = if dims.len() == 3 {
        // dims[0] is the batch size
        dims[1]
            .checked_add(1)
            .and_then(|rows| dims[0].checked_mul(rows))
    } else {
        dims[0].checked_add(1)
    };
    len.and_then(|len| usize::try_from(len).ok())
        .ok_or_else(|| reject("dims", format!("row_offsets length for {dims:?} overflows")))
}
