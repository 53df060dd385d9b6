use ndarray::Array2;

/// Flatten a matrix row-major after scaling it by its global max absolute value.
///
/// An all-zero matrix stays all-zero.
pub fn normalized_flat(matrix: &Array2<f32>) -> Vec<f32> {
    let peak = matrix.iter().fold(0.0_f32, |acc, v| acc.max(v.abs()));
    let scale = if peak > 0.0 { 1.0 / peak } else { 0.0 };
    // `iter` walks in logical row-major order regardless of memory layout.
    matrix
        .iter()
        .map(|&v| if scale == 0.0 { 0.0 } else { v * scale })
        .collect()
}

/// Truncate or zero-pad `values` to exactly `len` elements.
pub fn fit_to_length(mut values: Vec<f32>, len: usize) -> Vec<f32> {
    values.resize(len, 0.0);
    values
}
