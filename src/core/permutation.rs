// src/core/permutation.rs

//! Cyclic reordering of tensor factors.
//!
//! A state over `n` qubits stores factor 0 in the most significant bit of an
//! amplitude index. Rotating the factor order right by `r` moves the last `r`
//! factors to the front. That rotation is a block/stride permutation of the
//! amplitude indices, so no gate matrix is ever built: bringing any qubit to
//! the least significant position is one pass over the buffer.

/// Maps an amplitude index to its position after rotating the factor order
/// of an `n`-qubit state right by `r`.
///
/// With `m = 2^r` and `k = 2^(n-r)` the index `hi * m + lo` becomes
/// `lo * k + hi`. The caller guarantees `r <= n` and `index < 2^n`.
#[inline]
pub fn rotated_index(index: usize, r: usize, n: usize) -> usize {
    let m = 1usize << r;
    let k = 1usize << (n - r);
    (index % m) * k + index / m
}

/// The rotation that undoes a rotation by `r` on `n` factors.
#[inline]
pub fn inverse_rotation(r: usize, n: usize) -> usize {
    if n == 0 { 0 } else { (n - r % n) % n }
}

/// Minimal right-rotation that moves physical factor `position` to the
/// least significant bit. Zero means the factor is already aligned.
#[inline]
pub fn rotation_to_back(n: usize, position: usize) -> usize {
    debug_assert!(position < n);
    (n - 1 - position) % n
}

/// Bit of an amplitude index that carries physical factor `position`.
#[inline]
pub fn factor_bit(n: usize, position: usize) -> usize {
    1usize << (n - 1 - position)
}
