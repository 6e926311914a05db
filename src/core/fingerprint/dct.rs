//! Separable 2-D DCT-II restricted to the low-frequency corner.
//!
//! Uses the unnormalized convention `X[k] = 2 * sum x[n] * cos(pi * k * (2n + 1) / 2N)`,
//! applied along rows and then columns. Only the first `keep` output rows and
//! columns are computed since the hash discards the rest.

use std::f64::consts::PI;

pub(super) struct DctTable {
    size: usize,
    /// `cos[k * size + n]` holds the basis factor for frequency `k`, sample `n`
    cos: Vec<f64>,
}

impl DctTable {
    pub(super) fn new(size: usize) -> Self {
        let mut cos = Vec::with_capacity(size * size);
        for k in 0..size {
            for n in 0..size {
                let angle = PI * k as f64 * (2 * n + 1) as f64 / (2 * size) as f64;
                cos.push(2.0 * angle.cos());
            }
        }
        Self { size, cos }
    }

    /// Transform a row-major `size x size` block and return the top-left
    /// `keep x keep` coefficients, row-major, DC term first.
    pub(super) fn low_frequency(&self, pixels: &[f64], keep: usize) -> Vec<f64> {
        let n = self.size;
        debug_assert_eq!(pixels.len(), n * n);
        debug_assert!(keep <= n);

        // Horizontal pass: every row, first `keep` frequencies
        let mut rows = vec![0.0; n * keep];
        for y in 0..n {
            let row = &pixels[y * n..(y + 1) * n];
            for v in 0..keep {
                let basis = &self.cos[v * n..(v + 1) * n];
                rows[y * keep + v] = row.iter().zip(basis).map(|(p, c)| p * c).sum();
            }
        }

        // Vertical pass over the reduced columns
        let mut out = vec![0.0; keep * keep];
        for u in 0..keep {
            let basis = &self.cos[u * n..(u + 1) * n];
            for v in 0..keep {
                out[u * keep + v] = (0..n).map(|y| basis[y] * rows[y * keep + v]).sum();
            }
        }

        out
    }
}
