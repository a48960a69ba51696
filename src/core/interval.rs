//! Interval membership and the linear functions used as blending weights.

use ndarray::{Array1, ArrayView1};

/// A pair of endpoints `[left, right]`. Either endpoint may be infinite when a
/// boundary basis is extrapolated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub left: f64,
    pub right: f64,
}

impl Interval {
    pub fn new(left: f64, right: f64) -> Self {
        Interval { left, right }
    }

    /// `right - left`.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Membership test under the given boundary convention.
    pub fn contains(&self, x: f64, left_closed: bool, right_closed: bool) -> bool {
        let above = if left_closed { x >= self.left } else { x > self.left };
        let below = if right_closed { x <= self.right } else { x < self.right };
        above && below
    }
}

/// Indicator function of `interval`: 1.0 where `x` lies inside, 0.0 elsewhere.
///
/// # Arguments
/// * `x` - Evaluation points.
/// * `interval` - The interval to test against.
/// * `left_closed` - Whether the left endpoint belongs to the interval.
/// * `right_closed` - Whether the right endpoint belongs to the interval.
pub fn indicator(
    x: ArrayView1<f64>,
    interval: &Interval,
    left_closed: bool,
    right_closed: bool,
) -> Array1<f64> {
    x.mapv(|v| {
        if interval.contains(v, left_closed, right_closed) {
            1.0
        } else {
            0.0
        }
    })
}

/// The line through base point `z` with value `f_z` and slope `df_z`, evaluated at `x`.
pub fn linear_at(x: ArrayView1<f64>, z: f64, f_z: f64, df_z: f64) -> Array1<f64> {
    x.mapv(|v| f_z + df_z * (v - z))
}

/// Ramp rising from 0 at `interval.left` to 1 at `interval.right`.
pub fn linear_left(x: ArrayView1<f64>, interval: &Interval) -> Array1<f64> {
    let width = interval.width();
    x.mapv(|v| (v - interval.left) / width)
}

/// Ramp falling from 1 at `interval.left` to 0 at `interval.right`.
pub fn linear_right(x: ArrayView1<f64>, interval: &Interval) -> Array1<f64> {
    let width = interval.left - interval.right;
    x.mapv(|v| (v - interval.right) / width)
}
