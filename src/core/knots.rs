use ndarray::{aview1, ArrayView1};

use crate::core::error::{Result, SplineError};
use crate::core::interval::Interval;

/// A strictly increasing sequence of at least two finite knots.
#[derive(Debug, Clone, PartialEq)]
pub struct Knots {
    values: Vec<f64>,
}

impl Knots {
    /// Sorts and deduplicates `knots`.
    ///
    /// # Arguments
    /// * `knots` - Knot values in any order, possibly repeated.
    ///
    /// # Returns
    /// The knot sequence, or an error if a value is not finite or fewer than two
    /// distinct knots remain.
    pub fn new(knots: &[f64]) -> Result<Self> {
        if let Some((index, &value)) = knots.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(SplineError::NonFiniteKnot { index, value });
        }

        let mut sorted = knots.to_vec();
        sorted.sort_by(f64::total_cmp);
        sorted.dedup();

        if sorted.len() < knots.len() {
            log::warn!(
                "Dropped {} duplicate knot(s); {} distinct knots remain",
                knots.len() - sorted.len(),
                sorted.len()
            );
        }
        if sorted.len() < 2 {
            return Err(SplineError::TooFewKnots { found: sorted.len() });
        }

        Ok(Knots {
            values: sorted,
        })
    }

    pub fn values(&self) -> ArrayView1<f64> {
        aview1(&self.values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn num_knots(&self) -> usize {
        self.values.len()
    }

    pub fn num_intervals(&self) -> usize {
        self.values.len() - 1
    }

    /// Number of basis functions of the given degree over these knots.
    pub fn num_bases(&self, degree: usize) -> usize {
        self.num_intervals() + degree
    }

    /// Support of basis `index` at sub-degree `degree`:
    /// `[knots[max(index - degree, 0)], knots[min(index + 1, num_intervals)]]`.
    ///
    /// The first basis gets `-inf` as its left end when `extend_left` is set,
    /// and the last basis gets `+inf` as its right end when `extend_right` is set.
    pub fn support(&self, index: usize, degree: usize, extend_left: bool, extend_right: bool) -> Result<Interval> {
        let count = self.num_bases(degree);
        if index >= count {
            return Err(SplineError::InvalidIndex { index, degree, count });
        }

        let n = self.num_intervals();
        let mut left = self.values[index.saturating_sub(degree)];
        let mut right = self.values[usize::min(index + 1, n)];

        if index == 0 && extend_left {
            left = f64::NEG_INFINITY;
        }
        if index == count - 1 && extend_right {
            right = f64::INFINITY;
        }
        Ok(Interval::new(left, right))
    }
}
