//! Dense design matrices: one row per evaluation point, one column per basis.

use ndarray::{Array1, Array2, ArrayView1};

use crate::core::error::{Result, SplineError};
use crate::core::splines::{integration_bounds, BSpline, Extrapolation, Recursion};

impl BSpline {
    /// Basis values, `[x.len(), num_spline_bases]`.
    pub fn design_matrix(&self, x: ArrayView1<f64>, extrapolation: Extrapolation) -> Result<Array2<f64>> {
        log::trace!("Assembling value design matrix for {} points", x.len());
        let mut recursion = Recursion::new(self.knots(), x, extrapolation);
        self.stack_columns(x.len(), |index| recursion.value(index, self.degree()))
    }

    /// `order`-th derivatives of every basis, `[x.len(), num_spline_bases]`.
    pub fn derivative_matrix(
        &self,
        x: ArrayView1<f64>,
        order: usize,
        extrapolation: Extrapolation,
    ) -> Result<Array2<f64>> {
        log::trace!("Assembling order-{} derivative design matrix for {} points", order, x.len());
        let mut recursion = Recursion::new(self.knots(), x, extrapolation);
        self.stack_columns(x.len(), |index| recursion.derivative(index, self.degree(), order))
    }

    /// `order`-fold integrals of every basis from `a` to `x`, one row per
    /// broadcast bound pair.
    pub fn integral_matrix(
        &self,
        a: ArrayView1<f64>,
        x: ArrayView1<f64>,
        order: usize,
        extrapolation: Extrapolation,
    ) -> Result<Array2<f64>> {
        let (lower, upper) = integration_bounds(a, x)?;
        log::trace!("Assembling order-{} integral design matrix for {} points", order, upper.len());
        let mut recursion = Recursion::with_lower_bound(self.knots(), lower.view(), upper.view(), extrapolation);
        self.stack_columns(upper.len(), |index| recursion.integral(index, self.degree(), order))
    }

    fn stack_columns<F>(&self, rows: usize, mut column: F) -> Result<Array2<f64>>
    where
        F: FnMut(usize) -> Result<Array1<f64>>,
    {
        let mut matrix = Array2::zeros((rows, self.num_spline_bases()));
        for index in 0..self.num_spline_bases() {
            matrix.column_mut(index).assign(&column(index)?);
        }
        Ok(matrix)
    }

    /// Spline `sum_j c_j B_j(x)` for the given coefficients.
    ///
    /// # Arguments
    /// * `x` - Evaluation points.
    /// * `coefficients` - One coefficient per basis function.
    /// * `extrapolation` - Which outer bases continue past the knot domain.
    pub fn evaluate(
        &self,
        x: ArrayView1<f64>,
        coefficients: ArrayView1<f64>,
        extrapolation: Extrapolation,
    ) -> Result<Array1<f64>> {
        self.check_coefficients(coefficients)?;
        Ok(self.design_matrix(x, extrapolation)?.dot(&coefficients))
    }

    /// `order`-th derivative of the spline with the given coefficients.
    pub fn evaluate_derivative(
        &self,
        x: ArrayView1<f64>,
        order: usize,
        coefficients: ArrayView1<f64>,
        extrapolation: Extrapolation,
    ) -> Result<Array1<f64>> {
        self.check_coefficients(coefficients)?;
        Ok(self.derivative_matrix(x, order, extrapolation)?.dot(&coefficients))
    }

    fn check_coefficients(&self, coefficients: ArrayView1<f64>) -> Result<()> {
        if coefficients.len() != self.num_spline_bases() {
            return Err(SplineError::CoefficientLengthMismatch {
                expected: self.num_spline_bases(),
                found: coefficients.len(),
            });
        }
        Ok(())
    }

    /// Maps spline coefficients to the `degree`-th derivative on each knot
    /// interval, `[num_intervals, num_spline_bases]`.
    ///
    /// The highest derivative is constant per interval; row `k` holds its value
    /// on `[knots[k], knots[k + 1]]`. Built as `p D_p`, then `q D_q` applied on
    /// the left for `q = p - 1, ..., 1`.
    ///
    /// At degree 0 this is the identity, the value on each interval, rather
    /// than the zero matrix the scaled construction would give.
    pub fn highest_derivative_matrix(&self) -> Result<Array2<f64>> {
        let degree = self.degree();
        if degree == 0 {
            // Piecewise constant: coefficient k is the value on interval k.
            return Ok(Array2::eye(self.num_intervals()));
        }
        let mut matrix = self.difference_factor(degree)? * degree as f64;
        for q in (1..degree).rev() {
            matrix = (self.difference_factor(q)? * q as f64).dot(&matrix);
        }
        Ok(matrix)
    }

    /// Differences of degree-`q` coefficients divided by the width of the
    /// degree-`(q - 1)` support they share, `[num_intervals + q - 1, num_intervals + q]`.
    /// Requires `q >= 1`.
    fn difference_factor(&self, q: usize) -> Result<Array2<f64>> {
        let mut factor = sequential_difference_matrix(self.num_intervals() + q)?;
        for (row, mut values) in factor.rows_mut().into_iter().enumerate() {
            let width = self.knots().support(row, q - 1, false, false)?.width();
            values /= width;
        }
        Ok(factor)
    }
}

/// First-difference matrix of shape `[size - 1, size]`: `-1` on the diagonal
/// and `+1` just above it.
pub fn sequential_difference_matrix(size: usize) -> Result<Array2<f64>> {
    if size < 2 {
        return Err(SplineError::InvalidDifferenceSize(size));
    }
    let mut matrix = Array2::zeros((size - 1, size));
    for row in 0..size - 1 {
        matrix[[row, row]] = -1.0;
        matrix[[row, row + 1]] = 1.0;
    }
    Ok(matrix)
}
