//! B-spline basis functions, their derivatives and repeated integrals.
//!
//! Basis `i` of degree `q` is built from the degree-`(q - 1)` bases `i - 1`
//! and `i` blended with linear ramps over their supports (Cox-de Boor):
//!
//! `B(i, q) = B(i-1, q-1) * rise(support(i-1, q-1)) + B(i, q-1) * fall(support(i, q-1))`
//!
//! The outer knots act as if repeated `q + 1` times, so the first and last
//! bases collapse to a single ramp raised to the power `q`.

use std::collections::HashMap;

use ndarray::{Array1, ArrayView1};

use crate::core::error::{Result, SplineError};
use crate::core::interval::{indicator, linear_left, linear_right, Interval};
use crate::core::knots::Knots;
use crate::core::piecewise::{broadcast_bounds, indicator_integral};

/// Which outer bases continue their polynomial beyond the knot domain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Extrapolation {
    /// Continue the first basis (and the recursion feeding it) to `-inf`.
    pub left: bool,
    /// Continue the last basis (and the recursion feeding it) to `+inf`.
    pub right: bool,
}

impl Extrapolation {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn left() -> Self {
        Self { left: true, right: false }
    }

    pub fn right() -> Self {
        Self { left: false, right: true }
    }

    pub fn both() -> Self {
        Self { left: true, right: true }
    }
}

/// A full B-spline basis of fixed degree over an immutable knot sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct BSpline {
    knots: Knots,
    degree: usize,
}

impl BSpline {
    /// Creates the basis over the sorted, deduplicated `knots`.
    ///
    /// # Arguments
    /// * `knots` - Knot values; duplicates are dropped and the rest sorted.
    /// * `degree` - Polynomial degree of every basis function (0 = piecewise constant).
    pub fn new(knots: &[f64], degree: usize) -> Result<Self> {
        let knots = Knots::new(knots)?;
        log::debug!(
            "B-spline basis: {} knots, {} intervals, degree {}, {} basis functions",
            knots.num_knots(),
            knots.num_intervals(),
            degree,
            knots.num_bases(degree)
        );
        Ok(BSpline { knots, degree })
    }

    pub fn knots(&self) -> &Knots {
        &self.knots
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn num_knots(&self) -> usize {
        self.knots.num_knots()
    }

    pub fn num_intervals(&self) -> usize {
        self.knots.num_intervals()
    }

    pub fn num_spline_bases(&self) -> usize {
        self.knots.num_bases(self.degree)
    }

    /// Support of basis `index` at the full degree.
    pub fn support(&self, index: usize, extrapolation: Extrapolation) -> Result<Interval> {
        self.knots
            .support(index, self.degree, extrapolation.left, extrapolation.right)
    }

    /// Value of basis `index` at every point of `x`.
    ///
    /// Without extrapolation the result is exactly zero outside
    /// [`support`](Self::support). The last knot belongs to the last interval.
    pub fn basis_value(&self, x: ArrayView1<f64>, index: usize, extrapolation: Extrapolation) -> Result<Array1<f64>> {
        Recursion::new(&self.knots, x, extrapolation).value(index, self.degree)
    }

    pub fn basis_value_at(&self, x: f64, index: usize, extrapolation: Extrapolation) -> Result<f64> {
        let points = Array1::from_elem(1, x);
        Ok(self.basis_value(points.view(), index, extrapolation)?[0])
    }

    /// `order`-th derivative of basis `index` at every point of `x`.
    ///
    /// Orders above the degree give exact zeros; order 0 is [`basis_value`](Self::basis_value).
    pub fn basis_derivative(
        &self,
        x: ArrayView1<f64>,
        index: usize,
        order: usize,
        extrapolation: Extrapolation,
    ) -> Result<Array1<f64>> {
        Recursion::new(&self.knots, x, extrapolation).derivative(index, self.degree, order)
    }

    pub fn basis_derivative_at(&self, x: f64, index: usize, order: usize, extrapolation: Extrapolation) -> Result<f64> {
        let points = Array1::from_elem(1, x);
        Ok(self.basis_derivative(points.view(), index, order, extrapolation)?[0])
    }

    /// `order`-fold integral of basis `index` from `a` to `x`.
    ///
    /// `a` and `x` broadcast against each other (a length-1 array is repeated)
    /// and every lower bound must not exceed its upper bound. Order 0 is the
    /// basis value at `x`.
    pub fn basis_integral(
        &self,
        a: ArrayView1<f64>,
        x: ArrayView1<f64>,
        index: usize,
        order: usize,
        extrapolation: Extrapolation,
    ) -> Result<Array1<f64>> {
        let (lower, upper) = integration_bounds(a, x)?;
        Recursion::with_lower_bound(&self.knots, lower.view(), upper.view(), extrapolation)
            .integral(index, self.degree, order)
    }

    pub fn basis_integral_at(
        &self,
        a: f64,
        x: f64,
        index: usize,
        order: usize,
        extrapolation: Extrapolation,
    ) -> Result<f64> {
        let lower = Array1::from_elem(1, a);
        let upper = Array1::from_elem(1, x);
        Ok(self.basis_integral(lower.view(), upper.view(), index, order, extrapolation)?[0])
    }
}

/// Broadcasts integration bounds and checks `a <= x` pointwise.
pub(crate) fn integration_bounds(a: ArrayView1<f64>, x: ArrayView1<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
    let (lower, upper) = broadcast_bounds(a, x)?;
    for (index, (&l, &u)) in lower.iter().zip(upper.iter()).enumerate() {
        if l > u {
            return Err(SplineError::InvertedBounds { index, lower: l, upper: u });
        }
    }
    Ok((lower, upper))
}

/// Blending weight of a degree-`(q - 1)` neighbour inside a degree-`q` basis.
#[derive(Debug, Clone, Copy)]
enum Ramp {
    /// 0 at the left end of the support, 1 at the right end.
    Rising(Interval),
    /// 1 at the left end of the support, 0 at the right end.
    Falling(Interval),
}

impl Ramp {
    fn value(&self, x: ArrayView1<f64>) -> Array1<f64> {
        match self {
            Ramp::Rising(support) => linear_left(x, support),
            Ramp::Falling(support) => linear_right(x, support),
        }
    }

    fn slope(&self) -> f64 {
        match self {
            Ramp::Rising(support) => 1.0 / support.width(),
            Ramp::Falling(support) => -1.0 / support.width(),
        }
    }
}

/// One term of the two-term recursion: lower-degree basis `index` weighted by `ramp`.
#[derive(Debug, Clone, Copy)]
struct Neighbour {
    index: usize,
    ramp: Ramp,
}

/// How basis `(i, q)` is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BasisCase {
    /// `q == 0`: indicator of one knot interval.
    Constant,
    /// `i == 0`: falling ramp to the power `q`.
    First,
    /// `i == last`: rising ramp to the power `q`.
    Last,
    /// Two-term blend of the degree-`(q - 1)` neighbours.
    Interior,
}

/// Memoized evaluation of one call.
///
/// Owns nothing beyond the cache, which is dropped with the call. Results are
/// keyed by `(index, sub_degree)` or `(index, sub_degree, order)`. Recursion
/// depth equals the degree.
pub(crate) struct Recursion<'k, 'a> {
    knots: &'k Knots,
    x: ArrayView1<'a, f64>,
    lower: Option<ArrayView1<'a, f64>>,
    extrapolation: Extrapolation,
    values: HashMap<(usize, usize), Array1<f64>>,
    derivatives: HashMap<(usize, usize, usize), Array1<f64>>,
    integrals: HashMap<(usize, usize, usize), Array1<f64>>,
}

impl<'k, 'a> Recursion<'k, 'a> {
    pub(crate) fn new(knots: &'k Knots, x: ArrayView1<'a, f64>, extrapolation: Extrapolation) -> Self {
        Recursion {
            knots,
            x,
            lower: None,
            extrapolation,
            values: HashMap::new(),
            derivatives: HashMap::new(),
            integrals: HashMap::new(),
        }
    }

    /// `lower` and `x` must already have the same length.
    pub(crate) fn with_lower_bound(
        knots: &'k Knots,
        lower: ArrayView1<'a, f64>,
        x: ArrayView1<'a, f64>,
        extrapolation: Extrapolation,
    ) -> Self {
        let mut recursion = Recursion::new(knots, x, extrapolation);
        recursion.lower = Some(lower);
        recursion
    }

    fn last_index(&self, degree: usize) -> usize {
        self.knots.num_bases(degree) - 1
    }

    fn check_index(&self, index: usize, degree: usize) -> Result<()> {
        let count = self.knots.num_bases(degree);
        if index >= count {
            return Err(SplineError::InvalidIndex { index, degree, count });
        }
        Ok(())
    }

    fn classify(&self, index: usize, degree: usize) -> BasisCase {
        if degree == 0 {
            BasisCase::Constant
        } else if index == 0 {
            BasisCase::First
        } else if index == self.last_index(degree) {
            BasisCase::Last
        } else {
            BasisCase::Interior
        }
    }

    /// Support with the extrapolation flags applied.
    fn outer_support(&self, index: usize, degree: usize) -> Result<Interval> {
        self.knots
            .support(index, degree, self.extrapolation.left, self.extrapolation.right)
    }

    fn inner_support(&self, index: usize, degree: usize) -> Result<Interval> {
        self.knots.support(index, degree, false, false)
    }

    /// The degree-`(degree - 1)` terms of basis `index`; the first basis has no
    /// left neighbour and the last has no right one. Ramps never extrapolate.
    fn neighbours(&self, index: usize, degree: usize) -> Result<Vec<Neighbour>> {
        let mut terms = Vec::with_capacity(2);
        if index > 0 {
            terms.push(Neighbour {
                index: index - 1,
                ramp: Ramp::Rising(self.inner_support(index - 1, degree - 1)?),
            });
        }
        if index < self.last_index(degree) {
            terms.push(Neighbour {
                index,
                ramp: Ramp::Falling(self.inner_support(index, degree - 1)?),
            });
        }
        Ok(terms)
    }

    pub(crate) fn value(&mut self, index: usize, degree: usize) -> Result<Array1<f64>> {
        self.check_index(index, degree)?;
        if let Some(cached) = self.values.get(&(index, degree)) {
            return Ok(cached.clone());
        }

        let x = self.x;
        let power = degree as i32;
        let value = match self.classify(index, degree) {
            BasisCase::Constant => {
                let support = self.outer_support(index, 0)?;
                let right_closed = index == self.knots.num_intervals() - 1;
                indicator(x, &support, true, right_closed)
            }
            BasisCase::First => {
                let mask = indicator(x, &self.outer_support(index, degree)?, true, false);
                let ramp = linear_right(x, &self.inner_support(index, degree)?);
                mask * ramp.mapv(|r| r.powi(power))
            }
            BasisCase::Last => {
                let mask = indicator(x, &self.outer_support(index, degree)?, true, true);
                let ramp = linear_left(x, &self.inner_support(index, degree)?);
                mask * ramp.mapv(|r| r.powi(power))
            }
            BasisCase::Interior => {
                let mut acc = Array1::zeros(x.len());
                for term in self.neighbours(index, degree)? {
                    let lower = self.value(term.index, degree - 1)?;
                    acc = acc + lower * term.ramp.value(x);
                }
                acc
            }
        };

        self.values.insert((index, degree), value.clone());
        Ok(value)
    }

    /// Product rule through the recursion:
    /// `(B r)^(n) = r B^(n) + n r' B^(n-1)` for each neighbour `B` with ramp `r`.
    pub(crate) fn derivative(&mut self, index: usize, degree: usize, order: usize) -> Result<Array1<f64>> {
        self.check_index(index, degree)?;
        if order == 0 {
            return self.value(index, degree);
        }
        // Also covers degree 0, whose only non-zero derivative order is 0.
        if order > degree {
            return Ok(Array1::zeros(self.x.len()));
        }
        if let Some(cached) = self.derivatives.get(&(index, degree, order)) {
            return Ok(cached.clone());
        }

        let x = self.x;
        let n = order as f64;
        let mut acc = Array1::zeros(x.len());
        for term in self.neighbours(index, degree)? {
            let same = self.derivative(term.index, degree - 1, order)?;
            let below = self.derivative(term.index, degree - 1, order - 1)?;
            acc = acc + same * term.ramp.value(x) + below * (n * term.ramp.slope());
        }

        self.derivatives.insert((index, degree, order), acc.clone());
        Ok(acc)
    }

    /// Integration by parts through the recursion:
    /// `I_n(B r) = r I_n(B) - n r' I_(n+1)(B)` for each neighbour `B` with ramp `r`.
    /// Degree 0 integrates the indicator exactly.
    pub(crate) fn integral(&mut self, index: usize, degree: usize, order: usize) -> Result<Array1<f64>> {
        self.check_index(index, degree)?;
        if order == 0 {
            return self.value(index, degree);
        }
        if let Some(cached) = self.integrals.get(&(index, degree, order)) {
            return Ok(cached.clone());
        }

        let x = self.x;
        let lower = self.lower.unwrap_or(x);
        let integral = if degree == 0 {
            let support = self.outer_support(index, 0)?;
            indicator_integral(lower, x, order, &support)?
        } else {
            let n = order as f64;
            let mut acc = Array1::zeros(x.len());
            for term in self.neighbours(index, degree)? {
                let same = self.integral(term.index, degree - 1, order)?;
                let above = self.integral(term.index, degree - 1, order + 1)?;
                acc = acc + same * term.ramp.value(x) - above * (n * term.ramp.slope());
            }
            acc
        };

        self.integrals.insert((index, degree, order), integral.clone());
        Ok(integral)
    }
}
