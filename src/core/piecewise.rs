//! Exact repeated integration of piecewise polynomial functions.
//!
//! A piecewise function is an ordered list of [`Piece`]s separated by strictly
//! increasing knots: piece `k` applies between `knots[k - 1]` and `knots[k]`,
//! the first piece extends to the left of `knots[0]` and the last one to the
//! right of the last knot. `pieces.len()` must equal `knots.len() + 1`.
//!
//! The `order`-fold integral from `a` to `x` is
//! `I_n(a, x) = ∫_a^x (x - t)^(n-1) / (n-1)! f(t) dt`; `order == 0` returns the
//! function value at `x`.

use std::collections::BTreeMap;

use ndarray::{Array1, ArrayView1, Axis, Zip};

use crate::core::error::{Result, SplineError};
use crate::core::interval::{linear_at, Interval};

/// `n!` in floating point. Overflows to infinity past `170!` instead of wrapping.
pub fn factorial(n: usize) -> f64 {
    (1..=n).fold(1.0, |acc, k| acc * k as f64)
}

/// A closed-form piece of a piecewise function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Piece {
    /// `f(t) = c`
    Constant(f64),
    /// `f(t) = f_z + df_z * (t - z)`
    Linear { z: f64, f_z: f64, df_z: f64 },
}

impl Piece {
    /// `order`-fold integral of this piece from `a` to `x`.
    pub fn integral(&self, a: ArrayView1<f64>, x: ArrayView1<f64>, order: usize) -> Result<Array1<f64>> {
        match *self {
            Piece::Constant(c) => constant_integral(a, x, order, c),
            Piece::Linear { z, f_z, df_z } => linear_integral(a, x, order, z, f_z, df_z),
        }
    }
}

/// Broadcasts a pair of bound arrays to a common length.
///
/// A length-1 array is repeated to the length of the other one; otherwise the
/// lengths must agree.
pub fn broadcast_bounds(a: ArrayView1<f64>, x: ArrayView1<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
    let mismatch = SplineError::BoundsLengthMismatch {
        lower: a.len(),
        upper: x.len(),
    };
    if a.len() == x.len() {
        return Ok((a.to_owned(), x.to_owned()));
    }
    if a.len() == 1 {
        let a = a.broadcast(x.len()).ok_or(mismatch)?.to_owned();
        return Ok((a, x.to_owned()));
    }
    if x.len() == 1 {
        let x = x.broadcast(a.len()).ok_or(mismatch)?.to_owned();
        return Ok((a.to_owned(), x));
    }
    Err(mismatch)
}

/// `order`-fold integral of the constant `c` from `a` to `x`: `c (x - a)^order / order!`.
///
/// A zero constant yields exact zeros so that infinite bounds never produce `0 * inf`.
pub fn constant_integral(a: ArrayView1<f64>, x: ArrayView1<f64>, order: usize, c: f64) -> Result<Array1<f64>> {
    let (a, x) = broadcast_bounds(a, x)?;
    if c == 0.0 {
        return Ok(Array1::zeros(x.len()));
    }
    let scale = c / factorial(order);
    let power = order as i32;
    Ok(Zip::from(&a)
        .and(&x)
        .map_collect(|&a, &x| scale * (x - a).powi(power)))
}

/// `order`-fold integral from `a` to `x` of the line through `z` with value `f_z`
/// and slope `df_z`.
pub fn linear_integral(
    a: ArrayView1<f64>,
    x: ArrayView1<f64>,
    order: usize,
    z: f64,
    f_z: f64,
    df_z: f64,
) -> Result<Array1<f64>> {
    let (a, x) = broadcast_bounds(a, x)?;
    let f_a = linear_at(a.view(), z, f_z, df_z);
    let slope_scale = df_z / factorial(order + 1);
    let value_scale = 1.0 / factorial(order);
    let power = order as i32;
    Ok(Zip::from(&a)
        .and(&x)
        .and(&f_a)
        .map_collect(|&a, &x, &f_a| {
            let h = x - a;
            slope_scale * h.powi(power + 1) + value_scale * f_a * h.powi(power)
        }))
}

/// Integrates a piecewise function whose pieces are all crossed by every bound pair.
///
/// Peels off the first piece: the remainder is integrated from `knots[0]` to `x`
/// and the first piece's contribution is Taylor-shifted from `knots[0]` to `x`.
/// With more than one piece every `a` must lie strictly left of `knots[0]` and
/// every `x` strictly right of the last knot.
pub fn integrate_across_pieces(
    a: ArrayView1<f64>,
    x: ArrayView1<f64>,
    order: usize,
    pieces: &[Piece],
    knots: &[f64],
) -> Result<Array1<f64>> {
    if pieces.len() != knots.len() + 1 {
        return Err(SplineError::PieceCountMismatch {
            pieces: pieces.len(),
            knots: knots.len(),
        });
    }
    let (a, x) = broadcast_bounds(a, x)?;
    if pieces.len() == 1 {
        return pieces[0].integral(a.view(), x.view(), order);
    }

    let first = knots[0];
    let last = knots[knots.len() - 1];
    if a.iter().any(|&v| v >= first) || x.iter().any(|&v| v <= last) {
        return Err(SplineError::PiecesOutOfRange { first, last });
    }

    let b = Array1::from_elem(a.len(), first);
    let mut value = integrate_across_pieces(b.view(), x.view(), order, &pieces[1..], &knots[1..])?;
    for j in 0..order {
        let head = pieces[0].integral(a.view(), b.view(), order - j)?;
        let weight = factorial(j);
        let shift = x.mapv(|v| (v - first).powi(j as i32) / weight);
        value = value + head * shift;
    }
    Ok(value)
}

/// Integrates a piecewise function between arbitrary bounds `a <= x`.
///
/// Each bound pair is classified by the piece holding its lower and upper end
/// and every non-empty class is handed to [`integrate_across_pieces`] with
/// exactly the pieces it spans.
pub fn pieces_integral(
    a: ArrayView1<f64>,
    x: ArrayView1<f64>,
    order: usize,
    pieces: &[Piece],
    knots: &[f64],
) -> Result<Array1<f64>> {
    if pieces.len() != knots.len() + 1 {
        return Err(SplineError::PieceCountMismatch {
            pieces: pieces.len(),
            knots: knots.len(),
        });
    }
    let (a, x) = broadcast_bounds(a, x)?;
    for (index, (&lower, &upper)) in a.iter().zip(x.iter()).enumerate() {
        if lower > upper {
            return Err(SplineError::InvertedBounds { index, lower, upper });
        }
    }

    // Lower bounds sit in [knots[k-1], knots[k]), upper bounds in (knots[k-1], knots[k]].
    let mut buckets: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
    for (index, (&lower, &upper)) in a.iter().zip(x.iter()).enumerate() {
        let first = knots.partition_point(|&k| k <= lower);
        let last = knots.partition_point(|&k| k < upper);
        // a == x on a knot lands in an inverted bucket; its integral is zero.
        if first <= last {
            buckets.entry((first, last)).or_default().push(index);
        }
    }

    let mut result = Array1::zeros(a.len());
    for ((first, last), indices) in buckets {
        let a_part = a.select(Axis(0), &indices);
        let x_part = x.select(Axis(0), &indices);
        let part = integrate_across_pieces(
            a_part.view(),
            x_part.view(),
            order,
            &pieces[first..=last],
            &knots[first..last],
        )?;
        for (&target, &v) in indices.iter().zip(part.iter()) {
            result[target] = v;
        }
    }
    Ok(result)
}

/// Scalar form of [`pieces_integral`].
pub fn pieces_integral_at(a: f64, x: f64, order: usize, pieces: &[Piece], knots: &[f64]) -> Result<f64> {
    let lower = Array1::from_elem(1, a);
    let upper = Array1::from_elem(1, x);
    let value = pieces_integral(lower.view(), upper.view(), order, pieces, knots)?;
    Ok(value[0])
}

/// `order`-fold integral of the indicator function of `interval`.
pub fn indicator_integral(
    a: ArrayView1<f64>,
    x: ArrayView1<f64>,
    order: usize,
    interval: &Interval,
) -> Result<Array1<f64>> {
    pieces_integral(
        a,
        x,
        order,
        &[Piece::Constant(0.0), Piece::Constant(1.0), Piece::Constant(0.0)],
        &[interval.left, interval.right],
    )
}
