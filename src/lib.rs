//! B-spline basis functions of arbitrary degree over a strictly increasing
//! knot sequence, with derivatives, repeated definite integrals and dense
//! design matrices.
//!
//! ```
//! use ndarray::array;
//! use xspline::{BSpline, Extrapolation};
//!
//! let spline = BSpline::new(&[0.0, 1.0, 2.0, 3.0], 2).unwrap();
//! let x = array![0.5, 1.5, 2.5];
//! let design = spline.design_matrix(x.view(), Extrapolation::none()).unwrap();
//! assert_eq!(design.dim(), (3, 5));
//! ```

pub mod core;

pub use crate::core::design::sequential_difference_matrix;
pub use crate::core::error::{Result, SplineError};
pub use crate::core::interval::Interval;
pub use crate::core::knots::Knots;
pub use crate::core::piecewise::Piece;
pub use crate::core::splines::{BSpline, Extrapolation};
