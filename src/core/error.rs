use thiserror::Error;

/// Errors raised by knot construction, basis evaluation and integration.
///
/// Every variant is a precondition violation detected before any work is done.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplineError {
    #[error("At least 2 distinct knots are required, but only {found} remained after deduplication.")]
    TooFewKnots { found: usize },

    #[error("Knot at position {index} is not finite ({value}).")]
    NonFiniteKnot { index: usize, value: f64 },

    #[error("Basis index {index} is out of range for degree {degree}: expected an index below {count}.")]
    InvalidIndex {
        index: usize,
        degree: usize,
        count: usize,
    },

    #[error("Integration bounds have incompatible lengths: lower has {lower}, upper has {upper}.")]
    BoundsLengthMismatch { lower: usize, upper: usize },

    #[error("Lower integration bound {lower} exceeds upper bound {upper} at position {index}.")]
    InvertedBounds { index: usize, lower: f64, upper: f64 },

    #[error("Piecewise function has {pieces} pieces but {knots} knots; expected knots + 1 pieces.")]
    PieceCountMismatch { pieces: usize, knots: usize },

    #[error("Integration bounds must lie strictly outside the inner knots [{first}, {last}] when integrating across pieces.")]
    PiecesOutOfRange { first: f64, last: f64 },

    #[error("Expected {expected} spline coefficients, got {found}.")]
    CoefficientLengthMismatch { expected: usize, found: usize },

    #[error("Difference matrix size must be at least 2, but was {0}.")]
    InvalidDifferenceSize(usize),
}

pub type Result<T> = std::result::Result<T, SplineError>;
