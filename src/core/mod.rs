pub mod design;
pub mod error;
pub mod interval;
pub mod knots;
pub mod piecewise;
pub mod splines;
