use approx::assert_abs_diff_eq;
use ndarray::{arr1, Array1};
use xspline::{BSpline, Extrapolation, SplineError};

const TOL: f64 = 1e-9;
const KNOTS: [f64; 5] = [-1.0, 0.0, 0.4, 2.0, 3.5];

fn interior_points() -> Array1<f64> {
    Array1::linspace(-0.99, 3.49, 57)
}

#[test]
fn partition_of_unity_for_every_degree() {
    let x = interior_points();
    for degree in 0..=5 {
        let spline = BSpline::new(&KNOTS, degree).unwrap();
        let design = spline.design_matrix(x.view(), Extrapolation::none()).unwrap();
        for (row, sum) in design.sum_axis(ndarray::Axis(1)).iter().enumerate() {
            assert_abs_diff_eq!(*sum, 1.0, epsilon = TOL);
            assert!(sum.is_finite(), "row {} degree {}", row, degree);
        }
    }
}

#[test]
fn partition_of_unity_continues_under_extrapolation() {
    let spline = BSpline::new(&KNOTS, 3).unwrap();
    let outside = arr1(&[-2.5, -1.2, 3.6, 5.0]);
    let design = spline.design_matrix(outside.view(), Extrapolation::both()).unwrap();
    for sum in design.sum_axis(ndarray::Axis(1)).iter() {
        assert_abs_diff_eq!(*sum, 1.0, epsilon = 1e-8);
    }
}

#[test]
fn compact_support_and_non_negativity() {
    let x = Array1::linspace(-3.0, 5.0, 161);
    for degree in 0..=4 {
        let spline = BSpline::new(&KNOTS, degree).unwrap();
        for index in 0..spline.num_spline_bases() {
            let support = spline.support(index, Extrapolation::none()).unwrap();
            let values = spline.basis_value(x.view(), index, Extrapolation::none()).unwrap();
            for (&point, &value) in x.iter().zip(values.iter()) {
                assert!(value >= -1e-15, "negative value {} at {} (basis {}, degree {})", value, point, index, degree);
                if point < support.left || point > support.right {
                    assert_eq!(value, 0.0, "basis {} degree {} non-zero at {}", index, degree, point);
                }
            }
        }
    }
}

#[test]
fn derivative_of_order_zero_is_the_value() {
    let spline = BSpline::new(&KNOTS, 3).unwrap();
    let x = interior_points();
    for index in 0..spline.num_spline_bases() {
        assert_eq!(
            spline.basis_derivative(x.view(), index, 0, Extrapolation::none()).unwrap(),
            spline.basis_value(x.view(), index, Extrapolation::none()).unwrap()
        );
    }
}

#[test]
fn derivative_above_degree_is_zero() {
    let spline = BSpline::new(&KNOTS, 2).unwrap();
    let x = interior_points();
    for index in 0..spline.num_spline_bases() {
        for order in 3..6 {
            let derivative = spline.basis_derivative(x.view(), index, order, Extrapolation::both()).unwrap();
            assert!(derivative.iter().all(|&v| v == 0.0));
        }
    }
}

#[test]
fn derivative_matches_finite_difference() {
    let spline = BSpline::new(&KNOTS, 3).unwrap();
    let h = 1e-6;
    // Points away from the knots, where every basis is smooth.
    let x = arr1(&[-0.5, 0.2, 1.1, 2.7, 3.3]);
    for index in 0..spline.num_spline_bases() {
        let derivative = spline.basis_derivative(x.view(), index, 1, Extrapolation::none()).unwrap();
        let ahead = spline.basis_value(x.mapv(|v| v + h).view(), index, Extrapolation::none()).unwrap();
        let behind = spline.basis_value(x.mapv(|v| v - h).view(), index, Extrapolation::none()).unwrap();
        for k in 0..x.len() {
            let numeric = (ahead[k] - behind[k]) / (2.0 * h);
            assert_abs_diff_eq!(derivative[k], numeric, epsilon = 1e-5);
        }
    }
}

#[test]
fn fundamental_theorem_of_calculus() {
    let spline = BSpline::new(&KNOTS, 2).unwrap();
    let h = 1e-6;
    let x = arr1(&[-0.5, 0.2, 1.1, 2.7, 3.3]);
    let a = arr1(&[-1.0]);
    for index in 0..spline.num_spline_bases() {
        let value = spline.basis_value(x.view(), index, Extrapolation::none()).unwrap();
        let ahead = spline
            .basis_integral(a.view(), x.mapv(|v| v + h).view(), index, 1, Extrapolation::none())
            .unwrap();
        let behind = spline
            .basis_integral(a.view(), x.mapv(|v| v - h).view(), index, 1, Extrapolation::none())
            .unwrap();
        for k in 0..x.len() {
            let numeric = (ahead[k] - behind[k]) / (2.0 * h);
            assert_abs_diff_eq!(value[k], numeric, epsilon = 1e-5);
        }
    }
}

#[test]
fn second_integral_differentiates_to_first() {
    let spline = BSpline::new(&KNOTS, 3).unwrap();
    let h = 1e-5;
    let x = arr1(&[0.2, 1.1, 2.7]);
    for index in 0..spline.num_spline_bases() {
        let first = spline.basis_integral(arr1(&[-1.0]).view(), x.view(), index, 1, Extrapolation::none()).unwrap();
        let ahead = spline
            .basis_integral(arr1(&[-1.0]).view(), x.mapv(|v| v + h).view(), index, 2, Extrapolation::none())
            .unwrap();
        let behind = spline
            .basis_integral(arr1(&[-1.0]).view(), x.mapv(|v| v - h).view(), index, 2, Extrapolation::none())
            .unwrap();
        for k in 0..x.len() {
            assert_abs_diff_eq!(first[k], (ahead[k] - behind[k]) / (2.0 * h), epsilon = 1e-6);
        }
    }
}

#[test]
fn integral_is_additive() {
    let spline = BSpline::new(&KNOTS, 3).unwrap();
    let a = arr1(&[-1.0, -0.5, 0.1, 1.0]);
    let c = arr1(&[0.0, 0.3, 0.4, 2.2]);
    let x = arr1(&[0.4, 2.5, 3.5, 3.0]);
    for index in 0..spline.num_spline_bases() {
        let left = spline.basis_integral(a.view(), c.view(), index, 1, Extrapolation::none()).unwrap();
        let right = spline.basis_integral(c.view(), x.view(), index, 1, Extrapolation::none()).unwrap();
        let whole = spline.basis_integral(a.view(), x.view(), index, 1, Extrapolation::none()).unwrap();
        for k in 0..a.len() {
            assert_abs_diff_eq!(left[k] + right[k], whole[k], epsilon = TOL);
        }
    }
}

#[test]
fn integrals_over_the_domain_sum_to_its_width() {
    let spline = BSpline::new(&KNOTS, 4).unwrap();
    let matrix = spline
        .integral_matrix(arr1(&[-1.0]).view(), arr1(&[3.5]).view(), 1, Extrapolation::none())
        .unwrap();
    assert_abs_diff_eq!(matrix.sum(), 4.5, epsilon = TOL);
}

#[test]
fn quadratic_value_at_midpoint() {
    let spline = BSpline::new(&[0.0, 1.0, 2.0, 3.0], 2).unwrap();
    assert_eq!(spline.num_spline_bases(), 5);
    // De Boor on the clamped knot vector [0, 0, 0, 1, 2, 3, 3, 3]: 0.75 at the centre.
    assert_abs_diff_eq!(spline.basis_value_at(1.5, 2, Extrapolation::none()).unwrap(), 0.75, epsilon = TOL);
}

#[test]
fn single_interval_constant_basis() {
    let spline = BSpline::new(&[0.0, 1.0], 0).unwrap();
    assert_eq!(spline.num_spline_bases(), 1);
    assert_eq!(spline.basis_value_at(0.5, 0, Extrapolation::none()).unwrap(), 1.0);
    // The only interval is also the last one, so its right end is included.
    assert_eq!(spline.basis_value_at(1.0, 0, Extrapolation::none()).unwrap(), 1.0);
    assert_eq!(spline.basis_value_at(1.0, 0, Extrapolation::right()).unwrap(), 1.0);
    assert_eq!(spline.basis_value_at(7.0, 0, Extrapolation::right()).unwrap(), 1.0);
    assert_eq!(spline.basis_value_at(7.0, 0, Extrapolation::none()).unwrap(), 0.0);
}

#[test]
fn interior_knot_values_ignore_extrapolation_flags() {
    let spline = BSpline::new(&[0.0, 1.0, 2.0, 3.0], 2).unwrap();
    let expected = [0.0, 0.5, 0.5, 0.0, 0.0];
    for ext in [Extrapolation::none(), Extrapolation::left(), Extrapolation::right(), Extrapolation::both()] {
        for (index, want) in expected.iter().enumerate() {
            assert_abs_diff_eq!(spline.basis_value_at(1.0, index, ext).unwrap(), *want, epsilon = TOL);
        }
    }
    let at_two = [0.0, 0.0, 0.5, 0.5, 0.0];
    for (index, want) in at_two.iter().enumerate() {
        assert_abs_diff_eq!(spline.basis_value_at(2.0, index, Extrapolation::both()).unwrap(), *want, epsilon = TOL);
    }
}

#[test]
fn construction_errors() {
    assert_eq!(BSpline::new(&[0.5], 2).unwrap_err(), SplineError::TooFewKnots { found: 1 });
    assert!(matches!(
        BSpline::new(&[0.0, f64::NAN], 1),
        Err(SplineError::NonFiniteKnot { index: 1, .. })
    ));
    // Unsorted input with repeats is accepted.
    let spline = BSpline::new(&[2.0, 0.0, 1.0, 2.0], 1).unwrap();
    assert_eq!(spline.knots().as_slice(), &[0.0, 1.0, 2.0]);
}

#[test]
fn spline_is_shareable_across_threads() {
    let spline = std::sync::Arc::new(BSpline::new(&KNOTS, 3).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let spline = std::sync::Arc::clone(&spline);
            std::thread::spawn(move || {
                let x = arr1(&[0.1 * t as f64 + 0.05]);
                spline.design_matrix(x.view(), Extrapolation::none()).unwrap().sum()
            })
        })
        .collect();
    for handle in handles {
        assert_abs_diff_eq!(handle.join().unwrap(), 1.0, epsilon = TOL);
    }
}

#[test]
fn extrapolated_integral_differentiates_to_value() {
    let spline = BSpline::new(&KNOTS, 3).unwrap();
    let ext = Extrapolation::both();
    let h = 1e-6;
    let a = arr1(&[-2.5]);
    let x = arr1(&[-2.0, -1.5, 0.2, 3.8, 4.5]);
    for index in 0..spline.num_spline_bases() {
        let value = spline.basis_value(x.view(), index, ext).unwrap();
        let ahead = spline.basis_integral(a.view(), x.mapv(|v| v + h).view(), index, 1, ext).unwrap();
        let behind = spline.basis_integral(a.view(), x.mapv(|v| v - h).view(), index, 1, ext).unwrap();
        for k in 0..x.len() {
            let numeric = (ahead[k] - behind[k]) / (2.0 * h);
            assert_abs_diff_eq!(value[k], numeric, epsilon = 1e-5);
        }
    }
}

#[test]
fn extrapolated_derivative_matches_finite_difference() {
    let spline = BSpline::new(&KNOTS, 3).unwrap();
    let ext = Extrapolation::both();
    let h = 1e-6;
    let x = arr1(&[-2.0, -1.5, 3.8, 4.5]);
    for index in 0..spline.num_spline_bases() {
        let first = spline.basis_derivative(x.view(), index, 1, ext).unwrap();
        let ahead = spline.basis_value(x.mapv(|v| v + h).view(), index, ext).unwrap();
        let behind = spline.basis_value(x.mapv(|v| v - h).view(), index, ext).unwrap();
        for k in 0..x.len() {
            assert_abs_diff_eq!(first[k], (ahead[k] - behind[k]) / (2.0 * h), epsilon = 1e-5);
        }

        let second = spline.basis_derivative(x.view(), index, 2, ext).unwrap();
        let ahead = spline.basis_derivative(x.mapv(|v| v + h).view(), index, 1, ext).unwrap();
        let behind = spline.basis_derivative(x.mapv(|v| v - h).view(), index, 1, ext).unwrap();
        for k in 0..x.len() {
            assert_abs_diff_eq!(second[k], (ahead[k] - behind[k]) / (2.0 * h), epsilon = 1e-4);
        }
    }
}

#[test]
fn left_extrapolated_quadratic_integral() {
    let spline = BSpline::new(&[0.0, 1.0, 2.0, 3.0], 2).unwrap();
    // Left of the domain basis 0 continues as (1 - x)^2.
    let integral = spline.basis_integral_at(-1.0, 0.0, 0, 1, Extrapolation::left()).unwrap();
    assert_abs_diff_eq!(integral, 7.0 / 3.0, epsilon = TOL);
    assert_eq!(spline.basis_integral_at(-1.0, 0.0, 0, 1, Extrapolation::none()).unwrap(), 0.0);
}
