//! One-dimensional resampling along a strictly increasing time axis.
//!
//! Missing samples (NaN) never act as knots. Linear interpolation extrapolates
//! the first and last segments past the ends of the axis; nearest-neighbour
//! lookup does not, and yields NaN outside the knot span.

use ndarray::{Array1, ArrayView1};

fn valid_knots(x: ArrayView1<f64>, y: ArrayView1<f64>) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y.iter())
        .filter(|(t, v)| !t.is_nan() && !v.is_nan())
        .map(|(&t, &v)| (t, v))
        .unzip()
}

fn linear_at(xs: &[f64], ys: &[f64], target: f64) -> f64 {
    let n = xs.len();
    if n == 0 || target.is_nan() {
        return f64::NAN;
    }
    if n == 1 {
        return ys[0];
    }

    let upper = xs.partition_point(|&t| t < target);
    if upper < n && xs[upper] == target {
        return ys[upper];
    }
    let hi = upper.clamp(1, n - 1);
    let lo = hi - 1;
    let frac = (target - xs[lo]) / (xs[hi] - xs[lo]);
    ys[lo] + (ys[hi] - ys[lo]) * frac
}

fn nearest_at(xs: &[f64], ys: &[f64], target: f64) -> f64 {
    let n = xs.len();
    if n == 0 || target.is_nan() || target < xs[0] || target > xs[n - 1] {
        return f64::NAN;
    }

    let upper = xs.partition_point(|&t| t < target);
    if upper == 0 {
        return ys[0];
    }
    let lo = upper - 1;
    if target - xs[lo] <= xs[upper] - target {
        ys[lo]
    } else {
        ys[upper]
    }
}

/// Linearly interpolate `(x, y)` onto `targets`, extrapolating at both ends.
///
/// A series with a single valid sample is held constant; one with none
/// produces NaN everywhere.
pub fn linear(
    x: ArrayView1<f64>,
    y: ArrayView1<f64>,
    targets: ArrayView1<f64>,
) -> Array1<f64> {
    let (xs, ys) = valid_knots(x, y);
    targets.iter().map(|&t| linear_at(&xs, &ys, t)).collect()
}

/// Replace missing samples of `y` with values interpolated from its valid
/// neighbours along `x`. Valid samples are returned untouched.
pub fn fill_gaps(x: ArrayView1<f64>, y: ArrayView1<f64>) -> Array1<f64> {
    let (xs, ys) = valid_knots(x, y);
    x.iter()
        .zip(y.iter())
        .map(|(&t, &v)| if v.is_nan() { linear_at(&xs, &ys, t) } else { v })
        .collect()
}

/// Nearest-neighbour lookup of `(x, y)` at `targets`. Ties resolve to the
/// earlier knot.
pub fn nearest(
    x: ArrayView1<f64>,
    y: ArrayView1<f64>,
    targets: ArrayView1<f64>,
) -> Array1<f64> {
    let (xs, ys) = valid_knots(x, y);
    targets.iter().map(|&t| nearest_at(&xs, &ys, t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::aview1;

    #[test]
    fn linear_hits_knots_exactly_and_extrapolates() {
        let out = linear(
            aview1(&[0.0, 10.0, 20.0]),
            aview1(&[1.0, 3.0, 2.0]),
            aview1(&[-10.0, 0.0, 5.0, 20.0, 30.0]),
        );
        assert_eq!(out.to_vec(), vec![-1.0, 1.0, 2.0, 2.0, 1.0]);
    }

    #[test]
    fn linear_single_knot_is_constant() {
        let out = linear(aview1(&[0.0, 10.0]), aview1(&[f64::NAN, 4.0]), aview1(&[-5.0, 50.0]));
        assert_eq!(out.to_vec(), vec![4.0, 4.0]);
    }

    #[test]
    fn linear_without_knots_is_missing() {
        let out = linear(aview1(&[0.0, 10.0]), aview1(&[f64::NAN, f64::NAN]), aview1(&[5.0]));
        assert!(out[0].is_nan());
    }

    #[test]
    fn fill_gaps_covers_interior_and_edges() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [f64::NAN, 2.0, f64::NAN, 4.0, f64::NAN];
        let out = fill_gaps(aview1(&x), aview1(&y));
        assert_eq!(out.to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn nearest_is_missing_outside_span() {
        let out = nearest(
            aview1(&[10.0, 20.0]),
            aview1(&[100.0, 200.0]),
            aview1(&[5.0, 10.0, 14.0, 15.0, 16.0, 20.0, 25.0]),
        );
        assert!(out[0].is_nan());
        assert_eq!(out.slice(ndarray::s![1..6]).to_vec(), vec![100.0, 100.0, 100.0, 200.0, 200.0]);
        assert!(out[6].is_nan());
    }
}
