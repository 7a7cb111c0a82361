//! Bounded one-dimensional maximization.

/// Points in the coarse scan that brackets the maximum.
const SCAN_POINTS: usize = 64;

/// Golden-section iterations are capped at this count.
const MAX_ITERATIONS: usize = 200;

const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// Maximum of `f` over `[a, b]`, returned as `(x, f(x))`.
///
/// A coarse scan locates the best grid cell, golden-section search refines
/// it until the bracket is narrower than `tol`, and the result is compared
/// against both endpoints. Non-finite values of `f` are ignored.
pub fn maximize<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, tol: f64) -> (f64, f64) {
    let (a, b) = if a <= b { (a, b) } else { (b, a) };
    let eval = |x: f64| {
        let y = f(x);
        if y.is_finite() {
            y
        } else {
            f64::NEG_INFINITY
        }
    };
    if b - a <= 0.0 {
        return (a, eval(a));
    }

    let step = (b - a) / SCAN_POINTS as f64;
    let mut best = (a, eval(a));
    let mut best_i = 0;
    for i in 1..=SCAN_POINTS {
        let x = if i == SCAN_POINTS { b } else { a + step * i as f64 };
        let y = eval(x);
        if y > best.1 {
            best = (x, y);
            best_i = i;
        }
    }

    let mut lo = a + step * best_i.saturating_sub(1) as f64;
    let mut hi = (a + step * (best_i + 1) as f64).min(b);
    let tol = tol.abs().max(f64::EPSILON * (b - a).abs());
    let mut x1 = hi - INV_PHI * (hi - lo);
    let mut x2 = lo + INV_PHI * (hi - lo);
    let mut f1 = eval(x1);
    let mut f2 = eval(x2);
    for _ in 0..MAX_ITERATIONS {
        if hi - lo <= tol {
            break;
        }
        if f1 < f2 {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + INV_PHI * (hi - lo);
            f2 = eval(x2);
        } else {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - INV_PHI * (hi - lo);
            f1 = eval(x1);
        }
    }
    let mid = 0.5 * (lo + hi);
    for candidate in [(mid, eval(mid)), (x1, f1), (x2, f2)] {
        if candidate.1 > best.1 {
            best = candidate;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_peak() {
        let (x, y) = maximize(|x| -(x - 0.37) * (x - 0.37) + 2.0, 0.0, 1.0, 1e-8);
        assert!((x - 0.37).abs() < 1e-4, "{x}");
        assert!((y - 2.0).abs() < 1e-8);
    }

    #[test]
    fn peak_at_endpoint() {
        let (x, y) = maximize(|x| x, 0.2, 0.9, 1e-6);
        assert_eq!(x, 0.9);
        assert_eq!(y, 0.9);
        let (x, _) = maximize(|x| -x, 0.2, 0.9, 1e-6);
        assert_eq!(x, 0.2);
    }

    #[test]
    fn narrow_peak_found_by_scan() {
        let f = |x: f64| (-((x - 0.8) / 0.01).powi(2)).exp();
        let (x, y) = maximize(f, 0.0, 1.0, 1e-9);
        assert!((x - 0.8).abs() < 1e-4);
        assert!(y > 0.999);
    }

    #[test]
    fn reversed_and_degenerate_intervals() {
        let (x, _) = maximize(|x| -(x - 0.5).abs(), 1.0, 0.0, 1e-8);
        assert!((x - 0.5).abs() < 1e-6);
        assert_eq!(maximize(|x| x * 2.0, 3.0, 3.0, 1e-8), (3.0, 6.0));
    }
}
