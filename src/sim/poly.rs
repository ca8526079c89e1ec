//! Real-root extraction for collision-time polynomials
//!
//! Contact times are roots of low-degree polynomials in `t`. Degrees up to two
//! use the closed form; cubics and quartics are isolated between the roots of
//! their derivative and refined by bisection, which keeps every root bracketed
//! and the result deterministic.

use crate::Duration;
use crate::consts::MAX_BISECTION_STEPS;

/// Highest supported polynomial degree
pub const MAX_DEGREE: usize = 4;

/// Real roots of a polynomial, sorted ascending
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Roots {
    values: [f64; MAX_DEGREE],
    count: usize,
}

impl Roots {
    fn empty() -> Self {
        Self {
            values: [0.0; MAX_DEGREE],
            count: 0,
        }
    }

    fn push(&mut self, root: f64) {
        // Double roots at a critical point are reported once
        if self.count > 0 && self.values[self.count - 1] == root {
            return;
        }
        if self.count < MAX_DEGREE {
            self.values[self.count] = root;
            self.count += 1;
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values[..self.count]
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Evaluate a polynomial (highest degree first) with Horner's rule
#[inline]
pub fn eval(coeffs: &[f64], t: f64) -> f64 {
    coeffs.iter().fold(0.0, |acc, &c| acc * t + c)
}

/// Evaluate the derivative of a polynomial (highest degree first)
pub fn eval_derivative(coeffs: &[f64], t: f64) -> f64 {
    let degree = coeffs.len().saturating_sub(1);
    coeffs[..degree]
        .iter()
        .enumerate()
        .fold(0.0, |acc, (i, &c)| acc * t + c * (degree - i) as f64)
}

/// All real roots of a polynomial of degree at most four
///
/// Coefficients are ordered from the highest degree down. Leading zeros lower
/// the degree; constant (and all-zero) polynomials have no roots.
pub fn real_roots(coeffs: &[f64]) -> Roots {
    let start = coeffs.iter().position(|&c| c != 0.0).unwrap_or(coeffs.len());
    let coeffs = &coeffs[start..];

    let mut roots = Roots::empty();
    if coeffs.len() < 2 || coeffs.iter().any(|c| !c.is_finite()) {
        return roots;
    }
    if coeffs.len() > MAX_DEGREE + 1 {
        log::warn!("real_roots: degree {} not supported", coeffs.len() - 1);
        return roots;
    }

    match coeffs.len() - 1 {
        1 => roots.push(-coeffs[1] / coeffs[0]),
        2 => quadratic_roots(coeffs[0], coeffs[1], coeffs[2], &mut roots),
        _ => isolate_roots(coeffs, &mut roots),
    }
    roots
}

/// Numerically stable closed form for `a t^2 + b t + c` with `a != 0`
fn quadratic_roots(a: f64, b: f64, c: f64, roots: &mut Roots) {
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return;
    }
    let q = -0.5 * (b + b.signum() * disc.sqrt());
    if q == 0.0 {
        // b == 0 and disc == 0, so c == 0: double root at the origin
        roots.push(0.0);
        return;
    }
    let (r1, r2) = (q / a, c / q);
    roots.push(r1.min(r2));
    roots.push(r1.max(r2));
}

/// Bracket roots between consecutive critical points and bisect each bracket
fn isolate_roots(coeffs: &[f64], roots: &mut Roots) {
    let degree = coeffs.len() - 1;
    let mut derivative = [0.0; MAX_DEGREE];
    for (i, &c) in coeffs[..degree].iter().enumerate() {
        derivative[i] = c * (degree - i) as f64;
    }
    let critical = real_roots(&derivative[..degree]);

    // Cauchy bound: every real root lies strictly inside (-bound, bound)
    let lead = coeffs[0];
    let bound = 1.0
        + coeffs[1..]
            .iter()
            .map(|c| (c / lead).abs())
            .fold(0.0, f64::max);

    let mut lo = -bound;
    let mut f_lo = eval(coeffs, lo);
    let stops = critical
        .as_slice()
        .iter()
        .copied()
        .filter(|&x| x > -bound && x < bound)
        .chain(std::iter::once(bound));

    for hi in stops {
        let f_hi = eval(coeffs, hi);
        if f_hi == 0.0 {
            roots.push(hi);
        } else if f_lo != 0.0 && (f_lo < 0.0) != (f_hi < 0.0) {
            roots.push(bisect(coeffs, lo, hi, f_lo));
        }
        lo = hi;
        f_lo = f_hi;
    }
}

fn bisect(coeffs: &[f64], mut lo: f64, mut hi: f64, mut f_lo: f64) -> f64 {
    for _ in 0..MAX_BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        let f_mid = eval(coeffs, mid);
        if f_mid == 0.0 {
            return mid;
        }
        if (f_mid < 0.0) == (f_lo < 0.0) {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Earliest physically valid root of a contact polynomial
///
/// Roots at or before zero are discarded (no collisions backwards in time).
/// With `only_inward`, roots where the polynomial is not decreasing are
/// discarded too: the bodies are separating there, not making contact.
pub fn earliest_contact(coeffs: &[f64], only_inward: bool) -> Option<Duration> {
    real_roots(coeffs)
        .as_slice()
        .iter()
        .copied()
        .filter(|&t| t > 0.0)
        .find(|&t| !only_inward || eval_derivative(coeffs, t) < 0.0)
}

/// Smallest valid root of `a t^2 + b t + c`
pub fn solve_quadratic(a: f64, b: f64, c: f64, only_inward: bool) -> Option<Duration> {
    earliest_contact(&[a, b, c], only_inward)
}

/// Smallest valid root of `a t^4 + b t^3 + c t^2 + d t + e`
pub fn solve_quartic(a: f64, b: f64, c: f64, d: f64, e: f64, only_inward: bool) -> Option<Duration> {
    earliest_contact(&[a, b, c, d, e], only_inward)
}
