//! Small `[f64; 3]` arithmetic used throughout the block topology.
//!
//! Points and vectors are plain arrays; these helpers keep the call sites
//! readable without pulling in a linear-algebra crate.

/// A point or vector in 3-D space.
pub type Point3 = [f64; 3];

#[inline]
pub fn add(a: Point3, b: Point3) -> Point3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn sub(a: Point3, b: Point3) -> Point3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn scale(a: Point3, s: f64) -> Point3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub fn dot(a: Point3, b: Point3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: Point3, b: Point3) -> Point3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn norm(a: Point3) -> f64 {
    dot(a, a).sqrt()
}

#[inline]
pub fn distance(a: Point3, b: Point3) -> f64 {
    norm(sub(b, a))
}

/// Linear interpolation `a + t (b - a)`.
#[inline]
pub fn lerp(a: Point3, b: Point3, t: f64) -> Point3 {
    add(a, scale(sub(b, a), t))
}

/// Unit vector in the direction of `a`, or `None` for a (near) zero vector.
pub fn normalized(a: Point3) -> Option<Point3> {
    let n = norm(a);
    (n > f64::EPSILON).then(|| scale(a, 1.0 / n))
}

/// Arithmetic mean of two points.
#[inline]
pub fn midpoint(a: Point3, b: Point3) -> Point3 {
    scale(add(a, b), 0.5)
}

/// Polar angle of the horizontal part of `v`, in `[0, 2π)`.
pub fn horizontal_angle(v: Point3) -> f64 {
    let a = v[1].atan2(v[0]);
    if a < 0.0 { a + std::f64::consts::TAU } else { a }
}

/// Smallest absolute difference between two angles, in `[0, π]`.
pub fn angle_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(std::f64::consts::TAU);
    d.min(std::f64::consts::TAU - d)
}

/// Cumulative chord-length parameters of a polyline, normalized to `[0, 1]`.
///
/// A polyline of zero total length yields index-wise parameters instead.
pub fn chord_parameters(points: &[Point3]) -> Vec<f64> {
    let mut s = Vec::with_capacity(points.len());
    let mut acc = 0.0;
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            acc += distance(points[i - 1], *p);
        }
        s.push(acc);
    }
    let n = points.len();
    if acc <= f64::EPSILON {
        if n < 2 {
            return vec![0.0; n];
        }
        return (0..n).map(|i| i as f64 / (n - 1) as f64).collect();
    }
    s.iter_mut().for_each(|v| *v /= acc);
    s
}

/// `inner` evenly spaced points strictly between `a` and `b`, optionally with
/// the end points themselves.
pub fn linear_points(a: Point3, b: Point3, inner: usize, with_start: bool, with_end: bool) -> Vec<Point3> {
    let mut out = Vec::with_capacity(inner + 2);
    if with_start {
        out.push(a);
    }
    let jmax = (inner + 1) as f64;
    for j in 1..=inner {
        out.push(lerp(a, b, j as f64 / jmax));
    }
    if with_end {
        out.push(b);
    }
    out
}
