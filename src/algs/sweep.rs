//! Two-directional sweep blending.
//!
//! Given a sequence of interior values anchored by a left and a right end
//! value, the left sweep starts from the left anchor and continues its
//! incoming step, blending linearly toward a baseline; the right sweep does
//! the same from the right anchor. The result is the mean of both sweeps.
//! Block grading blends boundary positions this way along an axis; the
//! cylinder blends spoke distances the same way around the circle.

use crate::mesh_error::MeshError;

/// One end of a blended span: its value and the step that continues it
/// into the span.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub value: f64,
    pub step: f64,
}

impl Anchor {
    pub fn new(value: f64, step: f64) -> Self {
        Self { value, step }
    }
}

/// Blends the interior values `1..jmax` of a span of length `jmax`.
///
/// `baseline[k - 1]` is the baseline value at interior index `k`. The left
/// sweep is `l(k) = (k b(k) + (jmax - k)(l(k - 1) + left.step)) / jmax` with
/// `l(0) = left.value`; the right sweep mirrors it from `r(jmax) =
/// right.value`. Returns `(l(k) + r(k)) / 2` for every interior `k`.
pub fn sweep_blend(baseline: &[f64], left: Anchor, right: Anchor) -> Vec<f64> {
    let m = baseline.len();
    if m == 0 {
        return Vec::new();
    }
    let jmax = (m + 1) as f64;

    let mut from_left = vec![0.0; m];
    let mut prev = left.value;
    for k in 1..=m {
        let j = k as f64;
        let con = prev + left.step;
        from_left[k - 1] = (j * baseline[k - 1] + (jmax - j) * con) / jmax;
        prev = from_left[k - 1];
    }

    let mut from_right = vec![0.0; m];
    let mut next = right.value;
    for k in (1..=m).rev() {
        let j = k as f64;
        let con = next - right.step;
        from_right[k - 1] = ((jmax - j) * baseline[k - 1] + j * con) / jmax;
        next = from_right[k - 1];
    }

    from_left
        .iter()
        .zip(&from_right)
        .map(|(l, r)| 0.5 * (l + r))
        .collect()
}

/// Fills the unpinned entries of a cyclic sequence by sweep blending
/// between the surrounding pinned entries.
///
/// Each gap between two pinned entries is blended with a linear baseline
/// between them. A pinned entry's outgoing step is its difference to the
/// pinned neighbor on its far side, or zero if that neighbor is not pinned,
/// so a lone pinned value extends as a constant. Fails if nothing is pinned.
pub fn fill_cyclic(values: &[Option<f64>]) -> Result<Vec<f64>, MeshError> {
    let n = values.len();
    let pinned: Vec<usize> = (0..n).filter(|&i| values[i].is_some()).collect();
    if pinned.is_empty() {
        return Err(MeshError::topology(
            "no pinned value to propagate around the cycle",
        ));
    }
    let at = |i: usize| values[i % n];
    let mut out: Vec<f64> = values.iter().map(|v| v.unwrap_or(0.0)).collect();

    for (idx, &a) in pinned.iter().enumerate() {
        let b = if idx + 1 < pinned.len() { pinned[idx + 1] } else { pinned[0] + n };
        let gap = b - a - 1;
        if gap == 0 {
            continue;
        }
        let (Some(l), Some(r)) = (at(a), at(b)) else {
            continue;
        };
        let step_l = at(a + n - 1).map_or(0.0, |p| if (a + n - 1) % n == b % n { 0.0 } else { l - p });
        let step_r = at(b + 1).map_or(0.0, |q| if (b + 1) % n == a % n { 0.0 } else { q - r });
        let jmax = (gap + 1) as f64;
        let baseline: Vec<f64> = (1..=gap)
            .map(|k| ((jmax - k as f64) * l + k as f64 * r) / jmax)
            .collect();
        let blended = sweep_blend(&baseline, Anchor::new(l, step_l), Anchor::new(r, step_r));
        for (k, v) in blended.into_iter().enumerate() {
            out[(a + 1 + k) % n] = v;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_steps_keep_the_baseline() {
        let base = [2.0, 3.0, 4.0];
        let out = sweep_blend(&base, Anchor::new(1.0, 1.0), Anchor::new(5.0, 1.0));
        for (o, b) in out.iter().zip(base) {
            assert!((o - b).abs() < 1e-12);
        }
    }

    #[test]
    fn single_pin_extends_constant() {
        let out = fill_cyclic(&[None, Some(7.5), None, None]).unwrap();
        assert_eq!(out, vec![7.5; 4]);
    }

    #[test]
    fn two_pins_stay_between_their_values() {
        let out = fill_cyclic(&[Some(1.0), None, None, Some(4.0), None, None]).unwrap();
        assert_eq!(out[0], 1.0);
        assert_eq!(out[3], 4.0);
        for v in [out[1], out[2], out[4], out[5]] {
            assert!(v > 0.0 && v < 5.0, "{v}");
        }
    }

    #[test]
    fn nothing_pinned_is_an_error() {
        assert!(matches!(fill_cyclic(&[None, None]), Err(MeshError::Topology(_))));
    }
}
