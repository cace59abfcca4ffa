//! Block grading along one horizontal axis.
//!
//! An axis of length `L` split into `n` blocks is described by an ordered
//! list of grading regions. Each region covers a contiguous run of blocks and
//! either keeps its blocks uniform or interpolates their widths between the
//! spacing of its left and right neighbors. The engine turns the regions into
//!
//! - the `n + 1` block boundary positions along the axis, and
//! - one cell-size ratio per block (last cell width over first cell width),
//!   used as the block's grading along that axis.
//!
//! The last region is always the remainder of the axis, so the regions
//! partition `[0, L)` and `[0, n)` exactly.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::algs::sweep::{Anchor, sweep_blend};
use crate::mesh_error::MeshError;

/// Absolute tolerance for width comparisons.
pub const GRADING_TOLERANCE: f64 = 1e-6;

/// Cell ratios beyond this factor are legal but usually a configuration slip.
const SUSPICIOUS_RATIO: f64 = 3.0;

/// Spacing rule inside a region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    #[default]
    Uniform,
    Interpolating,
}

/// A grading region as declared by the user.
///
/// `width` and `blocks` are required for every region but the last, whose
/// extent is whatever remains of the axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GradingRegionSpec {
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub blocks: Option<usize>,
    #[serde(default, rename = "type")]
    pub kind: RegionKind,
}

impl GradingRegionSpec {
    pub fn new(width: f64, blocks: usize, kind: RegionKind) -> Self {
        Self {
            width: Some(width),
            blocks: Some(blocks),
            kind,
        }
    }

    /// A final region taking whatever is left of the axis.
    pub fn remainder(kind: RegionKind) -> Self {
        Self {
            width: None,
            blocks: None,
            kind,
        }
    }
}

/// A normalized region with its exact position on the axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GradingRegion {
    pub start: f64,
    pub end: f64,
    pub width: f64,
    pub first_block: usize,
    pub last_block: usize,
    pub blocks: usize,
    pub kind: RegionKind,
}

impl GradingRegion {
    /// Uniform block width inside the region.
    pub fn uniform_delta(&self) -> f64 {
        self.width / self.blocks as f64
    }

    fn interpolates(&self) -> bool {
        self.kind == RegionKind::Interpolating && self.blocks > 1
    }
}

/// Result of grading one axis.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AxisGrading {
    pub axis: usize,
    pub length: f64,
    /// `n + 1` strictly increasing positions from `0` to `length`.
    pub boundaries: Vec<f64>,
    /// `n` block widths summing to `length`.
    pub widths: Vec<f64>,
    /// Per-block ratio of last to first cell width.
    pub cell_ratios: Vec<f64>,
}

impl AxisGrading {
    /// Uniform blocks, every ratio exactly one.
    pub fn uniform(axis: usize, length: f64, blocks: usize) -> Self {
        let delta = length / blocks as f64;
        let mut boundaries: Vec<f64> = (0..=blocks).map(|i| i as f64 * delta).collect();
        if let Some(last) = boundaries.last_mut() {
            *last = length;
        }
        Self {
            axis,
            length,
            boundaries,
            widths: vec![delta; blocks],
            cell_ratios: vec![1.0; blocks],
        }
    }

    pub fn block_count(&self) -> usize {
        self.widths.len()
    }
}

/// Grading of a single axis.
#[derive(Clone, Copy, Debug)]
pub struct GradingEngine {
    axis: usize,
    length: f64,
    blocks: usize,
    cells_per_block: usize,
}

impl GradingEngine {
    pub fn new(axis: usize, length: f64, blocks: usize, cells_per_block: usize) -> Result<Self, MeshError> {
        if !(length.is_finite() && length > 0.0) {
            return Err(MeshError::config(format!(
                "axis {axis}: length must be positive, got {length}"
            )));
        }
        if blocks == 0 || cells_per_block == 0 {
            return Err(MeshError::config(format!(
                "axis {axis}: block and cell counts must be positive"
            )));
        }
        Ok(Self {
            axis,
            length,
            blocks,
            cells_per_block,
        })
    }

    /// Computes boundaries and cell ratios for the declared regions.
    ///
    /// An empty region list yields uniform blocks with every ratio exactly one.
    pub fn run(&self, specs: &[GradingRegionSpec]) -> Result<AxisGrading, MeshError> {
        if specs.is_empty() {
            return Ok(AxisGrading::uniform(self.axis, self.length, self.blocks));
        }
        let regions = self.normalize_regions(specs)?;
        log::debug!(
            "axis {}: {} grading regions over {} blocks",
            self.axis,
            regions.len(),
            self.blocks
        );

        let mut positions = baseline_positions(&regions, self.blocks);
        interpolate_regions(&regions, &mut positions);
        let widths = self.rescale(&positions);
        let boundaries = self.boundaries_from(&widths)?;

        let cell_ratios = if regions.iter().any(GradingRegion::interpolates) {
            cell_size_ratios(&widths, self.cells_per_block)
        } else {
            vec![1.0; self.blocks]
        };
        if let Some(r) = cell_ratios
            .iter()
            .find(|&&r| r > SUSPICIOUS_RATIO || r < 1.0 / SUSPICIOUS_RATIO)
        {
            log::warn!("axis {}: extreme cell ratio {r:.3}", self.axis);
        }

        Ok(AxisGrading {
            axis: self.axis,
            length: self.length,
            boundaries,
            widths,
            cell_ratios,
        })
    }

    /// Resolves the declared regions into an exact partition of the axis.
    pub fn normalize_regions(&self, specs: &[GradingRegionSpec]) -> Result<Vec<GradingRegion>, MeshError> {
        let mut regions: Vec<GradingRegion> = Vec::with_capacity(specs.len());
        let mut width_tot = 0.0;
        let mut block_tot = 0usize;

        for (i, spec) in specs.iter().enumerate() {
            let is_last = i + 1 == specs.len();
            let (width, blocks) = if is_last {
                let width = self.length - width_tot;
                let blocks = self.blocks - block_tot;
                if let Some(w) = spec.width {
                    if (w - width).abs() > GRADING_TOLERANCE {
                        log::warn!(
                            "axis {}: last region declares width {w}, using remainder {width}",
                            self.axis
                        );
                    }
                }
                if let Some(b) = spec.blocks {
                    if b != blocks {
                        log::warn!(
                            "axis {}: last region declares {b} blocks, using remainder {blocks}",
                            self.axis
                        );
                    }
                }
                (width, blocks)
            } else {
                let width = spec.width.ok_or_else(|| {
                    MeshError::config(format!("axis {}: region {i} needs a width", self.axis))
                })?;
                let blocks = spec.blocks.ok_or_else(|| {
                    MeshError::config(format!("axis {}: region {i} needs a block count", self.axis))
                })?;
                if width < 0.0 {
                    return Err(MeshError::config(format!(
                        "axis {}: region {i} has negative width {width}",
                        self.axis
                    )));
                }
                width_tot += width;
                block_tot += blocks;
                if width_tot > self.length + GRADING_TOLERANCE {
                    return Err(MeshError::config(format!(
                        "axis {}: regions up to {i} span {width_tot}, axis length is {}",
                        self.axis, self.length
                    )));
                }
                if block_tot > self.blocks {
                    return Err(MeshError::config(format!(
                        "axis {}: regions up to {i} use {block_tot} blocks, axis has {}",
                        self.axis, self.blocks
                    )));
                }
                (width, blocks)
            };

            let has_width = width > GRADING_TOLERANCE;
            match (blocks, has_width) {
                (0, false) if is_last => {
                    log::debug!("axis {}: remainder region {i} is empty, skipped", self.axis);
                    if let Some(prev) = regions.last_mut() {
                        prev.end = self.length;
                        prev.width = prev.end - prev.start;
                    }
                    continue;
                }
                (0, false) => {
                    return Err(MeshError::config(format!(
                        "axis {}: region {i} is empty",
                        self.axis
                    )));
                }
                (0, true) | (_, false) => {
                    return Err(MeshError::DivideByZero {
                        region: i,
                        width,
                        blocks,
                    });
                }
                _ => {}
            }

            let start = regions.last().map_or(0.0, |r: &GradingRegion| r.end);
            let first_block = regions.last().map_or(0, |r: &GradingRegion| r.last_block + 1);
            regions.push(GradingRegion {
                start,
                end: if is_last { self.length } else { start + width },
                width,
                first_block,
                last_block: first_block + blocks - 1,
                blocks,
                kind: spec.kind,
            });
        }
        Ok(regions)
    }

    /// Normalized weights rescaled so the widths sum to the axis length.
    fn rescale(&self, positions: &[f64]) -> Vec<f64> {
        let weights: Vec<f64> = positions
            .iter()
            .enumerate()
            .map(|(i, &p1)| {
                let p0 = if i == 0 { 0.0 } else { positions[i - 1] };
                (p1 - p0) / self.length
            })
            .collect();
        let sum: f64 = weights.iter().sum();
        weights.iter().map(|w| self.length * w / sum).collect()
    }

    fn boundaries_from(&self, widths: &[f64]) -> Result<Vec<f64>, MeshError> {
        let mut boundaries = Vec::with_capacity(widths.len() + 1);
        boundaries.push(0.0);
        let mut acc = 0.0;
        for w in widths {
            acc += w;
            boundaries.push(acc);
        }
        if (acc - self.length).abs() > GRADING_TOLERANCE {
            return Err(MeshError::Grading {
                axis: self.axis,
                expected: self.length,
                actual: acc,
            });
        }
        if let Some(last) = boundaries.last_mut() {
            *last = self.length;
        }
        if let Some((index, (_, &b))) = boundaries
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (a, b))| b <= a)
        {
            return Err(MeshError::NonMonotonicGrading {
                axis: self.axis,
                index: index + 1,
                position: b,
            });
        }
        Ok(boundaries)
    }
}

/// End position of every block with uniform spacing inside each region.
fn baseline_positions(regions: &[GradingRegion], blocks: usize) -> Vec<f64> {
    let mut positions = vec![0.0; blocks];
    let mut current = 0;
    for region in regions {
        let delta = region.uniform_delta();
        let p0 = if current > 0 { positions[current - 1] } else { 0.0 };
        for i in 0..region.blocks {
            positions[current] = p0 + (i + 1) as f64 * delta;
            current += 1;
        }
    }
    positions
}

/// Re-spaces the interior boundaries of every interpolating region.
///
/// The left sweep starts from the spacing of the block before the region and
/// ramps linearly to the region's uniform spacing; the right sweep mirrors it
/// from the block after the region. The interior boundaries become the mean
/// of both; the region's own end points do not move.
fn interpolate_regions(regions: &[GradingRegion], positions: &mut [f64]) {
    let n = positions.len();
    for region in regions.iter().filter(|r| r.interpolates()) {
        let first = region.first_block;
        let delta_lin = region.uniform_delta();

        let goal_left = match first {
            0 => delta_lin,
            1 => positions[0],
            _ => positions[first - 1] - positions[first - 2],
        };
        let goal_right = if region.last_block + 1 < n {
            positions[region.last_block + 1] - positions[region.last_block]
        } else {
            delta_lin
        };

        let left = if first == 0 { 0.0 } else { positions[first - 1] };
        let baseline: Vec<f64> = (0..region.blocks - 1)
            .map(|i| positions[first] + i as f64 * delta_lin)
            .collect();
        let blended = sweep_blend(
            &baseline,
            Anchor::new(left, goal_left),
            Anchor::new(positions[region.last_block], goal_right),
        );
        positions[first..region.last_block].copy_from_slice(&blended);
    }
}

/// Per-block cell-size ratio from the widths of neighboring blocks.
///
/// Left to right the ratio is `cell[i] / cell[i - 1]`, right to left it is
/// `cell[i + 1] / cell[i]`; the block's ratio is the mean of both, with the
/// first and last block using `1` for their missing neighbor.
pub fn cell_size_ratios(widths: &[f64], cells_per_block: usize) -> Vec<f64> {
    let n = widths.len();
    if n == 0 {
        return Vec::new();
    }
    let cells = cells_per_block.max(1) as f64;
    let cell: Vec<f64> = widths.iter().map(|w| w / cells).collect();

    let mut from_left = vec![1.0; n];
    let mut last = cell[0];
    for i in 0..n {
        from_left[i] = cell[i] / last;
        last = cell[i];
    }

    let mut from_right = vec![1.0; n];
    let mut last = cell[n - 1];
    for i in (0..n).rev() {
        from_right[i] = last / cell[i];
        last = cell[i];
    }

    from_left
        .iter()
        .zip(&from_right)
        .map(|(l, r)| 0.5 * (l + r))
        .collect()
}

/// Relative size of block `i` when `n` blocks grow linearly from `1` to `g`.
pub fn linear_grading_factor(i: usize, n: usize, g: f64) -> f64 {
    if n <= 1 {
        return 1.0;
    }
    1.0 + (g - 1.0) * i as f64 / (n - 1) as f64
}

/// Sum of [`linear_grading_factor`] over all `n` blocks.
pub fn linear_grading_sum(n: usize, g: f64) -> f64 {
    (0..n).map(|i| linear_grading_factor(i, n, g)).sum()
}

/// Fraction of the total distance covered by the first `i` of `n` linearly
/// graded blocks.
pub fn linear_grading_fraction(i: usize, n: usize, g: f64) -> f64 {
    let sum = linear_grading_sum(n, g);
    if sum <= 0.0 {
        return 0.0;
    }
    (0..i.min(n)).map(|k| linear_grading_factor(k, n, g)).sum::<f64>() / sum
}

/// Fraction of the distance covered by the first `i` of `total` blocks, of
/// which `graded` blocks at the high end (or the low end) grow linearly by
/// factor `g` and the rest keep unit size.
pub fn grading_fraction(i: usize, total: usize, graded: usize, g: f64, at_high_end: bool) -> f64 {
    let graded = graded.min(total);
    let factor = |k: usize| {
        if at_high_end {
            let plain = total - graded;
            if k < plain { 1.0 } else { linear_grading_factor(k - plain, graded, g) }
        } else if k < graded {
            linear_grading_factor(graded - 1 - k, graded, g)
        } else {
            1.0
        }
    };
    let sum: f64 = (0..total).map(factor).sum();
    if sum <= 0.0 {
        return 0.0;
    }
    (0..i.min(total)).map(factor).sum::<f64>() / sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn baseline_is_piecewise_uniform() {
        let engine = GradingEngine::new(0, 150.0, 50, 4).unwrap();
        let regions = engine
            .normalize_regions(&[
                GradingRegionSpec::new(100.0, 40, RegionKind::Uniform),
                GradingRegionSpec::remainder(RegionKind::Uniform),
            ])
            .unwrap();
        let p = baseline_positions(&regions, 50);
        assert!(close(p[39], 100.0));
        assert!(close(p[49], 150.0));
        assert!(close(p[40] - p[39], 5.0));
    }

    #[test]
    fn interpolation_ramps_between_neighbors() {
        // 10 blocks of 1 | 10 interpolating over 30 | 10 blocks of 5
        let engine = GradingEngine::new(0, 90.0, 30, 1).unwrap();
        let g = engine
            .run(&[
                GradingRegionSpec::new(10.0, 10, RegionKind::Uniform),
                GradingRegionSpec::new(30.0, 10, RegionKind::Interpolating),
                GradingRegionSpec::remainder(RegionKind::Uniform),
            ])
            .unwrap();
        let w = &g.widths;
        // the interpolating region starts finer than its uniform 3.0 and ends coarser
        assert!(w[10] < 3.0 && w[19] > 3.0);
        let region_sum: f64 = w[10..20].iter().sum();
        assert!(close(region_sum, 30.0));
        assert!(close(*g.boundaries.last().unwrap(), 90.0));
    }

    #[test]
    fn ratios_of_a_step() {
        let r = cell_size_ratios(&[1.0, 1.0, 2.0, 2.0], 1);
        assert_eq!(r, vec![1.0, 1.5, 1.5, 1.0]);
    }

    #[test]
    fn linear_grading_helpers() {
        assert!(close(linear_grading_factor(0, 3, 3.0), 1.0));
        assert!(close(linear_grading_factor(2, 3, 3.0), 3.0));
        assert!(close(linear_grading_sum(3, 3.0), 6.0));
        assert!(close(linear_grading_fraction(1, 3, 3.0), 1.0 / 6.0));
        assert!(close(linear_grading_fraction(3, 3, 3.0), 1.0));
        assert!(close(grading_fraction(2, 4, 2, 3.0, true), 2.0 / 6.0));
        assert!(close(grading_fraction(2, 4, 2, 3.0, false), 4.0 / 6.0));
    }

    #[test]
    fn rejects_zero_block_region() {
        let engine = GradingEngine::new(0, 10.0, 5, 1).unwrap();
        let err = engine
            .run(&[
                GradingRegionSpec::new(4.0, 0, RegionKind::Uniform),
                GradingRegionSpec::remainder(RegionKind::Uniform),
            ])
            .unwrap_err();
        assert!(matches!(err, MeshError::DivideByZero { region: 0, .. }));
    }
}
