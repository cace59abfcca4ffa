//! Ground-height queries consumed by the block topology.
//!
//! Height generators (hills, polygons, STL surfaces) live outside this crate;
//! the mesher only needs to ask for the ground height below a horizontal
//! position.

/// A terrain surface giving the ground height at a horizontal position.
pub trait TerrainSurface {
    /// Ground height at `(x, y)`.
    fn height(&self, x: f64, y: f64) -> f64;

    /// True if the surface is known to be a horizontal plane.
    ///
    /// Flat surfaces skip ground splines entirely.
    fn is_flat(&self) -> bool {
        false
    }
}

/// A horizontal plane at constant height.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlatTerrain {
    pub height: f64,
}

impl FlatTerrain {
    pub fn new(height: f64) -> Self {
        Self { height }
    }
}

impl TerrainSurface for FlatTerrain {
    fn height(&self, _x: f64, _y: f64) -> f64 {
        self.height
    }

    fn is_flat(&self) -> bool {
        true
    }
}

impl<F> TerrainSurface for F
where
    F: Fn(f64, f64) -> f64,
{
    fn height(&self, x: f64, y: f64) -> f64 {
        self(x, y)
    }
}

/// Side pair `[lo, hi]` of one horizontal axis and the blend depth inside it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendBand {
    pub lo: f64,
    pub hi: f64,
    pub depth: f64,
}

impl BlendBand {
    /// Weights of the `lo` and `hi` corrections at coordinate `v`.
    fn weights(&self, v: f64) -> (f64, f64) {
        let ramp = |s: f64| if s < self.depth { 1.0 - s / self.depth } else { 0.0 };
        (ramp(v - self.lo), ramp(self.hi - v))
    }
}

/// Terrain made periodic across opposite domain sides.
///
/// Within `depth` of a paired side the height is pulled linearly towards the
/// mean of both sides' heights, so the sides carry identical profiles. The
/// x pair is blended first; the y pair blends the x-blended surface.
pub struct CyclicBlend<'a> {
    inner: &'a dyn TerrainSurface,
    x: Option<BlendBand>,
    y: Option<BlendBand>,
}

impl<'a> CyclicBlend<'a> {
    pub fn new(inner: &'a dyn TerrainSurface, x: Option<BlendBand>, y: Option<BlendBand>) -> Self {
        Self { inner, x, y }
    }

    fn blend_x(&self, x: f64, y: f64) -> f64 {
        let h = self.inner.height(x, y);
        let Some(band) = self.x else { return h };
        let (w_lo, w_hi) = band.weights(x);
        if w_lo == 0.0 && w_hi == 0.0 {
            return h;
        }
        let (h_lo, h_hi) = (self.inner.height(band.lo, y), self.inner.height(band.hi, y));
        let mean = 0.5 * (h_lo + h_hi);
        h + w_lo * (mean - h_lo) + w_hi * (mean - h_hi)
    }
}

impl TerrainSurface for CyclicBlend<'_> {
    fn height(&self, x: f64, y: f64) -> f64 {
        let h = self.blend_x(x, y);
        let Some(band) = self.y else { return h };
        let (w_lo, w_hi) = band.weights(y);
        if w_lo == 0.0 && w_hi == 0.0 {
            return h;
        }
        let (h_lo, h_hi) = (self.blend_x(x, band.lo), self.blend_x(x, band.hi));
        let mean = 0.5 * (h_lo + h_hi);
        h + w_lo * (mean - h_lo) + w_hi * (mean - h_hi)
    }

    fn is_flat(&self) -> bool {
        self.inner.is_flat()
    }
}
