use statrs::distribution::{Continuous, Normal};
use tracing::debug;

use crate::common::float_utils::overlap;
use crate::market_data::{Bar, SubBarSample};
use super::structs::{AllocationModel, BucketGrid, ProfileContribution};

/// Four-parameter sinh-arcsinh density on the unit interval.
///
/// With `z = (u - location) / scale` the density is
/// `tail / scale * cosh(tail * asinh(z) - skew) / sqrt(1 + z^2) * phi(sinh(tail * asinh(z) - skew))`.
/// Positive `skew` pushes mass toward the upper end; `tail < 1` fattens the tails.
#[derive(Debug, Clone)]
pub struct SkewDensity {
    pub location: f64,
    pub scale: f64,
    pub skew: f64,
    pub tail: f64,
    standard: Normal,
}

impl SkewDensity {
    pub fn new(location: f64, scale: f64, skew: f64, tail: f64) -> Self {
        Self {
            location,
            scale: scale.max(f64::EPSILON),
            skew,
            tail: tail.max(f64::EPSILON),
            standard: Normal::standard(),
        }
    }

    pub fn pdf(&self, u: f64) -> f64 {
        let z = (u - self.location) / self.scale;
        let inner = self.tail * z.asinh() - self.skew;
        let value = self.tail / self.scale * inner.cosh() / (1.0 + z * z).sqrt() * self.standard.pdf(inner.sinh());
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }

    /// Midpoint-rule integral over `[a, b]` with `steps` sub-intervals
    pub fn integrate(&self, a: f64, b: f64, steps: usize) -> f64 {
        if b <= a {
            return 0.0;
        }
        let steps = steps.max(1);
        let h = (b - a) / steps as f64;
        (0..steps).map(|k| self.pdf(a + (k as f64 + 0.5) * h)).sum::<f64>() * h
    }
}

/// Shape parameters shared by every density the allocator builds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityShape {
    pub scale: f64,
    pub tail_weight: f64,
    pub skew_gain: f64,
}

/// Turns a bar (or its sub-bar samples) into per-bucket buy/sell volume on a grid.
#[derive(Debug, Clone)]
pub struct VolumeAllocator {
    model: AllocationModel,
    quadrature_steps: usize,
    shape: DensityShape,
}

impl VolumeAllocator {
    pub fn new(model: AllocationModel, quadrature_steps: usize, shape: DensityShape) -> Self {
        Self {
            model,
            quadrature_steps: quadrature_steps.max(1),
            shape,
        }
    }

    pub fn model(&self) -> AllocationModel {
        self.model
    }

    /// Allocate the bar's volume onto `grid`.
    ///
    /// Bars with sub-bar samples use each sample's own buy/sell volume and range; otherwise
    /// `buy_fraction` splits the bar volume. The grid is expected to cover the bar's range;
    /// prices outside it clamp to the edge buckets.
    pub fn allocate(&self, bar: &Bar, buy_fraction: f64, grid: &BucketGrid) -> ProfileContribution {
        let mut contribution = ProfileContribution::empty(*grid);

        if !bar.sub_bars.is_empty() {
            for sample in &bar.sub_bars {
                self.allocate_sample(sample, grid, &mut contribution);
            }
            return contribution;
        }

        if bar.volume <= 0.0 {
            return contribution;
        }

        let buy_fraction = buy_fraction.clamp(0.0, 1.0);
        let buy = bar.volume * buy_fraction;
        let sell = bar.volume - buy;

        let weights = if bar.is_degenerate() {
            debug!("Degenerate bar at {} allocated to a single bucket", bar.open_time);
            vec![(grid.index_of(bar.close), 1.0)]
        } else {
            match self.model {
                AllocationModel::Classic => vec![(grid.index_of(bar.close), 1.0)],
                AllocationModel::Pdf => {
                    let range = bar.range();
                    let body_center = ((bar.open + bar.close) / 2.0 - bar.low) / range;
                    let skew = self.shape.skew_gain * (bar.close - bar.open) / range;
                    let density = SkewDensity::new(body_center, self.shape.scale, skew, self.shape.tail_weight);
                    self.density_weights(&density, bar.low, bar.high, grid)
                }
            }
        };

        for (index, weight) in weights {
            contribution.add(index, buy * weight, sell * weight);
        }
        contribution
    }

    fn allocate_sample(&self, sample: &SubBarSample, grid: &BucketGrid, contribution: &mut ProfileContribution) {
        let volume = sample.volume();
        if volume <= 0.0 {
            return;
        }

        let weights = if sample.range_high <= sample.range_low {
            vec![(grid.index_of(sample.range_low), 1.0)]
        } else {
            match self.model {
                AllocationModel::Classic => uniform_weights(sample.range_low, sample.range_high, grid),
                AllocationModel::Pdf => {
                    let skew = self.shape.skew_gain * sample.delta() / volume;
                    let density = SkewDensity::new(0.5, self.shape.scale, skew, self.shape.tail_weight);
                    self.density_weights(&density, sample.range_low, sample.range_high, grid)
                }
            }
        };

        for (index, weight) in weights {
            contribution.add(index, sample.buy_volume * weight, sample.sell_volume * weight);
        }
    }

    /// Normalised density mass per spanned bucket; falls back to uniform if the density
    /// integrates to nothing over the range
    fn density_weights(&self, density: &SkewDensity, low: f64, high: f64, grid: &BucketGrid) -> Vec<(usize, f64)> {
        let range = high - low;
        let raw: Vec<(usize, f64)> = (grid.index_of(low)..=grid.index_of(high))
            .filter_map(|index| {
                let (b_low, b_high) = grid.bounds(index)?;
                let a = b_low.max(low);
                let b = b_high.min(high);
                if b <= a {
                    return None;
                }
                let mass = density.integrate((a - low) / range, (b - low) / range, self.quadrature_steps);
                Some((index, mass))
            })
            .collect();

        let total: f64 = raw.iter().map(|(_, mass)| mass).sum();
        if total <= 0.0 || !total.is_finite() {
            return uniform_weights(low, high, grid);
        }
        raw.into_iter().map(|(index, mass)| (index, mass / total)).collect()
    }
}

/// Weights proportional to how much of `[low, high]` each bucket covers
fn uniform_weights(low: f64, high: f64, grid: &BucketGrid) -> Vec<(usize, f64)> {
    let range = high - low;
    if range <= 0.0 || grid.is_degenerate() {
        return vec![(grid.index_of(low), 1.0)];
    }
    let weights: Vec<(usize, f64)> = (grid.index_of(low)..=grid.index_of(high))
        .filter_map(|index| {
            let (b_low, b_high) = grid.bounds(index)?;
            let width = overlap(low, high, b_low, b_high);
            (width > 0.0).then_some((index, width))
        })
        .collect();
    let covered: f64 = weights.iter().map(|(_, w)| w).sum();
    if covered <= 0.0 {
        return vec![(grid.index_of((low + high) / 2.0), 1.0)];
    }
    weights.into_iter().map(|(index, w)| (index, w / covered)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> DensityShape {
        DensityShape {
            scale: 0.25,
            tail_weight: 1.0,
            skew_gain: 1.5,
        }
    }

    fn grid() -> BucketGrid {
        BucketGrid::new(100.0, 110.0, 10)
    }

    #[test]
    fn test_density_integrates_to_about_one() {
        let density = SkewDensity::new(0.0, 1.0, 0.0, 1.0);
        let mass = density.integrate(-8.0, 8.0, 400);
        assert!((mass - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_positive_skew_moves_mass_up() {
        let symmetric = SkewDensity::new(0.5, 0.2, 0.0, 1.0);
        let skewed = SkewDensity::new(0.5, 0.2, 1.0, 1.0);
        let upper_symmetric = symmetric.integrate(0.5, 1.0, 50);
        let upper_skewed = skewed.integrate(0.5, 1.0, 50);
        assert!(upper_skewed > upper_symmetric);
    }

    #[test]
    fn test_classic_assigns_close_bucket() {
        let allocator = VolumeAllocator::new(AllocationModel::Classic, 20, shape());
        let bar = Bar::new(0, 101.0, 108.0, 100.5, 104.5, 1000.0);
        let contribution = allocator.allocate(&bar, 1.0, &grid());

        assert_eq!(contribution.buckets[4].buy, 1000.0);
        assert_eq!(contribution.total_volume(), 1000.0);
    }

    #[test]
    fn test_pdf_conserves_volume_and_spans_range() {
        let allocator = VolumeAllocator::new(AllocationModel::Pdf, 20, shape());
        let bar = Bar::new(0, 101.0, 108.0, 100.5, 107.0, 1000.0);
        let contribution = allocator.allocate(&bar, 0.6, &grid());

        assert!((contribution.total_volume() - 1000.0).abs() < 1e-9);
        assert!((contribution.delta() - 200.0).abs() < 1e-9);
        // Nothing outside the bar range
        assert_eq!(contribution.buckets[8].total(), 0.0);
        assert_eq!(contribution.buckets[9].total(), 0.0);
        assert!(contribution.buckets.iter().filter(|b| b.total() > 0.0).count() > 3);
    }

    #[test]
    fn test_degenerate_bar_goes_to_single_bucket() {
        for model in [AllocationModel::Classic, AllocationModel::Pdf] {
            let allocator = VolumeAllocator::new(model, 20, shape());
            let bar = Bar::new(0, 103.2, 103.2, 103.2, 103.2, 500.0);
            let contribution = allocator.allocate(&bar, 0.5, &grid());
            assert_eq!(contribution.buckets[3].total(), 500.0);
            assert_eq!(contribution.total_volume(), 500.0);
        }
    }

    #[test]
    fn test_zero_volume_bar_is_empty() {
        let allocator = VolumeAllocator::new(AllocationModel::Pdf, 20, shape());
        let bar = Bar::new(0, 101.0, 108.0, 100.5, 107.0, 0.0);
        assert!(allocator.allocate(&bar, 1.0, &grid()).is_empty());
    }

    #[test]
    fn test_sub_bars_use_their_own_split() {
        let allocator = VolumeAllocator::new(AllocationModel::Classic, 20, shape());
        let bar = Bar::new(0, 100.0, 110.0, 100.0, 105.0, 999.0).with_sub_bars(vec![
            SubBarSample::new(60.0, 40.0, 102.0, 100.0),
            SubBarSample::new(0.0, 50.0, 107.5, 107.5),
        ]);
        let contribution = allocator.allocate(&bar, 1.0, &grid());

        assert!((contribution.total_volume() - 150.0).abs() < 1e-9);
        assert!((contribution.buckets[0].buy - 30.0).abs() < 1e-9);
        assert!((contribution.buckets[1].sell - 20.0).abs() < 1e-9);
        assert_eq!(contribution.buckets[7].sell, 50.0);
    }

    #[test]
    fn test_pdf_sub_bars_conserve_volume() {
        let allocator = VolumeAllocator::new(AllocationModel::Pdf, 8, shape());
        let bar = Bar::new(0, 100.0, 110.0, 100.0, 105.0, 0.0).with_sub_bars(vec![
            SubBarSample::new(80.0, 20.0, 106.0, 101.0),
        ]);
        let contribution = allocator.allocate(&bar, 0.0, &grid());
        assert!((contribution.total_volume() - 100.0).abs() < 1e-9);
        assert!((contribution.delta() - 60.0).abs() < 1e-9);
    }
}
