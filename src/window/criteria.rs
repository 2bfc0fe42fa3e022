// mafpipe: Composable filtering pipelines for multiple alignment blocks.
//
// Copyright 2025 Tommi Mäklin [tommi@maklin.fi].
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//
use crate::alphabet::is_gap;
use crate::alphabet::is_unknown;
use crate::window::track::MaskTrack;
use crate::window::track::QualityTrack;
use crate::window::track::Site;

/// Decides which windows of columns a [WindowFilter](super::WindowFilter) removes.
pub trait ColumnCriterion {
    /// Statistic for one column, computed over the sites of the focus
    /// species in it. None if the column carries no information.
    fn observe(&self, column: &[Site]) -> Option<f64>;

    /// True if the window with these column statistics is removed.
    fn window_fails(&self, stats: &[Option<f64>]) -> bool;
}

/// Counts gaps, and optionally unknown residues, in the focus species.
///
/// A window is removed when it contains more than `max_gap` of them in total.
#[derive(Clone, Debug)]
pub struct GapCriterion {
    pub max_gap: usize,
    pub count_unknown: bool,
}

impl ColumnCriterion for GapCriterion {
    fn observe(
        &self,
        column: &[Site],
    ) -> Option<f64> {
        let n = column.iter()
            .filter_map(|site| site.symbol())
            .filter(|x| is_gap(*x) || (self.count_unknown && is_unknown(*x)))
            .count();
        Some(n as f64)
    }

    fn window_fails(
        &self,
        stats: &[Option<f64>],
    ) -> bool {
        stats.iter().flatten().sum::<f64>() > self.max_gap as f64
    }
}

/// Counts masked residues in the focus species.
///
/// A window is removed when it contains more than `max_masked` of them in total.
#[derive(Clone, Debug)]
pub struct MaskCriterion<M: MaskTrack> {
    pub track: M,
    pub max_masked: usize,
}

impl<M: MaskTrack> ColumnCriterion for MaskCriterion<M> {
    fn observe(
        &self,
        column: &[Site],
    ) -> Option<f64> {
        let n = column.iter().filter(|site| self.track.is_masked(site)).count();
        Some(n as f64)
    }

    fn window_fails(
        &self,
        stats: &[Option<f64>],
    ) -> bool {
        stats.iter().flatten().sum::<f64>() > self.max_masked as f64
    }
}

/// How the qualities of the focus species are combined in one column.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QualityStatistic {
    #[default]
    Minimum,
    Mean,
}

impl std::str::FromStr for QualityStatistic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "min" => Ok(QualityStatistic::Minimum),
            "mean" => Ok(QualityStatistic::Mean),
            _ => Err(format!("'{}' is not a valid QualityStatistic", s)),
        }
    }
}

/// Combines the qualities of the focus species in each column.
///
/// A window is removed when the mean of its column statistics is below
/// `min_quality`. Columns without any quality value are not counted, and a
/// window without any is kept.
#[derive(Clone, Debug)]
pub struct QualityCriterion<Q: QualityTrack> {
    pub track: Q,
    pub min_quality: f64,
    pub statistic: QualityStatistic,
}

impl<Q: QualityTrack> ColumnCriterion for QualityCriterion<Q> {
    fn observe(
        &self,
        column: &[Site],
    ) -> Option<f64> {
        let values: Vec<f64> = column.iter()
            .filter_map(|site| self.track.quality(site))
            .map(|x| x as f64)
            .collect();
        if values.is_empty() {
            return None
        }
        match self.statistic {
            QualityStatistic::Minimum => values.iter().copied().reduce(f64::min),
            QualityStatistic::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
        }
    }

    fn window_fails(
        &self,
        stats: &[Option<f64>],
    ) -> bool {
        let values: Vec<f64> = stats.iter().flatten().copied().collect();
        if values.is_empty() {
            return false
        }
        values.iter().sum::<f64>() / (values.len() as f64) < self.min_quality
    }
}
