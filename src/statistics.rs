//! Summary statistics over the rendered chart values.

use crate::chart_data::{ChartDataset, SeriesData};

/// Count, mean, min and max of the numeric values in a series.
/// `mean`, `min` and `max` are `None` when no value is numeric.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SummaryStatistics {
    pub count: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl SummaryStatistics {
    /// Single pass over `values`, skipping NaN.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values.into_iter().filter(|v| !v.is_nan()) {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        if count == 0 {
            return Self::default();
        }
        Self {
            count,
            mean: Some(sum / count as f64),
            min: Some(min),
            max: Some(max),
        }
    }

    /// Statistics of a dataset; scatter points contribute their `y`.
    pub fn from_dataset(dataset: &ChartDataset) -> Self {
        match &dataset.data {
            SeriesData::Values(values) => Self::from_values(values.iter().copied()),
            SeriesData::Points(points) => Self::from_values(points.iter().map(|p| p.y)),
        }
    }
}

/// Three decimals, or a dash when absent.
pub fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.3}", v),
        None => "—".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_values() {
        let s = SummaryStatistics::from_values([2.0, 4.0, 6.0]);
        assert_eq!(s.count, 3);
        assert_eq!(s.mean, Some(4.0));
        assert_eq!(s.min, Some(2.0));
        assert_eq!(s.max, Some(6.0));
    }

    #[test]
    fn no_numeric_values() {
        let s = SummaryStatistics::from_values([f64::NAN, f64::NAN]);
        assert_eq!(s.count, 0);
        assert_eq!(s.mean, None);
        assert_eq!(s.min, None);
        assert_eq!(s.max, None);
        assert_eq!(SummaryStatistics::from_values(Vec::new()), s);
    }

    #[test]
    fn nan_is_skipped() {
        let s = SummaryStatistics::from_values([1.0, f64::NAN, 3.0]);
        assert_eq!(s.count, 2);
        assert_eq!(s.mean, Some(2.0));
    }

    #[test]
    fn format() {
        assert_eq!(format_stat(Some(4.0)), "4.000");
        assert_eq!(format_stat(Some(1.0 / 3.0)), "0.333");
        assert_eq!(format_stat(None), "—");
    }
}
