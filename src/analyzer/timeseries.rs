use crate::model::{INFINITE_GROWTH, Observation, Series, YearlyValue};
use crate::utils::round2;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearOrder {
    Ascending,
    Descending,
}

/// Observations of the series with the given ID, or an empty list.
pub fn observations_for(series: &[Series], id: &str) -> Vec<Observation> {
    series
        .iter()
        .find(|s| s.id == id)
        .map(|s| s.observations.clone())
        .unwrap_or_default()
}

/// Sorts by `(year, period)`, most recent first.
pub fn sort_recent_first(series: &mut [Observation]) {
    series.sort_by(|a, b| (b.year, &b.period).cmp(&(a.year, &a.period)));
}

/// Percent change from `past` to `latest`, rounded to 2 decimals.
///
/// A zero `past` yields [`INFINITE_GROWTH`] when `latest` is positive and `0`
/// otherwise.
pub fn growth_pct(latest: f64, past: f64) -> f64 {
    if past == 0.0 {
        return if latest > 0.0 { INFINITE_GROWTH } else { 0.0 };
    }
    round2((latest - past) / past * 100.0)
}

/// Growth between the first value and the value `steps_back` positions later.
/// `values` must be ordered most recent first.
pub fn windowed_growth_values(values: &[f64], steps_back: usize) -> Option<f64> {
    if values.len() < steps_back + 1 {
        return None;
    }
    Some(growth_pct(values[0], values[steps_back]))
}

/// [`windowed_growth_values`] over observations sorted most recent first.
pub fn windowed_growth(series: &[Observation], steps_back: usize) -> Option<f64> {
    let values: Vec<f64> = series.iter().map(|o| o.value).collect();
    windowed_growth_values(&values, steps_back)
}

/// Averages observations per year.
pub fn yearly_average(series: &[Observation], order: YearOrder) -> Vec<YearlyValue> {
    let mut by_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for obs in series {
        if !obs.value.is_finite() {
            continue;
        }
        let entry = by_year.entry(obs.year).or_insert((0.0, 0));
        entry.0 += obs.value;
        entry.1 += 1;
    }

    let mut yearly: Vec<YearlyValue> = by_year
        .into_iter()
        .map(|(year, (sum, count))| YearlyValue {
            year,
            value: sum / count as f64,
        })
        .collect();

    if order == YearOrder::Descending {
        yearly.reverse();
    }
    yearly
}

/// Level per year: the provider's annual-average row when published,
/// otherwise the mean of that year's periodic readings.
pub fn annual_levels(series: &[Observation], order: YearOrder) -> Vec<YearlyValue> {
    let (annual, periodic): (Vec<&Observation>, Vec<&Observation>) =
        series.iter().partition(|o| o.is_annual_average());
    let periodic: Vec<Observation> = periodic.into_iter().cloned().collect();

    let mut levels: BTreeMap<i32, f64> = yearly_average(&periodic, YearOrder::Ascending)
        .into_iter()
        .map(|y| (y.year, y.value))
        .collect();
    for obs in annual {
        levels.insert(obs.year, obs.value);
    }

    let mut yearly: Vec<YearlyValue> = levels
        .into_iter()
        .map(|(year, value)| YearlyValue { year, value })
        .collect();
    if order == YearOrder::Descending {
        yearly.reverse();
    }
    yearly
}
