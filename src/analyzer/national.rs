use crate::analyzer::timeseries::{observations_for, sort_recent_first, windowed_growth};
use crate::model::{GrowthWindow, NationalBaseline, Period, Series, SeriesRequest, SourceResult};

/// Civilian employment level, seasonally adjusted.
pub const NATIONAL_SERIES: &str = "LNS12000000";

pub const NATIONAL_WINDOWS: [(Period, usize); 3] = [
    (Period::OneYear, 11),
    (Period::TwoYears, 23),
    (Period::FiveYears, 59),
];

pub fn national_request(current_year: i32) -> SeriesRequest {
    SeriesRequest {
        series_ids: vec![NATIONAL_SERIES.to_string()],
        start_year: current_year - 6,
        end_year: current_year,
        annual_average: false,
        calculations: false,
    }
}

pub fn national_baseline(series: &[Series]) -> SourceResult<NationalBaseline> {
    let mut data: Vec<_> = observations_for(series, NATIONAL_SERIES)
        .into_iter()
        .filter(|o| !o.is_annual_average())
        .collect();
    if data.is_empty() {
        return SourceResult::failure("No national employment data");
    }
    sort_recent_first(&mut data);

    let national_growth: GrowthWindow = NATIONAL_WINDOWS
        .iter()
        .map(|(period, steps)| (*period, windowed_growth(&data, *steps)))
        .collect();
    SourceResult::Success(NationalBaseline { national_growth })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Observation;

    #[test]
    fn computes_one_year_baseline() {
        let observations = (0..12)
            .map(|m| Observation::new(2024, Some(&format!("M{:02}", m + 1)), 150_000.0 + m as f64 * 300.0))
            .collect();
        let series = vec![Series { id: NATIONAL_SERIES.into(), observations }];
        let baseline = national_baseline(&series).into_success().unwrap();
        // 153300 vs 150000
        assert_eq!(baseline.national_growth.get(Period::OneYear), Some(2.2));
        assert_eq!(baseline.national_growth.get(Period::TwoYears), None);
        assert!(!baseline.national_growth.contains(Period::SixMonths));
    }

    #[test]
    fn empty_series_fails() {
        let series = vec![Series { id: NATIONAL_SERIES.into(), observations: vec![] }];
        assert!(!national_baseline(&series).is_success());
        assert!(!national_baseline(&[]).is_success());
    }
}
