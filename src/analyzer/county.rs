// County employment from the Local Area Unemployment series
use crate::analyzer::timeseries::{
    YearOrder, observations_for, sort_recent_first, windowed_growth, yearly_average,
};
use crate::model::{
    CountyEmployment, GrowthWindow, MonthlyPoint, Observation, Period, Series, SeriesRequest,
    SourceResult,
};

/// Monthly steps back for each window. "6mo" looks five readings back.
pub const COUNTY_WINDOWS: [(Period, usize); 4] = [
    (Period::SixMonths, 5),
    (Period::OneYear, 11),
    (Period::TwoYears, 23),
    (Period::FiveYears, 59),
];

const CHART_MONTHS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct LauSeriesIds {
    pub employed: String,
    pub unemployment_rate: String,
    pub labor_force: String,
}

impl LauSeriesIds {
    pub fn for_county(county_fips: &str) -> Self {
        Self {
            employed: employed_series_id(county_fips),
            unemployment_rate: format!("LAUCN{}0000000003", county_fips),
            labor_force: format!("LAUCN{}0000000006", county_fips),
        }
    }

    pub fn all(&self) -> Vec<String> {
        vec![
            self.employed.clone(),
            self.unemployment_rate.clone(),
            self.labor_force.clone(),
        ]
    }
}

pub fn employed_series_id(county_fips: &str) -> String {
    format!("LAUCN{}0000000005", county_fips)
}

pub fn lau_request(ids: &LauSeriesIds, current_year: i32) -> SeriesRequest {
    SeriesRequest {
        series_ids: ids.all(),
        start_year: current_year - 6,
        end_year: current_year,
        annual_average: false,
        calculations: true,
    }
}

fn monthly(series: &[Series], id: &str) -> Vec<Observation> {
    let mut obs: Vec<Observation> = observations_for(series, id)
        .into_iter()
        .filter(|o| !o.is_annual_average())
        .collect();
    sort_recent_first(&mut obs);
    obs
}

fn chart_point(obs: &Observation) -> MonthlyPoint {
    let month = obs
        .period_name
        .clone()
        .or_else(|| obs.period.clone())
        .unwrap_or_default();
    let short: String = month.chars().take(3).collect();
    let year = obs.year.to_string();
    let yy = year.get(year.len().saturating_sub(2)..).unwrap_or(&year);
    MonthlyPoint {
        year: obs.year,
        label: format!("{}-{}", short, yy),
        month,
        value: obs.value.round() as i64,
    }
}

/// Builds the county employment picture from an LAU batch.
pub fn county_employment(ids: &LauSeriesIds, series: &[Series]) -> SourceResult<CountyEmployment> {
    if series.is_empty() {
        return SourceResult::failure("No LAU data found for this location.");
    }

    let emp = monthly(series, &ids.employed);
    let unemp = monthly(series, &ids.unemployment_rate);
    let labor = monthly(series, &ids.labor_force);

    let Some(latest) = emp.first() else {
        return SourceResult::failure("No employment data available.");
    };

    let growth: GrowthWindow = COUNTY_WINDOWS
        .iter()
        .map(|(period, steps)| (*period, windowed_growth(&emp, *steps)))
        .collect();

    let mut monthly_employment_trends: Vec<MonthlyPoint> =
        emp.iter().take(CHART_MONTHS).map(chart_point).collect();
    monthly_employment_trends.reverse();

    SourceResult::Success(CountyEmployment {
        growth,
        total_jobs: latest.value.round() as i64,
        unemployment_rate: unemp.first().map(|o| o.value),
        labor_force: labor.first().map(|o| o.value.round() as i64),
        employment_trends: yearly_average(&emp, YearOrder::Descending),
        unemployment_rate_trends: yearly_average(&unemp, YearOrder::Descending),
        labor_force_trends: yearly_average(&labor, YearOrder::Descending),
        monthly_employment_trends,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(year: i32, m: u32, value: f64) -> Observation {
        let mut o = Observation::new(year, Some(&format!("M{:02}", m)), value);
        o.period_name = Some(
            ["January", "February", "March", "April", "May", "June", "July", "August",
             "September", "October", "November", "December"][(m - 1) as usize]
                .to_string(),
        );
        o
    }

    /// `n` monthly points ending Dec 2024, growing by `step` per month.
    fn ramp(n: usize, start: f64, step: f64) -> Vec<Observation> {
        (0..n)
            .map(|i| {
                let index = 2024 * 12 + 11 - (n - 1 - i) as i32;
                month(index / 12, (index % 12 + 1) as u32, start + step * i as f64)
            })
            .collect()
    }

    fn batch(ids: &LauSeriesIds, emp: Vec<Observation>) -> Vec<Series> {
        vec![
            Series { id: ids.employed.clone(), observations: emp },
            Series {
                id: ids.unemployment_rate.clone(),
                observations: vec![month(2024, 12, 3.5), month(2024, 11, 3.7)],
            },
            Series {
                id: ids.labor_force.clone(),
                observations: vec![month(2024, 12, 520_000.0)],
            },
        ]
    }

    #[test]
    fn builds_series_ids() {
        let ids = LauSeriesIds::for_county("06075");
        assert_eq!(ids.employed, "LAUCN060750000000005");
        assert_eq!(ids.unemployment_rate, "LAUCN060750000000003");
        assert_eq!(ids.labor_force, "LAUCN060750000000006");
        let req = lau_request(&ids, 2025);
        assert_eq!((req.start_year, req.end_year), (2019, 2025));
        assert!(!req.annual_average);
    }

    #[test]
    fn growth_windows_follow_history_length() {
        let ids = LauSeriesIds::for_county("06075");
        let emp = ramp(24, 1000.0, 10.0);
        let result = county_employment(&ids, &batch(&ids, emp)).into_success().unwrap();

        // latest = 1230; 5 back = 1180; 11 back = 1120; 23 back = 1000
        assert_eq!(result.growth.get(Period::SixMonths), Some(4.24));
        assert_eq!(result.growth.get(Period::OneYear), Some(9.82));
        assert_eq!(result.growth.get(Period::TwoYears), Some(23.0));
        assert!(result.growth.contains(Period::FiveYears));
        assert_eq!(result.growth.get(Period::FiveYears), None);
        assert_eq!(result.total_jobs, 1230);
        assert_eq!(result.unemployment_rate, Some(3.5));
        assert_eq!(result.labor_force, Some(520_000));
    }

    #[test]
    fn series_are_matched_by_id_not_position() {
        let ids = LauSeriesIds::for_county("06075");
        let mut series = batch(&ids, ramp(3, 100.0, 1.0));
        series.reverse();
        let result = county_employment(&ids, &series).into_success().unwrap();
        assert_eq!(result.total_jobs, 102);
        assert_eq!(result.labor_force, Some(520_000));
    }

    #[test]
    fn chart_points_are_ascending_and_labelled() {
        let ids = LauSeriesIds::for_county("06075");
        let result = county_employment(&ids, &batch(&ids, ramp(8, 100.0, 1.0)))
            .into_success()
            .unwrap();
        let labels: Vec<_> = result.monthly_employment_trends.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Jul-24", "Aug-24", "Sep-24", "Oct-24", "Nov-24", "Dec-24"]);
        assert_eq!(result.employment_trends[0].year, 2024);
    }

    #[test]
    fn annual_average_rows_are_ignored() {
        let ids = LauSeriesIds::for_county("06075");
        let mut emp = ramp(2, 100.0, 10.0);
        emp.push(Observation::new(2024, Some("M13"), 5.0));
        let result = county_employment(&ids, &batch(&ids, emp)).into_success().unwrap();
        assert_eq!(result.total_jobs, 110);
    }

    #[test]
    fn missing_companion_series_degrade_to_null() {
        let ids = LauSeriesIds::for_county("06075");
        let series = vec![Series { id: ids.employed.clone(), observations: ramp(2, 100.0, 1.0) }];
        let result = county_employment(&ids, &series).into_success().unwrap();
        assert_eq!(result.unemployment_rate, None);
        assert_eq!(result.labor_force, None);
    }

    #[test]
    fn empty_employment_is_a_failure() {
        let ids = LauSeriesIds::for_county("06075");
        let result = county_employment(&ids, &batch(&ids, Vec::new()));
        assert_eq!(result.failure_reason(), Some("No employment data available."));
        assert!(!county_employment(&ids, &[]).is_success());
    }
}
