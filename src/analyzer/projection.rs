// Extends lagging annual small-geography data with county year-over-year growth
use crate::analyzer::timeseries::growth_pct;
use crate::model::{
    CountyEmployment, GranularEmployment, GrowthWindow, Period, SourceResult, TrendPoint, YearlyValue,
};
use crate::utils::round2;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const PROJECTION_NOTE: &str =
    "Recent years' data for this geography are projected based on county-level trends from BLS.";

const PROJECTED_WINDOWS: [Period; 3] = [Period::OneYear, Period::TwoYears, Period::FiveYears];

/// Growth ratio per year from consecutive available years. Years whose
/// previous value is zero get no ratio.
pub fn yearly_growth_ratios(trends: &[YearlyValue]) -> BTreeMap<i32, f64> {
    let by_year: BTreeMap<i32, f64> = trends.iter().map(|t| (t.year, t.value)).collect();
    by_year
        .iter()
        .zip(by_year.iter().skip(1))
        .filter(|((_, prev), _)| **prev != 0.0)
        .map(|((_, prev), (year, value))| (*year, (value - prev) / prev))
        .collect()
}

fn growth_by_year(trends: &[TrendPoint]) -> GrowthWindow {
    let Some(latest) = trends.first() else {
        return GrowthWindow::new();
    };
    let by_year: BTreeMap<i32, i64> = trends.iter().map(|t| (t.year, t.value)).collect();
    PROJECTED_WINDOWS
        .iter()
        .map(|period| {
            let back = period.years().unwrap_or(0);
            let growth = by_year
                .get(&(latest.year - back))
                .map(|past| growth_pct(latest.value as f64, *past as f64));
            (*period, growth)
        })
        .collect()
}

/// Projects `granular` forward to the county series' latest year.
///
/// Returns the input unchanged with no notes when either side is unusable or
/// the county series does not extend past the annual one.
pub fn project_granular(
    granular: SourceResult<GranularEmployment>,
    county: &SourceResult<CountyEmployment>,
) -> (SourceResult<GranularEmployment>, Vec<String>) {
    let (SourceResult::Success(data), Some(county)) = (&granular, county.as_success()) else {
        return (granular, Vec::new());
    };
    if data.trends.is_empty() || county.employment_trends.is_empty() {
        return (granular, Vec::new());
    }

    let emp_growth = yearly_growth_ratios(&county.employment_trends);
    let labor_growth = yearly_growth_ratios(&county.labor_force_trends);

    let Some(base) = data.trends.iter().max_by_key(|t| t.year) else {
        return (granular, Vec::new());
    };
    let county_latest = county
        .employment_trends
        .iter()
        .map(|t| t.year)
        .max()
        .unwrap_or(i32::MIN);
    if county_latest <= base.year {
        debug!(
            "No projection: county data ends {} and annual data ends {}",
            county_latest, base.year
        );
        return (granular, Vec::new());
    }

    let mut employed = base.value as f64;
    let mut labor = base.labor_force as f64;
    let mut projected = Vec::new();
    for year in base.year + 1..=county_latest {
        employed *= 1.0 + emp_growth.get(&year).copied().unwrap_or(0.0);
        labor *= 1.0 + labor_growth.get(&year).copied().unwrap_or(0.0);
        let unemp_rate = if labor > 0.0 {
            round2((labor - employed) / labor * 100.0)
        } else {
            0.0
        };
        projected.push(TrendPoint {
            year,
            value: employed.round() as i64,
            unemp_rate,
            labor_force: labor.round() as i64,
            projected: true,
        });
    }

    info!(
        "Projected {} year(s) of annual data from {} to {}",
        projected.len(),
        base.year,
        county_latest
    );

    let mut trends = data.trends.clone();
    trends.extend(projected);
    trends.sort_by(|a, b| b.year.cmp(&a.year));

    let latest = &trends[0];
    let updated = GranularEmployment {
        growth: growth_by_year(&trends),
        total_jobs: latest.value,
        unemployment_rate: latest.unemp_rate,
        labor_force: latest.labor_force,
        trends,
    };
    (SourceResult::Success(updated), vec![PROJECTION_NOTE.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(year: i32, value: i64, labor_force: i64) -> TrendPoint {
        TrendPoint {
            year,
            value,
            unemp_rate: 0.0,
            labor_force,
            projected: false,
        }
    }

    fn granular(trends: Vec<TrendPoint>) -> SourceResult<GranularEmployment> {
        let latest = trends[0].clone();
        SourceResult::Success(GranularEmployment {
            growth: GrowthWindow::new(),
            total_jobs: latest.value,
            unemployment_rate: latest.unemp_rate,
            labor_force: latest.labor_force,
            trends,
        })
    }

    fn county(emp: &[(i32, f64)], labor: &[(i32, f64)]) -> SourceResult<CountyEmployment> {
        let yv = |v: &[(i32, f64)]| {
            v.iter()
                .map(|(year, value)| YearlyValue { year: *year, value: *value })
                .collect::<Vec<_>>()
        };
        SourceResult::Success(CountyEmployment {
            growth: GrowthWindow::new(),
            total_jobs: 0,
            unemployment_rate: None,
            labor_force: None,
            employment_trends: yv(emp),
            unemployment_rate_trends: Vec::new(),
            labor_force_trends: yv(labor),
            monthly_employment_trends: Vec::new(),
        })
    }

    #[test]
    fn ratios_skip_zero_previous_years() {
        let trends = vec![
            YearlyValue { year: 2022, value: 0.0 },
            YearlyValue { year: 2021, value: 100.0 },
            YearlyValue { year: 2023, value: 50.0 },
        ];
        let ratios = yearly_growth_ratios(&trends);
        assert_eq!(ratios.get(&2022), Some(&-1.0));
        assert_eq!(ratios.get(&2023), None);
    }

    #[test]
    fn compounds_over_a_two_year_gap() {
        let input = granular(vec![point(2023, 1000, 1100), point(2022, 950, 1000)]);
        let county = county(
            &[(2023, 100.0), (2024, 105.0), (2025, 102.9)],
            &[(2023, 200.0), (2024, 200.0), (2025, 210.0)],
        );
        let (out, notes) = project_granular(input, &county);
        let out = out.into_success().unwrap();

        let projected: Vec<_> = out.trends.iter().filter(|t| t.projected).collect();
        assert_eq!(projected.len(), 2);
        assert_eq!(out.trends[0].year, 2025);
        assert_eq!(out.trends[0].value, 1029);
        assert_eq!(out.trends[1].value, 1050);
        assert_eq!(out.trends[1].labor_force, 1100);
        assert_eq!(out.trends[0].labor_force, 1155);
        // (1155 - 1029) / 1155
        assert_eq!(out.unemployment_rate, 10.91);
        assert_eq!(out.total_jobs, 1029);
        assert_eq!(notes, vec![PROJECTION_NOTE.to_string()]);
        assert_eq!(out.growth.get(Period::OneYear), Some(-2.0));
        assert_eq!(out.growth.get(Period::TwoYears), Some(2.9));
        assert_eq!(out.growth.get(Period::FiveYears), None);
    }

    #[test]
    fn unknown_years_carry_forward() {
        let input = granular(vec![point(2023, 500, 600)]);
        let county = county(&[(2023, 10.0), (2024, 0.0), (2025, 5.0)], &[]);
        let (out, _) = project_granular(input, &county);
        let out = out.into_success().unwrap();
        // 2024 ratio is -100%, 2025 has no ratio (previous value zero)
        assert_eq!(out.trends[0].value, 0);
        assert_eq!(out.trends[0].labor_force, 600);
        assert_eq!(out.trends[0].unemp_rate, 100.0);
    }

    #[test]
    fn no_op_when_county_does_not_extend() {
        let input = granular(vec![point(2023, 1000, 1100)]);
        let county = county(&[(2022, 1.0), (2023, 2.0)], &[]);
        let (out, notes) = project_granular(input.clone(), &county);
        assert_eq!(out, input);
        assert!(notes.is_empty());
    }

    #[test]
    fn no_op_on_failed_inputs() {
        let input = granular(vec![point(2023, 1000, 1100)]);
        let failed: SourceResult<CountyEmployment> = SourceResult::failure("down");
        let (out, notes) = project_granular(input.clone(), &failed);
        assert_eq!(out, input);
        assert!(notes.is_empty());

        let failed_granular: SourceResult<GranularEmployment> = SourceResult::failure("none");
        let county = county(&[(2023, 1.0), (2025, 2.0)], &[]);
        let (out, notes) = project_granular(failed_granular.clone(), &county);
        assert_eq!(out, failed_granular);
        assert!(notes.is_empty());
    }
}
