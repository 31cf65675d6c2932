// Sector growth and wages from the Quarterly Census of Employment and Wages
use crate::analyzer::timeseries::{
    YearOrder, annual_levels, observations_for, sort_recent_first, windowed_growth_values,
};
use crate::model::{
    GrowthWindow, Observation, Period, Sector, SectorReport, Series, SeriesRequest, SourceResult, WageData,
};
use std::cmp::Ordering;

/// NAICS supersectors tracked for private employment.
pub const MAJOR_SECTORS: [(&str, &str); 13] = [
    ("23", "Construction"),
    ("31", "Manufacturing"),
    ("42", "Wholesale Trade"),
    ("44", "Retail Trade"),
    ("48", "Transportation and Warehousing"),
    ("51", "Information"),
    ("52", "Finance and Insurance"),
    ("53", "Real Estate and Rental"),
    ("54", "Professional and Technical Services"),
    ("56", "Admin and Support Services"),
    ("61", "Educational Services"),
    ("62", "Health Care and Social Assistance"),
    ("72", "Accommodation and Food Services"),
];

pub const TOP_SECTORS: usize = 3;

pub const WAGE_WINDOWS: [(Period, usize); 3] = [
    (Period::OneYear, 1),
    (Period::ThreeYears, 3),
    (Period::FiveYears, 5),
];

const WEEKS_PER_YEAR: f64 = 52.0;

pub fn sector_series_id(county_fips: &str, naics: &str) -> String {
    format!("ENU{}105{}", county_fips, naics)
}

pub fn wage_series_id(county_fips: &str) -> String {
    format!("ENU{}11510", county_fips)
}

/// Industry code embedded after the 11-character series prefix.
fn industry_code(series_id: &str) -> &str {
    series_id.get(11..).unwrap_or("")
}

fn industry_name(code: &str) -> String {
    MAJOR_SECTORS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("Industry {}", code))
}

/// QCEW lags about six months, so the last full year is the safest end.
pub fn qcew_request(county_fips: &str, current_year: i32) -> SeriesRequest {
    let mut series_ids: Vec<String> = MAJOR_SECTORS
        .iter()
        .map(|(naics, _)| sector_series_id(county_fips, naics))
        .collect();
    series_ids.push(wage_series_id(county_fips));
    SeriesRequest {
        series_ids,
        start_year: current_year - 6,
        end_year: current_year - 1,
        annual_average: true,
        calculations: true,
    }
}

/// Quarterly readings without the annual-average rows.
fn quarterly(observations: &[Observation]) -> Vec<Observation> {
    observations
        .iter()
        .filter(|o| !o.is_annual_average())
        .cloned()
        .collect()
}

fn top_sectors(county_fips: &str, series: &[Series]) -> Vec<Sector> {
    let wage_id = wage_series_id(county_fips);
    let mut sectors: Vec<Sector> = series
        .iter()
        .filter(|s| s.id != wage_id && !s.observations.is_empty())
        .filter_map(|s| {
            let mut obs = quarterly(&s.observations);
            sort_recent_first(&mut obs);
            let growth = obs.first()?.yoy_pct?;
            Some(Sector {
                name: industry_name(industry_code(&s.id)),
                growth,
            })
        })
        .collect();

    sectors.sort_by(|a, b| b.growth.partial_cmp(&a.growth).unwrap_or(Ordering::Equal));
    sectors.truncate(TOP_SECTORS);
    sectors
}

fn wage_data(county_fips: &str, series: &[Series]) -> SourceResult<WageData> {
    let wages = observations_for(series, &wage_series_id(county_fips));
    let mut recent = quarterly(&wages);
    sort_recent_first(&mut recent);
    let Some(latest) = recent.first() else {
        return SourceResult::failure("No wage data available");
    };

    let yearly: Vec<f64> = annual_levels(&wages, YearOrder::Descending)
        .into_iter()
        .map(|y| y.value)
        .collect();
    let wage_growth: GrowthWindow = WAGE_WINDOWS
        .iter()
        .map(|(period, steps)| (*period, windowed_growth_values(&yearly, *steps)))
        .collect();

    SourceResult::Success(WageData {
        current_avg_weekly_wage: latest.value,
        annual_equivalent: (latest.value * WEEKS_PER_YEAR).round(),
        wage_growth,
    })
}

/// Top growing sectors plus wage levels and growth for a county.
pub fn sector_report(county_fips: &str, series: &[Series]) -> SourceResult<SectorReport> {
    SourceResult::Success(SectorReport {
        top_sectors_growing: top_sectors(county_fips, series),
        wage_data: wage_data(county_fips, series),
    })
}
