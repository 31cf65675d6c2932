// Small-geography (tract / zip / county) figures from the American Community Survey
use crate::analyzer::timeseries::windowed_growth_values;
use crate::model::{
    CensusGeography, CensusTable, Demographics, EducationData, FipsLocation, GeoType,
    GranularEmployment, GrowthWindow, IncomeData, LaborParticipation, Period, Rating, SourceResult,
    TrendPoint,
};
use crate::utils::round2;

pub const EMPLOYED: &str = "B23025_004E";
pub const UNEMPLOYED: &str = "B23025_005E";
pub const CIVILIAN_LABOR_FORCE: &str = "B23025_003E";

pub const MEDIAN_HOUSEHOLD_INCOME: &str = "B19013_001E";
pub const POPULATION_16_PLUS: &str = "B23025_001E";
pub const LABOR_FORCE: &str = "B23025_002E";
pub const POPULATION_25_PLUS: &str = "B15003_001E";
pub const COLLEGE_DEGREES: [&str; 4] = ["B15003_022E", "B15003_023E", "B15003_024E", "B15003_025E"];

/// Vintages fetched before the latest one; six vintages cover a 5y window.
pub const VINTAGE_SPAN: i32 = 5;

pub const GRANULAR_WINDOWS: [(Period, usize); 3] = [
    (Period::OneYear, 1),
    (Period::TwoYears, 2),
    (Period::FiveYears, 5),
];

pub fn employment_variables() -> Vec<&'static str> {
    vec![EMPLOYED, UNEMPLOYED, CIVILIAN_LABOR_FORCE]
}

pub fn demographic_variables() -> Vec<&'static str> {
    let mut vars = vec![
        MEDIAN_HOUSEHOLD_INCOME,
        POPULATION_16_PLUS,
        LABOR_FORCE,
        POPULATION_25_PLUS,
    ];
    vars.extend(COLLEGE_DEGREES);
    vars
}

pub fn vintages(latest_year: i32) -> Vec<i32> {
    (latest_year - VINTAGE_SPAN..=latest_year).collect()
}

/// Resolves the census `for`/`in` clauses for the requested geography.
pub fn census_geography(location: &FipsLocation, geo_type: GeoType) -> Result<CensusGeography, String> {
    let state = &location.state_fips;
    let county = location.county_code();
    match geo_type {
        GeoType::Tract => {
            let tract = location
                .tract_suffix()
                .ok_or_else(|| "Unsupported geo_type for ACS data: tract code unavailable".to_string())?;
            Ok(CensusGeography {
                for_clause: format!("tract:{}", tract),
                in_clause: Some(format!("state:{} county:{}", state, county)),
            })
        }
        GeoType::Zip => {
            let zip = location
                .zip
                .as_deref()
                .filter(|z| !z.is_empty())
                .ok_or_else(|| "Unsupported geo_type for ACS data: zip code unavailable".to_string())?;
            Ok(CensusGeography {
                for_clause: format!("zip code tabulation area:{}", zip),
                in_clause: None,
            })
        }
        GeoType::County => Ok(CensusGeography {
            for_clause: format!("county:{}", county),
            in_clause: Some(format!("state:{}", state)),
        }),
    }
}

fn trend_point(year: i32, table: &CensusTable) -> Option<TrendPoint> {
    let employed = table.count(EMPLOYED)?;
    let unemployed = table.count(UNEMPLOYED)?;
    let labor_force = table.count(CIVILIAN_LABOR_FORCE)?;
    let unemp_rate = if labor_force > 0 {
        round2(unemployed as f64 / labor_force as f64 * 100.0)
    } else {
        0.0
    };
    Some(TrendPoint {
        year,
        value: employed,
        unemp_rate,
        labor_force,
        projected: false,
    })
}

/// Annual employment trend and growth from one table per vintage year.
/// Vintages with missing fields are skipped.
pub fn granular_employment(vintages: &[(i32, CensusTable)]) -> SourceResult<GranularEmployment> {
    let mut trends: Vec<TrendPoint> = vintages
        .iter()
        .filter_map(|(year, table)| trend_point(*year, table))
        .collect();
    trends.sort_by(|a, b| b.year.cmp(&a.year));

    let Some(latest) = trends.first() else {
        return SourceResult::failure("No Census data available");
    };

    let values: Vec<f64> = trends.iter().map(|t| t.value as f64).collect();
    let growth: GrowthWindow = GRANULAR_WINDOWS
        .iter()
        .map(|(period, steps)| (*period, windowed_growth_values(&values, *steps)))
        .collect();

    SourceResult::Success(GranularEmployment {
        growth,
        total_jobs: latest.value,
        unemployment_rate: latest.unemp_rate,
        labor_force: latest.labor_force,
        trends,
    })
}

pub fn workforce_quality(percent_college: f64) -> Rating {
    if percent_college > 35.0 {
        Rating::High
    } else if percent_college > 25.0 {
        Rating::Moderate
    } else {
        Rating::Low
    }
}

fn share(part: i64, whole: i64) -> f64 {
    if whole > 0 {
        round2(part as f64 / whole as f64 * 100.0)
    } else {
        0.0
    }
}

/// Income, participation and education figures; each is omitted when its
/// inputs are missing from the table.
pub fn demographics(table: &CensusTable, data_year: i32) -> SourceResult<Demographics> {
    if table.rows.is_empty() {
        return SourceResult::failure("No ACS data available");
    }

    let income_data = table.count(MEDIAN_HOUSEHOLD_INCOME).map(|income| IncomeData {
        median_household_income: income,
        data_year,
    });

    let labor_participation = table
        .count(POPULATION_16_PLUS)
        .zip(table.count(LABOR_FORCE))
        .map(|(pop, labor)| LaborParticipation {
            labor_force_participation_rate: share(labor, pop),
            data_year,
        });

    let degrees: Option<Vec<i64>> = COLLEGE_DEGREES.iter().map(|v| table.count(v)).collect();
    let education_data = table
        .count(POPULATION_25_PLUS)
        .zip(degrees)
        .map(|(pop, degrees)| {
            let pct = share(degrees.iter().sum(), pop);
            EducationData {
                percent_college_educated: pct,
                workforce_quality_rating: workforce_quality(pct),
                data_year,
            }
        });

    SourceResult::Success(Demographics {
        income_data,
        labor_participation,
        education_data,
    })
}
