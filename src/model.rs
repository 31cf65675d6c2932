// Core structs: observations, growth windows, report sections, errors
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Growth reported when the past value is zero and the latest is positive.
pub const INFINITE_GROWTH: f64 = f64::INFINITY;

/// One reading of a provider time series.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub year: i32,
    /// Provider period code, e.g. `M01`, `Q03`, `M13` (annual average).
    pub period: Option<String>,
    pub period_name: Option<String>,
    pub value: f64,
    /// Provider-computed 12-month percent change, when requested.
    pub yoy_pct: Option<f64>,
}

impl Observation {
    #[cfg(test)]
    pub fn new(year: i32, period: Option<&str>, value: f64) -> Self {
        Self {
            year,
            period: period.map(str::to_string),
            period_name: None,
            value,
            yoy_pct: None,
        }
    }

    /// `M13` on monthly series, `Q05` on quarterly ones.
    pub fn is_annual_average(&self) -> bool {
        matches!(self.period.as_deref(), Some("M13") | Some("Q05"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub id: String,
    pub observations: Vec<Observation>,
}

/// A batch query against the labor-statistics timeseries API.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRequest {
    pub series_ids: Vec<String>,
    pub start_year: i32,
    pub end_year: i32,
    pub annual_average: bool,
    pub calculations: bool,
}

/// The `for` / `in` clause pair selecting a census geography.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CensusGeography {
    pub for_clause: String,
    pub in_clause: Option<String>,
}

/// Header row plus data rows, as returned by the census API.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CensusTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl CensusTable {
    /// Raw value of `variable` in the first data row.
    pub fn value(&self, variable: &str) -> Option<&str> {
        let idx = self.header.iter().position(|h| h == variable)?;
        self.rows.first()?.get(idx)?.as_deref()
    }

    /// Integer value of `variable`; negative census annotation codes count as missing.
    pub fn count(&self, variable: &str) -> Option<i64> {
        self.value(variable)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|v| *v >= 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoType {
    Tract,
    Zip,
    County,
}

impl GeoType {
    pub fn as_str(self) -> &'static str {
        match self {
            GeoType::Tract => "tract",
            GeoType::Zip => "zip",
            GeoType::County => "county",
        }
    }
}

impl fmt::Display for GeoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeoType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tract" => Ok(GeoType::Tract),
            "zip" => Ok(GeoType::Zip),
            "county" => Ok(GeoType::County),
            other => Err(format!("unsupported geo_type '{}' (expected tract, zip or county)", other)),
        }
    }
}

/// Result of geocoding an address.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub zip: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FipsCodes {
    pub state_fips: String,
    /// State + county, 5 digits.
    pub county_fips: String,
    /// State + county + tract, 11 digits.
    pub tract_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FipsLocation {
    pub lat: f64,
    pub lon: f64,
    pub zip: Option<String>,
    pub state_fips: String,
    pub county_fips: String,
    pub tract_code: Option<String>,
}

impl FipsLocation {
    pub fn new(point: GeoPoint, codes: FipsCodes) -> Self {
        Self {
            lat: point.lat,
            lon: point.lon,
            zip: point.zip,
            state_fips: codes.state_fips,
            county_fips: codes.county_fips,
            tract_code: codes.tract_code,
        }
    }

    /// The 3-digit county part of `county_fips`.
    pub fn county_code(&self) -> &str {
        self.county_fips.get(2..).unwrap_or("")
    }

    /// The 6-digit tract part of `tract_code`.
    pub fn tract_suffix(&self) -> Option<&str> {
        self.tract_code
            .as_deref()
            .and_then(|t| t.get(5..))
            .filter(|t| !t.is_empty())
    }
}

/// Lookback labels used by growth windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Period {
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "3y")]
    ThreeYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl Period {
    pub fn label(self) -> &'static str {
        match self {
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::ThreeYears => "3y",
            Period::FiveYears => "5y",
        }
    }

    /// Whole years covered by the period, if it spans whole years.
    pub fn years(self) -> Option<i32> {
        match self {
            Period::SixMonths => None,
            Period::OneYear => Some(1),
            Period::TwoYears => Some(2),
            Period::ThreeYears => Some(3),
            Period::FiveYears => Some(5),
        }
    }
}

/// Percent changes keyed by lookback period. `None` means not enough history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrowthWindow(BTreeMap<Period, Option<f64>>);

impl GrowthWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, period: Period) -> Option<f64> {
        self.0.get(&period).copied().flatten()
    }

    #[cfg(test)]
    pub fn contains(&self, period: Period) -> bool {
        self.0.contains_key(&period)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Period, Option<f64>)> + '_ {
        self.0.iter().map(|(p, v)| (*p, *v))
    }
}

impl FromIterator<(Period, Option<f64>)> for GrowthWindow {
    fn from_iter<I: IntoIterator<Item = (Period, Option<f64>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for GrowthWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (period, value) in &self.0 {
            match value {
                Some(v) => map.serialize_entry(period.label(), &Rate(*v))?,
                None => map.serialize_entry(period.label(), &Option::<f64>::None)?,
            }
        }
        map.end()
    }
}

/// Serializes a rate, writing non-finite values as strings instead of `null`.
struct Rate(f64);

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_rate(&self.0, serializer)
    }
}

pub fn serialize_rate<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str("NaN")
    } else if *value > 0.0 {
        serializer.serialize_str("Infinity")
    } else {
        serializer.serialize_str("-Infinity")
    }
}

/// Outcome of one upstream source. Failures are data, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceResult<T> {
    Success(T),
    Failure(String),
}

impl<T> SourceResult<T> {
    pub fn failure(reason: impl Into<String>) -> Self {
        SourceResult::Failure(reason.into())
    }

    pub fn as_success(&self) -> Option<&T> {
        match self {
            SourceResult::Success(v) => Some(v),
            SourceResult::Failure(_) => None,
        }
    }

    #[cfg(test)]
    pub fn into_success(self) -> Option<T> {
        match self {
            SourceResult::Success(v) => Some(v),
            SourceResult::Failure(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SourceResult::Success(_))
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            SourceResult::Success(_) => None,
            SourceResult::Failure(r) => Some(r),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SourceResult<U> {
        match self {
            SourceResult::Success(v) => SourceResult::Success(f(v)),
            SourceResult::Failure(r) => SourceResult::Failure(r),
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> SourceResult<U>) -> SourceResult<U> {
        match self {
            SourceResult::Success(v) => f(v),
            SourceResult::Failure(r) => SourceResult::Failure(r),
        }
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for SourceResult<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => SourceResult::Success(v),
            Err(e) => SourceResult::Failure(e.to_string()),
        }
    }
}

impl<T: Serialize> Serialize for SourceResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SourceResult::Success(v) => v.serialize(serializer),
            SourceResult::Failure(reason) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", reason)?;
                map.end()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rating {
    High,
    Moderate,
    Low,
}

impl Rating {
    pub fn as_str(self) -> &'static str {
        match self {
            Rating::High => "High",
            Rating::Moderate => "Moderate",
            Rating::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyValue {
    pub year: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub year: i32,
    pub month: String,
    pub value: i64,
    pub label: String,
}

/// Monthly county employment picture (LAU).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountyEmployment {
    pub growth: GrowthWindow,
    pub total_jobs: i64,
    pub unemployment_rate: Option<f64>,
    pub labor_force: Option<i64>,
    pub employment_trends: Vec<YearlyValue>,
    pub unemployment_rate_trends: Vec<YearlyValue>,
    pub labor_force_trends: Vec<YearlyValue>,
    pub monthly_employment_trends: Vec<MonthlyPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sector {
    pub name: String,
    #[serde(serialize_with = "serialize_rate")]
    pub growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WageData {
    pub current_avg_weekly_wage: f64,
    pub annual_equivalent: f64,
    pub wage_growth: GrowthWindow,
}

/// Sector growth and wages (QCEW).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorReport {
    pub top_sectors_growing: Vec<Sector>,
    pub wage_data: SourceResult<WageData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NationalBaseline {
    pub national_growth: GrowthWindow,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResilienceResult {
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_opt_rate")]
    pub covid_loss_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_opt_rate")]
    pub great_recession_loss_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resilience_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resilience_rating: Option<Rating>,
}

fn serialize_opt_rate<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serialize_rate(v, serializer),
        None => serializer.serialize_none(),
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// One annual small-geography reading, possibly projected forward.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub year: i32,
    pub value: i64,
    pub unemp_rate: f64,
    pub labor_force: i64,
    #[serde(skip_serializing_if = "is_false")]
    pub projected: bool,
}

/// Annual tract/zip/county employment picture (ACS).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GranularEmployment {
    pub growth: GrowthWindow,
    pub total_jobs: i64,
    pub unemployment_rate: f64,
    pub labor_force: i64,
    pub trends: Vec<TrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeData {
    pub median_household_income: i64,
    pub data_year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaborParticipation {
    pub labor_force_participation_rate: f64,
    pub data_year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EducationData {
    pub percent_college_educated: f64,
    pub workforce_quality_rating: Rating,
    pub data_year: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Demographics {
    pub income_data: Option<IncomeData>,
    pub labor_participation: Option<LaborParticipation>,
    pub education_data: Option<EducationData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EmploymentPicture {
    County(CountyEmployment),
    Granular(GranularEmployment),
}

impl EmploymentPicture {
    pub fn growth(&self) -> &GrowthWindow {
        match self {
            EmploymentPicture::County(c) => &c.growth,
            EmploymentPicture::Granular(g) => &g.growth,
        }
    }
}

/// A source-tagged employment view of one geography.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketView {
    pub source: String,
    pub geography: GeoType,
    pub employment: SourceResult<EmploymentPicture>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sectors: Option<SourceResult<SectorReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demographics: Option<SourceResult<Demographics>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodComparison {
    #[serde(serialize_with = "serialize_rate")]
    pub local_rate: f64,
    #[serde(serialize_with = "serialize_rate")]
    pub national_rate: f64,
    #[serde(serialize_with = "serialize_rate")]
    pub difference: f64,
    pub outperforming: bool,
    pub performance_description: String,
}

pub type Comparison = BTreeMap<Period, PeriodComparison>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Strong,
    Moderate,
    Weak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NationalStanding {
    Outperforming,
    Underperforming,
}

/// Qualitative labels for commercial real estate readers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreSummary {
    pub employment_growth: Strength,
    pub wage_growth: Strength,
    pub workforce_quality: String,
    pub recession_resilience: String,
    pub national_comparison: NationalStanding,
    pub comparison_detail: Comparison,
    pub resilience: SourceResult<ResilienceResult>,
    pub national_baseline: SourceResult<NationalBaseline>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportGeo {
    #[serde(flatten)]
    pub location: FipsLocation,
    pub geo_type: GeoType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub geo: ReportGeo,
    pub county_context: Option<MarketView>,
    pub granular_data: Option<MarketView>,
    pub cre_summary: CreSummary,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub address: String,
    pub geo_type: GeoType,
    pub flush_cache: bool,
}

/// A persisted report row.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub payload: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{service} request failed with status {status}")]
    Status { service: &'static str, status: u16 },
    #[error("{0}")]
    Rejected(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Geocoding failed: {0}")]
    Geocode(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Failed to retrieve FIPS codes: {0}")]
    FipsUnavailable(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("fast cache tier full ({capacity} live entries)")]
    Full { capacity: usize },
}
