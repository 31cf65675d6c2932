// Merges calculator outputs into the report and derives its qualitative labels
use crate::analyzer::comparison::compare_to_national;
use crate::analyzer::projection::project_granular;
use crate::model::{
    Comparison, CountyEmployment, CreSummary, Demographics, EmploymentPicture, FipsLocation,
    GeoType, GranularEmployment, GrowthWindow, MarketView, NationalBaseline, NationalStanding,
    Period, Report, ReportGeo, ResilienceResult, SectorReport, SourceResult, Strength,
};
use tracing::debug;

pub const COUNTY_SOURCE: &str = "BLS LAU / QCEW (county, monthly)";
pub const GRANULAR_SOURCE: &str = "Census ACS 5-year (annual)";
pub const UNKNOWN: &str = "Unknown";

/// Everything the fan-out produced, one slot per source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOutcomes {
    pub county: SourceResult<CountyEmployment>,
    pub sectors: SourceResult<SectorReport>,
    pub national: SourceResult<NationalBaseline>,
    pub resilience: SourceResult<ResilienceResult>,
    pub granular: SourceResult<GranularEmployment>,
    pub demographics: SourceResult<Demographics>,
}

/// County employment with sector and wage data merged in.
fn county_view(
    employment: SourceResult<CountyEmployment>,
    sectors: SourceResult<SectorReport>,
) -> MarketView {
    MarketView {
        source: COUNTY_SOURCE.to_string(),
        geography: GeoType::County,
        employment: employment.map(EmploymentPicture::County),
        sectors: Some(sectors),
        demographics: None,
    }
}

/// Small-geography employment with demographics merged in.
fn granular_view(
    geo_type: GeoType,
    employment: SourceResult<GranularEmployment>,
    demographics: SourceResult<Demographics>,
) -> MarketView {
    MarketView {
        source: GRANULAR_SOURCE.to_string(),
        geography: geo_type,
        employment: employment.map(EmploymentPicture::Granular),
        sectors: None,
        demographics: Some(demographics),
    }
}

pub fn employment_strength(one_year: Option<f64>) -> Strength {
    let growth = one_year.unwrap_or(0.0);
    if growth > 2.0 {
        Strength::Strong
    } else if growth > 0.0 {
        Strength::Moderate
    } else {
        Strength::Weak
    }
}

pub fn wage_strength(one_year: Option<f64>) -> Strength {
    let growth = one_year.unwrap_or(0.0);
    if growth > 3.0 {
        Strength::Strong
    } else if growth > 0.0 {
        Strength::Moderate
    } else {
        Strength::Weak
    }
}

pub fn national_standing(comparison: &Comparison) -> NationalStanding {
    if comparison.values().any(|c| c.outperforming) {
        NationalStanding::Outperforming
    } else {
        NationalStanding::Underperforming
    }
}

/// Primary view's growth, falling back to the context view.
fn headline_growth<'a>(views: &[Option<&'a MarketView>]) -> Option<&'a GrowthWindow> {
    views
        .iter()
        .copied()
        .flatten()
        .find_map(|v| v.employment.as_success())
        .map(EmploymentPicture::growth)
}

fn wage_growth_1y(views: &[Option<&MarketView>]) -> Option<f64> {
    views
        .iter()
        .copied()
        .flatten()
        .filter_map(|v| v.sectors.as_ref()?.as_success())
        .find_map(|s| s.wage_data.as_success())
        .and_then(|w| w.wage_growth.get(Period::OneYear))
}

fn workforce_quality(views: &[Option<&MarketView>]) -> String {
    views
        .iter()
        .copied()
        .flatten()
        .filter_map(|v| v.demographics.as_ref()?.as_success())
        .find_map(|d| d.education_data.as_ref())
        .map(|e| e.workforce_quality_rating.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn summarize(
    primary: Option<&MarketView>,
    context: Option<&MarketView>,
    national: SourceResult<NationalBaseline>,
    resilience: SourceResult<ResilienceResult>,
) -> CreSummary {
    let views = [primary, context];
    let headline = headline_growth(&views);

    let comparison_detail = match (headline, national.as_success()) {
        (Some(local), Some(baseline)) => compare_to_national(local, &baseline.national_growth),
        _ => Comparison::new(),
    };

    let recession_resilience = resilience
        .as_success()
        .and_then(|r| r.resilience_rating)
        .map(|r| r.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());

    CreSummary {
        employment_growth: employment_strength(headline.and_then(|g| g.get(Period::OneYear))),
        wage_growth: wage_strength(wage_growth_1y(&views)),
        workforce_quality: workforce_quality(&views),
        recession_resilience,
        national_comparison: national_standing(&comparison_detail),
        comparison_detail,
        resilience,
        national_baseline: national,
    }
}

/// Assembles the report.
///
/// Tract and zip requests present the county as context and the projected
/// small-geography data as the primary view. County requests present the
/// county itself as the primary view and produce no context view.
pub fn compose_report(location: FipsLocation, geo_type: GeoType, outcomes: SourceOutcomes) -> Report {
    let SourceOutcomes {
        county,
        sectors,
        national,
        resilience,
        granular,
        demographics,
    } = outcomes;

    let mut notes = Vec::new();
    let (county_context, granular_data) = match geo_type {
        GeoType::Tract | GeoType::Zip => {
            let (granular, projection_notes) = project_granular(granular, &county);
            notes.extend(projection_notes);
            (
                Some(county_view(county, sectors)),
                Some(granular_view(geo_type, granular, demographics)),
            )
        }
        GeoType::County => {
            debug!(
                "County request: annual county series not presented separately (success = {})",
                granular.is_success()
            );
            let mut view = county_view(county, sectors);
            view.demographics = Some(demographics);
            (None, Some(view))
        }
    };

    let cre_summary = summarize(granular_data.as_ref(), county_context.as_ref(), national, resilience);

    Report {
        geo: ReportGeo { location, geo_type },
        county_context,
        granular_data,
        cre_summary,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        EducationData, IncomeData, Rating, TrendPoint, WageData, YearlyValue,
    };

    fn window(one_year: Option<f64>) -> GrowthWindow {
        [(Period::OneYear, one_year), (Period::TwoYears, None)].into_iter().collect()
    }

    fn location() -> FipsLocation {
        FipsLocation {
            lat: 37.7749,
            lon: -122.4194,
            zip: Some("94102".into()),
            state_fips: "06".into(),
            county_fips: "06075".into(),
            tract_code: Some("06075017901".into()),
        }
    }

    fn outcomes() -> SourceOutcomes {
        SourceOutcomes {
            county: SourceResult::Success(CountyEmployment {
                growth: window(Some(1.0)),
                total_jobs: 500_000,
                unemployment_rate: Some(3.5),
                labor_force: Some(520_000),
                employment_trends: vec![
                    YearlyValue { year: 2024, value: 110.0 },
                    YearlyValue { year: 2023, value: 100.0 },
                ],
                unemployment_rate_trends: Vec::new(),
                labor_force_trends: Vec::new(),
                monthly_employment_trends: Vec::new(),
            }),
            sectors: SourceResult::Success(SectorReport {
                top_sectors_growing: Vec::new(),
                wage_data: SourceResult::Success(WageData {
                    current_avg_weekly_wage: 1500.0,
                    annual_equivalent: 78_000.0,
                    wage_growth: window(Some(3.5)),
                }),
            }),
            national: SourceResult::Success(NationalBaseline { national_growth: window(Some(1.5)) }),
            resilience: SourceResult::Success(ResilienceResult {
                resilience_score: Some(80.0),
                resilience_rating: Some(Rating::High),
                ..ResilienceResult::default()
            }),
            granular: SourceResult::Success(GranularEmployment {
                growth: window(Some(2.5)),
                total_jobs: 1000,
                unemployment_rate: 4.76,
                labor_force: 1050,
                trends: vec![TrendPoint {
                    year: 2023,
                    value: 1000,
                    unemp_rate: 4.76,
                    labor_force: 1050,
                    projected: false,
                }],
            }),
            demographics: SourceResult::Success(Demographics {
                income_data: Some(IncomeData { median_household_income: 90_000, data_year: 2023 }),
                labor_participation: None,
                education_data: Some(EducationData {
                    percent_college_educated: 30.0,
                    workforce_quality_rating: Rating::Moderate,
                    data_year: 2023,
                }),
            }),
        }
    }

    #[test]
    fn strength_thresholds() {
        assert_eq!(employment_strength(Some(2.01)), Strength::Strong);
        assert_eq!(employment_strength(Some(2.0)), Strength::Moderate);
        assert_eq!(employment_strength(Some(0.0)), Strength::Weak);
        assert_eq!(employment_strength(None), Strength::Weak);
        assert_eq!(employment_strength(Some(f64::INFINITY)), Strength::Strong);
        assert_eq!(wage_strength(Some(3.0)), Strength::Moderate);
        assert_eq!(wage_strength(Some(3.1)), Strength::Strong);
        assert_eq!(wage_strength(Some(-1.0)), Strength::Weak);
    }

    #[test]
    fn tract_request_projects_and_labels() {
        let report = compose_report(location(), GeoType::Tract, outcomes());

        let context = report.county_context.as_ref().unwrap();
        assert!(context.sectors.is_some());
        assert!(context.demographics.is_none());

        let granular = report.granular_data.as_ref().unwrap();
        assert_eq!(granular.geography, GeoType::Tract);
        let EmploymentPicture::Granular(g) = granular.employment.as_success().unwrap() else {
            panic!("expected granular employment");
        };
        assert!(g.trends[0].projected);
        assert_eq!(g.trends[0].value, 1100);
        assert_eq!(report.notes.len(), 1);

        let s = &report.cre_summary;
        assert_eq!(s.employment_growth, Strength::Strong);
        assert_eq!(s.wage_growth, Strength::Strong);
        assert_eq!(s.workforce_quality, "Moderate");
        assert_eq!(s.recession_resilience, "High");
        assert_eq!(s.national_comparison, NationalStanding::Outperforming);
    }

    #[test]
    fn county_request_inverts_roles() {
        let report = compose_report(location(), GeoType::County, outcomes());
        assert!(report.county_context.is_none());
        let primary = report.granular_data.as_ref().unwrap();
        assert_eq!(primary.geography, GeoType::County);
        assert!(primary.sectors.is_some());
        assert!(primary.demographics.is_some());
        assert!(report.notes.is_empty());
        // county 1y growth of 1.0 vs national 1.5
        assert_eq!(report.cre_summary.employment_growth, Strength::Moderate);
        assert_eq!(report.cre_summary.national_comparison, NationalStanding::Underperforming);
    }

    #[test]
    fn failures_fall_back_to_unknown() {
        let mut o = outcomes();
        o.granular = SourceResult::failure("No Census data available");
        o.demographics = SourceResult::failure("Failed to fetch ACS data");
        o.resilience = SourceResult::Success(ResilienceResult::default());
        o.national = SourceResult::failure("timeout");
        let report = compose_report(location(), GeoType::Zip, o);

        let s = &report.cre_summary;
        // falls back to county growth of 1.0
        assert_eq!(s.employment_growth, Strength::Moderate);
        assert_eq!(s.workforce_quality, UNKNOWN);
        assert_eq!(s.recession_resilience, UNKNOWN);
        assert!(s.comparison_detail.is_empty());
        assert_eq!(s.national_comparison, NationalStanding::Underperforming);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["granular_data"]["employment"]["error"], "No Census data available");
        assert_eq!(json["cre_summary"]["national_baseline"]["error"], "timeout");
        assert_eq!(json["geo"]["county_fips"], "06075");
        assert_eq!(json["geo"]["geo_type"], "zip");
    }
}
