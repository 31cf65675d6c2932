// Downturn resilience: how hard the county was hit in past recessions
use crate::analyzer::county::employed_series_id;
use crate::analyzer::timeseries::{YearOrder, annual_levels, growth_pct, observations_for};
use crate::model::{Rating, ResilienceResult, Series, SeriesRequest, SourceResult};
use crate::utils::round_to;
use std::collections::BTreeMap;

pub const HISTORY_START_YEAR: i32 = 2007;

/// (peak year, trough year) for the COVID-19 shock.
pub const COVID_WINDOW: (i32, i32) = (2019, 2020);
/// (peak year, trough year) for the Great Recession.
pub const GREAT_RECESSION_WINDOW: (i32, i32) = (2007, 2009);

const LOSS_PENALTY: f64 = 5.0;

pub fn resilience_request(county_fips: &str, current_year: i32) -> SeriesRequest {
    SeriesRequest {
        series_ids: vec![employed_series_id(county_fips)],
        start_year: HISTORY_START_YEAR,
        end_year: current_year,
        annual_average: true,
        calculations: false,
    }
}

fn levels_by_year(series: &[Series], id: &str) -> BTreeMap<i32, f64> {
    annual_levels(&observations_for(series, id), YearOrder::Ascending)
        .into_iter()
        .map(|y| (y.year, y.value))
        .collect()
}

fn window_loss(levels: &BTreeMap<i32, f64>, (peak, trough): (i32, i32)) -> Option<f64> {
    Some(growth_pct(*levels.get(&trough)?, *levels.get(&peak)?))
}

pub fn resilience_score(avg_abs_loss: f64) -> f64 {
    (100.0 - avg_abs_loss * LOSS_PENALTY).clamp(0.0, 100.0)
}

pub fn resilience_rating(score: f64) -> Rating {
    if score > 70.0 {
        Rating::High
    } else if score > 50.0 {
        Rating::Moderate
    } else {
        Rating::Low
    }
}

/// Scores the county from its job losses through 2019→2020 and 2007→2009.
/// With neither window available every field is left empty.
pub fn assess_resilience(county_fips: &str, series: &[Series]) -> SourceResult<ResilienceResult> {
    if series.is_empty() {
        return SourceResult::failure("No resilience data");
    }
    let levels = levels_by_year(series, &employed_series_id(county_fips));

    let covid = window_loss(&levels, COVID_WINDOW);
    let recession = window_loss(&levels, GREAT_RECESSION_WINDOW);
    let losses: Vec<f64> = [covid, recession].into_iter().flatten().collect();

    let mut result = ResilienceResult {
        covid_loss_pct: covid,
        great_recession_loss_pct: recession,
        ..ResilienceResult::default()
    };
    if !losses.is_empty() {
        let avg = losses.iter().map(|l| l.abs()).sum::<f64>() / losses.len() as f64;
        let score = resilience_score(avg);
        result.resilience_score = Some(round_to(score, 1));
        result.resilience_rating = Some(resilience_rating(score));
    }
    SourceResult::Success(result)
}
