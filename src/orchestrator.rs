// Concurrent fan-out over every upstream source for one location
use crate::analyzer::SourceOutcomes;
use crate::analyzer::{county, granular, national, resilience, sectors};
use crate::fetcher::{CensusSource, LaborStatsSource};
use crate::model::{
    CensusGeography, CensusTable, CountyEmployment, Demographics, FipsLocation, GeoType,
    GranularEmployment, NationalBaseline, ResilienceResult, SectorReport, SourceResult,
};
use crate::utils::current_year;

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Runs one source under a deadline. Errors and timeouts become `Failure`.
async fn guarded<T, F>(source: &str, limit: Duration, fut: F) -> SourceResult<T>
where
    F: Future<Output = SourceResult<T>>,
{
    match timeout(limit, fut).await {
        Ok(outcome) => {
            if let Some(reason) = outcome.failure_reason() {
                warn!("{} failed: {}", source, reason);
            }
            outcome
        }
        Err(_) => {
            let reason = format!("{} timed out after {}s", source, limit.as_secs_f64());
            warn!("{}", reason);
            SourceResult::failure(reason)
        }
    }
}

pub struct Orchestrator {
    bls: Arc<dyn LaborStatsSource>,
    census: Arc<dyn CensusSource>,
    timeout: Duration,
    acs_latest_year: i32,
}

impl Orchestrator {
    pub fn new(
        bls: Arc<dyn LaborStatsSource>,
        census: Arc<dyn CensusSource>,
        timeout: Duration,
        acs_latest_year: i32,
    ) -> Self {
        Self {
            bls,
            census,
            timeout,
            acs_latest_year,
        }
    }

    /// Fetches all six sources concurrently and waits for every one of them.
    pub async fn fetch_all(&self, location: &FipsLocation, geo_type: GeoType) -> SourceOutcomes {
        let year = current_year();
        let fips = location.county_fips.as_str();
        let geography = granular::census_geography(location, geo_type);
        info!("Fetching sources for county {} ({})", fips, geo_type);

        let (county, sectors, national, resilience, granular, demographics) = tokio::join!(
            guarded("County employment", self.timeout, self.county(fips, year)),
            guarded("Sector data", self.timeout, self.sectors(fips, year)),
            guarded("National baseline", self.timeout, self.national(year)),
            guarded("Resilience", self.timeout, self.resilience(fips, year)),
            guarded("Census employment", self.timeout, self.granular(&geography)),
            guarded("Census demographics", self.timeout, self.demographics(&geography)),
        );

        SourceOutcomes {
            county,
            sectors,
            national,
            resilience,
            granular,
            demographics,
        }
    }

    async fn county(&self, fips: &str, year: i32) -> SourceResult<CountyEmployment> {
        let ids = county::LauSeriesIds::for_county(fips);
        SourceResult::from(self.bls.fetch_series(&county::lau_request(&ids, year)).await)
            .and_then(|series| county::county_employment(&ids, &series))
    }

    async fn sectors(&self, fips: &str, year: i32) -> SourceResult<SectorReport> {
        SourceResult::from(self.bls.fetch_series(&sectors::qcew_request(fips, year)).await)
            .and_then(|series| sectors::sector_report(fips, &series))
    }

    async fn national(&self, year: i32) -> SourceResult<NationalBaseline> {
        SourceResult::from(self.bls.fetch_series(&national::national_request(year)).await)
            .and_then(|series| national::national_baseline(&series))
    }

    async fn resilience(&self, fips: &str, year: i32) -> SourceResult<ResilienceResult> {
        SourceResult::from(self.bls.fetch_series(&resilience::resilience_request(fips, year)).await)
            .and_then(|series| resilience::assess_resilience(fips, &series))
    }

    /// One request per vintage; failed vintages are skipped.
    async fn granular(
        &self,
        geography: &Result<CensusGeography, String>,
    ) -> SourceResult<GranularEmployment> {
        let geography = match geography {
            Ok(g) => g,
            Err(reason) => return SourceResult::failure(reason.clone()),
        };
        let variables = granular::employment_variables();
        let requests = granular::vintages(self.acs_latest_year).into_iter().map(|year| {
            let variables = &variables;
            async move { (year, self.census.fetch_table(year, variables, geography).await) }
        });

        let tables: Vec<(i32, CensusTable)> = join_all(requests)
            .await
            .into_iter()
            .filter_map(|(year, result)| match result {
                Ok(table) => Some((year, table)),
                Err(e) => {
                    debug!("Skipping ACS vintage {}: {}", year, e);
                    None
                }
            })
            .collect();
        granular::granular_employment(&tables)
    }

    async fn demographics(&self, geography: &Result<CensusGeography, String>) -> SourceResult<Demographics> {
        let geography = match geography {
            Ok(g) => g,
            Err(reason) => return SourceResult::failure(reason.clone()),
        };
        let year = self.acs_latest_year;
        let table = self
            .census
            .fetch_table(year, &granular::demographic_variables(), geography)
            .await;
        SourceResult::from(table).and_then(|table| granular::demographics(&table, year))
    }
}
