use crate::model::{
    CensusGeography, CensusTable, FipsCodes, GeoPoint, LocationError, Series, SeriesRequest,
    UpstreamError,
};

/// Labor-statistics timeseries API (batch of series IDs over a year range).
#[async_trait::async_trait]
pub trait LaborStatsSource: Send + Sync {
    async fn fetch_series(&self, req: &SeriesRequest) -> Result<Vec<Series>, UpstreamError>;
}

/// Census-style API: variables for one geography in one vintage year.
#[async_trait::async_trait]
pub trait CensusSource: Send + Sync {
    async fn fetch_table(
        &self,
        year: i32,
        variables: &[&str],
        geography: &CensusGeography,
    ) -> Result<CensusTable, UpstreamError>;
}

#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeoPoint, LocationError>;
}

#[async_trait::async_trait]
pub trait FipsResolver: Send + Sync {
    async fn resolve(&self, point: &GeoPoint) -> Result<FipsCodes, LocationError>;
}
