// Request entry point: cache lookup, location resolution, fan-out, compose, store
use crate::analyzer::compose_report;
use crate::cache::{CacheStatus, TieredCache};
use crate::fetcher::{FipsResolver, Geocoder};
use crate::model::{FipsLocation, LocationError, ReportRequest, StorageError};
use crate::normalizer::cache_key;
use crate::orchestrator::Orchestrator;

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error("cache storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReportError {
    pub fn status_code(&self) -> u16 {
        match self {
            ReportError::InvalidRequest(_) => 400,
            ReportError::Location(LocationError::NotFound(_)) => 404,
            ReportError::Location(_) => 424,
            ReportError::Storage(_) | ReportError::Serialization(_) => 500,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ReportError::InvalidRequest(_) => "invalid_request",
            ReportError::Location(LocationError::NotFound(_)) => "location_not_found",
            ReportError::Location(_) => "location_unavailable",
            ReportError::Storage(_) | ReportError::Serialization(_) => "internal",
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorBody {
                status: self.status_code(),
                kind: self.kind(),
                message: self.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub kind: &'static str,
    pub message: String,
}

/// Serialized report plus the tier that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportResponse {
    pub body: String,
    pub status: CacheStatus,
}

pub struct ReportService {
    geocoder: Arc<dyn Geocoder>,
    fips: Arc<dyn FipsResolver>,
    orchestrator: Orchestrator,
    cache: TieredCache,
}

impl ReportService {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        fips: Arc<dyn FipsResolver>,
        orchestrator: Orchestrator,
        cache: TieredCache,
    ) -> Self {
        Self {
            geocoder,
            fips,
            orchestrator,
            cache,
        }
    }

    pub async fn get_report(&self, request: &ReportRequest) -> Result<ReportResponse, ReportError> {
        let address = request.address.trim();
        if address.is_empty() {
            return Err(ReportError::InvalidRequest("Address is required".into()));
        }

        let key = cache_key(address, request.geo_type);
        if request.flush_cache {
            self.cache.flush(&key).await?;
        } else if let Some((body, status)) = self.cache.lookup(&key).await? {
            return Ok(ReportResponse { body, status });
        }

        let location = self.locate(address).await?;
        let outcomes = self.orchestrator.fetch_all(&location, request.geo_type).await;
        let report = compose_report(location, request.geo_type, outcomes);
        let body = serde_json::to_string(&report)?;

        if let Err(e) = self.cache.store(&key, &body).await {
            error!("Failed to cache report for {}: {}", key, e);
            return Err(e.into());
        }
        info!("Report computed and cached: {}", key);
        Ok(ReportResponse {
            body,
            status: CacheStatus::Fresh,
        })
    }

    async fn locate(&self, address: &str) -> Result<FipsLocation, LocationError> {
        let point = self.geocoder.geocode(address).await?;
        let codes = self.fips.resolve(&point).await?;
        info!(
            "Resolved '{}' to county {} (tract {:?})",
            address, codes.county_fips, codes.tract_code
        );
        Ok(FipsLocation::new(point, codes))
    }
}
