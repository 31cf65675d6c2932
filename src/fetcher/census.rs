use crate::fetcher::traits::CensusSource;
use crate::model::{CensusGeography, CensusTable, UpstreamError};

use reqwest::Client;
use tracing::debug;

pub struct CensusClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CensusClient {
    pub fn new(client: Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn query(&self, variables: &[&str], geography: &CensusGeography) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("get", variables.join(",")),
            ("for", geography.for_clause.clone()),
        ];
        if let Some(in_clause) = &geography.in_clause {
            query.push(("in", in_clause.clone()));
        }
        if let Some(key) = &self.api_key {
            query.push(("key", key.clone()));
        }
        query
    }
}

/// Splits the header row from the data rows.
fn into_table(mut raw: Vec<Vec<Option<String>>>) -> Result<CensusTable, UpstreamError> {
    if raw.len() < 2 {
        return Err(UpstreamError::Rejected("No ACS data available".into()));
    }
    let header = raw
        .remove(0)
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect();
    Ok(CensusTable { header, rows: raw })
}

#[async_trait::async_trait]
impl CensusSource for CensusClient {
    async fn fetch_table(
        &self,
        year: i32,
        variables: &[&str],
        geography: &CensusGeography,
    ) -> Result<CensusTable, UpstreamError> {
        let url = format!("{}/{}/acs/acs5", self.base_url.trim_end_matches('/'), year);
        debug!("Census request {} for {}", url, geography.for_clause);
        let response = self
            .client
            .get(&url)
            .query(&self.query(variables, geography))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                service: "Census",
                status: status.as_u16(),
            });
        }
        // The API answers an empty geography with 204 and no body.
        if status == reqwest::StatusCode::NO_CONTENT {
            return Err(UpstreamError::Rejected("No ACS data available".into()));
        }

        let raw: Vec<Vec<Option<String>>> = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        into_table(raw)
    }
}
