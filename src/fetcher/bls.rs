use crate::fetcher::traits::LaborStatsSource;
use crate::model::{Observation, Series, SeriesRequest, UpstreamError};

use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

const REQUEST_SUCCEEDED: &str = "REQUEST_SUCCEEDED";

#[derive(Debug, Deserialize)]
struct BlsResponse {
    status: String,
    #[serde(default)]
    message: Vec<String>,
    #[serde(rename = "Results", default)]
    results: Option<BlsResults>,
}

#[derive(Debug, Deserialize)]
struct BlsResults {
    #[serde(default)]
    series: Vec<BlsSeries>,
}

#[derive(Debug, Deserialize)]
struct BlsSeries {
    #[serde(rename = "seriesID", default)]
    series_id: String,
    #[serde(default)]
    data: Vec<BlsDatum>,
}

#[derive(Debug, Deserialize)]
struct BlsDatum {
    year: String,
    #[serde(default)]
    period: Option<String>,
    #[serde(rename = "periodName", default)]
    period_name: Option<String>,
    value: String,
    #[serde(default)]
    calculations: Option<BlsCalculations>,
}

#[derive(Debug, Deserialize)]
struct BlsCalculations {
    #[serde(default)]
    pct_changes: HashMap<String, String>,
}

pub struct BlsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl BlsClient {
    pub fn new(client: Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn payload(&self, req: &SeriesRequest) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "seriesid": req.series_ids,
            "startyear": req.start_year.to_string(),
            "endyear": req.end_year.to_string(),
            "catalog": false,
            "calculations": req.calculations,
            "annualaverage": req.annual_average,
        });
        if let Some(key) = &self.api_key {
            payload["registrationkey"] = serde_json::Value::String(key.clone());
        }
        payload
    }
}

fn parse_datum(datum: BlsDatum) -> Option<Observation> {
    let year = datum.year.trim().parse().ok()?;
    let value = datum.value.trim().replace(',', "").parse().ok()?;
    let yoy_pct = datum
        .calculations
        .and_then(|c| c.pct_changes.get("12").and_then(|v| v.trim().parse().ok()));
    Some(Observation {
        year,
        period: datum.period,
        period_name: datum.period_name,
        value,
        yoy_pct,
    })
}

/// Converts a decoded response into series, dropping unparseable readings.
/// Series without an ID take the requested ID at the same position.
fn into_series(response: BlsResponse, req: &SeriesRequest) -> Result<Vec<Series>, UpstreamError> {
    if response.status != REQUEST_SUCCEEDED {
        let reason = response
            .message
            .into_iter()
            .next()
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(UpstreamError::Rejected(reason));
    }

    let series = response.results.map(|r| r.series).unwrap_or_default();
    Ok(series
        .into_iter()
        .enumerate()
        .map(|(idx, s)| {
            let id = if s.series_id.is_empty() {
                req.series_ids.get(idx).cloned().unwrap_or_default()
            } else {
                s.series_id
            };
            let total = s.data.len();
            let observations: Vec<Observation> = s.data.into_iter().filter_map(parse_datum).collect();
            if observations.len() < total {
                debug!("{}: dropped {} unparseable readings", id, total - observations.len());
            }
            Series { id, observations }
        })
        .collect())
}

#[async_trait::async_trait]
impl LaborStatsSource for BlsClient {
    async fn fetch_series(&self, req: &SeriesRequest) -> Result<Vec<Series>, UpstreamError> {
        debug!("BLS request for {} series ({}-{})", req.series_ids.len(), req.start_year, req.end_year);
        let response = self
            .client
            .post(&self.base_url)
            .json(&self.payload(req))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status {
                service: "BLS",
                status: response.status().as_u16(),
            });
        }

        let body: BlsResponse = response.json().await?;
        into_series(body, req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(ids: &[&str]) -> SeriesRequest {
        SeriesRequest {
            series_ids: ids.iter().map(|s| s.to_string()).collect(),
            start_year: 2019,
            end_year: 2025,
            annual_average: false,
            calculations: true,
        }
    }

    fn decode(value: serde_json::Value) -> BlsResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn parses_series_and_calculations() {
        let body = decode(json!({
            "status": "REQUEST_SUCCEEDED",
            "Results": {"series": [
                {"seriesID": "ENU0607510523", "data": [
                    {"year": "2024", "period": "Q04", "periodName": "4th Quarter", "value": "1,234",
                     "calculations": {"pct_changes": {"3": "0.5", "12": "4.2"}}},
                    {"year": "2024", "period": "Q03", "value": "-"}
                ]}
            ]}
        }));
        let series = into_series(body, &request(&["ENU0607510523"])).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].observations.len(), 1);
        let obs = &series[0].observations[0];
        assert_eq!(obs.value, 1234.0);
        assert_eq!(obs.yoy_pct, Some(4.2));
        assert_eq!(obs.period_name.as_deref(), Some("4th Quarter"));
    }

    #[test]
    fn missing_series_id_uses_requested_position() {
        let body = decode(json!({
            "status": "REQUEST_SUCCEEDED",
            "Results": {"series": [{"data": [{"year": "2023", "period": "M01", "value": "150000"}]}]}
        }));
        let series = into_series(body, &request(&["LNS12000000"])).unwrap();
        assert_eq!(series[0].id, "LNS12000000");
    }

    #[test]
    fn rejected_status_carries_first_message() {
        let body = decode(json!({
            "status": "REQUEST_NOT_PROCESSED",
            "message": ["daily threshold reached", "other"]
        }));
        let err = into_series(body, &request(&["X"])).unwrap_err();
        assert_eq!(err.to_string(), "daily threshold reached");
    }

    #[test]
    fn payload_includes_key_only_when_configured() {
        let client = Client::new();
        let anon = BlsClient::new(client.clone(), "http://x".into(), None);
        assert!(anon.payload(&request(&["A"])).get("registrationkey").is_none());
        let keyed = BlsClient::new(client, "http://x".into(), Some("k".into()));
        let p = keyed.payload(&request(&["A"]));
        assert_eq!(p["registrationkey"], "k");
        assert_eq!(p["startyear"], "2019");
        assert_eq!(p["annualaverage"], false);
    }
}
