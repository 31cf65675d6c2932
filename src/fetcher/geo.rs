// Address geocoding and coordinate -> FIPS resolution
use crate::fetcher::traits::{FipsResolver, Geocoder};
use crate::model::{FipsCodes, GeoPoint, LocationError};

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    #[serde(default)]
    postcode: Option<String>,
}

pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

fn first_place(places: Vec<NominatimPlace>) -> Result<GeoPoint, LocationError> {
    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| LocationError::NotFound("Address not found by geocoder.".into()))?;
    let lat = place
        .lat
        .parse()
        .map_err(|_| LocationError::Geocode(format!("invalid latitude '{}'", place.lat)))?;
    let lon = place
        .lon
        .parse()
        .map_err(|_| LocationError::Geocode(format!("invalid longitude '{}'", place.lon)))?;
    Ok(GeoPoint {
        lat,
        lon,
        zip: place.address.and_then(|a| a.postcode),
    })
}

#[async_trait::async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeoPoint, LocationError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[("q", address), ("format", "json"), ("addressdetails", "1")])
            .send()
            .await
            .map_err(|e| LocationError::Geocode(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LocationError::Geocode(format!("status {}", response.status())));
        }
        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| LocationError::Geocode(e.to_string()))?;
        let point = first_place(places)?;
        debug!("Geocoded '{}' to ({}, {})", address, point.lat, point.lon);
        Ok(point)
    }
}

#[derive(Debug, Deserialize)]
struct FccFips {
    #[serde(rename = "FIPS")]
    fips: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FccBlockResponse {
    #[serde(rename = "State")]
    state: Option<FccFips>,
    #[serde(rename = "County")]
    county: Option<FccFips>,
    #[serde(rename = "Block")]
    block: Option<FccFips>,
}

pub struct FccFipsResolver {
    client: Client,
    base_url: String,
}

impl FccFipsResolver {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

fn into_codes(body: FccBlockResponse) -> Result<FipsCodes, LocationError> {
    let not_found = || LocationError::NotFound("FIPS codes not found for the given address.".into());
    let state_fips = body.state.and_then(|s| s.fips).ok_or_else(not_found)?;
    let county_fips = body.county.and_then(|c| c.fips).ok_or_else(not_found)?;
    // state + county + tract
    let tract_code = body
        .block
        .and_then(|b| b.fips)
        .and_then(|f| f.get(..11).map(str::to_string));
    Ok(FipsCodes {
        state_fips,
        county_fips,
        tract_code,
    })
}

#[async_trait::async_trait]
impl FipsResolver for FccFipsResolver {
    async fn resolve(&self, point: &GeoPoint) -> Result<FipsCodes, LocationError> {
        let url = format!("{}/block/find", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", point.lat.to_string()),
                ("longitude", point.lon.to_string()),
                ("format", "json".to_string()),
                ("showall", "true".to_string()),
            ])
            .send()
            .await
            .map_err(|e| LocationError::FipsUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LocationError::FipsUnavailable(format!("status {}", response.status())));
        }
        let body: FccBlockResponse = response
            .json()
            .await
            .map_err(|e| LocationError::FipsUnavailable(e.to_string()))?;
        into_codes(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_first_geocoder_match() {
        let places: Vec<NominatimPlace> = serde_json::from_str(
            r#"[{"lat": "37.7749", "lon": "-122.4194", "address": {"postcode": "94102"}},
                {"lat": "1", "lon": "2"}]"#,
        )
        .unwrap();
        let point = first_place(places).unwrap();
        assert_eq!(point.lat, 37.7749);
        assert_eq!(point.zip.as_deref(), Some("94102"));
    }

    #[test]
    fn empty_geocoder_result_is_not_found() {
        assert!(matches!(first_place(Vec::new()), Err(LocationError::NotFound(_))));
    }

    #[test]
    fn extracts_tract_from_block() {
        let body: FccBlockResponse = serde_json::from_str(
            r#"{"State": {"FIPS": "06"}, "County": {"FIPS": "06075"}, "Block": {"FIPS": "060750179011004"}}"#,
        )
        .unwrap();
        let codes = into_codes(body).unwrap();
        assert_eq!(codes.county_fips, "06075");
        assert_eq!(codes.tract_code.as_deref(), Some("06075017901"));
    }

    #[test]
    fn missing_county_is_not_found() {
        let body: FccBlockResponse =
            serde_json::from_str(r#"{"State": {"FIPS": "06"}, "County": null}"#).unwrap();
        assert!(matches!(into_codes(body), Err(LocationError::NotFound(_))));
    }
}
