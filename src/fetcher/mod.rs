// Upstream collaborators: provider clients behind async traits.

pub mod traits;
pub mod bls;
pub mod census;
pub mod geo;

pub use bls::BlsClient;
pub use census::CensusClient;
pub use geo::{FccFipsResolver, NominatimGeocoder};
pub use traits::{CensusSource, FipsResolver, Geocoder, LaborStatsSource};

use reqwest::Client;
use std::time::Duration;

/// One HTTP client shared by every provider, built once at start-up.
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
}
