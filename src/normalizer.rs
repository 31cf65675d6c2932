use crate::model::GeoType;

/// Bumped whenever the cached report shape changes.
pub const SCHEMA_VERSION: &str = "v2";

/// Collapses whitespace and case so equivalent addresses share a cache entry.
pub fn normalize_address(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn cache_key(address: &str, geo_type: GeoType) -> String {
    format!("{}:{}:{}", normalize_address(address), geo_type, SCHEMA_VERSION)
}
