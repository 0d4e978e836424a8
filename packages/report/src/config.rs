//! Pipeline configuration, embedded at compile time.
//!
//! Tunables live in `config/default.toml` and parse into
//! [`ReportConfig`]. Deployments that need different values construct a
//! `ReportConfig` directly or parse their own TOML with
//! [`ReportConfig::from_toml`].

use std::time::Duration;

use serde::Deserialize;

/// Embedded default configuration.
const DEFAULT_TOML: &str = include_str!("../config/default.toml");

/// All pipeline tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Tract resolution settings.
    pub resolver: ResolverConfig,
    /// Geocoding settings.
    pub geocode: GeocodeConfig,
    /// Warehouse query settings.
    pub warehouse: WarehouseConfig,
    /// Reference snapshot settings.
    pub snapshot: SnapshotConfig,
    /// Summary builder settings.
    pub summary: SummaryConfig,
    /// Similar-locations settings.
    pub similar: SimilarConfig,
}

/// Tract resolution settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Maximum haversine distance (meters) from the geocoded point to a
    /// tract centroid.
    pub max_distance_m: f64,
}

/// Geocoding settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeConfig {
    /// Per-request geocoding timeout in milliseconds.
    pub timeout_ms: u64,
    /// ISO 3166-1 alpha-2 country filter for geocoding.
    pub country_code: String,
}

/// Warehouse query settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    /// Per-stage warehouse timeout in milliseconds.
    pub timeout_ms: u64,
    /// Bounded retry count for transient store failures.
    pub max_retries: u32,
}

/// Reference snapshot settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    /// Hours between reference snapshot refreshes.
    pub refresh_hours: u64,
}

/// Summary builder settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryConfig {
    /// Number of descriptive clauses to produce.
    pub top_n: usize,
}

/// Similar-locations settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SimilarConfig {
    /// Length of the similar-locations list.
    pub limit: usize,
}

impl ReportConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML deserialization error if the text is invalid.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::de::from_str(text)
    }

    /// Geocoding timeout as a [`Duration`].
    #[must_use]
    pub const fn geocode_timeout(&self) -> Duration {
        Duration::from_millis(self.geocode.timeout_ms)
    }

    /// Warehouse stage timeout as a [`Duration`].
    #[must_use]
    pub const fn warehouse_timeout(&self) -> Duration {
        Duration::from_millis(self.warehouse.timeout_ms)
    }

    /// Reference snapshot time-to-live as a [`Duration`].
    #[must_use]
    pub const fn snapshot_ttl(&self) -> Duration {
        Duration::from_secs(self.snapshot.refresh_hours * 3600)
    }
}

impl Default for ReportConfig {
    /// The embedded default configuration.
    ///
    /// Panics only if the embedded TOML is malformed, which is a
    /// compile-time guarantee.
    fn default() -> Self {
        Self::from_toml(DEFAULT_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded default config: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse() {
        let config = ReportConfig::default();
        assert!(config.resolver.max_distance_m > 0.0);
        assert_eq!(config.geocode.country_code, "us");
        assert_eq!(config.summary.top_n, 4);
        assert_eq!(config.similar.limit, 10);
    }

    #[test]
    fn durations_derive_from_milliseconds() {
        let config = ReportConfig::default();
        assert_eq!(config.geocode_timeout(), Duration::from_millis(5000));
        assert_eq!(config.snapshot_ttl(), Duration::from_secs(6 * 3600));
    }

    #[test]
    fn custom_toml_overrides() {
        let config = ReportConfig::from_toml(
            "[resolver]\nmax_distance_m = 1500.0\n\
             [geocode]\ntimeout_ms = 1000\ncountry_code = \"ca\"\n\
             [warehouse]\ntimeout_ms = 2000\nmax_retries = 1\n\
             [snapshot]\nrefresh_hours = 2\n\
             [summary]\ntop_n = 2\n\
             [similar]\nlimit = 5\n",
        )
        .unwrap();
        assert!((config.resolver.max_distance_m - 1500.0).abs() < f64::EPSILON);
        assert_eq!(config.warehouse.max_retries, 1);
    }
}
