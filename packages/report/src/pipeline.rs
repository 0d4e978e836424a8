//! Per-request report pipeline.
//!
//! One synchronous sequence per user request: geocode the address,
//! resolve the point against the reference snapshot, load the tract's
//! attribute record sets, and derive the presentation payload. The three
//! attribute queries run concurrently as a latency optimization; the
//! pipeline result is all-or-nothing, so a failed request leaves nothing
//! half-rendered.
//!
//! If a user issues a new query before the previous one completes, the
//! previous result must be discarded rather than raced into the
//! response: callers pair each pipeline run with a [`RequestTracker`]
//! token and publish only the latest generation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Local;
use location_insights_geocoder::service_registry::GeocodingService;
use location_insights_insights::{loader, similar, summary};
use location_insights_warehouse::{Warehouse, retry};

use crate::{LocationReport, ReportConfig, ReportError, SnapshotHolder, weather};

/// Request-scoped context: every collaborator a single pipeline run
/// needs, passed explicitly rather than held in globals.
pub struct ReportContext<'a> {
    /// HTTP client for geocoding providers.
    pub http: &'a reqwest::Client,
    /// Geocoding provider configurations, in priority order.
    pub services: &'a [GeocodingService],
    /// The tabular store.
    pub warehouse: &'a dyn Warehouse,
    /// Holder of the current reference snapshot.
    pub snapshots: &'a SnapshotHolder,
    /// Pipeline tunables.
    pub config: &'a ReportConfig,
}

/// Builds the full location report for a free-text address.
///
/// # Errors
///
/// * [`ReportError::NotFound`] — the address did not geocode, or no
///   tract lies within the configured distance threshold.
/// * [`ReportError::DataUnavailable`] — a collaborator failed, or the
///   tract has no wide-aggregate row.
/// * [`ReportError::Timeout`] — the geocoder or a warehouse stage
///   exceeded its bound.
pub async fn build_report(
    ctx: &ReportContext<'_>,
    address: &str,
) -> Result<LocationReport, ReportError> {
    let geocoded = match tokio::time::timeout(
        ctx.config.geocode_timeout(),
        location_insights_geocoder::geocode(
            ctx.http,
            ctx.services,
            address,
            &ctx.config.geocode.country_code,
        ),
    )
    .await
    {
        Ok(result) => result?,
        Err(_) => {
            return Err(ReportError::Timeout {
                stage: "geocode".to_string(),
            });
        }
    };

    let Some(geocoded) = geocoded else {
        log::info!("No geocoding match for '{address}'");
        return Err(ReportError::NotFound {
            message: format!("no geocoding match for '{address}'"),
        });
    };

    let mut report = build_report_for_point(ctx, geocoded.latitude, geocoded.longitude).await?;
    report.formatted_address = geocoded.formatted_address;
    Ok(report)
}

/// Builds the report for an already-geocoded point.
///
/// Tract resolution happens before any warehouse query: a point outside
/// the distance threshold fails fast without touching the store.
///
/// # Errors
///
/// Same as [`build_report`], minus the geocoding failures.
pub async fn build_report_for_point(
    ctx: &ReportContext<'_>,
    latitude: f64,
    longitude: f64,
) -> Result<LocationReport, ReportError> {
    let snapshot = ctx.snapshots.current();

    let resolved = snapshot
        .index
        .resolve(latitude, longitude, ctx.config.resolver.max_distance_m)
        .ok_or_else(|| ReportError::NotFound {
            message: format!(
                "no tract within {:.0}m of ({latitude:.5}, {longitude:.5})",
                ctx.config.resolver.max_distance_m
            ),
        })?;
    let unit = resolved.unit.clone();
    log::debug!(
        "Resolved ({latitude:.5}, {longitude:.5}) to tract {} at {:.0}m",
        unit.tract_id,
        resolved.distance_m
    );

    let today = Local::now().date_naive();
    let stage_timeout = ctx.config.warehouse_timeout();
    let max_retries = ctx.config.warehouse.max_retries;

    let (attributes, neighbors, forecast) = futures::try_join!(
        bounded_stage("attributes", stage_timeout, async {
            loader::load(ctx.warehouse, &unit, max_retries)
                .await
                .map_err(ReportError::from)
        }),
        bounded_stage("neighbors", stage_timeout, async {
            retry::with_retry("tract_neighbors", max_retries, || {
                ctx.warehouse.neighbor_records(&unit.tract_id)
            })
            .await
            .map_err(ReportError::from)
        }),
        bounded_stage("forecast", stage_timeout, async {
            retry::with_retry("short_range_forecast", max_retries, || {
                ctx.warehouse.forecast_from(today)
            })
            .await
            .map_err(ReportError::from)
        }),
    )?;

    let summary = summary::summarize(&attributes.outliers, ctx.config.summary.top_n);
    let top_affinity = summary::top_affinity(&attributes.affinities).cloned();
    let similar_locations =
        similar::similar_locations(&unit, &neighbors, &snapshot.index, ctx.config.similar.limit);
    let cluster = similar::cluster_partition(&unit, &neighbors, &snapshot.index);
    let weather = weather::upcoming_weather(
        &forecast,
        &snapshot.weather_descriptions,
        &unit.zipcode,
        today,
    );

    Ok(LocationReport {
        resolved,
        formatted_address: None,
        summary,
        top_affinity,
        attributes,
        similar_locations,
        cluster,
        weather,
    })
}

/// Bounds one pipeline stage with a timeout.
async fn bounded_stage<T, F>(stage: &str, limit: Duration, future: F) -> Result<T, ReportError>
where
    F: Future<Output = Result<T, ReportError>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(ReportError::Timeout {
            stage: stage.to_string(),
        }),
    }
}

/// Hands out request generations so only the latest result publishes.
///
/// Shared per input surface (e.g. one per address form). `begin` each
/// new request; when its pipeline finishes, gate the result with
/// [`RequestTracker::publish`] — superseded requests get `None` back and
/// drop their result.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: AtomicU64,
}

/// Token identifying one request generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    generation: u64,
}

impl RequestTracker {
    /// Creates a tracker with no requests issued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request generation, superseding all earlier ones.
    pub fn begin(&self) -> RequestToken {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        RequestToken { generation }
    }

    /// Whether the token still represents the latest request.
    #[must_use]
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.generation
    }

    /// Returns `Some(result)` only if `token` is still the latest
    /// request; superseded results are discarded.
    #[must_use]
    pub fn publish<T>(&self, token: RequestToken, result: T) -> Option<T> {
        if self.is_current(token) {
            Some(result)
        } else {
            log::debug!(
                "Discarding result for superseded request generation {}",
                token.generation
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicU32;

    use async_trait::async_trait;
    use chrono::{Days, NaiveDate};
    use location_insights_geography_models::GeoUnit;
    use location_insights_insights_models::{
        AffinityRecord, Category, ForecastRow, NeighborRecord, OutlierRecord, WeatherDescription,
        WideAggregate, WinsorizedBucket,
    };
    use location_insights_warehouse::WarehouseError;

    use super::*;
    use crate::ReferenceSnapshot;

    /// In-memory warehouse with the T7 fixture, counting every query.
    struct FixtureWarehouse {
        queries: AtomicU32,
    }

    impl FixtureWarehouse {
        fn new() -> Self {
            Self {
                queries: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Warehouse for FixtureWarehouse {
        async fn outlier_records(
            &self,
            tract_id: &str,
        ) -> Result<Vec<OutlierRecord>, WarehouseError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if tract_id != "T7" {
                return Ok(Vec::new());
            }
            Ok(vec![
                OutlierRecord {
                    tract_id: tract_id.to_string(),
                    category: Category::Education,
                    subcategory: "GRADUATE".to_string(),
                    rank: 1,
                    score: 9.1,
                    description: "Educational attainment".to_string(),
                    bucket: WinsorizedBucket::ExtremelyHigh,
                },
                OutlierRecord {
                    tract_id: tract_id.to_string(),
                    category: Category::Income,
                    subcategory: "HIGH".to_string(),
                    rank: 1,
                    score: 8.5,
                    description: "Household income".to_string(),
                    bucket: WinsorizedBucket::VeryHigh,
                },
            ])
        }

        async fn wide_aggregate(
            &self,
            tract_id: &str,
        ) -> Result<Option<WideAggregate>, WarehouseError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if tract_id != "T7" {
                return Ok(None);
            }
            Ok(Some(WideAggregate {
                tract_id: tract_id.to_string(),
                zipcode: None,
                cluster_id: None,
                population: 4100,
                households: 1700,
                avg_household_size: 2.4,
                share_married: 0.52,
                share_with_children: 0.31,
                share_renters: 0.44,
                median_age: 36.5,
                avg_temp_winter: 38.0,
                avg_temp_spring: 57.0,
                avg_temp_summer: 79.0,
                avg_temp_fall: 60.0,
            }))
        }

        async fn affinity_records(
            &self,
            tract_id: &str,
        ) -> Result<Vec<AffinityRecord>, WarehouseError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(vec![AffinityRecord {
                tract_id: tract_id.to_string(),
                entity: "Harbor Coffee".to_string(),
                entity_kind: "RETAILER".to_string(),
                rank: 1,
                boost: 2.6,
            }])
        }

        async fn neighbor_records(
            &self,
            tract_id: &str,
        ) -> Result<Vec<NeighborRecord>, WarehouseError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(vec![NeighborRecord {
                tract_id: tract_id.to_string(),
                neighbor_tract_id: "T8".to_string(),
                locality: "Arlington".to_string(),
                state: "VA".to_string(),
                rank: 1,
            }])
        }

        async fn forecast_from(
            &self,
            start: NaiveDate,
        ) -> Result<Vec<ForecastRow>, WarehouseError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ForecastRow {
                zipcode: "20007".to_string(),
                date: start.checked_add_days(Days::new(1)).unwrap_or(start),
                avg_temp: 81.0,
                min_temp: 72.0,
                max_temp: 90.0,
                description_code: "SUNNY".to_string(),
            }])
        }
    }

    fn unit(tract_id: &str, lat: f64, lon: f64, zipcode: &str) -> GeoUnit {
        GeoUnit {
            tract_id: tract_id.to_string(),
            cluster_id: 3,
            name: format!("Tract {tract_id}"),
            centroid_lat: lat,
            centroid_lon: lon,
            zipcode: zipcode.to_string(),
        }
    }

    fn holder() -> SnapshotHolder {
        let mut descriptions = BTreeMap::new();
        descriptions.insert(
            "SUNNY".to_string(),
            WeatherDescription {
                code: "SUNNY".to_string(),
                label: "Sunny".to_string(),
                icon: None,
            },
        );
        let snapshot = ReferenceSnapshot::from_parts(
            vec![
                unit("T7", 38.9097, -77.0654, "20007"),
                unit("T8", 38.8800, -77.1000, "22201"),
            ],
            descriptions,
        );
        SnapshotHolder::new(snapshot, Duration::from_secs(3600))
    }

    fn test_config() -> ReportConfig {
        ReportConfig::default()
    }

    #[tokio::test]
    async fn builds_full_report_for_a_resolvable_point() {
        let warehouse = FixtureWarehouse::new();
        let holder = holder();
        let config = test_config();
        let http = reqwest::Client::new();
        let ctx = ReportContext {
            http: &http,
            services: &[],
            warehouse: &warehouse,
            snapshots: &holder,
            config: &config,
        };

        let report = build_report_for_point(&ctx, 38.9100, -77.0650).await.unwrap();

        assert_eq!(report.resolved.unit.tract_id, "T7");
        assert_eq!(
            report.summary,
            vec![
                "have an education at GRADUATE level".to_string(),
                "have an high".to_string(),
            ]
        );
        assert_eq!(report.attributes.wide.zipcode.as_deref(), Some("20007"));
        assert_eq!(report.attributes.wide.cluster_id, Some(3));
        assert_eq!(report.top_affinity.as_ref().unwrap().entity, "Harbor Coffee");
        assert_eq!(report.similar_locations.len(), 1);
        assert_eq!(report.similar_locations[0].locality, "Arlington");
        assert_eq!(report.cluster.with_neighbors, vec!["T8".to_string()]);
        assert_eq!(report.weather.zipcode, "20007");
        assert_eq!(report.weather.days.len(), 1);
        assert_eq!(report.weather.days[0].label, "Sunny");
    }

    #[tokio::test]
    async fn unresolvable_point_short_circuits_without_store_queries() {
        let warehouse = FixtureWarehouse::new();
        let holder = holder();
        let config = test_config();
        let http = reqwest::Client::new();
        let ctx = ReportContext {
            http: &http,
            services: &[],
            warehouse: &warehouse,
            snapshots: &holder,
            config: &config,
        };

        // Central Park is far beyond max_distance_m of both fixture tracts.
        let result = build_report_for_point(&ctx, 40.7812, -73.9665).await;
        assert!(matches!(result, Err(ReportError::NotFound { .. })));
        assert_eq!(warehouse.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn report_is_serializable_for_the_presentation_layer() {
        let warehouse = FixtureWarehouse::new();
        let holder = holder();
        let config = test_config();
        let http = reqwest::Client::new();
        let ctx = ReportContext {
            http: &http,
            services: &[],
            warehouse: &warehouse,
            snapshots: &holder,
            config: &config,
        };

        let report = build_report_for_point(&ctx, 38.9100, -77.0650).await.unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["resolved"]["unit"]["tractId"], "T7");
        assert!(json["summary"].is_array());
    }

    #[test]
    fn newer_request_supersedes_older() {
        let tracker = RequestTracker::new();
        let first = tracker.begin();
        let second = tracker.begin();

        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
        assert_eq!(tracker.publish(first, "stale"), None);
        assert_eq!(tracker.publish(second, "fresh"), Some("fresh"));
    }
}
