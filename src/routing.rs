//! Route enrichment for segment records.
//!
//! A [`RouteResolver`] turns a start/end pair into a routed polyline. The
//! production resolver calls the OpenRouteService directions endpoint; tests
//! plug in their own.

use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

use geo::{Distance, Haversine};
use geojson::{Feature, GeoJson};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::json;

use crate::error::RoutingError;
use crate::point::Coordinate;
use crate::record::{Route, SegmentRecord};

pub const ORS_BASE_URL: &str = "https://api.openrouteservice.org";
pub const DEFAULT_PROFILE: &str = "driving-car";

pub trait RouteResolver {
    fn resolve(&mut self, start: &Coordinate, end: &Coordinate) -> Result<Route, RoutingError>;
}

pub struct OpenRouteService {
    client: Client,
    base_url: String,
    api_key: String,
    profile: String,
    max_retries: u32,
    initial_delay: Duration,
}

impl OpenRouteService {
    pub fn new(api_key: &str, profile: &str) -> Result<Self, RoutingError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: ORS_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            profile: profile.to_string(),
            max_retries: 5,
            initial_delay: Duration::from_secs(1),
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n.max(1);
        self
    }

    fn url(&self) -> String {
        format!("{}/v2/directions/{}/geojson", self.base_url, self.profile)
    }

    fn request(&self, start: &Coordinate, end: &Coordinate) -> Result<Route, RoutingError> {
        let body = json!({
            "coordinates": [[start.lon, start.lat], [end.lon, end.lat]]
        });
        let resp = self
            .client
            .post(self.url())
            .header("Authorization", &self.api_key)
            .header(
                "Accept",
                "application/json, application/geo+json, application/gpx+xml, img/png; charset=utf-8",
            )
            .json(&body)
            .send()?;
        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(RoutingError::RateLimited);
        }
        let text = resp.error_for_status()?.text()?;
        parse_directions(&text, start, end)
    }
}

impl RouteResolver for OpenRouteService {
    /// Retries only when the service answers 429, doubling the delay each time.
    fn resolve(&mut self, start: &Coordinate, end: &Coordinate) -> Result<Route, RoutingError> {
        let mut delay = self.initial_delay;
        let mut attempt = 1;
        loop {
            match self.request(start, end) {
                Err(RoutingError::RateLimited) if attempt < self.max_retries => {
                    log::warn!(
                        "429 from routing service, retrying in {:.2}s (attempt {}/{})",
                        delay.as_secs_f64(),
                        attempt,
                        self.max_retries
                    );
                    thread::sleep(delay);
                    delay *= 2;
                    attempt += 1;
                }
                ret => return ret,
            }
        }
    }
}

/// Extracts the first feature's line and its summary from a directions
/// response. Distance falls back to the haversine length of the line.
pub fn parse_directions(
    body: &str,
    start: &Coordinate,
    end: &Coordinate,
) -> Result<Route, RoutingError> {
    let no_route = || RoutingError::NoRoute {
        start: start.to_string(),
        end: end.to_string(),
    };
    let feature: Feature = match body.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => fc.features.into_iter().next().ok_or_else(no_route)?,
        GeoJson::Feature(f) => f,
        GeoJson::Geometry(_) => return Err(no_route()),
    };

    let path: Vec<Coordinate> = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(geojson::Value::LineString(positions)) => positions
            .iter()
            .filter(|p| p.len() >= 2)
            .map(|p| Coordinate::new(p[0], p[1]))
            .collect(),
        _ => Vec::new(),
    };
    if path.is_empty() {
        return Err(no_route());
    }

    let summary = feature.property("summary");
    let field = |key: &str| summary.and_then(|s| s.get(key)).and_then(|v| v.as_f64());
    let distance_km = field("distance")
        .map(|m| m / 1000f64)
        .unwrap_or_else(|| path_length_km(&path));
    let duration_minutes = field("duration").map(|s| s / 60f64);

    Ok(Route {
        path,
        distance_km: Some(distance_km),
        duration_minutes,
    })
}

pub fn path_length_km(path: &[Coordinate]) -> f64 {
    let meters: f64 = path
        .windows(2)
        .map(|w| Haversine.distance(geo::Point::from(w[0]), geo::Point::from(w[1])))
        .sum();
    meters / 1000f64
}

/// At most `limit` requests in any rolling window. Once the limit is
/// reached, `acquire` sleeps until the oldest request leaves the window.
/// A limit of 0 disables it.
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    sent: VecDeque<Instant>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            sent: VecDeque::new(),
        }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    fn expire(&mut self) {
        while let Some(oldest) = self.sent.front() {
            if oldest.elapsed() < self.window {
                break;
            }
            self.sent.pop_front();
        }
    }

    /// Returns how long it slept.
    pub fn acquire(&mut self) -> Duration {
        if self.limit == 0 {
            return Duration::ZERO;
        }
        let mut waited = Duration::ZERO;
        self.expire();
        while self.sent.len() >= self.limit as usize {
            let Some(oldest) = self.sent.front() else {
                break;
            };
            let pause = self.window.saturating_sub(oldest.elapsed());
            if waited.is_zero() {
                log::info!(
                    "reached {} requests per {:?}, pausing {:.2}s",
                    self.limit,
                    self.window,
                    pause.as_secs_f64()
                );
            }
            thread::sleep(pause);
            waited += pause;
            self.sent.pop_front();
            self.expire();
        }
        self.sent.push_back(Instant::now());
        waited
    }
}

/// Routes every segment. Segments the resolver cannot route are dropped
/// with a warning.
pub fn enrich<R: RouteResolver>(
    records: Vec<SegmentRecord>,
    resolver: &mut R,
    limiter: &mut RateLimiter,
) -> Vec<SegmentRecord> {
    let mut ret = Vec::with_capacity(records.len());
    for mut record in records {
        limiter.acquire();
        log::info!(
            "routing '{}' ({} -> {})",
            record.name,
            record.start,
            record.end
        );
        match resolver.resolve(&record.start, &record.end) {
            Ok(route) => {
                log::info!(
                    "route '{}': {:.2} km, {} points",
                    record.name,
                    route.distance_km.unwrap_or_default(),
                    route.path.len()
                );
                record.route = Some(route);
                ret.push(record);
            }
            Err(e) => log::warn!("skipping route '{}' (row {}): {}", record.name, record.row, e),
        }
    }
    ret
}
