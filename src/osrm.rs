//! OSRM HTTP adapter for per-mode travel times.

use serde::Deserialize;

use crate::error::OracleError;
use crate::model::TravelMode;
use crate::traits::TravelTimeOracle;

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub walk_profile: String,
    /// OSRM has no transit routing; the car profile approximates it.
    pub transit_profile: String,
    pub drive_profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            walk_profile: "foot".to_string(),
            transit_profile: "car".to_string(),
            drive_profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

impl OsrmConfig {
    pub fn profile(&self, mode: TravelMode) -> &str {
        match mode {
            TravelMode::Walk => &self.walk_profile,
            TravelMode::Transit => &self.transit_profile,
            TravelMode::Drive => &self.drive_profile,
        }
    }

    pub fn route_url(&self, from: (f64, f64), to: (f64, f64), mode: TravelMode) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=false",
            self.base_url.trim_end_matches('/'),
            self.profile(mode),
            from.1,
            from.0,
            to.1,
            to.0
        )
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OsrmConfig {
        &self.config
    }
}

impl TravelTimeOracle for OsrmClient {
    fn travel_minutes(
        &self,
        from: (f64, f64),
        to: (f64, f64),
        mode: TravelMode,
    ) -> Result<u32, OracleError> {
        let url = self.config.route_url(from, to, mode);

        let body = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<OsrmRouteResponse>())?;

        route_minutes(body, mode)
    }
}

fn route_minutes(body: OsrmRouteResponse, mode: TravelMode) -> Result<u32, OracleError> {
    if body.code != "Ok" {
        return Err(OracleError::Unavailable {
            mode,
            reason: body.code,
        });
    }

    body.routes
        .first()
        .map(|route| (route.duration / 60.0).round() as u32)
        .ok_or(OracleError::NoRoute { mode })
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Seconds.
    duration: f64,
}
