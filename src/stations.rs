//! Station lookup by state, by location or by exact triplet.

use haversine::{distance, Location as HaversineLocation, Units};
use serde::Serialize;

use crate::client::AwdbApi;
use crate::constants::STATIONS_PATH;
use crate::error::SnotelError;
use crate::models::{Listing, Station, StationTriplet};

/// How to look stations up
#[derive(Debug, Clone, PartialEq)]
pub enum StationQuery {
    ByState {
        state: String,
        network: String,
    },
    ByLocation {
        latitude: f64,
        longitude: f64,
        radius_miles: f64,
        network: String,
    },
}

impl StationQuery {
    /// Picks the search mode from raw tool input. State wins when both a
    /// state and coordinates are given.
    pub fn from_input(
        state: Option<&str>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        radius_miles: f64,
        network: &str,
    ) -> Result<Self, SnotelError> {
        let network = match network.trim() {
            "" => crate::constants::DEFAULT_NETWORK.to_string(),
            code => code.to_uppercase(),
        };

        if let Some(state) = state.map(str::trim).filter(|s| !s.is_empty()) {
            if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(SnotelError::invalid(format!(
                    "State '{}' must be a two-letter code such as 'CO'",
                    state
                )));
            }
            return Ok(Self::ByState {
                state: state.to_uppercase(),
                network,
            });
        }

        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => {
                if !(-90.0..=90.0).contains(&latitude) {
                    return Err(SnotelError::invalid(format!(
                        "Latitude {} is outside [-90, 90]",
                        latitude
                    )));
                }
                if !(-180.0..=180.0).contains(&longitude) {
                    return Err(SnotelError::invalid(format!(
                        "Longitude {} is outside [-180, 180]",
                        longitude
                    )));
                }
                if !radius_miles.is_finite() || radius_miles <= 0.0 {
                    return Err(SnotelError::invalid(format!(
                        "radius_miles must be a positive number, got {}",
                        radius_miles
                    )));
                }
                Ok(Self::ByLocation {
                    latitude,
                    longitude,
                    radius_miles,
                    network,
                })
            }
            _ => Err(SnotelError::invalid(
                "Provide either a state code or both latitude and longitude",
            )),
        }
    }
}

/// A station together with its distance from the query point, if any
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationMatch {
    #[serde(flatten)]
    pub station: Station,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_miles: Option<f64>,
}

/// Great-circle distance in miles
pub fn distance_miles(from: (f64, f64), to: (f64, f64)) -> f64 {
    distance(
        HaversineLocation {
            latitude: from.0,
            longitude: from.1,
        },
        HaversineLocation {
            latitude: to.0,
            longitude: to.1,
        },
        Units::Miles,
    )
}

async fn list_stations(
    api: &dyn AwdbApi,
    query: &[(&str, String)],
) -> Result<Vec<Station>, SnotelError> {
    let body = api.request(STATIONS_PATH, query).await?;
    let listing: Listing<Station> =
        serde_json::from_value(body).map_err(|source| SnotelError::Parse {
            path: STATIONS_PATH.to_string(),
            source,
        })?;
    Ok(listing.into_vec())
}

/// Resolves a query into matching stations.
///
/// State searches keep only stations in that state; location searches keep
/// stations within the radius, nearest first.
pub async fn find(api: &dyn AwdbApi, query: &StationQuery) -> Result<Vec<StationMatch>, SnotelError> {
    match query {
        StationQuery::ByState { state, network } => {
            tracing::info!("Finding {} stations in {}", network, state);
            let stations =
                list_stations(api, &[("stationTriplets", format!("*:{}:{}", state, network))]).await?;

            Ok(stations
                .into_iter()
                .filter(|station| station.state().is_some_and(|s| s.eq_ignore_ascii_case(state)))
                .map(|station| StationMatch {
                    station,
                    distance_miles: None,
                })
                .collect())
        }
        StationQuery::ByLocation {
            latitude,
            longitude,
            radius_miles,
            network,
        } => {
            tracing::info!(
                "Finding {} stations within {} miles of {}, {}",
                network,
                radius_miles,
                latitude,
                longitude
            );
            let stations = list_stations(
                api,
                &[
                    ("networks", network.clone()),
                    ("latitude", latitude.to_string()),
                    ("longitude", longitude.to_string()),
                    ("radius", radius_miles.to_string()),
                    ("logicalAnd", "true".to_string()),
                ],
            )
            .await?;

            let origin = (*latitude, *longitude);
            let mut matches: Vec<StationMatch> = stations
                .into_iter()
                .filter_map(|station| {
                    let miles = distance_miles(origin, station.coordinates()?);
                    (miles <= *radius_miles).then_some(StationMatch {
                        station,
                        distance_miles: Some(miles),
                    })
                })
                .collect();

            matches.sort_by(|a, b| {
                let da = a.distance_miles.unwrap_or(f64::INFINITY);
                let db = b.distance_miles.unwrap_or(f64::INFINITY);
                da.total_cmp(&db)
                    .then_with(|| a.station.station_triplet.cmp(&b.station.station_triplet))
            });
            tracing::debug!("{} stations within radius", matches.len());
            Ok(matches)
        }
    }
}

/// Looks up one station by its exact triplet.
pub async fn find_by_triplet(api: &dyn AwdbApi, triplet: &StationTriplet) -> Result<Station, SnotelError> {
    let wanted = triplet.to_string();
    tracing::info!("Looking up station {}", wanted);

    list_stations(api, &[("stationTriplets", wanted.clone())])
        .await?
        .into_iter()
        .find(|station| station.station_triplet.eq_ignore_ascii_case(&wanted))
        .ok_or_else(|| SnotelError::NotFound(format!("Station {} not found", wanted)))
}
