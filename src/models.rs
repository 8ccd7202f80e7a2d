use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_NETWORK, DEFAULT_RADIUS_MILES, DEFAULT_RECENT_DAYS};
use crate::error::SnotelError;

// ============================================================================
// AWDB API Models
// ============================================================================

/// AWDB list endpoints answer either with a bare array or with the array
/// wrapped under `stations`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(default = "Vec::new")]
        stations: Vec<T>,
    },
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) => items,
            Listing::Wrapped { stations } => stations,
        }
    }
}

/// Station metadata as published by AWDB
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub station_triplet: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "state")]
    pub state_code: Option<String>,
    #[serde(default, alias = "networkCd")]
    pub network_code: Option<String>,
    #[serde(default)]
    pub county_name: Option<String>,
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Station {
    /// State code, falling back to the state part of the triplet
    pub fn state(&self) -> Option<&str> {
        self.state_code
            .as_deref()
            .or_else(|| self.station_triplet.split(':').nth(1))
    }

    /// Network code, falling back to the network part of the triplet
    pub fn network(&self) -> Option<&str> {
        self.network_code
            .as_deref()
            .or_else(|| self.station_triplet.split(':').nth(2))
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationDataResponse {
    pub station_triplet: String,
    #[serde(default)]
    pub data: Vec<ElementData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementData {
    pub station_element: StationElement,
    #[serde(default)]
    pub values: Vec<DataValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationElement {
    pub element_code: String,
    #[serde(default)]
    pub stored_unit_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DataValue {
    pub date: String,
    #[serde(default)]
    pub value: Option<f64>,
}

// ============================================================================
// Domain Types
// ============================================================================

/// Validated `<id>:<state>:<network>` station identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationTriplet {
    pub id: String,
    pub state: String,
    pub network: String,
}

impl FromStr for StationTriplet {
    type Err = SnotelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').map(str::trim).collect();
        match parts.as_slice() {
            [id, state, network] if !id.is_empty() && !state.is_empty() && !network.is_empty() => {
                Ok(Self {
                    id: id.to_string(),
                    state: state.to_uppercase(),
                    network: network.to_uppercase(),
                })
            }
            _ => Err(SnotelError::invalid(format!(
                "Invalid station triplet '{}'. Expected format: 'id:state:network' (e.g. '713:CO:SNTL')",
                s
            ))),
        }
    }
}

impl fmt::Display for StationTriplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.id, self.state, self.network)
    }
}

/// Element codes understood by this server
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElementCode {
    /// Snow depth
    Snwd,
    /// Snow water equivalent
    Wteq,
    /// Observed air temperature
    Tobs,
    /// Accumulated precipitation
    Prec,
    /// Precipitation increment
    Prcp,
    Tmax,
    Tmin,
    Tavg,
}

impl ElementCode {
    pub const ALL: [ElementCode; 8] = [
        ElementCode::Snwd,
        ElementCode::Wteq,
        ElementCode::Tobs,
        ElementCode::Prec,
        ElementCode::Prcp,
        ElementCode::Tmax,
        ElementCode::Tmin,
        ElementCode::Tavg,
    ];

    pub fn code(self) -> &'static str {
        match self {
            ElementCode::Snwd => "SNWD",
            ElementCode::Wteq => "WTEQ",
            ElementCode::Tobs => "TOBS",
            ElementCode::Prec => "PREC",
            ElementCode::Prcp => "PRCP",
            ElementCode::Tmax => "TMAX",
            ElementCode::Tmin => "TMIN",
            ElementCode::Tavg => "TAVG",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ElementCode::Snwd => "Snow Depth",
            ElementCode::Wteq => "Snow Water Equivalent",
            ElementCode::Tobs => "Observed Temperature",
            ElementCode::Prec => "Precipitation Accumulation",
            ElementCode::Prcp => "Precipitation Increment",
            ElementCode::Tmax => "Maximum Temperature",
            ElementCode::Tmin => "Minimum Temperature",
            ElementCode::Tavg => "Average Temperature",
        }
    }
}

impl FromStr for ElementCode {
    type Err = SnotelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        ElementCode::ALL
            .into_iter()
            .find(|code| code.code() == wanted)
            .ok_or_else(|| {
                SnotelError::invalid(format!(
                    "Unknown element code '{}'. Supported: SNWD, WTEQ, TOBS, PREC, PRCP, TMAX, TMIN, TAVG",
                    s
                ))
            })
    }
}

impl fmt::Display for ElementCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Temporal granularity of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Duration {
    #[default]
    Daily,
    Hourly,
    Monthly,
}

impl Duration {
    pub fn name(self) -> &'static str {
        match self {
            Duration::Daily => "DAILY",
            Duration::Hourly => "HOURLY",
            Duration::Monthly => "MONTHLY",
        }
    }
}

impl FromStr for Duration {
    type Err = SnotelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DAILY" => Ok(Duration::Daily),
            "HOURLY" => Ok(Duration::Hourly),
            "MONTHLY" => Ok(Duration::Monthly),
            _ => Err(SnotelError::invalid(format!(
                "Unknown duration '{}'. Expected DAILY, HOURLY or MONTHLY",
                s
            ))),
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single measurement for one element at one timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub element: ElementCode,
    pub date: String,
    pub value: f64,
    pub unit: Option<String>,
}

// ============================================================================
// MCP Tool Request Models
// ============================================================================

fn default_radius_miles() -> f64 {
    DEFAULT_RADIUS_MILES
}

fn default_network() -> String {
    DEFAULT_NETWORK.to_string()
}

fn default_recent_days() -> u32 {
    DEFAULT_RECENT_DAYS
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct FindStationsRequest {
    #[schemars(description = "Two-letter state code (e.g. 'CO', 'MT')")]
    #[serde(default)]
    pub state: Option<String>,
    #[schemars(description = "Latitude for a location-based search")]
    #[serde(default)]
    pub latitude: Option<f64>,
    #[schemars(description = "Longitude for a location-based search")]
    #[serde(default)]
    pub longitude: Option<f64>,
    #[schemars(description = "Search radius in miles (default 50)")]
    #[serde(default = "default_radius_miles")]
    pub radius_miles: f64,
    #[schemars(description = "Network code (default 'SNTL')")]
    #[serde(default = "default_network")]
    pub network: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct StationInfoRequest {
    #[schemars(description = "Station identifier, e.g. '713:CO:SNTL'")]
    pub station_triplet: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct StationDataRequest {
    #[schemars(description = "Station identifier, e.g. '713:CO:SNTL'")]
    pub station_triplet: String,
    #[schemars(description = "Start date (YYYY-MM-DD)")]
    pub start_date: String,
    #[schemars(description = "End date (YYYY-MM-DD)")]
    pub end_date: String,
    #[schemars(description = "Element codes to retrieve (default: SNWD, WTEQ, TOBS, PREC)")]
    #[serde(default)]
    pub elements: Option<Vec<String>>,
    #[schemars(description = "Duration of measurements: DAILY (default), HOURLY or MONTHLY")]
    #[serde(default, alias = "duration")]
    pub duration_name: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct RecentConditionsRequest {
    #[schemars(description = "Station identifier, e.g. '713:CO:SNTL'")]
    pub station_triplet: String,
    #[schemars(description = "Number of recent days (default 30)")]
    #[serde(default = "default_recent_days")]
    pub days: u32,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct AnalyzeTrendsRequest {
    #[schemars(description = "Station identifier, e.g. '713:CO:SNTL'")]
    pub station_triplet: String,
    #[schemars(description = "Start date (YYYY-MM-DD)")]
    pub start_date: String,
    #[schemars(description = "End date (YYYY-MM-DD)")]
    pub end_date: String,
    #[schemars(description = "Primary element to analyze (default SNWD)")]
    #[serde(default)]
    pub element: Option<String>,
    #[schemars(description = "Depth in inches a day must exceed to count as a snow day (default 0)")]
    #[serde(default)]
    pub snow_threshold: Option<f64>,
}
