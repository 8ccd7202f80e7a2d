use crate::models::ElementCode;

/// User agent string for HTTP requests
pub const USER_AGENT: &str = "snotel-mcp-server/0.1.0";

/// AWDB REST API base URL
pub const AWDB_API_BASE: &str = "https://wcc.sc.egov.usda.gov/awdbRestApi";

/// Station metadata endpoint, relative to the API base
pub const STATIONS_PATH: &str = "services/v1/stations";

/// Time-series endpoint, relative to the API base
pub const DATA_PATH: &str = "services/v1/data";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_NETWORK: &str = "SNTL";

pub const DEFAULT_RADIUS_MILES: f64 = 50.0;

pub const DEFAULT_RECENT_DAYS: u32 = 30;

/// Elements requested when the caller does not name any
pub const DEFAULT_ELEMENTS: [ElementCode; 4] = [
    ElementCode::Snwd,
    ElementCode::Wteq,
    ElementCode::Tobs,
    ElementCode::Prec,
];

/// Snow depth (inches) a reading must exceed to count as a snow day
pub const SNOW_DAY_THRESHOLD_IN: f64 = 0.0;

/// Stations rendered in text before the listing is truncated
pub const MAX_LISTED_STATIONS: usize = 20;
