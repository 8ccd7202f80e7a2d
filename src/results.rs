use serde::Serialize;

use crate::models::{Duration, ElementCode, Station};
use crate::series::{Record, Series};
use crate::stations::StationMatch;
use crate::trends::TrendSummary;

// ============================================================================
// MCP Tool Result Models
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SearchCriteria {
    State {
        state: String,
        network: String,
    },
    Location {
        latitude: f64,
        longitude: f64,
        radius_miles: f64,
        network: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct FindStationsResult {
    pub criteria: SearchCriteria,
    pub total: usize,
    pub stations: Vec<StationMatch>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StationInfoResult {
    pub station: Station,
}

#[derive(Debug, Clone, Serialize)]
pub struct StationDataResult {
    pub station_triplet: String,
    pub start_date: String,
    pub end_date: String,
    pub duration: Duration,
    pub elements: Vec<ElementCode>,
    pub record_count: usize,
    pub series: Series,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatestReading {
    pub date: String,
    pub values: Record,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentConditionsResult {
    pub station_triplet: String,
    pub days: u32,
    pub start_date: String,
    pub end_date: String,
    pub record_count: usize,
    pub latest: Option<LatestReading>,
    pub snow_depth: TrendSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct Period {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnowpackAnalysis {
    pub station_triplet: String,
    pub period: Period,
    pub total_records: usize,
    /// Primary element, snow depth unless the caller picked another
    pub snow_depth_analysis: TrendSummary,
    pub swe_analysis: TrendSummary,
    pub measurements: Series,
}
