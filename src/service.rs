use anyhow::Result;
use rmcp::{
    handler::server::{wrapper::Parameters, ServerHandler, tool::ToolRouter},
    model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    ErrorData as McpError,
};
use serde::Serialize;
use std::sync::Arc;

use crate::client::{AwdbApi, AwdbClient};
use crate::config::Config;
use crate::constants::{DEFAULT_ELEMENTS, SNOW_DAY_THRESHOLD_IN};
use crate::error::SnotelError;
use crate::formatters::{
    format_recent_conditions, format_snowpack_analysis, format_station_data, format_station_info,
    format_stations,
};
use crate::models::{
    AnalyzeTrendsRequest, ElementCode, FindStationsRequest, RecentConditionsRequest,
    StationDataRequest, StationInfoRequest, StationTriplet,
};
use crate::results::{
    FindStationsResult, LatestReading, Period, RecentConditionsResult, SearchCriteria,
    SnowpackAnalysis, StationDataResult, StationInfoResult,
};
use crate::series::{self, SeriesRequest};
use crate::stations::{self, StationQuery};
use crate::trends::analyze;

/// SNOTEL service that handles MCP requests
#[derive(Clone)]
pub struct Snotel {
    api: Arc<dyn AwdbApi>,
    tool_router: ToolRouter<Self>,
}

/// Turns an operation outcome into a tool result: text plus structured
/// content on success, an `is_error` result with `{kind, message}` otherwise.
fn respond<T: Serialize>(
    operation: &str,
    outcome: Result<(String, T), SnotelError>,
) -> Result<CallToolResult, McpError> {
    match outcome {
        Ok((text, payload)) => {
            let structured = serde_json::to_value(&payload).map_err(|e| {
                McpError::internal_error(format!("Failed to encode {} result: {}", operation, e), None)
            })?;
            let mut result = CallToolResult::success(vec![Content::text(text)]);
            result.structured_content = Some(structured);
            Ok(result)
        }
        Err(err) => {
            tracing::warn!(operation, kind = err.kind(), "{}", err.detailed_message());
            let failure = err.to_failure();
            let structured = serde_json::to_value(&failure).map_err(|e| {
                McpError::internal_error(format!("Failed to encode {} failure: {}", operation, e), None)
            })?;
            let mut result = CallToolResult::error(vec![Content::text(format!(
                "Error in {}: {}",
                operation, failure.message
            ))]);
            result.structured_content = Some(structured);
            Ok(result)
        }
    }
}

impl Snotel {
    /// Creates a service backed by the live AWDB API
    pub fn new(config: &Config) -> Result<Self> {
        let client = AwdbClient::new(config)?;
        Ok(Self::with_api(Arc::new(client)))
    }

    /// Creates a service backed by any AWDB implementation
    pub fn with_api(api: Arc<dyn AwdbApi>) -> Self {
        Self {
            api,
            tool_router: Self::tool_router(),
        }
    }

    async fn find_stations(
        &self,
        request: FindStationsRequest,
    ) -> Result<(String, FindStationsResult), SnotelError> {
        let query = StationQuery::from_input(
            request.state.as_deref(),
            request.latitude,
            request.longitude,
            request.radius_miles,
            &request.network,
        )?;
        let stations = stations::find(self.api.as_ref(), &query).await?;

        let criteria = match query {
            StationQuery::ByState { state, network } => SearchCriteria::State { state, network },
            StationQuery::ByLocation {
                latitude,
                longitude,
                radius_miles,
                network,
            } => SearchCriteria::Location {
                latitude,
                longitude,
                radius_miles,
                network,
            },
        };
        let result = FindStationsResult {
            criteria,
            total: stations.len(),
            stations,
        };
        Ok((format_stations(&result), result))
    }

    async fn station_info(
        &self,
        request: StationInfoRequest,
    ) -> Result<(String, StationInfoResult), SnotelError> {
        let triplet: StationTriplet = request.station_triplet.parse()?;
        let station = stations::find_by_triplet(self.api.as_ref(), &triplet).await?;
        Ok((format_station_info(&station), StationInfoResult { station }))
    }

    async fn station_data(
        &self,
        request: StationDataRequest,
    ) -> Result<(String, StationDataResult), SnotelError> {
        let series_request = SeriesRequest::parse(
            &request.station_triplet,
            &request.start_date,
            &request.end_date,
            request.elements.as_deref(),
            request.duration_name.as_deref(),
        )?;
        let series = series::fetch(self.api.as_ref(), &series_request).await?;

        let result = StationDataResult {
            station_triplet: series.station_triplet.clone(),
            start_date: series_request.start_date.to_string(),
            end_date: series_request.end_date.to_string(),
            duration: series_request.duration,
            elements: series_request.elements,
            record_count: series.len(),
            series,
        };
        Ok((format_station_data(&result), result))
    }

    async fn recent_conditions(
        &self,
        request: RecentConditionsRequest,
    ) -> Result<(String, RecentConditionsResult), SnotelError> {
        let today = chrono::Local::now().date_naive();
        let (window, series) =
            series::fetch_recent(self.api.as_ref(), &request.station_triplet, request.days, today)
                .await?;

        let result = RecentConditionsResult {
            station_triplet: series.station_triplet.clone(),
            days: request.days,
            start_date: window.start_date.to_string(),
            end_date: window.end_date.to_string(),
            record_count: series.len(),
            latest: series.latest().map(|(date, values)| LatestReading {
                date: date.to_string(),
                values: values.clone(),
            }),
            snow_depth: analyze(&series, ElementCode::Snwd, SNOW_DAY_THRESHOLD_IN),
        };
        Ok((format_recent_conditions(&result), result))
    }

    async fn snowpack_trends(
        &self,
        request: AnalyzeTrendsRequest,
    ) -> Result<(String, SnowpackAnalysis), SnotelError> {
        let primary: ElementCode = match request.element.as_deref() {
            Some(code) if !code.trim().is_empty() => code.parse()?,
            _ => ElementCode::Snwd,
        };
        let threshold = request.snow_threshold.unwrap_or(SNOW_DAY_THRESHOLD_IN);
        if !threshold.is_finite() {
            return Err(SnotelError::invalid("snow_threshold must be a finite number"));
        }

        let mut elements: Vec<String> = DEFAULT_ELEMENTS.iter().map(|e| e.to_string()).collect();
        if !DEFAULT_ELEMENTS.contains(&primary) {
            elements.push(primary.to_string());
        }
        let series_request = SeriesRequest::parse(
            &request.station_triplet,
            &request.start_date,
            &request.end_date,
            Some(elements.as_slice()),
            None,
        )?;
        let series = series::fetch(self.api.as_ref(), &series_request).await?;
        if series.is_empty() {
            return Err(SnotelError::NotFound(format!(
                "No measurements found for analysis: {}",
                series.station_triplet
            )));
        }

        let analysis = SnowpackAnalysis {
            station_triplet: series.station_triplet.clone(),
            period: Period {
                start_date: series_request.start_date.to_string(),
                end_date: series_request.end_date.to_string(),
            },
            total_records: series.len(),
            snow_depth_analysis: analyze(&series, primary, threshold),
            swe_analysis: analyze(&series, ElementCode::Wteq, threshold),
            measurements: series,
        };
        Ok((format_snowpack_analysis(&analysis), analysis))
    }
}

#[tool_handler]
impl ServerHandler for Snotel {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "snotel-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                title: None,
                website_url: None,
            },
            instructions: Some(
                "USDA SNOTEL snowpack telemetry from the AWDB REST API. \
                Find stations, read station metadata, fetch snow and weather time series, \
                and analyze snowpack trends."
                    .to_string(),
            ),
        }
    }
}

#[tool_router]
impl Snotel {
    /// Finds SNOTEL stations by state or by location
    #[tool(description = "Find SNOTEL stations by state (e.g. state: 'CO') or by location (latitude, longitude and optional radius_miles, default 50). Network defaults to 'SNTL'.")]
    async fn find_snotel_stations(
        &self,
        Parameters(request): Parameters<FindStationsRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            "Finding stations: state={:?} lat={:?} lon={:?} radius={}",
            request.state,
            request.latitude,
            request.longitude,
            request.radius_miles
        );
        respond("find_snotel_stations", self.find_stations(request).await)
    }

    /// Gets metadata for one station
    #[tool(description = "Get detailed information about a SNOTEL station. Provide the station triplet (e.g. '713:CO:SNTL').")]
    async fn get_station_info(
        &self,
        Parameters(request): Parameters<StationInfoRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!("Getting station info for {}", request.station_triplet);
        respond("get_station_info", self.station_info(request).await)
    }

    /// Gets a normalized time series for a station
    #[tool(description = "Get snow and weather data from a SNOTEL station between start_date and end_date (YYYY-MM-DD). Optional elements (default SNWD, WTEQ, TOBS, PREC) and duration_name (DAILY, HOURLY or MONTHLY; default DAILY).")]
    async fn get_station_data(
        &self,
        Parameters(request): Parameters<StationDataRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            "Getting station data for {} from {} to {}",
            request.station_triplet,
            request.start_date,
            request.end_date
        );
        respond("get_station_data", self.station_data(request).await)
    }

    /// Gets the latest reading and a snow depth summary for recent days
    #[tool(description = "Get recent snow conditions from a SNOTEL station: latest reading plus snow depth maximum, minimum and average over the last `days` days (default 30).")]
    async fn get_recent_conditions(
        &self,
        Parameters(request): Parameters<RecentConditionsRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            "Getting recent conditions for {} over {} days",
            request.station_triplet,
            request.days
        );
        respond("get_recent_conditions", self.recent_conditions(request).await)
    }

    /// Analyzes snowpack trends over a date range
    #[tool(description = "Analyze snowpack trends for a SNOTEL station between start_date and end_date (YYYY-MM-DD): peak snow depth and SWE with dates, averages, days with snow, total new snow, snowfall events and the biggest snowfall day.")]
    async fn analyze_snowpack_trends(
        &self,
        Parameters(request): Parameters<AnalyzeTrendsRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            "Analyzing snowpack trends for {} from {} to {}",
            request.station_triplet,
            request.start_date,
            request.end_date
        );
        respond("analyze_snowpack_trends", self.snowpack_trends(request).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockAwdb;
    use crate::constants::{DATA_PATH, STATIONS_PATH};
    use crate::series::fixtures::data_response;
    use crate::stations::fixtures::colorado_stations;
    use serde_json::{json, Value};

    fn service(api: &Arc<MockAwdb>) -> Snotel {
        Snotel::with_api(api.clone())
    }

    fn structured(result: &CallToolResult) -> &Value {
        result
            .structured_content
            .as_ref()
            .expect("structured content")
    }

    fn text(result: &CallToolResult) -> String {
        result
            .content
            .first()
            .and_then(|content| content.as_text())
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }

    fn is_error(result: &CallToolResult) -> bool {
        result.is_error.unwrap_or(false)
    }

    #[test]
    fn test_all_tools_are_registered() {
        let service = Snotel::with_api(Arc::new(MockAwdb::new()));
        let mut names: Vec<String> = service
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "analyze_snowpack_trends",
                "find_snotel_stations",
                "get_recent_conditions",
                "get_station_data",
                "get_station_info",
            ]
        );
    }

    #[tokio::test]
    async fn test_find_stations_by_state() {
        let api = Arc::new(MockAwdb::new().with_response(STATIONS_PATH, colorado_stations()));
        let request: FindStationsRequest = serde_json::from_value(json!({ "state": "CO" })).unwrap();
        let result = service(&api)
            .find_snotel_stations(Parameters(request))
            .await
            .unwrap();

        assert!(!is_error(&result));
        assert!(text(&result).contains("Found 3 SNOTEL stations in CO"));
        assert!(text(&result).contains("11,080 ft"));
        let body = structured(&result);
        assert_eq!(body["total"], 3);
        assert_eq!(body["criteria"]["mode"], "state");
        assert!(body["stations"]
            .as_array()
            .unwrap()
            .iter()
            .all(|s| s["stateCode"] == "CO"));
    }

    #[tokio::test]
    async fn test_find_stations_without_criteria_fails_before_network() {
        let api = Arc::new(MockAwdb::new().with_response(STATIONS_PATH, colorado_stations()));
        let request: FindStationsRequest =
            serde_json::from_value(json!({ "latitude": 39.1 })).unwrap();
        let result = service(&api)
            .find_snotel_stations(Parameters(request))
            .await
            .unwrap();

        assert!(is_error(&result));
        assert_eq!(structured(&result)["kind"], "invalid_argument");
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_get_station_info() {
        let api = Arc::new(MockAwdb::new().with_response(STATIONS_PATH, colorado_stations()));
        let request = StationInfoRequest {
            station_triplet: "713:CO:SNTL".to_string(),
        };
        let result = service(&api).get_station_info(Parameters(request)).await.unwrap();

        assert!(!is_error(&result));
        let info = text(&result);
        assert!(info.contains("Red Mountain Pass"));
        assert!(info.contains("37.8900, -107.7100"));
        assert!(info.contains("11,080 feet"));
        assert_eq!(structured(&result)["station"]["stationTriplet"], "713:CO:SNTL");
        assert_eq!(api.calls()[0].param("stationTriplets"), Some("713:CO:SNTL"));
    }

    #[tokio::test]
    async fn test_unknown_station_is_not_found() {
        let api = Arc::new(MockAwdb::new().with_response(STATIONS_PATH, json!([])));
        let request = StationInfoRequest {
            station_triplet: "1:CO:SNTL".to_string(),
        };
        let result = service(&api).get_station_info(Parameters(request)).await.unwrap();

        assert!(is_error(&result));
        assert_eq!(structured(&result)["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_malformed_triplet_is_rejected_without_calls() {
        let api = Arc::new(MockAwdb::new());
        let request = StationInfoRequest {
            station_triplet: "713-CO-SNTL".to_string(),
        };
        let result = service(&api).get_station_info(Parameters(request)).await.unwrap();

        assert_eq!(structured(&result)["kind"], "invalid_argument");
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_get_station_data_passes_duration() {
        let api = Arc::new(MockAwdb::new().with_response(
            DATA_PATH,
            data_response(
                "713:CO:SNTL",
                &[
                    ("SNWD", &[("2024-01-01", Some(45.0))]),
                    ("WTEQ", &[("2024-01-01", Some(12.5))]),
                ],
            ),
        ));
        let request: StationDataRequest = serde_json::from_value(json!({
            "station_triplet": "713:CO:SNTL",
            "start_date": "2024-01-01",
            "end_date": "2024-01-01",
            "duration_name": "HOURLY",
        }))
        .unwrap();
        let result = service(&api).get_station_data(Parameters(request)).await.unwrap();

        assert!(!is_error(&result));
        assert_eq!(api.calls()[0].param("duration"), Some("HOURLY"));
        let body = structured(&result);
        assert_eq!(body["duration"], "HOURLY");
        assert_eq!(body["record_count"], 1);
        assert_eq!(body["series"]["records"]["2024-01-01"]["SNWD"], 45.0);
        assert_eq!(body["series"]["records"]["2024-01-01"]["WTEQ"], 12.5);
        assert!(text(&result).contains("713:CO:SNTL"));
    }

    #[tokio::test]
    async fn test_inverted_dates_fail_before_network() {
        let api = Arc::new(MockAwdb::new().with_response(DATA_PATH, json!([])));
        let request: StationDataRequest = serde_json::from_value(json!({
            "station_triplet": "713:CO:SNTL",
            "start_date": "2025-03-31",
            "end_date": "2025-03-01",
        }))
        .unwrap();
        let result = service(&api).get_station_data(Parameters(request)).await.unwrap();

        assert!(is_error(&result));
        assert_eq!(structured(&result)["kind"], "invalid_argument");
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_upstream_errors_become_structured_failures() {
        let api = Arc::new(MockAwdb::new().with_status(DATA_PATH, 503, "maintenance"));
        let request: StationDataRequest = serde_json::from_value(json!({
            "station_triplet": "713:CO:SNTL",
            "start_date": "2025-03-01",
            "end_date": "2025-03-31",
        }))
        .unwrap();
        let result = service(&api).get_station_data(Parameters(request)).await.unwrap();

        assert!(is_error(&result));
        let body = structured(&result);
        assert_eq!(body["kind"], "http");
        assert!(body["message"].as_str().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_analyze_snowpack_trends() {
        let api = Arc::new(MockAwdb::new().with_response(
            DATA_PATH,
            data_response(
                "713:CO:SNTL",
                &[
                    (
                        "SNWD",
                        &[
                            ("2024-01-01", Some(10.0)),
                            ("2024-01-02", Some(12.0)),
                            ("2024-01-03", Some(11.0)),
                            ("2024-01-04", Some(15.0)),
                        ],
                    ),
                    ("WTEQ", &[("2024-01-01", Some(2.5)), ("2024-01-04", Some(3.25))]),
                ],
            ),
        ));
        let request: AnalyzeTrendsRequest = serde_json::from_value(json!({
            "station_triplet": "713:CO:SNTL",
            "start_date": "2024-01-01",
            "end_date": "2024-01-04",
        }))
        .unwrap();
        let result = service(&api)
            .analyze_snowpack_trends(Parameters(request))
            .await
            .unwrap();

        assert!(!is_error(&result));
        let body = structured(&result);
        let depth = &body["snow_depth_analysis"];
        assert_eq!(depth["peak"]["value"], 15.0);
        assert_eq!(depth["peak"]["date"], "2024-01-04");
        assert_eq!(depth["storm_total"], 6.0);
        assert_eq!(depth["days_above_threshold"], 4);
        assert_eq!(body["swe_analysis"]["peak"]["value"], 3.25);
        assert_eq!(body["total_records"], 4);
        assert!(text(&result).contains("Total new snow: 6.0 in"));
    }

    #[tokio::test]
    async fn test_analyze_with_no_measurements_is_not_found() {
        let api = Arc::new(MockAwdb::new().with_response(
            DATA_PATH,
            json!([{ "stationTriplet": "713:CO:SNTL", "data": [] }]),
        ));
        let request: AnalyzeTrendsRequest = serde_json::from_value(json!({
            "station_triplet": "713:CO:SNTL",
            "start_date": "2024-01-01",
            "end_date": "2024-01-31",
        }))
        .unwrap();
        let result = service(&api)
            .analyze_snowpack_trends(Parameters(request))
            .await
            .unwrap();

        assert_eq!(structured(&result)["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_recent_conditions() {
        let today = chrono::Local::now().date_naive();
        let day = |offset: u64| {
            (today - chrono::Days::new(offset))
                .format("%Y-%m-%d")
                .to_string()
        };
        let (d2, d1, d0) = (day(2), day(1), day(0));
        let api = Arc::new(MockAwdb::new().with_response(
            DATA_PATH,
            data_response(
                "713:CO:SNTL",
                &[
                    (
                        "SNWD",
                        &[
                            (d2.as_str(), Some(40.0)),
                            (d1.as_str(), Some(44.0)),
                            (d0.as_str(), Some(42.0)),
                        ],
                    ),
                    ("TOBS", &[(d0.as_str(), Some(18.5))]),
                ],
            ),
        ));
        let request: RecentConditionsRequest =
            serde_json::from_value(json!({ "station_triplet": "713:CO:SNTL", "days": 7 })).unwrap();
        let result = service(&api)
            .get_recent_conditions(Parameters(request))
            .await
            .unwrap();

        assert!(!is_error(&result));
        let body = structured(&result);
        assert_eq!(body["record_count"], 3);
        assert_eq!(body["latest"]["date"], d0.as_str());
        assert_eq!(body["latest"]["values"]["TOBS"], 18.5);
        assert_eq!(body["snow_depth"]["peak"]["value"], 44.0);
        assert_eq!(body["snow_depth"]["minimum"], 40.0);

        let summary = text(&result);
        assert!(summary.contains("Snow Depth: 42.0\""));
        assert!(summary.contains("Maximum: 44.0\""));
        assert_eq!(api.calls()[0].param("endDate"), Some(d0.as_str()));
    }

    #[tokio::test]
    async fn test_recent_conditions_rejects_zero_days() {
        let api = Arc::new(MockAwdb::new());
        let request = RecentConditionsRequest {
            station_triplet: "713:CO:SNTL".to_string(),
            days: 0,
        };
        let result = service(&api)
            .get_recent_conditions(Parameters(request))
            .await
            .unwrap();

        assert_eq!(structured(&result)["kind"], "invalid_argument");
        assert_eq!(api.call_count(), 0);
    }
}
