use crate::constants::MAX_LISTED_STATIONS;
use crate::models::{ElementCode, Station};
use crate::results::{
    FindStationsResult, RecentConditionsResult, SearchCriteria, SnowpackAnalysis,
    StationDataResult,
};
use crate::trends::TrendSummary;

/// Formats a station search into a human-readable listing
pub fn format_stations(result: &FindStationsResult) -> String {
    if result.stations.is_empty() {
        return "No SNOTEL stations found with the given criteria.".to_string();
    }

    let mut output = format!("Found {} SNOTEL stations", result.total);
    match &result.criteria {
        SearchCriteria::State { state, .. } => output.push_str(&format!(" in {}", state)),
        SearchCriteria::Location {
            latitude,
            longitude,
            radius_miles,
            ..
        } => output.push_str(&format!(
            " within {} miles of ({}, {})",
            radius_miles, latitude, longitude
        )),
    }
    output.push_str(":\n\n");

    for entry in result.stations.iter().take(MAX_LISTED_STATIONS) {
        let station = &entry.station;
        output.push_str(&format!(
            "\u{2022} **{}** ({})\n",
            station.display_name(),
            station.station_triplet
        ));
        if let Some((lat, lon)) = station.coordinates() {
            output.push_str(&format!("  Location: {:.4}, {:.4}\n", lat, lon));
        }
        if let Some(elevation) = station.elevation {
            output.push_str(&format!("  Elevation: {} ft\n", format_thousands(elevation)));
        }
        if let Some(county) = station.county_name.as_deref().filter(|c| !c.is_empty()) {
            output.push_str(&format!("  County: {}\n", county));
        }
        if let Some(miles) = entry.distance_miles {
            output.push_str(&format!("  Distance: {:.1} miles\n", miles));
        }
        output.push('\n');
    }

    if result.stations.len() > MAX_LISTED_STATIONS {
        output.push_str(&format!(
            "... and {} more stations\n",
            result.stations.len() - MAX_LISTED_STATIONS
        ));
    }
    output
}

/// Formats station metadata
pub fn format_station_info(station: &Station) -> String {
    let mut output = format!(
        "**{}** ({})\n\n",
        station.display_name(),
        station.station_triplet
    );
    if let Some((lat, lon)) = station.coordinates() {
        output.push_str(&format!("\u{2022} **Location**: {:.4}, {:.4}\n", lat, lon));
    }
    if let Some(elevation) = station.elevation {
        output.push_str(&format!(
            "\u{2022} **Elevation**: {} feet\n",
            format_thousands(elevation)
        ));
    }
    if let Some(state) = station.state() {
        output.push_str(&format!("\u{2022} **State**: {}\n", state));
    }
    if let Some(network) = station.network() {
        output.push_str(&format!("\u{2022} **Network**: {}\n", network));
    }
    if let Some(county) = station.county_name.as_deref().filter(|c| !c.is_empty()) {
        output.push_str(&format!("\u{2022} **County**: {}\n", county));
    }
    output
}

/// Renders a fetched series as a short header plus pretty JSON
pub fn format_station_data(result: &StationDataResult) -> String {
    let elements: Vec<&str> = result.elements.iter().map(|e| e.code()).collect();
    let mut output = format!(
        "{} data for {} from {} to {} ({} records, elements: {})\n\n",
        result.duration,
        result.station_triplet,
        result.start_date,
        result.end_date,
        result.record_count,
        elements.join(", ")
    );
    if result.series.is_empty() {
        output.push_str("No readings were reported for this period.\n");
        return output;
    }
    match serde_json::to_string_pretty(&result.series) {
        Ok(json) => output.push_str(&json),
        Err(e) => output.push_str(&format!("Failed to render series: {}\n", e)),
    }
    output
}

/// Formats the latest reading and the snow depth summary for a recent window
pub fn format_recent_conditions(result: &RecentConditionsResult) -> String {
    let mut output = format!(
        "**Recent Conditions: {}**\nLast {} days ({} records)\n\n",
        result.station_triplet, result.days, result.record_count
    );

    match &result.latest {
        Some(latest) => {
            output.push_str(&format!("**Latest Reading ({})**:\n", latest.date));
            let get = |element: ElementCode| latest.values.get(&element);
            if let Some(depth) = get(ElementCode::Snwd) {
                output.push_str(&format!("\u{2022} Snow Depth: {:.1}\"\n", depth));
            }
            if let Some(swe) = get(ElementCode::Wteq) {
                output.push_str(&format!("\u{2022} Snow Water Equivalent: {:.1}\"\n", swe));
            }
            if let Some(temp) = get(ElementCode::Tobs) {
                output.push_str(&format!("\u{2022} Temperature: {:.1}\u{00b0}F\n", temp));
            }
            if let Some(precip) = get(ElementCode::Prec) {
                output.push_str(&format!("\u{2022} Recent Precipitation: {:.2}\"\n", precip));
            }
        }
        None => output.push_str("No measurements reported in this window.\n"),
    }

    let depth = &result.snow_depth;
    if let (Some(peak), Some(minimum), Some(average)) = (&depth.peak, depth.minimum, depth.average) {
        output.push_str(&format!("\n**{}-Day Snow Depth Summary**:\n", result.days));
        output.push_str(&format!("\u{2022} Maximum: {:.1}\"\n", peak.value));
        output.push_str(&format!("\u{2022} Minimum: {:.1}\"\n", minimum));
        output.push_str(&format!("\u{2022} Average: {:.1}\"\n", average));
    }
    output
}

/// Formats a snowpack analysis as sections for depth, SWE and snowfall
pub fn format_snowpack_analysis(analysis: &SnowpackAnalysis) -> String {
    let mut output = format!(
        "**Snowpack Analysis: {}**\nPeriod: {} to {} ({} records)\n\n",
        analysis.station_triplet,
        analysis.period.start_date,
        analysis.period.end_date,
        analysis.total_records
    );

    output.push_str(&format_element_section(&analysis.snow_depth_analysis, 1));
    output.push_str(&format_element_section(&analysis.swe_analysis, 2));

    let depth = &analysis.snow_depth_analysis;
    let unit = depth.unit.as_deref().unwrap_or("in");
    output.push_str("\n**Snowfall**:\n");
    match &depth.biggest_event {
        Some(biggest) => {
            output.push_str(&format!(
                "\u{2022} Total new snow: {:.1} {}\n",
                depth.storm_total, unit
            ));
            output.push_str(&format!(
                "\u{2022} Snowfall days: {}\n",
                depth.snowfall_events.len()
            ));
            output.push_str(&format!(
                "\u{2022} Biggest day: {:.1} {} on {}\n",
                biggest.amount, unit, biggest.date
            ));
            if let Some(average) = depth.average_per_event {
                output.push_str(&format!(
                    "\u{2022} Average per snowfall day: {:.1} {}\n",
                    average, unit
                ));
            }
        }
        None => output.push_str("\u{2022} No new snow recorded\n"),
    }
    output
}

fn format_element_section(summary: &TrendSummary, precision: usize) -> String {
    let unit = summary.unit.as_deref().unwrap_or("in");
    let mut output = format!("\n**{} ({})**:\n", summary.element.label(), summary.element);

    let Some(peak) = &summary.peak else {
        output.push_str("\u{2022} No observations\n");
        return output;
    };
    output.push_str(&format!(
        "\u{2022} Peak: {:.*} {} on {}\n",
        precision, peak.value, unit, peak.date
    ));
    if let Some(average) = summary.average {
        output.push_str(&format!("\u{2022} Average: {:.*} {}\n", precision, average, unit));
    }
    output.push_str(&format!(
        "\u{2022} Days above {} {}: {} of {}\n",
        summary.snow_threshold, unit, summary.days_above_threshold, summary.observations
    ));
    output
}

/// Rounds to a whole number and inserts thousands separators (11080 -> "11,080")
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        grouped.insert(0, '-');
    }
    grouped
}
