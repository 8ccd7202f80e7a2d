//! Snowpack statistics over a normalized series.

use serde::Serialize;

use crate::models::ElementCode;
use crate::series::Series;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Peak {
    pub value: f64,
    pub date: String,
}

/// Day-over-day increase between two consecutive present readings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnowfallEvent {
    pub date: String,
    pub amount: f64,
}

/// Aggregate over one element of a series. Built fresh for every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub element: ElementCode,
    pub unit: Option<String>,
    pub observations: usize,
    pub peak: Option<Peak>,
    pub minimum: Option<f64>,
    pub average: Option<f64>,
    /// Sum of positive deltas; melt and settling never subtract.
    pub storm_total: f64,
    pub days_above_threshold: usize,
    pub snow_threshold: f64,
    pub snowfall_events: Vec<SnowfallEvent>,
    pub biggest_event: Option<SnowfallEvent>,
    pub average_per_event: Option<f64>,
}

/// Summarizes `element` over `series`.
///
/// Missing dates are skipped entirely: they count toward neither the mean
/// nor the threshold days, and deltas are taken between the readings that
/// are present.
pub fn analyze(series: &Series, element: ElementCode, snow_threshold: f64) -> TrendSummary {
    let values = series.values(element);

    let mut peak: Option<Peak> = None;
    let mut minimum: Option<f64> = None;
    let mut sum = 0.0;
    let mut days_above_threshold = 0;
    let mut snowfall_events = Vec::new();
    let mut previous: Option<f64> = None;

    for &(date, value) in &values {
        // Strictly greater keeps the earliest date on ties.
        if peak.as_ref().map_or(true, |p| value > p.value) {
            peak = Some(Peak {
                value,
                date: date.to_string(),
            });
        }
        minimum = Some(minimum.map_or(value, |m: f64| m.min(value)));
        sum += value;
        if value > snow_threshold {
            days_above_threshold += 1;
        }
        if let Some(prev) = previous {
            if value > prev {
                snowfall_events.push(SnowfallEvent {
                    date: date.to_string(),
                    amount: value - prev,
                });
            }
        }
        previous = Some(value);
    }

    let storm_total: f64 = snowfall_events.iter().map(|e| e.amount).sum();
    let biggest_event = snowfall_events
        .iter()
        .fold(None::<&SnowfallEvent>, |best, event| match best {
            Some(b) if b.amount >= event.amount => Some(b),
            _ => Some(event),
        })
        .cloned();
    let average_per_event =
        (!snowfall_events.is_empty()).then(|| storm_total / snowfall_events.len() as f64);

    TrendSummary {
        element,
        unit: series.units.get(&element).cloned(),
        observations: values.len(),
        peak,
        minimum,
        average: (!values.is_empty()).then(|| sum / values.len() as f64),
        storm_total,
        days_above_threshold,
        snow_threshold,
        snowfall_events,
        biggest_event,
        average_per_event,
    }
}
