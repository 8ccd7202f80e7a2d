//! Normalized time series and the fetcher that builds them from AWDB.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::client::AwdbApi;
use crate::constants::{DATA_PATH, DEFAULT_ELEMENTS};
use crate::error::SnotelError;
use crate::models::{Duration, ElementCode, Listing, Reading, StationDataResponse, StationTriplet};

/// Values recorded at one timestamp, keyed by element
pub type Record = BTreeMap<ElementCode, f64>;

/// Readings for one station at one duration, ordered by date.
///
/// A date missing an element simply has no entry for it; absence is never
/// folded into zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub station_triplet: String,
    pub duration: Duration,
    pub units: BTreeMap<ElementCode, String>,
    pub records: BTreeMap<String, Record>,
}

impl Series {
    pub fn new(station_triplet: impl Into<String>, duration: Duration) -> Self {
        Self {
            station_triplet: station_triplet.into(),
            duration,
            units: BTreeMap::new(),
            records: BTreeMap::new(),
        }
    }

    pub fn from_readings(
        station_triplet: impl Into<String>,
        duration: Duration,
        readings: impl IntoIterator<Item = Reading>,
    ) -> Self {
        let mut series = Self::new(station_triplet, duration);
        for reading in readings {
            series.insert(reading);
        }
        series
    }

    /// Adds a reading. A collision on (date, element) keeps the larger value,
    /// a unit collision keeps the lexicographically smaller unit.
    pub fn insert(&mut self, reading: Reading) {
        if let Some(unit) = reading.unit {
            let slot = self.units.entry(reading.element).or_insert_with(|| unit.clone());
            if unit < *slot {
                *slot = unit;
            }
        }
        let slot = self
            .records
            .entry(reading.date)
            .or_default()
            .entry(reading.element)
            .or_insert(reading.value);
        if reading.value > *slot {
            *slot = reading.value;
        }
    }

    /// Merges two series of the same station; independent of argument order.
    pub fn merge(mut self, other: Series) -> Series {
        for reading in other.readings() {
            self.insert(reading);
        }
        self
    }

    /// Splits into one series per element present
    #[cfg(test)]
    pub fn split_by_element(&self) -> BTreeMap<ElementCode, Series> {
        let mut parts: BTreeMap<ElementCode, Series> = BTreeMap::new();
        for reading in self.readings() {
            parts
                .entry(reading.element)
                .or_insert_with(|| Series::new(self.station_triplet.clone(), self.duration))
                .insert(reading);
        }
        parts
    }

    /// All readings in (date, element) order
    pub fn readings(&self) -> Vec<Reading> {
        self.records
            .iter()
            .flat_map(|(date, record)| {
                record.iter().map(move |(element, value)| Reading {
                    element: *element,
                    date: date.clone(),
                    value: *value,
                    unit: self.units.get(element).cloned(),
                })
            })
            .collect()
    }

    /// Present values of one element in date order
    pub fn values(&self, element: ElementCode) -> Vec<(&str, f64)> {
        self.records
            .iter()
            .filter_map(|(date, record)| record.get(&element).map(|v| (date.as_str(), *v)))
            .collect()
    }

    /// Most recent record that has at least one value
    pub fn latest(&self) -> Option<(&str, &Record)> {
        self.records
            .iter()
            .rev()
            .find(|(_, record)| !record.is_empty())
            .map(|(date, record)| (date.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Validated parameters for a series request
#[derive(Debug, Clone)]
pub struct SeriesRequest {
    pub triplet: StationTriplet,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub elements: Vec<ElementCode>,
    pub duration: Duration,
}

impl SeriesRequest {
    /// Parses and checks raw tool input without touching the network.
    pub fn parse(
        station_triplet: &str,
        start_date: &str,
        end_date: &str,
        elements: Option<&[String]>,
        duration: Option<&str>,
    ) -> Result<Self, SnotelError> {
        let triplet: StationTriplet = station_triplet.parse()?;
        let start_date = parse_date("start_date", start_date)?;
        let end_date = parse_date("end_date", end_date)?;
        if start_date > end_date {
            return Err(SnotelError::invalid(format!(
                "start_date {} is after end_date {}",
                start_date, end_date
            )));
        }

        let elements = match elements {
            Some(codes) if !codes.is_empty() => {
                let mut parsed = Vec::with_capacity(codes.len());
                for code in codes {
                    let element: ElementCode = code.parse()?;
                    if !parsed.contains(&element) {
                        parsed.push(element);
                    }
                }
                parsed
            }
            _ => DEFAULT_ELEMENTS.to_vec(),
        };

        let duration = match duration {
            Some(name) if !name.trim().is_empty() => name.parse()?,
            _ => Duration::default(),
        };

        Ok(Self {
            triplet,
            start_date,
            end_date,
            elements,
            duration,
        })
    }

    /// Window of `days` ending on `today`, default elements, daily values
    pub fn recent(station_triplet: &str, days: u32, today: NaiveDate) -> Result<Self, SnotelError> {
        let triplet: StationTriplet = station_triplet.parse()?;
        if days == 0 {
            return Err(SnotelError::invalid("days must be at least 1"));
        }
        let start_date = today
            .checked_sub_days(Days::new(u64::from(days)))
            .ok_or_else(|| SnotelError::invalid(format!("days value {} is out of range", days)))?;

        Ok(Self {
            triplet,
            start_date,
            end_date: today,
            elements: DEFAULT_ELEMENTS.to_vec(),
            duration: Duration::Daily,
        })
    }

    fn contains(&self, date: &str) -> bool {
        // Hourly stamps look like "2024-01-01 01:00"; the day prefix decides.
        date.get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
            .is_some_and(|day| day >= self.start_date && day <= self.end_date)
    }
}

pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, SnotelError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        SnotelError::invalid(format!(
            "{} '{}' is not a valid date (expected YYYY-MM-DD)",
            field, value
        ))
    })
}

/// Fetches and normalizes a series for a validated request.
pub async fn fetch(api: &dyn AwdbApi, request: &SeriesRequest) -> Result<Series, SnotelError> {
    let triplet = request.triplet.to_string();
    let elements = request
        .elements
        .iter()
        .map(|e| e.code())
        .collect::<Vec<_>>()
        .join(",");

    tracing::info!(
        "Fetching {} {} data for {} from {} to {}",
        request.duration,
        elements,
        triplet,
        request.start_date,
        request.end_date
    );

    let query = [
        ("stationTriplets", triplet.clone()),
        ("elements", elements),
        ("beginDate", request.start_date.format("%Y-%m-%d").to_string()),
        ("endDate", request.end_date.format("%Y-%m-%d").to_string()),
        ("ordinal", "1".to_string()),
        ("duration", request.duration.name().to_string()),
    ];

    let body = api.request(DATA_PATH, &query).await?;
    let listing: Listing<StationDataResponse> =
        serde_json::from_value(body).map_err(|source| SnotelError::Parse {
            path: DATA_PATH.to_string(),
            source,
        })?;

    let station = listing
        .into_vec()
        .into_iter()
        .find(|entry| entry.station_triplet.eq_ignore_ascii_case(&triplet))
        .ok_or_else(|| {
            SnotelError::NotFound(format!(
                "No data found for {} from {} to {}",
                triplet, request.start_date, request.end_date
            ))
        })?;

    let mut series = Series::new(triplet, request.duration);
    for element_data in station.data {
        let code = &element_data.station_element.element_code;
        let element: ElementCode = match code.parse() {
            Ok(element) => element,
            Err(_) => {
                tracing::debug!("Skipping unsupported element {}", code);
                continue;
            }
        };
        let unit = element_data.station_element.stored_unit_code;

        let part = Series::from_readings(
            series.station_triplet.clone(),
            request.duration,
            element_data
                .values
                .into_iter()
                .filter(|v| request.contains(&v.date))
                .filter_map(|v| {
                    Some(Reading {
                        element,
                        value: v.value?,
                        date: v.date,
                        unit: unit.clone(),
                    })
                }),
        );
        series = series.merge(part);
    }

    Ok(series)
}

/// Convenience wrapper for the last `days` days up to `today`.
pub async fn fetch_recent(
    api: &dyn AwdbApi,
    station_triplet: &str,
    days: u32,
    today: NaiveDate,
) -> Result<(SeriesRequest, Series), SnotelError> {
    let request = SeriesRequest::recent(station_triplet, days, today)?;
    let series = fetch(api, &request).await?;
    Ok((request, series))
}
