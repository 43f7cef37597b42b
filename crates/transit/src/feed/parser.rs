//! Row and feed parsing.
//!
//! [`parse_line`] is a total function: every line either becomes a
//! [`StopRecord`] or a [`Rejection`]. [`parse_feed`] folds a whole feed
//! through it, counting rejections instead of failing.

use crate::feed::format::FeedFormat;
use crate::identifiers::{RouteIdentifier, StopIdentifier};
use crate::models::{Coordinate, Rejection, StopRecord};

/// Parse a single feed row
pub fn parse_line(line: &str, format: &FeedFormat) -> Result<StopRecord, Rejection> {
    let fields: Vec<&str> = line.split(format.delimiter).collect();

    let required = format.min_columns();
    if fields.len() < required {
        return Err(Rejection::MalformedRow(format!(
            "expected at least {} fields, found {}",
            required,
            fields.len()
        )));
    }

    let route = clean(fields[format.route_column]);
    if route.is_empty() {
        return Err(Rejection::MalformedRow("empty route id".into()));
    }

    let latitude = parse_degrees(fields[format.latitude_column], "latitude")?;
    let longitude = parse_degrees(fields[format.longitude_column], "longitude")?;
    let coordinate = Coordinate::new(latitude, longitude)
        .map_err(|e| Rejection::InvalidCoordinate(e.to_string()))?;

    let mut record = StopRecord::new(RouteIdentifier::new(route), coordinate);
    if let Some(stop) = format.stop_column.map(|column| clean(fields[column])) {
        if !stop.is_empty() {
            record = record.with_stop_id(StopIdentifier::new(stop));
        }
    }

    Ok(record)
}

/// Outcome of parsing an entire feed
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedFeed {
    pub records: Vec<StopRecord>,
    pub malformed_rows: usize,
    pub invalid_coordinates: usize,
}

impl ParsedFeed {
    pub fn rejected(&self) -> usize {
        self.malformed_rows + self.invalid_coordinates
    }
}

/// Parse raw feed bytes line by line
///
/// Invalid UTF-8 is replaced rather than failing the feed. Blank lines are
/// skipped without being counted as rejections.
pub fn parse_feed(bytes: &[u8], format: &FeedFormat) -> ParsedFeed {
    let text = String::from_utf8_lossy(bytes);

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .fold(ParsedFeed::default(), |mut parsed, (index, line)| {
            match parse_line(line, format) {
                Ok(record) => parsed.records.push(record),
                Err(rejection) => {
                    tracing::debug!(line = index + 1, %rejection, "Skipping feed row");
                    match rejection {
                        Rejection::MalformedRow(_) => parsed.malformed_rows += 1,
                        Rejection::InvalidCoordinate(_) => parsed.invalid_coordinates += 1,
                    }
                }
            }
            parsed
        })
}

fn clean(field: &str) -> &str {
    field.trim().trim_matches('"').trim()
}

fn parse_degrees(field: &str, name: &str) -> Result<f64, Rejection> {
    let field = clean(field);
    field
        .parse::<f64>()
        .map_err(|_| Rejection::InvalidCoordinate(format!("{} is not a number: {:?}", name, field)))
}
