//! Travel option tables and the final itinerary

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::trip::SearchKey;

/// Placeholder for fields the search provider did not return
pub const NOT_AVAILABLE: &str = "N/A";

static HOURS_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(\d+)\s*h").ok());
static MINUTES_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(\d+)\s*m").ok());

/// Parse a duration like `2h 30m` or `2 hr 30 min` into minutes
pub fn parse_duration_minutes(duration: &str) -> Option<u64> {
    if duration.trim() == NOT_AVAILABLE {
        return None;
    }
    let capture = |re: &LazyLock<Option<Regex>>| {
        re.as_ref()?
            .captures(duration)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
    };
    let hours = capture(&HOURS_RE);
    let minutes = capture(&MINUTES_RE);
    if hours.is_none() && minutes.is_none() {
        return None;
    }
    Some(hours.unwrap_or(0) * 60 + minutes.unwrap_or(0))
}

/// Parse a price like `$1,234` into a whole number, ignoring every non-digit
pub fn parse_price(price: &str) -> Option<u64> {
    if price.trim() == NOT_AVAILABLE {
        return None;
    }
    let digits: String = price.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Unknown values sort after every known one
fn unknown_last(value: Option<u64>) -> u64 {
    value.unwrap_or(u64::MAX)
}

fn rating_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    b.unwrap_or(0.0).total_cmp(&a.unwrap_or(0.0))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOption {
    pub airline: String,
    pub duration: String,
    pub kind: String,
    pub price: String,
}

impl FlightOption {
    /// Row shown when the search returned no flight data
    pub fn not_available() -> Self {
        Self {
            airline: NOT_AVAILABLE.to_string(),
            duration: NOT_AVAILABLE.to_string(),
            kind: NOT_AVAILABLE.to_string(),
            price: NOT_AVAILABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelOption {
    pub name: String,
    pub price: String,
    pub rating: Option<f64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttractionOption {
    pub place: String,
    pub description: String,
    pub rating: Option<f64>,
    pub thumbnail: Option<String>,
}

/// Shortest first, then cheapest
pub fn sort_flights(flights: &mut [FlightOption]) {
    flights.sort_by_key(|f| (unknown_last(parse_duration_minutes(&f.duration)), unknown_last(parse_price(&f.price))));
}

/// Best rated first, then cheapest
pub fn sort_hotels(hotels: &mut [HotelOption]) {
    hotels.sort_by(|a, b| {
        rating_desc(a.rating, b.rating)
            .then_with(|| unknown_last(parse_price(&a.price)).cmp(&unknown_last(parse_price(&b.price))))
    });
}

/// Best rated first
pub fn sort_attractions(attractions: &mut [AttractionOption]) {
    attractions.sort_by(|a, b| rating_desc(a.rating, b.rating));
}

fn format_rating(rating: Option<f64>) -> String {
    format!("{:.1}", rating.unwrap_or(0.0))
}

/// Render rows as a left-aligned text table
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let format_row = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_row(headers.to_vec())];
    if rows.is_empty() {
        lines.push("(no results)".to_string());
    }
    for row in rows {
        lines.push(format_row(row.iter().map(String::as_str).collect()));
    }
    lines.join("\n")
}

/// Flights, hotels and attractions fetched for one route and date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelOptions {
    pub key: SearchKey,
    pub flights: Vec<FlightOption>,
    pub hotels: Vec<HotelOption>,
    pub attractions: Vec<AttractionOption>,
    pub fetched_at: i64,
}

impl TravelOptions {
    pub fn new(
        key: SearchKey,
        flights: Vec<FlightOption>,
        hotels: Vec<HotelOption>,
        attractions: Vec<AttractionOption>,
    ) -> Self {
        Self {
            key,
            flights,
            hotels,
            attractions,
            fetched_at: super::now_ms(),
        }
    }

    pub fn flights_table(&self) -> String {
        let rows: Vec<Vec<String>> = self
            .flights
            .iter()
            .map(|f| vec![f.airline.clone(), f.duration.clone(), f.kind.clone(), f.price.clone()])
            .collect();
        render_table(&["Airline", "Duration", "Type", "Price"], &rows)
    }

    pub fn hotels_table(&self) -> String {
        let rows: Vec<Vec<String>> = self
            .hotels
            .iter()
            .map(|h| {
                vec![
                    h.name.clone(),
                    h.price.clone(),
                    format_rating(h.rating),
                    h.image.clone().unwrap_or_default(),
                ]
            })
            .collect();
        render_table(&["Hotel", "Price", "Rating", "Image"], &rows)
    }

    pub fn attractions_table(&self) -> String {
        let rows: Vec<Vec<String>> = self
            .attractions
            .iter()
            .map(|a| {
                vec![
                    a.place.clone(),
                    a.description.clone(),
                    format_rating(a.rating),
                    a.thumbnail.clone().unwrap_or_default(),
                ]
            })
            .collect();
        render_table(&["Place", "Description", "Rating", "Thumbnail"], &rows)
    }
}

/// The composed itinerary with the tables it was built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryResult {
    pub text: String,
    pub options: TravelOptions,
    pub composed_at: i64,
}

impl ItineraryResult {
    pub fn new(text: impl Into<String>, options: TravelOptions) -> Self {
        Self {
            text: text.into(),
            options,
            composed_at: super::now_ms(),
        }
    }
}
