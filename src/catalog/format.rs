//! Display helpers for restaurant, deal and dining-time text

use chrono::{DateTime, Datelike, NaiveDateTime};

use super::types::{Deal, Restaurant};

/// `"2.4 mi"`, or None when the distance is unknown
pub fn format_distance(distance: Option<f64>) -> Option<String> {
    match distance {
        Some(d) if !d.is_nan() => Some(format!("{:.1} mi", d)),
        _ => None,
    }
}

/// One-line summary: food types, price range and rating
pub fn summary(restaurant: &Restaurant) -> String {
    let food_types = if restaurant.food_types.is_empty() {
        "N/A".to_string()
    } else {
        restaurant.food_types.join(", ")
    };
    let price_range = restaurant
        .price_range
        .map(|p| p.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let rating = restaurant
        .rating
        .map(|r| format!("{:.1}", r))
        .unwrap_or_else(|| "-".to_string());

    format!("{} • {} • ⭐ {}", food_types, price_range, rating)
}

/// Inline validity text used on restaurant cards
///
/// `" Oct 10 – Oct 23"`, `" Oct 10"`, `" until Oct 23"`, or empty.
pub fn deal_valid_string(deal: &Deal) -> String {
    let from = deal.valid_from.as_deref().filter(|s| !s.is_empty());
    let to = deal.valid_to.as_deref().filter(|s| !s.is_empty());

    match (from, to) {
        (None, None) => String::new(),
        (Some(from), None) => format!(" {}", from),
        (None, Some(to)) => format!(" until {}", to),
        (Some(from), Some(to)) => format!(" {} – {}", from, to),
    }
}

/// Validity lines shown on the deal detail view
pub fn deal_validity_lines(deal: &Deal) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(from) = deal.valid_from.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Valid from: {}", from));
    }
    if let Some(to) = deal.valid_to.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Valid through: {}", to));
    }
    lines
}

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tues", "Wed", "Thurs", "Fri", "Sat"];

/// `"Fri 2025-11-14 18:30"`, or `"N/A"` when the time cannot be parsed
///
/// RFC 3339 input keeps its own offset; naive input is taken as-is.
pub fn dining_time(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return "N/A".to_string();
    };

    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        });

    match parsed {
        Some(dt) => format!(
            "{} {}",
            WEEKDAYS[dt.weekday().num_days_from_sunday() as usize],
            dt.format("%Y-%m-%d %H:%M")
        ),
        None => "N/A".to_string(),
    }
}
