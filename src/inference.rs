//! Rule-table inference of workspace amenities and attributes from provider
//! category tags, plus best-effort parsing of weekday opening-hours text.
//!
//! Everything here is pure and deterministic; no provider call is ever made.

use serde::{Deserialize, Serialize};

const DEFAULT_SEATING_COMFORT: u8 = 3;
const HIGH_RATING_THRESHOLD: f64 = 4.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmenityFlags {
    pub wifi: bool,
    pub power_outlets: bool,
    pub coffee: bool,
    pub food: bool,
    pub quiet: bool,
    pub restrooms: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parking {
    Street,
    Lot,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capacity {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseLevel {
    Quiet,
    Moderate,
    Lively,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeFlags {
    pub parking: Parking,
    pub capacity: Capacity,
    pub seating_comfort: u8,
    pub noise_level: NoiseLevel,
}

impl Default for AttributeFlags {
    fn default() -> Self {
        Self {
            parking: Parking::Street,
            capacity: Capacity::Medium,
            seating_comfort: DEFAULT_SEATING_COMFORT,
            noise_level: NoiseLevel::Moderate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    pub day: String,
    pub open: String,
    pub close: String,
}

pub fn infer_amenities(category_tags: &[String]) -> AmenityFlags {
    let has = |tag: &str| category_tags.iter().any(|t| t == tag);

    AmenityFlags {
        wifi: has("cafe") || has("library") || has("book_store") || has("lodging"),
        power_outlets: has("cafe") || has("library"),
        coffee: has("cafe") || has("bakery"),
        food: has("restaurant") || has("bakery") || has("meal_takeaway") || has("cafe"),
        quiet: has("library") || has("book_store"),
        restrooms: has("cafe")
            || has("restaurant")
            || has("library")
            || has("lodging")
            || has("shopping_mall"),
    }
}

pub fn infer_attributes(category_tags: &[String], rating: Option<f64>) -> AttributeFlags {
    let has = |tag: &str| category_tags.iter().any(|t| t == tag);

    let parking = if has("shopping_mall") || has("lodging") || has("supermarket") {
        Parking::Lot
    } else {
        Parking::Street
    };

    let capacity = if has("library") || has("lodging") || has("shopping_mall") {
        Capacity::Large
    } else if has("bakery") || has("book_store") {
        Capacity::Small
    } else {
        Capacity::Medium
    };

    let noise_level = if has("library") || has("book_store") {
        NoiseLevel::Quiet
    } else if has("restaurant") || has("bar") {
        NoiseLevel::Lively
    } else {
        NoiseLevel::Moderate
    };

    let mut seating_comfort = if has("lodging") {
        4
    } else if has("bakery") {
        2
    } else {
        DEFAULT_SEATING_COMFORT
    };
    if rating.map(|r| r >= HIGH_RATING_THRESHOLD).unwrap_or(false) {
        seating_comfort = (seating_comfort + 1).min(5);
    }

    AttributeFlags {
        parking,
        capacity,
        seating_comfort,
        noise_level,
    }
}

/// Parses provider weekday text ("Monday: 9:00 AM – 5:00 PM") into structured
/// triples. Days marked closed yield `Closed`/`Closed`; lines that do not
/// match the expected shape are skipped.
pub fn parse_opening_hours(weekday_text: &[String]) -> Vec<OpeningHours> {
    weekday_text
        .iter()
        .filter_map(|line| parse_hours_line(line))
        .collect()
}

fn parse_hours_line(line: &str) -> Option<OpeningHours> {
    // The provider pads times with narrow/thin no-break spaces.
    let normalized: String = line
        .chars()
        .map(|c| {
            if c == '\u{202f}' || c == '\u{2009}' || c == '\u{00a0}' {
                ' '
            } else {
                c
            }
        })
        .collect();

    let (day, hours) = normalized.split_once(": ")?;
    let day = day.trim();
    let hours = hours.trim();
    if day.is_empty() || hours.is_empty() {
        return None;
    }

    if hours.eq_ignore_ascii_case("closed") {
        return Some(OpeningHours {
            day: day.to_string(),
            open: "Closed".to_string(),
            close: "Closed".to_string(),
        });
    }

    let (open, close) = hours
        .split_once('\u{2013}')
        .or_else(|| hours.split_once('-'))?;
    Some(OpeningHours {
        day: day.to_string(),
        open: open.trim().to_string(),
        close: close.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn cafes_imply_wifi_coffee_and_outlets() {
        let amenities = infer_amenities(&tags(&["cafe", "point_of_interest"]));
        assert!(amenities.wifi);
        assert!(amenities.coffee);
        assert!(amenities.power_outlets);
        assert!(!amenities.quiet);
    }

    #[test]
    fn libraries_imply_quiet_wifi() {
        let amenities = infer_amenities(&tags(&["library"]));
        assert!(amenities.wifi);
        assert!(amenities.quiet);
        assert!(!amenities.coffee);
    }

    #[test]
    fn unmatched_tags_fall_back_to_defaults() {
        let amenities = infer_amenities(&tags(&["parking_meter"]));
        assert_eq!(amenities, AmenityFlags::default());

        let attributes = infer_attributes(&tags(&["parking_meter"]), None);
        assert_eq!(attributes, AttributeFlags::default());
        assert_eq!(attributes.parking, Parking::Street);
        assert_eq!(attributes.capacity, Capacity::Medium);
        assert_eq!(attributes.seating_comfort, DEFAULT_SEATING_COMFORT);
    }

    #[test]
    fn high_ratings_bump_seating_comfort() {
        let attributes = infer_attributes(&tags(&["cafe"]), Some(4.7));
        assert_eq!(attributes.seating_comfort, 4);

        let capped = infer_attributes(&tags(&["lodging"]), Some(4.9));
        assert_eq!(capped.seating_comfort, 5);
        assert_eq!(capped.parking, Parking::Lot);
        assert_eq!(capped.capacity, Capacity::Large);
    }

    #[test]
    fn parses_weekday_text_with_narrow_spaces() {
        let lines = vec![
            "Monday: 9:00\u{202f}AM\u{2009}\u{2013}\u{2009}5:00\u{202f}PM".to_string(),
            "Tuesday: Closed".to_string(),
        ];
        let hours = parse_opening_hours(&lines);
        assert_eq!(hours.len(), 2);
        assert_eq!(hours[0].day, "Monday");
        assert_eq!(hours[0].open, "9:00 AM");
        assert_eq!(hours[0].close, "5:00 PM");
        assert_eq!(hours[1].open, "Closed");
        assert_eq!(hours[1].close, "Closed");
    }

    #[test]
    fn malformed_lines_are_skipped_silently() {
        let lines = vec![
            "nonsense without delimiter".to_string(),
            "Wednesday: 8:00 AM - 6:00 PM".to_string(),
            "Thursday:".to_string(),
        ];
        let hours = parse_opening_hours(&lines);
        assert_eq!(hours.len(), 1);
        assert_eq!(hours[0].day, "Wednesday");
        assert_eq!(hours[0].close, "6:00 PM");
    }
}
