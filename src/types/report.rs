//! Canonical vessel position report and its timestamp handling.

use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// A feed timestamp, which arrives either as epoch seconds or as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Unix epoch seconds.
    Epoch(i64),
    /// Textual timestamp, e.g. `2015-04-03 14:12:05 UTC` or RFC 3339.
    Text(String),
}

impl Timestamp {
    /// Resolve to a UTC datetime, if the value is parseable.
    ///
    /// Accepted text forms: RFC 3339, `YYYY-MM-DD HH:MM:SS` with an optional
    /// trailing timezone abbreviation (treated as UTC), and bare epoch digits.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Epoch(secs) => Utc.timestamp_opt(*secs, 0).single(),
            Self::Text(s) => {
                let s = s.trim();
                if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                    return Some(dt.with_timezone(&Utc));
                }
                // "2015-04-03 14:12:05 UTC" — strip the abbreviation and
                // interpret the remainder as UTC wall-clock time.
                let stripped = s
                    .rsplit_once(' ')
                    .filter(|(_, tz)| tz.chars().all(char::is_alphabetic))
                    .map_or(s, |(head, _)| head);
                if let Ok(naive) = NaiveDateTime::parse_from_str(stripped, "%Y-%m-%d %H:%M:%S") {
                    return Some(Utc.from_utc_datetime(&naive));
                }
                if let Ok(secs) = s.parse::<i64>() {
                    return Utc.timestamp_opt(secs, 0).single();
                }
                None
            }
        }
    }
}

/// Time-of-day bucket derived from a report timestamp.
///
/// The bucket boundaries match the training pipeline and must never drift:
/// Morning 05:00–11:59, Afternoon 12:00–16:59, Evening 17:00–20:59, Night
/// otherwise. Missing or unparsable timestamps map to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
    Unknown,
}

impl TimeOfDay {
    /// Bucket an hour of day (0–23).
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            _ => Self::Night,
        }
    }

    /// Bucket an optional report timestamp.
    pub fn from_timestamp(timestamp: Option<&Timestamp>) -> Self {
        timestamp
            .and_then(Timestamp::to_datetime)
            .map_or(Self::Unknown, |dt| Self::from_hour(dt.hour()))
    }

    /// The label the fitted encoder was trained on.
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
            Self::Night => "Night",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One positional report for a vessel, normalized to the canonical feed
/// field names.
///
/// The eight canonical fields drive filtering and scoring; the optional tail
/// is carried through unmodified for display and storage. Missing optional
/// fields serialize as `null` rather than being dropped, matching what
/// downstream consumers were built against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VesselReport {
    /// Maritime Mobile Service Identity — the vessel's stable key.
    #[serde(rename = "MMSI")]
    pub mmsi: u64,
    #[serde(rename = "TIMESTAMP", default)]
    pub timestamp: Option<Timestamp>,
    #[serde(rename = "LATITUDE")]
    pub latitude: f64,
    #[serde(rename = "LONGITUDE")]
    pub longitude: f64,
    /// Course over ground, degrees.
    #[serde(rename = "COURSE", default)]
    pub course: Option<f64>,
    /// Speed over ground, knots.
    #[serde(rename = "SPEED", default)]
    pub speed: Option<f64>,
    /// True heading, degrees.
    #[serde(rename = "HEADING", default)]
    pub heading: Option<f64>,
    /// Navigational status code.
    #[serde(rename = "NAVSTAT", default)]
    pub navstat: Option<i64>,
    #[serde(rename = "IMO", default)]
    pub imo: Option<serde_json::Value>,
    #[serde(rename = "NAME", default)]
    pub name: Option<serde_json::Value>,
    #[serde(rename = "CALLSIGN", default)]
    pub callsign: Option<serde_json::Value>,
    #[serde(rename = "TYPE", default)]
    pub vessel_type: Option<serde_json::Value>,
    #[serde(rename = "DRAUGHT", default)]
    pub draught: Option<serde_json::Value>,
    #[serde(rename = "DESTINATION", default)]
    pub destination: Option<serde_json::Value>,
    /// Remaining feed fields (`LOCODE`, `ETA`, `ZONE`, …), untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl VesselReport {
    /// The report's date in `YYYY-MM-DD` form, falling back to today when the
    /// timestamp is missing or unparsable. Used to anchor the SAR search
    /// window.
    pub fn report_date(&self) -> String {
        self.timestamp
            .as_ref()
            .and_then(Timestamp::to_datetime)
            .unwrap_or_else(Utc::now)
            .format("%Y-%m-%d")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_of_day_bucket_boundaries() {
        let cases = [
            (5, TimeOfDay::Morning),
            (11, TimeOfDay::Morning),
            (12, TimeOfDay::Afternoon),
            (16, TimeOfDay::Afternoon),
            (17, TimeOfDay::Evening),
            (20, TimeOfDay::Evening),
            (21, TimeOfDay::Night),
            (4, TimeOfDay::Night),
            (0, TimeOfDay::Night),
        ];
        for (hour, expected) in cases {
            assert_eq!(TimeOfDay::from_hour(hour), expected, "hour {hour}");
        }
    }

    #[test]
    fn time_of_day_from_text_timestamps() {
        let afternoon = Timestamp::Text("2015-04-03 14:12:05 UTC".to_string());
        assert_eq!(
            TimeOfDay::from_timestamp(Some(&afternoon)),
            TimeOfDay::Afternoon
        );

        let evening = Timestamp::Text("2015-04-03T17:00:00Z".to_string());
        assert_eq!(
            TimeOfDay::from_timestamp(Some(&evening)),
            TimeOfDay::Evening
        );

        let garbage = Timestamp::Text("not a timestamp".to_string());
        assert_eq!(
            TimeOfDay::from_timestamp(Some(&garbage)),
            TimeOfDay::Unknown
        );
        assert_eq!(TimeOfDay::from_timestamp(None), TimeOfDay::Unknown);
    }

    #[test]
    fn time_of_day_from_epoch() {
        // 1428069125 = 2015-04-03 14:32:05 UTC
        let ts = Timestamp::Epoch(1_428_069_125);
        assert_eq!(TimeOfDay::from_timestamp(Some(&ts)), TimeOfDay::Afternoon);
    }

    #[test]
    fn report_deserializes_from_feed_shape() {
        let raw = serde_json::json!({
            "MMSI": 367_596_940_u64,
            "TIMESTAMP": "2015-04-03 14:12:05 UTC",
            "LATITUDE": 20.0,
            "LONGITUDE": -90.0,
            "COURSE": 90.0,
            "SPEED": 15.0,
            "HEADING": 88.0,
            "NAVSTAT": 0,
            "NAME": "EVER GIVEN",
            "ZONE": "Gulf of Mexico"
        });
        let report: VesselReport = serde_json::from_value(raw).expect("valid report");
        assert_eq!(report.mmsi, 367_596_940);
        assert_eq!(report.speed, Some(15.0));
        assert!(report.imo.is_none());
        assert_eq!(
            report.extra.get("ZONE").and_then(|v| v.as_str()),
            Some("Gulf of Mexico")
        );
        assert_eq!(report.report_date(), "2015-04-03");
    }

    #[test]
    fn report_serializes_missing_optionals_as_null() {
        let raw = serde_json::json!({
            "MMSI": 1_u64,
            "LATITUDE": 16.0,
            "LONGITUDE": -85.0,
        });
        let report: VesselReport = serde_json::from_value(raw).expect("valid report");
        let out = serde_json::to_value(&report).expect("serializable");
        assert!(out.get("NAME").is_some_and(serde_json::Value::is_null));
        assert!(out.get("TIMESTAMP").is_some_and(serde_json::Value::is_null));
    }
}
