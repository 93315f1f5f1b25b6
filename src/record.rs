//! Identifiers and timestamps shared by every stored record

use std::fmt::{Display, Formatter};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// The key of a record inside its collection.
///
/// This is opaque: it may be a timestamp token (`"1678912345000"`), a counter (`"003"`) or a UUID.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}



/// Formats accepted for timestamps that carry no UTC offset (e.g. values of an HTML `datetime-local` input)
const FLOATING_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

#[derive(Clone, Copy, Debug)]
enum Parsed {
    /// An RFC3339 instant (`2025-03-24T09:00:00.000Z`)
    Absolute(DateTime<FixedOffset>),
    /// A wall-clock time with no zone, interpreted in the viewer's zone
    Floating(NaiveDateTime),
}

/// A date as it is stored in the record store.
///
/// The original text is kept verbatim, so that a record read from the store serializes back to exactly the same value.
/// Unparseable text is kept as well: such a timestamp simply never falls on any calendar day.
#[derive(Clone, Debug)]
pub struct Timestamp {
    raw: String,
    parsed: Option<Parsed>,
}

impl Timestamp {
    pub fn parse<S: Into<String>>(raw: S) -> Self {
        let raw = raw.into();
        let parsed = parse_raw(raw.trim());
        Self { raw, parsed }
    }

    /// An RFC3339 timestamp with millisecond precision, the way creation dates are written
    pub fn from_utc(instant: DateTime<Utc>) -> Self {
        Self::parse(instant.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_valid(&self) -> bool {
        self.parsed.is_some()
    }

    /// Whether this timestamp carries its own UTC offset
    pub fn is_absolute(&self) -> bool {
        matches!(self.parsed, Some(Parsed::Absolute(_)))
    }

    /// Locate this timestamp in a given time zone.
    ///
    /// Returns `None` for unparseable text, and for floating times that do not exist in `tz` (DST gaps).
    pub fn in_timezone<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Tz>> {
        match self.parsed? {
            Parsed::Absolute(dt) => Some(dt.with_timezone(tz)),
            Parsed::Floating(naive) => tz.from_local_datetime(&naive).earliest(),
        }
    }

    /// The calendar day this timestamp falls on, as seen from `tz`
    pub fn calendar_day<Tz: TimeZone>(&self, tz: &Tz) -> Option<NaiveDate> {
        self.in_timezone(tz).map(|dt| dt.naive_local().date())
    }
}

fn parse_raw(raw: &str) -> Option<Parsed> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(Parsed::Absolute(dt));
    }
    for format in FLOATING_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Parsed::Floating(naive));
        }
    }
    // A bare date is the start of that day, wherever the viewer is
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(Parsed::Floating)
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}
impl Eq for Timestamp {}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Used to support serde
impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}
/// Used to support serde
impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Timestamp, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = text_value(deserializer)?.unwrap_or_default();
        Ok(Timestamp::parse(raw))
    }
}



/// Read a text field the way other clients may have written it: numbers and booleans become their text,
/// and null is `None`. Nested values are kept as their JSON text.
pub(crate) fn text_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    };
    Ok(text)
}

/// `deserialize_with` helper for free-text fields. Null reads as an empty string.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_value(deserializer)?.unwrap_or_default())
}

/// `deserialize_with` helper for optional free-text fields
pub(crate) fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    text_value(deserializer)
}



/// The states a kind of record can be in
pub trait State: Copy + Default + Eq + std::fmt::Debug {
    /// The label this crate writes for this state
    fn label(&self) -> &'static str;
    /// The state a label designates. The label is lowercased and trimmed, with `_` and spaces replaced by `-`.
    fn recognize(normalized: &str) -> Option<Self>;
}

/// A status, as it is labelled in the store.
///
/// The label is kept verbatim, so that records are written back exactly as they were read, and so that
/// statuses are grouped the way they are spelled. It is matched case-insensitively against the known states.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Status<S> {
    label: String,
    state: Option<S>,
}

impl<S: State> Status<S> {
    pub fn parse<L: Into<String>>(label: L) -> Self {
        let label = label.into();
        let normalized: String = label.trim().to_lowercase().chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();
        let state = S::recognize(&normalized);
        Self { label, state }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The known state this label designates. `None` for labels this crate does not know.
    pub fn state(&self) -> Option<S> {
        self.state
    }
}

impl<S: State> From<S> for Status<S> {
    fn from(state: S) -> Self {
        Self { label: state.label().to_string(), state: Some(state) }
    }
}

impl<S: State> Default for Status<S> {
    fn default() -> Self {
        Self::from(S::default())
    }
}

impl<S> Display for Status<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label)
    }
}

impl<S> Serialize for Status<S> {
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: Serializer,
    {
        serializer.serialize_str(&self.label)
    }
}

impl<'de, S: State> Deserialize<'de> for Status<S> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match text_value(deserializer)? {
            None => Self::default(),
            Some(label) => Self::parse(label),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_instants_and_wall_clock_times() {
        let instant = Timestamp::parse("2025-03-24T09:00:00.000Z");
        assert!(instant.is_absolute());
        let in_utc = instant.in_timezone(&Utc).unwrap();
        assert_eq!(in_utc.hour(), 9);

        let floating = Timestamp::parse("2025-03-24T09:00");
        assert!(floating.is_valid());
        assert!(floating.is_absolute() == false);
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let located = floating.in_timezone(&tz).unwrap();
        assert_eq!(located.hour(), 9);
        assert_eq!(located.day(), 24);
    }

    #[test]
    fn calendar_day_depends_on_the_viewer_zone() {
        let late = Timestamp::parse("2025-03-24T23:30:00Z");
        let paris = FixedOffset::east_opt(3600).unwrap();
        let new_york = FixedOffset::west_opt(4 * 3600).unwrap();
        assert_eq!(late.calendar_day(&paris), NaiveDate::from_ymd_opt(2025, 3, 25));
        assert_eq!(late.calendar_day(&new_york), NaiveDate::from_ymd_opt(2025, 3, 24));
    }

    #[test]
    fn garbage_is_kept_but_never_located() {
        let ts = Timestamp::parse("next tuesday");
        assert!(ts.is_valid() == false);
        assert_eq!(ts.as_str(), "next tuesday");
        assert!(ts.calendar_day(&Utc).is_none());
        assert!(Timestamp::parse("").is_valid() == false);
    }

    #[test]
    fn bare_dates_are_midnight() {
        let ts = Timestamp::parse("2025-03-25");
        let day = ts.calendar_day(&FixedOffset::west_opt(8 * 3600).unwrap());
        assert_eq!(day, NaiveDate::from_ymd_opt(2025, 3, 25));
    }

    #[test]
    fn serde_keeps_the_stored_text() {
        let ts: Timestamp = serde_json::from_str("\"2025-03-24T09:00:00+01:00\"").unwrap();
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"2025-03-24T09:00:00+01:00\"");

        let created = Timestamp::from_utc(Utc.with_ymd_and_hms(2025, 3, 23, 8, 0, 0).unwrap());
        assert_eq!(created.as_str(), "2025-03-23T08:00:00.000Z");

        // Numbers are kept as text, and are not dates
        let ts: Timestamp = serde_json::from_value(serde_json::json!(1742806800000u64)).unwrap();
        assert_eq!(ts.as_str(), "1742806800000");
        assert!(ts.is_valid() == false);
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Light { Off, On }

    impl Default for Light {
        fn default() -> Self { Light::Off }
    }

    impl State for Light {
        fn label(&self) -> &'static str {
            match self { Light::Off => "Off", Light::On => "On" }
        }
        fn recognize(normalized: &str) -> Option<Self> {
            match normalized { "off" => Some(Light::Off), "on" | "switched-on" => Some(Light::On), _ => None }
        }
    }

    #[test]
    fn statuses_keep_their_spelling() {
        let status: Status<Light> = Status::parse(" Switched ON");
        assert_eq!(status.state(), Some(Light::On));
        assert_eq!(status.label(), " Switched ON");
        assert_eq!(serde_json::to_value(&status).unwrap(), " Switched ON");
        assert!(status != Status::from(Light::On));

        let unknown: Status<Light> = serde_json::from_value(serde_json::json!("dimmed")).unwrap();
        assert_eq!(unknown.state(), None);
        assert_eq!(unknown.label(), "dimmed");

        let numeric: Status<Light> = serde_json::from_value(serde_json::json!(3)).unwrap();
        assert_eq!(numeric.label(), "3");
        let null: Status<Light> = serde_json::from_value(serde_json::Value::Null).unwrap();
        assert_eq!(null, Status::from(Light::Off));
    }
}
