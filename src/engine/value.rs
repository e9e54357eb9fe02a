//! Typed report values
//!
//! The download service returns every value as text, with a few display
//! conventions of its own:
//!
//! | Raw | Meaning |
//! |---|---|
//! | ` --` | never set, null for every type |
//! | `auto`, `auto: 12` | automatic bidding strategy, with or without value |
//! | `Excluded` | null by context |
//! | `< 10%`, `> 90%` | value near a boundary, kept as 9.999 / 90.001 |
//!
//! [`cast`] turns a raw value into a [`Cell`] according to the catalog type
//! of its column, and `Display` renders it back with the same conventions.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use super::error::{QueryError, QueryResult};

/// Value of a field that was never set
pub const NULL_VALUE: &str = " --";

const AUTO: &str = "auto";
const AUTO_VALUE: &str = "auto: ";
const EXCLUDED: &str = "Excluded";
const ALMOST_10: &str = "< 10";
const ALMOST_90: &str = "> 90";
const ALMOST_10_VALUE: f64 = 9.999;
const ALMOST_90_VALUE: f64 = 90.001;

pub const DATE_LAYOUT: &str = "%Y-%m-%d";
pub const DATETIME_LAYOUT: &str = "%Y/%m/%d %H:%M:%S";

/// Number of decimals used for DOUBLE columns
pub const DOUBLE_PRECISION: usize = 2;

/// Storage class of a catalog type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Int,
    Double,
    Date,
    DateTime,
    String,
}

impl Kind {
    /// Classify a catalog type tag, case-insensitively
    pub fn of(tag: &str) -> Self {
        match tag.to_ascii_uppercase().as_str() {
            "BID" | "INT" | "INTEGER" | "LONG" | "MONEY" => Kind::Int,
            "DOUBLE" => Kind::Double,
            "DATE" => Kind::Date,
            "DATETIME" => Kind::DateTime,
            _ => Kind::String,
        }
    }

    fn layout(&self) -> &'static str {
        match self {
            Kind::DateTime => DATETIME_LAYOUT,
            _ => DATE_LAYOUT,
        }
    }
}

/// A typed value of the result set
///
/// Every kind carries the `auto` and `excluded` markers of the raw value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int {
        value: Option<i64>,
        auto: bool,
        excluded: bool,
    },
    Float {
        value: Option<f64>,
        precision: usize,
        percent: bool,
        almost: bool,
        auto: bool,
        excluded: bool,
    },
    Date {
        value: Option<NaiveDateTime>,
        layout: &'static str,
        auto: bool,
        excluded: bool,
    },
    String {
        value: Option<String>,
        auto: bool,
        excluded: bool,
    },
}

impl Cell {
    /// An unset value of the given kind
    pub fn null(kind: Kind) -> Self {
        match kind {
            Kind::Int => Cell::Int {
                value: None,
                auto: false,
                excluded: false,
            },
            Kind::Double => Cell::float(None, DOUBLE_PRECISION),
            Kind::Date | Kind::DateTime => Cell::Date {
                value: None,
                layout: kind.layout(),
                auto: false,
                excluded: false,
            },
            Kind::String => Cell::String {
                value: None,
                auto: false,
                excluded: false,
            },
        }
    }

    /// A plain float, as produced by aggregate functions
    pub fn float(value: Option<f64>, precision: usize) -> Self {
        Cell::Float {
            value,
            precision,
            percent: false,
            almost: false,
            auto: false,
            excluded: false,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Cell::String {
            value: Some(value.into()),
            auto: false,
            excluded: false,
        }
    }

    fn marked(mut self, is_auto: bool, is_excluded: bool) -> Self {
        match &mut self {
            Cell::Int { auto, excluded, .. }
            | Cell::Float { auto, excluded, .. }
            | Cell::Date { auto, excluded, .. }
            | Cell::String { auto, excluded, .. } => {
                *auto = is_auto;
                *excluded = is_excluded;
            }
        }
        self
    }

    /// `auto` and `excluded` markers
    pub fn markers(&self) -> (bool, bool) {
        match self {
            Cell::Int { auto, excluded, .. }
            | Cell::Float { auto, excluded, .. }
            | Cell::Date { auto, excluded, .. }
            | Cell::String { auto, excluded, .. } => (*auto, *excluded),
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Cell::Int { value, .. } => value.is_none(),
            Cell::Float { value, .. } => value.is_none(),
            Cell::Date { value, .. } => value.is_none(),
            Cell::String { value, .. } => value.is_none(),
        }
    }

    /// Numeric view used by aggregate functions; dates count in seconds
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int { value, .. } => value.map(|v| v as f64),
            Cell::Float { value, .. } => *value,
            Cell::Date { value, .. } => value.map(|v| v.and_utc().timestamp() as f64),
            Cell::String { value, .. } => value.as_deref().and_then(|v| v.trim().parse().ok()),
        }
    }

    /// Order two cells of the same column, nulls first
    ///
    /// Cells of different variants compare equal.
    pub fn compare(&self, other: &Cell) -> Ordering {
        match (self, other) {
            (Cell::Int { value: a, .. }, Cell::Int { value: b, .. }) => a.cmp(b),
            (Cell::Float { value: a, .. }, Cell::Float { value: b, .. }) => match (a, b) {
                (Some(a), Some(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
                (a, b) => a.is_some().cmp(&b.is_some()),
            },
            (Cell::Date { value: a, .. }, Cell::Date { value: b, .. }) => a.cmp(b),
            (Cell::String { value: a, .. }, Cell::String { value: b, .. }) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }

    /// Display width in characters
    pub fn width(&self) -> usize {
        self.to_string().chars().count()
    }

    /// Render the payload alone, without markers
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int { value, .. } => match value {
                Some(v) => write!(f, "{}", v),
                None => f.write_str(NULL_VALUE),
            },
            Cell::Float {
                value,
                precision,
                percent,
                almost,
                ..
            } => {
                let Some(v) = value else {
                    return f.write_str(NULL_VALUE);
                };
                if *almost {
                    f.write_str(if *v > 90.0 { ALMOST_90 } else { ALMOST_10 })?;
                } else {
                    write!(f, "{:.*}", precision, v)?;
                }
                if *percent {
                    f.write_str("%")?;
                }
                Ok(())
            }
            Cell::Date { value, layout, .. } => match value {
                Some(v) => write!(f, "{}", v.format(layout)),
                None => f.write_str(NULL_VALUE),
            },
            Cell::String { value, .. } => f.write_str(value.as_deref().unwrap_or(NULL_VALUE)),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.markers() {
            (_, true) => f.write_str(EXCLUDED),
            (true, _) if self.is_null() => f.write_str(AUTO),
            (true, _) => {
                f.write_str(AUTO_VALUE)?;
                self.fmt_value(f)
            }
            (false, false) => self.fmt_value(f),
        }
    }
}

fn is_null(raw: &str) -> bool {
    raw == NULL_VALUE || raw.trim() == "--"
}

/// Convert a raw report value according to the catalog type of its column
pub fn cast(raw: &str, tag: &str) -> QueryResult<Cell> {
    let kind = Kind::of(tag);
    if is_null(raw) {
        return Ok(Cell::null(kind));
    }

    let trimmed = raw.trim();
    if trimmed == EXCLUDED {
        return Ok(Cell::null(kind).marked(false, true));
    }
    let (payload, auto) = match trimmed.strip_prefix(AUTO_VALUE) {
        Some(rest) => (rest.trim(), true),
        None if trimmed == AUTO => ("", true),
        None => (raw, false),
    };
    if auto && payload.is_empty() {
        return Ok(Cell::null(kind).marked(true, false));
    }

    let cell = match kind {
        Kind::Int => payload.trim().parse::<i64>().ok().map(|v| Cell::Int {
            value: Some(v),
            auto: false,
            excluded: false,
        }),
        Kind::Double => cast_double(payload),
        Kind::Date | Kind::DateTime => parse_datetime(payload.trim(), kind).map(|value| Cell::Date {
            value: Some(value),
            layout: kind.layout(),
            auto: false,
            excluded: false,
        }),
        Kind::String => Some(Cell::text(payload)),
    };
    cell.map(|c| c.marked(auto, false))
        .ok_or_else(|| QueryError::cast(raw, tag))
}

fn cast_double(raw: &str) -> Option<Cell> {
    let raw = raw.trim();
    let (raw, percent) = match raw.strip_suffix('%') {
        Some(rest) => (rest, true),
        None => (raw, false),
    };
    let (value, almost) = match raw {
        ALMOST_10 => (ALMOST_10_VALUE, true),
        ALMOST_90 => (ALMOST_90_VALUE, true),
        _ => (raw.trim().parse::<f64>().ok()?, false),
    };
    Some(Cell::Float {
        value: Some(value),
        precision: DOUBLE_PRECISION,
        percent,
        almost,
        auto: false,
        excluded: false,
    })
}

fn parse_datetime(raw: &str, kind: Kind) -> Option<NaiveDateTime> {
    match kind {
        Kind::DateTime => NaiveDateTime::parse_from_str(raw, DATETIME_LAYOUT).ok(),
        _ => NaiveDate::parse_from_str(raw, DATE_LAYOUT)
            .ok()?
            .and_hms_opt(0, 0, 0),
    }
}

/// Rebuild a date cell from a number of seconds, as produced by MIN/MAX
pub(crate) fn date_from_seconds(seconds: Option<f64>, tag: &str) -> Cell {
    let value = seconds
        .and_then(|s| chrono::DateTime::from_timestamp(s as i64, 0))
        .map(|dt| dt.naive_utc());
    Cell::Date {
        value,
        layout: Kind::of(tag).layout(),
        auto: false,
        excluded: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sentinel_for_every_type() {
        for tag in ["LONG", "MONEY", "DOUBLE", "DATE", "DATETIME", "STRING", "ENUM"] {
            let cell = cast(" --", tag).unwrap();
            assert!(cell.is_null(), "{} should be null", tag);
            assert_eq!(cell.to_string(), " --");
        }
    }

    #[test]
    fn test_auto_values() {
        assert_eq!(
            cast("auto: 12", "BID").unwrap(),
            Cell::Int {
                value: Some(12),
                auto: true,
                excluded: false
            }
        );
        let auto = cast("auto", "MONEY").unwrap();
        assert!(auto.is_null());
        assert_eq!(auto.to_string(), "auto");
        assert_eq!(cast("auto: 12", "LONG").unwrap().to_string(), "auto: 12");
    }

    #[test]
    fn test_excluded() {
        let cell = cast("Excluded", "BID").unwrap();
        assert!(cell.is_null());
        assert_eq!(cell.to_string(), "Excluded");
    }

    #[test]
    fn test_markers_on_every_kind() {
        let bid = cast("auto: 1.5", "DOUBLE").unwrap();
        assert_eq!(bid.as_f64(), Some(1.5));
        assert_eq!(bid.markers(), (true, false));
        assert_eq!(bid.to_string(), "auto: 1.50");

        let name = cast("Excluded", "STRING").unwrap();
        assert!(name.is_null());
        assert_eq!(name.markers(), (false, true));
        assert_eq!(name.to_string(), "Excluded");

        let day = cast("auto", "DATE").unwrap();
        assert!(day.is_null());
        assert_eq!(day.to_string(), "auto");

        assert_eq!(cast("Excluded", "DOUBLE").unwrap().to_string(), "Excluded");
        assert_eq!(cast("auto: x", "STRING").unwrap().to_string(), "auto: x");
        assert_eq!(cast("automatic", "STRING").unwrap(), Cell::text("automatic"));
    }

    #[test]
    fn test_percent_almost() {
        assert_eq!(
            cast("< 10%", "DOUBLE").unwrap(),
            Cell::Float {
                value: Some(9.999),
                precision: 2,
                percent: true,
                almost: true,
                auto: false,
                excluded: false
            }
        );
        let high = cast("> 90%", "DOUBLE").unwrap();
        assert_eq!(high.as_f64(), Some(90.001));
        assert_eq!(high.to_string(), "> 90%");
        assert_eq!(cast("< 10%", "DOUBLE").unwrap().to_string(), "< 10%");
        assert_eq!(cast("12.5%", "DOUBLE").unwrap().to_string(), "12.50%");
        assert_eq!(cast("3", "DOUBLE").unwrap().to_string(), "3.00");
    }

    #[test]
    fn test_dates() {
        let day = cast("2017-09-13", "DATE").unwrap();
        assert_eq!(day.to_string(), "2017-09-13");
        let at = cast("2017/09/13 08:30:00", "DATETIME").unwrap();
        assert_eq!(at.to_string(), "2017/09/13 08:30:00");
        assert!(day.compare(&cast("2017-09-12", "DATE").unwrap()).is_gt());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            cast("abc", "LONG"),
            Err(QueryError::Cast { .. })
        ));
        assert!(matches!(cast("abc", "DOUBLE"), Err(QueryError::Cast { .. })));
        assert!(matches!(cast("13/09/2017", "DATE"), Err(QueryError::Cast { .. })));
        assert_eq!(cast("abc", "STRING").unwrap(), Cell::text("abc"));
    }

    #[test]
    fn test_compare_nulls_first() {
        let null = cast(" --", "LONG").unwrap();
        let one = cast("1", "LONG").unwrap();
        assert_eq!(null.compare(&one), Ordering::Less);
        assert_eq!(Cell::float(None, 2).compare(&Cell::float(Some(-1.0), 2)), Ordering::Less);
        assert_eq!(one.compare(&Cell::text("1")), Ordering::Equal);
    }

    #[test]
    fn test_date_from_seconds() {
        let day = cast("2017-09-13", "DATE").unwrap();
        let back = date_from_seconds(day.as_f64(), "DATE");
        assert_eq!(back, day);
    }
}
