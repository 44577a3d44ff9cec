use chrono::{
    format::{parse, Fixed, Item, Numeric, Parsed, StrftimeItems},
    DateTime, FixedOffset, NaiveDateTime,
};
use std::fmt::{self, Write};

/// A parsed point in time.
///
/// Formats carrying a UTC offset keep it so re-rendering reproduces the
/// offset; everything else is naive local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTime {
    Naive(NaiveDateTime),
    Offset(DateTime<FixedOffset>),
}

impl ParsedTime {
    /// Comparable key: UTC for offset-aware values, wall clock otherwise.
    pub fn sort_key(&self) -> NaiveDateTime {
        match self {
            ParsedTime::Naive(dt) => *dt,
            ParsedTime::Offset(dt) => dt.naive_utc(),
        }
    }

    /// Render with a strftime `format`. Fails when the format asks for a
    /// field the value doesn't have (e.g. `%z` on a naive value).
    pub fn render(&self, format: &str) -> Result<String, fmt::Error> {
        let mut out = String::new();
        match self {
            ParsedTime::Naive(dt) => write!(out, "{}", dt.format(format))?,
            ParsedTime::Offset(dt) => write!(out, "{}", dt.format(format))?,
        }
        Ok(out)
    }
}

/// A normalized timestamp: the typed instant plus its canonical text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    pub parsed: ParsedTime,
    pub text: String,
}

/// Parse `s` using exactly `format`. No inference.
///
/// Fields the format doesn't carry take defaults: a missing hour, minute or
/// second is 0, and a format with no date fields lands on 1900-01-01.
/// Formats with `%s` are taken as-is. Surrounding whitespace is ignored.
pub fn parse_with_format(s: &str, format: &str) -> Option<ParsedTime> {
    let mut parsed = Parsed::new();
    parse(&mut parsed, s.trim(), StrftimeItems::new(format)).ok()?;

    let fields = FormatFields::scan(format);
    if !fields.timestamp {
        if !fields.date {
            parsed.set_year(1900).ok()?;
            parsed.set_month(1).ok()?;
            parsed.set_day(1).ok()?;
        }
        // set_* only fills a field that is still empty
        let _ = parsed.set_hour(0);
        let _ = parsed.set_minute(0);
        let _ = parsed.set_second(0);
    }

    if let Ok(dt) = parsed.to_datetime() {
        return Some(ParsedTime::Offset(dt));
    }
    parsed
        .to_naive_datetime_with_offset(0)
        .ok()
        .map(ParsedTime::Naive)
}

/// Which kinds of fields a strftime format fills.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct FormatFields {
    date: bool,
    timestamp: bool,
}

impl FormatFields {
    fn scan(format: &str) -> Self {
        let mut fields = FormatFields::default();
        for item in StrftimeItems::new(format) {
            match item {
                Item::Numeric(Numeric::Timestamp, _) => fields.timestamp = true,
                Item::Numeric(
                    Numeric::Year
                    | Numeric::YearDiv100
                    | Numeric::YearMod100
                    | Numeric::IsoYear
                    | Numeric::IsoYearDiv100
                    | Numeric::IsoYearMod100
                    | Numeric::Month
                    | Numeric::Day
                    | Numeric::WeekFromSun
                    | Numeric::WeekFromMon
                    | Numeric::IsoWeek
                    | Numeric::NumDaysFromSun
                    | Numeric::WeekdayFromMon
                    | Numeric::Ordinal,
                    _,
                )
                | Item::Fixed(
                    Fixed::ShortMonthName
                    | Fixed::LongMonthName
                    | Fixed::ShortWeekdayName
                    | Fixed::LongWeekdayName,
                ) => fields.date = true,
                Item::Fixed(Fixed::RFC2822 | Fixed::RFC3339) => {
                    fields.date = true;
                    fields.timestamp = true;
                }
                _ => {}
            }
        }
        fields
    }
}

/// True when `format` contains no unrecognised `%` specifiers.
pub fn is_valid_format(format: &str) -> bool {
    !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}
