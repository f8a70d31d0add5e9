//! Query-string parameters.
//!
//! Parameters arrive as raw strings so that malformed values produce the
//! API's own JSON error instead of a framework rejection.

use serde::Deserialize;
use time::Duration;

use dashboard_core::{ChartRequest, PageCursor};

/// `limit` and `offset`.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl PageParams {
    /// Resolve to a cursor, using `page_size` when no limit is given.
    pub fn cursor(&self, page_size: u64) -> Result<PageCursor, String> {
        let limit = parse_count("limit", self.limit.as_deref())?.unwrap_or(page_size);
        let offset = parse_count("offset", self.offset.as_deref())?.unwrap_or(0);
        Ok(PageCursor::new(limit, offset))
    }
}

/// `period` and `interval`.
#[derive(Debug, Default, Deserialize)]
pub struct ChartParams {
    pub period: Option<String>,
    pub interval: Option<String>,
}

impl ChartParams {
    /// Resolve to a chart request, filling gaps from `defaults`.
    ///
    /// Only the syntax is checked here; domain checks such as a positive
    /// interval happen in the dashboard.
    pub fn request(&self, defaults: ChartRequest) -> Result<ChartRequest, String> {
        let period = parse_duration_param("period", self.period.as_deref())?;
        let interval = parse_duration_param("interval", self.interval.as_deref())?;
        Ok(ChartRequest::new(
            period.unwrap_or(defaults.period),
            interval.unwrap_or(defaults.interval),
        ))
    }
}

/// Both of the above, for the combined dashboard endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub period: Option<String>,
    pub interval: Option<String>,
}

impl DashboardParams {
    pub fn page(&self) -> PageParams {
        PageParams {
            limit: self.limit.clone(),
            offset: self.offset.clone(),
        }
    }

    pub fn chart(&self) -> ChartParams {
        ChartParams {
            period: self.period.clone(),
            interval: self.interval.clone(),
        }
    }
}

/// `temperature` and `humidity` of a new reading.
#[derive(Debug, Default, Deserialize)]
pub struct RecordParams {
    pub temperature: Option<String>,
    pub humidity: Option<String>,
}

impl RecordParams {
    /// Both values, checked for presence first and then for syntax.
    pub fn values(&self) -> Result<(f64, f64), String> {
        let temperature = required("temperature", self.temperature.as_deref())?;
        let humidity = required("humidity", self.humidity.as_deref())?;
        Ok((
            parse_number("temperature", temperature)?,
            parse_number("humidity", humidity)?,
        ))
    }
}

fn required<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("{} is required", name)),
    }
}

fn parse_number(name: &str, value: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("{} must be a number", name))
}

/// Empty or absent means "use the default".
fn parse_count(name: &str, value: Option<&str>) -> Result<Option<u64>, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse::<u64>().map(Some).map_err(|_| {
            format!("{} must be a non-negative integer, got '{}'", name, v)
        }),
    }
}

fn parse_duration_param(name: &str, value: Option<&str>) -> Result<Option<Duration>, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_duration(v)
            .map(Some)
            .map_err(|e| format!("invalid {}: {}", name, e)),
    }
}

/// Parse a duration such as `168h`, `1h30m`, `1.5h`, `90s` or `-5m`.
///
/// Units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. A bare `0` is
/// accepted; any other number needs a unit.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let (negative, mut rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(format!("'{}' is not a valid duration", s));
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_len];
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let scale = unit_nanos(unit)
            .ok_or_else(|| format!("unknown unit '{}' in duration '{}'", unit, s))?;
        let nanos = scaled(number, scale)
            .ok_or_else(|| format!("'{}' is not a valid duration", s))?;
        total = total
            .checked_add(nanos)
            .ok_or_else(|| format!("duration '{}' is out of range", s))?;
    }

    let total = if negative { -total } else { total };
    i64::try_from(total)
        .map(Duration::nanoseconds)
        .map_err(|_| format!("duration '{}' is out of range", s))
}

fn unit_nanos(unit: &str) -> Option<i128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 3600 * 1_000_000_000,
        _ => return None,
    })
}

/// `number * scale` in nanoseconds, with an optional fractional part.
fn scaled(number: &str, scale: i128) -> Option<i128> {
    let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole: i128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole.checked_mul(scale)?;

    // Digits beyond nanosecond resolution are dropped
    let mut unit = scale;
    for digit in frac.bytes() {
        unit /= 10;
        if unit == 0 {
            break;
        }
        nanos = nanos.checked_add(i128::from(digit - b'0') * unit)?;
    }
    Some(nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("168h").unwrap(), Duration::days(7));
        assert_eq!(parse_duration("90s").unwrap(), Duration::seconds(90));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::milliseconds(500));
        assert_eq!(parse_duration("15m").unwrap(), Duration::minutes(15));
        assert_eq!(parse_duration("10us").unwrap(), Duration::microseconds(10));
        assert_eq!(parse_duration("10µs").unwrap(), Duration::microseconds(10));
        assert_eq!(parse_duration("7ns").unwrap(), Duration::nanoseconds(7));
    }

    #[test]
    fn test_parse_duration_compound_and_fraction() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration(".5s").unwrap(), Duration::milliseconds(500));
        assert_eq!(
            parse_duration("2m3.25s").unwrap(),
            Duration::milliseconds(123_250)
        );
    }

    #[test]
    fn test_parse_duration_sign_and_zero() {
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("-0").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("0s").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("-5m").unwrap(), Duration::minutes(-5));
        assert_eq!(parse_duration("+1h").unwrap(), Duration::hours(1));
    }

    #[test]
    fn test_parse_duration_rejects() {
        for bad in ["", "-", "h", "10", "1d", "1h30", "1..5h", "abc", "1 h", "."] {
            assert!(parse_duration(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_parse_duration_out_of_range() {
        assert!(parse_duration("9999999999999h").is_err());
    }

    #[test]
    fn test_page_params_defaults() {
        let params = PageParams::default();
        assert_eq!(params.cursor(10).unwrap(), PageCursor::new(10, 0));

        let params = PageParams {
            limit: Some(String::new()),
            offset: Some(" ".into()),
        };
        assert_eq!(params.cursor(25).unwrap(), PageCursor::new(25, 0));
    }

    #[test]
    fn test_page_params_values() {
        let params = PageParams {
            limit: Some("5".into()),
            offset: Some("15".into()),
        };
        assert_eq!(params.cursor(10).unwrap(), PageCursor::new(5, 15));

        let params = PageParams {
            limit: Some("0".into()),
            offset: None,
        };
        assert_eq!(params.cursor(10).unwrap().limit, 0);
    }

    #[test]
    fn test_page_params_rejects_negative_and_garbage() {
        let params = PageParams {
            limit: Some("-1".into()),
            offset: None,
        };
        assert!(params.cursor(10).unwrap_err().contains("limit"));

        let params = PageParams {
            limit: None,
            offset: Some("ten".into()),
        };
        assert!(params.cursor(10).unwrap_err().contains("offset"));
    }

    #[test]
    fn test_chart_params() {
        let defaults = ChartRequest::default();
        assert_eq!(ChartParams::default().request(defaults).unwrap(), defaults);

        let params = ChartParams {
            period: Some("24h".into()),
            interval: None,
        };
        let request = params.request(defaults).unwrap();
        assert_eq!(request.period, Duration::hours(24));
        assert_eq!(request.interval, Duration::hours(1));

        let params = ChartParams {
            period: None,
            interval: Some("soon".into()),
        };
        assert!(params.request(defaults).unwrap_err().contains("interval"));
    }

    #[test]
    fn test_chart_params_pass_non_positive_through() {
        let params = ChartParams {
            period: None,
            interval: Some("0s".into()),
        };
        let request = params.request(ChartRequest::default()).unwrap();
        assert_eq!(request.interval, Duration::ZERO);
    }

    #[test]
    fn test_record_params() {
        let params = RecordParams {
            temperature: Some("21.5".into()),
            humidity: Some("48".into()),
        };
        assert_eq!(params.values().unwrap(), (21.5, 48.0));

        let params = RecordParams {
            temperature: Some("-999".into()),
            humidity: Some("50".into()),
        };
        assert_eq!(params.values().unwrap(), (-999.0, 50.0));
    }

    #[test]
    fn test_record_params_errors() {
        let missing_both = RecordParams::default();
        assert_eq!(missing_both.values().unwrap_err(), "temperature is required");

        let missing_humidity = RecordParams {
            temperature: Some("abc".into()),
            humidity: None,
        };
        assert_eq!(missing_humidity.values().unwrap_err(), "humidity is required");

        let bad_temperature = RecordParams {
            temperature: Some("warm".into()),
            humidity: Some("50".into()),
        };
        assert_eq!(
            bad_temperature.values().unwrap_err(),
            "temperature must be a number"
        );

        let nan = RecordParams {
            temperature: Some("20".into()),
            humidity: Some("NaN".into()),
        };
        assert_eq!(nan.values().unwrap_err(), "humidity must be a number");
    }
}
