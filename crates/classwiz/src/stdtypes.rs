//! Standard Types
//!
//! Time types registered in every standard registry:
//!
//! - `time.Duration`: a span of microseconds, built from any mix of weeks,
//!   days, hours, minutes, seconds, milliseconds and microseconds
//! - `time.TimeZone`: a fixed UTC offset with an optional name
//! - `time.DateTime`: a calendar date and time with an optional zone
//!
//! None of them has an introspectable signature; their annotations are
//! registered explicitly.

use std::any::Any;
use std::sync::Arc;

use crate::registry::{AttributeSource, Registry};
use crate::types::{ClassId, ClassSpec, TypeExpr};
use crate::value::{Arguments, Reflect, Value};

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND;
const MAX_DAYS: i64 = 999_999_999;

/// Module of the standard time types
pub const MODULE: &str = "time";

/// Span of time with microsecond resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration {
    micros: i64,
}

impl Duration {
    /// Duration of `micros` microseconds
    pub fn from_micros(micros: i64) -> Result<Self, String> {
        if micros.div_euclid(MICROS_PER_DAY).abs() > MAX_DAYS {
            return Err(format!("days must have magnitude <= {MAX_DAYS}"));
        }
        Ok(Self { micros })
    }

    /// Total microseconds
    pub fn total_micros(&self) -> i64 {
        self.micros
    }

    /// Whole days, rounded toward negative infinity
    pub fn days(&self) -> i64 {
        self.micros.div_euclid(MICROS_PER_DAY)
    }

    /// Seconds within the day, `0..86400`
    pub fn seconds(&self) -> i64 {
        self.micros.rem_euclid(MICROS_PER_DAY) / MICROS_PER_SECOND
    }

    /// Microseconds within the second, `0..1_000_000`
    pub fn microseconds(&self) -> i64 {
        self.micros.rem_euclid(MICROS_PER_SECOND)
    }

    fn construct(mut args: Arguments) -> Result<Value, String> {
        let units = [
            ("weeks", 7.0 * MICROS_PER_DAY as f64),
            ("days", MICROS_PER_DAY as f64),
            ("hours", 3_600.0 * MICROS_PER_SECOND as f64),
            ("minutes", 60.0 * MICROS_PER_SECOND as f64),
            ("seconds", MICROS_PER_SECOND as f64),
            ("milliseconds", 1_000.0),
            ("microseconds", 1.0),
        ];
        let mut total = 0.0;
        for (name, scale) in units {
            if let Some(amount) = args.take_float(name)? {
                total += amount * scale;
            }
        }
        args.finish()?;

        if !total.is_finite() || total.abs() > (MAX_DAYS + 1) as f64 * MICROS_PER_DAY as f64 {
            return Err("duration out of range".to_string());
        }
        Ok(Value::object(Duration::from_micros(total.round() as i64)?))
    }
}

impl Reflect for Duration {
    fn type_name(&self) -> &str {
        "time.Duration"
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "days" => Some(Value::Int(self.days())),
            "seconds" => Some(Value::Int(self.seconds())),
            "microseconds" => Some(Value::Int(self.microseconds())),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Fixed offset from UTC
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimeZone {
    offset: Duration,
    name: Option<String>,
}

impl TimeZone {
    /// Zone at `offset` from UTC; the offset must lie strictly within a day
    pub fn new(offset: Duration, name: Option<String>) -> Result<Self, String> {
        if offset.total_micros().abs() >= MICROS_PER_DAY {
            return Err("offset must be strictly between -24 hours and 24 hours".to_string());
        }
        Ok(Self { offset, name })
    }

    /// Offset from UTC
    pub fn utc_offset(&self) -> Duration {
        self.offset
    }

    /// Explicit name, if one was given
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Explicit name, or `UTC±HH:MM` derived from the offset
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let micros = self.offset.total_micros();
        if micros == 0 {
            return "UTC".to_string();
        }
        let sign = if micros < 0 { '-' } else { '+' };
        let minutes = micros.abs() / (60 * MICROS_PER_SECOND);
        format!("UTC{sign}{:02}:{:02}", minutes / 60, minutes % 60)
    }

    fn construct(mut args: Arguments) -> Result<Value, String> {
        let offset = match args.require("offset")? {
            Value::Object(instance) => instance
                .as_any()
                .downcast_ref::<Duration>()
                .copied()
                .ok_or_else(|| format!("offset must be a Duration, got {}", instance.type_name()))?,
            other => return Err(format!("offset must be a Duration, got {}", other.type_label())),
        };
        let name = args.take_str("name")?;
        args.finish()?;
        Ok(Value::object(TimeZone::new(offset, name)?))
    }
}

impl Reflect for TimeZone {
    fn type_name(&self) -> &str {
        "time.TimeZone"
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "utc_offset" => Some(Value::object(self.offset)),
            "tz_name" => self.name.clone().map(Value::Str),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Calendar date and time of day
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateTime {
    /// Year, `1..=9999`
    pub year: i64,
    /// Month, `1..=12`
    pub month: i64,
    /// Day of month
    pub day: i64,
    /// Hour, `0..24`
    pub hour: i64,
    /// Minute, `0..60`
    pub minute: i64,
    /// Second, `0..60`
    pub second: i64,
    /// Microsecond, `0..1_000_000`
    pub microsecond: i64,
    /// Zone, if aware
    pub tzinfo: Option<TimeZone>,
}

fn days_in_month(year: i64, month: i64) -> i64 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        _ => 28,
    }
}

impl DateTime {
    fn construct(mut args: Arguments) -> Result<Value, String> {
        let year = args.take_int("year")?.ok_or("missing required argument 'year'")?;
        let month = args.take_int("month")?.ok_or("missing required argument 'month'")?;
        let day = args.take_int("day")?.ok_or("missing required argument 'day'")?;
        let hour = args.take_int("hour")?.unwrap_or(0);
        let minute = args.take_int("minute")?.unwrap_or(0);
        let second = args.take_int("second")?.unwrap_or(0);
        let microsecond = args.take_int("microsecond")?.unwrap_or(0);
        let tzinfo = match args.take("tzinfo") {
            None | Some(Value::None) => None,
            Some(Value::Object(instance)) => Some(
                instance
                    .as_any()
                    .downcast_ref::<TimeZone>()
                    .cloned()
                    .ok_or_else(|| format!("tzinfo must be a TimeZone, got {}", instance.type_name()))?,
            ),
            Some(other) => return Err(format!("tzinfo must be a TimeZone, got {}", other.type_label())),
        };
        args.finish()?;

        let checks = [
            ("year", year, 1, 10_000),
            ("month", month, 1, 13),
            ("hour", hour, 0, 24),
            ("minute", minute, 0, 60),
            ("second", second, 0, 60),
            ("microsecond", microsecond, 0, MICROS_PER_SECOND),
        ];
        for (name, value, low, high) in checks {
            if value < low || value >= high {
                return Err(format!("{name} must be in {low}..{}", high - 1));
            }
        }
        let max_day = days_in_month(year, month);
        if day < 1 || day > max_day {
            return Err(format!("day is out of range for month (1..{max_day})"));
        }

        Ok(Value::object(DateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
            microsecond,
            tzinfo,
        }))
    }
}

impl Reflect for DateTime {
    fn type_name(&self) -> &str {
        "time.DateTime"
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        Some(match name {
            "year" => Value::Int(self.year),
            "month" => Value::Int(self.month),
            "day" => Value::Int(self.day),
            "hour" => Value::Int(self.hour),
            "minute" => Value::Int(self.minute),
            "second" => Value::Int(self.second),
            "microsecond" => Value::Int(self.microsecond),
            "tzinfo" => match &self.tzinfo {
                Some(tz) => Value::Object(Arc::new(tz.clone())),
                None => Value::None,
            },
            _ => return None,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Handles of the standard types inside one registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdTypes {
    /// `time.Duration`
    pub duration: ClassId,
    /// `time.TimeZone`
    pub timezone: ClassId,
    /// `time.DateTime`
    pub datetime: ClassId,
}

/// Register the standard types, their annotations and conversion rules
pub fn install(registry: &Registry) -> StdTypes {
    let duration = registry.register_class(
        ClassSpec::structure(MODULE, "Duration")
            .no_signature()
            .constructor(Duration::construct),
    );
    registry.register_annotations(
        duration,
        [
            "days",
            "seconds",
            "microseconds",
            "milliseconds",
            "minutes",
            "hours",
            "weeks",
        ]
        .map(|unit| (unit, TypeExpr::FLOAT)),
    );

    let timezone = registry.register_class(
        ClassSpec::structure(MODULE, "TimeZone")
            .no_signature()
            .constructor(TimeZone::construct),
    );
    registry.register_annotations(
        timezone,
        [
            ("offset", TypeExpr::class(duration)),
            ("name", TypeExpr::STR),
        ],
    );
    registry.register_object_objectinfo_rule(
        timezone,
        [
            (
                "offset",
                AttributeSource::getter(|obj| {
                    let tz = obj.as_any().downcast_ref::<TimeZone>()?;
                    Some(Value::object(tz.utc_offset()))
                }),
            ),
            ("name", AttributeSource::from("tz_name")),
        ],
    );

    let datetime = registry.register_class(
        ClassSpec::structure(MODULE, "DateTime")
            .no_signature()
            .constructor(DateTime::construct),
    );
    let optional_int = TypeExpr::optional(TypeExpr::INT);
    registry.register_annotations(
        datetime,
        [
            ("year", TypeExpr::INT),
            ("month", optional_int.clone()),
            ("day", optional_int),
            ("hour", TypeExpr::INT),
            ("minute", TypeExpr::INT),
            ("second", TypeExpr::INT),
            ("microsecond", TypeExpr::INT),
            ("tzinfo", TypeExpr::class(timezone)),
        ],
    );

    StdTypes {
        duration,
        timezone,
        datetime,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClasswizConfig;
    use crate::convert::Converter;
    use crate::object_info::InfoValue;

    fn converter() -> (Converter, StdTypes) {
        let registry = Arc::new(Registry::new());
        let std = install(&registry);
        (Converter::new(registry, ClasswizConfig::default()), std)
    }

    #[test]
    fn test_duration_normalizes() {
        let mut args = Arguments::new();
        args.insert("hours", Value::Int(25));
        args.insert("milliseconds", Value::Float(1.5));
        let value = Duration::construct(args).unwrap();
        let duration = value
            .as_instance()
            .unwrap()
            .as_any()
            .downcast_ref::<Duration>()
            .copied()
            .unwrap();

        assert_eq!(duration.days(), 1);
        assert_eq!(duration.seconds(), 3_600);
        assert_eq!(duration.microseconds(), 1_500);
    }

    #[test]
    fn test_negative_duration_components() {
        let duration = Duration::from_micros(-1).unwrap();
        assert_eq!(duration.days(), -1);
        assert_eq!(duration.seconds(), 86_399);
        assert_eq!(duration.microseconds(), 999_999);
    }

    #[test]
    fn test_duration_rejects_unknown_unit() {
        let args = Arguments::single("fortnights", Value::Int(1));
        assert!(Duration::construct(args).is_err());
    }

    #[test]
    fn test_timezone_round_trip() {
        let (converter, std) = converter();
        let tz = TimeZone::new(Duration::from_micros(3_600 * MICROS_PER_SECOND).unwrap(), Some("CET".into())).unwrap();
        assert_eq!(tz.display_name(), "CET");

        let info = converter.decompose(&Value::object(tz.clone()));
        let object = info.as_info().unwrap();
        assert_eq!(object.class(), std.timezone);
        assert_eq!(object.get("name"), Some(&InfoValue::Str("CET".into())));
        let offset = object.get("offset").unwrap().as_info().unwrap();
        assert_eq!(offset.get("seconds"), Some(&InfoValue::Int(3_600)));

        let rebuilt = converter.materialize(&info).unwrap();
        let rebuilt = rebuilt.as_instance().unwrap().as_any().downcast_ref::<TimeZone>().cloned();
        assert_eq!(rebuilt, Some(tz));
    }

    #[test]
    fn test_unnamed_zone_display() {
        let tz = TimeZone::new(Duration::from_micros(-5 * 3_600 * MICROS_PER_SECOND - 30 * 60 * MICROS_PER_SECOND).unwrap(), None).unwrap();
        assert_eq!(tz.display_name(), "UTC-05:30");
        assert!(TimeZone::new(Duration::from_micros(MICROS_PER_DAY).unwrap(), None).is_err());
    }

    #[test]
    fn test_datetime_validation() {
        let mut args = Arguments::new();
        args.insert("year", Value::Int(2023));
        args.insert("month", Value::Int(2));
        args.insert("day", Value::Int(29));
        assert!(DateTime::construct(args).is_err());

        let mut args = Arguments::new();
        args.insert("year", Value::Int(2024));
        args.insert("month", Value::Int(2));
        args.insert("day", Value::Int(29));
        args.insert("hour", Value::Int(23));
        assert!(DateTime::construct(args).is_ok());

        let args = Arguments::single("year", Value::Int(2024));
        assert_eq!(
            DateTime::construct(args).unwrap_err(),
            "missing required argument 'month'"
        );
    }

    #[test]
    fn test_datetime_round_trip_with_zone() {
        let (converter, std) = converter();
        let dt = DateTime {
            year: 2024,
            month: 5,
            day: 17,
            hour: 8,
            minute: 30,
            second: 0,
            microsecond: 0,
            tzinfo: Some(TimeZone::new(Duration::default(), None).unwrap()),
        };

        let info = converter.decompose(&Value::object(dt.clone()));
        assert_eq!(info.as_info().unwrap().class(), std.datetime);
        let zone = info.as_info().unwrap().get("tzinfo").unwrap().as_info().unwrap();
        assert!(zone.get("name").is_none());

        let rebuilt = converter.materialize(&info).unwrap();
        let rebuilt = rebuilt.as_instance().unwrap().as_any().downcast_ref::<DateTime>().cloned();
        assert_eq!(rebuilt, Some(dt));
    }
}
