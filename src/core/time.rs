use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

pub(crate) fn format_offset(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_else(|_| value.to_string())
}

pub(crate) fn format_date(value: Date) -> String {
    value.format(format_description!("[year]-[month]-[day]")).unwrap_or_else(|_| value.to_string())
}

/// Parses an ISO-8601 date-time. Values without an offset (as produced by
/// `<input type="datetime-local">`) are taken as UTC. The result is UTC.
pub(crate) fn parse_datetime(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();

    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(value.to_offset(UtcOffset::UTC));
    }

    let naive = PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(raw, format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"))
    })
    .or_else(|_| PrimitiveDateTime::parse(raw, format_description!("[year]-[month]-[day]T[hour]:[minute]")))
    .ok()?;

    Some(naive.assume_utc())
}

/// Parses a calendar date in `YYYY-MM-DD` form.
pub(crate) fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}
