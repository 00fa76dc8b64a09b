//! Free-form order-text grammar (spec.md §6, "sketch" — detailed parser out
//! of scope, so this implements a reasonable reading of the one worked
//! example rather than a full natural-language parser).
//!
//! `W0/638台灣雲林縣麥寮鄉中山路103號 15:30` → fleet `W`, dispatch code `0/638`
//! (discarded — not part of the data model), address text, optional trailing
//! clock time.

use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use rc_common::{Fleet, RcError, Result};
use regex::Regex;

fn trailing_time_re() -> Regex {
    Regex::new(r"\s+(\d{1,2}):(\d{2})\s*$").expect("static pattern")
}

fn leading_code_re() -> Regex {
    Regex::new(r"^([A-Za-z])[0-9/\-]*").expect("static pattern")
}

pub struct ParsedOrder {
    pub fleet: Fleet,
    pub ori_text: String,
    pub scheduled_at: Option<DateTime<Utc>>,
}

fn fleet_from_code(code: char) -> Result<Fleet> {
    match code.to_ascii_uppercase() {
        'R' => Ok(Fleet::Rsk),
        'K' => Ok(Fleet::Kd),
        'W' => Ok(Fleet::Wei),
        other => Err(RcError::ParseError(format!("unknown fleet code '{other}'"))),
    }
}

/// Resolves `HH:MM` to the next future occurrence of that clock time in the
/// local timezone, converted to UTC (spec.md §6: "next occurrence of that
/// clock time").
fn next_occurrence(hour: u32, minute: u32) -> Result<DateTime<Utc>> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| RcError::ParseError(format!("invalid time {hour:02}:{minute:02}")))?;

    let now = Local::now();
    let mut candidate = now.date_naive().and_time(time);
    if candidate <= now.naive_local() {
        candidate += chrono::Duration::days(1);
    }

    Local
        .from_local_datetime(&candidate)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| RcError::ParseError("ambiguous local time".to_string()))
}

pub fn parse(raw: &str) -> Result<ParsedOrder> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RcError::ParseError("empty order text".to_string()));
    }

    let (body, scheduled_at) = match trailing_time_re().captures(raw) {
        Some(caps) => {
            let hour: u32 = caps[1].parse().map_err(|_| RcError::ParseError("bad hour".to_string()))?;
            let minute: u32 = caps[2].parse().map_err(|_| RcError::ParseError("bad minute".to_string()))?;
            let body = raw[..caps.get(0).unwrap().start()].to_string();
            (body, Some(next_occurrence(hour, minute)?))
        }
        None => (raw.to_string(), None),
    };

    let leading = leading_code_re()
        .captures(&body)
        .ok_or_else(|| RcError::ParseError("missing fleet code".to_string()))?;
    let fleet_char = leading[1].chars().next().unwrap();
    let fleet = fleet_from_code(fleet_char)?;
    let ori_text = body[leading.get(0).unwrap().end()..].trim().to_string();

    if ori_text.is_empty() {
        return Err(RcError::ParseError("empty order address".to_string()));
    }

    Ok(ParsedOrder {
        fleet,
        ori_text,
        scheduled_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wei_instant_order() {
        let parsed = parse("W0/638台灣雲林縣麥寮鄉中山路103號").unwrap();
        assert_eq!(parsed.fleet, Fleet::Wei);
        assert_eq!(parsed.ori_text, "台灣雲林縣麥寮鄉中山路103號");
        assert!(parsed.scheduled_at.is_none());
    }

    #[test]
    fn parses_scheduled_order_with_trailing_time() {
        let parsed = parse("W0/638台灣雲林縣麥寮鄉中山路103號 15:30").unwrap();
        assert_eq!(parsed.fleet, Fleet::Wei);
        assert_eq!(parsed.ori_text, "台灣雲林縣麥寮鄉中山路103號");
        assert!(parsed.scheduled_at.is_some());
    }

    #[test]
    fn rejects_unknown_fleet_code() {
        assert!(parse("Z0/638somewhere").is_err());
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse("   ").is_err());
    }
}
