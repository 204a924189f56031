//! Clock arithmetic for shifts: `HH:MM` parsing, shift intervals, and
//! overnight-aware rest computation between consecutive days.

use crate::error::{Result, SolveError};
use crate::spec::ShiftDef;

pub const MINUTES_PER_DAY: i32 = 24 * 60;

/// Strict `HH:MM` shape check: five chars, colon at index 2, two digit
/// pairs, hours 0-23, minutes 0-59.
pub fn is_hhmm(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return false;
    }
    let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
    if !digits.iter().all(u8::is_ascii_digit) {
        return false;
    }
    let hh = (bytes[0] - b'0') as i32 * 10 + (bytes[1] - b'0') as i32;
    let mm = (bytes[3] - b'0') as i32 * 10 + (bytes[4] - b'0') as i32;
    hh <= 23 && mm <= 59
}

/// Minutes from midnight for an `HH:MM` string.
pub fn parse_hhmm(value: &str) -> Result<i32> {
    if !is_hhmm(value) {
        return Err(SolveError::SpecInvalidValue(format!(
            "'{value}' is not a valid HH:MM time"
        )));
    }
    let hh: i32 = value[..2].parse().unwrap_or(0);
    let mm: i32 = value[3..].parse().unwrap_or(0);
    Ok(hh * 60 + mm)
}

/// A shift definition resolved to minute offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftInterval {
    /// Start, minutes from midnight.
    pub start: i32,
    /// End, minutes from midnight; less than `start` for overnight shifts.
    pub end: i32,
    /// Declared duration, or the wall-clock span when the declaration is
    /// zero for a work shift.
    pub duration: i32,
}

/// Resolves a shift definition into a [`ShiftInterval`].
///
/// `start` and `end` are required here; the validator has already warned
/// about definitions it could not see at all.
pub fn shift_interval(sid: &str, def: &ShiftDef) -> Result<ShiftInterval> {
    let start_str = def
        .start
        .as_deref()
        .ok_or_else(|| SolveError::SpecMissingField(format!("shifts['{sid}'].start")))?;
    let end_str = def
        .end
        .as_deref()
        .ok_or_else(|| SolveError::SpecMissingField(format!("shifts['{sid}'].end")))?;

    let start = parse_hhmm(start_str)?;
    let end = parse_hhmm(end_str)?;

    let declared = def.minutes.unwrap_or(0);
    let mut duration = i32::try_from(declared)
        .map_err(|_| SolveError::Internal(format!("shifts['{sid}'].minutes overflows")))?;
    if duration == 0 && def.is_work.unwrap_or(true) {
        duration = if end >= start {
            end - start
        } else {
            (MINUTES_PER_DAY - start) + end
        };
    }

    Ok(ShiftInterval { start, end, duration })
}

/// Minutes of rest between shift `a` on day `d` and shift `b` on day `d+1`.
///
/// An overnight `a` ends on day `d+1`, shrinking the gap; the result can go
/// negative for very long overnight shifts, which any non-negative rest
/// threshold then rejects.
pub fn rest_minutes_between(a: &ShiftInterval, b: &ShiftInterval) -> i32 {
    let a_end_abs = if a.end >= a.start {
        a.end
    } else {
        MINUTES_PER_DAY + a.end
    };
    let b_start_abs = MINUTES_PER_DAY + b.start;
    b_start_abs - a_end_abs
}
