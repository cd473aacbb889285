//! Leaf classification ladder.
//!
//! The first matching rule wins, in this order: time, empty array, null,
//! fixed value, word list, integer, real, free text. Reordering changes the
//! generated model for ambiguous witness sets.
use std::collections::BTreeSet;

use chrono::format::{Fixed, Item, Numeric, Pad, StrftimeItems};

use crate::schema::{LeafNode, Literal};

#[derive(Clone, Copy, Debug)]
pub struct ClassifyOptions<'a> {
    pub date_formats: &'a [String],
    pub max_enum_values: usize,
    pub free_text_extras: &'a [String],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
    Unsigned,
    /// an optional leading sign is accepted
    Optional,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Classification {
    Time { format: String },
    EmptyArray,
    Null,
    Fixed { value: Literal },
    Enumeration { values: Vec<Literal> },
    Integer { sign: Sign },
    Real { sign: Sign },
    FreeText { extras: String },
}

pub fn classify(leaf: &LeafNode, opts: &ClassifyOptions<'_>) -> Classification {
    let reps: Vec<&Literal> = leaf.witnesses.iter().filter_map(Literal::representative).collect();

    if let Some(format) = matching_date_format(&reps, opts.date_formats) {
        return Classification::Time { format: format.to_string() };
    }
    if leaf.is_empty_array() {
        return Classification::EmptyArray;
    }
    if leaf.is_null_only() {
        return Classification::Null;
    }
    if leaf.witnesses.len() == 1 {
        if let Some(value) = reps.first() {
            return Classification::Fixed { value: (*value).clone() };
        }
    }
    if leaf.witnesses.len() <= opts.max_enum_values && !reps.is_empty() {
        let values: BTreeSet<Literal> = reps.iter().map(|r| (*r).clone()).collect();
        return Classification::Enumeration { values: values.into_iter().collect() };
    }
    if !reps.is_empty() && reps.iter().all(|r| matches!(r, Literal::Integer(_))) {
        return Classification::Integer { sign: sign_of(&reps) };
    }
    if !reps.is_empty() && reps.iter().all(|r| matches!(r, Literal::Integer(_) | Literal::Real(_))) {
        return Classification::Real { sign: sign_of(&reps) };
    }

    let texts: Vec<&str> = leaf.witnesses.iter().flat_map(Literal::texts).collect();
    let extras = opts
        .free_text_extras
        .iter()
        .filter(|token| texts.iter().any(|t| t.contains(token.as_str())))
        .map(String::as_str)
        .collect();
    Classification::FreeText { extras }
}

fn sign_of(reps: &[&Literal]) -> Sign {
    let non_negative = reps.iter().all(|r| match r {
        Literal::Integer(i) => *i >= 0,
        Literal::Real(x) => x.0 >= 0.0,
        _ => false,
    });
    if non_negative { Sign::Unsigned } else { Sign::Optional }
}

/// First configured format every representative matches.
fn matching_date_format<'f>(reps: &[&Literal], formats: &'f [String]) -> Option<&'f str> {
    if reps.is_empty() {
        return None;
    }
    formats
        .iter()
        .find(|format| reps.iter().all(|r| r.as_text().is_some_and(|s| matches_date_format(format, s))))
        .map(String::as_str)
}

// ---------------------------- Date formats -------------------------------- //

pub fn validate_date_format(format: &str) -> Result<(), String> {
    if format.is_empty() {
        return Err("date format must not be empty".into());
    }
    if StrftimeItems::new(format).any(|item| !is_supported(&item)) {
        return Err(format!("unsupported specifier in date format '{format}'"));
    }
    Ok(())
}

fn is_supported(item: &Item<'_>) -> bool {
    match item {
        Item::Literal(_) | Item::OwnedLiteral(_) | Item::Space(_) | Item::OwnedSpace(_) | Item::Numeric(..) => true,
        Item::Fixed(fixed) => matches!(
            fixed,
            Fixed::ShortMonthName
                | Fixed::LongMonthName
                | Fixed::ShortWeekdayName
                | Fixed::LongWeekdayName
                | Fixed::LowerAmPm
                | Fixed::UpperAmPm
                | Fixed::TimezoneName
                | Fixed::Nanosecond
                | Fixed::Nanosecond3
                | Fixed::Nanosecond6
                | Fixed::Nanosecond9
                | Fixed::TimezoneOffset
                | Fixed::TimezoneOffsetZ
                | Fixed::TimezoneOffsetColon
                | Fixed::TimezoneOffsetColonZ
                | Fixed::TimezoneOffsetDoubleColon
                | Fixed::TimezoneOffsetTripleColon
        ),
        _ => false,
    }
}

/// Literal shape match of `s` against a strftime pattern.
///
/// Literals must match exactly, whitespace items need at least one
/// whitespace character, numeric specifiers take a bounded run of digits and
/// textual specifiers take a run of letters. No calendar checks.
pub fn matches_date_format(format: &str, s: &str) -> bool {
    let mut rest = s;
    for item in StrftimeItems::new(format) {
        let next = match item {
            Item::Literal(lit) => rest.strip_prefix(lit),
            Item::OwnedLiteral(lit) => rest.strip_prefix(&*lit),
            Item::Space(_) | Item::OwnedSpace(_) => {
                let trimmed = rest.trim_start();
                (trimmed.len() < rest.len()).then_some(trimmed)
            }
            Item::Numeric(numeric, pad) => {
                let rest = if pad == Pad::Space { rest.trim_start_matches(' ') } else { rest };
                take_digits(rest, numeric_width(&numeric))
            }
            Item::Fixed(fixed) => take_fixed(rest, &fixed),
            _ => None,
        };
        match next {
            Some(r) => rest = r,
            None => return false,
        }
    }
    rest.is_empty()
}

fn numeric_width(numeric: &Numeric) -> usize {
    match numeric {
        Numeric::Year | Numeric::IsoYear => 4,
        Numeric::Nanosecond => 9,
        Numeric::Ordinal => 3,
        Numeric::NumDaysFromSun | Numeric::WeekdayFromMon => 1,
        Numeric::Timestamp => usize::MAX,
        _ => 2,
    }
}

fn take_digits(s: &str, max: usize) -> Option<&str> {
    let n = s.bytes().take(max).take_while(u8::is_ascii_digit).count();
    (n > 0).then(|| &s[n..])
}

fn take_exact_digits(s: &str, n: usize) -> Option<&str> {
    (s.len() >= n && s.as_bytes()[..n].iter().all(u8::is_ascii_digit)).then(|| &s[n..])
}

fn take_while(s: &str, pred: impl Fn(char) -> bool) -> Option<&str> {
    let end = s.char_indices().find(|(_, c)| !pred(*c)).map_or(s.len(), |(i, _)| i);
    (end > 0).then(|| &s[end..])
}

/// `[+-]` then `groups` two-digit fields, colon-separated when `colon`.
fn take_offset(s: &str, allow_z: bool, groups: usize, colon: bool) -> Option<&str> {
    if allow_z {
        if let Some(r) = s.strip_prefix('Z') {
            return Some(r);
        }
    }
    let mut rest = s.strip_prefix(['+', '-'])?;
    for i in 0..groups {
        if i > 0 && colon {
            rest = rest.strip_prefix(':')?;
        }
        rest = take_exact_digits(rest, 2)?;
    }
    Some(rest)
}

fn take_fixed<'s>(s: &'s str, fixed: &Fixed) -> Option<&'s str> {
    match fixed {
        Fixed::ShortMonthName
        | Fixed::LongMonthName
        | Fixed::ShortWeekdayName
        | Fixed::LongWeekdayName
        | Fixed::LowerAmPm
        | Fixed::UpperAmPm
        | Fixed::TimezoneName => take_while(s, char::is_alphabetic),
        Fixed::Nanosecond => match s.strip_prefix('.') {
            Some(r) => take_digits(r, 9),
            None => Some(s),
        },
        Fixed::Nanosecond3 => take_exact_digits(s.strip_prefix('.')?, 3),
        Fixed::Nanosecond6 => take_exact_digits(s.strip_prefix('.')?, 6),
        Fixed::Nanosecond9 => take_exact_digits(s.strip_prefix('.')?, 9),
        Fixed::TimezoneOffset => take_offset(s, false, 2, false),
        Fixed::TimezoneOffsetZ => take_offset(s, true, 2, false),
        Fixed::TimezoneOffsetColon => take_offset(s, false, 2, true),
        Fixed::TimezoneOffsetColonZ => take_offset(s, true, 2, true),
        Fixed::TimezoneOffsetDoubleColon => take_offset(s, false, 3, true),
        Fixed::TimezoneOffsetTripleColon => take_offset(s, false, 1, true),
        // rejected by validate_date_format
        _ => None,
    }
}

// ------------------------------- Tests ------------------------------------ //
