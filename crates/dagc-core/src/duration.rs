// SPDX-License-Identifier: MIT OR Apache-2.0
//! Duration parsing and serde helpers.
//!
//! Integer-second fields become [`std::time::Duration`] directly.
//! String-duration fields accept the suffix grammar `s`, `m`, `h`, `d`
//! (seconds, minutes, hours, days), optionally combined (`1h30m`).

use std::time::Duration;

use crate::error::{ErrorCode, ValidationError};

/// Parse a duration string against the `s`/`m`/`h`/`d` suffix grammar.
///
/// A bare integer (no suffix) is interpreted as whole seconds, matching the
/// integer-second builder convention.
///
/// # Errors
/// `InvalidDuration` if the string is empty, has an unrecognized suffix, or
/// the numeric portion does not parse.
pub fn parse_duration(field: &str, raw: &str) -> Result<Duration, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::new(
            field,
            ErrorCode::InvalidDuration,
            "duration must not be empty",
        ));
    }
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut digits = String::new();
    let mut matched_any = false;
    for ch in raw.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            digits.push(ch);
            continue;
        }
        let unit_secs: f64 = match ch {
            's' => 1.0,
            'm' => 60.0,
            'h' => 3600.0,
            'd' => 86_400.0,
            _ => {
                return Err(ValidationError::new(
                    field,
                    ErrorCode::InvalidDuration,
                    format!("unrecognized duration suffix '{ch}' in '{raw}'"),
                ))
            }
        };
        let amount: f64 = digits.parse().map_err(|_| {
            ValidationError::new(
                field,
                ErrorCode::InvalidDuration,
                format!("invalid numeric component in '{raw}'"),
            )
        })?;
        total += Duration::from_secs_f64(amount * unit_secs);
        digits.clear();
        matched_any = true;
    }
    if !digits.is_empty() || !matched_any {
        return Err(ValidationError::new(
            field,
            ErrorCode::InvalidDuration,
            format!("could not parse duration '{raw}'"),
        ));
    }
    Ok(total)
}

/// Serde (de)serialization as whole seconds, accepting either an integer or
/// a duration string on input and always emitting an integer on output.
pub mod as_secs {
    use super::{parse_duration, Duration};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a [`Duration`] as whole seconds.
    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        value.as_secs().serialize(s)
    }

    /// Deserialize a [`Duration`] from either an integer or a duration string.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Secs(u64),
            Text(String),
        }
        match Repr::deserialize(d)? {
            Repr::Secs(secs) => Ok(Duration::from_secs(secs)),
            Repr::Text(text) => parse_duration("duration", &text)
                .map_err(|e| serde::de::Error::custom(e.to_string())),
        }
    }

    /// Same as [`deserialize`] but for `Option<Duration>`.
    pub mod option {
        use super::{parse_duration, Duration};
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        /// Serialize an `Option<Duration>` as whole seconds.
        pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
            value.map(|d| d.as_secs()).serialize(s)
        }

        /// Deserialize an `Option<Duration>` from either an integer or a string.
        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
            #[derive(Deserialize)]
            #[serde(untagged)]
            enum Repr {
                Secs(u64),
                Text(String),
            }
            let maybe = Option::<Repr>::deserialize(d)?;
            match maybe {
                None => Ok(None),
                Some(Repr::Secs(secs)) => Ok(Some(Duration::from_secs(secs))),
                Some(Repr::Text(text)) => parse_duration("duration", &text)
                    .map(Some)
                    .map_err(|e| serde::de::Error::custom(e.to_string())),
            }
        }
    }
}
