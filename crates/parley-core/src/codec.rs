//! Default wire format for signal callback tokens.
//!
//! Keyboards carry signals through the messenger's native callback-data
//! mechanism, which on most platforms is a short opaque string. This module
//! provides the default textual encoding adapters can reuse:
//!
//! ```text
//! SignalName:value1:value2
//! ```
//!
//! Values containing `:` are wrapped in double quotes; an absent optional
//! value encodes as the empty string. Platforms cap callback payloads
//! aggressively (Telegram at 64 bytes), so oversized tokens are logged as
//! warnings at encode time.
//!
//! A signal opts into the format by implementing [`WireSignal`]:
//!
//! ```rust,ignore
//! impl WireSignal for PillSelected {
//!     fn wire_name() -> &'static str {
//!         "PillSelected"
//!     }
//!
//!     fn to_fields(&self) -> Vec<String> {
//!         vec![self.pill.clone()]
//!     }
//!
//!     fn from_fields(fields: &[String]) -> CodecResult<Self> {
//!         Ok(Self {
//!             pill: codec::parse_field("PillSelected", fields, 0)?,
//!         })
//!     }
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::{CodecError, CodecResult};
use crate::signal::Signal;

/// Longest token most platforms accept verbatim.
const TOKEN_LIMIT: usize = 64;

/// A signal that can round-trip through the default wire format.
pub trait WireSignal: Signal + Sized {
    /// The name prefix used in tokens. Must be stable across releases,
    /// because pressed buttons may carry tokens encoded by an older
    /// process.
    fn wire_name() -> &'static str;

    /// Field values in declaration order. `None` fields encode as `""`.
    fn to_fields(&self) -> Vec<String>;

    /// Rebuilds the signal from decoded field values.
    fn from_fields(fields: &[String]) -> CodecResult<Self>;
}

/// Encodes a signal into a callback token.
pub fn encode<S: WireSignal>(signal: &S) -> String {
    let mut token = String::from(S::wire_name());
    for value in signal.to_fields() {
        token.push(':');
        if value.contains(':') {
            token.push('"');
            token.push_str(&value);
            token.push('"');
        } else {
            token.push_str(&value);
        }
    }

    if token.len() >= TOKEN_LIMIT {
        warn!(
            signal = S::wire_name(),
            bytes = token.len(),
            "encoded token may be truncated by the platform"
        );
    }

    token
}

/// Decodes a callback token into a signal of the expected type.
pub fn decode<S: WireSignal>(token: &str) -> CodecResult<S> {
    let (name, rest) = match token.split_once(':') {
        Some((name, rest)) => (name, Some(rest)),
        None => (token, None),
    };

    if name != S::wire_name() {
        return Err(CodecError::NameMismatch {
            expected: S::wire_name(),
            got: name.to_string(),
        });
    }

    let fields = match rest {
        Some(rest) => split_fields(rest)?,
        None => Vec::new(),
    };

    S::from_fields(&fields)
}

/// Returns the signal name prefix of a token without decoding it.
///
/// Adapters use this to pick the signal type to decode as.
pub fn peek_name(token: &str) -> &str {
    token.split_once(':').map_or(token, |(name, _)| name)
}

/// Parses one positional field with `FromStr`.
pub fn parse_field<T>(signal: &'static str, fields: &[String], index: usize) -> CodecResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = fields.get(index).ok_or(CodecError::Field {
        signal,
        index,
        reason: "missing".to_string(),
    })?;
    raw.parse().map_err(|err: T::Err| CodecError::Field {
        signal,
        index,
        reason: err.to_string(),
    })
}

/// Splits the value part of a token on `:`, honoring quoted values.
fn split_fields(rest: &str) -> CodecResult<Vec<String>> {
    let mut fields = Vec::new();
    let mut chars = rest.chars().peekable();

    loop {
        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '"' {
                    closed = true;
                    break;
                }
                value.push(ch);
            }
            if !closed {
                return Err(CodecError::malformed("unterminated quote"));
            }
            // A quoted value must run to the next separator.
            match chars.next() {
                None => {
                    fields.push(value);
                    break;
                }
                Some(':') => {
                    fields.push(value);
                    continue;
                }
                Some(ch) => {
                    return Err(CodecError::Malformed {
                        reason: format!("unexpected '{ch}' after closing quote"),
                    });
                }
            }
        }

        let mut terminated = false;
        for ch in chars.by_ref() {
            if ch == ':' {
                terminated = true;
                break;
            }
            value.push(ch);
        }
        fields.push(value);
        if !terminated {
            break;
        }
    }

    Ok(fields)
}
