//! Helpers for contract tests.
//!
//! [`assert_rejected`] asserts that an operation fails, optionally checking
//! the failure against a message, a pattern or a predicate. The fixtures
//! mirror the values contract tests pass around.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use alloy_primitives::{Address, B256, U256};
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{Error, Result};

pub use crate::signing::{random_uint, CHAIN_ID, NULL_SIG};

pub const ZERO_ADDRESS: Address = Address::ZERO;
pub const ZERO_BYTES32: B256 = B256::ZERO;

/// Token decimals used by [`to_tokens`].
pub const TOKEN_DECIMALS: u32 = 18;

/// Convert a decimal token amount such as `"0.5"` to base units (18 decimals).
pub fn to_tokens(amount: &str) -> Result<U256> {
    let invalid = |reason: &str| Error::Amount {
        message: format!("`{amount}`: {reason}"),
    };

    let value = Decimal::from_str(amount.trim()).map_err(|e| invalid(&e.to_string()))?;
    if value.is_sign_negative() {
        return Err(invalid("negative"));
    }
    if value.scale() > TOKEN_DECIMALS {
        return Err(invalid("more than 18 decimal places"));
    }

    // value == mantissa * 10^-scale
    let mantissa = U256::from(value.mantissa() as u128);
    let factor = U256::from(10u64).pow(U256::from(TOKEN_DECIMALS - value.scale()));
    Ok(mantissa * factor)
}

/// What a rejection has to look like for [`assert_rejected`] to pass.
pub enum RejectionMatch<E> {
    /// Any error.
    Any,
    /// The error's display text equals this string.
    Message(String),
    /// The error's display text matches this pattern.
    Pattern(Regex),
    /// The error satisfies this predicate (typically a variant check).
    Kind(Box<dyn Fn(&E) -> bool + Send + Sync>),
}

impl<E> RejectionMatch<E> {
    pub fn message(message: impl Into<String>) -> Self {
        RejectionMatch::Message(message.into())
    }

    pub fn pattern(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Ok(RejectionMatch::Pattern(Regex::new(pattern)?))
    }

    pub fn kind(predicate: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        RejectionMatch::Kind(Box::new(predicate))
    }
}

impl<E> fmt::Debug for RejectionMatch<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionMatch::Any => f.write_str("Any"),
            RejectionMatch::Message(message) => f.debug_tuple("Message").field(message).finish(),
            RejectionMatch::Pattern(regex) => f.debug_tuple("Pattern").field(regex).finish(),
            RejectionMatch::Kind(_) => f.write_str("Kind(..)"),
        }
    }
}

/// A failed rejection assertion. Distinct from the error under test.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectionAssertion {
    #[error("{}", resolved_message(.context))]
    Resolved { context: Option<String> },

    #[error("expected rejection `{expected}`, got `{actual}`{}", suffix(.context))]
    MessageMismatch {
        expected: String,
        actual: String,
        context: Option<String>,
    },

    #[error("'{actual}' does not match {pattern}{}", suffix(.context))]
    PatternMismatch {
        pattern: String,
        actual: String,
        context: Option<String>,
    },

    #[error("rejection `{actual}` is not of the expected kind{}", suffix(.context))]
    KindMismatch {
        actual: String,
        context: Option<String>,
    },
}

fn resolved_message(context: &Option<String>) -> &str {
    context
        .as_deref()
        .unwrap_or("Expected future to be rejected")
}

fn suffix(context: &Option<String>) -> String {
    context
        .as_deref()
        .map(|context| format!(": {context}"))
        .unwrap_or_default()
}

/// Await `future` and assert that it fails in a way `matcher` accepts.
///
/// Returns the rejection on success so callers can inspect it further.
pub async fn assert_rejected<T, E, F>(
    future: F,
    matcher: RejectionMatch<E>,
    message: Option<&str>,
) -> std::result::Result<E, RejectionAssertion>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: fmt::Display,
{
    let context = message.map(str::to_string);

    let error = match future.await {
        Ok(_) => return Err(RejectionAssertion::Resolved { context }),
        Err(error) => error,
    };

    match &matcher {
        RejectionMatch::Any => Ok(error),
        RejectionMatch::Message(expected) => {
            let actual = error.to_string();
            if &actual == expected {
                Ok(error)
            } else {
                Err(RejectionAssertion::MessageMismatch {
                    expected: expected.clone(),
                    actual,
                    context,
                })
            }
        }
        RejectionMatch::Pattern(regex) => {
            let actual = error.to_string();
            if regex.is_match(&actual) {
                Ok(error)
            } else {
                Err(RejectionAssertion::PatternMismatch {
                    pattern: regex.as_str().to_string(),
                    actual,
                    context,
                })
            }
        }
        RejectionMatch::Kind(predicate) => {
            if predicate(&error) {
                Ok(error)
            } else {
                Err(RejectionAssertion::KindMismatch {
                    actual: error.to_string(),
                    context,
                })
            }
        }
    }
}
