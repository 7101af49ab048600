//! Construction-time errors.

use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// Errors returned while constructing a duel. Construction is the only
/// fallible surface of this crate: once a [`RoundOrchestrator`] has started,
/// timing anomalies (duplicate attacks, out-of-window attacks, resolve
/// without a signal) are part of normal operation and are handled as silent
/// no-ops, never as errors.
///
/// [`RoundOrchestrator`]: crate::RoundOrchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum DuelError {
    /// No clock was supplied to the builder. A duel cannot run without a
    /// monotonic real-time source.
    MissingClock,
    /// No attack-input adapter was supplied to the builder.
    MissingAttackInput,
    /// A configured range has `min > max` or a bound outside its legal domain.
    InvalidRange {
        /// Which range was malformed, e.g. `"wait_range"`.
        field: &'static str,
        /// The configured lower bound.
        min: f64,
        /// The configured upper bound.
        max: f64,
    },
    /// A probability was outside `[0.0, 1.0]`.
    InvalidProbability {
        /// Which field held the probability.
        field: &'static str,
        /// The configured value.
        value: f64,
    },
    /// A duration was negative, non-finite, or zero where a positive value is
    /// required.
    InvalidDuration {
        /// Which field held the duration.
        field: &'static str,
        /// The configured value, in the field's own unit.
        value: f64,
    },
    /// The match win target was zero.
    ZeroWinTarget,
}

impl Display for DuelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuelError::MissingClock => {
                write!(f, "no clock was provided; a duel cannot run without one")
            }
            DuelError::MissingAttackInput => {
                write!(
                    f,
                    "no attack-input adapter was provided; a duel cannot run without one"
                )
            }
            DuelError::InvalidRange { field, min, max } => {
                write!(f, "invalid range for {}: [{}, {}]", field, min, max)
            }
            DuelError::InvalidProbability { field, value } => {
                write!(
                    f,
                    "invalid probability for {}: {} (must be within [0.0, 1.0])",
                    field, value
                )
            }
            DuelError::InvalidDuration { field, value } => {
                write!(f, "invalid duration for {}: {}", field, value)
            }
            DuelError::ZeroWinTarget => {
                write!(f, "match win target must be at least 1")
            }
        }
    }
}

impl Error for DuelError {}
