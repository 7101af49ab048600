//! Round and match configuration.
//!
//! Configuration is owned by the caller, immutable per round, and validated
//! once at construction: a malformed range refuses to start the duel rather
//! than producing undefined timing mid-round.

use crate::DuelError;

/// Timing parameters for a single round.
///
/// All durations are real (unscaled) time. A host typically deserializes
/// this from its settings file and hands it to
/// [`DuelBuilder::with_round_config`].
///
/// # Example
///
/// ```
/// use quickdraw_duel::RoundConfig;
///
/// // A twitchier opponent than the default.
/// let config = RoundConfig {
///     ai_react_min_ms: 140.0,
///     ai_react_max_ms: 220.0,
///     ..RoundConfig::standard()
/// };
/// assert!(config.validate().is_ok());
/// ```
///
/// [`DuelBuilder::with_round_config`]: crate::DuelBuilder::with_round_config
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// Lower bound of the unpredictable waiting window, in seconds. Must be
    /// positive.
    pub wait_min_secs: f64,
    /// Upper bound of the waiting window, in seconds. Must be at least
    /// `wait_min_secs`.
    pub wait_max_secs: f64,
    /// Lower bound of the AI reaction delay, in milliseconds from the signal.
    pub ai_react_min_ms: f64,
    /// Upper bound of the AI reaction delay, in milliseconds from the signal.
    pub ai_react_max_ms: f64,
    /// Probability per round that the AI jumps the signal, in `[0.0, 1.0]`.
    pub ai_false_start_chance: f64,
    /// How long the results screen holds before the next round starts, in
    /// seconds.
    pub results_hold_secs: f64,
    /// Maximum difference between the two reaction times still scored as a
    /// draw, in milliseconds.
    pub draw_threshold_ms: f64,
    /// Fixed delay between the signal being raised and the resolve window
    /// opening, in seconds. Exists so the signal is visible before
    /// resolution begins; real-time and not skippable.
    pub signal_settle_secs: f64,
    /// Ceiling on the resolve window, in seconds. Guarantees forward
    /// progress when neither side ever attacks.
    pub resolve_timeout_secs: f64,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            wait_min_secs: 1.5,
            wait_max_secs: 4.0,
            ai_react_min_ms: 180.0,
            ai_react_max_ms: 320.0,
            ai_false_start_chance: 0.08,
            results_hold_secs: 2.0,
            draw_threshold_ms: 1.0,
            signal_settle_secs: 0.150,
            resolve_timeout_secs: 3.0,
        }
    }
}

impl RoundConfig {
    /// The default tuning: a fair mid-skill opponent.
    #[must_use]
    pub fn standard() -> Self {
        Self::default()
    }

    /// A fast, disciplined opponent: short reaction window, no false starts.
    #[must_use]
    pub fn hair_trigger() -> Self {
        Self {
            ai_react_min_ms: 130.0,
            ai_react_max_ms: 200.0,
            ai_false_start_chance: 0.0,
            ..Self::default()
        }
    }

    /// A slow, jumpy opponent for practice: long reactions, frequent false
    /// starts, long results hold.
    #[must_use]
    pub fn training() -> Self {
        Self {
            ai_react_min_ms: 350.0,
            ai_react_max_ms: 600.0,
            ai_false_start_chance: 0.25,
            results_hold_secs: 3.0,
            ..Self::default()
        }
    }

    /// Checks every field against its legal domain.
    pub fn validate(&self) -> Result<(), DuelError> {
        valid_range(
            "wait_range_secs",
            self.wait_min_secs,
            self.wait_max_secs,
            false,
        )?;
        valid_range(
            "ai_reaction_range_ms",
            self.ai_react_min_ms,
            self.ai_react_max_ms,
            true,
        )?;
        if !self.ai_false_start_chance.is_finite()
            || !(0.0..=1.0).contains(&self.ai_false_start_chance)
        {
            return Err(DuelError::InvalidProbability {
                field: "ai_false_start_chance",
                value: self.ai_false_start_chance,
            });
        }
        non_negative("results_hold_secs", self.results_hold_secs)?;
        non_negative("draw_threshold_ms", self.draw_threshold_ms)?;
        non_negative("signal_settle_secs", self.signal_settle_secs)?;
        if !self.resolve_timeout_secs.is_finite() || self.resolve_timeout_secs <= 0.0 {
            return Err(DuelError::InvalidDuration {
                field: "resolve_timeout_secs",
                value: self.resolve_timeout_secs,
            });
        }
        Ok(())
    }
}

fn valid_range(
    field: &'static str,
    min: f64,
    max: f64,
    zero_min_ok: bool,
) -> Result<(), DuelError> {
    let min_ok = min.is_finite() && if zero_min_ok { min >= 0.0 } else { min > 0.0 };
    if !min_ok || !max.is_finite() || min > max {
        return Err(DuelError::InvalidRange { field, min, max });
    }
    Ok(())
}

fn non_negative(field: &'static str, value: f64) -> Result<(), DuelError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DuelError::InvalidDuration { field, value });
    }
    Ok(())
}

/// Match-level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Round wins required to take the match. Must be at least 1.
    pub win_target: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self { win_target: 3 }
    }
}

impl MatchConfig {
    /// Checks the win target.
    pub fn validate(&self) -> Result<(), DuelError> {
        if self.win_target == 0 {
            return Err(DuelError::ZeroWinTarget);
        }
        Ok(())
    }
}
