//! Duel construction.
//!
//! The [`DuelBuilder`] is the only way to obtain a [`RoundOrchestrator`].
//! Construction is where the fatal configuration errors of a duel live: a
//! missing clock, a missing input adapter, or a malformed range refuses to
//! start rather than run with undefined behavior. A misconfigured duel
//! simply never starts; once started, nothing the orchestrator does can
//! fail.

use crate::config::{MatchConfig, RoundConfig};
use crate::orchestrator::RoundOrchestrator;
use crate::rng::Pcg32;
use crate::{AttackInput, Clock, DuelError};

/// Builds a [`RoundOrchestrator`].
///
/// # Example
///
/// ```
/// use quickdraw_duel::{DuelBuilder, InputGate, ManualClock, RoundConfig};
///
/// let duel = DuelBuilder::new()
///     .with_round_config(RoundConfig::hair_trigger())
///     .with_win_target(5)?
///     .with_seed(7)
///     .with_clock(Box::new(ManualClock::new()))
///     .with_attack_input(Box::new(InputGate::new()))
///     .start()?;
/// # let _ = duel;
/// # Ok::<(), quickdraw_duel::DuelError>(())
/// ```
#[must_use = "DuelBuilder must be consumed by calling start()"]
pub struct DuelBuilder {
    round_config: RoundConfig,
    match_config: MatchConfig,
    clock: Option<Box<dyn Clock>>,
    attack_input: Option<Box<dyn AttackInput>>,
    rng: Option<Pcg32>,
}

impl std::fmt::Debug for DuelBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Destructure so a new field cannot be forgotten here.
        let Self {
            round_config,
            match_config,
            clock,
            attack_input,
            rng,
        } = self;
        f.debug_struct("DuelBuilder")
            .field("round_config", round_config)
            .field("match_config", match_config)
            .field("has_clock", &clock.is_some())
            .field("has_attack_input", &attack_input.is_some())
            .field("seeded", &rng.is_some())
            .finish()
    }
}

impl Default for DuelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DuelBuilder {
    /// Constructs a builder with default configurations and no collaborators.
    pub fn new() -> Self {
        Self {
            round_config: RoundConfig::default(),
            match_config: MatchConfig::default(),
            clock: None,
            attack_input: None,
            rng: None,
        }
    }

    /// Sets the per-round timing configuration. Validated at
    /// [`start`](Self::start).
    pub fn with_round_config(mut self, config: RoundConfig) -> Self {
        self.round_config = config;
        self
    }

    /// Sets the match configuration. Validated at [`start`](Self::start).
    pub fn with_match_config(mut self, config: MatchConfig) -> Self {
        self.match_config = config;
        self
    }

    /// Sets the round wins required to take the match. Default is 3.
    ///
    /// # Errors
    /// Returns [`DuelError::ZeroWinTarget`] if `win_target` is 0.
    pub fn with_win_target(mut self, win_target: u32) -> Result<Self, DuelError> {
        if win_target == 0 {
            return Err(DuelError::ZeroWinTarget);
        }
        self.match_config.win_target = win_target;
        Ok(self)
    }

    /// Injects the monotonic real-time source. Required.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Injects the attack-input gate. Required.
    pub fn with_attack_input(mut self, input: Box<dyn AttackInput>) -> Self {
        self.attack_input = Some(input);
        self
    }

    /// Seeds the orchestrator's RNG so every randomized timing decision of
    /// the match is reproducible. Defaults to an entropy seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Some(Pcg32::seed_from_u64(seed));
        self
    }

    /// Validates the configuration and starts a match at round one.
    ///
    /// # Errors
    /// - [`DuelError::MissingClock`] / [`DuelError::MissingAttackInput`] if a
    ///   required collaborator was not injected.
    /// - Range, probability, and duration errors from
    ///   [`RoundConfig::validate`] and [`MatchConfig::validate`].
    pub fn start(self) -> Result<RoundOrchestrator, DuelError> {
        self.round_config.validate()?;
        self.match_config.validate()?;
        let clock = self.clock.ok_or(DuelError::MissingClock)?;
        let attack_input = self.attack_input.ok_or(DuelError::MissingAttackInput)?;
        let rng = self.rng.unwrap_or_else(Pcg32::from_entropy);
        Ok(RoundOrchestrator::new(
            self.round_config,
            self.match_config,
            clock,
            attack_input,
            rng,
        ))
    }
}
