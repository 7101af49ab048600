//! # Quickdraw Duel
//!
//! A deterministic, millisecond-accurate reflex-duel core: two combatants (a
//! human player and a computer opponent) race to react to a signal raised
//! after an unpredictable delay, with penalties for jumping the gun.
//!
//! The crate models exactly two things and nothing else:
//!
//! - the [`DuelStateMachine`]: the single source of truth for round phase,
//!   attack timestamps, false-start detection, and winner resolution, and
//! - the [`RoundOrchestrator`]: a poll-driven sequencer that drives the state
//!   machine through the `Ready → Waiting → Signal → Resolve → Results`
//!   cycle, owns every randomized timing decision, and chains rounds into a
//!   first-to-N match.
//!
//! Rendering, audio, menus, and device polling live outside this crate. The
//! boundary is narrow: the host injects a [`Clock`] and an [`AttackInput`]
//! gate, forwards physical presses via
//! [`RoundOrchestrator::register_player_attack`], calls
//! [`RoundOrchestrator::advance`] once per scheduler tick, and drains
//! [`DuelEvent`]s from [`RoundOrchestrator::events`]. There are no callbacks.
//!
//! ```
//! use quickdraw_duel::{DuelBuilder, DuelEvent, ManualClock, InputGate, RoundConfig};
//!
//! let clock = ManualClock::new();
//! let mut duel = DuelBuilder::new()
//!     .with_round_config(RoundConfig::standard())
//!     .with_seed(42)
//!     .with_clock(Box::new(clock.clone()))
//!     .with_attack_input(Box::new(InputGate::new()))
//!     .start()?;
//!
//! loop {
//!     duel.advance();
//!     for event in duel.events() {
//!         if let DuelEvent::RoundEnded { outcome, .. } = event {
//!             println!("round over: {outcome:?}");
//!         }
//!     }
//!     clock.step(0.016);
//!     # break;
//! }
//! # Ok::<(), quickdraw_duel::DuelError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use builder::DuelBuilder;
pub use clock::{Clock, ManualClock, RealClock};
pub use config::{MatchConfig, RoundConfig};
pub use duel::DuelStateMachine;
pub use error::DuelError;
pub use input::{AttackInput, InputGate};
pub use orchestrator::RoundOrchestrator;
pub use score::MatchRecord;

pub mod builder;
pub mod clock;
pub mod config;
pub mod duel;
pub mod error;
pub mod input;
pub mod orchestrator;
pub mod rng;
pub mod score;

// #############
// #   ENUMS   #
// #############

/// The round's current stage in the fixed
/// `Ready → Waiting → Signal → Resolve → Results` sequence.
///
/// Exactly one phase is active at a time. Progression is linear with two
/// shortcuts: `Waiting → Results` (false start) and `Resolve → Results`
/// (resolution or timeout). No other transitions are legal, and the
/// [`DuelStateMachine`] is the only component that performs them.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub enum Phase {
    /// The round record has been reset; the waiting window has not opened yet.
    #[default]
    Ready,
    /// The unpredictable delay before the signal. Attacking now is a false start.
    Waiting,
    /// The signal has been raised; reaction timing has begun.
    Signal,
    /// The resolve window: attacks are timed against the signal to pick a winner.
    Resolve,
    /// The round is over. Terminal until [`DuelStateMachine::reset_round`].
    Results,
}

/// How a round ended. Computed exactly once, at the moment of entering
/// [`Phase::Results`].
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub enum Outcome {
    /// No outcome yet; the round has not reached [`Phase::Results`].
    #[default]
    None,
    /// Somebody attacked before the signal. See
    /// [`DuelStateMachine::player_false_start`] for attribution.
    FalseStart,
    /// The player reacted sooner (lower elapsed time wins).
    PlayerWin,
    /// The AI reacted sooner.
    AiWin,
    /// Both reaction times fell within the draw threshold.
    Draw,
    /// Neither side attacked before the resolve timeout.
    NoAttack,
}

/// One of the two combatants.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Side {
    /// The human player.
    Player,
    /// The computer opponent.
    Ai,
}

/// Notifications drained from [`RoundOrchestrator::events`]. Handling them is
/// up to the host; the core makes no assumption about listener latency or
/// presence.
///
/// Per round, exactly one [`DuelEvent::RoundEnded`] is emitted; per match,
/// exactly one [`DuelEvent::MatchEnded`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DuelEvent {
    /// The round moved to a new phase.
    PhaseChanged {
        /// The phase just entered.
        phase: Phase,
    },
    /// The signal was raised. Emitted in addition to the
    /// [`DuelEvent::PhaseChanged`] for [`Phase::Signal`] because listeners
    /// need a distinct cue to start reaction playback; the exact raise time
    /// is stored in the round record ([`DuelStateMachine::signal_time`]).
    SignalRaised,
    /// The round reached [`Phase::Results`].
    RoundEnded {
        /// How the round ended.
        outcome: Outcome,
        /// The player's reaction time in milliseconds, absent if the player
        /// never attacked (or the round ended by false start).
        player_reaction_ms: Option<f64>,
    },
    /// The match score changed.
    ScoreChanged {
        /// Rounds won by the player so far.
        player_wins: u32,
        /// Rounds won by the AI so far.
        ai_wins: u32,
    },
    /// A side reached the win target. No further rounds start afterwards.
    MatchEnded {
        /// The side that won the match.
        winner: Side,
    },
}

// #########
// # TESTS #
// #########
