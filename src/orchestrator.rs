//! The round orchestrator: a time-driven sequencer that advances the duel
//! state machine through full rounds and chains rounds into a match.
//!
//! The orchestrator is poll-driven: the host calls
//! [`RoundOrchestrator::advance`] once per scheduler tick,
//! forwards physical presses to
//! [`RoundOrchestrator::register_player_attack`], and drains notifications
//! from [`RoundOrchestrator::events`]. Internally a round is an explicit
//! sequence of suspension points ([`RoundStep`]) advanced against the
//! injected real-time clock, so simulated slow motion or pause on the
//! rendering side never affects duel fairness.
//!
//! All randomized decisions live here: the waiting duration, whether and
//! when the AI jumps the signal, and the AI reaction delay. The state
//! machine itself stays deterministic.

use std::collections::vec_deque::Drain;
use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::config::{MatchConfig, RoundConfig};
use crate::duel::DuelStateMachine;
use crate::rng::Pcg32;
use crate::score::MatchRecord;
use crate::{AttackInput, Clock, DuelEvent, Phase};

/// Earliest instant, in seconds after the waiting window opens, at which a
/// jumpy AI can false-start.
const AI_JUMP_EARLIEST_SECS: f64 = 0.3;
/// Latest AI false-start instant, as a fraction of the drawn wait duration.
const AI_JUMP_LATEST_FRAC: f64 = 0.8;
/// Cap on undrained notifications; the oldest are dropped past this.
const MAX_EVENT_QUEUE_SIZE: usize = 100;

/// Where the current round sits between suspension points.
///
/// One `advance()` call moves at most one step, except that deadlines which
/// have all expired by the time of the call are processed in order within
/// that call.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RoundStep {
    /// The round record was just reset; one tick of yield before the waiting
    /// window opens, so observers settle and a same-instant press cannot be
    /// misattributed to the new round.
    Armed,
    /// The unpredictable delay before the signal.
    Waiting {
        /// When the waiting window opened.
        opened_at: f64,
        /// The drawn wait duration in seconds.
        wait: f64,
        /// If the AI decided to jump the gun this round, the absolute time
        /// at which it will.
        ai_jump_at: Option<f64>,
    },
    /// The signal is up; fixed visibility delay before the resolve window.
    SignalHold {
        /// When the resolve window opens.
        until: f64,
        /// The absolute time at which the AI reacts, measured from the
        /// signal raise.
        ai_fire_at: f64,
    },
    /// The resolve window: waiting for attacks or the timeout.
    Resolving {
        /// Forced-resolution deadline.
        deadline: f64,
        /// Pending AI reaction, `None` once fired.
        ai_fire_at: Option<f64>,
    },
    /// The results screen hold before the next round (or the match end).
    ResultsHold {
        /// When the hold expires.
        until: f64,
    },
    /// The match is over; no further rounds start.
    Finished,
}

impl RoundStep {
    /// Shifts every absolute deadline by `delta` seconds (pause support).
    fn shift(&mut self, delta: f64) {
        match self {
            RoundStep::Armed | RoundStep::Finished => {}
            RoundStep::Waiting {
                opened_at,
                ai_jump_at,
                ..
            } => {
                *opened_at += delta;
                if let Some(jump) = ai_jump_at.as_mut() {
                    *jump += delta;
                }
            }
            RoundStep::SignalHold { until, ai_fire_at } => {
                *until += delta;
                *ai_fire_at += delta;
            }
            RoundStep::Resolving {
                deadline,
                ai_fire_at,
            } => {
                *deadline += delta;
                if let Some(fire) = ai_fire_at.as_mut() {
                    *fire += delta;
                }
            }
            RoundStep::ResultsHold { until } => {
                *until += delta;
            }
        }
    }
}

/// Drives the [`DuelStateMachine`] through rounds and keeps the match score.
///
/// Construct via [`DuelBuilder`](crate::DuelBuilder); a fresh orchestrator is
/// already armed for round one, and the first [`advance`](Self::advance)
/// opens the waiting window.
pub struct RoundOrchestrator {
    round_config: RoundConfig,
    match_config: MatchConfig,
    clock: Box<dyn Clock>,
    attack_input: Box<dyn AttackInput>,
    rng: Pcg32,
    duel: DuelStateMachine,
    score: MatchRecord,
    step: RoundStep,
    events: VecDeque<DuelEvent>,
    paused_at: Option<f64>,
}

impl std::fmt::Debug for RoundOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundOrchestrator")
            .field("phase", &self.duel.phase())
            .field("step", &self.step)
            .field("score", &self.score)
            .field("paused", &self.paused_at.is_some())
            .field("pending_events", &self.events.len())
            .finish()
    }
}

impl RoundOrchestrator {
    pub(crate) fn new(
        round_config: RoundConfig,
        match_config: MatchConfig,
        clock: Box<dyn Clock>,
        attack_input: Box<dyn AttackInput>,
        rng: Pcg32,
    ) -> Self {
        let mut orchestrator = Self {
            round_config,
            match_config,
            clock,
            attack_input,
            rng,
            duel: DuelStateMachine::new(),
            score: MatchRecord::new(match_config.win_target),
            step: RoundStep::Armed,
            events: VecDeque::new(),
            paused_at: None,
        };
        orchestrator.arm_round();
        let now = orchestrator.clock.now();
        orchestrator.pump_duel_events(now);
        orchestrator
    }

    // ############
    // # COMMANDS #
    // ############

    /// Advances the round by one scheduler tick.
    ///
    /// Reads the injected clock once and moves the current suspension point
    /// if its condition is met. Call this every tick of the host's
    /// simulation loop; a no-op while paused or after the match ends.
    pub fn advance(&mut self) {
        if self.paused_at.is_some() {
            return;
        }
        let now = self.clock.now();
        match self.step {
            RoundStep::Armed => self.open_waiting_window(now),
            RoundStep::Waiting {
                opened_at,
                wait,
                ai_jump_at,
            } => self.poll_waiting(now, opened_at, wait, ai_jump_at),
            RoundStep::SignalHold { until, ai_fire_at } => {
                self.poll_signal_hold(now, until, ai_fire_at);
            }
            RoundStep::Resolving {
                deadline,
                ai_fire_at,
            } => self.poll_resolving(now, deadline, ai_fire_at),
            RoundStep::ResultsHold { until } => self.poll_results_hold(now, until),
            RoundStep::Finished => {}
        }
        self.pump_duel_events(now);
    }

    /// Forwards a physical attack press from the host's input layer.
    ///
    /// Ignored while paused or while the input gate is disabled; the state
    /// machine's phase check remains the authoritative guard beyond that.
    pub fn register_player_attack(&mut self) {
        if self.paused_at.is_some() {
            trace!("player attack ignored: paused");
            return;
        }
        if !self.attack_input.is_enabled() {
            trace!("player attack ignored: input gate disabled");
            return;
        }
        let now = self.clock.now();
        self.duel.register_player_attack(now);
        self.pump_duel_events(now);
    }

    /// Suspends all round timers and polling. The round record is left
    /// untouched; resume with [`resume`](Self::resume) or discard the round
    /// with [`abandon_round`](Self::abandon_round).
    pub fn pause(&mut self) {
        if self.paused_at.is_none() {
            let now = self.clock.now();
            debug!(now, "duel paused");
            self.paused_at = Some(now);
        }
    }

    /// Resumes after [`pause`](Self::pause), shifting every pending deadline
    /// and the round record's time base by the pause duration so reaction
    /// math is unaffected.
    pub fn resume(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            let delta = (self.clock.now() - paused_at).max(0.0);
            debug!(delta, "duel resumed");
            self.step.shift(delta);
            self.duel.shift_time_base(delta);
        }
    }

    /// Discards the round in progress and arms a fresh one. The match score
    /// is untouched. A no-op once the match has finished.
    pub fn abandon_round(&mut self) {
        if self.step == RoundStep::Finished {
            return;
        }
        debug!("round abandoned");
        self.paused_at = None;
        self.arm_round();
        let now = self.clock.now();
        self.pump_duel_events(now);
    }

    /// Resets the match score and starts over at round one.
    pub fn restart_match(&mut self) {
        debug!("match restarted");
        self.score = MatchRecord::new(self.match_config.win_target);
        self.paused_at = None;
        self.arm_round();
        let now = self.clock.now();
        self.pump_duel_events(now);
    }

    // #############
    // # ACCESSORS #
    // #############

    /// Drains all queued notifications, oldest first.
    pub fn events(&mut self) -> Drain<'_, DuelEvent> {
        self.events.drain(..)
    }

    /// The state machine's current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.duel.phase()
    }

    /// Read access to the duel state machine and its round record.
    #[must_use]
    pub fn duel(&self) -> &DuelStateMachine {
        &self.duel
    }

    /// The match score.
    #[must_use]
    pub fn match_record(&self) -> &MatchRecord {
        &self.score
    }

    /// Whether the orchestrator is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// The per-round configuration this duel runs with.
    #[must_use]
    pub fn round_config(&self) -> &RoundConfig {
        &self.round_config
    }

    // #############
    // # INTERNALS #
    // #############

    /// Per-round step 1: reset the record, disable input, clear the press
    /// latch, and yield one tick before the waiting window opens.
    fn arm_round(&mut self) {
        self.duel.reset_round();
        self.attack_input.set_enabled(false);
        self.attack_input.reset_latch();
        self.step = RoundStep::Armed;
    }

    /// Opens the waiting window and draws this round's randomized decisions.
    fn open_waiting_window(&mut self, now: f64) {
        self.duel.enter_waiting();
        self.attack_input.set_enabled(true);
        // Equal bounds are a legal configuration; gen_range_f64 collapses an
        // empty range to its start.
        let wait = self
            .rng
            .gen_range_f64(self.round_config.wait_min_secs..self.round_config.wait_max_secs);
        let ai_jump_at = if self.rng.gen_bool(self.round_config.ai_false_start_chance) {
            let latest = AI_JUMP_LATEST_FRAC * wait;
            let offset = if latest > AI_JUMP_EARLIEST_SECS {
                self.rng.gen_range_f64(AI_JUMP_EARLIEST_SECS..latest)
            } else {
                latest
            };
            Some(now + offset)
        } else {
            None
        };
        debug!(wait, ai_jumps = ai_jump_at.is_some(), "waiting window open");
        self.step = RoundStep::Waiting {
            opened_at: now,
            wait,
            ai_jump_at,
        };
    }

    fn poll_waiting(&mut self, now: f64, opened_at: f64, wait: f64, ai_jump_at: Option<f64>) {
        // A player false start already moved the machine to Results; the
        // event pump has scheduled the results hold and replaced this step.
        if self.duel.phase() != Phase::Waiting {
            trace!("waiting poll ended: phase moved externally");
            return;
        }
        if let Some(jump) = ai_jump_at {
            if now >= jump {
                self.duel.trigger_false_start();
                return;
            }
        }
        if now - opened_at >= wait {
            self.duel.enter_signal(now);
            let delay_ms = self.rng.gen_range_f64(
                self.round_config.ai_react_min_ms..self.round_config.ai_react_max_ms,
            );
            debug!(delay_ms, "signal raised, AI reaction drawn");
            self.step = RoundStep::SignalHold {
                until: now + self.round_config.signal_settle_secs,
                // Reaction delay is measured from the signal raise, not from
                // the resolve window opening.
                ai_fire_at: now + delay_ms / 1000.0,
            };
        }
    }

    fn poll_signal_hold(&mut self, now: f64, until: f64, ai_fire_at: f64) {
        // An AI reaction landing inside the settle window is recorded, not
        // lost; resolution waits for the resolve window.
        if now >= ai_fire_at && !self.duel.ai_attacked() {
            // Recorded at the scheduled reaction instant, not the polling
            // instant, so the host tick rate never skews AI reaction times.
            self.duel
                .register_ai_attack(ai_fire_at, self.round_config.draw_threshold_ms);
        }
        if now >= until {
            self.duel.enter_resolve();
            if self.duel.ai_attacked() {
                // Both sides have had their chance; close the round out now.
                self.duel.resolve_winner(self.round_config.draw_threshold_ms);
                return;
            }
            self.step = RoundStep::Resolving {
                deadline: now + self.round_config.resolve_timeout_secs,
                ai_fire_at: Some(ai_fire_at),
            };
        }
    }

    fn poll_resolving(&mut self, now: f64, deadline: f64, ai_fire_at: Option<f64>) {
        if self.duel.phase() != Phase::Resolve {
            return;
        }
        if let Some(fire) = ai_fire_at {
            if now >= fire {
                // Registering in Resolve resolves the round immediately. The
                // scheduled instant is recorded so tick rate never skews the
                // AI's reaction time.
                self.duel
                    .register_ai_attack(fire, self.round_config.draw_threshold_ms);
                self.step = RoundStep::Resolving {
                    deadline,
                    ai_fire_at: None,
                };
                return;
            }
        }
        if now >= deadline {
            debug!("resolve timeout; forcing resolution");
            self.duel.resolve_winner(self.round_config.draw_threshold_ms);
        }
    }

    fn poll_results_hold(&mut self, now: f64, until: f64) {
        if now < until {
            return;
        }
        if self.score.is_finished() {
            self.step = RoundStep::Finished;
        } else {
            self.arm_round();
        }
    }

    /// Moves the state machine's queued notifications into the public queue,
    /// applying match bookkeeping when a round ends.
    ///
    /// Seeing [`DuelEvent::RoundEnded`] here is the single place the
    /// orchestrator reacts to a round ending, whichever path ended it
    /// (attack registration, forced false start, or timeout), so AI timers
    /// are always cancelled and the results hold always scheduled.
    fn pump_duel_events(&mut self, now: f64) {
        let player_false_start = self.duel.player_false_start();
        let mut ended = None;
        for event in self.duel.events() {
            if let DuelEvent::RoundEnded { outcome, .. } = event {
                ended = Some(outcome);
            }
            self.events.push_back(event);
        }
        if let Some(outcome) = ended {
            // Cancels any pending AI deadline: the step carrying it is
            // replaced before the next advance() can observe it.
            self.attack_input.set_enabled(false);
            let update = self.score.apply(outcome, player_false_start);
            if update.awarded.is_some() {
                self.events.push_back(DuelEvent::ScoreChanged {
                    player_wins: self.score.player_wins(),
                    ai_wins: self.score.ai_wins(),
                });
            }
            if let Some(winner) = update.match_winner {
                self.events.push_back(DuelEvent::MatchEnded { winner });
            }
            self.step = RoundStep::ResultsHold {
                until: now + self.round_config.results_hold_secs,
            };
        }
        while self.events.len() > MAX_EVENT_QUEUE_SIZE {
            self.events.pop_front();
        }
    }
}

// #########
// # TESTS #
// #########
