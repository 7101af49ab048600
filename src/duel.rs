//! The duel state machine: the single source of truth for round phase and
//! timing, and the only component allowed to decide outcomes.
//!
//! The machine is purely reactive. It never reads a clock and never schedules
//! anything; callers (normally the [`RoundOrchestrator`]) feed it commands
//! with real-time values and drain the notifications it queues. Anomalous
//! commands (attacks outside the legal window, duplicate attacks, resolving
//! before a signal) are expected races between real-time input and phase
//! transitions; they are ignored silently rather than surfaced as errors.
//!
//! [`RoundOrchestrator`]: crate::RoundOrchestrator

use std::collections::vec_deque::Drain;
use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::{DuelEvent, Outcome, Phase, Side};

/// The authoritative model of a single round: phase, attack registration,
/// false-start detection, and winner resolution under millisecond timing.
///
/// The round record it owns is reset at the start of every round via
/// [`reset_round`](Self::reset_round); all timestamps are real-time seconds
/// from the caller's [`Clock`](crate::Clock).
#[derive(Debug, Default)]
pub struct DuelStateMachine {
    phase: Phase,
    player_attacked: bool,
    ai_attacked: bool,
    player_attack_time: Option<f64>,
    ai_attack_time: Option<f64>,
    signal_time: Option<f64>,
    false_start: bool,
    player_false_start: bool,
    outcome: Outcome,
    events: VecDeque<DuelEvent>,
}

impl DuelStateMachine {
    /// Creates a machine in [`Phase::Ready`] with a cleared round record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ############
    // # COMMANDS #
    // ############

    /// Clears the round record and returns to [`Phase::Ready`].
    ///
    /// Callable at any time; always succeeds and always emits a
    /// [`DuelEvent::PhaseChanged`] for `Ready`, even if the phase was
    /// already `Ready`. Queued events from the previous round are preserved
    /// until drained.
    pub fn reset_round(&mut self) {
        self.player_attacked = false;
        self.ai_attacked = false;
        self.player_attack_time = None;
        self.ai_attack_time = None;
        self.signal_time = None;
        self.false_start = false;
        self.player_false_start = false;
        self.outcome = Outcome::None;
        self.set_phase(Phase::Ready);
    }

    /// Opens the waiting window. The caller is responsible for invoking this
    /// only after [`reset_round`](Self::reset_round); the machine does not
    /// enforce the ordering.
    pub fn enter_waiting(&mut self) {
        self.set_phase(Phase::Waiting);
    }

    /// Raises the signal at `signal_time` and starts reaction timing.
    ///
    /// Emits [`DuelEvent::PhaseChanged`] followed by
    /// [`DuelEvent::SignalRaised`]; the raise time is retrievable from
    /// [`signal_time`](Self::signal_time) for reaction math. `signal_time`
    /// comes from the monotonic clock, so it is never earlier than any value
    /// recorded in the same round.
    pub fn enter_signal(&mut self, signal_time: f64) {
        self.signal_time = Some(signal_time);
        self.set_phase(Phase::Signal);
        self.events.push_back(DuelEvent::SignalRaised);
    }

    /// Opens the resolve window. Both participants may now attack.
    pub fn enter_resolve(&mut self) {
        self.set_phase(Phase::Resolve);
    }

    /// Registers a player attack at `now`.
    ///
    /// During [`Phase::Waiting`] this is a player false start and ends the
    /// round immediately. During [`Phase::Signal`] or [`Phase::Resolve`] the
    /// timestamp is recorded once (duplicates are ignored); resolution is
    /// driven separately, so a player attack never decides the round by
    /// itself. In any other phase the attack is ignored.
    pub fn register_player_attack(&mut self, now: f64) {
        self.register_attack(Side::Player, now, None);
    }

    /// Registers an AI attack at `now`.
    ///
    /// Same rules as [`register_player_attack`](Self::register_player_attack)
    /// with one asymmetry: if the phase is [`Phase::Resolve`] at the moment
    /// of registration, winner resolution runs immediately, because an AI
    /// attack in the resolve window means both sides have had their chance.
    pub fn register_ai_attack(&mut self, now: f64, draw_threshold_ms: f64) {
        self.register_attack(Side::Ai, now, Some(draw_threshold_ms));
    }

    /// Forces an immediate AI-caused false start: the round ends with
    /// [`Outcome::FalseStart`] attributed to the AI
    /// ([`player_false_start`](Self::player_false_start) stays `false`).
    ///
    /// Ignored once the round has already reached [`Phase::Results`].
    pub fn trigger_false_start(&mut self) {
        if self.phase == Phase::Results {
            trace!("trigger_false_start ignored: round already resolved");
            return;
        }
        debug!("AI false start");
        self.false_start = true;
        self.finish_round(Outcome::FalseStart, None);
    }

    /// Computes and emits the final outcome from whatever attack data exists.
    ///
    /// A no-op if no signal was ever raised this round (guards against
    /// resolving a round that never left the waiting window) or if the round
    /// has already resolved. Lower elapsed time wins; a difference within
    /// `draw_threshold_ms` is a draw; a side that never attacked loses to one
    /// that did; neither attacking is [`Outcome::NoAttack`].
    pub fn resolve_winner(&mut self, draw_threshold_ms: f64) {
        if self.signal_time.is_none() {
            trace!("resolve_winner ignored: no signal raised this round");
            return;
        }
        if self.phase == Phase::Results {
            trace!("resolve_winner ignored: outcome already computed");
            return;
        }
        let player_ms = self.player_reaction_ms();
        let ai_ms = self.ai_reaction_ms();
        let outcome = if self.false_start {
            // False starts normally short-circuit straight to Results; kept
            // for completeness.
            Outcome::FalseStart
        } else {
            match (player_ms, ai_ms) {
                (Some(player), Some(ai)) => {
                    if (player - ai).abs() <= draw_threshold_ms {
                        Outcome::Draw
                    } else if player < ai {
                        Outcome::PlayerWin
                    } else {
                        Outcome::AiWin
                    }
                }
                (Some(_), None) => Outcome::PlayerWin,
                (None, Some(_)) => Outcome::AiWin,
                (None, None) => Outcome::NoAttack,
            }
        };
        let payload = if outcome == Outcome::FalseStart {
            None
        } else {
            player_ms
        };
        self.finish_round(outcome, payload);
    }

    // #############
    // # ACCESSORS #
    // #############

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The outcome, [`Outcome::None`] until the round reaches
    /// [`Phase::Results`].
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// When the signal was raised, absent until [`Phase::Signal`] is entered.
    /// Never set on a false-start path.
    #[must_use]
    pub fn signal_time(&self) -> Option<f64> {
        self.signal_time
    }

    /// Whether the player has attacked this round.
    #[must_use]
    pub fn player_attacked(&self) -> bool {
        self.player_attacked
    }

    /// Whether the AI has attacked this round.
    #[must_use]
    pub fn ai_attacked(&self) -> bool {
        self.ai_attacked
    }

    /// When the player attacked, absent until registered.
    #[must_use]
    pub fn player_attack_time(&self) -> Option<f64> {
        self.player_attack_time
    }

    /// When the AI attacked, absent until registered.
    #[must_use]
    pub fn ai_attack_time(&self) -> Option<f64> {
        self.ai_attack_time
    }

    /// Whether the round ended by false start.
    #[must_use]
    pub fn false_start(&self) -> bool {
        self.false_start
    }

    /// Whether the player (vs. the AI) was the false starter. Only
    /// meaningful when [`false_start`](Self::false_start) is `true`.
    #[must_use]
    pub fn player_false_start(&self) -> bool {
        self.player_false_start
    }

    /// The player's reaction time in milliseconds, present once both the
    /// signal and a player attack have been recorded.
    #[must_use]
    pub fn player_reaction_ms(&self) -> Option<f64> {
        match (self.player_attack_time, self.signal_time) {
            (Some(attack), Some(signal)) => Some((attack - signal) * 1000.0),
            _ => None,
        }
    }

    /// The AI's reaction time in milliseconds, present once both the signal
    /// and an AI attack have been recorded.
    #[must_use]
    pub fn ai_reaction_ms(&self) -> Option<f64> {
        match (self.ai_attack_time, self.signal_time) {
            (Some(attack), Some(signal)) => Some((attack - signal) * 1000.0),
            _ => None,
        }
    }

    /// Drains all queued notifications, oldest first.
    pub fn events(&mut self) -> Drain<'_, DuelEvent> {
        self.events.drain(..)
    }

    // #############
    // # INTERNALS #
    // #############

    /// Shifts every recorded timestamp forward by `delta` seconds. Used when
    /// resuming from a pause so reaction math spans the pause unchanged.
    pub(crate) fn shift_time_base(&mut self, delta: f64) {
        if let Some(signal) = self.signal_time.as_mut() {
            *signal += delta;
        }
        if let Some(attack) = self.player_attack_time.as_mut() {
            *attack += delta;
        }
        if let Some(attack) = self.ai_attack_time.as_mut() {
            *attack += delta;
        }
    }

    fn register_attack(&mut self, side: Side, now: f64, draw_threshold_ms: Option<f64>) {
        match self.phase {
            Phase::Waiting => {
                // Jumped the gun: the round ends here, no timing payload.
                debug!(?side, "false start during waiting window");
                self.false_start = true;
                if side == Side::Player {
                    self.player_false_start = true;
                }
                self.finish_round(Outcome::FalseStart, None);
                return;
            }
            Phase::Signal | Phase::Resolve => {}
            Phase::Ready | Phase::Results => {
                trace!(?side, phase = ?self.phase, "attack ignored: outside legal window");
                return;
            }
        }
        let (attacked, attack_time) = match side {
            Side::Player => (&mut self.player_attacked, &mut self.player_attack_time),
            Side::Ai => (&mut self.ai_attacked, &mut self.ai_attack_time),
        };
        if *attacked {
            trace!(?side, "attack ignored: already registered this round");
            return;
        }
        *attacked = true;
        *attack_time = Some(now);
        debug!(?side, now, "attack registered");
        if side == Side::Ai && self.phase == Phase::Resolve {
            // The AI firing inside the resolve window closes out the round;
            // relative timing is computed from the stored timestamps, so
            // registration order cannot change the winner.
            if let Some(threshold) = draw_threshold_ms {
                self.resolve_winner(threshold);
            }
        }
    }

    fn finish_round(&mut self, outcome: Outcome, player_reaction_ms: Option<f64>) {
        self.outcome = outcome;
        self.set_phase(Phase::Results);
        debug!(?outcome, ?player_reaction_ms, "round ended");
        self.events.push_back(DuelEvent::RoundEnded {
            outcome,
            player_reaction_ms,
        });
    }

    fn set_phase(&mut self, phase: Phase) {
        trace!(from = ?self.phase, to = ?phase, "phase transition");
        self.phase = phase;
        self.events.push_back(DuelEvent::PhaseChanged { phase });
    }
}

// #########
// # TESTS #
// #########

#[cfg(test)]
mod tests {
    use super::*;

    /// Drives a fresh machine to the given phase on the normal path.
    fn machine_at(phase: Phase) -> DuelStateMachine {
        let mut duel = DuelStateMachine::new();
        duel.reset_round();
        if phase == Phase::Ready {
            return duel;
        }
        duel.enter_waiting();
        if phase == Phase::Waiting {
            return duel;
        }
        duel.enter_signal(10.0);
        if phase == Phase::Signal {
            return duel;
        }
        duel.enter_resolve();
        duel
    }

    fn round_ended_events(duel: &mut DuelStateMachine) -> Vec<DuelEvent> {
        duel.events()
            .filter(|event| matches!(event, DuelEvent::RoundEnded { .. }))
            .collect()
    }

    #[test]
    fn initial_state_is_ready_with_cleared_record() {
        let duel = DuelStateMachine::new();
        assert_eq!(duel.phase(), Phase::Ready);
        assert_eq!(duel.outcome(), Outcome::None);
        assert!(duel.signal_time().is_none());
        assert!(!duel.player_attacked());
        assert!(!duel.ai_attacked());
    }

    #[test]
    fn reset_round_always_emits_ready() {
        let mut duel = DuelStateMachine::new();
        duel.reset_round();
        duel.reset_round();
        let readies = duel
            .events()
            .filter(|event| matches!(event, DuelEvent::PhaseChanged { phase: Phase::Ready }))
            .count();
        assert_eq!(readies, 2);
    }

    #[test]
    fn enter_signal_records_time_and_emits_signal_raised() {
        let mut duel = machine_at(Phase::Waiting);
        duel.events();
        duel.enter_signal(12.5);
        assert_eq!(duel.signal_time(), Some(12.5));
        let events: Vec<_> = duel.events().collect();
        assert_eq!(
            events,
            vec![
                DuelEvent::PhaseChanged {
                    phase: Phase::Signal
                },
                DuelEvent::SignalRaised,
            ]
        );
    }

    #[test]
    fn player_attack_during_waiting_is_a_player_false_start() {
        let mut duel = machine_at(Phase::Waiting);
        duel.register_player_attack(5.0);
        assert_eq!(duel.phase(), Phase::Results);
        assert_eq!(duel.outcome(), Outcome::FalseStart);
        assert!(duel.false_start());
        assert!(duel.player_false_start());
        // Signal and resolve were skipped entirely.
        assert!(duel.signal_time().is_none());
        let ended = round_ended_events(&mut duel);
        assert_eq!(
            ended,
            vec![DuelEvent::RoundEnded {
                outcome: Outcome::FalseStart,
                player_reaction_ms: None,
            }]
        );
    }

    #[test]
    fn ai_attack_during_waiting_is_an_ai_false_start() {
        let mut duel = machine_at(Phase::Waiting);
        duel.register_ai_attack(5.0, 1.0);
        assert_eq!(duel.outcome(), Outcome::FalseStart);
        assert!(duel.false_start());
        assert!(!duel.player_false_start());
    }

    #[test]
    fn trigger_false_start_attributes_the_ai() {
        let mut duel = machine_at(Phase::Waiting);
        duel.trigger_false_start();
        assert_eq!(duel.phase(), Phase::Results);
        assert_eq!(duel.outcome(), Outcome::FalseStart);
        assert!(duel.false_start());
        assert!(!duel.player_false_start());
        assert_eq!(round_ended_events(&mut duel).len(), 1);
    }

    #[test]
    fn trigger_false_start_after_results_is_ignored() {
        let mut duel = machine_at(Phase::Waiting);
        duel.register_player_attack(5.0);
        duel.events();
        duel.trigger_false_start();
        assert!(duel.player_false_start(), "attribution must not change");
        assert_eq!(round_ended_events(&mut duel).len(), 0);
    }

    #[test]
    fn attacks_outside_the_window_are_ignored() {
        let mut duel = machine_at(Phase::Ready);
        duel.register_player_attack(1.0);
        assert!(!duel.player_attacked());
        assert_eq!(duel.phase(), Phase::Ready);

        let mut duel = machine_at(Phase::Resolve);
        duel.register_player_attack(10.1);
        duel.register_ai_attack(10.2, 1.0);
        assert_eq!(duel.phase(), Phase::Results);
        // Post-results attacks change nothing.
        duel.events();
        duel.register_player_attack(10.3);
        assert_eq!(duel.player_attack_time(), Some(10.1));
        assert_eq!(round_ended_events(&mut duel).len(), 0);
    }

    #[test]
    fn duplicate_attack_keeps_the_first_timestamp() {
        let mut duel = machine_at(Phase::Resolve);
        duel.register_player_attack(10.150);
        duel.register_player_attack(10.200);
        assert_eq!(duel.player_attack_time(), Some(10.150));

        duel.register_ai_attack(10.180, 1.0);
        // Round resolved; even without that, the AI timestamp is write-once.
        assert_eq!(duel.ai_attack_time(), Some(10.180));
    }

    #[test]
    fn attack_during_signal_records_without_resolving() {
        let mut duel = machine_at(Phase::Signal);
        duel.register_ai_attack(10.2, 1.0);
        assert!(duel.ai_attacked());
        assert_eq!(duel.phase(), Phase::Signal);
        duel.register_player_attack(10.15);
        assert!(duel.player_attacked());
        assert_eq!(duel.phase(), Phase::Signal);
    }

    #[test]
    fn ai_attack_in_resolve_resolves_immediately() {
        let mut duel = machine_at(Phase::Resolve);
        duel.register_player_attack(10.150);
        duel.register_ai_attack(10.180, 1.0);
        assert_eq!(duel.phase(), Phase::Results);
        assert_eq!(duel.outcome(), Outcome::PlayerWin);
    }

    #[test]
    fn lower_elapsed_time_wins_with_exact_reaction_report() {
        // signal 10.000, player 10.150 (150 ms), ai 10.180 (180 ms)
        let mut duel = machine_at(Phase::Resolve);
        duel.register_player_attack(10.150);
        duel.events();
        duel.register_ai_attack(10.180, 1.0);
        let ended = round_ended_events(&mut duel);
        assert_eq!(ended.len(), 1);
        let DuelEvent::RoundEnded {
            outcome,
            player_reaction_ms,
        } = ended[0]
        else {
            panic!("expected RoundEnded");
        };
        assert_eq!(outcome, Outcome::PlayerWin);
        let reported = player_reaction_ms.expect("player reaction must be reported");
        assert!((reported - 150.0).abs() < 1e-9);
    }

    #[test]
    fn ai_wins_when_it_reacts_sooner() {
        let mut duel = machine_at(Phase::Resolve);
        duel.register_player_attack(10.300);
        duel.register_ai_attack(10.180, 1.0);
        assert_eq!(duel.outcome(), Outcome::AiWin);
    }

    #[test]
    fn reactions_within_threshold_draw() {
        // 150.0 ms vs 150.5 ms, threshold 1 ms.
        let mut duel = machine_at(Phase::Resolve);
        duel.register_player_attack(10.150);
        duel.register_ai_attack(10.1505, 1.0);
        assert_eq!(duel.outcome(), Outcome::Draw);
    }

    #[test]
    fn only_player_attacking_wins_on_forced_resolution() {
        let mut duel = machine_at(Phase::Resolve);
        duel.register_player_attack(10.2);
        duel.events();
        duel.resolve_winner(1.0);
        assert_eq!(duel.outcome(), Outcome::PlayerWin);
        let ended = round_ended_events(&mut duel);
        let DuelEvent::RoundEnded {
            player_reaction_ms, ..
        } = ended[0]
        else {
            panic!("expected RoundEnded");
        };
        assert!(player_reaction_ms.is_some());
    }

    #[test]
    fn only_ai_attacking_wins_with_absent_player_reaction() {
        let mut duel = machine_at(Phase::Resolve);
        duel.register_ai_attack(10.2, 1.0);
        assert_eq!(duel.outcome(), Outcome::AiWin);
        let ended = round_ended_events(&mut duel);
        assert_eq!(
            ended,
            vec![DuelEvent::RoundEnded {
                outcome: Outcome::AiWin,
                player_reaction_ms: None,
            }]
        );
    }

    #[test]
    fn neither_attacking_is_no_attack() {
        let mut duel = machine_at(Phase::Resolve);
        duel.resolve_winner(1.0);
        assert_eq!(duel.outcome(), Outcome::NoAttack);
    }

    #[test]
    fn resolve_without_signal_is_a_no_op() {
        let mut duel = machine_at(Phase::Waiting);
        duel.events();
        duel.resolve_winner(1.0);
        assert_eq!(duel.phase(), Phase::Waiting);
        assert_eq!(duel.outcome(), Outcome::None);
        assert_eq!(duel.events().count(), 0);
    }

    #[test]
    fn resolve_after_results_is_a_no_op() {
        let mut duel = machine_at(Phase::Resolve);
        duel.register_ai_attack(10.2, 1.0);
        duel.events();
        duel.resolve_winner(1.0);
        assert_eq!(round_ended_events(&mut duel).len(), 0);
    }

    #[test]
    fn registration_order_does_not_change_relative_timing() {
        // AI registered first but attacked later by real time.
        let mut duel = machine_at(Phase::Signal);
        duel.register_ai_attack(10.180, 1.0);
        duel.register_player_attack(10.150);
        duel.enter_resolve();
        duel.resolve_winner(1.0);
        assert_eq!(duel.outcome(), Outcome::PlayerWin);
    }

    #[test]
    fn shift_time_base_preserves_reactions() {
        let mut duel = machine_at(Phase::Signal);
        duel.register_player_attack(10.150);
        let before = duel.player_reaction_ms().expect("player attacked");
        duel.shift_time_base(5.0);
        let after = duel.player_reaction_ms().expect("player attacked");
        // The shift is applied to both timestamps, so the difference survives
        // up to float rounding.
        assert!((after - before).abs() < 1e-6);
        assert_eq!(duel.signal_time(), Some(15.0));
    }

    #[test]
    fn reset_round_clears_everything() {
        let mut duel = machine_at(Phase::Resolve);
        duel.register_player_attack(10.1);
        duel.register_ai_attack(10.2, 1.0);
        duel.reset_round();
        assert_eq!(duel.phase(), Phase::Ready);
        assert_eq!(duel.outcome(), Outcome::None);
        assert!(duel.signal_time().is_none());
        assert!(duel.player_attack_time().is_none());
        assert!(duel.ai_attack_time().is_none());
        assert!(!duel.false_start());
        assert!(!duel.player_false_start());
    }
}
