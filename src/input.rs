//! The attack-input gate.
//!
//! Device polling is a host concern; the host forwards each physical press to
//! [`RoundOrchestrator::register_player_attack`]. The [`AttackInput`] trait is
//! the narrow seam through which the orchestrator arms and disarms that
//! forwarding: presses are gated off between rounds and the latch is cleared
//! so a stale press from the previous round cannot bleed into the next.
//!
//! The gate is a defense-in-depth / UX measure, not a correctness
//! requirement: the state machine's own phase check remains the authoritative
//! guard against out-of-window attacks.
//!
//! [`RoundOrchestrator::register_player_attack`]: crate::RoundOrchestrator::register_player_attack

use tracing::trace;

/// The input-adapter contract consumed by the orchestrator.
///
/// An implementation typically wraps whatever device layer the host uses. It
/// must emit a single attack per physical press (edge-triggered, not held),
/// and it must honor both operations below.
pub trait AttackInput {
    /// Gates whether presses are observed at all. The orchestrator disables
    /// input during [`Phase::Ready`] and [`Phase::Results`] and enables it
    /// when the waiting window opens.
    ///
    /// [`Phase::Ready`]: crate::Phase::Ready
    /// [`Phase::Results`]: crate::Phase::Results
    fn set_enabled(&mut self, enabled: bool);

    /// Re-arms the press latch so the next physical press produces a fresh
    /// attack event. Called at the start of every round.
    fn reset_latch(&mut self);

    /// Whether presses are currently observed.
    fn is_enabled(&self) -> bool;
}

/// A ready-made [`AttackInput`] implementation: a plain enabled/latched pair.
///
/// Hosts with their own device layer can implement [`AttackInput`] directly;
/// `InputGate` covers the common case where the host polls a button itself
/// and only needs the gating bookkeeping.
#[derive(Debug, Default)]
pub struct InputGate {
    enabled: bool,
    latched: bool,
}

impl InputGate {
    /// Creates a disabled, unlatched gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a physical press. Returns `true` if the press passed the gate
    /// (enabled and not already latched) and should be forwarded to the
    /// orchestrator; latches on success.
    pub fn press(&mut self) -> bool {
        if !self.enabled || self.latched {
            trace!(
                enabled = self.enabled,
                latched = self.latched,
                "press swallowed by input gate"
            );
            return false;
        }
        self.latched = true;
        true
    }

    /// Whether a press has been latched since the last [`reset_latch`].
    ///
    /// [`reset_latch`]: AttackInput::reset_latch
    #[must_use]
    pub fn is_latched(&self) -> bool {
        self.latched
    }
}

impl AttackInput for InputGate {
    fn set_enabled(&mut self, enabled: bool) {
        trace!(enabled, "input gate toggled");
        self.enabled = enabled;
    }

    fn reset_latch(&mut self) {
        self.latched = false;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
