//! Match-level bookkeeping.

use tracing::debug;

use crate::{Outcome, Side};

/// Win counters for a first-to-N match.
///
/// Owned exclusively by the orchestrator; created at match start and reset on
/// match restart. A false start counts as a win for the non-false-starting
/// side; draws and no-attack rounds award neither side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MatchRecord {
    player_wins: u32,
    ai_wins: u32,
    win_target: u32,
    finished: bool,
}

/// What applying a round outcome did to the match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScoreUpdate {
    /// The side that was awarded the round, if any.
    pub awarded: Option<Side>,
    /// Set on the transition where a side first reaches the win target.
    pub match_winner: Option<Side>,
}

impl MatchRecord {
    /// Creates a fresh record for a first-to-`win_target` match.
    #[must_use]
    pub fn new(win_target: u32) -> Self {
        Self {
            player_wins: 0,
            ai_wins: 0,
            win_target,
            finished: false,
        }
    }

    /// Rounds won by the player.
    #[must_use]
    pub fn player_wins(&self) -> u32 {
        self.player_wins
    }

    /// Rounds won by the AI.
    #[must_use]
    pub fn ai_wins(&self) -> u32 {
        self.ai_wins
    }

    /// The configured win target.
    #[must_use]
    pub fn win_target(&self) -> u32 {
        self.win_target
    }

    /// Whether a side has reached the win target.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Applies a round outcome. `player_false_start` attributes a
    /// [`Outcome::FalseStart`] round: `true` awards the AI, `false` awards
    /// the player.
    ///
    /// The match over `Outcome` is exhaustive by construction; a new outcome
    /// variant is a compile error here rather than a silently unscored round.
    pub(crate) fn apply(&mut self, outcome: Outcome, player_false_start: bool) -> ScoreUpdate {
        if self.finished {
            debug!(?outcome, "outcome ignored: match already finished");
            return ScoreUpdate {
                awarded: None,
                match_winner: None,
            };
        }
        let awarded = match outcome {
            Outcome::PlayerWin => Some(Side::Player),
            Outcome::AiWin => Some(Side::Ai),
            Outcome::FalseStart => {
                if player_false_start {
                    Some(Side::Ai)
                } else {
                    Some(Side::Player)
                }
            }
            Outcome::Draw | Outcome::NoAttack | Outcome::None => None,
        };
        match awarded {
            Some(Side::Player) => self.player_wins += 1,
            Some(Side::Ai) => self.ai_wins += 1,
            None => {}
        }
        let match_winner = if self.player_wins >= self.win_target {
            Some(Side::Player)
        } else if self.ai_wins >= self.win_target {
            Some(Side::Ai)
        } else {
            None
        };
        if let Some(winner) = match_winner {
            self.finished = true;
            debug!(
                ?winner,
                player_wins = self.player_wins,
                ai_wins = self.ai_wins,
                "match finished"
            );
        }
        ScoreUpdate {
            awarded,
            match_winner,
        }
    }
}
