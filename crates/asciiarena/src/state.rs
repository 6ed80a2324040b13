//! Lifecycle of the game loop.

use std::fmt;

/// Which phase of a series the game loop is in.
///
/// ```text
/// WaitingForPlayers → ArenaLoading → Running → Finished
///                          ↑                      │
///                          └── no series winner ──┘
/// ```
///
/// Any state may go back to `WaitingForPlayers` when the room is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Logging players in until the room is complete.
    WaitingForPlayers,
    /// An arena is being generated off the logic thread.
    ArenaLoading,
    /// Frames are being computed.
    Running,
    /// The round is over. `winner` is set once someone won the series.
    Finished { winner: Option<char> },
}

impl LoopState {
    /// Returns `true` if moving from `self` to `target` is a legal step.
    pub fn can_transition_to(self, target: Self) -> bool {
        use LoopState::*;
        matches!(
            (self, target),
            (_, WaitingForPlayers)
                | (WaitingForPlayers, ArenaLoading)
                | (ArenaLoading, Running)
                | (Running, Finished { .. })
                | (Finished { winner: None }, ArenaLoading)
        )
    }

    /// Returns `true` if player movement and casts are processed.
    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitingForPlayers => write!(f, "WaitingForPlayers"),
            Self::ArenaLoading => write!(f, "ArenaLoading"),
            Self::Running => write!(f, "Running"),
            Self::Finished { winner: Some(c) } => write!(f, "Finished(winner {c})"),
            Self::Finished { winner: None } => write!(f, "Finished"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FINISHED: LoopState = LoopState::Finished { winner: None };
    const WON: LoopState = LoopState::Finished { winner: Some('A') };

    #[test]
    fn test_round_cycle() {
        assert!(LoopState::WaitingForPlayers.can_transition_to(LoopState::ArenaLoading));
        assert!(LoopState::ArenaLoading.can_transition_to(LoopState::Running));
        assert!(LoopState::Running.can_transition_to(FINISHED));
        assert!(LoopState::Running.can_transition_to(WON));
        assert!(FINISHED.can_transition_to(LoopState::ArenaLoading));
    }

    #[test]
    fn test_series_winner_blocks_new_arena() {
        assert!(!WON.can_transition_to(LoopState::ArenaLoading));
        assert!(WON.can_transition_to(LoopState::WaitingForPlayers));
    }

    #[test]
    fn test_reset_is_always_allowed() {
        for state in [LoopState::ArenaLoading, LoopState::Running, FINISHED, WON] {
            assert!(state.can_transition_to(LoopState::WaitingForPlayers));
        }
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!LoopState::WaitingForPlayers.can_transition_to(LoopState::Running));
        assert!(!LoopState::Running.can_transition_to(LoopState::ArenaLoading));
        assert!(!LoopState::ArenaLoading.can_transition_to(FINISHED));
    }

    #[test]
    fn test_only_running_accepts_player_actions() {
        assert!(LoopState::Running.is_running());
        assert!(!LoopState::ArenaLoading.is_running());
        assert!(!FINISHED.is_running());
    }

    #[test]
    fn test_display() {
        assert_eq!(LoopState::Running.to_string(), "Running");
        assert_eq!(WON.to_string(), "Finished(winner A)");
    }
}
