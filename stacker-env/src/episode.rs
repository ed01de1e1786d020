//! Episode bookkeeping of [`StackerEnv`](crate::StackerEnv).
use crate::simulator::StepChannel;
use log::{debug, info, warn};

/// Seeds are valid in `[0, SEED_LIMIT)`.
pub const SEED_LIMIT: i64 = 99999;

/// Returns `true` if the seed is in the valid range.
pub fn seed_in_range(seed: i64) -> bool {
    (0..SEED_LIMIT).contains(&seed)
}

/// State of the episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EpisodeState {
    /// No reset in flight and no active episode.
    Idle,

    /// A reset is in progress.
    Resetting,

    /// An episode is running.
    Active,
}

/// The channel a step is read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Authority {
    /// The decision channel; the episode goes on.
    Decision,

    /// The terminal channel; the episode ended.
    Terminal,
}

/// Handed out by [`EpisodeStateMachine::begin_reset`].
#[derive(Debug, PartialEq, Eq)]
pub struct ResetTicket {
    /// Seed to apply before the simulator resets, taken from the pending seed.
    pub seed: Option<i64>,
}

/// Tracks the state of the episode, the pending seed and step counts.
///
/// Transitions: `Idle -> Resetting -> Active -> Idle`, the last one on a
/// terminal tick or a truncation.
#[derive(Debug)]
pub struct EpisodeStateMachine {
    state: EpisodeState,
    pending_seed: Option<i64>,
    episode_steps: usize,
    total_steps: usize,
}

impl Default for EpisodeStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl EpisodeStateMachine {
    /// Creates a machine in [`EpisodeState::Idle`].
    pub fn new() -> Self {
        Self {
            state: EpisodeState::Idle,
            pending_seed: None,
            episode_steps: 0,
            total_steps: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> EpisodeState {
        self.state
    }

    /// Seed to be applied at the next reset.
    pub fn pending_seed(&self) -> Option<i64> {
        self.pending_seed
    }

    /// Stores the seed for the next reset; `None` clears it.
    ///
    /// Seeds out of `[0, 99999)` are stored with a warning.
    pub fn set_pending_seed(&mut self, seed: Option<i64>) {
        if let Some(seed) = seed {
            if !seed_in_range(seed) {
                warn!(
                    "Seed {} outside of valid range [0, {}). A random seed within the valid range will be used on next reset.",
                    seed, SEED_LIMIT
                );
            }
            info!("New seed {} will apply on next reset.", seed);
        }
        self.pending_seed = seed;
    }

    /// Starts a reset.
    ///
    /// Returns `None` if a reset is already in progress; the caller must then
    /// not reset the simulator again.
    pub fn begin_reset(&mut self) -> Option<ResetTicket> {
        if self.state == EpisodeState::Resetting {
            debug!("Reset requested while resetting, ignored");
            return None;
        }
        self.state = EpisodeState::Resetting;
        self.episode_steps = 0;
        Some(ResetTicket {
            seed: self.pending_seed.take(),
        })
    }

    /// Completes a reset; the episode becomes active.
    pub fn finish_reset(&mut self) {
        debug_assert_eq!(self.state, EpisodeState::Resetting);
        self.state = EpisodeState::Active;
    }

    /// Abandons a reset that failed.
    pub fn abort_reset(&mut self) {
        self.state = EpisodeState::Idle;
    }

    /// Returns `false` while a reset is in progress.
    pub fn accepts_step(&self) -> bool {
        self.state != EpisodeState::Resetting
    }

    /// Counts a tick and decides which channel it is read from.
    ///
    /// The terminal channel wins whenever an agent reports in it; the shape of
    /// the decision channel never decides whether the episode ended.
    pub fn reconcile(&mut self, _decision: &StepChannel, terminal: &StepChannel) -> Authority {
        if self.state == EpisodeState::Idle {
            // The simulator runs episodes on its own when no reset was requested.
            self.state = EpisodeState::Active;
            self.episode_steps = 0;
        }
        self.episode_steps += 1;
        self.total_steps += 1;

        if terminal.is_empty() {
            Authority::Decision
        } else {
            self.state = EpisodeState::Idle;
            Authority::Terminal
        }
    }

    /// Ends the episode in progress without a terminal tick.
    pub fn truncate(&mut self) {
        self.state = EpisodeState::Idle;
    }

    /// Steps since the start of the episode.
    pub fn episode_steps(&self) -> usize {
        self.episode_steps
    }

    /// Steps over the lifetime of the machine.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }
}
