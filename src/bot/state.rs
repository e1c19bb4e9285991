use serde::{Deserialize, Serialize};

/// Represents the current state of the user dialogue
#[derive(Clone, Serialize, Deserialize, Default)]
pub enum State {
    /// Initial state, waiting for a relayable item
    #[default]
    Idle,
    /// An item is stored, waiting for the target group identifier
    AwaitingDestination,
}
