use thiserror::Error;

use crate::hand::Side;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("{side} hand already holds {held} cards")]
    HandFull { side: Side, held: usize },
    #[error("{side} hand has {held} cards, a finished hand needs 2 or 3")]
    IncompleteHand { side: Side, held: usize },
}
