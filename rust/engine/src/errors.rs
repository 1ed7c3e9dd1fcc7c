use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoundError {
    #[error("Round is not awaiting a player decision")]
    NotPlayerTurn,
    #[error("Double is only allowed on a two-card hand")]
    DoubleNotAllowed,
    #[error("Bet of {bet} exceeds the doubling ceiling of {ceiling}")]
    BetCeilingExceeded { bet: u32, ceiling: u32 },
    #[error("Split requires a two-card hand of matching rank")]
    SplitNotAllowed,
    #[error("The shoe ran out of cards")]
    ShoeExhausted,
}
