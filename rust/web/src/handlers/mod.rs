pub mod game;
pub mod health;

pub use game::{create_round, get_round, play_action, CreateRoundRequest};
pub use health::health;
