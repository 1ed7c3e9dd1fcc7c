use crate::registry::{Action, RoundId, RoundRegistry, TableError};
use blackjack_engine::round::RoundConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::Reply;

#[derive(Debug, Default, Deserialize)]
pub struct CreateRoundRequest {
    pub seed: Option<u64>,
    pub decks: Option<u32>,
    pub bet: Option<u32>,
}

impl CreateRoundRequest {
    fn into_config(self) -> RoundConfig {
        let mut config = RoundConfig::default();
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(decks) = self.decks {
            config.decks = decks;
        }
        if let Some(bet) = self.bet {
            config.bet = bet;
        }
        config
    }
}

/// Deals a new round.
///
/// - **Method**: POST
/// - **Path**: `/api/rounds`
///
/// Accepts an optional configuration body (`seed` for a reproducible
/// shuffle, `decks` for the shoe size, `bet` for the opening stake) and
/// responds with status 201 and the opening snapshot. A natural 21 is
/// already reflected in the snapshot's `player_blackjack` status.
pub async fn create_round(registry: Arc<RoundRegistry>, request: CreateRoundRequest) -> Response {
    match registry.create_round(request.into_config()) {
        Ok(snapshot) => success_response(StatusCode::CREATED, snapshot),
        Err(err) => table_error(err),
    }
}

/// Returns the current snapshot of a round.
///
/// - **Method**: GET
/// - **Path**: `/api/rounds/{round_id}`
///
/// While the round is in `player_turn` the dealer's hole card and total
/// are withheld from the snapshot; any terminal status reveals both.
/// Unknown ids produce a 404 `invalid_round` error body.
pub async fn get_round(registry: Arc<RoundRegistry>, round_id: RoundId) -> Response {
    match registry.snapshot(&round_id) {
        Ok(snapshot) => success_response(StatusCode::OK, snapshot),
        Err(err) => table_error(err),
    }
}

/// Applies one player action to a round.
///
/// - **Method**: POST
/// - **Path**: `/api/rounds/{round_id}/{hit|stand|double|surrender|split}`
///
/// Responds with status 200 and the post-action snapshot. Requests
/// outside `player_turn` produce a 400 `invalid_round` error; a violated
/// action precondition (double after a hit, doubling past the stake
/// ceiling, splitting a non-pair) produces a 400 `illegal_action` error
/// and leaves the round unchanged.
pub async fn play_action(
    registry: Arc<RoundRegistry>,
    round_id: RoundId,
    action: Action,
) -> Response {
    match registry.apply(&round_id, action) {
        Ok(snapshot) => success_response(StatusCode::OK, snapshot),
        Err(err) => table_error(err),
    }
}

fn success_response<T>(status: StatusCode, body: T) -> Response
where
    T: Serialize,
{
    reply::with_status(reply::json(&body), status).into_response()
}

fn table_error(err: TableError) -> Response {
    use crate::errors::IntoErrorResponse;
    err.into_http_response()
}
