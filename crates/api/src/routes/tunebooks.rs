use axum::routing::get;
use axum::Router;

use crate::handlers::tunebooks;
use crate::state::AppState;

/// Routes mounted at `/tunebooks`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(tunebooks::list_tunebooks))
}
