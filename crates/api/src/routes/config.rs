//! Runtime configuration exposed to the frontend.

use axum::extract::State;

use crate::state::AppState;

/// The PayPal client id the checkout page initializes its widget with.
///
/// An opaque string to us; public by design on the provider's side.
pub async fn paypal(State(state): State<AppState>) -> String {
    state.config().paypal_client_id.clone()
}
