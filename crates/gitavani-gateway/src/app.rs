use axum::{
    routing::{get, patch, post},
    Router,
};
use gitavani_core::GitavaniConfig;
use gitavani_notify::{BatchRunner, NotificationStore};
use gitavani_scheduler::DailyQuoteScheduler;
use gitavani_users::UserStore;
use std::sync::Arc;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: GitavaniConfig,
    pub users: Arc<UserStore>,
    pub records: Arc<NotificationStore>,
    pub runner: Arc<BatchRunner>,
    pub scheduler: DailyQuoteScheduler,
}

impl AppState {
    pub fn new(
        config: GitavaniConfig,
        users: Arc<UserStore>,
        records: Arc<NotificationStore>,
        runner: Arc<BatchRunner>,
        scheduler: DailyQuoteScheduler,
    ) -> Self {
        Self {
            config,
            users,
            records,
            runner,
            scheduler,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route(
            "/users/{id}/preferences",
            get(crate::http::preferences::get_preferences)
                .post(crate::http::preferences::update_preferences),
        )
        .route(
            "/users/{id}/token",
            post(crate::http::preferences::save_token),
        )
        .route("/users/{id}/send", post(crate::http::send::send_now))
        .route(
            "/users/{id}/progress/reset",
            post(crate::http::progress::reset_progress),
        )
        .route(
            "/users/{id}/notifications",
            get(crate::http::notifications::list_notifications),
        )
        .route(
            "/users/{id}/notifications/read-all",
            post(crate::http::notifications::mark_all_read),
        )
        .route(
            "/notifications/{id}/read",
            patch(crate::http::notifications::mark_read),
        )
        .route("/admin/run-batch", post(crate::http::send::run_batch))
        .route(
            "/admin/retry-failed",
            post(crate::http::send::retry_failed),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
