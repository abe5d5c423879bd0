//! Stride Server
//!
//! Axum front door for the collaboration backend: REST routes for
//! notifications, chat rooms and sprint boards, plus the realtime
//! websocket at `/ws`.

pub mod config;
pub mod routes;
pub mod socket;
pub mod state;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Notifications
        .route("/notifications", post(routes::notifications::create_notification))
        .route("/notifications/user/{id}", get(routes::notifications::list_for_user))
        .route("/notifications/user/{id}/read-all", patch(routes::notifications::mark_all_read))
        .route("/notifications/project/{id}", get(routes::notifications::list_for_project))
        .route("/notifications/task/{id}", get(routes::notifications::list_for_task))
        .route("/notifications/{id}/read", patch(routes::notifications::mark_read))
        // Chat rooms
        .route("/chats/project/{project_id}", get(routes::chats::room_for_project))
        .route("/chats/{room_id}", delete(routes::chats::delete_room))
        // Board
        .route("/sprints/{id}/columns", get(routes::boards::list_columns))
        .route("/sprints/{id}/tasks", get(routes::boards::list_tasks))
        .route("/sprints/{id}/reconcile", post(routes::boards::reconcile_sprint))
        .route("/columns", post(routes::boards::create_column))
        .route("/columns/{id}", patch(routes::boards::rename_column))
        .route("/columns/{id}", delete(routes::boards::delete_column))
        .route("/tasks", post(routes::boards::create_task))
        .route("/tasks/{id}", get(routes::boards::get_task))
        .route("/tasks/{id}", patch(routes::boards::update_task))
        .route("/tasks/{id}", delete(routes::boards::delete_task))
        .route("/health", get(routes::health))
        .with_state(state.clone());

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(socket::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server until it is shut down.
pub async fn run_server(state: AppState, bind_addr: &str) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
