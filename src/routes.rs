use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config;
use crate::handlers;
use crate::middleware::enrich_post;
use crate::state::AppState;

/// Assemble the full router: bespoke endpoints first, the generic
/// collection router as the fall-through, and the POST enrichment
/// middleware in front of everything.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/echo", get(handlers::echo::echo))
        .merge(build_routes())
        .merge(account_routes())
        .merge(data_routes())
        .layer(axum_middleware::from_fn_with_state(state.clone(), enrich_post));

    let config = config::config();
    if config.server.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    if config.server.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn build_routes() -> Router<AppState> {
    use axum::routing::{post, put};
    use crate::handlers::build;

    Router::new()
        // Search by embedded member id
        .route("/api/build/collab/:collab_id", get(build::collab_search))
        .route("/api/build/staff/:staff_id", get(build::staff_search))
        // Nested dataTable maintenance
        .route("/api/build/:build_id/dataTable", post(build::data_table_create))
        .route(
            "/api/build/:build_id/dataTable/:data_table_id",
            put(build::data_table_update).delete(build::data_table_delete),
        )
}

fn account_routes() -> Router<AppState> {
    use axum::routing::{post, put};

    Router::new()
        .route("/api/register", post(handlers::register::register))
        .route("/api/change-password", put(handlers::password::change_password))
}

fn data_routes() -> Router<AppState> {
    use crate::handlers::data;

    Router::new()
        // Collection-level operations
        .route("/api/:collection", get(data::list).post(data::create))
        // Record-level operations
        .route(
            "/api/:collection/:id",
            get(data::get)
                .put(data::replace)
                .patch(data::patch)
                .delete(data::delete),
        )
}
