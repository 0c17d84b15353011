use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::state::AppState;
use super::{activities, contacts, customers, dashboard, leads, opportunities};

/// All routes under `/api`, with request tracing and permissive CORS.
pub fn build_router(state: AppState) -> Router {
    build_router_with_cors(state, cors_layer(None))
}

pub fn build_router_with_cors(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Restricts browsers to `origin` when given and parseable; otherwise any
/// origin is allowed.
pub fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(err)) => {
            tracing::warn!(error = %err, "ignoring invalid CORS origin");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

async fn health() -> &'static str {
    "ok"
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/customers", customer_routes())
        .nest("/contacts", contact_routes())
        .nest("/leads", lead_routes())
        .nest("/opportunities", opportunity_routes())
        .nest("/activities", activity_routes())
        .nest("/dashboard", dashboard_routes())
}

fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route("/stats", get(customers::customer_stats))
        .route("/industries", get(customers::industries))
        .route("/by-status/:status", get(customers::customers_by_status))
        .route("/by-industry/:industry", get(customers::customers_by_industry))
        .route(
            "/:id",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        .route("/:id/with-contacts", get(customers::customer_with_contacts))
        .route(
            "/:id/with-opportunities",
            get(customers::customer_with_opportunities),
        )
}

fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(contacts::list_contacts).post(contacts::create_contact))
        .route("/stats", get(contacts::contact_stats))
        .route("/by-status/:status", get(contacts::contacts_by_status))
        .route("/customer/:customer_id", get(contacts::contacts_of_customer))
        .route("/customer/:customer_id/primary", get(contacts::primary_contact))
        .route(
            "/customer/:customer_id/search",
            get(contacts::search_customer_contacts),
        )
        .route(
            "/:id",
            get(contacts::get_contact)
                .put(contacts::update_contact)
                .delete(contacts::delete_contact),
        )
        .route("/:id/with-activities", get(contacts::contact_with_activities))
}

fn lead_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(leads::list_leads).post(leads::create_lead))
        .route("/stats", get(leads::lead_stats))
        .route("/high-score", get(leads::high_score_leads))
        .route("/by-status/:status", get(leads::leads_by_status))
        .route("/by-source/:source", get(leads::leads_by_source))
        .route(
            "/:id",
            get(leads::get_lead)
                .put(leads::update_lead)
                .delete(leads::delete_lead),
        )
        .route("/:id/convert", put(leads::convert_lead))
}

fn opportunity_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(opportunities::list_opportunities).post(opportunities::create_opportunity),
        )
        .route("/stats", get(opportunities::opportunity_stats))
        .route("/pipeline-value", get(opportunities::pipeline_value))
        .route("/overdue", get(opportunities::overdue_opportunities))
        .route("/by-stage/:stage", get(opportunities::opportunities_by_stage))
        .route(
            "/customer/:customer_id",
            get(opportunities::opportunities_of_customer),
        )
        .route(
            "/:id",
            get(opportunities::get_opportunity)
                .put(opportunities::update_opportunity)
                .delete(opportunities::delete_opportunity),
        )
}

fn activity_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(activities::list_activities).post(activities::create_activity),
        )
        .route("/stats", get(activities::activity_stats))
        .route("/overdue", get(activities::overdue_activities))
        .route("/upcoming", get(activities::upcoming_activities))
        .route("/by-status/:status", get(activities::activities_by_status))
        .route("/by-type/:activity_type", get(activities::activities_by_type))
        .route("/customer/:id", get(activities::activities_of_customer))
        .route("/contact/:id", get(activities::activities_of_contact))
        .route("/opportunity/:id", get(activities::activities_of_opportunity))
        .route("/lead/:id", get(activities::activities_of_lead))
        .route(
            "/:id",
            get(activities::get_activity)
                .put(activities::update_activity)
                .delete(activities::delete_activity),
        )
        .route("/:id/complete", put(activities::complete_activity))
}

fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(dashboard::dashboard_stats))
        .route("/lead-sources", get(dashboard::lead_sources))
        .route("/opportunity-stages", get(dashboard::opportunity_stages))
        .route("/activity-types", get(dashboard::activity_types))
        .route("/recent-activities", get(dashboard::recent_activities))
}
