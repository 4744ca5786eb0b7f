//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::gateway::handlers::HealthResponse;
use crate::models::{HistoryEntry, TransactionKind, UserBalance};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Point Ledger API",
        version = "1.0.0",
        description = "Per-user point balance with charge/use history.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        crate::gateway::handlers::get_point,
        crate::gateway::handlers::get_histories,
        crate::gateway::handlers::charge,
        crate::gateway::handlers::use_points,
    ),
    components(
        schemas(
            HealthResponse,
            UserBalance,
            HistoryEntry,
            TransactionKind,
        )
    ),
    tags(
        (name = "Point", description = "Balance queries and charge/use mutations"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;
