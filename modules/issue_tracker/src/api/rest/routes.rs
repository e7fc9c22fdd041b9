use axum::{routing::get, Extension, Router};
use std::sync::Arc;

use crate::api::rest::handlers;
use crate::domain::service::Service;

pub const ISSUES_PATH: &str = "/api/issues/{project}";

/// Mount the issue routes on `router`. All verbs share one path; the project
/// comes from the path and the issue id from the body.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    let issues = Router::new()
        .route(
            ISSUES_PATH,
            get(handlers::list_issues)
                .post(handlers::create_issue)
                .put(handlers::update_issue)
                .delete(handlers::delete_issue),
        )
        .layer(Extension(service));

    router.merge(issues)
}
