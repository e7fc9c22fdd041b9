use std::sync::Arc;

use tracing::info;
use utoipa::OpenApi;

use crate::api::rest::{openapi::IssueTrackerDoc, routes};
use crate::contract::client::IssueTrackerApi;
use crate::domain::{repo::IssuesRepository, service::Service};
use crate::gateways::local::IssueTrackerLocalClient;
use crate::infra::storage::InMemoryIssuesRepository;

/// Issue tracker module: wires the repository to the domain service and
/// exposes it over REST and as an in-process client.
#[derive(Clone)]
pub struct IssueTracker {
    service: Arc<Service>,
}

impl Default for IssueTracker {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryIssuesRepository::new()))
    }
}

impl IssueTracker {
    pub fn new(repo: Arc<dyn IssuesRepository>) -> Self {
        info!("Initializing issue_tracker module");
        Self {
            service: Arc::new(Service::new(repo)),
        }
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    /// Local in-process client backed by the same store as the REST routes.
    pub fn client(&self) -> Arc<dyn IssueTrackerApi> {
        Arc::new(IssueTrackerLocalClient::new(self.service.clone()))
    }

    pub fn register_rest(&self, router: axum::Router) -> axum::Router {
        info!("Registering issue_tracker REST routes");
        routes::register_routes(router, self.service.clone())
    }

    pub fn openapi(&self) -> utoipa::openapi::OpenApi {
        IssueTrackerDoc::openapi()
    }
}
