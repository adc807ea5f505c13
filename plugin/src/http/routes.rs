//! Route endpoints

use async_trait::async_trait;
use cf_api::{CreateRouteRequest, GuidRef, InsertDestinationsRequest, NewDestination, Route};

use crate::controller::{ApiResult, RoutesApi};
use crate::http::client::HttpClient;

#[async_trait]
impl RoutesApi for HttpClient {
    async fn find_routes(&self, domain_guid: &str, host: &str) -> ApiResult<Vec<Route>> {
        self.get_all("/v3/routes", &[("domain_guids", domain_guid), ("hosts", host)])
            .await
    }

    async fn get_route(&self, guid: &str) -> ApiResult<Route> {
        self.get(&format!("/v3/routes/{}", guid)).await
    }

    async fn create_route(&self, request: &CreateRouteRequest) -> ApiResult<Route> {
        self.post("/v3/routes", request).await
    }

    async fn map_route(&self, route_guid: &str, app_guid: &str) -> ApiResult<()> {
        // insert semantics: existing destinations are kept
        let request = InsertDestinationsRequest {
            destinations: vec![NewDestination {
                app: GuidRef::new(app_guid),
            }],
        };
        self.post_empty(&format!("/v3/routes/{}/destinations", route_guid), &request)
            .await
    }

    async fn unmap_route(&self, route_guid: &str, destination_guid: &str) -> ApiResult<()> {
        self.delete(&format!(
            "/v3/routes/{}/destinations/{}",
            route_guid, destination_guid
        ))
        .await
    }

    async fn delete_route(&self, guid: &str) -> ApiResult<()> {
        self.delete(&format!("/v3/routes/{}", guid)).await
    }
}
