//! Service instance lookup and app bindings

use async_trait::async_trait;
use cf_api::{CreateServiceBindingRequest, ServiceInstance};

use crate::controller::{ApiResult, ServicesApi};
use crate::http::client::HttpClient;

#[async_trait]
impl ServicesApi for HttpClient {
    async fn find_service_instances(
        &self,
        space_guid: &str,
        name: &str,
    ) -> ApiResult<Vec<ServiceInstance>> {
        self.get_all(
            "/v3/service_instances",
            &[("names", name), ("space_guids", space_guid)],
        )
        .await
    }

    async fn create_service_binding(&self, request: &CreateServiceBindingRequest) -> ApiResult<()> {
        self.post_empty("/v3/service_credential_bindings", request)
            .await
    }
}
