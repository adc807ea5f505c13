//! Application endpoints

use async_trait::async_trait;
use cf_api::{Application, CreateAppRequest, EnvironmentVariables, Route};

use crate::controller::{ApiResult, AppsApi};
use crate::http::client::HttpClient;

#[async_trait]
impl AppsApi for HttpClient {
    async fn find_applications(
        &self,
        organization_guid: &str,
        space_guid: &str,
        name: &str,
    ) -> ApiResult<Vec<Application>> {
        self.get_all(
            "/v3/apps",
            &[
                ("names", name),
                ("space_guids", space_guid),
                ("organization_guids", organization_guid),
            ],
        )
        .await
    }

    async fn create_application(&self, request: &CreateAppRequest) -> ApiResult<Application> {
        self.post("/v3/apps", request).await
    }

    async fn delete_application(&self, guid: &str) -> ApiResult<()> {
        self.delete(&format!("/v3/apps/{}", guid)).await
    }

    async fn stop_application(&self, guid: &str) -> ApiResult<Application> {
        self.post(&format!("/v3/apps/{}/actions/stop", guid), &serde_json::json!({}))
            .await
    }

    async fn update_environment_variables(
        &self,
        app_guid: &str,
        vars: &EnvironmentVariables,
    ) -> ApiResult<EnvironmentVariables> {
        self.patch(&format!("/v3/apps/{}/environment_variables", app_guid), vars)
            .await
    }

    async fn application_routes(&self, app_guid: &str) -> ApiResult<Vec<Route>> {
        self.get_all(&format!("/v3/apps/{}/routes", app_guid), &[]).await
    }
}
