//! Process endpoints: listing, instance stats, scaling and health checks

use async_trait::async_trait;
use cf_api::{ListResponse, Process, ProcessInstance, ScaleProcessRequest, UpdateProcessRequest};

use crate::controller::{ApiResult, ProcessesApi};
use crate::http::client::HttpClient;

#[async_trait]
impl ProcessesApi for HttpClient {
    async fn application_processes(&self, app_guid: &str) -> ApiResult<Vec<Process>> {
        self.get_all(&format!("/v3/apps/{}/processes", app_guid), &[])
            .await
    }

    async fn process_instances(&self, process_guid: &str) -> ApiResult<Vec<ProcessInstance>> {
        // stats are not paginated
        let stats = self
            .get::<ListResponse<ProcessInstance>>(&format!("/v3/processes/{}/stats", process_guid))
            .await?;
        Ok(stats.map(|list| list.resources))
    }

    async fn scale_process(
        &self,
        app_guid: &str,
        process_type: &str,
        request: &ScaleProcessRequest,
    ) -> ApiResult<Process> {
        let path = format!("/v3/apps/{}/processes/{}/actions/scale", app_guid, process_type);
        self.post(&path, request).await
    }

    async fn update_process(
        &self,
        process_guid: &str,
        request: &UpdateProcessRequest,
    ) -> ApiResult<Process> {
        self.patch(&format!("/v3/processes/{}", process_guid), request)
            .await
    }
}
