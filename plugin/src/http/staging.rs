//! Packages, builds and rolling deployments

use async_trait::async_trait;
use cf_api::{
    Build, CreateBuildRequest, CreateDeploymentRequest, CreatePackageRequest, Deployment,
    DeploymentRelationships, GuidRef, Package, ToOne,
};

use crate::controller::{ApiResult, StagingApi};
use crate::http::client::HttpClient;

#[async_trait]
impl StagingApi for HttpClient {
    async fn create_package(&self, request: &CreatePackageRequest) -> ApiResult<Package> {
        self.post("/v3/packages", request).await
    }

    async fn create_build(&self, package_guid: &str) -> ApiResult<Build> {
        let request = CreateBuildRequest {
            package: GuidRef::new(package_guid),
        };
        self.post("/v3/builds", &request).await
    }

    async fn get_build(&self, guid: &str) -> ApiResult<Build> {
        self.get(&format!("/v3/builds/{}", guid)).await
    }

    async fn create_deployment(&self, app_guid: &str, droplet_guid: &str) -> ApiResult<Deployment> {
        let request = CreateDeploymentRequest {
            droplet: GuidRef::new(droplet_guid),
            relationships: DeploymentRelationships {
                app: ToOne::to(app_guid),
            },
        };
        self.post("/v3/deployments", &request).await
    }
}
