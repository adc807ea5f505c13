//! Organisation, space and domain lookups

use async_trait::async_trait;
use cf_api::{Domain, Organization, Space};

use crate::controller::{ApiResult, TenancyApi};
use crate::http::client::HttpClient;

#[async_trait]
impl TenancyApi for HttpClient {
    async fn find_organizations(&self, name: &str) -> ApiResult<Vec<Organization>> {
        self.get_all("/v3/organizations", &[("names", name)]).await
    }

    async fn find_spaces(&self, organization_guid: &str, name: &str) -> ApiResult<Vec<Space>> {
        self.get_all(
            "/v3/spaces",
            &[("names", name), ("organization_guids", organization_guid)],
        )
        .await
    }

    async fn find_domains(&self, name: &str) -> ApiResult<Vec<Domain>> {
        self.get_all("/v3/domains", &[("names", name)]).await
    }
}
