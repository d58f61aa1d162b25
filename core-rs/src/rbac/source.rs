//! Where the permission store gets its codes from

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::errors::Result;
use crate::identity::Principal;

/// Remote origin of a principal's permission codes
#[async_trait]
pub trait PermissionSource: Send + Sync {
    async fn fetch_permissions(&self, principal: &Principal) -> Result<Vec<String>>;
}

/// Backend endpoint; the principal travels in the injected identity header
#[async_trait]
impl PermissionSource for ApiClient {
    async fn fetch_permissions(&self, _principal: &Principal) -> Result<Vec<String>> {
        ApiClient::fetch_permissions(self).await
    }
}
