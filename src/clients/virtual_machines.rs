//! Virtual machines resource client.

use std::sync::Arc;

use reqwest::Method;

use crate::client::{ClientOptions, Pipeline};
use crate::credential::TokenCredential;
use crate::error::Error;
use crate::pager::Pager;
use crate::poller::Poller;
use crate::transport::Request;
use crate::types::{
    BeginDeleteOptions, GetOptions, ListOptions, VirtualMachinesDeleteResponse,
    VirtualMachinesGetResponse, VirtualMachinesListResponse,
};

/// Client for virtual machine operations in one subscription.
pub struct VirtualMachinesClient {
    subscription_id: String,
    pipeline: Arc<Pipeline>,
}

impl VirtualMachinesClient {
    /// Create a new virtual machines client.
    ///
    /// # Arguments
    ///
    /// * `subscription_id` - Subscription that owns the machines
    /// * `credential` - Supplies bearer tokens for every request
    /// * `options` - Endpoint, api-version and transport override (default options when `None`)
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is invalid or the HTTP transport cannot be created.
    pub fn new(
        subscription_id: &str,
        credential: Arc<dyn TokenCredential>,
        options: Option<ClientOptions>,
    ) -> Result<Self, Error> {
        if subscription_id.is_empty() {
            return Err(Error::Configuration("subscription_id cannot be empty".to_string()));
        }

        let pipeline = Pipeline::new(credential, options.unwrap_or_default())?;

        Ok(Self {
            subscription_id: subscription_id.to_string(),
            pipeline: Arc::new(pipeline),
        })
    }

    #[must_use]
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Retrieve a virtual machine.
    ///
    /// # Errors
    ///
    /// Returns `Error::Response` if the service rejects the request, or a
    /// transport error.
    pub async fn get(
        &self,
        resource_group_name: &str,
        vm_name: &str,
        options: Option<&GetOptions>,
    ) -> Result<VirtualMachinesGetResponse, Error> {
        let path = self.vm_path(resource_group_name, Some(vm_name))?;

        let mut query = Vec::new();
        if let Some(expand) = options.and_then(|o| o.expand.as_deref()) {
            query.push(("$expand", expand));
        }

        let url = self.pipeline.url(&path, &query)?;
        let response = self.pipeline.send(Request::new(Method::GET, url)).await?;

        response.json()
    }

    /// Start deleting a virtual machine.
    ///
    /// # Returns
    ///
    /// A poller tracking the delete operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete request itself fails.
    pub async fn begin_delete(
        &self,
        resource_group_name: &str,
        vm_name: &str,
        options: Option<&BeginDeleteOptions>,
    ) -> Result<Poller<VirtualMachinesDeleteResponse>, Error> {
        let path = self.vm_path(resource_group_name, Some(vm_name))?;

        let mut query = Vec::new();
        if let Some(force) = options.and_then(|o| o.force_deletion) {
            query.push(("forceDeletion", if force { "true" } else { "false" }));
        }

        let url = self.pipeline.url(&path, &query)?;
        let response = self.pipeline.send(Request::new(Method::DELETE, url)).await?;

        Poller::from_initial_response(Arc::clone(&self.pipeline), &response)
    }

    /// List the virtual machines of a resource group, one page at a time.
    ///
    /// Nothing is sent until the first call to [`Pager::next_page`].
    #[must_use]
    pub fn new_list_pager(
        &self,
        resource_group_name: &str,
        options: Option<&ListOptions>,
    ) -> Pager<VirtualMachinesListResponse> {
        let first_url = self.vm_path(resource_group_name, None).and_then(|path| {
            let mut query = Vec::new();
            if let Some(filter) = options.and_then(|o| o.filter.as_deref()) {
                query.push(("$filter", filter));
            }
            self.pipeline.url(&path, &query)
        });

        Pager::new(Arc::clone(&self.pipeline), first_url)
    }

    fn vm_path(&self, resource_group_name: &str, vm_name: Option<&str>) -> Result<String, Error> {
        check_path_segment("resource_group_name", resource_group_name)?;

        let collection = format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Compute/virtualMachines",
            self.subscription_id, resource_group_name
        );

        match vm_name {
            Some(name) => {
                check_path_segment("vm_name", name)?;
                Ok(format!("{collection}/{name}"))
            }
            None => Ok(collection),
        }
    }
}

/// Names are placed in the path verbatim and must stay a single segment.
fn check_path_segment(field: &str, value: &str) -> Result<(), Error> {
    if value.is_empty() {
        return Err(Error::Configuration(format!("{field} cannot be empty")));
    }
    if value.contains(['/', '?', '#', '%']) {
        return Err(Error::Configuration(format!(
            "{field} contains a reserved URL character: {value:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::StaticTokenCredential;

    fn client() -> VirtualMachinesClient {
        VirtualMachinesClient::new("sub-1", Arc::new(StaticTokenCredential::new("t")), None)
            .expect("client creation should succeed")
    }

    #[test]
    fn test_empty_subscription_is_rejected() {
        let result =
            VirtualMachinesClient::new("", Arc::new(StaticTokenCredential::new("t")), None);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_vm_path() {
        let client = client();

        assert_eq!(
            client.vm_path("rg", Some("vm1")).expect("path"),
            "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm1"
        );
        assert_eq!(
            client.vm_path("rg", None).expect("path"),
            "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines"
        );
    }

    #[test]
    fn test_vm_path_rejects_empty_names() {
        let client = client();

        assert!(matches!(client.vm_path("", None), Err(Error::Configuration(_))));
        assert!(matches!(client.vm_path("rg", Some("")), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_vm_path_rejects_reserved_characters() {
        let client = client();

        for name in ["a/b", "vm?x=1", "vm#frag", "vm%2F"] {
            assert!(
                matches!(client.vm_path("rg", Some(name)), Err(Error::Configuration(_))),
                "vm name {name:?} should be rejected"
            );
            assert!(
                matches!(client.vm_path(name, None), Err(Error::Configuration(_))),
                "resource group {name:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_get_with_slash_in_name_sends_nothing() {
        let client = client();
        let err = client
            .get("rg", "other/virtualMachines/vm", None)
            .await
            .expect_err("name with a slash");
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[tokio::test]
    async fn test_pager_with_bad_resource_group_reports_error_once() {
        let client = client();
        let mut pager = client.new_list_pager("", None);

        assert!(pager.more());
        let err = pager.next_page().await.expect_err("empty resource group");
        assert!(matches!(err, Error::Configuration(_)));
        assert!(!pager.more());
    }
}
