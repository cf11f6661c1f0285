//! Virtual machine data models and per-operation options.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A virtual machine resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachine {
    /// Fully qualified resource id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Resource name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Resource type, e.g. "Microsoft.Compute/virtualMachines"
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// Region the machine lives in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<VirtualMachineProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineProperties {
    /// Unique id assigned by the platform
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm_id: Option<String>,
    /// "Creating", "Succeeded", "Deleting", ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_profile: Option<HardwareProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm_size: Option<String>,
}

/// One page of a virtual machine listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineListResult {
    #[serde(default)]
    pub value: Vec<VirtualMachine>,
    /// Link to the next page; absent on the last page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}

/// Response of `VirtualMachinesClient::get`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VirtualMachinesGetResponse {
    pub virtual_machine: VirtualMachine,
}

/// Terminal response of `VirtualMachinesClient::begin_delete`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualMachinesDeleteResponse {}

/// One page returned by `VirtualMachinesClient::new_list_pager`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VirtualMachinesListResponse {
    pub result: VirtualMachineListResult,
}

/// A page that may link to a following page.
pub trait Page {
    fn next_link(&self) -> Option<&str>;
}

impl Page for VirtualMachinesListResponse {
    fn next_link(&self) -> Option<&str> {
        self.result.next_link.as_deref().filter(|link| !link.is_empty())
    }
}

/// Options for `VirtualMachinesClient::get`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetOptions {
    /// Expand expression, e.g. "instanceView"
    pub expand: Option<String>,
}

/// Options for `VirtualMachinesClient::begin_delete`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeginDeleteOptions {
    pub force_deletion: Option<bool>,
}

/// Options for `VirtualMachinesClient::new_list_pager`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// OData filter applied by the service
    pub filter: Option<String>,
}
