//! Data model types for the compute SDK.

pub mod virtual_machines;

pub use virtual_machines::{
    BeginDeleteOptions, GetOptions, HardwareProfile, ListOptions, Page, VirtualMachine,
    VirtualMachineListResult, VirtualMachineProperties, VirtualMachinesDeleteResponse,
    VirtualMachinesGetResponse, VirtualMachinesListResponse,
};
