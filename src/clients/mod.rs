//! Resource clients for the compute SDK.

pub mod virtual_machines;

pub use virtual_machines::VirtualMachinesClient;
