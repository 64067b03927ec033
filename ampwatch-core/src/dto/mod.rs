//! Data Transfer Objects for executor communication
//!
//! DTOs mirror the JSON payloads returned by the remote diagnostic executor.
//! They are deliberately permissive; conversion into domain types applies
//! defaults once, at the boundary.

pub mod workload;
