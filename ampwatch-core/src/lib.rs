//! Ampwatch Core
//!
//! Core types for the Ampwatch diagnostic workload coordinator.
//!
//! This crate contains:
//! - Domain types: the workload handle, merged workload state and status snapshots
//! - DTOs: wire representations of the executor's start/step/status responses

pub mod domain;
pub mod dto;
