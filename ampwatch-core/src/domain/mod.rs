//! Core domain types
//!
//! These types describe one diagnostic workload as the coordinator sees it.
//! They are shared between the coordinator (which owns and mutates them) and
//! any host that renders them.

pub mod workload;
