//! Domain models for Campus IAM.

pub mod permission;
pub mod role;
