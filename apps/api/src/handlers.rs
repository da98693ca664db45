//! HTTP handlers, one thin adapter per transport-agnostic operation.

pub mod approvals;
pub mod health;
pub mod permissions;
