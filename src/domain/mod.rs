//! Domain model and the collaborator contracts the core depends on.

pub mod payment;
pub mod ports;
