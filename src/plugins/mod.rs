//! Governance subsystems. Each owns its operations, its CLI surface and a
//! `schema()` description; all state goes through `core::engine::Engine`.

pub mod debate;
pub mod election;
pub mod rules;
pub mod tyranny;
