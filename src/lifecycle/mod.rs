//! Process-level wiring: starting and stopping the operator, and log setup.

pub mod operator_system;
pub mod tracing;

pub use operator_system::OperatorSystem;
pub use self::tracing::setup_tracing;
