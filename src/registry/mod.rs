pub mod session;
pub mod tab_registry;

pub use tab_registry::{HostFactory, Registry};
