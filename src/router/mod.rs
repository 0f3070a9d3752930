pub mod dispatch;
pub mod handlers;

pub use dispatch::{Context, Dispatcher};
