pub mod connection;
pub mod server;

pub use server::{Server, NOTIFICATION_CHANNEL_CAPACITY};
