pub mod codec;
pub mod message;

pub use message::{error_response, notification, success_response, RpcRequest};
