pub mod bridge;
pub mod broadcaster;
pub mod cache;
pub mod client;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod server;
#[cfg(test)]
pub(crate) mod testing;

pub use bridge::InternalEvent;
pub use dispatch::EventDispatcher;
pub use error::DispatchError;
pub use server::{start, ServerConfig, ServerHandle};
