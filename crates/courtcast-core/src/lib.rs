pub mod domain;
pub mod events;
pub mod heartbeat;
pub mod ids;
pub mod messages;
