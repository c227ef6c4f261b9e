pub mod codec;
pub mod command;
pub mod reply;

pub use codec::AgentCodec;
pub use command::Command;
pub use reply::Reply;
