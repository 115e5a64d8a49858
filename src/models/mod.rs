mod role;
mod chat;
mod session;
mod export;

pub use role::*;
pub use chat::*;
pub use session::*;
pub use export::*;
