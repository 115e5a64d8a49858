mod config;
mod case;
mod chat;
mod export;

pub use config::*;
pub use case::*;
pub use chat::*;
pub use export::*;
