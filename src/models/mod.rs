pub mod message;
pub mod thread;

pub use message::{Message, Role};
pub use thread::Thread;
