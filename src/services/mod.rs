pub mod clipboard;
pub mod conversation;
pub mod database;
pub mod dispatcher;
pub mod persistence;
pub mod speech;
pub mod storage;

pub use clipboard::Clipboard;
pub use conversation::{ConversationStore, Prompter};
pub use database::Database;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use persistence::Persistence;
pub use speech::{CaptureController, SpeechEngine, SpeechEvent};
pub use storage::{MemoryStorage, Storage};
