use anyhow::Result;

/// System clipboard, supplied by the front end.
pub trait Clipboard: Send {
    fn write_text(&self, text: &str) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::anyhow;

    use super::*;

    /// Records every write. Clones share the record.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingClipboard {
        pub writes: Arc<Mutex<Vec<String>>>,
    }

    impl Clipboard for RecordingClipboard {
        fn write_text(&self, text: &str) -> Result<()> {
            self.writes
                .lock()
                .map_err(|_| anyhow!("clipboard record poisoned"))?
                .push(text.to_string());
            Ok(())
        }
    }

    pub(crate) struct DeniedClipboard;

    impl Clipboard for DeniedClipboard {
        fn write_text(&self, _text: &str) -> Result<()> {
            Err(anyhow!("clipboard access denied"))
        }
    }
}
