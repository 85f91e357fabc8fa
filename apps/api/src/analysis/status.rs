use std::sync::Mutex;

/// Receives the human-readable progress strings a pipeline run emits.
pub trait StatusSink: Send + Sync {
    fn report(&self, status: &str);
}

/// Collects every status in order.
#[derive(Debug, Default)]
pub struct StatusLog {
    entries: Mutex<Vec<String>>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<String> {
        self.entries().pop()
    }
}

impl StatusSink for StatusLog {
    fn report(&self, status: &str) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(status.to_string()),
            Err(poisoned) => poisoned.into_inner().push(status.to_string()),
        }
    }
}
