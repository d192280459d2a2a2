use once_cell::sync::OnceCell;
use std::sync::Arc;

use super::state::ProcessState;

#[derive(Debug, thiserror::Error)]
pub enum GlobalStateError {
    #[error("{0} is already initialized")]
    AlreadyInitialized(&'static str),
}

/// Write-once slot for a process-wide value.
///
/// Reading an empty slot is a programming error and panics; there is no
/// default to fall back to.
pub struct ProcessCell<T> {
    name: &'static str,
    inner: OnceCell<Arc<T>>,
}

impl<T> ProcessCell<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: OnceCell::new(),
        }
    }

    pub fn install(&self, value: Arc<T>) -> Result<&Arc<T>, GlobalStateError> {
        self.inner
            .set(value)
            .map_err(|_| GlobalStateError::AlreadyInitialized(self.name))?;
        Ok(self.get())
    }

    pub fn get(&self) -> &Arc<T> {
        match self.inner.get() {
            Some(value) => value,
            None => panic!("{} accessed before initialization", self.name),
        }
    }

    pub fn try_get(&self) -> Option<&Arc<T>> {
        self.inner.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// Process-wide registry for call sites that are not handed a `ProcessState`.
pub static PROCESS: ProcessCell<ProcessState> = ProcessCell::new("process state");

pub fn install(state: Arc<ProcessState>) -> Result<&'static Arc<ProcessState>, GlobalStateError> {
    PROCESS.install(state)
}

/// Panics if called before [`install`].
pub fn process() -> &'static Arc<ProcessState> {
    PROCESS.get()
}
