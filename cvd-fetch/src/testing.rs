use crate::source::{FileSource, LoadFuture};
use cvd_core::CovidError;
use futures::FutureExt;
use std::cell::RefCell;
use std::collections::HashMap;

/// In-memory source that counts requests per path. Paths registered with
/// `with_failure` answer with a 503.
#[derive(Default)]
pub(crate) struct FakeSource {
    files: HashMap<String, Option<String>>,
    calls: RefCell<HashMap<String, usize>>,
    yielding: bool,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_file(mut self, path: &str, body: &str) -> Self {
        self.files.insert(path.to_string(), Some(body.to_string()));
        self
    }

    pub(crate) fn with_failure(mut self, path: &str) -> Self {
        self.files.insert(path.to_string(), None);
        self
    }

    /// Yield once before answering, so concurrent callers overlap.
    pub(crate) fn yielding(mut self) -> Self {
        self.yielding = true;
        self
    }

    pub(crate) fn calls(&self, path: &str) -> usize {
        self.calls.borrow().get(path).copied().unwrap_or(0)
    }
}

impl FileSource for FakeSource {
    fn load(&self, path: &str) -> LoadFuture {
        *self.calls.borrow_mut().entry(path.to_string()).or_default() += 1;
        let outcome = self.files.get(path).cloned().flatten();
        let yielding = self.yielding;
        let url = path.to_string();
        async move {
            if yielding {
                tokio::task::yield_now().await;
            }
            outcome.ok_or(CovidError::HttpStatus { status: 503, url })
        }
        .boxed_local()
    }
}
