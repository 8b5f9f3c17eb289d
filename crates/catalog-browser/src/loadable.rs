use std::sync::Arc;

use catalog_gateway::FetchError;

/// Loading, error and data state of one independently fetched channel.
#[derive(Debug, Clone)]
pub struct Loadable<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<Arc<FetchError>>,
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> Loadable<T> {
    /// Mark a fetch as in flight.
    ///
    /// The previous outcome, data or error, stays visible until the fetch settles.
    pub fn start_loading(&mut self) {
        self.loading = true;
    }

    /// Settle the in-flight fetch. A failure discards the data.
    pub fn finish(&mut self, result: Result<T, FetchError>) {
        self.loading = false;
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
            },
            Err(err) => {
                self.data = None;
                self.error = Some(Arc::new(err));
            },
        }
    }
}
