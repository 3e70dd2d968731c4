//! The aggregated view model.

use crate::QueryError;

/// The state of one named source.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySourceResult<T> {
    /// Last successful value. Kept while a refetch of the same parameter
    /// is in flight, and kept when a later fetch of it fails.
    pub data: Option<T>,
    pub error: Option<QueryError>,
    pub is_loading: bool,
    pub is_error: bool,
}

impl<T> QuerySourceResult<T> {
    /// A source that has never been fetched.
    pub fn idle() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
            is_error: false,
        }
    }

    pub(crate) fn start_loading(&mut self, keep_data: bool) {
        if !keep_data {
            self.data = None;
        }
        self.error = None;
        self.is_loading = true;
        self.is_error = false;
    }

    pub(crate) fn settle(&mut self, outcome: Result<T, QueryError>) {
        self.is_loading = false;
        match outcome {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
                self.is_error = false;
            }
            Err(e) => {
                self.error = Some(e);
                self.is_error = true;
            }
        }
    }
}

impl<T> Default for QuerySourceResult<T> {
    fn default() -> Self {
        Self::idle()
    }
}

/// Every source of an aggregator, in the order they were registered.
///
/// `is_loading` and `is_error` are logical ORs over the sources: one
/// pending source keeps the whole view loading, one failed source flags
/// the whole view as errored. Data of the sources that did succeed stays
/// readable either way, so a view can still render what it has.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult<T> {
    sources: Vec<(String, QuerySourceResult<T>)>,
    /// Fetch generation the entries belong to. Results from older
    /// generations are dropped on arrival.
    pub(crate) generation: u64,
}

impl<T> AggregateResult<T> {
    pub(crate) fn new<I: IntoIterator<Item = String>>(names: I) -> Self {
        Self {
            sources: names
                .into_iter()
                .map(|name| (name, QuerySourceResult::idle()))
                .collect(),
            generation: 0,
        }
    }

    /// `true` while any source is still fetching.
    pub fn is_loading(&self) -> bool {
        self.sources.iter().any(|(_, s)| s.is_loading)
    }

    /// `true` if any source failed.
    pub fn is_error(&self) -> bool {
        self.sources.iter().any(|(_, s)| s.is_error)
    }

    /// Partial success: at least one source failed and at least one has
    /// data to show.
    pub fn is_degraded(&self) -> bool {
        self.is_error() && self.sources.iter().any(|(_, s)| s.data.is_some())
    }

    /// The result for `name`, if such a source exists.
    pub fn get(&self, name: &str) -> Option<&QuerySourceResult<T>> {
        self.sources.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Shorthand for `get(name)?.data.as_ref()`.
    pub fn data(&self, name: &str) -> Option<&T> {
        self.get(name)?.data.as_ref()
    }

    /// `(name, result)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QuerySourceResult<T>)> {
        self.sources.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Failed sources and their errors.
    pub fn errors(&self) -> impl Iterator<Item = (&str, &QueryError)> {
        self.sources
            .iter()
            .filter_map(|(n, s)| s.error.as_ref().map(|e| (n.as_str(), e)))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Registers a source, or returns the index of the existing one.
    pub(crate) fn insert(&mut self, name: String) -> usize {
        match self.sources.iter().position(|(n, _)| *n == name) {
            Some(index) => index,
            None => {
                self.sources.push((name, QuerySourceResult::idle()));
                self.sources.len() - 1
            }
        }
    }

    pub(crate) fn source_mut(&mut self, index: usize) -> Option<&mut QuerySourceResult<T>> {
        self.sources.get_mut(index).map(|(_, s)| s)
    }

    pub(crate) fn sources_mut(&mut self) -> impl Iterator<Item = &mut QuerySourceResult<T>> {
        self.sources.iter_mut().map(|(_, s)| s)
    }
}
