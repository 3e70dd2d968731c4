//! Fan-out/fan-in over named asynchronous sources.
//!
//! Each [`fetch`](QueryAggregator::fetch) spawns one Tokio task per
//! source. Every task writes only its own entry of the shared
//! [`AggregateResult`], which lives inside a `watch` channel, so the
//! view model is consistent at every instant regardless of the order in
//! which sources complete.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::{AggregateResult, QueryError};

/// The future a source returns.
pub type SourceFuture<T> = BoxFuture<'static, Result<T, QueryError>>;

type Fetcher<P, T> = Box<dyn Fn(P) -> SourceFuture<T> + Send + Sync>;

struct Source<P, T> {
    name: String,
    fetch: Fetcher<P, T>,
}

/// Combines independently failing, independently completing fetches
/// into one [`AggregateResult`].
///
/// Every source receives the same parameter (for the dashboard: the
/// number of days to cover). Fetching again before the previous fetch
/// settled aborts the stale tasks, and any stale result that still
/// arrives is discarded, so the final state only ever reflects the last
/// parameter.
///
/// ```ignore
/// let mut agg = QueryAggregator::new(7)
///     .with_source("funnel", move |days| metrics.fetch("funnel", days, None));
/// agg.fetch(None);
/// let result = agg.settled().await;
/// ```
pub struct QueryAggregator<P, T> {
    default_param: P,
    current_param: Option<P>,
    sources: Vec<Source<P, T>>,
    state: Arc<watch::Sender<AggregateResult<T>>>,
    tasks: Vec<JoinHandle<()>>,
}

impl<P, T> QueryAggregator<P, T>
where
    P: Clone + PartialEq + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Creates an aggregator with no sources. `default_param` is used
    /// whenever [`fetch`](Self::fetch) is called with `None`.
    pub fn new(default_param: P) -> Self {
        let (tx, _) = watch::channel(AggregateResult::new(Vec::new()));
        Self {
            default_param,
            current_param: None,
            sources: Vec::new(),
            state: Arc::new(tx),
            tasks: Vec::new(),
        }
    }

    /// Registers a named source. Registering a name twice replaces the
    /// earlier fetch function but keeps its position.
    pub fn with_source<F, Fut>(mut self, name: impl Into<String>, fetch: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
    {
        let name = name.into();
        let fetch: Fetcher<P, T> = Box::new(move |param| fetch(param).boxed());

        let mut index = 0;
        self.state.send_modify(|agg| index = agg.insert(name.clone()));
        if index < self.sources.len() {
            self.sources[index].fetch = fetch;
        } else {
            self.sources.push(Source { name, fetch });
        }
        self
    }

    /// Starts fetching every source with `param`, or with the default
    /// parameter when `None`. Returns the fetch generation.
    ///
    /// Every source is marked loading before this returns. Data from a
    /// previous fetch is kept while loading only if the parameter did
    /// not change.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn fetch(&mut self, param: Option<P>) -> u64 {
        let param = param.unwrap_or_else(|| self.default_param.clone());
        let keep_data = self.current_param.as_ref() == Some(&param);

        let aborted = self.tasks.len();
        for task in self.tasks.drain(..) {
            task.abort();
        }

        let mut generation = 0;
        self.state.send_modify(|agg| {
            agg.generation += 1;
            generation = agg.generation;
            for source in agg.sources_mut() {
                source.start_loading(keep_data);
            }
        });
        debug!(generation, sources = self.sources.len(), aborted, "fetch started");

        for (index, source) in self.sources.iter().enumerate() {
            let future = (source.fetch)(param.clone());
            let state = Arc::clone(&self.state);
            let name = source.name.clone();
            self.tasks.push(tokio::spawn(async move {
                let outcome = match AssertUnwindSafe(future).catch_unwind().await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(QueryError::Other(format!("source {name} panicked"))),
                };
                if let Err(e) = &outcome {
                    warn!(source = %name, generation, error = %e, "source failed");
                }

                let applied = state.send_if_modified(|agg| {
                    if agg.generation != generation {
                        return false;
                    }
                    match agg.source_mut(index) {
                        Some(entry) => {
                            entry.settle(outcome);
                            true
                        }
                        None => false,
                    }
                });
                if applied {
                    trace!(source = %name, generation, "source settled");
                } else {
                    trace!(source = %name, generation, "stale result dropped");
                }
            }));
        }

        self.current_param = Some(param);
        generation
    }

    /// The current view model.
    pub fn snapshot(&self) -> AggregateResult<T> {
        self.state.borrow().clone()
    }

    /// A receiver that is notified whenever any source changes.
    pub fn subscribe(&self) -> watch::Receiver<AggregateResult<T>> {
        self.state.subscribe()
    }

    /// Waits until no source is loading and returns the result.
    ///
    /// Returns immediately if nothing is in flight.
    pub async fn settled(&self) -> AggregateResult<T> {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|agg| !agg.is_loading()).await {
            Ok(agg) => agg.clone(),
            // The sender lives in `self`, so this cannot happen while
            // we are borrowed.
            Err(_) => self.snapshot(),
        }
    }

    pub fn default_param(&self) -> &P {
        &self.default_param
    }

    /// The parameter of the most recent fetch, if any.
    pub fn current_param(&self) -> Option<&P> {
        self.current_param.as_ref()
    }

    /// Source names in registration order.
    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.name.as_str())
    }

    /// Generation of the most recent fetch (0 before the first).
    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }
}

impl<P, T> Drop for QueryAggregator<P, T> {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::Notify;

    use super::*;

    fn ready(value: u32) -> impl Fn(u32) -> SourceFuture<u32> + Send + Sync + 'static {
        move |_| async move { Ok(value) }.boxed()
    }

    // =====================================================================
    // fetch() fan-out
    // =====================================================================

    #[tokio::test]
    async fn test_fetch_two_ready_one_pending_is_loading_with_partial_data() {
        let release = Arc::new(Notify::new());
        let gate = Arc::clone(&release);
        let mut agg = QueryAggregator::new(7)
            .with_source("a", ready(1))
            .with_source("b", ready(2))
            .with_source("c", move |_| {
                let gate = Arc::clone(&gate);
                async move {
                    gate.notified().await;
                    Ok(3)
                }
            });

        agg.fetch(None);
        let mut rx = agg.subscribe();
        let partial = rx
            .wait_for(|r| r.data("a").is_some() && r.data("b").is_some())
            .await
            .unwrap()
            .clone();

        assert!(partial.is_loading());
        assert!(!partial.is_error());
        assert_eq!(partial.data("a"), Some(&1));
        assert_eq!(partial.data("b"), Some(&2));
        assert!(partial.get("c").unwrap().is_loading);

        release.notify_one();
        let done = agg.settled().await;
        assert!(!done.is_loading());
        assert_eq!(done.data("c"), Some(&3));
    }

    #[tokio::test]
    async fn test_fetch_one_rejects_is_error_keeps_other_data() {
        let mut agg = QueryAggregator::new(7)
            .with_source("a", ready(1))
            .with_source("b", |_| async {
                Err::<u32, _>(QueryError::Other("down".into()))
            })
            .with_source("c", ready(3));

        agg.fetch(None);
        let result = agg.settled().await;

        assert!(!result.is_loading());
        assert!(result.is_error());
        assert!(result.is_degraded());
        assert_eq!(result.data("a"), Some(&1));
        assert_eq!(result.data("c"), Some(&3));
        assert_eq!(
            result.get("b").unwrap().error,
            Some(QueryError::Other("down".into()))
        );
    }

    #[tokio::test]
    async fn test_fetch_none_uses_default_param() {
        let mut agg = QueryAggregator::new(30)
            .with_source("echo", |days: u32| async move { Ok(days) });

        agg.fetch(None);
        assert_eq!(agg.settled().await.data("echo"), Some(&30));
        assert_eq!(agg.current_param(), Some(&30));

        agg.fetch(Some(90));
        assert_eq!(agg.settled().await.data("echo"), Some(&90));
    }

    #[tokio::test]
    async fn test_fetch_marks_every_source_loading_synchronously() {
        let mut agg = QueryAggregator::new(7)
            .with_source("a", ready(1))
            .with_source("b", ready(2));

        agg.fetch(None);
        let snap = agg.snapshot();

        assert!(snap.iter().all(|(_, s)| s.is_loading));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_last_parameter_wins() {
        // Slow for the old parameter, fast for the new one, so the stale
        // result would land last if it were not dropped.
        let mut agg = QueryAggregator::new(7).with_source("days", |days: u32| async move {
            let delay = if days == 30 { 60 } else { 1 };
            tokio::time::sleep(Duration::from_secs(delay)).await;
            Ok(days)
        });

        let first = agg.fetch(Some(30));
        let second = agg.fetch(Some(7));
        assert!(second > first);

        let result = agg.settled().await;
        assert_eq!(result.data("days"), Some(&7));

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(agg.snapshot().data("days"), Some(&7));
    }

    #[tokio::test]
    async fn test_refetch_same_param_keeps_data_while_loading() {
        let release = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let (gate, counter) = (Arc::clone(&release), Arc::clone(&calls));
        let mut agg = QueryAggregator::new(7).with_source("a", move |_| {
            let gate = Arc::clone(&gate);
            let call = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if call > 0 {
                    gate.notified().await;
                }
                Ok(call as u32)
            }
        });

        agg.fetch(None);
        agg.settled().await;

        agg.fetch(None);
        let snap = agg.snapshot();
        assert!(snap.is_loading());
        assert_eq!(snap.data("a"), Some(&0), "same parameter keeps stale data");

        agg.fetch(Some(14));
        assert_eq!(agg.snapshot().data("a"), None, "new parameter clears it");

        release.notify_one();
        assert_eq!(agg.settled().await.data("a"), Some(&2));
    }

    #[tokio::test]
    async fn test_panicking_source_settles_as_error() {
        let mut agg = QueryAggregator::new(7)
            .with_source("ok", ready(1))
            .with_source("boom", |_| async {
                if true {
                    panic!("source blew up");
                }
                Ok(0)
            });

        agg.fetch(None);
        let result = agg.settled().await;

        assert!(!result.is_loading());
        assert!(result.get("boom").unwrap().is_error);
        assert_eq!(result.data("ok"), Some(&1));
    }

    // =====================================================================
    // Registration, settled(), drop
    // =====================================================================

    #[tokio::test]
    async fn test_with_source_duplicate_name_replaces_in_place() {
        let mut agg = QueryAggregator::new(0)
            .with_source("a", ready(1))
            .with_source("b", ready(2))
            .with_source("a", ready(10));

        assert_eq!(agg.source_names().collect::<Vec<_>>(), vec!["a", "b"]);
        agg.fetch(None);
        assert_eq!(agg.settled().await.data("a"), Some(&10));
    }

    #[tokio::test]
    async fn test_settled_without_fetch_returns_idle() {
        let agg = QueryAggregator::new(0).with_source("a", ready(1));
        let result = agg.settled().await;
        assert_eq!(agg.generation(), 0);
        assert!(!result.is_loading());
        assert_eq!(result.data("a"), None);
    }

    #[tokio::test]
    async fn test_drop_aborts_in_flight_tasks() {
        let dropped = Arc::new(AtomicUsize::new(0));

        struct Guard(Arc<AtomicUsize>);
        impl Drop for Guard {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let counter = Arc::clone(&dropped);
        let mut agg = QueryAggregator::new(0).with_source("slow", move |_| {
            let guard = Guard(Arc::clone(&counter));
            async move {
                let _guard = guard;
                std::future::pending::<()>().await;
                Ok(0u32)
            }
        });
        agg.fetch(None);
        tokio::task::yield_now().await;

        drop(agg);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
    }
}
