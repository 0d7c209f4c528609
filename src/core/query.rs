//! Polling queries and cache-invalidating mutations
//!
//! A [`PollingQuery`] owns one background task that fetches immediately and
//! then on a fixed interval, publishing a [`QueryState`] through a watch
//! channel. `is_loading` only covers the first fetch; afterwards data and
//! errors are swapped in place so consumers keep rendering the last good
//! snapshot while a refetch is running.
//!
//! A [`Mutation`] issues a single request and, when it succeeds, asks the
//! [`QueryClient`] to refetch every live query under its target key.

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use crate::api::ApiError;

/// Cache key identifying what a query holds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Alerts,
    Vehicles,
    FleetAnalytics,
    HistoricalMetrics { from: NaiveDate, to: NaiveDate },
    VehicleTelemetry { vehicle_id: String },
}

impl QueryKey {
    /// Invalidation matches on the root, so one call covers every variant of a key
    pub fn root(&self) -> &'static str {
        match self {
            Self::Alerts => "alerts",
            Self::Vehicles => "vehicles",
            Self::FleetAnalytics => "fleetAnalytics",
            Self::HistoricalMetrics { .. } => "historicalMetrics",
            Self::VehicleTelemetry { .. } => "vehicleTelemetry",
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HistoricalMetrics { from, to } => write!(f, "{}[{},{}]", self.root(), from, to),
            Self::VehicleTelemetry { vehicle_id } => write!(f, "{}[{}]", self.root(), vehicle_id),
            _ => f.write_str(self.root()),
        }
    }
}

/// What a view sees of a query
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub is_fetching: bool,
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub fetch_count: u64,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: true,
            is_fetching: false,
            error: None,
            updated_at: None,
            fetch_count: 0,
        }
    }
}

impl<T> QueryState<T> {
    fn settle<E: fmt::Display>(&mut self, result: Result<T, E>) {
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
                self.updated_at = Some(Utc::now());
            }
            Err(e) => self.error = Some(e.to_string()),
        }
        self.is_loading = false;
        self.is_fetching = false;
        self.fetch_count += 1;
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Handle to a running polling task; dropping it stops the polling.
pub struct PollingQuery<T> {
    key: QueryKey,
    state: watch::Receiver<QueryState<T>>,
    refetch: Arc<Notify>,
    task: JoinHandle<()>,
}

impl<T> PollingQuery<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start polling. With no interval the query only refetches on demand.
    pub fn spawn<F, Fut>(
        client: &QueryClient,
        key: QueryKey,
        interval: Option<Duration>,
        fetch: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(QueryState::default());
        let refetch = Arc::new(Notify::new());
        client.register(key.clone(), &refetch);

        let wake = Arc::clone(&refetch);
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            loop {
                tx.send_modify(|s| s.is_fetching = true);
                let result = fetch().await;
                match &result {
                    Ok(_) => tracing::trace!(key = %task_key, "query fetched"),
                    Err(e) => tracing::warn!(key = %task_key, error = %e, "query fetch failed"),
                }
                tx.send_modify(|s| s.settle(result));

                let next_poll = async {
                    match interval {
                        Some(period) => tokio::time::sleep(period).await,
                        None => std::future::pending::<()>().await,
                    }
                };

                tokio::select! {
                    _ = next_poll => {}
                    _ = wake.notified() => {
                        tracing::debug!(key = %task_key, "refetch requested");
                    }
                }
            }
        });

        Self {
            key,
            state: rx,
            refetch,
            task,
        }
    }

    pub fn snapshot(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.state.clone()
    }

    /// Fetch now instead of waiting for the next tick
    pub fn refetch(&self) {
        self.refetch.notify_one();
    }
}

impl<T> Drop for PollingQuery<T> {
    fn drop(&mut self) {
        self.task.abort();
        tracing::debug!(key = %self.key, "query unmounted");
    }
}

/// Registry of live queries used for invalidation
#[derive(Clone, Default)]
pub struct QueryClient {
    queries: Arc<Mutex<Vec<(QueryKey, Weak<Notify>)>>>,
}

impl QueryClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, key: QueryKey, refetch: &Arc<Notify>) {
        let mut queries = self.queries.lock();
        queries.retain(|(_, refetch)| refetch.strong_count() > 0);
        queries.push((key, Arc::downgrade(refetch)));
    }

    /// Refetch every live query sharing the key's root. Returns how many were woken.
    pub fn invalidate(&self, key: &QueryKey) -> usize {
        self.wake(|k| k.root() == key.root())
    }

    pub fn invalidate_all(&self) -> usize {
        self.wake(|_| true)
    }

    fn wake(&self, matches: impl Fn(&QueryKey) -> bool) -> usize {
        let mut queries = self.queries.lock();
        queries.retain(|(_, refetch)| refetch.strong_count() > 0);

        let mut woken = 0;
        for (key, refetch) in queries.iter() {
            if !matches(key) {
                continue;
            }
            if let Some(refetch) = refetch.upgrade() {
                refetch.notify_one();
                woken += 1;
            }
        }
        tracing::debug!(woken, "queries invalidated");
        woken
    }

    pub fn live_queries(&self) -> usize {
        self.queries
            .lock()
            .iter()
            .filter(|(_, refetch)| refetch.strong_count() > 0)
            .count()
    }
}

/// Counts in-flight mutations shared by a group of mutation handles
#[derive(Debug, Clone, Default)]
pub struct PendingTracker {
    in_flight: Arc<AtomicUsize>,
}

impl PendingTracker {
    pub fn is_busy(&self) -> bool {
        self.in_flight() > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn begin(&self) -> PendingGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        PendingGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

struct PendingGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

type MutationFn<A, R> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<R, ApiError>> + Send + Sync>;

/// A write against the backend that invalidates a query key on success
pub struct Mutation<A, R> {
    name: &'static str,
    run: MutationFn<A, R>,
    invalidates: QueryKey,
    client: QueryClient,
    pending: PendingTracker,
    serial: Arc<tokio::sync::Mutex<()>>,
}

impl<A, R> Clone for Mutation<A, R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            run: Arc::clone(&self.run),
            invalidates: self.invalidates.clone(),
            client: self.client.clone(),
            pending: self.pending.clone(),
            serial: Arc::clone(&self.serial),
        }
    }
}

impl<A, R> Mutation<A, R>
where
    A: fmt::Debug + Send + 'static,
    R: Send + 'static,
{
    pub fn new<F, Fut>(
        name: &'static str,
        client: &QueryClient,
        pending: &PendingTracker,
        invalidates: QueryKey,
        run: F,
    ) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ApiError>> + Send + 'static,
    {
        Self {
            name,
            run: Arc::new(move |arg| run(arg).boxed()),
            invalidates,
            client: client.clone(),
            pending: pending.clone(),
            serial: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Mark the mutation pending and return the request to drive. Requests
    /// on the same mutation run one at a time.
    ///
    /// The tracker counts the request from this call on, not from its first
    /// poll, so a caller checking `is_busy` right after sees it. Dropping the
    /// returned future without polling it releases the slot.
    pub fn start(&self, arg: A) -> impl Future<Output = Result<R, ApiError>> + Send + 'static {
        let pending = self.pending.begin();
        let this = self.clone();

        async move {
            let _pending = pending;
            let _serial = this.serial.lock().await;

            let label = format!("{:?}", arg);
            let result = (this.run)(arg).await;
            match &result {
                Ok(_) => {
                    tracing::info!(mutation = this.name, arg = %label, "mutation succeeded");
                    this.client.invalidate(&this.invalidates);
                }
                Err(e) => {
                    tracing::warn!(mutation = this.name, arg = %label, error = %e, "mutation failed");
                }
            }
            result
        }
    }
}
