//! Fetch cycles and the observable state they drive.
//!
//! A cycle is: publish `Loading`, make one batched request, classify the
//! outcome, publish `Error` or `Ready`. Every cycle takes a fresh generation
//! number; when a cycle finishes after a newer one has started, its outcome is
//! dropped, so the state always reflects the most recently started cycle.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::{
    sync::watch,
    task::{JoinError, JoinHandle},
};
use tracing::{debug, info, warn};

use crate::{FetchResult, LocationWeatherRecord, WeatherSource};

/// Inputs that identify a fetch cycle. A change in any of them calls for a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchQuery {
    pub api_key: String,
    pub location_ids: Vec<u64>,
    /// Prepended at index 0 of a successful result, e.g. a reading from the device itself.
    pub local_record: Option<LocationWeatherRecord>,
}

impl FetchQuery {
    pub fn new(api_key: impl Into<String>, location_ids: Vec<u64>) -> Self {
        Self {
            api_key: api_key.into(),
            location_ids,
            local_record: None,
        }
    }

    pub fn with_local_record(mut self, record: LocationWeatherRecord) -> Self {
        self.local_record = Some(record);
        self
    }
}

#[derive(Debug)]
pub struct WeatherFetcher<S> {
    source: S,
    state: watch::Sender<FetchResult>,
    generation: AtomicU64,
}

impl<S: WeatherSource> WeatherFetcher<S> {
    /// A fetcher starts out `Loading`: nothing has been fetched yet.
    pub fn new(source: S) -> Self {
        let (state, _) = watch::channel(FetchResult::Loading);
        Self {
            source,
            state,
            generation: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchResult> {
        self.state.subscribe()
    }

    pub fn state(&self) -> FetchResult {
        self.state.borrow().clone()
    }

    /// Run one cycle for `query`.
    ///
    /// Returns the published outcome, or `None` when a newer cycle started
    /// while this one was in flight and the outcome was discarded.
    pub async fn fetch(&self, query: &FetchQuery) -> Option<FetchResult> {
        let generation = self.begin_cycle();
        self.run_cycle(generation, query).await
    }

    async fn run_cycle(&self, generation: u64, query: &FetchQuery) -> Option<FetchResult> {
        info!(generation, ids = query.location_ids.len(), "weather fetch started");

        let outcome = match self
            .source
            .fetch_group(&query.api_key, &query.location_ids)
            .await
        {
            Ok(mut records) => {
                if let Some(local) = &query.local_record {
                    records.insert(0, local.clone());
                }
                FetchResult::Ready(records)
            }
            Err(err) => {
                warn!(generation, error = %err, "weather fetch failed");
                FetchResult::Error(err.to_string())
            }
        };

        if self.publish(generation, &outcome) {
            debug!(generation, records = outcome.records().len(), "weather fetch finished");
            Some(outcome)
        } else {
            debug!(generation, "discarding result of superseded fetch");
            None
        }
    }

    /// Start a new cycle for the current inputs and another one each time they change.
    ///
    /// Cycles may overlap; only the latest one is ever published. The task ends
    /// once the input sender is dropped.
    pub fn drive(self: Arc<Self>, mut inputs: watch::Receiver<FetchQuery>) -> JoinHandle<()>
    where
        S: 'static,
    {
        tokio::spawn(async move {
            let mut cycles = Vec::new();
            let mut last = inputs.borrow_and_update().clone();
            cycles.push(self.spawn_cycle(last.clone()));

            while inputs.changed().await.is_ok() {
                let query = inputs.borrow_and_update().clone();
                if query == last {
                    continue;
                }
                last = query;
                let (done, running): (Vec<_>, Vec<_>) =
                    cycles.into_iter().partition(JoinHandle::is_finished);
                cycles = running;
                for cycle in done {
                    report_join(cycle.await);
                }
                cycles.push(self.spawn_cycle(last.clone()));
            }

            for cycle in cycles {
                report_join(cycle.await);
            }
        })
    }

    // The generation is taken before spawning: tasks may start in any order.
    fn spawn_cycle(self: &Arc<Self>, query: FetchQuery) -> JoinHandle<()>
    where
        S: 'static,
    {
        let generation = self.begin_cycle();
        let fetcher = Arc::clone(self);
        tokio::spawn(async move {
            fetcher.run_cycle(generation, &query).await;
        })
    }

    fn begin_cycle(&self) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = FetchResult::Loading;
        });
        generation
    }

    // The generation check runs under the channel's write lock, the same lock
    // `begin_cycle` holds while bumping it.
    fn publish(&self, generation: u64, outcome: &FetchResult) -> bool {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = outcome.clone();
            true
        })
    }
}

fn report_join(result: Result<(), JoinError>) {
    if let Err(err) = result {
        warn!(error = %err, "weather fetch task failed");
    }
}
