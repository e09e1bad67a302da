//! Effect runner: owns the view state and turns reducer effects into spawned requests.
//!
//! All state mutation happens on the task that owns the `Controller`. Spawned requests
//! only perform I/O and post their completion back through a channel.

use std::{collections::HashMap, future::Future, sync::Arc};

use tokio::sync::mpsc;
use tracing::debug;

use crate::{
    cancel::CancelToken,
    controller::{
        debounce::DebounceTimer,
        state::{Action, Effect, Lane, ViewConfig, ViewState},
    },
    OccupationApi,
};

pub struct Controller<A: OccupationApi + 'static> {
    api: Arc<A>,
    state: ViewState,
    completions_tx: mpsc::UnboundedSender<Action>,
    completions_rx: mpsc::UnboundedReceiver<Action>,
    in_flight: HashMap<Lane, CancelToken>,
    debounce: DebounceTimer,
}

impl<A: OccupationApi + 'static> Controller<A> {
    pub fn new(api: Arc<A>, config: ViewConfig) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            api,
            state: ViewState::new(config),
            completions_tx,
            completions_rx,
            in_flight: HashMap::new(),
            debounce: DebounceTimer::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn dispatch(&mut self, action: Action) {
        for effect in self.state.reduce(action) {
            self.run(effect);
        }
    }

    /// Waits for the next request completion or debounce tick without applying it.
    pub async fn next_completion(&mut self) -> Option<Action> {
        self.completions_rx.recv().await
    }

    /// Applies completions until no lane is pending.
    pub async fn settle(&mut self) {
        while self.state.is_busy() {
            let Some(action) = self.completions_rx.recv().await else {
                break;
            };
            self.dispatch(action);
        }
    }

    /// Tears the view down: cancels every lane and the debounce timer.
    pub fn shutdown(&mut self) {
        self.dispatch(Action::Unmount);
    }

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::FetchListing { generation, query } => {
                let cancel = self.replace_lane(Lane::Listing);
                let api = Arc::clone(&self.api);
                self.spawn_request(async move {
                    let result = api.list_occupations(&query, &cancel).await;
                    Action::ListingLoaded { generation, result }
                });
            }
            Effect::FetchRanking {
                generation,
                limit,
                data_version,
            } => {
                let cancel = self.replace_lane(Lane::Ranking);
                let api = Arc::clone(&self.api);
                self.spawn_request(async move {
                    let result = api
                        .rankings(Some(limit), Some(data_version.as_str()), &cancel)
                        .await;
                    Action::RankingLoaded { generation, result }
                });
            }
            Effect::FetchDetail {
                generation,
                soc_code,
                data_version,
            } => {
                let cancel = self.replace_lane(Lane::Detail);
                let api = Arc::clone(&self.api);
                self.spawn_request(async move {
                    let result = api
                        .occupation_detail(&soc_code, Some(data_version.as_str()), &cancel)
                        .await;
                    Action::DetailLoaded { generation, result }
                });
            }
            Effect::ArmDebounce { generation, delay } => {
                let tx = self.completions_tx.clone();
                self.debounce.arm(delay, move || {
                    let _ = tx.send(Action::DebounceElapsed { generation });
                });
            }
            Effect::CancelDebounce => self.debounce.cancel(),
            Effect::CancelAll => {
                self.debounce.cancel();
                for (lane, cancel) in self.in_flight.drain() {
                    debug!(?lane, "cancelling request on teardown");
                    cancel.cancel();
                }
            }
        }
    }

    fn replace_lane(&mut self, lane: Lane) -> CancelToken {
        let cancel = CancelToken::new();
        if let Some(previous) = self.in_flight.insert(lane, cancel.clone()) {
            if !previous.is_cancelled() {
                debug!(?lane, "cancelling superseded request");
                previous.cancel();
            }
        }
        cancel
    }

    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = Action> + Send + 'static,
    {
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let completion = request.await;
            let _ = tx.send(completion);
        });
    }
}

impl<A: OccupationApi + 'static> Drop for Controller<A> {
    fn drop(&mut self) {
        for cancel in self.in_flight.values() {
            cancel.cancel();
        }
    }
}

#[cfg(test)]
#[path = "tests/runner_tests.rs"]
mod tests;
