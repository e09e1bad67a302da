//! Reducer for the occupation browser view.
//!
//! `ViewState::reduce` is a pure transition: it updates state and returns the effects
//! the runner has to perform. Every request carries the generation of its lane, and a
//! completion is applied only while that generation is still the lane's latest, so a
//! superseded response can never overwrite newer state.

use std::time::Duration;

use shared::{
    domain::{SocCode, SortKey},
    protocol::{ListingPage, OccupationDetail, OccupationSummary, RankingEntry, RankingPage},
};
use tracing::{debug, warn};

use crate::{
    config::{resolve_data_version, ClientSettings},
    error::ClientError,
    ListingQuery,
};

/// Independent request flow with its own cancellation and loading state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    Listing,
    Ranking,
    Detail,
    Debounce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanePhase {
    #[default]
    Idle,
    InFlight,
    Settled,
}

#[derive(Debug, Clone, Copy, Default)]
struct LaneClock {
    generation: u64,
    phase: LanePhase,
}

impl LaneClock {
    fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.phase = LanePhase::InFlight;
        self.generation
    }

    /// Returns false for completions of superseded or torn-down requests.
    fn settle(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.phase != LanePhase::InFlight {
            return false;
        }
        self.phase = LanePhase::Settled;
        true
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.phase = LanePhase::Idle;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    pub debounce: Duration,
    pub ranking_limit: u32,
    pub page_size: u32,
    pub data_version: String,
}

impl From<&ClientSettings> for ViewConfig {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            debounce: settings.debounce,
            ranking_limit: settings.ranking_limit,
            page_size: settings.page_size,
            data_version: settings.default_data_version.clone(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self::from(&ClientSettings::default())
    }
}

#[derive(Debug)]
pub enum Action {
    Mount,
    Unmount,
    SearchInput(String),
    /// Commits a search term immediately, bypassing the debounce window.
    SubmitSearch(String),
    DebounceElapsed {
        generation: u64,
    },
    SetSort(SortKey),
    SetPage(u32),
    NextPage,
    PreviousPage,
    SetPageSize(u32),
    SetDataVersion(String),
    SelectOccupation(SocCode),
    ListingLoaded {
        generation: u64,
        result: Result<ListingPage, ClientError>,
    },
    RankingLoaded {
        generation: u64,
        result: Result<RankingPage, ClientError>,
    },
    DetailLoaded {
        generation: u64,
        result: Result<OccupationDetail, ClientError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchListing {
        generation: u64,
        query: ListingQuery,
    },
    FetchRanking {
        generation: u64,
        limit: u32,
        data_version: String,
    },
    FetchDetail {
        generation: u64,
        soc_code: SocCode,
        data_version: String,
    },
    ArmDebounce {
        generation: u64,
        delay: Duration,
    },
    CancelDebounce,
    CancelAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleError {
    pub lane: Lane,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskSnapshot {
    pub average: f64,
    /// Number of ranking entries that carried a risk mean.
    pub scored: usize,
    pub top: RankingEntry,
}

/// Ceiling of `total / page_size`, never below one page.
pub fn page_count(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 1;
    }
    let pages = total.div_ceil(u64::from(page_size)).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Mean of the present risk means plus the top-ranked entry.
///
/// With no scored entries the divisor saturates to one, so the average reads `0.0`
/// instead of failing.
pub fn risk_snapshot(ranking: &[RankingEntry]) -> Option<RiskSnapshot> {
    let top = ranking.first()?.clone();
    let (sum, scored) = ranking
        .iter()
        .filter_map(|entry| entry.ai_mean)
        .fold((0.0_f64, 0_usize), |(sum, count), mean| (sum + mean, count + 1));
    Some(RiskSnapshot {
        average: sum / scored.max(1) as f64,
        scored,
        top,
    })
}

#[derive(Debug)]
pub struct ViewState {
    config: ViewConfig,
    mounted: bool,
    search_input: String,
    search: String,
    sort: SortKey,
    page: u32,
    page_size: u32,
    data_version: String,
    items: Vec<OccupationSummary>,
    total: u64,
    /// Set once a listing has loaded, so `total` bounds paging.
    total_known: bool,
    ranking: Vec<RankingEntry>,
    snapshot: Option<RiskSnapshot>,
    selected: Option<OccupationDetail>,
    error: Option<VisibleError>,
    listing_lane: LaneClock,
    ranking_lane: LaneClock,
    detail_lane: LaneClock,
    debounce_lane: LaneClock,
}

impl ViewState {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            mounted: false,
            search_input: String::new(),
            search: String::new(),
            sort: SortKey::default(),
            page: 1,
            page_size: config.page_size.max(1),
            data_version: config.data_version.clone(),
            items: Vec::new(),
            total: 0,
            total_known: false,
            ranking: Vec::new(),
            snapshot: None,
            selected: None,
            error: None,
            listing_lane: LaneClock::default(),
            ranking_lane: LaneClock::default(),
            detail_lane: LaneClock::default(),
            debounce_lane: LaneClock::default(),
            config,
        }
    }

    pub fn reduce(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Mount => {
                self.mounted = true;
                let mut effects = vec![self.fetch_listing(), self.fetch_ranking()];
                if self.search_input.trim() != self.search {
                    effects.push(self.arm_debounce());
                }
                effects
            }
            Action::Unmount => {
                self.mounted = false;
                for lane in self.lanes_mut() {
                    lane.reset();
                }
                vec![Effect::CancelAll]
            }
            Action::SearchInput(text) => {
                self.search_input = text;
                if self.mounted {
                    vec![self.arm_debounce()]
                } else {
                    Vec::new()
                }
            }
            Action::SubmitSearch(text) => {
                self.search_input = text;
                let mut effects = Vec::new();
                if self.debounce_lane.phase == LanePhase::InFlight {
                    self.debounce_lane.reset();
                    effects.push(Effect::CancelDebounce);
                }
                effects.extend(self.commit_search());
                effects
            }
            Action::DebounceElapsed { generation } => {
                if !self.debounce_lane.settle(generation) {
                    debug!(generation, "dropping superseded debounce tick");
                    return Vec::new();
                }
                self.commit_search().into_iter().collect()
            }
            Action::SetSort(sort) => {
                if sort == self.sort {
                    return Vec::new();
                }
                self.sort = sort;
                self.refetch_listing()
            }
            Action::SetPage(page) => self.go_to_page(page),
            Action::NextPage => self.go_to_page(self.page.saturating_add(1)),
            Action::PreviousPage => self.go_to_page(self.page.saturating_sub(1)),
            Action::SetPageSize(page_size) => {
                if page_size == 0 || (page_size == self.page_size && self.page == 1) {
                    return Vec::new();
                }
                self.page_size = page_size;
                self.page = 1;
                self.refetch_listing()
            }
            Action::SetDataVersion(requested) => {
                let data_version =
                    resolve_data_version(Some(requested.as_str()), &self.config.data_version);
                if data_version == self.data_version {
                    return Vec::new();
                }
                self.data_version = data_version;
                if !self.mounted {
                    return Vec::new();
                }
                vec![self.fetch_listing(), self.fetch_ranking()]
            }
            Action::SelectOccupation(soc_code) => {
                if !self.mounted {
                    return Vec::new();
                }
                let generation = self.detail_lane.begin();
                vec![Effect::FetchDetail {
                    generation,
                    soc_code,
                    data_version: self.data_version.clone(),
                }]
            }
            Action::ListingLoaded { generation, result } => {
                if !self.listing_lane.settle(generation) {
                    debug!(generation, "dropping stale listing response");
                    return Vec::new();
                }
                match result {
                    Ok(page) => {
                        self.items = page.items;
                        self.total = page.total;
                        self.total_known = true;
                        // The banner is shared, so a good listing clears it whichever lane set it.
                        self.error = None;
                    }
                    Err(err) => self.record_failure(Lane::Listing, &err),
                }
                Vec::new()
            }
            Action::RankingLoaded { generation, result } => {
                if !self.ranking_lane.settle(generation) {
                    debug!(generation, "dropping stale ranking response");
                    return Vec::new();
                }
                match result {
                    Ok(page) => {
                        self.ranking = page.items;
                        self.snapshot = risk_snapshot(&self.ranking);
                    }
                    // The ranking panel is supplementary; its failures stay off screen.
                    Err(err) if err.is_cancelled() => debug!("ranking request cancelled"),
                    Err(err) => warn!("ranking unavailable: {err}"),
                }
                Vec::new()
            }
            Action::DetailLoaded { generation, result } => {
                if !self.detail_lane.settle(generation) {
                    debug!(generation, "dropping stale detail response");
                    return Vec::new();
                }
                match result {
                    Ok(detail) => {
                        self.selected = Some(detail);
                        self.clear_error(Lane::Detail);
                    }
                    Err(err) => self.record_failure(Lane::Detail, &err),
                }
                Vec::new()
            }
        }
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// Committed (post-debounce) search term.
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn data_version(&self) -> &str {
        &self.data_version
    }

    pub fn items(&self) -> &[OccupationSummary] {
        &self.items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn page_count(&self) -> u32 {
        page_count(self.total, self.page_size)
    }

    pub fn ranking(&self) -> &[RankingEntry] {
        &self.ranking
    }

    pub fn risk_snapshot(&self) -> Option<&RiskSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn selected(&self) -> Option<&OccupationDetail> {
        self.selected.as_ref()
    }

    pub fn error(&self) -> Option<&VisibleError> {
        self.error.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn phase(&self, lane: Lane) -> LanePhase {
        self.lane(lane).phase
    }

    pub fn is_loading(&self, lane: Lane) -> bool {
        self.phase(lane) == LanePhase::InFlight
    }

    /// True while any lane, including the debounce timer, is pending.
    pub fn is_busy(&self) -> bool {
        [Lane::Listing, Lane::Ranking, Lane::Detail, Lane::Debounce]
            .into_iter()
            .any(|lane| self.is_loading(lane))
    }

    pub fn listing_query(&self) -> ListingQuery {
        ListingQuery {
            search: Some(self.search.clone()),
            sort: Some(self.sort),
            page: Some(self.page),
            page_size: Some(self.page_size),
            data_version: Some(self.data_version.clone()),
        }
    }

    fn lane(&self, lane: Lane) -> &LaneClock {
        match lane {
            Lane::Listing => &self.listing_lane,
            Lane::Ranking => &self.ranking_lane,
            Lane::Detail => &self.detail_lane,
            Lane::Debounce => &self.debounce_lane,
        }
    }

    fn lanes_mut(&mut self) -> [&mut LaneClock; 4] {
        [
            &mut self.listing_lane,
            &mut self.ranking_lane,
            &mut self.detail_lane,
            &mut self.debounce_lane,
        ]
    }

    fn go_to_page(&mut self, page: u32) -> Vec<Effect> {
        let mut target = page.max(1);
        if self.total_known {
            target = target.min(self.page_count());
        }
        if target == self.page {
            return Vec::new();
        }
        self.page = target;
        self.refetch_listing()
    }

    fn commit_search(&mut self) -> Option<Effect> {
        let term = self.search_input.trim().to_string();
        let changed = term != self.search || self.page != 1;
        self.search = term;
        self.page = 1;
        (changed && self.mounted).then(|| self.fetch_listing())
    }

    fn refetch_listing(&mut self) -> Vec<Effect> {
        if self.mounted {
            vec![self.fetch_listing()]
        } else {
            Vec::new()
        }
    }

    fn fetch_listing(&mut self) -> Effect {
        let generation = self.listing_lane.begin();
        Effect::FetchListing {
            generation,
            query: self.listing_query(),
        }
    }

    fn fetch_ranking(&mut self) -> Effect {
        let generation = self.ranking_lane.begin();
        Effect::FetchRanking {
            generation,
            limit: self.config.ranking_limit,
            data_version: self.data_version.clone(),
        }
    }

    fn arm_debounce(&mut self) -> Effect {
        let generation = self.debounce_lane.begin();
        Effect::ArmDebounce {
            generation,
            delay: self.config.debounce,
        }
    }

    fn record_failure(&mut self, lane: Lane, err: &ClientError) {
        if err.is_cancelled() {
            debug!(?lane, "request cancelled");
            return;
        }
        debug!(?lane, "request failed: {err}");
        self.error = Some(VisibleError {
            lane,
            message: err.to_string(),
        });
    }

    /// A detail success only clears an error the detail lane raised.
    fn clear_error(&mut self, lane: Lane) {
        if self.error.as_ref().is_some_and(|error| error.lane == lane) {
            self.error = None;
        }
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
