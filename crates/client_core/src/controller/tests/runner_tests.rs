use super::*;

use std::{sync::Mutex, time::Duration};

use async_trait::async_trait;
use reqwest::StatusCode;
use shared::{
    domain::SocCode,
    protocol::{ListingPage, OccupationDetail, OccupationSummary, RankingEntry, RankingPage},
};

use crate::{
    controller::state::Lane,
    error::{ClientError, Resource},
    ListingQuery,
};

const HELD_SEARCH: &str = "slow";
const MISSING_CODE: &str = "99-9999";

#[derive(Default)]
struct ScriptedApi {
    listing_calls: Mutex<Vec<ListingQuery>>,
    listing_tokens: Mutex<Vec<(String, CancelToken)>>,
    detail_calls: Mutex<Vec<SocCode>>,
    ranking_calls: Mutex<Vec<(Option<u32>, Option<String>)>>,
    ranking_fails: bool,
}

impl ScriptedApi {
    fn failing_rankings() -> Self {
        Self {
            ranking_fails: true,
            ..Self::default()
        }
    }

    fn listing_searches(&self) -> Vec<Option<String>> {
        self.listing_calls
            .lock()
            .expect("lock")
            .iter()
            .map(|query| query.search.clone())
            .collect()
    }

    fn listing_token(&self, search: &str) -> CancelToken {
        self.listing_tokens
            .lock()
            .expect("lock")
            .iter()
            .find(|(issued_for, _)| issued_for == search)
            .map(|(_, cancel)| cancel.clone())
            .expect("listing request issued")
    }
}

#[async_trait]
impl OccupationApi for ScriptedApi {
    async fn list_occupations(
        &self,
        query: &ListingQuery,
        cancel: &CancelToken,
    ) -> Result<ListingPage, ClientError> {
        self.listing_calls.lock().expect("lock").push(query.clone());
        let search = query.search.clone().unwrap_or_default();
        self.listing_tokens
            .lock()
            .expect("lock")
            .push((search.clone(), cancel.clone()));

        if search == HELD_SEARCH {
            cancel.cancelled().await;
            return Err(ClientError::Cancelled);
        }

        Ok(ListingPage {
            items: vec![OccupationSummary {
                onetsoc_code: None,
                soc_code: SocCode::from("29-1141"),
                title: format!("result for '{search}'"),
                ai_mean: Some(42.5),
                ai_std: None,
                employment: Some(3_000_000),
                median_wage: None,
                ref_year_month: None,
            }],
            page: query.page.unwrap_or(1),
            page_size: query.page_size.unwrap_or(20),
            total: 1,
        })
    }

    async fn occupation_detail(
        &self,
        soc_code: &SocCode,
        _data_version: Option<&str>,
        _cancel: &CancelToken,
    ) -> Result<OccupationDetail, ClientError> {
        self.detail_calls.lock().expect("lock").push(soc_code.clone());
        if soc_code.as_str() == MISSING_CODE {
            return Err(ClientError::Status {
                resource: Resource::Occupation,
                status: StatusCode::NOT_FOUND,
                detail: Some("occupation not found".to_string()),
            });
        }
        Ok(OccupationDetail {
            soc_code: soc_code.clone(),
            onetsoc_codes: Vec::new(),
            title: "Registered Nurses".to_string(),
            description: None,
            alternate_titles: Vec::new(),
            top_tasks: Vec::new(),
            ai_score: None,
        })
    }

    async fn rankings(
        &self,
        limit: Option<u32>,
        data_version: Option<&str>,
        _cancel: &CancelToken,
    ) -> Result<RankingPage, ClientError> {
        self.ranking_calls
            .lock()
            .expect("lock")
            .push((limit, data_version.map(str::to_string)));
        if self.ranking_fails {
            return Err(ClientError::Status {
                resource: Resource::Rankings,
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: None,
            });
        }
        Ok(RankingPage {
            items: vec![
                RankingEntry {
                    soc_code: SocCode::from("43-9061"),
                    title: "Office Clerks, General".to_string(),
                    ai_mean: Some(10.0),
                    ai_std: None,
                },
                RankingEntry {
                    soc_code: SocCode::from("43-4051"),
                    title: "Customer Service Representatives".to_string(),
                    ai_mean: None,
                    ai_std: None,
                },
                RankingEntry {
                    soc_code: SocCode::from("43-3031"),
                    title: "Bookkeeping Clerks".to_string(),
                    ai_mean: Some(20.0),
                    ai_std: None,
                },
            ],
            limit: limit.unwrap_or(50),
        })
    }
}

async fn mounted(api: Arc<ScriptedApi>) -> Controller<ScriptedApi> {
    let mut controller = Controller::new(api, ViewConfig::default());
    controller.dispatch(Action::Mount);
    controller.settle().await;
    controller
}

#[tokio::test]
async fn mount_loads_listing_ranking_and_snapshot() {
    let api = Arc::new(ScriptedApi::default());
    let controller = mounted(Arc::clone(&api)).await;
    let state = controller.state();

    assert_eq!(state.items().len(), 1);
    assert_eq!(state.ranking().len(), 3);
    let snapshot = state.risk_snapshot().expect("snapshot");
    assert_eq!(snapshot.average, 15.0);
    assert_eq!(snapshot.top.soc_code.as_str(), "43-9061");
    assert_eq!(
        api.ranking_calls.lock().expect("lock").as_slice(),
        &[(Some(12), Some("30.1".to_string()))]
    );
    assert!(!state.is_busy());
}

#[tokio::test]
async fn newer_listing_request_cancels_the_older_one_silently() {
    let api = Arc::new(ScriptedApi::default());
    let mut controller = mounted(Arc::clone(&api)).await;

    controller.dispatch(Action::SubmitSearch(HELD_SEARCH.to_string()));
    assert!(controller.state().is_loading(Lane::Listing));
    controller.dispatch(Action::SubmitSearch("clerk".to_string()));
    controller.settle().await;

    let state = controller.state();
    assert_eq!(state.items().len(), 1);
    assert_eq!(state.items()[0].title, "result for 'clerk'");
    assert!(state.error().is_none());
    assert!(!state.is_loading(Lane::Listing));

    assert!(
        api.listing_token(HELD_SEARCH).is_cancelled(),
        "held request must be cancelled"
    );
    assert!(!api.listing_token("clerk").is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn rapid_input_commits_once_after_quiet_period() {
    let api = Arc::new(ScriptedApi::default());
    let mut controller = mounted(Arc::clone(&api)).await;

    for text in ["n", "nu", "nur", "nurse"] {
        controller.dispatch(Action::SearchInput(text.to_string()));
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(controller.state().search(), "");
    controller.settle().await;

    assert_eq!(controller.state().search(), "nurse");
    assert_eq!(controller.state().page(), 1);
    assert_eq!(
        api.listing_searches(),
        vec![Some(String::new()), Some("nurse".to_string())]
    );
}

#[tokio::test]
async fn missing_detail_surfaces_error_and_keeps_selection() {
    let api = Arc::new(ScriptedApi::default());
    let mut controller = mounted(Arc::clone(&api)).await;

    controller.dispatch(Action::SelectOccupation(SocCode::from("29-1141")));
    controller.settle().await;
    controller.dispatch(Action::SelectOccupation(SocCode::from(MISSING_CODE)));
    controller.settle().await;

    let state = controller.state();
    assert_eq!(
        state.error().map(|error| error.message.as_str()),
        Some("failed to load occupation (404)")
    );
    assert_eq!(
        state.selected().map(|detail| detail.soc_code.as_str()),
        Some("29-1141")
    );
    assert!(!state.is_loading(Lane::Detail));
    assert_eq!(api.detail_calls.lock().expect("lock").len(), 2);
}

#[tokio::test]
async fn ranking_failure_is_not_visible() {
    let api = Arc::new(ScriptedApi::failing_rankings());
    let controller = mounted(api).await;

    assert!(controller.state().error().is_none());
    assert!(controller.state().ranking().is_empty());
    assert!(controller.state().risk_snapshot().is_none());
    assert!(!controller.state().is_loading(Lane::Ranking));
}

#[tokio::test]
async fn shutdown_cancels_in_flight_requests() {
    let api = Arc::new(ScriptedApi::default());
    let mut controller = mounted(Arc::clone(&api)).await;

    controller.dispatch(Action::SubmitSearch(HELD_SEARCH.to_string()));
    controller.shutdown();
    controller.settle().await;

    let completion = tokio::time::timeout(Duration::from_secs(1), controller.next_completion())
        .await
        .expect("cancelled request completes")
        .expect("channel open");
    controller.dispatch(completion);

    let state = controller.state();
    assert!(!state.is_mounted());
    assert!(state.error().is_none());
    assert_eq!(state.items()[0].title, "result for ''");
    assert!(api.listing_token(HELD_SEARCH).is_cancelled());
}

#[tokio::test]
async fn page_chosen_before_mount_is_fetched_in_one_request() {
    let api = Arc::new(ScriptedApi::default());
    let mut controller = Controller::new(Arc::clone(&api), ViewConfig::default());
    controller.dispatch(Action::SubmitSearch("nurse".to_string()));
    controller.dispatch(Action::SetPage(3));
    controller.dispatch(Action::Mount);
    controller.settle().await;

    let calls = api.listing_calls.lock().expect("lock").clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].page, Some(3));
    assert_eq!(calls[0].search.as_deref(), Some("nurse"));
    assert_eq!(controller.state().page(), 3);
}
