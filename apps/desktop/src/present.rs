//! Plain-text rendering of the view state.

use std::fmt::Write as _;

use client_core::controller::{Lane, RiskSnapshot, ViewState};
use shared::protocol::{OccupationDetail, RankingEntry};

const DETAIL_TASK_LIMIT: usize = 8;
const DETAIL_ALTERNATE_TITLE_LIMIT: usize = 6;

pub fn format_score(value: Option<f64>) -> String {
    match value {
        Some(value) if value.is_finite() => format!("{value:.2}"),
        _ => "--".to_string(),
    }
}

pub fn format_count(value: Option<i64>) -> String {
    let Some(value) = value else {
        return "--".to_string();
    };
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

pub fn render_listing(state: &ViewState) -> String {
    let mut out = String::new();
    let status = if state.is_loading(Lane::Listing) {
        "loading".to_string()
    } else {
        format!("page {} / {}", state.page(), state.page_count())
    };
    let _ = writeln!(
        out,
        "{} occupations | {status} | sort={} | data_version={}",
        format_count(i64::try_from(state.total()).ok()),
        state.sort(),
        state.data_version(),
    );
    if !state.search().is_empty() {
        let _ = writeln!(out, "search: {}", state.search());
    }
    if let Some(error) = state.error() {
        let _ = writeln!(out, "! {}", error.message);
    }
    for item in state.items() {
        let _ = writeln!(
            out,
            "  {:<10} {:<48} AI {:>6}  employment {:>12}",
            item.soc_code,
            item.title,
            format_score(item.ai_mean),
            format_count(item.employment),
        );
    }
    out
}

pub fn render_detail(detail: &OccupationDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  {}", detail.soc_code, detail.title);
    if let Some(description) = &detail.description {
        let _ = writeln!(out, "  {description}");
    }
    let score = detail.ai_score.clone().unwrap_or_default();
    let _ = write!(
        out,
        "  AI mean {}  std {}",
        format_score(score.mean),
        format_score(score.std)
    );
    match score.updated_at_utc() {
        Some(updated_at) => {
            let _ = writeln!(out, "  (updated {})", updated_at.format("%Y-%m-%d"));
        }
        None => out.push('\n'),
    }
    if !detail.alternate_titles.is_empty() {
        let titles: Vec<&str> = detail
            .alternate_titles
            .iter()
            .take(DETAIL_ALTERNATE_TITLE_LIMIT)
            .map(String::as_str)
            .collect();
        let _ = writeln!(out, "  also known as: {}", titles.join(", "));
    }
    if !detail.top_tasks.is_empty() {
        let _ = writeln!(out, "  top tasks:");
    }
    for task in detail.top_tasks.iter().take(DETAIL_TASK_LIMIT) {
        let _ = writeln!(
            out,
            "    #{:<6} weight {:.3}  {}",
            task.task_id, task.weight, task.task_statement
        );
    }
    out
}

pub fn render_ranking(ranking: &[RankingEntry], snapshot: Option<&RiskSnapshot>) -> String {
    let mut out = String::new();
    if let Some(snapshot) = snapshot {
        let _ = writeln!(
            out,
            "average risk (top {}): {}  highest: {}",
            ranking.len(),
            format_score(Some(snapshot.average)),
            snapshot.top.title
        );
    }
    for (rank, entry) in ranking.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>3}. {:<48} AI {:>6}",
            rank + 1,
            entry.title,
            format_score(entry.ai_mean)
        );
    }
    out
}

pub fn render_view(state: &ViewState) -> String {
    let mut out = render_listing(state);
    if let Some(detail) = state.selected() {
        out.push('\n');
        out.push_str(&render_detail(detail));
    } else if state.is_loading(Lane::Detail) {
        out.push_str("\nloading detail...\n");
    }
    if !state.ranking().is_empty() {
        out.push('\n');
        out.push_str(&render_ranking(state.ranking(), state.risk_snapshot()));
    }
    out
}
