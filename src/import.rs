//! One import "tick": each invocation advances exactly one category for a
//! city, persisting progress so the caller can re-invoke until nothing
//! remains. The session row is the saved continuation state.

use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::batch::{self, BatchSettings};
use crate::categories;
use crate::config::AppConfig;
use crate::cost::{self, CostEstimate};
use crate::dedup;
use crate::errors::AppResult;
use crate::places::PlacesApi;
use crate::retry::retry_with_backoff;
use crate::sessions::{ImportSession, SessionStatus, SessionStore};

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ImportTickResponse {
    Progress {
        message: String,
        session: ProgressSnapshot,
    },
    Completed {
        message: String,
        session: CompletionSnapshot,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub id: i64,
    pub city: String,
    pub current_type: String,
    pub processed: usize,
    pub total_processed: i64,
    pub progress: ProgressCounts,
    pub cost_estimate: CostEstimate,
    pub remaining_types: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressCounts {
    pub types_completed: usize,
    pub total_types: usize,
    pub percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct CompletionSnapshot {
    pub id: i64,
    pub city: String,
    pub status: SessionStatus,
    pub processed_count: i64,
}

pub async fn run_import_tick(
    api: &dyn PlacesApi,
    store: &SessionStore,
    config: &AppConfig,
    city: &str,
    resume: bool,
) -> AppResult<ImportTickResponse> {
    let session = store.get_or_create(city, resume)?;
    let remaining = categories::remaining(&session.completed_types);

    if remaining.is_empty() {
        let completed = store.mark_completed(session.id)?;
        info!(city, session_id = completed.id, "import already complete");
        return Ok(completion_response(completed));
    }

    let category = remaining[0];
    let max_attempts = config.max_attempts;
    let base_backoff = Duration::from_millis(config.base_backoff_ms);

    let center = retry_with_backoff(|| api.geocode(city), max_attempts, base_backoff).await?;
    let page = api
        .text_search(category, city, center, config.search_radius_m)
        .await?;
    let found = page.candidates.len();

    let known_ids = store.known_place_ids()?;
    let filtered = dedup::filter_candidates(
        page.candidates,
        &known_ids,
        config.max_candidates_per_run,
    );
    let details_calls = filtered.len();

    let records = batch::process_candidates(
        api,
        &filtered,
        city,
        BatchSettings {
            batch_size: config.batch_size,
            stagger: Duration::from_millis(config.detail_stagger_ms),
            max_attempts,
            base_backoff,
        },
    )
    .await;

    let inserted =
        store.complete_category(session.id, category, &records, page.next_page_token.as_deref())?;
    let updated = store.get(session.id)?;

    info!(
        city,
        category,
        found,
        filtered = details_calls,
        inserted,
        "import tick finished"
    );

    Ok(progress_response(
        updated,
        category,
        inserted,
        cost::estimate(1, details_calls),
    ))
}

fn completion_response(session: ImportSession) -> ImportTickResponse {
    ImportTickResponse::Completed {
        message: format!("Import already complete for {}", session.city),
        session: CompletionSnapshot {
            id: session.id,
            city: session.city,
            status: SessionStatus::Completed,
            processed_count: session.processed_count,
        },
    }
}

fn progress_response(
    session: ImportSession,
    category: &str,
    inserted: usize,
    cost_estimate: CostEstimate,
) -> ImportTickResponse {
    let total_types = categories::total_count();
    let types_completed = session.completed_types.len();
    let remaining_types: Vec<String> = categories::remaining(&session.completed_types)
        .into_iter()
        .map(|c| c.to_string())
        .collect();
    let percentage = (types_completed as f64 / total_types as f64 * 100.0).round();

    ImportTickResponse::Progress {
        message: format!(
            "Processed category '{category}' for {}",
            session.city
        ),
        session: ProgressSnapshot {
            id: session.id,
            city: session.city,
            current_type: category.to_string(),
            processed: inserted,
            total_processed: session.processed_count,
            progress: ProgressCounts {
                types_completed,
                total_types,
                percentage,
            },
            cost_estimate,
            remaining_types,
        },
    }
}
