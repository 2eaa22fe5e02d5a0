use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::auth::Identity;
use crate::config::app::{AppConfig, MAX_QUERY_DAYS};
use crate::entry::{DailyEntry, EntryRecord, RawEntry};
use crate::error::ApiError;
use crate::metrics;
use crate::normalize::normalize_entry;
use crate::profile::{Capability, UserProfile};
use crate::scoring::{breakdown, ScoreBreakdown, ScoreBundle};
use crate::stats::{self, DashboardStats, HistoryRow, MentorFilter, MentorOverview};
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/score", post(score_preview))
        .route("/me", get(me))
        .route("/entries", get(list_entries))
        .route("/entries/{date}", get(get_entry).put(put_entry))
        .route("/dashboard", get(dashboard))
        .route("/mentor/overview", get(mentor_overview))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Calendar day used for "today" and for rejecting future entries (UTC).
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}

/// Fetch the caller's profile, creating the default one on first sight.
async fn ensure_profile(state: &AppState, id: &Identity) -> Result<UserProfile, ApiError> {
    if let Some(p) = state.store.get_profile(&id.user_id).await? {
        return Ok(p);
    }
    let p = UserProfile::bootstrap(id);
    state.store.put_profile(p.clone()).await?;
    info!(user = %id.user_id, "profile created");
    Ok(p)
}

#[derive(Serialize)]
struct ScorePreview {
    entry: DailyEntry,
    breakdown: ScoreBreakdown,
    scores: ScoreBundle,
}

async fn score_preview(Json(raw): Json<RawEntry>) -> Json<ScorePreview> {
    let entry = normalize_entry(&raw);
    let parts = breakdown(&entry);
    metrics::record_score_preview();
    Json(ScorePreview {
        scores: parts.bundle(),
        breakdown: parts,
        entry,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MeOut {
    #[serde(flatten)]
    profile: UserProfile,
    role_label: &'static str,
    can_view_mentor: bool,
}

async fn me(State(state): State<AppState>, id: Identity) -> Result<Json<MeOut>, ApiError> {
    let profile = ensure_profile(&state, &id).await?;
    Ok(Json(MeOut {
        role_label: profile.role.label(),
        can_view_mentor: profile.can(Capability::ViewMentorDashboard),
        profile,
    }))
}

async fn put_entry(
    State(state): State<AppState>,
    id: Identity,
    Path(date): Path<String>,
    Json(raw): Json<RawEntry>,
) -> Result<Json<EntryRecord>, ApiError> {
    let date = parse_date(&date)?;
    if date > today() {
        return Err(ApiError::BadRequest(format!(
            "cannot log {date}: entries for future dates are not accepted"
        )));
    }
    let profile = ensure_profile(&state, &id).await?;
    if !profile.can(Capability::LogEntries) {
        return Err(ApiError::Forbidden("this account cannot log entries"));
    }

    let record = EntryRecord::from_submission(&id.user_id, date, raw, Utc::now());
    state.store.upsert_entry(record.clone()).await?;

    metrics::record_entry_saved(record.scores.total);
    info!(
        user = %id.user_id,
        %date,
        total = record.scores.total,
        body = record.scores.body,
        soul = record.scores.soul,
        sadhana = record.scores.sadhana,
        "entry saved"
    );
    Ok(Json(record))
}

async fn get_entry(
    State(state): State<AppState>,
    id: Identity,
    Path(date): Path<String>,
) -> Result<Json<EntryRecord>, ApiError> {
    let date = parse_date(&date)?;
    state
        .store
        .get_entry(&id.user_id, date)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no entry for {date}")))
}

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

async fn list_entries(
    State(state): State<AppState>,
    id: Identity,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryRow>>, ApiError> {
    let limit = q
        .limit
        .unwrap_or(state.config.history_limit)
        .clamp(1, MAX_QUERY_DAYS);
    let records = state.store.recent_entries(&id.user_id, limit).await?;
    Ok(Json(stats::history_rows(&records)))
}

async fn dashboard(
    State(state): State<AppState>,
    id: Identity,
) -> Result<Json<DashboardStats>, ApiError> {
    // The trend window is a prefix of history, so one query covers both.
    let limit = state.config.history_limit.max(state.config.trend_days);
    let records = state.store.recent_entries(&id.user_id, limit).await?;
    Ok(Json(stats::dashboard(
        &records,
        today(),
        state.config.trend_days,
    )))
}

#[derive(Deserialize)]
struct MentorQuery {
    days: Option<u32>,
    #[serde(default)]
    filter: MentorFilter,
}

async fn mentor_overview(
    State(state): State<AppState>,
    id: Identity,
    Query(q): Query<MentorQuery>,
) -> Result<Json<MentorOverview>, ApiError> {
    let profile = ensure_profile(&state, &id).await?;
    if !profile.can(Capability::ViewMentorDashboard) {
        return Err(ApiError::Forbidden("mentor view requires the mentor role"));
    }

    let window_days = q
        .days
        .unwrap_or(state.config.mentor_window_days)
        .clamp(1, MAX_QUERY_DAYS as u32);
    let to = today();
    let from = to
        .checked_sub_days(Days::new(u64::from(window_days - 1)))
        .unwrap_or(NaiveDate::MIN);
    let target = state.config.high_target;

    let mut mentees = Vec::new();
    for p in state.store.list_profiles().await? {
        let records = state.store.entries_between(&p.user_id, from, to).await?;
        let summary = stats::summarize_mentee(&p, &records, window_days, target);
        if q.filter.matches(&summary) {
            mentees.push(summary);
        }
    }

    info!(
        mentor = %id.user_id,
        window_days,
        shown = mentees.len(),
        "mentor overview served"
    );
    Ok(Json(MentorOverview {
        from,
        to,
        window_days,
        target,
        filter: q.filter,
        mentees,
    }))
}
