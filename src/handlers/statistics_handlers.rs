use std::sync::Arc;

use axum::{extract::Query, Extension, Json};
use chrono::Utc;

use crate::{
    authentication::AuthUser,
    data_formats::{DataWrapper, StatisticsQueryParams},
    db_helpers::{
        count_daily_in_db, count_pending_in_db, count_totals_in_db, top_notes_in_db, DailySeries,
    },
    errors::RequestError,
    statistics::{fill_daily_series, StatisticsResponse, StatisticsWindow},
    AppState,
};

pub async fn get_statistics(
    Extension(state): Extension<Arc<AppState>>,
    auth: AuthUser,
    Query(params): Query<StatisticsQueryParams>,
) -> Result<Json<DataWrapper<StatisticsResponse>>, RequestError> {
    auth.require_reviewer()?;
    let window = StatisticsWindow::resolve(params, Utc::now())?;

    let totals = count_totals_in_db(&state.pool).await?;
    let pending = count_pending_in_db(&state.pool).await?;
    let new_users = count_daily_in_db(&state.pool, DailySeries::NewUsers, &window).await?;
    let new_notes = count_daily_in_db(&state.pool, DailySeries::NewNotes, &window).await?;
    let top_notes = top_notes_in_db(&state.pool, &window).await?;

    Ok(Json(DataWrapper::wrap(StatisticsResponse {
        start_time: window.start.to_rfc3339(),
        end_time: window.end.to_rfc3339(),
        totals,
        pending,
        daily_stats: fill_daily_series(&window, &new_users, &new_notes),
        top_notes: top_notes.into_iter().map(Into::into).collect(),
    })))
}
