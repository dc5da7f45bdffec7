//! Weather panel command

use super::CurrentUser;
use crate::app::AppState;
use crate::error::Result;
use crate::weather::WeatherReport;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Weather for an explicit location, or for the address on the user's
/// profile when none is given
pub async fn get_weather(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherReport>> {
    let report = if query.city.is_none() && query.country.is_none() {
        let profile = state.profile.get_profile(user.id()).await?;
        state.weather.report_for_profile(profile.as_ref()).await?
    } else {
        state
            .weather
            .report(query.city.as_deref(), query.country.as_deref())
            .await?
    };

    Ok(Json(report))
}
