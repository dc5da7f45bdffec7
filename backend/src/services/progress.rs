//! Smart growth progress
//!
//! Estimates how far along a plant is from its age, its latest measured
//! height and its health status. The stored `growth` column is reported
//! separately and never blended in.

use crate::config::MAX_GROWTH_PERCENT;
use crate::database::PlantStatus;
use chrono::NaiveDate;

/// Age at which a plant is considered fully grown
const FULL_GROWTH_DAYS: f64 = 120.0;

/// Height at which a plant is considered fully grown
const FULL_GROWTH_HEIGHT_CM: f64 = 50.0;

/// Whole days between the planting date and `today`, in either direction
pub fn age_in_days(planting_date: NaiveDate, today: NaiveDate) -> i64 {
    (today - planting_date).num_days().abs()
}

fn status_multiplier(status: PlantStatus) -> f64 {
    match status {
        PlantStatus::Healthy => 1.1,
        PlantStatus::NeedsWater => 0.8,
        PlantStatus::Attention => 0.6,
    }
}

/// Progress percentage (0-100). A plant without planting date starts from
/// zero and relies on its height alone.
pub fn smart_progress(
    planting_date: Option<NaiveDate>,
    latest_height: Option<f64>,
    status: PlantStatus,
    today: NaiveDate,
) -> i64 {
    let max = MAX_GROWTH_PERCENT as f64;

    let mut base = planting_date
        .map(|date| (age_in_days(date, today) as f64 / FULL_GROWTH_DAYS * 100.0).min(max))
        .unwrap_or(0.0);

    if let Some(height) = latest_height.filter(|h| *h > 0.0) {
        base = base.max((height / FULL_GROWTH_HEIGHT_CM * 100.0).min(max));
    }

    ((base * status_multiplier(status)).round() as i64).clamp(0, MAX_GROWTH_PERCENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_in_days() {
        let today = date(2024, 6, 10);
        assert_eq!(age_in_days(date(2024, 5, 31), today), 10);
        assert_eq!(age_in_days(today, today), 0);
        // Future planting dates count as distance
        assert_eq!(age_in_days(date(2024, 6, 15), today), 5);
    }

    #[test]
    fn test_progress_from_age() {
        let today = date(2024, 6, 10);
        let planted = today - chrono::Duration::days(60);

        // 50% * 1.1 = 55
        assert_eq!(smart_progress(Some(planted), None, PlantStatus::Healthy, today), 55);
        // 50% * 0.8 = 40
        assert_eq!(smart_progress(Some(planted), None, PlantStatus::NeedsWater, today), 40);
        // 50% * 0.6 = 30
        assert_eq!(smart_progress(Some(planted), None, PlantStatus::Attention, today), 30);
    }

    #[test]
    fn test_height_wins_when_larger() {
        let today = date(2024, 6, 10);
        let planted = today - chrono::Duration::days(12);

        // age gives 10%, height 40cm gives 80%
        assert_eq!(
            smart_progress(Some(planted), Some(40.0), PlantStatus::NeedsWater, today),
            64
        );
        // height smaller than age contribution is ignored
        assert_eq!(
            smart_progress(Some(planted), Some(1.0), PlantStatus::Attention, today),
            6
        );
    }

    #[test]
    fn test_capped_at_hundred() {
        let today = date(2024, 6, 10);
        let planted = date(2023, 1, 1);

        assert_eq!(smart_progress(Some(planted), Some(80.0), PlantStatus::Healthy, today), 100);
    }

    #[test]
    fn test_no_planting_date() {
        let today = date(2024, 6, 10);

        assert_eq!(smart_progress(None, None, PlantStatus::Healthy, today), 0);
        assert_eq!(smart_progress(None, Some(25.0), PlantStatus::Healthy, today), 55);
    }
}
