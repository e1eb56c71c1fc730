//! Velocity metrics and drift detection (spec.md §4.11).

use crate::types::{VelocityMetrics, VelocityTrend};
use chrono::{Duration, Utc};
use ijoka_core::CoreError;
use ijoka_graph::GraphGateway;
use uuid::Uuid;

pub async fn compute_velocity(
    gw: &GraphGateway,
    project_id: Uuid,
    window_days: i64,
) -> Result<VelocityMetrics, CoreError> {
    let now = Utc::now();
    let period_start = now - Duration::days(window_days.max(0));
    let prior_start = period_start - Duration::days(window_days.max(0));

    let features = ijoka_graph::nodes::features::list_for_project(gw, project_id, None).await?;

    let mut features_started = 0u64;
    let mut features_completed = 0u64;
    let mut prior_completed = 0u64;
    let mut cycle_hours = Vec::new();

    for f in &features {
        if f.created_at >= period_start {
            features_started += 1;
        }
        if let Some(completed_at) = f.completed_at {
            if completed_at >= period_start {
                features_completed += 1;
                cycle_hours.push((completed_at - f.created_at).num_seconds() as f64 / 3600.0);
            } else if completed_at >= prior_start {
                prior_completed += 1;
            }
        }
    }

    let avg_cycle_time_hours = if cycle_hours.is_empty() {
        None
    } else {
        Some(cycle_hours.iter().sum::<f64>() / cycle_hours.len() as f64)
    };
    let features_per_day = if window_days > 0 {
        features_completed as f64 / window_days as f64
    } else {
        0.0
    };

    Ok(VelocityMetrics {
        period_start,
        period_end: now,
        features_started,
        features_completed,
        avg_cycle_time_hours,
        features_per_day,
        trend: trend_from_counts(features_completed, prior_completed),
    })
}

/// Derives a trend against the prior window of equal length (spec.md
/// §4.11), same +-30% threshold `detect_velocity_drift` warns on.
fn trend_from_counts(current_completed: u64, prior_completed: u64) -> VelocityTrend {
    if prior_completed == 0 {
        return if current_completed > 0 {
            VelocityTrend::Improving
        } else {
            VelocityTrend::Stable
        };
    }
    let change = (current_completed as f64 - prior_completed as f64) / prior_completed as f64;
    if change >= 0.3 {
        VelocityTrend::Improving
    } else if change <= -0.3 {
        VelocityTrend::Declining
    } else {
        VelocityTrend::Stable
    }
}

/// Compares the current 7-day window against the prior 14-day window
/// (normalised to a 7-day equivalent); >=30% change is reported, as is a
/// week with starts but zero completions.
pub async fn detect_velocity_drift(
    gw: &GraphGateway,
    project_id: Uuid,
) -> Result<Vec<String>, CoreError> {
    let current = compute_velocity(gw, project_id, 7).await?;
    let previous = compute_velocity(gw, project_id, 14).await?;

    let mut warnings = Vec::new();
    if previous.features_completed > 0 {
        let prev_normalized = previous.features_completed as f64 / 2.0;
        if prev_normalized > 0.0 {
            let change = (current.features_completed as f64 - prev_normalized) / prev_normalized;
            if change < -0.3 {
                warnings.push(format!(
                    "Velocity decreased by {:.0}% compared to the previous period",
                    change.abs() * 100.0
                ));
            } else if change > 0.3 {
                warnings.push(format!(
                    "Velocity improved by {:.0}% compared to the previous period",
                    change * 100.0
                ));
            }
        }
    }

    if current.features_started > 0 && current.features_completed == 0 {
        warnings.push("Features started but none completed in the past week".to_string());
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ijoka_types::{Feature, FeatureCategory, WorkItemType};

    #[tokio::test]
    async fn velocity_counts_completions_in_window() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let project = ijoka_graph::nodes::projects::ensure(&gw, "/p", "p").await.unwrap();
        let mut f = Feature::new_work_item("x", FeatureCategory::Functional, WorkItemType::Feature, 0);
        f.status = ijoka_types::FeatureStatus::Complete;
        f.completed_at = Some(Utc::now());
        ijoka_graph::nodes::features::create(&gw, f, project.id).await.unwrap();

        let v = compute_velocity(&gw, project.id, 7).await.unwrap();
        assert_eq!(v.features_completed, 1);
        assert_eq!(v.features_started, 1);
    }

    #[tokio::test]
    async fn trend_improves_when_current_window_outpaces_prior() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let project = ijoka_graph::nodes::projects::ensure(&gw, "/p", "p").await.unwrap();

        let mut older = Feature::new_work_item("old", FeatureCategory::Functional, WorkItemType::Feature, 0);
        older.status = ijoka_types::FeatureStatus::Complete;
        older.completed_at = Some(Utc::now() - Duration::days(10));
        ijoka_graph::nodes::features::create(&gw, older, project.id).await.unwrap();

        for _ in 0..3 {
            let mut f = Feature::new_work_item("new", FeatureCategory::Functional, WorkItemType::Feature, 0);
            f.status = ijoka_types::FeatureStatus::Complete;
            f.completed_at = Some(Utc::now());
            ijoka_graph::nodes::features::create(&gw, f, project.id).await.unwrap();
        }

        let v = compute_velocity(&gw, project.id, 7).await.unwrap();
        assert_eq!(v.trend, VelocityTrend::Improving);
    }

    #[tokio::test]
    async fn drift_flags_stalled_week() {
        let gw = GraphGateway::open_in_memory().await.unwrap();
        let project = ijoka_graph::nodes::projects::ensure(&gw, "/p", "p").await.unwrap();
        ijoka_graph::nodes::features::create(
            &gw,
            Feature::new_work_item("x", FeatureCategory::Functional, WorkItemType::Feature, 0),
            project.id,
        )
        .await
        .unwrap();

        let warnings = detect_velocity_drift(&gw, project.id).await.unwrap();
        assert!(warnings.iter().any(|w| w.contains("none completed")));
    }
}
