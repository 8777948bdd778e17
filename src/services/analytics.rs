//! Dashboard analytics service

use crate::{
    error::AppResult,
    models::{
        analytics::{AnalyticsQuery, AnalyticsResponse, AssetStats},
        enums::{AssetStatus, UserStatus},
    },
    repository::Repository,
};

const DEFAULT_MONTHS: i32 = 12;
const MAX_MONTHS: i32 = 36;
const DEFAULT_TOP: i64 = 5;
const MAX_TOP: i64 = 50;

#[derive(Clone)]
pub struct AnalyticsService {
    repository: Repository,
}

impl AnalyticsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get(&self, query: &AnalyticsQuery) -> AppResult<AnalyticsResponse> {
        let months = query.months.unwrap_or(DEFAULT_MONTHS).clamp(1, MAX_MONTHS);
        let top = query.top.unwrap_or(DEFAULT_TOP).clamp(1, MAX_TOP);

        let deployments = self.repository.analytics.deployment_stats().await?;
        let trucks = asset_stats(&self.repository.trucks.count_by_status().await?);
        let drivers = asset_stats(&self.repository.drivers.count_by_status().await?);
        let pending_users = self
            .repository
            .users
            .count_with_status(UserStatus::Pending)
            .await?;
        let monthly = self.repository.analytics.monthly(months).await?;
        let top_drivers = self.repository.drivers.top_by_trips(top).await?;

        Ok(AnalyticsResponse {
            deployments,
            trucks,
            drivers,
            pending_users,
            monthly,
            top_drivers,
        })
    }
}

fn asset_stats(counts: &[(AssetStatus, i64)]) -> AssetStats {
    let mut stats = AssetStats::default();
    for (status, count) in counts {
        stats.total += count;
        match status {
            AssetStatus::Available => stats.available += count,
            AssetStatus::Deployed => stats.deployed += count,
            AssetStatus::Unavailable => stats.unavailable += count,
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_counts_fold_into_totals() {
        let stats = asset_stats(&[
            (AssetStatus::Available, 4),
            (AssetStatus::Deployed, 2),
            (AssetStatus::Unavailable, 1),
        ]);
        assert_eq!(stats.total, 7);
        assert_eq!(stats.available, 4);
        assert_eq!(stats.deployed, 2);
        assert_eq!(stats.unavailable, 1);
    }

    #[test]
    fn missing_statuses_count_as_zero() {
        let stats = asset_stats(&[(AssetStatus::Deployed, 3)]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.available, 0);
    }
}
