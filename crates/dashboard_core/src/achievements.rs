//! crates/dashboard_core/src/achievements.rs
//!
//! Achievement progress: merging the badge catalog with a user's unlock state,
//! advancing progress from activity metrics, and the summary counts shown on
//! the achievements page.

use crate::domain::{
    Achievement, AchievementCategory, AchievementTier, StudySession, TestResult, User,
    UserAchievement,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A catalog achievement merged with one user's progress on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AchievementProgress {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub category: AchievementCategory,
    #[serde(rename = "type")]
    pub tier: AchievementTier,
    pub is_unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub progress: u32,
    pub max_progress: u32,
    pub requirement: String,
}

/// Merges the catalog with the user's rows, keeping catalog order.
/// Achievements without a row are locked with zero progress.
pub fn merge_progress(catalog: &[Achievement], rows: &[UserAchievement]) -> Vec<AchievementProgress> {
    let by_achievement: HashMap<Uuid, &UserAchievement> =
        rows.iter().map(|r| (r.achievement_id, r)).collect();

    catalog
        .iter()
        .map(|a| {
            let row = by_achievement.get(&a.id);
            AchievementProgress {
                id: a.id,
                title: a.title.clone(),
                description: a.description.clone(),
                icon: a.icon.clone(),
                category: a.category,
                tier: a.tier,
                is_unlocked: row.is_some_and(|r| r.is_unlocked),
                unlocked_at: row.and_then(|r| r.unlocked_at),
                progress: row.map_or(0, |r| r.progress.min(a.max_progress)),
                max_progress: a.max_progress,
                requirement: a.requirement.clone(),
            }
        })
        .collect()
}

/// Keeps the achievements of `category`; absent, empty or `all` keeps everything.
pub fn filter_by_category(achievements: Vec<AchievementProgress>, category: Option<&str>) -> Vec<AchievementProgress> {
    match category.filter(|c| !c.is_empty() && *c != "all") {
        Some(category) => achievements
            .into_iter()
            .filter(|a| a.category.as_str() == category)
            .collect(),
        None => achievements,
    }
}

//=========================================================================================
// Progress From Activity
//=========================================================================================

/// The activity figures achievements are measured against.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActivityMetrics {
    pub current_streak: u32,
    pub study_hours: f64,
    pub high_score_tests: u32,
}

impl ActivityMetrics {
    pub fn collect(user: &User, sessions: &[StudySession], tests: &[TestResult]) -> Self {
        Self {
            current_streak: user.current_streak,
            study_hours: sessions.iter().map(|s| s.duration).sum(),
            high_score_tests: tests.iter().filter(|t| t.is_high_score()).count() as u32,
        }
    }

    /// The figure that drives achievements of `category`, if any does.
    pub fn measure(&self, category: AchievementCategory) -> Option<u32> {
        match category {
            AchievementCategory::Streak => Some(self.current_streak),
            AchievementCategory::Milestone => Some(self.study_hours.max(0.0).floor() as u32),
            AchievementCategory::Performance => Some(self.high_score_tests),
            AchievementCategory::Challenge => None,
        }
    }
}

/// Computes the updated row for one achievement, or `None` when nothing changed.
///
/// Progress never decreases and is capped at `max_progress`; reaching the cap
/// unlocks the achievement, and an unlocked achievement stays unlocked.
pub fn advance(
    achievement: &Achievement,
    current: Option<&UserAchievement>,
    metrics: &ActivityMetrics,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Option<UserAchievement> {
    let measured = metrics.measure(achievement.category)?;
    let previous = current.map_or(0, |r| r.progress);
    let progress = previous.max(measured).min(achievement.max_progress);
    let was_unlocked = current.is_some_and(|r| r.is_unlocked);
    let unlocked = was_unlocked || progress >= achievement.max_progress;

    if current.is_some() && progress == previous && unlocked == was_unlocked {
        return None;
    }
    if current.is_none() && progress == 0 {
        return None;
    }

    Some(UserAchievement {
        id: current.map_or_else(Uuid::new_v4, |r| r.id),
        user_id,
        achievement_id: achievement.id,
        is_unlocked: unlocked,
        unlocked_at: match current.and_then(|r| r.unlocked_at) {
            Some(at) => Some(at),
            None if unlocked => Some(now),
            None => None,
        },
        progress,
    })
}

/// Runs `advance` over the whole catalog and returns the rows to persist.
pub fn refresh_all(
    catalog: &[Achievement],
    rows: &[UserAchievement],
    metrics: &ActivityMetrics,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Vec<UserAchievement> {
    let by_achievement: HashMap<Uuid, &UserAchievement> =
        rows.iter().map(|r| (r.achievement_id, r)).collect();
    catalog
        .iter()
        .filter_map(|a| advance(a, by_achievement.get(&a.id).copied(), metrics, user_id, now))
        .collect()
}

//=========================================================================================
// Summary Counts
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CategoryCounts {
    pub streak: usize,
    pub milestone: usize,
    pub performance: usize,
    pub challenge: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TierCounts {
    pub bronze: usize,
    pub silver: usize,
    pub gold: usize,
    pub platinum: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AchievementStats {
    pub total: usize,
    pub unlocked: usize,
    pub by_category: CategoryCounts,
    pub by_type: TierCounts,
}

impl AchievementStats {
    pub fn compute(achievements: &[AchievementProgress]) -> Self {
        let mut stats = Self {
            total: achievements.len(),
            ..Default::default()
        };
        for a in achievements {
            if a.is_unlocked {
                stats.unlocked += 1;
            }
            match a.category {
                AchievementCategory::Streak => stats.by_category.streak += 1,
                AchievementCategory::Milestone => stats.by_category.milestone += 1,
                AchievementCategory::Performance => stats.by_category.performance += 1,
                AchievementCategory::Challenge => stats.by_category.challenge += 1,
            }
            match a.tier {
                AchievementTier::Bronze => stats.by_type.bronze += 1,
                AchievementTier::Silver => stats.by_type.silver += 1,
                AchievementTier::Gold => stats.by_type.gold += 1,
                AchievementTier::Platinum => stats.by_type.platinum += 1,
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AchievementListing {
    pub achievements: Vec<AchievementProgress>,
    pub stats: AchievementStats,
}

impl AchievementListing {
    /// Stats cover the unfiltered list.
    pub fn build(all: Vec<AchievementProgress>, category: Option<&str>) -> Self {
        let stats = AchievementStats::compute(&all);
        Self {
            achievements: filter_by_category(all, category),
            stats,
        }
    }
}
