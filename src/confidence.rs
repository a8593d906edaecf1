use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, Utc};

use crate::models::{FactorBreakdown, MicroGoal, PerformanceRecord};

pub const HISTORY_DAYS: i64 = 30;
pub const RECENT_DAYS: i64 = 7;

pub const WEIGHT_CONSISTENCY: f64 = 0.25;
pub const WEIGHT_IMPROVEMENT_STREAK: f64 = 0.25;
pub const WEIGHT_MISTAKE_REDUCTION: f64 = 0.20;
pub const WEIGHT_GOAL_COMPLETION: f64 = 0.15;
pub const WEIGHT_PERFORMANCE_TREND: f64 = 0.15;

const NEUTRAL_SCORE: f64 = 50.0;

pub fn cutoff(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days.max(1))
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Distinct study days over the trailing 30-day window, amplified so that
/// roughly one session every third day already scores full marks.
pub fn consistency_score(records: &[PerformanceRecord]) -> f64 {
    let study_dates: HashSet<_> = records
        .iter()
        .map(|record| record.recorded_at.date_naive())
        .collect();

    // (days / 30) * 100 * 3 reduces to days * 10; the reduced form is exact
    // in f64, so ten distinct days saturates at precisely 100.
    clamp_score(study_dates.len() as f64 * (300.0 / HISTORY_DAYS as f64))
}

/// Share of consecutive session pairs where the score strictly improved.
pub fn improvement_streak_score(records: &[PerformanceRecord]) -> f64 {
    if records.len() < 2 {
        return NEUTRAL_SCORE;
    }

    let mut improvements = 0usize;
    let mut comparisons = 0usize;
    for pair in records.windows(2) {
        if pair[1].score > pair[0].score {
            improvements += 1;
        }
        comparisons += 1;
    }

    clamp_score((improvements as f64 / comparisons as f64) * 100.0)
}

/// Proxy for mistake reduction: percent score change between the first and
/// last session of the window, centered on 50. Stored mistake text is
/// intentionally not parsed.
pub fn mistake_reduction_score(records: &[PerformanceRecord]) -> f64 {
    if records.len() < 2 {
        return NEUTRAL_SCORE;
    }

    let first = records[0].score;
    let last = records[records.len() - 1].score;

    if first == 0.0 {
        return if last > 0.0 { 100.0 } else { NEUTRAL_SCORE };
    }

    let improvement = ((last - first) / first) * 100.0;
    clamp_score(NEUTRAL_SCORE + improvement * 0.5)
}

/// Completion rate over goals created in the window; neutral when the student
/// has no goals yet.
pub fn goal_completion_score(goals: &[MicroGoal]) -> f64 {
    if goals.is_empty() {
        return NEUTRAL_SCORE;
    }

    let completed = goals.iter().filter(|goal| goal.completed).count();
    clamp_score((completed as f64 / goals.len() as f64) * 100.0)
}

/// Least-squares slope of score against calendar day, mapped onto the score
/// scale as 50 + slope * 10. Degenerate inputs (fewer than two points, or all
/// sessions on the same day) stay neutral.
pub fn performance_trend_score(records: &[PerformanceRecord]) -> f64 {
    if records.len() < 2 {
        return NEUTRAL_SCORE;
    }

    let points: Vec<(f64, f64)> = records
        .iter()
        .map(|record| {
            let day = record.recorded_at.date_naive().num_days_from_ce() as f64;
            (day, record.score)
        })
        .collect();

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (x, y) in &points {
        numerator += (x - mean_x) * (y - mean_y);
        denominator += (x - mean_x) * (x - mean_x);
    }

    if denominator == 0.0 {
        return NEUTRAL_SCORE;
    }

    let slope = numerator / denominator;
    clamp_score(NEUTRAL_SCORE + slope * 10.0)
}

/// Weighted confidence score over the trailing 30 days, rounded to two
/// decimals. A student with no sessions in the window sits at exactly 50.0.
pub fn confidence_score(records: &[PerformanceRecord], goals: &[MicroGoal]) -> f64 {
    if records.is_empty() {
        return NEUTRAL_SCORE;
    }

    let weighted = consistency_score(records) * WEIGHT_CONSISTENCY
        + improvement_streak_score(records) * WEIGHT_IMPROVEMENT_STREAK
        + mistake_reduction_score(records) * WEIGHT_MISTAKE_REDUCTION
        + goal_completion_score(goals) * WEIGHT_GOAL_COMPLETION
        + performance_trend_score(records) * WEIGHT_PERFORMANCE_TREND;

    (clamp_score(weighted) * 100.0).round() / 100.0
}

pub fn factor_breakdown(records: &[PerformanceRecord], goals: &[MicroGoal]) -> FactorBreakdown {
    FactorBreakdown {
        consistency: consistency_score(records),
        improvement_streak: improvement_streak_score(records),
        mistake_reduction: mistake_reduction_score(records),
        goal_completion: goal_completion_score(goals),
        performance_trend: performance_trend_score(records),
        confidence: confidence_score(records, goals),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn session(days_ago: i64, score: f64) -> PerformanceRecord {
        PerformanceRecord {
            student_id: Uuid::new_v4(),
            topic_id: 1,
            recorded_at: Utc::now() - Duration::days(days_ago),
            score,
            time_spent: 25,
            mistakes: None,
            completed: true,
        }
    }

    fn goal(completed: bool) -> MicroGoal {
        MicroGoal {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            topic_id: 1,
            goal_text: "Review Algebra key points (15 mins)".to_string(),
            estimated_time: 15,
            priority: 3,
            created_at: Utc::now() - Duration::days(2),
            completed,
            completed_at: completed.then(Utc::now),
        }
    }

    #[test]
    fn empty_history_is_exactly_neutral() {
        assert_eq!(confidence_score(&[], &[]), 50.0);
    }

    #[test]
    fn consistency_grows_with_distinct_days_and_saturates() {
        let five_days: Vec<_> = (0..5).map(|d| session(d, 70.0)).collect();
        let ten_days: Vec<_> = (0..10).map(|d| session(d, 70.0)).collect();

        let five = consistency_score(&five_days);
        let ten = consistency_score(&ten_days);
        assert!((five - 50.0).abs() < 0.001);
        assert_eq!(ten, 100.0);
        assert!(five <= ten);
    }

    #[test]
    fn consistency_is_exact_per_distinct_day() {
        for days in 1..=10i64 {
            let records: Vec<_> = (0..days).map(|d| session(d, 70.0)).collect();
            assert_eq!(consistency_score(&records), (days * 10) as f64);
        }
    }

    #[test]
    fn repeat_sessions_on_one_day_count_once() {
        let records = vec![session(1, 60.0), session(1, 80.0), session(1, 70.0)];
        let single = consistency_score(&records[..1]);
        assert_eq!(consistency_score(&records), single);
    }

    #[test]
    fn improvement_streak_counts_strict_increases() {
        let records = vec![
            session(4, 50.0),
            session(3, 60.0),
            session(2, 55.0),
            session(1, 70.0),
        ];
        let score = improvement_streak_score(&records);
        assert!((score - (2.0 / 3.0) * 100.0).abs() < 0.001);
    }

    #[test]
    fn improvement_streak_neutral_under_two_records() {
        assert_eq!(improvement_streak_score(&[session(1, 80.0)]), 50.0);
    }

    #[test]
    fn mistake_reduction_handles_zero_baseline() {
        let up = vec![session(5, 0.0), session(1, 40.0)];
        let flat = vec![session(5, 0.0), session(1, 0.0)];
        assert_eq!(mistake_reduction_score(&up), 100.0);
        assert_eq!(mistake_reduction_score(&flat), 50.0);
    }

    #[test]
    fn mistake_reduction_is_monotone_in_last_score() {
        let lower = vec![session(5, 80.0), session(1, 85.0)];
        let higher = vec![session(5, 80.0), session(1, 95.0)];
        assert!(mistake_reduction_score(&higher) >= mistake_reduction_score(&lower));
    }

    #[test]
    fn mistake_reduction_centers_on_fifty() {
        let records = vec![session(5, 80.0), session(1, 90.0)];
        let score = mistake_reduction_score(&records);
        assert!((score - 56.25).abs() < 0.001);
    }

    #[test]
    fn goal_completion_rate() {
        let goals = vec![goal(true), goal(true), goal(true), goal(false)];
        assert_eq!(goal_completion_score(&goals), 75.0);
        assert_eq!(goal_completion_score(&[]), 50.0);
    }

    #[test]
    fn trend_follows_slope() {
        let records: Vec<_> = (0..5)
            .map(|d| session(5 - d, 60.0 + 2.0 * d as f64))
            .collect();
        let score = performance_trend_score(&records);
        assert!((score - 70.0).abs() < 0.001);
    }

    #[test]
    fn trend_neutral_when_all_sessions_share_a_day() {
        let records = vec![session(1, 40.0), session(1, 80.0), session(1, 60.0)];
        assert_eq!(performance_trend_score(&records), 50.0);
    }

    #[test]
    fn confidence_stays_in_bounds() {
        let rising: Vec<_> = (0..20).map(|d| session(20 - d, 5.0 * d as f64)).collect();
        let falling: Vec<_> = (0..20)
            .map(|d| session(20 - d, 100.0 - 5.0 * d as f64))
            .collect();

        for records in [&rising, &falling] {
            let score = confidence_score(records, &[]);
            assert!((0.0..=100.0).contains(&score));
        }
    }

    #[test]
    fn factors_are_idempotent_on_a_frozen_snapshot() {
        let records: Vec<_> = (0..8).map(|d| session(8 - d, 55.0 + d as f64)).collect();
        let goals = vec![goal(true), goal(false)];

        let first = confidence_score(&records, &goals);
        let second = confidence_score(&records, &goals);
        assert_eq!(first, second);

        let a = factor_breakdown(&records, &goals);
        let b = factor_breakdown(&records, &goals);
        assert_eq!(a.consistency, b.consistency);
        assert_eq!(a.performance_trend, b.performance_trend);
    }
}
