use std::collections::HashSet;

use crate::models::{PerformanceRecord, SignalDraft, SignalType};

const SUDDEN_DROP_RATIO: f64 = 0.7;
const SUDDEN_DROP_VALUE: f64 = 75.0;
const EFFORT_MISMATCH_MINUTES: i32 = 10;
const EFFORT_MISMATCH_VALUE: f64 = 60.0;
const STREAK_MIN_RUN: usize = 3;
const HIGH_CONSISTENCY_DAYS: usize = 5;
const LOW_CONSISTENCY_DAYS: usize = 2;
const LOW_CONSISTENCY_VALUE: f64 = 40.0;

/// Scan one student's history for discrete behavioral events. `records` is
/// the 30-day window in time order; `recent` is the trailing 7-day window.
/// Each call re-derives every observation from scratch; persisting the same
/// event twice is the caller's concern, not ours.
pub fn detect_signals(records: &[PerformanceRecord], recent: &[PerformanceRecord]) -> Vec<SignalDraft> {
    let mut signals = Vec::new();
    signals.extend(sudden_drop_signals(records));
    signals.extend(effort_mismatch_signals(records));
    signals.extend(improvement_signal(records));
    signals.extend(consistency_signal(recent));
    signals
}

/// A score below 70% of the rolling two-session average reads as a sudden
/// drop. Every qualifying window fires, not just the first.
fn sudden_drop_signals(records: &[PerformanceRecord]) -> Vec<SignalDraft> {
    let mut signals = Vec::new();

    for window in records.windows(3) {
        let prev_avg = (window[0].score + window[1].score) / 2.0;
        let current = window[2].score;

        if current < prev_avg * SUDDEN_DROP_RATIO {
            signals.push(SignalDraft {
                signal_type: SignalType::Stress,
                value: SUDDEN_DROP_VALUE,
                description: format!(
                    "Sudden performance drop detected: {prev_avg:.1}% -> {current:.1}%"
                ),
            });
        }
    }

    signals
}

/// Spending noticeably more time for a lower score suggests strain.
fn effort_mismatch_signals(records: &[PerformanceRecord]) -> Vec<SignalDraft> {
    let mut signals = Vec::new();

    for pair in records.windows(2) {
        let time_diff = pair[1].time_spent - pair[0].time_spent;
        let score_diff = pair[1].score - pair[0].score;

        if time_diff > EFFORT_MISMATCH_MINUTES && score_diff < 0.0 {
            signals.push(SignalDraft {
                signal_type: SignalType::Stress,
                value: EFFORT_MISMATCH_VALUE,
                description: format!(
                    "Increased study time with decreased performance: spent {} vs {} mins",
                    pair[1].time_spent, pair[0].time_spent
                ),
            });
        }
    }

    signals
}

/// Longest run of sessions with strictly increasing scores; runs of three or
/// more sessions are worth calling out.
fn improvement_signal(records: &[PerformanceRecord]) -> Option<SignalDraft> {
    if records.is_empty() {
        return None;
    }

    let mut run = 1usize;
    let mut longest = 1usize;
    for pair in records.windows(2) {
        if pair[1].score > pair[0].score {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
    }

    if longest < STREAK_MIN_RUN {
        return None;
    }

    Some(SignalDraft {
        signal_type: SignalType::ImprovementStreak,
        value: longest as f64,
        description: format!("Improvement streak of {longest} consecutive sessions"),
    })
}

/// Five or more distinct study days in the trailing week is a consistency
/// win; two or fewer reads as disengagement. The middle band stays quiet.
fn consistency_signal(recent: &[PerformanceRecord]) -> Option<SignalDraft> {
    let study_dates: HashSet<_> = recent
        .iter()
        .map(|record| record.recorded_at.date_naive())
        .collect();
    let days = study_dates.len();

    if days >= HIGH_CONSISTENCY_DAYS {
        Some(SignalDraft {
            signal_type: SignalType::Consistency,
            value: days as f64,
            description: format!("High consistency: studied {days} of last 7 days"),
        })
    } else if days <= LOW_CONSISTENCY_DAYS {
        Some(SignalDraft {
            signal_type: SignalType::Stress,
            value: LOW_CONSISTENCY_VALUE,
            description: format!("Low consistency: studied only {days} of last 7 days"),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn session(days_ago: i64, score: f64, time_spent: i32) -> PerformanceRecord {
        PerformanceRecord {
            student_id: Uuid::new_v4(),
            topic_id: 1,
            recorded_at: Utc::now() - Duration::days(days_ago),
            score,
            time_spent,
            mistakes: None,
            completed: true,
        }
    }

    fn scores(values: &[f64]) -> Vec<PerformanceRecord> {
        let n = values.len() as i64;
        values
            .iter()
            .enumerate()
            .map(|(i, &score)| session(n - i as i64, score, 25))
            .collect()
    }

    #[test]
    fn sudden_drop_fires_below_seventy_percent_of_prior_average() {
        let records = scores(&[80.0, 80.0, 50.0]);
        let signals = sudden_drop_signals(&records);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].signal_type, SignalType::Stress);
        assert_eq!(signals[0].value, 75.0);
    }

    #[test]
    fn sudden_drop_can_fire_more_than_once() {
        let records = scores(&[90.0, 90.0, 40.0, 90.0, 90.0, 40.0]);
        assert_eq!(sudden_drop_signals(&records).len(), 2);
    }

    #[test]
    fn shallow_dip_does_not_fire() {
        // 60 is above 0.7 * 80 = 56.
        let records = scores(&[80.0, 80.0, 60.0]);
        assert!(sudden_drop_signals(&records).is_empty());
    }

    #[test]
    fn effort_mismatch_needs_both_more_time_and_lower_score() {
        let strained = vec![session(2, 80.0, 20), session(1, 70.0, 35)];
        let signals = effort_mismatch_signals(&strained);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].value, 60.0);

        let productive = vec![session(2, 70.0, 20), session(1, 80.0, 35)];
        assert!(effort_mismatch_signals(&productive).is_empty());

        let quick_dip = vec![session(2, 80.0, 20), session(1, 70.0, 25)];
        assert!(effort_mismatch_signals(&quick_dip).is_empty());
    }

    #[test]
    fn improvement_run_length_counts_sessions() {
        let records = scores(&[40.0, 50.0, 60.0, 70.0, 65.0]);
        let signal = improvement_signal(&records).expect("streak should fire");
        assert_eq!(signal.signal_type, SignalType::ImprovementStreak);
        assert_eq!(signal.value, 4.0);
    }

    #[test]
    fn short_runs_stay_silent() {
        let records = scores(&[40.0, 50.0, 45.0, 55.0]);
        assert!(improvement_signal(&records).is_none());
    }

    #[test]
    fn consistency_bands() {
        let five_days: Vec<_> = (1..=5).map(|d| session(d, 70.0, 25)).collect();
        let high = consistency_signal(&five_days).expect("high band should fire");
        assert_eq!(high.signal_type, SignalType::Consistency);
        assert_eq!(high.value, 5.0);

        let two_days: Vec<_> = (1..=2).map(|d| session(d, 70.0, 25)).collect();
        let low = consistency_signal(&two_days).expect("low band should fire");
        assert_eq!(low.signal_type, SignalType::Stress);
        assert_eq!(low.value, 40.0);

        for day_count in [3i64, 4] {
            let middle: Vec<_> = (1..=day_count).map(|d| session(d, 70.0, 25)).collect();
            assert!(consistency_signal(&middle).is_none());
        }
    }

    #[test]
    fn empty_history_emits_only_the_disengagement_warning() {
        let signals = detect_signals(&[], &[]);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].signal_type, SignalType::Stress);
        assert_eq!(signals[0].value, 40.0);
    }

    #[test]
    fn detector_is_pure_over_a_snapshot() {
        let records = scores(&[80.0, 80.0, 50.0, 55.0, 60.0, 65.0]);
        let recent = records.clone();
        let first = detect_signals(&records, &recent);
        let second = detect_signals(&records, &recent);
        assert_eq!(first.len(), second.len());
    }
}
