use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{MessageDraft, MessageType, PerformanceRecord, ProgressSummary};

const IMPROVEMENT_TEMPLATES: [&str; 5] = [
    "You improved accuracy by {improvement}% this week\u{2014}keep going \u{1f4aa}",
    "Great progress! Your hard work is showing results with {improvement}% improvement.",
    "Consistency pays off! You've improved by {improvement}% recently.",
    "Noticed your improvement of {improvement}% - you're on the right track!",
    "Your dedication is paying off with {improvement}% progress!",
];

const CONSISTENCY_TEMPLATES: [&str; 5] = [
    "Consistency matters more than speed. You're on track with {days} days in a row!",
    "You've been studying for {days} consecutive days - that's commitment!",
    "Daily practice is building your confidence. Keep up the {days} day streak!",
    "Your consistency is impressive - {days} days of focused study!",
    "Small steps daily lead to big results. {days} days of consistency shows your dedication!",
];

const GOAL_COMPLETION_TEMPLATES: [&str; 5] = [
    "Another goal completed! Your discipline is building your confidence.",
    "Well done! You're building momentum with completed goals.",
    "Goal completed! Each small victory counts toward your success.",
    "Great job finishing that goal! You're making steady progress.",
    "Completed goal! Every task you finish brings you closer to your target.",
];

const SETBACK_TEMPLATES: [&str; 5] = [
    "One missed goal doesn't break your progress. Tomorrow is a new opportunity.",
    "Setbacks are part of learning. What matters is you keep going.",
    "Don't let one difficult day discourage you. Your journey continues.",
    "It's okay to have challenging days. What's important is you're here now.",
    "Progress isn't always smooth. Your commitment to continue matters.",
];

const STRESS_TEMPLATES: [&str; 5] = [
    "Remember: consistency over intensity. You're doing better than you think.",
    "Take breaks when needed. Quality over quantity in your preparation.",
    "Your worth isn't defined by test scores. Focus on your growth journey.",
    "Learning is a marathon, not a sprint. Pace yourself appropriately.",
    "It's normal to feel challenged. Trust in your preparation and growth.",
];

pub const DEFAULT_MESSAGE: &str =
    "Remember, every expert was once a beginner. Your consistent effort is building your success!";

/// Stress inside this window switches setback support to the sharper
/// stress-focused templates.
pub const SETBACK_DAYS: i64 = 2;

const SIGNIFICANT_IMPROVEMENT_PCT: f64 = 5.0;
const STRONG_IMPROVEMENT_PCT: f64 = 10.0;
const CONSISTENCY_STREAK_DAYS: usize = 3;

/// Summarize the trailing week: first-to-last score change, distinct study
/// days, whether any goal got finished, and how many stress signals were
/// recorded. `completed_goals` and `stress_signals` are window counts
/// supplied by the caller.
pub fn analyze_progress(
    records: &[PerformanceRecord],
    completed_goals: u64,
    stress_signals: u64,
) -> ProgressSummary {
    let improvement_pct = if records.len() >= 2 && records[0].score != 0.0 {
        let first = records[0].score;
        let last = records[records.len() - 1].score;
        ((last - first) / first) * 100.0
    } else {
        0.0
    };

    let study_dates: std::collections::HashSet<_> = records
        .iter()
        .map(|record| record.recorded_at.date_naive())
        .collect();

    ProgressSummary {
        improvement_pct,
        consistency_days: study_dates.len(),
        recent_goal_completed: completed_goals > 0,
        stress_signals,
    }
}

/// First match wins: improvement, then consistency, then a finished goal,
/// then stress support, then the standing default.
pub fn daily_encouragement<R: Rng>(summary: &ProgressSummary, rng: &mut R) -> String {
    if summary.improvement_pct > SIGNIFICANT_IMPROVEMENT_PCT {
        return improvement_encouragement(summary.improvement_pct, rng);
    }
    if summary.consistency_days >= CONSISTENCY_STREAK_DAYS {
        let template = pick(&CONSISTENCY_TEMPLATES, rng);
        return template.replace("{days}", &summary.consistency_days.to_string());
    }
    if summary.recent_goal_completed {
        return pick(&GOAL_COMPLETION_TEMPLATES, rng).to_string();
    }
    if summary.stress_signals > 0 {
        return pick(&STRESS_TEMPLATES, rng).to_string();
    }
    DEFAULT_MESSAGE.to_string()
}

pub fn improvement_encouragement<R: Rng>(improvement_pct: f64, rng: &mut R) -> String {
    let template = pick(&IMPROVEMENT_TEMPLATES, rng);
    template.replace("{improvement}", &format!("{improvement_pct:.1}"))
}

/// Supportive message for a rough patch. `recent_stress` reflects whether a
/// stress signal landed in the last couple of days.
pub fn setback_encouragement<R: Rng>(recent_stress: bool, rng: &mut R) -> String {
    if recent_stress {
        pick(&STRESS_TEMPLATES, rng).to_string()
    } else {
        pick(&SETBACK_TEMPLATES, rng).to_string()
    }
}

/// Short acknowledgement keyed off the completed goal's own wording.
pub fn after_goal_encouragement(goal_text: &str) -> &'static str {
    let text = goal_text.to_lowercase();
    if text.contains("revise") || text.contains("review") {
        "Great job reviewing concepts! Repetition strengthens memory and builds confidence."
    } else if text.contains("practice") || text.contains("solve") {
        "Practice makes progress! Each problem you solve builds your confidence for the exam."
    } else {
        "Goal completed! Each small step brings you closer to your success."
    }
}

/// Daily message plus at most one follow-up: an improvement callout for a
/// strong week, or a consolation when stress signals are present.
pub fn personalized_encouragement<R: Rng>(
    summary: &ProgressSummary,
    recent_stress: bool,
    rng: &mut R,
) -> Vec<MessageDraft> {
    let mut messages = vec![MessageDraft {
        message_type: MessageType::Daily,
        message: daily_encouragement(summary, rng),
    }];

    if summary.improvement_pct > STRONG_IMPROVEMENT_PCT {
        messages.push(MessageDraft {
            message_type: MessageType::Improvement,
            message: improvement_encouragement(summary.improvement_pct, rng),
        });
    } else if summary.stress_signals > 0 {
        messages.push(MessageDraft {
            message_type: MessageType::Consolation,
            message: setback_encouragement(recent_stress, rng),
        });
    }

    messages
}

fn pick<'a, R: Rng>(templates: &[&'a str], rng: &mut R) -> &'a str {
    templates.choose(rng).copied().unwrap_or(templates[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
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

    fn summary(
        improvement_pct: f64,
        consistency_days: usize,
        recent_goal_completed: bool,
        stress_signals: u64,
    ) -> ProgressSummary {
        ProgressSummary {
            improvement_pct,
            consistency_days,
            recent_goal_completed,
            stress_signals,
        }
    }

    #[test]
    fn progress_summary_measures_first_to_last_change() {
        let records = vec![session(6, 50.0), session(3, 55.0), session(1, 60.0)];
        let summary = analyze_progress(&records, 1, 2);
        assert!((summary.improvement_pct - 20.0).abs() < 0.001);
        assert_eq!(summary.consistency_days, 3);
        assert!(summary.recent_goal_completed);
        assert_eq!(summary.stress_signals, 2);
    }

    #[test]
    fn zero_baseline_or_sparse_history_means_no_improvement() {
        let sparse = vec![session(1, 80.0)];
        assert_eq!(analyze_progress(&sparse, 0, 0).improvement_pct, 0.0);

        let zero_first = vec![session(3, 0.0), session(1, 60.0)];
        assert_eq!(analyze_progress(&zero_first, 0, 0).improvement_pct, 0.0);
    }

    #[test]
    fn improvement_wins_the_cascade() {
        let mut rng = StdRng::seed_from_u64(1);
        let message = daily_encouragement(&summary(6.4, 5, true, 3), &mut rng);
        assert!(message.contains("6.4%"));
    }

    #[test]
    fn consistency_comes_second() {
        let mut rng = StdRng::seed_from_u64(1);
        let message = daily_encouragement(&summary(2.0, 4, true, 3), &mut rng);
        assert!(message.contains('4'));
        assert!(CONSISTENCY_TEMPLATES
            .iter()
            .any(|t| t.replace("{days}", "4") == message));
    }

    #[test]
    fn goal_completion_comes_third() {
        let mut rng = StdRng::seed_from_u64(1);
        let message = daily_encouragement(&summary(0.0, 1, true, 3), &mut rng);
        assert!(GOAL_COMPLETION_TEMPLATES.contains(&message.as_str()));
    }

    #[test]
    fn stress_support_comes_fourth() {
        let mut rng = StdRng::seed_from_u64(1);
        let message = daily_encouragement(&summary(0.0, 1, false, 2), &mut rng);
        assert!(STRESS_TEMPLATES.contains(&message.as_str()));
    }

    #[test]
    fn quiet_week_gets_the_default() {
        let mut rng = StdRng::seed_from_u64(1);
        let message = daily_encouragement(&summary(0.0, 0, false, 0), &mut rng);
        assert_eq!(message, DEFAULT_MESSAGE);
    }

    #[test]
    fn personalized_appends_improvement_over_consolation() {
        let mut rng = StdRng::seed_from_u64(2);
        let messages = personalized_encouragement(&summary(12.0, 2, false, 1), false, &mut rng);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].message_type, MessageType::Daily);
        assert_eq!(messages[1].message_type, MessageType::Improvement);

        let messages = personalized_encouragement(&summary(2.0, 1, false, 1), true, &mut rng);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].message_type, MessageType::Consolation);
        assert!(STRESS_TEMPLATES.contains(&messages[1].message.as_str()));

        let messages = personalized_encouragement(&summary(2.0, 0, false, 0), false, &mut rng);
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn setback_prefers_stress_support_when_stress_is_fresh() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(STRESS_TEMPLATES.contains(&setback_encouragement(true, &mut rng).as_str()));
        assert!(SETBACK_TEMPLATES.contains(&setback_encouragement(false, &mut rng).as_str()));
    }

    #[test]
    fn after_goal_message_matches_goal_wording() {
        assert!(after_goal_encouragement("Review Algebra key points (15 mins)")
            .contains("reviewing"));
        assert!(after_goal_encouragement("Solve 4 easy problems on Geometry (12 mins)")
            .contains("Practice"));
        assert!(after_goal_encouragement("Understand core concepts of Algebra (10 mins)")
            .contains("Goal completed"));
    }
}
