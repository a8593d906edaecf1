use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{FactorBreakdown, GoalDraft, SignalDraft, StudentRecord};

pub fn build_report(
    student: &StudentRecord,
    cutoff: DateTime<Utc>,
    breakdown: Option<&FactorBreakdown>,
    signals: &[SignalDraft],
    goals: &[GoalDraft],
    encouragement: &str,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Study Confidence Report");
    let _ = writeln!(
        output,
        "Generated for {} ({}, grade {}, {} track); history since {}",
        student.name,
        student.email,
        student.grade,
        student.exam_type,
        cutoff.date_naive()
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Confidence");

    match breakdown {
        Some(breakdown) => {
            let _ = writeln!(output, "Confidence score: {:.2}", breakdown.confidence);
            let _ = writeln!(output, "- consistency: {:.1}", breakdown.consistency);
            let _ = writeln!(
                output,
                "- improvement streak: {:.1}",
                breakdown.improvement_streak
            );
            let _ = writeln!(
                output,
                "- mistake reduction: {:.1}",
                breakdown.mistake_reduction
            );
            let _ = writeln!(output, "- goal completion: {:.1}", breakdown.goal_completion);
            let _ = writeln!(
                output,
                "- performance trend: {:.1}",
                breakdown.performance_trend
            );
        }
        None => {
            let _ = writeln!(output, "No sessions recorded; confidence sits at 50.00.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Detected Signals");

    if signals.is_empty() {
        let _ = writeln!(output, "No signals detected for this window.");
    } else {
        for signal in signals {
            let _ = writeln!(
                output,
                "- {} ({:.1}): {}",
                signal.signal_type.as_str(),
                signal.value,
                signal.description
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Suggested Goals");

    if goals.is_empty() {
        let _ = writeln!(output, "No goals suggested for this window.");
    } else {
        for goal in goals {
            let _ = writeln!(
                output,
                "- [p{}] {} (~{} mins)",
                goal.priority, goal.goal_text, goal.estimated_time
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Encouragement");
    let _ = writeln!(output, "{encouragement}");

    output
}
