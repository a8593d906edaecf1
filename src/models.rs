use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StudentRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub grade: String,
    pub exam_type: String,
}

#[derive(Debug, Clone)]
pub struct Topic {
    pub id: i64,
    pub name: String,
    pub subject: String,
    pub difficulty: String,
}

#[derive(Debug, Clone)]
pub struct PerformanceRecord {
    pub student_id: Uuid,
    pub topic_id: i64,
    pub recorded_at: DateTime<Utc>,
    pub score: f64,
    pub time_spent: i32,
    pub mistakes: Option<String>,
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub struct MicroGoal {
    pub id: Uuid,
    pub student_id: Uuid,
    pub topic_id: i64,
    pub goal_text: String,
    pub estimated_time: i32,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Stress,
    ImprovementStreak,
    Consistency,
    EffortOutcomeRatio,
    Confidence,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Stress => "stress",
            SignalType::ImprovementStreak => "improvement_streak",
            SignalType::Consistency => "consistency",
            SignalType::EffortOutcomeRatio => "effort_outcome_ratio",
            SignalType::Confidence => "confidence",
        }
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Daily,
    AfterGoal,
    Consolation,
    Improvement,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Daily => "daily",
            MessageType::AfterGoal => "after_goal",
            MessageType::Consolation => "consolation",
            MessageType::Improvement => "improvement",
        }
    }
}

/// Signal observation produced by the detector, not yet persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SignalDraft {
    pub signal_type: SignalType,
    pub value: f64,
    pub description: String,
}

/// Suggested micro-goal produced by the generator, not yet persisted.
#[derive(Debug, Clone, Serialize)]
pub struct GoalDraft {
    pub topic_id: i64,
    pub goal_text: String,
    pub estimated_time: i32,
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageDraft {
    pub message_type: MessageType,
    pub message: String,
}

/// Per-factor scores behind one confidence score.
#[derive(Debug, Clone, Serialize)]
pub struct FactorBreakdown {
    pub consistency: f64,
    pub improvement_streak: f64,
    pub mistake_reduction: f64,
    pub goal_completion: f64,
    pub performance_trend: f64,
    pub confidence: f64,
}

/// Trailing-week summary feeding encouragement selection.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSummary {
    pub improvement_pct: f64,
    pub consistency_days: usize,
    pub recent_goal_completed: bool,
    pub stress_signals: u64,
}
