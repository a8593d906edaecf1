use std::collections::{BTreeMap, HashMap};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{GoalDraft, PerformanceRecord, Topic};

pub const MIN_GOALS: usize = 2;
pub const MAX_GOALS: usize = 4;

const WEAK_TOPIC_THRESHOLD: f64 = 70.0;
const VERY_WEAK_THRESHOLD: f64 = 50.0;

const SHORT_BOX: (i32, i32) = (10, 20);
const MEDIUM_BOX: (i32, i32) = (20, 35);

const PRIORITY_WEAK: i32 = 5;
const PRIORITY_INACTIVE: i32 = 3;
const PRIORITY_BACKFILL: i32 = 3;
const PRIORITY_CONFIDENCE: i32 = 2;

const FALLBACK_TOPIC_ID: i64 = 1;
const FALLBACK_TOPIC_NAME: &str = "General Topic";

const REVISION_TEMPLATES: [&str; 3] = [
    "Revise {topic_name} formulas/concepts ({time_estimate} mins)",
    "Review {topic_name} key points ({time_estimate} mins)",
    "Go through {topic_name} notes ({time_estimate} mins)",
];

const PRACTICE_TEMPLATES: [&str; 3] = [
    "Attempt {num_questions} {difficulty} questions from {topic_name} ({time_estimate} mins)",
    "Solve {num_questions} {difficulty} problems on {topic_name} ({time_estimate} mins)",
    "Practice {topic_name} with {num_questions} questions - no time pressure ({time_estimate} mins)",
];

const CONCEPTUAL_TEMPLATES: [&str; 3] = [
    "Understand core concepts of {topic_name} ({time_estimate} mins)",
    "Focus on {topic_name} fundamentals ({time_estimate} mins)",
    "Clear {topic_name} doubts ({time_estimate} mins)",
];

/// Draft 2-4 small daily goals from the topic catalog and the trailing week
/// of sessions: up to two for weak topics, one for a topic left untouched,
/// and one confidence builder, backfilled up to the floor and cut at the
/// cap. Template and time-box picks come from the caller's `rng`, so a
/// seeded generator reproduces its drafts.
pub fn generate_daily_goals<R: Rng>(
    topics: &[Topic],
    recent: &[PerformanceRecord],
    rng: &mut R,
) -> Vec<GoalDraft> {
    let by_id: HashMap<i64, &Topic> = topics.iter().map(|topic| (topic.id, topic)).collect();

    let mut goals = Vec::new();

    for (topic_id, avg_score) in weak_topic_averages(recent) {
        if goals.len() >= 2 {
            break;
        }
        // Weak topics whose catalog entry is gone have nothing to name.
        if let Some(topic) = by_id.get(&topic_id) {
            goals.push(weak_topic_goal(topic, avg_score, rng));
        }
    }

    if let Some(topic) = inactive_topics(topics, recent).first() {
        goals.push(inactive_topic_goal(topic, rng));
    }

    goals.push(confidence_goal(topics, rng));

    while goals.len() < MIN_GOALS {
        goals.push(backfill_goal(topics, rng));
    }
    goals.truncate(MAX_GOALS);

    goals
}

/// Per-topic mean scores under the weak threshold, in ascending topic-id
/// order so repeated runs target the same topics.
fn weak_topic_averages(recent: &[PerformanceRecord]) -> Vec<(i64, f64)> {
    let mut totals: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for record in recent {
        let entry = totals.entry(record.topic_id).or_insert((0.0, 0));
        entry.0 += record.score;
        entry.1 += 1;
    }

    totals
        .into_iter()
        .map(|(topic_id, (sum, count))| (topic_id, sum / count as f64))
        .filter(|(_, avg)| *avg < WEAK_TOPIC_THRESHOLD)
        .collect()
}

fn inactive_topics<'a>(topics: &'a [Topic], recent: &[PerformanceRecord]) -> Vec<&'a Topic> {
    let active: std::collections::HashSet<i64> =
        recent.iter().map(|record| record.topic_id).collect();
    topics.iter().filter(|topic| !active.contains(&topic.id)).collect()
}

fn weak_topic_goal<R: Rng>(topic: &Topic, avg_score: f64, rng: &mut R) -> GoalDraft {
    let (template, time_box) = if avg_score < VERY_WEAK_THRESHOLD {
        (pick(&REVISION_TEMPLATES, rng), MEDIUM_BOX)
    } else {
        (pick(&PRACTICE_TEMPLATES, rng), SHORT_BOX)
    };

    let minutes = rng.gen_range(time_box.0..=time_box.1);
    let questions = rng.gen_range(3..=6);

    GoalDraft {
        topic_id: topic.id,
        goal_text: render(template, &topic.name, minutes, questions),
        estimated_time: minutes,
        priority: PRIORITY_WEAK,
    }
}

fn inactive_topic_goal<R: Rng>(topic: &Topic, rng: &mut R) -> GoalDraft {
    let template = pick(&REVISION_TEMPLATES, rng);
    let minutes = rng.gen_range(SHORT_BOX.0..=SHORT_BOX.1);

    GoalDraft {
        topic_id: topic.id,
        goal_text: render(template, &topic.name, minutes, 0),
        estimated_time: minutes,
        priority: PRIORITY_INACTIVE,
    }
}

/// One low-pressure conceptual goal on a random topic keeps every day's list
/// from being pure remediation.
fn confidence_goal<R: Rng>(topics: &[Topic], rng: &mut R) -> GoalDraft {
    let (topic_id, topic_name) = random_topic(topics, rng);
    let template = pick(&CONCEPTUAL_TEMPLATES, rng);
    let minutes = rng.gen_range(SHORT_BOX.0..=SHORT_BOX.1);

    GoalDraft {
        topic_id,
        goal_text: render(template, &topic_name, minutes, 0),
        estimated_time: minutes,
        priority: PRIORITY_CONFIDENCE,
    }
}

fn backfill_goal<R: Rng>(topics: &[Topic], rng: &mut R) -> GoalDraft {
    let (topic_id, topic_name) = random_topic(topics, rng);
    let pool: Vec<&str> = REVISION_TEMPLATES
        .iter()
        .chain(PRACTICE_TEMPLATES.iter())
        .copied()
        .collect();
    let template = pick(&pool, rng);
    let minutes = rng.gen_range(SHORT_BOX.0..=SHORT_BOX.1);
    let questions = rng.gen_range(3..=5);

    GoalDraft {
        topic_id,
        goal_text: render(template, &topic_name, minutes, questions),
        estimated_time: minutes,
        priority: PRIORITY_BACKFILL,
    }
}

fn random_topic<R: Rng>(topics: &[Topic], rng: &mut R) -> (i64, String) {
    match topics.choose(rng) {
        Some(topic) => (topic.id, topic.name.clone()),
        None => (FALLBACK_TOPIC_ID, FALLBACK_TOPIC_NAME.to_string()),
    }
}

fn pick<'a, R: Rng>(templates: &[&'a str], rng: &mut R) -> &'a str {
    templates.choose(rng).copied().unwrap_or(templates[0])
}

fn render(template: &str, topic_name: &str, minutes: i32, questions: u32) -> String {
    template
        .replace("{topic_name}", topic_name)
        .replace("{time_estimate}", &minutes.to_string())
        .replace("{num_questions}", &questions.to_string())
        .replace("{difficulty}", "easy")
}
