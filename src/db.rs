use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    GoalDraft, MessageDraft, MicroGoal, PerformanceRecord, SignalDraft, SignalType, StudentRecord,
    Topic,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn student_by_email(pool: &PgPool, email: &str) -> anyhow::Result<StudentRecord> {
    let row = sqlx::query(
        "SELECT id, name, email, grade, exam_type FROM confidence_coach.students WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    let row = row.ok_or_else(|| anyhow::anyhow!("no student registered with email {email}"))?;
    Ok(StudentRecord {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        grade: row.get("grade"),
        exam_type: row.get("exam_type"),
    })
}

pub async fn fetch_topics(pool: &PgPool) -> anyhow::Result<Vec<Topic>> {
    let rows = sqlx::query(
        "SELECT id, name, subject, difficulty FROM confidence_coach.topics ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Topic {
            id: row.get("id"),
            name: row.get("name"),
            subject: row.get("subject"),
            difficulty: row.get("difficulty"),
        })
        .collect())
}

pub async fn fetch_performance(
    pool: &PgPool,
    student_id: Uuid,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<PerformanceRecord>> {
    let rows = sqlx::query(
        "SELECT student_id, topic_id, recorded_at, score, time_spent, mistakes, completed \
         FROM confidence_coach.performance_records \
         WHERE student_id = $1 AND recorded_at >= $2 \
         ORDER BY recorded_at",
    )
    .bind(student_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| PerformanceRecord {
            student_id: row.get("student_id"),
            topic_id: row.get("topic_id"),
            recorded_at: row.get("recorded_at"),
            score: row.get("score"),
            time_spent: row.get("time_spent"),
            mistakes: row.get("mistakes"),
            completed: row.get("completed"),
        })
        .collect())
}

pub async fn fetch_goals(
    pool: &PgPool,
    student_id: Uuid,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<MicroGoal>> {
    let rows = sqlx::query(
        "SELECT id, student_id, topic_id, goal_text, estimated_time, priority, created_at, \
         completed, completed_at \
         FROM confidence_coach.micro_goals \
         WHERE student_id = $1 AND created_at >= $2 \
         ORDER BY created_at",
    )
    .bind(student_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| MicroGoal {
            id: row.get("id"),
            student_id: row.get("student_id"),
            topic_id: row.get("topic_id"),
            goal_text: row.get("goal_text"),
            estimated_time: row.get("estimated_time"),
            priority: row.get("priority"),
            created_at: row.get("created_at"),
            completed: row.get("completed"),
            completed_at: row.get("completed_at"),
        })
        .collect())
}

pub async fn count_completed_goals(
    pool: &PgPool,
    student_id: Uuid,
    since: DateTime<Utc>,
) -> anyhow::Result<u64> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS total FROM confidence_coach.micro_goals \
         WHERE student_id = $1 AND completed = TRUE AND completed_at >= $2",
    )
    .bind(student_id)
    .bind(since)
    .fetch_one(pool)
    .await?;

    let total: i64 = row.get("total");
    Ok(total as u64)
}

pub async fn count_signals(
    pool: &PgPool,
    student_id: Uuid,
    signal_type: SignalType,
    since: DateTime<Utc>,
) -> anyhow::Result<u64> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS total FROM confidence_coach.anxiety_signals \
         WHERE student_id = $1 AND signal_type = $2 AND detected_at >= $3",
    )
    .bind(student_id)
    .bind(signal_type.as_str())
    .bind(since)
    .fetch_one(pool)
    .await?;

    let total: i64 = row.get("total");
    Ok(total as u64)
}

pub async fn log_session(
    pool: &PgPool,
    student_id: Uuid,
    topic_id: i64,
    score: f64,
    time_spent: i32,
    mistakes: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO confidence_coach.performance_records \
         (id, student_id, topic_id, recorded_at, score, time_spent, mistakes, completed) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)",
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(topic_id)
    .bind(Utc::now())
    .bind(score)
    .bind(time_spent)
    .bind(mistakes)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_signals(
    pool: &PgPool,
    student_id: Uuid,
    signals: &[SignalDraft],
) -> anyhow::Result<usize> {
    let mut inserted = 0usize;
    for signal in signals {
        sqlx::query(
            "INSERT INTO confidence_coach.anxiety_signals \
             (id, student_id, signal_type, value, description, detected_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(signal.signal_type.as_str())
        .bind(signal.value)
        .bind(&signal.description)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        inserted += 1;
    }
    Ok(inserted)
}

pub async fn insert_goals(
    pool: &PgPool,
    student_id: Uuid,
    goals: &[GoalDraft],
) -> anyhow::Result<usize> {
    let mut inserted = 0usize;
    for goal in goals {
        sqlx::query(
            "INSERT INTO confidence_coach.micro_goals \
             (id, student_id, topic_id, goal_text, estimated_time, priority, created_at, completed) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE)",
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(goal.topic_id)
        .bind(&goal.goal_text)
        .bind(goal.estimated_time)
        .bind(goal.priority)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        inserted += 1;
    }
    Ok(inserted)
}

pub async fn insert_messages(
    pool: &PgPool,
    student_id: Uuid,
    messages: &[MessageDraft],
) -> anyhow::Result<usize> {
    let mut inserted = 0usize;
    for message in messages {
        sqlx::query(
            "INSERT INTO confidence_coach.encouragement_messages \
             (id, student_id, message, message_type, created_at, viewed) \
             VALUES ($1, $2, $3, $4, $5, FALSE)",
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(&message.message)
        .bind(message.message_type.as_str())
        .bind(Utc::now())
        .execute(pool)
        .await?;
        inserted += 1;
    }
    Ok(inserted)
}

/// Completion transition: flips completed once and stamps completed_at.
/// Returns the goal text so the caller can acknowledge it, or None when the
/// goal is unknown or already done.
pub async fn complete_goal(pool: &PgPool, goal_id: Uuid) -> anyhow::Result<Option<String>> {
    let row = sqlx::query(
        "UPDATE confidence_coach.micro_goals \
         SET completed = TRUE, completed_at = $2 \
         WHERE id = $1 AND completed = FALSE \
         RETURNING goal_text",
    )
    .bind(goal_id)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| row.get("goal_text")))
}

pub async fn mark_message_viewed(pool: &PgPool, message_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "UPDATE confidence_coach.encouragement_messages \
         SET viewed = TRUE \
         WHERE id = $1 AND viewed = FALSE",
    )
    .bind(message_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        name: String,
        email: String,
        grade: String,
        exam_type: String,
        topic_id: i64,
        score: f64,
        time_spent: i32,
        recorded_at: DateTime<Utc>,
        mistakes: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let student_id: Uuid = sqlx::query(
            r#"
            INSERT INTO confidence_coach.students
            (id, name, email, grade, exam_type)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET name = EXCLUDED.name, grade = EXCLUDED.grade, exam_type = EXCLUDED.exam_type
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.grade)
        .bind(&row.exam_type)
        .fetch_one(pool)
        .await?
        .get("id");

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO confidence_coach.performance_records
            (id, student_id, topic_id, recorded_at, score, time_spent, mistakes, completed, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(row.topic_id)
        .bind(row.recorded_at)
        .bind(row.score)
        .bind(row.time_spent)
        .bind(&row.mistakes)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let students = vec![
        (
            Uuid::parse_str("8f6a2c1d-4b3e-4f2a-9c5d-1e8b7a6f5d4c")?,
            "Meera Iyer",
            "meera.iyer@example.com",
            "12",
            "board",
        ),
        (
            Uuid::parse_str("2b9e4d7a-6c1f-4e8b-a3d2-5f7c9e1b4a6d")?,
            "Rohan Gupta",
            "rohan.gupta@example.com",
            "12",
            "competitive",
        ),
    ];

    for (id, name, email, grade, exam_type) in students {
        sqlx::query(
            r#"
            INSERT INTO confidence_coach.students (id, name, email, grade, exam_type)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET name = EXCLUDED.name, grade = EXCLUDED.grade, exam_type = EXCLUDED.exam_type
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(grade)
        .bind(exam_type)
        .execute(pool)
        .await?;
    }

    let topics = vec![
        (1i64, "Algebra", "Mathematics", "medium"),
        (2, "Geometry", "Mathematics", "medium"),
        (3, "Trigonometry", "Mathematics", "hard"),
        (4, "Mechanics", "Physics", "hard"),
        (5, "Optics", "Physics", "easy"),
        (6, "Organic Chemistry", "Chemistry", "hard"),
    ];

    for (id, name, subject, difficulty) in topics {
        sqlx::query(
            r#"
            INSERT INTO confidence_coach.topics (id, name, subject, difficulty)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, subject = EXCLUDED.subject, difficulty = EXCLUDED.difficulty
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(subject)
        .bind(difficulty)
        .execute(pool)
        .await?;
    }

    // A month of sessions for the first student: a slow climb with one rough
    // patch, spread over distinct days so every detector has something to see.
    let sessions: Vec<(&str, i64, i64, f64, i32)> = vec![
        ("seed-001", 1, 21, 48.0, 30),
        ("seed-002", 1, 18, 55.0, 25),
        ("seed-003", 2, 15, 62.0, 35),
        ("seed-004", 2, 12, 60.0, 40),
        ("seed-005", 3, 9, 38.0, 50),
        ("seed-006", 1, 6, 65.0, 25),
        ("seed-007", 2, 4, 70.0, 30),
        ("seed-008", 3, 2, 74.0, 30),
        ("seed-009", 1, 1, 78.0, 20),
    ];

    let student_id: Uuid =
        sqlx::query("SELECT id FROM confidence_coach.students WHERE email = $1")
            .bind("meera.iyer@example.com")
            .fetch_one(pool)
            .await?
            .get("id");

    for (source_key, topic_id, days_ago, score, time_spent) in sessions {
        sqlx::query(
            r#"
            INSERT INTO confidence_coach.performance_records
            (id, student_id, topic_id, recorded_at, score, time_spent, mistakes, completed, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, NULL, TRUE, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(topic_id)
        .bind(Utc::now() - Duration::days(days_ago))
        .bind(score)
        .bind(time_spent)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}
