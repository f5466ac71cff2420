use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Enrollment of one user into one course. The composite `_id` makes the
/// (user, course) pair unique at the store layer, so two concurrent enroll
/// calls cannot produce two rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub current_lesson_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Enrollment {
    pub fn new(user_id: &str, course_id: &str) -> Self {
        Self {
            id: Self::key(user_id, course_id),
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            current_lesson_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn key(user_id: &str, course_id: &str) -> String {
        format!("{}:{}", user_id, course_id)
    }
}

/// Per-lesson completion fact, upserted under a composite `_id` so repeated
/// completions of the same lesson stay a single row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonProgress {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub lesson_id: String,
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}

impl LessonProgress {
    pub fn new(user_id: &str, course_id: &str, lesson_id: &str, completed: bool) -> Self {
        Self {
            id: Self::key(user_id, lesson_id),
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            lesson_id: lesson_id.to_string(),
            completed,
            updated_at: Utc::now(),
        }
    }

    pub fn key(user_id: &str, lesson_id: &str) -> String {
        format!("{}:{}", user_id, lesson_id)
    }
}

/// One graded quiz submission. Attempts are append-only; the effective
/// "quiz passed" state is any attempt with passed = true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub quiz_id: String,
    pub score: u32,
    pub passed: bool,
    pub created_at: DateTime<Utc>,
}

impl QuizAttempt {
    pub fn new(user_id: &str, course_id: &str, quiz_id: &str, score: u32, passed: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            quiz_id: quiz_id.to_string(),
            score,
            passed,
            created_at: Utc::now(),
        }
    }
}

/// Derived progress state for one (user, course) pair. Never stored;
/// recomputed from the facts above on every read.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    pub is_enrolled: bool,
    pub progress: i32,
    pub current_lesson_id: Option<String>,
    pub completed_lessons: Vec<String>,
}

impl ProgressSnapshot {
    /// State reported for a valid but unenrolled (user, course) pair.
    pub fn unenrolled() -> Self {
        Self {
            is_enrolled: false,
            progress: 0,
            current_lesson_id: None,
            completed_lessons: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP request/response payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CompleteLessonRequest {
    /// false un-marks a previously completed lesson.
    #[serde(default = "default_completed")]
    pub completed: bool,
}

fn default_completed() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitQuizAttemptRequest {
    /// Chosen option index per question, in question order.
    #[validate(length(max = 100, message = "Too many answers"))]
    pub answers: Vec<usize>,
}

#[derive(Debug, Serialize)]
pub struct EnrollResponse {
    pub success: bool,
    pub enrollment_id: String,
    pub already_enrolled: bool,
    #[serde(flatten)]
    pub progress: ProgressSnapshot,
}

#[derive(Debug, Serialize)]
pub struct CourseProgressResponse {
    pub success: bool,
    #[serde(flatten)]
    pub progress: ProgressSnapshot,
}

#[derive(Debug, Serialize)]
pub struct CompleteLessonResponse {
    pub success: bool,
    #[serde(flatten)]
    pub progress: ProgressSnapshot,
}

#[derive(Debug, Serialize)]
pub struct QuizAttemptResponse {
    pub success: bool,
    pub score: u32,
    pub passed: bool,
}
