use thiserror::Error;

/// Typed failures of the learning flow. Everything fails closed: the caller
/// gets one of these and decides whether to retry; nothing is retried here.
#[derive(Debug, Error)]
pub enum LearningError {
    #[error("Course not found")]
    CourseNotFound,

    #[error("Lesson not found")]
    LessonNotFound,

    #[error("Quiz not found")]
    QuizNotFound,

    #[error("Not enrolled in this course")]
    NotEnrolled,

    #[error("Submitted {submitted} answers for a quiz with {expected} questions")]
    MalformedSubmission { expected: usize, submitted: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
