use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::AppJson,
    middlewares::auth::JwtClaims,
    models::progress::{
        CompleteLessonRequest, CompleteLessonResponse, CourseProgressResponse, EnrollResponse,
        QuizAttemptResponse, SubmitQuizAttemptRequest,
    },
    services::{progress_service::CourseProgressService, AppState},
};

use super::ApiError;

fn progress_service(state: &Arc<AppState>) -> CourseProgressService {
    CourseProgressService::new(
        state.catalog.clone(),
        state.store.clone(),
        state.config.quizzes_count_toward_progress,
    )
}

/// POST /courses/{course_id}/enroll — idempotent; re-enrolling answers 200
/// with the existing enrollment identity.
pub async fn enroll(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(course_id): Path<String>,
) -> Result<Json<EnrollResponse>, ApiError> {
    let outcome = progress_service(&state)
        .enroll_in_course(&claims.sub, &course_id)
        .await?;

    Ok(Json(EnrollResponse {
        success: true,
        enrollment_id: outcome.enrollment.id,
        already_enrolled: outcome.already_enrolled,
        progress: outcome.progress,
    }))
}

/// GET /courses/{course_id}/progress — zero-value state for valid but
/// unenrolled pairs, never an error.
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseProgressResponse>, ApiError> {
    let snapshot = progress_service(&state)
        .get_progress(&claims.sub, &course_id)
        .await?;

    Ok(Json(CourseProgressResponse {
        success: true,
        progress: snapshot,
    }))
}

/// POST /lessons/{lesson_id}/complete — marks (or un-marks) the lesson and
/// returns the recomputed snapshot with the new resume pointer.
pub async fn complete_lesson(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(lesson_id): Path<String>,
    AppJson(payload): AppJson<CompleteLessonRequest>,
) -> Result<Json<CompleteLessonResponse>, ApiError> {
    let snapshot = progress_service(&state)
        .complete_lesson(&claims.sub, &lesson_id, payload.completed)
        .await?;

    Ok(Json(CompleteLessonResponse {
        success: true,
        progress: snapshot,
    }))
}

/// POST /quizzes/{quiz_id}/attempts — grades the submission and appends it
/// to the attempt history. Malformed submissions record nothing.
pub async fn submit_quiz_attempt(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(quiz_id): Path<String>,
    AppJson(payload): AppJson<SubmitQuizAttemptRequest>,
) -> Result<Json<QuizAttemptResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let grade = progress_service(&state)
        .submit_quiz_attempt(&claims.sub, &quiz_id, &payload.answers)
        .await?;

    Ok(Json(QuizAttemptResponse {
        success: true,
        score: grade.score,
        passed: grade.passed,
    }))
}
