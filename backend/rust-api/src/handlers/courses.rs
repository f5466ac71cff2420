use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    middlewares::auth::JwtClaims,
    models::{
        catalog::{CourseDetail, CourseSummary, EnrollmentBrief},
        Locale,
    },
    services::{progress_service::CourseProgressService, AppState},
};

use super::ApiError;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub locale: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CourseListResponse {
    pub success: bool,
    pub courses: Vec<CourseSummary>,
}

#[derive(Debug, Serialize)]
pub struct CourseDetailResponse {
    pub success: bool,
    pub course: CourseDetail,
}

fn progress_service(state: &Arc<AppState>) -> CourseProgressService {
    CourseProgressService::new(
        state.catalog.clone(),
        state.store.clone(),
        state.config.quizzes_count_toward_progress,
    )
}

/// Published courses, localized. With a bearer token the per-course
/// enrollment state and progress percentage are merged in.
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
    claims: Option<Extension<JwtClaims>>,
) -> Result<Json<CourseListResponse>, ApiError> {
    let locale = Locale::parse(query.locale.as_deref());

    let documents = state
        .catalog
        .list_courses()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to load courses: {}", e)))?;

    let service = claims.as_ref().map(|_| progress_service(&state));

    let mut courses = Vec::with_capacity(documents.len());
    for doc in &documents {
        let mut summary = CourseSummary::from_doc(doc, locale);
        if let (Some(service), Some(Extension(claims))) = (service.as_ref(), claims.as_ref()) {
            let snapshot = service.get_progress(&claims.sub, &doc.id).await?;
            summary.enrollment = Some(EnrollmentBrief {
                enrolled: snapshot.is_enrolled,
                progress: snapshot.progress,
            });
        }
        courses.push(summary);
    }

    Ok(Json(CourseListResponse {
        success: true,
        courses,
    }))
}

/// Full course outline by slug (or id, for older clients that link by id).
/// Content fields of non-free lessons are withheld unless the caller is
/// enrolled; quiz answer keys never leave the server.
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    Path(course_ref): Path<String>,
    Query(query): Query<CatalogQuery>,
    claims: Option<Extension<JwtClaims>>,
) -> Result<Json<CourseDetailResponse>, ApiError> {
    let locale = Locale::parse(query.locale.as_deref());

    let lookup = state
        .catalog
        .course_by_slug(&course_ref)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to load course: {}", e)))?;

    let doc = match lookup {
        Some(doc) => Some(doc),
        None => state
            .catalog
            .course_by_id(&course_ref)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to load course: {}", e)))?,
    };

    let doc = doc.ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    let enrolled = match claims {
        Some(Extension(claims)) => state
            .store
            .find_enrollment(&claims.sub, &doc.id)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to load enrollment: {}", e)))?
            .is_some(),
        None => false,
    };

    Ok(Json(CourseDetailResponse {
        success: true,
        course: CourseDetail::from_doc(&doc, locale, enrolled),
    }))
}
