#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use rabita_api::{
    config::Config,
    create_router,
    middlewares::auth::{JwtClaims, JwtService},
    models::catalog::{
        CourseDocument, LessonKind, LessonRecord, QuizQuestionRecord, QuizRecord, UnitRecord,
    },
    models::progress::{Enrollment, LessonProgress, QuizAttempt},
    models::LocalizedText,
    services::{catalog::CourseCatalog, store::EnrollmentStore, AppState},
};

pub const TEST_SECRET: &str = "integration-test-secret";

/// Catalog backed by a fixed set of in-memory course documents, mirroring
/// the lookups the MongoDB implementation performs.
pub struct InMemoryCatalog {
    courses: Vec<CourseDocument>,
}

#[async_trait]
impl CourseCatalog for InMemoryCatalog {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn list_courses(&self) -> Result<Vec<CourseDocument>> {
        Ok(self
            .courses
            .iter()
            .filter(|c| c.published)
            .cloned()
            .collect())
    }

    async fn course_by_id(&self, course_id: &str) -> Result<Option<CourseDocument>> {
        Ok(self
            .courses
            .iter()
            .find(|c| c.published && c.id == course_id)
            .cloned())
    }

    async fn course_by_slug(&self, slug: &str) -> Result<Option<CourseDocument>> {
        Ok(self
            .courses
            .iter()
            .find(|c| c.published && c.slug == slug)
            .cloned())
    }

    async fn course_for_lesson(&self, lesson_id: &str) -> Result<Option<CourseDocument>> {
        Ok(self
            .courses
            .iter()
            .find(|c| c.published && c.find_lesson(lesson_id).is_some())
            .cloned())
    }

    async fn course_for_quiz(&self, quiz_id: &str) -> Result<Option<CourseDocument>> {
        Ok(self
            .courses
            .iter()
            .find(|c| c.published && c.find_quiz(quiz_id).is_some())
            .cloned())
    }
}

/// Store with the same idempotent-insert and upsert semantics the MongoDB
/// implementation derives from its composite `_id`s.
#[derive(Default)]
pub struct InMemoryStore {
    pub enrollments: Mutex<HashMap<String, Enrollment>>,
    pub lesson_progress: Mutex<HashMap<String, LessonProgress>>,
    pub quiz_attempts: Mutex<Vec<QuizAttempt>>,
}

#[async_trait]
impl EnrollmentStore for InMemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_enrollment(&self, enrollment: Enrollment) -> Result<(Enrollment, bool)> {
        let mut rows = self.enrollments.lock().unwrap();
        if let Some(existing) = rows.get(&enrollment.id) {
            return Ok((existing.clone(), false));
        }
        rows.insert(enrollment.id.clone(), enrollment.clone());
        Ok((enrollment, true))
    }

    async fn find_enrollment(&self, user_id: &str, course_id: &str) -> Result<Option<Enrollment>> {
        Ok(self
            .enrollments
            .lock()
            .unwrap()
            .get(&Enrollment::key(user_id, course_id))
            .cloned())
    }

    async fn set_current_lesson(
        &self,
        user_id: &str,
        course_id: &str,
        lesson_id: Option<String>,
    ) -> Result<()> {
        if let Some(row) = self
            .enrollments
            .lock()
            .unwrap()
            .get_mut(&Enrollment::key(user_id, course_id))
        {
            row.current_lesson_id = lesson_id;
        }
        Ok(())
    }

    async fn upsert_lesson_progress(&self, progress: LessonProgress) -> Result<()> {
        self.lesson_progress
            .lock()
            .unwrap()
            .insert(progress.id.clone(), progress);
        Ok(())
    }

    async fn completed_lesson_ids(&self, user_id: &str, course_id: &str) -> Result<Vec<String>> {
        Ok(self
            .lesson_progress
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.user_id == user_id && p.course_id == course_id && p.completed)
            .map(|p| p.lesson_id.clone())
            .collect())
    }

    async fn insert_quiz_attempt(&self, attempt: QuizAttempt) -> Result<()> {
        self.quiz_attempts.lock().unwrap().push(attempt);
        Ok(())
    }

    async fn passed_quiz_ids(&self, user_id: &str, course_id: &str) -> Result<Vec<String>> {
        let ids: HashSet<String> = self
            .quiz_attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.user_id == user_id && a.course_id == course_id && a.passed)
            .map(|a| a.quiz_id.clone())
            .collect();
        Ok(ids.into_iter().collect())
    }
}

fn lesson(id: &str, order: u32, kind: LessonKind, is_free: bool) -> LessonRecord {
    LessonRecord {
        id: id.to_string(),
        order,
        title: LocalizedText::bilingual(format!("درس {}", id), format!("Урок {}", id)),
        kind,
        video_url: matches!(kind, LessonKind::Video)
            .then(|| format!("https://media.example/{}.mp4", id)),
        pdf_url: matches!(kind, LessonKind::Pdf)
            .then(|| format!("https://media.example/{}.pdf", id)),
        body: matches!(kind, LessonKind::Article).then(|| "نص المقال".to_string()),
        duration_minutes: 10,
        is_free,
    }
}

/// One published course: two units, three lessons, a four-question quiz on
/// the second unit (answer key [0, 1, 2, 0], passing score 70). The Russian
/// description is deliberately missing so localization falls back to Arabic.
pub fn seed_course() -> CourseDocument {
    CourseDocument {
        id: "course-1".to_string(),
        slug: "arabic-basics".to_string(),
        title: LocalizedText::bilingual("أساسيات العربية", "Основы арабского"),
        description: LocalizedText::new("دورة تمهيدية لأعضاء الرابطة"),
        units: vec![
            UnitRecord {
                id: "unit-1".to_string(),
                order: 1,
                title: LocalizedText::bilingual("الوحدة الأولى", "Первый раздел"),
                lessons: vec![
                    lesson("lesson-1", 1, LessonKind::Video, true),
                    lesson("lesson-2", 2, LessonKind::Pdf, false),
                ],
                quiz: None,
            },
            UnitRecord {
                id: "unit-2".to_string(),
                order: 2,
                title: LocalizedText::bilingual("الوحدة الثانية", "Второй раздел"),
                lessons: vec![lesson("lesson-3", 1, LessonKind::Article, false)],
                quiz: Some(QuizRecord {
                    id: "quiz-1".to_string(),
                    passing_score: 70,
                    questions: (0..4)
                        .map(|i| QuizQuestionRecord {
                            id: format!("question-{}", i),
                            text: LocalizedText::bilingual(
                                format!("سؤال {}", i),
                                format!("Вопрос {}", i),
                            ),
                            options: vec![
                                LocalizedText::new("أ"),
                                LocalizedText::new("ب"),
                                LocalizedText::new("ج"),
                            ],
                            correct_index: i % 3,
                        })
                        .collect(),
                }),
            },
        ],
        published: true,
        created_at: Utc::now(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
}

pub fn create_test_app() -> TestApp {
    create_test_app_with_policy(false)
}

pub fn create_test_app_with_policy(quizzes_count_toward_progress: bool) -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let config = Config {
        listen_addr: "127.0.0.1:0".to_string(),
        mongo_uri: String::new(),
        mongo_database: String::new(),
        jwt_secret: TEST_SECRET.to_string(),
        quizzes_count_toward_progress,
    };

    let catalog = Arc::new(InMemoryCatalog {
        courses: vec![seed_course()],
    });
    let store = Arc::new(InMemoryStore::default());

    let app_state = Arc::new(AppState::new(config, catalog, store.clone()));

    TestApp {
        router: create_router(app_state),
        store,
    }
}

pub fn bearer_token(user_id: &str) -> String {
    let claims = JwtClaims {
        sub: user_id.to_string(),
        role: "member".to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
        iat: Utc::now().timestamp() as usize,
    };
    JwtService::new(TEST_SECRET)
        .generate_token(claims)
        .expect("Failed to mint test token")
}

/// Fire one request at the router and parse the JSON response (Null when the
/// body is empty or not JSON).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
