use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson},
    options::IndexOptions,
    Database, IndexModel,
};
use std::collections::HashSet;

use crate::metrics::track_db_operation;
use crate::models::progress::{Enrollment, LessonProgress, QuizAttempt};

/// Persistence of learner-authored facts: enrollments, per-lesson completion
/// and quiz attempt history. All mutation goes through single-row atomic
/// upserts; no multi-row transactions are needed for the invariants here.
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    async fn ping(&self) -> Result<()>;

    /// Insert an enrollment. Idempotent: when the (user, course) pair already
    /// exists the stored row is returned and `created` is false. Concurrent
    /// duplicate inserts are resolved by the store's uniqueness constraint,
    /// never by application-level locking.
    async fn insert_enrollment(&self, enrollment: Enrollment) -> Result<(Enrollment, bool)>;

    async fn find_enrollment(&self, user_id: &str, course_id: &str) -> Result<Option<Enrollment>>;

    /// Move (or clear) the resume pointer of an existing enrollment.
    async fn set_current_lesson(
        &self,
        user_id: &str,
        course_id: &str,
        lesson_id: Option<String>,
    ) -> Result<()>;

    async fn upsert_lesson_progress(&self, progress: LessonProgress) -> Result<()>;

    async fn completed_lesson_ids(&self, user_id: &str, course_id: &str) -> Result<Vec<String>>;

    /// Append one attempt. History is preserved; prior attempts are never
    /// overwritten.
    async fn insert_quiz_attempt(&self, attempt: QuizAttempt) -> Result<()>;

    /// Distinct quiz ids with at least one passing attempt for the pair.
    async fn passed_quiz_ids(&self, user_id: &str, course_id: &str) -> Result<Vec<String>>;
}

const ENROLLMENTS: &str = "enrollments";
const LESSON_PROGRESS: &str = "lesson_progress";
const QUIZ_ATTEMPTS: &str = "quiz_attempts";

pub struct MongoEnrollmentStore {
    mongo: Database,
}

impl MongoEnrollmentStore {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Uniqueness of (user, course) and (user, lesson) rides on the composite
    /// `_id` of the documents; the secondary indexes here only serve the
    /// per-course progress queries.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let by_user_course = |name: &str| {
            IndexModel::builder()
                .keys(doc! { "user_id": 1, "course_id": 1 })
                .options(IndexOptions::builder().name(name.to_string()).build())
                .build()
        };

        self.mongo
            .collection::<LessonProgress>(LESSON_PROGRESS)
            .create_index(by_user_course("lesson_progress_user_course"))
            .await
            .context("Failed to create lesson_progress index")?;

        self.mongo
            .collection::<QuizAttempt>(QUIZ_ATTEMPTS)
            .create_index(by_user_course("quiz_attempts_user_course"))
            .await
            .context("Failed to create quiz_attempts index")?;

        Ok(())
    }

    fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
        if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(ref we)) =
            *error.kind
        {
            return we.code == 11000;
        }
        false
    }
}

#[async_trait]
impl EnrollmentStore for MongoEnrollmentStore {
    async fn ping(&self) -> Result<()> {
        self.mongo
            .run_command(doc! { "ping": 1 })
            .await
            .context("MongoDB ping failed")?;
        Ok(())
    }

    async fn insert_enrollment(&self, enrollment: Enrollment) -> Result<(Enrollment, bool)> {
        let collection = self.mongo.collection::<Enrollment>(ENROLLMENTS);

        let inserted = track_db_operation("insert", ENROLLMENTS, async {
            match collection.insert_one(&enrollment).await {
                Ok(_) => Ok(true),
                // Duplicate key on the composite _id: someone (possibly a
                // concurrent request) enrolled first. Treated as success.
                Err(ref e) if Self::is_duplicate_key(e) => Ok(false),
                Err(e) => Err(anyhow::anyhow!(e)).context("Failed to insert enrollment"),
            }
        })
        .await?;

        if inserted {
            return Ok((enrollment, true));
        }

        let existing = collection
            .find_one(doc! { "_id": &enrollment.id })
            .await
            .context("Failed to load existing enrollment")?
            .context("Enrollment vanished after duplicate-key insert")?;
        Ok((existing, false))
    }

    async fn find_enrollment(&self, user_id: &str, course_id: &str) -> Result<Option<Enrollment>> {
        self.mongo
            .collection::<Enrollment>(ENROLLMENTS)
            .find_one(doc! { "_id": Enrollment::key(user_id, course_id) })
            .await
            .context("Failed to query enrollments")
    }

    async fn set_current_lesson(
        &self,
        user_id: &str,
        course_id: &str,
        lesson_id: Option<String>,
    ) -> Result<()> {
        let lesson = to_bson(&lesson_id).context("Failed to encode lesson id")?;
        track_db_operation("update", ENROLLMENTS, async {
            self.mongo
                .collection::<Enrollment>(ENROLLMENTS)
                .update_one(
                    doc! { "_id": Enrollment::key(user_id, course_id) },
                    doc! { "$set": { "current_lesson_id": lesson } },
                )
                .await
                .context("Failed to update resume pointer")?;
            Ok(())
        })
        .await
    }

    async fn upsert_lesson_progress(&self, progress: LessonProgress) -> Result<()> {
        track_db_operation("upsert", LESSON_PROGRESS, async {
            self.mongo
                .collection::<LessonProgress>(LESSON_PROGRESS)
                .replace_one(doc! { "_id": &progress.id }, &progress)
                .with_options(
                    mongodb::options::ReplaceOptions::builder()
                        .upsert(true)
                        .build(),
                )
                .await
                .context("Failed to upsert lesson progress")?;
            Ok(())
        })
        .await
    }

    async fn completed_lesson_ids(&self, user_id: &str, course_id: &str) -> Result<Vec<String>> {
        let mut cursor = self
            .mongo
            .collection::<LessonProgress>(LESSON_PROGRESS)
            .find(doc! { "user_id": user_id, "course_id": course_id, "completed": true })
            .await
            .context("Failed to query lesson progress")?;

        let mut ids = Vec::new();
        while let Some(row) = cursor
            .try_next()
            .await
            .context("Lesson progress cursor error")?
        {
            ids.push(row.lesson_id);
        }
        Ok(ids)
    }

    async fn insert_quiz_attempt(&self, attempt: QuizAttempt) -> Result<()> {
        track_db_operation("insert", QUIZ_ATTEMPTS, async {
            self.mongo
                .collection::<QuizAttempt>(QUIZ_ATTEMPTS)
                .insert_one(&attempt)
                .await
                .context("Failed to insert quiz attempt")?;
            Ok(())
        })
        .await
    }

    async fn passed_quiz_ids(&self, user_id: &str, course_id: &str) -> Result<Vec<String>> {
        let mut cursor = self
            .mongo
            .collection::<QuizAttempt>(QUIZ_ATTEMPTS)
            .find(doc! { "user_id": user_id, "course_id": course_id, "passed": true })
            .await
            .context("Failed to query quiz attempts")?;

        let mut ids = HashSet::new();
        while let Some(attempt) = cursor
            .try_next()
            .await
            .context("Quiz attempt cursor error")?
        {
            ids.insert(attempt.quiz_id);
        }
        Ok(ids.into_iter().collect())
    }
}
