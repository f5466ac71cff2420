use std::collections::HashSet;
use std::sync::Arc;

use crate::metrics::{ENROLLMENTS_TOTAL, LESSONS_COMPLETED_TOTAL, QUIZ_ATTEMPTS_TOTAL};
use crate::models::catalog::CourseDocument;
use crate::models::progress::{Enrollment, LessonProgress, ProgressSnapshot, QuizAttempt};
use crate::services::catalog::CourseCatalog;
use crate::services::error::LearningError;
use crate::services::grading::{grade_quiz, progress_percent, QuizGrade};
use crate::services::store::EnrollmentStore;

/// Orchestrates enrollment, lesson completion and quiz grading on top of the
/// read-only catalog and the enrollment store. One instance per request is
/// cheap; it owns nothing but the two shared handles and the policy flag.
pub struct CourseProgressService {
    catalog: Arc<dyn CourseCatalog>,
    store: Arc<dyn EnrollmentStore>,
    /// Whether a passed unit quiz counts as one completed item in the course
    /// percentage. The original product never settled this; it is a
    /// deployment policy here, off by default.
    quizzes_count_toward_progress: bool,
}

#[derive(Debug)]
pub struct EnrollOutcome {
    pub enrollment: Enrollment,
    pub already_enrolled: bool,
    pub progress: ProgressSnapshot,
}

impl CourseProgressService {
    pub fn new(
        catalog: Arc<dyn CourseCatalog>,
        store: Arc<dyn EnrollmentStore>,
        quizzes_count_toward_progress: bool,
    ) -> Self {
        Self {
            catalog,
            store,
            quizzes_count_toward_progress,
        }
    }

    /// Enroll the user into a course. Calling this twice for the same pair is
    /// a no-op success returning the same enrollment identity; the race
    /// between two concurrent first calls is settled by the store's
    /// uniqueness constraint.
    pub async fn enroll_in_course(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<EnrollOutcome, LearningError> {
        let course = self
            .catalog
            .course_by_id(course_id)
            .await?
            .ok_or(LearningError::CourseNotFound)?;

        let (enrollment, created) = self
            .store
            .insert_enrollment(Enrollment::new(user_id, &course.id))
            .await?;

        let outcome_label = if created { "new" } else { "existing" };
        ENROLLMENTS_TOTAL.with_label_values(&[outcome_label]).inc();
        tracing::info!(
            "Enrollment for user={} course={}: {}",
            user_id,
            course.id,
            outcome_label
        );

        let progress = self.snapshot(user_id, &course, &enrollment).await?;

        Ok(EnrollOutcome {
            enrollment,
            already_enrolled: !created,
            progress,
        })
    }

    /// Current progress of a user in a course. Never fails for a valid but
    /// unenrolled pair; that reads as the zero-value state.
    pub async fn get_progress(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<ProgressSnapshot, LearningError> {
        let course = self
            .catalog
            .course_by_id(course_id)
            .await?
            .ok_or(LearningError::CourseNotFound)?;

        match self.store.find_enrollment(user_id, &course.id).await? {
            Some(enrollment) => self.snapshot(user_id, &course, &enrollment).await,
            None => Ok(ProgressSnapshot::unenrolled()),
        }
    }

    /// Mark (or un-mark) a lesson complete, then recompute the resume
    /// pointer: the first lesson in declared order — units by their order,
    /// lessons by theirs — with no completion record. Completion time never
    /// participates in the tie-break, so replays land on the same pointer.
    pub async fn complete_lesson(
        &self,
        user_id: &str,
        lesson_id: &str,
        completed: bool,
    ) -> Result<ProgressSnapshot, LearningError> {
        let course = self
            .catalog
            .course_for_lesson(lesson_id)
            .await?
            .ok_or(LearningError::LessonNotFound)?;

        self.store
            .find_enrollment(user_id, &course.id)
            .await?
            .ok_or(LearningError::NotEnrolled)?;

        self.store
            .upsert_lesson_progress(LessonProgress::new(user_id, &course.id, lesson_id, completed))
            .await?;

        LESSONS_COMPLETED_TOTAL
            .with_label_values(&[if completed { "true" } else { "false" }])
            .inc();

        let completed_ids: HashSet<String> = self
            .store
            .completed_lesson_ids(user_id, &course.id)
            .await?
            .into_iter()
            .collect();

        let next = course
            .lessons_in_order()
            .into_iter()
            .find(|lesson| !completed_ids.contains(&lesson.id))
            .map(|lesson| lesson.id.clone());

        self.store
            .set_current_lesson(user_id, &course.id, next.clone())
            .await?;

        tracing::info!(
            "Lesson {} for user={} course={}: completed={}, resume={:?}",
            lesson_id,
            user_id,
            course.id,
            completed,
            next
        );

        self.build_snapshot(&course, completed_ids, next, user_id)
            .await
    }

    /// Grade a submission and append it to the attempt history. A malformed
    /// submission records nothing; passing never back-fills lesson
    /// completion.
    pub async fn submit_quiz_attempt(
        &self,
        user_id: &str,
        quiz_id: &str,
        answers: &[usize],
    ) -> Result<QuizGrade, LearningError> {
        let course = self
            .catalog
            .course_for_quiz(quiz_id)
            .await?
            .ok_or(LearningError::QuizNotFound)?;

        self.store
            .find_enrollment(user_id, &course.id)
            .await?
            .ok_or(LearningError::NotEnrolled)?;

        let quiz = course
            .find_quiz(quiz_id)
            .ok_or(LearningError::QuizNotFound)?;

        let grade = grade_quiz(&quiz.answer_key(), answers, quiz.passing_score)?;

        self.store
            .insert_quiz_attempt(QuizAttempt::new(
                user_id,
                &course.id,
                quiz_id,
                grade.score,
                grade.passed,
            ))
            .await?;

        QUIZ_ATTEMPTS_TOTAL
            .with_label_values(&[if grade.passed { "true" } else { "false" }])
            .inc();
        tracing::info!(
            "Quiz {} attempt for user={}: score={} passed={}",
            quiz_id,
            user_id,
            grade.score,
            grade.passed
        );

        Ok(grade)
    }

    async fn snapshot(
        &self,
        user_id: &str,
        course: &CourseDocument,
        enrollment: &Enrollment,
    ) -> Result<ProgressSnapshot, LearningError> {
        let completed_ids: HashSet<String> = self
            .store
            .completed_lesson_ids(user_id, &course.id)
            .await?
            .into_iter()
            .collect();

        self.build_snapshot(
            course,
            completed_ids,
            enrollment.current_lesson_id.clone(),
            user_id,
        )
        .await
    }

    async fn build_snapshot(
        &self,
        course: &CourseDocument,
        completed_ids: HashSet<String>,
        current_lesson_id: Option<String>,
        user_id: &str,
    ) -> Result<ProgressSnapshot, LearningError> {
        // Keep only lessons that still exist in the course, in declared
        // order, so stale progress rows cannot inflate the percentage.
        let completed_lessons: Vec<String> = course
            .lessons_in_order()
            .into_iter()
            .filter(|lesson| completed_ids.contains(&lesson.id))
            .map(|lesson| lesson.id.clone())
            .collect();

        let mut total = course.lesson_count();
        let mut done = completed_lessons.len();

        if self.quizzes_count_toward_progress {
            let quiz_ids: HashSet<&str> =
                course.quizzes().iter().map(|q| q.id.as_str()).collect();
            total += quiz_ids.len();
            done += self
                .store
                .passed_quiz_ids(user_id, &course.id)
                .await?
                .iter()
                .filter(|id| quiz_ids.contains(id.as_str()))
                .count();
        }

        Ok(ProgressSnapshot {
            is_enrolled: true,
            progress: progress_percent(total, done),
            current_lesson_id,
            completed_lessons,
        })
    }
}
