use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Locale, LocalizedText};

/// Course as stored in the MongoDB "courses" collection. Units, lessons and
/// quizzes are embedded in declared order; the whole document is
/// admin-authored and read-only for this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub slug: String,
    pub title: LocalizedText,
    pub description: LocalizedText,
    #[serde(default)]
    pub units: Vec<UnitRecord>,
    #[serde(default)]
    pub published: bool,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitRecord {
    pub id: String,
    pub order: u32,
    pub title: LocalizedText,
    #[serde(default)]
    pub lessons: Vec<LessonRecord>,
    #[serde(default)]
    pub quiz: Option<QuizRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonKind {
    Video,
    Pdf,
    Article,
}

impl LessonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonKind::Video => "video",
            LessonKind::Pdf => "pdf",
            LessonKind::Article => "article",
        }
    }
}

/// One piece of course content. The kind determines which content field is
/// populated; the others stay empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonRecord {
    pub id: String,
    pub order: u32,
    pub title: LocalizedText,
    pub kind: LessonKind,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub is_free: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRecord {
    pub id: String,
    pub passing_score: u32,
    #[serde(default)]
    pub questions: Vec<QuizQuestionRecord>,
}

impl QuizRecord {
    /// Correct option index per question, in question order.
    pub fn answer_key(&self) -> Vec<usize> {
        self.questions.iter().map(|q| q.correct_index).collect()
    }
}

/// Invariant: 0 <= correct_index < options.len(), 2 to 4 options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestionRecord {
    pub id: String,
    pub text: LocalizedText,
    pub options: Vec<LocalizedText>,
    pub correct_index: usize,
}

impl CourseDocument {
    /// Lessons of the whole course in declared order: units by their order
    /// field, lessons by theirs. Order values are append-only in practice but
    /// sorted here anyway so a gap or reorder upstream cannot change the
    /// resume semantics.
    pub fn lessons_in_order(&self) -> Vec<&LessonRecord> {
        let mut units: Vec<&UnitRecord> = self.units.iter().collect();
        units.sort_by_key(|u| u.order);

        let mut lessons = Vec::new();
        for unit in units {
            let mut in_unit: Vec<&LessonRecord> = unit.lessons.iter().collect();
            in_unit.sort_by_key(|l| l.order);
            lessons.extend(in_unit);
        }
        lessons
    }

    pub fn lesson_count(&self) -> usize {
        self.units.iter().map(|u| u.lessons.len()).sum()
    }

    pub fn total_duration_minutes(&self) -> u32 {
        self.units
            .iter()
            .flat_map(|u| u.lessons.iter())
            .map(|l| l.duration_minutes)
            .sum()
    }

    pub fn find_lesson(&self, lesson_id: &str) -> Option<&LessonRecord> {
        self.units
            .iter()
            .flat_map(|u| u.lessons.iter())
            .find(|l| l.id == lesson_id)
    }

    pub fn find_quiz(&self, quiz_id: &str) -> Option<&QuizRecord> {
        self.quizzes().into_iter().find(|q| q.id == quiz_id)
    }

    pub fn quizzes(&self) -> Vec<&QuizRecord> {
        self.units.iter().filter_map(|u| u.quiz.as_ref()).collect()
    }
}

// ---------------------------------------------------------------------------
// Localized views returned over HTTP. Quiz answer keys never appear here and
// paid lesson content is withheld from callers without an enrollment.
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CourseSummary {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub unit_count: usize,
    pub lesson_count: usize,
    pub total_duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment: Option<EnrollmentBrief>,
}

#[derive(Debug, Serialize)]
pub struct EnrollmentBrief {
    pub enrolled: bool,
    pub progress: i32,
}

impl CourseSummary {
    pub fn from_doc(doc: &CourseDocument, locale: Locale) -> Self {
        Self {
            id: doc.id.clone(),
            slug: doc.slug.clone(),
            title: doc.title.resolve(locale).to_string(),
            description: doc.description.resolve(locale).to_string(),
            unit_count: doc.units.len(),
            lesson_count: doc.lesson_count(),
            total_duration_minutes: doc.total_duration_minutes(),
            enrollment: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CourseDetail {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub units: Vec<UnitView>,
}

#[derive(Debug, Serialize)]
pub struct UnitView {
    pub id: String,
    pub order: u32,
    pub title: String,
    pub lessons: Vec<LessonView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz: Option<QuizView>,
}

#[derive(Debug, Serialize)]
pub struct LessonView {
    pub id: String,
    pub order: u32,
    pub title: String,
    pub kind: LessonKind,
    pub duration_minutes: u32,
    pub is_free: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuizView {
    pub id: String,
    pub passing_score: u32,
    pub questions: Vec<QuizQuestionView>,
}

#[derive(Debug, Serialize)]
pub struct QuizQuestionView {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
}

impl CourseDetail {
    /// Build the outline a learner sees. `enrolled` controls whether content
    /// fields of non-free lessons are included.
    pub fn from_doc(doc: &CourseDocument, locale: Locale, enrolled: bool) -> Self {
        let mut units: Vec<&UnitRecord> = doc.units.iter().collect();
        units.sort_by_key(|u| u.order);

        Self {
            id: doc.id.clone(),
            slug: doc.slug.clone(),
            title: doc.title.resolve(locale).to_string(),
            description: doc.description.resolve(locale).to_string(),
            units: units
                .into_iter()
                .map(|u| UnitView::from_record(u, locale, enrolled))
                .collect(),
        }
    }
}

impl UnitView {
    fn from_record(unit: &UnitRecord, locale: Locale, enrolled: bool) -> Self {
        let mut lessons: Vec<&LessonRecord> = unit.lessons.iter().collect();
        lessons.sort_by_key(|l| l.order);

        Self {
            id: unit.id.clone(),
            order: unit.order,
            title: unit.title.resolve(locale).to_string(),
            lessons: lessons
                .into_iter()
                .map(|l| LessonView::from_record(l, locale, enrolled))
                .collect(),
            quiz: unit
                .quiz
                .as_ref()
                .map(|q| QuizView::from_record(q, locale)),
        }
    }
}

impl LessonView {
    fn from_record(lesson: &LessonRecord, locale: Locale, enrolled: bool) -> Self {
        let accessible = lesson.is_free || enrolled;
        Self {
            id: lesson.id.clone(),
            order: lesson.order,
            title: lesson.title.resolve(locale).to_string(),
            kind: lesson.kind,
            duration_minutes: lesson.duration_minutes,
            is_free: lesson.is_free,
            video_url: lesson.video_url.clone().filter(|_| accessible),
            pdf_url: lesson.pdf_url.clone().filter(|_| accessible),
            body: lesson.body.clone().filter(|_| accessible),
        }
    }
}

impl QuizView {
    fn from_record(quiz: &QuizRecord, locale: Locale) -> Self {
        Self {
            id: quiz.id.clone(),
            passing_score: quiz.passing_score,
            questions: quiz
                .questions
                .iter()
                .map(|q| QuizQuestionView {
                    id: q.id.clone(),
                    text: q.text.resolve(locale).to_string(),
                    options: q
                        .options
                        .iter()
                        .map(|o| o.resolve(locale).to_string())
                        .collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(id: &str, order: u32) -> LessonRecord {
        LessonRecord {
            id: id.to_string(),
            order,
            title: LocalizedText::new(id),
            kind: LessonKind::Article,
            video_url: None,
            pdf_url: None,
            body: Some("نص".to_string()),
            duration_minutes: 5,
            is_free: false,
        }
    }

    fn course() -> CourseDocument {
        CourseDocument {
            id: "course-1".to_string(),
            slug: "intro".to_string(),
            title: LocalizedText::new("مقدمة"),
            description: LocalizedText::new("وصف"),
            units: vec![
                UnitRecord {
                    id: "unit-2".to_string(),
                    order: 2,
                    title: LocalizedText::new("الوحدة الثانية"),
                    lessons: vec![lesson("l3", 1)],
                    quiz: None,
                },
                UnitRecord {
                    id: "unit-1".to_string(),
                    order: 1,
                    title: LocalizedText::new("الوحدة الأولى"),
                    lessons: vec![lesson("l2", 2), lesson("l1", 1)],
                    quiz: None,
                },
            ],
            published: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn lessons_follow_declared_order_not_document_order() {
        let doc = course();
        let ids: Vec<&str> = doc
            .lessons_in_order()
            .iter()
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(ids, vec!["l1", "l2", "l3"]);
    }

    #[test]
    fn detail_withholds_paid_content_for_unenrolled() {
        let doc = course();
        let unenrolled = CourseDetail::from_doc(&doc, Locale::Ar, false);
        assert!(unenrolled.units[0].lessons[0].body.is_none());

        let enrolled = CourseDetail::from_doc(&doc, Locale::Ar, true);
        assert!(enrolled.units[0].lessons[0].body.is_some());
    }
}
