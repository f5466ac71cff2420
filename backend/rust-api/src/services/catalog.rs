use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{FindOptions, IndexOptions},
    Database, IndexModel,
};

use crate::models::catalog::CourseDocument;

/// Read-only view of the admin-authored course content. The learning flow
/// only needs structure and ordering from it; all mutation happens through
/// the admin back office, which is not part of this service.
#[async_trait]
pub trait CourseCatalog: Send + Sync {
    async fn ping(&self) -> Result<()>;

    /// Published courses, newest first.
    async fn list_courses(&self) -> Result<Vec<CourseDocument>>;

    async fn course_by_id(&self, course_id: &str) -> Result<Option<CourseDocument>>;

    async fn course_by_slug(&self, slug: &str) -> Result<Option<CourseDocument>>;

    /// The published course containing the given lesson, if any.
    async fn course_for_lesson(&self, lesson_id: &str) -> Result<Option<CourseDocument>>;

    /// The published course containing the given unit quiz, if any.
    async fn course_for_quiz(&self, quiz_id: &str) -> Result<Option<CourseDocument>>;
}

const COURSES_COLLECTION: &str = "courses";
const LIST_LIMIT: i64 = 200;

pub struct MongoCourseCatalog {
    mongo: Database,
}

impl MongoCourseCatalog {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn collection(&self) -> mongodb::Collection<CourseDocument> {
        self.mongo.collection(COURSES_COLLECTION)
    }

    /// Slugs are the public identity of a course; keep them unique at the
    /// store layer.
    pub async fn ensure_indexes(&self) -> Result<()> {
        self.collection()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "slug": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await
            .context("Failed to create slug index on courses")?;
        Ok(())
    }

    async fn find_one_published(
        &self,
        filter: mongodb::bson::Document,
    ) -> Result<Option<CourseDocument>> {
        let mut filter = filter;
        filter.insert("published", true);
        self.collection()
            .find_one(filter)
            .await
            .context("Failed to query courses collection")
    }
}

#[async_trait]
impl CourseCatalog for MongoCourseCatalog {
    async fn ping(&self) -> Result<()> {
        self.mongo
            .run_command(doc! { "ping": 1 })
            .await
            .context("MongoDB ping failed")?;
        Ok(())
    }

    async fn list_courses(&self) -> Result<Vec<CourseDocument>> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .limit(LIST_LIMIT)
            .build();

        let mut cursor = self
            .collection()
            .find(doc! { "published": true })
            .with_options(options)
            .await
            .context("Failed to query courses collection")?;

        let mut courses = Vec::new();
        while let Some(course) = cursor.try_next().await.context("Course cursor error")? {
            courses.push(course);
        }
        Ok(courses)
    }

    async fn course_by_id(&self, course_id: &str) -> Result<Option<CourseDocument>> {
        self.find_one_published(doc! { "_id": course_id }).await
    }

    async fn course_by_slug(&self, slug: &str) -> Result<Option<CourseDocument>> {
        self.find_one_published(doc! { "slug": slug }).await
    }

    async fn course_for_lesson(&self, lesson_id: &str) -> Result<Option<CourseDocument>> {
        self.find_one_published(doc! { "units.lessons.id": lesson_id })
            .await
    }

    async fn course_for_quiz(&self, quiz_id: &str) -> Result<Option<CourseDocument>> {
        self.find_one_published(doc! { "units.quiz.id": quiz_id })
            .await
    }
}
