mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn course_list_is_public_and_arabic_by_default() {
    let app = common::create_test_app();

    let (status, body) = common::send(&app.router, "GET", "/api/v1/courses", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["slug"], "arabic-basics");
    assert_eq!(courses[0]["title"], "أساسيات العربية");
    assert_eq!(courses[0]["lesson_count"], 3);
    assert_eq!(courses[0]["unit_count"], 2);
    // Anonymous callers get no enrollment block.
    assert!(courses[0].get("enrollment").is_none());
}

#[tokio::test]
async fn russian_locale_falls_back_to_arabic_where_untranslated() {
    let app = common::create_test_app();

    let (_, body) =
        common::send(&app.router, "GET", "/api/v1/courses?locale=ru", None, None).await;

    let course = &body["courses"][0];
    assert_eq!(course["title"], "Основы арабского");
    // The seed course has no Russian description.
    assert_eq!(course["description"], "دورة تمهيدية لأعضاء الرابطة");
}

#[tokio::test]
async fn course_list_merges_progress_for_authenticated_members() {
    let app = common::create_test_app();
    let token = common::bearer_token("member-1");

    common::send(
        &app.router,
        "POST",
        "/api/v1/courses/course-1/enroll",
        Some(&token),
        None,
    )
    .await;
    common::send(
        &app.router,
        "POST",
        "/api/v1/lessons/lesson-1/complete",
        Some(&token),
        Some(json!({})),
    )
    .await;

    let (_, body) = common::send(&app.router, "GET", "/api/v1/courses", Some(&token), None).await;

    let enrollment = &body["courses"][0]["enrollment"];
    assert_eq!(enrollment["enrolled"], true);
    assert_eq!(enrollment["progress"], 33);
}

#[tokio::test]
async fn course_detail_withholds_paid_content_and_answer_keys() {
    let app = common::create_test_app();

    let (status, body) = common::send(
        &app.router,
        "GET",
        "/api/v1/courses/arabic-basics",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let units = body["course"]["units"].as_array().unwrap();

    // lesson-1 is free: its video URL is visible to anyone.
    let lesson_1 = &units[0]["lessons"][0];
    assert_eq!(lesson_1["is_free"], true);
    assert!(lesson_1["video_url"].is_string());

    // lesson-2 is not free: the content field is withheld.
    let lesson_2 = &units[0]["lessons"][1];
    assert_eq!(lesson_2["is_free"], false);
    assert!(lesson_2.get("pdf_url").is_none());

    // Quiz questions are serialized without the answer key.
    let quiz = &units[1]["quiz"];
    assert_eq!(quiz["passing_score"], 70);
    let question = &quiz["questions"][0];
    assert!(question.get("correct_index").is_none());
    assert_eq!(question["options"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn enrolled_member_sees_paid_lesson_content() {
    let app = common::create_test_app();
    let token = common::bearer_token("member-2");

    common::send(
        &app.router,
        "POST",
        "/api/v1/courses/course-1/enroll",
        Some(&token),
        None,
    )
    .await;

    let (_, body) = common::send(
        &app.router,
        "GET",
        "/api/v1/courses/arabic-basics",
        Some(&token),
        None,
    )
    .await;

    let lesson_2 = &body["course"]["units"][0]["lessons"][1];
    assert!(lesson_2["pdf_url"].is_string());
}

#[tokio::test]
async fn course_detail_resolves_by_id_as_well_as_slug() {
    let app = common::create_test_app();

    let (status, body) =
        common::send(&app.router, "GET", "/api/v1/courses/course-1", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["course"]["slug"], "arabic-basics");
}

#[tokio::test]
async fn unknown_course_detail_is_not_found() {
    let app = common::create_test_app();

    let (status, body) =
        common::send(&app.router, "GET", "/api/v1/courses/no-such", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn health_endpoint_reports_dependencies() {
    let app = common::create_test_app();

    let (status, body) = common::send(&app.router, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "rabita-api");
    assert_eq!(body["dependencies"]["catalog"]["status"], "healthy");
    assert_eq!(body["dependencies"]["store"]["status"], "healthy");
}

#[tokio::test]
async fn metrics_endpoint_requires_basic_auth() {
    let app = common::create_test_app();

    let (status, _) = common::send(&app.router, "GET", "/metrics", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
