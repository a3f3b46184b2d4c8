//! Integration tests for the exercise admin backend.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::db::{init_database, Repository};
use crate::models::fixtures::{exercise_json, VALID_VARIANTS};
use crate::models::{ExercisePart, ExerciseType};
use crate::{create_router, AppState};

const ADMIN_CODE: &str = "admin123";
const STUDENT_CODE: &str = "user123";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    repo: Arc<Repository>,
    temp_dir: TempDir,
}

impl TestFixture {
    /// A server whose store has been seeded with the default users and settings.
    async fn new() -> Self {
        let fixture = Self::empty().await;
        fixture.repo.initialize_users().await.unwrap();
        fixture.repo.initialize_settings().await.unwrap();
        fixture
    }

    /// A server on an empty store.
    async fn empty() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        let state = AppState { repo: repo.clone() };
        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestFixture {
            client: Client::new(),
            base_url,
            repo,
            temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn create_as_admin(&self, body: &Value) -> Value {
        let resp = self
            .client
            .post(self.url("/api/exercises"))
            .header("x-access-code", ADMIN_CODE)
            .json(body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        resp.json().await.unwrap()
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_initialize_endpoint_is_idempotent() {
    let fixture = TestFixture::empty().await;

    let first: Value = fixture
        .client
        .post(fixture.url("/api/initialize"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["success"], true);
    assert_eq!(first["data"]["usersSeeded"], true);
    assert_eq!(first["data"]["settingsSeeded"], true);

    let second: Value = fixture
        .client
        .post(fixture.url("/api/initialize"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["data"]["usersSeeded"], false);
    assert_eq!(second["data"]["settingsSeeded"], false);

    for code in ["admin123", "mod123", "user123", "demo123"] {
        assert_eq!(fixture.repo.find_users_by_code(code).await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn test_privileged_routes_require_access_code() {
    let fixture = TestFixture::new().await;
    let body = exercise_json(ExerciseType::Writing, ExercisePart::Part1);

    // No code
    let resp = fixture
        .client
        .post(fixture.url("/api/exercises"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["success"], false);
    assert_eq!(err["error"]["code"], "UNAUTHORIZED");

    // Unknown code
    let resp = fixture
        .client
        .post(fixture.url("/api/exercises"))
        .header("x-access-code", "wrong-code")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Known, but not an admin
    let resp = fixture
        .client
        .delete(fixture.url("/api/exercises/anything"))
        .header("x-access-code", STUDENT_CODE)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"]["code"], "FORBIDDEN");

    // Bearer form is accepted
    let resp = fixture
        .client
        .post(fixture.url("/api/exercises"))
        .bearer_auth(ADMIN_CODE)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_check_admin() {
    let fixture = TestFixture::new().await;

    let admin: Value = fixture
        .client
        .get(fixture.url("/api/check-admin"))
        .header("x-access-code", ADMIN_CODE)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(admin["data"]["isAdmin"], true);

    let student: Value = fixture
        .client
        .get(fixture.url("/api/check-admin"))
        .header("x-access-code", STUDENT_CODE)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(student["data"]["isAdmin"], false);

    let anonymous: Value = fixture
        .client
        .get(fixture.url("/api/check-admin"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(anonymous["data"]["isAdmin"], false);
}

#[tokio::test]
async fn test_ambiguous_admin_code_is_refused() {
    let fixture = TestFixture::new().await;

    // A second user sharing the admin code, inserted behind the API's back
    insert_duplicate_admin(&fixture).await;

    let status: Value = fixture
        .client
        .get(fixture.url("/api/check-admin"))
        .header("x-access-code", ADMIN_CODE)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["data"]["isAdmin"], false);

    let resp = fixture
        .client
        .delete(fixture.url("/api/exercises/anything"))
        .header("x-access-code", ADMIN_CODE)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // Login keeps first-match semantics
    let login: Value = fixture
        .client
        .post(fixture.url("/api/login"))
        .json(&json!({ "code": ADMIN_CODE }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(login["data"]["name"], "Admin User");
}

async fn insert_duplicate_admin(fixture: &TestFixture) {
    let db_path = fixture.temp_dir.path().join("test.sqlite");
    let pool = init_database(&db_path).await.unwrap();
    sqlx::query(
        "INSERT INTO documents (collection, id, data, created_at, updated_at) VALUES ('users', 'dup', ?, '', '')",
    )
    .bind(
        json!({
            "name": "Impostor",
            "code": ADMIN_CODE,
            "isAdmin": false,
            "isModerator": false,
            "isDemo": false,
            "role": "Student"
        })
        .to_string(),
    )
    .execute(&pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_exercise_crud() {
    let fixture = TestFixture::new().await;

    // Create
    let create_body = fixture
        .create_as_admin(&exercise_json(ExerciseType::Reading, ExercisePart::Part2))
        .await;
    assert_eq!(create_body["success"], true);
    let exercise_id = create_body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(create_body["data"]["type"], "reading");
    assert_eq!(create_body["data"]["part"], "part2");

    // Get
    let get_resp = fixture
        .client
        .get(fixture.url(&format!("/api/exercises/{}", exercise_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_resp.status(), 200);
    let get_body: Value = get_resp.json().await.unwrap();
    assert_eq!(get_body["data"], create_body["data"]);

    // Update one field
    let update_resp = fixture
        .client
        .patch(fixture.url(&format!("/api/exercises/{}", exercise_id)))
        .header("x-access-code", ADMIN_CODE)
        .json(&json!({ "title": "Brief an Anna" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);
    let update_body: Value = update_resp.json().await.unwrap();
    assert_eq!(update_body["data"]["title"], "Brief an Anna");

    let mut expected = create_body["data"].clone();
    expected["title"] = json!("Brief an Anna");
    assert_eq!(update_body["data"], expected);

    // List
    let list_body: Value = fixture
        .client
        .get(fixture.url("/api/exercises"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list_body["data"].as_array().unwrap().len(), 1);

    // Delete
    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/api/exercises/{}", exercise_id)))
        .header("x-access-code", ADMIN_CODE)
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);
    let delete_body: Value = delete_resp.json().await.unwrap();
    assert_eq!(delete_body["data"], true);

    // Verify deleted
    let get_deleted_resp = fixture
        .client
        .get(fixture.url(&format!("/api/exercises/{}", exercise_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_deleted_resp.status(), 404);
    let not_found: Value = get_deleted_resp.json().await.unwrap();
    assert_eq!(not_found["error"]["code"], "NOT_FOUND");

    // Deleting again still succeeds
    let again = fixture
        .client
        .delete(fixture.url(&format!("/api/exercises/{}", exercise_id)))
        .header("x-access-code", ADMIN_CODE)
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 200);
}

#[tokio::test]
async fn test_every_variant_round_trips_through_api() {
    let fixture = TestFixture::new().await;

    for (exercise_type, part) in VALID_VARIANTS {
        let input = exercise_json(exercise_type, part);
        let created = fixture.create_as_admin(&input).await;

        let mut expected = input.clone();
        expected["id"] = created["data"]["id"].clone();
        assert_eq!(created["data"], expected, "{}/{}", exercise_type, part);
    }
}

#[tokio::test]
async fn test_list_filters() {
    let fixture = TestFixture::new().await;
    for (exercise_type, part) in VALID_VARIANTS {
        fixture
            .create_as_admin(&exercise_json(exercise_type, part))
            .await;
    }

    let by_part: Value = fixture
        .client
        .get(fixture.url("/api/exercises?type=reading&part=part1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let items = by_part["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert!(items
        .iter()
        .all(|e| e["type"] == "reading" && e["part"] == "part1"));

    let by_type: Value = fixture
        .client
        .get(fixture.url("/api/exercises?type=writing"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_type["data"].as_array().unwrap().len(), 2);

    let part_only = fixture
        .client
        .get(fixture.url("/api/exercises?part=part1"))
        .send()
        .await
        .unwrap();
    assert_eq!(part_only.status(), 400);
}

#[tokio::test]
async fn test_validation_errors() {
    let fixture = TestFixture::new().await;

    // Payload of another variant
    let mut mixed = exercise_json(ExerciseType::Reading, ExercisePart::Part1);
    mixed["prompt"] = json!("Schreiben Sie einen Brief.");
    let resp = fixture
        .client
        .post(fixture.url("/api/exercises"))
        .header("x-access-code", ADMIN_CODE)
        .json(&mixed)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Missing title
    let mut untitled = exercise_json(ExerciseType::Writing, ExercisePart::Part2);
    untitled["title"] = json!("");
    let resp = fixture
        .client
        .post(fixture.url("/api/exercises"))
        .header("x-access-code", ADMIN_CODE)
        .json(&untitled)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Client-supplied id
    let mut with_id = exercise_json(ExerciseType::Writing, ExercisePart::Part2);
    with_id["id"] = json!("chosen-by-client");
    let resp = fixture
        .client
        .post(fixture.url("/api/exercises"))
        .header("x-access-code", ADMIN_CODE)
        .json(&with_id)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_update_that_breaks_variant_is_rejected() {
    let fixture = TestFixture::new().await;
    let created = fixture
        .create_as_admin(&exercise_json(ExerciseType::Grammar, ExercisePart::Part1))
        .await;
    let id = created["data"]["id"].as_str().unwrap();

    let resp = fixture
        .client
        .patch(fixture.url(&format!("/api/exercises/{}", id)))
        .header("x-access-code", ADMIN_CODE)
        .json(&json!({ "part": "part2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let current: Value = fixture
        .client
        .get(fixture.url(&format!("/api/exercises/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["data"], created["data"]);
}

#[tokio::test]
async fn test_update_keeps_content_rules() {
    let fixture = TestFixture::new().await;
    let word_bank = fixture
        .create_as_admin(&exercise_json(ExerciseType::Grammar, ExercisePart::Part2))
        .await;
    let multiple_choice = fixture
        .create_as_admin(&exercise_json(ExerciseType::Reading, ExercisePart::Part2))
        .await;

    let cases = [
        (&word_bank, json!({ "title": "" }), "Title is required"),
        (&word_bank, json!({ "wordBank": [] }), "Word bank must contain"),
        (
            &multiple_choice,
            json!({ "questions": [{ "question": "q", "options": [], "correctAnswer": 9 }] }),
            "out of range",
        ),
    ];

    for (created, body, message) in cases {
        let id = created["data"]["id"].as_str().unwrap();
        let url = fixture.url(&format!("/api/exercises/{}", id));

        let resp = fixture
            .client
            .patch(&url)
            .header("x-access-code", ADMIN_CODE)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "{}", body);
        let error: Value = resp.json().await.unwrap();
        assert_eq!(error["error"]["code"], "VALIDATION_ERROR");
        assert!(
            error["error"]["message"].as_str().unwrap().contains(message),
            "{}",
            error
        );

        let current: Value = fixture
            .client
            .get(&url)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(current["data"], created["data"]);
    }
}

#[tokio::test]
async fn test_update_unknown_exercise_is_not_found() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .patch(fixture.url("/api/exercises/non-existent-id"))
        .header("x-access-code", ADMIN_CODE)
        .json(&json!({ "title": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_login() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/login"))
        .json(&json!({ "code": "demo123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["isDemo"], true);
    assert_eq!(body["data"]["role"], "Student");
    assert!(body["data"]["id"].is_string());

    let resp = fixture
        .client
        .post(fixture.url("/api/login"))
        .json(&json!({ "code": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .client
        .post(fixture.url("/api/login"))
        .json(&json!({ "code": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_settings_scenario() {
    let fixture = TestFixture::new().await;

    let initial: Value = fixture
        .client
        .get(fixture.url("/api/settings"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(initial["data"]["defaultTimeLimit"]["writing"], 30);
    assert_eq!(initial["data"]["maintenanceMode"], false);

    // Students may not change settings
    let resp = fixture
        .client
        .patch(fixture.url("/api/settings"))
        .header("x-access-code", STUDENT_CODE)
        .json(&json!({ "maintenanceMode": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = fixture
        .client
        .patch(fixture.url("/api/settings"))
        .header("x-access-code", ADMIN_CODE)
        .json(&json!({ "maintenanceMode": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let after: Value = fixture
        .client
        .get(fixture.url("/api/settings"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let mut expected = initial["data"].clone();
    expected["maintenanceMode"] = json!(true);
    assert_eq!(after["data"], expected);
}

#[tokio::test]
async fn test_settings_not_configured() {
    let fixture = TestFixture::empty().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/settings"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}
