//! API Endpoint Tests
//!
//! Drives the full platform router with in-memory repositories:
//! - Registration and login
//! - Bearer authentication and role gating
//! - Complaint submission and the approval chain over HTTP
//! - Error response shapes

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use rv_platform::api::PlatformServices;
use rv_platform::config::{
    AssignmentPolicyKind, LogFormat, MailConfig, PlatformConfig, SigningSecret, StorageBackend,
};
use rv_platform::domain::{Course, Identity, Role};
use rv_platform::repository::{
    IdentityRepository, MemoryComplaintRepository, MemoryCourseRepository, MemoryIdentityRepository,
};
use rv_platform::service::{MailError, Mailer, PasswordService};

const PASSWORD: &str = "correct-horse-battery";
const BOUNDARY: &str = "rv-test-boundary";

/// Mailer that records every recipient
#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<String>>,
}

impl RecordingMailer {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.sent.lock())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, recipient: &str, _subject: &str, _body: &str) -> Result<(), MailError> {
        self.sent.lock().push(recipient.to_string());
        Ok(())
    }
}

struct TestApp {
    router: Router,
    mailer: Arc<RecordingMailer>,
    uploads: TempDir,
}

fn test_config(uploads: &TempDir) -> PlatformConfig {
    PlatformConfig {
        api_port: 0,
        storage: StorageBackend::Memory,
        mongo_url: String::new(),
        mongo_db: String::new(),
        jwt_secret: SigningSecret::new(vec![42; 32]).unwrap(),
        token_expiry: Duration::from_secs(3600),
        uploads_dir: uploads.path().to_path_buf(),
        mail: MailConfig {
            timeout: Duration::from_millis(200),
            max_attempts: 1,
            ..MailConfig::default()
        },
        assignment_policy: AssignmentPolicyKind::RoundRobin,
        dev_mode: false,
        log_format: LogFormat::Text,
    }
}

async fn create_test_app() -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let passwords = Arc::new(PasswordService::default());

    let identities = Arc::new(MemoryIdentityRepository::new());
    let hash = passwords.hash_password(PASSWORD).unwrap();
    for (id, role) in [
        ("L1", Role::Lecturer),
        ("L2", Role::Lecturer),
        ("A1", Role::CourseAdvisor),
        ("H1", Role::HeadOfDepartment),
        ("SEN1", Role::Senate),
        ("R1", Role::Registrar),
    ] {
        let identity = Identity::new(id, format!("{}@uni.edu", id.to_lowercase()), role, hash.clone())
            .with_courses(vec!["CS101".to_string()]);
        identities.insert(&identity).await.unwrap();
    }

    let courses = Arc::new(MemoryCourseRepository::with_courses([
        Course::new("CS101", "Introduction to Programming").with_lecturer("L1"),
        Course::new("CS102", "Data Structures"),
    ]));

    let mailer = Arc::new(RecordingMailer::default());
    let services = PlatformServices::new(
        &test_config(&uploads),
        Arc::new(MemoryComplaintRepository::new()),
        courses,
        identities,
        mailer.clone(),
        passwords,
    );

    TestApp {
        router: services.router(),
        mailer,
        uploads,
    }
}

async fn get_body_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, get_body_json(response.into_body()).await)
    }

    async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn put(&self, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(Method::PUT)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token));
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        self.send(request.unwrap()).await
    }

    async fn multipart(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &[u8])>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(fields, file)))
            .unwrap();
        self.send(request).await
    }

    fn stored_files(&self) -> usize {
        std::fs::read_dir(self.uploads.path()).map(|dir| dir.count()).unwrap_or(0)
    }

    async fn login(&self, identifier: &str) -> String {
        let (status, body) = self
            .post_json("/login", None, json!({ "identifier": identifier, "password": PASSWORD }))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["accessToken"].as_str().unwrap().to_string()
    }

    async fn register_student(&self, id: &str) -> String {
        let (status, _) = self
            .post_json(
                "/register",
                None,
                json!({
                    "id": id,
                    "email": format!("{}@students.uni.edu", id.to_lowercase()),
                    "firstName": "Ada",
                    "lastName": "Obi",
                    "password": PASSWORD,
                    "courses": ["CS101"],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        self.login(id).await
    }

    async fn submit(&self, token: &str, course: &str) -> (StatusCode, Value) {
        self.multipart(
            Method::POST,
            "/complaint",
            token,
            &[
                ("course_concerned", course),
                ("request_details", "My script was not marked"),
                ("test_score", "35"),
            ],
            Some(("script.pdf", b"%PDF-1.4 student")),
        )
        .await
    }
}

fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
                 Content-Type: application/pdf\r\n\r\n",
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

// ============================================================================
// Health & Docs
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app().await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "UP");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = create_test_app().await;
    let request = Request::builder()
        .uri("/api-docs/openapi.json")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/complaint"].is_object());
}

// ============================================================================
// Registration & Login
// ============================================================================

#[tokio::test]
async fn test_login_by_id_and_email() {
    let app = create_test_app().await;
    app.register_student("S1").await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "identifier": "s1@students.uni.edu", "password": PASSWORD }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let header_token = response
        .headers()
        .get(header::AUTHORIZATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let body = get_body_json(response.into_body()).await;

    assert_eq!(body["accessToken"], header_token.as_str());
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["userId"], "S1");
    assert_eq!(body["role"], "student");
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_login_failures_look_the_same() {
    let app = create_test_app().await;
    app.register_student("S1").await;

    let (wrong_status, wrong) = app
        .post_json("/login", None, json!({ "identifier": "S1", "password": "not-the-password" }))
        .await;
    let (unknown_status, unknown) = app
        .post_json("/login", None, json!({ "identifier": "S404", "password": "not-the-password" }))
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
    assert_eq!(wrong["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = create_test_app().await;
    app.register_student("S1").await;

    let (status, body) = app
        .post_json(
            "/register",
            None,
            json!({ "id": "S1", "email": "other@students.uni.edu", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ALREADY_EXISTS");
}

#[tokio::test]
async fn test_staff_registration_requires_registrar() {
    let app = create_test_app().await;
    let staff = json!({
        "id": "L9",
        "email": "l9@uni.edu",
        "role": "lecturer",
        "password": PASSWORD,
    });

    let (status, _) = app.post_json("/register", None, staff.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let lecturer = app.login("L1").await;
    let (status, body) = app.post_json("/register", Some(&lecturer), staff.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    let registrar = app.login("R1").await;
    let (status, body) = app.post_json("/register", Some(&registrar), staff).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "L9");
}

// ============================================================================
// Access Gate
// ============================================================================

#[tokio::test]
async fn test_protected_routes_need_a_valid_token() {
    let app = create_test_app().await;

    let request = Request::builder().uri("/complaints/S1").body(Body::empty()).unwrap();
    let (status, missing) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, garbage) = app.get("/complaints/S1", "not.a.token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing, garbage);
}

#[tokio::test]
async fn test_raw_token_without_bearer_prefix_is_accepted() {
    let app = create_test_app().await;
    let token = app.register_student("S1").await;

    let request = Request::builder()
        .uri("/complaints/S1")
        .header(header::AUTHORIZATION, token)
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_students_cannot_read_other_students() {
    let app = create_test_app().await;
    let s1 = app.register_student("S1").await;
    let s2 = app.register_student("S2").await;

    let (status, created) = app.submit(&s1, "CS101").await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["complaint"]["id"].as_str().unwrap();

    let (status, _) = app.get("/complaints/S1", &s2).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get(&format!("/complaint/{}", id), &s2).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/course-complaints/CS101", &s2).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ============================================================================
// Complaint Lifecycle
// ============================================================================

#[tokio::test]
async fn test_end_to_end_approval_chain() {
    let app = create_test_app().await;
    let student = app.register_student("S1").await;

    let (status, created) = app.submit(&student, "CS101").await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    let complaint = &created["complaint"];
    let id = complaint["id"].as_str().unwrap().to_string();
    assert_eq!(complaint["status"], "PENDING");
    assert_eq!(complaint["respondingLecturer"], "L1");
    assert_eq!(complaint["requestingStudent"], "S1");
    assert_eq!(complaint["testScore"], 35);
    assert!(complaint["studentEvidence"].as_str().unwrap().starts_with("/uploads/"));
    assert_eq!(created["notifications"]["delivered"], json!(["L1"]));
    assert_eq!(app.mailer.take(), vec!["l1@uni.edu"]);

    let lecturer = app.login("L1").await;
    let (status, approved) = app
        .multipart(
            Method::PUT,
            &format!("/approved-by-lecturer/{}", id),
            &lecturer,
            &[("reason", "Remarked, score corrected")],
            Some(("e1.pdf", b"%PDF-1.4 lecturer")),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", approved);
    assert_eq!(approved["complaint"]["status"], "APPROVED_BY_LECTURER");
    assert_eq!(approved["complaint"]["lecturerReason"], "Remarked, score corrected");
    assert!(approved["complaint"]["lecturerEvidence"].as_str().unwrap().ends_with("-e1.pdf"));
    assert_eq!(app.mailer.take(), vec!["s1@students.uni.edu", "h1@uni.edu"]);

    // Replaying the lecturer approval
    let (status, replay) = app
        .multipart(
            Method::PUT,
            &format!("/approved-by-lecturer/{}", id),
            &lecturer,
            &[("reason", "again")],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(replay["error"], "ILLEGAL_TRANSITION");

    let advisor = app.login("A1").await;
    let (status, queue) = app.get("/advisor-complaints", &advisor).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue.as_array().unwrap().len(), 1);

    let (status, _) = app.put(&format!("/approved-by-advisor/{}", id), &advisor, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.mailer.take().is_empty());

    let hod = app.login("H1").await;
    let (status, _) = app.put(&format!("/approved-by-hod/{}", id), &hod, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.mailer.take(), vec!["s1@students.uni.edu", "sen1@uni.edu"]);

    let senate = app.login("SEN1").await;
    let (status, done) = app
        .put(
            &format!("/approved-by-senate/{}", id),
            &senate,
            Some(json!({ "expectedStatus": "APPROVED_BY_HOD" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["complaint"]["status"], "APPROVED_BY_SENATE");
    assert_eq!(done["complaint"]["history"].as_array().unwrap().len(), 4);
    assert_eq!(app.mailer.take(), vec!["s1@students.uni.edu"]);

    let (status, mine) = app.get("/complaints/S1", &student).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine[0]["status"], "APPROVED_BY_SENATE");
}

#[tokio::test]
async fn test_submission_errors() {
    let app = create_test_app().await;
    let student = app.register_student("S1").await;

    let (status, body) = app.submit(&student, "CS999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "COURSE_NOT_FOUND");

    let (status, body) = app.submit(&student, "CS102").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "NO_ELIGIBLE_LECTURER");

    let (status, _) = app.submit(&student, "CS101").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = app.submit(&student, "CS101").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "DUPLICATE_REQUEST");

    let (status, body) = app
        .multipart(
            Method::POST,
            "/complaint",
            &student,
            &[("course_concerned", "CS101"), ("request_details", "x"), ("test_score", "-3")],
            Some(("script.pdf", b"pdf")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let (status, _) = app
        .multipart(
            Method::POST,
            "/complaint",
            &student,
            &[("course_concerned", "CS101"), ("request_details", "x"), ("test_score", "30")],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let lecturer = app.login("L1").await;
    let (status, _) = app.submit(&lecturer, "CS101").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reviewer_gating_and_stale_moves() {
    let app = create_test_app().await;
    let student = app.register_student("S1").await;
    let (_, created) = app.submit(&student, "CS101").await;
    let id = created["complaint"]["id"].as_str().unwrap().to_string();

    // Not the responding lecturer
    let other = app.login("L2").await;
    let (status, _) = app
        .multipart(Method::PUT, &format!("/approved-by-lecturer/{}", id), &other, &[("reason", "ok")], None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Lecturer approval without a reason
    let lecturer = app.login("L1").await;
    let (status, _) = app
        .multipart(Method::PUT, &format!("/approved-by-lecturer/{}", id), &lecturer, &[("reason", "")], None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Advisor cannot act on a pending complaint
    let advisor = app.login("A1").await;
    let (status, body) = app.put(&format!("/approved-by-advisor/{}", id), &advisor, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ILLEGAL_TRANSITION");

    // A decline based on an outdated view
    let (status, body) = app
        .put(
            &format!("/decline/{}", id),
            &lecturer,
            Some(json!({ "expectedStatus": "APPROVED_BY_LECTURER" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "STALE_STATE");

    let (status, declined) = app.put(&format!("/decline/{}", id), &lecturer, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(declined["complaint"]["status"], "DECLINED");
    assert_eq!(app.mailer.take().last().map(String::as_str), Some("s1@students.uni.edu"));

    let (status, _) = app.put("/decline/unknown-id", &lecturer, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_evidence_is_served_from_uploads() {
    let app = create_test_app().await;
    let student = app.register_student("S1").await;
    let (_, created) = app.submit(&student, "CS101").await;
    let path = created["complaint"]["studentEvidence"].as_str().unwrap().to_string();

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri(&path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"%PDF-1.4 student");
}

#[tokio::test]
async fn test_staff_and_course_listings() {
    let app = create_test_app().await;
    let student = app.register_student("S1").await;
    app.submit(&student, "CS101").await;

    let lecturer = app.login("L1").await;
    let (status, assigned) = app.get("/staff-complaints/L1", &lecturer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned.as_array().unwrap().len(), 1);

    let (_, course) = app.get("/course-complaints/CS101", &lecturer).await;
    assert_eq!(course.as_array().unwrap().len(), 1);

    let (_, empty) = app.get("/staff-complaints/L2", &lecturer).await;
    assert_eq!(empty, json!([]));

    let (status, courses) = app.get("/courses/S1", &student).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(courses[0]["code"], "CS101");
    assert_eq!(courses[0]["lecturers"], json!(["L1"]));

    let (status, _) = app.get("/courses/L1", &student).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_malformed_advance_body_is_rejected() {
    let app = create_test_app().await;
    let student = app.register_student("S1").await;
    let (_, created) = app.submit(&student, "CS101").await;
    let id = created["complaint"]["id"].as_str().unwrap().to_string();
    let lecturer = app.login("L1").await;

    for body in [
        json!({ "expectedStatus": "APPROVED_BY_HOD_TYPO" }),
        json!({ "expectedStatsu": "PENDING" }),
        json!("PENDING"),
    ] {
        let (status, error) = app.put(&format!("/decline/{}", id), &lecturer, Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert_eq!(error["error"], "VALIDATION_ERROR");
    }

    let request = Request::builder()
        .method(Method::PUT)
        .uri(format!("/decline/{}", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", lecturer))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, complaint) = app.get(&format!("/complaint/{}", id), &student).await;
    assert_eq!(complaint["status"], "PENDING");
    assert_eq!(complaint["history"], json!([]));
}

#[tokio::test]
async fn test_rejected_writes_leave_no_evidence_behind() {
    let app = create_test_app().await;
    let student = app.register_student("S1").await;

    let (status, created) = app.submit(&student, "CS101").await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["complaint"]["id"].as_str().unwrap().to_string();

    let (status, _) = app.submit(&student, "CS101").await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app.submit(&student, "CS999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.submit(&student, "CS102").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(app.stored_files(), 1);

    // Lecturer evidence sent with an approval that fails validation
    let lecturer = app.login("L1").await;
    let (status, _) = app
        .multipart(
            Method::PUT,
            &format!("/approved-by-lecturer/{}", id),
            &lecturer,
            &[("reason", "")],
            Some(("e1.pdf", b"%PDF-1.4 lecturer")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.stored_files(), 1);

    let (status, _) = app
        .multipart(
            Method::PUT,
            &format!("/approved-by-lecturer/{}", id),
            &lecturer,
            &[("reason", "Remarked")],
            Some(("e1.pdf", b"%PDF-1.4 lecturer")),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.stored_files(), 2);
}

#[tokio::test]
async fn test_student_complaints_filtered_by_course() {
    let app = create_test_app().await;
    let student = app.register_student("S1").await;
    app.submit(&student, "CS101").await;

    let (status, matching) = app.get("/complaints/S1?course=CS101", &student).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(matching.as_array().unwrap().len(), 1);
    assert_eq!(matching[0]["courseConcerned"], "CS101");

    let (_, lowercase) = app.get("/complaints/S1?course=cs101", &student).await;
    assert_eq!(lowercase.as_array().unwrap().len(), 1);

    let (_, other) = app.get("/complaints/S1?course=CS102", &student).await;
    assert_eq!(other, json!([]));

    let s2 = app.register_student("S2").await;
    let (status, _) = app.get("/complaints/S1?course=CS101", &s2).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
