// tests/api_tests.rs

use async_trait::async_trait;
use examgen::{
    config::{Config, LlmConfig},
    models::{
        exam::Exam,
        question::{OptionLabel, Options, QuestionRecord},
    },
    pipeline::{ExamAssembler, GenerationError, PipelineConfig, QuestionResponder},
    routes,
    state::AppState,
    store::{ExamStore, MemoryStore},
};
use lopdf::{
    Document, Object, Stream,
    content::{Content, Operation},
    dictionary,
};
use serde_json::{Value, json};
use sqlx::types::Json as SqlJson;
use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

/// Echoes each base question back as a generated one and counts the calls.
struct EchoResponder {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl QuestionResponder for EchoResponder {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let marker = "Preguntas base: ";
        let start = prompt.rfind(marker).ok_or(GenerationError::NoJson)? + marker.len();
        let refs: Vec<Value> =
            serde_json::from_str(&prompt[start..]).map_err(|_| GenerationError::NoJson)?;

        let items: Vec<Value> = refs
            .iter()
            .map(|r| {
                json!({
                    "numero": r["num"],
                    "tema": "Geografía",
                    "pregunta": r["texto"],
                    "opciones": {"A": "Uno", "B": "Dos", "C": "Tres", "D": "Cuatro"},
                    "respuesta_correcta": "C"
                })
            })
            .collect();

        Ok(format!("Aquí tienes:\n```json\n{}\n```", json!({ "preguntas": items })))
    }
}

struct TestApp {
    address: String,
    store: Arc<MemoryStore>,
    upload_dir: PathBuf,
    llm_calls: Arc<AtomicUsize>,
}

/// Helper function to spawn the app on a random port for testing.
/// Uses the in-memory store, so no database is needed.
async fn spawn_app() -> TestApp {
    let root = std::env::temp_dir().join(format!("examgen-test-{}", uuid::Uuid::new_v4()));
    let upload_dir = root.join("uploads");
    tokio::fs::create_dir_all(&upload_dir)
        .await
        .expect("Failed to create upload dir");

    let pipeline = PipelineConfig {
        batch_timeout: Duration::from_secs(5),
        ..PipelineConfig::default()
    };

    let config = Config {
        database_url: "postgres://unused".to_string(),
        rust_log: "error".to_string(),
        port: 0,
        upload_dir: upload_dir.to_string_lossy().into_owned(),
        static_dir: root.join("frontend").to_string_lossy().into_owned(),
        cors_origins: None,
        max_upload_bytes: 1024 * 1024,
        llm: LlmConfig {
            api_key: "test".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            model: "test-model".to_string(),
            timeout: Duration::from_secs(5),
        },
        pipeline: pipeline.clone(),
    };

    let store = Arc::new(MemoryStore::new());
    let llm_calls = Arc::new(AtomicUsize::new(0));
    let responder = EchoResponder { calls: llm_calls.clone() };
    let state = AppState {
        store: store.clone(),
        config,
        assembler: Arc::new(ExamAssembler::new(Arc::new(responder), pipeline)),
    };

    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        upload_dir,
        llm_calls,
    }
}

async fn register(app: &TestApp, client: &reqwest::Client, name: &str, email: &str) -> String {
    let body: Value = client
        .post(format!("{}/register-teacher", app.address))
        .json(&json!({ "name": name, "email": email }))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    body["teacher_id"].as_str().unwrap().to_string()
}

fn question(n: u32, topic: &str, correct: OptionLabel) -> QuestionRecord {
    let options = Options::new(
        OptionLabel::ALL
            .iter()
            .map(|l| (*l, format!("Respuesta {l} de {n}")))
            .collect(),
    )
    .unwrap();
    QuestionRecord::new(n, topic, &format!("Pregunta número {n}"), options, correct).unwrap()
}

async fn seed_exam(app: &TestApp, teacher_id: &str, code: &str) -> Exam {
    let exam = Exam {
        id: uuid::Uuid::new_v4().to_string(),
        teacher_id: teacher_id.to_string(),
        exam_code: code.to_string(),
        questions: SqlJson(vec![
            question(1, "Historia", OptionLabel::A),
            question(2, "Historia", OptionLabel::B),
            question(3, "Lengua", OptionLabel::D),
        ]),
        time_limit: 25,
        difficulty: "easy".to_string(),
        versions: 1,
        created_at: None,
    };
    app.store.insert_exam(&exam).await.unwrap();
    exam
}

/// Builds a one-page PDF with one text object per line.
fn sample_pdf(lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut operations = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
        operations.push(Operation::new("Td", vec![50.into(), (750 - 20 * i as i64).into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("ET", vec![]));
    }
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

async fn upload(app: &TestApp, client: &reqwest::Client, name: &str, bytes: Vec<u8>) -> reqwest::Response {
    let part = reqwest::multipart::Part::bytes(bytes).file_name(name.to_string());
    let form = reqwest::multipart::Form::new()
        .part("file", part)
        .text("teacher_id", "anyone");

    client
        .post(format!("{}/upload-pdf", app.address))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
async fn unknown_path_is_404() {
    // Arrange
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn health_reports_store_status() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "OK");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn register_and_login_flow() {
    // Arrange
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let teacher_id = register(&app, &client, "Ana Ruiz", "ana@example.com").await;

    // Act: same email again
    let duplicate = client
        .post(format!("{}/register-teacher", app.address))
        .json(&json!({ "name": "Otra", "email": "ana@example.com" }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(duplicate.status().as_u16(), 400);
    let body: Value = duplicate.json().await.unwrap();
    assert_eq!(body["error"], "Email already exists");

    // Act: login
    let login = client
        .post(format!("{}/login-teacher", app.address))
        .json(&json!({ "name": "Ana Ruiz", "email": "ana@example.com" }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(login.status().as_u16(), 200);
    let body: Value = login.json().await.unwrap();
    assert_eq!(body["teacher_id"], teacher_id.as_str());
    assert_eq!(body["success"], true);

    // Act: wrong name
    let wrong = client
        .post(format!("{}/login-teacher", app.address))
        .json(&json!({ "name": "Nadie", "email": "ana@example.com" }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(wrong.status().as_u16(), 404);
    let body: Value = wrong.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Credenciales incorrectas");
}

#[tokio::test]
async fn register_fails_validation() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/register-teacher", app.address))
        .json(&json!({ "name": "Ana", "email": "not-an-email" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn register_rejects_blank_name() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/register-teacher", app.address))
        .json(&json!({ "name": "   ", "email": "blank@example.com" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
    let login = client
        .post(format!("{}/login-teacher", app.address))
        .json(&json!({ "name": "", "email": "blank@example.com" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(login.status().as_u16(), 400);
}

#[tokio::test]
async fn exam_versions_and_grading_flow() {
    // Arrange
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let teacher_id = register(&app, &client, "Luis", "luis@example.com").await;
    let exam = seed_exam(&app, &teacher_id, "ABC123").await;

    // Act: teacher listing
    let listing: Value = client
        .get(format!("{}/get-teacher-exams/{}", app.address, teacher_id))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(listing["exams"][0]["exam_code"], "ABC123");
    assert_eq!(listing["exams"][0]["num_questions"], 3);

    // Act: student view, code typed in lowercase
    let student_view = client
        .get(format!("{}/get-exam/abc123", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert: no answer key
    assert_eq!(student_view.status().as_u16(), 200);
    let student_view: Value = student_view.json().await.unwrap();
    assert_eq!(student_view["is_version"], false);
    assert_eq!(student_view["time_limit"], 25);
    assert_eq!(student_view["questions"].as_array().unwrap().len(), 3);
    assert!(student_view["questions"][0].get("respuesta_correcta").is_none());

    // Act: two shuffled versions
    let versions: Value = client
        .post(format!("{}/generate-exam-versions", app.address))
        .json(&json!({ "exam_id": exam.id, "num_versions": 2 }))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(versions["success"], true);
    let versions = versions["versions"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    let stored = app.store.fetch_exam_by_id(&exam.id).await.unwrap().unwrap();
    assert_eq!(stored.versions, 3);

    // Act: answer the first version perfectly except the last question
    let version_code = versions[0]["version_code"].as_str().unwrap();
    let version = app.store.fetch_exam_by_code(version_code).await.unwrap().unwrap();
    assert!(version.is_version);

    let mut answers: HashMap<String, String> = HashMap::new();
    for (i, q) in version.questions.iter().enumerate() {
        let label = if i + 1 == version.questions.len() {
            OptionLabel::ALL[(q.correct_option().index() + 1) % 4]
        } else {
            q.correct_option()
        };
        answers.insert(i.to_string(), label.to_string());
    }

    let submitted = client
        .post(format!("{}/submit-exam", app.address))
        .json(&json!({
            "student_name": "Marta",
            "exam_code": version_code,
            "answers": answers
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(submitted.status().as_u16(), 200);
    let submitted: Value = submitted.json().await.unwrap();
    assert_eq!(submitted["correct_answers"], 2);
    assert_eq!(submitted["total_questions"], 3);
    assert_eq!(submitted["overall_percentage"], 66.67);
    let result_id = submitted["result_id"].as_str().unwrap().to_string();

    // Act: teacher sees the result of the version
    let results: Value = client
        .get(format!("{}/get-student-results/{}", app.address, teacher_id))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(results["results"][0]["result_id"], result_id.as_str());
    assert_eq!(results["results"][0]["student_name"], "Marta");

    // Act: details
    let details: Value = client
        .get(format!("{}/get-student-details/{}", app.address, result_id))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(details["exam_code"], version_code);
    assert_eq!(details["answers"].as_object().unwrap().len(), 3);
}

#[tokio::test]
async fn unknown_records_are_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let exam = client
        .get(format!("{}/get-exam/ZZZZZZ", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(exam.status().as_u16(), 404);

    let submit = client
        .post(format!("{}/submit-exam", app.address))
        .json(&json!({ "student_name": "Marta", "exam_code": "ZZZZZZ", "answers": {} }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(submit.status().as_u16(), 404);

    let versions = client
        .post(format!("{}/generate-exam-versions", app.address))
        .json(&json!({ "exam_id": "missing" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(versions.status().as_u16(), 404);

    let details = client
        .get(format!("{}/get-student-details/missing", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(details.status().as_u16(), 404);
}

#[tokio::test]
async fn generate_exam_requires_parameters() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/generate-exam", app.address))
        .json(&json!({ "file_path": "uploads/x.pdf" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn generate_exam_rejects_paths_outside_uploads() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let teacher_id = register(&app, &client, "Eva", "eva@example.com").await;

    let outside = std::env::temp_dir().join(format!("outside-{}.pdf", uuid::Uuid::new_v4()));
    tokio::fs::write(&outside, sample_pdf(&["1. Una pregunta cualquiera?"])).await.unwrap();

    let escaped = client
        .post(format!("{}/generate-exam", app.address))
        .json(&json!({ "teacher_id": teacher_id, "file_path": outside.to_string_lossy() }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(escaped.status().as_u16(), 400);
    assert!(outside.exists());

    let missing = client
        .post(format!("{}/generate-exam", app.address))
        .json(&json!({
            "teacher_id": teacher_id,
            "file_path": app.upload_dir.join("missing.pdf").to_string_lossy()
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(missing.status().as_u16(), 400);

    tokio::fs::remove_file(&outside).await.unwrap();
}

#[tokio::test]
async fn upload_rejects_non_pdf() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = upload(&app, &client, "notes.txt", b"hello".to_vec()).await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid file type");
}

#[tokio::test]
async fn upload_rejects_oversized_file() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = upload(&app, &client, "big.pdf", vec![b'%'; 1024 * 1024 + 10]).await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "File size exceeds 1MB limit");

    let mut staged = tokio::fs::read_dir(&app.upload_dir).await.unwrap();
    assert!(staged.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn upload_keeps_unreadable_pdf_with_zero_preview() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = upload(&app, &client, "broken file.pdf", b"not really a pdf".to_vec()).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["num_preguntas"], 0);
    assert!(body["filename"].as_str().unwrap().ends_with("_broken_file.pdf"));
    assert!(PathBuf::from(body["file_path"].as_str().unwrap()).exists());
}

#[tokio::test]
async fn upload_then_generate_exam() {
    // Arrange
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let teacher_id = register(&app, &client, "Rosa", "rosa@example.com").await;
    let pdf = sample_pdf(&[
        "1. What is the capital of France? A) Paris B) Rome",
        "2. Which river crosses the city of Cairo? A) Nile B) Seine",
        "3. What is the highest mountain in Africa? A) Kilimanjaro",
    ]);

    // Act: upload
    let uploaded = upload(&app, &client, "geografia.pdf", pdf).await;

    // Assert
    assert_eq!(uploaded.status().as_u16(), 200);
    let uploaded: Value = uploaded.json().await.unwrap();
    assert_eq!(uploaded["num_preguntas"], 3);
    let file_path = uploaded["file_path"].as_str().unwrap().to_string();

    // Act: generate
    let generated = client
        .post(format!("{}/generate-exam", app.address))
        .json(&json!({
            "teacher_id": teacher_id,
            "file_path": file_path,
            "num_questions": 2,
            "difficulty": "easy"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(generated.status().as_u16(), 200);
    let generated: Value = generated.json().await.unwrap();
    assert_eq!(generated["success"], true);
    assert_eq!(generated["exam_code"].as_str().unwrap().len(), 6);
    let questions = generated["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0]["numero"], 1);
    assert_eq!(questions[1]["pregunta"], "Which river crosses the city of Cairo?");
    assert_eq!(questions[1]["respuesta_correcta"], "C");

    // The staged PDF is gone and the exam is stored.
    assert!(!PathBuf::from(&file_path).exists());
    let exams = app.store.fetch_exams_by_teacher(&teacher_id).await.unwrap();
    assert_eq!(exams.len(), 1);
    assert_eq!(exams[0].difficulty, "easy");
}

#[tokio::test]
async fn generate_exam_for_unknown_teacher_skips_generation() {
    // Arrange
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let pdf = sample_pdf(&["1. What is the capital of France? A) Paris B) Rome"]);
    let uploaded: Value = upload(&app, &client, "geo.pdf", pdf).await.json().await.unwrap();
    let file_path = uploaded["file_path"].as_str().unwrap().to_string();

    // Act
    let response = client
        .post(format!("{}/generate-exam", app.address))
        .json(&json!({
            "teacher_id": "no-such-teacher",
            "file_path": file_path,
            "num_questions": 1
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert: rejected before any LLM call, and the PDF stays staged.
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Teacher not found");
    assert_eq!(app.llm_calls.load(Ordering::SeqCst), 0);
    assert!(PathBuf::from(&file_path).exists());
}
