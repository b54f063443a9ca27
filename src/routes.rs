// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    config::Config,
    handlers::{exams, health, results, teachers, upload},
    state::AppState,
};

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    match &config.cors_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match origin.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                        None
                    }
                })
                .collect();
            cors.allow_origin(origins)
        }
        None => cors.allow_origin(Any),
    }
}

/// Assembles the main application router.
///
/// * Teacher, exam and result endpoints at the root, as the frontend expects.
/// * Anything else is served from the static frontend directory.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let upload_routes = Router::new()
        .route("/upload-pdf", post(upload::upload_pdf))
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_bytes + MULTIPART_OVERHEAD,
        ));

    let teacher_routes = Router::new()
        .route("/register-teacher", post(teachers::register_teacher))
        .route("/login-teacher", post(teachers::login_teacher));

    let exam_routes = Router::new()
        .route("/generate-exam", post(exams::generate_exam))
        .route("/get-teacher-exams/{teacher_id}", get(exams::get_teacher_exams))
        .route("/generate-exam-versions", post(exams::generate_exam_versions))
        .route("/get-exam/{exam_code}", get(exams::get_exam));

    let result_routes = Router::new()
        .route("/submit-exam", post(results::submit_exam))
        .route("/get-student-results/{teacher_id}", get(results::get_student_results))
        .route("/get-student-details/{result_id}", get(results::get_student_details));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(teacher_routes)
        .merge(upload_routes)
        .merge(exam_routes)
        .merge(result_routes)
        .fallback_service(ServeDir::new(&state.config.static_dir))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
