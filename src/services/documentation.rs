use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Quizdash Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::session::create_session,
        crate::routes::session::import_session,
        crate::routes::session::get_session,
        crate::routes::session::export_session,
        crate::routes::generate::generate_quiz,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::session::QuizDocument,
            crate::dto::session::QuestionInput,
            crate::dto::session::GenerateQuizRequest,
            crate::dto::session::SessionSummary,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sessions", description = "Session provisioning operations"),
        (name = "quizzes", description = "Quiz authoring via the generation service"),
        (name = "live", description = "WebSocket operations for hosts and players"),
    )
)]
pub struct ApiDoc;
