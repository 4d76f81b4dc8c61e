/// OpenAPI documentation generation.
pub mod documentation;
/// Client for the external question-generation service.
pub mod generation_service;
/// Health check service.
pub mod health_service;
/// The session lifecycle engine.
pub mod live_service;
/// Session provisioning (create, lookup, export, import).
pub mod session_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
/// Broadcast gateway for room and host-private events.
pub mod ws_events;
