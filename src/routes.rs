use crate::analyzer::{self, FileAnalysis, FileAnalysisRequest};
use crate::chat::ChatRouter;
use crate::config::Config;
use crate::db;
use crate::federation::{AgentCoalition, CognitiveFederation};
use crate::logging;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

/// Shared service state. The federation is the single owner of all agent and
/// coalition data; handlers take its lock for the duration of a mutation and
/// never across an await.
pub struct AppState {
    pub federation: RwLock<CognitiveFederation>,
    pub chat: ChatRouter,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        AppState {
            federation: RwLock::new(CognitiveFederation::new(config.federation.clone())),
            chat: ChatRouter::from_config(&config),
        }
    }
}

pub type SharedState = Arc<AppState>;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/analyze-file", post(analyze_file_handler))
        .route("/api/agents", get(list_agents_handler))
        .route("/api/agents/:id", get(get_agent_handler))
        .route("/api/agents/:id/toggle", post(toggle_agent_handler))
        .route("/api/agents/:id/evolve", post(evolve_agent_handler))
        .route("/api/coalitions", post(form_coalition_handler).get(list_coalitions_handler))
        .route(
            "/api/conversations",
            post(create_conversation_handler).get(list_conversations_handler),
        )
        .route("/api/conversations/:id/messages", get(conversation_messages_handler))
        .route("/api/analytics/track", post(track_event_handler))
        .route("/api/analytics/summary", get(analytics_summary_handler))
        .route("/api/test", get(test_handler).post(run_test_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

// ============ Errors ============

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        ApiError { status: StatusCode::BAD_REQUEST, message: message.to_string() }
    }

    fn not_found(message: &str) -> Self {
        ApiError { status: StatusCode::NOT_FOUND, message: message.to_string() }
    }

    fn internal(message: &str) -> Self {
        ApiError { status: StatusCode::INTERNAL_SERVER_ERROR, message: message.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

// ============ Chat ============

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    pub model: Option<String>,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub model: String,
    pub agent: Option<String>,
    pub prologue: Option<String>,
    pub synergy: Option<f64>,
    pub timestamp: String,
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::bad_request("الرسالة مطلوبة"));
    }

    // Coalition + lead agent under one short write lock.
    let lead = {
        let mut federation = state.federation.write().await;
        let coalition = federation.form_coalition(&request.message);
        coalition.agents.first().cloned().map(|agent| (agent, coalition.synergy))
    };

    let (agent, synergy, system_prompt, prologue) = match &lead {
        Some((agent, synergy)) => (
            Some(agent),
            Some(*synergy),
            Some(agent.render_system_prompt()),
            Some(agent.kind.prologue(&request.message).to_string()),
        ),
        None => (None, None, None, None),
    };

    let model = request
        .model
        .clone()
        .or_else(|| agent.map(|a| a.model.clone()))
        .unwrap_or_else(|| "groq-llama".to_string());

    let (response, used_model) = state
        .chat
        .generate(&request.message, system_prompt.as_deref(), &model)
        .await
        .map_err(|e| {
            logging::log_error(&format!("Chat generation failed: {}", e));
            ApiError::internal("حدث خطأ في معالجة الطلب. تأكد من إعداد مفاتيح API.")
        })?;

    logging::log_chat(&format!("Generated response via {}", used_model));

    // The interaction side effect: the lead agent evolves with the fixed
    // post-response quality.
    if let Some((lead_agent, _)) = &lead {
        state.federation.write().await.evolve_personality(&lead_agent.id, 0.8, None);
    }

    // Persist opportunistically; a storage failure never fails the chat.
    if let Some(conversation_id) = &request.conversation_id {
        if db::is_initialized() {
            if let Err(e) = db::append_message(conversation_id, "user", &request.message, None) {
                logging::log_error(&format!("Failed to store user message: {}", e));
            }
            if let Err(e) =
                db::append_message(conversation_id, "assistant", &response, Some(used_model))
            {
                logging::log_error(&format!("Failed to store assistant message: {}", e));
            }
        }
    }

    Ok(Json(ChatResponse {
        response,
        model: used_model.to_string(),
        agent: lead.as_ref().map(|(a, _)| a.name.clone()),
        prologue,
        synergy,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

// ============ File Analysis ============

async fn analyze_file_handler(
    Json(request): Json<FileAnalysisRequest>,
) -> Json<FileAnalysis> {
    logging::log_analysis(&format!("Analyzing file: {}", request.file_name));
    Json(analyzer::analyze(&request))
}

// ============ Agents ============

async fn list_agents_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let federation = state.federation.read().await;
    Json(federation.get_all_agents().to_vec())
}

async fn get_agent_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let federation = state.federation.read().await;
    match federation.get_agent(&id) {
        Some(agent) => Ok(Json(agent.clone()).into_response()),
        None => Err(ApiError::not_found("الوكيل غير موجود")),
    }
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub id: String,
    pub is_active: bool,
}

async fn toggle_agent_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let mut federation = state.federation.write().await;
    if federation.get_agent(&id).is_none() {
        return Err(ApiError::not_found("الوكيل غير موجود"));
    }
    let is_active = federation.toggle_agent(&id);
    Ok(Json(ToggleResponse { id, is_active }))
}

#[derive(Debug, Deserialize)]
pub struct EvolveRequest {
    pub quality: f64,
    pub feedback: Option<String>,
}

async fn evolve_agent_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<EvolveRequest>,
) -> Result<Response, ApiError> {
    let mut federation = state.federation.write().await;
    if !federation.evolve_personality(&id, request.quality, request.feedback.as_deref()) {
        return Err(ApiError::not_found("الوكيل غير موجود"));
    }
    match federation.get_agent(&id) {
        Some(agent) => Ok(Json(agent.clone()).into_response()),
        None => Err(ApiError::not_found("الوكيل غير موجود")),
    }
}

// ============ Coalitions ============

#[derive(Debug, Deserialize)]
pub struct CoalitionRequest {
    #[serde(default)]
    pub task: String,
}

async fn form_coalition_handler(
    State(state): State<SharedState>,
    Json(request): Json<CoalitionRequest>,
) -> Json<AgentCoalition> {
    let mut federation = state.federation.write().await;
    Json(federation.form_coalition(&request.task))
}

async fn list_coalitions_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let federation = state.federation.read().await;
    Json(federation.get_active_coalitions().to_vec())
}

// ============ Conversations ============

#[derive(Debug, Deserialize, Default)]
pub struct CreateConversationRequest {
    pub title: Option<String>,
}

async fn create_conversation_handler(
    Json(request): Json<CreateConversationRequest>,
) -> Result<Json<db::Conversation>, ApiError> {
    let conversation = db::create_conversation(request.title.as_deref()).map_err(|e| {
        logging::log_error(&format!("Failed to create conversation: {}", e));
        ApiError::internal("فشل في إنشاء المحادثة")
    })?;
    logging::log_conversation(&format!("Created conversation {}", conversation.id));
    Ok(Json(conversation))
}

async fn list_conversations_handler() -> Result<Json<Vec<db::Conversation>>, ApiError> {
    let conversations = db::get_recent_conversations(50).map_err(|e| {
        logging::log_error(&format!("Failed to list conversations: {}", e));
        ApiError::internal("فشل في جلب المحادثات")
    })?;
    Ok(Json(conversations))
}

async fn conversation_messages_handler(
    Path(id): Path<String>,
) -> Result<Json<Vec<db::StoredMessage>>, ApiError> {
    let messages = db::get_conversation_messages(&id).map_err(|e| {
        logging::log_error(&format!("Failed to load messages: {}", e));
        ApiError::internal("فشل في جلب الرسائل")
    })?;
    Ok(Json(messages))
}

// ============ Analytics ============

#[derive(Debug, Deserialize)]
pub struct TrackEventRequest {
    pub name: String,
    pub properties: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct TrackEventResponse {
    pub success: bool,
    pub message: String,
}

async fn track_event_handler(
    Json(request): Json<TrackEventRequest>,
) -> Result<Json<TrackEventResponse>, ApiError> {
    logging::log_analytics(&format!("Tracking event: {}", request.name));

    let session_id = request
        .properties
        .as_ref()
        .and_then(|p| p.get("sessionId"))
        .and_then(|s| s.as_str())
        .map(|s| s.to_string());
    let properties = request.properties.as_ref().map(|p| p.to_string());

    db::record_event(&request.name, properties.as_deref(), session_id.as_deref()).map_err(|e| {
        logging::log_error(&format!("Failed to record event: {}", e));
        ApiError::internal("فشل في تتبع الحدث")
    })?;

    Ok(Json(TrackEventResponse {
        success: true,
        message: "تم تتبع الحدث بنجاح".to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct EventCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub total_events: i64,
    pub counts: Vec<EventCount>,
    pub conversion_rate: f64,
}

fn build_analytics_summary() -> rusqlite::Result<AnalyticsSummary> {
    let total_events = db::count_events()?;
    let counts = db::event_counts()?
        .into_iter()
        .map(|(name, count)| EventCount { name, count })
        .collect();
    let page_views = db::count_events_by_name("page_view")?;
    let signups = db::count_events_by_name("newsletter_signup_success")?;
    let conversion_rate = if page_views > 0 {
        signups as f64 / page_views as f64 * 100.0
    } else {
        0.0
    };
    Ok(AnalyticsSummary { total_events, counts, conversion_rate })
}

async fn analytics_summary_handler() -> Result<Json<AnalyticsSummary>, ApiError> {
    let summary = build_analytics_summary().map_err(|e| {
        logging::log_error(&format!("Failed to summarize analytics: {}", e));
        ApiError::internal("فشل في جلب التحليلات")
    })?;

    Ok(Json(summary))
}

// ============ Self-Test ============

#[derive(Debug, Serialize)]
pub struct EnvironmentStatus {
    pub groq_key: bool,
    pub gemini_key: bool,
    pub xai_key: bool,
}

#[derive(Debug, Serialize)]
pub struct TestResponse {
    pub timestamp: String,
    pub environment: EnvironmentStatus,
    pub status: String,
}

async fn test_handler(State(state): State<SharedState>) -> Json<TestResponse> {
    Json(TestResponse {
        timestamp: Utc::now().to_rfc3339(),
        environment: EnvironmentStatus {
            groq_key: state.chat.has_groq(),
            gemini_key: state.chat.has_gemini(),
            xai_key: state.chat.has_xai(),
        },
        status: "ready".to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct TestRunResponse {
    pub success: bool,
    pub providers: Vec<crate::chat::KeyValidation>,
    pub timestamp: String,
}

/// Live connection test against every configured provider.
async fn run_test_handler(State(state): State<SharedState>) -> Json<TestRunResponse> {
    let providers = state.chat.validate_keys().await;
    let success = providers
        .iter()
        .filter(|p| p.configured)
        .all(|p| p.valid == Some(true));

    Json(TestRunResponse {
        success,
        providers,
        timestamp: Utc::now().to_rfc3339(),
    })
}
