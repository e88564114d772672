//! # nb-api Handlers
//!
//! Coordinates the flow between HTTP requests and the core components.
//! Authentication is an external collaborator: these handlers only lift
//! the already-verified identity headers into an explicit [`Session`] and
//! reject mutations that arrive without one.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use nb_core::{
    BoardError, BoardStore, PostRecord, Session, ThreadPath, VoteDirection, VoteOutcome,
};
use nb_view::{ReplyOutcome, ThreadSnapshot, ThreadView};

/// State shared across all handlers.
pub struct AppState {
    pub store: Arc<dyn BoardStore>,
}

/// HTTP-boundary error: the core's typed failures plus the one condition
/// only this layer knows about (a missing session).
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Board(BoardError),
}

impl From<BoardError> for ApiError {
    fn from(err: BoardError) -> Self {
        ApiError::Board(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "sign in to interact with the board".to_string(),
            ),
            ApiError::Board(err) => {
                let status = match &err {
                    BoardError::NotFound(..) => StatusCode::NOT_FOUND,
                    BoardError::MalformedPath(_) | BoardError::OrphanComment { .. } => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    BoardError::Store(_) => StatusCode::BAD_GATEWAY,
                };
                (status, err.to_string())
            }
        };
        (status, message).into_response()
    }
}

/// Reads the identity headers the auth collaborator sets. `None` is a
/// legitimate anonymous read; mutations go through [`require_session`].
fn session_from_headers(headers: &HeaderMap) -> Option<Session> {
    let user_id = headers.get("x-user-id")?.to_str().ok()?;
    let user_id = Uuid::parse_str(user_id).ok()?;
    let display_name = headers
        .get("x-user-name")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("anonymous");
    Some(Session::new(user_id, display_name))
}

fn require_session(headers: &HeaderMap) -> Result<Session, ApiError> {
    session_from_headers(headers).ok_or(ApiError::Unauthorized)
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /posts: the board listing, newest first.
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<PostRecord>>, ApiError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);
    let posts = state.store.list_posts(limit, offset).await?;
    Ok(Json(posts))
}

#[derive(Debug, Deserialize)]
pub struct CreatePostBody {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

/// POST /posts: create a new top-level post.
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreatePostBody>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let session = require_session(&headers)?;
    let id = state
        .store
        .create_post(&session, &body.title, &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// GET /posts/{post_id}: the nested thread plus the caller's vote map.
pub async fn view_thread(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<ThreadSnapshot>, ApiError> {
    let session = session_from_headers(&headers);
    let view = ThreadView::new(state.store.clone(), post_id);
    match view.load(session.as_ref()).await? {
        Some(snapshot) => Ok(Json(snapshot)),
        // A per-request view is never superseded, but the contract allows
        // it; treat it like a failed fetch.
        None => Err(ApiError::Board(BoardError::NotFound("post", post_id))),
    }
}

#[derive(Debug, Deserialize)]
pub struct VoteBody {
    pub item_id: Uuid,
    pub direction: VoteDirection,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// The authoritative re-read after an accepted vote.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<ThreadSnapshot>,
}

/// POST /posts/{post_id}/votes: cast or flip a vote on the post or any
/// comment in its thread.
pub async fn cast_vote(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<VoteBody>,
) -> Result<(StatusCode, Json<VoteResponse>), ApiError> {
    let session = require_session(&headers)?;
    let view = ThreadView::new(state.store.clone(), post_id);
    match view.vote(&session, body.item_id, body.direction).await {
        VoteOutcome::Accepted => {
            let thread = view.state().await.snapshot().cloned();
            Ok((
                StatusCode::OK,
                Json(VoteResponse {
                    accepted: true,
                    reason: None,
                    thread,
                }),
            ))
        }
        VoteOutcome::Rejected { reason } => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(VoteResponse {
                accepted: false,
                reason: Some(reason),
                thread: None,
            }),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReplyBody {
    pub parent_path: String,
    pub parent_id: Uuid,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub posted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<ThreadSnapshot>,
}

/// POST /posts/{post_id}/comments: reply to the post or to a comment.
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<ReplyBody>,
) -> Result<(StatusCode, Json<ReplyResponse>), ApiError> {
    let session = require_session(&headers)?;
    let parent_path = ThreadPath::parse(&body.parent_path)?;

    let view = ThreadView::new(state.store.clone(), post_id);
    match view
        .reply(&session, &parent_path, body.parent_id, &body.content)
        .await
    {
        ReplyOutcome::Posted { comment_id } => {
            let thread = view.state().await.snapshot().cloned();
            Ok((
                StatusCode::CREATED,
                Json(ReplyResponse {
                    posted: true,
                    comment_id: Some(comment_id),
                    reason: None,
                    thread,
                }),
            ))
        }
        ReplyOutcome::Rejected { reason } => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ReplyResponse {
                posted: false,
                comment_id: None,
                reason: Some(reason),
                thread: None,
            }),
        )),
    }
}
