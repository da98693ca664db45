use std::str::FromStr;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use issuegate_application::{ApprovalDecision, CreateApprovalInput, DecisionOutcome};
use issuegate_core::AppError;

use crate::dto::{CreateApprovalRequest, CreateApprovalResponse, DecisionParams};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_approval_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateApprovalRequest>,
) -> ApiResult<Json<CreateApprovalResponse>> {
    let receipt = state
        .approval_service
        .create(CreateApprovalInput {
            issue_id: payload.issue_id,
            closure_note: payload.closure_note,
            closure_photo_url: payload.closure_photo_url,
            requested_by: payload.requested_by,
        })
        .await?;

    Ok(Json(CreateApprovalResponse {
        id: receipt.id,
        status: receipt.status.as_str(),
    }))
}

/// Consumes a clicked decision link.
///
/// This endpoint is reached from a chat card, not a programmatic client,
/// so every outcome renders a readable HTML page.
pub async fn approval_decision_handler(
    State(state): State<AppState>,
    Query(params): Query<DecisionParams>,
) -> Response {
    let (Some(id), Some(decision), Some(token)) = (params.id, params.decision, params.token)
    else {
        return decision_page(StatusCode::BAD_REQUEST, "Missing Parameters", "The decision link is incomplete.");
    };

    let decision = match ApprovalDecision::from_str(decision.as_str()) {
        Ok(decision) => decision,
        Err(_) => {
            return decision_page(
                StatusCode::BAD_REQUEST,
                "Invalid Decision",
                "The decision must be either approve or reject.",
            );
        }
    };

    match state
        .approval_service
        .decide(id.as_str(), decision, token.as_str())
        .await
    {
        Ok(DecisionOutcome::Decided { decision, issue_id }) => {
            let (title, body) = match decision {
                ApprovalDecision::Approve => (
                    "Approval Approved",
                    format!("Issue {issue_id} has been approved for closure."),
                ),
                ApprovalDecision::Reject => (
                    "Approval Rejected",
                    format!("Issue {issue_id} has been rejected."),
                ),
            };
            decision_page(StatusCode::OK, title, body.as_str())
        }
        Ok(DecisionOutcome::AlreadyCompleted) => decision_page(
            StatusCode::OK,
            "Approval Completed",
            "This approval is already completed.",
        ),
        Err(AppError::NotFound(_)) => decision_page(
            StatusCode::NOT_FOUND,
            "Approval Not Found",
            "This approval request does not exist.",
        ),
        Err(AppError::Forbidden(_)) => decision_page(
            StatusCode::FORBIDDEN,
            "Invalid Token",
            "The decision token is not valid for this approval.",
        ),
        Err(error) => {
            tracing::error!(%error, "approval decision failed");
            decision_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error",
                "An error occurred.",
            )
        }
    }
}

fn decision_page(status: StatusCode, title: &str, body: &str) -> Response {
    // The body can carry an issue id that entered through the
    // unauthenticated create endpoint, so it must never reach the page
    // as markup.
    let title = escape_html(title);
    let body = escape_html(body);
    let html = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"/><title>{title}</title></head>\
         <body style=\"font-family:Segoe UI,Arial,sans-serif;padding:24px\">\
         <h2>{title}</h2><p>{body}</p></body></html>"
    );

    (status, Html(html)).into_response()
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(character),
        }
    }
    escaped
}
