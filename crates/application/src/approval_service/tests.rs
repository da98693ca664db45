use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use issuegate_core::{AppError, AppResult};
use issuegate_domain::{
    APPROVAL_ACTION_CLOSE, ApprovalDecision, ApprovalRequest, ApprovalStatus, AuditLogEntry, Issue,
    IssueClosure, IssueStatus, NewApprovalRequest,
};
use tokio::sync::Mutex;

use crate::AuditRepository;

use super::{
    AppSettings, ApprovalNotification, ApprovalNotifier, ApprovalRepository, ApprovalService,
    CreateApprovalInput, DecisionOutcome, IssueRepository, SettingsSource,
};

#[derive(Default)]
struct FakeApprovalRepository {
    requests: Mutex<HashMap<String, ApprovalRequest>>,
    lose_every_race: AtomicBool,
}

#[async_trait]
impl ApprovalRepository for FakeApprovalRepository {
    async fn create(&self, request: NewApprovalRequest) -> AppResult<String> {
        let mut requests = self.requests.lock().await;
        let id = format!("apr-{}", requests.len() + 1);
        requests.insert(
            id.clone(),
            ApprovalRequest {
                id: id.clone(),
                issue_id: request.issue_id,
                action: APPROVAL_ACTION_CLOSE.to_owned(),
                status: ApprovalStatus::Pending,
                requested_by: request.requested_by,
                requested_at: Some(Utc::now()),
                decided_at: None,
                decided_by: None,
                closure_note: request.closure_note,
                closure_photo_url: request.closure_photo_url,
                approver_emails: request.approver_emails,
                token_hash: request.token_hash,
            },
        );
        Ok(id)
    }

    async fn find(&self, id: &str) -> AppResult<Option<ApprovalRequest>> {
        Ok(self.requests.lock().await.get(id).cloned())
    }

    async fn record_decision(
        &self,
        id: &str,
        status: ApprovalStatus,
        decided_by: &str,
    ) -> AppResult<bool> {
        if self.lose_every_race.load(Ordering::SeqCst) {
            return Ok(false);
        }

        let mut requests = self.requests.lock().await;
        let request = requests
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("approval '{id}' does not exist")))?;

        if request.status.is_terminal() {
            return Ok(false);
        }

        request.status = status;
        request.decided_by = Some(decided_by.to_owned());
        request.decided_at = Some(Utc::now());
        Ok(true)
    }
}

#[derive(Default)]
struct FakeIssueRepository {
    issues: Mutex<HashMap<String, Issue>>,
}

impl FakeIssueRepository {
    async fn seed_open(&self, issue_id: &str) {
        self.issues
            .lock()
            .await
            .insert(issue_id.to_owned(), Issue::open(issue_id));
    }

    async fn get(&self, issue_id: &str) -> Option<Issue> {
        self.issues.lock().await.get(issue_id).cloned()
    }
}

#[async_trait]
impl IssueRepository for FakeIssueRepository {
    async fn mark_pending_approval(&self, issue_id: &str) -> AppResult<()> {
        let mut issues = self.issues.lock().await;
        let issue = issues
            .get_mut(issue_id)
            .ok_or_else(|| AppError::NotFound(format!("issue '{issue_id}' does not exist")))?;
        issue.status = IssueStatus::PendingApproval;
        issue.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn close(&self, issue_id: &str, closure: &IssueClosure) -> AppResult<()> {
        let mut issues = self.issues.lock().await;
        let issue = issues
            .get_mut(issue_id)
            .ok_or_else(|| AppError::NotFound(format!("issue '{issue_id}' does not exist")))?;
        issue.status = IssueStatus::Closed;
        issue.closed_by = Some(closure.closed_by.clone());
        issue.closure_note = closure.closure_note.clone();
        issue.closure_photo_url = closure.closure_photo_url.clone();
        issue.closed_at = Some(Utc::now());
        issue.updated_at = Some(Utc::now());
        Ok(())
    }
}

struct FakeSettings {
    settings: AppSettings,
}

#[async_trait]
impl SettingsSource for FakeSettings {
    async fn load(&self) -> AppResult<AppSettings> {
        Ok(self.settings.clone())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, ApprovalNotification)>>,
    fail: AtomicBool,
}

#[async_trait]
impl ApprovalNotifier for RecordingNotifier {
    async fn send(&self, webhook_url: &str, notification: &ApprovalNotification) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("webhook unreachable".to_owned()));
        }
        self.sent
            .lock()
            .await
            .push((webhook_url.to_owned(), notification.clone()));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingAudit {
    entries: Mutex<Vec<AuditLogEntry>>,
}

#[async_trait]
impl AuditRepository for RecordingAudit {
    async fn append(&self, entry: AuditLogEntry) -> AppResult<()> {
        self.entries.lock().await.push(entry);
        Ok(())
    }
}

struct Harness {
    service: ApprovalService,
    approvals: Arc<FakeApprovalRepository>,
    issues: Arc<FakeIssueRepository>,
    notifier: Arc<RecordingNotifier>,
    audit: Arc<RecordingAudit>,
}

fn harness_with_settings(settings: AppSettings) -> Harness {
    let approvals = Arc::new(FakeApprovalRepository::default());
    let issues = Arc::new(FakeIssueRepository::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let audit = Arc::new(RecordingAudit::default());
    let service = ApprovalService::new(
        approvals.clone(),
        issues.clone(),
        Arc::new(FakeSettings { settings }),
        notifier.clone(),
        audit.clone(),
        "https://issues.example.com/".to_owned(),
    );

    Harness {
        service,
        approvals,
        issues,
        notifier,
        audit,
    }
}

fn harness() -> Harness {
    harness_with_settings(AppSettings {
        notification_webhook_url: Some("https://hooks.example.com/approvals".to_owned()),
        approver_emails: vec!["lead@example.com".to_owned()],
    })
}

fn token_from(notification: &ApprovalNotification) -> String {
    notification
        .approve_url
        .rsplit_once("token=")
        .map(|(_, token)| token.to_owned())
        .unwrap_or_default()
}

async fn create_pending(harness: &Harness, issue_id: &str) -> (String, String) {
    harness.issues.seed_open(issue_id).await;
    let receipt = harness
        .service
        .create(CreateApprovalInput {
            issue_id: issue_id.to_owned(),
            ..CreateApprovalInput::default()
        })
        .await;
    let id = receipt.map(|receipt| receipt.id).unwrap_or_default();
    let sent = harness.notifier.sent.lock().await;
    let token = sent
        .last()
        .map(|(_, notification)| token_from(notification))
        .unwrap_or_default();
    (id, token)
}

#[tokio::test]
async fn create_rejects_missing_issue_id() {
    let harness = harness();
    let result = harness.service.create(CreateApprovalInput::default()).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn create_marks_issue_pending_and_returns_pending_receipt() {
    let harness = harness();
    harness.issues.seed_open("ISS-1").await;

    let receipt = harness
        .service
        .create(CreateApprovalInput {
            issue_id: "ISS-1".to_owned(),
            ..CreateApprovalInput::default()
        })
        .await;

    assert!(receipt.is_ok_and(|receipt| receipt.status == ApprovalStatus::Pending));
    let issue = harness.issues.get("ISS-1").await;
    assert!(issue.is_some_and(|issue| issue.status == IssueStatus::PendingApproval));
}

#[tokio::test]
async fn create_persists_only_the_token_hash() {
    let harness = harness();
    let (id, token) = create_pending(&harness, "ISS-1").await;

    let stored = harness.approvals.find(id.as_str()).await;
    assert!(stored.is_ok());
    if let Ok(Some(request)) = stored {
        assert_eq!(request.token_hash.len(), 64);
        assert_ne!(request.token_hash, token);
        assert_eq!(request.approver_emails, vec!["lead@example.com".to_owned()]);
        assert_eq!(request.action, APPROVAL_ACTION_CLOSE);
    }
}

#[tokio::test]
async fn create_survives_a_missing_issue_record() {
    let harness = harness();

    // No seeded issue: the pending_approval mirror write fails and is logged.
    let receipt = harness
        .service
        .create(CreateApprovalInput {
            issue_id: "ISS-404".to_owned(),
            ..CreateApprovalInput::default()
        })
        .await;

    assert!(receipt.is_ok_and(|receipt| receipt.status == ApprovalStatus::Pending));
}

#[tokio::test]
async fn create_skips_notification_when_no_webhook_is_configured() {
    let harness = harness_with_settings(AppSettings::default());
    harness.issues.seed_open("ISS-1").await;

    let receipt = harness
        .service
        .create(CreateApprovalInput {
            issue_id: "ISS-1".to_owned(),
            ..CreateApprovalInput::default()
        })
        .await;

    assert!(receipt.is_ok());
    assert!(harness.notifier.sent.lock().await.is_empty());
}

#[tokio::test]
async fn create_survives_notifier_failure() {
    let harness = harness();
    harness.notifier.fail.store(true, Ordering::SeqCst);
    harness.issues.seed_open("ISS-1").await;

    let receipt = harness
        .service
        .create(CreateApprovalInput {
            issue_id: "ISS-1".to_owned(),
            ..CreateApprovalInput::default()
        })
        .await;

    assert!(receipt.is_ok());
}

#[tokio::test]
async fn notification_embeds_decision_links_with_the_raw_secret() {
    let harness = harness();
    let (id, token) = create_pending(&harness, "ISS-1").await;

    let sent = harness.notifier.sent.lock().await;
    assert_eq!(sent.len(), 1);
    if let Some((webhook_url, notification)) = sent.first() {
        assert_eq!(webhook_url, "https://hooks.example.com/approvals");
        assert_eq!(token.len(), 48);
        assert_eq!(
            notification.approve_url,
            format!(
                "https://issues.example.com/api/approvals/decision?id={id}&decision=approve&token={token}"
            )
        );
        assert!(notification.reject_url.contains("decision=reject"));
    }
}

#[tokio::test]
async fn approve_closes_the_issue_and_audits_the_decision() {
    let harness = harness();
    let (id, token) = create_pending(&harness, "ISS-1").await;

    let outcome = harness
        .service
        .decide(id.as_str(), ApprovalDecision::Approve, token.as_str())
        .await;

    assert!(matches!(
        outcome,
        Ok(DecisionOutcome::Decided {
            decision: ApprovalDecision::Approve,
            ..
        })
    ));

    let issue = harness.issues.get("ISS-1").await;
    assert!(issue.is_some_and(|issue| {
        issue.status == IssueStatus::Closed
            && issue.closed_by.as_deref() == Some(super::CLOSED_BY_CHANNEL)
            && issue.closure_note.is_none()
    }));

    let entries = harness.audit.entries.lock().await;
    assert_eq!(entries.len(), 1);
    if let Some(entry) = entries.first() {
        assert_eq!(entry.entity_id, "ISS-1");
        assert_eq!(entry.after["decision"], "approved");
        assert_eq!(entry.after["decidedBy"], super::DECIDED_BY_CHANNEL);
    }
}

#[tokio::test]
async fn reject_audits_without_touching_the_issue() {
    let harness = harness();
    let (id, token) = create_pending(&harness, "ISS-2").await;

    let outcome = harness
        .service
        .decide(id.as_str(), ApprovalDecision::Reject, token.as_str())
        .await;

    assert!(matches!(outcome, Ok(DecisionOutcome::Decided { .. })));
    let issue = harness.issues.get("ISS-2").await;
    assert!(issue.is_some_and(|issue| issue.status == IssueStatus::PendingApproval));

    let entries = harness.audit.entries.lock().await;
    assert_eq!(entries.len(), 1);
    if let Some(entry) = entries.first() {
        assert_eq!(entry.after["decision"], "rejected");
    }
}

#[tokio::test]
async fn replay_is_neutral_and_applies_no_second_side_effect() {
    let harness = harness();
    let (id, token) = create_pending(&harness, "ISS-1").await;

    let first = harness
        .service
        .decide(id.as_str(), ApprovalDecision::Approve, token.as_str())
        .await;
    assert!(matches!(first, Ok(DecisionOutcome::Decided { .. })));
    let closed_at = harness.issues.get("ISS-1").await.and_then(|issue| issue.closed_at);

    // Same link clicked again, then the opposite decision replayed.
    let replay = harness
        .service
        .decide(id.as_str(), ApprovalDecision::Approve, token.as_str())
        .await;
    assert!(matches!(replay, Ok(DecisionOutcome::AlreadyCompleted)));
    let opposite = harness
        .service
        .decide(id.as_str(), ApprovalDecision::Reject, token.as_str())
        .await;
    assert!(matches!(opposite, Ok(DecisionOutcome::AlreadyCompleted)));

    assert_eq!(harness.audit.entries.lock().await.len(), 1);
    let issue = harness.issues.get("ISS-1").await;
    assert!(issue.is_some_and(|issue| {
        issue.status == IssueStatus::Closed && issue.closed_at == closed_at
    }));
}

#[tokio::test]
async fn wrong_token_is_forbidden_and_leaves_the_request_pending() {
    let harness = harness();
    let (id, _token) = create_pending(&harness, "ISS-1").await;

    let outcome = harness
        .service
        .decide(id.as_str(), ApprovalDecision::Approve, "not-the-secret")
        .await;

    assert!(matches!(outcome, Err(AppError::Forbidden(_))));
    let stored = harness.approvals.find(id.as_str()).await;
    assert!(matches!(
        stored,
        Ok(Some(ApprovalRequest {
            status: ApprovalStatus::Pending,
            ..
        }))
    ));
    assert!(harness.audit.entries.lock().await.is_empty());
}

#[tokio::test]
async fn unknown_request_id_is_not_found() {
    let harness = harness();
    let outcome = harness
        .service
        .decide("apr-404", ApprovalDecision::Approve, "whatever")
        .await;
    assert!(matches!(outcome, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn losing_the_decision_race_reads_as_already_completed() {
    let harness = harness();
    let (id, token) = create_pending(&harness, "ISS-1").await;
    harness.approvals.lose_every_race.store(true, Ordering::SeqCst);

    let outcome = harness
        .service
        .decide(id.as_str(), ApprovalDecision::Approve, token.as_str())
        .await;

    assert!(matches!(outcome, Ok(DecisionOutcome::AlreadyCompleted)));
    let issue = harness.issues.get("ISS-1").await;
    assert!(issue.is_some_and(|issue| issue.status != IssueStatus::Closed));
    assert!(harness.audit.entries.lock().await.is_empty());
}
