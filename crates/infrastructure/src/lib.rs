//! Infrastructure adapters for the Issuegate application ports.

#![forbid(unsafe_code)]

mod console_approval_notifier;
mod http_identity_verifier;
mod in_memory_repositories;
mod postgres_approval_repository;
mod postgres_audit_log_repository;
mod postgres_directory_repository;
mod postgres_issue_repository;
mod postgres_settings_repository;
mod static_identity_verifier;
mod webhook_approval_notifier;

pub use console_approval_notifier::ConsoleApprovalNotifier;
pub use http_identity_verifier::HttpIdentityVerifier;
pub use in_memory_repositories::{
    InMemoryApprovalRepository, InMemoryAuditLog, InMemoryDirectory, InMemoryIssueRepository,
    InMemorySettings,
};
pub use postgres_approval_repository::PostgresApprovalRepository;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_directory_repository::PostgresDirectoryRepository;
pub use postgres_issue_repository::PostgresIssueRepository;
pub use postgres_settings_repository::PostgresSettingsRepository;
pub use static_identity_verifier::StaticIdentityVerifier;
pub use webhook_approval_notifier::WebhookApprovalNotifier;
