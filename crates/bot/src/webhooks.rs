//! Webhook payload parsing and signature verification.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Verify a GitHub webhook signature (`X-Hub-Signature-256` header).
///
/// # Arguments
/// * `body` - Raw webhook body bytes
/// * `signature` - Header value, `sha256=<hex>`
/// * `secret` - Webhook signing secret
///
/// # Returns
/// `true` if the signature is valid, `false` otherwise
#[must_use]
pub fn verify_webhook_signature(body: &[u8], signature: &str, secret: &str) -> bool {
    let Some(hex_digest) = signature.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(signature_bytes) = hex::decode(hex_digest) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let computed = mac.finalize().into_bytes();

    // Constant-time comparison to prevent timing attacks
    computed.as_slice().ct_eq(&signature_bytes).into()
}

/// An account in a webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct EventAccount {
    /// Account login
    pub login: String,
    /// Numeric account id
    pub id: u64,
}

/// The issue a comment was posted on.
#[derive(Debug, Clone, Deserialize)]
pub struct EventIssue {
    /// Issue number
    pub number: u64,
}

/// The comment itself.
#[derive(Debug, Clone, Deserialize)]
pub struct EventComment {
    /// Comment body
    #[serde(default)]
    pub body: String,
    /// Comment author
    pub user: EventAccount,
}

/// The repository the event originated from.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRepository {
    /// Full name (owner/repo)
    pub full_name: String,
}

/// GitHub `issue_comment` event payload (simplified).
#[derive(Debug, Clone, Deserialize)]
pub struct IssueCommentEvent {
    /// Action type (created, edited, deleted)
    pub action: String,
    /// Issue the comment belongs to
    pub issue: EventIssue,
    /// The comment
    pub comment: EventComment,
    /// Repository info
    pub repository: EventRepository,
}
