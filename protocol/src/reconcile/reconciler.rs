//! The hash reconciler.

use tracing::{debug, info, warn};

use super::ReconcileError;
use crate::address::Address;
use crate::cell::decode_base64;
use crate::config::ReconcilerConfig;
use crate::crypto::ContentHash;
use crate::ledger::{LedgerClient, LedgerError, TransactionId, TransactionRecord};

/// Validated reconciliation inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileRequest {
    /// Representation hash of the envelope's root cell.
    pub target: ContentHash,
    /// Account whose history is searched.
    pub owner: Address,
}

impl ReconcileRequest {
    /// Validate a base64 envelope and an owner address. Both are checked
    /// before anything touches the ledger.
    pub fn parse(envelope: &str, owner: &str) -> Result<Self, ReconcileError> {
        let envelope = envelope.trim();
        if envelope.is_empty() {
            return Err(ReconcileError::invalid("envelope", "missing"));
        }
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(ReconcileError::invalid("owner address", "missing"));
        }

        let root = decode_base64(envelope)
            .map_err(|e| ReconcileError::invalid("envelope", e.to_string()))?;
        let owner = Address::parse(owner)
            .map_err(|e| ReconcileError::invalid("owner address", e.to_string()))?;

        Ok(Self {
            target: root.hash(),
            owner,
        })
    }
}

/// Finds the transaction produced by a submitted envelope.
///
/// Each attempt fetches the owner's `window` most recent transactions and
/// compares the canonical hash of every external inbound message against
/// the envelope hash. Attempts repeat at a fixed delay until one matches or
/// the retry policy is exhausted.
pub struct HashReconciler<L> {
    ledger: L,
    config: ReconcilerConfig,
}

impl<L: LedgerClient> HashReconciler<L> {
    pub fn new(ledger: L, config: ReconcilerConfig) -> Self {
        Self { ledger, config }
    }

    pub fn with_defaults(ledger: L) -> Self {
        Self::new(ledger, ReconcilerConfig::default())
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Resolve `envelope` (base64 BoC) submitted by `owner` to the id of the
    /// transaction it produced.
    ///
    /// Fails with [`ReconcileError::InvalidArgument`] without any ledger
    /// query when an input is missing or malformed, and with
    /// [`ReconcileError::NotFound`] once every attempt has come up empty.
    pub async fn reconcile(
        &self,
        envelope: &str,
        owner: &str,
    ) -> Result<TransactionId, ReconcileError> {
        let request = ReconcileRequest::parse(envelope, owner)?;
        self.reconcile_request(&request).await
    }

    /// Retry loop over [`attempt`](Self::attempt) for an already validated
    /// request.
    pub async fn reconcile_request(
        &self,
        request: &ReconcileRequest,
    ) -> Result<TransactionId, ReconcileError> {
        let policy = self.config.retry;
        let mut last_error: Option<LedgerError> = None;
        let mut attempt: u32 = 1;

        debug!(
            target = %request.target,
            owner = %request.owner,
            max_attempts = policy.attempts(),
            "reconciling envelope"
        );

        loop {
            match self.attempt(request).await {
                Ok(id) => {
                    info!(attempt, tx = %id, target = %request.target, "envelope matched");
                    return Ok(id);
                }
                Err(ReconcileError::NotFoundYet) => {
                    debug!(attempt, "no match in window");
                }
                Err(ReconcileError::Ledger(e)) => {
                    warn!(attempt, error = %e, "ledger query failed");
                    last_error = Some(e);
                }
                Err(other) => return Err(other),
            }

            if !policy.allows_another(attempt) {
                break;
            }
            tokio::time::sleep(policy.delay).await;
            attempt += 1;
        }

        warn!(
            attempts = attempt,
            target = %request.target,
            "no matching transaction, giving up"
        );
        Err(ReconcileError::NotFound {
            attempts: attempt,
            last_error,
        })
    }

    /// One fetch-and-compare pass. Returns [`ReconcileError::NotFoundYet`]
    /// when no record in the window matches.
    pub async fn attempt(
        &self,
        request: &ReconcileRequest,
    ) -> Result<TransactionId, ReconcileError> {
        let records = self
            .ledger
            .get_transactions(&request.owner, self.config.window)
            .await?;
        find_match(&request.target, &records).ok_or(ReconcileError::NotFoundYet)
    }
}

/// First record whose external inbound message re-encodes to `target`.
pub fn find_match(target: &ContentHash, records: &[TransactionRecord]) -> Option<TransactionId> {
    records
        .iter()
        .find(|record| inbound_hash(record).is_some_and(|hash| hash == *target))
        .map(|record| record.hash)
}

/// Canonical hash of a record's inbound message, or `None` when the record
/// cannot be the envelope's transaction.
fn inbound_hash(record: &TransactionRecord) -> Option<ContentHash> {
    let message = match record.in_message() {
        Ok(Some(message)) => message,
        Ok(None) => {
            debug!(tx = %record.hash, "skipping: no inbound message");
            return None;
        }
        Err(e) => {
            warn!(tx = %record.hash, error = %e, "skipping: undecodable inbound message");
            return None;
        }
    };

    if !message.is_external_in() {
        debug!(tx = %record.hash, kind = %message.kind(), "skipping: not external-in");
        return None;
    }
    // An empty inline body counts as no body and is skipped, unlike
    // decoders that always yield a body cell and would still hash it.
    if message.body.is_none() {
        debug!(tx = %record.hash, "skipping: no body");
        return None;
    }

    match message.hash() {
        Ok(hash) => Some(hash),
        Err(e) => {
            warn!(tx = %record.hash, error = %e, "skipping: inbound message does not re-encode");
            None
        }
    }
}
