//! JSON-RPC client for the public ledger indexer (toncenter v2 API).

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{LedgerClient, LedgerError, RecordError, TransactionRecord};
use crate::address::Address;
use crate::config::{LedgerConfig, API_KEY_HEADER};
use crate::crypto::ContentHash;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: P,
}

#[derive(Debug, Serialize)]
struct GetTransactionsParams<'a> {
    address: &'a str,
    limit: usize,
    archival: bool,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTransaction {
    data: String,
    #[serde(default)]
    transaction_id: Option<RawTransactionId>,
}

#[derive(Debug, Deserialize)]
struct RawTransactionId {
    #[serde(default)]
    hash: Option<String>,
}

/// [`LedgerClient`] over the indexer's `getTransactions` method.
pub struct ToncenterClient {
    config: LedgerConfig,
    client: Client,
}

impl ToncenterClient {
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl LedgerClient for ToncenterClient {
    async fn get_transactions(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        let raw_address = address.to_raw_string();
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "getTransactions",
            params: GetTransactionsParams {
                address: &raw_address,
                limit,
                archival: true,
            },
        };

        let mut builder = self.client.post(&self.config.endpoint).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let response = builder.send().await.map_err(|e| {
            error!(endpoint = %self.config.endpoint, "getTransactions request failed: {}", e);
            LedgerError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await?;
        debug!(%status, bytes = body.len(), "getTransactions response");

        let raw = parse_response(status.as_u16(), &body)?;
        decode_transactions(address.workchain, raw)
    }
}

/// Unwrap the JSON-RPC envelope. Non-2xx statuses and `ok: false` both
/// become [`LedgerError::Api`]; the indexer's own message wins when present.
pub(crate) fn parse_response(status: u16, body: &str) -> Result<Vec<RawTransaction>, LedgerError> {
    let parsed = serde_json::from_str::<JsonRpcResponse<Vec<RawTransaction>>>(body);

    if !(200..300).contains(&status) {
        let message = match parsed {
            Ok(JsonRpcResponse { error: Some(msg), .. }) => msg,
            _ => body.chars().take(200).collect(),
        };
        return Err(LedgerError::Api {
            code: status as i64,
            message,
        });
    }

    let parsed = parsed.map_err(|e| LedgerError::Transport(format!("invalid JSON-RPC body: {e}")))?;
    if !parsed.ok {
        return Err(LedgerError::Api {
            code: parsed.code.unwrap_or(status as i64),
            message: parsed.error.unwrap_or_else(|| "unknown error".to_string()),
        });
    }

    Ok(parsed.result.unwrap_or_default())
}

/// Decode each transaction document and cross-check the indexer's hash.
pub(crate) fn decode_transactions(
    workchain: i8,
    raw: Vec<RawTransaction>,
) -> Result<Vec<TransactionRecord>, LedgerError> {
    raw.into_iter()
        .map(|tx| {
            let record = TransactionRecord::from_boc(workchain, &tx.data)?;
            if let Some(reported) = tx.transaction_id.and_then(|id| id.hash) {
                let reported = decode_reported_hash(&reported)?;
                if reported != record.hash {
                    return Err(RecordError::HashMismatch {
                        reported,
                        computed: record.hash,
                    }
                    .into());
                }
            }
            Ok(record)
        })
        .collect()
}

fn decode_reported_hash(encoded: &str) -> Result<ContentHash, RecordError> {
    let bytes = STANDARD.decode(encoded).map_err(|e| RecordError::Field {
        field: "transaction_id.hash",
        reason: e.to_string(),
    })?;
    ContentHash::try_from(bytes.as_slice()).map_err(|e| RecordError::Field {
        field: "transaction_id.hash",
        reason: e.to_string(),
    })
}
