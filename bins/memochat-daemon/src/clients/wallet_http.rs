use crate::config::WalletConfig;
use async_trait::async_trait;
use memochat_core::rpc::{
    ChainInfo, OperationResult, OperationStatus, RpcError, Unspent, WalletRpc,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Base units per coin in the daemon's decimal amounts.
const COIN: f64 = 100_000_000.0;

/// JSON-RPC client for the wallet node, speaking the zcashd-flavoured
/// shielded method set.
pub struct WalletHttpClient {
    url: String,
    rpc_user: Option<String>,
    rpc_password: Option<String>,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct StatusEntry {
    status: String,
}

#[derive(Deserialize)]
struct ResultEntry {
    status: String,
    result: Option<TxRef>,
}

#[derive(Deserialize)]
struct TxRef {
    txid: String,
}

#[derive(Deserialize)]
struct UnspentEntry {
    txid: String,
    amount: f64,
    #[serde(default)]
    memo: Option<String>,
}

#[derive(Deserialize)]
struct BlockchainInfo {
    mediantime: u64,
}

impl WalletHttpClient {
    pub fn new(cfg: &WalletConfig) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|_| RpcError("http client".to_string()))?;
        Ok(Self {
            url: cfg.url.trim_end_matches('/').to_string(),
            rpc_user: cfg.rpc_user.clone(),
            rpc_password: cfg.rpc_password.clone(),
            http,
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let body = json!({
            "jsonrpc": "1.0",
            "id": "memochat",
            "method": method,
            "params": params,
        });
        let mut builder = self.http.post(&self.url).json(&body);
        if let Some(user) = self.rpc_user.as_ref() {
            builder = builder.basic_auth(user, self.rpc_password.as_deref());
        }
        let response = builder
            .send()
            .await
            .map_err(|e| RpcError(format!("{method}: {e}")))?;
        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError(format!("{method}: {e}")))?;
        if let Some(error) = parsed.error {
            return Err(RpcError(format!(
                "{method}: {} (code {})",
                error.message, error.code
            )));
        }
        parsed
            .result
            .ok_or_else(|| RpcError(format!("{method}: empty result")))
    }

    fn parse<T: for<'de> Deserialize<'de>>(method: &str, value: Value) -> Result<T, RpcError> {
        serde_json::from_value(value).map_err(|e| RpcError(format!("{method}: {e}")))
    }
}

fn to_coins(amount: u64) -> f64 {
    amount as f64 / COIN
}

fn from_coins(amount: f64) -> u64 {
    (amount * COIN).round() as u64
}

#[async_trait]
impl WalletRpc for WalletHttpClient {
    async fn get_new_address(&self) -> Result<String, RpcError> {
        let value = self.call("z_getnewaddress", json!([])).await?;
        Self::parse("z_getnewaddress", value)
    }

    async fn export_key(&self, address: &str) -> Result<String, RpcError> {
        let value = self.call("z_exportkey", json!([address])).await?;
        Self::parse("z_exportkey", value)
    }

    async fn import_private_key(&self, key: &str) -> Result<String, RpcError> {
        let value = self.call("z_importkey", json!([key])).await?;
        // The node reports which address the key controls.
        Self::parse("z_importkey", value)
    }

    async fn send_memo(
        &self,
        from: &str,
        to: &str,
        amount: u64,
        fee: u64,
        memo_hex: &str,
    ) -> Result<String, RpcError> {
        let recipients = json!([{
            "address": to,
            "amount": to_coins(amount),
            "memo": memo_hex,
        }]);
        let value = self
            .call("z_sendmany", json!([from, recipients, 1, to_coins(fee)]))
            .await?;
        Self::parse("z_sendmany", value)
    }

    async fn operation_status(&self, operation_id: &str) -> Result<Vec<OperationStatus>, RpcError> {
        let value = self
            .call("z_getoperationstatus", json!([[operation_id]]))
            .await?;
        let entries: Vec<StatusEntry> = Self::parse("z_getoperationstatus", value)?;
        Ok(entries
            .into_iter()
            .map(|e| OperationStatus { status: e.status })
            .collect())
    }

    async fn operation_result(&self, operation_id: &str) -> Result<Vec<OperationResult>, RpcError> {
        let value = self
            .call("z_getoperationresult", json!([[operation_id]]))
            .await?;
        let entries: Vec<ResultEntry> = Self::parse("z_getoperationresult", value)?;
        Ok(entries
            .into_iter()
            .map(|e| OperationResult {
                status: e.status,
                txid: e.result.map(|r| r.txid),
            })
            .collect())
    }

    async fn list_unspent(&self, address: &str, min_conf: u32) -> Result<Vec<Unspent>, RpcError> {
        let value = self
            .call(
                "z_listunspent",
                json!([min_conf, 9_999_999, false, [address]]),
            )
            .await?;
        let entries: Vec<UnspentEntry> = Self::parse("z_listunspent", value)?;
        Ok(entries
            .into_iter()
            .map(|e| Unspent {
                txid: e.txid,
                amount: from_coins(e.amount),
                memo_hex: e.memo.unwrap_or_default(),
            })
            .collect())
    }

    async fn balance(&self, address: &str) -> Result<u64, RpcError> {
        let value = self.call("z_getbalance", json!([address])).await?;
        let coins: f64 = Self::parse("z_getbalance", value)?;
        Ok(from_coins(coins))
    }

    async fn chain_info(&self) -> Result<ChainInfo, RpcError> {
        let value = self.call("getblockchaininfo", json!([])).await?;
        let info: BlockchainInfo = Self::parse("getblockchaininfo", value)?;
        Ok(ChainInfo {
            mediantime: info.mediantime,
        })
    }
}
