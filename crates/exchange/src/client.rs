use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method};
use serde::Deserialize;
use sha2::Sha256;
use std::env;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};

use common::models::{OrderKind, OrderRequest};

use crate::error::ExchangeError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Deserialize)]
pub struct OrderAck {
    #[serde(rename = "orderId")]
    pub order_id: u64,
    pub status: String,
    /// Set when the entry went live but a protective trigger order could
    /// not be attached. The position is open and unprotected; the caller
    /// must relay this to the requester.
    #[serde(skip)]
    pub protection_error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MarkPriceResponse {
    #[serde(rename = "markPrice")]
    mark_price: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

/// Opaque signed-request collaborator. The orchestrator only ever talks to
/// this trait, which keeps it testable without a network.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError>;
    async fn mark_price(&self, symbol: &str) -> Result<f64, ExchangeError>;
    async fn balance(&self) -> Result<String, ExchangeError>;
}

#[derive(Clone)]
pub struct BinanceFuturesClient {
    client: Client,
    base_url: String,
    api_key: String,
    secret_key: String,
}

impl BinanceFuturesClient {
    pub fn new(base_url: String, api_key: String, secret_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
            secret_key,
        }
    }

    pub fn from_env() -> Self {
        let api_key = env::var("BINANCE_API_KEY").expect("BINANCE_API_KEY not set");
        let secret_key = env::var("BINANCE_SECRET_KEY").expect("BINANCE_SECRET_KEY not set");
        let base_url = env::var("BINANCE_BASE_URL")
            .unwrap_or_else(|_| "https://fapi.binance.com".to_string());
        Self::new(base_url, api_key, secret_key)
    }

    fn sign(&self, query: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(query.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis() as u64
    }

    async fn signed_request(
        &self,
        method: Method,
        path: &str,
        params: String,
    ) -> Result<String, ExchangeError> {
        let params = if params.is_empty() {
            format!("timestamp={}", Self::timestamp())
        } else {
            format!("{params}&timestamp={}", Self::timestamp())
        };
        let signature = self.sign(&params);
        let url = format!("{}{path}?{params}&signature={signature}", self.base_url);

        let resp = self
            .client
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            error!("Binance request to {path} failed: {body}");
            return Err(match serde_json::from_str::<ApiError>(&body) {
                Ok(api) => ExchangeError::Rejected {
                    code: api.code,
                    message: api.msg,
                },
                Err(_) => ExchangeError::Rejected {
                    code: status.as_u16() as i64,
                    message: body,
                },
            });
        }
        Ok(body)
    }

    fn entry_query(order: &OrderRequest) -> String {
        let mut query = format!(
            "symbol={}&side={}&type={}&quantity={}&newClientOrderId={}",
            order.symbol,
            order.side,
            order.kind.as_str(),
            order.quantity,
            order.client_order_id,
        );
        if order.kind == OrderKind::Limit {
            if let Some(price) = order.price {
                query.push_str(&format!("&price={price}"));
            }
            let tif = order.time_in_force.as_deref().unwrap_or("GTC");
            query.push_str(&format!("&timeInForce={tif}"));
        }
        query
    }

    /// Close-position trigger order (take-profit or stop) on the opposite
    /// side of the entry, firing on mark price and filling at market.
    fn trigger_query(order: &OrderRequest, kind: &str, stop_price: f64) -> String {
        let close_side = if order.side == "BUY" { "SELL" } else { "BUY" };
        format!(
            "symbol={}&side={close_side}&type={kind}&stopPrice={stop_price}&closePosition=true&workingType={}&newClientOrderId={}-{}",
            order.symbol,
            order.working_type,
            order.client_order_id,
            kind.to_lowercase(),
        )
    }
}

#[async_trait]
impl ExchangeClient for BinanceFuturesClient {
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        info!(
            "Placing {} {} {} qty={}",
            order.kind.as_str(),
            order.side,
            order.symbol,
            order.quantity
        );
        let body = self
            .signed_request(Method::POST, "/fapi/v1/order", Self::entry_query(order))
            .await?;
        let mut ack: OrderAck = serde_json::from_str(&body)?;

        // The entry is live from here on; a failed protective order is
        // never rolled back, but it must travel up to the requester so
        // the unprotected position is not mistaken for a fully placed one.
        let mut failures = Vec::new();
        for (kind, price) in [
            ("TAKE_PROFIT_MARKET", order.take_profit),
            ("STOP_MARKET", order.stop_loss),
        ] {
            if let Err(e) = self
                .signed_request(Method::POST, "/fapi/v1/order", Self::trigger_query(order, kind, price))
                .await
            {
                error!("Failed to attach {kind} for {}: {e}", order.symbol);
                failures.push(format!("{kind} not attached: {e}"));
            }
        }
        if !failures.is_empty() {
            ack.protection_error = Some(failures.join("; "));
        }

        info!("ORDER EXECUTED: ID={}, Status={}", ack.order_id, ack.status);
        Ok(ack)
    }

    async fn mark_price(&self, symbol: &str) -> Result<f64, ExchangeError> {
        let url = format!("{}/fapi/v1/premiumIndex?symbol={symbol}", self.base_url);
        let fetch = async {
            let resp = self.client.get(&url).send().await.ok()?;
            if !resp.status().is_success() {
                return None;
            }
            let payload = resp.json::<MarkPriceResponse>().await.ok()?;
            payload.mark_price.parse::<f64>().ok()
        };
        fetch
            .await
            .ok_or_else(|| ExchangeError::PriceUnavailable(symbol.to_string()))
    }

    async fn balance(&self) -> Result<String, ExchangeError> {
        self.signed_request(Method::GET, "/fapi/v2/balance", String::new())
            .await
    }
}
