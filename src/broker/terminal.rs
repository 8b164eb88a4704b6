use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::TerminalApi;
use crate::error::TickError;
use crate::models::{Candle, OrderReceipt, OrderRequest, Quote, Timeframe};

/// Client for an MT5-style terminal REST bridge
///
/// The bridge fronts a single broker terminal connection. Sessions are
/// acquired per tick and released afterwards; the old pattern of
/// connecting and disconnecting the terminal around every individual
/// call is replaced by this scoped acquisition.
#[derive(Debug, Clone)]
pub struct TerminalClient {
    client: Client,
    base_url: String,
}

/// A held terminal session; release it when the tick is done
#[derive(Debug)]
pub struct TerminalSession {
    client: Client,
    base_url: String,
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct CandleData {
    /// Unix timestamp, seconds
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    tick_volume: f64,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    bid: f64,
    ask: f64,
}

#[derive(Debug, Deserialize)]
struct RejectionBody {
    code: i64,
    reason: String,
}

impl TerminalClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Acquire an exclusive terminal session
    pub async fn acquire(&self) -> Result<TerminalSession, TickError> {
        let url = format!("{}/session", self.base_url);

        let response = self.client.post(&url).send().await?;
        if !response.status().is_success() {
            return Err(TickError::Session(format!(
                "session acquisition returned {}",
                response.status()
            )));
        }

        let body: SessionResponse = response.json().await?;
        tracing::debug!(session_id = %body.session_id, "Acquired terminal session");

        Ok(TerminalSession {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            session_id: body.session_id,
        })
    }
}

impl TerminalSession {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Release the session back to the bridge
    ///
    /// Release failures are logged, not propagated; the bridge reaps
    /// stale sessions on its own.
    pub async fn release(self) {
        let url = format!("{}/session/{}", self.base_url, self.session_id);

        match self.client.delete(&url).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(session_id = %self.session_id, "Released terminal session");
            }
            Ok(response) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    status = %response.status(),
                    "Terminal session release refused"
                );
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    error = %e,
                    "Failed to release terminal session"
                );
            }
        }
    }
}

impl TerminalApi for TerminalSession {
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Candle>, TickError> {
        let url = format!("{}/candles", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("timeframe", timeframe.as_str()),
                ("count", &count.to_string()),
                ("session", &self.session_id),
            ])
            .send()
            .await
            .map_err(|e| TickError::DataUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TickError::DataUnavailable(format!(
                "candle fetch returned {}",
                response.status()
            )));
        }

        let raw: Vec<CandleData> = response
            .json()
            .await
            .map_err(|e| TickError::DataUnavailable(e.to_string()))?;

        let candles = raw
            .into_iter()
            .map(|c| {
                let timestamp = DateTime::<Utc>::from_timestamp(c.time, 0).ok_or_else(|| {
                    TickError::DataUnavailable(format!("invalid candle timestamp {}", c.time))
                })?;
                Ok(Candle {
                    timestamp,
                    open: c.open,
                    high: c.high,
                    low: c.low,
                    close: c.close,
                    volume: c.tick_volume,
                })
            })
            .collect::<Result<Vec<_>, TickError>>()?;

        Ok(candles)
    }

    async fn current_quote(&self, symbol: &str) -> Result<Quote, TickError> {
        let url = format!("{}/quote", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("session", &self.session_id)])
            .send()
            .await
            .map_err(|e| TickError::QuoteUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TickError::QuoteUnavailable(format!(
                "quote fetch returned {}",
                response.status()
            )));
        }

        let body: QuoteResponse = response
            .json()
            .await
            .map_err(|e| TickError::QuoteUnavailable(e.to_string()))?;

        Ok(Quote {
            bid: body.bid,
            ask: body.ask,
        })
    }

    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderReceipt, TickError> {
        let url = format!("{}/orders", self.base_url);

        let response = self
            .client
            .post(&url)
            .query(&[("session", &self.session_id)])
            .json(request)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let receipt: OrderReceipt = response.json().await?;
                Ok(receipt)
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                let body: RejectionBody = response.json().await.unwrap_or(RejectionBody {
                    code: -1,
                    reason: "rejection body unreadable".to_string(),
                });
                Err(TickError::OrderRejected {
                    code: body.code,
                    reason: body.reason,
                })
            }
            status => Err(TickError::OrderRejected {
                code: status.as_u16() as i64,
                reason: format!("unexpected bridge status {}", status),
            }),
        }
    }
}
