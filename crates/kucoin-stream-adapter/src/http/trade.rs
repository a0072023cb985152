/*
[INPUT]:  Order parameters (symbol, side, size) and API credentials
[OUTPUT]: Exchange-assigned order ids
[POS]:    HTTP layer - order submission used by the private account stream
[UPDATE]: When adding order types or changing the order endpoint
*/

use crate::error::{KucoinError, Result};
use crate::http::KucoinClient;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ORDERS_ENDPOINT: &str = "/api/v1/orders";
const TEST_ORDERS_ENDPOINT: &str = "/api/v1/orders/test";
const SUCCESS_CODE: &str = "200000";

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Serialize)]
struct MarketOrderRequest<'a> {
    #[serde(rename = "clientOid")]
    client_oid: String,
    side: OrderSide,
    symbol: &'a str,
    #[serde(rename = "type")]
    order_type: &'static str,
    size: Decimal,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    code: String,
    msg: Option<String>,
    data: Option<OrderData>,
}

#[derive(Debug, Deserialize)]
struct OrderData {
    #[serde(rename = "orderId")]
    order_id: String,
}

impl KucoinClient {
    /// Submit a market order
    ///
    /// POST /api/v1/orders
    /// Requires: KC-API signed headers
    pub async fn create_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        size: Decimal,
    ) -> Result<String> {
        self.submit_order(ORDERS_ENDPOINT, symbol, side, size).await
    }

    /// Submit a market order against the order test endpoint.
    ///
    /// Validates and matches like a real order but is not executed.
    pub async fn create_test_order(
        &self,
        symbol: &str,
        side: OrderSide,
        size: Decimal,
    ) -> Result<String> {
        self.submit_order(TEST_ORDERS_ENDPOINT, symbol, side, size).await
    }

    async fn submit_order(
        &self,
        endpoint: &str,
        symbol: &str,
        side: OrderSide,
        size: Decimal,
    ) -> Result<String> {
        let request = MarketOrderRequest {
            client_oid: Uuid::new_v4().to_string(),
            side,
            symbol,
            order_type: "market",
            size,
        };
        let body = serde_json::to_string(&request)?;

        let builder = self.signed_request(Method::POST, endpoint, Some(&body))?;
        let response: OrderResponse = self.send_json(builder).await?;

        if response.code != SUCCESS_CODE {
            return Err(KucoinError::Api {
                code: response.code,
                message: response.msg.unwrap_or_else(|| "order rejected".to_string()),
            });
        }
        let data = response
            .data
            .ok_or_else(|| KucoinError::Config("order response missing data".to_string()))?;
        Ok(data.order_id)
    }
}
