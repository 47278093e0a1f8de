//! Trading endpoints for Bitget REST API.

use super::super::{Bitget, parser};
use super::{Params, response_array, response_data};
use coinbridge_core::types::{Order, OrderSide, OrderType, Trade};
use coinbridge_core::{Error, Result};
use reqwest::Method;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::warn;

/// Copies string, number and bool members of a params object into `into`.
fn merge_params(into: &mut Params, extra: Option<&Value>) {
    let Some(Value::Object(map)) = extra else {
        return;
    };
    for (key, value) in map {
        let value = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        into.insert(key.clone(), value);
    }
}

impl Bitget {
    /// Place a spot order.
    ///
    /// Limit orders need a `price`. Extra `params` (e.g. `clientOid`,
    /// `force`) are copied into the request body.
    pub async fn create_order(
        &self,
        symbol: &str,
        order_type: OrderType,
        side: OrderSide,
        amount: Decimal,
        price: Option<Decimal>,
        params: Option<&Value>,
    ) -> Result<Order> {
        let market = self.market(symbol)?;
        let mut body = Params::new();
        body.insert("symbol".into(), market.id.clone());
        body.insert("side".into(), side.as_str().into());
        body.insert("size".into(), amount.normalize().to_string());
        match order_type {
            OrderType::Limit => {
                let price = price.ok_or_else(|| {
                    Error::arguments_required("bitget create_order requires a price for limit orders")
                })?;
                body.insert("orderType".into(), "limit".into());
                body.insert("force".into(), "gtc".into());
                body.insert("price".into(), price.normalize().to_string());
            }
            OrderType::Market => {
                body.insert("orderType".into(), "market".into());
                body.insert("force".into(), "gtc".into());
            }
            other => {
                return Err(Error::not_supported(format!(
                    "bitget create_order type {other}"
                )));
            }
        }
        merge_params(&mut body, params);

        let response = self
            .private_request(Method::POST, "/api/v2/spot/trade/place-order", &body)
            .await?;
        let mut order = parser::parse_order(response_data(&response)?, Some(&market))?;
        order.order_type = Some(order_type);
        order.side = Some(side);
        order.amount = Some(amount);
        order.price = price;
        Ok(order)
    }

    /// Cancel an order. `symbol` is required.
    pub async fn cancel_order(
        &self,
        id: &str,
        symbol: Option<&str>,
        params: Option<&Value>,
    ) -> Result<Order> {
        let symbol = symbol
            .ok_or_else(|| Error::arguments_required("bitget cancel_order requires a symbol"))?;
        let market = self.market(symbol)?;
        let mut body = Params::new();
        body.insert("symbol".into(), market.id.clone());
        body.insert("orderId".into(), id.to_string());
        merge_params(&mut body, params);

        let response = self
            .private_request(Method::POST, "/api/v2/spot/trade/cancel-order", &body)
            .await?;
        parser::parse_order(response_data(&response)?, Some(&market))
    }

    /// Fetch a single order. `symbol` is required.
    pub async fn fetch_order(&self, id: &str, symbol: Option<&str>) -> Result<Order> {
        let symbol = symbol
            .ok_or_else(|| Error::arguments_required("bitget fetch_order requires a symbol"))?;
        let market = self.market(symbol)?;
        let mut params = Params::new();
        params.insert("orderId".into(), id.to_string());

        let response = self
            .private_request(Method::GET, "/api/v2/spot/trade/orderInfo", &params)
            .await?;
        let data = response_array(&response)?
            .first()
            .ok_or_else(|| Error::order_not_found(format!("bitget order {id} not found")))?;
        parser::parse_order(data, Some(&market))
    }

    /// Fetch unfilled orders, optionally for one symbol.
    pub async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>> {
        let market = symbol.map(|s| self.market(s)).transpose()?;
        let mut params = Params::new();
        if let Some(market) = &market {
            params.insert("symbol".into(), market.id.clone());
        }
        if let Some(since) = since {
            params.insert("startTime".into(), since.to_string());
        }
        if let Some(limit) = limit {
            params.insert("limit".into(), limit.to_string());
        }

        let response = self
            .private_request(Method::GET, "/api/v2/spot/trade/unfilled-orders", &params)
            .await?;
        let mut orders = Vec::new();
        for data in response_array(&response)? {
            let market = match &market {
                Some(m) => Some(m.clone()),
                None => data
                    .get("symbol")
                    .and_then(|v| v.as_str())
                    .and_then(|id| self.base().market_by_id(id).ok()),
            };
            match parser::parse_order(data, market.as_deref()) {
                Ok(order) => orders.push(order),
                Err(e) => warn!(error = %e, "Failed to parse order"),
            }
        }
        Ok(orders)
    }

    /// Fetch the account's fills for `symbol`.
    pub async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>> {
        let symbol = symbol
            .ok_or_else(|| Error::arguments_required("bitget fetch_my_trades requires a symbol"))?;
        let market = self.market(symbol)?;
        let mut params = Params::new();
        params.insert("symbol".into(), market.id.clone());
        if let Some(since) = since {
            params.insert("startTime".into(), since.to_string());
        }
        if let Some(limit) = limit {
            params.insert("limit".into(), limit.to_string());
        }

        let response = self
            .private_request(Method::GET, "/api/v2/spot/trade/fills", &params)
            .await?;
        let mut trades = Vec::new();
        for data in response_array(&response)? {
            match parser::parse_my_trade(data, Some(&market)) {
                Ok(trade) => trades.push(trade),
                Err(e) => warn!(error = %e, "Failed to parse trade"),
            }
        }
        trades.sort_by_key(|t| t.timestamp);
        Ok(trades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_params() {
        let mut params = Params::new();
        params.insert("symbol".into(), "BTCUSDT".into());
        merge_params(
            &mut params,
            Some(&json!({"clientOid": "abc", "force": "post_only", "n": 5, "nested": {}})),
        );
        assert_eq!(params["clientOid"], "abc");
        assert_eq!(params["force"], "post_only");
        assert_eq!(params["n"], "5");
        assert!(!params.contains_key("nested"));
        merge_params(&mut params, None);
        assert_eq!(params.len(), 4);
    }
}
