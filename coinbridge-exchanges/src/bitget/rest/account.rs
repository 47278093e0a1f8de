//! Account endpoints for Bitget REST API.

use super::super::{Bitget, parser};
use super::{Params, response_data};
use coinbridge_core::Result;
use coinbridge_core::types::Balance;
use reqwest::Method;

impl Bitget {
    /// Fetch spot balances.
    pub async fn fetch_balance(&self) -> Result<Balance> {
        let response = self
            .private_request(Method::GET, "/api/v2/spot/account/assets", &Params::new())
            .await?;
        let base = self.base();
        Ok(parser::parse_balance(response_data(&response)?, |coin| {
            base.safe_currency_code(coin)
        }))
    }
}
