//! Add money via manual UPI payment
//!
//! The user pays through their UPI app and submits the UTR reference here.
//! The backend records a pending credit and reconciles it against the bank
//! statement, so the wallet balance does not move at submission time.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::api::types::AddMoneyRequest;
use crate::api::BackendClient;
use crate::error::{Error, Result};

pub const DEFAULT_GATEWAY: &str = "manual";
pub const PAYMENT_METHOD_UPI: &str = "UPI";

const MIN_UTR_DIGITS: usize = 10;
const MAX_UTR_DIGITS: usize = 22;

pub struct AddMoney {
    client: Arc<dyn BackendClient>,
}

impl AddMoney {
    pub fn new(client: Arc<dyn BackendClient>) -> Self {
        Self { client }
    }

    /// Submit a UPI payment for reconciliation. Returns the backend's
    /// acknowledgement message when it sends one.
    pub async fn submit(
        &self,
        amount: Decimal,
        utr: &str,
        gateway: &str,
    ) -> Result<Option<String>> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidInput {
                field: "amount".to_string(),
                reason: "Please enter a valid amount".to_string(),
            });
        }
        let utr_number = validate_utr(utr)?;
        let request = AddMoneyRequest {
            amount,
            utr_number,
            gateway: gateway.to_string(),
            payment_method: PAYMENT_METHOD_UPI.to_string(),
        };
        let message = self.client.add_money(&request).await?;
        info!(
            "Add money request of ₹{} submitted, pending reconciliation",
            amount
        );
        Ok(message)
    }
}

/// UTR references are 10-22 digits as printed in UPI apps
pub fn validate_utr(utr: &str) -> Result<String> {
    let trimmed = utr.trim();
    if trimmed.len() < MIN_UTR_DIGITS
        || trimmed.len() > MAX_UTR_DIGITS
        || !trimmed.chars().all(|c| c.is_ascii_digit())
    {
        return Err(Error::InvalidInput {
            field: "utr_number".to_string(),
            reason: format!(
                "UTR number must be {}-{} digits",
                MIN_UTR_DIGITS, MAX_UTR_DIGITS
            ),
        });
    }
    Ok(trimmed.to_string())
}
