//! Wire types for the TradeHub wallet backend
//!
//! The backend speaks camelCase JSON and wraps every payload in a
//! `{ success, data, message }` envelope. Mongo-style `_id` fields are
//! renamed to plain `id` on this side.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Envelope wrapped around every backend payload.
///
/// `success` is not sent by every endpoint; the HTTP status decides the
/// outcome and `message` is carried either way. Paginated endpoints put
/// `pagination` next to `data`. Every field is optional, so the envelope
/// decodes for any payload type.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: Option<bool>,
    pub data: Option<T>,
    pub message: Option<String>,
    pub pagination: Option<Pagination>,
}

/// Body the backend sends on a non-2xx status
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub full_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub wallet_balance: Decimal,
    #[serde(default)]
    pub bonus_balance: Decimal,
}

impl UserProfile {
    /// Wallet plus bonus, the figure shown as "total balance"
    pub fn total_balance(&self) -> Decimal {
        self.wallet_balance + self.bonus_balance
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    #[default]
    Savings,
    Current,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    #[serde(rename = "_id")]
    pub id: String,
    pub bank_name: String,
    pub account_holder_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub is_verified: bool,
}

impl BankAccount {
    /// Display form of the account number: everything but the last four
    /// digits is masked.
    pub fn masked_number(&self) -> String {
        let tail: String = self
            .account_number
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("****{}", tail)
    }
}

/// Payload for registering a bank account
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBankAccount {
    pub bank_name: String,
    pub account_holder_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub account_type: AccountType,
    pub is_primary: bool,
}

/// `data` payload of the bank-accounts listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccountsData {
    #[serde(default)]
    pub bank_accounts: Vec<BankAccount>,
}

/// Withdrawal submission. The backend takes a flat body with the destination
/// fields inlined and the amount as a JSON number.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub account_number: String,
    pub ifsc_code: String,
    pub account_holder_name: String,
    pub bank_name: String,
}

impl WithdrawRequest {
    /// Builds the wire body for a destination account. IFSC goes out
    /// trimmed and uppercased.
    pub fn new(amount: Decimal, destination: &BankAccount) -> Self {
        Self {
            amount,
            account_number: destination.account_number.trim().to_string(),
            ifsc_code: destination.ifsc_code.trim().to_uppercase(),
            account_holder_name: destination.account_holder_name.trim().to_string(),
            bank_name: destination.bank_name.trim().to_string(),
        }
    }
}

/// `data` payload of a successful withdrawal
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawData {
    #[serde(default)]
    pub transaction: Option<WithdrawTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawTransaction {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMoneyRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub utr_number: String,
    pub gateway: String,
    pub payment_method: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Credit,
    Debit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
    Rejected,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionCategory {
    AddMoney,
    Withdrawal,
    Dividend,
    TradeBuy,
    TradeSell,
    SignupBonus,
    Profit,
    Loss,
    Refund,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub category: TransactionCategory,
    pub amount: Decimal,
    pub status: TransactionStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_transactions: u64,
}

/// One fetched page of transaction history
#[derive(Debug, Clone)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub pagination: Pagination,
}

/// Server-side filters for the transaction list
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<TransactionCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
}

// Auth request/response bodies

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupOtpRequest {
    pub full_name: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySignupOtpRequest {
    pub full_name: String,
    pub phone_number: String,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOtpRequest {
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyLoginOtpRequest {
    pub phone_number: String,
    pub otp: String,
}

/// `data` payload of a successful OTP verification
#[derive(Debug, Clone, Deserialize)]
pub struct AuthData {
    pub token: String,
    pub user: UserProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_deserializes_camel_case() {
        let json = r#"{
            "_id": "66f1a",
            "fullName": "Asha Rao",
            "phoneNumber": "9876543210",
            "walletBalance": 5000,
            "bonusBalance": 200
        }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.full_name, "Asha Rao");
        assert_eq!(profile.wallet_balance, Decimal::from(5000));
        assert_eq!(profile.total_balance(), Decimal::from(5200));
    }

    #[test]
    fn test_profile_balances_default_to_zero() {
        let json = r#"{"fullName": "Asha Rao", "phoneNumber": "9876543210"}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.wallet_balance, Decimal::ZERO);
        assert_eq!(profile.total_balance(), Decimal::ZERO);
    }

    #[test]
    fn test_bank_account_masks_all_but_last_four() {
        let json = r#"{
            "_id": "abc123",
            "bankName": "HDFC Bank",
            "accountHolderName": "Asha Rao",
            "accountNumber": "123456789012",
            "ifscCode": "HDFC0001234",
            "isPrimary": true
        }"#;
        let account: BankAccount = serde_json::from_str(json).unwrap();
        assert_eq!(account.masked_number(), "****9012");
        assert_eq!(account.account_type, AccountType::Savings);
        assert!(account.is_primary);
        assert!(!account.is_verified);
    }

    #[test]
    fn test_withdraw_body_is_flat_with_a_numeric_amount() {
        let destination = BankAccount {
            id: "acc-1".to_string(),
            bank_name: "HDFC Bank".to_string(),
            account_holder_name: "Asha Rao".to_string(),
            account_number: "123456789012".to_string(),
            ifsc_code: " hdfc0001234 ".to_string(),
            account_type: AccountType::Savings,
            is_primary: true,
            is_verified: true,
        };
        let request = WithdrawRequest::new(Decimal::new(499999, 2), &destination);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["amount"], 4999.99);
        assert_eq!(json["accountNumber"], "123456789012");
        assert_eq!(json["ifscCode"], "HDFC0001234");
        assert_eq!(json["accountHolderName"], "Asha Rao");
        assert_eq!(json["bankName"], "HDFC Bank");
        assert!(json.get("bankDetails").is_none());
    }

    #[test]
    fn test_add_money_body_carries_a_numeric_amount() {
        let request = AddMoneyRequest {
            amount: Decimal::new(50000, 2),
            utr_number: "123456789012".to_string(),
            gateway: "manual".to_string(),
            payment_method: "UPI".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["amount"], 500.0);
        assert_eq!(json["utrNumber"], "123456789012");
    }

    #[test]
    fn test_envelope_decodes_for_payloads_without_a_default() {
        let json = r#"{"message": "No user found"}"#;
        let envelope: ApiEnvelope<UserProfile> = serde_json::from_str(json).unwrap();
        assert!(envelope.data.is_none());
        assert!(envelope.success.is_none());
        assert_eq!(envelope.message.as_deref(), Some("No user found"));
    }

    #[test]
    fn test_envelope_carries_pagination_next_to_data() {
        let json = r#"{
            "success": true,
            "data": [{
                "_id": "t1",
                "type": "debit",
                "category": "withdrawal",
                "amount": "150.00",
                "status": "pending",
                "createdAt": "2026-03-01T10:00:00Z"
            }],
            "pagination": {"totalPages": 3, "currentPage": 1, "totalTransactions": 42}
        }"#;
        let envelope: ApiEnvelope<Vec<Transaction>> = serde_json::from_str(json).unwrap();
        let transactions = envelope.data.unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].direction, Direction::Debit);
        assert_eq!(transactions[0].category, TransactionCategory::Withdrawal);
        assert_eq!(transactions[0].status, TransactionStatus::Pending);
        let pagination = envelope.pagination.unwrap();
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(pagination.total_transactions, 42);
    }

    #[test]
    fn test_unknown_category_maps_to_other() {
        let json = r#"{
            "_id": "t2",
            "type": "credit",
            "category": "cashback_festival",
            "amount": 25,
            "status": "completed"
        }"#;
        let transaction: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(transaction.category, TransactionCategory::Other);
        assert_eq!(transaction.created_at, None);
    }

    #[test]
    fn test_transaction_query_skips_unset_filters() {
        let query = TransactionQuery {
            page: 1,
            limit: 20,
            ..Default::default()
        };
        let json = serde_json::to_value(&query).unwrap();
        assert!(json.get("type").is_none());
        assert!(json.get("category").is_none());
        assert_eq!(json["page"], 1);
    }
}
