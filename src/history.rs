//! Transaction history
//!
//! Paged fetching with the backend's filters, plus the client-side pieces
//! the list view needs: a text search over what the user actually sees and
//! per-page tallies.

use std::sync::Arc;

use crate::api::types::{
    Direction, Transaction, TransactionCategory, TransactionPage, TransactionQuery,
    TransactionStatus,
};
use crate::api::BackendClient;
use crate::error::Result;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// List filter chips. Each maps to a server-side query; `matches` applies
/// the same cut to rows already in hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionFilter {
    #[default]
    All,
    Credit,
    Debit,
    Withdrawals,
    Pending,
}

impl TransactionFilter {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionFilter::All => "All",
            TransactionFilter::Credit => "Credit",
            TransactionFilter::Debit => "Debit",
            TransactionFilter::Withdrawals => "Withdrawals",
            TransactionFilter::Pending => "Pending",
        }
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        match self {
            TransactionFilter::All => true,
            TransactionFilter::Credit => txn.direction == Direction::Credit,
            TransactionFilter::Debit => txn.direction == Direction::Debit,
            TransactionFilter::Withdrawals => txn.category == TransactionCategory::Withdrawal,
            TransactionFilter::Pending => txn.status == TransactionStatus::Pending,
        }
    }

    fn query(&self, page: u32, limit: u32) -> TransactionQuery {
        let mut query = TransactionQuery {
            page,
            limit,
            ..TransactionQuery::default()
        };
        match self {
            TransactionFilter::All => {}
            TransactionFilter::Credit => query.direction = Some(Direction::Credit),
            TransactionFilter::Debit => query.direction = Some(Direction::Debit),
            TransactionFilter::Withdrawals => {
                query.category = Some(TransactionCategory::Withdrawal)
            }
            TransactionFilter::Pending => query.status = Some(TransactionStatus::Pending),
        }
        query
    }
}

pub struct TransactionHistory {
    client: Arc<dyn BackendClient>,
    page_size: u32,
}

impl TransactionHistory {
    pub fn new(client: Arc<dyn BackendClient>) -> Self {
        Self {
            client,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fetch one page, 1-based
    pub async fn fetch_page(
        &self,
        filter: TransactionFilter,
        page: u32,
    ) -> Result<TransactionPage> {
        let query = filter.query(page.max(1), self.page_size);
        self.client.get_transactions(&query).await
    }
}

/// Title shown for a row: the description when the backend sent one,
/// otherwise the category
pub fn transaction_title(txn: &Transaction) -> &str {
    match txn.description.as_deref() {
        Some(d) if !d.trim().is_empty() => d,
        _ => category_label(txn.category),
    }
}

pub fn category_label(category: TransactionCategory) -> &'static str {
    match category {
        TransactionCategory::AddMoney => "Add Money",
        TransactionCategory::Withdrawal => "Withdrawal",
        TransactionCategory::Dividend => "Dividend",
        TransactionCategory::TradeBuy => "Trade Buy",
        TransactionCategory::TradeSell => "Trade Sell",
        TransactionCategory::SignupBonus => "Signup Bonus",
        TransactionCategory::Profit => "Profit",
        TransactionCategory::Loss => "Loss",
        TransactionCategory::Refund => "Refund",
        TransactionCategory::Other => "Other",
    }
}

/// Case-insensitive search over the strings a row displays
pub fn search<'a>(transactions: &'a [Transaction], needle: &str) -> Vec<&'a Transaction> {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return transactions.iter().collect();
    }
    transactions
        .iter()
        .filter(|txn| {
            transaction_title(txn).to_lowercase().contains(&needle)
                || category_label(txn.category).to_lowercase().contains(&needle)
        })
        .collect()
}

/// Per-chip counts over a set of rows, shown next to the filter labels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistorySummary {
    pub total: usize,
    pub credit: usize,
    pub debit: usize,
    pub withdrawals: usize,
    pub pending: usize,
}

/// Count how many rows each filter would keep
pub fn summarize(transactions: &[Transaction]) -> HistorySummary {
    let count =
        |filter: TransactionFilter| transactions.iter().filter(|t| filter.matches(t)).count();
    HistorySummary {
        total: transactions.len(),
        credit: count(TransactionFilter::Credit),
        debit: count(TransactionFilter::Debit),
        withdrawals: count(TransactionFilter::Withdrawals),
        pending: count(TransactionFilter::Pending),
    }
}
