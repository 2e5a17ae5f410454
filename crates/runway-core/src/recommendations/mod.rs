//! Recommendation engine
//!
//! Deterministic rule batteries that turn a snapshot into prioritized,
//! explainable recommendations. Two variants share the [`Recommendation`]
//! shape and the generic [`RuleEngine`]:
//!
//! - **Budget** ([`budget`]) - declared budgets, goals and the month-end forecast
//! - **Transactions** ([`transactions`]) - observed categorized spending
//!
//! Each rule is independent: a rule that fails is logged and skipped, and a
//! context-specific fallback is added when nothing fired.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use runway_core::recommendations::{generate_budget_recommendations, BudgetContext};
//!
//! let recs = generate_budget_recommendations(&ctx);
//! for r in &recs {
//!     println!("[{}] {}", r.priority, r.title);
//! }
//! ```

pub mod budget;
pub mod engine;
pub mod transactions;
pub mod types;

pub use budget::{budget_engine, generate_budget_recommendations, BudgetContext};
pub use engine::{Rule, RuleContext, RuleEngine};
pub use transactions::{
    generate_transaction_recommendations, transaction_engine, TransactionContext,
};
pub use types::{
    format_amount, sort_by_priority, Impact, Priority, Recommendation, RecommendationType,
    RecommendationVariant,
};

/// Combine both batteries into one sorted list
///
/// Positive feedback is dropped when any other recommendation is present.
pub fn merge_recommendations(
    budget: Vec<Recommendation>,
    transactions: Vec<Recommendation>,
) -> Vec<Recommendation> {
    let mut merged: Vec<Recommendation> = budget.into_iter().chain(transactions).collect();

    if merged.iter().any(|r| !r.is_positive()) {
        merged.retain(|r| !r.is_positive());
    } else if merged.len() > 1 {
        merged.truncate(1);
    }

    sort_by_priority(&mut merged);
    merged
}
