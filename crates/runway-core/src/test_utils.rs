//! Test utilities for runway-core
//!
//! Sample snapshots shared by unit tests, integration tests and the CLI and
//! server test suites.

use chrono::NaiveDate;

use crate::models::{
    FixedExpenseItem, GoalPriority, IncomeItem, IncomeType, SavingsGoal, Transaction,
    TransactionKind, VariableExpenseItem,
};
use crate::snapshot::FinancialSnapshot;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn fixed(id: &str, name: &str, amount: f64, day: u32, category: &str) -> FixedExpenseItem {
    FixedExpenseItem {
        id: id.to_string(),
        name: name.to_string(),
        amount,
        day_of_month: day,
        category: category.to_string(),
        is_active: true,
    }
}

fn tx(
    d: NaiveDate,
    description: &str,
    amount: f64,
    kind: TransactionKind,
    category: &str,
) -> Transaction {
    Transaction {
        id: format!("{}-{}", d, description.to_lowercase().replace(' ', "-")),
        date: d,
        description: description.to_string(),
        amount,
        kind,
        category: category.to_string(),
        recurring: false,
    }
}

/// Schedule-only snapshot starting 2024-01-01
///
/// 52,500 opening balance, 75,000 salary on the 1st, 27,000 of fixed bills on
/// the 1st/5th/10th/15th and an 18,000 variable budget. A 30-day projection
/// ends at 82,500.
pub fn sample_snapshot() -> FinancialSnapshot {
    FinancialSnapshot {
        as_of: date(2024, 1, 1),
        current_balance: Some(52500.0),
        emergency_buffer: 30000.0,
        horizon_days: None,
        salary_day: None,
        income: vec![IncomeItem {
            id: "salary".into(),
            name: "Salary".into(),
            amount: 75000.0,
            day_of_month: 1,
            income_type: IncomeType::Fixed,
        }],
        fixed_expenses: vec![
            fixed("rent", "Rent", 15000.0, 1, "housing"),
            fixed("emi", "Car EMI", 7000.0, 5, "loan"),
            fixed("utilities", "Utilities", 3000.0, 10, "utilities"),
            fixed("insurance", "Insurance", 2000.0, 15, "insurance"),
        ],
        variable_expenses: vec![
            VariableExpenseItem {
                id: "groceries".into(),
                name: "Groceries".into(),
                amount: 12000.0,
                category: "food".into(),
            },
            VariableExpenseItem {
                id: "transport".into(),
                name: "Transport".into(),
                amount: 6000.0,
                category: "transport".into(),
            },
        ],
        goals: vec![
            SavingsGoal {
                id: "emergency".into(),
                name: "Emergency fund".into(),
                target_amount: 200000.0,
                current_amount: 50000.0,
                monthly_contribution: 10000.0,
                target_date: Some(date(2025, 1, 1)),
                priority: GoalPriority::High,
            },
            SavingsGoal {
                id: "vacation".into(),
                name: "Vacation".into(),
                target_amount: 60000.0,
                current_amount: 10000.0,
                monthly_contribution: 3000.0,
                target_date: Some(date(2024, 12, 1)),
                priority: GoalPriority::Low,
            },
        ],
        transactions: Vec::new(),
        expense_history: Vec::new(),
    }
}

/// The same household on 2024-03-15 with two and a half months of history
pub fn sample_snapshot_with_history() -> FinancialSnapshot {
    let mut transactions = Vec::new();
    for month in 1..=3 {
        let salary = date(2024, month, 1);
        transactions.push(tx(salary, "Salary", 75000.0, TransactionKind::Income, "salary"));
        transactions.push(Transaction {
            recurring: true,
            ..tx(
                date(2024, month, 5),
                "Rent",
                15000.0,
                TransactionKind::Expense,
                "housing",
            )
        });
    }

    let spending = [
        (date(2024, 1, 12), "Supermarket", 8000.0, "food"),
        (date(2024, 1, 20), "Clothes", 4000.0, "shopping"),
        (date(2024, 2, 10), "Supermarket", 9000.0, "food"),
        (date(2024, 2, 18), "Train tickets", 3000.0, "travel"),
        (date(2024, 3, 4), "Supermarket", 3000.0, "food"),
        (date(2024, 3, 10), "Restaurant", 1500.0, "food"),
        (date(2024, 3, 12), "Cinema", 1200.0, "entertainment"),
    ];
    for (d, description, amount, category) in spending {
        transactions.push(tx(d, description, amount, TransactionKind::Expense, category));
    }
    transactions.sort_by_key(|t| t.date);

    FinancialSnapshot {
        as_of: date(2024, 3, 15),
        current_balance: Some(150300.0),
        transactions,
        ..sample_snapshot()
    }
}
