//! Budget intake
//!
//! Applies user-entered figures to a `BudgetState`. Every amount goes
//! through the money parser; recurring amounts are then scaled to monthly.
//! Unreadable amounts are reported back, never guessed.

use crate::models::{BudgetState, EntryCategory};
use crate::money::{normalize_to_monthly, parse_money, Frequency, RawAmount};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Which figure of a debt or savings goal an entry sets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryField {
    Balance,
    Rate,
    MinimumPayment,
    Target,
    Months,
}

/// One figure the user gave us
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetEntry {
    pub category: EntryCategory,
    pub name: String,
    #[serde(default)]
    pub amount: Option<RawAmount>,
    #[serde(default)]
    pub frequency: Frequency,
    /// Defaults to `balance` for debts and `target` for savings goals
    #[serde(default)]
    pub field: Option<EntryField>,
}

impl BudgetEntry {
    pub fn new(category: EntryCategory, name: &str, amount: impl Into<RawAmount>) -> Self {
        Self {
            category,
            name: name.to_string(),
            amount: Some(amount.into()),
            frequency: Frequency::Unset,
            field: None,
        }
    }

    pub fn every(mut self, frequency: &str) -> Self {
        self.frequency = Frequency::from_tag(Some(frequency));
        self
    }

    pub fn field(mut self, field: EntryField) -> Self {
        self.field = Some(field);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppliedEntry {
    pub category: EntryCategory,
    pub name: String,
    pub field: Option<EntryField>,
    /// Value stored in the state (monthly for recurring figures)
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RejectedEntry {
    pub category: EntryCategory,
    pub name: String,
    pub reason: String,
}

/// Outcome of an intake pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntakeReport {
    pub applied: Vec<AppliedEntry>,
    pub rejected: Vec<RejectedEntry>,
}

impl IntakeReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Apply entries in order, then recompute derived totals
pub fn apply_entries(state: &mut BudgetState, entries: &[BudgetEntry]) -> IntakeReport {
    let mut report = IntakeReport::default();

    for entry in entries {
        match apply_entry(state, entry) {
            Ok(value) => {
                debug!(
                    category = %entry.category,
                    name = %entry.name,
                    value,
                    "Applied budget entry"
                );
                report.applied.push(AppliedEntry {
                    category: entry.category,
                    name: entry.name.clone(),
                    field: entry.field,
                    value,
                });
            }
            Err(reason) => {
                warn!(
                    category = %entry.category,
                    name = %entry.name,
                    reason = %reason,
                    "Rejected budget entry"
                );
                report.rejected.push(RejectedEntry {
                    category: entry.category,
                    name: entry.name.clone(),
                    reason,
                });
            }
        }
    }

    state.recompute();
    report
}

fn apply_entry(state: &mut BudgetState, entry: &BudgetEntry) -> Result<f64, String> {
    let name = entry.name.trim();
    if name.is_empty() {
        return Err("entry name is empty".to_string());
    }

    let amount = parse_money(entry.amount.as_ref()).ok_or_else(|| match &entry.amount {
        None => "amount is missing".to_string(),
        Some(raw) => format!("could not read {} as an amount", describe(raw)),
    })?;

    let monthly = || normalize_to_monthly(Some(amount), &entry.frequency).unwrap_or(amount);

    match (entry.category, entry.field) {
        (EntryCategory::Income, None) => {
            let value = monthly();
            state.income_streams.insert(name.to_string(), value);
            Ok(value)
        }
        (EntryCategory::FixedExpense, None) => {
            let value = monthly();
            state.fixed_expenses.insert(name.to_string(), value);
            Ok(value)
        }
        (EntryCategory::VariableExpense, None) => {
            let value = monthly();
            state.variable_expenses.insert(name.to_string(), value);
            Ok(value)
        }
        (EntryCategory::Debt, None | Some(EntryField::Balance)) => {
            state.debts.entry(name.to_string()).or_default().balance = amount;
            Ok(amount)
        }
        (EntryCategory::Debt, Some(EntryField::Rate)) => {
            state.debts.entry(name.to_string()).or_default().rate = Some(amount);
            Ok(amount)
        }
        (EntryCategory::Debt, Some(EntryField::MinimumPayment)) => {
            let value = monthly();
            state.debts.entry(name.to_string()).or_default().minimum_payment = Some(value);
            Ok(value)
        }
        (EntryCategory::SavingsGoal, None | Some(EntryField::Target)) => {
            state.savings_goals.entry(name.to_string()).or_default().target = amount;
            Ok(amount)
        }
        (EntryCategory::SavingsGoal, Some(EntryField::Months)) => {
            let months = amount.round();
            if months < 1.0 || months > u32::MAX as f64 {
                return Err(format!("{} is not a usable number of months", amount));
            }
            state.savings_goals.entry(name.to_string()).or_default().months = Some(months as u32);
            Ok(months)
        }
        (category, Some(field)) => Err(format!(
            "field {:?} does not apply to {}",
            field, category
        )),
    }
}

fn describe(raw: &RawAmount) -> String {
    match raw {
        RawAmount::Number(value) => value.to_string(),
        RawAmount::Text(text) => format!("{:?}", text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn fresh_state() -> BudgetState {
        BudgetState::new(Uuid::new_v4())
    }

    #[test]
    fn test_normalizes_recurring_amounts() {
        let mut state = fresh_state();
        let entries = vec![
            BudgetEntry::new(EntryCategory::Income, "job", "$52,000").every("yearly"),
            BudgetEntry::new(EntryCategory::Income, "tutoring", "100-150").every("weekly"),
            BudgetEntry::new(EntryCategory::FixedExpense, "rent", "1.4k"),
            BudgetEntry::new(EntryCategory::VariableExpense, "coffee", 5.0).every("daily"),
        ];

        let report = apply_entries(&mut state, &entries);

        assert!(report.is_clean());
        assert_eq!(report.applied.len(), 4);
        assert!((state.income_streams["job"] - 52_000.0 / 12.0).abs() < 1e-9);
        assert!((state.income_streams["tutoring"] - 125.0 * 52.0 / 12.0).abs() < 1e-9);
        assert_eq!(state.fixed_expenses["rent"], 1400.0);
        assert_eq!(state.variable_expenses["coffee"], 152.1875);
        assert!(state.is_data_complete);
    }

    #[test]
    fn test_unparseable_amount_is_rejected_and_state_untouched() {
        let mut state = fresh_state();
        let entries = vec![
            BudgetEntry::new(EntryCategory::FixedExpense, "rent", "abc"),
            BudgetEntry::new(EntryCategory::FixedExpense, "gym", "100-abc"),
            BudgetEntry {
                amount: None,
                ..BudgetEntry::new(EntryCategory::Income, "job", 0.0)
            },
        ];

        let report = apply_entries(&mut state, &entries);

        assert_eq!(report.rejected.len(), 3);
        assert!(report.applied.is_empty());
        assert!(state.fixed_expenses.is_empty());
        assert!(state.income_streams.is_empty());
        assert_eq!(report.rejected[2].reason, "amount is missing");
    }

    #[test]
    fn test_debts_keep_balance_and_normalize_minimum() {
        let mut state = fresh_state();
        let entries = vec![
            BudgetEntry::new(EntryCategory::Debt, "car loan", "$5,000"),
            BudgetEntry::new(EntryCategory::Debt, "car loan", 0.06).field(EntryField::Rate),
            BudgetEntry::new(EntryCategory::Debt, "car loan", 60.0)
                .every("biweekly")
                .field(EntryField::MinimumPayment),
        ];

        apply_entries(&mut state, &entries);

        let debt = &state.debts["car loan"];
        assert_eq!(debt.balance, 5000.0);
        assert_eq!(debt.rate, Some(0.06));
        assert_eq!(debt.minimum_payment, Some(130.0));
        assert_eq!(state.debt_minimums["car loan"], 130.0);
    }

    #[test]
    fn test_savings_goal_target_and_months() {
        let mut state = fresh_state();
        let entries = vec![
            BudgetEntry::new(EntryCategory::SavingsGoal, "emergency", "6k").every("yearly"),
            BudgetEntry::new(EntryCategory::SavingsGoal, "emergency", "12").field(EntryField::Months),
            BudgetEntry::new(EntryCategory::SavingsGoal, "trip", 0.0).field(EntryField::Months),
        ];

        let report = apply_entries(&mut state, &entries);

        // targets are totals, frequency does not apply
        assert_eq!(state.savings_goals["emergency"].target, 6000.0);
        assert_eq!(state.required_savings_per_month["emergency"], 500.0);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].name, "trip");
    }

    #[test]
    fn test_field_mismatch_is_rejected() {
        let mut state = fresh_state();
        let entries = vec![BudgetEntry::new(EntryCategory::Income, "job", 100.0).field(EntryField::Rate)];

        let report = apply_entries(&mut state, &entries);

        assert_eq!(report.rejected.len(), 1);
        assert!(report.rejected[0].reason.contains("does not apply"));
    }

    #[test]
    fn test_entry_deserializes_from_json() {
        let entry: BudgetEntry = serde_json::from_str(
            r#"{"category": "income", "name": "job", "amount": "4.2k", "frequency": "bi-weekly"}"#,
        )
        .unwrap();

        assert_eq!(entry.frequency, Frequency::Biweekly);
        assert_eq!(entry.amount, Some(RawAmount::Text("4.2k".into())));
        assert!(entry.field.is_none());
    }
}
