//! Budget state carried through a conversation
//!
//! All money fields are monthly figures unless noted otherwise.

use crate::memory::ConversationHistory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

//
// ================= Inputs =================
//

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    /// Outstanding balance (not monthly)
    pub balance: f64,
    /// Annual interest rate as a fraction, e.g. 0.06
    #[serde(default)]
    pub rate: Option<f64>,
    /// Minimum monthly payment
    #[serde(default)]
    pub minimum_payment: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    /// Total amount to save (not monthly)
    pub target: f64,
    /// Months until the goal is due
    #[serde(default)]
    pub months: Option<u32>,
}

//
// ================= State =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetState {
    pub session_id: Uuid,

    // --- Raw user inputs ---
    pub income_streams: BTreeMap<String, f64>,
    pub fixed_expenses: BTreeMap<String, f64>,
    pub variable_expenses: BTreeMap<String, f64>,
    pub debts: BTreeMap<String, Debt>,
    pub savings_goals: BTreeMap<String, SavingsGoal>,

    // --- Normalized + derived ---
    pub total_income: f64,
    pub total_expenses: f64,
    /// income - expenses
    pub surplus: f64,
    pub debt_minimums: BTreeMap<String, f64>,
    pub required_savings_per_month: BTreeMap<String, f64>,

    // --- Plan placeholders ---
    /// User rules such as {"max_housing_pct": 0.3}
    pub plan_constraints: BTreeMap<String, f64>,
    pub plan_candidates: Vec<serde_json::Value>,
    pub recommended_plan: Option<serde_json::Value>,

    // --- Flags ---
    pub is_data_complete: bool,
    pub is_plan_valid: bool,

    pub messages: ConversationHistory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BudgetState {
    pub fn new(session_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            income_streams: BTreeMap::new(),
            fixed_expenses: BTreeMap::new(),
            variable_expenses: BTreeMap::new(),
            debts: BTreeMap::new(),
            savings_goals: BTreeMap::new(),
            total_income: 0.0,
            total_expenses: 0.0,
            surplus: 0.0,
            debt_minimums: BTreeMap::new(),
            required_savings_per_month: BTreeMap::new(),
            plan_constraints: BTreeMap::new(),
            plan_candidates: Vec::new(),
            recommended_plan: None,
            is_data_complete: false,
            is_plan_valid: false,
            messages: ConversationHistory::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild every derived field from the raw inputs
    pub fn recompute(&mut self) {
        self.debt_minimums = self
            .debts
            .iter()
            .filter_map(|(name, debt)| debt.minimum_payment.map(|min| (name.clone(), min)))
            .collect();

        self.required_savings_per_month = self
            .savings_goals
            .iter()
            .filter_map(|(name, goal)| match goal.months {
                Some(months) if months > 0 => Some((name.clone(), goal.target / months as f64)),
                _ => None,
            })
            .collect();

        self.total_income = self.income_streams.values().sum();
        self.total_expenses = self.fixed_expenses.values().sum::<f64>()
            + self.variable_expenses.values().sum::<f64>()
            + self.debt_minimums.values().sum::<f64>();
        self.surplus = self.total_income - self.total_expenses;

        self.is_data_complete = !self.income_streams.is_empty()
            && !(self.fixed_expenses.is_empty() && self.variable_expenses.is_empty());

        // Any change to inputs invalidates a previously checked plan
        self.is_plan_valid = false;
        self.updated_at = Utc::now();
    }

    /// Short text summary fed to the model as context
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Monthly income: {:.2}\nMonthly expenses: {:.2}\nSurplus: {:.2}\n",
            self.total_income, self.total_expenses, self.surplus
        );

        write_section(&mut out, "Income", &self.income_streams);
        write_section(&mut out, "Fixed expenses", &self.fixed_expenses);
        write_section(&mut out, "Variable expenses", &self.variable_expenses);
        write_section(&mut out, "Debt minimums", &self.debt_minimums);
        write_section(&mut out, "Savings per month", &self.required_savings_per_month);

        if !self.is_data_complete {
            out.push_str("Data incomplete: still need income and at least one expense.\n");
        }
        out
    }
}

fn write_section(out: &mut String, title: &str, items: &BTreeMap<String, f64>) {
    if items.is_empty() {
        return;
    }
    out.push_str(title);
    out.push_str(":\n");
    for (name, amount) in items {
        out.push_str(&format!("- {}: {:.2}\n", name, amount));
    }
}

//
// ================= Entry Categories =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryCategory {
    Income,
    FixedExpense,
    VariableExpense,
    Debt,
    SavingsGoal,
}

impl fmt::Display for EntryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryCategory::Income => "income",
            EntryCategory::FixedExpense => "fixed_expense",
            EntryCategory::VariableExpense => "variable_expense",
            EntryCategory::Debt => "debt",
            EntryCategory::SavingsGoal => "savings_goal",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recompute_totals() {
        let mut state = BudgetState::new(Uuid::new_v4());
        state.income_streams.insert("job".into(), 4200.0);
        state.income_streams.insert("side hustle".into(), 600.0);
        state.fixed_expenses.insert("rent".into(), 1400.0);
        state.variable_expenses.insert("food".into(), 300.0);
        state.debts.insert(
            "loan".into(),
            Debt {
                balance: 5000.0,
                rate: Some(0.06),
                minimum_payment: Some(150.0),
            },
        );
        state.savings_goals.insert(
            "vacation".into(),
            SavingsGoal {
                target: 1200.0,
                months: Some(6),
            },
        );
        state.savings_goals.insert(
            "someday".into(),
            SavingsGoal {
                target: 9000.0,
                months: None,
            },
        );

        state.recompute();

        assert_eq!(state.total_income, 4800.0);
        assert_eq!(state.total_expenses, 1850.0);
        assert_eq!(state.surplus, 2950.0);
        assert_eq!(state.debt_minimums.get("loan"), Some(&150.0));
        assert_eq!(state.required_savings_per_month.get("vacation"), Some(&200.0));
        assert!(!state.required_savings_per_month.contains_key("someday"));
        assert!(state.is_data_complete);
    }

    #[test]
    fn test_incomplete_without_expenses() {
        let mut state = BudgetState::new(Uuid::new_v4());
        state.income_streams.insert("job".into(), 3000.0);
        state.recompute();

        assert!(!state.is_data_complete);
        assert!(state.summary().contains("Data incomplete"));
    }

    #[test]
    fn test_summary_lists_sections() {
        let mut state = BudgetState::new(Uuid::new_v4());
        state.income_streams.insert("job".into(), 3000.0);
        state.fixed_expenses.insert("rent".into(), 1000.0);
        state.recompute();

        let summary = state.summary();
        assert!(summary.contains("Monthly income: 3000.00"));
        assert!(summary.contains("- rent: 1000.00"));
        assert!(!summary.contains("Debt minimums"));
    }
}
