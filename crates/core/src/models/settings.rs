use serde::{Deserialize, Serialize};

use super::operation::OperationKind;

const DEFAULT_EXPENSE_NAMES: [&str; 8] = [
    "Ашан",
    "Аптека",
    "Вайлдберриз",
    "Магнит",
    "Пятерочка",
    "Такси",
    "Кафе",
    "Другое",
];

const DEFAULT_INCOME_NAMES: [&str; 6] = [
    "Зарплата",
    "Фриланс",
    "Инвестиции",
    "Подарок",
    "Возврат долга",
    "Другое",
];

/// Predefined operation names offered by the entry form.
///
/// Presentation hints only: an operation may carry any name, listed or not.
/// Stored in the ledger document as the flat `expenseNames` / `incomeNames` lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameSuggestions {
    #[serde(
        rename = "expenseNames",
        alias = "predefined_expense_names",
        default = "default_expense_names"
    )]
    pub expense: Vec<String>,
    #[serde(
        rename = "incomeNames",
        alias = "predefined_income_names",
        default = "default_income_names"
    )]
    pub income: Vec<String>,
}

impl NameSuggestions {
    #[must_use]
    pub fn for_kind(&self, kind: OperationKind) -> &[String] {
        match kind {
            OperationKind::Income => &self.income,
            OperationKind::Expense => &self.expense,
        }
    }

    /// Add `name` to the list for `kind`. Returns `false` for blanks and duplicates.
    pub fn add(&mut self, kind: OperationKind, name: &str) -> bool {
        let name = name.trim();
        let list = match kind {
            OperationKind::Income => &mut self.income,
            OperationKind::Expense => &mut self.expense,
        };
        if name.is_empty() || list.iter().any(|existing| existing == name) {
            return false;
        }
        list.push(name.to_string());
        true
    }
}

impl Default for NameSuggestions {
    fn default() -> Self {
        Self {
            expense: default_expense_names(),
            income: default_income_names(),
        }
    }
}

fn default_expense_names() -> Vec<String> {
    DEFAULT_EXPENSE_NAMES.iter().map(|s| s.to_string()).collect()
}

fn default_income_names() -> Vec<String> {
    DEFAULT_INCOME_NAMES.iter().map(|s| s.to_string()).collect()
}
