// ═══════════════════════════════════════════════════════════════════
// Model Tests — Currency, ExchangeRateTable, Operation, BalanceMap,
// NameSuggestions, LedgerData
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use finance_ledger_core::errors::CoreError;
use finance_ledger_core::models::balance::BalanceMap;
use finance_ledger_core::models::currency::{Currency, PIVOT_CURRENCY};
use finance_ledger_core::models::ledger::LedgerData;
use finance_ledger_core::models::operation::{Operation, OperationFilter, OperationKind};
use finance_ledger_core::models::rates::ExchangeRateTable;
use finance_ledger_core::models::settings::NameSuggestions;

fn usd() -> Currency {
    Currency::new("USD")
}

// ═══════════════════════════════════════════════════════════════════
// Currency
// ═══════════════════════════════════════════════════════════════════

mod currency {
    use super::*;

    #[test]
    fn codes_are_trimmed_and_uppercased() {
        assert_eq!(Currency::new(" usd ").as_str(), "USD");
        assert_eq!(Currency::new("Eur"), Currency::new("EUR"));
    }

    #[test]
    fn unknown_codes_are_accepted() {
        let c = Currency::parse("GBP").unwrap();
        assert_eq!(c.to_string(), "GBP");
    }

    #[test]
    fn empty_code_is_rejected() {
        assert!(matches!(Currency::parse("   "), Err(CoreError::InvalidCurrency(_))));
        assert!(matches!(Currency::parse(""), Err(CoreError::InvalidCurrency(_))));
    }

    #[test]
    fn pivot_is_rub() {
        assert_eq!(PIVOT_CURRENCY, "RUB");
        assert!(Currency::pivot().is_pivot());
        assert!(Currency::new("rub").is_pivot());
        assert!(!usd().is_pivot());
        assert_eq!(Currency::default(), Currency::pivot());
    }

    #[test]
    fn ordering_is_by_code() {
        let mut codes = vec![Currency::new("USD"), Currency::new("EUR"), Currency::new("KZT")];
        codes.sort();
        let sorted: Vec<&str> = codes.iter().map(Currency::as_str).collect();
        assert_eq!(sorted, vec!["EUR", "KZT", "USD"]);
    }

    #[test]
    fn serializes_as_plain_string() {
        assert_eq!(serde_json::to_string(&usd()).unwrap(), "\"USD\"");
        let back: Currency = serde_json::from_str("\"usd\"").unwrap();
        assert_eq!(back, usd());
    }
}

// ═══════════════════════════════════════════════════════════════════
// ExchangeRateTable
// ═══════════════════════════════════════════════════════════════════

mod rates {
    use super::*;

    #[test]
    fn starter_rates() {
        let table = ExchangeRateTable::default();
        assert_eq!(table.rate(&Currency::new("USD")), Some(dec!(90)));
        assert_eq!(table.rate(&Currency::new("EUR")), Some(dec!(100)));
        assert_eq!(table.rate(&Currency::new("RUB")), Some(dec!(1)));
        assert_eq!(table.rate(&Currency::new("KZT")), Some(dec!(0.2)));
        assert_eq!(table.rate(&Currency::new("UAH")), Some(dec!(2.3)));
        assert_eq!(table.rate(&Currency::new("BYN")), Some(dec!(28)));
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn pivot_rate_is_always_one() {
        let table = ExchangeRateTable::empty();
        assert_eq!(table.rate(&Currency::pivot()), Some(Decimal::ONE));
        assert!(table.contains(&Currency::pivot()));
    }

    #[test]
    fn missing_rate_is_none() {
        let table = ExchangeRateTable::default();
        assert_eq!(table.rate(&Currency::new("GBP")), None);
        assert!(!table.contains(&Currency::new("GBP")));
    }

    #[test]
    fn set_rate_replaces_and_returns_previous() {
        let mut table = ExchangeRateTable::default();
        let previous = table.set_rate(usd(), dec!(95.5)).unwrap();
        assert_eq!(previous, Some(dec!(90)));
        assert_eq!(table.rate(&usd()), Some(dec!(95.5)));
    }

    #[test]
    fn set_rate_adds_new_currency() {
        let mut table = ExchangeRateTable::default();
        assert_eq!(table.set_rate(Currency::new("GBP"), dec!(115)).unwrap(), None);
        assert_eq!(table.rate(&Currency::new("GBP")), Some(dec!(115)));
    }

    #[test]
    fn non_positive_rates_are_rejected_and_table_unchanged() {
        let mut table = ExchangeRateTable::default();
        for bad in [dec!(0), dec!(-1), dec!(-0.0001)] {
            let err = table.set_rate(usd(), bad).unwrap_err();
            assert!(matches!(err, CoreError::InvalidRate { .. }));
        }
        assert_eq!(table.rate(&usd()), Some(dec!(90)));
    }

    #[test]
    fn pivot_rate_cannot_be_set() {
        let mut table = ExchangeRateTable::default();
        let err = table.set_rate(Currency::pivot(), dec!(2)).unwrap_err();
        assert!(matches!(err, CoreError::PivotRateFixed(_)));
        assert_eq!(table.rate(&Currency::pivot()), Some(Decimal::ONE));
    }

    #[test]
    fn loaded_table_drops_bad_rates_and_forces_pivot() {
        let json = r#"{"USD": 91, "EUR": 0, "XYZ": -3, "RUB": 5}"#;
        let table: ExchangeRateTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.rate(&usd()), Some(dec!(91)));
        assert_eq!(table.rate(&Currency::new("EUR")), None);
        assert_eq!(table.rate(&Currency::new("XYZ")), None);
        assert_eq!(table.rate(&Currency::pivot()), Some(Decimal::ONE));
    }

    #[test]
    fn upper_case_key_wins_over_case_variants_on_load() {
        let json = r#"{" usd": 70, "USD": 91, "usd": 80, "gbp": 110}"#;
        let table: ExchangeRateTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.rate(&usd()), Some(dec!(91)));
        assert_eq!(table.rate(&Currency::new("GBP")), Some(dec!(110)));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn iteration_is_sorted_by_code() {
        let table = ExchangeRateTable::default();
        let codes: Vec<&str> = table.currencies().map(Currency::as_str).collect();
        assert_eq!(codes, vec!["BYN", "EUR", "KZT", "RUB", "UAH", "USD"]);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Operation
// ═══════════════════════════════════════════════════════════════════

mod operation {
    use super::*;

    fn salary() -> Operation {
        Operation::at(
            OperationKind::Income,
            "Зарплата",
            dec!(1000),
            usd(),
            "March",
            true,
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_milli_opt(10, 30, 15, 250)
                .unwrap(),
        )
    }

    #[test]
    fn getters() {
        let op = salary();
        assert_eq!(op.kind(), OperationKind::Income);
        assert_eq!(op.name(), "Зарплата");
        assert_eq!(op.amount(), dec!(1000));
        assert_eq!(op.currency(), &usd());
        assert_eq!(op.comment(), "March");
        assert!(op.is_pending());
    }

    #[test]
    fn timestamp_is_truncated_to_seconds() {
        let op = salary();
        assert_eq!(
            op.created_at(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(10, 30, 15).unwrap()
        );
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(salary().id(), salary().id());
    }

    #[test]
    fn signed_amount_follows_kind() {
        let income = Operation::new(OperationKind::Income, "", dec!(50), usd(), "", false);
        let expense = Operation::new(OperationKind::Expense, "", dec!(50), usd(), "", false);
        assert_eq!(income.signed_amount(), dec!(50));
        assert_eq!(expense.signed_amount(), dec!(-50));
    }

    #[test]
    fn serialized_field_names() {
        let json = serde_json::to_value(salary()).unwrap();
        assert_eq!(json["kind"], "income");
        assert_eq!(json["name"], "Зарплата");
        assert_eq!(json["currency"], "USD");
        assert_eq!(json["comment"], "March");
        assert_eq!(json["timestamp"], "2024-03-01 10:30:15");
        assert_eq!(json["pending"], true);
        assert!(json["id"].is_string());
        assert!(json["amount"].is_number());
    }

    #[test]
    fn legacy_record_without_id_loads() {
        let json = r#"{
            "type": "expense",
            "name": "Такси",
            "amount": 350.5,
            "currency": "RUB",
            "comment": "",
            "datetime": "2023-12-31 23:59:59",
            "is_pending": false
        }"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        assert_eq!(op.kind(), OperationKind::Expense);
        assert_eq!(op.amount(), dec!(350.5));
        assert!(!op.is_pending());
        assert_eq!(op.created_at().to_string(), "2023-12-31 23:59:59");
    }

    #[test]
    fn bad_timestamp_fails_to_load() {
        let json = r#"{"kind":"income","amount":1,"currency":"RUB","timestamp":"yesterday"}"#;
        assert!(serde_json::from_str::<Operation>(json).is_err());
    }

    #[test]
    fn filter_matches() {
        let pending = salary();
        let confirmed = Operation::new(OperationKind::Expense, "Кафе", dec!(5), usd(), "", false);
        assert!(OperationFilter::All.matches(&pending));
        assert!(OperationFilter::Pending.matches(&pending));
        assert!(!OperationFilter::Confirmed.matches(&pending));
        assert!(OperationFilter::Confirmed.matches(&confirmed));
        assert_eq!(OperationFilter::default(), OperationFilter::All);
    }

    #[test]
    fn kind_display() {
        assert_eq!(OperationKind::Income.to_string(), "Income");
        assert_eq!(OperationKind::Expense.to_string(), "Expense");
    }
}

// ═══════════════════════════════════════════════════════════════════
// BalanceMap
// ═══════════════════════════════════════════════════════════════════

mod balance_map {
    use super::*;

    #[test]
    fn absent_reads_as_zero() {
        let map = BalanceMap::new();
        assert_eq!(map.get(&usd()), Decimal::ZERO);
        assert!(map.is_empty());
    }

    #[test]
    fn apply_accumulates_signed_deltas() {
        let mut map = BalanceMap::new();
        map.apply(&usd(), dec!(100)).unwrap();
        map.apply(&usd(), dec!(-30.25)).unwrap();
        assert_eq!(map.get(&usd()), dec!(69.75));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn entry_reaching_zero_disappears() {
        let mut map = BalanceMap::new();
        map.apply(&usd(), dec!(0.1)).unwrap();
        map.apply(&usd(), dec!(0.2)).unwrap();
        map.apply(&usd(), dec!(-0.3)).unwrap();
        assert!(map.is_empty());
        assert_eq!(map, BalanceMap::new());
    }

    #[test]
    fn negative_balances_are_kept() {
        let mut map = BalanceMap::new();
        map.apply(&Currency::pivot(), dec!(-500)).unwrap();
        assert_eq!(map.get(&Currency::pivot()), dec!(-500));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn iteration_sorted_by_code() {
        let map: BalanceMap = [
            (Currency::new("USD"), dec!(1)),
            (Currency::new("EUR"), dec!(2)),
            (Currency::new("BYN"), dec!(3)),
        ]
        .into_iter()
        .collect();
        let codes: Vec<&str> = map.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(codes, vec!["BYN", "EUR", "USD"]);
    }

    #[test]
    fn normalize_drops_explicit_zeros_from_documents() {
        let mut map: BalanceMap = serde_json::from_str(r#"{"USD": 0, "EUR": 5}"#).unwrap();
        map.normalize();
        assert_eq!(map.iter().count(), 1);
        assert_eq!(map.get(&Currency::new("EUR")), dec!(5));
    }

    #[test]
    fn serializes_as_object_keyed_by_code() {
        let mut map = BalanceMap::new();
        map.apply(&usd(), dec!(12.5)).unwrap();
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["USD"].to_string(), "12.5");
    }

    #[test]
    fn apply_refuses_to_overflow() {
        let mut map = BalanceMap::new();
        map.apply(&usd(), Decimal::MAX).unwrap();
        let err = map.apply(&usd(), dec!(1)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount(_)));
        assert_eq!(map.get(&usd()), Decimal::MAX);
        assert!(map.checked_sum(&usd(), dec!(-1)).is_ok());
    }

    #[test]
    fn case_variant_keys_are_summed_on_load() {
        let map: BalanceMap =
            serde_json::from_str(r#"{"usd": 10, "USD": 5, " Eur ": 2}"#).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&usd()), dec!(15));
        assert_eq!(map.get(&Currency::new("EUR")), dec!(2));
    }
}

// ═══════════════════════════════════════════════════════════════════
// NameSuggestions
// ═══════════════════════════════════════════════════════════════════

mod name_suggestions {
    use super::*;

    #[test]
    fn defaults_are_present() {
        let names = NameSuggestions::default();
        assert!(names.for_kind(OperationKind::Expense).contains(&"Такси".to_string()));
        assert!(names.for_kind(OperationKind::Income).contains(&"Зарплата".to_string()));
    }

    #[test]
    fn add_trims_and_rejects_duplicates_and_blanks() {
        let mut names = NameSuggestions::default();
        assert!(names.add(OperationKind::Expense, "  Спортзал "));
        assert!(!names.add(OperationKind::Expense, "Спортзал"));
        assert!(!names.add(OperationKind::Expense, "   "));
        assert_eq!(
            names.for_kind(OperationKind::Expense).last().map(String::as_str),
            Some("Спортзал")
        );
    }

    #[test]
    fn lists_are_independent() {
        let mut names = NameSuggestions::default();
        let incomes = names.income.len();
        names.add(OperationKind::Expense, "Новое");
        assert_eq!(names.income.len(), incomes);
    }
}

// ═══════════════════════════════════════════════════════════════════
// LedgerData
// ═══════════════════════════════════════════════════════════════════

mod ledger_data {
    use super::*;

    #[test]
    fn default_is_fresh_install() {
        let data = LedgerData::default();
        assert!(data.operations.is_empty());
        assert!(data.confirmed_balances.is_empty());
        assert!(data.pending_balances.is_empty());
        assert!(data.base_currency.is_pivot());
        assert_eq!(data.exchange_rates, ExchangeRateTable::default());
        assert_eq!(data.names, NameSuggestions::default());
    }

    #[test]
    fn document_uses_camel_case_keys() {
        let json = serde_json::to_value(LedgerData::default()).unwrap();
        for key in [
            "operations",
            "confirmedBalances",
            "pendingBalances",
            "baseCurrency",
            "exchangeRates",
            "expenseNames",
            "incomeNames",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn empty_object_reads_as_default() {
        let data: LedgerData = serde_json::from_str("{}").unwrap();
        assert_eq!(data, LedgerData::default());
    }
}
