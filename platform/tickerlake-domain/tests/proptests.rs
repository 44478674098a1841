use chrono::NaiveDate;
use proptest::prelude::*;
use serde_json::json;
use tickerlake_domain::services::mapper::{map_batch, map_record};
use tickerlake_domain::services::schema::TargetSchema;
use tickerlake_domain::value_objects::cell::CellValue;
use tickerlake_domain::value_objects::ticker::TickerRecord;

fn record(value: serde_json::Value) -> TickerRecord {
    serde_json::from_value(value).expect("ticker record should deserialize")
}

fn load_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 8).expect("valid date")
}

fn column_index(schema: &TargetSchema, name: &str) -> usize {
    schema
        .columns()
        .iter()
        .position(|column| column.name == name)
        .expect("column exists")
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn varchar_columns_pass_strings_through_unchanged(text in ".{0,64}") {
        let schema = TargetSchema::reference_tickers();
        let row = map_record(&record(json!({"name": text.clone()})), &schema, load_date());
        let index = column_index(&schema, "name");
        prop_assert_eq!(&row[index], &CellValue::Text(text));
    }

    #[test]
    fn boolean_columns_null_anything_but_the_two_literals(text in "[a-zA-Z0-9 ]{0,16}") {
        prop_assume!(!text.eq_ignore_ascii_case("true") && !text.eq_ignore_ascii_case("false"));
        let schema = TargetSchema::reference_tickers();
        let row = map_record(&record(json!({"active": text})), &schema, load_date());
        let index = column_index(&schema, "active");
        prop_assert_eq!(&row[index], &CellValue::Null);
    }

    #[test]
    fn load_date_is_identical_across_arbitrary_batches(symbols in prop::collection::vec("[A-Z]{1,5}", 0..20)) {
        let schema = TargetSchema::reference_tickers();
        let records: Vec<TickerRecord> = symbols
            .iter()
            .map(|symbol| record(json!({"ticker": symbol})))
            .collect();

        let batch = map_batch(&records, &schema, load_date());
        let index = column_index(&schema, "ds");
        prop_assert_eq!(batch.len(), records.len());
        for row in &batch.rows {
            prop_assert_eq!(&row[index], &CellValue::Text("2026-08-08".to_string()));
        }
    }
}
