//! Text search over a record collection.

use crate::record::Record;
use crate::schema::RecordSchema;

/// Whether `record` matches an already-lowercased query.
///
/// A record matches when at least one searchable field has a text form
/// containing the query, compared case-insensitively.
pub fn matches_lowercase(record: &Record, lowered_query: &str, schema: &RecordSchema) -> bool {
    schema.searchable_fields().iter().any(|path| {
        record
            .get_path(path)
            .and_then(|value| value.search_text())
            .is_some_and(|text| text.to_lowercase().contains(lowered_query))
    })
}

pub fn matches(record: &Record, query: &str, schema: &RecordSchema) -> bool {
    query.is_empty() || matches_lowercase(record, &query.to_lowercase(), schema)
}

/// Records matching `query`, in source order.
///
/// An empty query returns every record.
pub fn filter<'a>(records: &'a [Record], query: &str, schema: &RecordSchema) -> Vec<&'a Record> {
    if query.is_empty() {
        return records.iter().collect();
    }
    let lowered = query.to_lowercase();
    records
        .iter()
        .filter(|record| matches_lowercase(record, &lowered, schema))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::{FieldValue, Fields};
    use proptest::prelude::*;

    fn product(id: &str, name: &str, category: &str, sku: &str) -> Record {
        Record::new(
            id,
            Fields::from([
                ("name".to_string(), FieldValue::from(name)),
                ("category".to_string(), FieldValue::from(category)),
                ("sku".to_string(), FieldValue::from(sku)),
            ]),
        )
    }

    fn ids<'a>(records: &[&'a Record]) -> Vec<&'a str> {
        records.iter().map(|r| r.id().as_str()).collect()
    }

    #[test]
    fn finds_saree_by_prefix() {
        let schema = RecordSchema::new("items").searchable(["name"]);
        let records = vec![
            Record::new("1", Fields::from([("name".to_string(), FieldValue::from("Kurti"))])),
            Record::new("2", Fields::from([("name".to_string(), FieldValue::from("Saree"))])),
        ];
        let found = filter(&records, "sar", &schema);
        assert_eq!(ids(&found), vec!["2"]);
    }

    #[test]
    fn empty_query_is_identity() {
        let schema = RecordSchema::product();
        let records = vec![
            product("1", "Kurti", "Kurtis", "KUR001"),
            product("2", "Saree", "Sarees", "SAR001"),
        ];
        let found = filter(&records, "", &schema);
        assert_eq!(ids(&found), vec!["1", "2"]);
    }

    #[test]
    fn matches_any_searchable_field_case_insensitively() {
        let schema = RecordSchema::product();
        let records = vec![
            product("1", "Anarkali", "Kurtis", "KUR001"),
            product("2", "Banarasi", "Sarees", "SAR001"),
            product("3", "Dupatta", "Accessories", "ACC001"),
        ];
        assert_eq!(ids(&filter(&records, "KURTI", &schema)), vec!["1"]);
        assert_eq!(ids(&filter(&records, "sar0", &schema)), vec!["2"]);
        assert_eq!(ids(&filter(&records, "a", &schema)), vec!["1", "2", "3"]);
        assert!(filter(&records, "lehenga", &schema).is_empty());
    }

    #[test]
    fn non_searchable_fields_are_ignored() {
        let schema = RecordSchema::product();
        let mut record = product("1", "Kurti", "Kurtis", "KUR001");
        record.set("color", "Maroon");
        assert!(!matches(&record, "maroon", &schema));
    }

    #[test]
    fn numeric_fields_match_on_decimal_digits() {
        let schema = RecordSchema::order();
        let order = Record::new(
            "o1",
            Fields::from([
                ("firstName".to_string(), FieldValue::from("Asha")),
                ("phoneNumber".to_string(), FieldValue::from(9876543210i64)),
            ]),
        );
        assert!(matches(&order, "6543", &schema));
        assert!(!matches(&order, "1234", &schema));
    }

    #[test]
    fn missing_and_null_fields_never_match() {
        let schema = RecordSchema::customer();
        let customer = Record::new(
            "c1",
            Fields::from([("username".to_string(), FieldValue::Null)]),
        );
        assert!(!matches(&customer, "null", &schema));
        assert!(matches(&customer, "", &schema));
    }

    #[test]
    fn customers_match_on_username_and_email_only() {
        let schema = RecordSchema::customer();
        let customers = vec![Record::new(
            "c1",
            Fields::from([
                ("username".to_string(), FieldValue::from("asha")),
                ("email".to_string(), FieldValue::from("asha@shop.example")),
                ("mobilenumber".to_string(), FieldValue::from("9876543210")),
            ]),
        )];
        assert!(filter(&customers, "6543", &schema).is_empty());
        assert_eq!(ids(&filter(&customers, "ASHA", &schema)), vec!["c1"]);
        assert_eq!(ids(&filter(&customers, "shop.ex", &schema)), vec!["c1"]);
    }

    #[test]
    fn nested_searchable_paths() {
        let schema = RecordSchema::new("orders").searchable([crate::values::FieldPath::parse("address.city").unwrap()]);
        let order = Record::new(
            "o1",
            Fields::from([(
                "address".to_string(),
                crate::field_object! { "city" => "Jaipur" },
            )]),
        );
        assert!(matches(&order, "jai", &schema));
    }

    fn arb_records() -> impl Strategy<Value = Vec<Record>> {
        prop::collection::vec(("[a-zA-Z ]{0,8}", "[A-Z]{3}[0-9]{3}"), 0..20).prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (name, sku))| product(&i.to_string(), &name, "Misc", &sku))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn result_is_exactly_the_matching_subsequence(records in arb_records(), query in "[a-zA-Z0-9]{0,3}") {
            let schema = RecordSchema::product();
            let found = filter(&records, &query, &schema);
            let lowered = query.to_lowercase();

            let expected: Vec<&Record> = records
                .iter()
                .filter(|r| {
                    ["name", "category", "sku"].iter().any(|f| {
                        r.get(f)
                            .and_then(|v| v.as_str())
                            .is_some_and(|s| s.to_lowercase().contains(&lowered))
                    })
                })
                .collect();
            prop_assert_eq!(found, expected);
        }

        #[test]
        fn filter_is_pure(records in arb_records(), query in "[a-z]{0,2}") {
            let schema = RecordSchema::product();
            prop_assert_eq!(filter(&records, &query, &schema), filter(&records, &query, &schema));
        }
    }
}
