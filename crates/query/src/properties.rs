use crate::{normalize, Filters, ListQuery, Operator, QueryBuilder};
use proptest::prelude::*;
use serde_json::{json, Value};

fn arb_path() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_]{0,6}(\\.[A-Za-z][A-Za-z0-9_]{0,6}){0,2}"
}

fn arb_operator() -> impl Strategy<Value = Operator> {
    prop::sample::select(Operator::ALL.to_vec())
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<u32>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-z0-9 &=\\[\\]?#%]{0,8}".prop_map(Value::from),
        Just(Value::Null),
    ]
}

fn arb_filters() -> impl Strategy<Value = Vec<(String, Operator, Value)>> {
    prop::collection::vec((arb_path(), arb_operator(), arb_scalar()), 0..5)
}

fn arb_params() -> impl Strategy<Value = Vec<(String, Value)>> {
    prop::collection::vec(
        (
            prop_oneof![
                "[a-zA-Z]{1,10}",
                Just("page".to_string()),
                Just("pagination[page]".to_string()),
                Just("filters".to_string()),
            ],
            arb_scalar(),
        ),
        0..4,
    )
}

fn arb_items() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(
        (any::<u32>(), "[a-z]{0,6}").prop_map(|(id, name)| json!({ "id": id, "Name": name })),
        0..6,
    )
}

proptest! {
    #[test]
    fn pagination_appears_once_under_its_own_key(
        page in 1u32..10_000,
        page_size in 1u32..500,
        filters in arb_filters(),
        params in arb_params(),
    ) {
        let mut query = ListQuery::new().paginate(page, page_size).unwrap();
        let mut built = Filters::new();
        for (path, op, value) in filters {
            built.insert(&path, op, value);
        }
        query = query.filters(built);
        for (key, value) in params {
            // Reserved keys are refused; the query stays as it was.
            if let Ok(next) = query.clone().param(key, value) {
                query = next;
            }
        }

        let encoded = QueryBuilder::default().to_query_string(&query);
        let expected = format!("pagination[page]={page}&pagination[pageSize]={page_size}");

        prop_assert!(encoded.starts_with(&expected), "{}", encoded);
        prop_assert_eq!(encoded.matches(&expected).count(), 1);
        let pairs: Vec<&str> = encoded.split('&').collect();
        prop_assert_eq!(pairs.iter().filter(|p| p.starts_with("pagination[")).count(), 2);
        prop_assert!(!pairs.iter().any(|p| p.starts_with("page=") || p.starts_with("pageSize=")));
    }

    #[test]
    fn normalizing_is_independent_of_wrapping_depth(
        items in arb_items(),
        total in proptest::option::of(0u64..100_000),
    ) {
        let mut meta = json!({});
        if let Some(total) = total {
            meta = json!({ "pagination": { "page": 1, "pageSize": 12, "total": total } });
        }
        let envelope = json!({ "data": items, "meta": meta });

        let once = normalize(&envelope);
        let twice = normalize(&json!({ "data": envelope }));

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(&once.items, &items);
        prop_assert_eq!(once.total, total.unwrap_or(0));
    }
}
