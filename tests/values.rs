#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use urlquery::{Container, Parser, QueryDecode};

#[derive(Debug, Default, QueryDecode)]
struct Form {
    name: String,
    tags: Vec<u32>,
    #[query = "meta"]
    metadata: BTreeMap<String, String>,
}

#[test]
fn bracket_suffix_spreads_values_by_position() {
    let values = vec![("tags[]", vec!["3", "1", "2"]), ("name", vec!["ann"])];
    let mut v = Form::default();
    urlquery::unmarshal_values(values, &mut v).unwrap();
    assert_eq!(v.tags, [3, 1, 2]);
    assert_eq!(v.name, "ann");
}

#[test]
fn plain_key_uses_first_value() {
    let values = vec![("name", vec!["first", "second"]), ("meta[a]", vec!["x", "y"])];
    let mut v = Form::default();
    Parser::new().unmarshal_values(values, &mut v).unwrap();
    assert_eq!(v.name, "first");
    assert_eq!(v.metadata.get("a").map(String::as_str), Some("x"));
}

#[test]
fn empty_value_list_contributes_nothing() {
    let values: Vec<(&str, Vec<&str>)> = vec![("name", vec![])];
    let mut v = Form {
        name: "kept".into(),
        ..Form::default()
    };
    urlquery::unmarshal_values(values, &mut v).unwrap();
    assert_eq!(v.name, "kept");
}

#[test]
fn keys_are_taken_as_given() {
    let values = vec![("tags%5B0%5D", vec!["9"])];
    let mut v = Form::default();
    urlquery::unmarshal_values(values, &mut v).unwrap();
    assert!(v.tags.is_empty());

    let c = Container::from_values(vec![("tags%5B0%5D", vec!["9"])]);
    assert_eq!(c.get("tags%5B0%5D"), Some("9"));
}

#[test]
fn parsed_query_feeds_values_path() {
    let query = "name=b%C3%B8b&tags%5B%5D=7&tags%5B%5D=8&meta%5Bk+1%5D=v+1";
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
        grouped.entry(k.into_owned()).or_default().push(v.into_owned());
    }

    let mut v = Form::default();
    urlquery::unmarshal_values(grouped, &mut v).unwrap();
    assert_eq!(v.name, "bøb");
    assert_eq!(v.tags, [7, 8]);
    assert_eq!(v.metadata.get("k 1").map(String::as_str), Some("v 1"));
}

#[test]
fn raw_and_values_paths_agree() {
    let mut from_raw = Form::default();
    urlquery::unmarshal(b"name=x&tags[]=4&tags[]=5&meta[k]=v", &mut from_raw).unwrap();

    let mut from_values = Form::default();
    urlquery::unmarshal_values(
        vec![
            ("name", vec!["x"]),
            ("tags[]", vec!["4", "5"]),
            ("meta[k]", vec!["v"]),
        ],
        &mut from_values,
    )
    .unwrap();

    assert_eq!(from_raw.name, from_values.name);
    assert_eq!(from_raw.tags, from_values.tags);
    assert_eq!(from_raw.metadata, from_values.metadata);
}
