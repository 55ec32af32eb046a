/*
 * error_messages.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Snapshot tests for the rendered text of every error kind.
 */

use quarto_json::{ParseOptions, ValueBuilder, parse, parse_file, parse_with_options};

fn error_text<T: std::fmt::Debug>(result: quarto_json::Result<T>) -> String {
    result.unwrap_err().to_string()
}

#[test]
fn test_parse_error_messages() {
    insta::assert_snapshot!(
        error_text(parse("42")),
        @"Parse error at line 1, column 1: root must be an object or array, found int64 (near `42`)"
    );
    insta::assert_snapshot!(
        error_text(parse("{}{}")),
        @"Parse error at line 1, column 3: trailing characters (near `{}{}`)"
    );
    insta::assert_snapshot!(
        error_text(parse(r#"{"a": 1, "a": 2}"#)),
        @r#"Parse error at line 1, column 12: duplicate key `a` (near `{"a": 1, "a": 2}`)"#
    );
    insta::assert_snapshot!(
        error_text(parse_file("", "empty.json")),
        @"Parse error in empty.json at line 1, column 1: EOF while parsing a value"
    );
}

#[test]
fn test_depth_limit_message() {
    let options = ParseOptions::default().with_max_depth(1);
    let err = error_text(parse_with_options("[[]]", &options));
    assert!(
        err.contains("nesting depth exceeds limit of 1"),
        "unexpected message: {}",
        err
    );
}

#[test]
fn test_navigation_error_messages() {
    let json = parse(r#"{"a": [0, 1, {"b": "x"}], "n": 3}"#).unwrap();

    insta::assert_snapshot!(
        error_text(json.get("a").unwrap().at(5)),
        @"Index 5 out of bounds at .a: size is 3"
    );
    insta::assert_snapshot!(
        error_text(json.get("n").unwrap().get("x")),
        @"Type mismatch at .n: expected object, found int64"
    );
    insta::assert_snapshot!(
        error_text(json.get("a").unwrap().at(2).unwrap().get("b").unwrap().to::<bool>()),
        @"Type mismatch at .a[2].b: expected bool, found string"
    );
    insta::assert_snapshot!(
        error_text(json.get("missing").unwrap().to::<i32>()),
        @"Type mismatch at .missing: expected i32, found missing"
    );
    insta::assert_snapshot!(
        error_text(json.check_not_missing().and(json.get("zz").unwrap().check_not_missing())),
        @"Type mismatch at .zz: expected a value, found missing"
    );
}

#[test]
fn test_numeric_error_messages() {
    let json = parse(r#"{"big": 300, "frac": 2.5, "huge": 9007199254740992.0}"#).unwrap();

    insta::assert_snapshot!(
        error_text(json.get("big").unwrap().to::<u8>()),
        @"Type mismatch at .big: expected u8, found int64 300 (out of range)"
    );
    insta::assert_snapshot!(
        error_text(json.get("frac").unwrap().to::<i64>()),
        @"Type mismatch at .frac: expected i64, found double 2.5 (not exactly representable as an integer)"
    );
    insta::assert_snapshot!(
        error_text(json.get("huge").unwrap().to::<i64>()),
        @"Type mismatch at .huge: expected i64, found double 9007199254740992 (not exactly representable as an integer)"
    );
}

#[test]
fn test_builder_error_messages() {
    let mut builder = ValueBuilder::new();
    builder.member_mut("list").unwrap().push(1).unwrap();

    let list = builder.member_mut("list").unwrap();
    insta::assert_snapshot!(
        error_text(list.set("k", 1)),
        @"Type mismatch at .list: expected object, found array"
    );
    insta::assert_snapshot!(
        error_text(list.element_mut(3).map(|_| ())),
        @"Index 3 out of bounds at .list: size is 1"
    );
}
