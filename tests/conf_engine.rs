//! End-to-end tests for the configuration value engine: parse, print,
//! path lookup and overlay patches working against each other the way
//! the controller drives them.

use bumpalo::Bump;
use gantry::{clone_value, compile, get_value, parse, print, Compiled, Value};

fn apply<'a>(
    root: Value<'a>,
    value: Option<Value<'a>>,
    path: &str,
    arena: &'a Bump,
) -> Option<Value<'a>> {
    match compile(root, value, path, arena) {
        Compiled::Ops(ops) => Some(clone_value(root, Some(ops), arena).unwrap()),
        Compiled::Declined => None,
    }
}

#[test]
fn parse_print_round_trip() {
    let documents: [&str; 6] = [
        r#"{"a":1,"b":[2,3]}"#,
        r#"{"listeners":{"*:8080":{"application":"blog"}},"applications":{"blog":{"type":"external","processes":4}}}"#,
        r#"[1,-2,[],{},"s",null,true,false]"#,
        r#"{"empty":{},"nested":{"deep":{"deeper":[0]}}}"#,
        "9223372036854775807",
        r#""plain string""#,
    ];

    for doc in documents {
        let arena = Bump::new();
        let value = parse(doc.as_bytes(), &arena).unwrap();
        assert_eq!(print(value, false), doc.as_bytes(), "document {}", doc);
    }
}

#[test]
fn round_trip_normalizes_whitespace_only() {
    let arena = Bump::new();
    let value = parse(b" {\r\n \"a\" : 1 ,\t\"b\" : [ 2 , 3 ] } ", &arena).unwrap();
    assert_eq!(print(value, false), br#"{"a":1,"b":[2,3]}"#);
}

#[test]
fn pretty_print_shape() {
    let arena = Bump::new();
    let value = parse(br#"{"a":1,"b":[2,3]}"#, &arena).unwrap();
    let out = String::from_utf8(print(value, true)).unwrap();

    assert!(out.starts_with("{\r\n\t\"a\": 1,"));
    assert!(out.contains("\t\"b\": [\r\n\t\t2,\r\n\t\t3\r\n\t]"));
    assert!(out.ends_with("\r\n}"));
}

#[test]
fn patch_create() {
    let arena = Bump::new();
    let root = parse(br#"{"a":1}"#, &arena).unwrap();
    let two = parse(b"2", &arena).unwrap();

    let out = apply(root, Some(two), "/b", &arena).unwrap();
    assert_eq!(print(out, false), br#"{"a":1,"b":2}"#);
}

#[test]
fn patch_delete_missing_declined() {
    let arena = Bump::new();
    let root = parse(br#"{"a":1}"#, &arena).unwrap();

    assert!(matches!(
        compile(root, None, "/b", &arena),
        Compiled::Declined
    ));
}

#[test]
fn patch_chain_of_edits() {
    let arena = Bump::new();
    let mut conf = parse(br#"{"listeners":{},"applications":{}}"#, &arena).unwrap();

    let app = parse(br#"{"type":"external","processes":2}"#, &arena).unwrap();
    conf = apply(conf, Some(app), "/applications/blog", &arena).unwrap();

    let listener = parse(br#"{"application":"blog"}"#, &arena).unwrap();
    conf = apply(conf, Some(listener), "/listeners/*:8080", &arena).unwrap();

    let processes = parse(b"8", &arena).unwrap();
    conf = apply(conf, Some(processes), "/applications/blog/processes", &arena).unwrap();

    assert_eq!(
        get_value(conf, "/applications/blog/processes")
            .unwrap()
            .as_int(),
        Some(8)
    );
    assert_eq!(
        get_value(conf, "/listeners/*:8080/application")
            .unwrap()
            .as_str(),
        Some("blog")
    );

    conf = apply(conf, None, "/listeners/*:8080", &arena).unwrap();
    assert!(get_value(conf, "/listeners/*:8080").is_none());
    assert_eq!(
        print(get_value(conf, "/listeners").unwrap(), false),
        b"{}"
    );
}

#[test]
fn disjoint_patches_commute() {
    let arena = Bump::new();
    let root = parse(br#"{"a":{"x":1},"b":{"y":2}}"#, &arena).unwrap();
    let seven = parse(b"7", &arena).unwrap();
    let eight = parse(b"8", &arena).unwrap();

    let first = apply(apply(root, Some(seven), "/a/x", &arena).unwrap(), Some(eight), "/b/y", &arena)
        .unwrap();
    let second = apply(apply(root, Some(eight), "/b/y", &arena).unwrap(), Some(seven), "/a/x", &arena)
        .unwrap();

    assert_eq!(print(first, false), print(second, false));
}

#[test]
fn plain_clone_is_identity() {
    let arena = Bump::new();
    let root = parse(
        br#"{"a":{"b":[1,2,{"c":"deep string beyond inline"}]},"d":null}"#,
        &arena,
    )
    .unwrap();

    let copy = clone_value(root, None, &arena).unwrap();
    assert_eq!(print(copy, false), print(root, false));
}

#[test]
fn patched_tree_shares_untouched_subtrees() {
    let arena = Bump::new();
    let root = parse(
        br#"{"huge":{"a":[1,2,3,4,5,6,7,8],"b":{"c":"payload payload payload"}},"knob":1}"#,
        &arena,
    )
    .unwrap();
    let two = parse(b"2", &arena).unwrap();

    let out = apply(root, Some(two), "/knob", &arena).unwrap();

    let old = get_value(root, "/huge").unwrap().as_object().unwrap();
    let new = get_value(out, "/huge").unwrap().as_object().unwrap();
    assert!(std::ptr::eq(old, new), "untouched subtree was copied");

    // The old tree stays intact and readable.
    assert_eq!(get_value(root, "/knob").unwrap().as_int(), Some(1));
    assert_eq!(get_value(out, "/knob").unwrap().as_int(), Some(2));
}

#[test]
fn short_string_boundary() {
    let arena = Bump::new();

    let fourteen = parse(br#""12345678901234""#, &arena).unwrap();
    assert!(matches!(fourteen, Value::Short(_)));

    let fifteen = parse(br#""123456789012345""#, &arena).unwrap();
    assert!(matches!(fifteen, Value::Str(_)));

    // Both print identically to their source.
    assert_eq!(print(fourteen, false), br#""12345678901234""#);
    assert_eq!(print(fifteen, false), br#""123456789012345""#);
}

#[test]
fn integer_overflow_rejected() {
    let arena = Bump::new();
    assert!(parse(b"9223372036854775808", &arena).is_err());
    assert!(parse(b"-9223372036854775809", &arena).is_err());
}

#[test]
fn surrogate_pair_decoding() {
    let arena = Bump::new();

    let clef = parse(br#""\uD834\uDD1E""#, &arena).unwrap();
    assert_eq!(clef.string_bytes(), Some(&[0xf0, 0x9d, 0x84, 0x9e][..]));

    assert!(parse(br#""\uD834""#, &arena).is_err());
    assert!(parse(br#""\uDD1E\uD834""#, &arena).is_err());
}

#[test]
fn deep_path_lookup() {
    let arena = Bump::new();
    let root = parse(
        br#"{"a":{"b":{"c":{"d":{"e":42}}}},"other":"x"}"#,
        &arena,
    )
    .unwrap();

    assert_eq!(get_value(root, "/a/b/c/d/e").unwrap().as_int(), Some(42));
    assert!(get_value(root, "/a/b/c/d/e/f").is_none());
    assert!(get_value(root, "/a/missing/c").is_none());
}

#[test]
fn create_intermediate_declined() {
    let arena = Bump::new();
    let root = parse(br#"{"a":{}}"#, &arena).unwrap();
    let one = parse(b"1", &arena).unwrap();

    // "/a/b" creates under an existing object ...
    assert!(apply(root, Some(one), "/a/b", &arena).is_some());

    // ... but "/x/y" cannot create the missing intermediate "x".
    assert!(matches!(
        compile(root, Some(one), "/x/y", &arena),
        Compiled::Declined
    ));
}

#[test]
fn long_member_names_patch() {
    let arena = Bump::new();
    let root = parse(br#"{}"#, &arena).unwrap();
    let one = parse(b"1", &arena).unwrap();

    let out = apply(root, Some(one), "/a-member-name-well-past-inline", &arena).unwrap();
    assert_eq!(
        get_value(out, "/a-member-name-well-past-inline")
            .unwrap()
            .as_int(),
        Some(1)
    );
    assert_eq!(
        print(out, false),
        br#"{"a-member-name-well-past-inline":1}"#
    );
}
