/// Decoder contract tests: field resolution, zero defaults for absent keys,
/// sequence reconstruction and fail-fast error reporting.
use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{json, Value};
use urlquery_core::{
    from_pairs, from_str, to_string, Config, Decoder, Encoder, KeyStyle, QueryError,
};

#[derive(Deserialize, Debug, PartialEq, Default, Clone)]
struct BuilderChild {
    #[serde(rename = "desc")]
    description: String,
    #[serde(rename = "Long,vip")]
    long: u16,
    #[serde(rename = "-")]
    height: i32,
}

#[derive(Deserialize, Debug, PartialEq, Default)]
struct BuilderInfo {
    #[serde(rename = "Id")]
    id: i32,
    name: String,
    child: BuilderChild,
    #[serde(rename = "childPtr")]
    child_ptr: Option<BuilderChild>,
    children: Vec<BuilderChild>,
    #[serde(rename = "Params")]
    params: Option<BTreeMap<String, char>>,
    #[serde(skip)]
    status: bool,
    #[serde(rename = "UintPtr")]
    uint_ptr: usize,
}

#[derive(Deserialize, Debug, PartialEq)]
struct Counter {
    n: u8,
}

fn child(description: &str, long: u16) -> BuilderChild {
    BuilderChild {
        description: description.into(),
        long,
        height: 0,
    }
}

// ============================================================================
// Records
// ============================================================================

#[test]
fn decode_nested_record() {
    let text = "Id=7&name=child&child%5Bdesc%5D=c1&child%5BLong%5D=0\
                &childPtr%5Bdesc%5D=cptr&childPtr%5BLong%5D=14\
                &children%5B0%5D%5Bdesc%5D=d1&children%5B0%5D%5BLong%5D=0\
                &children%5B1%5D%5Bdesc%5D=d2&children%5B1%5D%5BLong%5D=140\
                &Params%5Babc%5D=111&Params%5Bbbb%5D=222&UintPtr=222";
    let info: BuilderInfo = from_str(text).unwrap();

    assert_eq!(
        info,
        BuilderInfo {
            id: 7,
            name: "child".into(),
            child: child("c1", 0),
            child_ptr: Some(child("cptr", 14)),
            children: vec![child("d1", 0), child("d2", 140)],
            params: Some(BTreeMap::from([
                ("abc".to_string(), 'o'),
                ("bbb".to_string(), 'Þ'),
            ])),
            status: false,
            uint_ptr: 222,
        }
    );
}

#[test]
fn decode_absent_fields_are_zero() {
    let info: BuilderInfo = from_str("name=only").unwrap();
    assert_eq!(
        info,
        BuilderInfo {
            name: "only".into(),
            ..BuilderInfo::default()
        }
    );
}

#[test]
fn decode_empty_input_is_zero_record() {
    let info: BuilderInfo = from_str("").unwrap();
    assert_eq!(info, BuilderInfo::default());
}

#[test]
fn decode_unknown_keys_are_ignored() {
    let decoded: BuilderChild = from_str("desc=x&other=1&Long=5&extra%5Bdeep%5D=2").unwrap();
    assert_eq!(decoded, child("x", 5));
}

#[test]
fn decode_excluded_field_is_never_set() {
    let decoded: BuilderChild = from_str("desc=x&-=9&height=9").unwrap();
    assert_eq!(decoded.height, 0);
}

#[test]
fn decode_last_duplicate_wins() {
    let decoded: Counter = from_str("n=1&n=2").unwrap();
    assert_eq!(decoded, Counter { n: 2 });
}

// ============================================================================
// Sequences and maps
// ============================================================================

#[derive(Deserialize, Debug, PartialEq)]
struct Lists {
    v: Vec<i32>,
    o: Vec<Option<i32>>,
}

#[test]
fn decode_sequence_gaps_are_zero() {
    let lists: Lists = from_str("v[2]=5&o[1]=3").unwrap();
    assert_eq!(lists.v, vec![0, 0, 5]);
    assert_eq!(lists.o, vec![None, Some(3)]);
}

#[test]
fn decode_top_level_sequence() {
    let list: Vec<String> = from_str("1=b&0=a").unwrap();
    assert_eq!(list, ["a", "b"]);
}

#[test]
fn decode_sequence_ignores_non_index_keys() {
    let lists: Lists = from_str("v[0]=1&v[x]=2").unwrap();
    assert_eq!(lists.v, vec![1]);
}

#[test]
fn decode_sequence_length_is_bounded() {
    let err = from_str::<Lists>("v[1024]=1").unwrap_err();
    assert_eq!(
        err,
        QueryError::SequenceTooLong {
            key: "v".into(),
            index: 1024,
            limit: 1024,
        }
    );

    let mut decoder = Decoder::with_config(Config::default().with_max_sequence_len(4));
    assert!(decoder.unmarshal::<Lists>("v[3]=1").is_ok());
    assert!(matches!(
        decoder.unmarshal::<Lists>("v[4]=1"),
        Err(QueryError::SequenceTooLong { limit: 4, .. })
    ));
}

#[test]
fn decode_fixed_length_array() {
    #[derive(Deserialize, Debug)]
    struct Fixed {
        a: [i32; 3],
        t: (u8, String),
    }
    let fixed: Fixed = from_str("a[0]=1&a[5]=9&t[1]=x").unwrap();
    assert_eq!(fixed.a, [1, 0, 0]);
    assert_eq!(fixed.t, (0, "x".to_string()));
}

#[test]
fn decode_map_with_scalar_keys() {
    #[derive(Deserialize, Debug)]
    struct Maps {
        by_id: BTreeMap<u32, String>,
        by_char: BTreeMap<char, bool>,
    }
    let maps: Maps = from_str("by_id[10]=ten&by_id[2]=two&by_char[97]=true").unwrap();
    assert_eq!(
        maps.by_id,
        BTreeMap::from([(2, "two".to_string()), (10, "ten".to_string())])
    );
    assert_eq!(maps.by_char, BTreeMap::from([('a', true)]));
}

/// Map keys are parsed with the same scalar rules as values.
#[test]
fn decode_map_key_mismatch_reports_key() {
    let err = from_str::<BTreeMap<u32, String>>("abc=1").unwrap_err();
    assert_eq!(
        err,
        QueryError::TypeMismatch {
            key: "abc".into(),
            expected: "u32",
            found: "abc".into(),
        }
    );
}

#[test]
fn decode_absent_map_is_empty_and_absent_option_map_is_none() {
    #[derive(Deserialize, Debug)]
    struct Maps {
        required: BTreeMap<String, i32>,
        optional: Option<BTreeMap<String, i32>>,
    }
    let maps: Maps = from_str("").unwrap();
    assert!(maps.required.is_empty());
    assert_eq!(maps.optional, None);
}

// ============================================================================
// Options and scalars
// ============================================================================

#[derive(Deserialize, Debug, PartialEq)]
struct Optional {
    count: Option<i32>,
    label: Option<String>,
}

#[test]
fn decode_present_option_is_some() {
    let value: Optional = from_str("count=0&label").unwrap();
    assert_eq!(
        value,
        Optional {
            count: Some(0),
            label: Some(String::new()),
        }
    );
}

#[test]
fn decode_absent_option_is_none() {
    let value: Optional = from_str("unrelated=1").unwrap();
    assert_eq!(
        value,
        Optional {
            count: None,
            label: None,
        }
    );
}

#[test]
fn decode_scalar_kinds() {
    #[derive(Deserialize, Debug)]
    struct Scalars {
        b: bool,
        i: i64,
        u: u128,
        f: f32,
        c: char,
        s: String,
    }
    let value: Scalars =
        from_str("b=true&i=-99999980000001&u=340282366920938463463374607431768211455&f=1.2&c=20320&s=%E6%B5%8B%E8%AF%95")
            .unwrap();
    assert!(value.b);
    assert_eq!(value.i, -99_999_980_000_001);
    assert_eq!(value.u, u128::MAX);
    assert_eq!(value.f, 1.2);
    assert_eq!(value.c, '你');
    assert_eq!(value.s, "测试");
}

#[test]
fn decode_plus_is_space() {
    #[derive(Deserialize)]
    struct Search {
        q: String,
    }
    let search: Search = from_str("?q=rust+serde%2Bmore").unwrap();
    assert_eq!(search.q, "rust serde+more");
}

// ============================================================================
// Enums
// ============================================================================

#[derive(Deserialize, Debug, PartialEq)]
enum Color {
    Red,
    Green,
}

#[derive(Deserialize, Debug, PartialEq)]
enum Shape {
    Dot,
    Circle(u32),
    Rect { w: u32 },
}

#[derive(Deserialize, Debug, PartialEq)]
struct Styled {
    color: Color,
    shape: Shape,
}

#[test]
fn decode_unit_and_newtype_variants() {
    let styled: Styled = from_str("color=Green&shape[Circle]=3").unwrap();
    assert_eq!(
        styled,
        Styled {
            color: Color::Green,
            shape: Shape::Circle(3),
        }
    );
}

#[test]
fn decode_absent_enum_is_first_variant() {
    let styled: Styled = from_str("").unwrap();
    assert_eq!(styled.color, Color::Red);
    assert_eq!(styled.shape, Shape::Dot);
}

#[test]
fn decode_unknown_variant_fails() {
    assert!(matches!(
        from_str::<Styled>("color=Blue"),
        Err(QueryError::Message(msg)) if msg.contains("Blue")
    ));
}

#[test]
fn decode_struct_variant_is_unsupported() {
    assert!(matches!(
        from_str::<Styled>("shape[Rect][w]=1"),
        Err(QueryError::UnsupportedType { key, .. }) if key == "shape"
    ));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn decode_type_mismatch_names_the_key() {
    let err = from_str::<BuilderInfo>("children%5B1%5D%5BLong%5D=abc").unwrap_err();
    assert_eq!(
        err,
        QueryError::TypeMismatch {
            key: "children[1][Long]".into(),
            expected: "u16",
            found: "abc".into(),
        }
    );
}

#[test]
fn decode_bool_rejects_numbers() {
    #[derive(Deserialize, Debug)]
    struct Flag {
        #[allow(dead_code)]
        on: bool,
    }
    assert!(matches!(
        from_str::<Flag>("on=1"),
        Err(QueryError::TypeMismatch { expected: "bool", .. })
    ));
}

#[test]
fn decode_range_overflow() {
    let err = from_str::<Counter>("n=300").unwrap_err();
    assert_eq!(
        err,
        QueryError::RangeOverflow {
            key: "n".into(),
            kind: "u8",
            value: "300".into(),
        }
    );
}

#[test]
fn decode_nested_keys_under_scalar_field() {
    let err = from_str::<Counter>("n[x]=1").unwrap_err();
    assert_eq!(
        err,
        QueryError::TypeMismatch {
            key: "n".into(),
            expected: "u8",
            found: "nested keys".into(),
        }
    );
}

#[test]
fn decode_top_level_scalar_is_unsupported() {
    assert!(matches!(
        from_str::<i32>("5"),
        Err(QueryError::UnsupportedType { key, .. }) if key == "<root>"
    ));
    assert!(matches!(
        from_str::<String>(""),
        Err(QueryError::UnsupportedType { .. })
    ));
}

#[test]
fn decode_invalid_escape() {
    assert_eq!(
        from_str::<Counter>("n=%FF").unwrap_err(),
        QueryError::InvalidEncoding { token: "%FF".into() }
    );
}

#[test]
fn decode_into_leaves_destination_on_failure() {
    let mut decoder = Decoder::new();
    let mut dest = Counter { n: 42 };
    assert!(decoder.unmarshal_into("n=oops", &mut dest).is_err());
    assert_eq!(dest, Counter { n: 42 });

    decoder.unmarshal_into("n=7", &mut dest).unwrap();
    assert_eq!(dest, Counter { n: 7 });
}

// ============================================================================
// Self-describing destinations
// ============================================================================

#[test]
fn decode_into_json_value() {
    let value: Value = from_str("a=1&b%5Bc%5D=x&b%5Bd%5D=true&e=-3&f=1.5").unwrap();
    assert_eq!(
        value,
        json!({"a": 1, "b": {"c": "x", "d": true}, "e": -3, "f": 1.5})
    );
}

#[test]
fn decode_empty_into_json_value_is_empty_object() {
    let value: Value = from_str("").unwrap();
    assert_eq!(value, json!({}));
}

#[test]
fn decode_malformed_bracket_key_is_literal() {
    let map: BTreeMap<String, String> = from_str("a%5Bb=1&%5Bc%5D=2").unwrap();
    assert_eq!(
        map,
        BTreeMap::from([
            ("[c]".to_string(), "2".to_string()),
            ("a[b".to_string(), "1".to_string()),
        ])
    );
}

#[test]
fn decode_map_key_with_separator_characters_is_regrouped() {
    // Keys are written verbatim, so a key that spells a path decodes as one.
    let text = to_string(&BTreeMap::from([("a[0]", 1)])).unwrap();
    assert_eq!(text, "a%5B0%5D=1");
    let value: Value = from_str(&text).unwrap();
    assert_eq!(value, json!({"a": {"0": 1}}));

    let config = Config::default().with_key_style(KeyStyle::Dot);
    let mut encoder = Encoder::with_config(config.clone());
    let text = encoder
        .marshal(&BTreeMap::from([("a.b", 1)]))
        .unwrap()
        .to_string();
    let value: Value = Decoder::with_config(config).unmarshal(&text).unwrap();
    assert_eq!(value, json!({"a": {"b": 1}}));
}

// ============================================================================
// Sessions and styles
// ============================================================================

#[test]
fn decode_dot_style() {
    let mut decoder = Decoder::with_config(Config::default().with_key_style(KeyStyle::Dot));
    let info: BuilderInfo = decoder
        .unmarshal("child.desc=c1&children.0.desc=d1&children.0.Long=3")
        .unwrap();
    assert_eq!(info.child, child("c1", 0));
    assert_eq!(info.children, vec![child("d1", 3)]);
}

#[test]
fn decode_calls_are_independent() {
    let mut decoder = Decoder::new();
    let first: BuilderChild = decoder.unmarshal("desc=a&Long=1").unwrap();
    let second: BuilderChild = decoder.unmarshal("Long=2").unwrap();
    assert_eq!(first, child("a", 1));
    assert_eq!(second, child("", 2));
}

#[test]
fn decode_from_unescaped_pairs() {
    let pairs = vec![("children[0][desc]", "d1"), ("name", "n")];
    let info: BuilderInfo = from_pairs(pairs).unwrap();
    assert_eq!(info.name, "n");
    assert_eq!(info.children, vec![child("d1", 0)]);
}
