//! Canonical serialization of intent payloads
//!
//! Signer and verifier must turn the same structured payload into the same
//! bytes. The canonical form is compact JSON with object keys sorted
//! byte-wise and numbers printed the way an ECMAScript `JSON.stringify`
//! prints them, so payloads signed by JS/Android clients verify here.
//!
//! Two policies exist:
//! - `Deep` (default): keys are sorted in every object at every depth.
//! - `Shallow`: only the top-level keys are sorted; nested objects keep the
//!   key order they were received in. This mirrors clients that build a
//!   sorted copy of the top-level map only.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::str::FromStr;
use thiserror::Error;

/// How far key sorting descends into the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalizationPolicy {
    /// Sort keys of every nested object
    #[default]
    Deep,
    /// Sort top-level keys only
    Shallow,
}

impl CanonicalizationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalizationPolicy::Deep => "deep",
            CanonicalizationPolicy::Shallow => "shallow",
        }
    }
}

/// Error returned when parsing an unknown policy name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown canonicalization policy '{0}' (expected 'deep' or 'shallow')")]
pub struct ParsePolicyError(pub String);

impl FromStr for CanonicalizationPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deep" => Ok(CanonicalizationPolicy::Deep),
            "shallow" => Ok(CanonicalizationPolicy::Shallow),
            other => Err(ParsePolicyError(other.to_string())),
        }
    }
}

impl std::fmt::Display for CanonicalizationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonicalizer bound to a fixed policy
#[derive(Debug, Clone, Copy, Default)]
pub struct Canonicalizer {
    policy: CanonicalizationPolicy,
}

impl Canonicalizer {
    pub fn new(policy: CanonicalizationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CanonicalizationPolicy {
        self.policy
    }

    /// Canonical bytes of `payload` under this canonicalizer's policy
    pub fn canonicalize(&self, payload: &Value) -> Vec<u8> {
        canonicalize_with(payload, self.policy)
    }
}

/// Canonicalize with the default (deep) policy
pub fn canonicalize(payload: &Value) -> Vec<u8> {
    canonicalize_with(payload, CanonicalizationPolicy::Deep)
}

/// Canonicalize with an explicit policy
///
/// Output is UTF-8 and feeds the signature primitive unchanged.
pub fn canonicalize_with(payload: &Value, policy: CanonicalizationPolicy) -> Vec<u8> {
    let mut out = String::new();
    match (policy, payload) {
        (CanonicalizationPolicy::Deep, value) => write_value(&mut out, value, true),
        (CanonicalizationPolicy::Shallow, Value::Object(map)) => {
            write_object(&mut out, map, true, false)
        }
        (CanonicalizationPolicy::Shallow, value) => write_value(&mut out, value, false),
    }
    out.into_bytes()
}

fn write_value(out: &mut String, value: &Value, deep: bool) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item, deep);
            }
            out.push(']');
        }
        Value::Object(map) => write_object(out, map, deep, deep),
    }
}

/// `sort` applies to this object, `deep` to the values below it
fn write_object(out: &mut String, map: &Map<String, Value>, sort: bool, deep: bool) {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    if sort {
        // String ordering is byte-wise over UTF-8
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
    }

    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push(':');
        write_value(out, value, deep);
    }
    out.push('}');
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_number(out: &mut String, n: &Number) {
    if let Some(u) = n.as_u64() {
        out.push_str(&u.to_string());
    } else if let Some(i) = n.as_i64() {
        out.push_str(&i.to_string());
    } else if let Some(f) = n.as_f64() {
        out.push_str(&format_f64(f));
    } else {
        out.push_str(&n.to_string());
    }
}

/// ECMAScript `Number::toString` for a finite double
pub(crate) fn format_f64(value: f64) -> String {
    if !value.is_finite() {
        // JSON.stringify maps NaN and the infinities to null
        return "null".into();
    }
    if value == 0.0 {
        // covers -0
        return "0".into();
    }
    shortest_digits(value.abs())
        .map(|(digits, n)| {
            let mut out = String::new();
            if value < 0.0 {
                out.push('-');
            }
            layout_digits(&mut out, &digits, n);
            out
        })
        .unwrap_or_else(|| value.to_string())
}

/// Shortest round-trip decimal digits and the position of the decimal point
/// (value = 0.digits * 10^n).
fn shortest_digits(value: f64) -> Option<(String, i32)> {
    let sci = format!("{:e}", value);
    let (mantissa, exponent) = sci.split_once('e')?;
    let exponent: i32 = exponent.parse().ok()?;
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    Some((digits, exponent + 1))
}

fn layout_digits(out: &mut String, digits: &str, n: i32) {
    let k = digits.len() as i32;

    if k <= n && n <= 21 {
        out.push_str(digits);
        out.extend(std::iter::repeat('0').take((n - k) as usize));
    } else if 0 < n && n <= 21 {
        let (int_part, frac_part) = digits.split_at(n as usize);
        out.push_str(int_part);
        out.push('.');
        out.push_str(frac_part);
    } else if -6 < n && n <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat('0').take((-n) as usize));
        out.push_str(digits);
    } else {
        let e = n - 1;
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        out.push('e');
        out.push(if e >= 0 { '+' } else { '-' });
        out.push_str(&e.abs().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canon(value: &Value) -> String {
        String::from_utf8(canonicalize(value)).unwrap()
    }

    #[test]
    fn test_flat_keys_sorted() {
        let payload = json!({ "ts": 1700000000, "action": "unlock" });
        assert_eq!(canon(&payload), r#"{"action":"unlock","ts":1700000000}"#);
    }

    #[test]
    fn test_deep_sorts_nested_objects() {
        let payload = json!({
            "z": { "b": 1, "a": [ { "y": true, "x": null } ] },
            "a": "first"
        });
        assert_eq!(
            canon(&payload),
            r#"{"a":"first","z":{"a":[{"x":null,"y":true}],"b":1}}"#
        );
    }

    #[test]
    fn test_shallow_keeps_nested_order() {
        let payload = json!({
            "z": { "b": 1, "a": 2 },
            "a": "first"
        });
        let bytes = canonicalize_with(&payload, CanonicalizationPolicy::Shallow);
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"a":"first","z":{"b":1,"a":2}}"#
        );
    }

    #[test]
    fn test_policies_agree_on_flat_payloads() {
        let payload = json!({ "b": [3, 2, 1], "a": false, "c": "x" });
        assert_eq!(
            canonicalize_with(&payload, CanonicalizationPolicy::Deep),
            canonicalize_with(&payload, CanonicalizationPolicy::Shallow)
        );
    }

    #[test]
    fn test_array_order_preserved() {
        assert_eq!(canon(&json!([3, 1, 2])), "[3,1,2]");
    }

    #[test]
    fn test_keys_sorted_bytewise() {
        let payload = json!({ "b": 1, "B": 2, "é": 3, "a": 4, "_": 5 });
        assert_eq!(canon(&payload), r#"{"B":2,"_":5,"a":4,"b":1,"é":3}"#);
    }

    #[test]
    fn test_number_forms() {
        let cases: &[(f64, &str)] = &[
            (1.0, "1"),
            (0.1, "0.1"),
            (-2.5, "-2.5"),
            (123.456, "123.456"),
            (1e20, "100000000000000000000"),
            (1e21, "1e+21"),
            (1.5e22, "1.5e+22"),
            (0.000001, "0.000001"),
            (1e-7, "1e-7"),
            (1.5e-7, "1.5e-7"),
            (-0.0, "0"),
            (5e-324, "5e-324"),
            (1.7976931348623157e308, "1.7976931348623157e+308"),
            (9007199254740992.0, "9007199254740992"),
        ];
        for (value, expected) in cases {
            assert_eq!(format_f64(*value), *expected, "formatting {:?}", value);
        }
    }

    #[test]
    fn test_integers_exact() {
        assert_eq!(canon(&json!(u64::MAX)), "18446744073709551615");
        assert_eq!(canon(&json!(-42)), "-42");
    }

    #[test]
    fn test_string_escaping() {
        let payload = json!("\u{1}\n\"\\/é \u{8}\u{c}\r\t\u{1f}");
        assert_eq!(canon(&payload), r#""\u0001\n\"\\/é \b\f\r\t\u001f""#);
    }

    #[test]
    fn test_no_whitespace() {
        let payload: Value =
            serde_json::from_str("{ \"k\" : [ 1 , { \"n\" : null } ] , \"b\" : true }").unwrap();
        assert_eq!(canon(&payload), r#"{"b":true,"k":[1,{"n":null}]}"#);
    }

    #[test]
    fn test_integers_beyond_f64_precision_stay_exact() {
        // JSON.stringify would print 9007199254740992 for the first value;
        // integers that fit u64/i64 keep every digit here.
        for wire in [
            "9007199254740993",
            "-9007199254740993",
            "18446744073709551615",
            "-9223372036854775808",
        ] {
            let value: Value = serde_json::from_str(wire).unwrap();
            assert_eq!(canon(&value), wire);
        }
        assert_eq!(
            canon(&json!({ "id": 9007199254740993u64 })),
            r#"{"id":9007199254740993}"#
        );
    }

    #[test]
    fn test_scalars_at_top_level() {
        assert_eq!(canon(&Value::Null), "null");
        assert_eq!(canon(&json!(true)), "true");
        assert_eq!(canon(&json!("s")), "\"s\"");
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("deep".parse::<CanonicalizationPolicy>(), Ok(CanonicalizationPolicy::Deep));
        assert_eq!(
            " Shallow ".parse::<CanonicalizationPolicy>(),
            Ok(CanonicalizationPolicy::Shallow)
        );
        assert!("sorted".parse::<CanonicalizationPolicy>().is_err());
    }

    #[test]
    fn test_canonicalizer_uses_policy() {
        let payload = json!({ "n": { "b": 1, "a": 2 } });
        let shallow = Canonicalizer::new(CanonicalizationPolicy::Shallow);
        assert_eq!(shallow.policy(), CanonicalizationPolicy::Shallow);
        assert_eq!(shallow.canonicalize(&payload), br#"{"n":{"b":1,"a":2}}"#.to_vec());
        assert_eq!(
            Canonicalizer::default().canonicalize(&payload),
            br#"{"n":{"a":2,"b":1}}"#.to_vec()
        );
    }
}
