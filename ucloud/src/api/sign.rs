//! Request parameter encoding and signing.
//!
//! UCloud takes flat form parameters: list elements become `Key.N` and nested
//! fields `Key.N.Field`. The signature is the hex SHA-1 of every
//! `key + value` pair in ascending key order followed by the private key.

use serde_json::Value;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;

pub(crate) const SIGNATURE_PARAM: &str = "Signature";

pub(crate) fn flatten_params(value: &Value) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    flatten_into("", value, &mut params);
    params
}

fn flatten_into(prefix: &str, value: &Value, params: &mut BTreeMap<String, String>) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => {
            params.insert(prefix.to_string(), flag.to_string());
        }
        Value::Number(number) => {
            params.insert(prefix.to_string(), number.to_string());
        }
        Value::String(text) => {
            params.insert(prefix.to_string(), text.clone());
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(&format!("{prefix}.{index}"), item, params);
            }
        }
        Value::Object(fields) => {
            for (key, field) in fields {
                if prefix.is_empty() {
                    flatten_into(key, field, params);
                } else {
                    flatten_into(&format!("{prefix}.{key}"), field, params);
                }
            }
        }
    }
}

pub(crate) fn sign(params: &BTreeMap<String, String>, private_key: &str) -> String {
    let mut hasher = Sha1::new();
    for (key, value) in params {
        if key == SIGNATURE_PARAM {
            continue;
        }
        hasher.update(key.as_bytes());
        hasher.update(value.as_bytes());
    }
    hasher.update(private_key.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_lists_and_objects_are_flattened() {
        let params = flatten_params(&json!({
            "DomainList": [{
                "DomainId": "ucdn-1",
                "OriginConf": { "OriginIp": ["1.1.1.1", "2.2.2.2"], "OriginFollow301": 0 },
                "AdvancedConf": { "Http2Https": true }
            }],
            "Tag": null
        }));

        assert_eq!(params.get("DomainList.0.DomainId").map(String::as_str), Some("ucdn-1"));
        assert_eq!(
            params.get("DomainList.0.OriginConf.OriginIp.1").map(String::as_str),
            Some("2.2.2.2")
        );
        assert_eq!(
            params.get("DomainList.0.OriginConf.OriginFollow301").map(String::as_str),
            Some("0")
        );
        assert_eq!(
            params.get("DomainList.0.AdvancedConf.Http2Https").map(String::as_str),
            Some("true")
        );
        assert!(!params.contains_key("Tag"));
    }

    #[test]
    fn signature_covers_sorted_pairs_and_private_key() {
        let mut params = BTreeMap::new();
        params.insert("Limit".to_string(), "10".to_string());
        params.insert("Action".to_string(), "GetCertificateV2".to_string());
        params.insert("Offset".to_string(), "0".to_string());

        let mut expected = Sha1::new();
        expected.update(b"ActionGetCertificateV2Limit10Offset0secret");
        let expected = hex::encode(expected.finalize());

        assert_eq!(sign(&params, "secret"), expected);
    }

    #[test]
    fn signature_ignores_existing_signature_param() {
        let mut params = BTreeMap::new();
        params.insert("Action".to_string(), "DeleteCertificate".to_string());
        let unsigned = sign(&params, "secret");

        params.insert(SIGNATURE_PARAM.to_string(), unsigned.clone());
        assert_eq!(sign(&params, "secret"), unsigned);
        assert_eq!(unsigned.len(), 40);
    }
}
