//! Deep key renaming for JSON payloads.
//!
//! The backend speaks snake_case, the feed works in camelCase. Every object
//! key at every depth is rewritten; values are never touched. When two source
//! keys of one object map to the same target key, the one that comes later in
//! document order wins, exactly like a map insert overwriting an earlier entry.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStyle {
    Camel,
    Snake,
}

impl CaseStyle {
    pub fn convert(self, key: &str) -> String {
        match self {
            CaseStyle::Camel => camel_case(key),
            CaseStyle::Snake => snake_case(key),
        }
    }
}

pub fn to_camel_case(value: Value) -> Value {
    convert_keys(value, CaseStyle::Camel)
}

pub fn to_snake_case(value: Value) -> Value {
    convert_keys(value, CaseStyle::Snake)
}

/// Rewrites every object key of `value` into `style`, preserving array order.
pub fn convert_keys(value: Value, style: CaseStyle) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| convert_keys(item, style))
                .collect(),
        ),
        Value::Object(entries) => {
            let mut renamed = Map::with_capacity(entries.len());
            for (key, nested) in entries {
                // last key wins on collision
                renamed.insert(style.convert(&key), convert_keys(nested, style));
            }
            Value::Object(renamed)
        }
        scalar => scalar,
    }
}

/// Splits an identifier into words on separators and case boundaries:
/// `imageURL_v2` -> `image`, `URL`, `v2`; `XMLHttp` -> `XML`, `Http`.
fn split_words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_numeric()
                || (prev.is_uppercase() && next_is_lower);
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn camel_case(input: &str) -> String {
    // Already camelCase keys are left alone, which keeps the conversion
    // idempotent for runs of single-letter words like `aBC`.
    let mut chars = input.chars();
    let is_camel = chars.next().map_or(true, |c| c.is_alphanumeric() && !c.is_uppercase())
        && chars.all(char::is_alphanumeric);
    if is_camel {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    for (index, word) in split_words(input).iter().enumerate() {
        if index == 0 {
            out.push_str(&word.to_lowercase());
            continue;
        }
        let mut letters = word.chars();
        if let Some(first) = letters.next() {
            out.extend(first.to_uppercase());
            out.push_str(&letters.as_str().to_lowercase());
        }
    }
    // case mapping may emit combining marks, e.g. `İ` -> `i\u{307}`
    out.retain(char::is_alphanumeric);
    out
}

fn snake_case(input: &str) -> String {
    split_words(input)
        .iter()
        .map(|word| {
            word.to_lowercase()
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys_are_camel(value: &Value) -> bool {
        match value {
            Value::Array(items) => items.iter().all(keys_are_camel),
            Value::Object(map) => map
                .iter()
                .all(|(k, v)| !k.contains('_') && keys_are_camel(v)),
            _ => true,
        }
    }

    #[test]
    fn converts_single_keys() {
        assert_eq!(camel_case("job_type"), "jobType");
        assert_eq!(camel_case("is_active"), "isActive");
        assert_eq!(camel_case("image_url"), "imageUrl");
        assert_eq!(camel_case("page-size"), "pageSize");
        assert_eq!(camel_case("XMLHttpRequest"), "xmlHttpRequest");
        assert_eq!(camel_case("__private_key"), "privateKey");
        assert_eq!(camel_case("version_2"), "version2");
        assert_eq!(camel_case("id"), "id");
        assert_eq!(camel_case(""), "");
        assert_eq!(camel_case("\u{130}_x"), "iX");

        assert_eq!(snake_case("jobType"), "job_type");
        assert_eq!(snake_case("imageURL"), "image_url");
        assert_eq!(snake_case("XMLHttpRequest"), "xml_http_request");
        assert_eq!(snake_case("already_snake"), "already_snake");
        assert_eq!(snake_case("page2Size"), "page2_size");
        assert_eq!(snake_case("\u{130}stanbulOffice"), "istanbul_office");
    }

    #[test]
    fn converts_nested_vacancy_payload() {
        let raw = json!({"job_type": "full_time", "images": [{"image_url": "x"}]});
        assert_eq!(
            to_camel_case(raw),
            json!({"jobType": "full_time", "images": [{"imageUrl": "x"}]})
        );
    }

    #[test]
    fn values_are_never_renamed() {
        let raw = json!({"job_type": "full_time", "tags": ["snake_value", {"tag_name": "some_slug"}]});
        assert_eq!(
            to_camel_case(raw),
            json!({"jobType": "full_time", "tags": ["snake_value", {"tagName": "some_slug"}]})
        );
    }

    #[test]
    fn every_depth_is_normalized() {
        let raw = json!({
            "count": 1,
            "next": null,
            "results": [{
                "outer_key": {"inner_list": [[{"deep_key": {"deepest_key": true}}]]},
                "company_info": {"website_url": "https://example.com"}
            }]
        });
        let converted = to_camel_case(raw);
        assert!(keys_are_camel(&converted));
        assert_eq!(
            converted["results"][0]["outerKey"]["innerList"][0][0]["deepKey"]["deepestKey"],
            json!(true)
        );
    }

    #[test]
    fn camel_conversion_is_idempotent() {
        let samples = [
            json!({"a_b_c": 1, "image_URL": [{"x_y": null}], "HTTPStatus": "ok"}),
            json!([{"job_type": "contract"}, 3, "text", {"is_active": false}]),
            json!({"already": {"camelCase": {"aBC": 1}}}),
            json!({"\u{130}_x": 1, "ǰob_type": {"\u{130}STANBUL_office": true}}),
            json!("scalar"),
        ];
        for sample in samples {
            let once = to_camel_case(sample);
            let twice = to_camel_case(once.clone());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn array_order_and_length_are_preserved() {
        let raw = json!([{"item_id": 3}, {"item_id": 1}, null, {"item_id": 2}]);
        let converted = to_camel_case(raw);
        assert_eq!(
            converted,
            json!([{"itemId": 3}, {"itemId": 1}, null, {"itemId": 2}])
        );
    }

    #[test]
    fn colliding_keys_keep_the_later_entry() {
        let raw: Value = serde_json::from_str(r#"{"job_type": "first", "jobType": "second"}"#).unwrap();
        assert_eq!(to_camel_case(raw), json!({"jobType": "second"}));

        let raw: Value = serde_json::from_str(r#"{"jobType": "first", "job_type": "second"}"#).unwrap();
        assert_eq!(to_camel_case(raw), json!({"jobType": "second"}));
    }

    #[test]
    fn snake_direction_renames_outgoing_payloads() {
        let body = json!({"jobId": 7, "coverLetter": {"plainText": "hi"}});
        assert_eq!(
            to_snake_case(body),
            json!({"job_id": 7, "cover_letter": {"plain_text": "hi"}})
        );
    }
}
