use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

fn secret_key(bot_token: &str) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice("WebAppData".as_bytes()).ok()?;
    mac.update(bot_token.as_bytes());
    Some(mac.finalize().into_bytes().to_vec())
}

fn data_check_hash(pairs: &[(String, String)], bot_token: &str) -> Option<String> {
    let mut sorted: Vec<&(String, String)> = pairs.iter().filter(|(k, _)| k != "hash").collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let data_check_string = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n");

    let mut mac = HmacSha256::new_from_slice(&secret_key(bot_token)?).ok()?;
    mac.update(data_check_string.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

fn decode_pairs(init_data: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(init_data.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Builds a launch-parameter query string signed the way the Telegram client
/// signs WebApp init data. Used to fake a host environment during development.
pub fn sign_init_data(fields: &[(&str, String)], bot_token: &str) -> Option<String> {
    let pairs: Vec<(String, String)> = fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    let hash = data_check_hash(&pairs, bot_token)?;

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in &pairs {
        serializer.append_pair(k, v);
    }
    serializer.append_pair("hash", &hash);
    Some(serializer.finish())
}

/// Checks the `hash` of raw init data against `bot_token` and returns the user id.
pub fn verify_init_data(init_data: &str, bot_token: &str) -> Option<i64> {
    let pairs = decode_pairs(init_data);
    let hash = pairs.iter().find(|(k, _)| k == "hash").map(|(_, v)| v.to_ascii_lowercase())?;

    let calculated = data_check_hash(&pairs, bot_token)?;
    if !bool::from(calculated.as_bytes().ct_eq(hash.as_bytes())) {
        return None;
    }

    user_id(init_data)
}

/// Reads the `user.id` field of init data without checking the signature.
pub fn user_id(init_data: &str) -> Option<i64> {
    let pairs = decode_pairs(init_data);
    let user_encoded = pairs.iter().find(|(k, _)| k == "user").map(|(_, v)| v)?;
    let user: serde_json::Value = serde_json::from_str(user_encoded).ok()?;
    user.get("id")?.as_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<(&'static str, String)> {
        vec![
            ("query_id", "AAHdF6IQAAAAAN0XohDhrOrc".to_string()),
            ("user", r#"{"id":279058397,"first_name":"Vladislav","username":"vdkfrost"}"#.to_string()),
            ("auth_date", "1662771648".to_string()),
        ]
    }

    #[test]
    fn signed_data_verifies_with_same_token() {
        let raw = sign_init_data(&fields(), "123:bot-token").unwrap();
        assert_eq!(verify_init_data(&raw, "123:bot-token"), Some(279058397));
    }

    #[test]
    fn signed_data_fails_with_other_token() {
        let raw = sign_init_data(&fields(), "123:bot-token").unwrap();
        assert_eq!(verify_init_data(&raw, "456:other-token"), None);
    }

    #[test]
    fn tampered_data_fails() {
        let raw = sign_init_data(&fields(), "123:bot-token").unwrap();
        let tampered = raw.replace("1662771648", "1662771649");
        assert_eq!(verify_init_data(&tampered, "123:bot-token"), None);
    }

    #[test]
    fn missing_hash_fails() {
        assert_eq!(verify_init_data("auth_date=1&user=%7B%22id%22%3A1%7D", "t"), None);
    }
}
