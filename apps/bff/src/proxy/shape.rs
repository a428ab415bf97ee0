//! 上流レスポンスボディの整形
//!
//! フロントエンドは常に `success` フィールドを見て成否を判定する。
//! 上流が付けていない場合はここで補う。
//!
//! 上流のユーザー・生徒オブジェクトにはパスワードハッシュやリフレッシュトークンが
//! 含まれることがある。2xx のボディからは [`SENSITIVE_FIELDS`] を階層を問わず取り除く。

use serde_json::{Map, Value};

/// 上流がメッセージを返さなかった場合のエラーメッセージ
pub const DEFAULT_ERROR_MESSAGE: &str = "バックエンドでエラーが発生しました";

/// ブラウザに返さないフィールド
pub const SENSITIVE_FIELDS: &[&str] = &["password", "refreshToken", "otp", "internalNotes"];

/// 2xx のボディを整形する
///
/// 秘匿フィールドを取り除いたうえで、オブジェクトなら `success: true` を補う
/// （上流の値が優先）。それ以外は `{ "success": true, "data": ... }` に包む。
pub fn success(mut body: Value) -> Value {
    redact_sensitive(&mut body);
    match body {
        Value::Object(mut map) => {
            map.entry("success").or_insert(Value::Bool(true));
            Value::Object(map)
        }
        other => {
            let mut map = Map::new();
            map.insert("success".to_string(), Value::Bool(true));
            map.insert("data".to_string(), other);
            Value::Object(map)
        }
    }
}

/// 2xx 以外のボディを整形する
///
/// `success` は常に `false`。`message` は上流の値があればそれを使う。
pub fn failure(body: Value) -> Value {
    match body {
        Value::Object(mut map) => {
            let message = map
                .get("message")
                .and_then(non_empty_str)
                .or_else(|| map.get("error").and_then(non_empty_str))
                .unwrap_or(DEFAULT_ERROR_MESSAGE)
                .to_string();
            map.insert("success".to_string(), Value::Bool(false));
            map.insert("message".to_string(), Value::String(message));
            Value::Object(map)
        }
        other => {
            let message = non_empty_str(&other).unwrap_or(DEFAULT_ERROR_MESSAGE).to_string();
            let mut map = Map::new();
            map.insert("success".to_string(), Value::Bool(false));
            map.insert("message".to_string(), Value::String(message));
            Value::Object(map)
        }
    }
}

/// 秘匿フィールドを再帰的に削除する
fn redact_sensitive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for field in SENSITIVE_FIELDS {
                map.remove(*field);
            }
            map.values_mut().for_each(redact_sensitive);
        }
        Value::Array(items) => items.iter_mut().for_each(redact_sensitive),
        _ => {}
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(json!({"students": []}), json!({"students": [], "success": true}))]
    #[case(json!({"success": false, "data": 1}), json!({"success": false, "data": 1}))]
    #[case(json!([1, 2]), json!({"success": true, "data": [1, 2]}))]
    #[case(Value::Null, json!({"success": true, "data": null}))]
    fn test_success(#[case] body: Value, #[case] expected: Value) {
        assert_eq!(success(body), expected);
    }

    #[test]
    fn test_successは秘匿フィールドを階層を問わず取り除く() {
        let body = json!({
            "users": [
                {"id": "u1", "name": "Asha", "password": "hash", "refreshToken": "rt"},
                {"id": "u2", "profile": {"otp": "123456", "phone": "999"}}
            ],
            "student": {"id": "s1", "internalNotes": "memo"},
            "total": 2
        });

        assert_eq!(
            success(body),
            json!({
                "users": [
                    {"id": "u1", "name": "Asha"},
                    {"id": "u2", "profile": {"phone": "999"}}
                ],
                "student": {"id": "s1"},
                "total": 2,
                "success": true
            })
        );
    }

    #[test]
    fn test_successは配列ボディからも秘匿フィールドを取り除く() {
        let body = json!([{"id": "s1", "password": "x"}]);
        assert_eq!(success(body), json!({"success": true, "data": [{"id": "s1"}]}));
    }

    #[rstest]
    #[case(
        json!({"message": "Not found", "code": "E404"}),
        json!({"message": "Not found", "code": "E404", "success": false})
    )]
    #[case(
        json!({"error": "Forbidden"}),
        json!({"error": "Forbidden", "message": "Forbidden", "success": false})
    )]
    #[case(
        json!({"success": true}),
        json!({"success": false, "message": DEFAULT_ERROR_MESSAGE})
    )]
    #[case(json!("boom"), json!({"success": false, "message": "boom"}))]
    #[case(Value::Null, json!({"success": false, "message": DEFAULT_ERROR_MESSAGE}))]
    fn test_failure(#[case] body: Value, #[case] expected: Value) {
        assert_eq!(failure(body), expected);
    }
}
