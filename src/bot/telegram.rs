//! Minimal Telegram Bot API client: long polling, text, photos, callback
//! acknowledgements.

use std::time::Duration;

use reqwest::blocking::multipart;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, Result};

/// Seconds the server may hold a `getUpdates` request open.
pub const LONG_POLL_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct TgResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

pub struct TelegramApi {
    client: reqwest::blocking::Client,
    base: String,
}

impl TelegramApi {
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(LONG_POLL_SECS + 10))
            .build()?;
        Ok(Self {
            client,
            base: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T> {
        let response: TgResponse<T> = self
            .client
            .post(format!("{}/{}", self.base, method))
            .json(body)
            .send()?
            .json()?;
        into_result(method, response)
    }

    /// Updates after `offset`, waiting up to `timeout_secs` for one to arrive.
    pub fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
    }

    /// Send text, optionally with one button per row.
    pub fn send_message(&self, chat_id: i64, text: &str, buttons: &[InlineButton]) -> Result<()> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if !buttons.is_empty() {
            let rows: Vec<Vec<&InlineButton>> = buttons.iter().map(|b| vec![b]).collect();
            body["reply_markup"] = json!({ "inline_keyboard": rows });
        }
        self.call::<Value>("sendMessage", &body).map(|_| ())
    }

    pub fn send_photo(&self, chat_id: i64, photo: Vec<u8>, caption: &str) -> Result<()> {
        let part = multipart::Part::bytes(photo).file_name("photo.jpg");
        let form = multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("photo", part);
        let response: TgResponse<Value> = self
            .client
            .post(format!("{}/sendPhoto", self.base))
            .multipart(form)
            .send()?
            .json()?;
        into_result("sendPhoto", response).map(|_: Value| ())
    }

    pub fn answer_callback_query(&self, callback_id: &str) -> Result<()> {
        self.call::<Value>(
            "answerCallbackQuery",
            &json!({ "callback_query_id": callback_id }),
        )
        .map(|_| ())
    }
}

fn into_result<T>(method: &str, response: TgResponse<T>) -> Result<T> {
    match (response.ok, response.result) {
        (true, Some(result)) => Ok(result),
        _ => Err(Error::Telegram(format!(
            "{method}: {}",
            response.description.as_deref().unwrap_or("no result")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_updates() {
        let raw = r#"{"ok": true, "result": [
            {"update_id": 10, "message": {"message_id": 1, "chat": {"id": 77, "type": "private"},
             "from": {"id": 5, "is_bot": false, "first_name": "Иван"}, "date": 0, "text": "/start"}},
            {"update_id": 11, "callback_query": {"id": "cb1", "from": {"id": 5, "first_name": "Иван"},
             "message": {"message_id": 2, "chat": {"id": 77}}, "data": "catalog"}},
            {"update_id": 12, "edited_message": {}}
        ]}"#;
        let response: TgResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        let updates = into_result("getUpdates", response).unwrap();
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0].message.as_ref().unwrap().text.as_deref(), Some("/start"));
        let cb = updates[1].callback_query.as_ref().unwrap();
        assert_eq!(cb.data.as_deref(), Some("catalog"));
        assert_eq!(cb.message.as_ref().unwrap().chat.id, 77);
        assert!(updates[2].message.is_none() && updates[2].callback_query.is_none());
    }

    #[test]
    fn test_error_response() {
        let raw = r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#;
        let response: TgResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        let err = into_result("getUpdates", response).unwrap_err();
        assert_eq!(err.to_string(), "Telegram API error: getUpdates: Unauthorized");
    }

    #[test]
    fn test_token_in_base_url() {
        let api = TelegramApi::new("https://api.telegram.org/", "123:abc").unwrap();
        assert_eq!(api.base, "https://api.telegram.org/bot123:abc");
    }
}
