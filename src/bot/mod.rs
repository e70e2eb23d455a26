//! Telegram bot over the profile catalog.
//!
//! CHANGELOG:
//! - 12/11/2025 - Photo replies fall back to text when the download fails
//! - 09/11/2025 - Initial long-polling bot

pub mod client;
pub mod conversation;
pub mod telegram;

use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

pub use client::HttpCatalogClient;
pub use conversation::{CatalogLookup, Conversation, Reply, MENU_BUTTONS};
pub use telegram::{InlineButton, TelegramApi, Update, LONG_POLL_SECS};

const RETRY_DELAY: Duration = Duration::from_secs(5);

fn menu_buttons() -> Vec<InlineButton> {
    MENU_BUTTONS
        .iter()
        .map(|(text, data)| InlineButton {
            text: (*text).to_string(),
            callback_data: (*data).to_string(),
        })
        .collect()
}

pub struct Bot {
    api: TelegramApi,
    catalog: HttpCatalogClient,
    conversation: Conversation,
}

impl Bot {
    pub fn new(api: TelegramApi, catalog: HttpCatalogClient, password: &str) -> Self {
        Self {
            api,
            catalog,
            conversation: Conversation::new(password),
        }
    }

    /// Long-poll for updates forever.
    pub fn run(&mut self) {
        info!("bot polling started");
        let mut offset = 0;
        loop {
            let updates = match self.api.get_updates(offset, LONG_POLL_SECS) {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "getUpdates failed");
                    thread::sleep(RETRY_DELAY);
                    continue;
                }
            };
            for update in updates {
                offset = offset.max(update.update_id + 1);
                self.handle(update);
            }
        }
    }

    fn handle(&mut self, update: Update) {
        if let Some(cb) = update.callback_query {
            if let Err(e) = self.api.answer_callback_query(&cb.id) {
                debug!(error = %e, "callback ack failed");
            }
            let (Some(data), Some(message)) = (cb.data, cb.message) else {
                return;
            };
            let replies =
                self.conversation
                    .on_callback(cb.from.id, &cb.from.first_name, &data, &self.catalog);
            self.deliver(message.chat.id, replies);
            return;
        }

        let Some(message) = update.message else {
            return;
        };
        let (Some(text), Some(from)) = (message.text, message.from) else {
            return;
        };
        let replies = self
            .conversation
            .on_text(from.id, &from.first_name, &text, &self.catalog);
        self.deliver(message.chat.id, replies);
    }

    fn deliver(&self, chat_id: i64, replies: Vec<Reply>) {
        for reply in replies {
            let sent = match reply {
                Reply::Text(text) => self.api.send_message(chat_id, &text, &[]),
                Reply::Menu(text) => self.api.send_message(chat_id, &text, &menu_buttons()),
                Reply::Photo { url, caption } => {
                    let photo = self
                        .catalog
                        .fetch_photo(&url)
                        .and_then(|bytes| self.api.send_photo(chat_id, bytes, &caption));
                    match photo {
                        Ok(()) => Ok(()),
                        Err(e) => {
                            warn!(url = %url, error = %e, "photo not sent, replying with text");
                            self.api.send_message(chat_id, &caption, &[])
                        }
                    }
                }
            };
            if let Err(e) = sent {
                warn!(chat = chat_id, error = %e, "reply not delivered");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_buttons() {
        let buttons = menu_buttons();
        assert_eq!(buttons.len(), 3);
        assert_eq!(buttons[0].callback_data, "catalog");
    }
}
