//! What the bot answers, independent of how messages travel.
//!
//! Users unlock the bot by sending the password once; the authorization
//! lives in memory and is lost on restart.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::db::CatalogProfile;
use crate::engine::SearchHit;
use crate::error::Result;

/// Profiles shown by `/catalog` before "and N more".
pub const CATALOG_PREVIEW: usize = 20;
/// Profiles requested for `/catalog`.
pub const CATALOG_FETCH: usize = 100;

/// Menu buttons as (label, callback data).
pub const MENU_BUTTONS: &[(&str, &str)] = &[
    ("📚 Справочник", "catalog"),
    ("🔍 Поиск профиля", "search"),
    ("ℹ️ О системе", "about"),
];

const ABOUT_TEXT: &str = "ℹ️ О СИСТЕМЕ\n\n\
Это справочник профилей Ekranchik.\n\n\
Команды:\n\
/start - главное меню\n\
/catalog - все профили\n\
/search - поиск по названию\n\
/about - информация";

const SEARCH_PROMPT: &str =
    "Введи название или часть названия профиля:\n(например: ЮП-1625 или CP-100)";

/// Catalog access the bot needs.
pub trait CatalogLookup {
    /// First `limit` profiles, most recently updated first.
    fn list(&self, limit: usize) -> Result<Vec<CatalogProfile>>;
    /// Fuzzy name search, best first.
    fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

/// One outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// Text with the main menu keyboard.
    Menu(String),
    /// Photo at a server URL path, with a caption. Sent as text when the
    /// photo cannot be delivered.
    Photo { url: String, caption: String },
}

pub struct Conversation {
    password: String,
    authorized: HashSet<i64>,
}

impl Conversation {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            authorized: HashSet::new(),
        }
    }

    pub fn is_authorized(&self, user_id: i64) -> bool {
        self.authorized.contains(&user_id)
    }

    /// Reply to a text message.
    pub fn on_text(
        &mut self,
        user_id: i64,
        first_name: &str,
        text: &str,
        lookup: &dyn CatalogLookup,
    ) -> Vec<Reply> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        if let Some(command) = text.strip_prefix('/') {
            // "/start@SomeBot args" → "start"
            let command = command
                .split(|c: char| c == '@' || c.is_whitespace())
                .next()
                .unwrap_or_default();
            return self.on_command(user_id, first_name, command, lookup);
        }

        if !self.is_authorized(user_id) {
            if text == self.password {
                self.authorized.insert(user_id);
                info!(user = user_id, "user authorized");
                return vec![Reply::Text(format!(
                    "Доступ разрешен!\n\nПривет, {first_name}! Отправь /start для начала работы."
                ))];
            }
            warn!(user = user_id, "wrong bot password");
            return vec![Reply::Text("Неверный пароль. Попробуйте еще раз:".into())];
        }

        info!(user = user_id, query = %text, "catalog search");
        search_reply(text, lookup)
    }

    /// Reply to a menu button press.
    pub fn on_callback(
        &mut self,
        user_id: i64,
        first_name: &str,
        data: &str,
        lookup: &dyn CatalogLookup,
    ) -> Vec<Reply> {
        self.on_command(user_id, first_name, data, lookup)
    }

    fn on_command(
        &mut self,
        user_id: i64,
        first_name: &str,
        command: &str,
        lookup: &dyn CatalogLookup,
    ) -> Vec<Reply> {
        if !self.is_authorized(user_id) {
            return vec![Reply::Text(format!(
                "Привет, {first_name}!\n\nДля доступа к боту введите пароль:"
            ))];
        }
        match command {
            "start" => vec![Reply::Menu(
                "Привет! Я помощник справочника профилей Ekranchik.\n\nВыбери действие:".into(),
            )],
            "catalog" => vec![catalog_reply(lookup)],
            "search" => vec![Reply::Text(SEARCH_PROMPT.into())],
            "about" => vec![Reply::Text(ABOUT_TEXT.into())],
            _ => vec![Reply::Text("Неизвестная команда. /about - список команд".into())],
        }
    }
}

fn dash_or<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

/// Caption for a single profile.
pub fn profile_caption(p: &CatalogProfile) -> String {
    let notes = p
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("нет");
    format!(
        "{}\nКол-во: {}\nДлина: {} мм\nПримечания: {}",
        p.name,
        dash_or(p.quantity_per_hanger),
        dash_or(p.length),
        notes
    )
}

fn catalog_reply(lookup: &dyn CatalogLookup) -> Reply {
    let profiles = match lookup.list(CATALOG_FETCH) {
        Ok(profiles) => profiles,
        Err(e) => {
            warn!(error = %e, "catalog request failed");
            return Reply::Text("❌ Ошибка загрузки справочника".into());
        }
    };
    if profiles.is_empty() {
        return Reply::Text("📭 Справочник пуст".into());
    }

    let mut text = String::from("📚 СПРАВОЧНИК ПРОФИЛЕЙ\n\n");
    for p in profiles.iter().take(CATALOG_PREVIEW) {
        let marker = if p.photo_thumb.is_some() || p.photo_full.is_some() {
            "📷"
        } else {
            "❌"
        };
        text.push_str(&format!("{marker} {}\n", p.name));
    }
    if profiles.len() > CATALOG_PREVIEW {
        text.push_str(&format!(
            "\n(и ещё {} профилей)",
            profiles.len() - CATALOG_PREVIEW
        ));
    }
    Reply::Text(text)
}

/// The hit to show in full: the only one, or an exact match that no other
/// hit ties.
fn single_hit(hits: &[SearchHit]) -> Option<&SearchHit> {
    match hits {
        [only] => Some(only),
        [first, second, ..] if first.score == 100 && second.score < 100 => Some(first),
        _ => None,
    }
}

fn search_reply(query: &str, lookup: &dyn CatalogLookup) -> Vec<Reply> {
    let hits = match lookup.search(query) {
        Ok(hits) => hits,
        Err(e) => {
            warn!(error = %e, "search request failed");
            return vec![Reply::Text("Ошибка соединения".into())];
        }
    };
    if hits.is_empty() {
        return vec![Reply::Text(format!(
            "Профили по запросу '{query}' не найдены"
        ))];
    }

    if let Some(hit) = single_hit(&hits) {
        let p = &hit.profile;
        let caption = profile_caption(p);
        return match p.photo_full.as_ref().or(p.photo_thumb.as_ref()) {
            Some(url) => vec![Reply::Photo {
                url: url.clone(),
                caption,
            }],
            None => vec![Reply::Text(caption)],
        };
    }

    let list: Vec<String> = hits.iter().map(|h| format!("• {}", h.profile.name)).collect();
    vec![Reply::Text(format!(
        "Найдено {} профилей:\n\n{}\n\nОтправьте точное название профиля для просмотра",
        hits.len(),
        list.join("\n")
    ))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::search;
    use crate::error::Error;

    struct FakeCatalog {
        profiles: Vec<CatalogProfile>,
        down: bool,
    }

    impl CatalogLookup for FakeCatalog {
        fn list(&self, limit: usize) -> Result<Vec<CatalogProfile>> {
            if self.down {
                return Err(Error::Telegram("down".into()));
            }
            Ok(self.profiles.iter().take(limit).cloned().collect())
        }

        fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
            if self.down {
                return Err(Error::Telegram("down".into()));
            }
            Ok(search(query, &self.profiles))
        }
    }

    fn profile(name: &str) -> CatalogProfile {
        CatalogProfile {
            name: name.into(),
            ..Default::default()
        }
    }

    fn catalog() -> FakeCatalog {
        let mut with_photo = profile("ЮП-1625");
        with_photo.photo_full = Some("/static/images/ЮП-1625.jpg".into());
        with_photo.quantity_per_hanger = Some(40);
        with_photo.length = Some(6000.0);
        FakeCatalog {
            profiles: vec![with_photo, profile("юп-1625b"), profile("CP-100")],
            down: false,
        }
    }

    fn authorized(conv: &mut Conversation, cat: &FakeCatalog) {
        conv.on_text(1, "Иван", "1122", cat);
    }

    #[test]
    fn test_password_gate() {
        let cat = catalog();
        let mut conv = Conversation::new("1122");

        let replies = conv.on_text(1, "Иван", "/start", &cat);
        assert!(matches!(&replies[0], Reply::Text(t) if t.contains("пароль")));

        let replies = conv.on_text(1, "Иван", "0000", &cat);
        assert!(matches!(&replies[0], Reply::Text(t) if t.starts_with("Неверный")));
        assert!(!conv.is_authorized(1));

        let replies = conv.on_text(1, "Иван", " 1122 ", &cat);
        assert!(matches!(&replies[0], Reply::Text(t) if t.contains("Иван")));
        assert!(conv.is_authorized(1));
        assert!(!conv.is_authorized(2));

        let replies = conv.on_text(1, "Иван", "/start@EkranchikBot", &cat);
        assert!(matches!(replies[0], Reply::Menu(_)));
    }

    #[test]
    fn test_single_hit_sends_photo() {
        let cat = catalog();
        let mut conv = Conversation::new("1122");
        authorized(&mut conv, &cat);

        // exact match wins over the longer variant
        let replies = conv.on_text(1, "Иван", "юп-1625", &cat);
        assert_eq!(
            replies,
            vec![Reply::Photo {
                url: "/static/images/ЮП-1625.jpg".into(),
                caption: "ЮП-1625\nКол-во: 40\nДлина: 6000 мм\nПримечания: нет".into(),
            }]
        );

        let replies = conv.on_text(1, "Иван", "ср-100", &cat);
        assert!(matches!(&replies[0], Reply::Text(t) if t.starts_with("CP-100\n")));
    }

    #[test]
    fn test_several_hits_listed() {
        let cat = catalog();
        let mut conv = Conversation::new("1122");
        authorized(&mut conv, &cat);
        let replies = conv.on_text(1, "Иван", "1625", &cat);
        match &replies[0] {
            Reply::Text(t) => {
                assert!(t.starts_with("Найдено 2 профилей"));
                assert!(t.contains("• ЮП-1625"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_not_found_and_errors() {
        let mut cat = catalog();
        let mut conv = Conversation::new("1122");
        authorized(&mut conv, &cat);

        let replies = conv.on_text(1, "Иван", "zzzzzzzzzz", &cat);
        assert!(matches!(&replies[0], Reply::Text(t) if t.contains("не найдены")));

        cat.down = true;
        let replies = conv.on_text(1, "Иван", "юп", &cat);
        assert_eq!(replies, vec![Reply::Text("Ошибка соединения".into())]);
        let replies = conv.on_callback(1, "Иван", "catalog", &cat);
        assert!(matches!(&replies[0], Reply::Text(t) if t.contains("Ошибка загрузки")));
    }

    #[test]
    fn test_catalog_preview() {
        let cat = FakeCatalog {
            profiles: (0..25).map(|i| profile(&format!("P-{i}"))).collect(),
            down: false,
        };
        let mut conv = Conversation::new("1122");
        authorized(&mut conv, &cat);
        let replies = conv.on_text(1, "Иван", "/catalog", &cat);
        match &replies[0] {
            Reply::Text(t) => {
                assert_eq!(t.matches("❌").count(), CATALOG_PREVIEW);
                assert!(t.ends_with("(и ещё 5 профилей)"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
