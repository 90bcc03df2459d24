use std::error::Error;
use std::sync::Arc;

use teloxide::dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage};
use teloxide::types::ChatId;

use super::{Difficulty, OperationSelector};

pub const HISTORY_KEY: &str = "matikquiz_history";
pub const HISTORY_LIMIT: usize = 10;

pub type HistoryStorage = Arc<ErasedStorage<Vec<HistoryEntry>>>;

/// Summary of one finished session.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HistoryEntry {
    pub date: String,
    pub operation: OperationSelector,
    pub difficulty: Difficulty,
    pub total: u32,
    pub correct: u32,
    pub wrong: u32,
    pub blank: u32,
}

/// Recent sessions of every chat, most recent first.
///
/// Storage problems never reach the caller: they are logged and the quiz
/// carries on with whatever history it has.
#[derive(Clone)]
pub struct HistoryStore {
    storage: HistoryStorage,
}

impl HistoryStore {
    pub fn new(storage: HistoryStorage) -> Self {
        Self { storage }
    }

    /// History kept in its own SQLite file, next to the dialogue database.
    pub async fn open(path: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let storage: HistoryStorage = SqliteStorage::open(path, Json).await?.erase();
        Ok(Self::new(storage))
    }

    pub async fn load(&self, chat_id: ChatId) -> Vec<HistoryEntry> {
        match self.storage.clone().get_dialogue(chat_id).await {
            Ok(entries) => entries.unwrap_or_default(),
            Err(err) => {
                log::warn!("Ignoring unreadable history of chat {}: {err}", chat_id.0);
                Vec::new()
            }
        }
    }

    /// Puts `entry` in front, drops whatever falls past the limit and writes
    /// the list back. Returns the list as it should now look.
    pub async fn record(&self, chat_id: ChatId, entry: HistoryEntry) -> Vec<HistoryEntry> {
        let mut entries = self.load(chat_id).await;
        entries.insert(0, entry);
        entries.truncate(HISTORY_LIMIT);

        if let Err(err) = self
            .storage
            .clone()
            .update_dialogue(chat_id, entries.clone())
            .await
        {
            log::warn!("Failed to save history of chat {}: {err}", chat_id.0);
        }
        entries
    }
}

pub fn render_history(entries: &[HistoryEntry]) -> String {
    entries
        .iter()
        .map(|h| {
            format!(
                "{} | {} · {}\nTotal: {}  Correct: {}  Wrong: {}  Blank: {}",
                h.date, h.operation, h.difficulty, h.total, h.correct, h.wrong, h.blank
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::io;
    use std::path::PathBuf;
    use std::pin::Pin;

    use teloxide::dispatching::dialogue::InMemStorage;

    use super::*;

    type Pending<T> = Pin<Box<dyn Future<Output = Result<T, io::Error>> + Send>>;

    /// Storage whose every call fails, like a locked or missing database.
    struct Unavailable;

    impl Storage<Vec<HistoryEntry>> for Unavailable {
        type Error = io::Error;

        fn remove_dialogue(self: Arc<Self>, _: ChatId) -> Pending<()> {
            Box::pin(async { Err(io::Error::new(io::ErrorKind::Other, "database is locked")) })
        }

        fn update_dialogue(self: Arc<Self>, _: ChatId, _: Vec<HistoryEntry>) -> Pending<()> {
            Box::pin(async { Err(io::Error::new(io::ErrorKind::Other, "database is locked")) })
        }

        fn get_dialogue(self: Arc<Self>, _: ChatId) -> Pending<Option<Vec<HistoryEntry>>> {
            Box::pin(async { Err(io::Error::new(io::ErrorKind::Other, "database is locked")) })
        }
    }

    fn in_memory() -> HistoryStore {
        HistoryStore::new(InMemStorage::<Vec<HistoryEntry>>::new().erase())
    }

    fn temp_db(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("matikquiz-{}-{name}.sqlite", std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    fn entry(n: u32) -> HistoryEntry {
        HistoryEntry {
            date: format!("day {n}"),
            operation: OperationSelector::Addition,
            difficulty: Difficulty::Easy,
            total: n,
            correct: n,
            wrong: 0,
            blank: 0,
        }
    }

    #[tokio::test]
    async fn missing_history_is_empty() {
        assert!(in_memory().load(ChatId(1)).await.is_empty());
    }

    #[tokio::test]
    async fn most_recent_first_and_capped() {
        let store = in_memory();
        for n in 1..=12 {
            store.record(ChatId(1), entry(n)).await;
        }
        let loaded = store.load(ChatId(1)).await;
        assert_eq!(loaded.len(), HISTORY_LIMIT);
        assert_eq!(loaded[0], entry(12));
        assert_eq!(loaded[HISTORY_LIMIT - 1], entry(3));
    }

    #[tokio::test]
    async fn chats_do_not_share_history() {
        let store = in_memory();
        store.record(ChatId(1), entry(1)).await;
        store.record(ChatId(2), entry(2)).await;
        assert_eq!(store.load(ChatId(1)).await, vec![entry(1)]);
        assert_eq!(store.load(ChatId(2)).await, vec![entry(2)]);
    }

    #[tokio::test]
    async fn unavailable_storage_does_not_block_recording() {
        let store = HistoryStore::new(Arc::new(Unavailable).erase());
        assert!(store.load(ChatId(1)).await.is_empty());
        assert_eq!(store.record(ChatId(1), entry(1)).await, vec![entry(1)]);
    }

    #[tokio::test]
    async fn history_survives_reopening_the_database() {
        let path = temp_db("reopen");
        let path_str = path.to_str().unwrap();

        let store = HistoryStore::open(path_str).await.unwrap();
        store.record(ChatId(7), entry(1)).await;
        store.record(ChatId(7), entry(2)).await;

        let reopened = HistoryStore::open(path_str).await.unwrap();
        assert_eq!(reopened.load(ChatId(7)).await, vec![entry(2), entry(1)]);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn corrupt_history_is_swallowed() {
        let path = temp_db("corrupt");
        let path_str = path.to_str().unwrap();

        let sqlite = SqliteStorage::open(path_str, Json).await.unwrap();
        <SqliteStorage<Json> as Storage<String>>::update_dialogue(
            sqlite.clone(),
            ChatId(3),
            "not a history".to_string(),
        )
        .await
        .unwrap();

        let storage: HistoryStorage = sqlite.erase();
        let store = HistoryStore::new(storage);
        assert!(store.load(ChatId(3)).await.is_empty());
        assert_eq!(store.record(ChatId(3), entry(5)).await, vec![entry(5)]);
        assert_eq!(store.load(ChatId(3)).await, vec![entry(5)]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn render_lists_every_entry() {
        let text = render_history(&[entry(2), entry(1)]);
        assert!(text.starts_with("day 2 | Addition · Easy\nTotal: 2  Correct: 2"));
        assert!(text.contains("\n\nday 1 | Addition · Easy"));
    }
}
