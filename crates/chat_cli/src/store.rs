//! Store selection from configuration.

use std::sync::Arc;

use anyhow::Context;
use chat_core::{Backend, Config};
use chat_store::{ChatStore, InMemoryChatStore, RestChatStore, SqliteChatStore};

pub async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn ChatStore>> {
    match config.backend {
        Backend::Sqlite => {
            let store = SqliteChatStore::new(config.database_path());
            tracing::debug!("using sqlite store at {}", store.db_path().display());
            store
                .init()
                .await
                .with_context(|| format!("failed to open {}", store.db_path().display()))?;
            Ok(Arc::new(store))
        }
        Backend::Rest => {
            let (url, key) = config.rest_credentials()?;
            tracing::debug!("using hosted store at {}", url);
            Ok(Arc::new(RestChatStore::new(url, key)?))
        }
        Backend::Memory => Ok(Arc::new(InMemoryChatStore::new())),
    }
}
