use std::collections::HashSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use super::{RecordEntry, RecordStore};

/// Redis backed record store. Values are plain strings (JSON documents).
#[derive(Clone)]
pub struct RedisRecordStore {
    client: redis::Client,
}

impl RedisRecordStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to connect to Redis")
    }
}

#[async_trait]
impl RecordStore for RedisRecordStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut con = self.connection().await?;
        let value: Option<String> = con
            .get(key)
            .await
            .with_context(|| format!("Redis GET {key} failed"))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut con = self.connection().await?;
        con.set::<_, _, ()>(key, value)
            .await
            .with_context(|| format!("Redis SET {key} failed"))?;
        debug!("Redis SET {key} ({} bytes)", value.len());
        Ok(())
    }

    async fn list(&self, pattern: &str, include_values: bool) -> Result<Vec<RecordEntry>> {
        let mut con = self.connection().await?;

        // SCAN may yield a key more than once; keep first-seen order.
        let mut keys = Vec::new();
        {
            let mut seen = HashSet::new();
            let mut iter: redis::AsyncIter<String> = con
                .scan_match(pattern)
                .await
                .with_context(|| format!("Redis SCAN {pattern} failed"))?;
            while let Some(key) = iter.next_item().await {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }
        }

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            let value = if include_values {
                con.get::<_, Option<String>>(&key)
                    .await
                    .with_context(|| format!("Redis GET {key} failed"))?
            } else {
                None
            };
            entries.push(RecordEntry { key, value });
        }

        debug!("Redis SCAN {pattern} matched {} keys", entries.len());
        Ok(entries)
    }
}
