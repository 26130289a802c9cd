//! Volatile voice-clone prompt cache
//!
//! Prompts live in memory only and vanish with the process. There is no cap
//! and no eviction; every created prompt stays until deleted.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::{ModelVariant, VoicePrompt};

/// Cached prompt with its metadata
#[derive(Debug, Clone)]
pub struct PromptEntry {
    pub id: String,
    pub payload: Arc<VoicePrompt>,
    pub model_variant: ModelVariant,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Listing row; never carries the payload
#[derive(Debug, Clone, Serialize)]
pub struct PromptSummary {
    pub prompt_id: String,
    pub name: Option<String>,
    pub model: ModelVariant,
    pub created_at: DateTime<Utc>,
}

impl From<&PromptEntry> for PromptSummary {
    fn from(entry: &PromptEntry) -> Self {
        Self {
            prompt_id: entry.id.clone(),
            name: entry.label.clone(),
            model: entry.model_variant,
            created_at: entry.created_at,
        }
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, (u64, PromptEntry)>,
    next_seq: u64,
}

/// Prompt cache keyed by random UUID v4 ids
#[derive(Default)]
pub struct PromptCache {
    inner: RwLock<Inner>,
}

impl PromptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a payload and return its fresh id
    pub fn create(
        &self,
        payload: VoicePrompt,
        model_variant: ModelVariant,
        label: Option<String>,
    ) -> PromptEntry {
        let entry = PromptEntry {
            id: Uuid::new_v4().to_string(),
            payload: Arc::new(payload),
            model_variant,
            label,
            created_at: Utc::now(),
        };

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(entry.id.clone(), (seq, entry.clone()));
        entry
    }

    pub fn get(&self, id: &str) -> Option<PromptEntry> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.entries.get(id).map(|(_, entry)| entry.clone())
    }

    /// Remove an entry; true only if it existed
    pub fn delete(&self, id: &str) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.entries.remove(id).is_some()
    }

    /// Summaries in insertion order
    pub fn list(&self) -> Vec<PromptSummary> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut rows: Vec<&(u64, PromptEntry)> = inner.entries.values().collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, entry)| PromptSummary::from(entry)).collect()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
