//! Schema capabilities resolved once at startup.
//!
//! The flags start from schema detection (or a configured override) and can
//! only be switched off afterwards, when a write proves a column is gone.

use kanban_core::{KanbanResult, OrderingMode};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::traits::{CardStore, StoreCapabilities};

#[derive(Debug)]
pub struct CapabilityFlags {
    ordering: AtomicBool,
    tagging: AtomicBool,
}

impl CapabilityFlags {
    pub fn new(capabilities: StoreCapabilities) -> Self {
        Self {
            ordering: AtomicBool::new(capabilities.ordering),
            tagging: AtomicBool::new(capabilities.tagging),
        }
    }

    /// Detect what the store supports, then apply the configured ordering mode.
    pub async fn resolve<S>(store: &S, mode: OrderingMode) -> KanbanResult<Self>
    where
        S: CardStore + ?Sized,
    {
        let mut detected = store.detect_capabilities().await?;
        match mode {
            OrderingMode::Auto => {}
            OrderingMode::Enabled => detected.ordering = true,
            OrderingMode::Disabled => detected.ordering = false,
        }

        if detected.ordering {
            tracing::info!("Manual card ordering enabled");
        } else {
            tracing::warn!("Manual card ordering unavailable; reorders persist status only");
        }
        if !detected.tagging {
            tracing::warn!("Tag tables unavailable; cards are served without tags");
        }

        Ok(Self::new(detected))
    }

    pub fn ordering(&self) -> bool {
        self.ordering.load(Ordering::Acquire)
    }

    pub fn tagging(&self) -> bool {
        self.tagging.load(Ordering::Acquire)
    }

    /// Returns true if ordering was enabled before this call.
    pub fn disable_ordering(&self) -> bool {
        self.ordering.swap(false, Ordering::AcqRel)
    }

    /// Returns true if tagging was enabled before this call.
    pub fn disable_tagging(&self) -> bool {
        self.tagging.swap(false, Ordering::AcqRel)
    }

    pub fn snapshot(&self) -> StoreCapabilities {
        StoreCapabilities {
            ordering: self.ordering(),
            tagging: self.tagging(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryStore;

    #[tokio::test]
    async fn test_resolve_auto_follows_schema() {
        let store = InMemoryStore::new().without_ordering();
        let flags = CapabilityFlags::resolve(&store, OrderingMode::Auto)
            .await
            .unwrap();

        assert!(!flags.ordering());
        assert!(flags.tagging());
    }

    #[tokio::test]
    async fn test_resolve_override() {
        let store = InMemoryStore::new();
        let flags = CapabilityFlags::resolve(&store, OrderingMode::Disabled)
            .await
            .unwrap();
        assert!(!flags.ordering());

        let store = InMemoryStore::new().without_ordering();
        let flags = CapabilityFlags::resolve(&store, OrderingMode::Enabled)
            .await
            .unwrap();
        assert!(flags.ordering());
    }

    #[test]
    fn test_disable_is_one_way() {
        let flags = CapabilityFlags::new(StoreCapabilities::FULL);

        assert!(flags.disable_ordering());
        assert!(!flags.disable_ordering());
        assert!(!flags.ordering());
        assert!(flags.snapshot().is_degraded());
    }
}
