//! LocalStorage 封装模块
//!
//! 使用 `web_sys::Storage` 提供简洁的本地存储接口，以及基于它的支付待补录队列。

use oneroof::workflow::{KeyValueStore, StoredOutbox};

const OUTBOX_KEY: &str = "oneroof_unsettled_payments";

/// 本地存储操作封装
#[derive(Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) -> bool {
        Self::storage()
            .and_then(|s| s.set_item(key, value).ok())
            .is_some()
    }

    fn delete(&self, key: &str) -> bool {
        Self::storage()
            .and_then(|s| s.remove_item(key).ok())
            .is_some()
    }
}

/// Charged-but-unrecorded payments, kept across reloads.
pub fn local_outbox() -> StoredOutbox<LocalStorage> {
    StoredOutbox::new(LocalStorage, OUTBOX_KEY)
}
