//! Engine configuration.

use serde::Deserialize;

use crate::launch::store_uri_for;
use crate::protocol::MESSAGE_PATH;

/// Engine settings. Every field has a default, so an empty table is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Channel path used for outbound sends and accepted for inbound payloads (default `/message`).
    pub message_path: String,
    /// This application's package, used for the store fallback page.
    pub app_package: String,
    /// Store page prefix; the package is appended.
    pub store_url_prefix: String,
}

fn default_app_package() -> String {
    "com.example.wearlink".to_owned()
}

fn default_store_url_prefix() -> String {
    "https://play.google.com/store/apps/details?id=".to_owned()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            message_path: MESSAGE_PATH.to_owned(),
            app_package: default_app_package(),
            store_url_prefix: default_store_url_prefix(),
        }
    }
}

impl EngineConfig {
    pub fn store_uri(&self) -> String {
        store_uri_for(&self.store_url_prefix, &self.app_package)
    }
}
