//! Cabinet settings.

use tracing::info;

use super::Store;
use crate::db::StorageKey;
use crate::models::{CabinetConfigPatch, NotificationKind};

impl Store {
    /// Shallow-merge settings. The config is never replaced or removed.
    pub fn update_cabinet_config(&mut self, patch: CabinetConfigPatch) {
        patch.apply_to(&mut self.cabinet);
        self.persist(&[StorageKey::Cabinet]);
        self.notify("Configuration mise à jour", NotificationKind::Success);
    }

    /// Resetting to demo data is disabled; existing data is never clobbered.
    pub fn reset_to_demo(&mut self) {
        info!("reset to demo data requested, ignoring");
        self.notify("Réinitialisation désactivée sur ce cabinet", NotificationKind::Info);
    }
}
