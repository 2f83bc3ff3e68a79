use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::registry::{IdentityId, MedicineId, PharmacyId};
use crate::utils::error::LookupError;

/// Favorites/watch-list collaborator consulted at publish time for
/// back-in-stock events. The engine does not own that data; it only asks
/// which identities favorited the pharmacy AND are watching the medicine.
#[async_trait]
pub trait WatchlistIndex: Send + Sync {
    async fn interested_identities(
        &self,
        pharmacy_id: PharmacyId,
        medicine_id: MedicineId,
    ) -> Result<Vec<IdentityId>, LookupError>;
}

/// Reverse index from (pharmacy, medicine) to interested identities.
///
/// The lookup has to be cheap at publish time, so interest is maintained as
/// its own index when favorites/watch-lists change, never re-derived by
/// scanning the user table.
#[derive(Debug, Default)]
pub struct InMemoryWatchlistIndex {
    index: DashMap<(PharmacyId, MedicineId), HashSet<IdentityId>>,
}

impl InMemoryWatchlistIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `identity_id` favorited `pharmacy_id` and watches
    /// `medicine_id`.
    pub fn record_interest(
        &self,
        pharmacy_id: PharmacyId,
        medicine_id: MedicineId,
        identity_id: IdentityId,
    ) {
        self.index
            .entry((pharmacy_id, medicine_id))
            .or_default()
            .insert(identity_id);
    }

    pub fn clear_interest(
        &self,
        pharmacy_id: PharmacyId,
        medicine_id: MedicineId,
        identity_id: &IdentityId,
    ) {
        self.index
            .remove_if_mut(&(pharmacy_id, medicine_id), |_, identities| {
                identities.remove(identity_id);
                identities.is_empty()
            });
    }
}

#[async_trait]
impl WatchlistIndex for InMemoryWatchlistIndex {
    async fn interested_identities(
        &self,
        pharmacy_id: PharmacyId,
        medicine_id: MedicineId,
    ) -> Result<Vec<IdentityId>, LookupError> {
        Ok(self
            .index
            .get(&(pharmacy_id, medicine_id))
            .map(|identities| identities.iter().copied().collect())
            .unwrap_or_default())
    }
}
