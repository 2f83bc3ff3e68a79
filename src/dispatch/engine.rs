use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::dispatch::event::DomainEvent;
use crate::dispatch::watchlist::WatchlistIndex;
use crate::registry::{Topic, TopicRegistry};
use crate::session::SessionHandle;
use crate::utils::error::LookupError;

/// Resolves a published event to its recipients and enqueues the encoded
/// envelope on each of them.
///
/// Publishing is best-effort relative to the already-committed domain
/// mutation: it never blocks on a slow recipient (enqueueing is non-blocking
/// with a per-session drop policy) and a collaborator failure skips the
/// fan-out with a warning instead of surfacing to the caller.
pub struct Dispatcher {
    registry: Arc<TopicRegistry>,
    watchlists: Arc<dyn WatchlistIndex>,
}

impl Dispatcher {
    pub fn new(registry: Arc<TopicRegistry>, watchlists: Arc<dyn WatchlistIndex>) -> Self {
        Self {
            registry,
            watchlists,
        }
    }

    pub async fn publish(&self, event: DomainEvent) {
        let encoded = match event.encode() {
            Ok(encoded) => encoded,
            Err(err) => {
                error!(tag = event.tag(), error = %err, "failed to encode event");
                return;
            }
        };

        let recipients = match self.resolve(&event).await {
            Ok(recipients) => recipients,
            Err(err) => {
                warn!(tag = event.tag(), error = %err, "skipping fan-out");
                return;
            }
        };

        // Encoded once above; recipients only get cheap clones of the frame.
        let frame = WsMessage::text(encoded);
        let count = recipients.len();
        for session in recipients {
            session.enqueue(frame.clone());
        }
        debug!(tag = event.tag(), recipients = count, "event dispatched");
    }

    /// Classifies the event into topic(s) and snapshots the interested
    /// sessions. Back-in-stock events fan out over identities resolved at
    /// publish time through the watch-list collaborator.
    async fn resolve(&self, event: &DomainEvent) -> Result<Vec<Arc<SessionHandle>>, LookupError> {
        match *event {
            DomainEvent::PharmacyRatingChanged { pharmacy_id, .. } => {
                Ok(self
                    .registry
                    .interested_sessions(&Topic::Pharmacy { pharmacy_id }))
            }
            DomainEvent::PharmacyMedicineStockChanged {
                pharmacy_id,
                medicine_id,
                ..
            } => Ok(self.registry.interested_sessions(&Topic::PharmacyMedicineStock {
                pharmacy_id,
                medicine_id,
            })),
            DomainEvent::MedicineBackInStock {
                pharmacy_id,
                medicine_id,
                ..
            } => {
                let identities = self
                    .watchlists
                    .interested_identities(pharmacy_id, medicine_id)
                    .await?;

                // One identity may hold several sessions and in principle the
                // collaborator may repeat identities; dedupe by session id.
                let mut seen = HashSet::new();
                let mut recipients = Vec::new();
                for identity_id in identities {
                    for session in self.registry.sessions_for_identity(identity_id) {
                        if seen.insert(session.id) {
                            recipients.push(session);
                        }
                    }
                }
                Ok(recipients)
            }
        }
    }
}
