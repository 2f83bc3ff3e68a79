//! The `dispatch` module turns a committed domain mutation into live updates:
//! it classifies the event into topics, resolves the interested sessions via
//! the registry, encodes the event once, and enqueues it everywhere it
//! belongs.

mod engine;
mod event;
mod watchlist;

pub use engine::Dispatcher;
pub use event::{
    DomainEvent, MEDICINE_NOTIFICATION_TAG, MedicineNotificationPayload, MedicinePayload,
    MedicineStockPayload, PHARMACY_MEDICINE_STOCK_TAG, PHARMACY_TAG,
    PharmacyMedicineStockPayload, PharmacyPayload,
};
pub use watchlist::{InMemoryWatchlistIndex, WatchlistIndex};

#[cfg(test)]
mod tests;
