use serde::{Deserialize, Serialize};

use crate::codec;
use crate::registry::{MedicineId, PharmacyId};
use crate::utils::error::CodecError;

/// Envelope tags on server->client events.
pub const PHARMACY_TAG: &str = "pharmacy";
pub const PHARMACY_MEDICINE_STOCK_TAG: &str = "pharmacy-medicine-stock";
pub const MEDICINE_NOTIFICATION_TAG: &str = "medicine-notification";

/// A state change the service layer reports after a successful mutation.
///
/// Each variant carries everything needed both to classify it into topics and
/// to serialize it for clients, so publishing needs no further lookups except
/// the identity fan-out for back-in-stock events.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    PharmacyRatingChanged {
        pharmacy_id: PharmacyId,
        new_rating_sum: i64,
        new_rating_counts: [u32; 5],
    },
    PharmacyMedicineStockChanged {
        pharmacy_id: PharmacyId,
        medicine_id: MedicineId,
        new_stock: i64,
    },
    MedicineBackInStock {
        pharmacy_id: PharmacyId,
        pharmacy_name: String,
        medicine_id: MedicineId,
        medicine_name: String,
        new_stock: i64,
    },
}

impl DomainEvent {
    pub fn tag(&self) -> &'static str {
        match self {
            DomainEvent::PharmacyRatingChanged { .. } => PHARMACY_TAG,
            DomainEvent::PharmacyMedicineStockChanged { .. } => PHARMACY_MEDICINE_STOCK_TAG,
            DomainEvent::MedicineBackInStock { .. } => MEDICINE_NOTIFICATION_TAG,
        }
    }

    /// Serializes the event into its wire envelope. Done once per publish,
    /// not per recipient: the encoding does not depend on who receives it.
    pub fn encode(&self) -> Result<String, CodecError> {
        match self {
            DomainEvent::PharmacyRatingChanged {
                pharmacy_id,
                new_rating_sum,
                new_rating_counts,
            } => codec::encode(
                PHARMACY_TAG,
                &PharmacyPayload {
                    pharmacy_id: *pharmacy_id,
                    global_rating_sum: *new_rating_sum,
                    number_of_ratings: *new_rating_counts,
                },
            ),
            DomainEvent::PharmacyMedicineStockChanged {
                pharmacy_id,
                medicine_id,
                new_stock,
            } => codec::encode(
                PHARMACY_MEDICINE_STOCK_TAG,
                &PharmacyMedicineStockPayload {
                    pharmacy_id: *pharmacy_id,
                    medicine_id: *medicine_id,
                    stock: *new_stock,
                },
            ),
            DomainEvent::MedicineBackInStock {
                pharmacy_id,
                medicine_id,
                medicine_name,
                new_stock,
                ..
            } => codec::encode(
                MEDICINE_NOTIFICATION_TAG,
                &MedicineNotificationPayload {
                    medicine_stock: MedicineStockPayload {
                        medicine: MedicinePayload {
                            id: *medicine_id,
                            name: medicine_name.clone(),
                        },
                        stock: *new_stock,
                    },
                    pharmacy_id: *pharmacy_id,
                },
            ),
        }
    }
}

/// Inner payload of a `pharmacy` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyPayload {
    pub pharmacy_id: PharmacyId,
    pub global_rating_sum: i64,
    pub number_of_ratings: [u32; 5],
}

/// Inner payload of a `pharmacy-medicine-stock` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyMedicineStockPayload {
    pub pharmacy_id: PharmacyId,
    pub medicine_id: MedicineId,
    pub stock: i64,
}

/// Inner payload of a `medicine-notification` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineNotificationPayload {
    pub medicine_stock: MedicineStockPayload,
    pub pharmacy_id: PharmacyId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineStockPayload {
    pub medicine: MedicinePayload,
    pub stock: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicinePayload {
    pub id: MedicineId,
    pub name: String,
}
