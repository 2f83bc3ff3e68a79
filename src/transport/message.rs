use serde::{Deserialize, Serialize};

use crate::registry::{MedicineId, PharmacyId, Topic};

/// Envelope tags a client may send.
pub const AUTHENTICATE_TAG: &str = "authenticate";
pub const SUBSCRIBE_TAG: &str = "subscribe";
pub const UNSUBSCRIBE_TAG: &str = "unsubscribe";

/// One explicitly subscribable topic, as it appears inside the `subscribe` /
/// `unsubscribe` envelope payload (a JSON array of these).
///
/// The identity-scoped notification topic has no descriptor on purpose:
/// clients cannot subscribe to it, the registry enters it at admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TopicDescriptor {
    #[serde(rename = "pharmacy")]
    Pharmacy {
        #[serde(rename = "pharmacyId")]
        pharmacy_id: PharmacyId,
    },

    #[serde(rename = "pharmacy-medicine-stock")]
    PharmacyMedicineStock {
        #[serde(rename = "pharmacyId")]
        pharmacy_id: PharmacyId,
        #[serde(rename = "medicineId")]
        medicine_id: MedicineId,
    },
}

impl TopicDescriptor {
    pub fn into_topic(self) -> Topic {
        match self {
            TopicDescriptor::Pharmacy { pharmacy_id } => Topic::Pharmacy { pharmacy_id },
            TopicDescriptor::PharmacyMedicineStock {
                pharmacy_id,
                medicine_id,
            } => Topic::PharmacyMedicineStock {
                pharmacy_id,
                medicine_id,
            },
        }
    }
}

/// Inner payload of the `authenticate` envelope, the first frame a client
/// must send after the handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub token: String,
}
