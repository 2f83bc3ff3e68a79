pub type PharmacyId = i64;
pub type MedicineId = i64;
pub type IdentityId = i64;

/// Structural key identifying a class of live updates a session can be
/// interested in.
///
/// A topic is a pure value: two topics with equal fields are the same topic.
/// The registry relies on that, using topics directly as map keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Rating/aggregate changes for one pharmacy.
    Pharmacy { pharmacy_id: PharmacyId },

    /// Stock-level changes for one medicine at one pharmacy.
    PharmacyMedicineStock {
        pharmacy_id: PharmacyId,
        medicine_id: MedicineId,
    },

    /// Identity-scoped back-in-stock notifications. Clients never subscribe
    /// to this explicitly; the registry enters every session under its
    /// identity's topic at admission time.
    MedicineNotification { identity_id: IdentityId },
}
