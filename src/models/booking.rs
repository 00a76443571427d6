use serde::{Deserialize, Serialize};

/// Raw booking record as served by the marketplace backend. The backend owns
/// this shape; everything except the id may be missing, so every field is
/// optional and deserialization must never reject a partial record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    #[serde(default)]
    pub booking_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub renter_details: Option<RenterDetails>,
    #[serde(default)]
    pub property_details: Option<PropertyDetails>,
    /// Money fields arrive as a JSON string or a number depending on the
    /// backend serializer, so they are kept raw until projection time.
    #[serde(default)]
    pub monthly_rent: Option<serde_json::Value>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub confirmed_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub checked_out_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenterDetails {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyDetails {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub rent_price: Option<serde_json::Value>,
    #[serde(default)]
    pub monthly_rent: Option<serde_json::Value>,
}

impl Booking {
    /// Statuses under which the renter is considered to still occupy the
    /// property.
    pub fn has_occupied_status(&self) -> bool {
        matches!(self.status.as_deref(), Some("confirmed") | Some("completed"))
    }

    /// A booking belongs to the owner's active table while the renter holds
    /// an occupied status and no check-out has been recorded.
    pub fn is_active(&self) -> bool {
        self.has_occupied_status() && self.checked_out_at.is_none()
    }

    /// A booking belongs to the history table once a check-out timestamp
    /// exists, regardless of status.
    pub fn is_closed(&self) -> bool {
        self.checked_out_at.is_some()
    }
}
