use serde::{Deserialize, Serialize};

/// An event for which tickets are sold. Orders hang off an event; its
/// capacity bounds how many orders may be confirmed as paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub slug: String,
    pub name: String,
    /// ISO 4217 currency code (e.g. "ARS", "BRL")
    pub currency: String,
    /// Maximum number of paid orders. None = unlimited.
    pub capacity: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateEvent {
    pub slug: String,
    pub name: String,
    pub currency: String,
    #[serde(default)]
    pub capacity: Option<i64>,
}
