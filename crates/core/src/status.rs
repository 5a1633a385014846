//! Order lifecycle statuses.
//!
//! The string constants are the wire names used by the order tables, the hub
//! messages and the queue payload.

use serde::{Deserialize, Serialize};

pub const STATUS_NEW: &str = "new";
pub const STATUS_CONFIRMED: &str = "confirmed";
pub const STATUS_SHIPPED: &str = "shipped";
pub const STATUS_DELIVERED: &str = "delivered";
pub const STATUS_CANCELLED: &str = "cancelled";

/// Every recognised status name, in lifecycle order.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_NEW,
    STATUS_CONFIRMED,
    STATUS_SHIPPED,
    STATUS_DELIVERED,
    STATUS_CANCELLED,
];

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Convert from a wire / database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            STATUS_NEW => Ok(Self::New),
            STATUS_CONFIRMED => Ok(Self::Confirmed),
            STATUS_SHIPPED => Ok(Self::Shipped),
            STATUS_DELIVERED => Ok(Self::Delivered),
            STATUS_CANCELLED => Ok(Self::Cancelled),
            _ => Err(format!(
                "Invalid status '{s}'. Must be one of: {}",
                VALID_STATUSES.join(", ")
            )),
        }
    }

    /// Convert to the wire / database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => STATUS_NEW,
            Self::Confirmed => STATUS_CONFIRMED,
            Self::Shipped => STATUS_SHIPPED,
            Self::Delivered => STATUS_DELIVERED,
            Self::Cancelled => STATUS_CANCELLED,
        }
    }

    /// Human-readable label shown to operators.
    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Confirmed => "Confirmed",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
