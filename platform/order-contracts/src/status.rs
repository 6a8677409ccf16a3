//! Order lifecycle status and its legacy integer code table.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an order.
///
/// On the wire the canonical form is the string name (`"Processed"`). The
/// integer codes below are accepted on decode for compatibility with older
/// producers:
///
/// | code | status     |
/// |------|------------|
/// | 0    | Processing |
/// | 1    | Processed  |
/// | 2    | Shipped    |
/// | 3    | Cancelled  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Processing,
    Processed,
    Shipped,
    Cancelled,
}

impl OrderStatus {
    /// Legacy integer code of this status.
    pub const fn code(self) -> i32 {
        match self {
            OrderStatus::Processing => 0,
            OrderStatus::Processed => 1,
            OrderStatus::Shipped => 2,
            OrderStatus::Cancelled => 3,
        }
    }

    /// Resolve a legacy integer code.
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(OrderStatus::Processing),
            1 => Some(OrderStatus::Processed),
            2 => Some(OrderStatus::Shipped),
            3 => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Processing => "Processing",
            OrderStatus::Processed => "Processed",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status name or code is not in the table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Processing" => Ok(OrderStatus::Processing),
            "Processed" => Ok(OrderStatus::Processed),
            "Shipped" => Ok(OrderStatus::Shipped),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StatusVisitor;

        impl Visitor<'_> for StatusVisitor {
            type Value = OrderStatus;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an order status name or integer code 0..=3")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(|_| {
                    de::Error::invalid_value(de::Unexpected::Str(v), &self)
                })
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                OrderStatus::from_code(v).ok_or_else(|| {
                    de::Error::invalid_value(de::Unexpected::Signed(v), &self)
                })
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                match i64::try_from(v) {
                    Ok(code) => self.visit_i64(code),
                    Err(_) => Err(de::Error::invalid_value(
                        de::Unexpected::Unsigned(v),
                        &"an integer status code 0..=3",
                    )),
                }
            }
        }

        deserializer.deserialize_any(StatusVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_table_round_trips() {
        for status in [
            OrderStatus::Processing,
            OrderStatus::Processed,
            OrderStatus::Shipped,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_code(status.code() as i64), Some(status));
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert_eq!(OrderStatus::from_code(4), None);
    }

    #[test]
    fn deserializes_from_string_name() {
        let status: OrderStatus = serde_json::from_str(r#""Shipped""#).unwrap();
        assert_eq!(status, OrderStatus::Shipped);
    }

    #[test]
    fn deserializes_from_legacy_integer_code() {
        let status: OrderStatus = serde_json::from_str("3").unwrap();
        assert_eq!(status, OrderStatus::Cancelled);
    }

    #[test]
    fn serializes_as_string_name() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processed).unwrap(),
            r#""Processed""#
        );
    }

    #[test]
    fn rejects_unknown_name_and_code() {
        assert!(serde_json::from_str::<OrderStatus>(r#""Delivered""#).is_err());
        assert!(serde_json::from_str::<OrderStatus>("7").is_err());
    }
}
