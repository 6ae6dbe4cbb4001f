use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

/// Nanotons per TON
pub const MINOR_UNITS_PER_TON: u64 = 1_000_000_000;

/// Placeholder used when a message carries no counterparty address
pub const UNKNOWN_ADDRESS: &str = "Unknown";

/// Body of `GET /v2/blockchain/accounts/{address}/transactions`
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<RawTransaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawTransaction {
    #[serde(default)]
    pub hash: Option<String>,
    /// Unix seconds; a transaction without one cannot be dated and is never notified
    pub utime: Option<i64>,
    /// An empty object counts as no inbound message
    #[serde(default, deserialize_with = "deserialize_present_message")]
    pub in_msg: Option<RawMessage>,
    #[serde(default)]
    pub out_msgs: Vec<RawMessage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawMessage {
    /// Value in nanotons; TonAPI sends a number, some proxies a string
    #[serde(default, deserialize_with = "deserialize_minor_units")]
    pub value: u64,
    #[serde(default)]
    pub source: Option<AccountRef>,
    #[serde(default)]
    pub destination: Option<AccountRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountRef {
    pub address: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransferDirection {
    Incoming,
    Outgoing,
}

impl TransferDirection {
    pub fn label(&self) -> &'static str {
        match self {
            TransferDirection::Incoming => "📥 Incoming",
            TransferDirection::Outgoing => "📤 Outgoing",
        }
    }
}

/// A transaction reduced to what the notification needs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifiedTransaction {
    pub hash: String,
    pub direction: TransferDirection,
    /// Amount in nanotons
    pub amount_minor: u64,
    pub counterparty: String,
    pub timestamp: DateTime<FixedOffset>,
}

impl ClassifiedTransaction {
    /// Amount in TON
    pub fn amount(&self) -> f64 {
        self.amount_minor as f64 / MINOR_UNITS_PER_TON as f64
    }
}

impl RawMessage {
    pub fn source_address(&self) -> &str {
        self.source.as_ref().map_or(UNKNOWN_ADDRESS, |a| a.address.as_str())
    }

    pub fn destination_address(&self) -> &str {
        self.destination.as_ref().map_or(UNKNOWN_ADDRESS, |a| a.address.as_str())
    }
}

fn deserialize_present_message<'de, D>(deserializer: D) -> Result<Option<RawMessage>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Object(fields)) if fields.is_empty() => Ok(None),
        Some(value) => serde_json::from_value(value).map(Some).map_err(serde::de::Error::custom),
    }
}

fn deserialize_minor_units<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        Text(String),
        Null(()),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid nanoton value: {}", text))),
        NumberOrString::Null(()) => Ok(0),
    }
}
