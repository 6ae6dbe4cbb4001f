use chrono::{FixedOffset, TimeZone, Utc};
use log::warn;
use crate::ledger::Ledger;
use crate::models::{ClassifiedTransaction, RawTransaction, TransferDirection, UNKNOWN_ADDRESS};

/// Derives direction, amount, counterparty and display time from raw TonAPI transactions
#[derive(Debug, Clone)]
pub struct TransactionClassifier {
    display_offset: FixedOffset,
}

impl TransactionClassifier {
    pub fn new(display_offset: FixedOffset) -> Self {
        Self { display_offset }
    }

    /// Classify a transaction that has not been notified yet.
    ///
    /// Returns `None` when the hash is missing or already in the ledger, or
    /// when the timestamp is missing or out of range.
    /// A transaction is incoming only when it has an inbound message and no
    /// outbound ones; anything else is outgoing and described by its first
    /// outbound message.
    pub fn classify(&self, raw: &RawTransaction, ledger: &Ledger) -> Option<ClassifiedTransaction> {
        let hash = raw.hash.as_deref().filter(|h| !h.is_empty())?;
        if ledger.contains(hash) {
            return None;
        }

        let Some(utime) = raw.utime else {
            warn!("Transaction {} has no utime", hash);
            return None;
        };
        let timestamp = match Utc.timestamp_opt(utime, 0).single() {
            Some(utc) => utc.with_timezone(&self.display_offset),
            None => {
                warn!("Transaction {} has out-of-range utime {}", hash, utime);
                return None;
            }
        };

        let (direction, amount_minor, counterparty) = match (&raw.in_msg, raw.out_msgs.first()) {
            (Some(in_msg), None) => (
                TransferDirection::Incoming,
                in_msg.value,
                in_msg.source_address().to_string(),
            ),
            (_, Some(out_msg)) => (
                TransferDirection::Outgoing,
                out_msg.value,
                out_msg.destination_address().to_string(),
            ),
            (None, None) => (TransferDirection::Outgoing, 0, UNKNOWN_ADDRESS.to_string()),
        };

        Some(ClassifiedTransaction {
            hash: hash.to_string(),
            direction,
            amount_minor,
            counterparty,
            timestamp,
        })
    }
}

/// Equal-to-threshold passes
pub fn passes_threshold(classified: &ClassifiedTransaction, min_amount_minor: u64) -> bool {
    classified.amount_minor >= min_amount_minor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountRef, RawMessage};

    fn classifier() -> TransactionClassifier {
        TransactionClassifier::new(FixedOffset::east_opt(3 * 3600).unwrap())
    }

    fn message(value: u64, source: Option<&str>, destination: Option<&str>) -> RawMessage {
        RawMessage {
            value,
            source: source.map(|a| AccountRef { address: a.to_string() }),
            destination: destination.map(|a| AccountRef { address: a.to_string() }),
        }
    }

    fn transaction(hash: &str, in_msg: Option<RawMessage>, out_msgs: Vec<RawMessage>) -> RawTransaction {
        RawTransaction {
            hash: Some(hash.to_string()),
            utime: Some(1_717_000_000),
            in_msg,
            out_msgs,
        }
    }

    #[test]
    fn test_incoming_transaction() {
        let raw = transaction("h1", Some(message(6_000_000_000, Some("0:sender"), Some("0:me"))), vec![]);

        let classified = classifier().classify(&raw, &Ledger::new()).expect("Should classify");
        assert_eq!(classified.hash, "h1");
        assert_eq!(classified.direction, TransferDirection::Incoming);
        assert_eq!(classified.amount_minor, 6_000_000_000);
        assert_eq!(classified.amount(), 6.0);
        assert_eq!(classified.counterparty, "0:sender");
    }

    #[test]
    fn test_outgoing_uses_first_message_only() {
        let raw = transaction(
            "h2",
            Some(message(10_000_000, Some("0:me"), Some("0:me"))),
            vec![
                message(7_000_000_000, Some("0:me"), Some("0:first")),
                message(9_000_000_000, Some("0:me"), Some("0:second")),
            ],
        );

        let classified = classifier().classify(&raw, &Ledger::new()).unwrap();
        assert_eq!(classified.direction, TransferDirection::Outgoing);
        assert_eq!(classified.amount_minor, 7_000_000_000);
        assert_eq!(classified.counterparty, "0:first");
    }

    #[test]
    fn test_missing_addresses_fall_back_to_unknown() {
        let incoming = transaction("h3", Some(message(1, None, None)), vec![]);
        assert_eq!(classifier().classify(&incoming, &Ledger::new()).unwrap().counterparty, UNKNOWN_ADDRESS);

        let outgoing = transaction("h4", None, vec![message(1, None, None)]);
        assert_eq!(classifier().classify(&outgoing, &Ledger::new()).unwrap().counterparty, UNKNOWN_ADDRESS);
    }

    #[test]
    fn test_no_messages_is_zero_outgoing() {
        let raw = transaction("h5", None, vec![]);
        let classified = classifier().classify(&raw, &Ledger::new()).unwrap();
        assert_eq!(classified.direction, TransferDirection::Outgoing);
        assert_eq!(classified.amount_minor, 0);
        assert_eq!(classified.counterparty, UNKNOWN_ADDRESS);
    }

    #[test]
    fn test_known_or_missing_hash_is_skipped() {
        let mut ledger = Ledger::new();
        ledger.insert("h1");

        let known = transaction("h1", Some(message(6_000_000_000, None, None)), vec![]);
        assert!(classifier().classify(&known, &ledger).is_none());

        let mut unhashed = transaction("", Some(message(6_000_000_000, None, None)), vec![]);
        assert!(classifier().classify(&unhashed, &ledger).is_none());
        unhashed.hash = None;
        assert!(classifier().classify(&unhashed, &ledger).is_none());
    }

    #[test]
    fn test_missing_or_invalid_utime_is_skipped() {
        let mut raw = transaction("h8", Some(message(6_000_000_000, None, None)), vec![]);
        raw.utime = None;
        assert!(classifier().classify(&raw, &Ledger::new()).is_none());

        raw.utime = Some(i64::MAX);
        assert!(classifier().classify(&raw, &Ledger::new()).is_none());
    }

    #[test]
    fn test_empty_in_msg_payload_is_outgoing() {
        let raw: RawTransaction = serde_json::from_value(serde_json::json!({
            "hash": "h9",
            "utime": 1_717_000_000,
            "in_msg": {},
            "out_msgs": []
        }))
        .unwrap();

        let classified = classifier().classify(&raw, &Ledger::new()).unwrap();
        assert_eq!(classified.direction, TransferDirection::Outgoing);
        assert_eq!(classified.amount_minor, 0);
        assert_eq!(classified.counterparty, UNKNOWN_ADDRESS);
    }

    #[test]
    fn test_timestamp_uses_display_offset() {
        let raw = transaction("h6", Some(message(1, None, None)), vec![]);
        let classified = classifier().classify(&raw, &Ledger::new()).unwrap();

        // 1717000000 is 2024-05-29 16:26:40 UTC
        assert_eq!(classified.timestamp.format("%d.%m.%Y %H:%M:%S").to_string(), "29.05.2024 19:26:40");
        assert_eq!(classified.timestamp.offset().local_minus_utc(), 3 * 3600);
    }

    #[test]
    fn test_threshold_boundary() {
        let mut classified = classifier()
            .classify(&transaction("h7", Some(message(5_000_000_000, None, None)), vec![]), &Ledger::new())
            .unwrap();
        assert!(passes_threshold(&classified, 5_000_000_000));

        classified.amount_minor = 4_999_999_999;
        assert!(!passes_threshold(&classified, 5_000_000_000));

        classified.amount_minor = 0;
        assert!(passes_threshold(&classified, 0));
    }
}
