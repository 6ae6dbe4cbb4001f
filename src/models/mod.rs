pub mod transaction;

pub use transaction::{
    AccountRef, ClassifiedTransaction, RawMessage, RawTransaction, TransactionsResponse,
    TransferDirection, MINOR_UNITS_PER_TON, UNKNOWN_ADDRESS,
};
