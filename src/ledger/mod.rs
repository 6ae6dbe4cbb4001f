pub mod store;


pub use store::{Ledger, LedgerStore};
