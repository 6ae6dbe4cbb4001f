pub mod telegram;

pub use telegram::{format_address, Message, TelegramNotifier};
