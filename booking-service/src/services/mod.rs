pub mod database;
pub mod metrics;
pub mod providers;

pub use database::{MemoryStatusStore, MongoStatusStore, StatusStore};
pub use self::metrics::{get_metrics, init_metrics, record_booking, record_status_write};
pub use providers::{
    DeliveredMail, DeliveryReceipt, MailMessage, MailRelay, MockMailRelay, RelayError, SmtpRelay,
};
