//! Notification of qualified leads over webhook, SMS, WhatsApp, email and a
//! lead-store API, with a bounded local store as the last resort.

pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod format;
pub mod local_store;

pub use channel::{ChannelKind, ChannelOutcome, NotificationChannel};
pub use dispatcher::{
    ChannelReport, ChannelStatus, DispatchReport, DispatchStats, DispatchStatsSnapshot, Dispatcher,
};
pub use error::ChannelError;
pub use local_store::{LocalLeadStore, StoredLead, LOCAL_LEADS_KEY};
