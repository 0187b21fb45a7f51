pub mod notification;
pub mod waitlist;

pub use notification::{LogNotifier, Notifier, SupabaseNotifier, SLOT_AVAILABLE_EVENT};
pub use waitlist::WaitlistManager;
