pub mod supabase;
pub mod stores;

pub use stores::{
    BookingStore, ConflictStore, MemoryStore, ScheduleStore, ServiceCatalog, StoreError,
    StoreResult, SupabaseStore, WaitlistStore,
};
