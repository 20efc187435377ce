// Service exports
pub mod api;
pub mod cache;
pub mod clock;
pub mod storage;

pub use api::{ApiClient, ApiError, EducationResponse, SESSION_HEADER};
pub use cache::{CacheError, CacheKey, CachedItem, ResponseCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use storage::{LocalStorage, StorageError, StorageKeys};
