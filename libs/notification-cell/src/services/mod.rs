pub mod reconciler;
pub mod summary;

pub use reconciler::NotificationService;
