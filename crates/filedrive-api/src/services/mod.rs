pub mod cleanup;
pub mod files;

pub use cleanup::CleanupService;
pub use files::FileService;
