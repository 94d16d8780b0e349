pub mod api;
pub mod error;
pub mod notify;
pub mod schema;
pub mod upload;

pub use api::{ApiClient, ClientConfig, ExportFile, PostBody};
pub use error::{ApiError, Result};
pub use notify::{NotificationKind, Notifier, NotifierConfig, Phase, VisibleNotification};
pub use upload::{MAX_UPLOAD_BYTES, SourceKind, UploadFile, UploadRejection, validate_upload};
