/// Application name
pub const APP_NAME: &str = "Trache Travel";

/// Image extensions accepted for logo and destination uploads (lower-case)
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Relative reference prefix for locally stored uploads
pub const LOCAL_UPLOAD_PREFIX: &str = "uploads";

/// Upload subdirectory for destination images
pub const DESTINATIONS_SUBDIR: &str = "destinations";

/// Key names used when mirroring the data files to object storage
pub const DOCUMENT_BACKUP_NAME: &str = "data.json";
pub const MESSAGES_BACKUP_NAME: &str = "messages.csv";

/// Header row of the contact message log
pub const MESSAGE_LOG_HEADER: [&str; 5] = ["Date", "Nom", "Email", "Telephone", "Message"];

/// Timestamp format for contact messages
pub const MESSAGE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 5000;

/// Maximum upload size in bytes (16 MiB)
pub const MAX_UPLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Login attempts allowed per client per minute
pub const LOGIN_ATTEMPTS_PER_MINUTE: f64 = 5.0;
