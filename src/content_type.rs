//! Common content-type values for [`PolicyBuilder::content_type`].
//!
//! [`PolicyBuilder::content_type`]: crate::PolicyBuilder::content_type

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_XML: &str = "application/xml";
pub const APPLICATION_FORM_URL_ENCODED: &str = "application/x-www-form-urlencoded";
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";
pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_CSV: &str = "text/csv";
pub const TEXT_HTML: &str = "text/html";
pub const TEXT_CSS: &str = "text/css";
pub const TEXT_JAVASCRIPT: &str = "text/javascript";
pub const APPLICATION_JAVASCRIPT: &str = "application/javascript";
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";
pub const APPLICATION_MSGPACK: &str = "application/x-msgpack";
pub const APPLICATION_PDF: &str = "application/pdf";
pub const APPLICATION_GZIP: &str = "application/gzip";
pub const APPLICATION_ZIP: &str = "application/zip";
pub const APPLICATION_LZH: &str = "application/x-lzh";
pub const APPLICATION_TAR: &str = "application/x-tar";
pub const IMAGE_BMP: &str = "image/bmp";
pub const IMAGE_GIF: &str = "image/gif";
pub const IMAGE_JPEG: &str = "image/jpeg";
pub const IMAGE_PNG: &str = "image/png";
pub const IMAGE_SVG: &str = "image/svg+xml";
pub const AUDIO_WAV: &str = "audio/wav";
pub const AUDIO_MP3: &str = "audio/mp3";
pub const VIDEO_MPEG: &str = "video/mpeg";
pub const VIDEO_MP4: &str = "video/mp4";
