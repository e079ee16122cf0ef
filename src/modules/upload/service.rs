/// Transient uploads live under this prefix until the worker cleans them up.
pub const PENDING_PREFIX: &str = "pending";

/// Storage key for a fresh upload: `pending/<upload_id>.<ext>`.
pub fn pending_key(upload_id: &str, ext: &str) -> String {
    format!("{}/{}.{}", PENDING_PREFIX, upload_id, ext)
}

/// Lowercased extension of the client-supplied filename; uploads without one
/// are assumed to be mp4.
pub fn extension_of(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_lowercase(),
        _ => "mp4".to_string(),
    }
}

/// Recovers the job id from a pending storage key: the path segment after the
/// prefix, stripped of its file extension. `None` for keys that do not look
/// like a pending upload.
pub fn extract_upload_id(s3_key: &str) -> Option<String> {
    let (_, filename) = s3_key.split_once('/')?;
    let upload_id = filename.split('.').next().unwrap_or("");
    if upload_id.is_empty() {
        return None;
    }
    Some(upload_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_key_layout() {
        assert_eq!(pending_key("abc123", "mp4"), "pending/abc123.mp4");
    }

    #[test]
    fn extension_defaults_to_mp4() {
        assert_eq!(extension_of("movie.MKV"), "mkv");
        assert_eq!(extension_of("trailer.mp4"), "mp4");
        assert_eq!(extension_of("noextension"), "mp4");
        assert_eq!(extension_of(".hidden"), "mp4");
    }

    #[test]
    fn upload_id_round_trips_through_pending_key() {
        let key = pending_key("abc123", "mp4");
        assert_eq!(extract_upload_id(&key).as_deref(), Some("abc123"));
    }

    #[test]
    fn upload_id_ignores_double_extensions() {
        assert_eq!(
            extract_upload_id("pending/abc123.tar.gz").as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert_eq!(extract_upload_id(""), None);
        assert_eq!(extract_upload_id("no-slash.mp4"), None);
        assert_eq!(extract_upload_id("pending/.mp4"), None);
        assert_eq!(extract_upload_id("pending/"), None);
    }
}
