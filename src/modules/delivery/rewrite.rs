use super::signer;

/// Rewrites resource lines of a master manifest into links to the
/// per-resolution delivery endpoint. Comment and blank lines pass through
/// verbatim.
pub fn rewrite_master(content: &str, upload_id: &str) -> String {
    let lines: Vec<String> = content
        .split('\n')
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return line.to_string();
            }

            // A resource line looks like "360p/playlist.m3u8"; the leading
            // directory is the resolution tag.
            let resolution_dir = trimmed.split('/').next().unwrap_or(trimmed);
            format!("/api/v1/manifest/{}/{}", upload_id, resolution_dir)
        })
        .collect();

    lines.join("\n")
}

/// Rewrites every segment line of a media manifest into an absolute, signed,
/// expiring URL. The signature covers exactly the absolute path and the
/// expiry timestamp, so tampering with either invalidates it.
///
/// Pure and line-linear; the delivery handler runs this on the blocking pool
/// since it is CPU-bound relative to the surrounding I/O.
pub fn rewrite_media(
    content: &str,
    upload_id: &str,
    resolution: &str,
    expiry: i64,
    secret: &str,
) -> String {
    let lines: Vec<String> = content
        .split('\n')
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return line.to_string();
            }

            let public_path = format!("/media/{}/{}/{}", upload_id, resolution, trimmed);
            let sig = signer::sign(&public_path, expiry, secret);
            format!("{}?expiry={}&sig={}", public_path, expiry, sig)
        })
        .collect();

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::delivery::signer;

    const SECRET: &str = "test-secret";

    #[test]
    fn master_rewrite_points_at_delivery_endpoint() {
        let input = "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360\n360p/playlist.m3u8\n#EXT-X-STREAM-INF:BANDWIDTH=2800000,RESOLUTION=1280x720\n720p/playlist.m3u8\n";
        let out = rewrite_master(input, "abc123");

        assert!(out.contains("/api/v1/manifest/abc123/360p"));
        assert!(out.contains("/api/v1/manifest/abc123/720p"));
        assert!(!out.contains("playlist.m3u8?"));
        // Metadata lines survive untouched.
        assert!(out.contains("#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360"));
    }

    #[test]
    fn comment_only_manifest_is_unchanged() {
        let input = "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-ENDLIST\n";
        assert_eq!(rewrite_master(input, "abc123"), input);
        assert_eq!(rewrite_media(input, "abc123", "360p", 1700000000, SECRET), input);
    }

    #[test]
    fn media_rewrite_signs_each_segment() {
        let input = "#EXTM3U\n#EXTINF:6.0,\nseg_000.ts\n#EXTINF:6.0,\nseg_001.ts\n#EXT-X-ENDLIST\n";
        let expiry = 1700000000;
        let out = rewrite_media(input, "abc123", "360p", expiry, SECRET);

        let expected_sig = signer::sign("/media/abc123/360p/seg_000.ts", expiry, SECRET);
        assert!(out.contains(&format!(
            "/media/abc123/360p/seg_000.ts?expiry={}&sig={}",
            expiry, expected_sig
        )));
        assert!(out.contains("/media/abc123/360p/seg_001.ts?expiry="));
        assert!(out.contains("#EXTINF:6.0,"));
    }

    #[test]
    fn media_rewrite_signatures_verify() {
        let input = "seg_000.ts\n";
        let expiry = 1700000500;
        let out = rewrite_media(input, "vid42", "1080p", expiry, SECRET);

        let line = out.lines().next().unwrap();
        let (path, query) = line.split_once('?').unwrap();
        let sig = query.split("sig=").nth(1).unwrap();
        assert!(signer::verify(path, expiry, sig, SECRET));
    }

    #[test]
    fn blank_lines_pass_through() {
        let input = "#EXTM3U\n\nseg_000.ts\n";
        let out = rewrite_media(input, "abc", "480p", 1700000000, SECRET);
        assert_eq!(out.lines().nth(1).unwrap(), "");
    }
}
