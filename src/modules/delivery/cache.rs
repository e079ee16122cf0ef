use serde::{Deserialize, Serialize};

/// Cached entries outlive their embedded signatures by this margin, so they
/// age out of Redis only after downstream verification would reject them
/// anyway.
pub const CACHE_TTL_MARGIN: i64 = 300;

/// A rewritten media manifest together with the expiry of the signatures
/// embedded in it.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheRecord {
    pub playlist: String,
    pub expires_at: i64,
}

impl CacheRecord {
    /// A record is served only while more than `refresh_threshold` seconds of
    /// signature validity remain; below that the next read regenerates.
    pub fn is_fresh(&self, now: i64, refresh_threshold: i64) -> bool {
        self.expires_at - now > refresh_threshold
    }
}

/// Regenerate once less than 40% of the signature lifetime remains, so a
/// client never receives a manifest it cannot finish consuming.
pub fn refresh_threshold(signature_ttl: i64) -> i64 {
    signature_ttl * 2 / 5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_fresh_while_validity_exceeds_threshold() {
        let record = CacheRecord {
            playlist: "#EXTM3U".to_string(),
            expires_at: 2000,
        };
        let threshold = refresh_threshold(1800); // 720

        assert!(record.is_fresh(1000, threshold)); // 1000s left
        assert!(!record.is_fresh(1280, threshold)); // exactly 720s left
        assert!(!record.is_fresh(1500, threshold)); // 500s left
        assert!(!record.is_fresh(2500, threshold)); // already expired
    }

    #[test]
    fn threshold_is_forty_percent_of_ttl() {
        assert_eq!(refresh_threshold(1800), 720);
        assert_eq!(refresh_threshold(600), 240);
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = CacheRecord {
            playlist: "#EXTM3U\nseg_000.ts?expiry=1&sig=x".to_string(),
            expires_at: 1700000000,
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: CacheRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.playlist, record.playlist);
        assert_eq!(back.expires_at, record.expires_at);
    }
}
