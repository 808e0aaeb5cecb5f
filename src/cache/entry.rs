//! Cache Entry Types
//!
//! The unit of storage held by every level. Values are kept in their encoded
//! (serialized, possibly compressed) form so promotion can copy them between
//! levels without decoding.

use bytes::Bytes;

use super::compression::CompressionAlgorithm;

/// Current wall-clock time in milliseconds since the Unix epoch
#[inline]
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Encoded value plus the algorithm needed to decode it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedValue {
    /// Stored bytes (compressed when `algorithm` is not `None`)
    pub data: Bytes,
    /// Compression applied to `data`
    pub algorithm: CompressionAlgorithm,
}

impl EncodedValue {
    /// Wrap bytes that were stored without compression
    pub fn plain(data: Bytes) -> Self {
        Self {
            data,
            algorithm: CompressionAlgorithm::None,
        }
    }

    /// Stored size in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the stored payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Cache entry: encoded value and access metadata
#[derive(Clone)]
pub struct CacheEntry {
    key: String,
    value: EncodedValue,
    /// Creation / overwrite time (epoch millis)
    timestamp_ms: u64,
    /// Time-to-live in millis, always > 0
    ttl_ms: u64,
    access_count: u64,
    /// Last access time (epoch millis)
    last_accessed_ms: u64,
    /// Level-local recency sequence, larger = more recently used
    recency: u64,
}

impl CacheEntry {
    /// Create a new entry stamped with the current time
    pub fn new(key: impl Into<String>, value: EncodedValue, ttl_ms: u64) -> Self {
        Self::at(key, value, ttl_ms, now_ms())
    }

    /// Create a new entry stamped with an explicit time
    pub fn at(key: impl Into<String>, value: EncodedValue, ttl_ms: u64, now: u64) -> Self {
        Self {
            key: key.into(),
            value,
            timestamp_ms: now,
            ttl_ms: ttl_ms.max(1),
            access_count: 0,
            last_accessed_ms: now,
            recency: 0,
        }
    }

    /// Copy this entry for another level: same value, fresh timestamps and
    /// that level's TTL.
    pub fn promoted(&self, ttl_ms: u64) -> Self {
        Self::new(self.key.clone(), self.value.clone(), ttl_ms)
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &EncodedValue {
        &self.value
    }

    #[inline]
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    #[inline]
    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    #[inline]
    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    #[inline]
    pub fn last_accessed_ms(&self) -> u64 {
        self.last_accessed_ms
    }

    #[inline]
    pub(crate) fn recency(&self) -> u64 {
        self.recency
    }

    #[inline]
    pub(crate) fn set_recency(&mut self, recency: u64) {
        self.recency = recency;
    }

    /// Absolute expiry time (epoch millis)
    #[inline]
    pub fn expires_at_ms(&self) -> u64 {
        self.timestamp_ms.saturating_add(self.ttl_ms)
    }

    /// Expired iff `now > timestamp + ttl`
    #[inline]
    pub fn is_expired_at(&self, now: u64) -> bool {
        now > self.expires_at_ms()
    }

    /// Check expiry against the wall clock
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_ms())
    }

    /// Remaining lifetime in millis (0 once expired)
    pub fn ttl_remaining_ms(&self, now: u64) -> u64 {
        self.expires_at_ms().saturating_sub(now)
    }

    /// Record a hit and return the new access count
    #[inline]
    pub fn record_access(&mut self, now: u64, recency: u64) -> u64 {
        self.access_count += 1;
        self.last_accessed_ms = now;
        self.recency = recency;
        self.access_count
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("size", &self.value.len())
            .field("algorithm", &self.value.algorithm)
            .field("ttl_ms", &self.ttl_ms)
            .field("access_count", &self.access_count)
            .field("is_expired", &self.is_expired())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
