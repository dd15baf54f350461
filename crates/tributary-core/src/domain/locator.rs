//! Locator - fetch 対象 object のアドレス
//!
//! Notification record の (bucket, key) を decode したもの。
//! 文字列としては `scheme://bucket/key` で表現する。
//! record ごとに作られ、fetch task に move されて、そこで捨てられる。

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::errors::UnescapeError;

/// Default scheme for object-store notifications.
pub const DEFAULT_SCHEME: &str = "s3";

/// (bucket, key) のペア。key は decode 済み。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    scheme: String,
    bucket: String,
    key: String,
}

impl Locator {
    pub fn new(scheme: impl Into<String>, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// `scheme://bucket/key` 形式の URI
    pub fn uri(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.bucket, self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseLocatorError {
    #[error("missing scheme separator in {0:?}")]
    MissingScheme(String),

    #[error("missing bucket in {0:?}")]
    MissingBucket(String),
}

impl FromStr for Locator {
    type Err = ParseLocatorError;

    /// `scheme://bucket/key` を分解する。key は最初の `/` 以降すべて（空でもよい）。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| ParseLocatorError::MissingScheme(s.to_string()))?;
        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if scheme.is_empty() {
            return Err(ParseLocatorError::MissingScheme(s.to_string()));
        }
        if bucket.is_empty() {
            return Err(ParseLocatorError::MissingBucket(s.to_string()));
        }
        Ok(Self::new(scheme, bucket, key))
    }
}

/// Notification の object key を query-string 形式で unescape する。
///
/// - `+` は空白になる
/// - `%` の後ろは 16 進 2 桁でなければならない
/// - decode 結果は UTF-8 でなければならない
pub fn unescape_key(raw: &str) -> Result<String, UnescapeError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                let end = (i + 3).min(bytes.len());
                return Err(UnescapeError::InvalidEscape {
                    escape: String::from_utf8_lossy(&bytes[i..end]).into_owned(),
                    offset: i,
                });
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    // urlencoding は `+` を扱わないので先に置換する（`%2B` は decode 後に `+` になる）
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| UnescapeError::InvalidUtf8)
}
