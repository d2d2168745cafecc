//! Rate-limit bookkeeping for GitHub API responses.
//!
//! Every search response carries the `X-RateLimit-*` quota headers, an
//! optional `Retry-After` and, while more results remain, a `Link` header
//! with a `rel="next"` entry. [`RateLimitInfo`] captures those values and
//! [`pacing_delay`] turns them into the pause taken before the next request.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone, Utc};
use reqwest::header::{HeaderMap, LINK, RETRY_AFTER};

use crate::error::{FinderError, Result};

const LIMIT: &str = "x-ratelimit-limit";
const REMAINING: &str = "x-ratelimit-remaining";
const RESET: &str = "x-ratelimit-reset";
const USED: &str = "x-ratelimit-used";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: u64,
    pub remaining: u64,
    /// Epoch seconds at which the quota window resets.
    pub reset: i64,
    pub used: u64,
    /// Seconds requested by a `Retry-After` header, if any.
    pub retry_after: Option<i64>,
    pub next_url: Option<String>,
}

impl RateLimitInfo {
    /// Read quota, retry and pagination information from response headers.
    ///
    /// The four quota headers are mandatory; `Retry-After` and `Link` are not.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        let retry_after = match headers.get(RETRY_AFTER) {
            Some(value) => Some(parse_value("retry-after", value.to_str().ok())?),
            None => None,
        };

        Ok(RateLimitInfo {
            limit: required(headers, LIMIT)?,
            remaining: required(headers, REMAINING)?,
            reset: required(headers, RESET)?,
            used: required(headers, USED)?,
            retry_after,
            next_url: headers
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_link),
        })
    }

    /// Reset instant in the local timezone.
    pub fn reset_time(&self) -> Option<DateTime<Local>> {
        Local.timestamp_opt(self.reset, 0).single()
    }
}

impl fmt::Display for RateLimitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Used: {} - Remaining {} of {} - Reset: ",
            self.used, self.remaining, self.limit
        )?;
        match self.reset_time() {
            Some(time) => write!(f, "{}", time.format("%Y-%m-%d %H:%M:%S")),
            None => write!(f, "{}", self.reset),
        }
    }
}

fn required<T: std::str::FromStr>(headers: &HeaderMap, name: &'static str) -> Result<T> {
    let value = headers
        .get(name)
        .ok_or(FinderError::MissingHeader(name))?;
    parse_value(name, value.to_str().ok())
}

fn parse_value<T: std::str::FromStr>(name: &'static str, value: Option<&str>) -> Result<T> {
    let raw = value.unwrap_or_default().trim();
    raw.parse::<T>().map_err(|_| FinderError::InvalidHeader {
        name,
        value: raw.to_string(),
    })
}

/// Extract the `rel="next"` target from an RFC 8288 `Link` header value.
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| {
            let param = param.trim();
            param == r#"rel="next""# || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_owned)
    })
}

/// How long to wait before the next request, or `None` when no wait applies.
///
/// A positive `Retry-After` always wins. Otherwise the delay runs until the
/// quota window resets, but only while there is another page to fetch.
pub fn pacing_delay(info: &RateLimitInfo, now: DateTime<Utc>) -> Option<Duration> {
    if let Some(secs) = info.retry_after.filter(|secs| *secs > 0) {
        return Some(Duration::from_secs(secs as u64));
    }

    info.next_url.as_ref()?;

    let now_secs = now.timestamp_millis() as f64 / 1000.0;
    let wait = (info.reset as f64 - now_secs).ceil().max(0.0);
    Some(Duration::from_secs(wait as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn quota() -> Vec<(&'static str, &'static str)> {
        vec![
            (LIMIT, "30"),
            (REMAINING, "29"),
            (RESET, "1700000060"),
            (USED, "1"),
        ]
    }

    fn info(retry_after: Option<i64>, next_url: Option<&str>) -> RateLimitInfo {
        RateLimitInfo {
            limit: 30,
            remaining: 29,
            reset: 1_700_000_060,
            used: 1,
            retry_after,
            next_url: next_url.map(str::to_owned),
        }
    }

    fn at(secs: i64, millis: u32) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, millis * 1_000_000).single().unwrap()
    }

    #[test]
    fn parses_quota_and_next_link() {
        let mut pairs = quota();
        pairs.push((
            "link",
            r#"<https://api.github.com/search/code?q=x&page=2>; rel="next", <https://api.github.com/search/code?q=x&page=10>; rel="last""#,
        ));
        let info = RateLimitInfo::from_headers(&headers(&pairs)).unwrap();

        assert_eq!(info.limit, 30);
        assert_eq!(info.remaining, 29);
        assert_eq!(info.reset, 1_700_000_060);
        assert_eq!(info.used, 1);
        assert_eq!(info.retry_after, None);
        assert_eq!(
            info.next_url.as_deref(),
            Some("https://api.github.com/search/code?q=x&page=2")
        );
    }

    #[test]
    fn last_page_has_no_next_link() {
        let mut pairs = quota();
        pairs.push((
            "link",
            r#"<https://api.github.com/search/code?q=x&page=1>; rel="prev", <https://api.github.com/search/code?q=x&page=1>; rel="first""#,
        ));
        let info = RateLimitInfo::from_headers(&headers(&pairs)).unwrap();
        assert_eq!(info.next_url, None);

        let info = RateLimitInfo::from_headers(&headers(&quota())).unwrap();
        assert_eq!(info.next_url, None);
    }

    #[test]
    fn missing_quota_header_is_an_error() {
        let pairs: Vec<_> = quota().into_iter().filter(|(n, _)| *n != USED).collect();
        let err = RateLimitInfo::from_headers(&headers(&pairs)).unwrap_err();
        assert!(matches!(err, FinderError::MissingHeader(USED)));
    }

    #[test]
    fn non_numeric_header_is_an_error() {
        let mut pairs = quota();
        pairs.push(("retry-after", "soon"));
        let err = RateLimitInfo::from_headers(&headers(&pairs)).unwrap_err();
        assert!(matches!(err, FinderError::InvalidHeader { name: "retry-after", .. }));
    }

    #[test]
    fn retry_after_overrides_reset_math() {
        let now = at(1_700_000_000, 0);
        assert_eq!(
            pacing_delay(&info(Some(7), Some("next")), now),
            Some(Duration::from_secs(7))
        );
        assert_eq!(
            pacing_delay(&info(Some(7), None), now),
            Some(Duration::from_secs(7))
        );
    }

    #[test]
    fn non_positive_retry_after_falls_back_to_reset() {
        let now = at(1_700_000_000, 0);
        assert_eq!(
            pacing_delay(&info(Some(0), Some("next")), now),
            Some(Duration::from_secs(60))
        );
        assert_eq!(pacing_delay(&info(Some(0), None), now), None);
    }

    #[test]
    fn waits_until_reset_rounded_up() {
        let now = at(1_700_000_000, 250);
        assert_eq!(
            pacing_delay(&info(None, Some("next")), now),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn past_reset_never_goes_negative() {
        let now = at(1_700_000_100, 0);
        assert_eq!(
            pacing_delay(&info(None, Some("next")), now),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn no_next_page_means_no_wait() {
        let now = at(1_700_000_000, 0);
        assert_eq!(pacing_delay(&info(None, None), now), None);
    }

    #[test]
    fn display_mentions_quota() {
        let line = info(None, None).to_string();
        assert!(line.starts_with("Used: 1 - Remaining 29 of 30 - Reset: "));
    }
}
