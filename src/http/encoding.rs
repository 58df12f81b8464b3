//! Accept-Encoding negotiation
//!
//! Parses the client's `Accept-Encoding` header and decides whether a given
//! content-coding may be sent.

/// A single `coding;q=value` entry
#[derive(Debug, Clone, PartialEq)]
struct Entry {
    coding: String,
    quality: f32,
    /// Position in the header, lower wins ties
    order: usize,
}

/// How well an entry matched a coding
#[derive(Debug, Clone, Copy)]
struct Priority {
    quality: f32,
    specificity: u8,
    order: usize,
}

/// Parsed `Accept-Encoding` header
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptEncoding {
    entries: Vec<Entry>,
}

impl AcceptEncoding {
    /// Parse the header value
    ///
    /// A missing header is treated like an empty one, so only `identity` is
    /// acceptable.
    ///
    /// # Examples
    /// ```
    /// use static_file_middleware::http::encoding::AcceptEncoding;
    ///
    /// let accept = AcceptEncoding::parse(Some("gzip, br;q=0.5"));
    /// assert!(accept.accepts("gzip"));
    /// assert!(!AcceptEncoding::parse(Some("")).accepts("gzip"));
    /// ```
    pub fn parse(header: Option<&str>) -> Self {
        let mut entries: Vec<Entry> = header
            .unwrap_or_default()
            .split(',')
            .enumerate()
            .filter_map(|(order, part)| parse_entry(part, order))
            .collect();

        // identity stays acceptable unless the client says otherwise
        if !entries.iter().any(|e| e.coding == "identity" || e.coding == "*") {
            let min_quality = entries
                .iter()
                .map(|e| e.quality)
                .fold(1.0_f32, f32::min);
            entries.push(Entry {
                coding: "identity".to_string(),
                quality: min_quality,
                order: entries.len(),
            });
        }

        Self { entries }
    }

    /// Quality the client assigns to `coding`, `None` if nothing matches
    pub fn quality(&self, coding: &str) -> Option<f32> {
        self.priority(coding).map(|p| p.quality)
    }

    /// Whether `coding` may be sent to this client
    pub fn accepts(&self, coding: &str) -> bool {
        self.quality(coding).is_some_and(|q| q > 0.0)
    }

    fn priority(&self, coding: &str) -> Option<Priority> {
        self.entries
            .iter()
            .filter_map(|entry| {
                let specificity = if entry.coding.eq_ignore_ascii_case(coding) {
                    1
                } else if entry.coding == "*" {
                    0
                } else {
                    return None;
                };
                Some(Priority {
                    quality: entry.quality,
                    specificity,
                    order: entry.order,
                })
            })
            .max_by(|a, b| {
                a.specificity
                    .cmp(&b.specificity)
                    .then(a.quality.total_cmp(&b.quality))
                    .then(b.order.cmp(&a.order))
            })
    }
}

/// Parse one comma separated element, e.g. `gzip;q=0.8`
fn parse_entry(part: &str, order: usize) -> Option<Entry> {
    let mut params = part.split(';');
    let coding = params.next()?.trim();
    if coding.is_empty() {
        return None;
    }

    let mut quality = 1.0;
    for param in params {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case("q") {
            quality = value.trim().parse::<f32>().ok()?;
        }
    }

    Some(Entry {
        coding: coding.to_ascii_lowercase(),
        quality,
        order,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_list() {
        let accept = AcceptEncoding::parse(Some("gzip, deflate"));
        assert!(accept.accepts("gzip"));
        assert!(accept.accepts("deflate"));
        assert!(!accept.accepts("br"));
        assert!(accept.accepts("identity"));
    }

    #[test]
    fn test_missing_and_empty_header() {
        for header in [None, Some(""), Some("  ")] {
            let accept = AcceptEncoding::parse(header);
            assert!(!accept.accepts("gzip"), "header {header:?}");
            assert!(accept.accepts("identity"), "header {header:?}");
        }
    }

    #[test]
    fn test_case_insensitive() {
        let accept = AcceptEncoding::parse(Some("GZip"));
        assert!(accept.accepts("gzip"));
        assert!(accept.accepts("GZIP"));
    }

    #[test]
    fn test_q_zero_rejects() {
        let accept = AcceptEncoding::parse(Some("gzip;q=0, br"));
        assert!(!accept.accepts("gzip"));
        assert!(accept.accepts("br"));
    }

    #[test]
    fn test_wildcard() {
        let accept = AcceptEncoding::parse(Some("*"));
        assert!(accept.accepts("gzip"));
        assert!(accept.accepts("zstd"));

        // exact entry beats the wildcard
        let accept = AcceptEncoding::parse(Some("*;q=1, gzip;q=0"));
        assert!(!accept.accepts("gzip"));
        assert!(accept.accepts("br"));

        let accept = AcceptEncoding::parse(Some("*;q=0"));
        assert!(!accept.accepts("gzip"));
    }

    #[test]
    fn test_identity_implicit_quality() {
        let accept = AcceptEncoding::parse(Some("gzip;q=0.5, br;q=0.8"));
        assert_eq!(accept.quality("identity"), Some(0.5));

        let accept = AcceptEncoding::parse(Some("identity;q=0"));
        assert!(!accept.accepts("identity"));

        // the wildcard already covers identity
        let accept = AcceptEncoding::parse(Some("*, gzip;q=0.5"));
        assert_eq!(accept.quality("identity"), Some(1.0));
    }

    #[test]
    fn test_unusual_quality_values() {
        let accept = AcceptEncoding::parse(Some("gzip;q=abc, br;q=2, deflate;q=-1"));
        assert!(!accept.accepts("gzip"));
        assert!(accept.accepts("br"));
        assert_eq!(accept.quality("br"), Some(2.0));
        assert!(!accept.accepts("deflate"));
    }
}
