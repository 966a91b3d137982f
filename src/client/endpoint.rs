//! Configuration object addresses relative to `/config/v2`.

use std::fmt;

/// Path of a configuration collection or object, as raw segments.
///
/// Segments are percent-encoded when the request URL is built, so object
/// names may contain spaces or slashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
}

impl Endpoint {
    /// A top-level collection such as `locations`.
    #[must_use]
    pub fn collection(name: &str) -> Self {
        Self {
            segments: vec![name.to_string()],
        }
    }

    /// Appends a segment.
    #[must_use]
    pub fn join(mut self, segment: &str) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    /// Raw path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}
