use std::{fmt, sync::LazyLock};

use regex::Regex;
use reqwest::Url;

use crate::{
    error::{ScwsError, ScwsResult},
    segment::SegmentDescriptor,
};

pub const ALLOW_CACHE_DIRECTIVE: &str = "#EXT-X-ALLOW-CACHE:YES";

static SYMBOLIC_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{4}\.ts$").unwrap());
static KEY_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^#EXT-X-KEY:.*URI="([^"]*)",IV"#).unwrap());
static IV_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"IV=0x([^,\s]*)").unwrap());

/// AES-CBC initialization vector from an `IV=0x...` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializationVector(pub [u8; 16]);

impl InitializationVector {
    pub fn from_hex(hex: &str) -> ScwsResult<Self> {
        let bytes = hex::decode(hex).map_err(|e| ScwsError::InvalidIv(format!("{hex}: {e}")))?;
        let iv = bytes
            .try_into()
            .map_err(|_| ScwsError::InvalidIv(format!("{hex}: expected 16 bytes")))?;
        Ok(Self(iv))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `NNNN-NNNN.ts`, before proxy rewriting
    SymbolicSegment,
    /// Absolute segment url
    Segment,
    KeyDirective,
    Other,
}

impl LineKind {
    pub fn of(line: &str) -> Self {
        let line = line.trim();
        if SYMBOLIC_SEGMENT.is_match(line) {
            Self::SymbolicSegment
        } else if (line.starts_with("https://") || line.starts_with("http://"))
            && line.contains(".ts")
        {
            Self::Segment
        } else if KEY_DIRECTIVE.is_match(line) {
            Self::KeyDirective
        } else {
            Self::Other
        }
    }

    pub fn is_segment(&self) -> bool {
        matches!(self, Self::SymbolicSegment | Self::Segment)
    }
}

/// A media playlist kept line by line.
///
/// Line order is playback order and is never changed by any transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    base: Url,
    lines: Vec<String>,
}

impl Manifest {
    pub fn parse(base: Url, text: &str) -> Self {
        Self {
            base,
            lines: text.split('\n').map(str::to_string).collect(),
        }
    }

    pub(crate) fn from_lines(base: Url, lines: Vec<String>) -> Self {
        Self { base, lines }
    }

    /// Url this manifest was fetched from
    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn has_symbolic_segments(&self) -> bool {
        self.lines
            .iter()
            .any(|line| LineKind::of(line) == LineKind::SymbolicSegment)
    }

    /// Reads the IV of the stream. `None` means the segments are not encrypted.
    pub fn iv(&self) -> ScwsResult<Option<InitializationVector>> {
        let Some(line) = self.lines.iter().find(|line| line.contains("IV=")) else {
            return Ok(None);
        };
        let hex = IV_DIRECTIVE
            .captures(line)
            .and_then(|c| c.get(1))
            .ok_or_else(|| ScwsError::InvalidIv(line.to_string()))?;
        InitializationVector::from_hex(hex.as_str()).map(Some)
    }

    /// Segment references in playback order.
    pub fn segments(&self) -> ScwsResult<Vec<SegmentDescriptor>> {
        self.lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| LineKind::of(line).is_segment())
            .enumerate()
            .map(|(index, line)| -> ScwsResult<SegmentDescriptor> {
                let resolved_url = self.base.join(line)?;
                let symbolic_name = resolved_url
                    .path_segments()
                    .and_then(|mut s| s.next_back())
                    .unwrap_or(line)
                    .to_string();
                Ok(SegmentDescriptor {
                    index,
                    symbolic_name,
                    resolved_url,
                })
            })
            .collect()
    }

    /// Marks the playlist cacheable for players, as the third line.
    pub fn with_allow_cache(mut self) -> Self {
        let position = self.lines.len().min(2);
        self.lines
            .insert(position, ALLOW_CACHE_DIRECTIVE.to_string());
        self
    }

    /// Points the key directive to `key_url`, leaving every other line as is.
    pub fn with_key_url(mut self, key_url: &Url) -> Self {
        for line in self.lines.iter_mut() {
            if LineKind::of(line) == LineKind::KeyDirective {
                *line = Self::replace_key_uri(line, key_url);
            }
        }
        self
    }

    /// Replaces the quoted `URI` of the key directive.
    pub(crate) fn replace_key_uri(line: &str, key_url: &Url) -> String {
        KEY_DIRECTIVE
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|uri| {
                format!(
                    "{}{}{}",
                    &line[..uri.start()],
                    key_url.as_str(),
                    &line[uri.end()..]
                )
            })
            .unwrap_or_else(|| line.to_string())
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}
