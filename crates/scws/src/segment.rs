use reqwest::Url;

/// A segment reference of a manifest, resolved to its final location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentDescriptor {
    /// Position among the segment lines of the manifest, starts from 0
    pub index: usize,
    /// Last path component, e.g. `0000-0001.ts`
    pub symbolic_name: String,
    pub resolved_url: Url,
}
