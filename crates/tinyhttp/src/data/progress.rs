/// Snapshot passed to the download callback after each body chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes accumulated so far, including this chunk.
    pub bytes_downloaded: u64,

    /// Size of the chunk that triggered this update.
    pub chunk_size: usize,

    /// Total expected bytes, if the response carried `Content-Length`.
    pub total_bytes: Option<u64>,
}

impl DownloadProgress {
    /// Percentage of completion, or `None` if the total is unknown.
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        self.total_bytes.map(|total| {
            if total == 0 {
                100.0
            } else {
                (self.bytes_downloaded as f64 / total as f64) * 100.0
            }
        })
    }
}
