//! Image entry model (one row of the reconstructed gallery)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An image currently stored in the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    /// Repository-relative path (unique within one index)
    pub path: String,
    /// Blob identifier of the recorded content
    pub change_sha: String,
    /// Public URL of the image
    pub resolved_url: String,
    /// Authored time of the commit that recorded this content
    pub committed_at: DateTime<Utc>,
}

impl ImageEntry {
    /// Get the file name (last path segment)
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Markdown image link for this entry
    pub fn markdown(&self) -> String {
        format!("![]({})", self.resolved_url)
    }

    /// Get relative time string (e.g., "5m", "2h", "3d")
    pub fn relative_time(&self) -> String {
        let duration = Utc::now().signed_duration_since(self.committed_at);

        if duration.num_seconds() < 60 {
            format!("{}s", duration.num_seconds().max(0))
        } else if duration.num_minutes() < 60 {
            format!("{}m", duration.num_minutes())
        } else if duration.num_hours() < 24 {
            format!("{}h", duration.num_hours())
        } else if duration.num_days() < 7 {
            format!("{}d", duration.num_days())
        } else {
            self.committed_at.format("%b %d").to_string()
        }
    }
}
