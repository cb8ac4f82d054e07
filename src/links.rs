//! Public URL construction for stored images

/// Raw-content host used when no custom base URL is configured
pub const RAW_CONTENT_BASE: &str = "https://raw.githubusercontent.com";

/// Maps repository paths to public URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkResolver {
    repository: String,
    branch: String,
    custom_base: Option<String>,
}

impl LinkResolver {
    /// Create a resolver. A blank `custom_base` counts as unset.
    pub fn new(repository: &str, branch: &str, custom_base: Option<&str>) -> Self {
        Self {
            repository: repository.to_string(),
            branch: branch.to_string(),
            custom_base: custom_base
                .map(str::trim)
                .filter(|base| !base.is_empty())
                .map(ToString::to_string),
        }
    }

    /// Public URL for a repository path
    pub fn url_for(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        match &self.custom_base {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), path),
            None => format!(
                "{}/{}/{}/{}",
                RAW_CONTENT_BASE, self.repository, self.branch, path
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_url() {
        let links = LinkResolver::new("me/pics", "main", None);
        assert_eq!(
            links.url_for("img/a.png"),
            "https://raw.githubusercontent.com/me/pics/main/img/a.png"
        );
    }

    #[test]
    fn test_custom_base_single_slash() {
        let with_slash = LinkResolver::new("me/pics", "main", Some("https://cdn.example.com/"));
        let without = LinkResolver::new("me/pics", "main", Some("https://cdn.example.com"));
        assert_eq!(with_slash.url_for("img/a.png"), "https://cdn.example.com/img/a.png");
        assert_eq!(without.url_for("img/a.png"), "https://cdn.example.com/img/a.png");
    }

    #[test]
    fn test_blank_custom_base_is_ignored() {
        let links = LinkResolver::new("me/pics", "gh-pages", Some("  "));
        assert_eq!(
            links.url_for("img/a.png"),
            "https://raw.githubusercontent.com/me/pics/gh-pages/img/a.png"
        );
    }
}
