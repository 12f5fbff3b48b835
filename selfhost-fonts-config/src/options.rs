use serde::{Deserialize, Serialize};

/// What to do with a `@font-face` rule when one of its font files could not
/// be downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DownloadFailurePolicy {
    /// Emit the rule anyway, pointing at the original remote file
    #[default]
    KeepRemote,
    /// Drop the rule for that subset/variant pair
    SkipFace,
}

/// Operator-facing options consumed by the font processing core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Options {
    /// Master switch. Nothing is rewritten when off.
    #[serde(default = "crate::defaults::bool_true")]
    pub enabled: bool,

    /// Rewrite font-service URLs passed through the stylesheet registration hook
    #[serde(default = "crate::defaults::bool_true")]
    pub process_enqueues: bool,

    /// Scan `<link>` stylesheets in the HTML, including local CSS files
    #[serde(default = "crate::defaults::bool_false")]
    pub process_css_files: bool,

    /// Scan inline `<style>` blocks for font-service `@import`s
    #[serde(default = "crate::defaults::bool_false")]
    pub process_css_inline: bool,

    /// Skip processing for users who can manage options
    #[serde(default = "crate::defaults::bool_false")]
    pub disable_for_admins: bool,

    /// Emit local URLs as `//host/path` instead of with an explicit scheme
    #[serde(default = "crate::defaults::bool_false")]
    pub protocol_relative: bool,

    /// Value for the `font-display` descriptor; empty omits it
    #[serde(default = "crate::defaults::font_display")]
    pub font_display: String,

    /// Do not emit `local('…')` sources
    #[serde(default = "crate::defaults::bool_false")]
    pub disable_local_names: bool,

    /// Subsets always added to every parsed request
    #[serde(default)]
    pub force_subsets: Vec<String>,

    /// Fonts to preload, as `family:weight:subset`
    #[serde(default)]
    pub preload_fonts: Vec<String>,

    #[serde(default = "crate::defaults::download_failure")]
    pub download_failure: DownloadFailurePolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            enabled: crate::defaults::bool_true(),
            process_enqueues: crate::defaults::bool_true(),
            process_css_files: crate::defaults::bool_false(),
            process_css_inline: crate::defaults::bool_false(),
            disable_for_admins: crate::defaults::bool_false(),
            protocol_relative: crate::defaults::bool_false(),
            font_display: crate::defaults::font_display(),
            disable_local_names: crate::defaults::bool_false(),
            force_subsets: Vec::new(),
            preload_fonts: Vec::new(),
            download_failure: crate::defaults::download_failure(),
        }
    }
}

impl Options {
    /// Whether either of the HTML scanning passes is switched on
    pub fn processes_html(&self) -> bool {
        self.process_css_files || self.process_css_inline
    }

    /// The configured `font-display` value, if any
    pub fn font_display(&self) -> Option<&str> {
        let value = self.font_display.trim();
        (!value.is_empty()).then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!(options.enabled);
        assert!(options.process_enqueues);
        assert!(!options.process_css_files);
        assert!(!options.process_css_inline);
        assert!(!options.processes_html());
        assert_eq!(options.font_display(), None);
        assert_eq!(options.download_failure, DownloadFailurePolicy::KeepRemote);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "process_css_inline: true\nfont_display: swap\nforce_subsets: [latin-ext]\n";
        let options: Options = serde_yaml_ng::from_str(yaml).unwrap();
        assert!(options.enabled);
        assert!(options.process_css_inline);
        assert!(options.processes_html());
        assert_eq!(options.font_display(), Some("swap"));
        assert_eq!(options.force_subsets, vec!["latin-ext".to_string()]);
    }

    #[test]
    fn test_download_failure_policy_serialization() {
        assert_eq!(
            serde_yaml_ng::to_string(&DownloadFailurePolicy::SkipFace)
                .unwrap()
                .trim(),
            "skip_face"
        );
        let policy: DownloadFailurePolicy = serde_yaml_ng::from_str("keep_remote").unwrap();
        assert_eq!(policy, DownloadFailurePolicy::KeepRemote);
    }
}
