//! Local file names for release assets.
//!
//! Asset names come from the remote feed and are used as paths inside the
//! storage root, so they are reduced to a single safe path component.

/// Sanitizes a candidate filename for safe use on Linux.
///
/// - Replaces NUL, `/`, `\`, and control characters with `_`
/// - Trims leading/trailing spaces and dots
/// - Collapses consecutive underscores
/// - Limits length to 255 bytes (Linux NAME_MAX)
pub fn sanitize_filename_for_linux(name: &str) -> String {
    const NAME_MAX: usize = 255;

    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let replacement = if c == '\0' || c == '/' || c == '\\' || c.is_control() {
            '_'
        } else {
            c
        };

        if replacement == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(replacement);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == ' ' || c == '\t' || c == '.' || c == '_');

    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}

/// File name (relative to the storage root) an asset is cached under.
/// Returns `None` when nothing usable is left after sanitizing.
pub fn asset_file_name(asset_name: &str) -> Option<String> {
    let sanitized = sanitize_filename_for_linux(asset_name);
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        None
    } else {
        Some(sanitized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_asset_names_are_kept() {
        assert_eq!(
            asset_file_name("Phantom-Setup-1.2.0.exe").as_deref(),
            Some("Phantom-Setup-1.2.0.exe")
        );
        assert_eq!(asset_file_name("latest.yml").as_deref(), Some("latest.yml"));
    }

    #[test]
    fn traversal_cannot_escape_root() {
        assert_eq!(
            asset_file_name("../../etc/passwd").as_deref(),
            Some("etc_passwd")
        );
        assert_eq!(asset_file_name("a\\b.exe").as_deref(), Some("a_b.exe"));
    }

    #[test]
    fn empty_or_dot_names_rejected() {
        assert!(asset_file_name("").is_none());
        assert!(asset_file_name("..").is_none());
        assert!(asset_file_name(" . ").is_none());
    }

    #[test]
    fn control_chars() {
        assert_eq!(
            sanitize_filename_for_linux("file\x00name.exe"),
            "file_name.exe"
        );
    }

    #[test]
    fn long_names_truncated_on_char_boundary() {
        let long = "é".repeat(200);
        let out = sanitize_filename_for_linux(&long);
        assert!(out.len() <= 255);
        assert!(out.chars().all(|c| c == 'é'));
    }
}
