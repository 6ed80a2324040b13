//! Client/server version compatibility.

/// The version of this build, shared by the server and its client library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns `true` if a peer running `other` can talk to this build.
///
/// Versions are compatible when their major and minor components match;
/// patch releases never change the wire format.
pub fn is_compatible(other: &str) -> bool {
    major_minor(other).is_some_and(|theirs| Some(theirs) == major_minor(VERSION))
}

fn major_minor(version: &str) -> Option<(u64, u64)> {
    let mut parts = version.trim().split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_version_is_compatible() {
        assert!(is_compatible(VERSION));
    }

    #[test]
    fn test_patch_difference_is_compatible() {
        let (major, minor) = major_minor(VERSION).unwrap();
        assert!(is_compatible(&format!("{major}.{minor}.999")));
    }

    #[test]
    fn test_minor_difference_is_incompatible() {
        let (major, minor) = major_minor(VERSION).unwrap();
        assert!(!is_compatible(&format!("{major}.{}.0", minor + 1)));
    }

    #[test]
    fn test_garbage_is_incompatible() {
        assert!(!is_compatible(""));
        assert!(!is_compatible("one.two"));
        assert!(!is_compatible("1"));
    }
}
