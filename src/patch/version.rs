//! Host-version gating for patch manifests.
//!
//! Patch sets are written against specific host releases and drift as the
//! host changes. A manifest can declare a semver range ("host_range") so the
//! registry skips it wholesale on hosts it was never written for.

use semver::{Version, VersionReq};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum HostVersionError {
    #[error("invalid host version '{value}': {message}")]
    InvalidVersion { value: String, message: String },

    #[error("invalid host version range '{value}': {message}")]
    InvalidRange { value: String, message: String },
}

/// Check whether a host version falls inside a manifest's declared range.
///
/// `None` or a blank range means "every host version".
pub fn host_in_range(version: &str, range: Option<&str>) -> Result<bool, HostVersionError> {
    let Some(range) = range else {
        return Ok(true);
    };
    let range = range.trim();
    if range.is_empty() {
        return Ok(true);
    }

    let version = Version::parse(version).map_err(|e| HostVersionError::InvalidVersion {
        value: version.to_string(),
        message: e.to_string(),
    })?;
    let req = VersionReq::parse(range).map_err(|e| HostVersionError::InvalidRange {
        value: range.to_string(),
        message: e.to_string(),
    })?;

    Ok(req.matches(&version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_or_blank_range_matches_everything() {
        assert!(host_in_range("1.0.0", None).unwrap());
        assert!(host_in_range("0.4.2", Some("")).unwrap());
        assert!(host_in_range("0.4.2", Some("   ")).unwrap());
    }

    #[test]
    fn bounded_range() {
        let range = Some(">=1.2.0, <1.4.0");
        assert!(host_in_range("1.2.0", range).unwrap());
        assert!(host_in_range("1.3.9", range).unwrap());
        assert!(!host_in_range("1.4.0", range).unwrap());
        assert!(!host_in_range("1.1.0", range).unwrap());
    }

    #[test]
    fn caret_range() {
        assert!(host_in_range("0.4.7", Some("^0.4")).unwrap());
        assert!(!host_in_range("0.5.0", Some("^0.4")).unwrap());
    }

    #[test]
    fn prerelease_hosts() {
        let range = Some(">=1.0.0-beta.2");
        assert!(host_in_range("1.0.0-beta.2", range).unwrap());
        assert!(host_in_range("1.0.0", range).unwrap());
        assert!(!host_in_range("1.0.0-beta.1", range).unwrap());
    }

    #[test]
    fn invalid_inputs_are_errors() {
        assert!(matches!(
            host_in_range("not-a-version", Some(">=1.0.0")),
            Err(HostVersionError::InvalidVersion { .. })
        ));
        assert!(matches!(
            host_in_range("1.0.0", Some(">=what")),
            Err(HostVersionError::InvalidRange { .. })
        ));
    }
}
