//! Release name to protocol number table.

/// Protocol reported when the configured version is not in the table
/// (1.21.7 / 1.21.8).
pub const DEFAULT_PROTOCOL: i32 = 772;

const VERSIONS: &[(&str, i32)] = &[
    ("1.18.2", 758),
    ("1.19", 759),
    ("1.19.0", 759),
    ("1.19.1", 760),
    ("1.19.2", 760),
    ("1.19.3", 761),
    ("1.19.4", 762),
    ("1.20", 763),
    ("1.20.0", 763),
    ("1.20.1", 763),
    ("1.20.2", 764),
    ("1.20.3", 765),
    ("1.20.4", 765),
    ("1.20.5", 766),
    ("1.20.6", 766),
    ("1.21", 767),
    ("1.21.0", 767),
    ("1.21.1", 767),
    ("1.21.2", 768),
    ("1.21.3", 768),
    ("1.21.4", 769),
    ("1.21.5", 770),
    ("1.21.6", 771),
    ("1.21.7", 772),
    ("1.21.8", 772),
];

/// Look up the protocol number for a release name such as `"1.21.4"`.
#[must_use]
pub fn protocol_for_version(version: &str) -> Option<i32> {
    let version = version.trim();
    VERSIONS
        .iter()
        .find(|(name, _)| *name == version)
        .map(|(_, protocol)| *protocol)
}

/// An explicit non-zero `protocol` wins, then the table, then [`DEFAULT_PROTOCOL`].
#[must_use]
pub fn resolve_protocol(version: &str, protocol: i32) -> i32 {
    if protocol != 0 {
        return protocol;
    }
    protocol_for_version(version).unwrap_or(DEFAULT_PROTOCOL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_versions() {
        assert_eq!(protocol_for_version("1.18.2"), Some(758));
        assert_eq!(protocol_for_version("1.20.4"), Some(765));
        assert_eq!(protocol_for_version("1.21"), Some(767));
        assert_eq!(protocol_for_version(" 1.21.8 "), Some(772));
    }

    #[test]
    fn unknown_version() {
        assert_eq!(protocol_for_version("1.7.10"), None);
        assert_eq!(protocol_for_version("snapshot"), None);
    }

    #[test]
    fn resolve_prefers_override_then_table_then_default() {
        assert_eq!(resolve_protocol("1.21.8", 770), 770);
        assert_eq!(resolve_protocol("1.21.5", 0), 770);
        assert_eq!(resolve_protocol("nonsense", 0), DEFAULT_PROTOCOL);
    }
}
