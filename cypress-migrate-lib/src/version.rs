/// Reports the major version of the installed test runner.
pub trait VersionProbe {
    /// `None` when the version can't be determined, e.g. the runner isn't installed.
    fn installed_version(&self) -> Option<u32>;
}

/// A probe that always reports the same answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedVersion(pub Option<u32>);

impl VersionProbe for FixedVersion {
    fn installed_version(&self) -> Option<u32> {
        self.0
    }
}

/// Parses the major component out of a semver string such as `9.7.0` or `^10.0.0-beta`.
pub fn major_version(version: &str) -> Option<u32> {
    version
        .trim()
        .trim_start_matches(|character: char| !character.is_ascii_digit())
        .split(|character: char| !character.is_ascii_digit())
        .next()
        .and_then(|major| major.parse().ok())
}
