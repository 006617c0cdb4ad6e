use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::JobConfig;
use crate::error::{BuildLensError, Result};

use super::types::{BuildRecord, VersionedBuild};

/// A job's version-extraction rule, with its regex compiled up front.
///
/// An invalid regex is a configuration error at startup, never a silent miss
/// at extraction time.
#[derive(Debug)]
pub struct VersionRule {
    param: String,
    regex: Option<Regex>,
    exclude: Vec<String>,
}

impl VersionRule {
    pub fn from_config(job: &str, config: &JobConfig) -> Result<Self> {
        let regex = config
            .version_regex
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| {
                BuildLensError::Config(format!("invalid version-regex for job {job}: {e}"))
            })?;

        Ok(Self {
            param: config.version_param.clone(),
            regex,
            exclude: config.version_exclude.clone(),
        })
    }

    /// Derive the build's full version string, or decide it carries none.
    ///
    /// Absence is a deliberate `None`, not an error; plenty of builds
    /// (infrastructure jobs, quick failures) legitimately have no version.
    pub fn extract_version(&self, build: &BuildRecord) -> Option<String> {
        let value = build.parameters.get(&self.param)?;

        let version = match &self.regex {
            Some(regex) => regex.captures(value)?.get(1)?.as_str().to_string(),
            // Default: the part after the first colon, matching the
            // "registry/image:TAG" convention
            None => value.split_once(':')?.1.to_string(),
        };

        if self.exclude.iter().any(|excluded| excluded == &version) {
            return None;
        }

        Some(version)
    }

    /// Extract and annotate with the coerced version line.
    pub fn extract<'a>(&self, build: &'a BuildRecord) -> Option<VersionedBuild<'a>> {
        let version = self.extract_version(build)?;
        let line = coerce_line(&version)?;
        Some(VersionedBuild {
            version,
            line,
            record: build,
        })
    }
}

/// Coerce a full version string to its leading `major.minor.patch` line.
///
/// Mirrors npm semver coercion: the first run of up-to-three dot-separated
/// numeric components wins, missing components default to 0, and anything
/// after them (pre-release tags, build metadata) is dropped. Used for
/// bucketing only; the full string is kept for display.
pub fn coerce_line(version: &str) -> Option<String> {
    static COERCE: OnceLock<Regex> = OnceLock::new();
    let regex = COERCE.get_or_init(|| {
        Regex::new(r"(\d{1,16})(?:\.(\d{1,16}))?(?:\.(\d{1,16}))?").unwrap()
    });

    let caps = regex.captures(version)?;
    let component = |index: usize| {
        caps.get(index)
            .map_or(Some(0), |m| m.as_str().parse::<u64>().ok())
    };

    Some(format!(
        "{}.{}.{}",
        component(1)?,
        component(2)?,
        component(3)?
    ))
}

/// Compare two full version strings, numeric runs comparing numerically.
///
/// Plain string order would rank "4.9.0-99" above "4.9.0-100"; splitting into
/// digit and non-digit runs keeps build counters in the order people expect.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = chunks(a);
    let mut right = chunks(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(m), Ok(n)) => m.cmp(&n),
                    _ => x.cmp(y),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

fn chunks(version: &str) -> impl Iterator<Item = &str> + '_ {
    let mut rest = version;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let numeric = rest.starts_with(|c: char| c.is_ascii_digit());
        let end = rest
            .find(|c: char| c.is_ascii_digit() != numeric)
            .unwrap_or(rest.len());
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(chunk)
    })
}
