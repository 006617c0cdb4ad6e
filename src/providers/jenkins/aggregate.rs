use std::cmp::Reverse;

use indexmap::IndexMap;

use super::types::BuildRecord;
use super::version::{compare_versions, VersionRule};

/// Per-job partial result: version line -> full version -> build id -> build.
///
/// `IndexMap` keeps insertion order so ties in later sorts stay deterministic.
pub type VersionMap<'a> = IndexMap<String, IndexMap<String, IndexMap<String, &'a BuildRecord>>>;

/// Bucket one job's builds by version line and full version string.
///
/// Unversioned builds are dropped here; with an active version filter, so is
/// anything whose full version does not start with the filter prefix.
pub fn bucket<'a>(
    builds: &'a [BuildRecord],
    rule: &VersionRule,
    version_filter: Option<&str>,
) -> VersionMap<'a> {
    let mut map = VersionMap::new();

    for build in builds {
        let Some(versioned) = rule.extract(build) else {
            continue;
        };
        if let Some(prefix) = version_filter {
            if !versioned.version.starts_with(prefix) {
                continue;
            }
        }
        map.entry(versioned.line)
            .or_default()
            .entry(versioned.version)
            .or_default()
            .insert(versioned.record.id(), versioned.record);
    }

    map
}

/// Merge per-job version maps into one ordered full-version -> builds mapping.
///
/// Build sets union at the leaf, so two jobs contributing to the same full
/// version both appear and duplicate build ids collapse to one entry. Within
/// each version line the full-version keys sort descending by
/// [`compare_versions`] and, when `max_dev_builds > 0`, only the greatest
/// `max_dev_builds` survive. An active version filter disables truncation:
/// capping would hide versions the caller explicitly asked for.
///
/// Output key order is by each version's most recent build, newest first --
/// activity order, not version-number order. Builds within a version are
/// newest-first by timestamp, ties keeping their original relative order.
pub fn merge<'a>(
    maps: Vec<VersionMap<'a>>,
    max_dev_builds: usize,
    filter_active: bool,
) -> IndexMap<String, Vec<&'a BuildRecord>> {
    let mut combined = VersionMap::new();
    for map in maps {
        for (line, versions) in map {
            let line_entry = combined.entry(line).or_default();
            for (version, builds) in versions {
                let version_entry = line_entry.entry(version).or_default();
                for (id, build) in builds {
                    version_entry.insert(id, build);
                }
            }
        }
    }

    let mut flattened: Vec<(String, Vec<&BuildRecord>)> = Vec::new();
    for (_line, versions) in combined {
        let mut keys: Vec<&String> = versions.keys().collect();
        keys.sort_unstable_by(|a, b| compare_versions(b, a));
        if max_dev_builds > 0 && !filter_active {
            keys.truncate(max_dev_builds);
        }

        for key in keys {
            let mut builds: Vec<&BuildRecord> = versions[key].values().copied().collect();
            builds.sort_by_key(|build| Reverse(build.timestamp));
            flattened.push((key.clone(), builds));
        }
    }

    flattened.sort_by_key(|(_, builds)| {
        Reverse(builds.first().map_or(i64::MIN, |build| build.timestamp))
    });

    flattened.into_iter().collect()
}
