use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::LoadError;
use crate::snapshot::{Action, ActionMap, SnitchMap, Snapshot, TrackingMap};

pub const OLD_LABEL: &str = "old snapshot";
pub const NEW_LABEL: &str = "new snapshot";

#[derive(Deserialize)]
struct ActionEntry {
    #[serde(rename = "heuristicAction")]
    heuristic_action: Action,
}

pub fn read_document(path: &Path) -> Result<Value, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Stand-in for a missing old snapshot.
pub fn empty_document() -> Value {
    json!({
        "action_map": {},
        "snitch_map": {},
    })
}

/// Loads and validates both snapshots. The old one defaults to empty.
pub fn load_snapshots(old: Option<&Path>, new: &Path) -> Result<(Snapshot, Snapshot), LoadError> {
    let start_time = Instant::now();
    info!(action = "start", component = "snapshot_loading", old_path = ?old, new_path = ?new, "Loading snapshots");

    let old_doc = match old {
        Some(path) => read_document(path)?,
        None => empty_document(),
    };
    let new_doc = read_document(new)?;

    let (old_snapshot, new_snapshot) = parse_documents(&old_doc, &new_doc)?;

    info!(
        action = "complete",
        component = "snapshot_loading",
        old_domains = old_snapshot.action_map.len(),
        new_domains = new_snapshot.action_map.len(),
        new_trackers = new_snapshot.snitch_map.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Snapshots loaded"
    );
    Ok((old_snapshot, new_snapshot))
}

/// Validates a pair of parsed documents and converts them into snapshots.
///
/// Equality is checked first so that comparing a snapshot with itself fails
/// before anything else is looked at.
pub fn parse_documents(old_doc: &Value, new_doc: &Value) -> Result<(Snapshot, Snapshot), LoadError> {
    if old_doc == new_doc {
        return Err(LoadError::IdenticalSnapshots);
    }

    let new_snapshot = parse_snapshot(new_doc, NEW_LABEL, true)?;
    if new_snapshot.snitch_map.is_empty() {
        return Err(LoadError::EmptyMap { map: "Snitch map" });
    }
    if new_snapshot.action_map.is_empty() {
        return Err(LoadError::EmptyMap { map: "Action map" });
    }

    let old_snapshot = parse_snapshot(old_doc, OLD_LABEL, false)?;
    Ok((old_snapshot, new_snapshot))
}

/// Converts one document. With `strict`, `action_map` and `snitch_map` must be present;
/// otherwise a missing map reads as empty.
///
/// Domain keys are lowercased in every map; later entries win when two keys
/// differ only in case.
pub fn parse_snapshot(doc: &Value, label: &'static str, strict: bool) -> Result<Snapshot, LoadError> {
    let root = doc.as_object().ok_or(LoadError::NotAnObject { label })?;

    let action_obj = required_object(root, label, "action_map", strict)?;
    let snitch_obj = required_object(root, label, "snitch_map", strict)?;

    let mut action_map = ActionMap::new();
    let mut unrecognized: BTreeMap<String, usize> = BTreeMap::new();
    if let Some(obj) = action_obj {
        for (domain, value) in obj {
            let entry = ActionEntry::deserialize(value).map_err(|e| LoadError::MalformedEntry {
                label,
                map: "action_map",
                key: domain.clone(),
                reason: e.to_string(),
            })?;
            if matches!(&entry.heuristic_action, Action::Unknown(raw) if !raw.is_empty()) {
                *unrecognized.entry(entry.heuristic_action.to_string()).or_default() += 1;
            }
            action_map.insert(domain.to_ascii_lowercase(), entry.heuristic_action);
        }
    }
    for (heuristic_action, domain_count) in &unrecognized {
        warn!(
            action = "parse",
            component = "snapshot_loading",
            snapshot = label,
            heuristic_action = %heuristic_action,
            domain_count = domain_count,
            "Unrecognized heuristic action, treating as not blocked"
        );
    }

    let mut snitch_map = SnitchMap::new();
    if let Some(obj) = snitch_obj {
        for (base, value) in obj {
            let sites = Vec::<String>::deserialize(value).map_err(|e| LoadError::MalformedEntry {
                label,
                map: "snitch_map",
                key: base.clone(),
                reason: e.to_string(),
            })?;
            snitch_map.insert(base.to_ascii_lowercase(), sites);
        }
    }

    let tracking_map = match root.get("tracking_map") {
        None => None,
        Some(value) => {
            let obj = value.as_object().ok_or(LoadError::MalformedEntry {
                label,
                map: "tracking_map",
                key: String::new(),
                reason: "expected an object".to_string(),
            })?;
            let mut tracking = TrackingMap::new();
            for (base, techniques) in obj {
                let techniques = techniques
                    .as_object()
                    .ok_or_else(|| LoadError::MalformedEntry {
                        label,
                        map: "tracking_map",
                        key: base.clone(),
                        reason: "expected an object of techniques".to_string(),
                    })?;
                tracking.insert(base.to_ascii_lowercase(), techniques.clone());
            }
            Some(tracking)
        }
    };

    Ok(Snapshot {
        action_map,
        snitch_map,
        tracking_map,
    })
}

fn required_object<'a>(
    root: &'a Map<String, Value>,
    label: &'static str,
    key: &'static str,
    strict: bool,
) -> Result<Option<&'a Map<String, Value>>, LoadError> {
    match root.get(key) {
        Some(Value::Object(obj)) => Ok(Some(obj)),
        Some(_) => Err(LoadError::MalformedEntry {
            label,
            map: key,
            key: String::new(),
            reason: "expected an object".to_string(),
        }),
        None if strict => Err(LoadError::MissingKey { label, key }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::diff_blocked;
    use crate::domain::DomainExtractor;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn new_doc() -> Value {
        json!({
            "action_map": {
                "z.tracker.com": {"heuristicAction": "block"},
                "a.tracker.com": {"heuristicAction": "cookieblock", "dnt": false},
                "cdn.other.net": {"heuristicAction": ""}
            },
            "snitch_map": {
                "tracker.com": ["site1.com", "site2.org"]
            },
            "tracking_map": {
                "tracker.com": {"canvas": {}, "supercookie": {}}
            }
        })
    }

    #[test]
    fn test_parse_new_snapshot() {
        let (old, new) = parse_documents(&empty_document(), &new_doc()).unwrap();

        assert!(old.action_map.is_empty());
        assert!(old.snitch_map.is_empty());
        assert!(old.tracking_map.is_none());

        let domains: Vec<&str> = new.action_map.domains().collect();
        assert_eq!(domains, vec!["z.tracker.com", "a.tracker.com", "cdn.other.net"]);
        assert_eq!(new.action_map.get("a.tracker.com"), Some(&Action::CookieBlock));
        assert_eq!(
            new.action_map.get("cdn.other.net"),
            Some(&Action::Unknown(String::new()))
        );
        assert_eq!(new.snitch_map["tracker.com"], vec!["site1.com", "site2.org"]);

        let techniques: Vec<&String> = new.tracking_map.as_ref().unwrap()["tracker.com"]
            .keys()
            .collect();
        assert_eq!(techniques, vec!["canvas", "supercookie"]);
    }

    #[test]
    fn test_mixed_case_keys_are_lowercased() {
        let doc = json!({
            "action_map": {
                "CDN.Tracker.COM": {"heuristicAction": "cookieblock"},
                "Tracker.com": {"heuristicAction": "block"}
            },
            "snitch_map": {"Tracker.COM": ["Site.org"]},
            "tracking_map": {"TRACKER.com": {"canvas": {}}}
        });
        let (_, new) = parse_documents(&empty_document(), &doc).unwrap();

        let domains: Vec<&str> = new.action_map.domains().collect();
        assert_eq!(domains, vec!["cdn.tracker.com", "tracker.com"]);
        assert_eq!(new.snitch_map["tracker.com"], vec!["Site.org"]);
        assert!(new.tracking_map.unwrap().contains_key("tracker.com"));
    }

    #[test]
    fn test_mixed_case_cookieblocked_base_keeps_marker() {
        let doc = json!({
            "action_map": {"Tracker.COM": {"heuristicAction": "cookieblock"}},
            "snitch_map": {"tracker.com": ["site.org"]}
        });
        let (old, new) = parse_documents(&empty_document(), &doc).unwrap();

        let diff = diff_blocked(&old, &new, &DomainExtractor::new());
        assert_eq!(diff.newly_blocked.len(), 1);
        assert_eq!(diff.newly_blocked[0].base, "tracker.com");
        assert!(diff.newly_blocked[0].cookieblocked);
    }

    #[test]
    fn test_unrecognized_actions_are_kept() {
        let doc = json!({
            "action_map": {
                "a.com": {"heuristicAction": "quarantine"},
                "b.com": {"heuristicAction": "quarantine"}
            },
            "snitch_map": {"a.com": ["b.com"]}
        });
        let (_, new) = parse_documents(&empty_document(), &doc).unwrap();
        assert_eq!(new.action_map.get("b.com"), Some(&Action::from("quarantine")));
        assert!(!new.action_map.get("a.com").unwrap().is_blocked());
    }

    #[test]
    fn test_identical_documents_rejected() {
        let err = parse_documents(&new_doc(), &new_doc()).unwrap_err();
        assert!(matches!(err, LoadError::IdenticalSnapshots));
    }

    #[test]
    fn test_identical_empty_documents_rejected_before_key_checks() {
        let err = parse_documents(&empty_document(), &empty_document()).unwrap_err();
        assert!(matches!(err, LoadError::IdenticalSnapshots));
    }

    #[test]
    fn test_missing_key_rejected() {
        let doc = json!({"action_map": {"a.com": {"heuristicAction": "block"}}});
        let err = parse_documents(&empty_document(), &doc).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingKey {
                key: "snitch_map",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_maps_rejected() {
        let doc = json!({"action_map": {"a.com": {"heuristicAction": "block"}}, "snitch_map": {}});
        let err = parse_documents(&empty_document(), &doc).unwrap_err();
        assert!(matches!(err, LoadError::EmptyMap { map: "Snitch map" }));

        let doc = json!({"action_map": {}, "snitch_map": {"a.com": ["b.com"]}});
        let err = parse_documents(&empty_document(), &doc).unwrap_err();
        assert!(matches!(err, LoadError::EmptyMap { map: "Action map" }));
    }

    #[test]
    fn test_malformed_action_entry_rejected() {
        let doc = json!({
            "action_map": {"a.com": {"dnt": true}},
            "snitch_map": {"a.com": ["b.com"]}
        });
        let err = parse_documents(&empty_document(), &doc).unwrap_err();
        match err {
            LoadError::MalformedEntry { map, key, .. } => {
                assert_eq!(map, "action_map");
                assert_eq!(key, "a.com");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_old_snapshot_may_omit_maps() {
        let old = json!({"action_map": {"a.com": {"heuristicAction": "block"}}});
        let (old, _) = parse_documents(&old, &new_doc()).unwrap();
        assert_eq!(old.action_map.len(), 1);
        assert!(old.snitch_map.is_empty());
    }

    #[test]
    fn test_load_snapshots_from_files() {
        let mut old_file = NamedTempFile::new().unwrap();
        write!(
            old_file,
            r#"{{"action_map": {{"a.tracker.com": {{"heuristicAction": "block"}}}}, "snitch_map": {{}}}}"#
        )
        .unwrap();
        let mut new_file = NamedTempFile::new().unwrap();
        write!(new_file, "{}", new_doc()).unwrap();

        let (old, new) = load_snapshots(Some(old_file.path()), new_file.path()).unwrap();
        assert_eq!(old.action_map.len(), 1);
        assert_eq!(new.action_map.len(), 3);
    }

    #[test]
    fn test_unreadable_file() {
        let err = load_snapshots(None, Path::new("/nonexistent/new.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));

        let mut bad = NamedTempFile::new().unwrap();
        write!(bad, "{{not json").unwrap();
        let err = load_snapshots(None, bad.path()).unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }));
    }
}
