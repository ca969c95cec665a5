use serde_json::Value;
use std::time::Instant;
use tracing::info;

use crate::domain::DomainExtractor;
use crate::snapshot::{Action, ActionMap, TrackingMap};

const CANVAS_MARKER: &str = "canvas";

/// An entry counts when its name mentions canvas, or when its detail holds
/// the marker: a substring of a string, an element of a list (site ->
/// ["canvas"] layouts), or a key of an object.
fn is_canvas_entry(name: &str, detail: &Value) -> bool {
    if name.contains(CANVAS_MARKER) {
        return true;
    }
    match detail {
        Value::String(s) => s.contains(CANVAS_MARKER),
        Value::Array(items) => items.iter().any(|item| item.as_str() == Some(CANVAS_MARKER)),
        Value::Object(fields) => fields.contains_key(CANVAS_MARKER),
        _ => false,
    }
}

/// A cookie-blocked domain whose base was caught using canvas techniques.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasFinding {
    pub domain: String,
    pub base: String,
    /// Every technique recorded for the base, in source order.
    pub techniques: Vec<String>,
}

/// Returns `None` when there is no tracking map to cross-reference.
pub fn find_canvas_fingerprinters(
    actions: &ActionMap,
    tracking: Option<&TrackingMap>,
    extractor: &DomainExtractor,
) -> Option<Vec<CanvasFinding>> {
    let tracking = tracking?;
    let start_time = Instant::now();

    let mut findings = Vec::new();
    for (domain, action) in actions.iter() {
        if *action != Action::CookieBlock {
            continue;
        }

        let base = extractor.registrable_or_self(domain);
        let Some(techniques) = tracking.get(&base) else {
            continue;
        };
        if techniques.iter().any(|(name, detail)| is_canvas_entry(name, detail)) {
            findings.push(CanvasFinding {
                domain: domain.to_string(),
                base,
                techniques: techniques.keys().cloned().collect(),
            });
        }
    }

    info!(
        action = "complete",
        component = "canvas_crossref",
        finding_count = findings.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Canvas cross-reference completed"
    );
    Some(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn techniques(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_cookieblocked_canvas_domain_reported() {
        let extractor = DomainExtractor::new();
        let actions: ActionMap = [("x.example.com", Action::CookieBlock)].into_iter().collect();
        let mut tracking = TrackingMap::new();
        tracking.insert(
            "example.com".to_string(),
            techniques(json!({"canvas font": {"hits": 2}})),
        );

        let findings = find_canvas_fingerprinters(&actions, Some(&tracking), &extractor).unwrap();
        assert_eq!(
            findings,
            vec![CanvasFinding {
                domain: "x.example.com".to_string(),
                base: "example.com".to_string(),
                techniques: vec!["canvas font".to_string()],
            }]
        );
    }

    #[test]
    fn test_only_cookieblocked_domains_considered() {
        let extractor = DomainExtractor::new();
        let actions: ActionMap = [
            ("blocked.fp.net", Action::Block),
            ("allowed.fp.net", Action::Allow),
            ("cb.fp.net", Action::CookieBlock),
        ]
        .into_iter()
        .collect();
        let mut tracking = TrackingMap::new();
        tracking.insert(
            "fp.net".to_string(),
            techniques(json!({"supercookie": true, "canvas": {}})),
        );

        let findings = find_canvas_fingerprinters(&actions, Some(&tracking), &extractor).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].domain, "cb.fp.net");
        assert_eq!(findings[0].techniques, vec!["supercookie", "canvas"]);
    }

    #[test]
    fn test_non_canvas_techniques_ignored() {
        let extractor = DomainExtractor::new();
        let actions: ActionMap = [("a.tracker.com", Action::CookieBlock)].into_iter().collect();
        let mut tracking = TrackingMap::new();
        tracking.insert("tracker.com".to_string(), techniques(json!({"supercookie": {}})));

        let findings = find_canvas_fingerprinters(&actions, Some(&tracking), &extractor).unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_findings_follow_action_map_order() {
        let extractor = DomainExtractor::new();
        let actions: ActionMap = [
            ("z.fp.net", Action::CookieBlock),
            ("a.fp.net", Action::CookieBlock),
        ]
        .into_iter()
        .collect();
        let mut tracking = TrackingMap::new();
        tracking.insert("fp.net".to_string(), techniques(json!({"canvas": {}})));

        let findings = find_canvas_fingerprinters(&actions, Some(&tracking), &extractor).unwrap();
        let domains: Vec<&str> = findings.iter().map(|f| f.domain.as_str()).collect();
        assert_eq!(domains, vec!["z.fp.net", "a.fp.net"]);
    }

    #[test]
    fn test_canvas_in_detail_list() {
        let extractor = DomainExtractor::new();
        let actions: ActionMap = [("pixel.fp.org", Action::CookieBlock)].into_iter().collect();
        let mut tracking = TrackingMap::new();
        tracking.insert(
            "fp.org".to_string(),
            techniques(json!({"news.example": ["canvas"], "shop.example": []})),
        );

        let findings = find_canvas_fingerprinters(&actions, Some(&tracking), &extractor).unwrap();
        assert_eq!(findings[0].techniques, vec!["news.example", "shop.example"]);
    }

    #[test]
    fn test_canvas_detail_membership() {
        assert!(is_canvas_entry("plain", &json!({"canvas": true})));
        assert!(is_canvas_entry("plain", &json!("uses canvas fonts")));
        assert!(is_canvas_entry("plain", &json!(["font", "canvas"])));

        // list and object details match whole elements and keys only
        assert!(!is_canvas_entry("plain", &json!(["canvas-like"])));
        assert!(!is_canvas_entry("plain", &json!({"canvas font": 1, "other": "canvas"})));
        assert!(!is_canvas_entry("plain", &json!([{"canvas": true}])));
        assert!(!is_canvas_entry("plain", &json!(true)));
    }

    #[test]
    fn test_cookieblocked_domain_with_canvas_keyed_detail() {
        let extractor = DomainExtractor::new();
        let actions: ActionMap = [("cdn.fp.io", Action::CookieBlock)].into_iter().collect();
        let mut tracking = TrackingMap::new();
        tracking.insert(
            "fp.io".to_string(),
            techniques(json!({"news.example": {"canvas": true}})),
        );

        let findings = find_canvas_fingerprinters(&actions, Some(&tracking), &extractor).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].base, "fp.io");
    }

    #[test]
    fn test_missing_tracking_map_skips_stage() {
        let extractor = DomainExtractor::new();
        let actions: ActionMap = [("x.example.com", Action::CookieBlock)].into_iter().collect();
        assert!(find_canvas_fingerprinters(&actions, None, &extractor).is_none());
    }
}
