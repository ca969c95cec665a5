use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Heuristic action assigned to a domain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Action {
    Allow,
    Block,
    CookieBlock,
    UserAllow,
    UserBlock,
    UserCookieBlock,
    Dnt,
    IgnoreDnt,
    Unknown(String),
}

impl Action {
    /// Whether the heuristic action blocks or cookie-blocks the domain.
    pub fn is_blocked(&self) -> bool {
        match self {
            Action::Block | Action::CookieBlock => true,
            Action::Allow
            | Action::UserAllow
            | Action::UserBlock
            | Action::UserCookieBlock
            | Action::Dnt
            | Action::IgnoreDnt
            | Action::Unknown(_) => false,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Allow => "allow",
            Action::Block => "block",
            Action::CookieBlock => "cookieblock",
            Action::UserAllow => "user_allow",
            Action::UserBlock => "user_block",
            Action::UserCookieBlock => "user_cookieblock",
            Action::Dnt => "dnt",
            Action::IgnoreDnt => "ignore_dnt",
            Action::Unknown(raw) => raw,
        }
    }
}

impl From<String> for Action {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "allow" => Action::Allow,
            "block" => Action::Block,
            "cookieblock" => Action::CookieBlock,
            "user_allow" => Action::UserAllow,
            "user_block" => Action::UserBlock,
            "user_cookieblock" => Action::UserCookieBlock,
            "dnt" => Action::Dnt,
            "ignore_dnt" => Action::IgnoreDnt,
            _ => Action::Unknown(raw),
        }
    }
}

impl From<&str> for Action {
    fn from(raw: &str) -> Self {
        Action::from(raw.to_string())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain to action, iterated in the order the source document listed them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionMap {
    entries: Vec<(String, Action)>,
    index: HashMap<String, usize>,
}

impl ActionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a domain's action. Replacing keeps the original position.
    pub fn insert(&mut self, domain: impl Into<String>, action: Action) {
        let domain = domain.into();
        match self.index.get(&domain) {
            Some(&pos) => self.entries[pos].1 = action,
            None => {
                self.index.insert(domain.clone(), self.entries.len());
                self.entries.push((domain, action));
            }
        }
    }

    pub fn get(&self, domain: &str) -> Option<&Action> {
        self.index.get(domain).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.index.contains_key(domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Action)> {
        self.entries.iter().map(|(d, a)| (d.as_str(), a))
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(d, _)| d.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<D: Into<String>> FromIterator<(D, Action)> for ActionMap {
    fn from_iter<I: IntoIterator<Item = (D, Action)>>(iter: I) -> Self {
        let mut map = ActionMap::new();
        for (domain, action) in iter {
            map.insert(domain, action);
        }
        map
    }
}

/// Tracker base domain to the first-party sites it was observed on.
pub type SnitchMap = BTreeMap<String, Vec<String>>;

/// Tracker base domain to technique name to detail, techniques in source order.
pub type TrackingMap = BTreeMap<String, Map<String, Value>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub action_map: ActionMap,
    pub snitch_map: SnitchMap,
    pub tracking_map: Option<TrackingMap>,
}

impl Snapshot {
    /// Sites a domain was observed on, sorted for display.
    pub fn sorted_sites(&self, domain: &str) -> Option<Vec<String>> {
        self.snitch_map.get(domain).map(|sites| {
            let mut sites = sites.clone();
            sites.sort();
            sites
        })
    }

    pub fn is_cookieblocked(&self, domain: &str) -> bool {
        matches!(self.action_map.get(domain), Some(Action::CookieBlock))
    }
}
