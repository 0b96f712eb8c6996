//! Hazard category catalogue: display names and the feed path that
//! publishes each granular category.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Upstream feed path segments (`{base}/{path}/open`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedPath {
    Incident,
    Roadwork,
    Fire,
    Flood,
    MajorEvent,
    Alpine,
}

impl FeedPath {
    pub const ALL: [FeedPath; 6] = [
        FeedPath::Incident,
        FeedPath::Roadwork,
        FeedPath::Fire,
        FeedPath::Flood,
        FeedPath::MajorEvent,
        FeedPath::Alpine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedPath::Incident => "incident",
            FeedPath::Roadwork => "roadwork",
            FeedPath::Fire => "fire",
            FeedPath::Flood => "flood",
            FeedPath::MajorEvent => "majorevent",
            FeedPath::Alpine => "alpine",
        }
    }
}

impl std::fmt::Display for FeedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

struct CategoryInfo {
    key: &'static str,
    display_name: &'static str,
    feed_path: FeedPath,
}

const CATALOGUE: &[CategoryInfo] = &[
    CategoryInfo { key: "accident", display_name: "Accidents", feed_path: FeedPath::Incident },
    CategoryInfo { key: "breakdown", display_name: "Breakdowns", feed_path: FeedPath::Incident },
    CategoryInfo { key: "hazard", display_name: "General Hazards", feed_path: FeedPath::Incident },
    CategoryInfo { key: "heavy_vehicle", display_name: "Heavy Vehicle Issues", feed_path: FeedPath::Incident },
    CategoryInfo { key: "diversion", display_name: "Diversions", feed_path: FeedPath::Incident },
    CategoryInfo {
        key: "changedtrafficconditions",
        display_name: "Changed Traffic Conditions",
        feed_path: FeedPath::Incident,
    },
    CategoryInfo { key: "roadwork", display_name: "Roadworks", feed_path: FeedPath::Roadwork },
    CategoryInfo { key: "fire", display_name: "Fires", feed_path: FeedPath::Fire },
    CategoryInfo { key: "flooding", display_name: "Flooding", feed_path: FeedPath::Flood },
    CategoryInfo { key: "special_event", display_name: "Special Events", feed_path: FeedPath::MajorEvent },
    CategoryInfo { key: "alpine", display_name: "Alpine Conditions", feed_path: FeedPath::Alpine },
    CategoryInfo { key: "incident", display_name: "Incidents", feed_path: FeedPath::Incident },
    CategoryInfo { key: "majorevent", display_name: "Major Events", feed_path: FeedPath::MajorEvent },
];

/// Categories monitored when the configuration does not name any.
pub const DEFAULT_MONITORED_CATEGORIES: &[&str] = &[
    "accident",
    "breakdown",
    "hazard",
    "heavy_vehicle",
    "roadwork",
    "fire",
    "flooding",
];

/// Attribution carried on every summary.
pub const ATTRIBUTION: &str = "Data provided by Transport for NSW";

fn lookup(category: &str) -> Option<&'static CategoryInfo> {
    let key = category.trim().to_lowercase();
    CATALOGUE.iter().find(|c| c.key == key)
}

/// Human-readable name for a category. Unknown categories are title-cased.
pub fn display_name(category: &str) -> String {
    match lookup(category) {
        Some(info) => info.display_name.to_string(),
        None => title_case(category),
    }
}

/// The feed path that publishes `category`. Unknown categories come from the
/// incident feed.
pub fn feed_path_for(category: &str) -> FeedPath {
    lookup(category)
        .map(|info| info.feed_path)
        .unwrap_or(FeedPath::Incident)
}

/// Distinct feed paths needed to cover every category in `categories`.
pub fn feed_paths_for<'a>(categories: impl IntoIterator<Item = &'a String>) -> BTreeSet<FeedPath> {
    categories.into_iter().map(|c| feed_path_for(c)).collect()
}

/// Summary entity name, e.g. `Nearby Accidents Hazards`.
pub fn summary_name(category: &str) -> String {
    format!("Nearby {} Hazards", display_name(category))
}

fn title_case(raw: &str) -> String {
    raw.trim()
        .split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
