//! Engagement target discovery.
//!
//! Merges the configured seed list with keyword-search discovery, resolves
//! platform account ids lazily (caching them back onto the record), and
//! orders the result by category priority with shuffled ties.

use crate::collab::SocialDiscovery;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Results requested per discovery keyword.
const DISCOVERY_LIMIT: usize = 3;

/// Category tiers, best first; unknown categories sort last.
pub const CATEGORY_PRIORITY: &[&str] = &[
    "micro_influencer",
    "lifestyle",
    "photographer",
    "cafe",
    "mall",
    "discovery",
];

/// Keywords fed to account discovery.
pub const DISCOVERY_KEYWORDS: &[&str] = &[
    "seoul cafe",
    "seoul photographer",
    "quiet seoul",
    "seongsu studio",
    "hannam-dong",
];

/// A commenting target: seed-configured or discovered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub username: Option<String>,
    /// Lazily resolved platform id, cached once known.
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl Target {
    fn priority(&self) -> usize {
        self.category
            .as_deref()
            .and_then(|c| CATEGORY_PRIORITY.iter().position(|p| *p == c))
            .unwrap_or(CATEGORY_PRIORITY.len())
    }

    fn usable(&self) -> bool {
        self.username.is_some() || self.account_id.is_some()
    }
}

/// Load the seed target list; missing or corrupt files yield no seeds.
pub async fn load_seed_targets(path: &Path) -> Vec<Target> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(targets) => targets,
            Err(err) => {
                warn!(path = %path.display(), %err, "could not decode seed targets");
                Vec::new()
            }
        },
        Err(_) => Vec::new(),
    }
}

/// Build the prioritized, shuffled target list for one engagement cycle.
pub async fn discover_targets(
    seeds_path: &Path,
    discovery: &dyn SocialDiscovery,
    rng: &mut (impl Rng + Send),
) -> Vec<Target> {
    let mut seeds = load_seed_targets(seeds_path).await;

    for seed in &mut seeds {
        if seed.account_id.is_none() {
            if let Some(username) = seed.username.clone() {
                match discovery.resolve_account(&username).await {
                    Ok(Some(id)) => seed.account_id = Some(id),
                    Ok(None) => debug!(%username, "business discovery returned no id"),
                    Err(err) => debug!(%username, %err, "business discovery failed"),
                }
            }
        }
    }

    let mut discovered: Vec<Target> = Vec::new();
    for keyword in DISCOVERY_KEYWORDS {
        match discovery.search_accounts(keyword, DISCOVERY_LIMIT).await {
            Ok(accounts) => {
                for account in accounts {
                    discovered.push(Target {
                        username: account.username,
                        account_id: account.account_id,
                        category: Some("discovery".to_string()),
                        source: Some((*keyword).to_string()),
                    });
                }
            }
            Err(err) => debug!(%keyword, %err, "keyword discovery failed"),
        }
    }

    let mut combined: Vec<Target> = seeds
        .into_iter()
        .chain(discovered)
        .filter(Target::usable)
        .collect();

    sort_with_shuffled_ties(&mut combined, rng);
    combined
}

/// Stable-sort by category priority, then shuffle inside each equal
/// priority run so same-tier targets are not hit in a fixed order.
fn sort_with_shuffled_ties(targets: &mut [Target], rng: &mut impl Rng) {
    targets.sort_by_key(Target::priority);

    let mut start = 0;
    while start < targets.len() {
        let priority = targets[start].priority();
        let mut end = start + 1;
        while end < targets.len() && targets[end].priority() == priority {
            end += 1;
        }
        targets[start..end].shuffle(rng);
        start = end;
    }
}
