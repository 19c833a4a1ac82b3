//! Scored fuzzy search over the index snapshot.
//!
//! Searching never re-reads workflow files: all matching runs against the
//! snapshot's titles, tags, and `search_text`. Filters (identity path,
//! mine/shared scope, required tags) apply before scoring; a filtered-out
//! entry contributes nothing. Scoring is additive per the tier table below;
//! results come back sorted by score descending, ties keeping input order.

use gitsavvy_types::{Config, IndexEntry, IndexSnapshot};

/// Which part of the entry produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    Title,
    Tags,
    Content,
}

/// Filters and knobs for [`fuzzy_search`].
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Query text; empty returns every filtered entry at score 1.0.
    pub query: String,
    /// Exact identity-path match (path minus roots and slug).
    pub identity_path: Option<String>,
    /// Keep only entries outside the shared root.
    pub mine: bool,
    /// Keep only entries under the shared root.
    pub shared: bool,
    /// Require every tag, case-insensitive with trimmed whitespace.
    pub tags: Vec<String>,
    /// Truncate the tail when greater than zero.
    pub max_results: usize,
}

/// One ranked search result.
#[derive(Debug, Clone)]
pub struct SearchMatch {
    /// The matching index entry.
    pub entry: IndexEntry,
    /// Additive score; higher ranks earlier.
    pub score: f64,
    /// Fields that contributed to the match.
    pub matches: Vec<MatchField>,
}

/// Case-insensitive substring search over `search_text`; an empty query
/// returns every entry.
pub fn plain_search<'a>(snapshot: &'a IndexSnapshot, query: &str) -> Vec<&'a IndexEntry> {
    let needle = query.trim().to_lowercase();
    snapshot
        .workflows
        .iter()
        .filter(|entry| needle.is_empty() || entry.search_text.contains(&needle))
        .collect()
}

/// Ranked fuzzy search with filters.
pub fn fuzzy_search(snapshot: &IndexSnapshot, filters: &SearchFilters, config: &Config) -> Vec<SearchMatch> {
    let query = filters.query.trim().to_lowercase();
    let wanted_tags: Vec<String> = filters.tags.iter().map(|tag| tag.trim().to_lowercase()).collect();

    let mut results = Vec::new();
    for entry in &snapshot.workflows {
        if !passes_filters(entry, filters, &wanted_tags, config) {
            continue;
        }
        if query.is_empty() {
            results.push(SearchMatch {
                entry: entry.clone(),
                score: 1.0,
                matches: Vec::new(),
            });
            continue;
        }
        let (score, matches) = score_entry(entry, &query);
        results.push(SearchMatch {
            entry: entry.clone(),
            score,
            matches,
        });
    }

    // Stable sort keeps input order on ties.
    results.sort_by(|left, right| right.score.partial_cmp(&left.score).unwrap_or(std::cmp::Ordering::Equal));

    if filters.max_results > 0 && results.len() > filters.max_results {
        results.truncate(filters.max_results);
    }
    results
}

fn passes_filters(entry: &IndexEntry, filters: &SearchFilters, wanted_tags: &[String], config: &Config) -> bool {
    let shared = entry_is_shared(entry, config);
    if filters.mine && shared {
        return false;
    }
    if filters.shared && !shared {
        return false;
    }

    if let Some(wanted_identity) = &filters.identity_path {
        if entry_identity(entry, config) != wanted_identity.trim_matches('/') {
            return false;
        }
    }

    if !wanted_tags.is_empty() {
        let entry_tags: Vec<String> = entry.tags.iter().map(|tag| tag.trim().to_lowercase()).collect();
        if !wanted_tags.iter().all(|wanted| entry_tags.iter().any(|tag| tag == wanted)) {
            return false;
        }
    }
    true
}

fn entry_is_shared(entry: &IndexEntry, config: &Config) -> bool {
    entry.path.starts_with(&format!("{}/", config.workflows.shared_root))
}

/// Reconstruct the identity segment: the entry path minus the leading
/// workflows root and the trailing `/<slug>/workflow.yaml`.
fn entry_identity(entry: &IndexEntry, config: &Config) -> String {
    let mut segments: Vec<&str> = entry.path.split('/').collect();
    if segments.len() < 2 {
        return String::new();
    }
    segments.pop(); // workflow.yaml
    segments.pop(); // slug
    if segments.first() == Some(&config.workflows.root.as_str()) {
        segments.remove(0);
    }
    segments.join("/")
}

/// Score one entry against a lowercase query.
///
/// | Condition                                   | Δscore | Match tag |
/// |---------------------------------------------|--------|-----------|
/// | title == query                              | +100   | title     |
/// | query substring of title (not equal)        | +50    | title     |
/// | title starts with query                     | +30    | —         |
/// | title has query at a word boundary          | +20    | —         |
/// | query fuzzy-subsequence of title, no substr | +15    | title     |
/// | query substring of search_text              | +10    | content   |
/// | some tag == query                           | +25    | tags      |
/// | query substring of some tag                 | +15    | tags      |
/// | query fuzzy-subsequence of some tag         | +8     | tags      |
fn score_entry(entry: &IndexEntry, query: &str) -> (f64, Vec<MatchField>) {
    let title = entry.title.to_lowercase();
    let mut score = 0.0;
    let mut matches = Vec::new();

    if title == query {
        score += 100.0;
        matches.push(MatchField::Title);
    } else if title.contains(query) {
        score += 50.0;
        matches.push(MatchField::Title);
    }
    if title.starts_with(query) {
        score += 30.0;
    }
    if title.contains(&format!(" {query}")) || title.contains(&format!("{query} ")) {
        score += 20.0;
    }
    if !title.contains(query) && is_fuzzy_subsequence(query, &title) {
        score += 15.0;
        matches.push(MatchField::Title);
    }

    if entry.search_text.contains(query) {
        score += 10.0;
        matches.push(MatchField::Content);
    }

    let tags: Vec<String> = entry.tags.iter().map(|tag| tag.trim().to_lowercase()).collect();
    let mut tag_matched = false;
    if tags.iter().any(|tag| tag == query) {
        score += 25.0;
        tag_matched = true;
    }
    if tags.iter().any(|tag| tag.contains(query)) {
        score += 15.0;
        tag_matched = true;
    }
    if tags.iter().any(|tag| is_fuzzy_subsequence(query, tag)) {
        score += 8.0;
        tag_matched = true;
    }
    if tag_matched {
        matches.push(MatchField::Tags);
    }

    (score, matches)
}

/// All characters of `needle` appear in `hay` in order. Single-character
/// needles degrade to a substring check.
fn is_fuzzy_subsequence(needle: &str, hay: &str) -> bool {
    if needle.chars().count() <= 1 {
        return hay.contains(needle);
    }
    let mut hay_characters = hay.chars();
    for needle_character in needle.chars() {
        if !hay_characters.any(|hay_character| hay_character == needle_character) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gitsavvy_types::{INDEX_SCHEMA_VERSION, IndexSnapshot};

    fn entry(title: &str, path: &str, tags: &[&str]) -> IndexEntry {
        IndexEntry {
            id: path.trim_end_matches("/workflow.yaml").to_string(),
            title: title.to_string(),
            path: path.to_string(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            updated_at: Utc::now(),
            search_text: format!("{} {}", title.to_lowercase(), tags.join(" ").to_lowercase()),
        }
    }

    fn snapshot(entries: Vec<IndexEntry>) -> IndexSnapshot {
        IndexSnapshot {
            version: INDEX_SCHEMA_VERSION,
            updated_at: Utc::now(),
            workflows: entries,
        }
    }

    #[test]
    fn subsequence_matching() {
        assert!(is_fuzzy_subsequence("tw", "test workflow"));
        assert!(!is_fuzzy_subsequence("tw", "workflow"));
        assert!(is_fuzzy_subsequence("wkf", "workflow"));
        // Single characters degrade to substring.
        assert!(is_fuzzy_subsequence("w", "workflow"));
        assert!(!is_fuzzy_subsequence("z", "workflow"));
    }

    #[test]
    fn exact_title_ranks_first() {
        let snapshot = snapshot(vec![
            entry("deploy staging", "workflows/a/deploy-staging/workflow.yaml", &[]),
            entry("deploy", "workflows/a/deploy/workflow.yaml", &[]),
        ]);
        let results = fuzzy_search(
            &snapshot,
            &SearchFilters {
                query: "deploy".into(),
                ..SearchFilters::default()
            },
            &Config::default(),
        );
        assert_eq!(results[0].entry.title, "deploy");
        assert!(results[0].score > results[1].score);
        assert!(results[0].matches.contains(&MatchField::Title));
    }

    #[test]
    fn fuzzy_and_word_boundary_order() {
        // Query `tw` ranks `test workflow` over `workflow` over `another`;
        // the last two tie at zero and keep input order.
        let snapshot = snapshot(vec![
            entry("test workflow", "workflows/a/test-workflow/workflow.yaml", &[]),
            entry("workflow", "workflows/a/workflow/workflow.yaml", &[]),
            entry("another", "workflows/a/another/workflow.yaml", &[]),
        ]);
        let results = fuzzy_search(
            &snapshot,
            &SearchFilters {
                query: "tw".into(),
                ..SearchFilters::default()
            },
            &Config::default(),
        );
        let titles: Vec<&str> = results.iter().map(|result| result.entry.title.as_str()).collect();
        assert_eq!(titles, vec!["test workflow", "workflow", "another"]);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn empty_query_returns_everything_at_one() {
        let snapshot = snapshot(vec![
            entry("a", "workflows/x/a/workflow.yaml", &[]),
            entry("b", "shared/b/workflow.yaml", &[]),
        ]);
        let results = fuzzy_search(&snapshot, &SearchFilters::default(), &Config::default());
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|result| (result.score - 1.0).abs() < f64::EPSILON));
    }

    #[test]
    fn scope_filters_split_mine_and_shared() {
        let snapshot = snapshot(vec![
            entry("mine", "workflows/alice/mine/workflow.yaml", &[]),
            entry("ours", "shared/ours/workflow.yaml", &[]),
        ]);
        let config = Config::default();

        let mine = fuzzy_search(
            &snapshot,
            &SearchFilters {
                mine: true,
                ..SearchFilters::default()
            },
            &config,
        );
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].entry.title, "mine");

        let shared = fuzzy_search(
            &snapshot,
            &SearchFilters {
                shared: true,
                ..SearchFilters::default()
            },
            &config,
        );
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].entry.title, "ours");
    }

    #[test]
    fn identity_filter_is_exact() {
        let snapshot = snapshot(vec![
            entry("one", "workflows/platform/alice/one/workflow.yaml", &[]),
            entry("two", "workflows/platform/bob/two/workflow.yaml", &[]),
        ]);
        let results = fuzzy_search(
            &snapshot,
            &SearchFilters {
                identity_path: Some("platform/alice".into()),
                ..SearchFilters::default()
            },
            &Config::default(),
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry.title, "one");
    }

    #[test]
    fn tag_filters_are_anded_and_case_insensitive() {
        let snapshot = snapshot(vec![
            entry("both", "workflows/a/both/workflow.yaml", &["Deploy", "k8s"]),
            entry("one", "workflows/a/one/workflow.yaml", &["deploy"]),
        ]);
        let results = fuzzy_search(
            &snapshot,
            &SearchFilters {
                tags: vec![" deploy ".into(), "K8S".into()],
                ..SearchFilters::default()
            },
            &Config::default(),
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry.title, "both");
    }

    #[test]
    fn tag_score_tiers_apply_once() {
        let snapshot = snapshot(vec![entry(
            "x",
            "workflows/a/x/workflow.yaml",
            &["deploy", "deployment", "redeploy"],
        )]);
        let results = fuzzy_search(
            &snapshot,
            &SearchFilters {
                query: "deploy".into(),
                ..SearchFilters::default()
            },
            &Config::default(),
        );
        // 25 (exact) + 15 (substring) + 8 (subsequence) + 10 (content), each tier once.
        assert!((results[0].score - 58.0).abs() < f64::EPSILON);
        assert!(results[0].matches.contains(&MatchField::Tags));
    }

    #[test]
    fn max_results_truncates_tail() {
        let snapshot = snapshot(
            (0..10)
                .map(|index| entry(&format!("wf {index}"), &format!("workflows/a/wf-{index}/workflow.yaml"), &[]))
                .collect(),
        );
        let results = fuzzy_search(
            &snapshot,
            &SearchFilters {
                query: "wf".into(),
                max_results: 3,
                ..SearchFilters::default()
            },
            &Config::default(),
        );
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn plain_search_is_substring_over_search_text() {
        let snapshot = snapshot(vec![
            entry("Deploy", "workflows/a/deploy/workflow.yaml", &["k8s"]),
            entry("Cleanup", "workflows/a/cleanup/workflow.yaml", &[]),
        ]);
        assert_eq!(plain_search(&snapshot, "K8S").len(), 1);
        assert_eq!(plain_search(&snapshot, "").len(), 2);
        assert_eq!(plain_search(&snapshot, "nothing").len(), 0);
    }
}
