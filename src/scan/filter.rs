//! Include/exclude path rules.

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};

#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    matcher: GlobMatcher,
    /// For `dir/**` rules, a matcher for `dir` itself.
    dir_matcher: Option<GlobMatcher>,
    exclude: bool,
}

/// Glob rules deciding which repository paths are eligible.
///
/// A rule prefixed with `!` excludes. A path passes when it matches at least
/// one include rule (or there are none) and no exclude rule.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    rules: Vec<Rule>,
}

fn compile(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("Invalid path filter '{pattern}'"))?;
    Ok(glob.compile_matcher())
}

impl PathFilter {
    pub fn new<S: AsRef<str>>(rules: &[S]) -> Result<Self> {
        let mut compiled = Vec::new();
        for raw in rules {
            let trimmed = raw.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            let (pattern, exclude) = match trimmed.strip_prefix('!') {
                Some(rest) => (rest.trim(), true),
                None => (trimmed, false),
            };
            let dir_matcher = match pattern.strip_suffix("/**") {
                Some(prefix) if !prefix.is_empty() => Some(compile(prefix)?),
                _ => None,
            };
            compiled.push(Rule {
                pattern: pattern.to_string(),
                matcher: compile(pattern)?,
                dir_matcher,
                exclude,
            });
        }
        Ok(Self { rules: compiled })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether a file path is eligible.
    pub fn matches(&self, path: &str) -> bool {
        if self.rules.is_empty() {
            return true;
        }

        let mut included = false;
        let mut has_include_rule = false;
        for rule in &self.rules {
            if rule.exclude {
                if rule.matcher.is_match(path) {
                    tracing::debug!("{} excluded by '!{}'", path, rule.pattern);
                    return false;
                }
            } else {
                has_include_rule = true;
                included = included || rule.matcher.is_match(path);
            }
        }
        !has_include_rule || included
    }

    /// Whether an exclude rule covers a whole directory, so traversal can
    /// skip it. Include rules never prune directories.
    pub fn excludes_dir(&self, dir: &str) -> bool {
        self.rules.iter().filter(|r| r.exclude).any(|r| {
            r.matcher.is_match(dir) || r.dir_matcher.as_ref().is_some_and(|m| m.is_match(dir))
        })
    }
}

impl std::fmt::Display for PathFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self
            .rules
            .iter()
            .map(|r| if r.exclude { format!("!{}", r.pattern) } else { r.pattern.clone() })
            .collect();
        write!(f, "[{}]", rendered.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_includes_everything() {
        let filter = PathFilter::new::<&str>(&[]).expect("filter");
        assert!(filter.matches("anything/at/all.ts"));
        assert!(!filter.excludes_dir("anything"));
    }

    #[test]
    fn include_rules_restrict_and_excludes_win() {
        let filter = PathFilter::new(&["src/**", "!src/**/*.md", "  "]).expect("filter");
        assert!(filter.matches("src/a/foo.ts"));
        assert!(!filter.matches("lib/foo.ts"));
        assert!(!filter.matches("src/docs/readme.md"));
    }

    #[test]
    fn exclude_only_rules_default_to_include() {
        let filter = PathFilter::new(&["!**/*.snap"]).expect("filter");
        assert!(filter.matches("src/a.ts"));
        assert!(!filter.matches("src/__snapshots__/a.snap"));
    }

    #[test]
    fn single_star_does_not_cross_directories() {
        let filter = PathFilter::new(&["*.ts"]).expect("filter");
        assert!(filter.matches("index.ts"));
        assert!(!filter.matches("src/index.ts"));
    }

    #[test]
    fn excluded_directories_are_pruned() {
        let filter = PathFilter::new(&["src/**", "!generated/**", "!**/fixtures"]).expect("filter");
        assert!(filter.excludes_dir("generated"));
        assert!(filter.excludes_dir("generated/api"));
        assert!(filter.excludes_dir("test/fixtures"));
        assert!(!filter.excludes_dir("src"));
        assert!(!filter.excludes_dir("lib"));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(PathFilter::new(&["src/[unclosed"]).is_err());
    }

    #[test]
    fn display_round_trips_rules() {
        let filter = PathFilter::new(&["src/**", "!**/*.md"]).expect("filter");
        assert_eq!(filter.to_string(), "[src/**, !**/*.md]");
    }
}
