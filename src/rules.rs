use crate::dictionary::MappingSource;
use crate::errors::{Error, Result};
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::{debug, warn};

/// A compiled `(pattern, replacement)` pair.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    replacement: String,
}

impl Rule {
    /// Compiles `pattern`, failing with [`Error::InvalidPattern`] if the regex
    /// engine rejects it.
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: regex,
            replacement: replacement.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Replaces every match of the pattern in `text`. Capture references such
    /// as `$1` in the replacement are expanded.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.pattern.replace_all(text, self.replacement.as_str())
    }
}

/// The ordered rules governing one invocation. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Compiles `pairs` in order.
    pub fn compile<I, P, R>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, R)>,
        P: AsRef<str>,
        R: Into<String>,
    {
        let rules = pairs
            .into_iter()
            .map(|(p, r)| Rule::new(p.as_ref(), r))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The `(pattern, replacement)` strings in application order.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.rules
            .iter()
            .map(|r| (r.pattern(), r.replacement()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// The result of [`RuleSetBuilder::build`]: the rules plus one warning per
/// dictionary source that could not be loaded.
#[derive(Debug)]
pub struct BuiltRules {
    pub rules: RuleSet,
    pub warnings: Vec<Error>,
}

/// Insertion-ordered pattern map. Re-inserting a pattern replaces its
/// replacement and keeps its original position.
#[derive(Debug, Default)]
struct OrderedPairs {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl OrderedPairs {
    fn insert(&mut self, pattern: String, replacement: String) {
        match self.index.get(&pattern) {
            Some(&i) => self.entries[i].1 = replacement,
            None => {
                self.index.insert(pattern.clone(), self.entries.len());
                self.entries.push((pattern, replacement));
            }
        }
    }

    fn swapped(self) -> Self {
        let mut reversed = OrderedPairs::default();
        for (pattern, replacement) in self.entries {
            reversed.insert(replacement, pattern);
        }
        reversed
    }
}

/// Collects change pairs and dictionary entries, then compiles them into a
/// [`RuleSet`].
///
/// Entries are merged in the order they are added; later entries win on a
/// pattern collision. Reversal is applied after merging, right before the
/// patterns are compiled.
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    pairs: OrderedPairs,
    warnings: Vec<Error>,
    reverse: bool,
}

impl RuleSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `"pattern:replacement"` change, split on the first `:`.
    pub fn change(&mut self, raw: &str) -> Result<&mut Self> {
        let (pattern, replacement) = parse_change(raw)?;
        self.pairs.insert(pattern, replacement);
        Ok(self)
    }

    /// Merges every entry of `source`. A source that fails to load is
    /// skipped and recorded as a warning.
    pub fn source(&mut self, source: &dyn MappingSource) -> &mut Self {
        match source.load() {
            Ok(entries) => {
                debug!(source = %source.name(), entries = entries.len(), "Loaded dictionary");
                for (pattern, replacement) in entries {
                    self.pairs.insert(pattern, replacement);
                }
            }
            Err(e) => {
                warn!("Skipping dictionary: {e}");
                self.warnings.push(e);
            }
        }
        self
    }

    pub fn reverse(&mut self, reverse: bool) -> &mut Self {
        self.reverse = reverse;
        self
    }

    /// Compiles the merged entries. Fails on the first invalid pattern.
    pub fn build(self) -> Result<BuiltRules> {
        let pairs = if self.reverse {
            self.pairs.swapped()
        } else {
            self.pairs
        };

        Ok(BuiltRules {
            rules: RuleSet::compile(pairs.entries)?,
            warnings: self.warnings,
        })
    }
}

/// Builds a rule set from raw change pairs followed by dictionary sources.
pub fn build(
    changes: &[String],
    dictionaries: &[&dyn MappingSource],
    reverse: bool,
) -> Result<BuiltRules> {
    let mut builder = RuleSetBuilder::new();
    for change in changes {
        builder.change(change)?;
    }
    for source in dictionaries {
        builder.source(*source);
    }
    builder.reverse(reverse);
    builder.build()
}

/// Splits a change on its first `:`.
pub fn parse_change(raw: &str) -> Result<(String, String)> {
    raw.split_once(':')
        .map(|(p, r)| (p.to_string(), r.to_string()))
        .ok_or_else(|| Error::MalformedRule(raw.to_string()))
}
