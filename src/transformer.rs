use crate::rules::RuleSet;

/// Applies a [`RuleSet`] to single lines of text.
///
/// Rules run one after another on the same buffer, so a later rule sees the
/// output of every earlier rule rather than the original input.
#[derive(Debug, Clone)]
pub struct LineTransformer {
    rules: RuleSet,
    lowercase_first: bool,
}

impl LineTransformer {
    pub fn new(rules: RuleSet, lowercase_first: bool) -> Self {
        Self {
            rules,
            lowercase_first,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Transforms one line (without its terminator).
    pub fn transform(&self, line: &str) -> String {
        transform(&self.rules, line, self.lowercase_first)
    }

    /// String mode: transforms a literal string with no filesystem access.
    pub fn process_string(&self, text: &str) -> String {
        self.transform(text)
    }
}

/// Lower-cases `text` when asked, then folds every rule over it in order.
pub fn transform(rules: &RuleSet, text: &str, lowercase_first: bool) -> String {
    let start = if lowercase_first {
        text.to_lowercase()
    } else {
        text.to_string()
    };

    rules
        .iter()
        .fold(start, |acc, rule| rule.apply(&acc).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(pairs: &[(&str, &str)]) -> RuleSet {
        RuleSet::compile(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_rules_cascade() {
        let set = rules(&[("cat", "dog"), ("dog", "wolf")]);
        assert_eq!(transform(&set, "cat and dog", false), "wolf and wolf");
    }

    #[test]
    fn test_order_matters() {
        let set = rules(&[("dog", "wolf"), ("cat", "dog")]);
        assert_eq!(transform(&set, "cat and dog", false), "dog and wolf");
    }

    #[test]
    fn test_lowercase_runs_before_rules() {
        let set = rules(&[("hello", "hi")]);
        assert_eq!(transform(&set, "HELLO World", true), "hi world");
        assert_eq!(transform(&set, "HELLO World", false), "HELLO World");
    }

    #[test]
    fn test_capture_groups_expand() {
        let set = rules(&[(r"(\w+)@(\w+)", "$2 at $1")]);
        assert_eq!(transform(&set, "me@home", false), "home at me");
    }

    #[test]
    fn test_empty_rule_set_is_identity() {
        let transformer = LineTransformer::new(RuleSet::default(), false);
        assert_eq!(transformer.process_string("Unchanged"), "Unchanged");
    }
}
