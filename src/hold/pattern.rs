use std::fmt;
use std::str::FromStr;

use regex::Regex;

/// A `--hold_names` entry
///
/// Matching is a regex search, not a full match: `alpha` matches `alpha_run`
/// and `logs/alpha`. Anchor with `^` and `$` to match exactly.
#[derive(Clone, Debug)]
pub struct NamePattern {
    regex: Regex,
}

impl NamePattern {
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl FromStr for NamePattern {
    type Err = regex::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NamePattern { regex: Regex::new(s)? })
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn searches_anywhere_in_name() {
        let pattern: NamePattern = "alpha_.+".parse().unwrap();
        assert!(pattern.is_match("alpha_run"));
        assert!(pattern.is_match("logs/alpha_run"));
        assert!(!pattern.is_match("beta_run"));
        assert!(!pattern.is_match("alpha_"));
    }

    #[test]
    fn anchors_restrict_to_full_name() {
        let pattern: NamePattern = "^run$".parse().unwrap();
        assert!(pattern.is_match("run"));
        assert!(!pattern.is_match("run2"));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        assert!("assembly_(".parse::<NamePattern>().is_err());
    }
}
