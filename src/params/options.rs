//! Pset options micro-format.
//!
//! The `options` column of a catalog carries the arguments handed to the
//! cmsRun configuration as whitespace separated `key=value` tokens, for
//! example `globaltag=102X_upgrade2018_realistic_v20 year=2018 data=False`.
//! Tokens without `=` are kept as bare flags.
//!
//! The conditions tag is looked up with the rule the job wrapper has always
//! used: the first `globaltag=` followed by a run of word characters
//! anywhere in the raw string. Tokenization does not influence it.

use std::sync::OnceLock;

use regex::Regex;

/// Key of the conditions tag option.
pub const GLOBAL_TAG_KEY: &str = "globaltag";

fn global_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"{}=(\w+)", GLOBAL_TAG_KEY)).expect("global tag pattern is valid")
    })
}

/// Extracts the conditions tag from a raw options string.
///
/// Returns `None` when `globaltag=` is absent or not followed by at least
/// one word character.
pub fn extract_global_tag(raw: &str) -> Option<&str> {
    global_tag_regex()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// A single token of an options string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionToken<'a> {
    /// `key=value`.
    Pair { key: &'a str, value: &'a str },
    /// A token without `=`.
    Flag(&'a str),
}

/// Parsed view over a raw options string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsetOptions<'a> {
    raw: &'a str,
    tokens: Vec<OptionToken<'a>>,
}

impl<'a> PsetOptions<'a> {
    /// Tokenizes `raw`. Parsing never fails.
    pub fn parse(raw: &'a str) -> Self {
        let tokens = raw
            .split_whitespace()
            .map(|token| match token.split_once('=') {
                Some((key, value)) => OptionToken::Pair { key, value },
                None => OptionToken::Flag(token),
            })
            .collect();
        Self { raw, tokens }
    }

    /// The unparsed string, forwarded verbatim as pset arguments.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// All tokens in input order.
    pub fn tokens(&self) -> &[OptionToken<'a>] {
        &self.tokens
    }

    /// Value of the first `key=value` token with this key.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.pairs().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Iterates over `key=value` tokens.
    pub fn pairs(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        self.tokens.iter().filter_map(|t| match t {
            OptionToken::Pair { key, value } => Some((*key, *value)),
            OptionToken::Flag(_) => None,
        })
    }

    /// Bare flags in input order.
    pub fn flags(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.tokens.iter().filter_map(|t| match t {
            OptionToken::Flag(f) => Some(*f),
            OptionToken::Pair { .. } => None,
        })
    }

    /// Conditions tag, see [`extract_global_tag`].
    pub fn global_tag(&self) -> Option<&'a str> {
        extract_global_tag(self.raw)
    }
}
