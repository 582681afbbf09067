//! Keyword rule table.
//!
//! Rules hard-correct known misclassifications without retraining: a rule
//! matches when its lowercased keyword is a substring of the lowercased
//! input. The table is a plain vector scanned linearly; tables stay small
//! (tens to low hundreds of rules) compared to call volume.
//!
//! # Examples
//!
//! ```
//! use rubricator::rules::RuleTable;
//!
//! let mut rules = RuleTable::new();
//! rules.add_rule("GIBDD", "Police", 95);
//!
//! let matched = rules.find_match("GIBDD office downtown").unwrap();
//! assert_eq!(matched.category, "Police");
//! assert_eq!(matched.confidence, 0.95);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage;

/// Priority given to rules added without an explicit one.
pub const DEFAULT_RULE_PRIORITY: i64 = 50;

fn default_priority() -> i64 {
    DEFAULT_RULE_PRIORITY
}

/// A keyword → category assignment with a priority (higher wins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Lowercased keyword.
    pub keyword: String,
    /// Target category name.
    pub category: String,
    /// Priority, nominally 1–100.
    #[serde(default = "default_priority")]
    pub priority: i64,
}

impl Rule {
    /// Create a rule; the keyword is lowercased.
    pub fn new<K: AsRef<str>, C: Into<String>>(keyword: K, category: C, priority: i64) -> Self {
        Rule {
            keyword: keyword.as_ref().to_lowercase(),
            category: category.into(),
            priority,
        }
    }

    /// Confidence of this rule: `priority / 100`, clamped to `[0, 1]`.
    pub fn confidence(&self) -> f64 {
        self.priority.clamp(0, 100) as f64 / 100.0
    }

    fn matches(&self, lowered_text: &str) -> bool {
        !self.keyword.is_empty() && lowered_text.contains(&self.keyword)
    }
}

/// Winning rule for an input text.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub keyword: String,
    pub category: String,
    pub priority: i64,
    pub confidence: f64,
}

impl From<&Rule> for RuleMatch {
    fn from(rule: &Rule) -> Self {
        RuleMatch {
            keyword: rule.keyword.clone(),
            category: rule.category.clone(),
            priority: rule.priority,
            confidence: rule.confidence(),
        }
    }
}

/// Ordered, append-only set of rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. Re-adding an identical rule appends a duplicate.
    pub fn add_rule<K: AsRef<str>, C: Into<String>>(
        &mut self,
        keyword: K,
        category: C,
        priority: i64,
    ) -> &Rule {
        self.push(Rule::new(keyword, category, priority))
    }

    /// Append an already-built rule, normalizing its keyword.
    pub fn push(&mut self, mut rule: Rule) -> &Rule {
        rule.keyword = rule.keyword.to_lowercase();
        log::debug!(
            "rule added: '{}' -> '{}' (priority {})",
            rule.keyword,
            rule.category,
            rule.priority
        );
        self.rules.push(rule);
        &self.rules[self.rules.len() - 1]
    }

    /// Find the highest-priority rule whose keyword occurs in `text`.
    ///
    /// On equal priorities the rule added first wins.
    pub fn find_match(&self, text: &str) -> Option<RuleMatch> {
        let lowered = text.to_lowercase();
        let mut best: Option<&Rule> = None;

        for rule in self.rules.iter().filter(|r| r.matches(&lowered)) {
            match best {
                Some(current) if current.priority >= rule.priority => {}
                _ => best = Some(rule),
            }
        }

        best.map(RuleMatch::from)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// Load a rule table from a JSON file.
    ///
    /// A missing file is an empty table: rule persistence is optional.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no rule file at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let mut table: RuleTable = storage::read_json(path)?;
        for rule in &mut table.rules {
            rule.keyword = rule.keyword.to_lowercase();
        }
        log::info!("loaded {} rules from {}", table.len(), path.display());
        Ok(table)
    }

    /// Save the rule table as a JSON array.
    pub fn save(&self, path: &Path) -> Result<()> {
        storage::write_json_atomic(path, self)
    }
}

impl FromIterator<Rule> for RuleTable {
    fn from_iter<T: IntoIterator<Item = Rule>>(iter: T) -> Self {
        let mut table = RuleTable::new();
        for rule in iter {
            table.push(rule);
        }
        table
    }
}
