//! Rule storage whose write path only accepts validated rules.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::{Rule, RuleDraft, RuleSet, RuleSetBuilder, RuleSetError};

/// Identifier assigned to a stored rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(u64);

impl RuleId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("rule {id} not found")]
    NotFound { id: RuleId },

    #[error("a rule named '{name}' already exists")]
    DuplicateRule { name: String },

    #[error(transparent)]
    Rejected(#[from] RuleSetError),
}

/// Persistence for rules.
///
/// Implementations store [`Rule`]s only. Drafts go through
/// [`create`](Self::create) and [`update`](Self::update), which validate
/// first and write nothing when validation fails.
pub trait RuleStore {
    /// Store a rule under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateRule`] if the name is taken.
    fn insert(&mut self, rule: Rule) -> Result<RuleId, StoreError>;

    /// Replace the rule stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id and
    /// [`StoreError::DuplicateRule`] if another rule already has the name.
    fn replace(&mut self, id: RuleId, rule: Rule) -> Result<Rule, StoreError>;

    fn get(&self, id: RuleId) -> Option<&Rule>;

    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id.
    fn remove(&mut self, id: RuleId) -> Result<Rule, StoreError>;

    /// Every stored rule with its id, in id order.
    fn list(&self) -> Vec<(RuleId, &Rule)>;

    /// Validate a draft and store it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Rejected`] if the draft fails validation, or any
    /// error from [`insert`](Self::insert).
    fn create(&mut self, draft: RuleDraft) -> Result<RuleId, StoreError> {
        let rule = draft.validate()?;
        let id = self.insert(rule)?;
        tracing::debug!(id = %id, "rule created");
        Ok(id)
    }

    /// Validate an edited draft and store it in place of the rule under `id`.
    /// On failure the stored rule is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id,
    /// [`StoreError::Rejected`] if the draft fails validation, or any error
    /// from [`replace`](Self::replace).
    fn update(&mut self, id: RuleId, draft: RuleDraft) -> Result<Rule, StoreError> {
        if self.get(id).is_none() {
            return Err(StoreError::NotFound { id });
        }
        let rule = draft.validate()?;
        let previous = self.replace(id, rule)?;
        tracing::debug!(id = %id, "rule updated");
        Ok(previous)
    }

    /// Compile the stored rules into a [`RuleSet`].
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError`] if the stored rules cannot be compiled.
    fn ruleset(&self) -> Result<RuleSet, RuleSetError> {
        self.list()
            .into_iter()
            .fold(RuleSetBuilder::new(), |builder, (_, rule)| {
                builder.add(rule.clone())
            })
            .compile()
    }
}

/// An in-memory [`RuleStore`] handing out sequential ids starting at 1.
#[derive(Debug, Clone, Default)]
pub struct MemoryRuleStore {
    rules: BTreeMap<RuleId, Rule>,
    last_id: u64,
}

impl MemoryRuleStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn name_taken(&self, name: &str, except: Option<RuleId>) -> bool {
        self.rules
            .iter()
            .any(|(id, rule)| Some(*id) != except && rule.name() == name)
    }
}

impl RuleStore for MemoryRuleStore {
    fn insert(&mut self, rule: Rule) -> Result<RuleId, StoreError> {
        if self.name_taken(rule.name(), None) {
            return Err(StoreError::DuplicateRule {
                name: rule.name().to_owned(),
            });
        }
        self.last_id += 1;
        let id = RuleId(self.last_id);
        self.rules.insert(id, rule);
        Ok(id)
    }

    fn replace(&mut self, id: RuleId, rule: Rule) -> Result<Rule, StoreError> {
        if !self.rules.contains_key(&id) {
            return Err(StoreError::NotFound { id });
        }
        if self.name_taken(rule.name(), Some(id)) {
            return Err(StoreError::DuplicateRule {
                name: rule.name().to_owned(),
            });
        }
        self.rules
            .insert(id, rule)
            .ok_or(StoreError::NotFound { id })
    }

    fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(&id)
    }

    fn remove(&mut self, id: RuleId) -> Result<Rule, StoreError> {
        self.rules.remove(&id).ok_or(StoreError::NotFound { id })
    }

    fn list(&self) -> Vec<(RuleId, &Rule)> {
        self.rules.iter().map(|(id, rule)| (*id, rule)).collect()
    }
}
