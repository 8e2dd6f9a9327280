use std::cmp::Reverse;
use std::collections::HashSet;

use crate::{Rule, RuleSet, RuleSetError};

pub(crate) fn compile(mut rules: Vec<Rule>) -> Result<RuleSet, RuleSetError> {
    check_duplicates(&rules)?;

    // Stable sort: equal priorities keep definition order.
    rules.sort_by_key(|r| Reverse(r.priority()));

    tracing::debug!(
        rules = rules.len(),
        active = rules.iter().filter(|r| r.is_active()).count(),
        "compiled rule set"
    );

    Ok(RuleSet { rules })
}

fn check_duplicates(rules: &[Rule]) -> Result<(), RuleSetError> {
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(rule.name()) {
            return Err(RuleSetError::DuplicateRule {
                name: rule.name().to_owned(),
            });
        }
    }
    Ok(())
}
