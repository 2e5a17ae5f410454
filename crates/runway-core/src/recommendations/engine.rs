//! Rule engine - runs an ordered rule battery over a context

use crate::error::Result;

use super::types::{sort_by_priority, Recommendation};

/// A single deterministic check
pub trait Rule<C>: Send + Sync {
    /// Stable identifier used in logs
    fn id(&self) -> &'static str;

    /// Inspect the context and produce zero or more recommendations
    fn evaluate(&self, ctx: &C) -> Result<Vec<Recommendation>>;
}

/// Data a rule battery runs over
pub trait RuleContext {
    /// Added when no rule produced anything
    fn fallback(&self) -> Option<Recommendation>;
}

/// Ordered list of rules sharing one context type
pub struct RuleEngine<C> {
    rules: Vec<Box<dyn Rule<C>>>,
}

impl<C> Default for RuleEngine<C> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<C> RuleEngine<C> {
    /// An engine with no rules registered
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule (rules run in registration order)
    pub fn register(&mut self, rule: Box<dyn Rule<C>>) {
        self.rules.push(rule);
    }

    pub fn with_rule(mut self, rule: Box<dyn Rule<C>>) -> Self {
        self.register(rule);
        self
    }

    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }
}

impl<C: RuleContext> RuleEngine<C> {
    /// Run every rule, add the fallback if nothing fired, sort by priority
    ///
    /// A failing rule is logged and skipped.
    pub fn evaluate(&self, ctx: &C) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        for rule in &self.rules {
            match rule.evaluate(ctx) {
                Ok(found) => {
                    if !found.is_empty() {
                        tracing::debug!(rule = rule.id(), count = found.len(), "Rule fired");
                    }
                    recommendations.extend(found);
                }
                Err(e) => {
                    tracing::warn!(rule = rule.id(), error = %e, "Rule evaluation failed");
                }
            }
        }

        if recommendations.is_empty() {
            if let Some(fallback) = ctx.fallback() {
                recommendations.push(fallback);
            }
        }

        sort_by_priority(&mut recommendations);
        recommendations
    }
}
