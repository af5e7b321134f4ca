use crate::builtin::DEFAULT_TARGET;
use crate::rule::ReplacementRule;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// An ordered list of replacement rules bound to one target file.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct RuleSet {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub rules: Vec<ReplacementRule>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Target path, relative to the workspace root
    #[serde(default)]
    pub target: Option<String>,
    /// Line printed to stdout once the file has been written. Nothing is
    /// printed when unset.
    #[serde(default)]
    pub completion_message: Option<String>,
}

impl RuleSet {
    pub fn target(&self) -> &str {
        self.meta.target.as_deref().unwrap_or(DEFAULT_TARGET)
    }

    pub fn completion_message(&self) -> Option<&str> {
        self.meta.completion_message.as_deref()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.rules.is_empty() {
            issues.push(ValidationIssue::EmptyRuleList);
        }

        if let Some(target) = &self.meta.target {
            if target.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: None,
                    field: "meta.target",
                });
            }
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: None,
                    field: "id",
                });
            } else if !seen.insert(rule.id.as_str()) {
                issues.push(ValidationIssue::DuplicateId {
                    rule_id: rule.id.clone(),
                });
            }

            // Whitespace-only literals are legal; only the empty string is rejected.
            if rule.search.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: Some(rule.id.clone()),
                    field: "search",
                });
            } else if rule.search == rule.replacement {
                issues.push(ValidationIssue::IdentityRule {
                    rule_id: rule.id.clone(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyRuleList,
    MissingField {
        rule_id: Option<String>,
        field: &'static str,
    },
    DuplicateId {
        rule_id: String,
    },
    /// `search` and `replace` are identical, so the rule can never change the file
    IdentityRule {
        rule_id: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRuleList => write!(f, "rule set contains no rules"),
            ValidationIssue::MissingField { rule_id, field } => match rule_id {
                Some(id) => write!(f, "rule '{id}' missing required field '{field}'"),
                None => write!(f, "missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId { rule_id } => {
                write!(f, "rule id '{rule_id}' is used more than once")
            }
            ValidationIssue::IdentityRule { rule_id } => {
                write!(f, "rule '{rule_id}' replaces its search text with itself")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_set(rules: Vec<ReplacementRule>) -> RuleSet {
        RuleSet {
            meta: Metadata::default(),
            rules,
        }
    }

    #[test]
    fn test_empty_rule_list_rejected() {
        let err = rule_set(vec![]).validate().unwrap_err();
        assert_eq!(err.issues, vec![ValidationIssue::EmptyRuleList]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = rule_set(vec![
            ReplacementRule::new("a", "x", "y"),
            ReplacementRule::new("a", "z", "w"),
        ])
        .validate()
        .unwrap_err();
        assert_eq!(
            err.issues,
            vec![ValidationIssue::DuplicateId {
                rule_id: "a".to_string()
            }]
        );
    }

    #[test]
    fn test_empty_search_rejected() {
        let err = rule_set(vec![ReplacementRule::new("a", "", "y")])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("rule 'a' missing required field 'search'"));
    }

    #[test]
    fn test_whitespace_search_allowed() {
        assert!(rule_set(vec![ReplacementRule::new("a", "\n\n", "\n")])
            .validate()
            .is_ok());
    }

    #[test]
    fn test_blank_target_rejected() {
        let mut set = rule_set(vec![ReplacementRule::new("a", "x", "y")]);
        set.meta.target = Some("  ".to_string());
        let err = set.validate().unwrap_err();
        assert!(err.to_string().contains("meta.target"));
    }

    #[test]
    fn test_identity_rule_rejected() {
        let err = rule_set(vec![ReplacementRule::new("same", "x", "x")])
            .validate()
            .unwrap_err();
        assert_eq!(
            err.issues,
            vec![ValidationIssue::IdentityRule {
                rule_id: "same".to_string()
            }]
        );
    }

    #[test]
    fn test_target_defaults_and_message_does_not() {
        let set = rule_set(vec![ReplacementRule::new("a", "x", "y")]);
        assert_eq!(set.target(), DEFAULT_TARGET);
        assert_eq!(set.completion_message(), None);
    }
}
