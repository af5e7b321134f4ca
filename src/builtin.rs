//! The built-in rule set for the WCM ledger grid component.
//!
//! Wires an `onDataChange` callback and inline-editing state into
//! `WCMLedgerGrid`. The literals match the component's current layout
//! byte for byte; see `rules/wcm-ledger-grid.toml` for the same set as a
//! rule file.

use crate::config::{Metadata, RuleSet};
use crate::rule::ReplacementRule;

pub const DEFAULT_TARGET: &str = "frontend/components/WCMLedgerGrid.tsx";

pub const COMPLETION_MESSAGE: &str = "Step 1/3 complete";

const REACT_IMPORT: &str = "import { useState } from 'react';";

const PROPS_TAIL: &str = "  year?: number;\n}";

const SIGNATURE: &str =
    "({ asset, parts, year = new Date().getFullYear() }: WCMLedgerGridProps) {";

const SELECTED_WEEK_STATE: &str =
    "const [selectedWeek, setSelectedWeek] = useState<number | null>(null);";

/// The four rules, in application order.
pub fn wcm_ledger_grid_rules() -> Vec<ReplacementRule> {
    vec![
        ReplacementRule::new(
            "import-api-client",
            REACT_IMPORT,
            format!("{REACT_IMPORT}\nimport api from '@/lib/api';"),
        ),
        ReplacementRule::new(
            "props-on-data-change",
            PROPS_TAIL,
            "  year?: number;\n  onDataChange?: () => void;\n}",
        ),
        ReplacementRule::new(
            "signature-on-data-change",
            SIGNATURE,
            "({ asset, parts, year = new Date().getFullYear(), onDataChange }: WCMLedgerGridProps) {",
        ),
        ReplacementRule::new(
            "editing-state",
            SELECTED_WEEK_STATE,
            format!(
                "{SELECTED_WEEK_STATE}\n\
                 \x20 const [editingCell, setEditingCell] = useState<{{ partId: string; field: string }} | null>(null);\n\
                 \x20 const [editValue, setEditValue] = useState<string>('');\n\
                 \x20 const [saving, setSaving] = useState(false);"
            ),
        ),
    ]
}

pub fn wcm_ledger_grid() -> RuleSet {
    RuleSet {
        meta: Metadata {
            name: "wcm-ledger-grid-step-1".to_string(),
            description: Some(
                "Add onDataChange callback and inline-editing state to WCMLedgerGrid".to_string(),
            ),
            target: Some(DEFAULT_TARGET.to_string()),
            completion_message: Some(COMPLETION_MESSAGE.to_string()),
        },
        rules: wcm_ledger_grid_rules(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_set_is_valid() {
        wcm_ledger_grid().validate().unwrap();
    }

    #[test]
    fn test_rule_order() {
        let ids: Vec<_> = wcm_ledger_grid_rules().into_iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            [
                "import-api-client",
                "props-on-data-change",
                "signature-on-data-change",
                "editing-state",
            ]
        );
    }

    #[test]
    fn test_editing_state_lines() {
        let rules = wcm_ledger_grid_rules();
        let lines: Vec<_> = rules[3].replacement.lines().collect();
        assert_eq!(
            lines,
            [
                "const [selectedWeek, setSelectedWeek] = useState<number | null>(null);",
                "  const [editingCell, setEditingCell] = useState<{ partId: string; field: string } | null>(null);",
                "  const [editValue, setEditValue] = useState<string>('');",
                "  const [saving, setSaving] = useState(false);",
            ]
        );
    }

    #[test]
    fn test_which_replacements_keep_their_search() {
        // Rules whose output still contains the search literal fire again on a rerun.
        let keeps: Vec<_> = wcm_ledger_grid_rules()
            .into_iter()
            .filter(|r| r.replacement.contains(&r.search))
            .map(|r| r.id)
            .collect();
        assert_eq!(keeps, ["import-api-client", "editing-state"]);
    }
}
