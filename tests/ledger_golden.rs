use ledger_patcher::{
    builtin, load_from_path, MatchMode, PatchError, PatchOutcome, PatchPlan, Patcher, RuleOutcome,
};
use std::fs;
use std::io::Write;

fn load_fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|err| panic!("failed to load fixture {name}: {err}"))
}

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut temp = tempfile::NamedTempFile::new().expect("tempfile");
    temp.write_all(contents.as_bytes()).expect("write temp");
    temp.flush().expect("flush temp");
    temp
}

#[test]
fn builtin_rules_patch_component() {
    let input = load_fixture("WCMLedgerGrid.tsx.input");
    let expected = load_fixture("WCMLedgerGrid.tsx.expected");
    let temp = write_temp(&input);

    let report = Patcher::new(temp.path(), builtin::wcm_ledger_grid_rules())
        .run()
        .expect("patch");

    assert!(matches!(report.outcome, PatchOutcome::Written { .. }));
    assert!(report.plan.rules.iter().all(|r| r.outcome.is_exact()));

    let output = fs::read_to_string(temp.path()).expect("read output");
    assert_eq!(output, expected);
}

#[test]
fn crlf_checkout_is_patched_and_keeps_crlf() {
    let input = load_fixture("WCMLedgerGrid.tsx.input").replace('\n', "\r\n");
    let expected = load_fixture("WCMLedgerGrid.tsx.expected").replace('\n', "\r\n");
    let temp = write_temp(&input);

    let report = Patcher::new(temp.path(), builtin::wcm_ledger_grid_rules())
        .mode(MatchMode::Strict)
        .run()
        .expect("patch CRLF component");

    assert!(report.plan.rules.iter().all(|r| r.outcome.is_exact()));
    let output = fs::read_to_string(temp.path()).expect("read output");
    assert_eq!(output, expected);
    assert_eq!(output.matches('\n').count(), output.matches("\r\n").count());
}

#[test]
fn builtin_rules_pass_strict_mode_on_fresh_component() {
    let input = load_fixture("WCMLedgerGrid.tsx.input");
    let expected = load_fixture("WCMLedgerGrid.tsx.expected");
    let temp = write_temp(&input);

    let _ = Patcher::new(temp.path(), builtin::wcm_ledger_grid_rules())
        .mode(MatchMode::Strict)
        .run()
        .expect("strict patch");

    assert_eq!(fs::read_to_string(temp.path()).unwrap(), expected);
}

#[test]
fn inserted_lines_land_in_place() {
    let expected = load_fixture("WCMLedgerGrid.tsx.expected");
    let lines: Vec<&str> = expected.lines().collect();

    let import = lines
        .iter()
        .position(|l| *l == "import { useState } from 'react';")
        .unwrap();
    assert_eq!(lines[import + 1], "import api from '@/lib/api';");

    let year = lines.iter().position(|l| *l == "  year?: number;").unwrap();
    assert_eq!(lines[year + 1], "  onDataChange?: () => void;");
    assert_eq!(lines[year + 2], "}");

    assert!(expected.contains("year = new Date().getFullYear(), onDataChange }: WCMLedgerGridProps) {"));

    let selected = lines
        .iter()
        .position(|l| l.contains("const [selectedWeek, setSelectedWeek]"))
        .unwrap();
    assert!(lines[selected + 1].starts_with("  const [editingCell, setEditingCell]"));
    assert!(lines[selected + 2].starts_with("  const [editValue, setEditValue]"));
    assert!(lines[selected + 3].starts_with("  const [saving, setSaving]"));
}

#[test]
fn second_run_is_not_idempotent() {
    let once = load_fixture("WCMLedgerGrid.tsx.expected");
    let twice = load_fixture("WCMLedgerGrid.tsx.rerun");

    let plan = PatchPlan::compute(&builtin::wcm_ledger_grid_rules(), once.as_str());

    let outcomes: Vec<RuleOutcome> = plan.rules.iter().map(|r| r.outcome).collect();
    assert_eq!(
        outcomes,
        [
            RuleOutcome::Replaced { count: 1 },
            RuleOutcome::NoMatch,
            RuleOutcome::NoMatch,
            RuleOutcome::Replaced { count: 1 },
        ]
    );
    assert_eq!(plan.patched, twice);
    assert_eq!(plan.patched.matches("import api from '@/lib/api';").count(), 2);
}

#[test]
fn strict_mode_refuses_second_run() {
    let once = load_fixture("WCMLedgerGrid.tsx.expected");
    let temp = write_temp(&once);

    let err = Patcher::new(temp.path(), builtin::wcm_ledger_grid_rules())
        .mode(MatchMode::Strict)
        .run()
        .unwrap_err();

    match err {
        PatchError::NoMatch { rule, hint, .. } => {
            assert_eq!(rule, "props-on-data-change");
            // Closest line to "year?: number;" is the line itself.
            assert_eq!(hint.expect("near miss").text, "year?: number;");
        }
        other => panic!("expected NoMatch, got {other:?}"),
    }
    assert_eq!(fs::read_to_string(temp.path()).unwrap(), once);
}

#[test]
fn shipped_rule_file_matches_builtin() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/rules/wcm-ledger-grid.toml");
    let from_file = load_from_path(path).expect("load rule file");
    assert_eq!(from_file, builtin::wcm_ledger_grid());
}

#[test]
fn shipped_rule_file_patches_component() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/rules/wcm-ledger-grid.toml");
    let rule_set = load_from_path(path).expect("load rule file");
    let input = load_fixture("WCMLedgerGrid.tsx.input");
    let expected = load_fixture("WCMLedgerGrid.tsx.expected");

    let plan = PatchPlan::compute(&rule_set.rules, input);
    assert_eq!(plan.patched, expected);
}
