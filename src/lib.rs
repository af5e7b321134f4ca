//! Ledger Patcher: scripted literal-replacement patching for one frontend file
//!
//! Applies an ordered list of exact substring replacements to a single text
//! file and writes the result back in place. The built-in rule set wires an
//! `onDataChange` callback and inline-editing state into the
//! `WCMLedgerGrid` component.
//!
//! # Semantics
//!
//! - Each [`ReplacementRule`] replaces every non-overlapping occurrence of its
//!   search literal, left to right. No pattern syntax.
//! - Rules run in order; each sees the output of the previous one.
//! - A rule whose literal is absent is a no-op (a warning in
//!   [`MatchMode::Lenient`], an error in [`MatchMode::Strict`]).
//! - CRLF input is matched as LF and written back with CRLF throughout.
//! - The file is written once, atomically (tempfile + fsync + rename).
//!
//! # Example
//!
//! ```no_run
//! use ledger_patcher::{builtin, Patcher};
//!
//! let report = Patcher::new(builtin::DEFAULT_TARGET, builtin::wcm_ledger_grid_rules())
//!     .run()
//!     .expect("patch failed");
//! println!("{:?}", report.outcome);
//! ```

pub mod builtin;
pub mod config;
pub mod line_ending;
pub mod patcher;
pub mod rule;
pub mod safety;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, RuleSet};
pub use line_ending::LineEnding;
pub use patcher::{
    MatchMode, PatchError, PatchOutcome, PatchPlan, PatchReport, Patcher, RuleReport,
};
pub use rule::{NearMiss, ReplacementRule, RuleOutcome};
pub use safety::{SafetyError, WorkspaceGuard};
