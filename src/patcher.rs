//! Read, transform, write.
//!
//! [`Patcher`] reads the target fully, runs every rule over the accumulated
//! buffer in order, and writes the result back in one atomic step. The plan
//! is computed entirely in memory, so strict-mode failures and dry runs
//! never touch the file.

use crate::line_ending::LineEnding;
use crate::rule::{NearMiss, ReplacementRule, RuleOutcome};
use crate::safety::{SafetyError, WorkspaceGuard};
use std::borrow::Cow;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Safety(SafetyError),

    #[error(
        "rule '{rule}' matched nothing in {}{}",
        .path.display(),
        .hint.as_ref().map(|h| format!(" ({h})")).unwrap_or_default()
    )]
    NoMatch {
        path: PathBuf,
        rule: String,
        hint: Option<NearMiss>,
    },

    #[error("rule '{rule}' matched {count} times in {} (expected 1)", .path.display())]
    AmbiguousMatch {
        path: PathBuf,
        rule: String,
        count: usize,
    },
}

impl PatchError {
    /// True when the target file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PatchError::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

/// How strictly rule match counts are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Zero or many matches are logged and the run continues
    #[default]
    Lenient,
    /// Every rule must match exactly once or nothing is written
    Strict,
}

/// Per-rule entry of a [`PatchPlan`].
#[derive(Debug, Clone, PartialEq)]
pub struct RuleReport {
    pub id: String,
    pub outcome: RuleOutcome,
    /// Closest line in the buffer, recorded only when the rule matched nothing
    pub near_miss: Option<NearMiss>,
}

/// The full in-memory transformation of one buffer.
///
/// `original` and `patched` are LF-normalized; `line_ending` records what the
/// file on disk used.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchPlan {
    pub original: String,
    pub patched: String,
    pub line_ending: LineEnding,
    pub rules: Vec<RuleReport>,
}

impl PatchPlan {
    /// Run `rules` in order over `original`. Each rule sees the output of the
    /// previous one.
    pub fn compute(rules: &[ReplacementRule], original: impl Into<String>) -> Self {
        let original = original.into();
        let line_ending = LineEnding::detect(&original);
        let original = LineEnding::normalize(original);
        let mut buffer = original.clone();
        let mut reports = Vec::with_capacity(rules.len());

        for rule in rules {
            let (next, outcome) = rule.apply_to(&buffer);
            let near_miss = match outcome {
                RuleOutcome::NoMatch => rule.near_miss(&buffer),
                RuleOutcome::Replaced { .. } => None,
            };
            reports.push(RuleReport {
                id: rule.id.clone(),
                outcome,
                near_miss,
            });
            buffer = next;
        }

        Self {
            original,
            patched: buffer,
            line_ending,
            rules: reports,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        self.original == self.patched
    }

    /// The patched text with the file's line ending restored.
    pub fn output(&self) -> Cow<'_, str> {
        self.line_ending.apply(&self.patched)
    }

    /// Fail on the first rule that did not match exactly once.
    pub fn check_strict(&self, path: &Path) -> Result<(), PatchError> {
        for report in &self.rules {
            match report.outcome {
                RuleOutcome::NoMatch => {
                    return Err(PatchError::NoMatch {
                        path: path.to_path_buf(),
                        rule: report.id.clone(),
                        hint: report.near_miss.clone(),
                    });
                }
                RuleOutcome::Replaced { count } if count > 1 => {
                    return Err(PatchError::AmbiguousMatch {
                        path: path.to_path_buf(),
                        rule: report.id.clone(),
                        count,
                    });
                }
                RuleOutcome::Replaced { .. } => {}
            }
        }
        Ok(())
    }

    fn log_irregular_matches(&self, path: &Path) {
        for report in &self.rules {
            match report.outcome {
                RuleOutcome::NoMatch => match &report.near_miss {
                    Some(hint) => warn!(
                        rule = %report.id,
                        file = %path.display(),
                        "rule matched nothing; {hint}"
                    ),
                    None => warn!(rule = %report.id, file = %path.display(), "rule matched nothing"),
                },
                RuleOutcome::Replaced { count } if count > 1 => {
                    warn!(rule = %report.id, file = %path.display(), count, "rule matched more than once")
                }
                RuleOutcome::Replaced { .. } => {}
            }
        }
    }
}

/// What happened to the file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchOutcome should be checked for written/unchanged"]
pub enum PatchOutcome {
    /// New content was written
    Written { file: PathBuf, bytes_written: usize },
    /// Every rule was a no-op; nothing was written
    Unchanged { file: PathBuf },
    /// Dry run; nothing was written
    DryRun { file: PathBuf },
}

impl PatchOutcome {
    pub fn file(&self) -> &Path {
        match self {
            PatchOutcome::Written { file, .. }
            | PatchOutcome::Unchanged { file }
            | PatchOutcome::DryRun { file } => file,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatchReport {
    pub outcome: PatchOutcome,
    pub plan: PatchPlan,
}

/// Applies an ordered list of literal replacements to one file.
#[derive(Debug, Clone)]
pub struct Patcher {
    target: PathBuf,
    rules: Vec<ReplacementRule>,
    mode: MatchMode,
    dry_run: bool,
    guard: Option<WorkspaceGuard>,
}

impl Patcher {
    pub fn new(target: impl Into<PathBuf>, rules: Vec<ReplacementRule>) -> Self {
        Self {
            target: target.into(),
            rules,
            mode: MatchMode::default(),
            dry_run: false,
            guard: None,
        }
    }

    pub fn mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Resolve the target against `guard`'s workspace and enforce its boundaries.
    pub fn with_guard(mut self, guard: WorkspaceGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn rules(&self) -> &[ReplacementRule] {
        &self.rules
    }

    /// Read the target and compute the plan without writing.
    pub fn plan(&self) -> Result<(PathBuf, PatchPlan), PatchError> {
        let path = self.resolve()?;
        let content = read_text(&path)?;
        let plan = PatchPlan::compute(&self.rules, content);
        Ok((path, plan))
    }

    /// Read, transform and write the target.
    pub fn run(&self) -> Result<PatchReport, PatchError> {
        let (path, plan) = self.plan()?;

        match self.mode {
            MatchMode::Strict => plan.check_strict(&path)?,
            MatchMode::Lenient => plan.log_irregular_matches(&path),
        }

        if self.dry_run {
            return Ok(PatchReport {
                outcome: PatchOutcome::DryRun { file: path },
                plan,
            });
        }

        if plan.is_unchanged() {
            info!(file = %path.display(), "no rule changed the file; nothing written");
            return Ok(PatchReport {
                outcome: PatchOutcome::Unchanged { file: path },
                plan,
            });
        }

        let path = match &self.guard {
            Some(guard) => guard.revalidate(&path).map_err(PatchError::Safety)?,
            None => path,
        };

        let bytes_written = {
            let output = plan.output();
            write_patched(&path, output.as_bytes())?;
            output.len()
        };
        info!(file = %path.display(), bytes = bytes_written, "patched file written");

        Ok(PatchReport {
            outcome: PatchOutcome::Written {
                bytes_written,
                file: path,
            },
            plan,
        })
    }

    fn resolve(&self) -> Result<PathBuf, PatchError> {
        let Some(guard) = &self.guard else {
            return Ok(self.target.clone());
        };

        guard.validate_path(&self.target).map_err(|err| match err {
            // A missing target is a read failure, same as without a guard.
            SafetyError::Canonicalize { path, source } => PatchError::Read { path, source },
            other => PatchError::Safety(other),
        })
    }
}

fn read_text(path: &Path) -> Result<String, PatchError> {
    let bytes = fs::read(path).map_err(|source| PatchError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|source| PatchError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn write_patched(path: &Path, content: &[u8]) -> Result<(), PatchError> {
    atomic_write(path, content).map_err(|source| PatchError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Atomic file write: tempfile + fsync + rename.
///
/// The original file's permissions are carried over to the replacement.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Create tempfile in same directory to ensure same filesystem
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())?;
    }

    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
