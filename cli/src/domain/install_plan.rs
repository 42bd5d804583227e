//! Install plan: ordered installer stages with pre-scripted answers.
//!
//! Pure data and rendering. Loading from disk lives in `infra::config`; this
//! module only parses text and produces the remote command string.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::{OpsError, PlanError};
use crate::domain::target::RemoteTarget;

// ── Constants ────────────────────────────────────────────────────────────────

/// Heredoc delimiter between the installer invocation and its answers.
pub const ANSWER_TERMINATOR: &str = "PTERO_ANSWERS";

/// Placeholder names an answer line may reference as `{name}`.
pub const PLACEHOLDERS: &[&str] = &[
    "panel_domain",
    "node_domain",
    "memory_mb",
    "admin_user",
    "admin_email",
    "admin_password",
    "timezone",
    "location",
];

const EMBEDDED_PLAN: &str = include_str!("../../assets/install-plan.yaml");
const REDACTED: &str = "********";

// ── Plan schema ──────────────────────────────────────────────────────────────

/// Ordered installer stages plus the remote log destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallPlan {
    /// Remote file receiving stdout and stderr of the whole run.
    #[serde(default = "default_log_file")]
    pub log_file: String,
    pub stages: Vec<InstallStage>,
}

/// One installer invocation and the answer lines piped to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallStage {
    pub name: String,
    pub script_url: String,
    #[serde(default)]
    pub answers: Vec<String>,
}

fn default_log_file() -> String {
    "install.log".to_string()
}

impl InstallPlan {
    /// Parse and validate a YAML plan.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] if the YAML is malformed or the plan is invalid.
    pub fn from_yaml(raw: &str) -> Result<Self, PlanError> {
        let plan: Self = serde_yaml::from_str(raw).map_err(|e| PlanError::Parse(e.to_string()))?;
        plan.validate()?;
        Ok(plan)
    }

    /// The plan compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] only if the bundled asset is broken.
    pub fn embedded() -> Result<Self, PlanError> {
        Self::from_yaml(EMBEDDED_PLAN)
    }

    /// Structural checks: at least one stage, every stage non-empty,
    /// single-line answers, known placeholders, http(s) script URLs.
    ///
    /// # Errors
    ///
    /// Returns the first [`PlanError`] found.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.log_file.trim().is_empty() || self.log_file.contains(['\n', '\r']) {
            return Err(PlanError::InvalidLogFile(self.log_file.clone()));
        }
        if self.stages.is_empty() {
            return Err(PlanError::NoStages);
        }
        for stage in &self.stages {
            stage.validate()?;
        }
        Ok(())
    }

    /// Total number of answer lines across all stages.
    #[must_use]
    pub fn answer_count(&self) -> usize {
        self.stages.iter().map(|s| s.answers.len()).sum()
    }

    /// Substitute target and profile values into every answer line.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::Validation`] if a substituted value would break the
    /// line-per-answer framing (embedded newline or a line equal to the
    /// heredoc delimiter).
    pub fn render(
        &self,
        target: &RemoteTarget,
        profile: &InstallProfile,
    ) -> Result<RenderedPlan, OpsError> {
        let values = placeholder_values(target, profile);
        let mut stages = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            let mut answers = Vec::with_capacity(stage.answers.len());
            for (index, template) in stage.answers.iter().enumerate() {
                let line = substitute(template, &values);
                if line.contains(['\n', '\r']) || line == ANSWER_TERMINATOR {
                    return Err(OpsError::Validation(format!(
                        "stage {:?} answer #{} renders to an unsafe line",
                        stage.name,
                        index + 1
                    )));
                }
                answers.push(line);
            }
            stages.push(RenderedStage {
                name: stage.name.clone(),
                script_url: stage.script_url.clone(),
                answers,
            });
        }
        Ok(RenderedPlan {
            log_file: self.log_file.clone(),
            stages,
        })
    }
}

impl InstallStage {
    fn validate(&self) -> Result<(), PlanError> {
        let url_ok = url::Url::parse(&self.script_url)
            .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some());
        if !url_ok {
            return Err(PlanError::InvalidScriptUrl {
                stage: self.name.clone(),
                url: self.script_url.clone(),
            });
        }
        if self.answers.is_empty() {
            return Err(PlanError::EmptyStage {
                stage: self.name.clone(),
            });
        }
        for (i, answer) in self.answers.iter().enumerate() {
            if answer.contains(['\n', '\r']) || answer == ANSWER_TERMINATOR {
                return Err(PlanError::MultilineAnswer {
                    stage: self.name.clone(),
                    index: i + 1,
                });
            }
            for name in placeholders_in(answer) {
                if !PLACEHOLDERS.contains(&name) {
                    return Err(PlanError::UnknownPlaceholder {
                        stage: self.name.clone(),
                        placeholder: name.to_string(),
                        known: PLACEHOLDERS.join(", "),
                    });
                }
            }
        }
        Ok(())
    }
}

// ── Operator profile ─────────────────────────────────────────────────────────

/// Operator identity values substituted into the plan.
#[derive(Clone, PartialEq, Eq)]
pub struct InstallProfile {
    pub admin_user: String,
    pub admin_email: String,
    pub admin_password: String,
    pub timezone: String,
    pub location: String,
}

impl InstallProfile {
    /// Copy with the password masked, for previews.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            admin_password: REDACTED.to_string(),
            ..self.clone()
        }
    }

    /// Every field must be a non-empty single line.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<(), OpsError> {
        for (field, value) in [
            ("admin_user", &self.admin_user),
            ("admin_email", &self.admin_email),
            ("admin_password", &self.admin_password),
            ("timezone", &self.timezone),
            ("location", &self.location),
        ] {
            if value.trim().is_empty() || value.contains(['\n', '\r']) {
                return Err(OpsError::Validation(format!(
                    "install profile {field} must be a non-empty single line"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for InstallProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallProfile")
            .field("admin_user", &self.admin_user)
            .field("admin_email", &self.admin_email)
            .field("admin_password", &"<redacted>")
            .field("timezone", &self.timezone)
            .field("location", &self.location)
            .finish()
    }
}

// ── Rendered output ──────────────────────────────────────────────────────────

/// A plan with all placeholders resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPlan {
    pub log_file: String,
    pub stages: Vec<RenderedStage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStage {
    pub name: String,
    pub script_url: String,
    pub answers: Vec<String>,
}

impl RenderedPlan {
    /// The stage sequence as a bash script, one quoted heredoc per stage.
    #[must_use]
    pub fn script(&self) -> String {
        self.stages
            .iter()
            .map(|stage| {
                format!(
                    "bash <(curl -s {url}) <<'{term}'\n{answers}\n{term}",
                    url = shell_quote(&stage.script_url),
                    term = ANSWER_TERMINATOR,
                    answers = stage.answers.join("\n"),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The single detached command sent over the remote session.
    #[must_use]
    pub fn composite_command(&self) -> String {
        format!(
            "nohup bash -c {} > {} 2>&1 < /dev/null &",
            shell_quote(&self.script()),
            shell_quote(&self.log_file)
        )
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Wrap `raw` in single quotes, escaping embedded single quotes.
#[must_use]
pub fn shell_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "'\"'\"'"))
}

fn placeholder_values(target: &RemoteTarget, profile: &InstallProfile) -> [(&'static str, String); 8] {
    [
        ("panel_domain", target.panel_domain.clone()),
        ("node_domain", target.node_domain.clone()),
        ("memory_mb", target.memory_mb.to_string()),
        ("admin_user", profile.admin_user.clone()),
        ("admin_email", profile.admin_email.clone()),
        ("admin_password", profile.admin_password.clone()),
        ("timezone", profile.timezone.clone()),
        ("location", profile.location.clone()),
    ]
}

/// Names of `{name}` tokens in `line`, where a name is `[a-z_]+`.
fn placeholders_in(line: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = line;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if is_placeholder_name(&after[..close]) => {
                names.push(&after[..close]);
                rest = &after[close + 1..];
            }
            _ => rest = after,
        }
    }
    names
}

fn substitute(template: &str, values: &[(&'static str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let resolved = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (value, close))
        });
        if let Some((value, close)) = resolved {
            out.push_str(value);
            rest = &after[close + 1..];
        } else {
            out.push('{');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

fn is_placeholder_name(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.chars().all(|c| c.is_ascii_lowercase() || c == '_')
}

// ── Unit tests ───────────────────────────────────────────────────────────────
