//! Current CLI mode and the commands that move between modes.

use indexmap::IndexMap;
use regex::bytes::Regex;

use crate::error::{DriverError, Error, Result};
use crate::platform::PrivilegeLevel;

/// Tracks the current mode and plans moves between modes.
///
/// Modes form a tree through their parent links, so a move climbs from the
/// current mode to the closest shared ancestor and descends from there.
#[derive(Debug)]
pub struct PrivilegeManager {
    levels: IndexMap<String, PrivilegeLevel>,
    current: Option<String>,
}

/// One command that moves to an adjacent mode.
#[derive(Debug, Clone)]
pub struct Step {
    /// Mode reached by this step.
    pub target: String,
    pub command: String,
    /// Password prompt to answer, when entering the mode asks for one.
    pub password_prompt: Option<Regex>,
}

impl PrivilegeManager {
    /// No mode is current until a prompt has been seen.
    pub fn new(levels: IndexMap<String, PrivilegeLevel>) -> Self {
        Self {
            levels,
            current: None,
        }
    }

    /// The mode a prompt belongs to.
    pub fn determine_from_prompt(&self, prompt: &str) -> Result<&PrivilegeLevel> {
        self.levels
            .values()
            .find(|level| level.matches(prompt))
            .ok_or_else(|| {
                DriverError::UnknownPrivilege {
                    prompt: prompt.to_string(),
                }
                .into()
            })
    }

    /// Record the mode shown by `prompt` and return its name.
    pub fn observe_prompt(&mut self, prompt: &str) -> Result<String> {
        let name = self.determine_from_prompt(prompt)?.name.clone();
        self.current = Some(name.clone());
        Ok(name)
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// `name`, its parent, its grandparent and so on up to a root mode.
    fn lineage(&self, name: &str) -> Result<Vec<&PrivilegeLevel>> {
        let mut chain: Vec<&PrivilegeLevel> = Vec::new();
        let mut cursor = Some(name);

        while let Some(level_name) = cursor {
            let level = self.levels.get(level_name).ok_or_else(|| {
                Error::from(DriverError::InvalidConfig {
                    message: format!("unknown privilege level '{level_name}'"),
                })
            })?;
            if chain.iter().any(|seen| seen.name == level.name) {
                return Err(DriverError::InvalidConfig {
                    message: format!("privilege level '{level_name}' is its own ancestor"),
                }
                .into());
            }
            chain.push(level);
            cursor = level.parent_name();
        }
        Ok(chain)
    }

    /// Every step from the current mode to `target`.
    pub fn plan(&self, target: &str) -> Result<Vec<Step>> {
        let current = self
            .current
            .as_deref()
            .ok_or_else(|| DriverError::UnknownPrivilege {
                prompt: String::new(),
            })?;

        let up = self.lineage(current)?;
        let down = self.lineage(target)?;

        let no_path = || {
            Error::from(DriverError::NoPrivilegePath {
                from: current.to_string(),
                to: target.to_string(),
            })
        };
        let (climb, shared) = up
            .iter()
            .enumerate()
            .find_map(|(i, level)| {
                down.iter()
                    .position(|other| other.name == level.name)
                    .map(|j| (i, j))
            })
            .ok_or_else(no_path)?;

        let mut steps = Vec::with_capacity(climb + shared);
        for level in &up[..climb] {
            let link = level.parent.as_ref().ok_or_else(no_path)?;
            steps.push(Step {
                target: link.level.clone(),
                command: link.leave.clone(),
                password_prompt: None,
            });
        }
        for level in down[..shared].iter().rev() {
            let link = level.parent.as_ref().ok_or_else(no_path)?;
            steps.push(Step {
                target: level.name.clone(),
                command: link.enter.clone(),
                password_prompt: link.password_prompt.clone(),
            });
        }
        Ok(steps)
    }
}
