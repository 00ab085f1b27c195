//! Prompts, modes and error markers of one router family.

use indexmap::IndexMap;

use super::privilege_level::PrivilegeLevel;

/// Everything the CLI driver needs to know about a device family.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    pub name: String,
    /// Tried in insertion order when classifying a prompt.
    pub privilege_levels: IndexMap<String, PrivilegeLevel>,
    /// Mode commands are sent from.
    pub default_privilege: String,
    /// Output substrings that mark a command as rejected.
    pub failed_when_contains: Vec<String>,
    /// Run once the session reaches the default mode (paging off, ...).
    pub on_open_commands: Vec<String>,
}

impl PlatformDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            privilege_levels: IndexMap::new(),
            default_privilege: String::new(),
            failed_when_contains: Vec::new(),
            on_open_commands: Vec::new(),
        }
    }

    pub fn with_privilege(mut self, level: PrivilegeLevel) -> Self {
        self.privilege_levels.insert(level.name.clone(), level);
        self
    }

    pub fn with_default_privilege(mut self, name: impl Into<String>) -> Self {
        self.default_privilege = name.into();
        self
    }

    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    pub fn get_privilege(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.privilege_levels.get(name)
    }

    /// First failure pattern contained in `output`, if any.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|pattern| output.contains(pattern.as_str()))
            .map(String::as_str)
    }

    /// Strip the command echo and the trailing prompt line from raw output.
    pub fn normalize_output(&self, raw: &str, command: &str) -> String {
        let output = raw.trim_start_matches(['\r', '\n']);
        let output = output
            .strip_prefix(command)
            .unwrap_or(output)
            .trim_start_matches(['\r', '\n']);

        match output.rfind('\n') {
            Some(pos) => output[..pos].to_string(),
            None => String::new(),
        }
    }
}
