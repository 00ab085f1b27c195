//! CLI modes and how to move between them.

use regex::bytes::Regex;

/// How a mode is entered from, and left back to, its parent mode.
#[derive(Debug, Clone)]
pub struct ParentLink {
    /// Parent mode name.
    pub level: String,
    /// Sent in the parent mode to enter this one.
    pub enter: String,
    /// Sent in this mode to return to the parent.
    pub leave: String,
    /// Password prompt the router may show after `enter`.
    pub password_prompt: Option<Regex>,
}

/// One CLI mode, recognised by its prompt.
#[derive(Debug, Clone)]
pub struct PrivilegeLevel {
    pub name: String,
    pub prompt: Regex,
    pub parent: Option<ParentLink>,
    /// Markers that rule this mode out even when `prompt` matches; `#` is
    /// shared by privileged EXEC and configuration mode.
    pub excluded: Vec<String>,
}

impl PrivilegeLevel {
    /// A mode reached directly after login.
    pub fn root(name: impl Into<String>, prompt: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            prompt: Regex::new(prompt)?,
            parent: None,
            excluded: Vec::new(),
        })
    }

    /// A mode entered from `parent` with `enter` and left with `leave`.
    pub fn child(
        name: impl Into<String>,
        prompt: &str,
        parent: impl Into<String>,
        enter: impl Into<String>,
        leave: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        let mut level = Self::root(name, prompt)?;
        level.parent = Some(ParentLink {
            level: parent.into(),
            enter: enter.into(),
            leave: leave.into(),
            password_prompt: None,
        });
        Ok(level)
    }

    /// Entering this mode may ask for a password at `prompt`. No-op on a
    /// root mode.
    pub fn requiring_password(mut self, prompt: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(prompt)?;
        if let Some(ref mut link) = self.parent {
            link.password_prompt = Some(pattern);
        }
        Ok(self)
    }

    pub fn excluding(mut self, marker: impl Into<String>) -> Self {
        self.excluded.push(marker.into());
        self
    }

    pub fn parent_name(&self) -> Option<&str> {
        self.parent.as_ref().map(|link| link.level.as_str())
    }

    /// Whether `prompt` belongs to this mode.
    pub fn matches(&self, prompt: &str) -> bool {
        !self.excluded.iter().any(|m| prompt.contains(m.as_str()))
            && self.prompt.is_match(prompt.as_bytes())
    }
}
