use std::fmt;
use std::time::Duration;

/// What one command produced.
#[derive(Debug, Clone)]
pub struct Response {
    pub command: String,
    /// Output without the echoed command and the closing prompt.
    pub result: String,
    /// Prompt the output ended with.
    pub prompt: String,
    pub elapsed: Duration,
    /// Router error marker found in the output (`% Invalid input`, ...).
    pub failure_message: Option<String>,
}

impl Response {
    pub fn new(
        command: impl Into<String>,
        result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            prompt: prompt.into(),
            elapsed,
            failure_message: None,
        }
    }

    pub fn with_failure(self, marker: impl Into<String>) -> Self {
        Self {
            failure_message: Some(marker.into()),
            ..self
        }
    }

    /// The router accepted the command.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_marks_response() {
        let response = Response::new("show foo", "% Invalid input", "R1#", Duration::ZERO);
        assert!(response.is_success());

        let response = response.with_failure("% Invalid input");
        assert!(!response.is_success());
        assert_eq!(response.failure_message.as_deref(), Some("% Invalid input"));
        assert_eq!(response.to_string(), "% Invalid input");
    }
}
