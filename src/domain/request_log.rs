use std::fmt;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Error => "ERROR",
        }
    }
}

/// Logical endpoint, one log file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogEndpoint {
    Contact,
    AirTicket,
    AirClaim,
    Email,
    EmailFallback,
    Server,
}

impl LogEndpoint {
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::AirTicket => "air_ticket",
            Self::AirClaim => "air_claim",
            Self::Email => "email",
            Self::EmailFallback => "email_fallback",
            Self::Server => "server",
        }
    }

    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.log", self.file_stem())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: OffsetDateTime,
    pub level: LogLevel,
    pub endpoint: LogEndpoint,
    pub message: String,
}

impl LogEntry {
    #[must_use]
    pub fn now(endpoint: LogEndpoint, level: LogLevel, message: impl Into<String>) -> Self {
        Self { timestamp: OffsetDateTime::now_utc(), level, endpoint, message: message.into() }
    }

    /// The `Display` form followed by a newline.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

/// `[timestamp] [LEVEL] message`, with embedded newlines flattened so one
/// entry never spans more than one line.
impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let timestamp = self.timestamp.format(&Rfc3339).map_err(|_| fmt::Error)?;
        let message = self.message.replace(['\r', '\n'], " ");
        write!(f, "[{timestamp}] [{}] {message}", self.level.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_entry_line_format() {
        let entry = LogEntry {
            timestamp: datetime!(2025-03-01 10:15:30 UTC),
            level: LogLevel::Error,
            endpoint: LogEndpoint::EmailFallback,
            message: "Failed to send copy to admin".into(),
        };

        assert_eq!(entry.to_line(), "[2025-03-01T10:15:30Z] [ERROR] Failed to send copy to admin\n");
        assert_eq!(entry.endpoint.file_name(), "email_fallback.log");
    }

    #[test]
    fn test_entry_flattens_newlines() {
        let entry = LogEntry::now(LogEndpoint::Contact, LogLevel::Info, "line one\nline two\r\n");
        let line = entry.to_line();

        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.ends_with("line one line two  \n"));
    }
}
