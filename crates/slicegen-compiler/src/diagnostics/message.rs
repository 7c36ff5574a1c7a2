use slicegen_core::Location;

/// Diagnostic kinds raised while generating Java.
///
/// Errors stop generation for the source file they point into. Warnings substitute a
/// computed default and let generation continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    // Name collisions between generated members and declared operations
    AccessorConflict,

    // Malformed metadata: a default is used instead
    InvalidSerialVersionUid,
    InvalidFreezeMetadata,
    InvalidMetadata,
}

impl DiagnosticKind {
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::AccessorConflict => Severity::Error,
            Self::InvalidSerialVersionUid | Self::InvalidFreezeMetadata | Self::InvalidMetadata => {
                Severity::Warning
            }
        }
    }

    /// Base message for this diagnostic kind, used when no custom message is provided.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::AccessorConflict => "operation conflicts with method for data member",
            Self::InvalidSerialVersionUid => {
                "ignoring invalid serialVersionUID; generating default value"
            }
            Self::InvalidFreezeMetadata => "invalid freeze metadata",
            Self::InvalidMetadata => "ignoring invalid metadata",
        }
    }

    /// Template for custom messages. Contains `{}` placeholder for caller-provided detail.
    pub fn custom_message(&self) -> String {
        match self {
            Self::AccessorConflict => "operation `{}' conflicts with method for data member".to_string(),
            Self::InvalidSerialVersionUid => {
                "ignoring invalid serialVersionUID for {}; generating default value".to_string()
            }
            Self::InvalidFreezeMetadata => "{}".to_string(),
            Self::InvalidMetadata => "ignoring invalid metadata `{}'".to_string(),
        }
    }

    /// Render the final message.
    ///
    /// - `None` → returns `fallback_message()`
    /// - `Some(detail)` → returns `custom_message()` with `{}` replaced by detail
    pub fn message(&self, msg: Option<&str>) -> String {
        match msg {
            None => self.fallback_message().to_string(),
            Some(detail) => self.custom_message().replace("{}", detail),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub(crate) location: Location,
    pub(crate) message: String,
}

impl RelatedInfo {
    pub fn new(location: Location, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub(crate) kind: DiagnosticKind,
    pub(crate) location: Location,
    pub(crate) message: String,
    pub(crate) related: Vec<RelatedInfo>,
}

impl DiagnosticMessage {
    pub(crate) fn new(kind: DiagnosticKind, location: Location, message: impl Into<String>) -> Self {
        Self {
            kind,
            location,
            message: message.into(),
            related: Vec::new(),
        }
    }

    pub(crate) fn with_default_message(kind: DiagnosticKind, location: Location) -> Self {
        Self::new(kind, location, kind.fallback_message())
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.kind.default_severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.location.file.is_empty() {
            write!(f, "{}: {}", self.severity(), self.message)?;
        } else {
            write!(f, "{}: {}: {}", self.severity(), self.location, self.message)?;
        }
        for related in &self.related {
            write!(f, " (related: {} at {})", related.message, related.location)?;
        }
        Ok(())
    }
}
