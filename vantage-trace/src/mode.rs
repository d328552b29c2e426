//! Tracer verbosity, resolved from the environment with a loose parser.

/// Environment variable key for the trace mode.
pub const TRACE_ENV_KEY: &str = "VANTAGE_TRACE";

/// Controls what the tracer records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceMode {
    /// No recording; spans are no-op stand-ins. The misconfigured-backend
    /// degradation path lands here.
    Silent,
    /// Span names, statuses, and durations.
    #[default]
    Spans,
    /// Spans plus attribute payloads in emitted events.
    Payloads,
}

impl TraceMode {
    /// Parse from a case-insensitive string. Returns `None` for unknown values.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "silent" | "off" | "none" => Some(Self::Silent),
            "spans" | "on" => Some(Self::Spans),
            "payloads" | "full" | "debug" => Some(Self::Payloads),
            _ => None,
        }
    }

    /// Resolve the effective mode. Priority: env var > builder value > default.
    /// Unknown env values warn and fall through.
    pub fn resolve(env_key: &str, builder_value: Option<TraceMode>) -> Self {
        if let Ok(val) = std::env::var(env_key) {
            if let Some(mode) = Self::from_str_loose(&val) {
                return mode;
            }
            tracing::warn!(env = env_key, value = %val, "unknown trace mode, falling back");
        }
        builder_value.unwrap_or_default()
    }
}

impl std::fmt::Display for TraceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Silent => write!(f, "silent"),
            Self::Spans => write!(f, "spans"),
            Self::Payloads => write!(f, "payloads"),
        }
    }
}
