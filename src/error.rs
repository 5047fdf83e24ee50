// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use std::io;

/// The kind of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A log call was made on a logger without any transport.
    NoTransports,
    /// The level of a log call is not in the active level table.
    UnknownLevel,
    /// A transport failed to write a log entry.
    TransportWrite,
    /// A transport with the same name is already registered.
    DuplicateTransport,
    /// No transport or logger is registered under the given name.
    NotFound,
    /// A transport or logger was configured with contradicting options.
    InvalidConfig,
    /// An underlying IO operation failed.
    Io,
}

impl ErrorKind {
    fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NoTransports => "NoTransports",
            ErrorKind::UnknownLevel => "UnknownLevel",
            ErrorKind::TransportWrite => "TransportWrite",
            ErrorKind::DuplicateTransport => "DuplicateTransport",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::InvalidConfig => "InvalidConfig",
            ErrorKind::Io => "Io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error struct returned by all fallible logu operations.
pub struct Error {
    kind: ErrorKind,
    message: String,
    sources: Vec<anyhow::Error>,
    context: Vec<(&'static str, String)>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)?;

        if !self.context.is_empty() {
            write!(f, ", context: {{ ")?;
            write!(
                f,
                "{}",
                self.context
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )?;
            write!(f, " }}")?;
        }

        if !self.sources.is_empty() {
            write!(f, ", sources: [")?;
            for (i, source) in self.sources.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{source}")?;
            }
            write!(f, "]")?;
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // If alternate has been specified, we will print like Debug.
        if f.alternate() {
            let mut de = f.debug_struct("Error");
            de.field("kind", &self.kind);
            de.field("message", &self.message);
            de.field("context", &self.context);
            de.field("sources", &self.sources);
            return de.finish();
        }

        write!(f, "{}: {}", self.kind, self.message)?;
        writeln!(f)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "Context:")?;
            for (k, v) in self.context.iter() {
                writeln!(f, "   {k}: {v}")?;
            }
        }
        if !self.sources.is_empty() {
            writeln!(f)?;
            writeln!(f, "Sources:")?;
            for source in self.sources.iter() {
                writeln!(f, "   {source:#}")?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.sources.first().map(|v| v.as_ref())
    }
}

impl Error {
    /// Create a new Error with error kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            sources: vec![],
            context: vec![],
        }
    }

    /// Return the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Return the message of this error, without context or sources.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Add one more context in error.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Add one more source in error.
    pub fn with_source(mut self, src: impl Into<anyhow::Error>) -> Self {
        self.sources.push(src.into());
        self
    }

    /// Return the value of the first context entry with the given key.
    pub fn context(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Return the name of the transport that failed, if this error was raised by a transport.
    pub fn transport(&self) -> Option<&str> {
        self.context("transport")
    }

    /// Return an iterator over all sources of this error.
    pub fn sources(&self) -> impl ExactSizeIterator<Item = &(dyn std::error::Error + 'static)> {
        self.sources.iter().map(|v| v.as_ref())
    }

    /// Default constructor for [`Error`] from [`io::Error`].
    pub fn from_io_error(err: io::Error) -> Error {
        Error::new(ErrorKind::Io, "failed to perform io").with_source(err)
    }

    /// Default constructor for [`Error`] from [`fmt::Error`].
    pub fn from_fmt_error(err: fmt::Error) -> Error {
        Error::new(ErrorKind::Io, "failed to perform format").with_source(err)
    }

    pub(crate) fn no_transports() -> Error {
        Error::new(ErrorKind::NoTransports, "cannot log with no transports")
    }

    pub(crate) fn unknown_level(level: &str) -> Error {
        Error::new(ErrorKind::UnknownLevel, format!("unknown log level: {level}"))
            .with_context("level", level)
    }

    /// Wrap a failure of a transport, tagging it with the transport name.
    pub fn transport_write(transport: &str, err: Error) -> Error {
        Error::new(ErrorKind::TransportWrite, "failed to write log entry")
            .with_context("transport", transport)
            .with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context_and_sources() {
        let err = Error::new(ErrorKind::NotFound, "no such transport")
            .with_context("name", "console")
            .with_source(io::Error::other("disk gone"));
        insta::assert_snapshot!(
            err.to_string(),
            @"no such transport (NotFound), context: { name: console }, sources: [disk gone]"
        );
    }

    #[test]
    fn test_transport_write_is_tagged() {
        let inner = Error::from_io_error(io::Error::other("broken pipe"));
        let err = Error::transport_write("file", inner);
        assert_eq!(err.kind(), ErrorKind::TransportWrite);
        assert_eq!(err.transport(), Some("file"));
        assert!(err.to_string().contains("broken pipe"));
    }

    #[test]
    fn test_unknown_level_message() {
        let err = Error::unknown_level("loud");
        assert_eq!(err.kind(), ErrorKind::UnknownLevel);
        assert_eq!(err.message(), "unknown log level: loud");
        assert_eq!(err.context("level"), Some("loud"));
    }
}
