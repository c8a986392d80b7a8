//! Passphrase reading and advisory strength guidance

use crate::error::{ErrorCategory, ErrorKind, LockboxError, Result};
use std::fmt;
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// Recommended minimum passphrase length, in characters
pub const RECOMMENDED_MIN_LEN: usize = 12;

/// Trait for reading passphrases from various sources
pub trait PassphraseReader {
    /// Read a passphrase as arbitrary bytes (not necessarily UTF-8)
    ///
    /// Returns the passphrase wrapped in `Zeroizing` to ensure it is securely
    /// wiped from memory when dropped.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// Returns a fixed passphrase (for testing)
#[cfg(test)]
pub(crate) struct ConstantPassphraseReader {
    passphrase: Zeroizing<Vec<u8>>,
}

#[cfg(test)]
impl ConstantPassphraseReader {
    pub fn new(passphrase: Vec<u8>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase),
        }
    }
}

#[cfg(test)]
impl PassphraseReader for ConstantPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new((*self.passphrase).clone()))
    }
}

/// Reads passphrase from any io::Read source
///
/// Every byte is taken verbatim, including any trailing newline.
pub struct ReaderPassphraseReader {
    reader: Box<dyn Read>,
}

impl ReaderPassphraseReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PassphraseReader for ReaderPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            LockboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("error reading passphrase: {}", e),
                e,
            )
        })?;
        Ok(data)
    }
}

/// Reads passphrase from terminal with no echo
#[derive(Default)]
pub struct TerminalPassphraseReader;

impl TerminalPassphraseReader {
    pub fn new() -> Self {
        Self
    }
}

impl PassphraseReader for TerminalPassphraseReader {
    /// Read passphrase from terminal.
    ///
    /// Note: Terminal input is limited to UTF-8 due to rpassword library constraints.
    /// For non-UTF-8 passphrases, use --passphrase-stdin instead.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if !io::stdin().is_terminal() {
            return Err(LockboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "cannot read passphrase from terminal - stdin is not a terminal",
            ));
        }

        let mut stderr = io::stderr();
        stderr
            .write_all(b"Password (lockbox): ")
            .and_then(|()| stderr.flush())
            .map_err(|e| {
                LockboxError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;

        // rpassword returns a plain String; move its buffer straight into
        // a Zeroizing wrapper.
        let passphrase = rpassword::read_password().map_err(|e| {
            LockboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("failure reading passphrase: {}", e),
                e,
            )
        })?;

        Ok(Zeroizing::new(passphrase.into_bytes()))
    }
}

/// A weakness found by [`advise`]. Purely advisory; nothing is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advice {
    TooShort,
    NoUppercase,
    NoLowercase,
    NoSymbol,
}

impl fmt::Display for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advice::TooShort => write!(
                f,
                "use at least {} characters (12-20 is a good range)",
                RECOMMENDED_MIN_LEN
            ),
            Advice::NoUppercase => f.write_str("mix in upper case letters"),
            Advice::NoLowercase => f.write_str("mix in lower case letters"),
            Advice::NoSymbol => f.write_str("mix in symbols such as $, @ or !"),
        }
    }
}

/// Check a passphrase against the usual strength guidance.
///
/// Length is counted in characters for UTF-8 input and in bytes otherwise.
/// Non-ASCII characters count as symbols.
pub fn advise(passphrase: &[u8]) -> Vec<Advice> {
    let chars: Vec<char> = match std::str::from_utf8(passphrase) {
        Ok(s) => s.chars().collect(),
        Err(_) => passphrase.iter().map(|&b| b as char).collect(),
    };

    let mut advice = Vec::new();
    if chars.len() < RECOMMENDED_MIN_LEN {
        advice.push(Advice::TooShort);
    }
    if !chars.iter().any(|c| c.is_uppercase()) {
        advice.push(Advice::NoUppercase);
    }
    if !chars.iter().any(|c| c.is_lowercase()) {
        advice.push(Advice::NoLowercase);
    }
    if !chars.iter().any(|c| !c.is_ascii_alphanumeric() && !c.is_whitespace()) {
        advice.push(Advice::NoSymbol);
    }
    advice
}

/// Wraps another PassphraseReader and reports strength advice to a sink
///
/// Used when choosing a passphrase for encryption. The passphrase is passed
/// through unchanged whatever the advice; failures writing the advice are
/// ignored.
pub struct AdvisingPassphraseReader<W: Write> {
    upstream: Box<dyn PassphraseReader>,
    sink: W,
}

impl<W: Write> AdvisingPassphraseReader<W> {
    pub fn new(upstream: Box<dyn PassphraseReader>, sink: W) -> Self {
        Self { upstream, sink }
    }

    pub fn into_sink(self) -> W {
        self.sink
    }
}

impl<W: Write> PassphraseReader for AdvisingPassphraseReader<W> {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let passphrase = self.upstream.read_passphrase()?;
        let advice = advise(&passphrase);
        if !advice.is_empty() {
            let _ = writeln!(self.sink, "Warning: weak password. Advice:");
            for item in &advice {
                let _ = writeln!(self.sink, "  - {}", item);
            }
            let _ = writeln!(
                self.sink,
                "There is no way to recover the file without it; keep it in a password manager."
            );
        }
        Ok(passphrase)
    }
}
