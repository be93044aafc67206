// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Shared error taxonomy.
//!
//! The core never unwinds: every fallible operation returns one of these
//! codes instead of throwing, matching the no-exceptions posture in the
//! design notes. A diagnostic is written to the platform console at the
//! point of failure; the code itself is what callers branch on.

#[cfg(test)]
mod mod_test;

/// A runtime error code, shared across the loader, interpreter, and
/// library methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The allocator could not satisfy a request.
    NoMemory,
    /// Generic interpreter fault (invalid opcode, bad call-info state).
    Runtime,
    /// An operand had the wrong type for the operation.
    Type,
    /// Wrong argument count or an argument outside its accepted domain.
    Argument,
    /// An index was outside the bounds of a sequence.
    Index,
    /// A value fell outside an accepted range.
    Range,
    /// An unbound or unknown name (global, constant, instance variable).
    Name,
    /// Method lookup failed on the receiver's class chain.
    NoMethod,
    /// A user program signaled a script-level failure.
    Script,
    /// The bytecode image failed to parse.
    Syntax,
    /// A non-local control transfer had nowhere to go.
    LocalJump,
    /// Regular-expression engine fault (reserved; no engine ships in core).
    Regexp,
    /// An intrinsic or opcode is recognized but not implemented.
    NotImp,
    /// A floating-point operation is undefined for its operands.
    FloatDomain,
    /// A hash lookup key was not present.
    Key,
}

impl ErrorCode {
    /// Short machine-stable name, used in diagnostics and tests.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoMemory => "NoMemoryError",
            Self::Runtime => "RuntimeError",
            Self::Type => "TypeError",
            Self::Argument => "ArgumentError",
            Self::Index => "IndexError",
            Self::Range => "RangeError",
            Self::Name => "NameError",
            Self::NoMethod => "NoMethodError",
            Self::Script => "ScriptError",
            Self::Syntax => "SyntaxError",
            Self::LocalJump => "LocalJumpError",
            Self::Regexp => "RegexpError",
            Self::NotImp => "NotImplementedError",
            Self::FloatDomain => "FloatDomainError",
            Self::Key => "KeyError",
        }
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Errors that can occur while parsing a bytecode image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    /// File header magic, version, or producer tag did not match.
    BadHeader,
    /// A section or record claimed a length that overruns the image.
    Truncated,
    /// A section or record field contained an out-of-range value.
    Malformed,
    /// The allocator ran out of space while materializing the irep tree.
    NoMemory,
}

impl core::fmt::Display for LoadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BadHeader => write!(f, "bad bytecode image header"),
            Self::Truncated => write!(f, "bytecode image truncated"),
            Self::Malformed => write!(f, "malformed bytecode record"),
            Self::NoMemory => write!(f, "out of memory while loading image"),
        }
    }
}

impl From<LoadError> for ErrorCode {
    fn from(e: LoadError) -> Self {
        match e {
            LoadError::NoMemory => Self::NoMemory,
            LoadError::BadHeader | LoadError::Truncated | LoadError::Malformed => Self::Syntax,
        }
    }
}
