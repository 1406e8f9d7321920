//! Matcher registry: an ordered pipeline of (pattern, handler) pairs.
//!
//! Free text that is not a command is scanned against every registered
//! pattern in order. The first pattern that matches anywhere in the text
//! selects the one handler that runs; nothing else is tried.
//!
//! Insertion position depends only on the priority and the pipeline length
//! at insertion time:
//!
//! ```text
//!   high    ──▶ index 0
//!   medium  ──▶ index len / 2
//!   low     ──▶ index len (append)
//! ```
//!
//! The medium rule is a mid-point heuristic, not a priority queue: two
//! `medium` matchers registered after a `high` one can still end up on either
//! side of it.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::sync::Arc;

use regex::{Captures, Regex};
use tracing::{debug, trace};

use crate::error::RegistrationError;
use crate::handler::{BoxedMatcherHandler, MatcherHandler};

// =============================================================================
// Priority
// =============================================================================

/// Where a matcher is inserted into the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    /// Appended after every existing matcher.
    #[default]
    Low,
    /// Inserted at the middle of the current pipeline.
    Medium,
    /// Inserted before every existing matcher.
    High,
}

impl Priority {
    /// Returns the lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    fn insertion_index(self, len: usize) -> usize {
        match self {
            Self::High => 0,
            Self::Medium => len / 2,
            Self::Low => len,
        }
    }
}

impl FromStr for Priority {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(RegistrationError::InvalidPriority(other.to_string())),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Patterns
// =============================================================================

/// Conversion into a compiled pattern.
///
/// Only compiled [`Regex`] values are accepted. Raw strings are rejected with
/// [`RegistrationError::InvalidPatternType`] so that a pattern is never
/// compiled lazily at registration time with surprising flags.
pub trait IntoPattern {
    /// Returns the compiled pattern.
    fn into_pattern(self) -> Result<Regex, RegistrationError>;
}

impl IntoPattern for Regex {
    fn into_pattern(self) -> Result<Regex, RegistrationError> {
        Ok(self)
    }
}

impl IntoPattern for &Regex {
    fn into_pattern(self) -> Result<Regex, RegistrationError> {
        Ok(self.clone())
    }
}

impl IntoPattern for &str {
    fn into_pattern(self) -> Result<Regex, RegistrationError> {
        Err(RegistrationError::InvalidPatternType("&str"))
    }
}

impl IntoPattern for String {
    fn into_pattern(self) -> Result<Regex, RegistrationError> {
        Err(RegistrationError::InvalidPatternType("String"))
    }
}

// =============================================================================
// MatchResult
// =============================================================================

/// An owned record of a successful pattern match.
///
/// Group 0 is the whole match. Positions are byte offsets into the text the
/// pattern was matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    haystack: String,
    groups: Vec<Option<Range<usize>>>,
    names: Vec<Option<String>>,
}

impl MatchResult {
    fn from_captures(pattern: &Regex, captures: &Captures<'_>, haystack: &str) -> Self {
        Self {
            haystack: haystack.to_string(),
            groups: captures.iter().map(|m| m.map(|m| m.range())).collect(),
            names: pattern
                .capture_names()
                .map(|name| name.map(str::to_string))
                .collect(),
        }
    }

    /// The matched text.
    pub fn as_str(&self) -> &str {
        self.get(0).unwrap_or_default()
    }

    /// Byte range of the whole match.
    pub fn range(&self) -> Range<usize> {
        self.groups
            .first()
            .cloned()
            .flatten()
            .unwrap_or_default()
    }

    /// Text of capture group `index`, if it participated in the match.
    pub fn get(&self, index: usize) -> Option<&str> {
        let range = self.groups.get(index)?.clone()?;
        self.haystack.get(range)
    }

    /// Text of the named capture group, if it participated in the match.
    pub fn name(&self, name: &str) -> Option<&str> {
        let index = self
            .names
            .iter()
            .position(|n| n.as_deref() == Some(name))?;
        self.get(index)
    }

    /// Number of groups, including group 0.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Always `false`: a match has at least group 0.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

// =============================================================================
// MatcherRegistry
// =============================================================================

struct MatcherEntry {
    pattern: Regex,
    handler: BoxedMatcherHandler,
    priority: Priority,
    seq: u64,
}

/// The ordered matcher pipeline.
#[derive(Default)]
pub struct MatcherRegistry {
    entries: Vec<MatcherEntry>,
    next_seq: u64,
}

impl MatcherRegistry {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a matcher according to `priority`.
    pub fn register<P, H>(
        &mut self,
        pattern: P,
        handler: H,
        priority: Priority,
    ) -> Result<(), RegistrationError>
    where
        P: IntoPattern,
        H: MatcherHandler,
    {
        self.register_boxed(pattern, Arc::new(handler), priority)
    }

    /// Like [`register`](Self::register), for an already shared handler.
    pub fn register_boxed<P: IntoPattern>(
        &mut self,
        pattern: P,
        handler: BoxedMatcherHandler,
        priority: Priority,
    ) -> Result<(), RegistrationError> {
        let pattern = pattern.into_pattern()?;
        let index = priority.insertion_index(self.entries.len());

        debug!(
            pattern = pattern.as_str(),
            priority = %priority,
            index,
            "Registered matcher"
        );

        self.entries.insert(
            index,
            MatcherEntry {
                pattern,
                handler,
                priority,
                seq: self.next_seq,
            },
        );
        self.next_seq += 1;
        Ok(())
    }

    /// Returns the handler of the first pattern found anywhere in `text`.
    pub fn match_first(&self, text: &str) -> Option<(&BoxedMatcherHandler, MatchResult)> {
        self.entries.iter().find_map(|entry| {
            let captures = entry.pattern.captures(text)?;
            trace!(
                pattern = entry.pattern.as_str(),
                priority = %entry.priority,
                "Pattern matched"
            );
            Some((
                &entry.handler,
                MatchResult::from_captures(&entry.pattern, &captures, text),
            ))
        })
    }

    /// Patterns in evaluation order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.pattern.as_str())
    }

    /// Number of matchers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the pipeline is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn checkpoint(&self) -> u64 {
        self.next_seq
    }

    pub(crate) fn rollback(&mut self, checkpoint: u64) {
        self.entries.retain(|e| e.seq < checkpoint);
        self.next_seq = checkpoint;
    }
}

impl fmt::Debug for MatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.patterns()).finish()
    }
}
