// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Well-known marker values used for in-band control flow inside the
//! Evaluator and Serializer.
//!
//! These are never raw strings compared by equality — each is a distinct
//! enum variant, so a user string can never collide with one by accident.

/// A sentinel's semantic kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentinelKind {
    /// Causes the enclosing list/filter entry to be dropped.
    Ignore,
    /// `Store::get` poison pill: the key was required but absent.
    NotFound,
    /// A `case` arm's `when.field` was absent from the record.
    CaseMiss,
    /// A dotted-path lookup hit a missing segment.
    ObjectNotFound,
    /// An `ignore` transformer's predicate did not fire.
    DoNotIgnore,
    /// Reserved for `enum` transformer fallback bookkeeping.
    OnError,
}

impl SentinelKind {
    /// The opaque token an implementer might use if sentinels ever needed to
    /// round-trip through a string-only channel (logs, debug output). Never
    /// compared against for equality — see the module docs.
    pub fn token(self) -> &'static str {
        match self {
            SentinelKind::Ignore => "##IGNORE##",
            SentinelKind::NotFound => "##NOT_FOUND##",
            SentinelKind::CaseMiss => "##CASE_PIL",
            SentinelKind::ObjectNotFound => "#$OBJECT_NOT_FOUND$",
            SentinelKind::DoNotIgnore => "##$IGNORE_PIL",
            SentinelKind::OnError => "##ON_ERROR_TOKEN##",
        }
    }
}

impl std::fmt::Display for SentinelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_distinct() {
        let all = [
            SentinelKind::Ignore,
            SentinelKind::NotFound,
            SentinelKind::CaseMiss,
            SentinelKind::ObjectNotFound,
            SentinelKind::DoNotIgnore,
            SentinelKind::OnError,
        ];
        for (i, a) in all.iter().enumerate() {
            for (j, b) in all.iter().enumerate() {
                if i != j {
                    assert_ne!(a.token(), b.token());
                }
            }
        }
    }
}
