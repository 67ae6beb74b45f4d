// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Activity ids.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one activity in its report and in the `activity` field of every
/// log line a timed call emits, whichever worker emitted it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(Uuid);

impl ActivityId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// The leading eight hex digits. Formatting it does not allocate, so it
    /// is cheap enough for per-call log fields.
    pub fn short(&self) -> ShortActivityId {
        ShortActivityId((self.0.as_u128() >> 96) as u32)
    }
}

impl From<Uuid> for ActivityId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl fmt::Debug for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActivityId({})", self.short())
    }
}

/// Abbreviated [`ActivityId`] for log output.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ShortActivityId(u32);

impl fmt::Display for ShortActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> ActivityId {
        Uuid::parse_str("0a0e8400-e29b-41d4-a716-446655440000")
            .unwrap()
            .into()
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(ActivityId::generate(), ActivityId::generate());
    }

    #[test]
    fn test_short_keeps_leading_zeros() {
        assert_eq!(known().short().to_string(), "0a0e8400");
        assert_eq!(format!("{:?}", known()), "ActivityId(0a0e8400)");
    }

    #[test]
    fn test_display_is_full_uuid() {
        assert_eq!(known().to_string(), "0a0e8400-e29b-41d4-a716-446655440000");
        assert_eq!(known().uuid(), known().0);
    }

    #[test]
    fn test_serializes_as_plain_uuid() {
        let json = serde_json::to_string(&known()).unwrap();
        assert_eq!(json, r#""0a0e8400-e29b-41d4-a716-446655440000""#);
        assert_eq!(serde_json::from_str::<ActivityId>(&json).unwrap(), known());
    }
}
