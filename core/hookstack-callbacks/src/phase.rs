//! Callback kinds, timings and the ordered set of hook points.

use crate::error::{CallbackError, CallbackResult};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// The lifecycle action a phase belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallbackKind {
    Validation,
    Initialize,
    Build,
    Create,
    Destroy,
    Save,
    Update,
}

impl CallbackKind {
    pub const ALL: [CallbackKind; 7] = [
        Self::Validation,
        Self::Initialize,
        Self::Build,
        Self::Create,
        Self::Destroy,
        Self::Save,
        Self::Update,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Initialize => "initialize",
            Self::Build => "build",
            Self::Create => "create",
            Self::Destroy => "destroy",
            Self::Save => "save",
            Self::Update => "update",
        }
    }

    /// Timings this kind defines hook points for.
    ///
    /// Initialize and build only notify after the fact; validation has no
    /// around hook.
    pub fn timings(&self) -> &'static [Timing] {
        match self {
            Self::Initialize | Self::Build => &[Timing::After],
            Self::Validation => &[Timing::Before, Timing::After],
            Self::Create | Self::Destroy | Self::Save | Self::Update => {
                &[Timing::Before, Timing::Around, Timing::After]
            }
        }
    }

    pub fn supports(&self, timing: Timing) -> bool {
        self.timings().contains(&timing)
    }
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallbackKind {
    type Err = CallbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CallbackError::UnknownPhase(s.to_string()))
    }
}

/// Where a handler runs relative to the action it hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timing {
    Before,
    Around,
    After,
}

impl Timing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::Around => "around",
            Self::After => "after",
        }
    }
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One hook point, e.g. `before_save`.
///
/// Only the sixteen combinations listed in [`Phase::ALL`] can be built.
/// Phases order by their position in that list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Phase {
    kind: CallbackKind,
    timing: Timing,
}

impl Phase {
    pub const BEFORE_VALIDATION: Phase = Phase::of(Timing::Before, CallbackKind::Validation);
    pub const AFTER_VALIDATION: Phase = Phase::of(Timing::After, CallbackKind::Validation);
    pub const AFTER_INITIALIZE: Phase = Phase::of(Timing::After, CallbackKind::Initialize);
    pub const AFTER_BUILD: Phase = Phase::of(Timing::After, CallbackKind::Build);
    pub const BEFORE_CREATE: Phase = Phase::of(Timing::Before, CallbackKind::Create);
    pub const AROUND_CREATE: Phase = Phase::of(Timing::Around, CallbackKind::Create);
    pub const AFTER_CREATE: Phase = Phase::of(Timing::After, CallbackKind::Create);
    pub const BEFORE_DESTROY: Phase = Phase::of(Timing::Before, CallbackKind::Destroy);
    pub const AROUND_DESTROY: Phase = Phase::of(Timing::Around, CallbackKind::Destroy);
    pub const AFTER_DESTROY: Phase = Phase::of(Timing::After, CallbackKind::Destroy);
    pub const BEFORE_SAVE: Phase = Phase::of(Timing::Before, CallbackKind::Save);
    pub const AROUND_SAVE: Phase = Phase::of(Timing::Around, CallbackKind::Save);
    pub const AFTER_SAVE: Phase = Phase::of(Timing::After, CallbackKind::Save);
    pub const BEFORE_UPDATE: Phase = Phase::of(Timing::Before, CallbackKind::Update);
    pub const AROUND_UPDATE: Phase = Phase::of(Timing::Around, CallbackKind::Update);
    pub const AFTER_UPDATE: Phase = Phase::of(Timing::After, CallbackKind::Update);

    /// Every hook point, in execution-definition order.
    pub const ALL: [Phase; 16] = [
        Self::BEFORE_VALIDATION,
        Self::AFTER_VALIDATION,
        Self::AFTER_INITIALIZE,
        Self::AFTER_BUILD,
        Self::BEFORE_CREATE,
        Self::AROUND_CREATE,
        Self::AFTER_CREATE,
        Self::BEFORE_DESTROY,
        Self::AROUND_DESTROY,
        Self::AFTER_DESTROY,
        Self::BEFORE_SAVE,
        Self::AROUND_SAVE,
        Self::AFTER_SAVE,
        Self::BEFORE_UPDATE,
        Self::AROUND_UPDATE,
        Self::AFTER_UPDATE,
    ];

    const fn of(timing: Timing, kind: CallbackKind) -> Self {
        Self { kind, timing }
    }

    /// Builds a phase, rejecting combinations the kind does not define.
    pub fn new(timing: Timing, kind: CallbackKind) -> CallbackResult<Self> {
        if kind.supports(timing) {
            Ok(Self::of(timing, kind))
        } else {
            Err(CallbackError::UnsupportedPhase { kind, timing })
        }
    }

    pub fn kind(&self) -> CallbackKind {
        self.kind
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    fn position(&self) -> usize {
        Self::ALL
            .iter()
            .position(|p| p == self)
            .unwrap_or(Self::ALL.len())
    }
}

impl PartialOrd for Phase {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Phase {
    fn cmp(&self, other: &Self) -> Ordering {
        self.position().cmp(&other.position())
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.timing, self.kind)
    }
}

impl FromStr for Phase {
    type Err = CallbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|phase| phase.to_string() == s)
            .ok_or_else(|| CallbackError::UnknownPhase(s.to_string()))
    }
}
