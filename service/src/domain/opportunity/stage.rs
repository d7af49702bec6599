//! [`Stage`] rules of an [`Opportunity`].
//!
//! Everything here is pure: transitions are computed from the current draft
//! state and the requested [`Stage`] only, without consulting the record
//! store.

use common::define_kind;
#[cfg(doc)]
use common::DateTime;

use crate::domain::employee;
#[cfg(doc)]
use crate::domain::Opportunity;

use super::{ClosingDateTime, ValidationError};

define_kind! {
    #[doc = "Pipeline position of an [`Opportunity`]."]
    enum Stage {
        #[doc = "Potential deal has been identified."]
        Prospecting = 1,

        #[doc = "Customer's fit and budget are being qualified."]
        Qualification = 2,

        #[doc = "Customer's needs are being analyzed."]
        NeedsAnalysis = 3,

        #[doc = "Proposal has been sent to the customer."]
        Proposal = 4,

        #[doc = "Terms are being negotiated."]
        Negotiation = 5,

        #[doc = "Deal is won."]
        ClosedWon = 6,

        #[doc = "Deal is lost."]
        ClosedLost = 7,
    }
}

impl Stage {
    /// First open [`Stage`], which new [`Opportunity`]s start in.
    pub const FIRST: Self = Self::Prospecting;

    /// Parses the provided raw stage `code`.
    ///
    /// # Errors
    ///
    /// With [`ValidationError::InvalidStage`] if the `code` is not a known
    /// [`Stage`].
    pub fn from_code(code: i64) -> Result<Self, ValidationError> {
        u8::try_from(code)
            .ok()
            .and_then(|c| Self::try_from(c).ok())
            .ok_or(ValidationError::InvalidStage(code))
    }

    /// Returns [`Class`] of this [`Stage`].
    #[must_use]
    pub const fn class(self) -> Class {
        match self {
            Self::Prospecting
            | Self::Qualification
            | Self::NeedsAnalysis
            | Self::Proposal
            | Self::Negotiation => Class::Open,
            Self::ClosedWon => Class::ClosedWon,
            Self::ClosedLost => Class::ClosedLost,
        }
    }

    /// Indicates whether this [`Stage`] is an open one.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self.class(), Class::Open)
    }

    /// Indicates whether this [`Stage`] is a terminal (closed) one.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        !self.is_open()
    }
}

/// Classification of a [`Stage`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Class {
    /// Deal is still in progress.
    Open,

    /// Deal is closed as won.
    ClosedWon,

    /// Deal is closed as lost.
    ClosedLost,
}

/// Metadata describing how an [`Opportunity`] was closed.
///
/// All the fields are absent while the [`Opportunity`] is in an open
/// [`Stage`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Closing {
    /// [`DateTime`] when the [`Opportunity`] was closed.
    pub closed_at: Option<ClosingDateTime>,

    /// Free-text reason of closing.
    pub reason: Option<String>,

    /// ID of the employee who closed the [`Opportunity`].
    pub closed_by: Option<employee::Id>,
}

impl Closing {
    /// Indicates whether none of the closing metadata is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.closed_at.is_none()
            && self.reason.is_none()
            && self.closed_by.is_none()
    }

    /// Returns the close reason, if it's present and not blank.
    #[must_use]
    pub fn non_blank_reason(&self) -> Option<&str> {
        self.reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}

/// Presence rule of a single closing field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldRule {
    /// Field must be absent and is cleared.
    Forbidden,

    /// Field may be present or absent.
    Optional,

    /// Field may be present, and falls back to the owner of the
    /// [`Opportunity`] when absent.
    DefaultsToOwner,

    /// Field must be present and non-blank.
    Required,
}

/// Presence rules of the [`Closing`] fields for some [`Stage`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Requirements {
    /// Rule for [`Closing::closed_at`].
    pub closed_at: FieldRule,

    /// Rule for [`Closing::reason`].
    pub reason: FieldRule,

    /// Rule for [`Closing::closed_by`].
    pub closed_by: FieldRule,
}

impl Requirements {
    /// Returns the [`Requirements`] of the provided [`Stage`].
    #[must_use]
    pub const fn of(stage: Stage) -> Self {
        use FieldRule as R;

        match stage.class() {
            Class::Open => Self {
                closed_at: R::Forbidden,
                reason: R::Forbidden,
                closed_by: R::Forbidden,
            },
            Class::ClosedWon => Self {
                closed_at: R::Optional,
                reason: R::Optional,
                closed_by: R::DefaultsToOwner,
            },
            Class::ClosedLost => Self {
                closed_at: R::Optional,
                reason: R::Required,
                closed_by: R::DefaultsToOwner,
            },
        }
    }

    /// Normalizes the provided [`Closing`] according to these
    /// [`Requirements`]: forbidden fields are cleared, blank reasons are
    /// dropped and the closer falls back to the `owner`.
    ///
    /// Required fields are not enforced here, use [`Requirements::check()`]
    /// for that.
    #[must_use]
    pub fn apply(self, closing: &Closing, owner: Option<employee::Id>) -> Closing {
        use FieldRule as R;

        let reason = closing.non_blank_reason().map(ToOwned::to_owned);
        Closing {
            closed_at: match self.closed_at {
                R::Forbidden => None,
                R::Optional | R::DefaultsToOwner | R::Required => {
                    closing.closed_at
                }
            },
            reason: match self.reason {
                R::Forbidden => None,
                R::Optional | R::DefaultsToOwner | R::Required => reason,
            },
            closed_by: match self.closed_by {
                R::Forbidden => None,
                R::DefaultsToOwner => closing.closed_by.or(owner),
                R::Optional | R::Required => closing.closed_by,
            },
        }
    }

    /// Checks the provided [`Closing`] satisfies these [`Requirements`].
    ///
    /// # Errors
    ///
    /// - [`ValidationError::CloseReasonRequired`] if a required reason is
    ///   absent or blank.
    /// - [`ValidationError::ClosingForbidden`] if any field is present while
    ///   forbidden.
    pub fn check(self, closing: &Closing) -> Result<(), ValidationError> {
        use FieldRule as R;

        if self.reason == R::Required && closing.non_blank_reason().is_none() {
            return Err(ValidationError::CloseReasonRequired);
        }
        let forbidden_present = (self.closed_at == R::Forbidden
            && closing.closed_at.is_some())
            || (self.reason == R::Forbidden && closing.reason.is_some())
            || (self.closed_by == R::Forbidden && closing.closed_by.is_some());
        if forbidden_present {
            return Err(ValidationError::ClosingForbidden);
        }
        Ok(())
    }
}

/// Stage-related part of an [`Opportunity`] draft.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Progress {
    /// Current [`Stage`].
    pub stage: Stage,

    /// Current [`Closing`] metadata.
    pub closing: Closing,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            stage: Stage::FIRST,
            closing: Closing::default(),
        }
    }
}

impl Progress {
    /// Computes the [`Progress`] after moving into the provided [`Stage`].
    ///
    /// Moving into an open [`Stage`] always clears the [`Closing`] metadata,
    /// whatever was set before. Moving into a closed [`Stage`] keeps the
    /// provided metadata and defaults the closer to the `owner`.
    #[must_use]
    pub fn transition(&self, to: Stage, owner: Option<employee::Id>) -> Self {
        Self {
            stage: to,
            closing: Requirements::of(to).apply(&self.closing, owner),
        }
    }
}
