//! [`Error`]-related definitions.

use std::fmt;

use derive_more::Error as StdError;
use itertools::Itertools as _;
use service::{
    command::move_opportunity,
    controller::{board, form},
    domain::opportunity::ValidationError,
    infra::record_store,
};
use tracerr::{Trace, Traced};

/// Defines a new error type.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// Error type.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        #[repr(u16)]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                match err {
                    $(
                        $name::$variant => Self {
                            code: $code,
                            retryable: false,
                            message: $message.to_string(),
                            backtrace: None,
                        },
                    )*
                }
            }
        }
    };
}

/// Console [`Error`] reported to the user.
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// Indicator whether the failed action may succeed if simply repeated.
    pub retryable: bool,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,
}

impl Error {
    /// Create a new [`Error`] representing an unexpected failure.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self {
            code: "INTERNAL_ERROR",
            retryable: false,
            message: msg.to_string(),
            backtrace: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            retryable,
            backtrace,
            message,
        } = self;

        write!(
            f,
            "[{code}]: {message}{}{}",
            if *retryable { " (try again later)" } else { "" },
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("\n{trace}"))),
        )
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }
}

impl AsError for record_store::Error {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "STALE_REFERENCE"]
                #[message = "Record no longer exists in the record store, \
                             refresh and try again"]
                StaleReference,
            }
        }

        if self.is_stale_reference() {
            return Some(Error::StaleReference.into());
        }
        self.is_retryable().then(|| crate::Error {
            code: "RECORD_STORE_UNAVAILABLE",
            retryable: true,
            message: self.to_string(),
            backtrace: None,
        })
    }
}

impl AsError for ValidationError {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error {
            code: "VALIDATION_FAILED",
            retryable: false,
            message: format!("`{}`: {self}", self.field()),
            backtrace: None,
        })
    }
}

impl AsError for move_opportunity::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "OPPORTUNITY_NOT_EXISTS"]
                #[message = "`Opportunity` does not exist anymore"]
                OpportunityNotExists,
            }
        }

        match self {
            Self::OpportunityNotExists(_) => {
                Some(Error::OpportunityNotExists.into())
            }
            Self::RecordStore(e) => e.try_as_error(),
        }
    }
}

impl AsError for board::MoveError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "OPPORTUNITY_NOT_LOADED"]
                #[message = "`Opportunity` is not on the board, refresh it \
                             and try again"]
                NotLoaded,

                #[code = "STAGE_NOT_ON_BOARD"]
                #[message = "Board has no column of the target `Stage`"]
                NotOnBoard,
            }
        }

        match self {
            Self::Execution(e) => e.try_as_error(),
            Self::InvalidStage(e) => e.try_as_error(),
            Self::NotLoaded(_) => Some(Error::NotLoaded.into()),
            Self::NotOnBoard(_) => Some(Error::NotOnBoard.into()),
        }
    }
}

impl AsError for form::LoadError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "OPPORTUNITY_NOT_EXISTS"]
                #[message = "`Opportunity` does not exist"]
                OpportunityNotExists,
            }
        }

        match self {
            Self::Detached => None,
            Self::OpportunityNotExists(_) => {
                Some(Error::OpportunityNotExists.into())
            }
            Self::RecordStore(e) => e.try_as_error(),
        }
    }
}

#[cfg(test)]
mod spec {
    use service::{
        controller::board::MoveError, domain::opportunity,
        infra::record_store,
    };

    use super::AsError as _;

    fn rejected(status: u16) -> record_store::Error {
        record_store::Error::Rejected {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn codes_record_store_errors() {
        assert_eq!(rejected(404).as_error().code, "STALE_REFERENCE");

        let unavailable = rejected(503).as_error();
        assert_eq!(unavailable.code, "RECORD_STORE_UNAVAILABLE");
        assert!(unavailable.retryable);

        let rejected = rejected(400).as_error();
        assert_eq!(rejected.code, "INTERNAL_ERROR");
        assert!(!rejected.retryable);
    }

    #[test]
    fn codes_move_errors() {
        let err = MoveError::NotLoaded(opportunity::Id::new()).as_error();
        assert_eq!(err.code, "OPPORTUNITY_NOT_LOADED");
        assert!(!err.retryable);

        let err = MoveError::InvalidStage(
            opportunity::ValidationError::InvalidStage(9),
        )
        .as_error();
        assert_eq!(err.code, "VALIDATION_FAILED");
        assert_eq!(err.message, "`Stage`: invalid stage code: 9");
    }

    #[test]
    fn displays_code_and_message() {
        let err = rejected(503).as_error();

        assert!(
            err.to_string().starts_with("[RECORD_STORE_UNAVAILABLE]: "),
            "{err}",
        );
        assert!(err.to_string().ends_with("(try again later)"), "{err}");
    }
}
