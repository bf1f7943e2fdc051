use std::fmt;

use thiserror::Error;

/// One of the four portal calls, in the order they are made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    LoginPage,
    Login,
    SetCulture,
    Bulletins,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::LoginPage => "login page",
            Step::Login => "login",
            Step::SetCulture => "set culture",
            Step::Bulletins => "bulletins",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("anti-forgery token not found on the login page")]
    TokenMissing,

    /// The login response did not look like an authenticated page.
    #[error("login rejected by the portal")]
    LoginRejected { body: String },

    /// The bulletins response was empty or had no grade table.
    #[error("portal returned no grade table")]
    GradesUnavailable { body: String },

    #[error("{step} request failed")]
    Transport {
        step: Step,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    pub(crate) fn transport(step: Step) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Transport { step, source }
    }

    /// Raw portal markup attached to the error, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::LoginRejected { body } | Self::GradesUnavailable { body } => Some(body),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport { source, .. } | Self::Client(source) => source.is_timeout(),
            _ => false,
        }
    }
}
