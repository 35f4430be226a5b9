use thiserror::Error;

use crate::composer::no_data_response;

/// Errors produced while answering a weather question.
#[derive(Error, Debug)]
pub enum Error {
    /// The caller handed over no query at all.
    #[error("Missing argument: no query text was provided")]
    InputMissing,

    /// The query did not mention a recognizable place.
    #[error("No location found in query")]
    NoLocationFound,

    /// Geocoding returned nothing for the given name.
    #[error("Location not found: {name}")]
    LocationNotFound { name: String },

    /// The weather provider could not be reached or answered with an error.
    #[error("Weather gateway error: {message}")]
    Gateway { message: String },

    /// The generative backend failed.
    #[error("Composer error: {message}")]
    Composer { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    pub fn location_not_found<S: Into<String>>(name: S) -> Self {
        Self::LocationNotFound { name: name.into() }
    }

    pub fn gateway<S: Into<String>>(message: S) -> Self {
        Self::Gateway { message: message.into() }
    }

    pub fn composer<S: Into<String>>(message: S) -> Self {
        Self::Composer { message: message.into() }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    /// Text that can be shown to the person asking the question.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Error::InputMissing => "Please type a question about the weather.".to_string(),
            Error::NoLocationFound => {
                "Which location do you mean? Please specify a city, for example \
                 \"What's the weather in Boston?\""
                    .to_string()
            }
            Error::LocationNotFound { .. } | Error::Gateway { .. } => no_data_response(self),
            Error::Composer { .. } => {
                "Sorry, I couldn't put together an answer this time.".to_string()
            }
            Error::Config { message } => format!("Configuration problem: {message}"),
        }
    }
}
