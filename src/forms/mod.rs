pub mod facility;
pub mod questions;
pub mod syllabus;

pub use facility::{FacilityController, FacilityDocument, FacilityForm};
pub use questions::*;
pub use syllabus::{
    flatten, restructure, ResponseMatrix, SubjectResponses, SyllabusController, SyllabusDocument,
};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::{DocumentHandle, DocumentPayload, GatewayError, SubmissionDocument, SubmissionGateway};

/// A 1-5 rating.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Order the options are offered in, best first.
    pub const DESCENDING: [u8; 5] = [5, 4, 3, 2, 1];

    pub fn new(value: u8) -> Result<Self, FormError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Score(value))
        } else {
            Err(FormError::InvalidInput(format!(
                "score must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Score {
    type Error = FormError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Score::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> u8 {
        score.0
    }
}

impl FromStr for Score {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| FormError::InvalidInput(format!("not a score: {:?}", s)))?;
        Score::new(value)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A required field left blank.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "field", rename_all = "camelCase")]
pub enum MissingField {
    Year,
    Suggestions,
    Recommendations,
    Response { index: usize },
    Cell { question: String, subject: String },
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingField::Year => write!(f, "year of study"),
            MissingField::Suggestions => write!(f, "suggestions"),
            MissingField::Recommendations => write!(f, "recommendations"),
            MissingField::Response { index } => write!(f, "question {}", index + 1),
            MissingField::Cell { question, subject } => write!(f, "{} for {}", question, subject),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    message: &'static str,
    missing: Vec<MissingField>,
}

impl ValidationError {
    pub(crate) fn new(message: &'static str, missing: Vec<MissingField>) -> Self {
        Self { message, missing }
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    /// Every blank field, in form order.
    pub fn missing(&self) -> &[MissingField] {
        &self.missing
    }
}

#[derive(Error, Debug)]
pub enum FormError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Submission failed: {0}")]
    Gateway(#[from] GatewayError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("A submission is already in progress")]
    SubmissionInFlight,
    #[error("Feedback has already been submitted")]
    AlreadySubmitted,
}

pub type Result<T, E = FormError> = std::result::Result<T, E>;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormPhase {
    Editing,
    Submitting,
    Submitted,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Message shown to the user after a submit attempt.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Whether submitting again may succeed.
    pub retryable: bool,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            retryable: true,
        }
    }
}

/// A validated document waiting to be appended. Produced by a controller's
/// `begin_submit`; the outcome of `send` goes back through `finish_submit`.
#[derive(Debug, Clone)]
pub struct PendingSubmission<D> {
    pub document: D,
    payload: DocumentPayload,
}

impl<D: SubmissionDocument> PendingSubmission<D> {
    pub(crate) fn new(document: D) -> Result<Self> {
        let payload = DocumentPayload::from_document(&document)?;
        Ok(Self { document, payload })
    }

    pub fn collection(&self) -> &'static str {
        D::COLLECTION
    }

    pub fn payload(&self) -> &DocumentPayload {
        &self.payload
    }

    pub async fn send(self, gateway: &dyn SubmissionGateway) -> std::result::Result<DocumentHandle, GatewayError> {
        gateway.append_document(D::COLLECTION, self.payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bounds() {
        assert!(Score::new(0).is_err());
        assert_eq!(Score::new(1).unwrap().value(), 1);
        assert_eq!(Score::new(5).unwrap().value(), 5);
        assert!(Score::new(6).is_err());
    }

    #[test]
    fn test_score_parsing() {
        assert_eq!("3".parse::<Score>().unwrap(), Score::new(3).unwrap());
        assert!("".parse::<Score>().is_err());
        assert!("five".parse::<Score>().is_err());
        assert!("9".parse::<Score>().is_err());
    }

    #[test]
    fn test_score_serde() {
        let score: Score = serde_json::from_str("4").unwrap();
        assert_eq!(serde_json::to_string(&score).unwrap(), "4");
        assert!(serde_json::from_str::<Score>("7").is_err());
    }
}
