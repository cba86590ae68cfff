use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use super::questions::{syllabus_question_key, SYLLABUS_QUESTIONS, SYLLABUS_SUBJECTS};
use super::{FormError, FormPhase, MissingField, PendingSubmission, Result, Score, ValidationError};
use crate::database::{DocumentHandle, GatewayError, SubmissionDocument, SubmissionGateway, SYLLABUS_COLLECTION};
use crate::session::SessionIdentity;

pub const SYLLABUS_INCOMPLETE: &str = "Please fill all required fields before submitting.";
pub const SYLLABUS_FAILED: &str = "There was an error submitting your feedback. Please try again.";

/// Selected scores keyed by question, then subject.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMatrix {
    cells: IndexMap<&'static str, IndexMap<&'static str, Score>>,
}

impl ResponseMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one cell, leaving the question's other subjects untouched.
    pub fn set(&mut self, question_key: &'static str, subject: &'static str, score: Score) {
        self.cells.entry(question_key).or_default().insert(subject, score);
    }

    pub fn get(&self, question_key: &str, subject: &str) -> Option<Score> {
        self.cells.get(question_key)?.get(subject).copied()
    }

    /// Number of answered cells.
    pub fn len(&self) -> usize {
        self.cells.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unanswered cells, question by question in form order.
    pub fn missing_cells(&self) -> Vec<MissingField> {
        SYLLABUS_QUESTIONS
            .iter()
            .flat_map(|question| {
                SYLLABUS_SUBJECTS
                    .iter()
                    .filter(move |subject| self.get(question.key, subject).is_none())
                    .map(move |subject| MissingField::Cell {
                        question: question.key.to_string(),
                        subject: subject.to_string(),
                    })
            })
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.len() == SYLLABUS_QUESTIONS.len() * SYLLABUS_SUBJECTS.len()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SubjectResponses {
    pub responses: IndexMap<String, Option<String>>,
}

/// Question-first matrix to the stored subject-first shape. Subjects and
/// questions come out in form order; unanswered cells become `null`.
pub fn restructure(matrix: &ResponseMatrix) -> IndexMap<String, SubjectResponses> {
    SYLLABUS_SUBJECTS
        .iter()
        .map(|subject| {
            let responses = SYLLABUS_QUESTIONS
                .iter()
                .map(|question| {
                    let score = matrix.get(question.key, subject).map(|s| s.to_string());
                    (question.key.to_string(), score)
                })
                .collect();
            (subject.to_string(), SubjectResponses { responses })
        })
        .collect()
}

/// Inverse of `restructure`.
pub fn flatten(subjects: &IndexMap<String, SubjectResponses>) -> Result<ResponseMatrix> {
    let mut matrix = ResponseMatrix::new();

    for (subject, entry) in subjects {
        let subject = subject_name(subject)
            .ok_or_else(|| FormError::InvalidInput(format!("unknown subject {:?}", subject)))?;

        for (question, score) in &entry.responses {
            let question = syllabus_question_key(question)
                .ok_or_else(|| FormError::InvalidInput(format!("unknown question {:?}", question)))?;
            if let Some(score) = score {
                matrix.set(question, subject, score.parse()?);
            }
        }
    }

    Ok(matrix)
}

fn subject_name(name: &str) -> Option<&'static str> {
    SYLLABUS_SUBJECTS.iter().copied().find(|subject| *subject == name)
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyllabusDocument {
    pub username: String,
    pub recommendations: String,
    pub subjects: IndexMap<String, SubjectResponses>,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionDocument for SyllabusDocument {
    const COLLECTION: &'static str = SYLLABUS_COLLECTION;

    fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

pub struct SyllabusController {
    gateway: Arc<dyn SubmissionGateway>,
    identity: SessionIdentity,
    matrix: ResponseMatrix,
    recommendations: String,
    phase: FormPhase,
    error_message: Option<String>,
    dark_mode: bool,
}

impl SyllabusController {
    pub fn new(gateway: Arc<dyn SubmissionGateway>, identity: SessionIdentity) -> Self {
        Self {
            gateway,
            identity,
            matrix: ResponseMatrix::new(),
            recommendations: String::new(),
            phase: FormPhase::Editing,
            error_message: None,
            dark_mode: false,
        }
    }

    pub fn matrix(&self) -> &ResponseMatrix {
        &self.matrix
    }

    pub fn recommendations(&self) -> &str {
        &self.recommendations
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn gateway(&self) -> Arc<dyn SubmissionGateway> {
        self.gateway.clone()
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn set_dark_mode(&mut self, enabled: bool) {
        self.dark_mode = enabled;
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.dark_mode
    }

    pub fn set_response(&mut self, question_key: &str, subject_index: usize, score: u8) -> Result<()> {
        self.ensure_editable()?;

        let question = syllabus_question_key(question_key)
            .ok_or_else(|| FormError::InvalidInput(format!("unknown question {:?}", question_key)))?;
        let subject = SYLLABUS_SUBJECTS.get(subject_index).copied().ok_or_else(|| {
            FormError::InvalidInput(format!(
                "subject index {} out of range (0..{})",
                subject_index,
                SYLLABUS_SUBJECTS.len()
            ))
        })?;
        let score = Score::new(score)?;

        self.matrix.set(question, subject, score);
        Ok(())
    }

    pub fn set_recommendations(&mut self, text: impl Into<String>) -> Result<()> {
        self.ensure_editable()?;
        self.recommendations = text.into();
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let mut missing = self.matrix.missing_cells();
        if self.recommendations.trim().is_empty() {
            missing.push(MissingField::Recommendations);
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(SYLLABUS_INCOMPLETE, missing))
        }
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    /// Validates, builds the nested document and enters `Submitting`.
    pub fn begin_submit(&mut self) -> Result<PendingSubmission<SyllabusDocument>> {
        match self.phase {
            FormPhase::Submitted => return Err(FormError::AlreadySubmitted),
            FormPhase::Submitting => {
                warn!("Syllabus feedback submit ignored: already in flight");
                return Err(FormError::SubmissionInFlight);
            }
            FormPhase::Editing => {}
        }

        if let Err(e) = self.validate() {
            info!("Syllabus feedback incomplete: {} field(s) missing", e.missing().len());
            self.error_message = Some(e.message().to_string());
            return Err(e.into());
        }

        let document = SyllabusDocument {
            username: self.identity.username().to_string(),
            recommendations: self.recommendations.clone(),
            subjects: restructure(&self.matrix),
            submitted_at: Utc::now(),
        };

        let pending = PendingSubmission::new(document)?;
        self.phase = FormPhase::Submitting;
        Ok(pending)
    }

    pub fn finish_submit(
        &mut self,
        outcome: std::result::Result<DocumentHandle, GatewayError>,
    ) -> Result<DocumentHandle> {
        match outcome {
            Ok(handle) => {
                info!("✅ Syllabus feedback from {} stored as {}", self.identity.username(), handle.id);
                self.phase = FormPhase::Submitted;
                self.error_message = None;
                Ok(handle)
            }
            Err(e) => {
                error!("Error submitting syllabus feedback: {}", e);
                self.phase = FormPhase::Editing;
                self.error_message = Some(SYLLABUS_FAILED.to_string());
                Err(e.into())
            }
        }
    }

    pub async fn submit(&mut self) -> Result<DocumentHandle> {
        let pending = self.begin_submit()?;
        let outcome = pending.send(self.gateway.as_ref()).await;
        self.finish_submit(outcome)
    }

    fn ensure_editable(&self) -> Result<()> {
        if self.phase == FormPhase::Submitted {
            Err(FormError::AlreadySubmitted)
        } else {
            Ok(())
        }
    }
}
