use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use super::questions::FACILITY_QUESTION_COUNT;
use super::{FormError, FormPhase, MissingField, Notice, PendingSubmission, Result, Score, ValidationError};
use crate::database::{DocumentHandle, GatewayError, SubmissionDocument, SubmissionGateway, FACILITIES_COLLECTION};

pub const FACILITY_INCOMPLETE: &str =
    "Please fill in all required fields including year, suggestions, and all feedback questions.";
pub const FACILITY_SUBMITTED: &str = "Feedback submitted successfully!";
pub const FACILITY_FAILED: &str = "Failed to submit feedback. Please try again.";

/// Everything the facility form collects.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct FacilityForm {
    pub year: String,
    pub responses: [Option<Score>; FACILITY_QUESTION_COUNT],
    pub suggestions: String,
}

impl FacilityForm {
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let mut missing = Vec::new();

        if self.year.is_empty() {
            missing.push(MissingField::Year);
        }
        missing.extend(
            self.responses
                .iter()
                .enumerate()
                .filter(|(_, response)| response.is_none())
                .map(|(index, _)| MissingField::Response { index }),
        );
        if self.suggestions.is_empty() {
            missing.push(MissingField::Suggestions);
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(FACILITY_INCOMPLETE, missing))
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FacilityDocument {
    pub year: String,
    pub responses: [Option<Score>; FACILITY_QUESTION_COUNT],
    pub suggestions: String,
    pub submitted_at: DateTime<Utc>,
}

impl FacilityDocument {
    pub fn new(form: &FacilityForm, submitted_at: DateTime<Utc>) -> Self {
        Self {
            year: form.year.clone(),
            responses: form.responses,
            suggestions: form.suggestions.clone(),
            submitted_at,
        }
    }
}

impl SubmissionDocument for FacilityDocument {
    const COLLECTION: &'static str = FACILITIES_COLLECTION;

    fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

pub struct FacilityController {
    gateway: Arc<dyn SubmissionGateway>,
    form: FacilityForm,
    phase: FormPhase,
    notice: Option<Notice>,
}

impl FacilityController {
    pub fn new(gateway: Arc<dyn SubmissionGateway>) -> Self {
        Self {
            gateway,
            form: FacilityForm::default(),
            phase: FormPhase::Editing,
            notice: None,
        }
    }

    pub fn form(&self) -> &FacilityForm {
        &self.form
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn gateway(&self) -> Arc<dyn SubmissionGateway> {
        self.gateway.clone()
    }

    pub fn set_year(&mut self, year: impl Into<String>) {
        self.form.year = year.into();
    }

    pub fn set_suggestions(&mut self, suggestions: impl Into<String>) {
        self.form.suggestions = suggestions.into();
    }

    pub fn set_response(&mut self, index: usize, score: u8) -> Result<()> {
        if index >= FACILITY_QUESTION_COUNT {
            return Err(FormError::InvalidInput(format!(
                "question index {} out of range (0..{})",
                index, FACILITY_QUESTION_COUNT
            )));
        }
        let score = Score::new(score)?;
        self.form.responses[index] = Some(score);
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.form.validate().is_ok()
    }

    /// Validates, snapshots the form and enters `Submitting`.
    pub fn begin_submit(&mut self) -> Result<PendingSubmission<FacilityDocument>> {
        if self.phase == FormPhase::Submitting {
            warn!("Facility feedback submit ignored: already in flight");
            return Err(FormError::SubmissionInFlight);
        }

        if let Err(e) = self.form.validate() {
            info!("Facility feedback incomplete: {} field(s) missing", e.missing().len());
            self.notice = Some(Notice::error(e.message()));
            return Err(e.into());
        }

        let pending = PendingSubmission::new(FacilityDocument::new(&self.form, Utc::now()))?;
        self.phase = FormPhase::Submitting;
        Ok(pending)
    }

    /// Applies the gateway outcome of a submission started with `begin_submit`.
    pub fn finish_submit(
        &mut self,
        outcome: std::result::Result<DocumentHandle, GatewayError>,
    ) -> Result<DocumentHandle> {
        self.phase = FormPhase::Editing;

        match outcome {
            Ok(handle) => {
                info!("✅ Facility feedback stored as {}", handle.id);
                self.form = FacilityForm::default();
                self.notice = Some(Notice::success(FACILITY_SUBMITTED));
                Ok(handle)
            }
            Err(e) => {
                error!("Error writing facility feedback: {}", e);
                self.notice = Some(Notice::error(FACILITY_FAILED));
                Err(e.into())
            }
        }
    }

    pub async fn submit(&mut self) -> Result<DocumentHandle> {
        let pending = self.begin_submit()?;
        let outcome = pending.send(self.gateway.as_ref()).await;
        self.finish_submit(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryGateway;
    use serde_json::json;

    fn filled(controller: &mut FacilityController) {
        controller.set_year("3");
        controller.set_suggestions("More water coolers");
        for (index, score) in [5, 4, 3, 2, 1, 4].into_iter().enumerate() {
            controller.set_response(index, score).unwrap();
        }
    }

    fn controller() -> (Arc<InMemoryGateway>, FacilityController) {
        let gateway = Arc::new(InMemoryGateway::new());
        (gateway.clone(), FacilityController::new(gateway))
    }

    #[test]
    fn test_initial_state_is_empty() {
        let (_, controller) = controller();
        assert_eq!(controller.form().responses, [None; FACILITY_QUESTION_COUNT]);
        assert_eq!(controller.phase(), FormPhase::Editing);
        assert!(!controller.is_complete());
    }

    #[test]
    fn test_set_response_overwrites_and_rejects_bad_input() {
        let (_, mut controller) = controller();
        controller.set_response(2, 1).unwrap();
        controller.set_response(2, 5).unwrap();
        assert_eq!(controller.form().responses[2], Some(Score::new(5).unwrap()));

        assert!(matches!(controller.set_response(6, 3), Err(FormError::InvalidInput(_))));
        assert!(matches!(controller.set_response(0, 0), Err(FormError::InvalidInput(_))));
        assert_eq!(controller.form().responses[0], None);
    }

    #[test]
    fn test_validation_lists_every_missing_field() {
        let (_, mut controller) = controller();
        controller.set_response(0, 3).unwrap();

        let err = controller.form().validate().unwrap_err();
        assert_eq!(err.message(), FACILITY_INCOMPLETE);
        assert_eq!(err.missing()[0], MissingField::Year);
        assert_eq!(err.missing()[1], MissingField::Response { index: 1 });
        assert_eq!(err.missing().last(), Some(&MissingField::Suggestions));
        assert_eq!(err.missing().len(), 7);
    }

    #[tokio::test]
    async fn test_submit_stores_document_in_order_and_resets() {
        let (gateway, mut controller) = controller();
        filled(&mut controller);

        let handle = controller.submit().await.unwrap();
        assert_eq!(handle.collection, FACILITIES_COLLECTION);

        let stored = gateway.documents_in(FACILITIES_COLLECTION);
        assert_eq!(stored.len(), 1);
        let fields = &stored[0].payload.fields;
        assert_eq!(fields["year"], json!("3"));
        assert_eq!(fields["responses"], json!([5, 4, 3, 2, 1, 4]));
        assert_eq!(fields["suggestions"], json!("More water coolers"));

        assert_eq!(controller.form(), &FacilityForm::default());
        assert_eq!(controller.notice(), Some(&Notice::success(FACILITY_SUBMITTED)));
    }

    #[tokio::test]
    async fn test_incomplete_form_never_reaches_gateway() {
        for blank in ["year", "suggestions", "response"] {
            let (gateway, mut controller) = controller();
            filled(&mut controller);
            match blank {
                "year" => controller.set_year(""),
                "suggestions" => controller.set_suggestions(""),
                _ => controller.form.responses[4] = None,
            }

            let result = controller.submit().await;
            assert!(matches!(result, Err(FormError::Validation(_))), "blank {}", blank);
            assert_eq!(gateway.attempts(), 0);
            assert_eq!(controller.notice().map(|n| n.message.as_str()), Some(FACILITY_INCOMPLETE));
        }
    }

    #[tokio::test]
    async fn test_gateway_failure_preserves_input() {
        let (gateway, mut controller) = controller();
        filled(&mut controller);
        let before = controller.form().clone();
        gateway.fail_next(1);

        let result = controller.submit().await;
        assert!(matches!(result, Err(FormError::Gateway(_))));
        assert_eq!(controller.form(), &before);
        assert_eq!(controller.phase(), FormPhase::Editing);
        let notice = controller.notice().unwrap();
        assert_eq!(notice.message, FACILITY_FAILED);
        assert!(notice.retryable);

        controller.submit().await.unwrap();
        assert_eq!(gateway.documents().len(), 1);
    }

    #[test]
    fn test_second_begin_submit_is_rejected_while_in_flight() {
        let (gateway, mut controller) = controller();
        filled(&mut controller);

        let _pending = controller.begin_submit().unwrap();
        assert_eq!(controller.phase(), FormPhase::Submitting);
        assert!(matches!(controller.begin_submit(), Err(FormError::SubmissionInFlight)));
        assert_eq!(gateway.attempts(), 0);
    }
}
