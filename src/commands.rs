//! Tauri commands exposing both forms to the desktop front-end.

use std::sync::Arc;

use log::info;
use parking_lot::Mutex;
use serde::Serialize;
use tauri::{Builder, Runtime, State};

use crate::database::{DocumentHandle, SubmissionGateway};
use crate::forms::{
    FacilityController, FacilityForm, FormPhase, Notice, Question, ResponseMatrix, SyllabusController,
    FACILITY_QUESTIONS, RECOMMENDATIONS_PROMPT, SYLLABUS_QUESTIONS, SYLLABUS_SUBJECTS,
};
use crate::session::SessionIdentity;

pub struct FormsState {
    facility: Mutex<FacilityController>,
    syllabus: Mutex<SyllabusController>,
}

impl FormsState {
    pub fn new(gateway: Arc<dyn SubmissionGateway>, identity: SessionIdentity) -> Self {
        Self {
            facility: Mutex::new(FacilityController::new(gateway.clone())),
            syllabus: Mutex::new(SyllabusController::new(gateway, identity)),
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct FormQuestions {
    pub facility: Vec<&'static str>,
    pub syllabus: Vec<Question>,
    pub subjects: Vec<&'static str>,
    pub recommendations_prompt: &'static str,
    pub score_options: [u8; 5],
}

#[derive(Serialize, Clone, Debug)]
pub struct FacilityView {
    pub form: FacilityForm,
    pub phase: FormPhase,
    pub notice: Option<Notice>,
}

#[derive(Serialize, Clone, Debug)]
pub struct SyllabusView {
    pub responses: ResponseMatrix,
    pub recommendations: String,
    pub phase: FormPhase,
    pub error_message: Option<String>,
    pub dark_mode: bool,
    pub username: String,
}

#[tauri::command]
pub fn get_form_questions() -> FormQuestions {
    FormQuestions {
        facility: FACILITY_QUESTIONS.to_vec(),
        syllabus: SYLLABUS_QUESTIONS.to_vec(),
        subjects: SYLLABUS_SUBJECTS.to_vec(),
        recommendations_prompt: RECOMMENDATIONS_PROMPT,
        score_options: crate::forms::Score::DESCENDING,
    }
}

#[tauri::command]
pub fn get_facility_form(state: State<'_, FormsState>) -> FacilityView {
    let facility = state.facility.lock();
    FacilityView {
        form: facility.form().clone(),
        phase: facility.phase(),
        notice: facility.notice().cloned(),
    }
}

#[tauri::command]
pub fn set_facility_year(state: State<'_, FormsState>, year: String) {
    state.facility.lock().set_year(year);
}

#[tauri::command]
pub fn set_facility_response(state: State<'_, FormsState>, index: usize, score: u8) -> Result<(), String> {
    state.facility.lock().set_response(index, score).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn set_facility_suggestions(state: State<'_, FormsState>, suggestions: String) {
    state.facility.lock().set_suggestions(suggestions);
}

#[tauri::command]
pub async fn submit_facility_feedback(state: State<'_, FormsState>) -> Result<DocumentHandle, String> {
    info!("📝 Submitting facility feedback");

    // The lock is released while the store call is in flight; the controller
    // stays in `Submitting` until the outcome is applied.
    let (pending, gateway) = {
        let mut facility = state.facility.lock();
        let pending = facility.begin_submit().map_err(|e| e.to_string())?;
        (pending, facility.gateway())
    };

    let outcome = pending.send(gateway.as_ref()).await;
    state.facility.lock().finish_submit(outcome).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_syllabus_form(state: State<'_, FormsState>) -> SyllabusView {
    let syllabus = state.syllabus.lock();
    SyllabusView {
        responses: syllabus.matrix().clone(),
        recommendations: syllabus.recommendations().to_string(),
        phase: syllabus.phase(),
        error_message: syllabus.error_message().map(str::to_string),
        dark_mode: syllabus.dark_mode(),
        username: syllabus.identity().username().to_string(),
    }
}

#[tauri::command]
pub fn set_syllabus_response(
    state: State<'_, FormsState>,
    question_key: String,
    subject_index: usize,
    score: u8,
) -> Result<(), String> {
    state
        .syllabus
        .lock()
        .set_response(&question_key, subject_index, score)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn set_syllabus_recommendations(state: State<'_, FormsState>, recommendations: String) -> Result<(), String> {
    state
        .syllabus
        .lock()
        .set_recommendations(recommendations)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn toggle_dark_mode(state: State<'_, FormsState>) -> bool {
    state.syllabus.lock().toggle_dark_mode()
}

#[tauri::command]
pub async fn submit_syllabus_feedback(state: State<'_, FormsState>) -> Result<DocumentHandle, String> {
    info!("📝 Submitting syllabus feedback");

    let (pending, gateway) = {
        let mut syllabus = state.syllabus.lock();
        let pending = syllabus.begin_submit().map_err(|e| e.to_string())?;
        (pending, syllabus.gateway())
    };

    let outcome = pending.send(gateway.as_ref()).await;
    state.syllabus.lock().finish_submit(outcome).map_err(|e| e.to_string())
}

/// Installs the form state and commands on an application builder.
pub fn register<R: Runtime>(builder: Builder<R>, state: FormsState) -> Builder<R> {
    builder.manage(state).invoke_handler(tauri::generate_handler![
        get_form_questions,
        get_facility_form,
        set_facility_year,
        set_facility_response,
        set_facility_suggestions,
        submit_facility_feedback,
        get_syllabus_form,
        set_syllabus_response,
        set_syllabus_recommendations,
        toggle_dark_mode,
        submit_syllabus_feedback,
    ])
}
