use std::sync::Arc;

use campus_feedback_lib::database::{InMemoryGateway, FACILITIES_COLLECTION, SYLLABUS_COLLECTION};
use campus_feedback_lib::forms::{flatten, SubjectResponses, SYLLABUS_QUESTIONS, SYLLABUS_SUBJECTS};
use campus_feedback_lib::session::{MemorySessionStore, USERNAME_KEY};
use campus_feedback_lib::{FacilityController, FormPhase, SessionIdentity, SyllabusController};
use indexmap::IndexMap;
use serde_json::json;

#[tokio::test]
async fn both_forms_share_one_store() {
    let gateway = Arc::new(InMemoryGateway::new());

    let mut facility = FacilityController::new(gateway.clone());
    facility.set_year("2");
    facility.set_suggestions("Longer library hours");
    for index in 0..6 {
        facility.set_response(index, 4).unwrap();
    }
    facility.submit().await.unwrap();

    let session = MemorySessionStore::new();
    session.insert(USERNAME_KEY, "22EC117");
    let mut syllabus = SyllabusController::new(gateway.clone(), SessionIdentity::from_store(&session));
    for question in SYLLABUS_QUESTIONS.iter() {
        for subject in 0..SYLLABUS_SUBJECTS.len() {
            syllabus.set_response(question.key, subject, 3).unwrap();
        }
    }
    syllabus.set_recommendations("none").unwrap();
    syllabus.submit().await.unwrap();

    assert_eq!(gateway.documents_in(FACILITIES_COLLECTION).len(), 1);
    let stored = gateway.documents_in(SYLLABUS_COLLECTION);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].payload.fields["username"], json!("22EC117"));
    assert_eq!(syllabus.phase(), FormPhase::Submitted);

    // The stored subject-first shape flattens back to what was entered.
    let subjects: IndexMap<String, SubjectResponses> =
        serde_json::from_value(stored[0].payload.fields["subjects"].clone()).unwrap();
    assert_eq!(&flatten(&subjects).unwrap(), syllabus.matrix());
}

#[tokio::test]
async fn failed_submission_can_be_retried_by_hand() {
    let gateway = Arc::new(InMemoryGateway::new());
    let mut facility = FacilityController::new(gateway.clone());
    facility.set_year("1");
    facility.set_suggestions("n/a");
    for index in 0..6 {
        facility.set_response(index, 5).unwrap();
    }

    gateway.fail_next(2);
    assert!(facility.submit().await.is_err());
    assert!(facility.submit().await.is_err());
    assert!(facility.submit().await.is_ok());

    assert_eq!(gateway.attempts(), 3);
    assert_eq!(gateway.documents().len(), 1);
    assert_eq!(
        gateway.documents()[0].payload.to_json()["responses"],
        json!([5, 5, 5, 5, 5, 5])
    );
}
