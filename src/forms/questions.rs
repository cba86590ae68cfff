use serde::Serialize;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Question {
    pub key: &'static str,
    pub number: u32,
    pub text: &'static str,
}

pub const FACILITY_QUESTIONS: [&str; 6] = [
    "How do you rate the internet speed and connectivity on campus?",
    "How do you rate the availability of Wi-Fi in classrooms and common areas?",
    "How do you rate the efficiency of processes like fee payment, attendance, and scholarship applications?",
    "Are the administrative staff approachable and helpful?",
    "How do you rate the cleanliness and maintenance of restrooms on campus?",
    "Are there enough restrooms available to meet student needs?",
];

pub const FACILITY_QUESTION_COUNT: usize = FACILITY_QUESTIONS.len();

pub static SYLLABUS_QUESTIONS: [Question; 9] = [
    Question { key: "q1", number: 1, text: "The syllabus clearly explains the key technical concepts required." },
    Question { key: "q2", number: 2, text: "The syllabus matches well with the stated learning objectives." },
    Question { key: "q3", number: 3, text: "There is a good balance between theoretical and practical aspects." },
    Question { key: "q4", number: 4, text: "The syllabus covers current, relevant engineering topics effectively." },
    Question { key: "q5", number: 5, text: "Projects, internships, or research work enhance the syllabus content." },
    Question { key: "q6", number: 6, text: "Evaluation methods are fair, transparent, and easy to understand." },
    Question { key: "q7", number: 7, text: "Syllabus encourages critical thinking and real-world problem solving." },
    Question { key: "q8", number: 8, text: "Faculty have flexibility to use innovative teaching methods." },
    Question { key: "q9", number: 9, text: "Resources and infrastructure support the syllabus delivery well." },
];

pub static SYLLABUS_SUBJECTS: [&str; 8] = [
    "Subject 1", "Subject 2", "Subject 3", "Subject 4",
    "Subject 5", "Lab 1", "Lab 2", "Lab 3",
];

/// Free-text item shown after the matrix.
pub const RECOMMENDATIONS_PROMPT: &str =
    "What specific areas of improvement or modifications would you recommend for revising the syllabi?";

/// Canonical `&'static` key for a syllabus question, if it exists.
pub fn syllabus_question_key(key: &str) -> Option<&'static str> {
    SYLLABUS_QUESTIONS.iter().find(|q| q.key == key).map(|q| q.key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syllabus_keys_are_ordered() {
        let keys: Vec<&str> = SYLLABUS_QUESTIONS.iter().map(|q| q.key).collect();
        assert_eq!(keys, ["q1", "q2", "q3", "q4", "q5", "q6", "q7", "q8", "q9"]);
        assert!(SYLLABUS_QUESTIONS.iter().enumerate().all(|(i, q)| q.number == i as u32 + 1));
    }

    #[test]
    fn test_question_key_lookup() {
        assert_eq!(syllabus_question_key("q7"), Some("q7"));
        assert_eq!(syllabus_question_key("q10"), None);
    }
}
