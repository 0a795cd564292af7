//! Canonical record types, their list projections, and the typed create /
//! patch inputs accepted by the repositories.
//!
//! Patch structs are sparse: `None` means "leave unchanged". Nullable columns
//! use `Option<Option<T>>` so that an explicit `null` clears the value.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// `null` reads the same as an absent member.
fn null_as_default<'de, T, D>(de: D) -> Result<T, D::Error>
where
    T: Deserialize<'de> + Default,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewSubject {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubjectPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

impl SubjectPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.code.is_none() && self.description.is_none()
    }

    pub fn apply(self, s: &mut Subject) {
        if let Some(v) = self.name {
            s.name = v;
        }
        if let Some(v) = self.code {
            s.code = v;
        }
        if let Some(v) = self.description {
            s.description = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    pub name: String,
    pub subject_id: String,
    pub year_semester: Option<String>,
    pub teacher: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewClass {
    pub name: String,
    pub subject_id: String,
    #[serde(default)]
    pub year_semester: Option<String>,
    #[serde(default)]
    pub teacher: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClassPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub year_semester: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub teacher: Option<Option<String>>,
}

impl ClassPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.subject_id.is_none()
            && self.year_semester.is_none()
            && self.teacher.is_none()
    }

    pub fn apply(self, c: &mut Class) {
        if let Some(v) = self.name {
            c.name = v;
        }
        if let Some(v) = self.subject_id {
            c.subject_id = v;
        }
        if let Some(v) = self.year_semester {
            c.year_semester = v;
        }
        if let Some(v) = self.teacher {
            c.teacher = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub call_number: Option<i64>,
    pub registration: Option<String>,
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewStudent {
    pub name: String,
    #[serde(default)]
    pub call_number: Option<i64>,
    #[serde(default)]
    pub registration: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StudentPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub call_number: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub registration: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub birth_date: Option<Option<String>>,
}

impl StudentPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.call_number.is_none()
            && self.registration.is_none()
            && self.birth_date.is_none()
    }

    pub fn apply(self, s: &mut Student) {
        if let Some(v) = self.name {
            s.name = v;
        }
        if let Some(v) = self.call_number {
            s.call_number = v;
        }
        if let Some(v) = self.registration {
            s.registration = v;
        }
        if let Some(v) = self.birth_date {
            s.birth_date = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: String,
    pub name: String,
    pub class_id: String,
    pub weight: f64,
    pub max_grade: f64,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewEvaluation {
    pub name: String,
    pub class_id: String,
    pub weight: f64,
    pub max_grade: f64,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EvaluationPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub max_grade: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    pub date: Option<Option<String>>,
}

impl EvaluationPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.weight.is_none() && self.max_grade.is_none() && self.date.is_none()
    }

    pub fn apply(self, e: &mut Evaluation) {
        if let Some(v) = self.name {
            e.name = v;
        }
        if let Some(v) = self.weight {
            e.weight = v;
        }
        if let Some(v) = self.max_grade {
            e.max_grade = v;
        }
        if let Some(v) = self.date {
            e.date = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub student_id: String,
    pub evaluation_id: String,
    pub value: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GradeEntry {
    pub student_id: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn parse(raw: &str) -> Option<Priority> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewTask {
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskPatch {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }

    pub fn apply(self, t: &mut Task) {
        if let Some(v) = self.text {
            t.text = v;
        }
        if let Some(v) = self.completed {
            t.completed = v;
        }
        if let Some(v) = self.priority {
            t.priority = v;
        }
        if let Some(v) = self.due_date {
            t.due_date = v;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Pending,
    Graded,
}

impl AssignmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::Graded => "graded",
        }
    }

    pub fn parse(raw: &str) -> Option<AssignmentStatus> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(AssignmentStatus::Pending),
            "graded" => Some(AssignmentStatus::Graded),
            _ => None,
        }
    }
}

impl Default for AssignmentStatus {
    fn default() -> Self {
        AssignmentStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub class_id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: String,
    pub status: AssignmentStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewAssignment {
    pub class_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub due_date: String,
    #[serde(default)]
    pub status: AssignmentStatus,
}

/// The owning class is fixed once created.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AssignmentPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub status: Option<AssignmentStatus>,
}

impl AssignmentPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
    }

    pub fn apply(self, a: &mut Assignment) {
        if let Some(v) = self.title {
            a.title = v;
        }
        if let Some(v) = self.description {
            a.description = v;
        }
        if let Some(v) = self.due_date {
            a.due_date = v;
        }
        if let Some(v) = self.status {
            a.status = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    pub subject: Option<String>,
    pub difficulty: Option<String>,
    pub options: Vec<String>,
    pub answer: String,
}

/// List shape for the question bank: no options or answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSummary {
    pub id: String,
    pub text: String,
    pub subject: Option<String>,
    pub difficulty: Option<String>,
}

impl From<&Question> for QuestionSummary {
    fn from(q: &Question) -> Self {
        QuestionSummary {
            id: q.id.clone(),
            text: q.text.clone(),
            subject: q.subject.clone(),
            difficulty: q.difficulty.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewQuestion {
    pub text: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QuestionPatch {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub subject: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub difficulty: Option<Option<String>>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub answer: Option<String>,
}

impl QuestionPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.subject.is_none()
            && self.difficulty.is_none()
            && self.options.is_none()
            && self.answer.is_none()
    }

    pub fn apply(self, q: &mut Question) {
        if let Some(v) = self.text {
            q.text = v;
        }
        if let Some(v) = self.subject {
            q.subject = v;
        }
        if let Some(v) = self.difficulty {
            q.difficulty = v;
        }
        if let Some(v) = self.options {
            q.options = v;
        }
        if let Some(v) = self.answer {
            q.answer = v;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    pub subject: Option<String>,
    pub difficulty: Option<String>,
}

/// A saved selection of bank questions, in the order they are asked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub name: Option<String>,
    pub question_ids: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewQuiz {
    #[serde(default)]
    pub name: Option<String>,
    pub question_ids: Vec<String>,
}

/// Draws questions from the bank. A missing or zero `count` takes every
/// match.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QuizRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
}

/// What a student sees: no answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizItem {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub id: String,
    pub quiz_id: String,
    pub answers: BTreeMap<String, String>,
    pub score: u32,
    pub total: u32,
    pub attempted_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOutcome {
    pub question_id: String,
    pub text: String,
    pub options: Vec<String>,
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub attempt: QuizAttempt,
    pub results: Vec<QuestionOutcome>,
}

/// A teaching material. Only the storage reference is kept here; the blob
/// itself lives in object storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    pub title: String,
    pub kind: Option<String>,
    pub tags: Vec<String>,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewMaterial {
    pub title: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MaterialPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub kind: Option<Option<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub url: Option<String>,
}

impl MaterialPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.kind.is_none() && self.tags.is_none() && self.url.is_none()
    }

    pub fn apply(self, m: &mut Material) {
        if let Some(v) = self.title {
            m.title = v;
        }
        if let Some(v) = self.kind {
            m.kind = v;
        }
        if let Some(v) = self.tags {
            m.tags = v;
        }
        if let Some(v) = self.url {
            m.url = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPlan {
    pub id: String,
    pub title: String,
    pub date: Option<String>,
    pub objectives: Option<String>,
    pub activities: Option<String>,
    pub assessment: Option<String>,
    pub created_at: String,
    pub class_ids: Vec<String>,
    pub material_ids: Vec<String>,
    pub evaluation_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPlanSummary {
    pub id: String,
    pub title: String,
    pub date: Option<String>,
}

impl From<&LessonPlan> for LessonPlanSummary {
    fn from(p: &LessonPlan) -> Self {
        LessonPlanSummary {
            id: p.id.clone(),
            title: p.title.clone(),
            date: p.date.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewLessonPlan {
    pub title: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub objectives: Option<String>,
    #[serde(default)]
    pub activities: Option<String>,
    #[serde(default)]
    pub assessment: Option<String>,
    #[serde(default)]
    pub class_ids: Vec<String>,
    #[serde(default)]
    pub material_ids: Vec<String>,
    #[serde(default)]
    pub evaluation_ids: Vec<String>,
}

/// Scalar fields patch as usual; a supplied link list replaces that whole
/// relation, an absent one leaves it untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LessonPlanPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub objectives: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub activities: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assessment: Option<Option<String>>,
    #[serde(default)]
    pub class_ids: Option<Vec<String>>,
    #[serde(default)]
    pub material_ids: Option<Vec<String>>,
    #[serde(default)]
    pub evaluation_ids: Option<Vec<String>>,
}

impl LessonPlanPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.date.is_none()
            && self.objectives.is_none()
            && self.activities.is_none()
            && self.assessment.is_none()
            && self.class_ids.is_none()
            && self.material_ids.is_none()
            && self.evaluation_ids.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub recurrence_id: Option<String>,
    pub reminders: Vec<Reminder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderUnit {
    Minutes,
    Hours,
}

/// Fires `value` units before the event starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Reminder {
    pub value: u32,
    pub unit: ReminderUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::None
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewEvent {
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub frequency: Frequency,
    #[serde(default)]
    pub recurrence_end_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reminders: Vec<Reminder>,
}

/// Edits a single occurrence; the recurrence group membership is not
/// changeable through a patch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EventPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub reminders: Option<Vec<Reminder>>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.date.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.reminders.is_none()
    }

    pub fn apply(self, e: &mut Event) {
        if let Some(v) = self.title {
            e.title = v;
        }
        if let Some(v) = self.date {
            e.date = v;
        }
        if let Some(v) = self.start_time {
            e.start_time = v;
        }
        if let Some(v) = self.end_time {
            e.end_time = v;
        }
        if let Some(v) = self.description {
            e.description = v;
        }
        if let Some(v) = self.category {
            e.category = v;
        }
        if let Some(v) = self.reminders {
            e.reminders = v;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub date: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let p: StudentPatch =
            serde_json::from_value(json!({ "registration": null })).expect("parse");
        assert_eq!(p.registration, Some(None));
        assert_eq!(p.birth_date, None);
        assert!(!p.is_empty());

        let mut s = Student {
            id: "s1".into(),
            name: "Ana".into(),
            call_number: Some(3),
            registration: Some("R-1".into()),
            birth_date: Some("2010-02-01".into()),
        };
        p.apply(&mut s);
        assert_eq!(s.registration, None);
        assert_eq!(s.birth_date.as_deref(), Some("2010-02-01"));
        assert_eq!(s.call_number, Some(3));
    }

    #[test]
    fn null_frequency_and_reminders_read_as_absent() {
        let e: NewEvent = serde_json::from_value(json!({
            "title": "Parents' evening",
            "date": "2024-01-01",
            "frequency": null,
            "reminders": null
        }))
        .expect("parse");
        assert_eq!(e.frequency, Frequency::None);
        assert!(e.reminders.is_empty());

        let e: NewEvent = serde_json::from_value(json!({
            "title": "Club",
            "date": "2024-01-01",
            "frequency": "weekly",
            "reminders": [{ "value": 2, "unit": "hours" }]
        }))
        .expect("parse");
        assert_eq!(e.frequency, Frequency::Weekly);
        assert_eq!(
            e.reminders,
            vec![Reminder {
                value: 2,
                unit: ReminderUnit::Hours
            }]
        );
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let res: Result<SubjectPatch, _> = serde_json::from_value(json!({ "nmae": "typo" }));
        assert!(res.is_err());
    }

    #[test]
    fn summary_is_projection_of_full_plan() {
        let plan = LessonPlan {
            id: "lp1".into(),
            title: "Fractions".into(),
            date: Some("2024-03-01".into()),
            objectives: Some("compare".into()),
            activities: None,
            assessment: None,
            created_at: "2024-02-01T00:00:00Z".into(),
            class_ids: vec!["c1".into()],
            material_ids: vec![],
            evaluation_ids: vec![],
        };
        let summary = LessonPlanSummary::from(&plan);
        let v = serde_json::to_value(&summary).expect("serialize");
        assert_eq!(v, json!({ "id": "lp1", "title": "Fractions", "date": "2024-03-01" }));
    }
}
