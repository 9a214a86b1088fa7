use std::fmt;

/// Status a note is saved with. The service accepts no other values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocumentStatus {
    #[default]
    Unsigned,
    Final,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Unsigned => "Unsigned",
            DocumentStatus::Final => "Final",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A note to be saved against a patient chart.
#[derive(Debug, Clone, Default)]
pub struct Note {
    pub patient_id: String,
    pub note_text: String,
    pub document_type: String,
    pub status: DocumentStatus,
    /// Whether `note_text` is already RTF.
    pub wrapped_in_rtf: bool,
}

/// Filters for `GetDocuments`. Unset fields are sent empty.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub document_id: Option<String>,
    pub document_type: Option<String>,
    /// Only return the newest document of each type.
    pub newest_only: bool,
}

/// Query for `GetSchedule`.
#[derive(Debug, Clone, Default)]
pub struct ScheduleQuery {
    pub start_date: String,
    pub changed_since: Option<String>,
    pub include_pix: Option<String>,
    pub other_user: Option<String>,
    pub appointment_types: Option<String>,
    pub status_filter: Option<String>,
}

impl ScheduleQuery {
    /// A query for the schedule starting at `start_date`, with every other filter defaulted.
    pub fn starting(start_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            ..Self::default()
        }
    }
}

/// A task to be created by `SaveTask`.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub task_type: String,
    pub target_user: Option<String>,
    pub work_object_id: Option<String>,
    pub comments: Option<String>,
    pub subject: Option<String>,
}

pub(crate) fn yes_no(flag: bool) -> &'static str {
    if flag { "Y" } else { "N" }
}

/// `docParams` XML sent as the first parameter of `SaveUnstructuredDocument`.
///
/// The encounter id is escaped for use inside a single-quoted attribute.
pub fn document_params_xml(encounter_id: &str) -> String {
    let encounter_id = escape_attribute(encounter_id);
    format!(
        "<docParams>\
         <item name='documentCommand' value='I'/>\
         <item name='documentType' value='Chart'/>\
         <item name='authorCode' value='ResLet'/>\
         <item name='ahsEncounterID' value='{encounter_id}'/>\
         <item name='OrganizationID' value=''/>\
         <item name='accessionValue' value=''/>\
         <item name='appGroup' value='TouchWorks'/>\
         </docParams>"
    )
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}
