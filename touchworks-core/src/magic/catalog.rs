//! # Action Catalog
//!
//! Every Magic JSON action is the same request with a different name, a different result key
//! and a different meaning for the six `ParameterN` slots. This module is the single table
//! describing those differences.
//!
//! A call is made of named arguments ([`ActionArgs`]). [`Action::draft`] checks them against the
//! action's [`Param`] list, fills in defaults, enforces required arguments and allow-lists and
//! returns an [`EnvelopeDraft`] with every value in its slot.
use super::envelope::EnvelopeDraft;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{action} has no parameter named '{name}'")]
    UnknownParameter { action: String, name: String },
    #[error("{name} can not be empty")]
    MissingRequired { action: String, name: String },
    #[error("{name} was invalid. allowed values are {allowed:?}")]
    NotAllowed {
        action: String,
        name: String,
        value: String,
        allowed: Vec<String>,
    },
}

/// One of the six positional slots of the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Parameter1,
    Parameter2,
    Parameter3,
    Parameter4,
    Parameter5,
    Parameter6,
}

impl Slot {
    /// 1-based position of the slot, as in its wire name.
    pub const fn index(self) -> usize {
        match self {
            Slot::Parameter1 => 1,
            Slot::Parameter2 => 2,
            Slot::Parameter3 => 3,
            Slot::Parameter4 => 4,
            Slot::Parameter5 => 5,
            Slot::Parameter6 => 6,
        }
    }

    pub const fn wire_name(self) -> &'static str {
        match self {
            Slot::Parameter1 => "Parameter1",
            Slot::Parameter2 => "Parameter2",
            Slot::Parameter3 => "Parameter3",
            Slot::Parameter4 => "Parameter4",
            Slot::Parameter5 => "Parameter5",
            Slot::Parameter6 => "Parameter6",
        }
    }
}

/// A named argument of an action and the slot it travels in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub slot: Slot,
    /// Sent when the caller does not supply the argument.
    pub default: &'static str,
    pub required: bool,
    /// When non-empty, the only values accepted.
    pub allowed: &'static [&'static str],
}

impl Param {
    pub const fn optional(name: &'static str, slot: Slot) -> Self {
        Self {
            name,
            slot,
            default: "",
            required: false,
            allowed: &[],
        }
    }

    pub const fn required(name: &'static str, slot: Slot) -> Self {
        Self {
            required: true,
            ..Self::optional(name, slot)
        }
    }

    pub const fn with_default(self, default: &'static str) -> Self {
        Self { default, ..self }
    }

    pub const fn one_of(self, allowed: &'static [&'static str]) -> Self {
        Self { allowed, ..self }
    }

    fn check(&self, action: &str, value: &str) -> Result<(), ValidationError> {
        if self.required && value.trim().is_empty() {
            return Err(ValidationError::MissingRequired {
                action: action.to_string(),
                name: self.name.to_string(),
            });
        }

        if !self.allowed.is_empty() && !self.allowed.contains(&value) {
            return Err(ValidationError::NotAllowed {
                action: action.to_string(),
                name: self.name.to_string(),
                value: value.to_string(),
                allowed: self.allowed.iter().map(|v| v.to_string()).collect(),
            });
        }

        Ok(())
    }
}

/// A Magic JSON action: its wire name, the key its result comes back under and its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub name: &'static str,
    pub result_key: &'static str,
    /// Whether the action reads the envelope's `PatientID`.
    pub uses_patient: bool,
    pub params: &'static [Param],
}

impl Action {
    const fn new(name: &'static str, result_key: &'static str) -> Self {
        Self {
            name,
            result_key,
            uses_patient: false,
            params: &[],
        }
    }

    const fn with_patient(self) -> Self {
        Self {
            uses_patient: true,
            ..self
        }
    }

    const fn with_params(self, params: &'static [Param]) -> Self {
        Self { params, ..self }
    }

    /// Looks an action up by wire name, ignoring case.
    pub fn by_name(name: &str) -> Option<&'static Action> {
        ACTIONS
            .iter()
            .find(|action| action.name.eq_ignore_ascii_case(name))
    }

    pub fn param(&self, name: &str) -> Option<&'static Param> {
        self.params.iter().find(|param| param.name == name)
    }

    /// Resolves named arguments into an envelope draft.
    ///
    /// Arguments are validated before anything is sent: unknown names, empty required
    /// arguments and values outside an allow-list are rejected.
    pub fn draft(&self, args: ActionArgs) -> Result<EnvelopeDraft, ValidationError> {
        let mut values: Vec<(&'static Param, String)> = Vec::with_capacity(self.params.len());

        for (name, value) in args.values {
            let param = self
                .param(&name)
                .ok_or_else(|| ValidationError::UnknownParameter {
                    action: self.name.to_string(),
                    name: name.clone(),
                })?;

            match values.iter_mut().find(|(p, _)| p.name == param.name) {
                Some((_, existing)) => *existing = value,
                None => values.push((param, value)),
            }
        }

        let mut draft = EnvelopeDraft::new(self.name);
        draft.user_id = args.user_id;
        draft.patient_id = args.patient_id;
        draft.data = args.data;

        for param in self.params {
            let value = values
                .iter()
                .find(|(p, _)| p.name == param.name)
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| param.default.to_string());

            param.check(self.name, &value)?;
            draft = draft.parameter(param.slot.index(), value);
        }

        Ok(draft)
    }
}

/// Named arguments for one action call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionArgs {
    pub user_id: Option<String>,
    pub patient_id: Option<String>,
    pub data: Option<String>,
    pub values: Vec<(String, String)>,
}

impl ActionArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// EHR user sent as `AppUserID`.
    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn patient(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.push((name.into(), value.into()));
        self
    }

    /// Adds the argument only when `value` is `Some`, leaving the default in place otherwise.
    pub fn arg_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.arg(name, value),
            None => self,
        }
    }
}

use Slot::*;

const SEARCH_PATIENTS_PARAMS: &[Param] = &[
    Param::optional("search_criteria", Parameter1),
    Param::optional("include_picture", Parameter2).with_default("N"),
    Param::optional("organization_id", Parameter3),
];

pub const SEARCH_PATIENTS: Action = Action::new("SearchPatients", "searchpatientsinfo")
    .with_params(SEARCH_PATIENTS_PARAMS);

pub const GET_PATIENT: Action = Action::new("GetPatient", "getpatientinfo").with_patient();

pub const GET_ENCOUNTER: Action = Action::new("GetEncounter", "getencounterinfo").with_patient();

pub const GET_ENCOUNTER_LIST_FOR_PATIENT: Action =
    Action::new("GetEncounterListForPatient", "getencounterlistforpatientinfo").with_patient();

const GET_DOCUMENTS_PARAMS: &[Param] = &[
    Param::optional("start_date", Parameter1),
    Param::optional("end_date", Parameter2),
    Param::optional("document_id", Parameter3),
    Param::optional("document_type", Parameter4),
    Param::optional("newest_document", Parameter5).with_default("N"),
];

pub const GET_DOCUMENTS: Action = Action::new("GetDocuments", "getdocumentsinfo")
    .with_patient()
    .with_params(GET_DOCUMENTS_PARAMS);

const GET_DOCUMENT_TYPE_PARAMS: &[Param] = &[Param::optional("document_type", Parameter1)];

pub const GET_DOCUMENT_TYPE: Action = Action::new("GetDocumentType", "getdocumenttypeinfo")
    .with_params(GET_DOCUMENT_TYPE_PARAMS);

const GET_DICTIONARY_PARAMS: &[Param] = &[Param::optional("dictionary_name", Parameter1)];

pub const GET_DICTIONARY: Action = Action::new("GetDictionary", "getdictionaryinfo")
    .with_params(GET_DICTIONARY_PARAMS);

const GET_SCHEDULE_PARAMS: &[Param] = &[
    Param::required("start_date", Parameter1),
    Param::optional("changed_since", Parameter2),
    Param::optional("include_pix", Parameter3),
    Param::optional("other_user", Parameter4).with_default("All"),
    Param::optional("appointment_types", Parameter5),
    Param::optional("status_filter", Parameter6).with_default("All"),
];

pub const GET_SCHEDULE: Action = Action::new("GetSchedule", "getscheduleinfo")
    .with_params(GET_SCHEDULE_PARAMS);

/// Values accepted for the `document_status` argument of `SaveNote`.
pub const NOTE_STATUSES: &[&str] = &["Unsigned", "Final"];

const SAVE_NOTE_PARAMS: &[Param] = &[
    Param::optional("note_text", Parameter1),
    Param::optional("document_type", Parameter2),
    Param::optional("document_status", Parameter3)
        .with_default("Unsigned")
        .one_of(NOTE_STATUSES),
    Param::optional("wrapped_in_rtf", Parameter4).with_default("N"),
];

pub const SAVE_NOTE: Action = Action::new("SaveNote", "savenoteinfo")
    .with_patient()
    .with_params(SAVE_NOTE_PARAMS);

const SAVE_UNSTRUCTURED_DOCUMENT_PARAMS: &[Param] = &[
    Param::optional("document_params", Parameter1),
    Param::optional("document_content", Parameter2),
];

pub const SAVE_UNSTRUCTURED_DOCUMENT: Action =
    Action::new("SaveUnstructuredDocument", "saveunstructureddocument")
        .with_patient()
        .with_params(SAVE_UNSTRUCTURED_DOCUMENT_PARAMS);

const GET_CLINICAL_SUMMARY_PARAMS: &[Param] = &[
    Param::optional("section", Parameter1),
    Param::optional("encounter_id", Parameter2),
    Param::optional("verbose", Parameter3),
];

pub const GET_CLINICAL_SUMMARY: Action = Action::new("GetClinicalSummary", "getclinicalsummaryinfo")
    .with_patient()
    .with_params(GET_CLINICAL_SUMMARY_PARAMS);

const GET_PATIENT_ACTIVITY_PARAMS: &[Param] = &[Param::optional("since", Parameter1)];

pub const GET_PATIENT_ACTIVITY: Action =
    Action::new("GetPatientActivity", "getpatientactivityinfo")
        .with_patient()
        .with_params(GET_PATIENT_ACTIVITY_PARAMS);

const GET_PATIENT_PROBLEMS_PARAMS: &[Param] = &[
    Param::optional("show_by_encounter", Parameter1).with_default("N"),
    Param::optional("assessed", Parameter2),
    Param::optional("encounter_id", Parameter3),
];

pub const GET_PATIENT_PROBLEMS: Action =
    Action::new("GetPatientProblems", "getpatientproblemsinfo")
        .with_patient()
        .with_params(GET_PATIENT_PROBLEMS_PARAMS);

pub const GET_PATIENT_PHARMACIES: Action =
    Action::new("GetPatientPharmacies", "getpatientpharmaciesinfo").with_patient();

const GET_PATIENTS_BY_ICD9_PARAMS: &[Param] = &[
    Param::optional("icd9", Parameter1),
    Param::optional("start_date", Parameter2),
    Param::optional("end_date", Parameter3),
];

pub const GET_PATIENTS_BY_ICD9: Action = Action::new("GetPatientsByICD9", "getpatientsbyicd9info")
    .with_params(GET_PATIENTS_BY_ICD9_PARAMS);

const GET_CHANGED_PATIENTS_PARAMS: &[Param] = &[Param::optional("since", Parameter1)];

pub const GET_CHANGED_PATIENTS: Action =
    Action::new("GetChangedPatients", "getchangedpatientsinfo")
        .with_params(GET_CHANGED_PATIENTS_PARAMS);

const GET_TASK_PARAMS: &[Param] = &[Param::optional("task_id", Parameter1)];

pub const GET_TASK: Action = Action::new("GetTask", "gettaskinfo").with_params(GET_TASK_PARAMS);

const GET_TASK_LIST_PARAMS: &[Param] = &[
    Param::optional("since", Parameter1),
    Param::optional("task_types", Parameter2),
    Param::optional("task_status", Parameter3),
];

pub const GET_TASK_LIST: Action = Action::new("GetTaskList", "gettasklistinfo")
    .with_params(GET_TASK_LIST_PARAMS);

const SAVE_TASK_PARAMS: &[Param] = &[
    Param::optional("task_type", Parameter1),
    Param::optional("target_user", Parameter2),
    Param::optional("work_object_id", Parameter3),
    Param::optional("comments", Parameter4),
    Param::optional("subject", Parameter5),
];

pub const SAVE_TASK: Action = Action::new("SaveTask", "savetaskinfo")
    .with_patient()
    .with_params(SAVE_TASK_PARAMS);

const SAVE_TASK_STATUS_PARAMS: &[Param] = &[
    Param::optional("task_id", Parameter1),
    Param::optional("task_action", Parameter2),
    Param::optional("delegate_id", Parameter3),
    Param::optional("comment", Parameter4),
];

pub const SAVE_TASK_STATUS: Action = Action::new("SaveTaskStatus", "savetaskstatusinfo")
    .with_params(SAVE_TASK_STATUS_PARAMS);

const GET_PROVIDER_PARAMS: &[Param] = &[
    Param::optional("provider_id", Parameter1),
    Param::optional("user_name", Parameter2),
];

pub const GET_PROVIDER: Action = Action::new("GetProvider", "getproviderinfo")
    .with_params(GET_PROVIDER_PARAMS);

pub const GET_USER_ID: Action = Action::new("GetUserID", "getuseridinfo");

pub const GET_SERVER_INFO: Action = Action::new("GetServerInfo", "getserverinfo");

/// Every action the client knows about.
pub static ACTIONS: &[Action] = &[
    SEARCH_PATIENTS,
    GET_PATIENT,
    GET_ENCOUNTER,
    GET_ENCOUNTER_LIST_FOR_PATIENT,
    GET_DOCUMENTS,
    GET_DOCUMENT_TYPE,
    GET_DICTIONARY,
    GET_SCHEDULE,
    SAVE_NOTE,
    SAVE_UNSTRUCTURED_DOCUMENT,
    GET_CLINICAL_SUMMARY,
    GET_PATIENT_ACTIVITY,
    GET_PATIENT_PROBLEMS,
    GET_PATIENT_PHARMACIES,
    GET_PATIENTS_BY_ICD9,
    GET_CHANGED_PATIENTS,
    GET_TASK,
    GET_TASK_LIST,
    SAVE_TASK,
    SAVE_TASK_STATUS,
    GET_PROVIDER,
    GET_USER_ID,
    GET_SERVER_INFO,
];
