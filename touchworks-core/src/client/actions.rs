//! Typed methods for the actions in the [catalog](crate::magic::catalog).
//!
//! Each method maps its arguments onto named catalog parameters and calls
//! [`TouchWorksClient::invoke`]. `ehr_username` is the EHR user the call is made on behalf of;
//! `None` falls back to the configured application user.
use super::{
    DocumentFilter, NewTask, Note, ScheduleQuery, TouchWorksClient,
    types::{document_params_xml, yes_no},
};
use crate::{
    error::Error,
    magic::{ActionArgs, catalog},
    transport::Transport,
};
use serde_json::Value;

/// Dictionary holding the document types of the installation.
pub const DOCUMENT_TYPE_DICTIONARY: &str = "Document_Type_DE";

fn on_behalf_of(ehr_username: Option<&str>) -> ActionArgs {
    match ehr_username {
        Some(user) => ActionArgs::new().user(user),
        None => ActionArgs::new(),
    }
}

impl<T: Transport> TouchWorksClient<T> {
    /// Searches patients by name or id. `search_criteria` accepts `*` wildcards.
    pub async fn search_patients(
        &self,
        ehr_username: Option<&str>,
        search_criteria: &str,
        include_picture: Option<&str>,
        organization_id: Option<&str>,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username)
            .arg("search_criteria", search_criteria)
            .arg_opt("include_picture", include_picture)
            .arg_opt("organization_id", organization_id);
        self.invoke(&catalog::SEARCH_PATIENTS, args).await
    }

    pub async fn get_patient(
        &self,
        ehr_username: Option<&str>,
        patient_id: &str,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username).patient(patient_id);
        self.invoke(&catalog::GET_PATIENT, args).await
    }

    pub async fn get_encounter(
        &self,
        ehr_username: Option<&str>,
        patient_id: &str,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username).patient(patient_id);
        self.invoke(&catalog::GET_ENCOUNTER, args).await
    }

    pub async fn get_encounter_list_for_patient(
        &self,
        ehr_username: Option<&str>,
        patient_id: &str,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username).patient(patient_id);
        self.invoke(&catalog::GET_ENCOUNTER_LIST_FOR_PATIENT, args)
            .await
    }

    pub async fn get_documents(
        &self,
        ehr_username: Option<&str>,
        patient_id: &str,
        filter: &DocumentFilter,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username)
            .patient(patient_id)
            .arg_opt("start_date", filter.start_date.as_deref())
            .arg_opt("end_date", filter.end_date.as_deref())
            .arg_opt("document_id", filter.document_id.as_deref())
            .arg_opt("document_type", filter.document_type.as_deref())
            .arg("newest_document", yes_no(filter.newest_only));
        self.invoke(&catalog::GET_DOCUMENTS, args).await
    }

    pub async fn get_document_type(
        &self,
        ehr_username: Option<&str>,
        document_type: &str,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username).arg("document_type", document_type);
        self.invoke(&catalog::GET_DOCUMENT_TYPE, args).await
    }

    /// Returns every entry of the named dictionary.
    pub async fn get_dictionary(&self, dictionary_name: &str) -> Result<Value, Error> {
        let args = ActionArgs::new().arg("dictionary_name", dictionary_name);
        self.invoke(&catalog::GET_DICTIONARY, args).await
    }

    /// Document types whose `Active` flag equals `active` and whose `EntryName` contains
    /// `entity_name`.
    ///
    /// The comparison is case-insensitive unless `match_case` is set. Entries missing either
    /// field never match.
    pub async fn find_document_type_by_name(
        &self,
        entity_name: &str,
        active: &str,
        match_case: bool,
    ) -> Result<Vec<Value>, Error> {
        let all_types = self.get_dictionary(DOCUMENT_TYPE_DICTIONARY).await?;

        let needle = if match_case {
            entity_name.to_string()
        } else {
            entity_name.to_lowercase()
        };

        let matches = all_types
            .as_array()
            .into_iter()
            .flatten()
            .filter(|entry| entry.get("Active").and_then(Value::as_str) == Some(active))
            .filter(|entry| {
                entry
                    .get("EntryName")
                    .and_then(Value::as_str)
                    .is_some_and(|name| {
                        if match_case {
                            name.contains(&needle)
                        } else {
                            name.to_lowercase().contains(&needle)
                        }
                    })
            })
            .cloned()
            .collect();

        Ok(matches)
    }

    pub async fn get_schedule(
        &self,
        ehr_username: Option<&str>,
        query: &ScheduleQuery,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username)
            .arg("start_date", query.start_date.as_str())
            .arg_opt("changed_since", query.changed_since.as_deref())
            .arg_opt("include_pix", query.include_pix.as_deref())
            .arg_opt("other_user", query.other_user.as_deref())
            .arg_opt("appointment_types", query.appointment_types.as_deref())
            .arg_opt("status_filter", query.status_filter.as_deref());
        self.invoke(&catalog::GET_SCHEDULE, args).await
    }

    /// Saves a note on behalf of the configured application user.
    pub async fn save_note(&self, note: &Note) -> Result<Value, Error> {
        let args = ActionArgs::new()
            .patient(note.patient_id.as_str())
            .arg("note_text", note.note_text.as_str())
            .arg("document_type", note.document_type.as_str())
            .arg("document_status", note.status.as_str())
            .arg("wrapped_in_rtf", yes_no(note.wrapped_in_rtf));
        self.invoke(&catalog::SAVE_NOTE, args).await
    }

    /// Stores `document_content` as a chart document attached to `encounter_id`.
    pub async fn save_unstructured_document(
        &self,
        ehr_username: Option<&str>,
        patient_id: &str,
        encounter_id: &str,
        document_content: &str,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username)
            .patient(patient_id)
            .arg("document_params", document_params_xml(encounter_id))
            .arg("document_content", document_content);
        self.invoke(&catalog::SAVE_UNSTRUCTURED_DOCUMENT, args)
            .await
    }

    pub async fn get_clinical_summary(
        &self,
        ehr_username: Option<&str>,
        patient_id: &str,
        section: Option<&str>,
        encounter_id: Option<&str>,
        verbose: bool,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username)
            .patient(patient_id)
            .arg_opt("section", section)
            .arg_opt("encounter_id", encounter_id)
            .arg_opt("verbose", verbose.then_some("Y"));
        self.invoke(&catalog::GET_CLINICAL_SUMMARY, args).await
    }

    pub async fn get_patient_activity(
        &self,
        ehr_username: Option<&str>,
        patient_id: &str,
        since: Option<&str>,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username)
            .patient(patient_id)
            .arg_opt("since", since);
        self.invoke(&catalog::GET_PATIENT_ACTIVITY, args).await
    }

    /// Problems of the patient, grouped by encounter when `encounter_id` is given.
    pub async fn get_patient_problems(
        &self,
        ehr_username: Option<&str>,
        patient_id: &str,
        encounter_id: Option<&str>,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username)
            .patient(patient_id)
            .arg("show_by_encounter", yes_no(encounter_id.is_some()))
            .arg_opt("encounter_id", encounter_id);
        self.invoke(&catalog::GET_PATIENT_PROBLEMS, args).await
    }

    pub async fn get_patient_pharmacies(
        &self,
        ehr_username: Option<&str>,
        patient_id: &str,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username).patient(patient_id);
        self.invoke(&catalog::GET_PATIENT_PHARMACIES, args).await
    }

    pub async fn get_patients_by_icd9(
        &self,
        ehr_username: Option<&str>,
        icd9: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username)
            .arg("icd9", icd9)
            .arg_opt("start_date", start_date)
            .arg_opt("end_date", end_date);
        self.invoke(&catalog::GET_PATIENTS_BY_ICD9, args).await
    }

    pub async fn get_changed_patients(
        &self,
        ehr_username: Option<&str>,
        since: &str,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username).arg("since", since);
        self.invoke(&catalog::GET_CHANGED_PATIENTS, args).await
    }

    pub async fn get_task(
        &self,
        ehr_username: Option<&str>,
        task_id: &str,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username).arg("task_id", task_id);
        self.invoke(&catalog::GET_TASK, args).await
    }

    pub async fn get_task_list(
        &self,
        ehr_username: Option<&str>,
        since: Option<&str>,
        task_types: Option<&str>,
        task_status: Option<&str>,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username)
            .arg_opt("since", since)
            .arg_opt("task_types", task_types)
            .arg_opt("task_status", task_status);
        self.invoke(&catalog::GET_TASK_LIST, args).await
    }

    pub async fn save_task(
        &self,
        ehr_username: Option<&str>,
        patient_id: &str,
        task: &NewTask,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username)
            .patient(patient_id)
            .arg("task_type", task.task_type.as_str())
            .arg_opt("target_user", task.target_user.as_deref())
            .arg_opt("work_object_id", task.work_object_id.as_deref())
            .arg_opt("comments", task.comments.as_deref())
            .arg_opt("subject", task.subject.as_deref());
        self.invoke(&catalog::SAVE_TASK, args).await
    }

    pub async fn save_task_status(
        &self,
        ehr_username: Option<&str>,
        task_id: &str,
        task_action: &str,
        delegate_id: Option<&str>,
        comment: Option<&str>,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username)
            .arg("task_id", task_id)
            .arg("task_action", task_action)
            .arg_opt("delegate_id", delegate_id)
            .arg_opt("comment", comment);
        self.invoke(&catalog::SAVE_TASK_STATUS, args).await
    }

    /// Looks a provider up by id or by user name.
    pub async fn get_provider(
        &self,
        ehr_username: Option<&str>,
        provider_id: Option<&str>,
        user_name: Option<&str>,
    ) -> Result<Value, Error> {
        let args = on_behalf_of(ehr_username)
            .arg_opt("provider_id", provider_id)
            .arg_opt("user_name", user_name);
        self.invoke(&catalog::GET_PROVIDER, args).await
    }

    pub async fn get_user_id(&self, ehr_username: Option<&str>) -> Result<Value, Error> {
        self.invoke(&catalog::GET_USER_ID, on_behalf_of(ehr_username))
            .await
    }

    pub async fn get_server_info(&self) -> Result<Value, Error> {
        self.invoke(&catalog::GET_SERVER_INFO, ActionArgs::new())
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        client::{ClientOptions, DocumentStatus, Note, ScheduleQuery, TouchWorksClient},
        config::ClientConfig,
        testing::{FakeTransport, TOKEN_A},
    };
    use serde_json::json;

    async fn client(transport: FakeTransport) -> TouchWorksClient<FakeTransport> {
        let config = ClientConfig::new("http://ehr", "svc", "secret", "App")
            .with_app_username("jmedici");
        TouchWorksClient::from_transport(config, transport, ClientOptions::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn save_note_sends_status_and_flags() {
        let transport = FakeTransport::new()
            .with_tokens(&[TOKEN_A])
            .with_reply(json!([{ "savenoteinfo": { "id": 42 } }]));
        let client = client(transport).await;

        let note = Note {
            patient_id: "12".into(),
            note_text: "Hello".into(),
            document_type: "Sticky Note".into(),
            status: DocumentStatus::Final,
            wrapped_in_rtf: false,
        };
        let result = client.save_note(&note).await.unwrap();

        assert_eq!(result, json!({ "id": 42 }));
        let sent = &client.transport().envelopes()[0];
        assert_eq!(sent["Action"], "SaveNote");
        assert_eq!(sent["PatientID"], "12");
        assert_eq!(sent["AppUserID"], "jmedici");
        assert_eq!(sent["Parameter1"], "Hello");
        assert_eq!(sent["Parameter2"], "Sticky Note");
        assert_eq!(sent["Parameter3"], "Final");
        assert_eq!(sent["Parameter4"], "N");
    }

    #[tokio::test]
    async fn explicit_user_overrides_the_configured_one() {
        let transport = FakeTransport::new()
            .with_tokens(&[TOKEN_A])
            .with_reply(json!([{ "getpatientinfo": [] }]));
        let client = client(transport).await;

        client.get_patient(Some("other"), "12").await.unwrap();

        assert_eq!(client.transport().envelopes()[0]["AppUserID"], "other");
    }

    #[tokio::test]
    async fn get_schedule_fills_defaults() {
        let transport = FakeTransport::new()
            .with_tokens(&[TOKEN_A])
            .with_reply(json!([{ "getscheduleinfo": [] }]));
        let client = client(transport).await;

        client
            .get_schedule(None, &ScheduleQuery::starting("9/1/2015"))
            .await
            .unwrap();

        let sent = &client.transport().envelopes()[0];
        assert_eq!(sent["Parameter1"], "9/1/2015");
        assert_eq!(sent["Parameter4"], "All");
        assert_eq!(sent["Parameter6"], "All");
    }

    #[tokio::test]
    async fn save_unstructured_document_sends_doc_params() {
        let transport = FakeTransport::new()
            .with_tokens(&[TOKEN_A])
            .with_reply(json!([{ "saveunstructureddocument": { "ok": true } }]));
        let client = client(transport).await;

        client
            .save_unstructured_document(None, "12", "777", "body")
            .await
            .unwrap();

        let sent = &client.transport().envelopes()[0];
        let params = sent["Parameter1"].as_str().unwrap();
        assert!(params.contains("value='777'"));
        assert_eq!(sent["Parameter2"], "body");
    }

    #[tokio::test]
    async fn find_document_type_by_name_filters_the_dictionary() {
        let dictionary = json!([{ "getdictionaryinfo": [
            { "EntryName": "Sticky Note", "Active": "Y" },
            { "EntryName": "Old Sticky Note", "Active": "N" },
            { "EntryName": "Lab Report", "Active": "Y" },
            { "Active": "Y" },
        ]}]);
        let transport = FakeTransport::new()
            .with_tokens(&[TOKEN_A])
            .with_reply(dictionary.clone())
            .with_reply(dictionary);
        let client = client(transport).await;

        let exact = client
            .find_document_type_by_name("sticky", "Y", true)
            .await
            .unwrap();
        assert!(exact.is_empty());

        let loose = client
            .find_document_type_by_name("sticky", "Y", false)
            .await
            .unwrap();
        assert_eq!(loose, vec![json!({ "EntryName": "Sticky Note", "Active": "Y" })]);

        assert_eq!(
            client.transport().envelopes()[0]["Parameter1"],
            "Document_Type_DE"
        );
    }

    #[tokio::test]
    async fn patient_problems_by_encounter() {
        let transport = FakeTransport::new()
            .with_tokens(&[TOKEN_A])
            .with_reply(json!([{ "getpatientproblemsinfo": [] }]))
            .with_reply(json!([{ "getpatientproblemsinfo": [] }]));
        let client = client(transport).await;

        client.get_patient_problems(None, "12", None).await.unwrap();
        client
            .get_patient_problems(None, "12", Some("99"))
            .await
            .unwrap();

        let sent = client.transport().envelopes();
        assert_eq!(sent[0]["Parameter1"], "N");
        assert_eq!(sent[0]["Parameter3"], "");
        assert_eq!(sent[1]["Parameter1"], "Y");
        assert_eq!(sent[1]["Parameter3"], "99");
    }
}
