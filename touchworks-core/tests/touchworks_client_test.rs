use magic_json_mock::{MockServer, Reply};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use touchworks_core::{
    ClientConfig, ClientOptions, Error, TouchWorksClient,
    client::{DocumentStatus, Note, ScheduleQuery},
    clock::ManualClock,
    magic::{ActionArgs, EnvelopeDraft, catalog},
};

const USERNAME: &str = "svc";
const PASSWORD: &str = "secret";

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(server.base_url(), USERNAME, PASSWORD, "TestApp")
        .with_app_username("jmedici")
}

async fn setup(server: &MockServer) -> TouchWorksClient {
    TouchWorksClient::connect(config(server)).await.unwrap()
}

#[tokio::test]
async fn test_connect_acquires_a_uuid_token() {
    let server = MockServer::builder()
        .credentials(USERNAME, PASSWORD)
        .spawn()
        .await
        .unwrap();

    let client = setup(&server).await;

    let token = client.token();
    assert!(uuid::Uuid::parse_str(token.as_str()).is_ok());
    assert_eq!(server.issued_tokens(), vec![token.as_str().to_string()]);
    assert_eq!(
        server.requests()[0].body,
        json!({ "Username": USERNAME, "Password": PASSWORD })
    );
}

#[tokio::test]
async fn test_wrong_password_is_an_authentication_error() {
    let server = MockServer::builder()
        .credentials(USERNAME, "another")
        .spawn()
        .await
        .unwrap();

    let result = TouchWorksClient::connect(config(&server)).await;

    assert!(matches!(result, Err(Error::Authentication(_))));
    assert_eq!(server.login_count(), 1);
}

#[tokio::test]
async fn test_malformed_token_is_an_authentication_error() {
    let server = MockServer::builder()
        .credentials(USERNAME, PASSWORD)
        .token_body("not-a-token")
        .spawn()
        .await
        .unwrap();

    let err = TouchWorksClient::connect(config(&server))
        .await
        .err()
        .unwrap();

    assert!(matches!(err, Error::Authentication(_)));
    assert_eq!(err.to_string(), "unable to acquire the token from web service");
}

#[tokio::test]
async fn test_empty_token_and_unreachable_server() {
    let server = MockServer::builder()
        .credentials(USERNAME, PASSWORD)
        .token_body("")
        .spawn()
        .await
        .unwrap();

    // An empty body is still a 200: the failure is in the token itself.
    let result = TouchWorksClient::connect(config(&server)).await;
    assert!(matches!(result, Err(Error::Authentication(_))));

    let unreachable = ClientConfig::new("http://127.0.0.1:1/", USERNAME, PASSWORD, "TestApp");
    let result = TouchWorksClient::connect(unreachable).await;
    assert!(matches!(result, Err(Error::Transport(_))));
}

#[tokio::test]
async fn test_missing_configuration_fails_before_connecting() {
    let config = ClientConfig::new("", USERNAME, PASSWORD, "TestApp");

    let result = TouchWorksClient::connect(config).await;

    assert!(matches!(result, Err(Error::Configuration(_))));
}

#[tokio::test]
async fn test_search_patients_round_trip() {
    let server = MockServer::builder()
        .credentials(USERNAME, PASSWORD)
        .reply(
            "SearchPatients",
            Reply::result("searchpatientsinfo", json!([{ "ID": "1", "lastname": "Jones" }])),
        )
        .spawn()
        .await
        .unwrap();
    let client = setup(&server).await;

    let patients = client
        .search_patients(None, "J*", None, None)
        .await
        .unwrap();

    assert_eq!(patients, json!([{ "ID": "1", "lastname": "Jones" }]));

    let envelope = &server.envelopes()[0];
    assert_eq!(envelope["Action"], "SearchPatients");
    assert_eq!(envelope["AppUserID"], "jmedici");
    assert_eq!(envelope["Appname"], "TestApp");
    assert_eq!(envelope["Token"], client.token().as_str());
    assert_eq!(envelope["Parameter1"], "J*");
    assert_eq!(envelope["Parameter2"], "N");
    assert_eq!(envelope["Data"], "");
}

#[tokio::test]
async fn test_save_note_returns_the_result_value() {
    let server = MockServer::builder()
        .credentials(USERNAME, PASSWORD)
        .reply("SaveNote", Reply::result("savenoteinfo", json!({ "id": 42 })))
        .spawn()
        .await
        .unwrap();
    let client = setup(&server).await;

    let note = Note {
        patient_id: "12".into(),
        note_text: "Patient called".into(),
        document_type: "Sticky Note".into(),
        status: DocumentStatus::Unsigned,
        wrapped_in_rtf: false,
    };

    assert_eq!(client.save_note(&note).await.unwrap(), json!({ "id": 42 }));
}

#[tokio::test]
async fn test_draft_note_is_rejected_before_any_network_call() {
    let server = MockServer::builder()
        .credentials(USERNAME, PASSWORD)
        .spawn()
        .await
        .unwrap();
    let client = setup(&server).await;

    let args = ActionArgs::new()
        .patient("12")
        .arg("note_text", "hello")
        .arg("document_status", "Draft");
    let result = client.invoke(&catalog::SAVE_NOTE, args).await;

    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(server.envelopes().is_empty());
}

#[tokio::test]
async fn test_vendor_error_surfaces_as_action_error() {
    let server = MockServer::builder()
        .credentials(USERNAME, PASSWORD)
        .reply("GetPatient", Reply::error("bad patient id"))
        .spawn()
        .await
        .unwrap();
    let client = setup(&server).await;

    let err = client.get_patient(None, "nope").await.unwrap_err();

    match &err {
        Error::Action { action, message } => {
            assert_eq!(action, "GetPatient");
            assert_eq!(message, "bad patient id");
        }
        other => panic!("Expected an action error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unexpected_responses_are_protocol_errors() {
    let server = MockServer::builder()
        .credentials(USERNAME, PASSWORD)
        .reply("GetServerInfo", Reply::Json(json!([])))
        .reply("GetUserID", Reply::result("somethingelse", json!(1)))
        .reply("GetProvider", Reply::raw(200, "<html>maintenance</html>"))
        .spawn()
        .await
        .unwrap();
    let client = setup(&server).await;

    assert!(matches!(
        client.get_server_info().await,
        Err(Error::Protocol)
    ));
    assert!(matches!(
        client.get_user_id(None).await,
        Err(Error::Protocol)
    ));
    assert!(matches!(
        client.get_provider(None, Some("1"), None).await,
        Err(Error::Protocol)
    ));
}

#[tokio::test]
async fn test_http_error_status_is_a_transport_error() {
    let server = MockServer::builder()
        .credentials(USERNAME, PASSWORD)
        .reply("GetTask", Reply::raw(500, "boom"))
        .spawn()
        .await
        .unwrap();
    let client = setup(&server).await;

    let result = client.get_task(None, "7").await;

    assert!(matches!(result, Err(Error::Transport(_))));
}

#[tokio::test]
async fn test_stale_token_is_replaced_before_the_call() {
    let server = MockServer::builder()
        .credentials(USERNAME, PASSWORD)
        .reply("GetSchedule", Reply::result("getscheduleinfo", json!([])))
        .spawn()
        .await
        .unwrap();
    let clock = Arc::new(ManualClock::default());
    let options = ClientOptions::default().with_clock(clock.clone());
    let client = TouchWorksClient::connect_with(config(&server), options)
        .await
        .unwrap();

    let first = client.token();
    assert!(client.token_is_fresh());

    clock.advance(Duration::from_secs(20 * 60));
    assert!(client.token_is_fresh());

    clock.advance(Duration::from_secs(1));
    assert!(!client.token_is_fresh());

    // Simulate the server forgetting the old token.
    server.revoke_tokens();

    client
        .get_schedule(None, &ScheduleQuery::starting("9/1/2015"))
        .await
        .unwrap();

    assert_eq!(server.login_count(), 2);
    let second = client.token();
    assert_ne!(first.as_str(), second.as_str());
    assert_eq!(server.envelopes()[0]["Token"], second.as_str());
}

#[tokio::test]
async fn test_fresh_token_is_reused() {
    let server = MockServer::builder()
        .credentials(USERNAME, PASSWORD)
        .reply("GetServerInfo", Reply::result("getserverinfo", json!({})))
        .spawn()
        .await
        .unwrap();
    let client = setup(&server).await;

    for _ in 0..3 {
        client.get_server_info().await.unwrap();
    }

    assert_eq!(server.login_count(), 1);
}

#[tokio::test]
async fn test_disabled_cache_acquires_a_token_per_call() {
    let server = MockServer::builder()
        .credentials(USERNAME, PASSWORD)
        .reply("GetServerInfo", Reply::result("getserverinfo", json!({})))
        .spawn()
        .await
        .unwrap();
    let config = config(&server).with_token_cache(false);
    let client = TouchWorksClient::connect(config).await.unwrap();

    assert!(!client.token_is_fresh());

    client.get_server_info().await.unwrap();
    client.get_server_info().await.unwrap();

    assert_eq!(server.login_count(), 3);
}

#[tokio::test]
async fn test_concurrent_calls_refresh_once() {
    let server = MockServer::builder()
        .credentials(USERNAME, PASSWORD)
        .reply("GetServerInfo", Reply::result("getserverinfo", json!({})))
        .spawn()
        .await
        .unwrap();
    let clock = Arc::new(ManualClock::default());
    let options = ClientOptions::default().with_clock(clock.clone());
    let client = Arc::new(
        TouchWorksClient::connect_with(config(&server), options)
            .await
            .unwrap(),
    );

    clock.advance(Duration::from_secs(30 * 60));

    let calls = (0..8).map(|_| {
        let client = client.clone();
        tokio::spawn(async move { client.get_server_info().await })
    });
    for call in calls.collect::<Vec<_>>() {
        call.await.unwrap().unwrap();
    }

    assert_eq!(server.login_count(), 2);
    let current = client.token();
    assert!(
        server
            .envelopes()
            .iter()
            .all(|envelope| envelope["Token"] == current.as_str())
    );
}

#[tokio::test]
async fn test_execute_accepts_hand_built_envelopes() {
    let server = MockServer::builder()
        .credentials(USERNAME, PASSWORD)
        .reply(
            "GetDictionary",
            Reply::result("getdictionaryinfo", json!([{ "EntryName": "Note" }])),
        )
        .spawn()
        .await
        .unwrap();
    let client = setup(&server).await;

    let envelope = client.build_envelope(
        EnvelopeDraft::new("GetDictionary")
            .token("")
            .parameter(1, "Document_Type_DE"),
    );
    assert_eq!(envelope.token, client.token().as_str());

    let response = client.execute(envelope).await.unwrap();
    let entries = client
        .unwrap(&response, "GetDictionary", "getdictionaryinfo")
        .unwrap();

    assert_eq!(entries, json!([{ "EntryName": "Note" }]));
}

#[tokio::test]
async fn test_invoke_by_action_name() {
    let server = MockServer::builder()
        .credentials(USERNAME, PASSWORD)
        .reply(
            "GetPatientsByICD9",
            Reply::result("getpatientsbyicd9info", json!([])),
        )
        .spawn()
        .await
        .unwrap();
    let client = setup(&server).await;

    let action = catalog::Action::by_name("getpatientsbyicd9").unwrap();
    let args = ActionArgs::new().user("other").arg("icd9", "250.00");
    client.invoke(action, args).await.unwrap();

    let envelope = &server.envelopes()[0];
    assert_eq!(envelope["Action"], "GetPatientsByICD9");
    assert_eq!(envelope["AppUserID"], "other");
    assert_eq!(envelope["Parameter1"], "250.00");
}
