//! Declaration file to plan to persisted snapshot, end to end.

mod common;

use std::sync::Arc;

use common::{response, ScriptedApi, PASSWORD};
use dbaas_provider::model::password_of;
use dbaas_provider::value::CodecError;
use dbaas_provider::{
    manifest, plan, snapshot, ProjectRef, ProviderError, Reconciler, ReconcilerContext,
    SchemaVersion, TypedValue,
};

const DECLARATION: &str = r#"
name: orders
service_config:
  disksize: 25
  flavor: m2c.small
  region: dus2
application_config:
  type: postgresql
  version: "16.2"
  instances: 1
  password: correct-horse-battery-staple
  scheduled_backups:
    retention: 14
"#;

#[tokio::test(start_paused = true)]
async fn test_declaration_to_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let declaration = dir.path().join("orders.yaml");
    let state_file = dir.path().join("orders.state.json");
    std::fs::write(&declaration, DECLARATION).unwrap();

    let v = SchemaVersion::V2;
    let declared = manifest::load_declaration(&declaration, v).unwrap();
    let proposed = plan::propose(&declared, None).unwrap();

    // Computed values are Unknown until applied and cannot be persisted.
    let err = snapshot::save(&state_file, v, &proposed).unwrap_err();
    assert!(matches!(
        err,
        ProviderError::Codec(CodecError::UnknownInSnapshot { .. })
    ));

    let api = Arc::new(ScriptedApi::returning(response(v, "Ready")));
    let reconciler = Reconciler::new(api.clone(), ReconcilerContext::new(ProjectRef::new("o", "p"), v));
    let outcome = reconciler.create(&proposed).await;
    assert!(outcome.is_success(), "{}", outcome.diagnostics);

    let request = serde_json::to_value(api.last_create().unwrap()).unwrap();
    assert_eq!(request["description"], "");
    assert_eq!(request["service_config"]["type"], "database");
    assert_eq!(request["application_config"]["scheduled_backups"]["retention"], 14);

    let state = outcome.state.unwrap();
    snapshot::save(&state_file, v, &state).unwrap();
    let (version, loaded) = snapshot::load(&state_file).unwrap();
    assert_eq!(version, v);
    assert_eq!(loaded, state);
    assert_eq!(
        password_of(&loaded).unwrap(),
        TypedValue::Known(PASSWORD.to_string())
    );

    // A second plan against the persisted state keeps the computed values.
    let replanned = plan::propose(&declared, Some(&loaded)).unwrap();
    assert_eq!(replanned.string("uuid").unwrap(), loaded.string("uuid").unwrap());
}
