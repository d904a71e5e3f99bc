//! Tests for the migrate command.

use mockito::Matcher;

use crate::support::server::*;
use crate::support::*;

const VALUES: &str = "\
# values exported from the old vault
NPM_TOKEN=npm_abc123
export DEPLOY_KEY=\"line one\\nline two\"
";

/// Source with one `all` and one `selected` secret, destination with `web`
/// but not `legacy-app`.
async fn standard_server() -> (Stub, crypto_box::SecretKey) {
    let mut server = Stub::start().await;
    let (secret, public) = keypair("key-1");

    server.secrets(SOURCE, &[("NPM_TOKEN", "all"), ("DEPLOY_KEY", "selected")]).await;
    server.scope(SOURCE, "DEPLOY_KEY", &[(1, "web"), (2, "legacy-app")]).await;
    server.repository(DEST, "web", 77).await;
    server.missing_repository(DEST, "legacy-app").await;
    server.key(DEST, &public).await;
    server.put(DEST, "NPM_TOKEN", 201).await;
    server.put(DEST, "DEPLOY_KEY", 201).await;

    (server, secret)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_migrate_recreates_secrets() {
    let (server, secret) = standard_server().await;
    let t = Test::new(server.url());
    t.write("values.env", VALUES);

    let output = t.migrate(SOURCE, DEST, &["--values", "values.env"]);

    assert_exit_code(&output, 0);
    assert_stdout_contains(&output, "NPM_TOKEN created");
    assert_stdout_contains(&output, "legacy-app not found in destination");
    assert_stdout_contains(&output, "Migration summary");

    let puts = server.received_puts();
    assert_eq!(puts.len(), 2);

    let (_, npm) = puts.iter().find(|(name, _)| name == "NPM_TOKEN").unwrap();
    assert_eq!(npm["visibility"], "all");
    assert!(npm.get("selected_repository_ids").is_none());
    assert_eq!(npm["key_id"], "key-1");
    assert_eq!(opened(&secret, npm), "npm_abc123");

    let (_, deploy) = puts.iter().find(|(name, _)| name == "DEPLOY_KEY").unwrap();
    assert_eq!(deploy["visibility"], "selected");
    assert_eq!(deploy["selected_repository_ids"], serde_json::json!([77]));
    assert_eq!(opened(&secret, deploy), "line one\nline two");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_values_exit_partial() {
    let (server, _) = standard_server().await;
    let t = Test::new(server.url());
    t.write("values.env", "NPM_TOKEN=npm_abc123\n");

    let output = t.migrate(SOURCE, DEST, &["--values", "values.env"]);

    assert_exit_code(&output, 2);
    assert_stdout_contains(&output, "Failed secrets");
    assert_stdout_contains(&output, "DEPLOY_KEY");
    assert_stdout_contains(&output, "no value supplied");

    let puts = server.received_puts();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].0, "NPM_TOKEN");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_upsert_exit_partial() {
    let mut server = Stub::start().await;
    let (_, public) = keypair("key-1");
    server.secrets(SOURCE, &[("NPM_TOKEN", "all"), ("DEPLOY_KEY", "all")]).await;
    server.key(DEST, &public).await;
    server.put(DEST, "NPM_TOKEN", 422).await;
    server.put(DEST, "DEPLOY_KEY", 204).await;
    let t = Test::new(server.url());
    t.write("values.env", VALUES);

    let output = t.migrate(SOURCE, DEST, &["--values", "values.env"]);

    assert_exit_code(&output, 2);
    assert_stdout_contains(&output, "DEPLOY_KEY updated");
    assert_stdout_contains(&output, "upsert failed");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dry_run_writes_nothing() {
    let (server, _) = standard_server().await;
    let t = Test::new(server.url());
    t.write("values.env", VALUES);

    let output = t.migrate(SOURCE, DEST, &["--values", "values.env", "--dry-run"]);

    assert_exit_code(&output, 0);
    assert_stdout_contains(&output, "Dry run summary");
    assert!(server.received_puts().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_report() {
    let (server, _) = standard_server().await;
    let t = Test::new(server.url());
    t.write("values.env", VALUES);

    let output = t.migrate(SOURCE, DEST, &["--values", "values.env", "--json"]);

    assert_exit_code(&output, 0);
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["source"], SOURCE);
    assert_eq!(report["destination"], DEST);
    assert_eq!(report["dry_run"], false);
    assert_eq!(report["outcomes"][0]["name"], "NPM_TOKEN");
    assert_eq!(report["outcomes"][0]["state"], "upserted");
    assert_eq!(report["outcomes"][1]["dropped_repositories"][0], "legacy-app");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unauthorized_is_fatal() {
    let mut server = Stub::start().await;
    server.unauthorized().await;
    let t = Test::new(server.url());
    t.write("values.env", VALUES);

    let output = t.migrate(SOURCE, DEST, &["--values", "values.env"]);

    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "authentication failed");
    assert_stderr_contains(&output, "admin:org");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_destination_key_is_fatal() {
    let mut server = Stub::start().await;
    server.secrets(SOURCE, &[("NPM_TOKEN", "all")]).await;
    let upserts = server
        .mock("PUT", Matcher::Any)
        .with_status(201)
        .expect(0)
        .create_async()
        .await;
    let t = Test::new(server.url());
    t.write("values.env", VALUES);

    let output = t.migrate(SOURCE, DEST, &["--values", "values.env"]);

    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "public key unavailable for new-org");
    upserts.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_secrets_never_appear_in_output() {
    let (server, _) = standard_server().await;
    let t = Test::new(server.url());
    t.write("values.env", VALUES);

    let output = t
        .cmd()
        .args(["--verbose", "migrate", "-s", SOURCE, "-d", DEST, "--yes"])
        .args(["--values", "values.env"])
        .env("SECRET_MIGRATOR_LOG", "secret_migrator=trace")
        .output()
        .unwrap();

    assert_exit_code(&output, 0);
    assert_output_excludes(&output, TEST_TOKEN);
    assert_output_excludes(&output, "npm_abc123");
    assert_output_excludes(&output, "line one");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_aborted_run_still_reports_written_secrets() {
    let mut server = Stub::start().await;
    let (_, public) = keypair("key-1");
    server.secrets(SOURCE, &[("NPM_TOKEN", "all"), ("DEPLOY_KEY", "all")]).await;
    server.key(DEST, &public).await;
    server.put(DEST, "NPM_TOKEN", 201).await;
    server.put(DEST, "DEPLOY_KEY", 401).await;
    let t = Test::new(server.url());
    t.write("values.env", VALUES);

    let output = t.migrate(SOURCE, DEST, &["--values", "values.env", "--json"]);

    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "authentication failed");
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["outcomes"][0]["name"], "NPM_TOKEN");
    assert_eq!(report["outcomes"][0]["state"], "upserted");
    assert_eq!(report["outcomes"][1]["cause"]["kind"], "aborted");
}
