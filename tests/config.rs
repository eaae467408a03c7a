use std::io::Write;

use clap::Parser;
use serial_test::serial;
use withrisk::config::{self, AppEnvironment, CliArgs};

const CONNECTION_ENV: &str = "WITHRISK__DATABASE__CONNECTION_STRING";

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

fn parse(args: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(args).expect("valid cli")
}

#[test]
#[serial]
fn cli_overrides_beat_the_config_file() {
    let file = config_file(
        r#"
[server]
port = 7000

[database]
connection_string = "Data Source=from-file.db"

[app]
environment = "development"
"#,
    );
    let path = file.path().to_string_lossy().into_owned();

    let cli = parse(&[
        "withrisk",
        "--config-file",
        &path,
        "serve",
        "--server-port",
        "7100",
        "--connection-string",
        "Data Source=from-cli.db",
    ]);
    let settings = config::load(&cli).expect("settings");

    assert_eq!(settings.server.addr.port(), 7100);
    assert_eq!(
        settings.database.connection_string.as_deref(),
        Some("Data Source=from-cli.db")
    );
    assert_eq!(settings.app.environment, AppEnvironment::Development);
    assert!(settings.app.docs_ui);
}

#[test]
#[serial]
fn environment_overrides_the_config_file() {
    let file = config_file(
        r#"
[database]
connection_string = "Data Source=from-file.db"
"#,
    );
    let path = file.path().to_string_lossy().into_owned();

    // SAFETY: serialized with every other test that touches the environment.
    unsafe { std::env::set_var(CONNECTION_ENV, "Host=db;Database=blog") };
    let result = config::load(&parse(&["withrisk", "--config-file", &path, "seed"]));
    unsafe { std::env::remove_var(CONNECTION_ENV) };

    let settings = result.expect("settings");
    assert_eq!(
        settings.database.connection_string.as_deref(),
        Some("Host=db;Database=blog")
    );
    assert!(!settings.app.docs_ui);
}

#[test]
#[serial]
fn missing_config_file_is_an_error() {
    let cli = parse(&["withrisk", "--config-file", "/nonexistent/withrisk.toml"]);
    assert!(config::load(&cli).is_err());
}
