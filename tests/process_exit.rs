//! Behaviour only observable from outside the process: exit status and
//! what reaches stdout/stderr.

use std::process::{Command, Output};

use mesh_host::{import_service, ServiceContext, ServiceDescriptor, ServiceError};

/// Set in the re-executed test binary to run the child half of a test.
const CHILD_ENV: &str = "MESH_HOST_TEST_CHILD";

fn noop(name: &str) -> ServiceDescriptor {
    ServiceDescriptor::new(name, |_ctx: ServiceContext| async { Ok::<(), ServiceError>(()) })
}

/// Re-run this test binary with only `test` selected and `CHILD_ENV` set.
fn rerun_as_child(test: &str) -> Output {
    let exe = std::env::current_exe().unwrap();
    Command::new(exe)
        .args([test, "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, "1")
        .output()
        .unwrap()
}

#[test]
fn test_duplicate_import_exits_process() {
    if std::env::var_os(CHILD_ENV).is_some() {
        import_service(noop("twin"));
        import_service(noop("twin"));
        // Only reached if the second import returned.
        std::process::exit(0);
    }

    let output = rerun_as_child("test_duplicate_import_exits_process");

    assert_eq!(output.status.code(), Some(70));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("mesh-host: duplicate import service twin"),
        "stderr: {stderr}"
    );
}

#[test]
fn test_binary_logs_registration_and_missing_config() {
    let output = Command::new(env!("CARGO_BIN_EXE_mesh-host"))
        .args(["--set", "agent.node_id=bad id", "--set", "logging.ansi=false"])
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("Imported service").count(), 2, "stdout: {stdout}");
    assert!(stdout.contains("No configuration file given"), "stdout: {stdout}");
    assert!(stdout.contains("Bootstrap failed"), "stdout: {stdout}");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("mesh-host: create agent error"), "stderr: {stderr}");
}
