use std::{fs, path::PathBuf, process::Command};

fn run_bin(args: &[&str]) {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_transferre"));

    let output = Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute command");

    let stdout_str =
        std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
    let stderr_str =
        std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

    assert!(
        output.status.success(),
        "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
    );
}

#[test]
fn basic_workflow() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("basic_workflow");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let params_path = test_dir.join("params.json");
    let params_contents = r#"{
  "r": 1.0,
  "s": 0.0,
  "c": 0.05,
  "mu": 0.01,
  "delta": 0.01,
  "beta": 0.02,
  "K": 0.05
}"#;
    fs::write(&params_path, params_contents).expect("failed to write parameter file");

    let params_str = params_path
        .to_str()
        .expect("failed to convert parameter path to string");
    let ode_out = test_dir.join("ode_results.json");
    let ode_out_str = ode_out.to_str().expect("failed to convert output path");
    let ssa_out = test_dir.join("ssa_results.json");
    let ssa_out_str = ssa_out.to_str().expect("failed to convert output path");

    run_bin(&[
        "--params",
        params_str,
        "--tmax",
        "20",
        "--out",
        ode_out_str,
        "ode",
    ]);
    assert!(ode_out.is_file());

    run_bin(&[
        "--params",
        params_str,
        "--tmax",
        "10",
        "--out",
        ssa_out_str,
        "ssa",
        "--runs",
        "3",
        "--seed",
        "42",
    ]);
    assert!(ssa_out.is_file());

    let ssa_json = fs::read_to_string(&ssa_out).expect("failed to read results");
    assert!(ssa_json.contains("\"batches\""));
    assert!(ssa_json.contains("\"extinct_fraction\""));

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn invalid_parameters_fail_fast() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("invalid_parameters");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    // Missing the transfer rate entirely.
    let params_path = test_dir.join("params.json");
    fs::write(
        &params_path,
        r#"{ "r": 1.0, "s": 0.0, "c": 0.05, "mu": 0.01, "delta": 0.01, "K": 100.0 }"#,
    )
    .expect("failed to write parameter file");

    let bin = PathBuf::from(env!("CARGO_BIN_EXE_transferre"));
    let output = Command::new(bin)
        .args([
            "--params",
            params_path.to_str().expect("failed to convert path"),
            "ode",
        ])
        .output()
        .expect("failed to execute command");

    assert!(!output.status.success());

    fs::remove_dir_all(&test_dir).ok();
}
