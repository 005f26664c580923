//! CLI behavior tests: exit codes, output formats, init, experiments.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use textgauge::experiment::{
    Experiment, ExperimentResponse, ExperimentStatus, ExperimentStore, JsonFileStore,
};
use textgauge::generation::GenerationParams;
use textgauge::TextQualityScorer;

const OWNERSHIP: &str = "test-fixtures/responses/ownership.md";
const OWNERSHIP_PROMPT: &str = "Explain ownership and borrowing in Rust";
const RESPONSES_DIR: &str = "test-fixtures/responses";

fn textgauge_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_textgauge"));
    cmd.env("NO_COLOR", "1").env_remove("TEXTGAUGE_LOG");
    cmd
}

/// Store with one completed experiment; returns its id
fn seeded_store(path: &std::path::Path) -> String {
    let store = JsonFileStore::open(path).unwrap();
    let scorer = TextQualityScorer::new();
    let prompt = "Explain the solution efficiency";

    let mut e = Experiment::new(prompt, GenerationParams::defaults()).unwrap();
    e.transition_to(ExperimentStatus::Running).unwrap();
    e.transition_to(ExperimentStatus::Completed).unwrap();
    let texts = [
        "",
        "However, the solution works well. Therefore, it is efficient. For example, consider this case in detail.",
        "Short.",
    ];
    e.responses = Some(
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                ExperimentResponse::scored(i, e.configs[i], t.to_string(), false, prompt, &scorer)
            })
            .collect(),
    );
    let id = e.id.clone();
    store.create(e).unwrap();
    id
}

#[test]
fn no_args_returns_error_not_panic() {
    let mut cmd = textgauge_cmd();
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("PATH"));
}

#[test]
fn below_threshold_exit_1() {
    // ownership.md scores 81.5
    let mut cmd = textgauge_cmd();
    cmd.arg(OWNERSHIP)
        .arg("--prompt")
        .arg(OWNERSHIP_PROMPT)
        .arg("--threshold")
        .arg("82");
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("below threshold 82"));
}

#[test]
fn above_threshold_exit_0() {
    let mut cmd = textgauge_cmd();
    cmd.arg(OWNERSHIP)
        .arg("--prompt")
        .arg(OWNERSHIP_PROMPT)
        .arg("--threshold")
        .arg("81");
    cmd.assert().success();
}

#[test]
fn json_output_valid() {
    let mut cmd = textgauge_cmd();
    cmd.arg(OWNERSHIP).arg("--prompt").arg(OWNERSHIP_PROMPT).arg("--json");
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let s = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(s.trim()).expect("valid JSON");
    assert_eq!(parsed["metrics"]["overall"], 81.5);
    assert_eq!(parsed["grade"], "B");
    assert!(parsed.get("breakdown").is_none());
}

#[test]
fn json_verbose_includes_breakdown() {
    let mut cmd = textgauge_cmd();
    cmd.arg(OWNERSHIP)
        .arg("--prompt")
        .arg(OWNERSHIP_PROMPT)
        .arg("--json")
        .arg("--verbose");
    let output = cmd.output().unwrap();
    let s = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(s.trim()).unwrap();
    let structure = &parsed["breakdown"]["structure"]["components"];
    assert_eq!(structure["hasFormatting"], true);
    assert_eq!(structure["hasList"], true);
    assert_eq!(structure["hasConclusion"], true);
}

#[test]
fn prompt_file_matches_inline_prompt() {
    let dir = tempfile::TempDir::new().unwrap();
    let prompt_path = dir.path().join("prompt.txt");
    fs::write(&prompt_path, format!("{}\n", OWNERSHIP_PROMPT)).unwrap();

    let mut cmd = textgauge_cmd();
    cmd.arg(OWNERSHIP)
        .arg("--prompt-file")
        .arg(&prompt_path)
        .arg("--quiet");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ownership.md: 81.50 (B)"));
}

#[test]
fn stdin_input() {
    let mut cmd = textgauge_cmd();
    cmd.arg("-")
        .arg("--prompt")
        .arg("anything")
        .arg("--quiet")
        .write_stdin("");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("<stdin>: 27.50 (F)"));
}

#[test]
fn missing_prompt_exit_2() {
    let mut cmd = textgauge_cmd();
    cmd.arg(OWNERSHIP);
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("prompt is required"));
}

#[test]
fn default_prompt_from_config() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(
        dir.path().join(".textgaugerc.json"),
        format!(r#"{{ "defaultPrompt": "{}" }}"#, OWNERSHIP_PROMPT),
    )
    .unwrap();
    fs::copy(OWNERSHIP, dir.path().join("answer.md")).unwrap();

    let mut cmd = textgauge_cmd();
    cmd.arg(dir.path().join("answer.md")).arg("--quiet");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("81.50"));
}

#[test]
fn config_threshold_applies() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(dir.path().join(".textgaugerc.json"), r#"{ "threshold": 95 }"#).unwrap();
    fs::copy(OWNERSHIP, dir.path().join("answer.md")).unwrap();

    let mut cmd = textgauge_cmd();
    cmd.arg(dir.path().join("answer.md"))
        .arg("--prompt")
        .arg(OWNERSHIP_PROMPT);
    cmd.assert().failure().code(1);

    // CLI threshold wins over config
    let mut cmd = textgauge_cmd();
    cmd.arg(dir.path().join("answer.md"))
        .arg("--prompt")
        .arg(OWNERSHIP_PROMPT)
        .arg("--threshold")
        .arg("50");
    cmd.assert().success();
}

#[test]
fn file_not_found_exit_2() {
    let mut cmd = textgauge_cmd();
    cmd.arg("nonexistent.md").arg("--prompt").arg("x");
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("nonexistent"));
}

#[test]
fn directory_scoring_reports_summary() {
    let mut cmd = textgauge_cmd();
    cmd.arg(RESPONSES_DIR)
        .arg("--prompt")
        .arg(OWNERSHIP_PROMPT)
        .arg("--json");
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let s = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(s.trim()).unwrap();
    assert_eq!(parsed["summary"]["filesScored"], 5);
    let sources: Vec<_> = parsed["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["source"].as_str().unwrap().to_string())
        .collect();
    let mut sorted = sources.clone();
    sorted.sort();
    assert_eq!(sources, sorted, "results should be sorted by path");
}

#[test]
fn parallel_flag_gives_same_json() {
    let run = |parallel: bool| {
        let mut cmd = textgauge_cmd();
        cmd.arg(RESPONSES_DIR)
            .arg("--prompt")
            .arg(OWNERSHIP_PROMPT)
            .arg("--json");
        if parallel {
            cmd.arg("--parallel").arg("--jobs").arg("2");
        }
        cmd.output().unwrap().stdout
    };
    assert_eq!(run(false), run(true));
}

#[test]
fn human_output_shows_breakdown() {
    let mut cmd = textgauge_cmd();
    cmd.arg(OWNERSHIP).arg("--prompt").arg(OWNERSHIP_PROMPT);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Score Breakdown"))
        .stdout(predicate::str::contains("Coherence"))
        .stdout(predicate::str::contains("Recommendations"));
}

#[test]
fn init_creates_config() {
    let dir = tempfile::TempDir::new().unwrap();
    let config_path = dir.path().join(".textgaugerc.json");
    let mut cmd = textgauge_cmd();
    cmd.arg("init")
        .arg("--dir")
        .arg(dir.path())
        .arg("--threshold")
        .arg("85");
    cmd.assert().success();

    let content = fs::read_to_string(&config_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed["threshold"], 85);
    assert_eq!(parsed["configs"].as_array().unwrap().len(), 3);
    assert_eq!(parsed["generation"]["apiKeyEnv"], "GROQ_API_KEY");

    // The written config must load back
    textgauge::config::load_config(dir.path(), None).unwrap();
}

#[test]
fn init_does_not_overwrite() {
    let dir = tempfile::TempDir::new().unwrap();
    let config_path = dir.path().join(".textgaugerc.json");
    fs::write(&config_path, "{}").unwrap();

    let mut cmd = textgauge_cmd();
    cmd.arg("init").arg("--dir").arg(dir.path());
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(fs::read_to_string(&config_path).unwrap(), "{}");
}

#[test]
fn experiment_list_empty_store() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut cmd = textgauge_cmd();
    cmd.current_dir(dir.path())
        .args(["experiment", "list", "--store"])
        .arg(dir.path().join("store.json"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No experiments yet"));
}

#[test]
fn experiment_list_and_show() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = dir.path().join("store.json");
    let id = seeded_store(&store);

    let mut cmd = textgauge_cmd();
    cmd.current_dir(dir.path())
        .args(["experiment", "list", "--store"])
        .arg(&store);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()))
        .stdout(predicate::str::contains("completed"));

    let mut cmd = textgauge_cmd();
    cmd.current_dir(dir.path())
        .args(["experiment", "show", &id, "--json", "--store"])
        .arg(&store);
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
    assert_eq!(parsed["comparison"]["bestOverall"]["id"], "B");
    assert_eq!(parsed["responses"].as_array().unwrap().len(), 3);
}

#[test]
fn experiment_show_unknown_exit_2() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut cmd = textgauge_cmd();
    cmd.current_dir(dir.path())
        .args(["experiment", "show", "0000000000000", "--store"])
        .arg(dir.path().join("store.json"));
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn experiment_export_to_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = dir.path().join("store.json");
    let id = seeded_store(&store);
    let out = dir.path().join("export.json");

    let mut cmd = textgauge_cmd();
    cmd.current_dir(dir.path())
        .args(["experiment", "export", &id, "--output"])
        .arg(&out)
        .arg("--store")
        .arg(&store);
    cmd.assert().success();

    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(parsed["experiment_id"], id.as_str());
    assert_eq!(parsed["summary"]["best_configuration"], "B");
    assert_eq!(parsed["summary"]["best_overall_score"], 71.28);
    assert_eq!(parsed["results"].as_array().unwrap().len(), 3);
}

#[test]
fn experiment_delete() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = dir.path().join("store.json");
    let id = seeded_store(&store);

    let mut cmd = textgauge_cmd();
    cmd.current_dir(dir.path())
        .args(["experiment", "delete", &id, "--store"])
        .arg(&store);
    cmd.assert().success();

    assert!(JsonFileStore::open(&store).unwrap().list(10).unwrap().is_empty());

    let mut cmd = textgauge_cmd();
    cmd.current_dir(dir.path())
        .args(["experiment", "delete", &id, "--store"])
        .arg(&store);
    cmd.assert().failure().code(2);
}

#[test]
fn experiment_run_without_backend_exit_2() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = dir.path().join("store.json");

    let mut cmd = textgauge_cmd();
    cmd.current_dir(dir.path())
        .env_remove("GROQ_API_KEY")
        .args(["experiment", "run", "--prompt", "Explain ownership", "--store"])
        .arg(&store);
    cmd.assert().failure().code(2);

    // Nothing is stored when generation cannot start
    assert!(!store.exists());
}

#[test]
fn corrupt_store_names_path() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = dir.path().join("store.json");
    fs::write(&store, "not json").unwrap();

    let mut cmd = textgauge_cmd();
    cmd.current_dir(dir.path())
        .args(["experiment", "list", "--store"])
        .arg(&store);
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("store.json"));
}
