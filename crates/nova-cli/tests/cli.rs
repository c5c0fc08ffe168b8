use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

fn nova() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("nova"))
}

const MAIN_JAVA: &str = "package p;\npublic class Main {\n    void run(Helper h) {\n        h.\n    }\n}\n";
const HELPER_JAVA: &str = "package p;\npublic class Helper {\n    public int size;\n}\n";

/// A two-project workspace: `App` (module `app`, requires `lib`) and `Lib`.
fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    temp.child("sources/Main.java").write_str(MAIN_JAVA).unwrap();
    let manifest = serde_json::json!({
        "projects": [
            {
                "name": "App",
                "dependencies": [{ "project": "Lib", "module_path": true }],
                "files": {
                    "/App/src/module-info.java": "module app { requires lib; }",
                    "/App/src/p/Main.java": { "path": "sources/Main.java" },
                    "/App/src/p/Helper.java": HELPER_JAVA
                },
                "units": [{
                    "path": "/App/src/p/Helper.java",
                    "package": "p",
                    "types": [{
                        "name": "Helper",
                        "kind": "class",
                        "modifiers": { "visibility": "public" },
                        "fields": [{
                            "name": "size",
                            "ty": { "name": "int" },
                            "modifiers": { "visibility": "public" }
                        }]
                    }]
                }]
            },
            {
                "name": "Lib",
                "files": { "/Lib/src/module-info.java": "module lib {}" }
            }
        ]
    });
    temp.child("workspace.json")
        .write_str(&manifest.to_string())
        .unwrap();
    temp
}

fn caret() -> usize {
    MAIN_JAVA.find("h.").unwrap() + 2
}

#[test]
fn help_mentions_core_commands() {
    nova().arg("--help").assert().success().stdout(
        predicate::str::contains("complete")
            .and(predicate::str::contains("select"))
            .and(predicate::str::contains("search")),
    );
}

#[test]
fn complete_prints_proposal_records() {
    let temp = workspace();
    nova()
        .current_dir(temp.path())
        .arg("complete")
        .arg("workspace.json")
        .arg("/App/src/p/Main.java")
        .arg(caret().to_string())
        .assert()
        .success()
        .stdout("size[FIELD_REF]{size, Lp.Helper;, I, size, null, 62}\n");
}

#[test]
fn complete_json_lists_proposals() {
    let temp = workspace();
    let output = nova()
        .current_dir(temp.path())
        .args(["complete", "workspace.json", "/App/src/module-info.java", "0", "--json"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = v
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["import", "module", "open"]);
}

#[test]
fn select_resolves_module_names() {
    let temp = workspace();
    let offset = "module app { requires ".len();
    nova()
        .current_dir(temp.path())
        .args(["select", "workspace.json", "/App/src/module-info.java"])
        .arg(offset.to_string())
        .assert()
        .success()
        .stdout("module lib\n");
}

#[test]
fn search_reports_module_occurrences() {
    let temp = workspace();
    nova()
        .current_dir(temp.path())
        .args(["search", "workspace.json", "lib", "--for", "module"])
        .assert()
        .success()
        .stdout(
            "/App/src/module-info.java app [lib] EXACT_MATCH\n\
             /Lib/src/module-info.java lib [lib] EXACT_MATCH\n",
        );
}

#[test]
fn search_respects_limit_and_project_scope() {
    let temp = workspace();
    nova()
        .current_dir(temp.path())
        .args([
            "search",
            "workspace.json",
            "lib",
            "--for",
            "module",
            "--limit-to",
            "declarations",
            "--project",
            "App",
        ])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn config_next_to_the_manifest_applies() {
    let temp = workspace();
    temp.child("nova.toml")
        .write_str("[completion]\nmax_results = 1\n\n[logging]\nstderr = false\n")
        .unwrap();
    nova()
        .current_dir(temp.path())
        .args(["complete", "workspace.json", "/App/src/module-info.java", "0"])
        .assert()
        .success()
        .stdout("import[KEYWORD]{import, null, null, import, null, 49}\n");
}

#[test]
fn missing_manifest_fails_with_context() {
    let temp = TempDir::new().unwrap();
    nova()
        .current_dir(temp.path())
        .args(["select", "absent.json", "/App/X.java", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to load workspace absent.json"));
}

#[test]
fn invalid_search_pattern_is_reported() {
    let temp = workspace();
    nova()
        .current_dir(temp.path())
        .args(["search", "workspace.json", "p.X<String", "--for", "type"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid search pattern"));
}

#[test]
fn units_without_source_text_are_rejected() {
    let temp = TempDir::new().unwrap();
    let manifest = serde_json::json!({
        "projects": [{
            "name": "App",
            "units": [{ "path": "/App/src/p/Helper.java", "package": "p" }]
        }]
    });
    temp.child("workspace.json")
        .write_str(&manifest.to_string())
        .unwrap();
    nova()
        .current_dir(temp.path())
        .args(["select", "workspace.json", "/App/src/p/Helper.java", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "unit `/App/src/p/Helper.java` in project `App` has no source file",
        ));
}

#[test]
fn schema_describes_config_sections() {
    let output = nova().arg("schema").output().unwrap();
    assert!(output.status.success());
    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let properties = schema["properties"].as_object().unwrap();
    for section in ["completion", "search", "logging"] {
        assert!(properties.contains_key(section), "missing `{section}`");
    }
}
