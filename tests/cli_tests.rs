use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::NamedTempFile;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.write_stdin(script.to_string()).assert()
}

#[test]
fn cli_creates_and_lists_milestones() {
    run_cli("add 2025-03-01 Slab poured\nshow\nquit\n")
        .success()
        .stdout(str_contains("Milestone saved"))
        .stdout(str_contains("Created milestone 1."))
        .stdout(str_contains("Slab poured"));
}

#[test]
fn cli_shows_progress_from_linked_items() {
    let script = "item add 1 task Formwork\nitem add 2 defect Honeycombing\n\
                  item status 1 done\nadd 2025-03-01 Slab\nlink 1 1,2\nshow\nquit\n";
    run_cli(script)
        .success()
        .stdout(str_contains("Item 1 is now done."))
        .stdout(str_contains("| 50%"))
        .stdout(str_contains("rgb(239, 259, 68)"));
}

#[test]
fn cli_reports_validation_errors_as_toasts() {
    run_cli("add 2025-03-10 Roof\nend 1 2025-03-01\nquit\n")
        .success()
        .stdout(str_contains(
            "Error: end date 2025-03-01 is before start date 2025-03-10",
        ));
}

#[test]
fn cli_delete_asks_for_confirmation() {
    run_cli("add 2025-03-01 Slab\ndelete 1\nn\ndelete 1\ny\nshow\nquit\n")
        .success()
        .stdout(str_contains("Delete 'Slab'? [y/N]"))
        .stdout(str_contains("Delete cancelled."))
        .stdout(str_contains("Deleted milestone 1."))
        .stdout(str_contains("Milestone deleted"));
}

#[test]
fn cli_status_needs_target_end_date() {
    run_cli("add 2099-01-01 Start\nstatus\nquit\n")
        .success()
        .stdout(str_contains("status=unknown"));
}

#[test]
fn cli_single_completed_milestone_is_ahead() {
    run_cli("meta target 2099-12-31\nadd 2099-01-01 Start\ntoggle 1\nstatus\nquit\n")
        .success()
        .stdout(str_contains("Milestone marked as completed"))
        .stdout(str_contains("progress=100%"))
        .stdout(str_contains("status=ahead"));
}

#[test]
fn cli_save_and_load_json_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().to_string();
    let script = format!(
        "meta name Riverside\nadd 2025-02-01 Persisted\nsave json {}\n\
         add 2025-03-01 Temporary\nload json {}\nshow\nmeta show\nquit\n",
        path, path
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(
        output.contains("Schedule loaded from"),
        "expected output to mention load completion"
    );
    let after_reload = output
        .split("Schedule loaded from")
        .last()
        .unwrap_or_default();
    assert!(after_reload.contains("Persisted"));
    assert!(after_reload.contains("Riverside"));
    assert!(
        !after_reload.contains("Temporary"),
        "milestone added after saving should not appear after reload:\n{}",
        after_reload
    );
}

#[test]
fn cli_json_round_trip_keeps_unlinked_items() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().to_string();
    let script = format!(
        "item add 7 task Scaffold\nsave json {}\nitem add 8 defect Temporary\n\
         load json {}\nitems\nquit\n",
        path, path
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    let after_reload = output
        .split("Schedule loaded from")
        .last()
        .unwrap_or_default();
    assert!(
        after_reload.contains("Scaffold"),
        "unlinked item should survive save and load:\n{}",
        after_reload
    );
    assert!(!after_reload.contains("Temporary"));
}

#[test]
fn cli_table_aligns_non_ascii_titles() {
    let assert = run_cli("add 2025-05-05 Türen einbauen\nadd 2025-06-02 Roof\nshow\nquit\n").success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    let table: Vec<&str> = output
        .lines()
        .map(|line| line.trim_start_matches("> "))
        .filter(|line| line.starts_with('+') || line.starts_with('|'))
        .collect();
    assert!(table.iter().any(|line| line.contains("Türen einbauen")));
    let width = table[0].chars().count();
    for line in &table {
        assert_eq!(line.chars().count(), width, "misaligned row: {}", line);
    }
}

#[test]
fn cli_rejects_unknown_commands() {
    run_cli("frobnicate\nquit\n")
        .success()
        .stdout(str_contains("Unknown command. Type 'help'."));
}
