use predicates::prelude::*;
use predicates::str::contains;

mod support;
use support::{vtodo, TestVdir};

fn seeded() -> TestVdir {
    let vdir = TestVdir::init();
    vdir.add_list("home");
    vdir.add_list("work");
    vdir.write_ics(
        "home",
        "groceries.ics",
        &vtodo(
            "uid-groceries",
            "buy groceries",
            "DUE;VALUE=DATE:20240401\r\nPRIORITY:9\r\nCATEGORIES:errands\r\n",
        ),
    );
    vdir.write_ics(
        "home",
        "someday.ics",
        &vtodo("uid-someday", "learn the accordion", ""),
    );
    vdir.write_ics(
        "work",
        "report.ics",
        &vtodo(
            "uid-report",
            "write quarterly report",
            "DUE;VALUE=DATE:20240501\r\nPRIORITY:1\r\nCATEGORIES:writing,deep\r\nLOCATION:office\r\n",
        ),
    );
    vdir.write_ics(
        "work",
        "shipped.ics",
        &vtodo("uid-shipped", "ship the release", "STATUS:COMPLETED\r\n"),
    );
    vdir
}

#[test]
fn default_listing_sorts_by_due_then_priority_and_hides_done() {
    let vdir = seeded();
    let output = vdir.cmd().arg("list").assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3, "completed todo must be hidden: {stdout}");
    // Due 2024-04-01 first, then 2024-05-01, undated last.
    assert!(lines[0].contains("buy groceries"));
    assert!(lines[1].contains("write quarterly report"));
    assert!(lines[2].contains("learn the accordion"));
}

#[test]
fn list_restricts_to_named_lists() {
    let vdir = seeded();
    vdir.cmd()
        .args(["list", "work"])
        .assert()
        .success()
        .stdout(contains("quarterly report").and(contains("groceries").not()));
}

#[test]
fn list_name_match_is_case_insensitive() {
    let vdir = seeded();
    vdir.cmd()
        .args(["list", "WORK"])
        .assert()
        .success()
        .stdout(contains("quarterly report"));

    vdir.cmd()
        .args(["list", "chores"])
        .assert()
        .code(2)
        .stderr(contains("No list named chores").and(contains("home")));
}

#[test]
fn category_filter_matches_any() {
    let vdir = seeded();
    vdir.cmd()
        .args(["list", "--category", "ERRANDS", "--category", "writing"])
        .assert()
        .success()
        .stdout(
            contains("groceries")
                .and(contains("quarterly report"))
                .and(contains("accordion").not()),
        );
}

#[test]
fn grep_and_location_filters() {
    let vdir = seeded();
    vdir.cmd()
        .args(["list", "--grep", "Quarterly"])
        .assert()
        .success()
        .stdout(contains("quarterly report").and(contains("groceries").not()));

    vdir.cmd()
        .args(["list", "--location", "office"])
        .assert()
        .success()
        .stdout(contains("quarterly report").and(contains("groceries").not()));
}

#[test]
fn priority_floor_keeps_important_todos() {
    let vdir = seeded();
    vdir.cmd()
        .args(["list", "--priority", "high"])
        .assert()
        .success()
        .stdout(contains("quarterly report").and(contains("groceries").not()));
}

#[test]
fn custom_sort_reverses() {
    let vdir = seeded();
    let output = vdir
        .cmd()
        .args(["list", "--sort", "-due"])
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    // Reversed due puts undated first, then latest due.
    assert!(lines[0].contains("accordion"));
    assert!(lines[1].contains("quarterly report"));
    assert!(lines[2].contains("groceries"));

    vdir.cmd()
        .args(["list", "--sort", "nonsense"])
        .assert()
        .code(2)
        .stderr(contains("unknown sort field"));
}

#[test]
fn startable_excludes_future_starts() {
    let vdir = TestVdir::init();
    vdir.add_list("home");
    vdir.write_ics(
        "home",
        "future.ics",
        &vtodo("uid-future", "not yet", "DTSTART;VALUE=DATE:29990101\r\n"),
    );
    vdir.write_ics("home", "now.ics", &vtodo("uid-now", "anytime", ""));

    vdir.cmd()
        .args(["list", "--startable"])
        .assert()
        .success()
        .stdout(contains("anytime").and(contains("not yet").not()));
}

#[test]
fn porcelain_is_a_json_array_with_the_stable_fields() {
    let vdir = seeded();
    let output = vdir
        .cmd()
        .args(["--porcelain", "list"])
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let rows = value.as_array().expect("array");
    assert_eq!(rows.len(), 3);

    for row in rows {
        for field in [
            "id",
            "list",
            "list_colour",
            "summary",
            "description",
            "location",
            "completed",
            "percent",
            "priority",
            "categories",
            "start",
            "due",
            "completed_at",
            "recurring",
        ] {
            assert!(row.get(field).is_some(), "missing field {field}");
        }
    }

    let first = &rows[0];
    assert_eq!(first["summary"], "buy groceries");
    assert!(first["due"].is_i64());
    assert_eq!(first["completed"], false);
    assert_eq!(first["start"], serde_json::Value::Null);
}

#[test]
fn ids_are_stable_across_runs_when_nothing_changes() {
    let vdir = seeded();
    let first = vdir.cmd().args(["--porcelain", "list"]).assert().success();
    let second = vdir.cmd().args(["--porcelain", "list"]).assert().success();
    assert_eq!(first.get_output().stdout, second.get_output().stdout);
}
