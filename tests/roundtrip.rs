//! Byte-fidelity of properties this tool does not own.

use std::fs;

use predicates::str::contains;

mod support;
use support::TestVdir;

const FOREIGN: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Apple Inc.//Mac OS X 10.15.7//EN\r\nBEGIN:VTODO\r\nUID:foreign-1\r\nSUMMARY:call the plumber\r\nX-APPLE-SORT-ORDER:517975afb\r\nX-MOZ-GENERATION:12\r\nBEGIN:VALARM\r\nTRIGGER:-PT15M\r\nACTION:DISPLAY\r\nDESCRIPTION:Reminder\r\nEND:VALARM\r\nEND:VTODO\r\nEND:VCALENDAR\r\n";

#[test]
fn editing_preserves_foreign_properties_and_alarms() {
    let vdir = TestVdir::init();
    let home = vdir.add_list("home");
    vdir.write_ics("home", "foreign.ics", FOREIGN);

    vdir.cmd()
        .args(["edit", "1", "--priority", "high"])
        .assert()
        .success();

    let text = fs::read_to_string(home.join("foreign.ics")).unwrap();
    assert!(text.contains("X-APPLE-SORT-ORDER:517975afb\r\n"));
    assert!(text.contains("X-MOZ-GENERATION:12\r\n"));
    assert!(text.contains(
        "BEGIN:VALARM\r\nTRIGGER:-PT15M\r\nACTION:DISPLAY\r\nDESCRIPTION:Reminder\r\nEND:VALARM\r\n"
    ));
    assert!(text.contains("PRODID:-//Apple Inc.//Mac OS X 10.15.7//EN\r\n"));
    assert!(text.contains("PRIORITY:4\r\n"));
    assert!(text.contains("UID:foreign-1\r\n"));
}

#[test]
fn folded_lines_survive_untouched() {
    let vdir = TestVdir::init();
    let home = vdir.add_list("home");
    // A long X- property folded across two lines, exactly as a client wrote it.
    let folded = "BEGIN:VCALENDAR\r\nBEGIN:VTODO\r\nUID:folded-1\r\nSUMMARY:short\r\nX-CUSTOM-NOTE:This is a rather long note that was folded by the origina\r\n l client and must come back byte-identical\r\nEND:VTODO\r\nEND:VCALENDAR\r\n";
    vdir.write_ics("home", "folded.ics", folded);

    vdir.cmd()
        .args(["edit", "1", "--summary", "still short"])
        .assert()
        .success();

    let text = fs::read_to_string(home.join("folded.ics")).unwrap();
    assert!(text.contains(
        "X-CUSTOM-NOTE:This is a rather long note that was folded by the origina\r\n l client and must come back byte-identical\r\n"
    ));
    assert!(text.contains("SUMMARY:still short"));
}

#[test]
fn multi_vtodo_files_are_listed_but_read_only() {
    let vdir = TestVdir::init();
    vdir.add_list("home");
    let text = "BEGIN:VCALENDAR\r\nBEGIN:VTODO\r\nUID:pair-a\r\nSUMMARY:first of two\r\nEND:VTODO\r\nBEGIN:VTODO\r\nUID:pair-b\r\nSUMMARY:second of two\r\nEND:VTODO\r\nEND:VCALENDAR\r\n";
    vdir.write_ics("home", "pair.ics", text);

    // Listed once, readable.
    vdir.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(contains("first of two"));
    vdir.cmd().args(["show", "1"]).assert().success();

    // Mutation is refused with the dedicated exit code.
    vdir.cmd()
        .args(["done", "1"])
        .assert()
        .code(21)
        .stderr(contains("read-only"));
    vdir.cmd().args(["delete", "1", "--yes"]).assert().code(21);
}

#[test]
fn path_prints_the_backing_file() {
    let vdir = TestVdir::init();
    let home = vdir.add_list("home");
    vdir.write_ics("home", "here.ics", &support::vtodo("uid-here", "find me", ""));

    vdir.cmd()
        .args(["path", "1"])
        .assert()
        .success()
        .stdout(contains(home.join("here.ics").display().to_string()));
}

#[test]
fn show_unknown_id_exits_20() {
    let vdir = TestVdir::init();
    vdir.add_list("home");
    vdir.cmd()
        .args(["show", "5"])
        .assert()
        .code(20)
        .stderr(contains("No todo with id 5"));
}
