use kernel::{Config, Devices, Kernel, RecordingConsole};
use os::{DiskCommand, execute, parse_script, run_to_completion};

fn boot() -> (Kernel, RecordingConsole) {
    let console = RecordingConsole::new();
    let kernel = Kernel::with_devices(Config::default(), Devices::with_console(console.clone()))
        .expect("default config boots");
    (kernel, console)
}

#[test]
fn parses_every_command() {
    let script = r#"
        # set up
        create notes
        write notes "hello, disk"
        READ notes

        ls
        delete notes
    "#;
    let commands = parse_script(script).unwrap();
    assert_eq!(
        commands,
        vec![
            DiskCommand::Create("notes".into()),
            DiskCommand::Write {
                name: "notes".into(),
                data: "hello, disk".into()
            },
            DiskCommand::Read("notes".into()),
            DiskCommand::List,
            DiskCommand::Delete("notes".into()),
        ]
    );
}

#[test]
fn bad_lines_are_reported_with_their_number() {
    let err = parse_script("ls\nformat c:").unwrap_err();
    assert!(format!("{:#}", err).contains("line 2"));

    assert!(parse_script("create").is_err());
    assert!(parse_script("write notes hello").is_err());
    assert!(parse_script("write notes").is_err());
}

#[test]
fn script_runs_against_a_formatted_disk() {
    let (mut kernel, console) = boot();
    kernel.format().unwrap();
    let commands = parse_script(
        "create a\nwrite a \"first file\"\nread a\ncreate a\nread missing\ndelete a\nls",
    )
    .unwrap();

    assert_eq!(execute(&mut kernel, &commands), 2);
    let output = console.output();
    assert!(output.contains("Created A."));
    assert!(output.contains("first file"));
    assert!(output.contains("Error: file A already exists"));
    assert!(output.contains("Error: file MISSING not found"));
    assert!(output.contains("Deleted A."));
    assert!(output.contains("No files."));
    assert_eq!(kernel.fs().file_count(), 0);
    println!("✅ disk script replayed");
}

#[test]
fn run_summary_reports_finished_processes() {
    let (mut kernel, console) = boot();
    kernel.new_process("A2 01 A0 03 FF 00").unwrap();
    kernel.new_process("A2 01 A0 04 FF 00").unwrap();

    let summary = run_to_completion(&mut kernel, 1_000);
    assert!(summary.is_clean());
    assert_eq!(summary.fatal, None);
    assert_eq!(summary.stats.cycles, 8);
    assert!(summary.ticks < 1_000);
    assert_eq!(console.output(), "3\n> 4\n> ");
}

#[test]
fn run_summary_reports_the_tick_limit() {
    let (mut kernel, _) = boot();
    kernel.new_process("D0 FE").unwrap();

    let summary = run_to_completion(&mut kernel, 50);
    assert_eq!(summary.ticks, 50);
    assert_eq!(summary.unfinished, 1);
    assert!(!summary.is_clean());
}
