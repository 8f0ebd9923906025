// End-to-end import of an experiment folder
use session_log_decoder::{
    Experiment, ExperimentTable, ImportConfig, PairingConfig, RowType, SessionTable,
    SubjectId, SubjectSelector, When, WhenItem,
};
use std::path::Path;

fn session_log(subject: &str, start: &str, body: &str) -> String {
    format!(
        "I Experiment name : reversal\n\
         I Task name : poke_task\n\
         I Subject ID : {subject}\n\
         I Start date : {start}\n\
         \n\
         S {{'wait_for_poke': 1, 'reward': 2}}\n\
         E {{'poke_in': 3, 'poke_out': 4, 'session_timer': 5}}\n\
         \n\
         {body}"
    )
}

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

fn populate(dir: &Path) {
    let body = "D 0 1\nD 100 3\nD 150 4\nD 150 2\nP 160 reward delivered\nD 900 1\nD 1000 5\n";
    for day in 1..=3 {
        write(
            dir,
            &format!("m1-2021-02-0{day}.txt"),
            &session_log("m1", &format!("2021/02/0{day} 09:30:00"), body),
        );
        write(
            dir,
            &format!("m2-2021-02-0{day}.txt"),
            &session_log("m2", &format!("2021/02/0{day} 11:00:00"), body),
        );
    }
    write(dir, "m3-truncated.txt", "I Experiment name : reversal\nD 0 1\n");
}

#[test]
fn experiment_round_trip_through_cache() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    populate(dir.path());

    let config = ImportConfig::new();
    let experiment = Experiment::open(dir.path(), &config).unwrap();

    assert_eq!(experiment.sessions().len(), 6);
    assert_eq!(experiment.import_failures().len(), 1);
    assert_eq!(experiment.import_failures()[0].file_name, "m3-truncated.txt");
    assert_eq!(experiment.subject_ids(), &[SubjectId::Int(1), SubjectId::Int(2)]);

    for subject in experiment.subject_ids() {
        let numbers: Vec<u32> = experiment
            .subject_sessions(subject)
            .into_iter()
            .filter_map(|s| s.number())
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    experiment.save().unwrap();
    assert!(experiment.cache_path().exists());

    let reopened = Experiment::open(dir.path(), &config).unwrap();
    // Only the file that failed before is parsed again
    assert_eq!(reopened.new_files_imported(), 1);
    assert_eq!(reopened.sessions(), experiment.sessions());

    let session = &reopened.sessions()[0];
    assert_eq!(session.times("poke_in"), &[100]);
    assert_eq!(session.print_lines, vec!["160 reward delivered".to_string()]);
}

#[test]
fn selecting_sessions() {
    let dir = tempfile::tempdir().unwrap();
    populate(dir.path());
    let experiment = Experiment::open(dir.path(), &ImportConfig::new().with_parallel(false)).unwrap();

    let second_onwards = When::from_items(&[WhenItem::Number(2), WhenItem::Open]).unwrap();
    assert_eq!(experiment.get_sessions(&SubjectSelector::All, &second_onwards).len(), 4);

    let m2_first = experiment.get_sessions(&SubjectId::Int(2).into(), &When::from(1));
    assert_eq!(m2_first.len(), 1);
    assert_eq!(m2_first[0].file_name, "m2-2021-02-01.txt");

    let dates: When = "2021-02-01,2021-02-03".parse().unwrap();
    assert_eq!(experiment.get_sessions(&SubjectSelector::All, &dates).len(), 4);

    assert!("1,...,2021-02-03".parse::<When>().is_err());
}

#[test]
fn experiment_table_from_folder() {
    let dir = tempfile::tempdir().unwrap();
    populate(dir.path());

    let pairing = PairingConfig::new().with_end_suffix("_out");
    let table = ExperimentTable::from_folder(dir.path(), &ImportConfig::new(), &pairing).unwrap();

    // Six sessions, each with five occurrence rows left after pairing and one print row
    assert_eq!(table.len(), 36);
    assert_eq!(table.skipped_files().len(), 1);
    assert_eq!(table.skipped_files()[0].file_name, "m3-truncated.txt");
    assert!(table.rows.iter().all(|r| r.row.row_type != RowType::Info));
    assert!(table
        .rows
        .iter()
        .all(|r| r.row.name.as_deref() != Some("poke_out")));

    let poke = table
        .rows
        .iter()
        .find(|r| r.row.name.as_deref() == Some("poke_in"))
        .unwrap();
    assert_eq!(poke.row.duration, Some(50));
    assert_eq!(table.info_value(poke, "Task name"), Some("poke_task"));

    let single = SessionTable::from_file(&dir.path().join("m1-2021-02-01.txt"), &pairing).unwrap();
    let states: Vec<_> = single
        .rows
        .iter()
        .filter(|r| r.row_type == RowType::State)
        .map(|r| r.duration)
        .collect();
    assert_eq!(states, vec![Some(150), Some(750), None]);
}
