//! Table and summary output
//!
//! Writes session and experiment tables as tab-separated text or JSON, and
//! prints human-readable session summaries.

use crate::config::OutputFormat;
use anyhow::Result;
use session_log_decoder::{Experiment, ExperimentTable, Session, SessionTable, COLUMNS};
use std::io::Write;

/// Write a session table
pub fn write_session_table(table: &SessionTable, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    match format {
        OutputFormat::Txt => {
            writeln!(out, "{}", COLUMNS.join("\t"))?;
            for row in &table.rows {
                write_cells(out, row.cells().iter().map(|c| c.as_deref()))?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &table.rows)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Write an experiment table
pub fn write_experiment_table(
    table: &ExperimentTable,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Txt => {
            writeln!(out, "{}", table.columns().join("\t"))?;
            for row in &table.rows {
                let cells = row.row.cells();
                write_cells(
                    out,
                    cells
                        .iter()
                        .map(|c| c.as_deref())
                        .chain(row.info.iter().map(|v| v.as_deref())),
                )?;
            }
        }
        OutputFormat::Json => {
            let records: Vec<serde_json::Value> = table
                .rows
                .iter()
                .map(|row| {
                    let mut record = serde_json::Map::new();
                    for (column, cell) in COLUMNS.iter().zip(row.row.cells()) {
                        record.insert(column.to_string(), cell.into());
                    }
                    for (column, value) in table.info_columns.iter().zip(&row.info) {
                        record.insert(column.clone(), value.clone().into());
                    }
                    serde_json::Value::Object(record)
                })
                .collect();
            serde_json::to_writer_pretty(&mut *out, &records)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn write_cells<'a>(out: &mut dyn Write, cells: impl Iterator<Item = Option<&'a str>>) -> Result<()> {
    let line: Vec<String> = cells
        .map(|c| c.unwrap_or_default().replace(['\t', '\n'], " "))
        .collect();
    writeln!(out, "{}", line.join("\t"))?;
    Ok(())
}

/// Print a session's metadata and occurrence counts
pub fn print_session_summary(session: &Session) {
    println!("File:        {}", session.file_name);
    println!("Experiment:  {}", session.experiment_name);
    println!("Task:        {}", session.task_name);
    println!("Subject:     {}", session.subject_id);
    println!("Started:     {}", session.datetime_string);
    if let Some(number) = session.number() {
        println!("Session #:   {}", number);
    }
    println!("Duration:    {:.1} s", session.duration_ms() as f64 / 1000.0);
    println!("Prints:      {}", session.print_lines.len());
    println!("\nOccurrences ({} total):", session.occurrences.len());
    for (name, times) in &session.times_by_name {
        println!("  {:<30} {:>6}", name, times.len());
    }
}

/// Print per-subject counts and a line per selected session
pub fn print_experiment_summary(experiment: &Experiment, selected: &[&Session]) {
    println!("Experiment:  {}", experiment.folder_name());
    println!("Subjects:    {}", experiment.n_subjects());
    println!("Sessions:    {}", experiment.sessions().len());
    for (subject, count) in experiment.sessions_per_subject() {
        println!("  subject {:<10} {:>4} sessions", subject.to_string(), count);
    }

    if !experiment.import_failures().is_empty() {
        println!("\nSkipped files:");
        for failure in experiment.import_failures() {
            println!("  {}: {}", failure.file_name, failure.reason);
        }
    }

    println!("\nSelected sessions ({}):", selected.len());
    for session in selected {
        println!(
            "  {:<10} #{:<4} {}  {}",
            session.subject_id.to_string(),
            session.number().map(|n| n.to_string()).unwrap_or_default(),
            session.datetime_string,
            session.file_name
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use session_log_decoder::PairingConfig;

    const LOG: &str = "\
I Experiment name : exp
I Task name : task
I Subject ID : m1
I Start date : 2020/01/01 10:00:00
S {'wait': 1}
E {'go': 2}
D 0 1
P 5 hello\tthere
";

    #[test]
    fn test_txt_session_table() {
        let table = SessionTable::parse("s.txt", LOG, &PairingConfig::new()).unwrap();
        let mut out = Vec::new();
        write_session_table(&table, OutputFormat::Txt, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "type\tname\ttime\tduration\tvalue");
        assert_eq!(lines[1], "info\tExperiment name\t\t\texp");
        assert_eq!(lines[5], "state\twait\t0\t\t");
        assert_eq!(lines[6], "print\t\t5\t\thello there");
    }

    #[test]
    fn test_json_experiment_table() {
        let table = SessionTable::parse("s.txt", LOG, &PairingConfig::new()).unwrap();
        let experiment = ExperimentTable::from_session_tables(vec![table]);
        let mut out = Vec::new();
        write_experiment_table(&experiment, OutputFormat::Json, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["type"], "state");
        assert_eq!(rows[0]["Subject ID"], "m1");
        assert!(rows[0]["duration"].is_null());
    }
}
