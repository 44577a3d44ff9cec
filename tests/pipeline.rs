use anyhow::Result;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::{tempdir, TempDir};
use tsmerge::{process::run, MergeError, Settings};

const CONFIG: &str = r#"
input_folder: input
output_file: output/merged.csv
lines_to_skip: 0
timestamp_column: timestamp
timestamp_format: "%Y-%m-%d %H:%M:%S"
date_column: date
date_format: "%Y-%m-%d"
time_column: time
time_format: "%H:%M:%S"
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(config: &str) -> Result<Self> {
        let dir = tempdir()?;
        fs::create_dir(dir.path().join("input"))?;
        fs::write(dir.path().join("merge.yaml"), config)?;
        Ok(Self { dir })
    }

    fn add(&self, name: &str, content: &str) -> Result<()> {
        fs::write(self.dir.path().join("input").join(name), content)?;
        Ok(())
    }

    fn settings(&self) -> Result<Settings> {
        Ok(Settings::from_yaml_file(self.dir.path().join("merge.yaml"))?)
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("output/merged.csv")
    }

    fn read_output(&self) -> Result<String> {
        Ok(fs::read_to_string(self.output())?)
    }
}

fn data_lines(text: &str) -> Vec<&str> {
    text.lines().skip(1).collect()
}

fn timestamps(text: &str) -> Vec<String> {
    data_lines(text)
        .iter()
        .map(|l| l.split(',').next().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn mixed_schemes_merge_in_timestamp_order() -> Result<()> {
    let ws = Workspace::new(CONFIG)?;
    ws.add("a.csv", "date,time,value\n2024-01-01,10:00:00,5\n")?;
    ws.add("b.csv", "timestamp,value\n2024-01-01 09:00:00,9\n")?;

    let summary = run(&ws.settings()?)?;
    assert_eq!(summary.total_rows, 2);
    assert!(summary.duplicates.is_empty());

    assert_eq!(
        ws.read_output()?,
        "timestamp,value\n2024-01-01 09:00:00,9\n2024-01-01 10:00:00,5\n"
    );
    Ok(())
}

#[test]
fn duplicates_are_reported_and_kept_in_file_order() -> Result<()> {
    let ws = Workspace::new(CONFIG)?;
    ws.add("a.csv", "timestamp,value\n2024-01-01 10:00:00,first\n2024-01-01 08:00:00,early\n")?;
    ws.add("b.csv", "date,time,value\n2024-01-01,10:00:00,second\n")?;

    let summary = run(&ws.settings()?)?;
    assert_eq!(summary.duplicates.groups.len(), 1);
    let group = &summary.duplicates.groups[0];
    assert_eq!(group.timestamp, "2024-01-01 10:00:00");
    assert_eq!(group.rows.len(), 2);
    assert!(group.rows[0].file.ends_with("a.csv"));
    assert!(group.rows[1].file.ends_with("b.csv"));

    let out = ws.read_output()?;
    assert_eq!(
        data_lines(&out),
        vec![
            "2024-01-01 08:00:00,early",
            "2024-01-01 10:00:00,first",
            "2024-01-01 10:00:00,second",
        ]
    );
    Ok(())
}

#[test]
fn row_count_is_preserved_and_order_is_non_decreasing() -> Result<()> {
    let ws = Workspace::new(CONFIG)?;
    let mut expected = 0;
    for f in 0..4 {
        let mut body = String::from("timestamp,sensor,reading\n");
        for i in 0..25 {
            // interleave files so the sort has work to do
            let minute = (i * 4 + f) % 60;
            let hour = (i * 4 + f) / 60;
            body.push_str(&format!("2024-05-01 {:02}:{:02}:00,s{},{}\n", hour, minute, f, i));
            expected += 1;
        }
        ws.add(&format!("session_{}.csv", f), &body)?;
    }

    let summary = run(&ws.settings()?)?;
    assert_eq!(summary.total_rows, expected);

    let out = ws.read_output()?;
    assert!(out.starts_with("timestamp,"));
    let ts = timestamps(&out);
    assert_eq!(ts.len(), expected);
    assert!(ts.windows(2).all(|w| w[0] <= w[1]));
    Ok(())
}

#[test]
fn rerun_is_byte_identical() -> Result<()> {
    let ws = Workspace::new(CONFIG)?;
    ws.add("x.csv", "date,time,v\n2024-01-02,00:00:00,1\n2024-01-01,00:00:00,2\n")?;
    ws.add("y.csv", "timestamp,v\n2024-01-01 00:00:00,3\n")?;

    run(&ws.settings()?)?;
    let first = fs::read(ws.output())?;
    run(&ws.settings()?)?;
    let second = fs::read(ws.output())?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn output_inside_input_folder_is_not_reingested() -> Result<()> {
    let ws = Workspace::new(&CONFIG.replace("output/merged.csv", "input/merged.csv"))?;
    ws.add("a.csv", "timestamp,v\n2024-01-01 00:00:00,1\n")?;

    let s = ws.settings()?;
    run(&s)?;
    let first = fs::read(&s.output_file)?;
    let summary = run(&s)?;
    assert_eq!(summary.files.len(), 1);
    assert_eq!(fs::read(&s.output_file)?, first);
    Ok(())
}

#[test]
fn table_without_timestamp_fails_whole_run() -> Result<()> {
    let ws = Workspace::new(CONFIG)?;
    ws.add("good.csv", "timestamp,value\n2024-01-01 09:00:00,9\n")?;
    ws.add("odd.csv", "when,value\n2024-01-01,1\n")?;

    let err = run(&ws.settings()?).unwrap_err();
    match err {
        MergeError::MissingTimestampFields { path, .. } => assert!(path.ends_with("odd.csv")),
        other => panic!("expected MissingTimestampFields, got {:?}", other),
    }
    assert!(!ws.output().exists());
    Ok(())
}

#[test]
fn bad_timestamp_value_fails_whole_run() -> Result<()> {
    let ws = Workspace::new(CONFIG)?;
    ws.add("a.csv", "timestamp,value\n2024-01-01 09:00:00,9\nnot a time,1\n")?;

    let err = run(&ws.settings()?).unwrap_err();
    assert!(matches!(err, MergeError::TimestampParse { line: 3, .. }));
    assert!(!ws.output().exists());
    Ok(())
}

#[test]
fn ragged_file_fails_whole_run() -> Result<()> {
    let ws = Workspace::new(CONFIG)?;
    ws.add("a_good.csv", "timestamp,value\n2024-01-01 09:00:00,9\n")?;
    ws.add("b_bad.csv", "timestamp,value\n2024-01-01 10:00:00,1,extra\n")?;

    let err = run(&ws.settings()?).unwrap_err();
    match err {
        MergeError::MalformedInput { path, line, .. } => {
            assert!(path.ends_with("b_bad.csv"));
            assert_eq!(line, 2);
        }
        other => panic!("expected MalformedInput, got {:?}", other),
    }
    assert!(!ws.output().exists());
    Ok(())
}

#[test]
fn empty_input_folder_is_a_successful_no_op() -> Result<()> {
    let ws = Workspace::new(CONFIG)?;
    let summary = run(&ws.settings()?)?;
    assert!(summary.output.is_none());
    assert!(!ws.output().exists());
    assert!(!ws.output().parent().map(Path::exists).unwrap_or(false));
    Ok(())
}

#[test]
fn skips_preamble_lines() -> Result<()> {
    let ws = Workspace::new(&CONFIG.replace("lines_to_skip: 0", "lines_to_skip: 2"))?;
    ws.add(
        "logger.csv",
        "Logger 42\nExported by station\ndate,time,temp\n2024-03-01,12:00:00,20.5\n",
    )?;
    ws.add(
        "other.csv",
        "Logger 43\nExported by station\ntimestamp,temp\n2024-03-01 11:59:59,19.0\n",
    )?;

    run(&ws.settings()?)?;
    assert_eq!(
        ws.read_output()?,
        "timestamp,temp\n2024-03-01 11:59:59,19.0\n2024-03-01 12:00:00,20.5\n"
    );
    Ok(())
}

#[test]
fn differing_columns_are_unioned() -> Result<()> {
    let ws = Workspace::new(CONFIG)?;
    ws.add("a.csv", "timestamp,temp\n2024-01-01 00:00:01,1\n")?;
    ws.add("b.csv", "timestamp,humidity,temp\n2024-01-01 00:00:00,50,2\n")?;

    run(&ws.settings()?)?;
    assert_eq!(
        ws.read_output()?,
        "timestamp,temp,humidity\n2024-01-01 00:00:00,2,50\n2024-01-01 00:00:01,1,\n"
    );
    Ok(())
}
