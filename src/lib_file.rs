#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use anyhow::{bail, Context, Result as AnyResult};
use rand::Rng;
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::domain::ScratchRecord;

#[derive(Debug)]
pub enum Removal {
    Removed(PathBuf),
    AlreadyGone(PathBuf),
    Failed(PathBuf, std::io::Error),
}

/// Tracks the scratch files this process created, oldest first.
#[derive(Debug)]
pub struct ScratchFiles {
    dir: PathBuf,
    prefix: String,
    pid: u32,
    tracked: VecDeque<PathBuf>,
    max_tracked: usize,
}

impl ScratchFiles {
    pub fn new(dir: impl Into<PathBuf>, prefix: &str, pid: u32, max_tracked: usize) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.to_string(),
            pid,
            tracked: VecDeque::new(),
            max_tracked,
        }
    }

    pub fn file_stem_prefix(&self) -> String {
        format!("temp-{}-{}-", self.prefix, self.pid)
    }

    pub fn path_for(&self, iteration: u64) -> PathBuf {
        self.dir
            .join(format!("{}{iteration}.json", self.file_stem_prefix()))
    }

    // Tracked before writing so a half-written file is still swept.
    pub fn write_and_verify(&mut self, iteration: u64, payload_len: usize) -> AnyResult<ScratchRecord> {
        let path = self.path_for(iteration);
        self.tracked.push_back(path.clone());
        let mut rng = rand::rng();
        let record = ScratchRecord {
            iteration,
            timestamp: chrono::Utc::now().to_rfc3339(),
            pid: self.pid,
            random_data: (0..payload_len).map(|_| rng.random::<f64>()).collect(),
        };
        write_record(&path, &record)?;
        let back = read_record(&path)?;
        if back.iteration != record.iteration || back.pid != record.pid {
            bail!(
                "scratch file {} read back iteration={} pid={}, wrote iteration={} pid={}",
                path.display(),
                back.iteration,
                back.pid,
                record.iteration,
                record.pid
            );
        }
        Ok(back)
    }

    pub fn prune_oldest(&mut self, retain: usize) -> Option<Removal> {
        if self.tracked.len() <= retain {
            return None;
        }
        self.tracked.pop_front().map(remove_file)
    }

    pub fn enforce_cap(&mut self) -> Vec<Removal> {
        let mut out = Vec::new();
        while self.tracked.len() > self.max_tracked {
            if let Some(path) = self.tracked.pop_front() {
                out.push(remove_file(path));
            }
        }
        out
    }

    pub fn remove_all(&mut self) -> Vec<Removal> {
        self.tracked.drain(..).map(remove_file).collect()
    }

    pub fn sweep_dir(&self) -> AnyResult<Vec<Removal>> {
        let stem = self.file_stem_prefix();
        let mut out = Vec::new();
        let entries =
            fs::read_dir(&self.dir).with_context(|| format!("list {}", self.dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("list {}", self.dir.display()))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(stem.as_str()) && name.ends_with(".json") {
                out.push(remove_file(entry.path()));
            }
        }
        Ok(out)
    }

    pub fn tracked(&self) -> impl Iterator<Item = &Path> {
        self.tracked.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    pub fn max_tracked(&self) -> usize {
        self.max_tracked
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

pub fn write_record(path: &Path, record: &ScratchRecord) -> AnyResult<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, record)
        .with_context(|| format!("serialize {}", path.display()))?;
    w.flush().with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

pub fn read_record(path: &Path) -> AnyResult<ScratchRecord> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse {}", path.display()))
}

fn remove_file(path: PathBuf) -> Removal {
    match fs::remove_file(&path) {
        Ok(()) => Removal::Removed(path),
        Err(e) if e.kind() == ErrorKind::NotFound => Removal::AlreadyGone(path),
        Err(e) => Removal::Failed(path, e),
    }
}
