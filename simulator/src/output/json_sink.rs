use anyhow::Context;
use log::debug;
use pulsecore::interface::{Trace, TraceSink};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes each trace as pretty JSON to `<dir>/<name>.json`.
pub struct JsonTraceSink {
    dir: PathBuf,
    max_points: usize,
    written: Vec<PathBuf>,
}

impl JsonTraceSink {
    pub fn new<P: AsRef<Path>>(dir: P, max_points: usize) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating trace directory {}", dir.display()))?;
        Ok(Self {
            dir,
            max_points,
            written: Vec::new(),
        })
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl TraceSink for JsonTraceSink {
    type Error = anyhow::Error;

    fn render(&mut self, trace: &Trace, name: &str) -> anyhow::Result<()> {
        let path = self.dir.join(format!("{}.json", name));
        let body = trace
            .reduced(self.max_points)
            .to_json_pretty()
            .with_context(|| format!("serializing trace {}", name))?;
        fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        debug!("wrote {} ({} points)", path.display(), trace.point_count());
        self.written.push(path);
        Ok(())
    }
}
