//! Artifact destinations.

use std::fs;
use std::io;
use std::path::PathBuf;

use knit_emit::Artifact;

/// Where generated sources go.
pub trait ArtifactSink {
    fn write(&mut self, artifact: &Artifact) -> io::Result<()>;
}

/// Collects artifacts in memory. The test sink.
#[derive(Default)]
pub struct MemorySink {
    artifacts: Vec<Artifact>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.artifacts
            .iter()
            .find(|a| a.file_name == file_name)
            .map(|a| a.source.as_str())
    }
}

impl ArtifactSink for MemorySink {
    fn write(&mut self, artifact: &Artifact) -> io::Result<()> {
        // Re-generation replaces the previous artifact.
        self.artifacts.retain(|a| a.file_name != artifact.file_name);
        self.artifacts.push(artifact.clone());
        Ok(())
    }
}

/// Writes artifacts into a directory, one file per artifact.
pub struct DirSink {
    root: PathBuf,
}

impl DirSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirSink { root: root.into() }
    }
}

impl ArtifactSink for DirSink {
    fn write(&mut self, artifact: &Artifact) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(&artifact.file_name);
        fs::write(&path, &artifact.source)?;
        tracing::info!(path = %path.display(), "wrote artifact");
        Ok(())
    }
}
