//! File-backed document store for free-text annotations on geographies.
//!
//! All annotations live in a single `annotations.json` array under the
//! configured directory. The directory is created on first write.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};

use crate::error::Result;
use crate::models::Annotation;

const FILE_NAME: &str = "annotations.json";
const DEFAULT_AUTHOR: &str = "anonymous";

pub struct AnnotationStore {
    dir: PathBuf,
}

impl AnnotationStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing document file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(FILE_NAME)
    }

    /// Append an annotation and return it as stored.
    ///
    /// A missing or blank author is recorded as `anonymous`.
    pub fn add(&self, geo: &str, text: &str, author: Option<&str>) -> Result<Annotation> {
        let author = author
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_AUTHOR);
        let annotation = Annotation {
            geo: geo.to_string(),
            text: text.to_string(),
            author: author.to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        };

        let mut all = self.load()?;
        all.push(annotation.clone());
        self.save(&all)?;
        Ok(annotation)
    }

    /// All annotations, or only those whose geo matches exactly.
    pub fn list(&self, geo: Option<&str>) -> Result<Vec<Annotation>> {
        let all = self.load()?;
        Ok(match geo.filter(|g| !g.is_empty()) {
            Some(g) => all.into_iter().filter(|a| a.geo == g).collect(),
            None => all,
        })
    }

    fn load(&self) -> Result<Vec<Annotation>> {
        let path = self.path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, all: &[Annotation]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(&mut tmp, all)?;
        tmp.flush()?;
        tmp.persist(self.path()).map_err(|e| e.error)?;
        Ok(())
    }
}
