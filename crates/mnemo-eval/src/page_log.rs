//! Page-structured evaluation log.
//!
//! Scenario output is grouped into numbered pages, one file per page, plus
//! an index listing every page begun. The log has an explicit lifecycle:
//! it is opened once per run, threaded through the calls that write to it,
//! and flushed/closed by the driver when the run ends.

use crate::config::PageLogSettings;
use crate::error::Result;
use chrono::Utc;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// Handle to a page begun in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageId(usize);

struct Page {
    summary: String,
    file: File,
    finished: bool,
}

/// Page-structured log sink writing to a directory.
pub struct PageLog {
    dir: PathBuf,
    pages: Vec<Page>,
    index: File,
}

impl PageLog {
    /// Opens the log, creating the directory if needed.
    ///
    /// # Errors
    /// Returns error if the directory or index file cannot be created.
    pub fn open(settings: &PageLogSettings) -> Result<Self> {
        fs::create_dir_all(&settings.path)?;
        let index = OpenOptions::new()
            .create(true)
            .append(true)
            .open(settings.path.join("index.txt"))?;
        debug!(path = %settings.path.display(), "Opened page log");
        Ok(Self { dir: settings.path.clone(), pages: Vec::new(), index })
    }

    /// Begins a new page with the given summary and returns its handle.
    pub fn begin_page(&mut self, summary: &str) -> Result<PageId> {
        let id = PageId(self.pages.len());
        let file_name = format!("page-{:03}.txt", id.0);
        let mut file = File::create(self.dir.join(&file_name))?;
        writeln!(file, "=====  {}  =====", summary)?;
        writeln!(file, "begun: {}", Utc::now().to_rfc3339())?;
        writeln!(file)?;
        writeln!(self.index, "{}  {}", file_name, summary)?;
        self.pages.push(Page { summary: summary.to_string(), file, finished: false });
        Ok(id)
    }

    /// Appends lines of text to a page, optionally flushing immediately.
    pub fn add_lines(&mut self, page: PageId, text: &str, flush: bool) -> Result<()> {
        let page = &mut self.pages[page.0];
        writeln!(page.file, "{}", text)?;
        if flush {
            page.file.flush()?;
        }
        Ok(())
    }

    /// Marks a page finished and flushes it.
    pub fn finish_page(&mut self, page: PageId) -> Result<()> {
        let page = &mut self.pages[page.0];
        if !page.finished {
            writeln!(page.file)?;
            writeln!(page.file, "=====  end of {}  =====", page.summary)?;
            page.file.flush()?;
            page.finished = true;
        }
        Ok(())
    }

    /// Flushes every page and the index to disk.
    pub fn flush(&mut self) -> Result<()> {
        for page in &mut self.pages {
            page.file.flush()?;
        }
        self.index.flush()?;
        Ok(())
    }

    /// Flushes and consumes the log, finishing any unfinished pages.
    pub fn close(mut self) -> Result<()> {
        let unfinished: Vec<PageId> = self
            .pages
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.finished)
            .map(|(i, _)| PageId(i))
            .collect();
        for id in unfinished {
            self.finish_page(id)?;
        }
        self.flush()
    }

    /// Number of pages begun so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}
