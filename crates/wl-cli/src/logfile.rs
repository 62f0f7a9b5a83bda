//! Reading and writing the work log file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use wl_core::{Document, DocumentConfig};

/// Parses the log file, creating it empty when missing.
pub fn load(path: &Path, config: &DocumentConfig) -> Result<Document> {
    if !path.exists() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, "").with_context(|| format!("failed to create {}", path.display()))?;
        tracing::debug!(path = %path.display(), "created empty work log");
    }

    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    wl_core::parse(&text, config).with_context(|| format!("failed to parse {}", path.display()))
}

/// Writes the document back.
pub fn save(path: &Path, document: &Document) -> Result<()> {
    fs::write(path, wl_core::render(document))
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), "saved work log");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested/worklog.txt");
        let document = load(&path, &DocumentConfig::default()).unwrap();
        assert!(path.exists());
        assert_eq!(wl_core::render(&document), "");
    }

    #[test]
    fn save_preserves_text() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("worklog.txt");
        let text = "TEST-1 as One\n25.11.2022\n\n09:00\nOne review\n09:30\n";
        fs::write(&path, text).unwrap();

        let document = load(&path, &DocumentConfig::default()).unwrap();
        save(&path, &document).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }

    #[test]
    fn syntax_errors_name_the_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("worklog.txt");
        fs::write(&path, "09:00\nTEST-1").unwrap();

        let err = load(&path, &DocumentConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("worklog.txt"));
        assert!(format!("{err:#}").contains("line 1"));
    }
}
