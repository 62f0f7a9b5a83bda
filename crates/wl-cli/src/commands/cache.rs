//! `clear-cache` command.

use std::io::Write;

use anyhow::Result;

use super::Workspace;
use crate::summaries;

pub fn clear<W: Write>(writer: &mut W, workspace: &Workspace) -> Result<()> {
    if summaries::clear(&workspace.config.cache_path)? {
        writeln!(writer, "Cache cleared")?;
    } else {
        writeln!(writer, "Cache is clean")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::commands::testing::workspace;

    #[test]
    fn clears_once() {
        let temp = tempfile::tempdir().unwrap();
        let ws = workspace(&temp.path().join("worklog.txt"), 9, 0);
        fs::write(&ws.config.cache_path, "{}").unwrap();

        let mut out = Vec::new();
        clear(&mut out, &ws).unwrap();
        clear(&mut out, &ws).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Cache cleared\nCache is clean\n"
        );
    }
}
