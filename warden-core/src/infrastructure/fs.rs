use crate::infrastructure::error::InfrastructureError;
use std::io::Write;
use std::path::Path;

/// Replaces `path` with `content` through a temporary sibling file and a rename.
///
/// Readers see either the previous file or the complete new one, never a
/// truncated report or a half-rewritten source file.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    // Same directory as the target so the rename never crosses filesystems
    let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(InfrastructureError::Io)?;

    temp_file
        .write_all(content.as_ref())
        .map_err(InfrastructureError::Io)?;

    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_report() -> Result<()> {
        let dir = tempdir()?;
        let report = dir.path().join("VALIDATION_REPORT.md");

        atomic_write(&report, "# Validation Report\n")?;

        assert_eq!(fs::read_to_string(report)?, "# Validation Report\n");
        Ok(())
    }

    #[test]
    fn test_atomic_write_overwrites_instead_of_appending() -> Result<()> {
        let dir = tempdir()?;
        let source = dir.path().join("order.service.ts");

        atomic_write(&source, "const a = 1;\nconst b = 2;\n")?;
        atomic_write(&source, "const A = 1;\n")?;

        assert_eq!(fs::read_to_string(&source)?, "const A = 1;\n");
        // No temp files left next to the target
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }
}
