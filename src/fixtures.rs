//! Sample directories for trying the cleaner out.
//!
//! `--init-test` creates `huge`, `medium` and `small` candidates under
//! `<data_dir>/test`, each holding one file of a known size inside its
//! target directory.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::cache::CacheOptions;

/// Name of the fixture root inside the data directory.
pub const TEST_DIR: &str = "test";

/// Fixture candidates and the size of their payload in mebibytes.
pub const FIXTURE_DIRS: [(&str, u64); 3] = [("huge", 100), ("medium", 10), ("small", 1)];

/// Name of the payload file inside each target directory.
pub const FIXTURE_FILE: &str = "test.txt";

const CHUNK_SIZE: usize = 1024 * 1024;

/// Write a file of `size_in_mib` mebibytes of `'0'` bytes, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns any I/O error from creating or writing the file.
pub fn write_file_of_size(path: &Path, size_in_mib: u64) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let chunk = vec![b'0'; CHUNK_SIZE];
    let mut writer = BufWriter::new(File::create(path)?);
    for _ in 0..size_in_mib {
        writer.write_all(&chunk)?;
    }
    writer.flush()
}

/// Create `<root>/<name>/<target>/test.txt` for each entry of `dirs`.
///
/// Returns the candidate directories in the order given.
///
/// # Errors
///
/// Returns the first I/O error encountered.
pub fn create_fixtures(
    root: &Path,
    target: &str,
    dirs: &[(&str, u64)],
) -> io::Result<Vec<PathBuf>> {
    dirs.iter()
        .map(|&(name, size)| {
            let dir = root.join(name);
            write_file_of_size(&dir.join(target).join(FIXTURE_FILE), size)?;
            log::debug!("Created fixture {} ({} MiB)", dir.display(), size);
            Ok(dir)
        })
        .collect()
}

/// Create the standard fixtures under the data directory of `options`.
///
/// Returns the fixture root.
///
/// # Errors
///
/// Returns the first I/O error encountered.
pub fn init_test_dirs(options: &CacheOptions) -> io::Result<PathBuf> {
    let root = options.working_dir.join(&options.data_dir).join(TEST_DIR);
    create_fixtures(&root, &options.target_dir, &FIXTURE_DIRS)?;
    log::info!("Test directories created in {}", root.display());
    Ok(root)
}
