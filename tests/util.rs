//! Shared test utilities for integration tests
//!
//! Provides fake formatter scripts and helpers used across multiple
//! test files. The scripts rewrite their single file argument in place,
//! exactly like the real tools the subprocess backend drives.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// In-place formatter that uppercases the whole file.
pub const UPPERCASE_FORMATTER: &str = "#!/bin/sh\n\
tr '[:lower:]' '[:upper:]' < \"$1\" > \"$1.tmp\"\n\
mv \"$1.tmp\" \"$1\"\n";

/// Formatter that always fails with a diagnostic on stderr.
pub const FAILING_FORMATTER: &str = "#!/bin/sh\n\
echo \"boom: cannot parse $1\" >&2\n\
exit 1\n";

/// Formatter that records the path it was handed, then succeeds without
/// changing the file. Lets tests observe the temp file's fate.
pub fn recording_formatter(record: &Path, exit_code: i32) -> String {
    format!(
        "#!/bin/sh\nprintf '%s' \"$1\" > \"{}\"\nexit {}\n",
        record.display(),
        exit_code
    )
}

/// Write an executable shell script into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, body).expect("write script");

    let mut perms = std::fs::metadata(&path).expect("script metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("make script executable");

    path
}
