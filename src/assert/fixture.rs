use std::{fs, path::Path};

use crate::{
    assert::equal_bytes,
    common::util::{parse_bool, read_env, write_file},
    report::{Error, Reporter},
};

/// Setting this environment variable to a true value (`1`, `t`, `true`, ...) makes
/// [equal_fixture] rewrite the fixture with the actual value before comparing.
pub const OVERWRITE_ENV: &str = "OVERWRITE";

/// Compares `got` to the contents of the fixture file at `path`.
///
/// A mismatch is reported as `"{name}/{path}"`. Failing to read or rewrite the fixture is a
/// fatal error.
///
/// **Example**:
/// ```no_run
/// use gubbins::{assert::equal_fixture, TestReporter};
///
/// let reporter = TestReporter::new();
/// let rendered = b"{\"id\":1}";
///
/// equal_fixture(&reporter, "widget", "tests/fixtures/widget.json", rendered);
/// ```
pub fn equal_fixture<P: AsRef<Path>>(
    reporter: &dyn Reporter,
    name: &str,
    path: P,
    got: &[u8],
) -> bool {
    let overwrite = parse_bool(&read_env(OVERWRITE_ENV, "")).unwrap_or(false);
    compare_fixture(reporter, name, path.as_ref(), got, overwrite)
}

fn compare_fixture(
    reporter: &dyn Reporter,
    name: &str,
    path: &Path,
    got: &[u8],
    overwrite: bool,
) -> bool {
    if overwrite {
        tracing::info!("overwriting {}", path.display());

        if let Err(err) = write_file(path, got) {
            reporter.fail(Error::Fixture(path.to_path_buf(), err));
            return false;
        }
    }

    let want = match fs::read(path) {
        Ok(want) => want,
        Err(err) => {
            reporter.fail(Error::Fixture(path.to_path_buf(), err));
            return false;
        }
    };

    equal_bytes(
        reporter,
        &format!("{}/{}", name, path.display()),
        &want,
        got,
    )
}
