//! Comparisons that report a readable diff instead of panicking.
//!
//! Every helper takes the [Reporter] of the running test and returns whether the compared
//! values were equal, so callers can keep going after a mismatch.
use similar::{ChangeTag, TextDiff};

use crate::report::{Failure, Reporter};

mod fixture;

pub use fixture::{equal_fixture, OVERWRITE_ENV};

/// Compares two strings and reports a [Failure::Mismatch] named `name` if they differ.
pub fn equal(reporter: &dyn Reporter, name: &str, want: &str, got: &str) -> bool {
    if want == got {
        return true;
    }

    reporter.report(Failure::Mismatch {
        name: name.to_string(),
        want: want.to_string(),
        got: got.to_string(),
    });

    false
}

/// Like [equal] but for byte buffers. The reported values are decoded lossily as UTF-8.
pub fn equal_bytes(reporter: &dyn Reporter, name: &str, want: &[u8], got: &[u8]) -> bool {
    if want == got {
        return true;
    }

    reporter.report(Failure::Mismatch {
        name: name.to_string(),
        want: String::from_utf8_lossy(want).to_string(),
        got: String::from_utf8_lossy(got).to_string(),
    });

    false
}

/// Renders a line diff of `want` against `got`. Removed lines start with `-`, added lines
/// with `+` and unchanged lines with a space.
pub fn diff(want: &str, got: &str) -> String {
    let changes = TextDiff::from_lines(want, got);
    let mut output = String::new();

    for change in changes.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Equal => ' ',
            ChangeTag::Delete => '-',
            ChangeTag::Insert => '+',
        };

        output.push(sign);
        output.push_str(&change.to_string_lossy());
        if change.missing_newline() {
            output.push('\n');
        }
    }

    output
}
