//! Error excerpt extraction from TeX engine logs.
//!
//! TeX engines report fatal errors as a line starting with `!`, followed by
//! context lines and eventually an `l.<n>` line naming the offending input
//! line. [`extract`] cuts that window out of the combined log. The format is
//! unstructured, so extraction is best-effort and never fails: a log without
//! an error marker comes back unchanged.

/// Prefix of a fatal error line.
pub const ERROR_MARKER: u8 = b'!';

/// Prefix of the line-number line that closes an error report.
pub const LINE_MARKER: &[u8] = b"l.";

/// Extracts the error excerpt from a combined engine log.
///
/// Returns the lines from the first `!` line up to and including the first
/// following `l.` line, each terminated by `\n`. If the log has no `!` line,
/// the input is returned unchanged.
pub fn extract(log: &[u8]) -> Vec<u8> {
    let lines: Vec<&[u8]> = split_lines(log);

    let Some(start) = lines
        .iter()
        .position(|line| line.first() == Some(&ERROR_MARKER))
    else {
        return log.to_vec();
    };

    let window = &lines[start..];
    let end = window
        .iter()
        .position(|line| line.starts_with(LINE_MARKER))
        .map(|i| i + 1)
        .unwrap_or(window.len());

    let mut out = Vec::new();
    for line in &window[..end] {
        out.extend_from_slice(line);
        out.push(b'\n');
    }
    out
}

/// Lossy UTF-8 view of an excerpt, for display.
pub fn summarize(excerpt: &[u8]) -> String {
    String::from_utf8_lossy(excerpt).into_owned()
}

fn split_lines(log: &[u8]) -> Vec<&[u8]> {
    let mut lines: Vec<&[u8]> = log.split(|b| *b == b'\n').collect();
    // A trailing newline terminates the last line rather than starting a new one.
    if log.ends_with(b"\n") {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_marker_returns_input_unchanged() {
        let log = b"This is pdfTeX, Version 3.14\nOutput written on input.pdf\n";
        assert_eq!(extract(log), log.to_vec());
        assert_eq!(extract(b""), Vec::<u8>::new());
        assert_eq!(extract(b"no newline at end"), b"no newline at end".to_vec());
    }

    #[test]
    fn test_undefined_control_sequence() {
        let log = b"(./input.tex\n! Undefined control sequence.\nl.5 \\foo\n         \n? \nNo pages of output.\n";
        assert_eq!(
            extract(log),
            b"! Undefined control sequence.\nl.5 \\foo\n".to_vec()
        );
    }

    #[test]
    fn test_context_lines_between_markers_are_kept() {
        let log = b"noise\n! LaTeX Error: File `missing.sty' not found.\n\nType X to quit or <RETURN> to proceed,\nl.3 \\usepackage\n{missing}\ntrailing\n";
        assert_eq!(
            extract(log),
            b"! LaTeX Error: File `missing.sty' not found.\n\nType X to quit or <RETURN> to proceed,\nl.3 \\usepackage\n"
                .to_vec()
        );
    }

    #[test]
    fn test_marker_without_line_number_takes_rest() {
        let log = b"start\n! Emergency stop.\n<*> input.tex\n";
        assert_eq!(extract(log), b"! Emergency stop.\n<*> input.tex\n".to_vec());
    }

    #[test]
    fn test_only_first_error_is_used() {
        let log = b"! First.\nl.1 a\n! Second.\nl.2 b\n";
        assert_eq!(extract(log), b"! First.\nl.1 a\n".to_vec());
    }

    #[test]
    fn test_line_marker_before_error_is_ignored() {
        let log = b"l.0 early\n! Bad.\nl.1 x\n";
        assert_eq!(extract(log), b"! Bad.\nl.1 x\n".to_vec());
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let log = b"\xff\xfe\n! Bad \xff.\nl.9 \xc3\n";
        let excerpt = extract(log);
        assert_eq!(excerpt, b"! Bad \xff.\nl.9 \xc3\n".to_vec());
        assert!(summarize(&excerpt).starts_with("! Bad "));
    }

    #[test]
    fn test_extract_is_idempotent() {
        let log = b"x\n! Bad.\ny\nl.1 x\nz\n";
        let once = extract(log);
        assert_eq!(extract(&once), once);
    }
}
