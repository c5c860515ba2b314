use std::io::BufRead;

/// Extracts the target name declared on a single line, if any.
///
/// This is a line-prefix heuristic, not a Makefile parser: the line is split
/// at its first `:` and everything after it is discarded.
pub fn target_from_line(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(".PHONY") {
        return None;
    }

    // recipe lines start with a tab, check the raw line
    if line.starts_with('\t') {
        return None;
    }

    let (name, _rest) = line.split_once(':')?;
    let name = name.trim();
    (!name.is_empty()).then_some(name)
}

/// Reads all target names from a Makefile, in line order.
pub fn parse_targets(mut reader: impl BufRead) -> std::io::Result<Vec<String>> {
    let mut targets = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches('\n').trim_end_matches('\r');
        if let Some(name) = target_from_line(line) {
            targets.push(name.to_string());
        }
    }

    Ok(targets)
}
