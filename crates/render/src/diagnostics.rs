use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// A compiler failure with the source line it points at, when the log
/// names one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDiagnostic {
    pub stage: ShaderStage,
    pub log: String,
    /// 1-based line number and its text.
    pub line: Option<(usize, String)>,
}

impl ShaderDiagnostic {
    pub fn new(stage: ShaderStage, source: &str, log: &str) -> Self {
        let line = error_line(log).and_then(|n| {
            source
                .lines()
                .nth(n.checked_sub(1)?)
                .map(|text| (n, text.trim().to_string()))
        });
        Self {
            stage,
            log: log.trim().to_string(),
            line,
        }
    }
}

impl fmt::Display for ShaderDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} shader failed to compile: {}", self.stage, self.log)?;
        if let Some((n, text)) = &self.line {
            write!(f, " (line {n}: `{text}`)")?;
        }
        Ok(())
    }
}

/// Source line of the first error in a GLSL compiler log.
///
/// Understands `ERROR: 0:12: ...` (ANGLE, Mesa) and `0(12) : error ...`
/// (NVIDIA). Lines marked as errors win over warnings; without any marker
/// the first numbered line is used.
pub fn error_line(log: &str) -> Option<usize> {
    let numbered = || log.lines().filter_map(|line| numbered_line(line.trim()));
    numbered()
        .find(|(_, error)| *error)
        .or_else(|| numbered().next())
        .map(|(n, _)| n)
}

/// Line number of a log line and whether it is marked as an error.
fn numbered_line(line: &str) -> Option<(usize, bool)> {
    let (rest, prefixed) = match line.strip_prefix("ERROR:") {
        Some(rest) => (rest.trim_start(), true),
        None => (line, false),
    };
    let after = rest.strip_prefix("0:").or_else(|| rest.strip_prefix("0("))?;
    let n = leading_number(after)?;
    let error = prefixed || after.to_ascii_lowercase().contains("error");
    Some((n, error))
}

fn leading_number(text: &str) -> Option<usize> {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    text[..end].parse().ok()
}
