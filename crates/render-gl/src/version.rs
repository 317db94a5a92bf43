use std::fmt;

use skinview_render::RenderError;

/// Context version as reported by `GL_VERSION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlVersion {
    pub major: u32,
    pub minor: u32,
    /// OpenGL ES or WebGL.
    pub embedded: bool,
}

impl GlVersion {
    /// Parse a `GL_VERSION` string.
    ///
    /// Desktop drivers start with `major.minor`, ES drivers with
    /// `OpenGL ES major.minor`. WebGL reports `WebGL 2.0`, which maps to
    /// ES 3.0.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (rest, embedded, webgl) = if let Some(rest) = raw.strip_prefix("OpenGL ES") {
            // "OpenGL ES-CM 1.1" style profiles carry a suffix before the number.
            let rest = rest.trim_start_matches(|c: char| c != ' ' && !c.is_ascii_digit());
            (rest, true, false)
        } else if let Some(rest) = raw.strip_prefix("WebGL") {
            (rest, true, true)
        } else {
            (raw, false, false)
        };

        let number = rest.split_whitespace().next()?;
        let mut parts = number.split('.');
        let major: u32 = parts.next()?.parse().ok()?;
        let minor: u32 = parts
            .next()
            .map(|m| m.trim_end_matches(|c: char| !c.is_ascii_digit()))
            .and_then(|m| m.parse().ok())
            .unwrap_or(0);

        let major = if webgl { major + 1 } else { major };
        Some(Self {
            major,
            minor,
            embedded,
        })
    }

    /// GL 3.3 core or GLES 3.0 / WebGL2.
    pub fn is_supported(&self) -> bool {
        if self.embedded {
            (self.major, self.minor) >= (3, 0)
        } else {
            (self.major, self.minor) >= (3, 3)
        }
    }

    pub fn require_supported(&self) -> Result<(), RenderError> {
        if self.is_supported() {
            Ok(())
        } else {
            Err(RenderError::Unsupported(format!(
                "{self} (need OpenGL 3.3 or OpenGL ES 3.0)"
            )))
        }
    }

    /// `#version` line and precision preamble prepended to every shader.
    pub fn shader_header(&self) -> &'static str {
        if self.embedded {
            "#version 300 es\nprecision highp float;\nprecision highp int;\n"
        } else {
            "#version 330 core\n"
        }
    }
}

impl fmt::Display for GlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.embedded {
            write!(f, "OpenGL ES {}.{}", self.major, self.minor)
        } else {
            write!(f, "OpenGL {}.{}", self.major, self.minor)
        }
    }
}
