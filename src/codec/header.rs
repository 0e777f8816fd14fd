//! REW impulse response header
//!
//! Every exported impulse file starts with the same header so REW imports it
//! as a 48 kHz, 16384-sample response. The `//` and `*` lines are skipped
//! again by the importers.

use std::fs;
use std::path::Path;

use crate::document::Sample;
use crate::error::{AdyError, Result};

/// Built-in header text. Ends with a newline so a blank line separates it
/// from the samples.
pub const REW_IMPULSE_HEADER: &str = "* Impulse Response data saved by REW
* IR is not normalised
* IR window has not been applied
* IR is not the min phase version
* Excitation: Imported Impulse Response, 48000.0 Hz sampling
* Response measured over: 2,9 to 24 000,0 Hz
0 // Peak value before normalisation
0 // Peak index
16384 // Response length
2.0833333333333333E-5 // Sample interval (seconds)
0.0 // Start time (seconds)
* Data start
";

/// Header prepended to exported impulse files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderTemplate {
    text: String,
}

impl Default for HeaderTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

impl HeaderTemplate {
    /// The REW header shipped with the tool.
    pub fn builtin() -> Self {
        Self {
            text: REW_IMPULSE_HEADER.to_string(),
        }
    }

    /// Use custom header text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Read a header template file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(AdyError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let text = fs::read_to_string(path).map_err(|e| AdyError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(Self { text })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Header, a newline, then one sample token per line.
    pub fn render(&self, samples: &[Sample]) -> String {
        let body_len: usize = samples.iter().map(|s| s.token().len() + 1).sum();
        let mut out = String::with_capacity(self.text.len() + 1 + body_len);

        out.push_str(&self.text);
        out.push('\n');
        for (i, sample) in samples.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(sample.token());
        }

        out
    }
}
