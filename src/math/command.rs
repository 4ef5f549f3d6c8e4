//! External-process math backend.
//!
//! The typesetter is invoked as `<typesetter> [--inline] -- <tex>` and must print
//! an SVG whose root element carries `width`/`height` in `ex` (MathJax's
//! `tex2svg` does). The rasterizer is invoked as
//! `<rasterizer> -w <px> -h <px> -f png`, reading SVG on stdin and writing PNG
//! on stdout (`rsvg-convert` does).

use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

use quick_xml::events::Event;
use quick_xml::Reader;

use super::{MathBackend, TypesetFormula};
use crate::error::{FlashdeckError, FormulaError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBackend {
    pub typesetter: String,
    pub rasterizer: String,
}

impl Default for CommandBackend {
    fn default() -> Self {
        CommandBackend {
            typesetter: "tex2svg".to_string(),
            rasterizer: "rsvg-convert".to_string(),
        }
    }
}

impl CommandBackend {
    pub fn new(typesetter: impl Into<String>, rasterizer: impl Into<String>) -> Self {
        CommandBackend {
            typesetter: typesetter.into(),
            rasterizer: rasterizer.into(),
        }
    }

    fn probe(program: &str) -> Result<(), FlashdeckError> {
        match Command::new(program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(_) => Ok(()),
            Err(e) => Err(FlashdeckError::RenderDependencyMissing {
                engine: program.to_string(),
                reason: if e.kind() == ErrorKind::NotFound {
                    "not found on PATH".to_string()
                } else {
                    e.to_string()
                },
            }),
        }
    }
}

/// The formula goes after `--` so a leading `-` is never read as an option.
fn typeset_args(tex: &str, display: bool) -> Vec<&str> {
    let mut args = Vec::with_capacity(3);
    if !display {
        args.push("--inline");
    }
    args.push("--");
    args.push(tex);
    args
}

fn stderr_text(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr).trim().to_string();
    if text.is_empty() {
        "no error output".to_string()
    } else {
        text
    }
}

impl MathBackend for CommandBackend {
    fn typeset(&self, tex: &str, display: bool) -> Result<TypesetFormula, FormulaError> {
        let output = Command::new(&self.typesetter)
            .args(typeset_args(tex, display))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| FormulaError::Typeset(format!("{}: {}", self.typesetter, e)))?;
        if !output.status.success() {
            return Err(FormulaError::Typeset(stderr_text(&output.stderr)));
        }

        let svg = String::from_utf8(output.stdout)
            .map_err(|e| FormulaError::Typeset(format!("output is not UTF-8: {}", e)))?;
        let (width_ex, height_ex) = svg_ex_dimensions(&svg)
            .ok_or_else(|| FormulaError::Typeset("no ex width/height on the root <svg>".to_string()))?;

        Ok(TypesetFormula {
            svg,
            width_ex,
            height_ex,
        })
    }

    fn rasterize(&self, svg: &str, width_px: u32, height_px: u32) -> Result<Vec<u8>, FormulaError> {
        let mut child = Command::new(&self.rasterizer)
            .args(["-w", &width_px.to_string(), "-h", &height_px.to_string(), "-f", "png"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| FormulaError::Rasterize(format!("{}: {}", self.rasterizer, e)))?;

        // Feed stdin from another thread so a large PNG can't fill the stdout
        // pipe while we are still writing.
        let writer = child.stdin.take().map(|mut stdin| {
            let svg = svg.to_string();
            std::thread::spawn(move || stdin.write_all(svg.as_bytes()))
        });

        let output = child
            .wait_with_output()
            .map_err(|e| FormulaError::Rasterize(e.to_string()))?;
        if !output.status.success() {
            return Err(FormulaError::Rasterize(stderr_text(&output.stderr)));
        }
        if let Some(handle) = writer {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(FormulaError::Rasterize(format!("writing SVG: {}", e))),
                Err(_) => return Err(FormulaError::Rasterize("stdin writer panicked".to_string())),
            }
        }
        Ok(output.stdout)
    }

    fn check_available(&self) -> Result<(), FlashdeckError> {
        Self::probe(&self.typesetter)?;
        Self::probe(&self.rasterizer)
    }
}

/// Read `width`/`height` from the root `<svg>` element, in `ex`.
pub fn svg_ex_dimensions(svg: &str) -> Option<(f64, f64)> {
    let mut reader = Reader::from_str(svg);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() != b"svg" {
                    return None;
                }
                let width = get_attr(&e, "width").and_then(|v| parse_ex(&v))?;
                let height = get_attr(&e, "height").and_then(|v| parse_ex(&v))?;
                return Some((width, height));
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }
}

fn parse_ex(value: &str) -> Option<f64> {
    value.trim().strip_suffix("ex")?.trim().parse::<f64>().ok()
}

fn get_attr(e: &quick_xml::events::BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return String::from_utf8(attr.value.to_vec()).ok();
        }
    }
    None
}
