//! Simulation scripts.
//!
//! A script is either plain text with one input per line (lines starting
//! with `#` are comments) or a JSON array of the same lines:
//!
//! ```text
//! open
//! wait 50
//! click 420 310
//! key Escape
//! ```

use coachmark_core::event::KeyEvent;
use coachmark_core::event::Modifiers;
use coachmark_core::geometry::Size;
use coachmark_web::keys::dom_key_event;

use crate::error::{CliError, Result};

/// One scripted input.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptOp {
    Open,
    Next,
    Prev,
    Jump(usize),
    /// Primary press at viewport coordinates `(x, y)`.
    Click { x: f64, y: f64 },
    /// A key by its DOM name (`Escape`, `ArrowRight`, `q`).
    Key { name: String, event: KeyEvent },
    /// Advance host time, firing due settle tickets on the way.
    Wait(u64),
    Resize(Size),
    Tooltip(Size),
    /// Remove a target from the layout.
    Remove(String),
    Close,
    Dismiss,
}

impl ScriptOp {
    /// Name used in the output lines.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Next => "next",
            Self::Prev => "prev",
            Self::Jump(_) => "jump",
            Self::Click { .. } => "click",
            Self::Key { .. } => "key",
            Self::Wait(_) => "wait",
            Self::Resize(_) => "resize",
            Self::Tooltip(_) => "tooltip",
            Self::Remove(_) => "remove",
            Self::Close => "close",
            Self::Dismiss => "dismiss",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    /// One-based source line (or array position).
    pub line: usize,
    pub op: ScriptOp,
}

/// Parse a script in either text or JSON-array form.
pub fn parse_script(source: &str) -> Result<Vec<ScriptLine>> {
    if source.trim_start().starts_with('[') {
        let lines: Vec<String> = serde_json::from_str(source)?;
        return parse_lines(lines.iter().map(String::as_str));
    }
    parse_lines(source.lines())
}

fn parse_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Result<Vec<ScriptLine>> {
    let mut ops = Vec::new();
    for (index, raw) in lines.enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let op = parse_op(text).map_err(|message| CliError::script(line, message))?;
        ops.push(ScriptLine { line, op });
    }
    Ok(ops)
}

fn parse_op(text: &str) -> std::result::Result<ScriptOp, String> {
    let mut words = text.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("empty line".into());
    };
    let args: Vec<&str> = words.collect();

    let op = match verb.to_ascii_lowercase().as_str() {
        "open" => expect_args(verb, &args, 0).map(|()| ScriptOp::Open)?,
        "next" => expect_args(verb, &args, 0).map(|()| ScriptOp::Next)?,
        "prev" | "back" => expect_args(verb, &args, 0).map(|()| ScriptOp::Prev)?,
        "close" => expect_args(verb, &args, 0).map(|()| ScriptOp::Close)?,
        "dismiss" => expect_args(verb, &args, 0).map(|()| ScriptOp::Dismiss)?,
        "jump" => {
            expect_args(verb, &args, 1)?;
            ScriptOp::Jump(number(args[0])?)
        }
        "wait" => {
            expect_args(verb, &args, 1)?;
            ScriptOp::Wait(number(args[0])?)
        }
        "click" => {
            expect_args(verb, &args, 2)?;
            ScriptOp::Click {
                x: coordinate(args[0])?,
                y: coordinate(args[1])?,
            }
        }
        "resize" => {
            expect_args(verb, &args, 2)?;
            ScriptOp::Resize(Size::new(coordinate(args[0])?, coordinate(args[1])?))
        }
        "tooltip" => {
            expect_args(verb, &args, 2)?;
            ScriptOp::Tooltip(Size::new(coordinate(args[0])?, coordinate(args[1])?))
        }
        "key" => {
            expect_args(verb, &args, 1)?;
            let name = args[0];
            let event = dom_key_event(name, Modifiers::NONE, false)
                .ok_or_else(|| format!("unknown key `{name}`"))?;
            ScriptOp::Key {
                name: name.to_string(),
                event,
            }
        }
        "remove" => {
            if args.is_empty() {
                return Err("`remove` takes a selector".into());
            }
            ScriptOp::Remove(args.join(" "))
        }
        other => return Err(format!("unknown op `{other}`")),
    };
    Ok(op)
}

fn expect_args(verb: &str, args: &[&str], count: usize) -> std::result::Result<(), String> {
    if args.len() == count {
        Ok(())
    } else {
        Err(format!("`{verb}` takes {count} argument(s), got {}", args.len()))
    }
}

fn number<T: std::str::FromStr>(s: &str) -> std::result::Result<T, String> {
    s.parse().map_err(|_| format!("not a non-negative integer: `{s}`"))
}

fn coordinate(s: &str) -> std::result::Result<f64, String> {
    match s.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(format!("not a number: `{s}`")),
    }
}
