//! Reading the plain-text format back into a [`Story`].
//!
//! The format does not record the locale, so the caller supplies it.
//! A literal that ends in a backslash cannot be read back, because its
//! terminator is indistinguishable from an escaped semicolon.

use zeile_core::ir::{Locale, Position, PositionBase, StepAction, Story};

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("missing section {0}")]
    MissingSection(&'static str),

    #[error("unknown sub-block $sub_{0}")]
    UnknownSub(usize),
}

fn syntax(line: usize, message: impl Into<String>) -> ReadError {
    ReadError::Syntax {
        line,
        message: message.into(),
    }
}

/// Decode plain-text output into a story for `locale`.
pub fn read(input: &str, locale: Locale) -> Result<Story, ReadError> {
    let mut cursor = Cursor::new(input);
    cursor.expect_line(".text")?;
    let texts = cursor.table('t')?;
    cursor.expect_line(".path")?;
    let paths = cursor.table('p')?;
    cursor.expect_line(".code")?;

    let main = cursor.code_lines();
    let mut subs: Vec<Vec<(usize, &str)>> = Vec::new();
    while let Some((number, header)) = cursor.next_line() {
        if header.is_empty() {
            continue;
        }
        let label = header
            .strip_prefix("sub_")
            .and_then(|rest| rest.strip_suffix(':'))
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(|| syntax(number, format!("expected a sub-block label, found {header:?}")))?;
        if label != subs.len() {
            return Err(syntax(number, format!("sub-block sub_{label} is out of order")));
        }
        subs.push(cursor.code_lines());
    }

    let decoder = Decoder {
        texts: &texts,
        paths: &paths,
        subs: &subs,
    };
    let actions = decoder.block(&main, subs.len())?;
    Ok(Story::from_actions(locale, actions))
}

struct Cursor<'s> {
    rest: &'s str,
    line: usize,
}

impl<'s> Cursor<'s> {
    fn new(input: &'s str) -> Self {
        Self {
            rest: input,
            line: 0,
        }
    }

    fn next_line(&mut self) -> Option<(usize, &'s str)> {
        if self.rest.is_empty() {
            return None;
        }
        self.line += 1;
        let (line, rest) = self.rest.split_once('\n').unwrap_or((self.rest, ""));
        self.rest = rest;
        Some((self.line, line))
    }

    fn expect_line(&mut self, expected: &'static str) -> Result<(), ReadError> {
        match self.next_line() {
            Some((_, line)) if line == expected => Ok(()),
            Some((number, line)) => Err(syntax(
                number,
                format!("expected {expected:?}, found {line:?}"),
            )),
            None => Err(ReadError::MissingSection(expected)),
        }
    }

    /// Read `<prefix><i>: <literal>;` entries up to a blank line.
    ///
    /// Literals may span lines; only an unescaped `;` at the end of a line
    /// terminates them.
    fn table(&mut self, prefix: char) -> Result<Vec<String>, ReadError> {
        let mut items = Vec::new();
        loop {
            if self.rest.starts_with('\n') {
                self.next_line();
                return Ok(items);
            }
            let Some((number, first)) = self.next_line() else {
                return Ok(items);
            };
            let label = format!("{prefix}{}: ", items.len());
            let mut body = first
                .strip_prefix(label.as_str())
                .ok_or_else(|| syntax(number, format!("expected entry {label:?}")))?
                .to_string();
            while !is_terminated(&body) {
                let (_, next) = self
                    .next_line()
                    .ok_or_else(|| syntax(number, "unterminated literal"))?;
                body.push('\n');
                body.push_str(next);
            }
            body.pop();
            items.push(body.replace("\\;", ";"));
        }
    }

    /// Collect code lines up to a blank line or the end of input.
    fn code_lines(&mut self) -> Vec<(usize, &'s str)> {
        let mut lines = Vec::new();
        while let Some((number, line)) = self.next_line() {
            if line.is_empty() {
                break;
            }
            lines.push((number, line));
        }
        lines
    }
}

fn is_terminated(body: &str) -> bool {
    body.ends_with(';') && !body.ends_with("\\;")
}

struct Decoder<'d> {
    texts: &'d [String],
    paths: &'d [String],
    subs: &'d [Vec<(usize, &'d str)>],
}

/// One decoded argument.
enum Arg {
    Number(f64),
    Text(usize),
    Path(usize),
    Sub(usize),
    List(Vec<Arg>),
    Position(Vec<Arg>),
}

impl Decoder<'_> {
    /// Decode a sequence. `limit` bounds which sub-blocks it may refer to:
    /// sub-blocks are written after everything they contain.
    fn block(&self, lines: &[(usize, &str)], limit: usize) -> Result<Vec<StepAction>, ReadError> {
        lines
            .iter()
            .map(|&(number, line)| self.action(number, line, limit))
            .collect()
    }

    fn action(&self, number: usize, line: &str, limit: usize) -> Result<StepAction, ReadError> {
        let (opcode, rest) = line.split_once(' ').unwrap_or((line, ""));
        let args = parse_args(rest.trim()).map_err(|m| syntax(number, m))?;
        let mut args = Args {
            decoder: self,
            number,
            opcode,
            items: args.into_iter(),
        };

        let action = match opcode {
            "tlk" => {
                let text = args.text()?;
                let character_ids = args
                    .list()?
                    .into_iter()
                    .map(|a| args.as_int(a))
                    .collect::<Result<_, _>>()?;
                let character_names = args
                    .list()?
                    .into_iter()
                    .map(|a| args.as_text(a))
                    .collect::<Result<_, _>>()?;
                let voice_path = match args.items.len() {
                    0 => None,
                    _ => Some(args.path()?),
                };
                StepAction::Talk {
                    text,
                    character_ids,
                    character_names,
                    voice_path,
                }
            }
            "tlp" => StepAction::Telop { text: args.text()? },
            "mds" => StepAction::ShowModel {
                character_id: args.int()?,
                model_path: args.path()?,
                position: args.position()?,
            },
            "mdh" => StepAction::HideModel {
                character_id: args.int()?,
            },
            "mdm" => StepAction::MoveModel {
                character_id: args.int()?,
                position: args.position()?,
            },
            "act" => StepAction::Act {
                character_id: args.int()?,
                motion_name: args.text()?,
            },
            "exp" => StepAction::Express {
                character_id: args.int()?,
                expression_name: args.text()?,
            },
            "hsk" => StepAction::HorizontalShake {
                character_id: args.int()?,
            },
            "vsk" => StepAction::VerticalShake {
                character_id: args.int()?,
            },
            "bcs" => StepAction::ShowBlackCover {
                duration: args.number()?,
            },
            "bch" => StepAction::HideBlackCover {
                duration: args.number()?,
            },
            "wcs" => StepAction::ShowWhiteCover {
                duration: args.number()?,
            },
            "wch" => StepAction::HideWhiteCover {
                duration: args.number()?,
            },
            "ssc" => StepAction::ShakeScreen {
                duration: args.number()?,
            },
            "sdb" => StepAction::ShakeDialogBox {
                duration: args.number()?,
            },
            "cbg" => StepAction::ChangeBackground { path: args.path()? },
            "cbm" => StepAction::ChangeBgm { path: args.path()? },
            "cse" => StepAction::ChangeSe { path: args.path()? },
            "slp" => StepAction::Delay {
                seconds: args.number()?,
            },
            "blk" => StepAction::Blocking {
                actions: args.sub(limit)?,
            },
            "tsk" => StepAction::ForkTask {
                actions: args.sub(limit)?,
            },
            "wfa" => StepAction::WaitForAll,
            "wft" => StepAction::WaitForTap,
            other => return Err(syntax(number, format!("unknown opcode {other:?}"))),
        };
        if args.items.len() > 0 {
            return Err(syntax(number, format!("too many arguments for {opcode}")));
        }
        Ok(action)
    }
}

/// Typed access to the arguments of one code line.
struct Args<'a, 'd> {
    decoder: &'a Decoder<'d>,
    number: usize,
    opcode: &'a str,
    items: std::vec::IntoIter<Arg>,
}

impl Args<'_, '_> {
    fn err(&self, expected: &str) -> ReadError {
        syntax(
            self.number,
            format!("{}: expected {expected} argument", self.opcode),
        )
    }

    fn next(&mut self, expected: &str) -> Result<Arg, ReadError> {
        self.items.next().ok_or_else(|| self.err(expected))
    }

    fn number(&mut self) -> Result<f64, ReadError> {
        match self.next("number")? {
            Arg::Number(n) => Ok(n),
            _ => Err(self.err("number")),
        }
    }

    fn int(&mut self) -> Result<i64, ReadError> {
        let arg = self.next("integer")?;
        self.as_int(arg)
    }

    fn as_int(&self, arg: Arg) -> Result<i64, ReadError> {
        match arg {
            Arg::Number(n) if n.fract() == 0.0 => Ok(n as i64),
            _ => Err(self.err("integer")),
        }
    }

    fn text(&mut self) -> Result<String, ReadError> {
        let arg = self.next("text")?;
        self.as_text(arg)
    }

    fn as_text(&self, arg: Arg) -> Result<String, ReadError> {
        match arg {
            Arg::Text(i) => self
                .decoder
                .texts
                .get(i)
                .cloned()
                .ok_or_else(|| syntax(self.number, format!("undefined text t{i}"))),
            _ => Err(self.err("text")),
        }
    }

    fn path(&mut self) -> Result<String, ReadError> {
        match self.next("path")? {
            Arg::Path(i) => self
                .decoder
                .paths
                .get(i)
                .cloned()
                .ok_or_else(|| syntax(self.number, format!("undefined path p{i}"))),
            _ => Err(self.err("path")),
        }
    }

    fn list(&mut self) -> Result<Vec<Arg>, ReadError> {
        match self.next("list")? {
            Arg::List(items) => Ok(items),
            _ => Err(self.err("list")),
        }
    }

    fn position(&mut self) -> Result<Position, ReadError> {
        let Arg::Position(parts) = self.next("position")? else {
            return Err(self.err("position"));
        };
        let [Arg::Number(base), Arg::Number(offset_x)] = parts.as_slice() else {
            return Err(self.err("position"));
        };
        let base = (base.fract() == 0.0 && (0.0..=255.0).contains(base))
            .then(|| PositionBase::from_raw(*base as u8))
            .flatten()
            .ok_or_else(|| syntax(self.number, format!("invalid position base {base}")))?;
        Ok(Position::new(base, *offset_x))
    }

    fn sub(&mut self, limit: usize) -> Result<Vec<StepAction>, ReadError> {
        let Arg::Sub(n) = self.next("sub-block")? else {
            return Err(self.err("sub-block"));
        };
        if n >= limit {
            return Err(ReadError::UnknownSub(n));
        }
        let lines = &self.decoder.subs[n];
        self.decoder.block(lines, n)
    }
}

/// Split an argument list at top-level commas and decode each part.
fn parse_args(s: &str) -> Result<Vec<Arg>, String> {
    if s.is_empty() {
        return Ok(Vec::new());
    }
    split_top_level(s)?.into_iter().map(parse_arg).collect()
}

fn split_top_level(s: &str) -> Result<Vec<&str>, String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| format!("unbalanced {c:?} in {s:?}"))?;
            }
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(format!("unclosed bracket in {s:?}"));
    }
    parts.push(s[start..].trim());
    Ok(parts)
}

fn parse_arg(s: &str) -> Result<Arg, String> {
    let index = |rest: &str| {
        rest.parse::<usize>()
            .map_err(|_| format!("invalid reference {s:?}"))
    };
    if let Some(inner) = s.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        return parse_args(inner.trim()).map(Arg::List);
    }
    if let Some(inner) = s.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
        return parse_args(inner.trim()).map(Arg::Position);
    }
    if let Some(n) = s.strip_prefix('#') {
        return n
            .parse::<f64>()
            .map(Arg::Number)
            .map_err(|_| format!("invalid number {s:?}"));
    }
    if let Some(n) = s.strip_prefix("$sub_") {
        return index(n).map(Arg::Sub);
    }
    if let Some(n) = s.strip_prefix('t') {
        return index(n).map(Arg::Text);
    }
    if let Some(n) = s.strip_prefix('p') {
        return index(n).map(Arg::Path);
    }
    Err(format!("unrecognized argument {s:?}"))
}
