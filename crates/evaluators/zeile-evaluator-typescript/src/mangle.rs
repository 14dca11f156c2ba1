//! Stable names for script functions.
//!
//! ```text
//! mangled-func ::= '$z' parent-spec? signature
//! parent-spec  ::= 'p' name-spec
//! signature    ::= 'f' name-spec argument* effect? return-type
//! argument     ::= name-spec name-spec        // label, type
//! effect       ::= 'e' 'A'? 's'?              // async, static
//! return-type  ::= 'r' name-spec | 'r' 'V'    // 'V' is void
//! name-spec    ::= <decimal char count> <identifier>
//! ```
//!
//! For example `static init(id: Int)` on `Character` mangles to
//! `$zp9Characterf4init2id3IntesrV`.

use std::fmt::Write;

pub const MANGLING_PREFIX: &str = "$z";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionSignature {
    /// Type the function is declared in, if any.
    pub parent: Option<String>,
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// `None` for functions returning nothing.
    pub return_type: Option<String>,
    pub is_async: bool,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub label: String,
    pub type_name: String,
}

impl Parameter {
    pub fn new(label: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            type_name: type_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0:?} is not a valid identifier")]
pub struct InvalidIdentifier(pub String);

/// Whether `name` can appear in a mangled name.
///
/// Names must be identifiers so that their length prefix is unambiguous.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || unicode_ident::is_xid_start(first) => {
            chars.all(unicode_ident::is_xid_continue)
        }
        _ => false,
    }
}

fn name_spec(out: &mut String, name: &str) -> Result<(), InvalidIdentifier> {
    if !is_identifier(name) {
        return Err(InvalidIdentifier(name.to_string()));
    }
    let _ = write!(out, "{}{name}", name.chars().count());
    Ok(())
}

pub fn mangle(signature: &FunctionSignature) -> Result<String, InvalidIdentifier> {
    let mut out = String::from(MANGLING_PREFIX);
    if let Some(parent) = &signature.parent {
        out.push('p');
        name_spec(&mut out, parent)?;
    }
    out.push('f');
    name_spec(&mut out, &signature.name)?;
    for param in &signature.parameters {
        name_spec(&mut out, &param.label)?;
        name_spec(&mut out, &param.type_name)?;
    }
    if signature.is_async || signature.is_static {
        out.push('e');
        if signature.is_async {
            out.push('A');
        }
        if signature.is_static {
            out.push('s');
        }
    }
    out.push('r');
    match &signature.return_type {
        Some(ty) => name_spec(&mut out, ty)?,
        None => out.push('V'),
    }
    Ok(out)
}

/// Decode a mangled name. Returns `None` for anything `mangle` would not
/// produce.
pub fn demangle(mangled: &str) -> Option<FunctionSignature> {
    let mut rest = mangled.strip_prefix(MANGLING_PREFIX)?;
    let mut signature = FunctionSignature::default();

    if let Some(after) = rest.strip_prefix('p') {
        rest = after;
        signature.parent = Some(take_name(&mut rest)?);
    }
    rest = rest.strip_prefix('f')?;
    signature.name = take_name(&mut rest)?;

    while rest.starts_with(|c: char| c.is_ascii_digit()) {
        let label = take_name(&mut rest)?;
        let type_name = take_name(&mut rest)?;
        signature.parameters.push(Parameter { label, type_name });
    }

    if let Some(after) = rest.strip_prefix('e') {
        rest = after;
        if let Some(after) = rest.strip_prefix('A') {
            signature.is_async = true;
            rest = after;
        }
        if let Some(after) = rest.strip_prefix('s') {
            signature.is_static = true;
            rest = after;
        }
        if !signature.is_async && !signature.is_static {
            return None;
        }
    }

    rest = rest.strip_prefix('r')?;
    if rest == "V" {
        return Some(signature);
    }
    signature.return_type = Some(take_name(&mut rest)?);
    rest.is_empty().then_some(signature)
}

/// Split a `<count><name>` spec off the front of `rest`.
fn take_name(rest: &mut &str) -> Option<String> {
    let digits = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let count: usize = rest[..digits].parse().ok()?;
    let tail = &rest[digits..];
    let end = match tail.char_indices().nth(count) {
        Some((i, _)) => i,
        None if tail.chars().count() == count => tail.len(),
        None => return None,
    };
    let name = &tail[..end];
    if !is_identifier(name) {
        return None;
    }
    *rest = &tail[end..];
    Some(name.to_string())
}
