//! Line-oriented header parser and script splitting
//!
//! The header precedes the `---` body separator. Blank lines and comments
//! are skipped (block-comment state is tracked across lines); every other
//! line must be a `%dw`, `output`, `import`, or `var` directive. `var`
//! right-hand sides go through the full expression parser.

use crate::syntax::ast::{Header, ImportDirective, Script, VarDeclaration};
use crate::syntax::error::{ParseError, ParseResult};
use crate::syntax::parser::parse_expression_from_source;

/// Byte offset of the first `---` that starts a line
fn find_separator(source: &str) -> Option<usize> {
    if source.starts_with("---") {
        return Some(0);
    }
    source.find("\n---").map(|index| index + 1)
}

/// Split a script into header and body text around the `---` separator
pub fn split_script(source: &str) -> ParseResult<(&str, &str)> {
    match find_separator(source) {
        Some(index) => Ok((&source[..index], &source[index + 3..])),
        None => Err(ParseError::MissingSeparator),
    }
}

/// Parse the header section (text before `---`)
pub fn parse_header(header_source: &str) -> ParseResult<Header> {
    let mut version: Option<String> = None;
    let mut output: Option<String> = None;
    let mut imports: Vec<ImportDirective> = Vec::new();
    let mut variables: Vec<VarDeclaration> = Vec::new();

    let mut in_block_comment = false;
    for (idx, raw_line) in header_source.lines().enumerate() {
        let line_number = idx + 1;
        let line = raw_line.trim();

        if in_block_comment {
            if line.contains("*/") {
                in_block_comment = false;
            }
            continue;
        }
        if line.starts_with("/*") {
            if !line.ends_with("*/") {
                in_block_comment = true;
            }
            continue;
        }
        if line.starts_with("//") || line.is_empty() {
            continue;
        }

        if line.starts_with("%dw") {
            let mut parts = line.split_whitespace();
            parts.next();
            match parts.next() {
                Some(value) => version = Some(value.to_string()),
                None => return Err(ParseError::invalid_directive(line_number, line)),
            }
            continue;
        }

        if line.starts_with("output") {
            let value = line["output".len()..].trim();
            output = if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            };
            continue;
        }

        if let Some(rest) = line.strip_prefix("import ") {
            imports.push(ImportDirective {
                raw: rest.trim().to_string(),
            });
            continue;
        }

        if let Some(rest) = line.strip_prefix("var ") {
            let declaration = rest.trim();
            let equals = declaration.find('=').ok_or_else(|| {
                ParseError::invalid_var_declaration(line_number, "missing '='")
            })?;
            let name = declaration[..equals].trim();
            if name.is_empty() {
                return Err(ParseError::invalid_var_declaration(
                    line_number,
                    "variable name cannot be empty",
                ));
            }
            let expression = parse_expression_from_source(declaration[equals + 1..].trim())?;
            variables.push(VarDeclaration {
                name: name.to_string(),
                expression,
            });
            continue;
        }

        return Err(ParseError::invalid_directive(line_number, line));
    }

    let version = version.ok_or(ParseError::MissingVersionDirective)?;

    Ok(Header {
        version,
        output,
        imports,
        variables,
    })
}

/// Parse a complete script: header, separator, body expression
pub fn parse_script(source: &str) -> ParseResult<Script> {
    let (header_source, body_source) = split_script(source)?;
    let header = parse_header(header_source.trim())?;
    let body = parse_expression_from_source(body_source.trim())?;

    crate::log_success!(
        crate::logging::codes::success::PARSE_COMPLETE,
        "Script parsed",
        "version" => header.version,
        "variables" => header.variables.len(),
        "imports" => header.imports.len()
    );
    Ok(Script { header, body })
}
