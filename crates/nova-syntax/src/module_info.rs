//! `module-info.java` parsing.
//!
//! [`parse_module_info`] is strict and fails on the first error. The lossy
//! variant [`parse_module_info_lossy`] recovers at directive boundaries so a
//! half-written descriptor still contributes its complete directives to the
//! module graph.

use std::fmt;

use nova_core::TextRange;
use thiserror::Error;

use crate::lexer::{lex, SyntaxKind, Token};

/// A (possibly dotted) name together with its source range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRef {
    pub text: String,
    pub range: TextRange,
}

impl NameRef {
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for NameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.text.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDecl {
    pub name: NameRef,
    pub is_open: bool,
    /// `import` declarations preceding the module declaration.
    pub imports: Vec<NameRef>,
    pub directives: Vec<ModuleDirective>,
}

impl ModuleDecl {
    pub fn requires(&self) -> impl Iterator<Item = &RequiresDecl> {
        self.directives.iter().filter_map(|d| match d {
            ModuleDirective::Requires(it) => Some(it),
            _ => None,
        })
    }

    pub fn exports(&self) -> impl Iterator<Item = &ExportsDecl> {
        self.directives.iter().filter_map(|d| match d {
            ModuleDirective::Exports(it) => Some(it),
            _ => None,
        })
    }

    pub fn opens(&self) -> impl Iterator<Item = &ExportsDecl> {
        self.directives.iter().filter_map(|d| match d {
            ModuleDirective::Opens(it) => Some(it),
            _ => None,
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DirectiveName {
    Requires,
    Exports,
    Opens,
    Uses,
    Provides,
}

impl DirectiveName {
    pub const ALL: [DirectiveName; 5] = [
        DirectiveName::Exports,
        DirectiveName::Opens,
        DirectiveName::Provides,
        DirectiveName::Requires,
        DirectiveName::Uses,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            DirectiveName::Requires => "requires",
            DirectiveName::Exports => "exports",
            DirectiveName::Opens => "opens",
            DirectiveName::Uses => "uses",
            DirectiveName::Provides => "provides",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        DirectiveName::ALL.into_iter().find(|d| d.keyword() == word)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleDirective {
    Requires(RequiresDecl),
    Exports(ExportsDecl),
    Opens(ExportsDecl),
    Uses(UsesDecl),
    Provides(ProvidesDecl),
}

impl ModuleDirective {
    pub fn name(&self) -> DirectiveName {
        match self {
            ModuleDirective::Requires(_) => DirectiveName::Requires,
            ModuleDirective::Exports(_) => DirectiveName::Exports,
            ModuleDirective::Opens(_) => DirectiveName::Opens,
            ModuleDirective::Uses(_) => DirectiveName::Uses,
            ModuleDirective::Provides(_) => DirectiveName::Provides,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiresDecl {
    pub module: NameRef,
    pub is_transitive: bool,
    pub is_static: bool,
}

/// `exports` and `opens` share their shape: a package and optional targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportsDecl {
    pub package: NameRef,
    pub to: Vec<NameRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsesDecl {
    pub service: NameRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvidesDecl {
    pub service: NameRef,
    pub implementations: Vec<NameRef>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message} at byte {position}")]
pub struct ModuleInfoParseError {
    message: String,
    position: usize,
}

impl ModuleInfoParseError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

/// Parse a `module-info.java` file, failing on the first error.
pub fn parse_module_info(src: &str) -> Result<ModuleDecl, ModuleInfoParseError> {
    let (decl, mut errors) = parse(src, false);
    if !errors.is_empty() {
        return Err(errors.swap_remove(0));
    }
    decl.ok_or_else(|| ModuleInfoParseError::new("expected module declaration", src.len()))
}

/// Parse a `module-info.java` file, skipping malformed directives.
///
/// Returns `None` for the declaration only when no `module <name>` header can
/// be found.
pub fn parse_module_info_lossy(src: &str) -> (Option<ModuleDecl>, Vec<ModuleInfoParseError>) {
    parse(src, true)
}

fn parse(src: &str, recover: bool) -> (Option<ModuleDecl>, Vec<ModuleInfoParseError>) {
    let tokens: Vec<Token> = lex(src)
        .into_iter()
        .filter(|t| !t.kind.is_trivia())
        .collect();
    let mut parser = Parser {
        src,
        tokens,
        pos: 0,
        errors: Vec::new(),
        recover,
    };
    let decl = parser.parse_compilation_unit();
    (decl, parser.errors)
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ModuleInfoParseError>,
    recover: bool,
}

type PResult<T> = Result<T, ModuleInfoParseError>;

impl Parser<'_> {
    fn cur(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn cur_offset(&self) -> usize {
        self.cur().map(Token::start).unwrap_or(self.src.len())
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.cur().is_some_and(|t| t.kind == kind)
    }

    fn at_word(&self, word: &str) -> bool {
        self.cur().is_some_and(|t| t.is_ident(self.src, word))
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn error(&self, message: impl Into<String>) -> ModuleInfoParseError {
        ModuleInfoParseError::new(message, self.cur_offset())
    }

    fn expect(&mut self, kind: SyntaxKind, what: &str) -> PResult<()> {
        if self.at(kind) {
            self.bump();
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn expect_word(&mut self, word: &str) -> PResult<()> {
        if self.at_word(word) {
            self.bump();
            Ok(())
        } else {
            Err(self.error(format!("expected keyword `{word}`")))
        }
    }

    fn parse_name(&mut self) -> PResult<NameRef> {
        let first = match self.cur() {
            Some(t) if t.kind == SyntaxKind::Identifier => *t,
            _ => return Err(self.error("expected identifier")),
        };
        self.bump();
        let mut end = first.range.end();
        while self.at(SyntaxKind::Dot) {
            self.bump();
            match self.cur() {
                Some(t) if t.kind == SyntaxKind::Identifier => {
                    end = t.range.end();
                    self.bump();
                }
                _ => return Err(self.error("expected identifier after `.`")),
            }
        }
        let range = TextRange::new(first.range.start(), end);
        let text: String = self.src[range]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        Ok(NameRef { text, range })
    }

    fn skip_annotations(&mut self) {
        while self.at(SyntaxKind::At) {
            self.bump();
            if self.parse_name().is_err() {
                return;
            }
            if self.at(SyntaxKind::LParen) {
                let mut depth = 0usize;
                while let Some(t) = self.cur() {
                    match t.kind {
                        SyntaxKind::LParen => depth += 1,
                        SyntaxKind::RParen => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                    self.bump();
                    if depth == 0 {
                        break;
                    }
                }
            }
        }
    }

    fn parse_compilation_unit(&mut self) -> Option<ModuleDecl> {
        let mut imports = Vec::new();
        while self.at_word("import") {
            self.bump();
            if self.at_word("static") {
                self.bump();
            }
            match self.parse_import_name() {
                Ok(name) => imports.push(name),
                Err(err) => {
                    if !self.fail(err) {
                        return None;
                    }
                }
            }
        }

        self.skip_annotations();
        let is_open = self.at_word("open");
        if is_open {
            self.bump();
        }
        if let Err(err) = self.expect_word("module") {
            self.errors.push(err);
            return None;
        }
        let name = match self.parse_name() {
            Ok(name) => name,
            Err(err) => {
                self.errors.push(err);
                return None;
            }
        };

        let mut decl = ModuleDecl {
            name,
            is_open,
            imports,
            directives: Vec::new(),
        };

        if let Err(err) = self.expect(SyntaxKind::LBrace, "`{`") {
            self.errors.push(err);
            return Some(decl);
        }

        while self.cur().is_some() && !self.at(SyntaxKind::RBrace) {
            match self.parse_directive() {
                Ok(directive) => decl.directives.push(directive),
                Err(err) => {
                    if !self.fail(err) {
                        return Some(decl);
                    }
                    self.synchronize();
                }
            }
        }

        if let Err(err) = self.expect(SyntaxKind::RBrace, "`}`") {
            self.errors.push(err);
            return Some(decl);
        }
        if self.cur().is_some() {
            let err = self.error("unexpected tokens after module declaration");
            self.errors.push(err);
        }
        Some(decl)
    }

    /// Record `err`; returns whether parsing should continue.
    fn fail(&mut self, err: ModuleInfoParseError) -> bool {
        tracing::trace!(target: "nova.syntax", error = %err, "module-info parse error");
        self.errors.push(err);
        self.recover
    }

    /// Skip to just after the next `;`, or to the next `}`/directive keyword.
    fn synchronize(&mut self) {
        while let Some(t) = self.cur() {
            match t.kind {
                SyntaxKind::Semicolon => {
                    self.bump();
                    return;
                }
                SyntaxKind::RBrace => return,
                SyntaxKind::Identifier
                    if DirectiveName::from_keyword(t.text(self.src)).is_some()
                        && self.pos > 0
                        && self.tokens[self.pos - 1].kind != SyntaxKind::Dot =>
                {
                    return;
                }
                _ => self.bump(),
            }
        }
    }

    fn parse_import_name(&mut self) -> PResult<NameRef> {
        let mut name = self.parse_name()?;
        if self.at(SyntaxKind::Dot) {
            // `import a.b.*;`
            self.bump();
            let star = self.cur().copied();
            self.expect(SyntaxKind::Op, "`*`")?;
            if let Some(star) = star {
                name.text.push_str(".*");
                name.range = TextRange::new(name.range.start(), star.range.end());
            }
        }
        self.expect(SyntaxKind::Semicolon, "`;`")?;
        Ok(name)
    }

    fn parse_directive(&mut self) -> PResult<ModuleDirective> {
        let keyword = self
            .cur()
            .filter(|t| t.kind == SyntaxKind::Identifier)
            .and_then(|t| DirectiveName::from_keyword(t.text(self.src)));
        let Some(keyword) = keyword else {
            let err = self.error("expected module directive");
            self.bump();
            return Err(err);
        };
        self.bump();

        match keyword {
            DirectiveName::Requires => self.parse_requires(),
            DirectiveName::Exports => Ok(ModuleDirective::Exports(self.parse_exports_like()?)),
            DirectiveName::Opens => Ok(ModuleDirective::Opens(self.parse_exports_like()?)),
            DirectiveName::Uses => {
                let service = self.parse_name()?;
                self.expect(SyntaxKind::Semicolon, "`;`")?;
                Ok(ModuleDirective::Uses(UsesDecl { service }))
            }
            DirectiveName::Provides => self.parse_provides(),
        }
    }

    fn parse_requires(&mut self) -> PResult<ModuleDirective> {
        let mut is_transitive = false;
        let mut is_static = false;

        // `requires transitive;` names a module called `transitive`.
        loop {
            let next_is_name = self
                .tokens
                .get(self.pos + 1)
                .is_some_and(|t| t.kind == SyntaxKind::Identifier);
            if self.at_word("transitive") && next_is_name {
                is_transitive = true;
                self.bump();
            } else if self.at_word("static") {
                is_static = true;
                self.bump();
            } else {
                break;
            }
        }

        let module = self.parse_name()?;
        self.expect(SyntaxKind::Semicolon, "`;`")?;
        Ok(ModuleDirective::Requires(RequiresDecl {
            module,
            is_transitive,
            is_static,
        }))
    }

    fn parse_exports_like(&mut self) -> PResult<ExportsDecl> {
        let package = self.parse_name()?;
        let mut to = Vec::new();
        if self.at_word("to") {
            self.bump();
            to.push(self.parse_name()?);
            while self.at(SyntaxKind::Comma) {
                self.bump();
                to.push(self.parse_name()?);
            }
        }
        self.expect(SyntaxKind::Semicolon, "`;`")?;
        Ok(ExportsDecl { package, to })
    }

    fn parse_provides(&mut self) -> PResult<ModuleDirective> {
        let service = self.parse_name()?;
        self.expect_word("with")?;
        let mut implementations = vec![self.parse_name()?];
        while self.at(SyntaxKind::Comma) {
            self.bump();
            implementations.push(self.parse_name()?);
        }
        self.expect(SyntaxKind::Semicolon, "`;`")?;
        Ok(ModuleDirective::Provides(ProvidesDecl {
            service,
            implementations,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_all_directives() {
        let src = r#"
            import java.sql.Driver;
            open module com.greetings {
                requires transitive static org.astro;
                exports com.greetings.api to a.b, c;
                opens com.greetings.impl;
                uses java.sql.Driver;
                provides java.sql.Driver with com.greetings.impl.D1, com.greetings.impl.D2;
            }
        "#;
        let decl = parse_module_info(src).unwrap();
        assert_eq!(decl.name.as_str(), "com.greetings");
        assert!(decl.is_open);
        assert_eq!(decl.imports.len(), 1);
        assert_eq!(
            decl.directives.iter().map(|d| d.name()).collect::<Vec<_>>(),
            [
                DirectiveName::Requires,
                DirectiveName::Exports,
                DirectiveName::Opens,
                DirectiveName::Uses,
                DirectiveName::Provides,
            ]
        );

        let requires = decl.requires().next().unwrap();
        assert!(requires.is_transitive && requires.is_static);
        assert_eq!(&src[requires.module.range], "org.astro");

        let exports = decl.exports().next().unwrap();
        assert_eq!(
            exports.to.iter().map(NameRef::as_str).collect::<Vec<_>>(),
            ["a.b", "c"]
        );
    }

    #[test]
    fn module_named_transitive() {
        let decl = parse_module_info("module m { requires transitive; }").unwrap();
        let requires = decl.requires().next().unwrap();
        assert_eq!(requires.module.as_str(), "transitive");
        assert!(!requires.is_transitive);
    }

    #[test]
    fn strict_parse_reports_first_error() {
        let err = parse_module_info("module m { requires ; }").unwrap_err();
        assert_eq!(err.message(), "expected identifier");
    }

    #[test]
    fn lossy_parse_keeps_complete_directives() {
        let src = "module m {\n requires a;\n exports ;\n requires b;\n requires";
        let (decl, errors) = parse_module_info_lossy(src);
        let decl = decl.unwrap();
        assert_eq!(
            decl.requires().map(|r| r.module.as_str()).collect::<Vec<_>>(),
            ["a", "b"]
        );
        assert!(errors.len() >= 2);
    }

    #[test]
    fn lossy_parse_without_header() {
        let (decl, errors) = parse_module_info_lossy("class X {}");
        assert!(decl.is_none());
        assert_eq!(errors.len(), 1);

        let (decl, _) = parse_module_info_lossy("module my.mod");
        assert_eq!(decl.unwrap().name.as_str(), "my.mod");
    }
}
