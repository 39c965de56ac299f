//! Static scanner for PHP class declarations.
//!
//! Reads just enough of a PHP file to answer what discovery needs without
//! loading code: the namespace, top-level `use` imports, and the header of the
//! first top-level class-like declaration (kind, `abstract`, resolved `extends`
//! parent, PHP 8 attributes). Comments, strings, heredocs and inline HTML are
//! skipped by the lexer, so docblocks never influence the result.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use crate::config::join_namespace;

/// Kind of a class-like declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// `class`
    Class,
    /// `interface`
    Interface,
    /// `trait`
    Trait,
    /// `enum`
    Enum,
}

impl TypeKind {
    fn from_keyword(kw: &str) -> Option<Self> {
        match kw {
            "class" => Some(TypeKind::Class),
            "interface" => Some(TypeKind::Interface),
            "trait" => Some(TypeKind::Trait),
            "enum" => Some(TypeKind::Enum),
            _ => None,
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Trait => "trait",
            TypeKind::Enum => "enum",
        })
    }
}

/// One argument of an attribute, named (`enable: false`) or positional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeArg {
    /// Parameter name for named arguments
    pub name: Option<String>,
    /// Argument source text
    pub value: String,
}

/// A PHP 8 attribute attached to a declaration, e.g. `#[Repository(enable: false)]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Fully-qualified attribute class name
    pub name: String,
    /// Arguments in source order
    pub args: Vec<AttributeArg>,
}

impl Attribute {
    /// Unqualified attribute name.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('\\').next().unwrap_or(&self.name)
    }

    /// Argument by parameter name, falling back to the positional argument at
    /// `position`.
    pub fn arg(&self, name: &str, position: usize) -> Option<&str> {
        self.args
            .iter()
            .find(|a| a.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name)))
            .or_else(|| self.args.iter().filter(|a| a.name.is_none()).nth(position))
            .map(|a| a.value.as_str())
    }
}

/// Header of the first class-like declaration found in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhpDeclaration {
    /// Enclosing namespace (empty for the global namespace)
    pub namespace: String,
    /// Declared short name
    pub name: String,
    /// Declaration kind
    pub kind: TypeKind,
    /// Whether the class is `abstract`
    pub is_abstract: bool,
    /// Fully-qualified `extends` parent, for classes
    pub parent: Option<String>,
    /// Attributes preceding the declaration
    pub attributes: Vec<Attribute>,
}

impl PhpDeclaration {
    /// Fully-qualified declared name.
    pub fn fqn(&self) -> String {
        join_namespace(&self.namespace, &self.name)
    }
}

/// Scan PHP source for its first top-level class-like declaration.
///
/// Returns `Ok(None)` when the file declares none, and `Err` with a reason when
/// a declaration header is present but malformed.
pub fn scan_declaration(source: &str) -> Result<Option<PhpDeclaration>, String> {
    Parser::new(tokenize(source.as_bytes())).run()
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Name(String),
    Variable(String),
    Literal(String),
    AttrOpen,
    DoubleColon,
    Arrow,
    Punct(char),
}

impl Token {
    fn text(&self) -> Cow<'_, str> {
        match self {
            Token::Name(s) | Token::Variable(s) | Token::Literal(s) => Cow::Borrowed(s),
            Token::AttrOpen => Cow::Borrowed("#["),
            Token::DoubleColon => Cow::Borrowed("::"),
            Token::Arrow => Cow::Borrowed("->"),
            Token::Punct(c) => Cow::Owned(c.to_string()),
        }
    }

    fn is_name(&self, keyword: &str) -> bool {
        matches!(self, Token::Name(n) if n.eq_ignore_ascii_case(keyword))
    }
}

fn describe(token: Option<&Token>) -> String {
    match token {
        Some(t) => format!("`{}`", t.text()),
        None => "end of file".to_string(),
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_char(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
}

fn tokenize(src: &[u8]) -> Vec<Token> {
    let mut lexer = Lexer { src, pos: 0 };
    lexer.skip_inline_html();
    let mut tokens = Vec::new();
    while let Some(tok) = lexer.next_token() {
        tokens.push(tok);
    }
    tokens
}

impl<'a> Lexer<'a> {
    fn peek(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn starts_with(&self, s: &[u8]) -> bool {
        self.src[self.pos..].starts_with(s)
    }

    fn slice(&self, start: usize) -> String {
        String::from_utf8_lossy(&self.src[start..self.pos]).into_owned()
    }

    fn take_while(&mut self, f: impl Fn(u8) -> bool) {
        while self.peek(0).is_some_and(&f) {
            self.pos += 1;
        }
    }

    /// Skip text outside `<?php ... ?>`.
    fn skip_inline_html(&mut self) {
        while self.pos < self.src.len() {
            if self.starts_with(b"<?php") {
                self.pos += 5;
                return;
            }
            if self.starts_with(b"<?=") {
                self.pos += 3;
                return;
            }
            if self.starts_with(b"<?") {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(b) = self.peek(0) {
            if b == b'\n' || self.starts_with(b"?>") {
                return;
            }
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while self.pos < self.src.len() && !self.starts_with(b"*/") {
            self.pos += 1;
        }
        self.pos = (self.pos + 2).min(self.src.len());
    }

    fn quoted(&mut self, quote: u8) -> Token {
        let start = self.pos;
        self.pos += 1;
        while let Some(b) = self.peek(0) {
            self.pos += 1;
            if b == b'\\' {
                self.pos += 1;
            } else if b == quote {
                break;
            }
        }
        self.pos = self.pos.min(self.src.len());
        Token::Literal(self.slice(start))
    }

    /// Heredoc or nowdoc; the closing marker may be indented.
    fn heredoc(&mut self) -> Token {
        let start = self.pos;
        self.pos += 3;
        self.take_while(|b| b == b' ' || b == b'\t');
        let quoted = matches!(self.peek(0), Some(b'\'' | b'"'));
        if quoted {
            self.pos += 1;
        }
        let label_start = self.pos;
        self.take_while(is_ident_char);
        let label = self.src[label_start..self.pos].to_vec();
        if label.is_empty() {
            self.pos = start + 1;
            return Token::Punct('<');
        }
        loop {
            while let Some(b) = self.peek(0) {
                self.pos += 1;
                if b == b'\n' {
                    break;
                }
            }
            if self.pos >= self.src.len() {
                break;
            }
            self.take_while(|b| b == b' ' || b == b'\t');
            if self.starts_with(&label) && !self.peek(label.len()).is_some_and(is_ident_char) {
                self.pos += label.len();
                break;
            }
        }
        Token::Literal(self.slice(start))
    }

    fn next_token(&mut self) -> Option<Token> {
        loop {
            let c = self.peek(0)?;
            let next = self.peek(1);
            match c {
                b if b.is_ascii_whitespace() => self.pos += 1,
                b'#' if next == Some(b'[') => {
                    self.pos += 2;
                    return Some(Token::AttrOpen);
                }
                b'#' => self.skip_line_comment(),
                b'/' if next == Some(b'/') => self.skip_line_comment(),
                b'/' if next == Some(b'*') => self.skip_block_comment(),
                b'?' if next == Some(b'>') => {
                    self.pos += 2;
                    self.skip_inline_html();
                }
                b'?' if next == Some(b'-') && self.peek(2) == Some(b'>') => {
                    self.pos += 3;
                    return Some(Token::Arrow);
                }
                b'-' if next == Some(b'>') => {
                    self.pos += 2;
                    return Some(Token::Arrow);
                }
                b':' if next == Some(b':') => {
                    self.pos += 2;
                    return Some(Token::DoubleColon);
                }
                b'\'' | b'"' | b'`' => return Some(self.quoted(c)),
                b'<' if self.starts_with(b"<<<") => return Some(self.heredoc()),
                b'$' if next.is_some_and(is_ident_start) => {
                    let start = self.pos;
                    self.pos += 1;
                    self.take_while(is_ident_char);
                    return Some(Token::Variable(self.slice(start)));
                }
                b'0'..=b'9' => {
                    let start = self.pos;
                    self.take_while(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.');
                    return Some(Token::Literal(self.slice(start)));
                }
                b if is_ident_start(b) || b == b'\\' => {
                    let start = self.pos;
                    self.take_while(|b| is_ident_char(b) || b == b'\\');
                    return Some(Token::Name(self.slice(start)));
                }
                _ => {
                    self.pos += 1;
                    return Some(Token::Punct(c as char));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct RawAttribute {
    name: String,
    args: Vec<AttributeArg>,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    namespace: String,
    /// lower-cased alias -> fully-qualified name
    imports: HashMap<String, String>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            namespace: String::new(),
            imports: HashMap::new(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn run(mut self) -> Result<Option<PhpDeclaration>, String> {
        let mut depth = 0usize;
        let mut decl_depth = 0usize;
        let mut attributes: Vec<RawAttribute> = Vec::new();
        let mut is_abstract = false;
        let mut prev: Option<Token> = None;

        while let Some(tok) = self.bump() {
            let at_decl_level = depth == decl_depth;
            match &tok {
                Token::Punct('{') => {
                    depth += 1;
                    attributes.clear();
                    is_abstract = false;
                }
                Token::Punct('}') => {
                    depth = depth.saturating_sub(1);
                    decl_depth = decl_depth.min(depth);
                }
                Token::Punct(';') => {
                    attributes.clear();
                    is_abstract = false;
                }
                Token::AttrOpen => {
                    let group = self.attribute_group()?;
                    if at_decl_level {
                        attributes.extend(group);
                    }
                }
                Token::Name(word) if at_decl_level && declaration_position(prev.as_ref()) => {
                    let word = word.to_ascii_lowercase();
                    match word.as_str() {
                        "namespace" if depth == 0 => {
                            if self.namespace_clause() {
                                depth += 1;
                                decl_depth = depth;
                            }
                        }
                        "use" => self.use_clause(),
                        "abstract" => is_abstract = true,
                        "final" | "readonly" => {}
                        _ => match TypeKind::from_keyword(&word) {
                            Some(kind) => {
                                if let Some((name, parent)) = self.declaration(kind)? {
                                    let attributes = std::mem::take(&mut attributes)
                                        .into_iter()
                                        .map(|raw| Attribute {
                                            name: self.resolve(&raw.name),
                                            args: raw.args,
                                        })
                                        .collect();
                                    return Ok(Some(PhpDeclaration {
                                        namespace: self.namespace.clone(),
                                        name,
                                        kind,
                                        is_abstract: is_abstract && kind == TypeKind::Class,
                                        parent: parent.map(|p| self.resolve(&p)),
                                        attributes,
                                    }));
                                }
                            }
                            None => {
                                attributes.clear();
                                is_abstract = false;
                            }
                        },
                    }
                }
                _ => {}
            }
            prev = Some(tok);
        }
        Ok(None)
    }

    /// Parses the rest of a `namespace` statement. Returns `true` when it
    /// opened a braced namespace block.
    fn namespace_clause(&mut self) -> bool {
        self.imports.clear();
        match self.peek() {
            Some(Token::Name(name)) => {
                self.namespace = name.trim_start_matches('\\').to_string();
                self.pos += 1;
                if self.peek() == Some(&Token::Punct('{')) {
                    self.pos += 1;
                    return true;
                }
                false
            }
            Some(Token::Punct('{')) => {
                self.namespace.clear();
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn use_clause(&mut self) {
        if self
            .peek()
            .is_some_and(|t| t.is_name("function") || t.is_name("const"))
        {
            while let Some(tok) = self.bump() {
                if tok == Token::Punct(';') {
                    break;
                }
            }
            return;
        }
        if !matches!(self.peek(), Some(Token::Name(_))) {
            return;
        }
        while let Some(Token::Name(name)) = self.bump() {
            if name.ends_with('\\') && self.peek() == Some(&Token::Punct('{')) {
                self.pos += 1;
                loop {
                    match self.bump() {
                        Some(Token::Name(inner)) => {
                            let alias = self.alias();
                            self.import(&format!("{name}{inner}"), alias);
                        }
                        Some(Token::Punct('}')) | None => break,
                        _ => {}
                    }
                }
            } else {
                let alias = self.alias();
                self.import(&name, alias);
            }
            if self.bump() != Some(Token::Punct(',')) {
                break;
            }
        }
    }

    fn alias(&mut self) -> Option<String> {
        if !self.peek().is_some_and(|t| t.is_name("as")) {
            return None;
        }
        self.pos += 1;
        match self.bump() {
            Some(Token::Name(alias)) => Some(alias),
            _ => None,
        }
    }

    fn import(&mut self, full: &str, alias: Option<String>) {
        let full = full.trim_start_matches('\\').to_string();
        let alias = alias.unwrap_or_else(|| full.rsplit('\\').next().unwrap_or(&full).to_string());
        self.imports.insert(alias.to_ascii_lowercase(), full);
    }

    /// Resolve a class reference against the namespace and imports.
    fn resolve(&self, name: &str) -> String {
        if let Some(qualified) = name.strip_prefix('\\') {
            return qualified.to_string();
        }
        let (head, rest) = match name.split_once('\\') {
            Some((head, rest)) => (head, Some(rest)),
            None => (name, None),
        };
        if head.eq_ignore_ascii_case("namespace") {
            return join_namespace(&self.namespace, rest.unwrap_or_default());
        }
        match self.imports.get(&head.to_ascii_lowercase()) {
            Some(full) => match rest {
                Some(rest) => join_namespace(full, rest),
                None => full.clone(),
            },
            None => join_namespace(&self.namespace, name),
        }
    }

    fn declaration(&mut self, kind: TypeKind) -> Result<Option<(String, Option<String>)>, String> {
        let name = match self.peek() {
            Some(Token::Name(name)) if !name.contains('\\') => name.clone(),
            other if kind == TypeKind::Class => {
                return Err(format!(
                    "`class` must be followed by a class name, found {}",
                    describe(other)
                ));
            }
            _ => return Ok(None),
        };
        self.pos += 1;

        let mut parent = None;
        if kind == TypeKind::Class && self.peek().is_some_and(|t| t.is_name("extends")) {
            self.pos += 1;
            match self.bump() {
                Some(Token::Name(p)) => parent = Some(p),
                other => {
                    return Err(format!(
                        "`extends` must be followed by a class name, found {}",
                        describe(other.as_ref())
                    ));
                }
            }
        }
        Ok(Some((name, parent)))
    }

    fn attribute_group(&mut self) -> Result<Vec<RawAttribute>, String> {
        let mut group = Vec::new();
        loop {
            match self.bump() {
                None => return Err("unterminated attribute group".to_string()),
                Some(Token::Punct(']')) => return Ok(group),
                Some(Token::Punct(',')) => {}
                Some(Token::Name(name)) => {
                    let args = if self.peek() == Some(&Token::Punct('(')) {
                        self.pos += 1;
                        self.attribute_args()?
                    } else {
                        Vec::new()
                    };
                    group.push(RawAttribute { name, args });
                }
                Some(other) => {
                    return Err(format!(
                        "unexpected {} in attribute group",
                        describe(Some(&other))
                    ));
                }
            }
        }
    }

    fn attribute_args(&mut self) -> Result<Vec<AttributeArg>, String> {
        let mut args = Vec::new();
        let mut current: Vec<Token> = Vec::new();
        let mut nesting = 0usize;
        loop {
            let tok = self
                .bump()
                .ok_or_else(|| "unterminated attribute arguments".to_string())?;
            match tok {
                Token::Punct('(' | '[' | '{') => {
                    nesting += 1;
                    current.push(tok);
                }
                Token::Punct(')') if nesting == 0 => {
                    if !current.is_empty() {
                        args.push(argument(&current));
                    }
                    return Ok(args);
                }
                Token::Punct(')' | ']' | '}') => {
                    nesting = nesting.saturating_sub(1);
                    current.push(tok);
                }
                Token::Punct(',') if nesting == 0 => {
                    if !current.is_empty() {
                        args.push(argument(&current));
                    }
                    current.clear();
                }
                _ => current.push(tok),
            }
        }
    }
}

/// `class` after `::`, `->`, `new`, `function` or `const` is not a declaration.
fn declaration_position(prev: Option<&Token>) -> bool {
    match prev {
        Some(Token::DoubleColon | Token::Arrow) => false,
        Some(t) => !(t.is_name("new") || t.is_name("function") || t.is_name("const")),
        None => true,
    }
}

fn argument(tokens: &[Token]) -> AttributeArg {
    let text = |toks: &[Token]| toks.iter().map(Token::text).collect::<String>();
    match tokens {
        [Token::Name(name), Token::Punct(':' | '='), rest @ ..] if !name.contains('\\') => {
            AttributeArg {
                name: Some(name.clone()),
                value: text(rest),
            }
        }
        _ => AttributeArg {
            name: None,
            value: text(tokens),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(src: &str) -> PhpDeclaration {
        scan_declaration(src).unwrap().expect("declaration")
    }

    #[test]
    fn test_model_with_imported_parent() {
        let decl = scan(
            r#"<?php

namespace App\Models;

use Illuminate\Database\Eloquent\Factories\HasFactory;
use Illuminate\Database\Eloquent\Model;

class Post extends Model
{
    use HasFactory;

    protected $fillable = ['title'];
}
"#,
        );
        assert_eq!(decl.fqn(), "App\\Models\\Post");
        assert_eq!(decl.kind, TypeKind::Class);
        assert!(!decl.is_abstract);
        assert_eq!(decl.parent.as_deref(), Some("Illuminate\\Database\\Eloquent\\Model"));
        assert!(decl.attributes.is_empty());
    }

    #[test]
    fn test_aliased_parent_and_abstract() {
        let decl = scan(
            "<?php\nnamespace App\\Models;\nuse Illuminate\\Foundation\\Auth\\User as Authenticatable;\n\
             abstract class Account extends Authenticatable {}\n",
        );
        assert!(decl.is_abstract);
        assert_eq!(decl.parent.as_deref(), Some("Illuminate\\Foundation\\Auth\\User"));
    }

    #[test]
    fn test_unqualified_parent_resolves_in_namespace() {
        let decl = scan("<?php namespace App\\Models; final class User extends BaseEntity {}");
        assert_eq!(decl.parent.as_deref(), Some("App\\Models\\BaseEntity"));
        let decl = scan("<?php namespace App; class User extends \\Vendor\\Model {}");
        assert_eq!(decl.parent.as_deref(), Some("Vendor\\Model"));
    }

    #[test]
    fn test_group_use_and_partial_qualification() {
        let decl = scan(
            "<?php namespace App\\Models;\nuse Illuminate\\Database\\{Eloquent, Query as Q};\n\
             class Tag extends Eloquent\\Model {}",
        );
        assert_eq!(decl.parent.as_deref(), Some("Illuminate\\Database\\Eloquent\\Model"));
    }

    #[test]
    fn test_attributes_are_collected_and_resolved() {
        let decl = scan(
            "<?php\nnamespace App\\Models;\nuse App\\Attributes\\Repository;\n\
             #[Repository(enable: false), \\Other\\Marker]\n#[Table('users')]\nclass Audit extends Model {}",
        );
        assert_eq!(decl.attributes.len(), 3);
        let repo = &decl.attributes[0];
        assert_eq!(repo.name, "App\\Attributes\\Repository");
        assert_eq!(repo.short_name(), "Repository");
        assert_eq!(repo.arg("enable", 0), Some("false"));
        assert_eq!(decl.attributes[1].name, "Other\\Marker");
        assert_eq!(decl.attributes[2].arg("table", 0), Some("'users'"));
    }

    #[test]
    fn test_docblocks_and_strings_are_ignored() {
        let decl = scan(
            "<?php\nnamespace App;\n/**\n * class Fake extends Nothing\n * @Repository(enable=false)\n */\n\
             $x = 'class Quoted extends X';\n// class Commented\n# class Hashed\nclass Real {}",
        );
        assert_eq!(decl.name, "Real");
        assert!(decl.attributes.is_empty());
        assert_eq!(decl.parent, None);
    }

    #[test]
    fn test_heredoc_is_skipped() {
        let decl = scan(
            "<?php\n$sql = <<<SQL\n  class Nope extends Bad\n  SQL;\nclass Yes {}",
        );
        assert_eq!(decl.name, "Yes");
    }

    #[test]
    fn test_class_constant_and_anonymous_class_are_not_declarations() {
        let src = "<?php\nreturn [\n  'model' => App\\Models\\User::class,\n  'x' => new class {},\n];\n";
        assert_eq!(scan_declaration(src).unwrap(), None);
    }

    #[test]
    fn test_interfaces_traits_enums() {
        assert_eq!(scan("<?php interface Shape {}").kind, TypeKind::Interface);
        assert_eq!(scan("<?php trait Greets {}").kind, TypeKind::Trait);
        let e = scan("<?php namespace App\\Enums; enum Status: string { case A = 'a'; }");
        assert_eq!(e.kind, TypeKind::Enum);
        assert_eq!(e.fqn(), "App\\Enums\\Status");
    }

    #[test]
    fn test_braced_namespace() {
        let decl = scan("<?php namespace App\\Models {\n use Foo\\Model;\n class Item extends Model {}\n}");
        assert_eq!(decl.fqn(), "App\\Models\\Item");
        assert_eq!(decl.parent.as_deref(), Some("Foo\\Model"));
    }

    #[test]
    fn test_inline_html_before_open_tag() {
        let decl = scan("#!/usr/bin/env php\n<html><?php class Page {} ?></html>");
        assert_eq!(decl.name, "Page");
    }

    #[test]
    fn test_no_declaration_in_plain_script() {
        let src = "<?php\nfunction helper() { return 1; }\n$f = function () use ($x) { return $x; };\n";
        assert_eq!(scan_declaration(src).unwrap(), None);
    }

    #[test]
    fn test_malformed_headers_are_errors() {
        let err = scan_declaration("<?php class Broken extends {}").unwrap_err();
        assert!(err.contains("extends"), "{err}");
        let err = scan_declaration("<?php class {}").unwrap_err();
        assert!(err.contains("class name"), "{err}");
        assert!(scan_declaration("<?php #[Repository(enable: false)\nclass A {}").is_err());
        let err = scan_declaration("<?php #[Repository(enable: false)").unwrap_err();
        assert!(err.contains("unterminated"), "{err}");
    }
}
