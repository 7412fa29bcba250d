//! DTD declaration parsing.
//!
//! Supports `<!ELEMENT>` and `<!ATTLIST>` declarations, internal parameter
//! entities, comments and processing instructions. General entities and
//! notations are read and ignored. Conditional sections are rejected.

use std::collections::HashMap;

/// Maximum nesting of parameter-entity expansion.
const MAX_ENTITY_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    Once,
    Optional,
    ZeroOrMore,
    OneOrMore,
}

impl Occurrence {
    fn suffix(self) -> &'static str {
        match self {
            Self::Once => "",
            Self::Optional => "?",
            Self::ZeroOrMore => "*",
            Self::OneOrMore => "+",
        }
    }
}

/// A content particle of an element-only content model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Particle {
    Name(String, Occurrence),
    Seq(Vec<Particle>, Occurrence),
    Choice(Vec<Particle>, Occurrence),
}

impl Particle {
    pub fn occurrence(&self) -> Occurrence {
        match self {
            Self::Name(_, occurrence) | Self::Seq(_, occurrence) | Self::Choice(_, occurrence) => {
                *occurrence
            }
        }
    }

    /// DTD notation of the particle, e.g. `(StudentID,Grade?)`.
    pub fn notation(&self) -> String {
        match self {
            Self::Name(name, occurrence) => format!("{name}{}", occurrence.suffix()),
            Self::Seq(items, occurrence) => group_notation(items, ",", *occurrence),
            Self::Choice(items, occurrence) => group_notation(items, "|", *occurrence),
        }
    }
}

fn group_notation(items: &[Particle], separator: &str, occurrence: Occurrence) -> String {
    let inner: Vec<String> = items.iter().map(Particle::notation).collect();
    format!("({}){}", inner.join(separator), occurrence.suffix())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSpec {
    Empty,
    Any,
    /// `(#PCDATA | a | b)*`; an empty list means text only.
    Mixed(Vec<String>),
    Children(Particle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeType {
    CData,
    Id,
    IdRef,
    IdRefs,
    Entity,
    Entities,
    NmToken,
    NmTokens,
    Notation(Vec<String>),
    Enumeration(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultDecl {
    Required,
    Implied,
    Fixed(String),
    Value(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDecl {
    pub name: String,
    pub kind: AttributeType,
    pub default: DefaultDecl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDecl {
    pub name: String,
    pub content: ContentSpec,
}

/// Declarations collected from one DTD.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    pub elements: HashMap<String, ElementDecl>,
    pub attributes: HashMap<String, Vec<AttributeDecl>>,
}

impl Grammar {
    pub fn element(&self, name: &str) -> Option<&ElementDecl> {
        self.elements.get(name)
    }

    pub fn attributes_of(&self, element: &str) -> &[AttributeDecl] {
        self.attributes.get(element).map(Vec::as_slice).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: u32,
    pub message: String,
}

/// Parse the text of a DTD.
pub fn parse_grammar(text: &str) -> Result<Grammar, SyntaxError> {
    let mut parser = GrammarParser::default();
    parser.parse_text(text, None, 0)?;
    Ok(parser.grammar)
}

#[derive(Default)]
struct GrammarParser {
    grammar: Grammar,
    entities: HashMap<String, String>,
}

impl GrammarParser {
    /// `fixed_line` is set for text coming from a parameter entity, whose
    /// declarations are reported at the line of the reference.
    fn parse_text(
        &mut self,
        text: &str,
        fixed_line: Option<u32>,
        depth: usize,
    ) -> Result<(), SyntaxError> {
        let line_at = |pos: usize| -> u32 {
            fixed_line.unwrap_or_else(|| {
                let newlines = text[..pos].bytes().filter(|byte| *byte == b'\n').count();
                u32::try_from(newlines + 1).unwrap_or(u32::MAX)
            })
        };
        let error = |pos: usize, message: String| SyntaxError {
            line: line_at(pos),
            message,
        };

        let mut pos = 0;
        loop {
            pos += text[pos..].len() - text[pos..].trim_start().len();
            let rest = &text[pos..];
            if rest.is_empty() {
                break;
            }
            if rest.starts_with("<!--") {
                let end = rest[4..]
                    .find("-->")
                    .ok_or_else(|| error(pos, "unterminated comment".into()))?;
                pos += 4 + end + 3;
            } else if rest.starts_with("<?") {
                let end = rest
                    .find("?>")
                    .ok_or_else(|| error(pos, "unterminated processing instruction".into()))?;
                pos += end + 2;
            } else if rest.starts_with("<![") {
                return Err(error(pos, "conditional sections are not supported".into()));
            } else if rest.starts_with("<!") {
                let end = declaration_end(rest)
                    .ok_or_else(|| error(pos, "unterminated declaration".into()))?;
                self.declaration(&rest[2..end], line_at(pos), depth)?;
                pos += end + 1;
            } else if let Some(reference) = rest.strip_prefix('%') {
                let semi = reference
                    .find(';')
                    .ok_or_else(|| error(pos, "unterminated parameter-entity reference".into()))?;
                let name = &reference[..semi];
                let replacement = self.entity(name, depth).map_err(|message| error(pos, message))?;
                self.parse_text(&replacement, Some(line_at(pos)), depth + 1)?;
                pos += 1 + semi + 1;
            } else {
                let snippet: String = rest.chars().take(20).collect();
                return Err(error(pos, format!("unexpected content '{snippet}'")));
            }
        }
        Ok(())
    }

    fn entity(&self, name: &str, depth: usize) -> Result<String, String> {
        if depth >= MAX_ENTITY_DEPTH {
            return Err(format!("parameter entity '%{name};' nests too deeply"));
        }
        self.entities
            .get(name)
            .cloned()
            .ok_or_else(|| format!("undeclared parameter entity '%{name};'"))
    }

    fn declaration(&mut self, body: &str, line: u32, depth: usize) -> Result<(), SyntaxError> {
        let error = |message: String| SyntaxError { line, message };
        let keyword_len = body
            .find(|ch: char| !ch.is_ascii_alphabetic())
            .unwrap_or(body.len());
        let (keyword, rest) = body.split_at(keyword_len);
        match keyword {
            "ELEMENT" => {
                let expanded = self.expand(rest, depth, true).map_err(error)?;
                let decl = parse_element(&expanded).map_err(error)?;
                if self.grammar.elements.contains_key(&decl.name) {
                    return Err(error(format!(
                        "element '{}' is declared more than once",
                        decl.name
                    )));
                }
                self.grammar.elements.insert(decl.name.clone(), decl);
            }
            "ATTLIST" => {
                let expanded = self.expand(rest, depth, true).map_err(error)?;
                let (element, decls) = parse_attlist(&expanded).map_err(error)?;
                let known = self.grammar.attributes.entry(element).or_default();
                for decl in decls {
                    // The first declaration of an attribute is binding.
                    if !known.iter().any(|existing| existing.name == decl.name) {
                        known.push(decl);
                    }
                }
            }
            "ENTITY" => self.entity_declaration(rest, depth).map_err(error)?,
            "NOTATION" => {}
            other => return Err(error(format!("unknown declaration '<!{other}'"))),
        }
        Ok(())
    }

    fn entity_declaration(&mut self, rest: &str, depth: usize) -> Result<(), String> {
        let rest = rest.trim_start();
        let Some(parameter) = rest.strip_prefix('%') else {
            // General entities do not affect validation of generated documents.
            return Ok(());
        };
        let tokens = tokenize(parameter)?;
        let mut tokens = Tokens::new(tokens);
        let name = tokens.expect_name("parameter entity name")?;
        match tokens.advance() {
            Some(Token::Literal(value)) => {
                let value = self.expand(&value, depth, false)?;
                self.entities.entry(name).or_insert(value);
            }
            Some(Token::Name(keyword)) if keyword == "SYSTEM" || keyword == "PUBLIC" => {
                tracing::debug!(entity = %name, "skipping external parameter entity");
            }
            _ => return Err(format!("malformed parameter entity '{name}'")),
        }
        Ok(())
    }

    /// Replace `%name;` references. Inside declarations, references within
    /// quoted literals are left alone.
    fn expand(&self, text: &str, depth: usize, in_declaration: bool) -> Result<String, String> {
        let mut out = String::with_capacity(text.len());
        let mut quote: Option<char> = None;
        let mut chars = text.char_indices().peekable();
        while let Some((idx, ch)) = chars.next() {
            if in_declaration {
                match quote {
                    Some(open) if ch == open => quote = None,
                    None if ch == '"' || ch == '\'' => quote = Some(ch),
                    _ => {}
                }
            }
            if ch != '%' || quote.is_some() {
                out.push(ch);
                continue;
            }
            let after = &text[idx + 1..];
            let name_len = after.find(|c: char| !is_name_char(c)).unwrap_or(after.len());
            if name_len == 0 || !after[name_len..].starts_with(';') {
                out.push(ch);
                continue;
            }
            let name = &after[..name_len];
            let replacement = self.entity(name, depth)?;
            let replacement = self.expand(&replacement, depth + 1, in_declaration)?;
            if in_declaration {
                out.push(' ');
                out.push_str(&replacement);
                out.push(' ');
            } else {
                out.push_str(&replacement);
            }
            let resume = idx + 1 + name_len + 1;
            while chars.next_if(|(next, _)| *next < resume).is_some() {}
        }
        Ok(out)
    }
}

/// Index of the `>` closing a declaration, skipping quoted literals.
fn declaration_end(text: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (idx, ch) in text.char_indices() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == '>' => return Some(idx),
            None => {}
        }
    }
    None
}

fn parse_element(body: &str) -> Result<ElementDecl, String> {
    let mut tokens = Tokens::new(tokenize(body)?);
    let name = tokens.expect_name("element name")?;
    let content = match tokens.advance() {
        Some(Token::Name(keyword)) if keyword == "EMPTY" => ContentSpec::Empty,
        Some(Token::Name(keyword)) if keyword == "ANY" => ContentSpec::Any,
        Some(Token::Punct('(')) => {
            if tokens.peek() == Some(&Token::Keyword("#PCDATA".into())) {
                tokens.advance();
                parse_mixed(&mut tokens)?
            } else {
                ContentSpec::Children(parse_group(&mut tokens)?)
            }
        }
        Some(other) => return Err(format!("element '{name}': unexpected {other}")),
        None => return Err(format!("element '{name}': missing content model")),
    };
    tokens.finish(&name)?;
    Ok(ElementDecl { name, content })
}

/// After `( #PCDATA`.
fn parse_mixed(tokens: &mut Tokens) -> Result<ContentSpec, String> {
    let mut names = Vec::new();
    loop {
        match tokens.advance() {
            Some(Token::Punct('|')) => names.push(tokens.expect_name("element name")?),
            Some(Token::Punct(')')) => break,
            Some(other) => return Err(format!("mixed content: unexpected {other}")),
            None => return Err("mixed content: missing ')'".into()),
        }
    }
    let starred = tokens.eat_punct('*');
    if !names.is_empty() && !starred {
        return Err("mixed content with element names must end with ')*'".into());
    }
    Ok(ContentSpec::Mixed(names))
}

/// After `(`.
fn parse_group(tokens: &mut Tokens) -> Result<Particle, String> {
    let mut items = vec![parse_particle(tokens)?];
    let mut separator: Option<char> = None;
    loop {
        match tokens.advance() {
            Some(Token::Punct(')')) => break,
            Some(Token::Punct(sep @ ('|' | ','))) => {
                if separator.is_some_and(|known| known != sep) {
                    return Err("cannot mix ',' and '|' in one group".into());
                }
                separator = Some(sep);
                items.push(parse_particle(tokens)?);
            }
            Some(other) => return Err(format!("content model: unexpected {other}")),
            None => return Err("content model: missing ')'".into()),
        }
    }
    let occurrence = parse_occurrence(tokens);
    Ok(match separator {
        Some('|') => Particle::Choice(items, occurrence),
        _ => Particle::Seq(items, occurrence),
    })
}

fn parse_particle(tokens: &mut Tokens) -> Result<Particle, String> {
    match tokens.advance() {
        Some(Token::Name(name)) => Ok(Particle::Name(name, parse_occurrence(tokens))),
        Some(Token::Punct('(')) => parse_group(tokens),
        Some(other) => Err(format!("content model: unexpected {other}")),
        None => Err("content model: unexpected end".into()),
    }
}

fn parse_occurrence(tokens: &mut Tokens) -> Occurrence {
    if tokens.eat_punct('?') {
        Occurrence::Optional
    } else if tokens.eat_punct('*') {
        Occurrence::ZeroOrMore
    } else if tokens.eat_punct('+') {
        Occurrence::OneOrMore
    } else {
        Occurrence::Once
    }
}

fn parse_attlist(body: &str) -> Result<(String, Vec<AttributeDecl>), String> {
    let mut tokens = Tokens::new(tokenize(body)?);
    let element = tokens.expect_name("element name")?;
    let mut decls = Vec::new();
    while tokens.peek().is_some() {
        let name = tokens.expect_name("attribute name")?;
        let kind = match tokens.advance() {
            Some(Token::Name(keyword)) => match keyword.as_str() {
                "CDATA" => AttributeType::CData,
                "ID" => AttributeType::Id,
                "IDREF" => AttributeType::IdRef,
                "IDREFS" => AttributeType::IdRefs,
                "ENTITY" => AttributeType::Entity,
                "ENTITIES" => AttributeType::Entities,
                "NMTOKEN" => AttributeType::NmToken,
                "NMTOKENS" => AttributeType::NmTokens,
                "NOTATION" => {
                    if !tokens.eat_punct('(') {
                        return Err(format!("attribute '{name}': NOTATION needs a name list"));
                    }
                    AttributeType::Notation(parse_name_list(&mut tokens)?)
                }
                other => return Err(format!("attribute '{name}': unknown type '{other}'")),
            },
            Some(Token::Punct('(')) => AttributeType::Enumeration(parse_name_list(&mut tokens)?),
            Some(other) => return Err(format!("attribute '{name}': unexpected {other}")),
            None => return Err(format!("attribute '{name}': missing type")),
        };
        let default = match tokens.advance() {
            Some(Token::Keyword(keyword)) => match keyword.as_str() {
                "#REQUIRED" => DefaultDecl::Required,
                "#IMPLIED" => DefaultDecl::Implied,
                "#FIXED" => match tokens.advance() {
                    Some(Token::Literal(value)) => DefaultDecl::Fixed(value),
                    _ => return Err(format!("attribute '{name}': #FIXED needs a value")),
                },
                other => return Err(format!("attribute '{name}': unknown default '{other}'")),
            },
            Some(Token::Literal(value)) => DefaultDecl::Value(value),
            Some(other) => return Err(format!("attribute '{name}': unexpected {other}")),
            None => return Err(format!("attribute '{name}': missing default")),
        };
        decls.push(AttributeDecl {
            name,
            kind,
            default,
        });
    }
    Ok((element, decls))
}

/// After `(` of an enumeration: `a | b | c )`.
fn parse_name_list(tokens: &mut Tokens) -> Result<Vec<String>, String> {
    let mut names = vec![tokens.expect_name("enumeration value")?];
    loop {
        match tokens.advance() {
            Some(Token::Punct('|')) => names.push(tokens.expect_name("enumeration value")?),
            Some(Token::Punct(')')) => return Ok(names),
            Some(other) => return Err(format!("enumeration: unexpected {other}")),
            None => return Err("enumeration: missing ')'".into()),
        }
    }
}

pub(crate) fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.' | ':' | '\u{B7}')
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Name(String),
    /// `#PCDATA`, `#REQUIRED`, ...
    Keyword(String),
    Literal(String),
    Punct(char),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "'{name}'"),
            Self::Keyword(keyword) => write!(f, "'{keyword}'"),
            Self::Literal(value) => write!(f, "literal \"{value}\""),
            Self::Punct(ch) => write!(f, "'{ch}'"),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
        } else if matches!(ch, '(' | ')' | '|' | ',' | '?' | '*' | '+') {
            chars.next();
            tokens.push(Token::Punct(ch));
        } else if ch == '"' || ch == '\'' {
            chars.next();
            let mut value = String::new();
            loop {
                match chars.next() {
                    Some(c) if c == ch => break,
                    Some(c) => value.push(c),
                    None => return Err("unterminated literal".into()),
                }
            }
            tokens.push(Token::Literal(value));
        } else if ch == '#' || is_name_char(ch) {
            let mut word = String::new();
            word.push(ch);
            chars.next();
            while let Some(&c) = chars.peek() {
                if !is_name_char(c) {
                    break;
                }
                word.push(c);
                chars.next();
            }
            if ch == '#' {
                tokens.push(Token::Keyword(word));
            } else {
                tokens.push(Token::Name(word));
            }
        } else {
            return Err(format!("unexpected character '{ch}'"));
        }
    }
    Ok(tokens)
}

struct Tokens {
    items: std::vec::IntoIter<Token>,
    peeked: Option<Token>,
}

impl Tokens {
    fn new(tokens: Vec<Token>) -> Self {
        let mut items = tokens.into_iter();
        let peeked = items.next();
        Self { items, peeked }
    }

    fn peek(&self) -> Option<&Token> {
        self.peeked.as_ref()
    }

    fn advance(&mut self) -> Option<Token> {
        std::mem::replace(&mut self.peeked, self.items.next())
    }

    fn eat_punct(&mut self, punct: char) -> bool {
        if self.peeked == Some(Token::Punct(punct)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_name(&mut self, what: &str) -> Result<String, String> {
        match self.advance() {
            Some(Token::Name(name)) => Ok(name),
            Some(other) => Err(format!("expected {what}, found {other}")),
            None => Err(format!("expected {what}")),
        }
    }

    fn finish(&mut self, element: &str) -> Result<(), String> {
        match self.advance() {
            None => Ok(()),
            Some(extra) => Err(format!("element '{element}': unexpected {extra}")),
        }
    }
}
