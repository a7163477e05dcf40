use roxmltree::{Document, Node, ParsingOptions};
use std::io;
use std::str::Utf8Error;
use thiserror::Error;

/// Namespace of the Microsoft Project XML interchange format.
pub const PROJECT_NAMESPACE: &str = "http://schemas.microsoft.com/project";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("document is not valid UTF-8: {0}")]
    Encoding(#[from] Utf8Error),
    #[error("malformed xml: {0}")]
    MalformedXml(#[from] roxmltree::Error),
    #[error("root element is not a project in namespace {PROJECT_NAMESPACE}")]
    MissingRoot,
}

pub type ParseResult<T> = Result<T, ParseError>;

/// A parsed schedule export. Borrows the source text for the lifetime of one
/// audit call.
pub struct ScheduleDocument<'input> {
    tree: Document<'input>,
}

impl<'input> ScheduleDocument<'input> {
    pub fn parse(text: &'input str) -> ParseResult<Self> {
        let options = ParsingOptions {
            allow_dtd: false,
            ..ParsingOptions::default()
        };
        let tree = Document::parse_with_options(text, options)?;
        if tree.root_element().tag_name().namespace() != Some(PROJECT_NAMESPACE) {
            return Err(ParseError::MissingRoot);
        }
        Ok(Self { tree })
    }

    /// Decodes raw upload bytes, tolerating a UTF-8 byte order mark.
    pub fn decode(bytes: &[u8]) -> ParseResult<&str> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        Ok(std::str::from_utf8(bytes)?)
    }

    pub fn root(&self) -> Node<'_, 'input> {
        self.tree.root_element()
    }

    /// All namespaced elements named `tag` anywhere in the document, in
    /// document order.
    pub fn descendants<'a>(&'a self, tag: &str) -> impl Iterator<Item = Node<'a, 'input>> {
        self.root()
            .descendants()
            .filter(move |node| is_project_element(node, tag))
    }

    /// Text of the first namespaced `tag` element in document order.
    pub fn first_text(&self, tag: &str) -> Option<&str> {
        self.descendants(tag).next().map(|node| node.text().unwrap_or(""))
    }
}

pub(crate) fn is_project_element(node: &Node<'_, '_>, tag: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == tag
        && node.tag_name().namespace() == Some(PROJECT_NAMESPACE)
}

/// Direct child element `tag` of `node`, if present.
pub(crate) fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| is_project_element(c, tag))
}

/// Trimmed text of the direct child `tag`. An element with no text yields
/// an empty string.
pub(crate) fn child_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    child(node, tag).map(|c| c.text().unwrap_or("").trim())
}
