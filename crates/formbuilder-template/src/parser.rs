//! Block parser.
//!
//! Builds a [`Node`] tree from a token stream, pairing `{name}...{/name}`
//! only for the block names the caller asks for. All other tags stay as
//! single [`Node::Tag`]s. An opening tag that is never closed, or a closing
//! tag with no opener, is left as a plain tag, so unbalanced input
//! serializes back to exactly what was written.

use crate::lexer::{TagToken, Token};

/// A node in the parsed template tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal text.
    Text(String),
    /// A tag that is not part of a recognized block.
    Tag(TagToken),
    /// A recognized `{open}...{/close}` block.
    Block {
        /// The opening tag.
        open: TagToken,
        /// The nodes between the delimiters.
        children: Vec<Node>,
        /// The closing tag.
        close: TagToken,
    },
}

impl Node {
    /// Returns the template source this node was parsed from.
    pub fn source(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }

    fn write_source(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Tag(tag) => out.push_str(&tag.raw),
            Self::Block {
                open,
                children,
                close,
            } => {
                out.push_str(&open.raw);
                for child in children {
                    child.write_source(out);
                }
                out.push_str(&close.raw);
            }
        }
    }
}

struct Frame {
    open: TagToken,
    children: Vec<Node>,
}

/// Parses tokens into a tree, recognizing only the named blocks.
///
/// Block names match case-insensitively. A closing tag closes the innermost
/// open block of the same name; blocks opened inside it but never closed
/// are flattened back into plain tags.
///
/// # Examples
///
/// ```
/// use formbuilder_template::lexer::tokenize;
/// use formbuilder_template::parser::{parse, Node};
///
/// let nodes = parse(tokenize("a{rowLoop}{field name=\"x\"}{/rowLoop}b"), &["rowLoop"]);
/// assert_eq!(nodes.len(), 3);
/// assert!(matches!(&nodes[1], Node::Block { open, .. } if open.is("rowloop")));
/// ```
pub fn parse(tokens: Vec<Token>, block_names: &[&str]) -> Vec<Node> {
    let is_block = |tag: &TagToken| block_names.iter().any(|name| tag.is(name));

    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for token in tokens {
        match token {
            Token::Text(text) => push(&mut stack, &mut root, Node::Text(text)),
            Token::Tag(tag) if is_block(&tag) && !tag.closing => stack.push(Frame {
                open: tag,
                children: Vec::new(),
            }),
            Token::Tag(tag) if is_block(&tag) => {
                match stack.iter().rposition(|f| f.open.is(&tag.name)) {
                    Some(idx) => {
                        while stack.len() > idx + 1 {
                            if let Some(unclosed) = stack.pop() {
                                flatten(&mut stack, &mut root, unclosed);
                            }
                        }
                        if let Some(frame) = stack.pop() {
                            let block = Node::Block {
                                open: frame.open,
                                children: frame.children,
                                close: tag,
                            };
                            push(&mut stack, &mut root, block);
                        }
                    }
                    None => push(&mut stack, &mut root, Node::Tag(tag)),
                }
            }
            Token::Tag(tag) => push(&mut stack, &mut root, Node::Tag(tag)),
        }
    }

    while let Some(unclosed) = stack.pop() {
        flatten(&mut stack, &mut root, unclosed);
    }
    root
}

fn push(stack: &mut [Frame], root: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(frame) => frame.children.push(node),
        None => root.push(node),
    }
}

fn flatten(stack: &mut [Frame], root: &mut Vec<Node>, frame: Frame) {
    push(stack, root, Node::Tag(frame.open));
    for child in frame.children {
        push(stack, root, child);
    }
}

/// Serializes nodes back to template text.
pub fn to_source(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_source(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_str(src: &str, names: &[&str]) -> Vec<Node> {
        parse(tokenize(src), names)
    }

    #[test]
    fn test_unrequested_blocks_stay_flat() {
        let nodes = parse_str("{form}{fieldsLoop}x{/fieldsLoop}{/form}", &["form"]);
        assert_eq!(nodes.len(), 1);
        match &nodes[0] {
            Node::Block { children, .. } => {
                assert_eq!(children.len(), 3);
                assert!(matches!(&children[0], Node::Tag(t) if t.is_open("fieldsLoop")));
            }
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_blocks() {
        let nodes = parse_str(
            "{ifExpandable}a{noShowExpandable}b{/noShowExpandable}{/ifExpandable}",
            &["ifExpandable", "noShowExpandable"],
        );
        let Node::Block { children, .. } = &nodes[0] else {
            panic!("expected block");
        };
        assert!(matches!(&children[1], Node::Block { open, .. } if open.is("noshowexpandable")));
    }

    #[test]
    fn test_unclosed_block_is_flattened() {
        let src = "a{rowLoop}b{field}c";
        let nodes = parse_str(src, &["rowLoop"]);
        assert!(nodes.iter().all(|n| !matches!(n, Node::Block { .. })));
        assert_eq!(to_source(&nodes), src);
    }

    #[test]
    fn test_stray_close_is_a_tag() {
        let src = "x{/form}y";
        let nodes = parse_str(src, &["form"]);
        assert!(matches!(&nodes[1], Node::Tag(t) if t.is_close("form")));
        assert_eq!(to_source(&nodes), src);
    }

    #[test]
    fn test_close_unwinds_unclosed_inner_block() {
        let src = "{form}{fieldsLoop}x{/form}";
        let nodes = parse_str(src, &["form", "fieldsLoop"]);
        assert_eq!(nodes.len(), 1);
        let Node::Block { children, .. } = &nodes[0] else {
            panic!("expected block");
        };
        assert!(matches!(&children[0], Node::Tag(t) if t.is_open("fieldsloop")));
        assert_eq!(to_source(&nodes), src);
    }

    #[test]
    fn test_case_insensitive_pairing() {
        let nodes = parse_str("{FORM}x{/Form}", &["form"]);
        assert!(matches!(&nodes[0], Node::Block { .. }));
        assert_eq!(nodes[0].source(), "{FORM}x{/Form}");
    }
}
