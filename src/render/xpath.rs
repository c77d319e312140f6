//! Minimal XPath evaluation over parsed HTML
//!
//! Course configurations sometimes carry XPath content selectors instead of
//! CSS. This module evaluates the subset those configurations actually use:
//! absolute location paths (`/html/body/div`), the descendant axis (`//p`),
//! wildcard steps (`*`), numeric predicates (`li[2]`, 1-based, applied per
//! context node), and a trailing `text()` step. Anything else is rejected at
//! parse time so a typo fails the page instead of silently matching nothing.

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node};
use std::collections::HashSet;
use thiserror::Error;

/// Error parsing an XPath expression
#[derive(Error, Debug)]
pub enum XPathError {
    #[error("cannot parse XPath {expression:?}: {message}")]
    Parse { expression: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug)]
struct Step {
    axis: Axis,
    /// Element name to match; None matches any element (`*`)
    name: Option<String>,
    /// 1-based position among this step's matches within one context node
    index: Option<usize>,
}

/// Evaluates an XPath expression, returning matched elements in document order
pub fn select<'a>(document: &'a Html, expression: &str) -> Result<Vec<ElementRef<'a>>, XPathError> {
    let steps = parse(expression)?;

    let mut current: Vec<NodeRef<'a, Node>> = vec![document.tree.root()];

    for step in &steps {
        let mut next: Vec<NodeRef<'a, Node>> = Vec::new();

        for node in &current {
            let matches: Vec<NodeRef<'a, Node>> = match step.axis {
                Axis::Child => node
                    .children()
                    .filter(|child| element_matches(child, step.name.as_deref()))
                    .collect(),
                Axis::Descendant => node
                    .descendants()
                    .skip(1)
                    .filter(|descendant| element_matches(descendant, step.name.as_deref()))
                    .collect(),
            };

            match step.index {
                Some(position) => {
                    if let Some(matched) = matches.get(position - 1) {
                        next.push(*matched);
                    }
                }
                None => next.extend(matches),
            }
        }

        // Overlapping descendant contexts can yield the same node twice
        let mut seen = HashSet::new();
        next.retain(|node| seen.insert(node.id()));

        current = next;
        if current.is_empty() {
            break;
        }
    }

    Ok(current.into_iter().filter_map(ElementRef::wrap).collect())
}

fn element_matches(node: &NodeRef<'_, Node>, name: Option<&str>) -> bool {
    match node.value().as_element() {
        Some(element) => name.map_or(true, |n| element.name() == n),
        None => false,
    }
}

fn parse(expression: &str) -> Result<Vec<Step>, XPathError> {
    let error = |message: &str| XPathError::Parse {
        expression: expression.to_string(),
        message: message.to_string(),
    };

    if !expression.starts_with('/') {
        return Err(error("only absolute paths are supported"));
    }

    let segments: Vec<&str> = expression.split('/').collect();
    let mut steps = Vec::new();
    let mut descendant_pending = false;

    // segments[0] is the empty string before the leading slash
    for (position, segment) in segments.iter().enumerate().skip(1) {
        if segment.is_empty() {
            if descendant_pending {
                return Err(error("empty step"));
            }
            descendant_pending = true;
            continue;
        }

        if *segment == "text()" {
            if position + 1 != segments.len() {
                return Err(error("text() is only supported as the final step"));
            }
            // Node selection is unchanged; the caller reads text anyway
            break;
        }

        let axis = if descendant_pending {
            Axis::Descendant
        } else {
            Axis::Child
        };
        descendant_pending = false;

        steps.push(parse_step(segment, axis).ok_or_else(|| {
            error("steps must be an element name or * with an optional numeric predicate")
        })?);
    }

    if descendant_pending {
        return Err(error("expression ends with a path separator"));
    }
    if steps.is_empty() {
        return Err(error("no steps"));
    }

    Ok(steps)
}

fn parse_step(segment: &str, axis: Axis) -> Option<Step> {
    let (name_part, index) = match segment.find('[') {
        Some(open) => {
            let predicate = &segment[open..];
            if !predicate.ends_with(']') {
                return None;
            }
            let position: usize = predicate[1..predicate.len() - 1].parse().ok()?;
            if position == 0 {
                return None;
            }
            (&segment[..open], Some(position))
        }
        None => (segment, None),
    };

    let name = match name_part {
        "*" => None,
        "" => return None,
        n => {
            if !n
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return None;
            }
            Some(n.to_ascii_lowercase())
        }
    };

    Some(Step { axis, name, index })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(element: ElementRef<'_>) -> String {
        element.text().collect::<String>().trim().to_string()
    }

    #[test]
    fn test_absolute_path() {
        let document = Html::parse_document(
            "<html><body><div><p>first</p></div><p>second</p></body></html>",
        );
        let nodes = select(&document, "/html/body/p").unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(text_of(nodes[0]), "second");
    }

    #[test]
    fn test_descendant_axis_from_root() {
        let document = Html::parse_document(
            "<html><body><div><p>first</p></div><p>second</p></body></html>",
        );
        let nodes = select(&document, "//p").unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_descendant_axis_mid_path() {
        let document = Html::parse_document(
            "<html><body><div><section><span>deep</span></section></div><span>shallow</span></body></html>",
        );
        let nodes = select(&document, "/html/body/div//span").unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(text_of(nodes[0]), "deep");
    }

    #[test]
    fn test_numeric_predicate_is_per_context() {
        let document = Html::parse_document(
            "<html><body>\
             <ul><li>a1</li><li>a2</li></ul>\
             <ul><li>b1</li><li>b2</li></ul>\
             </body></html>",
        );
        let nodes = select(&document, "/html/body/ul/li[2]").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(text_of(nodes[0]), "a2");
        assert_eq!(text_of(nodes[1]), "b2");
    }

    #[test]
    fn test_wildcard_step() {
        let document =
            Html::parse_document("<html><body><div>one</div><p>two</p></body></html>");
        let nodes = select(&document, "/html/body/*").unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_trailing_text_step() {
        let document = Html::parse_document("<html><body><h1>Title</h1></body></html>");
        let nodes = select(&document, "//h1/text()").unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(text_of(nodes[0]), "Title");
    }

    #[test]
    fn test_nested_descendants_deduplicated() {
        let document = Html::parse_document(
            "<html><body><div><div><p>once</p></div></div></body></html>",
        );
        let nodes = select(&document, "//div//p").unwrap();
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let document = Html::parse_document("<html><body><p>text</p></body></html>");
        let nodes = select(&document, "/html/body/article").unwrap();
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_relative_path_rejected() {
        let document = Html::parse_document("<html><body></body></html>");
        assert!(select(&document, "body/p").is_err());
    }

    #[test]
    fn test_function_step_rejected() {
        let document = Html::parse_document("<html><body></body></html>");
        assert!(select(&document, "//p[contains(@class, 'x')]").is_err());
    }

    #[test]
    fn test_attribute_step_rejected() {
        let document = Html::parse_document("<html><body></body></html>");
        assert!(select(&document, "//a/@href").is_err());
    }

    #[test]
    fn test_zero_predicate_rejected() {
        let document = Html::parse_document("<html><body></body></html>");
        assert!(select(&document, "//li[0]").is_err());
    }

    #[test]
    fn test_mid_path_text_rejected() {
        let document = Html::parse_document("<html><body></body></html>");
        assert!(select(&document, "//p/text()/span").is_err());
    }
}
