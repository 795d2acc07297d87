//! Structural path locators
//!
//! A locator walks element children from a context node, one step per `/`.
//! Steps name an element (`div`) or any element (`*`), optionally with a
//! 1-based position among same-named siblings (`div[2]`). Field locators end
//! with a target: `text()` for the first non-blank direct text child, or
//! `@name` for an attribute value. Values are returned exactly as they appear
//! in the markup, surrounding whitespace included.
//!
//! ```text
//! div/div[2]/div[1]/h2/a/@href
//! div/div[2]/div[2]/span[1]/ins/span/bdi/text()
//! ```

use crate::{ExtractionError, ExtractionResult};
use scraper::ElementRef;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    /// Element name, `None` for `*`
    name: Option<String>,
    /// 1-based position among matching siblings
    position: Option<usize>,
}

impl Step {
    fn parse(raw: &str, locator: &str) -> ExtractionResult<Self> {
        let invalid = |message: String| ExtractionError::InvalidLocator {
            locator: locator.to_string(),
            message,
        };

        let (name, position) = match raw.split_once('[') {
            Some((name, rest)) => {
                let index = rest
                    .strip_suffix(']')
                    .ok_or_else(|| invalid(format!("unclosed '[' in step '{}'", raw)))?;
                let position = index
                    .parse::<usize>()
                    .ok()
                    .filter(|p| *p >= 1)
                    .ok_or_else(|| {
                        invalid(format!("position in step '{}' must be a number >= 1", raw))
                    })?;
                (name, Some(position))
            }
            None => (raw, None),
        };

        if name.is_empty() {
            return Err(invalid("empty step".to_string()));
        }

        let name = if name == "*" {
            None
        } else if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            Some(name.to_ascii_lowercase())
        } else {
            return Err(invalid(format!("invalid element name '{}'", name)));
        };

        Ok(Self { name, position })
    }

    fn matches(&self, element: &ElementRef<'_>) -> bool {
        match &self.name {
            Some(name) => element.value().name() == name,
            None => true,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_deref().unwrap_or("*"))?;
        if let Some(position) = self.position {
            write!(f, "[{}]", position)?;
        }
        Ok(())
    }
}

/// A sequence of element steps relative to a context element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    steps: Vec<Step>,
}

impl NodePath {
    /// Parses a path of element steps such as `ul/li` or `div/div[2]`
    pub fn parse(path: &str) -> ExtractionResult<Self> {
        Self::parse_steps(path, path)
    }

    fn parse_steps(steps: &str, locator: &str) -> ExtractionResult<Self> {
        if steps.trim().is_empty() {
            return Err(ExtractionError::InvalidLocator {
                locator: locator.to_string(),
                message: "path has no steps".to_string(),
            });
        }

        let steps = steps
            .split('/')
            .map(|raw| Step::parse(raw.trim(), locator))
            .collect::<ExtractionResult<Vec<_>>>()?;

        Ok(Self { steps })
    }

    /// Returns every element reached by the path, in document order
    pub fn select<'a>(&self, root: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let mut current = vec![root];

        for step in &self.steps {
            let mut next = Vec::new();
            for context in &current {
                let matching = context
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|child| step.matches(child));

                match step.position {
                    Some(position) => next.extend(matching.skip(position - 1).take(1)),
                    None => next.extend(matching),
                }
            }

            if next.is_empty() {
                return next;
            }
            current = next;
        }

        current
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

/// What a field locator reads from the elements it reaches
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Text,
    Attribute(String),
}

/// A node path plus the value to read at its end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    path: NodePath,
    target: Target,
}

impl Locator {
    pub fn parse(locator: &str) -> ExtractionResult<Self> {
        let locator = locator.trim();
        let (steps, last) = match locator.rsplit_once('/') {
            Some((steps, last)) => (steps, last),
            None => {
                return Err(ExtractionError::InvalidLocator {
                    locator: locator.to_string(),
                    message: "expected at least one step before the target".to_string(),
                })
            }
        };

        let target = if last == "text()" {
            Target::Text
        } else if let Some(attr) = last.strip_prefix('@').filter(|a| !a.is_empty()) {
            Target::Attribute(attr.to_ascii_lowercase())
        } else {
            return Err(ExtractionError::InvalidLocator {
                locator: locator.to_string(),
                message: format!("target '{}' must be 'text()' or '@attribute'", last),
            });
        };

        let path = NodePath::parse_steps(steps, locator)?;
        Ok(Self { path, target })
    }

    /// Returns the first value the locator produces under `root`
    pub fn evaluate(&self, root: ElementRef<'_>) -> Option<String> {
        let elements = self.path.select(root);

        match &self.target {
            Target::Text => elements.iter().find_map(|element| {
                element
                    .children()
                    .filter_map(|node| node.value().as_text())
                    .find(|text| !text.trim().is_empty())
                    .map(|text| String::from(&**text))
            }),
            Target::Attribute(name) => elements
                .iter()
                .find_map(|element| element.value().attr(name))
                .map(str::to_string),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/", self.path)?;
        match &self.target {
            Target::Text => f.write_str("text()"),
            Target::Attribute(name) => write!(f, "@{}", name),
        }
    }
}

/// Ordered locators for one field; the first one that yields a value wins
#[derive(Debug, Clone)]
pub struct LocatorChain {
    field: &'static str,
    locators: Vec<Locator>,
}

impl LocatorChain {
    pub fn parse<S: AsRef<str>>(field: &'static str, locators: &[S]) -> ExtractionResult<Self> {
        if locators.is_empty() {
            return Err(ExtractionError::InvalidLocator {
                locator: field.to_string(),
                message: "field has no locators".to_string(),
            });
        }

        let locators = locators
            .iter()
            .map(|l| Locator::parse(l.as_ref()))
            .collect::<ExtractionResult<Vec<_>>>()?;

        Ok(Self { field, locators })
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn evaluate(&self, root: ElementRef<'_>) -> Option<String> {
        self.locators.iter().find_map(|locator| locator.evaluate(root))
    }
}
