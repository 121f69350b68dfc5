//! # Field Paths
//!
//! A [`FieldPath`] locates one field occurrence by walking from a root
//! record type through nested record, repeated, and map fields. It serves
//! two roles:
//!
//! - **Lookup key.** [`FieldPath::schema_path`] strips element markers;
//!   the result keys the constraint index. Equality is structural.
//! - **Location tag.** Violations carry the full path, element markers
//!   included, so `Order.items[2].sku` names the exact offending element.

use std::fmt;

use crate::name::TypeName;
use crate::value::MapKey;

/// Marker for a step that passes through one element of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    /// Position in a repeated field.
    Index(usize),
    /// Entry key in a map field.
    Key(MapKey),
}

/// One `(owning type, field)` hop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldStep {
    /// Type declaring the field.
    pub owner: TypeName,
    /// Field name.
    pub field: String,
    /// Element of a collection field, if the path continues through one.
    pub element: Option<Element>,
}

/// An ordered sequence of field steps from a root type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    steps: Vec<FieldStep>,
}

impl FieldPath {
    /// The empty path (the root record itself).
    pub fn root() -> Self {
        Self::default()
    }

    /// A single-step path.
    pub fn of(owner: TypeName, field: impl Into<String>) -> Self {
        Self::root().child(owner, field)
    }

    /// Build a path from explicit steps.
    pub fn from_steps(steps: Vec<FieldStep>) -> Self {
        Self { steps }
    }

    /// Extend with a field of `owner`.
    #[must_use]
    pub fn child(&self, owner: TypeName, field: impl Into<String>) -> Self {
        let mut steps = self.steps.clone();
        steps.push(FieldStep {
            owner,
            field: field.into(),
            element: None,
        });
        Self { steps }
    }

    /// Mark the last step as passing through element `index`.
    #[must_use]
    pub fn at_index(&self, index: usize) -> Self {
        self.with_element(Element::Index(index))
    }

    /// Mark the last step as passing through map entry `key`.
    #[must_use]
    pub fn at_key(&self, key: MapKey) -> Self {
        self.with_element(Element::Key(key))
    }

    fn with_element(&self, element: Element) -> Self {
        let mut steps = self.steps.clone();
        if let Some(last) = steps.last_mut() {
            last.element = Some(element);
        }
        Self { steps }
    }

    /// The same path with every element marker removed.
    pub fn schema_path(&self) -> Self {
        Self {
            steps: self
                .steps
                .iter()
                .map(|s| FieldStep {
                    owner: s.owner.clone(),
                    field: s.field.clone(),
                    element: None,
                })
                .collect(),
        }
    }

    /// The last step alone, without element marker.
    pub fn leaf(&self) -> Option<Self> {
        self.steps
            .last()
            .map(|s| Self::of(s.owner.clone(), s.field.clone()))
    }

    /// The steps, root first.
    pub fn steps(&self) -> &[FieldStep] {
        &self.steps
    }

    /// The last step.
    pub fn last(&self) -> Option<&FieldStep> {
        self.steps.last()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether this is the root path.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.steps.first() else {
            return f.write_str("(root)");
        };
        write!(f, "{}", first.owner)?;
        for step in &self.steps {
            write!(f, ".{}", step.field)?;
            match &step.element {
                Some(Element::Index(i)) => write!(f, "[{i}]")?,
                Some(Element::Key(k)) => write!(f, "[{k}]")?,
                None => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> TypeName {
        TypeName::new("acme.Order").unwrap()
    }

    fn item() -> TypeName {
        TypeName::new("acme.Item").unwrap()
    }

    #[test]
    fn test_display_nested_with_elements() {
        let p = FieldPath::of(order(), "items").at_index(2).child(item(), "sku");
        assert_eq!(p.to_string(), "acme.Order.items[2].sku");
        let m = FieldPath::of(order(), "labels").at_key(MapKey::from("eu"));
        assert_eq!(m.to_string(), "acme.Order.labels[\"eu\"]");
        assert_eq!(FieldPath::root().to_string(), "(root)");
    }

    #[test]
    fn test_equality_is_structural() {
        let a = FieldPath::of(order(), "amount").child(item(), "value");
        let b = FieldPath::from_steps(vec![
            FieldStep { owner: order(), field: "amount".into(), element: None },
            FieldStep { owner: item(), field: "value".into(), element: None },
        ]);
        assert_eq!(a, b);
        assert_ne!(a, FieldPath::of(item(), "value"));
    }

    #[test]
    fn test_schema_path_strips_elements() {
        let p = FieldPath::of(order(), "items").at_index(7).child(item(), "sku");
        let expected = FieldPath::of(order(), "items").child(item(), "sku");
        assert_eq!(p.schema_path(), expected);
        assert_ne!(p, expected);
    }

    #[test]
    fn test_leaf() {
        let p = FieldPath::of(order(), "items").at_index(0).child(item(), "sku");
        assert_eq!(p.leaf(), Some(FieldPath::of(item(), "sku")));
        assert_eq!(FieldPath::root().leaf(), None);
        assert_eq!(p.len(), 2);
    }
}
