//! The schema facade.
//!
//! A [`Schema`] describes the domain classes the input stream may carry:
//! class inheritance, attributes (plain, enumeration or nested structure),
//! reference roles with their destination classes, and enumeration value
//! trees. Every attribute, role and enumeration element carries an
//! optional *canonical* base name; schemas may rename elements (for
//! example in translated models) while rules keep referring to the base
//! vocabulary.
//!
//! The whole description derives [`serde::Deserialize`] so it can be
//! loaded from a schema description file.

use serde::Deserialize;

/// The domain schema: all classes known to the run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub classes: Vec<ClassDef>,
}

/// One class definition with its own attributes and roles.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassDef {
    /// Scoped class name, equal to the record tag of its instances.
    pub name: String,
    /// Direct superclass, if any.
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
    #[serde(default)]
    pub roles: Vec<RoleDef>,
}

/// An attribute of a class.
#[derive(Debug, Clone, Deserialize)]
pub struct AttributeDef {
    pub name: String,
    /// Canonical base name; defaults to `name` when absent.
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub kind: AttributeKind,
}

/// The type family of an attribute, as far as path translation cares.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    /// A terminal value (text, numeric, geometry); a path must end here.
    #[default]
    Plain,
    /// A terminal value restricted to an enumeration tree.
    Enumeration(EnumerationDef),
    /// A nested structure; a path must continue into the component class.
    Structure { component: String },
}

/// A reference role of a class.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleDef {
    pub name: String,
    #[serde(default)]
    pub base: Option<String>,
    /// Concrete classes reachable through this role.
    pub destinations: Vec<String>,
}

/// An enumeration value hierarchy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnumerationDef {
    pub elements: Vec<EnumElement>,
}

/// One enumeration value, possibly with a sub-enumeration.
#[derive(Debug, Clone, Deserialize)]
pub struct EnumElement {
    pub name: String,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub elements: Vec<EnumElement>,
}

/// An attribute or role found by member search.
#[derive(Debug, Clone, Copy)]
pub enum ClassMember<'s> {
    Attribute(&'s AttributeDef),
    Role(&'s RoleDef),
}

impl AttributeDef {
    /// The canonical name rules are written against.
    pub fn canonical(&self) -> &str {
        self.base.as_deref().unwrap_or(&self.name)
    }
}

impl RoleDef {
    pub fn canonical(&self) -> &str {
        self.base.as_deref().unwrap_or(&self.name)
    }
}

impl EnumElement {
    pub fn canonical(&self) -> &str {
        self.base.as_deref().unwrap_or(&self.name)
    }
}

impl Schema {
    /// Looks up a class by its scoped name (the record tag).
    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.iter().find(|class| class.name == name)
    }

    /// The given class and every class transitively extending it, in
    /// declaration order.
    pub fn extensions<'s>(&'s self, name: &str) -> Vec<&'s ClassDef> {
        self.classes
            .iter()
            .filter(|class| self.ancestry(class).any(|ancestor| ancestor.name == name))
            .collect()
    }

    /// Walks from a class up its `extends` chain, starting at the class
    /// itself.
    pub fn ancestry<'s>(&'s self, class: &'s ClassDef) -> impl Iterator<Item = &'s ClassDef> {
        std::iter::successors(Some(class), |current| {
            current.extends.as_deref().and_then(|name| self.class(name))
        })
    }

    /// Searches a class, its ancestors and its extensions for an attribute
    /// or role with the given canonical name.
    pub fn find_member<'s>(
        &'s self,
        class: &'s ClassDef,
        canonical: &str,
    ) -> Option<ClassMember<'s>> {
        self.extensions(&class.name)
            .into_iter()
            .flat_map(|extension| self.ancestry(extension))
            .find_map(|candidate| {
                let attribute = candidate
                    .attributes
                    .iter()
                    .find(|attribute| attribute.canonical() == canonical)
                    .map(ClassMember::Attribute);
                attribute.or_else(|| {
                    candidate
                        .roles
                        .iter()
                        .find(|role| role.canonical() == canonical)
                        .map(ClassMember::Role)
                })
            })
    }
}
