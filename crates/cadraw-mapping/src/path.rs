//! Attribute path translation.
//!
//! Rules address values by arrow-separated chains of *canonical* names
//! starting at a record's class, possibly crossing nested structures and
//! reference roles. The [`PathTranslator`] resolves such a chain against
//! the schema into an [`AttributePath`] of typed, walkable steps and
//! translates the names into the concrete (possibly renamed) schema
//! vocabulary. Enumeration value literals are translated the same way,
//! segment by segment down the value hierarchy.

use cadraw_core::schema::{
    AttributeDef, AttributeKind, ClassDef, ClassMember, EnumerationDef, Schema,
};

use crate::error::ConfigurationError;

/// How one path step is resolved against a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// Terminal step yielding a scalar or complex attribute value.
    Attribute,
    /// Descends into a nested structure value.
    Structure,
    /// Crosses a reference into another object, via the cache.
    Reference {
        /// Concrete classes reachable through the role, including their
        /// extensions' base class names as configured in the schema.
        destinations: Vec<String>,
    },
}

/// One typed step of a translated path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    name: String,
    kind: StepKind,
}

impl PathStep {
    pub fn new(name: impl Into<String>, kind: StepKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// The attribute/role name in the concrete schema vocabulary.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &StepKind {
        &self.kind
    }
}

/// A fully translated path.
///
/// Invariant (upheld by translation): `Structure` and `Reference` steps
/// are always followed by further steps; an `Attribute` step is always
/// last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePath {
    steps: Vec<PathStep>,
}

impl AttributePath {
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }
}

/// A translated path together with its terminal attribute definition.
#[derive(Debug, Clone)]
pub struct TranslatedPath<'s> {
    pub path: AttributePath,
    pub terminal: &'s AttributeDef,
}

/// Resolves configured, schema-relative paths into typed steps.
pub struct PathTranslator<'s> {
    schema: &'s Schema,
}

impl<'s> PathTranslator<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    /// Translates an arrow-separated chain of canonical names, starting
    /// at the given class.
    pub fn translate(
        &self,
        class: &'s ClassDef,
        path: &str,
    ) -> Result<TranslatedPath<'s>, ConfigurationError> {
        let segments: Vec<&str> = path.split("->").collect();
        let mut steps = Vec::with_capacity(segments.len());
        let terminal = self.translate_segments(class, path, &segments, &mut steps)?;
        Ok(TranslatedPath {
            path: AttributePath { steps },
            terminal,
        })
    }

    fn translate_segments(
        &self,
        class: &'s ClassDef,
        full_path: &str,
        segments: &[&str],
        steps: &mut Vec<PathStep>,
    ) -> Result<&'s AttributeDef, ConfigurationError> {
        let (segment, rest) = match segments {
            [segment, rest @ ..] => (*segment, rest),
            [] => {
                return Err(ConfigurationError::DanglingPath {
                    path: full_path.to_string(),
                    step: class.name.clone(),
                });
            }
        };

        let member = self.schema.find_member(class, segment).ok_or_else(|| {
            ConfigurationError::UnknownAttribute {
                class: class.name.clone(),
                name: segment.to_string(),
            }
        })?;

        match member {
            ClassMember::Attribute(attribute) => match &attribute.kind {
                AttributeKind::Structure { component } => {
                    if rest.is_empty() {
                        return Err(ConfigurationError::DanglingPath {
                            path: full_path.to_string(),
                            step: attribute.name.clone(),
                        });
                    }
                    let component = self.schema.class(component).ok_or_else(|| {
                        ConfigurationError::UnknownClass {
                            name: component.clone(),
                        }
                    })?;
                    steps.push(PathStep::new(&attribute.name, StepKind::Structure));
                    self.translate_segments(component, full_path, rest, steps)
                }
                AttributeKind::Plain | AttributeKind::Enumeration(_) => {
                    if !rest.is_empty() {
                        return Err(ConfigurationError::UnexpectedContinuation {
                            path: full_path.to_string(),
                            step: attribute.name.clone(),
                        });
                    }
                    steps.push(PathStep::new(&attribute.name, StepKind::Attribute));
                    Ok(attribute)
                }
            },
            ClassMember::Role(role) => {
                if rest.is_empty() {
                    return Err(ConfigurationError::DanglingPath {
                        path: full_path.to_string(),
                        step: role.name.clone(),
                    });
                }
                let destination = role
                    .destinations
                    .first()
                    .and_then(|name| self.schema.class(name))
                    .ok_or_else(|| ConfigurationError::UnknownClass {
                        name: role.destinations.first().cloned().unwrap_or_default(),
                    })?;
                steps.push(PathStep::new(
                    &role.name,
                    StepKind::Reference {
                        destinations: role.destinations.clone(),
                    },
                ));
                self.translate_segments(destination, full_path, rest, steps)
            }
        }
    }

    /// Translates a dotted enumeration value literal down the value
    /// hierarchy, returning the value in the concrete schema vocabulary.
    pub fn translate_enum_value(
        enumeration: &EnumerationDef,
        value: &str,
    ) -> Result<String, ConfigurationError> {
        let mut translated = Vec::new();
        let mut elements = enumeration.elements.as_slice();
        for segment in value.split('.') {
            let element = elements
                .iter()
                .find(|element| element.canonical() == segment)
                .ok_or_else(|| ConfigurationError::UnknownEnumerationValue {
                    value: value.to_string(),
                })?;
            translated.push(element.name.clone());
            elements = element.elements.as_slice();
        }
        Ok(translated.join("."))
    }
}

#[cfg(test)]
mod tests {
    use cadraw_core::schema::{EnumElement, RoleDef};

    use super::*;

    fn element(name: &str, base: Option<&str>, sub: Vec<EnumElement>) -> EnumElement {
        EnumElement {
            name: name.to_string(),
            base: base.map(str::to_string),
            elements: sub,
        }
    }

    fn schema() -> Schema {
        Schema {
            classes: vec![
                ClassDef {
                    name: "Model.Topic.Punkt".to_string(),
                    extends: None,
                    attributes: vec![AttributeDef {
                        name: "Objektart".to_string(),
                        base: None,
                        kind: AttributeKind::Enumeration(EnumerationDef {
                            elements: vec![
                                element("Elektrizitaet", None, vec![]),
                                element("Wasser", None, vec![]),
                            ],
                        }),
                    }],
                    roles: vec![],
                },
                ClassDef {
                    name: "Model.Topic.Text".to_string(),
                    extends: None,
                    attributes: vec![
                        AttributeDef {
                            name: "Bemerkung".to_string(),
                            base: None,
                            kind: AttributeKind::Plain,
                        },
                        AttributeDef {
                            name: "Metaattribute".to_string(),
                            base: None,
                            kind: AttributeKind::Structure {
                                component: "Model.Topic.Meta".to_string(),
                            },
                        },
                    ],
                    roles: vec![RoleDef {
                        name: "ObjektRef".to_string(),
                        base: None,
                        destinations: vec!["Model.Topic.Punkt".to_string()],
                    }],
                },
                ClassDef {
                    name: "Model.Topic.Meta".to_string(),
                    extends: None,
                    attributes: vec![AttributeDef {
                        name: "Datenherr".to_string(),
                        base: None,
                        kind: AttributeKind::Plain,
                    }],
                    roles: vec![],
                },
            ],
        }
    }

    fn translate(path: &str) -> Result<TranslatedPath<'static>, ConfigurationError> {
        // Leak the schema so the test can hold the translated borrow.
        let schema = Box::leak(Box::new(schema()));
        let class = schema.class("Model.Topic.Text").unwrap();
        PathTranslator::new(schema).translate(class, path)
    }

    #[test]
    fn translates_reference_crossing_path() {
        let translated = translate("ObjektRef->Objektart").unwrap();
        let steps = translated.path.steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].name(), "ObjektRef");
        assert!(matches!(steps[0].kind(), StepKind::Reference { .. }));
        assert_eq!(steps[1].name(), "Objektart");
        assert_eq!(*steps[1].kind(), StepKind::Attribute);
        assert!(matches!(
            translated.terminal.kind,
            AttributeKind::Enumeration(_)
        ));
    }

    #[test]
    fn translates_structure_path() {
        let translated = translate("Metaattribute->Datenherr").unwrap();
        let steps = translated.path.steps();
        assert_eq!(*steps[0].kind(), StepKind::Structure);
        assert_eq!(*steps[1].kind(), StepKind::Attribute);
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        assert!(matches!(
            translate("NonExistent"),
            Err(ConfigurationError::UnknownAttribute { name, .. }) if name == "NonExistent"
        ));
    }

    #[test]
    fn path_must_continue_after_reference() {
        assert!(matches!(
            translate("ObjektRef"),
            Err(ConfigurationError::DanglingPath { step, .. }) if step == "ObjektRef"
        ));
    }

    #[test]
    fn path_must_continue_after_structure() {
        assert!(matches!(
            translate("Metaattribute"),
            Err(ConfigurationError::DanglingPath { step, .. }) if step == "Metaattribute"
        ));
    }

    #[test]
    fn path_must_end_at_terminal_attribute() {
        assert!(matches!(
            translate("ObjektRef->Objektart->Unexpected"),
            Err(ConfigurationError::UnexpectedContinuation { step, .. }) if step == "Objektart"
        ));
    }

    #[test]
    fn translates_enum_values_through_sub_enumerations() {
        let enumeration = EnumerationDef {
            elements: vec![
                element("Werkplan", Some("Werkplan"), vec![]),
                element(
                    "plan_d_ensemble",
                    Some("Uebersichtsplan"),
                    vec![
                        element("pe10", Some("UeP10"), vec![]),
                        element("pe5", Some("UeP5"), vec![]),
                    ],
                ),
            ],
        };

        assert_eq!(
            PathTranslator::translate_enum_value(&enumeration, "Uebersichtsplan.UeP10").unwrap(),
            "plan_d_ensemble.pe10"
        );
        assert_eq!(
            PathTranslator::translate_enum_value(&enumeration, "Werkplan").unwrap(),
            "Werkplan"
        );
        assert!(matches!(
            PathTranslator::translate_enum_value(&enumeration, "Uebersichtsplan.UeP25"),
            Err(ConfigurationError::UnknownEnumerationValue { .. })
        ));
    }
}
