//! Rule compilation.
//!
//! The [`RuleCompiler`] turns a [`RuleTable`] into an immutable
//! [`RuleSet`]: one [`CompiledRule`] per configured (rule, record tag)
//! pair in declared order, plus the per-class cache requirements derived
//! from every reference-crossing path. The `RuleSet` is built once per run
//! and shared with the engine by reference; there is no hidden static
//! state.

use indexmap::IndexMap;
use log::debug;

use cadraw_core::schema::{AttributeKind, ClassDef, Schema};

use crate::{
    error::ConfigurationError,
    path::{AttributePath, PathStep, PathTranslator, StepKind},
    rule::{OutputKind, RuleDefinition, RuleTable},
};

/// One compiled value-set predicate.
#[derive(Debug, Clone)]
pub struct ValuePredicate {
    path: AttributePath,
    /// Allowed values, translated into the schema vocabulary.
    values: Vec<String>,
}

impl ValuePredicate {
    pub fn path(&self) -> &AttributePath {
        &self.path
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// The translated output paths of a rule, populated per output kind:
/// surfaces and lines carry geometry only, points add orientation, text
/// adds orientation, both alignments and the text value.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    geometry: AttributePath,
    orientation: Option<AttributePath>,
    v_align: Option<AttributePath>,
    h_align: Option<AttributePath>,
    text: Option<AttributePath>,
}

impl OutputPaths {
    pub fn geometry(&self) -> &AttributePath {
        &self.geometry
    }

    pub fn orientation(&self) -> Option<&AttributePath> {
        self.orientation.as_ref()
    }

    pub fn v_align(&self) -> Option<&AttributePath> {
        self.v_align.as_ref()
    }

    pub fn h_align(&self) -> Option<&AttributePath> {
        self.h_align.as_ref()
    }

    pub fn text(&self) -> Option<&AttributePath> {
        self.text.as_ref()
    }
}

/// One rule compiled for one record tag.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    tag: String,
    predicates: Vec<ValuePredicate>,
    output: OutputPaths,
    definition: RuleDefinition,
}

impl CompiledRule {
    /// The record tag this rule applies to (the leading tag predicate).
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Value-set predicates, in declared order.
    pub fn predicates(&self) -> &[ValuePredicate] {
        &self.predicates
    }

    pub fn output(&self) -> &OutputPaths {
        &self.output
    }

    /// The configured rule this was compiled from (layer, render
    /// attributes, output kind).
    pub fn definition(&self) -> &RuleDefinition {
        &self.definition
    }
}

/// The immutable result of rule compilation.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
    cache_requirements: IndexMap<String, Vec<PathStep>>,
    definitions: Vec<RuleDefinition>,
}

impl RuleSet {
    /// Compiled rules in declared order; first full match wins.
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// The single next-steps some rule needs cached for records of the
    /// given class, or `None` if the class needs no cache entry.
    pub fn cache_requirements(&self, tag: &str) -> Option<&[PathStep]> {
        self.cache_requirements.get(tag).map(Vec::as_slice)
    }

    /// The configured rule table, in declared order (the layer palette).
    pub fn definitions(&self) -> &[RuleDefinition] {
        &self.definitions
    }
}

/// Compiles configured rules against a schema.
pub struct RuleCompiler<'s> {
    schema: &'s Schema,
    translator: PathTranslator<'s>,
}

impl<'s> RuleCompiler<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            translator: PathTranslator::new(schema),
        }
    }

    /// Compiles the whole rule table, failing on the first configuration
    /// error.
    pub fn compile(&self, table: &RuleTable) -> Result<RuleSet, ConfigurationError> {
        let mut rules = Vec::new();
        let mut cache_requirements: IndexMap<String, Vec<PathStep>> = IndexMap::new();

        for definition in &table.rules {
            for tag in &definition.classes {
                let class = self.schema.class(tag).ok_or_else(|| {
                    ConfigurationError::UnknownClass { name: tag.clone() }
                })?;

                let mut predicates = Vec::with_capacity(definition.predicates.len());
                for predicate in &definition.predicates {
                    let translated = self.translator.translate(class, &predicate.path)?;
                    let AttributeKind::Enumeration(enumeration) = &translated.terminal.kind
                    else {
                        return Err(ConfigurationError::NotAnEnumeration {
                            path: predicate.path.clone(),
                        });
                    };
                    let values = predicate
                        .values
                        .iter()
                        .map(|value| PathTranslator::translate_enum_value(enumeration, value))
                        .collect::<Result<Vec<_>, _>>()?;
                    self.register_cache_requirements(
                        translated.path.steps(),
                        &mut cache_requirements,
                    );
                    predicates.push(ValuePredicate {
                        path: translated.path,
                        values,
                    });
                }

                let output = self.compile_output(class, definition, &mut cache_requirements)?;
                rules.push(CompiledRule {
                    tag: tag.clone(),
                    predicates,
                    output,
                    definition: definition.clone(),
                });
            }
        }

        debug!(
            rules = rules.len(),
            cached_classes = cache_requirements.len();
            "Compiled rule set"
        );

        Ok(RuleSet {
            rules,
            cache_requirements,
            definitions: table.rules.clone(),
        })
    }

    fn compile_output(
        &self,
        class: &'s ClassDef,
        definition: &RuleDefinition,
        cache_requirements: &mut IndexMap<String, Vec<PathStep>>,
    ) -> Result<OutputPaths, ConfigurationError> {
        let geometry = self.translate_output(
            class,
            definition,
            Some(&definition.geometry),
            "geometry",
            cache_requirements,
        )?;

        let (orientation, v_align, h_align, text) = match definition.output {
            OutputKind::Surface | OutputKind::Line => (None, None, None, None),
            OutputKind::Point => (
                Some(self.translate_output(
                    class,
                    definition,
                    definition.orientation.as_deref(),
                    "orientation",
                    cache_requirements,
                )?),
                None,
                None,
                None,
            ),
            OutputKind::Text => (
                Some(self.translate_output(
                    class,
                    definition,
                    definition.orientation.as_deref(),
                    "orientation",
                    cache_requirements,
                )?),
                Some(self.translate_output(
                    class,
                    definition,
                    definition.v_align.as_deref(),
                    "v_align",
                    cache_requirements,
                )?),
                Some(self.translate_output(
                    class,
                    definition,
                    definition.h_align.as_deref(),
                    "h_align",
                    cache_requirements,
                )?),
                Some(self.translate_output(
                    class,
                    definition,
                    definition.text.as_deref(),
                    "text",
                    cache_requirements,
                )?),
            ),
        };

        Ok(OutputPaths {
            geometry,
            orientation,
            v_align,
            h_align,
            text,
        })
    }

    fn translate_output(
        &self,
        class: &'s ClassDef,
        definition: &RuleDefinition,
        path: Option<&str>,
        field: &'static str,
        cache_requirements: &mut IndexMap<String, Vec<PathStep>>,
    ) -> Result<AttributePath, ConfigurationError> {
        let path = match path {
            Some(path) if !path.is_empty() => path,
            _ => {
                return Err(ConfigurationError::MissingOutputPath {
                    layer: definition.layer.clone(),
                    field,
                });
            }
        };
        let translated = self.translator.translate(class, path)?;
        self.register_cache_requirements(translated.path.steps(), cache_requirements);
        Ok(translated.path)
    }

    /// Registers, for every reference step of the path, the single next
    /// step as a cache requirement of every class reachable through the
    /// role (each destination and all its extensions). Only the attribute
    /// actually dereferenced is cached, never a full object copy.
    fn register_cache_requirements(
        &self,
        steps: &[PathStep],
        cache_requirements: &mut IndexMap<String, Vec<PathStep>>,
    ) {
        for (index, step) in steps.iter().enumerate() {
            let StepKind::Reference { destinations } = step.kind() else {
                continue;
            };
            // The translation invariant guarantees a next step.
            let next = steps[index + 1].clone();
            for destination in destinations {
                for extension in self.schema.extensions(destination) {
                    let required = cache_requirements
                        .entry(extension.name.clone())
                        .or_default();
                    if !required.contains(&next) {
                        required.push(next.clone());
                    }
                }
            }
        }
    }
}
