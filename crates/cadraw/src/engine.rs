//! The two-pass mapping engine.
//!
//! Records stream through the compiled rules once. A record whose
//! reference predicates point at an object not yet seen is deferred; once
//! the stream is exhausted the deferred records are retried against the
//! now-complete cache. A reference that is still unresolved in the retry
//! pass can never be satisfied and aborts the run.

use log::warn;

use cadraw_core::record::Record;
use cadraw_mapping::{AttributePath, CompiledRule, RuleSet, ValuePredicate};

use crate::{
    error::CadrawError,
    mapped::{MappedObject, build_geometry},
    resolve::{ReferenceCache, Resolution, resolve},
};

/// Streams records through a compiled rule set.
///
/// The reference cache lives in the engine and survives across calls to
/// [`MappingEngine::map`], so objects from an earlier input stay
/// resolvable while processing later ones.
pub struct MappingEngine<'r> {
    rules: &'r RuleSet,
    cache: ReferenceCache,
}

enum Outcome<'r> {
    Mapped(MappedObject<'r>),
    Deferred(Record),
    Skipped,
}

enum Match {
    Full,
    None,
    Pending,
}

impl<'r> MappingEngine<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self {
            rules,
            cache: ReferenceCache::new(),
        }
    }

    /// Maps one stream of records, yielding resolved outputs in record
    /// order with deferred records at the end.
    pub fn map<I>(&mut self, records: I) -> MappedObjects<'_, 'r, I::IntoIter>
    where
        I: IntoIterator<Item = Record>,
    {
        MappedObjects {
            engine: self,
            stage: Stage::Primary {
                records: records.into_iter(),
                pending: Vec::new(),
            },
        }
    }

    fn process(&mut self, record: Record, retry: bool) -> Result<Outcome<'r>, CadrawError> {
        // Cache before matching so self- and sibling references within the
        // same stream position resolve.
        if let Some(required) = self.rules.cache_requirements(record.tag()) {
            self.cache.insert_distilled(&record, required);
        }

        for rule in self.rules.rules() {
            if rule.tag() != record.tag() {
                continue;
            }
            match self.evaluate(rule, &record) {
                Match::Full => {
                    return Ok(match self.emit(rule, &record) {
                        Some(object) => Outcome::Mapped(object),
                        None => Outcome::Skipped,
                    });
                }
                Match::None => {}
                Match::Pending if retry => {
                    return Err(CadrawError::UnresolvedReference {
                        oid: record.oid().to_string(),
                    });
                }
                Match::Pending => return Ok(Outcome::Deferred(record)),
            }
        }

        warn!(oid = record.oid(), tag = record.tag(); "No rule matched record");
        Ok(Outcome::Skipped)
    }

    fn evaluate(&self, rule: &CompiledRule, record: &Record) -> Match {
        for predicate in rule.predicates() {
            match resolve(record.value(), predicate.path().steps(), &self.cache) {
                Resolution::Text(text) if value_allowed(predicate, text) => {}
                Resolution::Pending => return Match::Pending,
                _ => return Match::None,
            }
        }
        Match::Full
    }

    fn emit(&self, rule: &'r CompiledRule, record: &Record) -> Option<MappedObject<'r>> {
        let output = rule.output();
        let layer = rule.definition().layer.as_str();

        let geometry = match resolve(record.value(), output.geometry().steps(), &self.cache) {
            Resolution::Complex(value) => {
                match build_geometry(rule.definition().output, value) {
                    Ok(geometry) => geometry,
                    Err(error) => {
                        warn!(
                            oid = record.oid(),
                            layer,
                            error = error.to_string();
                            "Skipping record with malformed geometry"
                        );
                        return None;
                    }
                }
            }
            _ => {
                warn!(oid = record.oid(), layer; "Skipping record without geometry");
                return None;
            }
        };

        let orientation = self
            .scalar(record, output.orientation())
            .and_then(|text| match text.parse() {
                Ok(angle) => Some(angle),
                Err(_) => {
                    warn!(oid = record.oid(), value = text.as_str(); "Ignoring unparseable orientation");
                    None
                }
            });

        Some(MappedObject::new(
            record.oid().to_string(),
            geometry,
            orientation,
            self.scalar(record, output.v_align()),
            self.scalar(record, output.h_align()),
            self.scalar(record, output.text()),
            rule,
        ))
    }

    fn scalar(&self, record: &Record, path: Option<&AttributePath>) -> Option<String> {
        match resolve(record.value(), path?.steps(), &self.cache) {
            Resolution::Text(text) => Some(text.to_string()),
            _ => None,
        }
    }
}

/// A value matches if it equals an allowed value or is one of its
/// sub-elements (`Wasser.Trinkwasser` matches an allowed `Wasser`).
fn value_allowed(predicate: &ValuePredicate, text: &str) -> bool {
    predicate.values().iter().any(|allowed| {
        text.strip_prefix(allowed.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
    })
}

enum Stage<I> {
    Primary { records: I, pending: Vec<Record> },
    Retry(std::vec::IntoIter<Record>),
}

/// Iterator over the outputs of one mapped record stream.
pub struct MappedObjects<'e, 'r, I> {
    engine: &'e mut MappingEngine<'r>,
    stage: Stage<I>,
}

impl<'r, I> Iterator for MappedObjects<'_, 'r, I>
where
    I: Iterator<Item = Record>,
{
    type Item = Result<MappedObject<'r>, CadrawError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (record, retry) = match &mut self.stage {
                Stage::Primary { records, pending } => match records.next() {
                    Some(record) => (record, false),
                    None => {
                        let pending = std::mem::take(pending);
                        self.stage = Stage::Retry(pending.into_iter());
                        continue;
                    }
                },
                Stage::Retry(records) => match records.next() {
                    Some(record) => (record, true),
                    None => return None,
                },
            };

            match self.engine.process(record, retry) {
                Ok(Outcome::Mapped(object)) => return Some(Ok(object)),
                Ok(Outcome::Deferred(record)) => {
                    if let Stage::Primary { pending, .. } = &mut self.stage {
                        pending.push(record);
                    }
                }
                Ok(Outcome::Skipped) => {}
                Err(error) => return Some(Err(error)),
            }
        }
    }
}
