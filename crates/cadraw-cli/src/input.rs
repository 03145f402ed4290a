//! Record and schema decoding from JSON files.
//!
//! A record file is a top-level array of objects with `tag`, `oid` and an
//! `attributes` map. Attribute values map one-to-one onto the record
//! model: strings (and numbers, kept in their textual form) become
//! scalars, objects become nested structures, `{"$ref": "<oid>"}` becomes
//! a reference and an array holds several values under one name.

use std::{fs, path::Path};

use serde_json::Value as Json;

use cadraw::CadrawError;
use cadraw_core::{
    record::{Record, StructValue, Value},
    schema::Schema,
};

/// Reads all records of one input file, in file order.
pub fn read_records(path: &Path) -> Result<Vec<Record>, CadrawError> {
    let source = fs::read_to_string(path)?;
    let json: Json = serde_json::from_str(&source).map_err(|e| invalid(path, e.to_string()))?;

    let Json::Array(items) = json else {
        return Err(invalid(path, "expected a top-level array of records"));
    };
    items
        .iter()
        .map(|item| decode_record(item).map_err(|message| invalid(path, message)))
        .collect()
}

/// Reads a schema description file.
pub fn read_schema(path: &Path) -> Result<Schema, CadrawError> {
    let source = fs::read_to_string(path)?;
    serde_json::from_str(&source).map_err(|e| invalid(path, e.to_string()))
}

fn invalid(path: &Path, message: impl Into<String>) -> CadrawError {
    CadrawError::InvalidInput {
        path: path.display().to_string(),
        message: message.into(),
    }
}

fn decode_record(item: &Json) -> Result<Record, String> {
    let Json::Object(fields) = item else {
        return Err("record must be an object".to_string());
    };
    let tag = fields
        .get("tag")
        .and_then(Json::as_str)
        .ok_or("record is missing \"tag\"")?;
    let oid = fields
        .get("oid")
        .and_then(Json::as_str)
        .ok_or("record is missing \"oid\"")?;

    let mut record = Record::new(tag, oid);
    if let Some(attributes) = fields.get("attributes") {
        let Json::Object(attributes) = attributes else {
            return Err("\"attributes\" must be an object".to_string());
        };
        for (name, value) in attributes {
            for decoded in decode_values(value)? {
                record.insert(name, decoded);
            }
        }
    }
    Ok(record)
}

fn decode_values(value: &Json) -> Result<Vec<Value>, String> {
    match value {
        Json::Array(items) => items.iter().map(decode_single).collect(),
        single => Ok(vec![decode_single(single)?]),
    }
}

fn decode_single(value: &Json) -> Result<Value, String> {
    match value {
        Json::String(text) => Ok(Value::Text(text.clone())),
        // Numbers keep their textual transfer form.
        Json::Number(number) => Ok(Value::Text(number.to_string())),
        Json::Bool(flag) => Ok(Value::Text(flag.to_string())),
        Json::Object(fields) => {
            if let Some(reference) = fields.get("$ref") {
                let oid = reference
                    .as_str()
                    .ok_or("\"$ref\" must be an object-id string")?;
                return Ok(Value::Reference(oid.to_string()));
            }
            let mut nested = StructValue::new();
            for (name, value) in fields {
                for decoded in decode_values(value)? {
                    nested.insert(name, decoded);
                }
            }
            Ok(Value::Struct(nested))
        }
        Json::Array(_) => Err("attribute arrays must not be nested".to_string()),
        Json::Null => Err("attribute values must not be null".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_records(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn decodes_scalars_structures_and_references() {
        let file = write_records(
            r#"[
                {
                    "tag": "LK.Map.Punkt",
                    "oid": "p1",
                    "attributes": {
                        "Objektart": "Wasser.Trinkwasser",
                        "SymbolOri": 90.5,
                        "SymbolPos": { "C1": "2600000.5", "C2": 1200000 },
                        "LeitungRef": { "$ref": "l1" }
                    }
                }
            ]"#,
        );

        let records = read_records(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.tag(), "LK.Map.Punkt");
        assert_eq!(record.oid(), "p1");
        assert_eq!(record.value().scalar("Objektart"), Some("Wasser.Trinkwasser"));
        assert_eq!(record.value().scalar("SymbolOri"), Some("90.5"));
        assert_eq!(record.value().reference("LeitungRef"), Some("l1"));

        let position = record.value().structure("SymbolPos").unwrap();
        assert_eq!(position.scalar("C1"), Some("2600000.5"));
        assert_eq!(position.scalar("C2"), Some("1200000"));
    }

    #[test]
    fn arrays_become_multiple_values_under_one_name() {
        let file = write_records(
            r#"[
                {
                    "tag": "LK.Map.Flaeche",
                    "oid": "f1",
                    "attributes": {
                        "Geometrie": {
                            "surface": [
                                { "boundary": { "polyline": {} } },
                                { "boundary": { "polyline": {} } }
                            ]
                        }
                    }
                }
            ]"#,
        );

        let records = read_records(file.path()).unwrap();
        let geometry = records[0].value().structure("Geometrie").unwrap();
        assert_eq!(geometry.structures("surface").count(), 2);
    }

    #[test]
    fn rejects_malformed_records() {
        let missing_oid = write_records(r#"[{ "tag": "LK.Map.Punkt" }]"#);
        assert!(matches!(
            read_records(missing_oid.path()),
            Err(CadrawError::InvalidInput { message, .. }) if message.contains("oid")
        ));

        let not_an_array = write_records(r#"{ "tag": "LK.Map.Punkt" }"#);
        assert!(matches!(
            read_records(not_an_array.path()),
            Err(CadrawError::InvalidInput { message, .. }) if message.contains("array")
        ));

        let null_value = write_records(
            r#"[{ "tag": "T", "oid": "a", "attributes": { "X": null } }]"#,
        );
        assert!(read_records(null_value.path()).is_err());
    }

    #[test]
    fn reads_schema_descriptions() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{
                "classes": [
                    {
                        "name": "LK.Map.Leitung",
                        "attributes": [
                            {
                                "name": "Objektart",
                                "kind": { "enumeration": { "elements": [{ "name": "Wasser" }] } }
                            },
                            { "name": "Verlauf" }
                        ]
                    },
                    {
                        "name": "LK.Map.Punkt",
                        "extends": "LK.Map.Leitung",
                        "roles": [
                            { "name": "LeitungRef", "destinations": ["LK.Map.Leitung"] }
                        ]
                    }
                ]
            }"#,
        )
        .unwrap();

        let schema = read_schema(file.path()).unwrap();
        assert_eq!(schema.classes.len(), 2);
        assert!(schema.class("LK.Map.Punkt").is_some());
        assert_eq!(
            schema.extensions("LK.Map.Leitung").len(),
            2,
            "subclass must extend its base"
        );
    }
}
