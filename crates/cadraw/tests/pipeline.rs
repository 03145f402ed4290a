//! End-to-end mapping of records into a DXF document.

use cadraw::{DxfWriter, MappingEngine};
use cadraw_core::{
    record::{Record, StructValue, Value},
    schema::{AttributeDef, AttributeKind, ClassDef, EnumElement, EnumerationDef, RoleDef, Schema},
};
use cadraw_mapping::{RuleCompiler, RuleTable};

fn schema() -> Schema {
    let plain = |name: &str| AttributeDef {
        name: name.to_string(),
        base: None,
        kind: AttributeKind::Plain,
    };
    Schema {
        classes: vec![
            ClassDef {
                name: "LK.Map.Leitung".to_string(),
                extends: None,
                attributes: vec![
                    AttributeDef {
                        name: "Objektart".to_string(),
                        base: None,
                        kind: AttributeKind::Enumeration(EnumerationDef {
                            elements: ["Elektrizitaet", "Wasser"]
                                .iter()
                                .map(|name| EnumElement {
                                    name: name.to_string(),
                                    base: None,
                                    elements: vec![],
                                })
                                .collect(),
                        }),
                    },
                    plain("Verlauf"),
                ],
                roles: vec![],
            },
            ClassDef {
                name: "LK.Map.Text".to_string(),
                extends: None,
                attributes: vec![
                    plain("TextPos"),
                    plain("TextOri"),
                    plain("TextHAli"),
                    plain("TextVAli"),
                    plain("Textinhalt"),
                ],
                roles: vec![RoleDef {
                    name: "LeitungRef".to_string(),
                    base: None,
                    destinations: vec!["LK.Map.Leitung".to_string()],
                }],
            },
        ],
    }
}

fn rules() -> RuleTable {
    RuleTable::from_toml_str(
        r#"
        [[rule]]
        layer = "ELE-LEITUNG"
        classes = ["LK.Map.Leitung"]
        output = "line"
        geometry = "Verlauf"
        color = 1
        linetype = "Dashed"
        [[rule.predicates]]
        path = "Objektart"
        values = ["Elektrizitaet"]

        [[rule]]
        layer = "ELE-TEXT"
        classes = ["LK.Map.Text"]
        output = "text"
        geometry = "TextPos"
        orientation = "TextOri"
        h_align = "TextHAli"
        v_align = "TextVAli"
        text = "Textinhalt"
        font = "arial"
        [[rule.predicates]]
        path = "LeitungRef->Objektart"
        values = ["Elektrizitaet"]
        "#,
    )
    .unwrap()
}

fn coord(x: &str, y: &str) -> StructValue {
    let mut value = StructValue::new();
    value.insert("C1", Value::Text(x.to_string()));
    value.insert("C2", Value::Text(y.to_string()));
    value
}

fn leitung(oid: &str) -> Record {
    let mut sequence = StructValue::new();
    sequence.insert("segment", Value::Struct(coord("2600000", "1200000")));
    sequence.insert("segment", Value::Struct(coord("2600010", "1200005")));
    let mut verlauf = StructValue::new();
    verlauf.insert("sequence", Value::Struct(sequence));

    Record::new("LK.Map.Leitung", oid)
        .with_scalar("Objektart", "Elektrizitaet")
        .with("Verlauf", Value::Struct(verlauf))
}

fn label(oid: &str, target: &str) -> Record {
    Record::new("LK.Map.Text", oid)
        .with("TextPos", Value::Struct(coord("2600005", "1200002")))
        .with_scalar("TextOri", "0")
        .with_scalar("TextHAli", "Left")
        .with_scalar("TextVAli", "Base")
        .with_scalar("Textinhalt", "EW 12")
        .with_reference("LeitungRef", target)
}

#[test]
fn maps_records_into_dxf_entities() {
    let schema = schema();
    let table = rules();
    let rule_set = RuleCompiler::new(&schema).compile(&table).unwrap();

    let mut buffer = Vec::new();
    let mut writer = DxfWriter::new(&mut buffer, 3, rule_set.definitions(), None).unwrap();

    let mut engine = MappingEngine::new(&rule_set);
    // The label references an object that only appears later in the
    // stream, so it is emitted after the retry pass.
    for object in engine.map(vec![label("t1", "l1"), leitung("l1")]) {
        object.unwrap().write_to(&mut writer).unwrap();
    }
    writer.finish().unwrap();

    let output = String::from_utf8(buffer).unwrap();

    // Layer palette from the rule table.
    assert!(output.contains("2\nELE-LEITUNG\n6\nDashed\n370\n25\n62\n1\n"));
    assert!(output.contains("2\nELE-TEXT\n6\nContinuous\n"));
    assert!(output.contains("2\narial\n3\narial\n"));

    // The line entity comes first, the deferred label afterwards.
    let polyline = output.find("0\nLWPOLYLINE\n").unwrap();
    let text = output.find("0\nTEXT\n").unwrap();
    assert!(polyline < text);

    assert!(output.contains(
        "8\nELE-LEITUNG\n100\nAcDbPolyline\n90\n2\n70\n0\n10\n2600000\n20\n1200000\n42\n0\n10\n2600010\n20\n1200005\n42\n0\n"
    ));
    // Default alignment with orientation 0 in transfer space (90 in DXF).
    assert!(output.contains(
        "8\nELE-TEXT\n100\nAcDbText\n7\narial\n10\n2600005\n20\n1200002\n40\n1.25\n1\nEW 12\n50\n90\n100\nAcDbText\n"
    ));
}

#[test]
fn unmatched_values_produce_no_entities() {
    let schema = schema();
    let table = rules();
    let rule_set = RuleCompiler::new(&schema).compile(&table).unwrap();

    let mut engine = MappingEngine::new(&rule_set);
    // No rule lists Wasser, so the record is dropped with a warning.
    let record = Record::new("LK.Map.Leitung", "l1").with_scalar("Objektart", "Wasser");
    assert_eq!(engine.map(vec![record]).count(), 0);
}
