//! End-to-end run over filesystem fixtures.

use std::{fs, path::Path};

use cadraw_cli::{Args, run};

const SCHEMA: &str = r#"{
    "classes": [
        {
            "name": "LK.Map.Leitung",
            "attributes": [
                {
                    "name": "Objektart",
                    "kind": {
                        "enumeration": {
                            "elements": [
                                { "name": "Wasser", "elements": [{ "name": "Trinkwasser" }] },
                                { "name": "Abwasser" }
                            ]
                        }
                    }
                },
                { "name": "Verlauf" }
            ]
        },
        {
            "name": "LK.Map.Punkt",
            "attributes": [
                { "name": "SymbolPos" },
                { "name": "SymbolOri" }
            ],
            "roles": [
                { "name": "LeitungRef", "destinations": ["LK.Map.Leitung"] }
            ]
        }
    ]
}"#;

const RULES: &str = r#"
[[rule]]
layer = "WAS-LEITUNG"
classes = ["LK.Map.Leitung"]
output = "line"
geometry = "Verlauf"
color = 5

[[rule.predicates]]
path = "Objektart"
values = ["Wasser"]

[[rule]]
layer = "WAS-PUNKT"
classes = ["LK.Map.Punkt"]
output = "point"
geometry = "SymbolPos"
orientation = "SymbolOri"
symbol = "Punktsymbol"

[[rule.predicates]]
path = "LeitungRef->Objektart"
values = ["Wasser"]
"#;

const RECORDS: &str = r#"[
    {
        "tag": "LK.Map.Punkt",
        "oid": "p1",
        "attributes": {
            "SymbolPos": { "C1": "2600005", "C2": "1200005" },
            "SymbolOri": "30",
            "LeitungRef": { "$ref": "l1" }
        }
    },
    {
        "tag": "LK.Map.Leitung",
        "oid": "l1",
        "attributes": {
            "Objektart": "Wasser.Trinkwasser",
            "Verlauf": {
                "sequence": {
                    "segment": [
                        { "C1": "2600000", "C2": "1200000" },
                        { "C1": "2600010", "C2": "1200010" }
                    ]
                }
            }
        }
    }
]"#;

fn write_fixture(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

fn args(dir: &Path, perimeter: Option<Vec<f64>>) -> Args {
    Args {
        inputs: vec![write_fixture(dir, "records.json", RECORDS)],
        output: dir.join("out.dxf").display().to_string(),
        rules: Some(write_fixture(dir, "rules.toml", RULES)),
        schema: Some(write_fixture(dir, "schema.json", SCHEMA)),
        config: None,
        precision: None,
        perimeter,
        log_level: "warn".to_string(),
    }
}

#[test]
fn converts_records_into_a_dxf_drawing() {
    let dir = tempfile::tempdir().unwrap();
    let args = args(dir.path(), None);

    run(&args).unwrap();

    let output = fs::read_to_string(dir.path().join("out.dxf")).unwrap();
    // Layer palette and symbol block from the rule table.
    assert!(output.contains("2\nWAS-LEITUNG\n6\nContinuous\n370\n25\n62\n5\n"));
    assert!(output.contains("2\nWAS-PUNKT\n"));
    assert!(output.contains("2\nPunktsymbol\n"));
    // One line and one point entity; the point was deferred past its
    // reference target and its rotation converted (30 -> 60).
    assert!(output.contains("0\nLWPOLYLINE\n"));
    assert!(output.contains(
        "0\nINSERT\n5\n1F\n100\nAcDbEntity\n8\nWAS-PUNKT\n100\nAcDbBlockReference\n2\nPunktsymbol\n10\n2600005\n20\n1200005\n50\n60\n"
    ));
    assert!(output.ends_with("0\nEOF\n"));
}

#[test]
fn perimeter_filter_drops_distant_outputs() {
    let dir = tempfile::tempdir().unwrap();
    // A perimeter far away from all fixture coordinates.
    let args = args(dir.path(), Some(vec![0.0, 0.0, 100.0, 100.0]));

    run(&args).unwrap();

    let output = fs::read_to_string(dir.path().join("out.dxf")).unwrap();
    assert!(!output.contains("0\nLWPOLYLINE\n"));
    assert!(!output.contains("0\nINSERT\n"));
    assert!(output.ends_with("0\nEOF\n"));
}

#[test]
fn missing_rule_table_path_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut args = args(dir.path(), None);
    args.rules = None;
    // An explicit empty config keeps platform configs out of the test.
    args.config = Some(write_fixture(dir.path(), "config.toml", ""));

    let err = run(&args).unwrap_err();
    assert!(err.to_string().contains("rules"));
}
