use std::fs;
use std::path::Path;

use clap::Parser;
use json_pg::cli::CommandLineInterface;
use json_pg::config::Config;
use json_pg::error::Error;
use pretty_assertions::assert_eq;
use serde_json::json;

fn run(args: &[&str]) -> anyhow::Result<()> {
    let cli = CommandLineInterface::try_parse_from(std::iter::once("json-pg").chain(args.iter().copied()))?;
    cli.run()
}

fn path_str(p: &Path) -> &str {
    p.to_str().unwrap()
}

const LOG: &str = r#"{"ts": "2021-10-20T10:00:00.000Z", "level": "info", "user": {"name": "ann", "id": 10}, "tags": ["a", "b"]}
{"ts": "2021-10-20T10:00:01.250Z", "level": "warn", "user": {"name": "bob", "id": 11}, "tags": ["c"], "msg": "disk full"}
{"ts": "2021-10-20T10:00:02.500Z", "level": "info", "user": {"name": "cy", "id": 12}, "tags": []}
{"ts": "2021-10-20T10:00:03.750Z", "level": "error", "user": {"name": "dee", "id": 13}, "tags": ["d"], "msg": null}
"#;

#[test]
fn model_command_writes_the_full_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("app.log");
    let out = dir.path().join("out/model.yml");
    fs::write(&input, LOG).unwrap();

    run(&["model", "-i", path_str(&input), "-o", path_str(&out)]).unwrap();

    let expected = "\
Parser:
        - id: ts_time0
          type: DateTimeModelElement
          name: 'ts_time0'
          date_format: '%Y-%m-%dT%H:%M:%S.%fZ'

        - id: level_list0
          type: FixedWordlistDataModelElement
          name: 'level_list0'
          args:
          - \"error\"
          - \"info\"
          - \"warn\"

        - id: name_var0
          type: VariableByteDataModelElement
          name: 'name_var0'
          args: \"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-_\"

        - id: id_int
          type: DecimalIntegerValueModelElement
          name: 'id_int'

        - id: tags_var0
          type: VariableByteDataModelElement
          name: 'tags_var0'
          args: \"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-_\"

        - id: msg_str0
          type: FixedDataModelElement
          name: 'msg_str0'
          args: 'disk full'

        - id: json
          start: True
          type: JsonModelElement
          name: 'model'
          optional_key_prefix: '_'
          nullable_key_prefix: '+'
          key_parser_dict:
            ts: ts_time0
            level: level_list0
            user:
              name: name_var0
              id: id_int
            tags:
              - tags_var0
            +_msg: msg_str0
";
    assert_eq!(fs::read_to_string(&out).unwrap(), expected);
}

#[test]
fn config_file_and_flags_combine() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("nums.log");
    let config = dir.path().join("config.json");
    let out = dir.path().join("model.yml");
    fs::write(&input, "{\"n\": 1}\n{\"n\": -2}\n").unwrap();
    let config_src = json!({ "input_files": [path_str(&input)], "output_file": path_str(&out), "max_enum_values": 10 });
    fs::write(&config, config_src.to_string()).unwrap();

    // the flag lowers the word-list limit below the two observed values
    run(&["model", "--config", path_str(&config), "--max-enum-values", "1"]).unwrap();

    let model = fs::read_to_string(&out).unwrap();
    assert!(model.contains("- id: n_intopt"), "{model}");
    assert!(model.contains("value_sign_type: 'optional'"), "{model}");
    assert!(model.ends_with("            n: n_intopt\n"), "{model}");
}

#[test]
fn exhausted_markers_abort_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("keys.log");
    let config = dir.path().join("config.json");
    let out = dir.path().join("model.yml");
    fs::write(&input, "{\"_a\": 1, \"+b\": 2}\n").unwrap();
    fs::write(&config, r#"{ "marker_candidates": ["_", "+", "~"] }"#).unwrap();

    let err = run(&["model", "-c", path_str(&config), "-i", path_str(&input), "-o", path_str(&out)]).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::MarkersExhausted { candidates: 3, found: 1 })));
    assert!(!out.exists());
}

#[test]
fn schema_command_writes_debug_view() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("wrapped.log");
    let out = dir.path().join("schema.json");
    fs::write(&input, "{\"event\": {\"a\": 1}}\n{\"event\": {\"b\": null}}\n").unwrap();

    run(&["schema", "-i", path_str(&input), "--json-pointer", "/event", "-o", path_str(&out)]).unwrap();

    let schema: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(schema["schema"]["fields"]["a"]["optional"], json!(true));
    assert_eq!(schema["schema"]["fields"]["b"]["nullable"], json!(true));
    assert_eq!(schema["schema"]["fields"]["b"]["schema"]["witnesses"], json!([null]));
}

#[test]
fn decode_errors_are_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.log");
    let out = dir.path().join("model.yml");
    fs::write(&input, "{\"a\": 1}\nnot json\n").unwrap();

    let err = run(&["model", "-i", path_str(&input), "-o", path_str(&out)]).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Decode { line: 2, .. })), "{err:?}");
    assert!(!out.exists());
}

#[test]
fn library_entry_point_matches_scenarios() {
    let config = Config::default();
    let samples = [json!({"a": null}), json!({"a": "x"})];
    let model = json_pg::generate_model(&samples, &config).unwrap();
    assert_eq!(model.catalog.len(), 1);
    assert!(model.structure.ends_with("+a: a_str0"));

    let none: [serde_json::Value; 0] = [];
    assert!(matches!(json_pg::generate_model(&none, &config), Err(Error::NoSamples)));
}
