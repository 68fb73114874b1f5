use chrono::Utc;
use configuration::Delimiter;
use core_types::{Cell, Table};
use report::{Manifest, ReportAssembler, MANIFEST_FILE};
use std::fs;
use uuid::Uuid;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn regional() -> Table {
    let mut table = Table::new(
        "regional_analysis",
        ["Region", "Total Sales", "Sales per Customer"],
    );
    table.push_row(vec![Cell::text("NORTH"), Cell::Integer(300), Cell::Null]);
    table.push_row(vec![Cell::text("SOUTH, EAST"), Cell::Integer(100), Cell::Integer(50)]);
    table
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn writes_header_rows_and_empty_nulls() {
    let dir = tempfile::tempdir().unwrap();
    let assembler = ReportAssembler::new(dir.path().join("tables"), Delimiter::Comma);

    let artifact = assembler.write_table(&regional()).unwrap();
    assert_eq!(artifact.file, "regional_analysis.csv");
    assert_eq!(artifact.rows, 2);

    let written = fs::read_to_string(assembler.path_for("regional_analysis")).unwrap();
    assert_eq!(
        written,
        "Region,Total Sales,Sales per Customer\nNORTH,300,\n\"SOUTH, EAST\",100,50\n"
    );
}

#[test]
fn tab_delimiter_uses_tsv_extension() {
    let dir = tempfile::tempdir().unwrap();
    let assembler = ReportAssembler::new(dir.path(), Delimiter::Tab);

    let artifacts = assembler.write_all(&[regional()]).unwrap();
    assert_eq!(artifacts[0].file, "regional_analysis.tsv");

    let written = fs::read_to_string(dir.path().join("regional_analysis.tsv")).unwrap();
    assert!(written.starts_with("Region\tTotal Sales\tSales per Customer\n"));
}

#[test]
fn manifest_lists_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let assembler = ReportAssembler::new(dir.path(), Delimiter::Comma);
    let artifacts = assembler.write_all(&[regional()]).unwrap();

    let run_id = Uuid::new_v4();
    let path = assembler
        .write_manifest(&Manifest {
            run_id,
            generated_at: Utc::now(),
            record_count: 7,
            artifacts,
        })
        .unwrap();
    assert_eq!(path, dir.path().join(MANIFEST_FILE));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["run_id"], run_id.to_string());
    assert_eq!(json["record_count"], 7);
    assert_eq!(json["artifacts"][0]["name"], "regional_analysis");
}

#[test]
fn explicit_path_creates_missing_parents() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("processed").join("cleaned.csv");
    let assembler = ReportAssembler::new(dir.path(), Delimiter::Semicolon);

    let artifact = assembler.write_table_to(&regional(), &target).unwrap();
    assert_eq!(artifact.file, "cleaned.csv");
    assert_eq!(artifact.name, "regional_analysis");

    let written = fs::read_to_string(target).unwrap();
    assert!(written.starts_with("Region;Total Sales;Sales per Customer\nNORTH;300;\n"));
}
