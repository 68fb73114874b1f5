use ingest::{cleaned_table, IngestError, Loader};
use rust_decimal_macros::dec;
use std::io::Write;
use std::path::Path;

// ── Helpers ──────────────────────────────────────────────────────────────────

const HEADER: &str = "date,sales_amount,units_sold,region,product_category,customer_id,sales_rep";

fn write_csv(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(file, "{body}").unwrap();
    file
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn missing_file_is_data_not_found() {
    let result = Loader::new().load(Path::new("/no/such/sales.csv"));
    assert!(matches!(
        result,
        Err(IngestError::DataNotFound(p)) if p == Path::new("/no/such/sales.csv")
    ));
}

#[test]
fn cleaning_rules_are_applied() {
    let file = write_csv(&format!(
        "{HEADER}\n\
         2024-01-02,20.00,2,north,home & garden,C1,R1\n\
         2024-01-01,10.50,1,south,ELECTRONICS,C2,R2\n\
         2024-01-01,10.50,1,south,ELECTRONICS,C2,R2\n\
         2024-01-03,,1,east,toys,C3,R1\n\
         2024-01-04,-5,1,east,toys,C3,R1\n\
         2024-01-05,5,0,east,toys,C3,R1\n"
    ));

    let outcome = Loader::new().load(file.path()).unwrap();
    let summary = &outcome.summary;
    assert_eq!(summary.raw_rows, 6);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.missing_fields, 1);
    assert_eq!(summary.non_positive, 2);
    assert_eq!(summary.kept, 2);

    let records = outcome.records.records();
    // Sorted by date, text standardised.
    assert_eq!(records[0].region(), "SOUTH");
    assert_eq!(records[0].product_category(), "Electronics");
    assert_eq!(records[0].sales_amount(), dec!(10.50));
    assert_eq!(records[1].product_category(), "Home & Garden");
    assert_eq!(records[1].unit_price(), dec!(10));
}

#[test]
fn duplicates_match_after_date_normalisation() {
    let file = write_csv(&format!(
        "{HEADER}\n\
         2024-01-01,10,1,N,Toys,C1,R1\n\
         2024-01-01 00:00:00,10,1,N,Toys,C1,R1\n\
         2024-01-02,10,1,N,Toys,C1,R1\n"
    ));
    let outcome = Loader::new().load(file.path()).unwrap();
    assert_eq!(outcome.summary.duplicates, 1);
    assert_eq!(outcome.records.len(), 2);
}

#[test]
fn extra_derived_columns_are_ignored() {
    let file = write_csv(
        "date,sales_amount,units_sold,region,product_category,customer_id,sales_rep,unit_price,month\n\
         2024-03-01 00:00:00,30,3,WEST,Toys,C9,R9,10.0,March\n",
    );
    let outcome = Loader::new().load(file.path()).unwrap();
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records.records()[0].units_sold(), 3);
}

#[test]
fn uncoercible_values_name_the_column_and_line() {
    let file = write_csv(&format!("{HEADER}\n2024-01-01,ten,1,N,Toys,C1,R1\n"));
    match Loader::new().load(file.path()) {
        Err(IngestError::InvalidField { line, column, value }) => {
            assert_eq!(line, 2);
            assert_eq!(column, "sales_amount");
            assert_eq!(value, "ten");
        }
        other => panic!("expected invalid field, got {other:?}"),
    }
}

#[test]
fn fractional_units_are_rejected() {
    let file = write_csv(&format!("{HEADER}\n2024-01-01,10,1.5,N,Toys,C1,R1\n"));
    let err = Loader::new().load(file.path()).unwrap_err();
    assert!(err.is_validation_error());
}

#[test]
fn all_rows_filtered_is_an_empty_dataset() {
    let file = write_csv(&format!("{HEADER}\n2024-01-01,0,1,N,Toys,C1,R1\n"));
    assert!(matches!(
        Loader::new().load(file.path()),
        Err(IngestError::EmptyDataset(_))
    ));
}

#[test]
fn cleaned_table_carries_derived_columns() {
    let file = write_csv(&format!("{HEADER}\n2024-05-15,30,4,north,toys,C1,R1\n"));
    let outcome = Loader::new().load(file.path()).unwrap();
    let table = cleaned_table(&outcome.records);

    assert_eq!(table.len(), 1);
    assert_eq!(table.cell(0, "unit_price").unwrap().to_string(), "7.5");
    assert_eq!(table.cell(0, "month").unwrap().to_string(), "May");
    assert_eq!(table.cell(0, "quarter").unwrap().to_string(), "2");
    assert_eq!(table.cell(0, "day_of_week").unwrap().to_string(), "Wednesday");
}
