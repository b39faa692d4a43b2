//! Tests for reference table loading.

use std::fs;

use pqa_ingest::{
    COUNTY_FIPS_FILE, IngestError, ReferencePaths, STATE_CODES_FILE, load_references,
    read_county_fips, read_state_codes,
};
use tempfile::TempDir;

#[test]
fn state_codes_headers_are_case_insensitive_and_fips_padded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(STATE_CODES_FILE);
    fs::write(
        &path,
        "\u{feff}State,State_PO,State_FIPS,State_CEN,State_IC\nAlabama,AL,1,63,41\nAlaska,ak,2,94,81\n",
    )
    .unwrap();

    let table = read_state_codes(&path).unwrap();
    assert_eq!(table.len(), 2);
    let alaska = table.by_po("AK").unwrap();
    assert_eq!(alaska.state, "Alaska");
    assert_eq!(alaska.state_fips, "02");
    assert_eq!(alaska.state_cen, "94");
}

#[test]
fn county_fips_padded_to_five() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(COUNTY_FIPS_FILE);
    fs::write(
        &path,
        "state,county_name,county_fips\nAlabama,AUTAUGA,1001\nAlabama,BALDWIN,01003\n",
    )
    .unwrap();

    let table = read_county_fips(&path).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.get("01001").unwrap().county_name, "AUTAUGA");
    assert_eq!(table.get("01003").unwrap().state_prefix(), "01");
}

#[test]
fn missing_reference_files_become_absent() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(STATE_CODES_FILE),
        "state,state_po,state_fips\nAlabama,AL,01\n",
    )
    .unwrap();

    let references = load_references(&ReferencePaths::in_dir(dir.path())).unwrap();
    assert!(references.state_codes.is_present());
    assert!(!references.county_fips.is_present());
    assert!(
        references
            .county_fips
            .absent_reason()
            .unwrap()
            .contains(COUNTY_FIPS_FILE)
    );
}

#[test]
fn missing_required_column_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(STATE_CODES_FILE);
    fs::write(&path, "name,po\nAlabama,AL\n").unwrap();

    let err = read_state_codes(&path).unwrap_err();
    assert!(matches!(err, IngestError::MissingColumn { column, .. } if column == "state"));
}
