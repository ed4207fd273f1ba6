/*!
Test for BOM and encoding handling in LSL files
*/

use lsl_analyzer::core::read_lsl_file;
use lsl_analyzer::LslParser;
use std::io::Write;
use tempfile::NamedTempFile;

const SCRIPT: &str = "default { state_entry() { llOwnerSay(\"Привет\"); } }";

#[test]
fn test_utf8_bom_bytes() -> std::io::Result<()> {
    let mut temp_file = NamedTempFile::new()?;
    let mut content = vec![0xEF, 0xBB, 0xBF];
    content.extend_from_slice(SCRIPT.as_bytes());
    temp_file.write_all(&content)?;

    let content = read_lsl_file(temp_file.path()).unwrap();
    assert!(!content.starts_with('\u{FEFF}'));
    assert_eq!(content, SCRIPT);
    Ok(())
}

#[test]
fn test_utf16le_with_bom() -> std::io::Result<()> {
    let mut temp_file = NamedTempFile::new()?;
    let mut content = vec![0xFF, 0xFE];
    for unit in SCRIPT.encode_utf16() {
        content.extend_from_slice(&unit.to_le_bytes());
    }
    temp_file.write_all(&content)?;

    let content = read_lsl_file(temp_file.path()).unwrap();
    assert_eq!(content, SCRIPT);
    Ok(())
}

#[test]
fn test_bom_does_not_shift_diagnostics() -> std::io::Result<()> {
    let mut temp_file = NamedTempFile::new()?;
    temp_file.write_all("\u{FEFF}default { state_entry() { x = 1; } }".as_bytes())?;

    let result = LslParser::new().parse_file(temp_file.path()).unwrap();
    assert_eq!(result.diagnostics.len(), 1);
    let location = &result.diagnostics[0].location;
    assert_eq!(location.offset, "default { state_entry() { ".len());
    assert_eq!(location.line, 1);
    Ok(())
}
