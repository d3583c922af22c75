use std::fs;

use svg2raphael::convert_file;

#[test]
fn test_valid_fixtures() -> Result<(), Box<dyn std::error::Error>> {
    let valid_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/valid");
    for entry in fs::read_dir(valid_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("svg") {
            continue;
        }
        let emission = convert_file(&path)
            .map_err(|e| std::io::Error::other(format!("{}: {e}", path.display())))?;
        let expected = fs::read_to_string(path.with_extension("js"))?;
        assert_eq!(
            emission.to_script(),
            expected.trim_end(),
            "{}",
            path.display()
        );
    }
    Ok(())
}

#[test]
fn test_invalid_fixtures() -> Result<(), Box<dyn std::error::Error>> {
    let invalid_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/invalid");
    for entry in fs::read_dir(invalid_dir)? {
        let path = entry?.path();
        if convert_file(&path).is_ok() {
            return Err(std::io::Error::other(format!(
                "Should fail to convert invalid file: {path:?}"
            ))
            .into());
        }
    }
    Ok(())
}
