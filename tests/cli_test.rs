use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::path::Path;
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

// Compress and expand through the binary, then compare with the original.
fn round_trip_test(in_path: &Path,temp_dir: &tempfile::TempDir) -> STDRESULT {
    let cmp_path = temp_dir.path().join("compressed.huf");
    let out_path = temp_dir.path().join("expanded.bin");
    Command::cargo_bin("huffpack")?
        .arg(in_path)
        .arg("-c").arg(&cmp_path)
        .assert()
        .success();
    Command::cargo_bin("huffpack")?
        .arg(&cmp_path)
        .arg("-u").arg(&out_path)
        .assert()
        .success();
    match (std::fs::read(in_path),std::fs::read(out_path)) {
        (Ok(v1),Ok(v2)) => {
            assert_eq!(v1,v2);
        },
        _ => panic!("unable to compare output with reference")
    }
    Ok(())
}

#[test]
fn text_round_trip() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    round_trip_test(&Path::new("tests").join("sample.txt"),&temp_dir)
}

#[test]
fn empty_round_trip() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("empty.txt");
    std::fs::write(&in_path,"")?;
    round_trip_test(&in_path,&temp_dir)?;
    assert_eq!(std::fs::read(temp_dir.path().join("compressed.huf"))?,vec![0,0,0,0]);
    Ok(())
}

#[test]
fn binary_round_trip() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("ramp.bin");
    let dat: Vec<u8> = (0..20000u32).map(|i| (i % 256) as u8 ^ (i / 700) as u8).collect();
    std::fs::write(&in_path,dat)?;
    round_trip_test(&in_path,&temp_dir)
}

#[test]
fn text_shrinks() -> STDRESULT {
    let in_path = Path::new("tests").join("sample.txt");
    Command::cargo_bin("huffpack")?
        .arg(&in_path)
        .arg("-s")
        .assert()
        .success()
        .stdout(predicate::str::contains("ratio"))
        .stdout(predicate::str::contains("tree nodes"));
    Ok(())
}

#[test]
fn print_tables() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("aaab.txt");
    std::fs::write(&in_path,"AAAB")?;
    Command::cargo_bin("huffpack")?
        .arg(&in_path)
        .arg("-f").arg("-t").arg("-b")
        .assert()
        .success()
        .stdout(predicate::str::contains("Frequency table, 2 symbols, 4 bytes"))
        .stdout(predicate::str::contains("Code tree, 3 nodes"))
        .stdout(predicate::str::contains("'A' 1"))
        .stdout(predicate::str::contains("'B' 0"));
    Ok(())
}

#[test]
fn corrupt_input_fails() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("bad.huf");
    let out_path = temp_dir.path().join("bad.txt");
    // claims 3 nodes but holds only 2 records
    std::fs::write(&in_path,[0u8,0,0,3,1,0x42,0,0,0,1,1,0x41,0,0,0,3])?;
    Command::cargo_bin("huffpack")?
        .arg(&in_path)
        .arg("-u").arg(&out_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("MalformedTree"));
    Ok(())
}

#[test]
fn compress_and_uncompress_conflict() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    Command::cargo_bin("huffpack")?
        .arg(Path::new("tests").join("sample.txt"))
        .arg("-c").arg(temp_dir.path().join("a"))
        .arg("-u").arg(temp_dir.path().join("b"))
        .assert()
        .failure();
    Ok(())
}
