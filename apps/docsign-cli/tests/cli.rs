//! End-to-end tests of the three binaries

use lopdf::{Dictionary, Document, Object, Stream};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn testdata(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../testdata")
        .join(name)
}

fn add_sigfield() -> Command {
    Command::new(env!("CARGO_BIN_EXE_add-sigfield"))
}

fn sign_pdf() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sign-pdf"))
}

fn extract_text_rows() -> Command {
    Command::new(env!("CARGO_BIN_EXE_extract-text-rows"))
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_blank_pdf(path: &Path) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        b"BT /F1 12 Tf 50 700 Td (Invoice) Tj ET".to_vec(),
    ));

    let mut page = Dictionary::new();
    page.set("Type", Object::Name(b"Page".to_vec()));
    page.set("Parent", Object::Reference(pages_id));
    page.set("Contents", Object::Reference(content_id));
    page.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(595),
            Object::Integer(842),
        ]),
    );
    let page_id = doc.add_object(page);

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(1));
    pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.save(path).unwrap();
}

fn acroform_field_count(path: &Path) -> usize {
    let doc = Document::load(path).unwrap();
    let acroform_id = doc
        .catalog()
        .unwrap()
        .get(b"AcroForm")
        .unwrap()
        .as_reference()
        .unwrap();
    doc.get_dictionary(acroform_id)
        .unwrap()
        .get(b"Fields")
        .unwrap()
        .as_array()
        .unwrap()
        .len()
}

/// blank.pdf with a field named `Signature1` added by the tool
fn prepared_form(dir: &Path) -> PathBuf {
    let blank = dir.join("blank.pdf");
    write_blank_pdf(&blank);
    let form = dir.join("form.pdf");
    let output = add_sigfield().arg(&blank).arg(&form).output().unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    form
}

#[test]
fn add_sigfield_inserts_one_field() {
    let dir = tempfile::tempdir().unwrap();
    let blank = dir.path().join("blank.pdf");
    write_blank_pdf(&blank);
    let form = dir.path().join("form.pdf");

    let output = add_sigfield()
        .arg(&blank)
        .arg(&form)
        .args(["--name", "ApproverSignature", "--rect", "72,72,272,122"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("Added signature field 'ApproverSignature'"));
    assert_eq!(acroform_field_count(&form), 1);
}

#[test]
fn add_sigfield_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.pdf");

    let output = add_sigfield()
        .arg(&missing)
        .arg(dir.path().join("out.pdf"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains(&format!(
        "Error: Input PDF not found: {}",
        missing.display()
    )));
}

#[test]
fn add_sigfield_usage_errors_exit_one() {
    let output = add_sigfield().output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let output = add_sigfield()
        .args(["a.pdf", "b.pdf", "--page", "0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn help_exits_zero() {
    for mut command in [add_sigfield(), sign_pdf(), extract_text_rows()] {
        let output = command.arg("--help").output().unwrap();
        assert_eq!(output.status.code(), Some(0));
        assert!(stdout(&output).contains("Usage"));
    }
}

#[test]
fn add_sigfield_rejects_non_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.pdf");
    std::fs::write(&input, "just text").unwrap();

    let output = add_sigfield()
        .arg(&input)
        .arg(dir.path().join("out.pdf"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Error: failed to add signature field"));
}

#[test]
fn sign_pdf_signs_existing_field() {
    let dir = tempfile::tempdir().unwrap();
    let form = prepared_form(dir.path());
    let signed = dir.path().join("signed.pdf");

    let output = sign_pdf()
        .arg(&form)
        .arg(&signed)
        .arg(testdata("signer.crt"))
        .arg(testdata("signer.key.pem"))
        .arg("Signature1")
        .arg("123e4567-e89b-12d3-a456-426614174000")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(
        stdout(&output).trim(),
        format!("PDF signed successfully: {}", signed.display())
    );

    let original = std::fs::read(&form).unwrap();
    let signed_bytes = std::fs::read(&signed).unwrap();
    assert!(signed_bytes.starts_with(&original));
    let tail = String::from_utf8_lossy(&signed_bytes[original.len()..]).into_owned();
    assert!(tail.contains("/Reason(Digital signature - ID: 123e4567-e89b-12d3-a456-426614174000)"));
}

#[test]
fn sign_pdf_accepts_sec1_key_and_generates_id() {
    let dir = tempfile::tempdir().unwrap();
    let form = prepared_form(dir.path());
    let signed = dir.path().join("signed.pdf");

    let output = sign_pdf()
        .arg(&form)
        .arg(&signed)
        .arg(testdata("signer.crt"))
        .arg(testdata("signer-sec1.key.pem"))
        .arg("Signature1")
        .args(["--reason", "Approved"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(stdout(&output).contains("Document ID: "));
}

#[test]
fn sign_pdf_missing_key() {
    let dir = tempfile::tempdir().unwrap();
    let form = prepared_form(dir.path());
    let missing = dir.path().join("missing.pem");

    let output = sign_pdf()
        .arg(&form)
        .arg(dir.path().join("signed.pdf"))
        .arg(testdata("signer.crt"))
        .arg(&missing)
        .arg("Signature1")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains(&format!(
        "Error: Key not found: {}",
        missing.display()
    )));
}

#[test]
fn sign_pdf_unknown_field() {
    let dir = tempfile::tempdir().unwrap();
    let form = prepared_form(dir.path());

    let output = sign_pdf()
        .arg(&form)
        .arg(dir.path().join("signed.pdf"))
        .arg(testdata("signer.crt"))
        .arg(testdata("signer.key.pem"))
        .arg("KyogakuDendoSignature")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("'KyogakuDendoSignature' not found"));
    assert!(err.contains("available: Signature1"));
}

#[test]
fn sign_pdf_copies() {
    let dir = tempfile::tempdir().unwrap();
    let form = prepared_form(dir.path());
    let out_dir = dir.path().join("signed");

    let output = sign_pdf()
        .arg(&form)
        .arg(&out_dir)
        .arg(testdata("signer.crt"))
        .arg(testdata("signer.key.pem"))
        .arg("Signature1")
        .args(["--copies", "2"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let mut names: Vec<String> = std::fs::read_dir(&out_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), 2);
    assert!(names
        .iter()
        .all(|name| name.starts_with("signed_") && name.ends_with(".pdf")));
}

#[test]
fn sign_pdf_uuid_conflicts_with_copies() {
    let output = sign_pdf()
        .args([
            "in.pdf",
            "out",
            "c.crt",
            "k.pem",
            "Signature1",
            "some-id",
            "--copies",
            "2",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn extract_text_rows_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("scan.png");

    let output = extract_text_rows()
        .arg(&missing)
        .arg(dir.path().join("out"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains(&format!(
        "Error: Input not found: {}",
        missing.display()
    )));
}

#[test]
fn extract_text_rows_empty_directory_json() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("scans");
    std::fs::create_dir(&src).unwrap();
    std::fs::write(src.join("readme.txt"), "not an image").unwrap();

    let output = extract_text_rows()
        .arg(&src)
        .arg(dir.path().join("out"))
        .arg("--json")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["processed"].as_array().unwrap().len(), 0);
    assert_eq!(summary["failed"].as_array().unwrap().len(), 0);
}

#[test]
fn extract_text_rows_reports_failed_images() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("scans");
    std::fs::create_dir(&src).unwrap();
    std::fs::write(src.join("page.png"), "not really a png").unwrap();

    let output = extract_text_rows()
        .arg(&src)
        .arg(dir.path().join("out"))
        .args(["--tesseract", "definitely-not-a-real-tesseract-binary"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("page.png: FAILED"));
    assert!(stderr(&output).contains("Error: 1 of 1 images failed"));
}

const STUB_TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
4\t1\t1\t1\t1\t0\t20\t10\t150\t20\t-1\t
5\t1\t1\t1\t1\t1\t20\t10\t60\t20\t95.2\tInvoice
5\t1\t1\t1\t1\t2\t90\t12\t80\t18\t91\tINV-0042
5\t1\t1\t1\t2\t1\t20\t50\t70\t25\t88.9\tTotal
5\t1\t1\t1\t2\t2\t100\t55\t60\t25\t93.5\t1200
5\t1\t1\t1\t3\t1\t20\t95\t40\t15\t42\tsmudge
";

/// Shell script standing in for tesseract: checks its arguments, then prints
/// `STUB_TSV`
#[cfg(unix)]
fn write_fake_tesseract(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-tesseract");
    std::fs::write(
        &script,
        format!(
            "#!/bin/sh\n\
             if [ \"$#\" -ne 5 ] || [ \"$2\" != stdout ] || [ \"$3\" != -l ] || [ \"$4\" != eng ] || [ \"$5\" != tsv ]; then\n\
             echo \"unexpected arguments: $*\" >&2\n\
             exit 2\n\
             fi\n\
             [ -f \"$1\" ] || {{ echo \"no such image: $1\" >&2; exit 3; }}\n\
             cat <<'TSV'\n{STUB_TSV}TSV\n"
        ),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

fn write_page_image(path: &Path) {
    image::RgbImage::from_pixel(240, 120, image::Rgb([255, 255, 255]))
        .save(path)
        .unwrap();
}

#[cfg(unix)]
#[test]
fn extract_text_rows_single_image() {
    let dir = tempfile::tempdir().unwrap();
    let tesseract = write_fake_tesseract(dir.path());
    let page = dir.path().join("page1.png");
    write_page_image(&page);
    let out = dir.path().join("rows");

    let output = extract_text_rows()
        .arg(&page)
        .arg(&out)
        .args(["--lang", "eng", "--tesseract"])
        .arg(&tesseract)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(stdout(&output).contains("page1.png: 2 rows"));

    let line_1 = image::open(out.join("page1/line_1.png")).unwrap();
    assert_eq!((line_1.width(), line_1.height()), (240, 20));
    let line_2 = image::open(out.join("page1/line_2.png")).unwrap();
    assert_eq!((line_2.width(), line_2.height()), (240, 30));
    // Confidence 42 is below the default threshold
    assert!(!out.join("page1/line_3.png").exists());
}

#[cfg(unix)]
#[test]
fn extract_text_rows_directory_json_summary() {
    let dir = tempfile::tempdir().unwrap();
    let tesseract = write_fake_tesseract(dir.path());
    let src = dir.path().join("scans");
    std::fs::create_dir(&src).unwrap();
    write_page_image(&src.join("a.png"));
    write_page_image(&src.join("b.PNG"));
    std::fs::write(src.join("notes.txt"), "skip me").unwrap();
    let out = dir.path().join("rows");

    let output = extract_text_rows()
        .arg(&src)
        .arg(&out)
        .args(["--lang", "eng", "--min-confidence", "90", "--json"])
        .env("TESSERACT_CMD", &tesseract)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["failed"].as_array().unwrap().len(), 0);

    let processed = summary["processed"].as_array().unwrap();
    assert_eq!(processed.len(), 2);
    for report in processed {
        assert_eq!(report["words"], 6);
        let rows = report["rows"].as_array().unwrap();
        // Only words above 90: "Invoice", "INV-0042" and "1200"
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["line_num"], 1);
        assert_eq!(rows[0]["top"], 10);
        assert_eq!(rows[0]["bottom"], 30);
        assert_eq!(rows[1]["line_num"], 2);
        assert_eq!(rows[1]["top"], 55);
        assert_eq!(rows[1]["bottom"], 80);
    }

    assert!(out.join("a/line_1.png").exists());
    assert!(out.join("b/line_2.png").exists());
}

#[cfg(unix)]
#[test]
fn extract_text_rows_wrong_language_fails() {
    let dir = tempfile::tempdir().unwrap();
    let tesseract = write_fake_tesseract(dir.path());
    let page = dir.path().join("page1.png");
    write_page_image(&page);

    let output = extract_text_rows()
        .arg(&page)
        .arg(dir.path().join("rows"))
        .args(["--lang", "jpn", "--tesseract"])
        .arg(&tesseract)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert!(stderr.contains("Error: failed to process"));
    assert!(stderr.contains("unexpected arguments"));
    assert!(stderr.contains("Caused by:"));
}
