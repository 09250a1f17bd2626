//! End-to-end tests driving the `konspekt` binary with the hash embedder.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn konspekt_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("konspekt");
    path
}

/// PDF with one text line per page, xref offsets computed as the body is built.
fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let n = pages.len();
    let mut out = Vec::new();
    let mut offsets = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    offsets.push(out.len());
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");

    let kids: Vec<String> = (0..n).map(|i| format!("{} 0 R", 4 + 2 * i)).collect();
    offsets.push(out.len());
    out.extend_from_slice(
        format!(
            "2 0 obj << /Type /Pages /Kids [{}] /Count {} >> endobj\n",
            kids.join(" "),
            n
        )
        .as_bytes(),
    );

    offsets.push(out.len());
    out.extend_from_slice(
        b"3 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );

    for (i, text) in pages.iter().enumerate() {
        let page_id = 4 + 2 * i;
        let content_id = page_id + 1;
        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{} 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {} 0 R /Resources << /Font << /F1 3 0 R >> >> >> endobj\n",
                page_id, content_id
            )
            .as_bytes(),
        );
        let stream = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text);
        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{} 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
                content_id,
                stream.len(),
                stream
            )
            .as_bytes(),
        );
    }

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", offsets.len() + 1).as_bytes());
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for o in &offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", o).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer << /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            offsets.len() + 1,
            xref_start
        )
        .as_bytes(),
    );
    out
}

fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
        body
    );
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

fn write_config(root: &Path, extra: &str) -> PathBuf {
    let config = format!(
        r#"[index]
dir = "{}/db"

[embedding]
provider = "hash"
dims = 128
batch_size = 2

[retrieval]
k = 3
preview_chars = 120
{}
"#,
        root.display(),
        extra
    );
    let path = root.join("konspekt.toml");
    fs::write(&path, config).unwrap();
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    let notes = root.join("notes");
    fs::create_dir_all(&notes).unwrap();

    fs::write(
        notes.join("geography.txt"),
        "The capital of France is Paris.\x0cThe Danube flows through Vienna and Budapest.",
    )
    .unwrap();
    fs::write(
        notes.join("biology.md"),
        "# Cells\n\nMitochondria produce ATP through cellular respiration.\n\nRibosomes build proteins.",
    )
    .unwrap();

    let config_path = write_config(&root, "");
    (tmp, config_path)
}

fn run_konspekt(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    run_konspekt_with_stdin(config_path, args, "")
}

fn run_konspekt_with_stdin(config_path: &Path, args: &[&str], stdin: &str) -> (String, String, bool) {
    let binary = konspekt_binary();
    let mut child = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("Failed to run konspekt binary at {:?}: {}", binary, e));
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn notes(config_path: &Path, name: &str) -> String {
    config_path
        .parent()
        .unwrap()
        .join("notes")
        .join(name)
        .to_str()
        .unwrap()
        .to_string()
}

#[test]
fn test_ingest_reports_pages_and_fragments() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) =
        run_konspekt(&config_path, &["ingest", &notes(&config_path, "geography.txt")]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Ingested geography.txt: 2 pages, 2 fragments added (index now holds 2)"));
}

#[test]
fn test_ingest_directory_then_stats() {
    let (_tmp, config_path) = setup_test_env();
    let dir = config_path.parent().unwrap().join("notes");

    let (stdout, stderr, success) = run_konspekt(&config_path, &["ingest", dir.to_str().unwrap()]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Ingested biology.md"));
    assert!(stdout.contains("Ingested geography.txt"));

    let (stdout, _, success) = run_konspekt(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Fragments:   3"), "stats: {}", stdout);
    assert!(stdout.contains("Dimensions:  128"));
    assert!(stdout.contains("Model:       hash-128"));
    assert!(stdout.contains("geography.txt"));
}

#[test]
fn test_ask_returns_cited_fragment() {
    let (_tmp, config_path) = setup_test_env();
    run_konspekt(&config_path, &["ingest", &notes(&config_path, "geography.txt")]);

    let (stdout, stderr, success) = run_konspekt(
        &config_path,
        &["ask", "What is the capital of France?", "-k", "1"],
    );
    assert!(success, "ask failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("--- Source 1 (page 1, geography.txt) ---"));
    assert!(stdout.contains("The capital of France is Paris."));
    assert!(!stdout.contains("Source 2"));
}

#[test]
fn test_ask_json_output() {
    let (_tmp, config_path) = setup_test_env();
    run_konspekt(&config_path, &["ingest", &notes(&config_path, "geography.txt")]);

    let (stdout, _, success) =
        run_konspekt(&config_path, &["ask", "Which river flows through Vienna?", "--json", "-k", "5"]);
    assert!(success);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["fragment"]["page"], 2);
    assert_eq!(results[0]["fragment"]["source"], "geography.txt");
    let first = results[0]["relevance_score"].as_f64().unwrap();
    let second = results[1]["relevance_score"].as_f64().unwrap();
    assert!(first >= second);
}

#[test]
fn test_ask_on_empty_index() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) = run_konspekt(&config_path, &["ask", "Anything?"]);
    assert!(success);
    assert!(stdout.contains("No information found for your question."));
}

#[test]
fn test_ingest_twice_doubles_index() {
    let (_tmp, config_path) = setup_test_env();
    let path = notes(&config_path, "biology.md");
    run_konspekt(&config_path, &["ingest", &path]);
    let (stdout, _, success) = run_konspekt(&config_path, &["ingest", &path]);
    assert!(success);
    assert!(stdout.contains("(index now holds 2)"));

    let (stdout, _, _) = run_konspekt(&config_path, &["stats"]);
    assert!(stdout.contains("Fragments:   2"));
    assert!(stdout.contains("Distinct:    1"));
}

#[test]
fn test_ingest_pdf_per_page() {
    let (_tmp, config_path) = setup_test_env();
    let pdf = config_path.parent().unwrap().join("notes").join("lecture.pdf");
    fs::write(
        &pdf,
        pdf_with_pages(&["Photosynthesis happens in chloroplasts", "Glycolysis splits glucose"]),
    )
    .unwrap();

    let (stdout, stderr, success) = run_konspekt(&config_path, &["ingest", pdf.to_str().unwrap()]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Ingested lecture.pdf: 2 pages, 2 fragments added"));

    let (stdout, _, _) = run_konspekt(&config_path, &["ask", "glycolysis glucose", "--json", "-k", "1"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["results"][0]["fragment"]["page"], 2);
}

#[test]
fn test_ingest_docx() {
    let (_tmp, config_path) = setup_test_env();
    let docx = config_path.parent().unwrap().join("notes").join("essay.docx");
    fs::write(&docx, docx_with_paragraphs(&["Enzymes lower activation energy.", "They are proteins."]))
        .unwrap();

    let (stdout, stderr, success) = run_konspekt(&config_path, &["ingest", docx.to_str().unwrap()]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Ingested essay.docx: 1 page, 1 fragment added"));
}

#[test]
fn test_ingest_missing_file_fails() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_konspekt(&config_path, &["ingest", "/nonexistent/notes.pdf"]);
    assert!(!success);
    assert!(stderr.contains("Could not read /nonexistent/notes.pdf"), "stderr: {}", stderr);
}

#[test]
fn test_ingest_unsupported_file_fails() {
    let (_tmp, config_path) = setup_test_env();
    let sheet = config_path.parent().unwrap().join("table.xlsx");
    fs::write(&sheet, b"PK").unwrap();
    let (_, stderr, success) = run_konspekt(&config_path, &["ingest", sheet.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("unsupported file type"));
}

#[test]
fn test_invalid_chunking_config_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(tmp.path(), "\n[chunking]\nchunk_size = 100\nchunk_overlap = 150\n");
    let (_, stderr, success) = run_konspekt(&config_path, &["stats"]);
    assert!(!success);
    assert!(stderr.contains("chunk_overlap"), "stderr: {}", stderr);
}

#[test]
fn test_changing_dims_is_reported() {
    let (tmp, config_path) = setup_test_env();
    run_konspekt(&config_path, &["ingest", &notes(&config_path, "biology.md")]);

    let other = tmp.path().join("other.toml");
    fs::write(
        &other,
        fs::read_to_string(&config_path)
            .unwrap()
            .replace("dims = 128", "dims = 64"),
    )
    .unwrap();
    let (_, stderr, success) = run_konspekt(&other, &["ask", "ATP?"]);
    assert!(!success);
    assert!(stderr.contains("konspekt clear"), "stderr: {}", stderr);
}

#[test]
fn test_clear_requires_confirmation() {
    let (tmp, config_path) = setup_test_env();
    run_konspekt(&config_path, &["ingest", &notes(&config_path, "biology.md")]);
    let db = tmp.path().join("db");
    assert!(db.exists());

    let (stdout, _, success) = run_konspekt_with_stdin(&config_path, &["clear"], "n\n");
    assert!(success);
    assert!(stdout.contains("Aborted."));
    assert!(db.exists());

    let (stdout, _, success) = run_konspekt(&config_path, &["clear", "--yes"]);
    assert!(success);
    assert!(stdout.contains("Index cleared"));
    assert!(!db.exists());

    let (stdout, _, _) = run_konspekt(&config_path, &["stats"]);
    assert!(stdout.contains("Fragments:   0"));
}

#[test]
fn test_chat_session() {
    let (_tmp, config_path) = setup_test_env();
    let script = format!(
        ":ingest {}\nWhat produces ATP?\n:stats\n:quit\n",
        notes(&config_path, "biology.md")
    );
    let (stdout, stderr, success) = run_konspekt_with_stdin(&config_path, &["chat"], &script);
    assert!(success, "chat failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Ingested biology.md"));
    assert!(stdout.contains("--- Source 1 (page 1, biology.md) ---"));
    assert!(stdout.contains("Fragments:   1"));
}
