//! Integration tests for the PDF signer library

use image::{Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdf_signer::layout::{ImageFit, Rect};
use pdf_signer::pdf::{
    count_pages, extract_metadata, inspect_pages, stamp, stamp_with_image, SignatureImage,
    StampRequest,
};
use pdf_signer::{Error, PageSelector};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Write a Letter-sized PDF with one line of text per page
///
/// All pages share a single Resources object, as most generators emit.
fn create_test_pdf(path: &Path, page_count: usize) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
    )]));

    let mut kids = Vec::new();
    for number in 1..=page_count {
        let content = format!("BT /F1 24 Tf 72 700 Td (Page {}) Tj ET", number);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_count as i64)),
        ("Kids", Object::Array(kids)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.save(path).expect("Failed to write test PDF");
}

/// Write a small opaque PNG signature (4x2 pixels)
fn create_test_image(path: &Path) {
    RgbaImage::from_pixel(4, 2, Rgba([0, 0, 128, 255]))
        .save(path)
        .expect("Failed to write test image");
}

struct Fixture {
    _temp_dir: TempDir,
    pdf: PathBuf,
    image: PathBuf,
    output: PathBuf,
}

fn fixture(page_count: usize) -> Fixture {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let pdf = temp_dir.path().join("contract.pdf");
    let image = temp_dir.path().join("signature.png");
    let output = temp_dir.path().join("signed.pdf");

    create_test_pdf(&pdf, page_count);
    create_test_image(&image);

    Fixture { _temp_dir: temp_dir, pdf, image, output }
}

fn request(fixture: &Fixture, selector: PageSelector) -> StampRequest {
    StampRequest {
        source: fixture.pdf.clone(),
        image: fixture.image.clone(),
        rect: Rect::new(100.0, 100.0, 50.0, 50.0),
        selector,
        output: Some(fixture.output.clone()),
        fit: ImageFit::Stretch,
    }
}

fn page_id(doc: &Document, number: u32) -> ObjectId {
    doc.get_pages()[&number]
}

fn page_text(doc: &Document, number: u32) -> String {
    let content = doc
        .get_page_content(page_id(doc, number))
        .expect("Failed to read page content");
    String::from_utf8_lossy(&content).into_owned()
}

/// Debug rendering of a page dictionary, for unchanged-page comparisons
fn page_snapshot(doc: &Document, number: u32) -> String {
    format!("{:?}", doc.get_object(page_id(doc, number)).unwrap())
}

/// XObject names registered directly on a page that point at image streams
fn image_xobject_names(doc: &Document, number: u32) -> Vec<String> {
    let page = doc.get_object(page_id(doc, number)).unwrap().as_dict().unwrap();
    let Ok(Object::Dictionary(resources)) = page.get(b"Resources") else {
        return vec![];
    };
    let Ok(xobjects) = resources.get(b"XObject").and_then(Object::as_dict) else {
        return vec![];
    };

    xobjects
        .iter()
        .filter(|(_, value)| {
            let Ok(id) = value.as_reference() else { return false };
            let Ok(stream) = doc.get_object(id).and_then(Object::as_stream) else {
                return false;
            };
            matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Image")
        })
        .map(|(key, _)| String::from_utf8_lossy(key).into_owned())
        .collect()
}

#[test]
fn test_range_scenario_stamps_pages_two_and_three() {
    let fixture = fixture(3);
    let input = Document::load(&fixture.pdf).unwrap();

    let report = stamp(&request(&fixture, "2-3".parse().unwrap()))
        .expect("Failed to stamp PDF");

    assert_eq!(report.page_count, 3);
    assert_eq!(report.stamped_pages, vec![2, 3]);
    assert_eq!(report.output, fixture.output);

    let output = Document::load(&fixture.output).expect("Failed to load signed PDF");
    assert_eq!(output.get_pages().len(), 3);

    // Page 1 is untouched
    assert_eq!(page_snapshot(&output, 1), page_snapshot(&input, 1));
    assert_eq!(page_text(&output, 1), page_text(&input, 1));
    assert!(image_xobject_names(&output, 1).is_empty());

    // Pages 2 and 3 draw the image over (100,100)-(150,150), top-left origin
    for number in [2, 3] {
        let text = page_text(&output, number);
        assert!(text.starts_with("q\n"), "original content not isolated: {}", text);
        assert!(text.contains(&format!("(Page {}) Tj", number)));
        assert!(text.contains("50 0 0 50 100 642 cm"), "unexpected placement: {}", text);
        assert!(text.contains("/Sig1 Do"));
        assert_eq!(image_xobject_names(&output, number), vec!["Sig1".to_string()]);
    }
}

#[test]
fn test_all_stamps_every_page() {
    let fixture = fixture(4);

    let report = stamp(&request(&fixture, PageSelector::All)).expect("Failed to stamp PDF");
    assert_eq!(report.stamped_pages, vec![1, 2, 3, 4]);

    let output = Document::load(&fixture.output).unwrap();
    assert_eq!(output.get_pages().len(), 4);
    for number in 1..=4 {
        assert_eq!(image_xobject_names(&output, number).len(), 1);
    }
}

#[test]
fn test_inverted_range_saves_document_unchanged() {
    let fixture = fixture(3);
    let input = Document::load(&fixture.pdf).unwrap();

    let report = stamp(&request(&fixture, PageSelector::Range(3, 1))).expect("Failed to stamp PDF");
    assert!(report.stamped_pages.is_empty());
    assert!(fixture.output.exists(), "Output should still be written");

    let output = Document::load(&fixture.output).unwrap();
    assert_eq!(output.objects.len(), input.objects.len());
    for number in 1..=3 {
        assert_eq!(page_snapshot(&output, number), page_snapshot(&input, number));
        assert_eq!(page_text(&output, number), page_text(&input, number));
    }
}

#[test]
fn test_specific_pages_ignore_numbers_past_the_end() {
    let fixture = fixture(3);
    let input = Document::load(&fixture.pdf).unwrap();

    let report = stamp(&request(&fixture, "2,9".parse().unwrap())).expect("Failed to stamp PDF");
    assert_eq!(report.stamped_pages, vec![2]);

    let output = Document::load(&fixture.output).unwrap();
    assert_eq!(output.get_pages().len(), 3);
    for number in [1, 3] {
        assert_eq!(page_snapshot(&output, number), page_snapshot(&input, number));
    }
    assert_eq!(image_xobject_names(&output, 2), vec!["Sig1".to_string()]);
}

#[test]
fn test_page_count_survives_every_selector() {
    let fixture = fixture(5);
    let selectors = [
        PageSelector::All,
        PageSelector::Range(2, 4),
        PageSelector::Range(4, 2),
        "1,5,7".parse().unwrap(),
    ];

    for selector in selectors {
        stamp(&request(&fixture, selector.clone())).expect("Failed to stamp PDF");
        assert_eq!(
            count_pages(&fixture.output).unwrap(),
            5,
            "page count changed for selector {}",
            selector
        );
    }
}

/// Run the command-line tool with `args`
fn run_cli(args: &[&OsStr]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pdf-signer"))
        .args(args)
        .output()
        .expect("Failed to run pdf-signer")
}

fn sign_args<'a>(fixture: &'a Fixture, pages: &'a str, x: &'a str) -> Vec<&'a OsStr> {
    vec![
        OsStr::new("sign"),
        fixture.pdf.as_os_str(),
        OsStr::new("--image"),
        fixture.image.as_os_str(),
        OsStr::new("--x"),
        OsStr::new(x),
        OsStr::new("--y"),
        OsStr::new("100"),
        OsStr::new("--width"),
        OsStr::new("150"),
        OsStr::new("--height"),
        OsStr::new("50"),
        OsStr::new("--pages"),
        OsStr::new(pages),
    ]
}

#[test]
fn test_cli_malformed_selector_creates_no_output() {
    let fixture = fixture(3);
    let default_output = fixture.pdf.with_file_name("contract_signed.pdf");

    let output = run_cli(&sign_args(&fixture, "abc", "100"));

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to sign PDF: Invalid page selection"),
        "unexpected stderr: {}",
        stderr
    );
    assert!(!default_output.exists());
}

#[test]
fn test_cli_signs_with_default_output() {
    let fixture = fixture(3);
    let default_output = fixture.pdf.with_file_name("contract_signed.pdf");

    let output = run_cli(&sign_args(&fixture, "2-3", "100"));

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Signed PDF saved as"), "unexpected stdout: {}", stdout);

    let signed = Document::load(&default_output).expect("Failed to load signed PDF");
    assert!(image_xobject_names(&signed, 1).is_empty());
    assert_eq!(image_xobject_names(&signed, 2), vec!["Sig1".to_string()]);
}

#[test]
fn test_cli_rejects_non_finite_coordinates() {
    let fixture = fixture(1);
    let default_output = fixture.pdf.with_file_name("contract_signed.pdf");

    let output = run_cli(&sign_args(&fixture, "all", "nan"));

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid signature rectangle"), "unexpected stderr: {}", stderr);
    assert!(!default_output.exists());
}

#[test]
fn test_non_finite_rect_creates_no_output() {
    let fixture = fixture(2);

    for rect in [
        Rect::new(f32::NAN, 0.0, 10.0, 10.0),
        Rect::new(0.0, 0.0, f32::INFINITY, 10.0),
    ] {
        let mut request = request(&fixture, PageSelector::All);
        request.rect = rect;

        let result = stamp(&request);
        assert!(matches!(result, Err(Error::InvalidRect(_))), "got {:?}", result);
        assert!(!fixture.output.exists());
    }

    // Finite but far outside the float range once mapped onto the page
    let mut request = request(&fixture, PageSelector::All);
    request.rect = Rect::new(0.0, f32::MAX, 10.0, f32::MAX);
    let result = stamp(&request);
    assert!(matches!(result, Err(Error::InvalidRect(_))), "got {:?}", result);
    assert!(!fixture.output.exists());
}

#[test]
fn test_list_with_out_of_range_numbers_stamps_valid_pages() {
    let fixture = fixture(3);

    for text in ["1,-2", "1,4294967296"] {
        let selector: PageSelector = text.parse().expect("selector should parse");
        let report = stamp(&request(&fixture, selector)).expect("Failed to stamp PDF");
        assert_eq!(report.stamped_pages, vec![1], "selector {:?}", text);
    }
}

#[cfg(unix)]
#[test]
fn test_output_keeps_source_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = fixture(1);
    std::fs::set_permissions(&fixture.pdf, std::fs::Permissions::from_mode(0o644)).unwrap();

    let mut request = request(&fixture, PageSelector::All);
    request.output = None;
    let report = stamp(&request).expect("Failed to stamp PDF");

    let mode = std::fs::metadata(&report.output).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
}

#[test]
fn test_missing_image_creates_no_output() {
    let fixture = fixture(2);
    let mut request = request(&fixture, PageSelector::All);
    request.image = fixture.pdf.with_file_name("missing.png");

    let result = stamp(&request);
    assert!(matches!(result, Err(Error::Image { .. })), "got {:?}", result);
    assert!(!fixture.output.exists());
}

#[test]
fn test_invalid_document_creates_no_output() {
    let fixture = fixture(1);
    std::fs::write(&fixture.pdf, b"this is not a PDF").unwrap();

    let result = stamp(&request(&fixture, PageSelector::All));
    assert!(matches!(result, Err(Error::DocumentOpen { .. })), "got {:?}", result);
    assert!(!fixture.output.exists());
}

#[test]
fn test_unwritable_output_reports_save_error() {
    let fixture = fixture(1);
    let mut request = request(&fixture, PageSelector::All);
    request.output = Some(fixture.pdf.with_file_name("no-such-dir").join("signed.pdf"));

    let result = stamp(&request);
    assert!(matches!(result, Err(Error::Save { .. })), "got {:?}", result);
    assert!(!fixture.pdf.with_file_name("no-such-dir").exists());
}

#[test]
fn test_default_output_is_written_beside_source() {
    let fixture = fixture(1);
    let mut request = request(&fixture, PageSelector::All);
    request.output = None;

    let report = stamp(&request).expect("Failed to stamp PDF");
    let expected = fixture.pdf.with_file_name("contract_signed.pdf");
    assert_eq!(report.output, expected);
    assert!(expected.exists());
}

#[test]
fn test_stamping_twice_adds_a_second_image() {
    let fixture = fixture(2);
    stamp(&request(&fixture, PageSelector::All)).expect("First stamp failed");

    let mut second = request(&fixture, "1".parse().unwrap());
    second.source = fixture.output.clone();
    second.output = Some(fixture.output.with_file_name("twice.pdf"));
    stamp(&second).expect("Second stamp failed");

    let output = Document::load(fixture.output.with_file_name("twice.pdf")).unwrap();
    let mut names = image_xobject_names(&output, 1);
    names.sort();
    assert_eq!(names, vec!["Sig1".to_string(), "Sig2".to_string()]);
    assert_eq!(image_xobject_names(&output, 2), vec!["Sig1".to_string()]);
}

#[test]
fn test_signature_image_is_reusable() {
    let first = fixture(2);
    let second = fixture(3);
    let signature = SignatureImage::open(&first.image).expect("Failed to load signature");

    let report = stamp_with_image(&request(&first, PageSelector::All), &signature).unwrap();
    assert_eq!(report.stamped_pages, vec![1, 2]);

    let report = stamp_with_image(&request(&second, PageSelector::Range(3, 3)), &signature).unwrap();
    assert_eq!(report.stamped_pages, vec![3]);
}

#[test]
fn test_keep_aspect_centers_image_in_rectangle() {
    let fixture = fixture(1);
    let mut request = request(&fixture, PageSelector::All);
    request.rect = Rect::new(0.0, 0.0, 100.0, 100.0);
    request.fit = ImageFit::Contain;

    stamp(&request).expect("Failed to stamp PDF");

    // 4x2 image inside 100x100 → 100x50 at y = 25 (bottom at 75, 792 - 75 = 717)
    let output = Document::load(&fixture.output).unwrap();
    let text = page_text(&output, 1);
    assert!(text.contains("100 0 0 50 0 717 cm"), "unexpected placement: {}", text);
}

#[test]
fn test_info_reports_pages_and_sizes() {
    let fixture = fixture(3);

    assert_eq!(count_pages(&fixture.pdf).unwrap(), 3);

    let metadata = extract_metadata(&fixture.pdf).unwrap();
    assert_eq!(metadata.page_count, 3);
    assert!(metadata.title.is_none());

    let pages = inspect_pages(&fixture.pdf).unwrap();
    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0].number, 1);
    assert_eq!(pages[2].visible_size(), (612.0, 792.0));
}
