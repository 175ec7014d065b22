use deck_core::{Error, Layout, Picture, Presentation, Slide, Table, TableContent, TextBox};
use deck_pptx::{PptxWriter, WriteOptions};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

fn options() -> WriteOptions {
    WriteOptions::default().with_open_after_write(false)
}

fn open(path: &Path) -> ZipArchive<File> {
    ZipArchive::new(File::open(path).unwrap()).unwrap()
}

fn read_part(archive: &mut ZipArchive<File>, name: &str) -> String {
    let mut content = String::new();
    archive.by_name(name).unwrap().read_to_string(&mut content).unwrap();
    content
}

fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    image::RgbImage::new(40, 20).save(&path).unwrap();
    path
}

#[test]
fn writes_every_slide_with_its_parts() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("deck.pptx");

    let mut body = Slide::with_title("Agenda").with_layout(Layout::TEXT);
    body.push(TextBox::new("first point\nsecond point").unwrap());
    let presentation =
        Presentation::from_slides(vec![Slide::with_title("Welcome"), body], "Quarterly");

    deck_pptx::write(&out, &presentation, &options()).unwrap();

    let mut archive = open(&out);
    for name in [
        "ppt/slides/slide1.xml",
        "ppt/slides/slide2.xml",
        "ppt/slides/_rels/slide1.xml.rels",
        "ppt/slides/_rels/slide2.xml.rels",
        "docProps/core.xml",
    ] {
        assert!(archive.by_name(name).is_ok(), "missing {}", name);
    }

    let types = read_part(&mut archive, "[Content_Types].xml");
    assert!(types.contains("/ppt/slides/slide1.xml"));
    assert!(types.contains("/ppt/slides/slide2.xml"));

    let slide = read_part(&mut archive, "ppt/slides/slide2.xml");
    assert!(slide.contains("<a:t>first point</a:t>"));
    assert!(slide.contains("<a:t>second point</a:t>"));
    assert!(
        read_part(&mut archive, "ppt/slides/_rels/slide2.xml.rels").contains("slideLayout2.xml")
    );
}

#[test]
fn presentation_without_slides_gets_a_title_slide() {
    let bytes = PptxWriter::new(options())
        .write_to_bytes(&Presentation::new("Only title"))
        .unwrap();
    let mut archive = ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut slide = String::new();
    archive
        .by_name("ppt/slides/slide1.xml")
        .unwrap()
        .read_to_string(&mut slide)
        .unwrap();
    assert!(slide.contains("<a:t>Only title</a:t>"));
    assert!(archive.by_name("ppt/slides/slide2.xml").is_err());
}

#[test]
fn special_characters_are_escaped() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("escape.pptx");

    let mut slide = Slide::new();
    slide.push(TextBox::new(r#"<b>&"tag"</b>"#).unwrap());
    slide.push(TextBox::new("").unwrap());
    let presentation = Presentation::from_slides(vec![slide], "Escapes & more");

    deck_pptx::write(&out, &presentation, &options()).unwrap();

    let mut archive = open(&out);
    let xml = read_part(&mut archive, "ppt/slides/slide1.xml");
    assert!(xml.contains("&lt;b&gt;&amp;&quot;tag&quot;&lt;/b&gt;"));
    assert!(read_part(&mut archive, "docProps/core.xml").contains("Escapes &amp; more"));
}

#[test]
fn same_image_twice_gets_two_media_parts() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(dir.path(), "logo.png");
    let out = dir.path().join("pictures.pptx");

    let mut slide = Slide::new();
    slide.push(Picture::builder(&png).with_width(40.0).build().unwrap());
    slide.push(Picture::builder(&png).with_offset(50.0, 0.0).with_width(40.0).build().unwrap());
    let presentation = Presentation::from_slides(vec![slide], "Pictures");

    deck_pptx::write(&out, &presentation, &options()).unwrap();

    let mut archive = open(&out);
    assert!(archive.by_name("ppt/media/image1.png").is_ok());
    assert!(archive.by_name("ppt/media/image2.png").is_ok());

    let rels = read_part(&mut archive, "ppt/slides/_rels/slide1.xml.rels");
    assert!(rels.contains(r#"Id="rId2""#) && rels.contains("../media/image1.png"));
    assert!(rels.contains(r#"Id="rId3""#) && rels.contains("../media/image2.png"));

    let slide = read_part(&mut archive, "ppt/slides/slide1.xml");
    assert!(slide.contains(r#"descr="logo.png""#));
    // 40 x 20 px at 40 mm wide
    assert!(slide.contains(r#"<a:ext cx="1440000" cy="720000"/>"#));
    assert!(read_part(&mut archive, "[Content_Types].xml").contains(r#"Extension="png""#));
}

#[test]
fn hyperlink_set_before_push_resolves() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("links.pptx");

    let appendix = Slide::with_title("Appendix");
    let mut index = Slide::with_title("Index");
    index.push(TextBox::builder("see appendix").with_hyperlink(appendix.handle()).build().unwrap());
    let content = TableContent::new(["k", "v"], vec![vec!["a", "1"]]);
    index.push(Table::builder(content).with_hyperlink(appendix.handle()).build().unwrap());

    let presentation = Presentation::from_slides(vec![index, appendix], "Links");
    deck_pptx::write(&out, &presentation, &options()).unwrap();

    let mut archive = open(&out);
    let rels = read_part(&mut archive, "ppt/slides/_rels/slide1.xml.rels");
    assert_eq!(rels.matches(r#"Target="slide2.xml""#).count(), 2);
    let slide = read_part(&mut archive, "ppt/slides/slide1.xml");
    assert_eq!(slide.matches("ppaction://hlinksldjump").count(), 2);
}

#[test]
fn hyperlink_to_unpushed_slide_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("dangling.pptx");

    let orphan = Slide::with_title("Never pushed");
    let mut slide = Slide::new();
    slide.push(TextBox::builder("nowhere").with_hyperlink(orphan.handle()).build().unwrap());
    let presentation = Presentation::from_slides(vec![slide], "Dangling");

    let err = deck_pptx::write(&out, &presentation, &options()).unwrap_err();
    assert!(matches!(err, Error::DanglingHyperlink { slide: 1, shape_id: 3 }));
    assert!(!out.exists());
}

#[test]
fn existing_destination_is_left_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("existing.pptx");
    std::fs::write(&out, b"precious").unwrap();

    let err = deck_pptx::write(&out, &Presentation::new("New"), &options()).unwrap_err();
    assert!(matches!(err, Error::DestinationExists(_)));
    assert_eq!(std::fs::read(&out).unwrap(), b"precious");

    deck_pptx::write(&out, &Presentation::new("New"), &options().with_overwrite(true)).unwrap();
    assert!(open(&out).by_name("ppt/slides/slide1.xml").is_ok());
}

#[test]
fn missing_image_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("broken.pptx");

    let mut slide = Slide::new();
    slide.push(
        Picture::builder(dir.path().join("gone.png"))
            .with_size(10.0, 10.0)
            .build()
            .unwrap(),
    );
    let presentation = Presentation::from_slides(vec![slide], "Broken");

    let err = deck_pptx::write(&out, &presentation, &options()).unwrap_err();
    assert!(matches!(err, Error::AssetNotFound { .. }));
    assert!(!out.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn corrupt_template_fails() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("template.pptx");
    std::fs::write(&template, b"not a zip archive").unwrap();
    let out = dir.path().join("out.pptx");

    let templated = options().with_template(&template);
    let err = deck_pptx::write(&out, &Presentation::new("Deck"), &templated).unwrap_err();
    assert!(matches!(err, Error::TemplateCorrupt(_)));
    assert!(!out.exists());
}

#[test]
fn template_slides_are_preserved_and_numbering_continues() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.pptx");
    let png = write_png(dir.path(), "chart.png");

    let mut first = Slide::with_title("From template");
    first.push(Picture::builder(&png).with_size(20.0, 10.0).build().unwrap());
    deck_pptx::write(&base, &Presentation::from_slides(vec![first], "Base"), &options()).unwrap();

    let mut added = Slide::with_title("Added");
    added.push(Picture::builder(&png).with_size(20.0, 10.0).build().unwrap());
    let out = dir.path().join("merged.pptx");
    deck_pptx::write(
        &out,
        &Presentation::from_slides(vec![added], "Merged"),
        &options().with_template(&base),
    )
    .unwrap();

    let mut archive = open(&out);
    assert!(read_part(&mut archive, "ppt/slides/slide1.xml").contains("From template"));
    assert!(read_part(&mut archive, "ppt/slides/slide2.xml").contains("Added"));
    assert!(archive.by_name("ppt/media/image1.png").is_ok());
    assert!(archive.by_name("ppt/media/image2.png").is_ok());

    let pres = read_part(&mut archive, "ppt/presentation.xml");
    assert!(pres.contains(r#"<p:sldId id="256" r:id="rId6"/><p:sldId id="257" r:id="rId7"/>"#));
    assert_eq!(pres.matches("<p:sldIdLst>").count(), 1);

    let types = read_part(&mut archive, "[Content_Types].xml");
    assert_eq!(types.matches(r#"PartName="/ppt/slides/slide1.xml""#).count(), 1);
    assert_eq!(types.matches(r#"Extension="png""#).count(), 1);
}
