//! Walk a document's pages and export every image it paints
//!
//! Pages are visited in ascending order and each page's operator stream in
//! drawing order. For every image-painting operation the name is resolved
//! page-local first, then shared; names found in neither table are skipped.
//! Resolved images are handed to [`materialize_with`](super::materialize::materialize_with)
//! and the resulting records are returned in encounter order.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::materialize::{materialize_with, ExportRecord, MaterializeOptions};
use crate::error::{Error, Result};
use crate::pdf::LopdfDocument;
use crate::source::{OpCode, PageSource, PdfSource, RawImage, Scope};

/// What to do when a page or an image fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure and return it
    #[default]
    Abort,
    /// Record the failure in the report and keep going
    SkipAndContinue,
}

/// How output files are named
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileNaming {
    /// `<name>.png`
    #[default]
    ImageName,
    /// `p<page>_<name>.png`
    PagePrefixed,
}

/// Shared flag for stopping an export from another thread
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options for a whole-document export
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub on_image_error: FailurePolicy,
    pub on_page_error: FailurePolicy,
    /// Replace existing files; when false an existing file is an error
    pub overwrite: bool,
    pub file_naming: FileNaming,
    /// Encode a page's images on the rayon pool; output order is unchanged
    pub parallel: bool,
    /// Checked before each page and each image
    pub cancel: Option<CancelToken>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            on_image_error: FailurePolicy::Abort,
            on_page_error: FailurePolicy::Abort,
            overwrite: true,
            file_naming: FileNaming::ImageName,
            parallel: false,
            cancel: None,
        }
    }
}

impl ExportOptions {
    /// Skip failing pages and images instead of aborting
    pub fn keep_going() -> Self {
        Self {
            on_image_error: FailurePolicy::SkipAndContinue,
            on_page_error: FailurePolicy::SkipAndContinue,
            ..Self::default()
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    fn stem(&self, page: u32, name: &str) -> String {
        match self.file_naming {
            FileNaming::ImageName => name.to_string(),
            FileNaming::PagePrefixed => format!("p{}_{}", page, name),
        }
    }
}

/// A page or image that was skipped under [`FailurePolicy::SkipAndContinue`]
#[derive(Debug)]
pub struct ExportFailure {
    pub page: u32,
    /// `None` when the whole page failed
    pub name: Option<String>,
    pub error: Error,
}

/// Outcome of a whole-document export
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Written images, in encounter order
    pub records: Vec<ExportRecord>,
    pub failures: Vec<ExportFailure>,
    /// Pages that were read successfully
    pub pages: u32,
}

impl ExportReport {
    /// True when nothing was skipped
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// An image-painting operation found by [`scan`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub page: u32,
    pub name: String,
    pub inline: bool,
    /// Table the name resolves in; `None` when it is not resident
    pub scope: Option<Scope>,
}

/// List every image-painting operation without decoding anything
pub fn scan<S: PdfSource>(source: &S) -> Result<Vec<ImageRef>> {
    let mut refs = Vec::new();

    for number in 1..=source.page_count() {
        let page = source.page(number)?;
        for op in page.operations() {
            if !op.code.paints_image() {
                continue;
            }
            let Some(name) = op.image_name() else { continue };
            let scope = Scope::ORDER
                .into_iter()
                .find(|scope| page.contains(*scope, name));
            refs.push(ImageRef {
                page: number,
                name: name.to_string(),
                inline: op.code == OpCode::PaintInlineImageXObject,
                scope,
            });
        }
    }
    Ok(refs)
}

/// Export every image of `source` into `dest`
///
/// `dest` is created if it does not exist. With the default options the
/// first failure aborts the walk; files written before it stay on disk.
pub fn walk<S: PdfSource>(source: &S, dest: &Path, options: &ExportOptions) -> Result<ExportReport> {
    fs::create_dir_all(dest).map_err(|source| Error::CreateDir {
        path: dest.to_path_buf(),
        source,
    })?;

    let materialize_options = MaterializeOptions {
        overwrite: options.overwrite,
    };
    let mut report = ExportReport::default();

    for number in 1..=source.page_count() {
        if options.is_cancelled() {
            info!(page = number, exported = report.records.len(), "export cancelled");
            return Err(Error::Cancelled);
        }

        let page = match source.page(number) {
            Ok(page) => page,
            Err(error) => match options.on_page_error {
                FailurePolicy::Abort => {
                    warn!(page = number, exported = report.records.len(), "export aborted: {}", error);
                    return Err(error);
                }
                FailurePolicy::SkipAndContinue => {
                    warn!(page = number, "skipping page: {}", error);
                    report.failures.push(ExportFailure {
                        page: number,
                        name: None,
                        error,
                    });
                    continue;
                }
            },
        };
        report.pages += 1;

        let before = report.records.len();
        if options.parallel {
            export_page_parallel(&page, number, dest, options, &materialize_options, &mut report)?;
        } else {
            export_page(&page, number, dest, options, &materialize_options, &mut report)?;
        }
        debug!(page = number, images = report.records.len() - before, "page done");
    }

    info!(
        pages = report.pages,
        images = report.records.len(),
        failures = report.failures.len(),
        dest = %dest.display(),
        "export finished"
    );
    Ok(report)
}

/// Resolve `name` page-local first, then shared
fn resolve_image<P: PageSource>(page: &P, name: &str) -> Result<Option<(Scope, RawImage)>> {
    for scope in Scope::ORDER {
        if let Some(image) = page.lookup(scope, name)? {
            return Ok(Some((scope, image)));
        }
    }
    Ok(None)
}

/// Names of the images painted on a page, in drawing order
fn painted_names<P: PageSource>(page: &P, number: u32) -> Vec<String> {
    page.operations()
        .iter()
        .filter(|op| op.code.paints_image())
        .filter_map(|op| {
            let name = op.image_name();
            if name.is_none() {
                debug!(page = number, operator = %op.operator, "paint operation without a name operand");
            }
            name.map(str::to_string)
        })
        .collect()
}

fn export_page<P: PageSource>(
    page: &P,
    number: u32,
    dest: &Path,
    options: &ExportOptions,
    materialize_options: &MaterializeOptions,
    report: &mut ExportReport,
) -> Result<()> {
    for name in painted_names(page, number) {
        if options.is_cancelled() {
            info!(page = number, exported = report.records.len(), "export cancelled");
            return Err(Error::Cancelled);
        }

        let outcome = match resolve_image(page, &name) {
            Ok(None) => {
                debug!(page = number, name = %name, "image not resident, skipping");
                continue;
            }
            Ok(Some((scope, image))) => {
                debug!(page = number, name = %name, ?scope, "resolved image");
                let stem = options.stem(number, &name);
                materialize_with(&name, &stem, &image, dest, materialize_options)
            }
            Err(error) => Err(error),
        };
        settle(report, number, name, outcome, options)?;
    }
    Ok(())
}

fn export_page_parallel<P: PageSource>(
    page: &P,
    number: u32,
    dest: &Path,
    options: &ExportOptions,
    materialize_options: &MaterializeOptions,
    report: &mut ExportReport,
) -> Result<()> {
    // Resolution borrows the page, so it stays on this thread
    let mut resolved = Vec::new();
    for name in painted_names(page, number) {
        match resolve_image(page, &name) {
            Ok(None) => debug!(page = number, name = %name, "image not resident, skipping"),
            Ok(Some((_, image))) => resolved.push((name, Ok(image))),
            Err(error) => resolved.push((name, Err(error))),
        }
    }

    let outcomes: Vec<(String, Result<ExportRecord>)> = resolved
        .into_par_iter()
        .map(|(name, image)| {
            if options.is_cancelled() {
                return (name, Err(Error::Cancelled));
            }
            let outcome = image.and_then(|image| {
                let stem = options.stem(number, &name);
                materialize_with(&name, &stem, &image, dest, materialize_options)
            });
            (name, outcome)
        })
        .collect();

    for (name, outcome) in outcomes {
        settle(report, number, name, outcome, options)?;
    }
    Ok(())
}

/// Fold one image outcome into the report, or fail the walk
fn settle(
    report: &mut ExportReport,
    page: u32,
    name: String,
    outcome: Result<ExportRecord>,
    options: &ExportOptions,
) -> Result<()> {
    let error = match outcome {
        Ok(record) => {
            debug!(page, name = %name, file = %record.file.display(), "exported image");
            report.records.push(record);
            return Ok(());
        }
        Err(Error::Cancelled) => {
            info!(page, exported = report.records.len(), "export cancelled");
            return Err(Error::Cancelled);
        }
        Err(error) => error,
    };

    match options.on_image_error {
        FailurePolicy::Abort => {
            warn!(
                page,
                name = %name,
                exported = report.records.len(),
                "export aborted: {}",
                error
            );
            Err(Error::Image {
                page,
                name,
                source: Box::new(error),
            })
        }
        FailurePolicy::SkipAndContinue => {
            warn!(page, name = %name, "skipping image: {}", error);
            report.failures.push(ExportFailure {
                page,
                name: Some(name),
                error,
            });
            Ok(())
        }
    }
}

/// Export every image of the PDF at `pdf_path` into `dest`
///
/// Uses the default [`ExportOptions`]: abort on the first failure, replace
/// existing files.
pub fn export_images(pdf_path: &Path, dest: &Path) -> Result<Vec<ExportRecord>> {
    Ok(export_images_with(pdf_path, dest, &ExportOptions::default())?.records)
}

/// Export every image of the PDF at `pdf_path` into `dest` with `options`
pub fn export_images_with(pdf_path: &Path, dest: &Path, options: &ExportOptions) -> Result<ExportReport> {
    let document = LopdfDocument::load(pdf_path)?;
    info!(
        file = %pdf_path.display(),
        pages = document.page_count(),
        "exporting images"
    );
    walk(&document, dest, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ImageKind, Operand, Operation};
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakePage {
        operations: Vec<Operation>,
        local: HashMap<String, RawImage>,
        shared: HashMap<String, RawImage>,
    }

    impl FakePage {
        fn paint(mut self, name: &str) -> Self {
            self.operations
                .push(Operation::paint(OpCode::PaintImageXObject, "Do", name));
            self
        }

        fn local(mut self, name: &str, image: RawImage) -> Self {
            self.local.insert(name.to_string(), image);
            self
        }

        fn shared(mut self, name: &str, image: RawImage) -> Self {
            self.shared.insert(name.to_string(), image);
            self
        }
    }

    impl PageSource for FakePage {
        fn operations(&self) -> &[Operation] {
            &self.operations
        }

        fn lookup(&self, scope: Scope, name: &str) -> Result<Option<RawImage>> {
            let table = match scope {
                Scope::PageLocal => &self.local,
                Scope::Shared => &self.shared,
            };
            Ok(table.get(name).cloned())
        }

        fn contains(&self, scope: Scope, name: &str) -> bool {
            match scope {
                Scope::PageLocal => self.local.contains_key(name),
                Scope::Shared => self.shared.contains_key(name),
            }
        }
    }

    struct FakeDoc {
        pages: Vec<std::result::Result<FakePage, String>>,
    }

    impl PdfSource for FakeDoc {
        type Page<'a> = &'a FakePage;

        fn page_count(&self) -> u32 {
            self.pages.len() as u32
        }

        fn page(&self, number: u32) -> Result<&FakePage> {
            match &self.pages[number as usize - 1] {
                Ok(page) => Ok(page),
                Err(reason) => Err(Error::PageRead {
                    page: number,
                    reason: reason.clone(),
                }),
            }
        }
    }

    fn rgb(width: u32, height: u32) -> RawImage {
        RawImage::new(width, height, ImageKind::Rgb, vec![7; (width * height * 3) as usize])
    }

    fn gray(width: u32, height: u32) -> RawImage {
        RawImage::new(width, height, ImageKind::Grayscale, vec![9; (width * height) as usize])
    }

    fn broken() -> RawImage {
        // 10 bytes over 2x2 pixels is 2.5 channels
        RawImage::new(2, 2, ImageKind::Unknown, vec![0; 10])
    }

    fn names(report: &ExportReport) -> Vec<&str> {
        report.records.iter().map(|r| r.name.as_str()).collect()
    }

    fn two_page_doc() -> FakeDoc {
        FakeDoc {
            pages: vec![
                Ok(FakePage::default()
                    .paint("A")
                    .paint("B")
                    .local("A", rgb(2, 2))
                    .local("B", gray(3, 1))),
                Ok(FakePage::default().paint("C").shared("C", rgb(1, 1))),
            ],
        }
    }

    #[test]
    fn test_records_follow_page_and_operator_order() {
        let dir = TempDir::new().unwrap();
        let report = walk(&two_page_doc(), dir.path(), &ExportOptions::default()).unwrap();

        assert_eq!(names(&report), vec!["A", "B", "C"]);
        assert_eq!(report.pages, 2);
        assert!(report.is_complete());
        assert_eq!(report.records[1].channels, 1);
        for record in &report.records {
            assert!(record.file.exists());
        }
    }

    #[test]
    fn test_parallel_keeps_order() {
        let dir = TempDir::new().unwrap();
        let options = ExportOptions {
            parallel: true,
            ..ExportOptions::default()
        };
        let report = walk(&two_page_doc(), dir.path(), &options).unwrap();
        assert_eq!(names(&report), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_page_local_shadows_shared() {
        let dir = TempDir::new().unwrap();
        let doc = FakeDoc {
            pages: vec![Ok(FakePage::default()
                .paint("Im0")
                .local("Im0", rgb(4, 2))
                .shared("Im0", gray(1, 1)))],
        };
        let report = walk(&doc, dir.path(), &ExportOptions::default()).unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].width, 4);
        assert_eq!(report.records[0].channels, 3);
    }

    #[test]
    fn test_unresident_names_are_skipped() {
        let dir = TempDir::new().unwrap();
        let doc = FakeDoc {
            pages: vec![Ok(FakePage::default()
                .paint("Ghost")
                .paint("Real")
                .local("Real", gray(2, 2)))],
        };
        let report = walk(&doc, dir.path(), &ExportOptions::default()).unwrap();

        assert_eq!(names(&report), vec!["Real"]);
        assert!(report.is_complete());
        assert!(!dir.path().join("Ghost.png").exists());
    }

    #[test]
    fn test_operations_without_name_are_ignored() {
        let dir = TempDir::new().unwrap();
        let mut page = FakePage::default();
        page.operations.push(Operation {
            code: OpCode::PaintImageXObject,
            operator: "Do".to_string(),
            operands: vec![Operand::Number(3.0)],
        });
        let doc = FakeDoc { pages: vec![Ok(page)] };

        let report = walk(&doc, dir.path(), &ExportOptions::default()).unwrap();
        assert!(report.records.is_empty());
    }

    #[test]
    fn test_empty_document_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out");
        let doc = FakeDoc { pages: vec![] };

        let report = walk(&doc, &dest, &ExportOptions::default()).unwrap();
        assert!(report.records.is_empty());
        assert_eq!(report.pages, 0);
        assert!(dest.is_dir());
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 0);
    }

    #[test]
    fn test_abort_reports_page_and_name() {
        let dir = TempDir::new().unwrap();
        let doc = FakeDoc {
            pages: vec![
                Ok(FakePage::default().paint("Good").local("Good", gray(1, 1))),
                Ok(FakePage::default()
                    .paint("Bad")
                    .paint("Later")
                    .local("Bad", broken())
                    .local("Later", gray(1, 1))),
            ],
        };

        let err = walk(&doc, dir.path(), &ExportOptions::default()).unwrap_err();
        match &err {
            Error::Image { page, name, .. } => {
                assert_eq!(*page, 2);
                assert_eq!(name, "Bad");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(err.root(), Error::InvalidChannelCount { .. }));
        assert!(dir.path().join("Good.png").exists());
        assert!(!dir.path().join("Bad.png").exists());
        assert!(!dir.path().join("Later.png").exists());
    }

    #[test]
    fn test_skip_and_continue_collects_failures() {
        let dir = TempDir::new().unwrap();
        let doc = FakeDoc {
            pages: vec![
                Ok(FakePage::default()
                    .paint("Bad")
                    .paint("Good")
                    .local("Bad", broken())
                    .local("Good", gray(1, 1))),
                Err("corrupt content stream".to_string()),
                Ok(FakePage::default().paint("Last").shared("Last", rgb(1, 1))),
            ],
        };

        let report = walk(&doc, dir.path(), &ExportOptions::keep_going()).unwrap();

        assert_eq!(names(&report), vec!["Good", "Last"]);
        assert_eq!(report.pages, 2);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].page, 1);
        assert_eq!(report.failures[0].name.as_deref(), Some("Bad"));
        assert!(matches!(report.failures[0].error, Error::InvalidChannelCount { .. }));
        assert_eq!(report.failures[1].page, 2);
        assert_eq!(report.failures[1].name, None);
        assert!(matches!(report.failures[1].error, Error::PageRead { .. }));
    }

    #[test]
    fn test_page_error_aborts_by_default() {
        let dir = TempDir::new().unwrap();
        let doc = FakeDoc {
            pages: vec![Err("no content".to_string())],
        };
        let err = walk(&doc, dir.path(), &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, Error::PageRead { page: 1, .. }));
    }

    #[test]
    fn test_cancelled_before_start() {
        let dir = TempDir::new().unwrap();
        let token = CancelToken::new();
        token.cancel();
        let options = ExportOptions {
            cancel: Some(token),
            ..ExportOptions::default()
        };

        let err = walk(&two_page_doc(), dir.path(), &options).unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(!dir.path().join("A.png").exists());
    }

    #[test]
    fn test_page_prefixed_naming() {
        let dir = TempDir::new().unwrap();
        let options = ExportOptions {
            file_naming: FileNaming::PagePrefixed,
            ..ExportOptions::default()
        };
        let report = walk(&two_page_doc(), dir.path(), &options).unwrap();

        assert_eq!(report.records[0].name, "A");
        assert_eq!(report.records[0].file, dir.path().join("p1_A.png"));
        assert_eq!(report.records[2].file, dir.path().join("p2_C.png"));
    }

    #[test]
    fn test_no_overwrite_fails_on_second_run() {
        let dir = TempDir::new().unwrap();
        walk(&two_page_doc(), dir.path(), &ExportOptions::default()).unwrap();

        let options = ExportOptions {
            overwrite: false,
            ..ExportOptions::default()
        };
        let err = walk(&two_page_doc(), dir.path(), &options).unwrap_err();
        assert!(matches!(err.root(), Error::Write { .. }));
    }

    #[test]
    fn test_scan_reports_scope_without_decoding() {
        let doc = FakeDoc {
            pages: vec![
                Ok(FakePage::default().paint("A").paint("Ghost").local("A", broken())),
                Ok(FakePage::default().paint("C").shared("C", rgb(1, 1))),
            ],
        };
        let refs = scan(&doc).unwrap();

        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].scope, Some(Scope::PageLocal));
        assert_eq!(refs[1].name, "Ghost");
        assert_eq!(refs[1].scope, None);
        assert_eq!(refs[2].page, 2);
        assert_eq!(refs[2].scope, Some(Scope::Shared));
        assert!(!refs[2].inline);
    }

    /// Cancels its token when the given page is requested
    struct CancellingDoc {
        inner: FakeDoc,
        at: u32,
        token: CancelToken,
    }

    impl PdfSource for CancellingDoc {
        type Page<'a> = &'a FakePage;

        fn page_count(&self) -> u32 {
            self.inner.page_count()
        }

        fn page(&self, number: u32) -> Result<&FakePage> {
            if number == self.at {
                self.token.cancel();
            }
            self.inner.page(number)
        }
    }

    fn three_page_doc() -> FakeDoc {
        FakeDoc {
            pages: vec![
                Ok(FakePage::default()
                    .paint("A")
                    .paint("B")
                    .local("A", rgb(8, 8))
                    .local("B", gray(8, 8))),
                Ok(FakePage::default().paint("C").local("C", rgb(8, 8))),
                Ok(FakePage::default().paint("D").local("D", rgb(8, 8))),
            ],
        }
    }

    fn cancel_mid_walk(parallel: bool) {
        let dir = TempDir::new().unwrap();
        let token = CancelToken::new();
        let doc = CancellingDoc {
            inner: three_page_doc(),
            at: 2,
            token: token.clone(),
        };
        let options = ExportOptions {
            parallel,
            cancel: Some(token),
            ..ExportOptions::default()
        };

        let err = walk(&doc, dir.path(), &options).unwrap_err();
        assert!(matches!(err, Error::Cancelled));

        let mut files: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        files.sort();
        assert_eq!(files, vec!["A.png", "B.png"]);
        for file in &files {
            let decoded = image::open(dir.path().join(file)).unwrap();
            assert_eq!(decoded.width(), 8);
        }
    }

    #[test]
    fn test_cancel_mid_walk_leaves_only_complete_files() {
        cancel_mid_walk(false);
    }

    #[test]
    fn test_cancel_mid_walk_in_parallel() {
        cancel_mid_walk(true);
    }

    fn page_with_failures() -> FakeDoc {
        FakeDoc {
            pages: vec![
                Ok(FakePage::default()
                    .paint("Good")
                    .paint("Bad1")
                    .paint("Bad2")
                    .paint("Late")
                    .local("Good", gray(2, 2))
                    .local("Bad1", broken())
                    .local("Bad2", broken())
                    .local("Late", rgb(2, 2))),
                Ok(FakePage::default().paint("Next").shared("Next", gray(1, 1))),
            ],
        }
    }

    #[test]
    fn test_parallel_skip_and_continue_keeps_order() {
        let dir = TempDir::new().unwrap();
        let options = ExportOptions {
            parallel: true,
            ..ExportOptions::keep_going()
        };
        let report = walk(&page_with_failures(), dir.path(), &options).unwrap();

        assert_eq!(names(&report), vec!["Good", "Late", "Next"]);
        let failed: Vec<_> = report
            .failures
            .iter()
            .map(|f| (f.page, f.name.as_deref()))
            .collect();
        assert_eq!(failed, vec![(1, Some("Bad1")), (1, Some("Bad2"))]);
    }

    #[test]
    fn test_parallel_abort_reports_first_failure_in_operator_order() {
        let dir = TempDir::new().unwrap();
        let options = ExportOptions {
            parallel: true,
            ..ExportOptions::default()
        };

        let err = walk(&page_with_failures(), dir.path(), &options).unwrap_err();
        match &err {
            Error::Image { page, name, .. } => {
                assert_eq!(*page, 1);
                assert_eq!(name, "Bad1");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(dir.path().join("Good.png").exists());
        assert!(!dir.path().join("Next.png").exists());
    }
}
