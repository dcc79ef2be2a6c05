//! lopdf-backed implementation of [`PdfSource`]
//!
//! Loading a page compiles its content stream into [`Operation`]s, the way
//! a renderer would see them: form XObjects are flattened in place and inline
//! images are given page-unique names. Image XObjects from the page's own
//! `/Resources` (plus inline images and images reached through forms) make
//! up the page-local table; XObjects inherited from ancestor `/Pages` nodes
//! make up the shared table.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation as PdfOperation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, trace};

use super::xobject::{decode_filters, decode_image, expand_inline_stream, is_form, is_image};
use crate::error::{Error, Result};
use crate::source::{OpCode, Operand, Operation, PageSource, PdfSource, RawImage, Scope};

/// Maximum depth of nested form XObjects that are flattened
const MAX_FORM_DEPTH: usize = 16;

/// Maximum length of a `/Parent` chain that is followed
const MAX_TREE_DEPTH: usize = 64;

/// Follow indirect references until a direct object is reached
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    let mut current = obj;
    for _ in 0..8 {
        match current {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(next) => current = next,
                Err(_) => return current,
            },
            _ => return current,
        }
    }
    current
}

/// An XObject as it appears in a resource dictionary
#[derive(Debug, Clone)]
enum XObjectRef {
    Indirect(ObjectId),
    Direct(Stream),
}

impl XObjectRef {
    fn stream<'a>(&'a self, doc: &'a Document) -> Option<&'a Stream> {
        match self {
            XObjectRef::Indirect(id) => match doc.get_object(*id) {
                Ok(Object::Stream(stream)) => Some(stream),
                _ => None,
            },
            XObjectRef::Direct(stream) => Some(stream),
        }
    }

    fn id(&self) -> Option<ObjectId> {
        match self {
            XObjectRef::Indirect(id) => Some(*id),
            XObjectRef::Direct(_) => None,
        }
    }
}

type XObjects = BTreeMap<String, XObjectRef>;

/// `/XObject` entries of a resource dictionary
fn xobjects_of(doc: &Document, resources: Option<&Object>) -> XObjects {
    let mut table = XObjects::new();
    let Some(Object::Dictionary(resources)) = resources.map(|r| resolve(doc, r)) else {
        return table;
    };
    let Ok(Object::Dictionary(xobjects)) = resources.get(b"XObject").map(|x| resolve(doc, x)) else {
        return table;
    };

    for (name, value) in xobjects.iter() {
        let name = String::from_utf8_lossy(name).to_string();
        let entry = match value {
            Object::Reference(id) => XObjectRef::Indirect(*id),
            Object::Stream(stream) => XObjectRef::Direct(stream.clone()),
            _ => continue,
        };
        table.insert(name, entry);
    }
    table
}

/// XObjects inherited from the page's ancestors, nearest ancestor first
fn inherited_xobjects(doc: &Document, page: &Dictionary) -> XObjects {
    let mut table = XObjects::new();
    let mut visited = HashSet::new();
    let mut parent = page.get(b"Parent").ok();

    for _ in 0..MAX_TREE_DEPTH {
        let Some(Object::Reference(id)) = parent else { break };
        if !visited.insert(*id) {
            break;
        }
        let Ok(Object::Dictionary(node)) = doc.get_object(*id) else { break };

        for (name, entry) in xobjects_of(doc, node.get(b"Resources").ok()) {
            table.entry(name).or_insert(entry);
        }
        parent = node.get(b"Parent").ok();
    }
    table
}

/// Image XObjects reachable from a page's resources, own and inherited
pub(crate) fn page_image_ids(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let Ok(Object::Dictionary(page)) = doc.get_object(page_id) else {
        return Vec::new();
    };
    xobjects_of(doc, page.get(b"Resources").ok())
        .into_values()
        .chain(inherited_xobjects(doc, page).into_values())
        .filter(|entry| entry.stream(doc).is_some_and(is_image))
        .filter_map(|entry| entry.id())
        .collect()
}

/// A PDF loaded with lopdf
pub struct LopdfDocument {
    doc: Document,
    pages: Vec<ObjectId>,
}

impl LopdfDocument {
    /// Load a PDF from disk
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let doc = Document::load(path).map_err(|source| Error::DocumentLoad {
            path: path.to_path_buf(),
            source,
        })?;

        let loaded = Self::from_document(doc);
        if loaded.pages.is_empty() {
            return Err(Error::EmptyPdf(path.to_path_buf()));
        }
        Ok(loaded)
    }

    /// Load a PDF from memory
    pub fn load_mem(bytes: &[u8]) -> Result<Self> {
        let path = PathBuf::from("<memory>");
        let doc = match Document::load_mem(bytes) {
            Ok(doc) => doc,
            Err(source) => return Err(Error::DocumentLoad { path, source }),
        };

        let loaded = Self::from_document(doc);
        if loaded.pages.is_empty() {
            return Err(Error::EmptyPdf(path));
        }
        Ok(loaded)
    }

    /// Wrap an already parsed document
    pub fn from_document(doc: Document) -> Self {
        // get_pages is keyed by 1-based page number, in order
        let pages = doc.get_pages().into_values().collect();
        Self { doc, pages }
    }
}

impl PdfSource for LopdfDocument {
    type Page<'a> = LopdfPage<'a>;

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page(&self, number: u32) -> Result<LopdfPage<'_>> {
        let page_id = number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .copied()
            .ok_or_else(|| Error::PageRead {
                page: number,
                reason: format!("document has {} pages", self.pages.len()),
            })?;
        LopdfPage::compile(&self.doc, number, page_id)
    }
}

/// A compiled page
pub struct LopdfPage<'a> {
    doc: &'a Document,
    operations: Vec<Operation>,
    local: HashMap<String, XObjectRef>,
    shared: HashMap<String, XObjectRef>,
}

impl<'a> LopdfPage<'a> {
    fn compile(doc: &'a Document, number: u32, page_id: ObjectId) -> Result<Self> {
        let read_err = |reason: String| Error::PageRead { page: number, reason };

        let page = match doc.get_object(page_id) {
            Ok(Object::Dictionary(page)) => page,
            Ok(_) => return Err(read_err("page object is not a dictionary".to_string())),
            Err(e) => return Err(read_err(e.to_string())),
        };

        let own = xobjects_of(doc, page.get(b"Resources").ok());
        let inherited = inherited_xobjects(doc, page);

        let content = doc
            .get_page_content(page_id)
            .map_err(|e| read_err(e.to_string()))?;
        let content = Content::decode(&content).map_err(|e| read_err(e.to_string()))?;

        let images_only = |table: &XObjects| -> HashMap<String, XObjectRef> {
            table
                .iter()
                .filter(|(_, entry)| entry.stream(doc).is_some_and(is_image))
                .map(|(name, entry)| (name.clone(), entry.clone()))
                .collect()
        };

        let mut compiler = Compiler {
            doc,
            page: number,
            local: images_only(&own),
            shared: images_only(&inherited),
            own,
            inherited,
            forms: Vec::new(),
            operations: Vec::with_capacity(content.operations.len()),
            inline_count: 0,
        };
        compiler.compile(&content.operations)?;

        debug!(
            page = number,
            operations = compiler.operations.len(),
            local = compiler.local.len(),
            shared = compiler.shared.len(),
            "compiled page"
        );

        Ok(Self {
            doc,
            operations: compiler.operations,
            local: compiler.local,
            shared: compiler.shared,
        })
    }
}

impl LopdfPage<'_> {
    fn table(&self, scope: Scope) -> &HashMap<String, XObjectRef> {
        match scope {
            Scope::PageLocal => &self.local,
            Scope::Shared => &self.shared,
        }
    }
}

impl PageSource for LopdfPage<'_> {
    fn operations(&self) -> &[Operation] {
        &self.operations
    }

    fn contains(&self, scope: Scope, name: &str) -> bool {
        self.table(scope).contains_key(name)
    }

    fn lookup(&self, scope: Scope, name: &str) -> Result<Option<RawImage>> {
        let table = self.table(scope);
        let Some(stream) = table.get(name).and_then(|entry| entry.stream(self.doc)) else {
            return Ok(None);
        };
        decode_image(self.doc, stream, name).map(Some)
    }
}

/// A form XObject being flattened
struct FormFrame {
    prefix: String,
    id: Option<ObjectId>,
    xobjects: XObjects,
}

struct Compiler<'a> {
    doc: &'a Document,
    page: u32,
    own: XObjects,
    inherited: XObjects,
    local: HashMap<String, XObjectRef>,
    shared: HashMap<String, XObjectRef>,
    forms: Vec<FormFrame>,
    operations: Vec<Operation>,
    inline_count: usize,
}

impl Compiler<'_> {
    fn compile(&mut self, ops: &[PdfOperation]) -> Result<()> {
        for op in ops {
            match op.operator.as_str() {
                "Do" => self.paint_xobject(op)?,
                "BI" => self.paint_inline(op),
                _ => self.operations.push(Operation {
                    code: OpCode::Other,
                    operator: op.operator.clone(),
                    operands: op.operands.iter().map(operand).collect(),
                }),
            }
        }
        Ok(())
    }

    /// Find an XObject by name: enclosing forms first, then page, then ancestors
    fn find(&self, name: &str) -> Option<(String, XObjectRef, bool)> {
        for frame in self.forms.iter().rev() {
            if let Some(entry) = frame.xobjects.get(name) {
                return Some((format!("{}_{}", frame.prefix, name), entry.clone(), true));
            }
        }
        self.own
            .get(name)
            .or_else(|| self.inherited.get(name))
            .map(|entry| (name.to_string(), entry.clone(), false))
    }

    fn paint_xobject(&mut self, op: &PdfOperation) -> Result<()> {
        let operands: Vec<Operand> = op.operands.iter().map(operand).collect();
        let unresolved = |operands| Operation {
            code: OpCode::PaintImageXObject,
            operator: "Do".to_string(),
            operands,
        };

        let Some(Operand::Name(name)) = operands.first().cloned() else {
            self.operations.push(unresolved(operands));
            return Ok(());
        };
        let Some((qualified, entry, from_form)) = self.find(&name) else {
            trace!(page = self.page, name = %name, "XObject not in any resource table");
            self.operations.push(unresolved(operands));
            return Ok(());
        };
        let Some(stream) = entry.stream(self.doc) else {
            self.operations.push(unresolved(operands));
            return Ok(());
        };

        if is_form(stream) {
            self.operations
                .push(Operation::paint(OpCode::PaintFormXObject, "Do", qualified.clone()));
            let stream = stream.clone();
            return self.flatten_form(qualified, entry.id(), &stream);
        }

        let name = if from_form && is_image(stream) {
            self.register(qualified, entry)
        } else {
            qualified
        };
        self.operations
            .push(Operation::paint(OpCode::PaintImageXObject, "Do", name));
        Ok(())
    }

    /// Add a generated page-local name, suffixed with `~<n>` when a page
    /// resource already uses it for another object
    fn register(&mut self, base: String, entry: XObjectRef) -> String {
        let mut name = base.clone();
        let mut n = 1;
        loop {
            match self.local.get(&name).or_else(|| self.shared.get(&name)) {
                None => {
                    self.local.insert(name.clone(), entry);
                    return name;
                }
                Some(existing) if existing.id().is_some() && existing.id() == entry.id() => return name,
                Some(_) => {
                    n += 1;
                    name = format!("{}~{}", base, n);
                }
            }
        }
    }

    fn paint_inline(&mut self, op: &PdfOperation) {
        let Some(Object::Stream(stream)) = op.operands.first() else {
            debug!(page = self.page, "inline image without data");
            return;
        };
        self.inline_count += 1;
        let name = self.register(
            format!("p{}_inline{}", self.page, self.inline_count),
            XObjectRef::Direct(expand_inline_stream(stream)),
        );
        self.operations
            .push(Operation::paint(OpCode::PaintInlineImageXObject, "BI", name));
    }

    fn flatten_form(&mut self, prefix: String, id: Option<ObjectId>, form: &Stream) -> Result<()> {
        let recursive = id.is_some() && self.forms.iter().any(|frame| frame.id == id);
        if recursive || self.forms.len() >= MAX_FORM_DEPTH {
            debug!(page = self.page, form = %prefix, "form XObject not expanded");
            return Ok(());
        }

        let read_err = |reason: String| Error::PageRead {
            page: self.page,
            reason: format!("form {}: {}", prefix, reason),
        };
        let bytes = decode_filters(self.doc, form).map_err(read_err)?;
        let content = Content::decode(&bytes).map_err(|e| read_err(e.to_string()))?;

        let xobjects = xobjects_of(self.doc, form.dict.get(b"Resources").ok());
        self.forms.push(FormFrame { prefix, id, xobjects });
        let result = self.compile(&content.operations);
        self.forms.pop();
        result
    }
}

fn operand(obj: &Object) -> Operand {
    match obj {
        Object::Name(name) => Operand::Name(String::from_utf8_lossy(name).to_string()),
        Object::Integer(n) => Operand::Number(*n as f64),
        Object::Real(r) => Operand::Number(f64::from(*r)),
        _ => Operand::Other,
    }
}
