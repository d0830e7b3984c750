//! collection of hcl sources ([Body] and path to source file)
//!
//! [HclSources] tracks
//! - the source path
//! - the root blocks
//! - the root attributes
//! and defines a numeric index for each. Once added those indices are stable (removal is not possible)
//!
//! File access goes through [SourceReader] so loading can be backed by the
//! real filesystem ([OsSourceReader]) or by test fixtures ([MemorySourceReader]).
use hcl_edit::structure::{Attribute, Block, Body, Structure};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Read access to terraform sources
pub trait SourceReader {
    fn read(&self, path: &Path) -> std::io::Result<String>;
    fn list(&self, directory: &Path) -> std::io::Result<Vec<PathBuf>>;
}

/// [SourceReader] backed by [std::fs]
#[derive(Debug, Default)]
pub struct OsSourceReader;

impl SourceReader for OsSourceReader {
    fn read(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn list(&self, directory: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(directory)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                paths.push(entry.path());
            }
        }
        // read_dir order is platform dependent
        paths.sort();
        Ok(paths)
    }
}

/// [SourceReader] backed by an in-memory file map
#[derive(Debug, Default)]
pub struct MemorySourceReader {
    files: BTreeMap<PathBuf, String>,
}

impl MemorySourceReader {
    pub fn new<P: Into<PathBuf>, C: Into<String>>(files: impl IntoIterator<Item = (P, C)>) -> Self {
        Self {
            files: files
                .into_iter()
                .map(|(path, contents)| (path.into(), contents.into()))
                .collect(),
        }
    }
}

impl SourceReader for MemorySourceReader {
    fn read(&self, path: &Path) -> std::io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn list(&self, directory: &Path) -> std::io::Result<Vec<PathBuf>> {
        Ok(self
            .files
            .keys()
            .filter(|path| path.parent() == Some(directory))
            .cloned()
            .collect())
    }
}

#[derive(Default, Debug)]
pub struct HclSources {
    sources: Vec<Source>,
    root_attributes: Vec<(usize, Attribute)>,
    root_blocks: Vec<(usize, Block)>,
}

impl HclSources {
    /// Inserts and indexes an hcl document
    pub fn insert(&mut self, document: Body, path: impl Into<Option<PathBuf>>) {
        let source_index = self.sources.len();
        self.sources.push(path.into());

        for structure in document.into_iter() {
            match structure {
                Structure::Block(block) => self.root_blocks.push((source_index, block)),
                Structure::Attribute(attribute) => {
                    self.root_attributes.push((source_index, attribute))
                }
            }
        }
    }

    pub fn get_block(&self, index: usize) -> SourceBlock {
        let (source_index, block) = &self.root_blocks[index];
        (index, &self.sources[*source_index], block)
    }

    pub fn blocks(&self) -> impl Iterator<Item = SourceBlock> {
        self.root_blocks
            .iter()
            .enumerate()
            .map(|(index, (source_index, block))| (index, &self.sources[*source_index], block))
    }

    pub fn attributes(&self) -> impl Iterator<Item = SourceAttribute> {
        self.root_attributes
            .iter()
            .enumerate()
            .map(|(index, (source_index, attribute))| {
                (index, &self.sources[*source_index], attribute)
            })
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

impl HclSources {
    pub fn load_file(&mut self, reader: &dyn SourceReader, file_path: &Path) -> Result<(), LoadError> {
        tracing::info!(path=%file_path.display(), "loading file");

        let file_contents = reader.read(file_path)?;
        let body = hcl_edit::parser::parse_body(&file_contents)?;

        self.insert(body, Some(file_path.to_path_buf()));
        Ok(())
    }

    /// Loads all `.tf` files of a directory (non-recursive, like terraform itself)
    pub fn load_directory(
        &mut self,
        reader: &dyn SourceReader,
        dir_path: &Path,
    ) -> Result<(), LoadError> {
        let mut any_files_loaded = false;

        for file_path in reader.list(dir_path)? {
            let is_tf_file = file_path
                .extension()
                .is_some_and(|extension| extension == "tf");
            if !is_tf_file {
                continue;
            }

            self.load_file(reader, &file_path)?;
            any_files_loaded = true;
        }

        if !any_files_loaded {
            return Err(LoadError::NoFilesFound);
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("No .tf files found in directory")]
    NoFilesFound,
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse hcl file")]
    HclParseFailed(#[from] hcl_edit::parser::Error),
}

impl From<Body> for HclSources {
    fn from(value: Body) -> Self {
        let mut sources = HclSources::default();
        sources.insert(value, None);
        sources
    }
}

/// Utility macro to create [HclSources]
///
/// Create from a single document
/// ```
/// # use avc::hcl_sources;
/// hcl_sources!("attribute = 42");
/// ```
///
/// Create from multiple documents (path required)
/// ```
/// # use avc::hcl_sources;
/// hcl_sources! {
///   "variables.tf" => "variable \"sku\" {}",
///   "main.tf" => "resource \"azurerm_lb\" \"this\" {}"
/// };
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use avc::hcl_sources;
/// hcl_sources!("not = valid = hcl");
/// ```
#[macro_export]
macro_rules! hcl_sources {
    // single document without source
    { $expr:expr } => {
        $crate::hcl_sources::HclSources::from(hcl_edit::parser::parse_body($expr).expect("body must parse"))
    };
    // multi document with sources
    { $($source:expr => $expr:expr),+ $(,)? } => {{
        let mut sources = $crate::hcl_sources::HclSources::default();
        $(
            sources.insert(hcl_edit::parser::parse_body($expr).expect("body must parse"), Some($source.into()));
        )+

        sources
    }};
}

pub type Source = Option<PathBuf>;
pub type SourceAttribute<'a> = (usize, &'a Source, &'a Attribute);
pub type SourceBlock<'a> = (usize, &'a Source, &'a Block);

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    #[test]
    fn iterators() {
        let sources = hcl_sources! {r#"
        attr_1 = 1
        variable "one" {}
        resource "two" "three" {}
        attr_2 = 2
        attr_3 = 3
        "#};

        assert_eq!(sources.attributes().count(), 3);
        assert_eq!(sources.blocks().count(), 2);
    }

    #[test]
    fn multi_document_sources_are_tracked() {
        let sources = hcl_sources! {
            "variables.tf" => "variable \"sku\" {}",
            "main.tf" => "resource \"azurerm_lb\" \"this\" {}",
        };

        assert_eq!(sources.source_count(), 2);
        let paths: Vec<_> = sources
            .blocks()
            .map(|(_, source, _)| source.clone())
            .collect();
        assert_eq!(
            paths,
            vec![
                Some(PathBuf::from("variables.tf")),
                Some(PathBuf::from("main.tf"))
            ]
        );
    }

    #[test]
    fn memory_reader_loads_tf_files_only() {
        let reader = MemorySourceReader::new([
            ("module/main.tf", "resource \"azurerm_lb\" \"this\" {}"),
            ("module/variables.tf", "variable \"sku\" {}"),
            ("module/README.md", "not hcl at all {{{"),
        ]);

        let mut sources = HclSources::default();
        sources
            .load_directory(&reader, Path::new("module"))
            .expect("directory must load");

        assert_eq!(sources.source_count(), 2);
        assert_eq!(sources.blocks().count(), 2);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let reader = MemorySourceReader::new([("elsewhere/main.tf", "")]);

        let mut sources = HclSources::default();
        let error = sources
            .load_directory(&reader, Path::new("module"))
            .expect_err("must not find any files");

        assert!(matches!(error, LoadError::NoFilesFound));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let reader = MemorySourceReader::default();

        let mut sources = HclSources::default();
        let error = sources
            .load_file(&reader, Path::new("module/main.tf"))
            .expect_err("file does not exist");

        assert!(matches!(error, LoadError::IoError(_)));
    }
}
